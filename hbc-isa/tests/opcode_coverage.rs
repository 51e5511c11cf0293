//! Systematic opcode_table() coverage tests.
//!
//! Validates metadata consistency for every opcode in the ISA.

use hbc_isa::{Opcode, OpcodeFlags, describe, lookup, opcode_count, opcode_table};

#[test]
fn opcode_count_is_positive() {
    assert!(opcode_count() > 0, "ISA should have at least one opcode");
}

#[test]
fn table_is_indexed_by_raw_value() {
    for (i, info) in opcode_table().iter().enumerate() {
        assert_eq!(info.opcode().raw() as usize, i, "'{}'", info.mnemonic());
        assert_eq!(Opcode::from_raw(i as u8), Some(info.opcode()));
        let found = lookup(i as u8).unwrap();
        assert_eq!(found.mnemonic(), info.mnemonic());
    }
}

#[test]
fn raw_values_past_the_table_are_unassigned() {
    for raw in opcode_count()..=0xFF {
        assert!(Opcode::from_raw(raw as u8).is_none(), "{raw:#x} decodes");
        assert!(lookup(raw as u8).is_none());
    }
}

#[test]
fn size_is_opcode_byte_plus_operand_widths() {
    for info in opcode_table() {
        let widths: usize = info.operands().iter().map(|ty| ty.width()).sum();
        assert_eq!(info.size(), 1 + widths, "'{}'", info.mnemonic());
    }
}

#[test]
fn string_operands_are_in_range_and_never_registers() {
    for info in opcode_table() {
        for index in info.string_operands() {
            let ty = info.operands()[index];
            assert!(
                !ty.is_register(),
                "'{}' operand {index} is a register",
                info.mnemonic()
            );
        }
    }
}

#[test]
fn known_string_operands() {
    assert!(describe(Opcode::LoadConstString).is_operand_string_id(1));
    assert!(!describe(Opcode::LoadConstString).is_operand_string_id(0));
    assert!(describe(Opcode::GetById).is_operand_string_id(3));
    assert!(describe(Opcode::LoadConstStringLongIndex).is_operand_string_id(1));
    let regexp: Vec<_> = describe(Opcode::CreateRegExp).string_operands().collect();
    assert_eq!(regexp, vec![1, 2]);
    assert_eq!(describe(Opcode::Add).string_operands().count(), 0);
}

#[test]
fn jump_opcodes_have_an_address_operand() {
    for info in opcode_table() {
        let has_addr = info.operands().iter().any(|ty| ty.is_address());
        assert_eq!(
            info.has_flag(OpcodeFlags::JUMP),
            has_addr,
            "'{}'",
            info.mnemonic()
        );
    }
}

#[test]
fn terminators() {
    assert!(describe(Opcode::Ret).has_flag(OpcodeFlags::TERMINATOR));
    assert!(describe(Opcode::Throw).has_flag(OpcodeFlags::TERMINATOR));
    assert!(describe(Opcode::Jmp).has_flag(OpcodeFlags::TERMINATOR));
    assert!(!describe(Opcode::JmpTrue).has_flag(OpcodeFlags::TERMINATOR));
    assert!(describe(Opcode::Call).has_flag(OpcodeFlags::CALL));
}

#[test]
fn known_lengths() {
    assert_eq!(describe(Opcode::LoadConstString).size(), 4);
    assert_eq!(describe(Opcode::LoadConstStringLongIndex).size(), 6);
    assert_eq!(describe(Opcode::Add).size(), 4);
    assert_eq!(describe(Opcode::LoadConstDouble).size(), 10);
    assert_eq!(describe(Opcode::Debugger).size(), 1);
}

#[test]
fn operand_offsets() {
    let info = describe(Opcode::GetByIdLong);
    assert_eq!(info.operand_offset(0), 1);
    assert_eq!(info.operand_offset(3), 4);
}

#[test]
fn mnemonic_and_display() {
    assert_eq!(Opcode::LoadConstString.mnemonic(), "LoadConstString");
    assert_eq!(Opcode::JStrictEqual.to_string(), "JStrictEqual");
}
