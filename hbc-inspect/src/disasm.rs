//! Human-readable function listings.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use hbc_file::{BytecodeModule, FunctionId, Result, StringId};
use hbc_isa::{Instruction, OpcodeFlags, is_operand_string_id};

/// Disassemble function `id` into a listing.
///
/// The first line describes the function; each instruction follows on its
/// own indented line as `offset: Mnemonic operands`. Registers print as
/// `rN`, string operands as quoted text, and branch operands as `L<offset>`
/// labels, with a label line before every branch target.
pub fn disassemble_function(module: &BytecodeModule, id: FunctionId) -> Result<String> {
    let header = module.function(id)?;
    let name = module.get_string(header.name)?;
    let instructions = module.instructions(id)?;

    let targets: BTreeSet<u32> = instructions
        .iter()
        .filter(|insn| insn.opcode.info().has_flag(OpcodeFlags::JUMP))
        .filter_map(Instruction::jump_target)
        .collect();

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Function<{name}>({} params, {} registers):",
        header.param_count, header.frame_size
    );
    for insn in &instructions {
        if targets.contains(&insn.offset) {
            let _ = writeln!(out, "L{}:", insn.offset);
        }
        let _ = write!(out, "    {:04}: {}", insn.offset, insn.opcode.mnemonic());
        for (index, op) in insn.operands.iter().enumerate() {
            out.push_str(if index == 0 { " " } else { ", " });
            if op.ty.is_address() {
                match insn.jump_target() {
                    Some(target) => {
                        let _ = write!(out, "L{target}");
                    }
                    None => {
                        let _ = write!(out, "{:+}", op.value.as_i64().unwrap_or_default());
                    }
                }
            } else if is_operand_string_id(insn.opcode, index) {
                let raw = op.value.as_unsigned().unwrap_or_default();
                let text = module.get_string(StringId(raw))?;
                let _ = write!(out, "{text:?}");
            } else {
                let _ = write!(out, "{op}");
            }
        }
        out.push('\n');
    }

    log::debug!(
        "disassembled function {id} ({} instructions)",
        instructions.len()
    );
    Ok(out)
}
