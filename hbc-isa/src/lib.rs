//! Bytecode ISA definitions, generated from `isa/opcodes.yaml`.
//!
//! This crate provides the opcode descriptor table, operand types, an
//! instruction walker that reports decoded operands to a visitor, and a
//! small emitter for producing well-formed code blobs.

mod decoder;
mod emitter;
mod operand;

use std::fmt;

use bitflags::bitflags;

pub use decoder::{DecodeError, Instruction, InstructionVisitor, decode, walk};
pub use emitter::{EncodeError, Emitter};
pub use operand::{Operand, OperandType, OperandValue};

include!(concat!(env!("OUT_DIR"), "/generated.rs"));

bitflags! {
    /// Opcode properties declared in `isa/opcodes.yaml`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpcodeFlags: u8 {
        /// Has an address-relative branch operand.
        const JUMP = 1 << 0;
        /// Control never falls through to the next instruction.
        const TERMINATOR = 1 << 1;
        const CALL = 1 << 2;
        const THROW = 1 << 3;
    }
}

/// Static metadata for one opcode.
#[derive(Debug)]
pub struct OpcodeInfo {
    opcode: Opcode,
    mnemonic: &'static str,
    size: u8,
    operands: &'static [OperandType],
    string_ids: &'static [u8],
    flags: OpcodeFlags,
}

impl OpcodeInfo {
    #[inline]
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    #[inline]
    pub fn mnemonic(&self) -> &'static str {
        self.mnemonic
    }

    /// Total encoded length in bytes, opcode byte included.
    #[inline]
    pub fn size(&self) -> usize {
        self.size as usize
    }

    /// Operand types in encoding order.
    #[inline]
    pub fn operands(&self) -> &'static [OperandType] {
        self.operands
    }

    #[inline]
    pub fn flags(&self) -> OpcodeFlags {
        self.flags
    }

    #[inline]
    pub fn has_flag(&self, flag: OpcodeFlags) -> bool {
        self.flags.contains(flag)
    }

    /// Zero-based operand positions declared as string table ids.
    pub fn string_operands(&self) -> impl Iterator<Item = usize> + '_ {
        self.string_ids.iter().map(|&i| i as usize)
    }

    /// Whether the zero-based operand `index` is declared as a string table id.
    pub fn is_operand_string_id(&self, index: usize) -> bool {
        self.string_ids.iter().any(|&i| i as usize == index)
    }

    /// Byte offset of operand `index` from the start of the instruction.
    pub fn operand_offset(&self, index: usize) -> usize {
        1 + self.operands[..index]
            .iter()
            .map(|ty| ty.width())
            .sum::<usize>()
    }
}

impl Opcode {
    /// The encoded opcode byte.
    #[inline]
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// Descriptor for this opcode.
    #[inline]
    pub fn info(self) -> &'static OpcodeInfo {
        describe(self)
    }

    #[inline]
    pub fn mnemonic(self) -> &'static str {
        self.info().mnemonic
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// All opcode descriptors, indexed by raw opcode value.
pub fn opcode_table() -> &'static [OpcodeInfo] {
    &OPCODE_TABLE
}

pub fn opcode_count() -> usize {
    OPCODE_TABLE.len()
}

/// Look up a descriptor by encoded opcode byte.
pub fn lookup(raw: u8) -> Option<&'static OpcodeInfo> {
    OPCODE_TABLE.get(raw as usize)
}

/// Descriptor for `opcode`: its length and ordered operand types.
pub fn describe(opcode: Opcode) -> &'static OpcodeInfo {
    &OPCODE_TABLE[opcode as usize]
}

/// Check if the zero-based `index` operand of `opcode` is a string table id.
pub fn is_operand_string_id(opcode: Opcode, index: usize) -> bool {
    describe(opcode).is_operand_string_id(index)
}
