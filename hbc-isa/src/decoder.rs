use std::fmt;

use crate::{Opcode, Operand, describe};

/// Errors from [`walk`] and [`decode`].
///
/// Both are reported before any byte past the end of the code is read.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Unknown opcode byte at the given byte offset.
    #[error("invalid opcode {byte:#04x} at offset {offset}")]
    InvalidOpcode { offset: usize, byte: u8 },
    /// The instruction starting at the given byte offset extends past the
    /// end of the code.
    #[error("truncated instruction at offset {0}")]
    Truncated(usize),
}

/// Receives instruction and operand events from [`walk`].
///
/// All methods default to doing nothing, so visitors only implement the
/// events they care about.
pub trait InstructionVisitor {
    /// Called once per instruction, before its operands.
    fn pre_visit_instruction(&mut self, _opcode: Opcode, _offset: usize, _length: usize) {}

    /// Called once per operand, in operand order. `index` is zero-based.
    fn visit_operand(&mut self, _offset: usize, _index: usize, _operand: Operand) {}

    /// Called once per instruction, after its operands.
    fn post_visit_instruction(&mut self, _opcode: Opcode, _offset: usize) {}
}

/// Walk `code` from start to end, reporting every instruction and operand
/// to `visitor`.
///
/// Each step consumes exactly the length declared by the opcode's
/// descriptor. An instruction whose declared length exceeds the remaining
/// bytes is a [`DecodeError::Truncated`] fault; nothing of it is reported.
pub fn walk<V: InstructionVisitor + ?Sized>(
    code: &[u8],
    visitor: &mut V,
) -> Result<(), DecodeError> {
    let mut offset = 0usize;
    while offset < code.len() {
        let byte = code[offset];
        let opcode = Opcode::from_raw(byte).ok_or(DecodeError::InvalidOpcode { offset, byte })?;
        let info = describe(opcode);
        let size = info.size();
        if size > code.len() - offset {
            return Err(DecodeError::Truncated(offset));
        }
        let insn = &code[offset..offset + size];

        visitor.pre_visit_instruction(opcode, offset, size);
        let mut pos = 1;
        for (index, &ty) in info.operands().iter().enumerate() {
            let width = ty.width();
            visitor.visit_operand(offset, index, ty.decode(&insn[pos..pos + width]));
            pos += width;
        }
        visitor.post_visit_instruction(opcode, offset);

        offset += size;
    }
    Ok(())
}

/// A single decoded instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Byte offset within the function's code.
    pub offset: u32,
    pub opcode: Opcode,
    pub operands: Vec<Operand>,
}

impl Instruction {
    /// Total instruction size in bytes.
    pub fn size(&self) -> usize {
        describe(self.opcode).size()
    }

    /// Absolute byte offset targeted by this instruction's branch operand.
    ///
    /// Returns `None` for instructions without an address operand, or when
    /// the target would lie before the start of the code.
    pub fn jump_target(&self) -> Option<u32> {
        let addr = self.operands.iter().find(|op| op.ty.is_address())?;
        let rel = addr.value.as_i64()?;
        u32::try_from(self.offset as i64 + rel).ok()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode.mnemonic())?;
        for (i, op) in self.operands.iter().enumerate() {
            f.write_str(if i == 0 { " " } else { ", " })?;
            write!(f, "{op}")?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct Collector {
    instructions: Vec<Instruction>,
}

impl InstructionVisitor for Collector {
    fn pre_visit_instruction(&mut self, opcode: Opcode, offset: usize, _length: usize) {
        self.instructions.push(Instruction {
            offset: offset as u32,
            opcode,
            operands: Vec::with_capacity(describe(opcode).operands().len()),
        });
    }

    fn visit_operand(&mut self, _offset: usize, _index: usize, operand: Operand) {
        if let Some(insn) = self.instructions.last_mut() {
            insn.operands.push(operand);
        }
    }
}

/// Decode `code` into a list of instructions.
pub fn decode(code: &[u8]) -> Result<Vec<Instruction>, DecodeError> {
    let mut collector = Collector::default();
    walk(code, &mut collector)?;
    Ok(collector.instructions)
}
