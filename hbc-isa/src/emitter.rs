use crate::{Opcode, OperandType, OperandValue, describe};

/// Errors from [`Emitter`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeError {
    #[error("{opcode} takes {expected} operands, got {actual}")]
    OperandCount {
        opcode: Opcode,
        expected: usize,
        actual: usize,
    },
    #[error("operand {index} of {opcode} does not fit {ty}: {value}")]
    OutOfRange {
        opcode: Opcode,
        index: usize,
        ty: OperandType,
        value: OperandValue,
    },
    #[error("operand {index} of {opcode} is outside the 32-bit range: {value}")]
    Overflow {
        opcode: Opcode,
        index: usize,
        value: i64,
    },
}

/// Appends encoded instructions to a code buffer.
///
/// ```
/// use hbc_isa::{Emitter, Opcode, decode};
///
/// let mut e = Emitter::new();
/// e.emit(Opcode::LoadConstString, &[0, 3])?;
/// e.emit(Opcode::Ret, &[0])?;
/// let code = e.finish();
/// assert_eq!(decode(&code)?.len(), 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Default)]
pub struct Emitter {
    bytes: Vec<u8>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Byte offset where the next instruction will be written.
    pub fn offset(&self) -> usize {
        self.bytes.len()
    }

    /// Emit an instruction with integer operands. `Double` operands take
    /// the integer converted to a float.
    ///
    /// Returns the byte offset of the emitted instruction.
    pub fn emit(&mut self, opcode: Opcode, operands: &[i64]) -> Result<usize, EncodeError> {
        let types = describe(opcode).operands();
        if types.len() != operands.len() {
            return Err(EncodeError::OperandCount {
                opcode,
                expected: types.len(),
                actual: operands.len(),
            });
        }

        let mut values = Vec::with_capacity(operands.len());
        for (index, (&ty, &v)) in types.iter().zip(operands).enumerate() {
            let value = if ty == OperandType::Double {
                OperandValue::Double(v as f64)
            } else if let Ok(u) = u32::try_from(v) {
                OperandValue::Unsigned(u)
            } else if let Ok(s) = i32::try_from(v) {
                OperandValue::Signed(s)
            } else {
                return Err(EncodeError::Overflow {
                    opcode,
                    index,
                    value: v,
                });
            };
            values.push(value);
        }
        self.emit_values(opcode, &values)
    }

    /// Emit an instruction with typed operand values.
    ///
    /// Returns the byte offset of the emitted instruction. On error nothing
    /// is written.
    pub fn emit_values(
        &mut self,
        opcode: Opcode,
        operands: &[OperandValue],
    ) -> Result<usize, EncodeError> {
        let types = describe(opcode).operands();
        if types.len() != operands.len() {
            return Err(EncodeError::OperandCount {
                opcode,
                expected: types.len(),
                actual: operands.len(),
            });
        }

        let start = self.bytes.len();
        let mut insn = Vec::with_capacity(describe(opcode).size());
        insn.push(opcode.raw());
        for (index, (&ty, &value)) in types.iter().zip(operands).enumerate() {
            if ty.encode(value, &mut insn).is_none() {
                return Err(EncodeError::OutOfRange {
                    opcode,
                    index,
                    ty,
                    value,
                });
            }
        }
        debug_assert_eq!(insn.len(), describe(opcode).size());
        self.bytes.extend_from_slice(&insn);
        Ok(start)
    }

    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}
