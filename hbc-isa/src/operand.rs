use std::fmt;

/// Operand encoding. Every operand of every opcode is one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperandType {
    Reg8,
    Reg32,
    UInt8,
    UInt16,
    UInt32,
    /// Signed 8-bit branch offset, relative to the instruction start.
    Addr8,
    /// Signed 32-bit branch offset, relative to the instruction start.
    Addr32,
    Imm32,
    Double,
}

impl OperandType {
    /// Encoded width in bytes.
    pub const fn width(self) -> usize {
        match self {
            Self::Reg8 | Self::UInt8 | Self::Addr8 => 1,
            Self::UInt16 => 2,
            Self::Reg32 | Self::UInt32 | Self::Addr32 | Self::Imm32 => 4,
            Self::Double => 8,
        }
    }

    /// Whether the operand is an offset relative to the current instruction.
    pub const fn is_address(self) -> bool {
        matches!(self, Self::Addr8 | Self::Addr32)
    }

    pub const fn is_register(self) -> bool {
        matches!(self, Self::Reg8 | Self::Reg32)
    }

    pub const fn is_signed(self) -> bool {
        matches!(self, Self::Addr8 | Self::Addr32 | Self::Imm32)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Reg8 => "Reg8",
            Self::Reg32 => "Reg32",
            Self::UInt8 => "UInt8",
            Self::UInt16 => "UInt16",
            Self::UInt32 => "UInt32",
            Self::Addr8 => "Addr8",
            Self::Addr32 => "Addr32",
            Self::Imm32 => "Imm32",
            Self::Double => "Double",
        }
    }

    /// Decode an operand of this type from exactly `self.width()` bytes.
    pub(crate) fn decode(self, bytes: &[u8]) -> Operand {
        let value = match self {
            Self::Reg8 | Self::UInt8 => OperandValue::Unsigned(bytes[0] as u32),
            Self::UInt16 => OperandValue::Unsigned(u16::from_le_bytes(le(bytes)) as u32),
            Self::Reg32 | Self::UInt32 => OperandValue::Unsigned(u32::from_le_bytes(le(bytes))),
            Self::Addr8 => OperandValue::Signed(bytes[0] as i8 as i32),
            Self::Addr32 | Self::Imm32 => OperandValue::Signed(i32::from_le_bytes(le(bytes))),
            Self::Double => OperandValue::Double(f64::from_le_bytes(le(bytes))),
        };
        Operand { ty: self, value }
    }

    /// Encode `value` into `out`, or `None` if it does not fit this type.
    pub(crate) fn encode(self, value: OperandValue, out: &mut Vec<u8>) -> Option<()> {
        match (self, value) {
            (Self::Double, OperandValue::Double(v)) => out.extend_from_slice(&v.to_le_bytes()),
            (Self::Double, _) | (_, OperandValue::Double(_)) => return None,
            (ty, v) => {
                let v = v.as_i64()?;
                match ty {
                    Self::Reg8 | Self::UInt8 => out.push(u8::try_from(v).ok()?),
                    Self::UInt16 => out.extend_from_slice(&u16::try_from(v).ok()?.to_le_bytes()),
                    Self::Reg32 | Self::UInt32 => {
                        out.extend_from_slice(&u32::try_from(v).ok()?.to_le_bytes())
                    }
                    Self::Addr8 => out.push(i8::try_from(v).ok()? as u8),
                    Self::Addr32 | Self::Imm32 => {
                        out.extend_from_slice(&i32::try_from(v).ok()?.to_le_bytes())
                    }
                    Self::Double => unreachable!(),
                }
            }
        }
        Some(())
    }
}

impl fmt::Display for OperandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn le<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

/// A decoded operand value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OperandValue {
    Unsigned(u32),
    Signed(i32),
    Double(f64),
}

impl OperandValue {
    /// The value as an unsigned index, if it is one.
    pub fn as_unsigned(self) -> Option<u32> {
        match self {
            Self::Unsigned(v) => Some(v),
            Self::Signed(_) | Self::Double(_) => None,
        }
    }

    /// The value as an integer, if it is integral.
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Self::Unsigned(v) => Some(v as i64),
            Self::Signed(v) => Some(v as i64),
            Self::Double(_) => None,
        }
    }
}

impl From<u32> for OperandValue {
    fn from(v: u32) -> Self {
        Self::Unsigned(v)
    }
}

impl From<i32> for OperandValue {
    fn from(v: i32) -> Self {
        Self::Signed(v)
    }
}

impl From<f64> for OperandValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl fmt::Display for OperandValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsigned(v) => write!(f, "{v}"),
            Self::Signed(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
        }
    }
}

/// One decoded operand: its declared type and value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Operand {
    pub ty: OperandType,
    pub value: OperandValue,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ty.is_register() {
            write!(f, "r{}", self.value)
        } else {
            write!(f, "{}", self.value)
        }
    }
}
