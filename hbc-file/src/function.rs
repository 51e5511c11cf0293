//! Per-function metadata.

use std::fmt;
use std::ops::Range;

use crate::string_table::StringId;

/// Index of a function within its module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub u32);

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FunctionKind {
    #[default]
    Normal,
    Generator,
    Async,
}

/// Function header: where its code lives in the module's code blob, plus
/// the metadata needed to describe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionHeader {
    /// Byte offset of the first instruction in the code blob.
    pub offset: u32,
    /// Code size in bytes.
    pub size: u32,
    /// Number of declared formal parameters.
    pub param_count: u32,
    /// Number of registers in the frame.
    pub frame_size: u32,
    pub name: StringId,
    pub kind: FunctionKind,
}

impl FunctionHeader {
    /// Byte range of this function's code in the module's code blob.
    pub fn code_range(&self) -> Range<usize> {
        let start = self.offset as usize;
        start..start + self.size as usize
    }
}
