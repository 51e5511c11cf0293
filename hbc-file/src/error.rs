use thiserror::Error;

use crate::{FunctionId, StringId};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Offset {0:#x} out of bounds (size: {1:#x})")]
    OffsetOutOfBounds(usize, usize),

    #[error("Invalid function id {0}")]
    InvalidFunctionId(FunctionId),

    #[error("Invalid string id {0}")]
    InvalidStringId(StringId),

    #[error("Malformed bytecode: {0}")]
    Decode(#[from] hbc_isa::DecodeError),

    #[error("Encoding failed: {0}")]
    Encode(#[from] hbc_isa::EncodeError),
}

pub type Result<T> = std::result::Result<T, Error>;
