use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The argument has the wrong type. Recoverable by the caller.
    #[error("TypeError: {0}")]
    Type(String),

    #[error(transparent)]
    Bytecode(#[from] hbc_file::Error),

    #[error(transparent)]
    Object(#[from] hbc_object::ObjectError),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
