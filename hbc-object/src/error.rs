use thiserror::Error;

use crate::heap::ObjectRef;
use crate::shape::PropertyKey;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectError {
    #[error("Object {0} not found")]
    ObjectNotFound(ObjectRef),

    #[error("Cannot add property '{0}': object is not extensible")]
    NotExtensible(PropertyKey),

    #[error("Property '{0}' is not configurable")]
    NonConfigurable(PropertyKey),

    #[error("Property '{0}' not found")]
    PropertyNotFound(PropertyKey),

    #[error("Property '{0}' already exists")]
    PropertyExists(PropertyKey),
}

pub type Result<T> = std::result::Result<T, ObjectError>;
