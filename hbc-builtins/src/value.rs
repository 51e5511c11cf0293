use std::rc::Rc;

use hbc_file::{BytecodeModule, FunctionId, FunctionKind};
use hbc_object::ObjectRef;

use crate::error::Result;

#[derive(Debug, Clone)]
pub enum Function {
    /// A compiled function within a loaded module.
    Bytecode {
        module: Rc<BytecodeModule>,
        id: FunctionId,
    },
    /// A host-provided function.
    Native { name: Rc<str>, length: f64 },
}

impl Function {
    pub fn bytecode(module: Rc<BytecodeModule>, id: FunctionId) -> Self {
        Self::Bytecode { module, id }
    }

    pub fn native(name: &str, length: f64) -> Self {
        Self::Native {
            name: Rc::from(name),
            length,
        }
    }

    pub fn kind(&self) -> FunctionKind {
        match self {
            Self::Bytecode { module, id } => module
                .function(*id)
                .map(|header| header.kind)
                .unwrap_or_default(),
            Self::Native { .. } => FunctionKind::Normal,
        }
    }

    pub fn name(&self) -> Result<String> {
        Ok(match self {
            Self::Bytecode { module, id } => module.function_name(*id)?,
            Self::Native { name, .. } => name.to_string(),
        })
    }

    /// Declared parameter count.
    pub fn length(&self) -> Result<f64> {
        Ok(match self {
            Self::Bytecode { module, id } => f64::from(module.function(*id)?.param_count),
            Self::Native { length, .. } => *length,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Object(ObjectRef),
    Function(Rc<Function>),
}

impl Value {
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Self::Function(func) => Some(func),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectRef> {
        match self {
            Self::Object(obj) => Some(*obj),
            _ => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Function(_))
    }

    /// `typeof`-style name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Object(_) => "object",
            Self::Function(_) => "function",
        }
    }
}

impl From<Function> for Value {
    fn from(func: Function) -> Self {
        Self::Function(Rc::new(func))
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Self::Object(obj)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(Rc::from(s))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}
