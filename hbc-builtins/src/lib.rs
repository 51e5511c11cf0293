//! Script-facing entry points: `findStrings`, `unfreeze` and
//! `getBytecode` over runtime values.

mod error;
mod value;

use std::fmt::Write as _;

use hbc_file::FunctionKind;
use hbc_inspect::{disassemble_function, extract_strings};
use hbc_object::ObjectHeap;

pub use error::{Result, RuntimeError};
pub use value::{Function, Value};

/// Upper bound on the synthesized formal parameter list.
const MAX_SOURCE_PARAMS: f64 = 65535.0;

/// Owns the object heap the builtins operate on.
#[derive(Debug, Default)]
pub struct Runtime {
    heap: ObjectHeap,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heap(&self) -> &ObjectHeap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut ObjectHeap {
        &mut self.heap
    }

    /// Every string referenced by the bytecode function `value`, in
    /// instruction order.
    pub fn extract_strings(&self, value: &Value) -> Result<Vec<String>> {
        let Some(Function::Bytecode { module, id }) = value.as_function() else {
            log::debug!("findStrings: rejecting {}", value.type_name());
            return Err(RuntimeError::Type(
                "Can't call findStrings() on non-function".to_owned(),
            ));
        };
        let strings = extract_strings(module, *id)?;
        log::debug!("findStrings: function {id} references {} strings", strings.len());
        Ok(strings)
    }

    /// Unfreeze the object `value` and return it. Anything that is not an
    /// object comes back unchanged.
    pub fn unfreeze(&mut self, value: Value) -> Result<Value> {
        match &value {
            Value::Object(obj) => {
                self.heap.unfreeze(*obj)?;
            }
            other => log::debug!("unfreeze: passing {} through", other.type_name()),
        }
        Ok(value)
    }

    /// Synthesized source text for the callable `value`, with the
    /// disassembly standing in for the body of bytecode functions.
    pub fn function_source(&self, value: &Value) -> Result<String> {
        let Some(func) = value.as_function() else {
            log::debug!("getBytecode: rejecting {}", value.type_name());
            return Err(RuntimeError::Type(
                "Can't call getBytecode() on non-callable".to_owned(),
            ));
        };

        let mut out = String::from(match func.kind() {
            FunctionKind::Async => "async function ",
            FunctionKind::Generator => "function *",
            FunctionKind::Normal => "function ",
        });
        out.push_str(&func.name()?);

        let (module, id) = match func {
            Function::Native { .. } => {
                out.push_str("() { [native code] }");
                return Ok(out);
            }
            Function::Bytecode { module, id } => (module, *id),
        };

        let params = func.length()?.clamp(0.0, MAX_SOURCE_PARAMS) as u32;
        out.push('(');
        for i in 0..params {
            if i != 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "a{i}");
        }
        out.push_str(") {\n");
        out.push_str(&disassemble_function(module, id)?);
        out.push('}');
        log::debug!("getBytecode: function {id} source is {} bytes", out.len());
        Ok(out)
    }
}
