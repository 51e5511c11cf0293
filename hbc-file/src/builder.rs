//! Module builder (writer).

use std::collections::HashMap;

use crate::error::Result;
use crate::function::{FunctionHeader, FunctionId, FunctionKind};
use crate::string_table::{self, StringId, StringTableEntry};
use crate::BytecodeModule;

/// Definition of a function to add to a [`ModuleBuilder`].
#[derive(Debug, Clone)]
pub struct FunctionDef<'a> {
    name: &'a str,
    code: &'a [u8],
    kind: FunctionKind,
    param_count: u32,
    frame_size: u32,
}

impl<'a> FunctionDef<'a> {
    pub fn new(name: &'a str, code: &'a [u8]) -> Self {
        Self {
            name,
            code,
            kind: FunctionKind::Normal,
            param_count: 0,
            frame_size: 0,
        }
    }

    pub fn kind(mut self, kind: FunctionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn params(mut self, param_count: u32) -> Self {
        self.param_count = param_count;
        self
    }

    pub fn frame_size(mut self, frame_size: u32) -> Self {
        self.frame_size = frame_size;
        self
    }
}

/// Assembles a [`BytecodeModule`] from strings and function code.
///
/// ```
/// use hbc_file::{FunctionDef, ModuleBuilder};
/// use hbc_isa::{Emitter, Opcode};
///
/// let mut b = ModuleBuilder::new();
/// let hello = b.add_string("hello");
/// let mut e = Emitter::new();
/// e.emit(Opcode::LoadConstString, &[0, hello.0 as i64])?;
/// e.emit(Opcode::Ret, &[0])?;
/// let f = b.add_function(FunctionDef::new("greet", &e.finish()));
/// let module = b.finish()?;
/// assert_eq!(module.function_name(f)?, "greet");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Default)]
pub struct ModuleBuilder {
    code: Vec<u8>,
    functions: Vec<FunctionHeader>,
    string_table: Vec<StringTableEntry>,
    string_storage: Vec<u8>,
    interned: HashMap<String, StringId>,
}

impl ModuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `s`, returning its string id. Identical strings share one
    /// entry. Strings with no character above U+00FF are stored narrow.
    pub fn add_string(&mut self, s: &str) -> StringId {
        if let Some(&id) = self.interned.get(s) {
            return id;
        }
        let encoding = string_table::encoding_for(s);
        let offset = self.string_storage.len() as u32;
        let length = string_table::write_string(&mut self.string_storage, s, encoding);
        let id = StringId(self.string_table.len() as u32);
        self.string_table
            .push(StringTableEntry::new(offset, length, encoding));
        self.interned.insert(s.to_owned(), id);
        id
    }

    /// Append a function's code and header. The function name is interned.
    pub fn add_function(&mut self, def: FunctionDef<'_>) -> FunctionId {
        let name = self.add_string(def.name);
        let id = FunctionId(self.functions.len() as u32);
        self.functions.push(FunctionHeader {
            offset: self.code.len() as u32,
            size: def.code.len() as u32,
            param_count: def.param_count,
            frame_size: def.frame_size,
            name,
            kind: def.kind,
        });
        self.code.extend_from_slice(def.code);
        id
    }

    pub fn finish(self) -> Result<BytecodeModule> {
        BytecodeModule::new(
            self.code,
            self.functions,
            self.string_table,
            self.string_storage,
        )
    }
}
