//! Compiled bytecode module: function headers, code blob and string table.

pub mod builder;
pub mod error;
pub mod function;
pub mod string_table;

pub use builder::{FunctionDef, ModuleBuilder};
pub use error::{Error, Result};
pub use function::{FunctionHeader, FunctionId, FunctionKind};
pub use string_table::{StringEncoding, StringId, StringTableEntry};

use hbc_isa::Instruction;

/// A compiled module providing access to function code and strings.
///
/// Every function header and string table entry is checked against the
/// bounds of its blob when the module is constructed.
#[derive(Debug, Clone)]
pub struct BytecodeModule {
    code: Vec<u8>,
    functions: Vec<FunctionHeader>,
    string_table: Vec<StringTableEntry>,
    string_storage: Vec<u8>,
}

impl BytecodeModule {
    pub fn new(
        code: Vec<u8>,
        functions: Vec<FunctionHeader>,
        string_table: Vec<StringTableEntry>,
        string_storage: Vec<u8>,
    ) -> Result<Self> {
        for entry in &string_table {
            entry.byte_range(string_storage.len())?;
        }
        for header in &functions {
            let end = header.offset as usize + header.size as usize;
            if end > code.len() {
                return Err(Error::OffsetOutOfBounds(end, code.len()));
            }
            if header.name.0 as usize >= string_table.len() {
                return Err(Error::InvalidStringId(header.name));
            }
        }

        log::debug!(
            "loaded module: {} functions, {} strings, {} code bytes",
            functions.len(),
            string_table.len(),
            code.len()
        );

        Ok(Self {
            code,
            functions,
            string_table,
            string_storage,
        })
    }

    /// Get the raw code blob shared by all functions.
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &FunctionHeader)> + '_ {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, h)| (FunctionId(i as u32), h))
    }

    pub fn function(&self, id: FunctionId) -> Result<&FunctionHeader> {
        self.functions
            .get(id.0 as usize)
            .ok_or(Error::InvalidFunctionId(id))
    }

    /// The code bytes of one function.
    pub fn function_code(&self, id: FunctionId) -> Result<&[u8]> {
        let range = self.function(id)?.code_range();
        let len = self.code.len();
        self.code
            .get(range.clone())
            .ok_or(Error::OffsetOutOfBounds(range.end, len))
    }

    pub fn function_name(&self, id: FunctionId) -> Result<String> {
        self.get_string(self.function(id)?.name)
    }

    /// Decode every instruction of one function.
    pub fn instructions(&self, id: FunctionId) -> Result<Vec<Instruction>> {
        Ok(hbc_isa::decode(self.function_code(id)?)?)
    }

    pub fn string_count(&self) -> usize {
        self.string_table.len()
    }

    pub fn string_entry(&self, id: StringId) -> Result<StringTableEntry> {
        self.string_table
            .get(id.0 as usize)
            .copied()
            .ok_or(Error::InvalidStringId(id))
    }

    /// Get the raw string storage blob.
    pub fn string_storage(&self) -> &[u8] {
        &self.string_storage
    }

    /// Read the string with the given id, honoring its encoding.
    pub fn get_string(&self, id: StringId) -> Result<String> {
        let entry = self.string_entry(id)?;
        string_table::read_string(&self.string_storage, &entry)
    }
}
