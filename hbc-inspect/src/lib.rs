//! Read-only analyses over compiled functions: string reference
//! extraction and disassembly.

pub mod disasm;
pub mod strings;

pub use disasm::disassemble_function;
pub use strings::{StringExtractor, extract_strings};
