// Build script for hbc-isa.
//
// Reads the opcode definitions in `isa/opcodes.yaml` and generates
// `generated.rs`: the `Opcode` enum, its raw-value mapping, and the static
// descriptor table (length, operand types, string-id positions, flags).

use std::collections::HashSet;
use std::env;
use std::fmt::Write as _;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct OpcodeDef {
    name: String,
    #[serde(default)]
    operands: Vec<String>,
    #[serde(default)]
    string_ids: Vec<usize>,
    #[serde(default)]
    flags: Vec<String>,
}

/// Operand type name, byte width, and whether a string id may live there.
const OPERAND_TYPES: &[(&str, usize, bool)] = &[
    ("Reg8", 1, false),
    ("Reg32", 4, false),
    ("UInt8", 1, true),
    ("UInt16", 2, true),
    ("UInt32", 4, true),
    ("Addr8", 1, true),
    ("Addr32", 4, true),
    ("Imm32", 4, false),
    ("Double", 8, false),
];

const FLAGS: &[(&str, &str)] = &[
    ("jump", "JUMP"),
    ("terminator", "TERMINATOR"),
    ("call", "CALL"),
    ("throw", "THROW"),
];

fn main() {
    let manifest = env::var("CARGO_MANIFEST_DIR").unwrap();
    let out_dir = env::var("OUT_DIR").unwrap();

    let isa_yaml = format!("{manifest}/isa/opcodes.yaml");
    let text = std::fs::read_to_string(&isa_yaml)
        .unwrap_or_else(|e| panic!("failed to read {isa_yaml}: {e}"));
    let defs: Vec<OpcodeDef> =
        serde_yaml::from_str(&text).unwrap_or_else(|e| panic!("malformed {isa_yaml}: {e}"));

    validate(&defs);

    let out_path = PathBuf::from(&out_dir).join("generated.rs");
    std::fs::write(&out_path, generate(&defs)).expect("failed to write generated.rs");

    println!("cargo:rerun-if-changed={isa_yaml}");
    println!("cargo:rerun-if-changed={manifest}/build.rs");
}

fn operand_type(name: &str) -> (usize, bool) {
    OPERAND_TYPES
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|&(_, width, id)| (width, id))
        .unwrap_or_else(|| panic!("unknown operand type `{name}`"))
}

fn validate(defs: &[OpcodeDef]) {
    assert!(!defs.is_empty(), "opcode list is empty");
    // 0xFF stays unassigned so a stray byte never decodes as a valid opcode.
    assert!(
        defs.len() < 0xFF,
        "too many opcodes for a one-byte encoding: {}",
        defs.len()
    );

    let mut seen = HashSet::new();
    for def in defs {
        assert!(seen.insert(def.name.as_str()), "duplicate opcode `{}`", def.name);
        for &pos in &def.string_ids {
            assert!(
                pos >= 1 && pos <= def.operands.len(),
                "`{}`: string id position {pos} out of range",
                def.name
            );
            let (_, may_hold_id) = operand_type(&def.operands[pos - 1]);
            assert!(
                may_hold_id,
                "`{}`: operand {pos} of type {} cannot hold a string id",
                def.name,
                def.operands[pos - 1]
            );
        }
        for flag in &def.flags {
            assert!(
                FLAGS.iter().any(|(n, _)| n == flag),
                "`{}`: unknown flag `{flag}`",
                def.name
            );
        }
    }
}

fn generate(defs: &[OpcodeDef]) -> String {
    let mut out = String::new();
    out.push_str("// @generated by build.rs from isa/opcodes.yaml. Do not edit.\n\n");

    out.push_str("/// Instruction opcode. The discriminant is the encoded opcode byte.\n");
    out.push_str("#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]\n");
    out.push_str("#[repr(u8)]\n");
    out.push_str("pub enum Opcode {\n");
    for (raw, def) in defs.iter().enumerate() {
        writeln!(out, "    {} = {raw},", def.name).unwrap();
    }
    out.push_str("}\n\n");

    out.push_str("impl Opcode {\n");
    out.push_str("    /// Map an encoded opcode byte back to its opcode.\n");
    out.push_str("    pub const fn from_raw(raw: u8) -> Option<Self> {\n");
    out.push_str("        match raw {\n");
    for (raw, def) in defs.iter().enumerate() {
        writeln!(out, "            {raw} => Some(Self::{}),", def.name).unwrap();
    }
    out.push_str("            _ => None,\n");
    out.push_str("        }\n");
    out.push_str("    }\n");
    out.push_str("}\n\n");

    writeln!(out, "static OPCODE_TABLE: [OpcodeInfo; {}] = [", defs.len()).unwrap();
    for def in defs {
        let size: usize = 1 + def
            .operands
            .iter()
            .map(|op| operand_type(op).0)
            .sum::<usize>();
        let operands = def
            .operands
            .iter()
            .map(|op| format!("OperandType::{op}"))
            .collect::<Vec<_>>()
            .join(", ");
        let string_ids = def
            .string_ids
            .iter()
            .map(|pos| (pos - 1).to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let mut flags = String::from("OpcodeFlags::empty()");
        for flag in &def.flags {
            let (_, konst) = FLAGS.iter().find(|(n, _)| n == flag).unwrap();
            write!(flags, ".union(OpcodeFlags::{konst})").unwrap();
        }

        out.push_str("    OpcodeInfo {\n");
        writeln!(out, "        opcode: Opcode::{},", def.name).unwrap();
        writeln!(out, "        mnemonic: \"{}\",", def.name).unwrap();
        writeln!(out, "        size: {size},").unwrap();
        writeln!(out, "        operands: &[{operands}],").unwrap();
        writeln!(out, "        string_ids: &[{string_ids}],").unwrap();
        writeln!(out, "        flags: {flags},").unwrap();
        out.push_str("    },\n");
    }
    out.push_str("];\n");

    out
}
