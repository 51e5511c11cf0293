use hbc_file::*;
use hbc_isa::{Emitter, Opcode};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn ret0() -> Vec<u8> {
    let mut e = Emitter::new();
    e.emit(Opcode::LoadConstUndefined, &[0]).unwrap();
    e.emit(Opcode::Ret, &[0]).unwrap();
    e.finish()
}

#[test]
fn builder_interns_strings() {
    init_logging();
    let mut b = ModuleBuilder::new();
    let a = b.add_string("a");
    let bb = b.add_string("b");
    assert_eq!(b.add_string("a"), a);
    assert_ne!(a, bb);
    let module = b.finish().unwrap();
    assert_eq!(module.string_count(), 2);
    assert_eq!(module.get_string(a).unwrap(), "a");
    assert_eq!(module.get_string(bb).unwrap(), "b");
}

#[test]
fn builder_picks_encoding_per_string() {
    let mut b = ModuleBuilder::new();
    let narrow = b.add_string("na\u{ef}ve");
    let wide = b.add_string("\u{3bb}x.\u{3bb}");
    let module = b.finish().unwrap();

    let entry = module.string_entry(narrow).unwrap();
    assert_eq!(entry.encoding(), StringEncoding::Narrow);
    assert_eq!(entry.length(), 5);

    let entry = module.string_entry(wide).unwrap();
    assert!(entry.is_wide());
    assert_eq!(entry.length(), 4);
    assert_eq!(module.get_string(wide).unwrap(), "\u{3bb}x.\u{3bb}");
}

#[test]
fn functions_are_laid_out_back_to_back() {
    let code = ret0();
    let mut b = ModuleBuilder::new();
    let f = b.add_function(FunctionDef::new("f", &code).params(2).frame_size(3));
    let g = b.add_function(
        FunctionDef::new("g", &code).kind(FunctionKind::Generator),
    );
    let module = b.finish().unwrap();

    assert_eq!(module.function_count(), 2);
    assert_eq!(module.code().len(), code.len() * 2);
    let header = module.function(g).unwrap();
    assert_eq!(header.offset as usize, code.len());
    assert_eq!(header.kind, FunctionKind::Generator);
    assert_eq!(module.function(f).unwrap().param_count, 2);
    assert_eq!(module.function_code(g).unwrap(), &code[..]);
    assert_eq!(module.function_name(f).unwrap(), "f");
    assert_eq!(module.instructions(f).unwrap().len(), 2);
    let ids: Vec<_> = module.functions().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![f, g]);
}

#[test]
fn invalid_ids_are_errors() {
    let module = ModuleBuilder::new().finish().unwrap();
    assert!(matches!(
        module.function(FunctionId(0)),
        Err(Error::InvalidFunctionId(FunctionId(0)))
    ));
    assert!(matches!(
        module.get_string(StringId(3)),
        Err(Error::InvalidStringId(StringId(3)))
    ));
}

#[test]
fn entry_past_storage_is_rejected() {
    let table = vec![StringTableEntry::new(2, 4, StringEncoding::Narrow)];
    let err = BytecodeModule::new(Vec::new(), Vec::new(), table, vec![0; 5]).unwrap_err();
    assert!(matches!(err, Error::OffsetOutOfBounds(6, 5)), "got {err}");
}

#[test]
fn wide_entry_length_is_in_code_units() {
    let table = vec![StringTableEntry::new(0, 3, StringEncoding::Wide)];
    let err = BytecodeModule::new(Vec::new(), Vec::new(), table, vec![0; 5]).unwrap_err();
    assert!(matches!(err, Error::OffsetOutOfBounds(6, 5)), "got {err}");
}

#[test]
fn function_past_code_is_rejected() {
    let header = FunctionHeader {
        offset: 2,
        size: 8,
        param_count: 0,
        frame_size: 0,
        name: StringId(0),
        kind: FunctionKind::Normal,
    };
    let table = vec![StringTableEntry::new(0, 1, StringEncoding::Narrow)];
    let err = BytecodeModule::new(vec![0; 4], vec![header], table, b"f".to_vec()).unwrap_err();
    assert!(matches!(err, Error::OffsetOutOfBounds(10, 4)), "got {err}");
}

#[test]
fn truncated_function_code_fails_to_decode() {
    let mut code = ret0();
    code.pop();
    let mut b = ModuleBuilder::new();
    let f = b.add_function(FunctionDef::new("broken", &code));
    let module = b.finish().unwrap();
    let err = module.instructions(f).unwrap_err();
    assert!(matches!(err, Error::Decode(hbc_isa::DecodeError::Truncated(2))), "got {err}");
}
