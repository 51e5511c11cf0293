use hbc_isa::*;

/// Assemble a program from `(opcode, operands)` pairs.
pub fn assemble(program: &[(Opcode, &[i64])]) -> Vec<u8> {
    let mut e = Emitter::new();
    for &(opcode, operands) in program {
        e.emit(opcode, operands).unwrap();
    }
    e.finish()
}
