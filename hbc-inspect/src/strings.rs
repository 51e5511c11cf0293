use hbc_file::{BytecodeModule, Error, FunctionId, Result, StringId};
use hbc_isa::{InstructionVisitor, Opcode, Operand, OperandType, is_operand_string_id};

/// Collects the strings referenced by a function's instructions, in
/// instruction order. Duplicates are kept.
///
/// Whether an operand is a string reference depends on the opcode it
/// belongs to, so the current opcode is tracked across operand callbacks.
pub struct StringExtractor<'m> {
    module: &'m BytecodeModule,
    opcode: Option<Opcode>,
    strings: Vec<String>,
    error: Option<Error>,
}

impl<'m> StringExtractor<'m> {
    pub fn new(module: &'m BytecodeModule) -> Self {
        Self {
            module,
            opcode: None,
            strings: Vec::new(),
            error: None,
        }
    }

    /// Finish extraction, yielding every string found or the first error.
    pub fn finish(self) -> Result<Vec<String>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.strings),
        }
    }

    fn visit_string(&mut self, id: StringId) {
        match self.module.get_string(id) {
            Ok(s) => {
                log::trace!("string {id}: {s:?}");
                self.strings.push(s);
            }
            Err(err) => self.error = Some(err),
        }
    }
}

/// An operand declared as a string id is resolved only when its decoded
/// type is not address-relative.
fn resolves_string(declared: bool, ty: OperandType) -> bool {
    declared && !ty.is_address()
}

impl InstructionVisitor for StringExtractor<'_> {
    fn pre_visit_instruction(&mut self, opcode: Opcode, _offset: usize, _length: usize) {
        self.opcode = Some(opcode);
    }

    fn visit_operand(&mut self, _offset: usize, index: usize, operand: Operand) {
        if self.error.is_some() {
            return;
        }
        let Some(opcode) = self.opcode else {
            return;
        };
        if !resolves_string(is_operand_string_id(opcode, index), operand.ty) {
            return;
        }
        if let Some(raw) = operand.value.as_unsigned() {
            self.visit_string(StringId(raw));
        }
    }
}

/// Extract every string referenced by function `id`, in instruction order.
///
/// Either the complete sequence is returned or an error; malformed code or
/// a dangling string id never yields a partial result.
pub fn extract_strings(module: &BytecodeModule, id: FunctionId) -> Result<Vec<String>> {
    let code = module.function_code(id)?;
    log::debug!("extracting strings from function {id} ({} bytes)", code.len());
    let mut extractor = StringExtractor::new(module);
    hbc_isa::walk(code, &mut extractor)?;
    extractor.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_operands_are_never_string_ids() {
        assert!(!resolves_string(true, OperandType::Addr8));
        assert!(!resolves_string(true, OperandType::Addr32));
        assert!(resolves_string(true, OperandType::UInt16));
        assert!(!resolves_string(false, OperandType::UInt16));
    }

    #[test]
    fn address_operand_at_string_position_is_skipped() {
        use hbc_file::ModuleBuilder;
        use hbc_isa::OperandValue;

        let mut b = ModuleBuilder::new();
        let id = b.add_string("never");
        let module = b.finish().unwrap();

        let mut extractor = StringExtractor::new(&module);
        extractor.pre_visit_instruction(Opcode::LoadConstString, 0, 4);
        extractor.visit_operand(0, 0, Operand {
            ty: OperandType::Reg8,
            value: OperandValue::Unsigned(0),
        });
        extractor.visit_operand(0, 1, Operand {
            ty: OperandType::Addr8,
            value: OperandValue::Unsigned(id.0),
        });
        extractor.post_visit_instruction(Opcode::LoadConstString, 0);
        assert!(extractor.finish().unwrap().is_empty());

        let mut extractor = StringExtractor::new(&module);
        extractor.pre_visit_instruction(Opcode::LoadConstString, 0, 4);
        extractor.visit_operand(0, 1, Operand {
            ty: OperandType::UInt16,
            value: OperandValue::Unsigned(id.0),
        });
        assert_eq!(extractor.finish().unwrap(), vec!["never"]);
    }
}
