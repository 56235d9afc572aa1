/// Text output operations
///
/// Everything here ends in a print on the I/O collaborator, in program
/// order.
use log::warn;

use crate::error::{ZError, ZResult};
use crate::instruction::Instruction;
use crate::interpreter::{operand, ExecutionResult, Interpreter};

impl Interpreter {
    fn print_inline(&mut self, inst: &Instruction) -> ZResult<()> {
        let addr = inst.text_addr.ok_or_else(|| {
            ZError::InvalidOperand(format!("no inline text at {:04x}", inst.address))
        })?;
        let text = self.vm.read_string(addr)?;
        self.output_text(&text)
    }

    pub(crate) fn op_print(
        &mut self,
        inst: &Instruction,
        _ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        self.print_inline(inst)?;
        Ok(ExecutionResult::Continue)
    }

    /// Print, print a newline, then return true.
    pub(crate) fn op_print_ret(
        &mut self,
        inst: &Instruction,
        _ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        self.print_inline(inst)?;
        self.output_text("\n")?;
        self.do_return(1)
    }

    pub(crate) fn op_new_line(
        &mut self,
        _inst: &Instruction,
        _ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        self.output_text("\n")?;
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_print_addr(
        &mut self,
        _inst: &Instruction,
        ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        let text = self.vm.read_string(operand(ops, 0)? as usize)?;
        self.output_text(&text)?;
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_print_paddr(
        &mut self,
        _inst: &Instruction,
        ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        let text = self.vm.read_packed_string(operand(ops, 0)?)?;
        self.output_text(&text)?;
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_print_obj(
        &mut self,
        _inst: &Instruction,
        ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        let name = self.vm.objects.get(operand(ops, 0)?)?.name().to_string();
        self.output_text(&name)?;
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_print_char(
        &mut self,
        _inst: &Instruction,
        ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        match operand(ops, 0)? {
            13 => self.output_text("\n")?,
            c @ 32..=126 => {
                let ch = char::from(c as u8);
                self.output_text(ch.encode_utf8(&mut [0; 4]))?;
            }
            0 => {}
            c => warn!("print_char: unprintable ZSCII {}", c),
        }
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_print_num(
        &mut self,
        _inst: &Instruction,
        ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        let value = operand(ops, 0)? as i16;
        self.io().print_num(value)?;
        Ok(ExecutionResult::Continue)
    }
}
