/// Call, return, stack and control flow operations
use log::debug;

use crate::error::ZResult;
use crate::instruction::Instruction;
use crate::interpreter::{operand, ExecutionResult, Interpreter};

impl Interpreter {
    pub(crate) fn op_call(&mut self, inst: &Instruction, ops: &[u16]) -> ZResult<ExecutionResult> {
        self.do_call(inst, ops)
    }

    pub(crate) fn op_ret(&mut self, _inst: &Instruction, ops: &[u16]) -> ZResult<ExecutionResult> {
        self.do_return(operand(ops, 0)?)
    }

    pub(crate) fn op_rtrue(
        &mut self,
        _inst: &Instruction,
        _ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        self.do_return(1)
    }

    pub(crate) fn op_rfalse(
        &mut self,
        _inst: &Instruction,
        _ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        self.do_return(0)
    }

    pub(crate) fn op_ret_popped(
        &mut self,
        _inst: &Instruction,
        _ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        let value = self.vm.call_stack.current_mut().pop_value()?;
        self.do_return(value)
    }

    pub(crate) fn op_push(&mut self, _inst: &Instruction, ops: &[u16]) -> ZResult<ExecutionResult> {
        self.vm.write_variable(0, operand(ops, 0)?)?;
        Ok(ExecutionResult::Continue)
    }

    /// Pop the stack into the variable named by the operand. Naming the
    /// stack itself pushes the value back.
    pub(crate) fn op_pull(&mut self, _inst: &Instruction, ops: &[u16]) -> ZResult<ExecutionResult> {
        let var = operand(ops, 0)? as u8;
        let value = self.vm.call_stack.current_mut().pop_value()?;
        debug!("pull {:04x} -> var {:02x}", value, var);
        self.vm.write_variable(var, value)?;
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_pop(&mut self, _inst: &Instruction, _ops: &[u16]) -> ZResult<ExecutionResult> {
        self.vm.call_stack.current_mut().pop_value()?;
        Ok(ExecutionResult::Continue)
    }

    /// Unconditional jump by a signed offset, measured like a branch.
    pub(crate) fn op_jump(&mut self, _inst: &Instruction, ops: &[u16]) -> ZResult<ExecutionResult> {
        let offset = operand(ops, 0)? as i16;
        let new_pc = self.vm.pc as i64 + offset as i64 - 2;
        self.vm.pc = usize::try_from(new_pc).map_err(|_| {
            crate::error::ZError::InvalidOperand(format!("jump target {new_pc} before memory"))
        })?;
        Ok(ExecutionResult::Branched)
    }

    pub(crate) fn op_nop(&mut self, _inst: &Instruction, _ops: &[u16]) -> ZResult<ExecutionResult> {
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_quit(
        &mut self,
        _inst: &Instruction,
        _ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        debug!("quit at {:04x}", self.vm.pc);
        Ok(ExecutionResult::Quit)
    }
}
