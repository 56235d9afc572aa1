/// Memory and variable operations
///
/// loadw/storew index by words from a base address and loadb/storeb by
/// bytes. Address arithmetic is 16-bit, so a negative index reaches below
/// the base. The variable opcodes take the variable number as an operand.
/// store pushes when that number is 0; load, inc and dec read or replace
/// the top of the stack in place.
use log::debug;

use crate::error::ZResult;
use crate::instruction::Instruction;
use crate::interpreter::{operand, ExecutionResult, Interpreter};

fn word_index(ops: &[u16]) -> ZResult<usize> {
    Ok(operand(ops, 0)?.wrapping_add(operand(ops, 1)?.wrapping_mul(2)) as usize)
}

fn byte_index(ops: &[u16]) -> ZResult<usize> {
    Ok(operand(ops, 0)?.wrapping_add(operand(ops, 1)?) as usize)
}

impl Interpreter {
    pub(crate) fn op_loadw(&mut self, inst: &Instruction, ops: &[u16]) -> ZResult<ExecutionResult> {
        let value = self.vm.read_word(word_index(ops)?)?;
        self.store_result(inst, value)?;
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_loadb(&mut self, inst: &Instruction, ops: &[u16]) -> ZResult<ExecutionResult> {
        let value = self.vm.read_byte(byte_index(ops)?)?;
        self.store_result(inst, value as u16)?;
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_storew(
        &mut self,
        _inst: &Instruction,
        ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        let addr = word_index(ops)?;
        debug!("storew {:04x} <- {:04x}", addr, operand(ops, 2)?);
        self.vm.write_word(addr, operand(ops, 2)?)?;
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_storeb(
        &mut self,
        _inst: &Instruction,
        ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        let addr = byte_index(ops)?;
        self.vm.write_byte(addr, operand(ops, 2)? as u8)?;
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_load(&mut self, inst: &Instruction, ops: &[u16]) -> ZResult<ExecutionResult> {
        let value = self.vm.read_variable_indirect(operand(ops, 0)? as u8)?;
        self.store_result(inst, value)?;
        Ok(ExecutionResult::Continue)
    }

    /// Variable 0 pushes, like any other store to the stack.
    pub(crate) fn op_store(
        &mut self,
        _inst: &Instruction,
        ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        self.vm
            .write_variable(operand(ops, 0)? as u8, operand(ops, 1)?)?;
        Ok(ExecutionResult::Continue)
    }

    /// Add `delta` to the variable named by the first operand and return the
    /// new value as signed.
    fn adjust_variable(&mut self, ops: &[u16], delta: i16) -> ZResult<i16> {
        let var = operand(ops, 0)? as u8;
        let value = (self.vm.read_variable_indirect(var)? as i16).wrapping_add(delta);
        self.vm.write_variable_indirect(var, value as u16)?;
        Ok(value)
    }

    pub(crate) fn op_inc(&mut self, _inst: &Instruction, ops: &[u16]) -> ZResult<ExecutionResult> {
        self.adjust_variable(ops, 1)?;
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_dec(&mut self, _inst: &Instruction, ops: &[u16]) -> ZResult<ExecutionResult> {
        self.adjust_variable(ops, -1)?;
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_inc_chk(
        &mut self,
        inst: &Instruction,
        ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        let value = self.adjust_variable(ops, 1)?;
        self.do_branch(inst, value > operand(ops, 1)? as i16)
    }

    pub(crate) fn op_dec_chk(
        &mut self,
        inst: &Instruction,
        ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        let value = self.adjust_variable(ops, -1)?;
        self.do_branch(inst, value < operand(ops, 1)? as i16)
    }
}
