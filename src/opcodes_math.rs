/// Arithmetic, bitwise and comparison operations
///
/// Values are 16-bit words. Arithmetic treats them as signed and wraps on
/// overflow; the comparisons jl and jg are signed as well.
use log::debug;

use crate::error::{ZError, ZResult};
use crate::instruction::Instruction;
use crate::interpreter::{operand, ExecutionResult, Interpreter};

impl Interpreter {
    fn signed_pair(ops: &[u16]) -> ZResult<(i16, i16)> {
        Ok((operand(ops, 0)? as i16, operand(ops, 1)? as i16))
    }

    // ---- 2OP ARITHMETIC ----

    pub(crate) fn op_add(&mut self, inst: &Instruction, ops: &[u16]) -> ZResult<ExecutionResult> {
        let (a, b) = Self::signed_pair(ops)?;
        self.store_result(inst, a.wrapping_add(b) as u16)?;
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_sub(&mut self, inst: &Instruction, ops: &[u16]) -> ZResult<ExecutionResult> {
        let (a, b) = Self::signed_pair(ops)?;
        self.store_result(inst, a.wrapping_sub(b) as u16)?;
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_mul(&mut self, inst: &Instruction, ops: &[u16]) -> ZResult<ExecutionResult> {
        let (a, b) = Self::signed_pair(ops)?;
        self.store_result(inst, a.wrapping_mul(b) as u16)?;
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_div(&mut self, inst: &Instruction, ops: &[u16]) -> ZResult<ExecutionResult> {
        let (a, b) = Self::signed_pair(ops)?;
        if b == 0 {
            return Err(ZError::DivisionByZero);
        }
        // truncates toward zero; -32768 / -1 wraps
        self.store_result(inst, a.wrapping_div(b) as u16)?;
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_mod(&mut self, inst: &Instruction, ops: &[u16]) -> ZResult<ExecutionResult> {
        let (a, b) = Self::signed_pair(ops)?;
        if b == 0 {
            return Err(ZError::DivisionByZero);
        }
        self.store_result(inst, a.wrapping_rem(b) as u16)?;
        Ok(ExecutionResult::Continue)
    }

    // ---- BITWISE ----

    pub(crate) fn op_or(&mut self, inst: &Instruction, ops: &[u16]) -> ZResult<ExecutionResult> {
        self.store_result(inst, operand(ops, 0)? | operand(ops, 1)?)?;
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_and(&mut self, inst: &Instruction, ops: &[u16]) -> ZResult<ExecutionResult> {
        self.store_result(inst, operand(ops, 0)? & operand(ops, 1)?)?;
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_not(&mut self, inst: &Instruction, ops: &[u16]) -> ZResult<ExecutionResult> {
        self.store_result(inst, !operand(ops, 0)?)?;
        Ok(ExecutionResult::Continue)
    }

    // ---- COMPARISONS ----

    /// Branch if the first operand equals any of the others.
    pub(crate) fn op_je(&mut self, inst: &Instruction, ops: &[u16]) -> ZResult<ExecutionResult> {
        if ops.len() < 2 {
            return Err(ZError::InvalidOperand(format!(
                "je at {:04x} needs at least 2 operands",
                inst.address
            )));
        }
        let condition = ops[1..].contains(&ops[0]);
        debug!("je {:04x} in {:04x?} -> {}", ops[0], &ops[1..], condition);
        self.do_branch(inst, condition)
    }

    pub(crate) fn op_jl(&mut self, inst: &Instruction, ops: &[u16]) -> ZResult<ExecutionResult> {
        let (a, b) = Self::signed_pair(ops)?;
        self.do_branch(inst, a < b)
    }

    pub(crate) fn op_jg(&mut self, inst: &Instruction, ops: &[u16]) -> ZResult<ExecutionResult> {
        let (a, b) = Self::signed_pair(ops)?;
        self.do_branch(inst, a > b)
    }

    pub(crate) fn op_jz(&mut self, inst: &Instruction, ops: &[u16]) -> ZResult<ExecutionResult> {
        self.do_branch(inst, operand(ops, 0)? == 0)
    }

    /// Branch if every bit of the second operand is set in the first.
    pub(crate) fn op_test(&mut self, inst: &Instruction, ops: &[u16]) -> ZResult<ExecutionResult> {
        let flags = operand(ops, 1)?;
        self.do_branch(inst, operand(ops, 0)? & flags == flags)
    }
}
