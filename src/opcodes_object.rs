/// Object tree, attribute and property operations
///
/// All of these go through the cached ObjectTable, which writes every
/// change back into story memory.
use log::debug;

use crate::error::ZResult;
use crate::instruction::Instruction;
use crate::interpreter::{operand, ExecutionResult, Interpreter};
use crate::zobject::ObjectTable;

impl Interpreter {
    // ---- TREE ----

    pub(crate) fn op_get_sibling(
        &mut self,
        inst: &Instruction,
        ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        let sibling = self.vm.objects.sibling(operand(ops, 0)?)?;
        self.store_result(inst, sibling as u16)?;
        self.do_branch(inst, sibling != 0)
    }

    pub(crate) fn op_get_child(
        &mut self,
        inst: &Instruction,
        ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        let child = self.vm.objects.child(operand(ops, 0)?)?;
        self.store_result(inst, child as u16)?;
        self.do_branch(inst, child != 0)
    }

    pub(crate) fn op_get_parent(
        &mut self,
        inst: &Instruction,
        ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        let parent = self.vm.objects.parent(operand(ops, 0)?)?;
        self.store_result(inst, parent as u16)?;
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_jin(&mut self, inst: &Instruction, ops: &[u16]) -> ZResult<ExecutionResult> {
        let parent = self.vm.objects.parent(operand(ops, 0)?)?;
        self.do_branch(inst, parent as u16 == operand(ops, 1)?)
    }

    pub(crate) fn op_remove_obj(
        &mut self,
        _inst: &Instruction,
        ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        let id = operand(ops, 0)?;
        debug!("remove_obj {}", id);
        self.vm.objects.detach(&mut self.vm.game.memory, id)?;
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_insert_obj(
        &mut self,
        _inst: &Instruction,
        ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        let (id, dest) = (operand(ops, 0)?, operand(ops, 1)?);
        debug!("insert_obj {} into {}", id, dest);
        self.vm.objects.reparent(&mut self.vm.game.memory, id, dest)?;
        Ok(ExecutionResult::Continue)
    }

    // ---- ATTRIBUTES ----

    pub(crate) fn op_test_attr(
        &mut self,
        inst: &Instruction,
        ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        let set = self
            .vm
            .objects
            .test_attribute(operand(ops, 0)?, operand(ops, 1)?)?;
        self.do_branch(inst, set)
    }

    pub(crate) fn op_set_attr(
        &mut self,
        _inst: &Instruction,
        ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        self.vm.objects.set_attribute(
            &mut self.vm.game.memory,
            operand(ops, 0)?,
            operand(ops, 1)?,
            true,
        )?;
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_clear_attr(
        &mut self,
        _inst: &Instruction,
        ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        self.vm.objects.set_attribute(
            &mut self.vm.game.memory,
            operand(ops, 0)?,
            operand(ops, 1)?,
            false,
        )?;
        Ok(ExecutionResult::Continue)
    }

    // ---- PROPERTIES ----

    pub(crate) fn op_get_prop(
        &mut self,
        inst: &Instruction,
        ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        let value = self.vm.objects.get_property(
            &self.vm.game.memory,
            operand(ops, 0)?,
            operand(ops, 1)?,
        )?;
        self.store_result(inst, value)?;
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_get_prop_addr(
        &mut self,
        inst: &Instruction,
        ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        let addr = self
            .vm
            .objects
            .property_address(operand(ops, 0)?, operand(ops, 1)?)?;
        self.store_result(inst, addr as u16)?;
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_get_prop_len(
        &mut self,
        inst: &Instruction,
        ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        let len = ObjectTable::property_length_at(&self.vm.game.memory, operand(ops, 0)? as usize)?;
        self.store_result(inst, len as u16)?;
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_get_next_prop(
        &mut self,
        inst: &Instruction,
        ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        let next = self
            .vm
            .objects
            .next_property(operand(ops, 0)?, operand(ops, 1)?)?;
        self.store_result(inst, next as u16)?;
        Ok(ExecutionResult::Continue)
    }

    pub(crate) fn op_put_prop(
        &mut self,
        _inst: &Instruction,
        ops: &[u16],
    ) -> ZResult<ExecutionResult> {
        self.vm.objects.set_property(
            &mut self.vm.game.memory,
            operand(ops, 0)?,
            operand(ops, 1)?,
            operand(ops, 2)?,
        )?;
        Ok(ExecutionResult::Continue)
    }
}
