//! The fetch-decode-execute loop
//!
//! Each step decodes the instruction at the PC, advances past it, resolves
//! variable operands, and dispatches through the static opcode table. Any
//! error halts the engine and is handed back to the host.

use log::{debug, info};

use crate::error::{ZError, ZResult};
use crate::instruction::{Instruction, OperandType};
use crate::io_trait::ZMachineIo;
use crate::opcode_tables;
use crate::vm::VM;

/// Result of executing an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionResult {
    /// Continue execution normally
    Continue,
    /// Branch taken, PC already updated
    Branched,
    /// Routine called, PC updated
    Called,
    /// Routine returned
    Returned(u16),
    /// Game should quit
    Quit,
}

/// The main Z-Machine interpreter
pub struct Interpreter {
    /// The VM state
    pub vm: VM,
    io: Box<dyn ZMachineIo>,
    halted: bool,
    instruction_count: u64,
    instruction_limit: Option<u64>,
}

/// Operand `i`, or an error naming the instruction that lacked it.
pub(crate) fn operand(ops: &[u16], i: usize) -> ZResult<u16> {
    ops.get(i)
        .copied()
        .ok_or_else(|| ZError::InvalidOperand(format!("missing operand {}", i + 1)))
}

impl Interpreter {
    pub fn new(vm: VM, io: Box<dyn ZMachineIo>) -> Self {
        Interpreter {
            vm,
            io,
            halted: false,
            instruction_count: 0,
            instruction_limit: None,
        }
    }

    /// Stop with `InstructionLimit` after `limit` instructions.
    pub fn set_instruction_limit(&mut self, limit: Option<u64>) {
        self.instruction_limit = limit;
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn instruction_count(&self) -> u64 {
        self.instruction_count
    }

    /// Run until the story quits or an error halts the engine.
    pub fn run(&mut self) -> ZResult<()> {
        while !self.halted {
            self.step()?;
        }
        info!("halted after {} instructions", self.instruction_count);
        Ok(())
    }

    /// Execute one instruction. Errors halt the engine.
    pub fn step(&mut self) -> ZResult<ExecutionResult> {
        if self.halted {
            return Ok(ExecutionResult::Quit);
        }
        let result = self.execute_next();
        match result {
            Ok(ExecutionResult::Quit) => {
                self.halted = true;
                self.io.flush()?;
            }
            Err(ref e) => {
                info!("halting at {:04x}: {}", self.vm.pc, e);
                self.halted = true;
                // the error is what the host needs to see
                let _ = self.io.flush();
            }
            Ok(_) => {}
        }
        result
    }

    fn execute_next(&mut self) -> ZResult<ExecutionResult> {
        if let Some(limit) = self.instruction_limit {
            if self.instruction_count >= limit {
                return Err(ZError::InstructionLimit(limit));
            }
        }
        let inst = Instruction::decode(self.vm.memory(), self.vm.pc)?;
        debug!("{}", inst);
        self.vm.pc = inst.next_address();
        let operands = self.resolve_operands(&inst)?;
        self.instruction_count += 1;
        self.execute_instruction(&inst, &operands)
    }

    /// Dispatch a decoded instruction whose operands are already resolved.
    pub fn execute_instruction(
        &mut self,
        inst: &Instruction,
        operands: &[u16],
    ) -> ZResult<ExecutionResult> {
        let entry = opcode_tables::lookup(inst.operand_count, inst.opcode).ok_or(
            ZError::UnimplementedOpcode {
                class: inst.operand_count,
                number: inst.opcode,
                address: inst.address,
            },
        )?;
        (entry.handler)(self, inst, operands)
    }

    /// Constants are used as-is; variables are read now, left to right.
    pub fn resolve_operands(&mut self, inst: &Instruction) -> ZResult<Vec<u16>> {
        let mut values = Vec::with_capacity(inst.operands.len());
        for (op_type, &raw) in inst.operand_types.iter().zip(&inst.operands) {
            values.push(match op_type {
                OperandType::Variable => self.vm.read_variable(raw as u8)?,
                _ => raw,
            });
        }
        Ok(values)
    }

    pub(crate) fn store_result(&mut self, inst: &Instruction, value: u16) -> ZResult<()> {
        if let Some(var) = inst.store_var {
            self.vm.write_variable(var, value)?;
        }
        Ok(())
    }

    pub(crate) fn do_branch(
        &mut self,
        inst: &Instruction,
        condition: bool,
    ) -> ZResult<ExecutionResult> {
        let Some(branch) = inst.branch else {
            return Ok(ExecutionResult::Continue);
        };
        if condition != branch.on_true {
            return Ok(ExecutionResult::Continue);
        }
        match branch.offset {
            0 => self.do_return(0),
            1 => self.do_return(1),
            offset => {
                // relative to the address after the branch data
                let new_pc = self.vm.pc as i64 + offset as i64 - 2;
                debug!("branch {:04x} -> {:04x}", self.vm.pc, new_pc);
                self.vm.pc = usize::try_from(new_pc).map_err(|_| {
                    ZError::InvalidOperand(format!("branch target {new_pc} before memory"))
                })?;
                Ok(ExecutionResult::Branched)
            }
        }
    }

    pub(crate) fn do_call(&mut self, inst: &Instruction, ops: &[u16]) -> ZResult<ExecutionResult> {
        let packed = operand(ops, 0)?;
        if packed == 0 {
            self.store_result(inst, 0)?;
            return Ok(ExecutionResult::Continue);
        }
        self.vm
            .call_routine(packed as usize * 2, &ops[1..], inst.store_var)?;
        Ok(ExecutionResult::Called)
    }

    pub(crate) fn do_return(&mut self, value: u16) -> ZResult<ExecutionResult> {
        self.vm.return_from_routine(value)?;
        Ok(ExecutionResult::Returned(value))
    }

    pub(crate) fn output_text(&mut self, text: &str) -> ZResult<()> {
        self.io.print(text)?;
        Ok(())
    }

    pub(crate) fn io(&mut self) -> &mut dyn ZMachineIo {
        self.io.as_mut()
    }
}
