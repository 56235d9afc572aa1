use std::fmt::{Display, Error, Formatter};

use crate::error::{ZError, ZResult};
use crate::memory::{Cursor, MemoryImage};
use crate::opcode_tables;
use crate::text;

/// Operand types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandType {
    /// Large constant (2 bytes)
    LargeConstant,
    /// Small constant (1 byte)
    SmallConstant,
    /// Variable number
    Variable,
    /// Omitted (not present)
    Omitted,
}

impl OperandType {
    /// Parse operand type from 2-bit value
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0b00 => OperandType::LargeConstant,
            0b01 => OperandType::SmallConstant,
            0b10 => OperandType::Variable,
            _ => OperandType::Omitted,
        }
    }
}

/// Instruction forms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionForm {
    Long,
    Short,
    Variable,
}

/// Operand count categories. Each has its own opcode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandCount {
    OP0,
    OP1,
    OP2,
    VAR,
}

impl Display for OperandCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let name = match self {
            OperandCount::OP0 => "0OP",
            OperandCount::OP1 => "1OP",
            OperandCount::OP2 => "2OP",
            OperandCount::VAR => "VAR",
        };
        f.write_str(name)
    }
}

/// Branch information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchInfo {
    /// True if branch on true, false if branch on false
    pub on_true: bool,
    /// 0 and 1 mean return false/true; anything else is a jump
    pub offset: i16,
}

impl BranchInfo {
    /// Read one or two bytes of branch data.
    pub fn read(seq: &mut Cursor<&MemoryImage>) -> ZResult<BranchInfo> {
        let info = seq.read_byte()?;
        let on_true = info & 0x80 != 0;
        let offset = if info & 0x40 != 0 {
            (info & 0x3F) as i16
        } else {
            let mut high = info & 0x3F;
            // 14-bit two's complement: copy the sign into the top two bits
            if high & 0x20 != 0 {
                high |= 0xC0;
            }
            i16::from_be_bytes([high, seq.read_byte()?])
        };
        Ok(BranchInfo { on_true, offset })
    }
}

/// A decoded instruction. Operands are raw; the interpreter resolves
/// variable operands before dispatching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub address: usize,
    pub opcode: u8,
    pub form: InstructionForm,
    pub operand_count: OperandCount,
    pub operand_types: Vec<OperandType>,
    pub operands: Vec<u16>,
    /// Variable to store result (if applicable)
    pub store_var: Option<u8>,
    pub branch: Option<BranchInfo>,
    /// Inline Z-string for print and print_ret
    pub text_addr: Option<usize>,
    /// Total size of instruction in bytes
    pub size: usize,
}

impl Instruction {
    /// Decode the instruction at `addr`.
    pub fn decode(memory: &MemoryImage, addr: usize) -> ZResult<Instruction> {
        let mut seq = memory.cursor(addr);
        let opcode_byte = seq.read_byte()?;

        let (form, opcode, operand_count) = match opcode_byte >> 6 {
            0b11 => {
                let count = if opcode_byte & 0x20 == 0 {
                    OperandCount::OP2
                } else {
                    OperandCount::VAR
                };
                (InstructionForm::Variable, opcode_byte & 0x1F, count)
            }
            0b10 => {
                let count = if (opcode_byte >> 4) & 0x03 == 0x03 {
                    OperandCount::OP0
                } else {
                    OperandCount::OP1
                };
                (InstructionForm::Short, opcode_byte & 0x0F, count)
            }
            _ => (InstructionForm::Long, opcode_byte & 0x1F, OperandCount::OP2),
        };

        let mut operand_types = Vec::with_capacity(4);
        match form {
            InstructionForm::Long => {
                for mask in [0x40, 0x20] {
                    operand_types.push(if opcode_byte & mask != 0 {
                        OperandType::Variable
                    } else {
                        OperandType::SmallConstant
                    });
                }
            }
            InstructionForm::Short => {
                if operand_count == OperandCount::OP1 {
                    operand_types.push(OperandType::from_bits(opcode_byte >> 4));
                }
            }
            InstructionForm::Variable => {
                let type_byte = seq.read_byte()?;
                let mut omitted = false;
                for i in 0..4 {
                    let op_type = OperandType::from_bits(type_byte >> (6 - i * 2));
                    match (op_type, omitted) {
                        (OperandType::Omitted, _) => omitted = true,
                        (_, true) => return Err(ZError::NonTerminatedOperands(addr)),
                        (t, false) => operand_types.push(t),
                    }
                }
            }
        }

        let mut operands = Vec::with_capacity(operand_types.len());
        for op_type in &operand_types {
            operands.push(match op_type {
                OperandType::LargeConstant => seq.read_word()?,
                _ => seq.read_byte()? as u16,
            });
        }

        let entry = opcode_tables::lookup(operand_count, opcode).ok_or(
            ZError::UnimplementedOpcode {
                class: operand_count,
                number: opcode,
                address: addr,
            },
        )?;

        let store_var = if entry.stores {
            Some(seq.read_byte()?)
        } else {
            None
        };
        let branch = if entry.branches {
            Some(BranchInfo::read(&mut seq)?)
        } else {
            None
        };
        let text_addr = if entry.text {
            let start = seq.pos;
            seq.pos += text::encoded_length(memory, start)?;
            Some(start)
        } else {
            None
        };

        Ok(Instruction {
            address: addr,
            opcode,
            form,
            operand_count,
            operand_types,
            operands,
            store_var,
            branch,
            text_addr,
            size: seq.pos - addr,
        })
    }

    pub fn name(&self) -> &'static str {
        opcode_tables::lookup(self.operand_count, self.opcode).map_or("unknown", |e| e.name)
    }

    /// Address of the instruction that follows this one.
    pub fn next_address(&self) -> usize {
        self.address + self.size
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{:05x}: {} {}", self.address, self.operand_count, self.name())?;
        for (t, v) in self.operand_types.iter().zip(&self.operands) {
            match t {
                OperandType::Variable if *v == 0 => write!(f, " (SP)+")?,
                OperandType::Variable if *v < 0x10 => write!(f, " L{:02x}", v - 1)?,
                OperandType::Variable => write!(f, " G{:02x}", v - 0x10)?,
                _ => write!(f, " #{v:04x}")?,
            }
        }
        if let Some(var) = self.store_var {
            write!(f, " -> {var:02x}")?;
        }
        if let Some(b) = self.branch {
            write!(f, " ?{}{}", if b.on_true { "" } else { "~" }, b.offset)?;
        }
        Ok(())
    }
}
