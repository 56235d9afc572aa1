use thiserror::Error;

use crate::instruction::OperandCount;
use crate::io_trait::IoError;

/// Every failure the core can report. Load errors are raised before an engine
/// exists; everything else halts the engine that produced it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ZError {
    #[error("Unsupported story file version {0} (versions 1-3 are supported)")]
    UnsupportedVersion(u8),

    #[error("Dynamic memory size {0:#06x} is smaller than the 64-byte header")]
    InvalidDynamicMemory(u16),

    #[error("High memory at {high:#06x} overlaps dynamic memory ending at {dynamic:#06x}")]
    OverlappingMemoryRegions { high: u16, dynamic: u16 },

    #[error("Story file length {0:#x} exceeds the 128 KiB limit")]
    FileTooLarge(usize),

    #[error("Story file is truncated: {0} bytes")]
    TruncatedStory(usize),

    #[error("Memory access out of range at {address:#06x} (memory size {size:#06x})")]
    MemoryOutOfRange { address: usize, size: usize },

    #[error("Write to {0:#06x} outside dynamic memory")]
    WriteOutsideDynamicMemory(usize),

    #[error("Abbreviations nested too deeply in string at {0:#06x}")]
    AbbreviationTooDeep(usize),

    #[error("Character {0:?} cannot be encoded")]
    UnencodableCharacter(char),

    #[error("Invalid operand: {0}")]
    InvalidOperand(String),

    #[error("Property {property} not found on object {object}")]
    PropertyNotFound { object: u8, property: u8 },

    #[error("Property {property} of object {object} is {length} bytes long")]
    PropertyTooLong { object: u8, property: u8, length: usize },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Omitted operand followed by a present one at {0:#06x}")]
    NonTerminatedOperands(usize),

    #[error("Unimplemented opcode {class}:{number:#04x} at {address:#06x}")]
    UnimplementedOpcode {
        class: OperandCount,
        number: u8,
        address: usize,
    },

    #[error("Value stack underflow in routine at {0:#06x}")]
    StackUnderflow(usize),

    #[error("Routine at {address:#06x} declares {count} locals")]
    TooManyLocals { address: usize, count: u8 },

    #[error("Return from the main routine")]
    ReturnFromMainRoutine,

    #[error("Instruction limit of {0} reached")]
    InstructionLimit(u64),

    #[error("{0}")]
    Io(#[from] IoError),
}

impl ZError {
    /// True for errors raised while validating a story image, before any
    /// instruction runs.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            ZError::UnsupportedVersion(_)
                | ZError::InvalidDynamicMemory(_)
                | ZError::OverlappingMemoryRegions { .. }
                | ZError::FileTooLarge(_)
                | ZError::TruncatedStory(_)
        )
    }
}

pub type ZResult<T> = Result<T, ZError>;
