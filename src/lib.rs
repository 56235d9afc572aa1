#![crate_name = "lantern"]

#[macro_use]
extern crate lazy_static;

pub mod config;
pub mod dictionary;
pub mod error;
pub mod header;
pub mod instruction;
pub mod interpreter;
pub mod io_headless;
pub mod io_terminal;
pub mod io_trait;
pub mod memory;
pub mod opcode_tables;
pub mod routine;
pub mod test_utils;
pub mod text;
pub mod vm;
pub mod zobject;
pub mod zrand;

mod opcodes_display;
mod opcodes_io;
mod opcodes_math;
mod opcodes_memory;
mod opcodes_object;
mod opcodes_stack;

#[cfg(test)]
mod call_tests;
#[cfg(test)]
mod io_tests;

pub use error::{ZError, ZResult};
pub use interpreter::{ExecutionResult, Interpreter};
pub use io_trait::{IoError, ZMachineIo};
pub use vm::{Game, VM};

/*
Memory map of the images built by test_utils::StoryBuilder
Dynamic 00000   header
        00040   abbreviation table
        00100   property defaults, objects, property blocks
        00600   global variables
        00800   scratch buffers
Static  00900
        00a00   dictionary
        00b00   abbreviation strings
        00c00   strings
High    01000   Z-code
*/
