//! Core I/O trait for Z-Machine hosts
//!
//! The interpreter only talks to the outside world through this trait.
//! Hosts (terminal, tests, network sessions) provide the implementation.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoErrorKind {
    /// No more input will arrive; the engine stops cleanly
    EndOfInput,
    Other,
}

/// I/O error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("I/O error: {message}")]
pub struct IoError {
    pub kind: IoErrorKind,
    pub message: String,
}

impl IoError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: IoErrorKind::Other,
            message: message.into(),
        }
    }

    pub fn end_of_input() -> Self {
        Self {
            kind: IoErrorKind::EndOfInput,
            message: "end of input".to_string(),
        }
    }

    pub fn is_end_of_input(&self) -> bool {
        self.kind == IoErrorKind::EndOfInput
    }
}

impl From<std::io::Error> for IoError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => IoError::end_of_input(),
            _ => IoError::new(err.to_string()),
        }
    }
}

/// Core trait for Z-Machine input and output
pub trait ZMachineIo {
    /// Print text exactly as given
    fn print(&mut self, text: &str) -> Result<(), IoError>;

    /// Print a signed number in decimal
    fn print_num(&mut self, value: i16) -> Result<(), IoError> {
        self.print(&value.to_string())
    }

    /// Block until a full line is available. The line terminator is not
    /// included. End of input is reported as `IoErrorKind::EndOfInput`.
    fn read_line(&mut self) -> Result<String, IoError>;

    /// Push buffered output to the host
    fn flush(&mut self) -> Result<(), IoError> {
        Ok(())
    }
}
