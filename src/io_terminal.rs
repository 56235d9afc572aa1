//! Plain stdin/stdout I/O for the console host

use std::io::{self, BufRead, Write};

use crate::io_trait::{IoError, ZMachineIo};

pub struct TerminalIo<R, W> {
    input: R,
    output: W,
}

impl TerminalIo<io::StdinLock<'static>, io::Stdout> {
    pub fn new() -> Self {
        TerminalIo {
            input: io::stdin().lock(),
            output: io::stdout(),
        }
    }
}

impl Default for TerminalIo<io::StdinLock<'static>, io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: BufRead, W: Write> TerminalIo<R, W> {
    pub fn from_parts(input: R, output: W) -> Self {
        TerminalIo { input, output }
    }
}

impl<R: BufRead, W: Write> ZMachineIo for TerminalIo<R, W> {
    fn print(&mut self, text: &str) -> Result<(), IoError> {
        self.output.write_all(text.as_bytes())?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, IoError> {
        // the prompt is printed without a newline
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(IoError::end_of_input());
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(line)
    }

    fn flush(&mut self) -> Result<(), IoError> {
        self.output.flush()?;
        Ok(())
    }
}
