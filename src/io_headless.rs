//! Headless I/O for tests and embedding
//!
//! Input comes from a script of lines; output is collected into a string.
//! Clones share the same buffers, so a test can keep one handle while the
//! interpreter owns another.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use log::debug;

use crate::io_trait::{IoError, ZMachineIo};

#[derive(Debug, Default)]
struct Buffers {
    input: VecDeque<String>,
    output: String,
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessIo {
    buffers: Rc<RefCell<Buffers>>,
}

impl HeadlessIo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Headless I/O that answers `read_line` with `lines` in order.
    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let io = Self::new();
        io.buffers
            .borrow_mut()
            .input
            .extend(lines.into_iter().map(Into::into));
        io
    }

    pub fn push_input(&self, line: impl Into<String>) {
        self.buffers.borrow_mut().input.push_back(line.into());
    }

    /// Everything printed so far
    pub fn output(&self) -> String {
        self.buffers.borrow().output.clone()
    }

    /// Take the output collected so far, leaving the buffer empty
    pub fn take_output(&self) -> String {
        std::mem::take(&mut self.buffers.borrow_mut().output)
    }
}

impl ZMachineIo for HeadlessIo {
    fn print(&mut self, text: &str) -> Result<(), IoError> {
        self.buffers.borrow_mut().output.push_str(text);
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, IoError> {
        let line = self.buffers.borrow_mut().input.pop_front();
        match line {
            Some(line) => {
                debug!("headless input: {:?}", line);
                Ok(line)
            }
            None => Err(IoError::end_of_input()),
        }
    }
}
