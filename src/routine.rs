//! Routine frames and the call stack
//!
//! A frame's locals and its value stack share one vector: the first
//! `num_locals` slots are locals, everything above is the stack. The
//! named accessors keep the two uses apart.

use std::fmt::{Display, Error, Formatter};

use log::debug;

use crate::error::{ZError, ZResult};
use crate::memory::MemoryImage;

/// Maximum number of local variables per routine
pub const MAX_LOCALS: u8 = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Address of the routine header
    pub address: usize,
    /// PC to resume at in the caller
    pub return_pc: usize,
    /// Where the caller wants the result (None = discard)
    pub return_store: Option<u8>,
    num_locals: u8,
    values: Vec<u16>,
}

impl Frame {
    /// Frame with no locals, used for the entry point.
    pub fn main(address: usize) -> Frame {
        Frame {
            address,
            return_pc: 0,
            return_store: None,
            num_locals: 0,
            values: Vec::new(),
        }
    }

    /// Read the routine header at `address` and build a frame whose locals
    /// hold the declared defaults, overwritten by `args`. Returns the frame
    /// and the address of the routine's first instruction.
    pub fn from_routine(
        memory: &MemoryImage,
        address: usize,
        args: &[u16],
        return_pc: usize,
        return_store: Option<u8>,
    ) -> ZResult<(Frame, usize)> {
        let mut seq = memory.cursor(address);
        let count = seq.read_byte()?;
        if count > MAX_LOCALS {
            return Err(ZError::TooManyLocals { address, count });
        }
        let mut values = Vec::with_capacity(count as usize + 8);
        for _ in 0..count {
            values.push(seq.read_word()?);
        }
        for (slot, arg) in values.iter_mut().zip(args) {
            *slot = *arg;
        }
        debug!(
            "routine {:04x}: {} locals, {} args",
            address,
            count,
            args.len()
        );
        let frame = Frame {
            address,
            return_pc,
            return_store,
            num_locals: count,
            values,
        };
        Ok((frame, seq.pos))
    }

    pub fn num_locals(&self) -> u8 {
        self.num_locals
    }

    pub fn push_value(&mut self, value: u16) {
        self.values.push(value);
    }

    pub fn pop_value(&mut self) -> ZResult<u16> {
        if self.values.len() <= self.num_locals as usize {
            return Err(ZError::StackUnderflow(self.address));
        }
        self.values.pop().ok_or(ZError::StackUnderflow(self.address))
    }

    pub fn peek_value(&self) -> ZResult<u16> {
        if self.values.len() <= self.num_locals as usize {
            return Err(ZError::StackUnderflow(self.address));
        }
        self.values
            .last()
            .copied()
            .ok_or(ZError::StackUnderflow(self.address))
    }

    pub fn stack_depth(&self) -> usize {
        self.values.len() - self.num_locals as usize
    }

    fn local_index(&self, n: u8) -> ZResult<usize> {
        if n == 0 || n > self.num_locals {
            return Err(ZError::InvalidOperand(format!(
                "local {} in routine {:04x} with {} locals",
                n, self.address, self.num_locals
            )));
        }
        Ok(n as usize - 1)
    }

    /// Local variable `n` (1-based, as named by variables 1..15).
    pub fn local_get(&self, n: u8) -> ZResult<u16> {
        let i = self.local_index(n)?;
        Ok(self.values[i])
    }

    pub fn local_set(&mut self, n: u8, value: u16) -> ZResult<()> {
        let i = self.local_index(n)?;
        self.values[i] = value;
        Ok(())
    }
}

impl Display for Frame {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let (locals, stack) = self.values.split_at(self.num_locals as usize);
        write!(f, "routine {:04x} locals {:04x?} stack {:04x?}", self.address, locals, stack)
    }
}

/// Frames from the entry routine upward. The entry frame can never be popped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallStack {
    main: Frame,
    frames: Vec<Frame>,
}

impl CallStack {
    pub fn new(main: Frame) -> CallStack {
        CallStack {
            main,
            frames: Vec::new(),
        }
    }

    pub fn current(&self) -> &Frame {
        self.frames.last().unwrap_or(&self.main)
    }

    pub fn current_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().unwrap_or(&mut self.main)
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> ZResult<Frame> {
        self.frames.pop().ok_or(ZError::ReturnFromMainRoutine)
    }

    /// Number of frames, counting the entry frame.
    pub fn depth(&self) -> usize {
        self.frames.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn routine(locals: &[u16]) -> MemoryImage {
        let mut bytes = vec![locals.len() as u8];
        for l in locals {
            bytes.extend_from_slice(&l.to_be_bytes());
        }
        bytes.push(0xB0);
        MemoryImage::new(bytes)
    }

    #[test]
    fn test_args_overwrite_defaults() {
        let mem = routine(&[7, 8, 9]);
        let (frame, start) = Frame::from_routine(&mem, 0, &[1, 2], 0x100, Some(3)).unwrap();
        assert_eq!(start, 7);
        assert_eq!(frame.local_get(1).unwrap(), 1);
        assert_eq!(frame.local_get(2).unwrap(), 2);
        assert_eq!(frame.local_get(3).unwrap(), 9);
        assert_eq!(frame.return_pc, 0x100);
        assert_eq!(frame.return_store, Some(3));
    }

    #[test]
    fn test_extra_args_are_dropped() {
        let mem = routine(&[7]);
        let (frame, _) = Frame::from_routine(&mem, 0, &[1, 2, 3], 0, None).unwrap();
        assert_eq!(frame.num_locals(), 1);
        assert_eq!(frame.stack_depth(), 0);
        assert!(frame.local_get(2).is_err());
    }

    #[test]
    fn test_too_many_locals() {
        let mem = MemoryImage::new(vec![16]);
        let err = Frame::from_routine(&mem, 0, &[], 0, None).unwrap_err();
        assert_eq!(err, ZError::TooManyLocals { address: 0, count: 16 });
    }

    #[test]
    fn test_stack_does_not_eat_locals() {
        let mem = routine(&[5]);
        let (mut frame, _) = Frame::from_routine(&mem, 0, &[], 0, None).unwrap();
        frame.push_value(10);
        frame.push_value(11);
        assert_eq!(frame.peek_value().unwrap(), 11);
        assert_eq!(frame.pop_value().unwrap(), 11);
        assert_eq!(frame.pop_value().unwrap(), 10);
        assert_eq!(frame.pop_value(), Err(ZError::StackUnderflow(0)));
        assert_eq!(frame.local_get(1).unwrap(), 5);
    }

    #[test]
    fn test_local_zero_is_invalid() {
        let mut frame = Frame::main(0x40);
        assert!(frame.local_get(0).is_err());
        assert!(frame.local_set(1, 3).is_err());
    }

    #[test]
    fn test_main_frame_cannot_be_popped() {
        let mut stack = CallStack::new(Frame::main(0x40));
        assert_eq!(stack.depth(), 1);
        stack.current_mut().push_value(1);
        stack.push(Frame::main(0x80));
        assert_eq!(stack.current().address, 0x80);
        assert_eq!(stack.pop().unwrap().address, 0x80);
        assert_eq!(stack.current().stack_depth(), 1);
        assert_eq!(stack.pop(), Err(ZError::ReturnFromMainRoutine));
    }
}
