//! Story memory image
//!
//! The whole story file lives in one byte buffer owned by the VM. All words
//! are big-endian. Every accessor is range checked: an address past the end
//! of the image is an error, never a wrap-around.

use std::ops::{Deref, DerefMut};

use crate::error::{ZError, ZResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryImage {
    bytes: Vec<u8>,
}

impl MemoryImage {
    pub fn new(bytes: Vec<u8>) -> MemoryImage {
        MemoryImage { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn check(&self, address: usize, width: usize) -> ZResult<()> {
        match address.checked_add(width) {
            Some(end) if end <= self.bytes.len() => Ok(()),
            _ => Err(ZError::MemoryOutOfRange {
                address,
                size: self.bytes.len(),
            }),
        }
    }

    pub fn byte_at(&self, address: usize) -> ZResult<u8> {
        self.check(address, 1)?;
        Ok(self.bytes[address])
    }

    pub fn word_at(&self, address: usize) -> ZResult<u16> {
        self.check(address, 2)?;
        Ok(u16::from_be_bytes([self.bytes[address], self.bytes[address + 1]]))
    }

    pub fn uint32_at(&self, address: usize) -> ZResult<u32> {
        self.check(address, 4)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.bytes[address..address + 4]);
        Ok(u32::from_be_bytes(raw))
    }

    /// Borrow `len` bytes starting at `address`.
    pub fn slice(&self, address: usize, len: usize) -> ZResult<&[u8]> {
        self.check(address, len)?;
        Ok(&self.bytes[address..address + len])
    }

    pub fn write_byte_at(&mut self, address: usize, value: u8) -> ZResult<()> {
        self.check(address, 1)?;
        self.bytes[address] = value;
        Ok(())
    }

    pub fn write_word_at(&mut self, address: usize, value: u16) -> ZResult<()> {
        self.check(address, 2)?;
        self.bytes[address..address + 2].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Sequential reader positioned at `address`.
    pub fn cursor(&self, address: usize) -> Cursor<&MemoryImage> {
        Cursor::new(self, address)
    }

    /// Sequential reader/writer positioned at `address`.
    pub fn cursor_mut(&mut self, address: usize) -> Cursor<&mut MemoryImage> {
        Cursor::new(self, address)
    }
}

/// A position in memory that advances as it reads or writes.
///
/// Works over `&MemoryImage` for reading and over `&mut MemoryImage` when the
/// `write_*` methods are needed.
#[derive(Debug)]
pub struct Cursor<M> {
    memory: M,
    pub pos: usize,
}

impl<M> Cursor<M> {
    pub fn new(memory: M, pos: usize) -> Cursor<M> {
        Cursor { memory, pos }
    }
}

impl<M: Deref<Target = MemoryImage>> Cursor<M> {
    pub fn peek_byte(&self) -> ZResult<u8> {
        self.memory.byte_at(self.pos)
    }

    pub fn peek_word(&self) -> ZResult<u16> {
        self.memory.word_at(self.pos)
    }

    pub fn peek_uint32(&self) -> ZResult<u32> {
        self.memory.uint32_at(self.pos)
    }

    pub fn read_byte(&mut self) -> ZResult<u8> {
        let value = self.peek_byte()?;
        self.pos += 1;
        Ok(value)
    }

    pub fn read_word(&mut self) -> ZResult<u16> {
        let value = self.peek_word()?;
        self.pos += 2;
        Ok(value)
    }

    pub fn read_uint32(&mut self) -> ZResult<u32> {
        let value = self.peek_uint32()?;
        self.pos += 4;
        Ok(value)
    }
}

impl<M: DerefMut<Target = MemoryImage>> Cursor<M> {
    pub fn write_byte(&mut self, value: u8) -> ZResult<()> {
        self.memory.write_byte_at(self.pos, value)?;
        self.pos += 1;
        Ok(())
    }

    pub fn write_word(&mut self, value: u16) -> ZResult<()> {
        self.memory.write_word_at(self.pos, value)?;
        self.pos += 2;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_word_and_uint32_are_big_endian() {
        let mem = MemoryImage::new(vec![0x12, 0x34, 0x56, 0x78]);
        assert_eq!(mem.byte_at(0).unwrap(), 0x12);
        assert_eq!(mem.word_at(1).unwrap(), 0x3456);
        assert_eq!(mem.uint32_at(0).unwrap(), 0x1234_5678);
    }

    #[test]
    fn test_out_of_range_is_an_error() {
        let mut mem = MemoryImage::new(vec![0; 4]);
        assert_eq!(
            mem.word_at(3),
            Err(ZError::MemoryOutOfRange { address: 3, size: 4 })
        );
        assert!(mem.byte_at(4).is_err());
        assert!(mem.uint32_at(1).is_err());
        assert!(mem.write_word_at(3, 0xFFFF).is_err());
        assert!(mem.byte_at(usize::MAX).is_err());
        // nothing was written by the failed store
        assert_eq!(mem.as_bytes(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_cursor_advances() {
        let mut mem = MemoryImage::new(vec![1, 0, 2, 0, 0, 0, 3, 9]);
        {
            let mut seq = mem.cursor(0);
            assert_eq!(seq.peek_byte().unwrap(), 1);
            assert_eq!(seq.read_byte().unwrap(), 1);
            assert_eq!(seq.read_word().unwrap(), 2);
            assert_eq!(seq.read_uint32().unwrap(), 3);
            assert_eq!(seq.pos, 7);
            assert_eq!(seq.read_byte().unwrap(), 9);
            assert!(seq.read_byte().is_err());
        }

        let mut seq = mem.cursor_mut(2);
        seq.write_word(0xBEEF).unwrap();
        seq.write_byte(0x42).unwrap();
        assert_eq!(seq.pos, 5);
        assert_eq!(mem.word_at(2).unwrap(), 0xBEEF);
        assert_eq!(mem.byte_at(4).unwrap(), 0x42);
    }
}
