//! Machine state: the story image and everything built from it
//!
//! `Game` is the validated image. `VM` adds the runtime state the
//! interpreter mutates: the call stack, the program counter, the object
//! cache and the random source.

use log::{debug, info};

use crate::dictionary::Dictionary;
use crate::error::{ZError, ZResult};
use crate::header::Header;
use crate::memory::MemoryImage;
use crate::routine::{CallStack, Frame};
use crate::text::AbbreviationTable;
use crate::zobject::ObjectTable;
use crate::zrand::ZRand;

/// A loaded story with a validated header
#[derive(Debug, Clone)]
pub struct Game {
    /// The raw game memory
    pub memory: MemoryImage,
    /// The parsed header
    pub header: Header,
}

impl Game {
    /// Validate and take ownership of a story image.
    pub fn from_memory(bytes: Vec<u8>) -> ZResult<Self> {
        let memory = MemoryImage::new(bytes);
        let header = Header::parse(&memory)?;
        Ok(Game { memory, header })
    }
}

/// The Z-Machine virtual machine state
#[derive(Debug)]
pub struct VM {
    pub game: Game,
    pub abbreviations: AbbreviationTable,
    pub objects: ObjectTable,
    pub dictionary: Dictionary,
    pub call_stack: CallStack,
    /// Program counter - address of the next instruction
    pub pc: usize,
    pub rng: ZRand,
}

impl VM {
    pub fn new(game: Game) -> ZResult<Self> {
        Self::with_rng(game, ZRand::new_uniform())
    }

    pub fn with_rng(game: Game, rng: ZRand) -> ZResult<Self> {
        let header = &game.header;
        let abbreviations = AbbreviationTable::new(header.abbrev_table as usize);
        let objects = ObjectTable::load(&game.memory, header, &abbreviations)?;
        let dictionary =
            Dictionary::load(&game.memory, header.dictionary as usize, &abbreviations)?;
        let pc = header.initial_pc as usize;
        info!(
            "loaded v{} story: {} objects, {} dictionary words, start {:04x}",
            header.version,
            objects.len(),
            dictionary.len(),
            pc
        );
        Ok(VM {
            call_stack: CallStack::new(Frame::main(pc)),
            game,
            abbreviations,
            objects,
            dictionary,
            pc,
            rng,
        })
    }

    pub fn memory(&self) -> &MemoryImage {
        &self.game.memory
    }

    pub fn read_byte(&self, addr: usize) -> ZResult<u8> {
        self.game.memory.byte_at(addr)
    }

    pub fn read_word(&self, addr: usize) -> ZResult<u16> {
        self.game.memory.word_at(addr)
    }

    fn check_dynamic(&self, addr: usize, width: usize) -> ZResult<()> {
        if addr + width > self.game.header.dynamic_limit() {
            return Err(ZError::WriteOutsideDynamicMemory(addr));
        }
        Ok(())
    }

    /// Program write of one byte; only dynamic memory is writable.
    pub fn write_byte(&mut self, addr: usize, value: u8) -> ZResult<()> {
        self.check_dynamic(addr, 1)?;
        self.game.memory.write_byte_at(addr, value)
    }

    pub fn write_word(&mut self, addr: usize, value: u16) -> ZResult<()> {
        self.check_dynamic(addr, 2)?;
        self.game.memory.write_word_at(addr, value)
    }

    fn global_address(&self, var: u8) -> usize {
        self.game.header.global_variables as usize + 2 * (var as usize - 0x10)
    }

    pub fn read_global(&self, var: u8) -> ZResult<u16> {
        self.read_word(self.global_address(var))
    }

    pub fn write_global(&mut self, var: u8, value: u16) -> ZResult<()> {
        let addr = self.global_address(var);
        self.game.memory.write_word_at(addr, value)
    }

    /// Read variable `var`. Variable 0 pops the value stack.
    pub fn read_variable(&mut self, var: u8) -> ZResult<u16> {
        match var {
            0x00 => self.call_stack.current_mut().pop_value(),
            0x01..=0x0F => self.call_stack.current().local_get(var),
            _ => self.read_global(var),
        }
    }

    /// Write variable `var`. Variable 0 pushes onto the value stack.
    pub fn write_variable(&mut self, var: u8, value: u16) -> ZResult<()> {
        match var {
            0x00 => {
                self.call_stack.current_mut().push_value(value);
                Ok(())
            }
            0x01..=0x0F => self.call_stack.current_mut().local_set(var, value),
            _ => self.write_global(var, value),
        }
    }

    /// Read a variable named by an operand (load, inc, dec, ...). Variable 0
    /// is read in place rather than popped.
    pub fn read_variable_indirect(&mut self, var: u8) -> ZResult<u16> {
        match var {
            0x00 => self.call_stack.current().peek_value(),
            _ => self.read_variable(var),
        }
    }

    /// Update a variable named by an operand (inc, dec). Variable 0 replaces
    /// the top of the stack rather than pushing.
    pub fn write_variable_indirect(&mut self, var: u8, value: u16) -> ZResult<()> {
        match var {
            0x00 => {
                let frame = self.call_stack.current_mut();
                frame.pop_value()?;
                frame.push_value(value);
                Ok(())
            }
            _ => self.write_variable(var, value),
        }
    }

    /// Push a new frame for the routine at byte address `addr` and jump to
    /// its first instruction.
    pub fn call_routine(
        &mut self,
        addr: usize,
        args: &[u16],
        return_store: Option<u8>,
    ) -> ZResult<()> {
        let (frame, start) =
            Frame::from_routine(&self.game.memory, addr, args, self.pc, return_store)?;
        debug!(
            "call {:04x} from {:04x}, depth {}",
            addr,
            self.pc,
            self.call_stack.depth()
        );
        self.call_stack.push(frame);
        self.pc = start;
        Ok(())
    }

    /// Pop the current frame and resume the caller, storing `value` where
    /// the caller asked for it.
    pub fn return_from_routine(&mut self, value: u16) -> ZResult<()> {
        let frame = self.call_stack.pop()?;
        debug!(
            "return {:04x} from {:04x} to {:04x}",
            value, frame.address, frame.return_pc
        );
        self.pc = frame.return_pc;
        if let Some(var) = frame.return_store {
            self.write_variable(var, value)?;
        }
        Ok(())
    }

    /// Decode the Z-string at `addr`.
    pub fn read_string(&self, addr: usize) -> ZResult<String> {
        crate::text::decode(&self.game.memory, addr, &self.abbreviations)
    }

    pub fn read_packed_string(&self, paddr: u16) -> ZResult<String> {
        crate::text::decode_packed(&self.game.memory, paddr, &self.abbreviations)
    }
}
