use std::fmt::Display;
use std::fmt::Error;
use std::fmt::Formatter;

use log::debug;

use crate::error::{ZError, ZResult};
use crate::memory::MemoryImage;

pub const HEADER_SIZE: usize = 64;
pub const MAX_FILE_LENGTH: usize = 128 * 1024;
pub const MAX_VERSION: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub flags: u8,
    pub release: u16,
    pub serial: [u8; 6],
    pub base_high_mem: u16,
    pub base_static_mem: u16,
    pub initial_pc: u16,
    pub abbrev_table: u16,
    pub len_file: usize,
    pub checksum_file: u16,
    pub dictionary: u16,
    pub object_table_addr: u16,
    pub global_variables: u16,
}

impl Header {
    /// Read and validate the fixed header at the start of `memory`.
    pub fn parse(memory: &MemoryImage) -> ZResult<Header> {
        if memory.len() < HEADER_SIZE {
            return Err(ZError::TruncatedStory(memory.len()));
        }

        let mut serial = [0u8; 6];
        serial.copy_from_slice(memory.slice(0x12, 6)?);

        let header = Header {
            version: memory.byte_at(0x00)?,
            flags: memory.byte_at(0x01)?,
            release: memory.word_at(0x02)?,
            serial,
            base_high_mem: memory.word_at(0x04)?,
            base_static_mem: memory.word_at(0x0E)?,
            initial_pc: memory.word_at(0x06)?,
            abbrev_table: memory.word_at(0x18)?,
            len_file: memory.word_at(0x1A)? as usize * 2,
            checksum_file: memory.word_at(0x1C)?,
            dictionary: memory.word_at(0x08)?,
            object_table_addr: memory.word_at(0x0A)?,
            global_variables: memory.word_at(0x0C)?,
        };

        if header.version == 0 || header.version > MAX_VERSION {
            return Err(ZError::UnsupportedVersion(header.version));
        }
        if (header.base_static_mem as usize) < HEADER_SIZE {
            return Err(ZError::InvalidDynamicMemory(header.base_static_mem));
        }
        if header.base_high_mem < header.base_static_mem {
            return Err(ZError::OverlappingMemoryRegions {
                high: header.base_high_mem,
                dynamic: header.base_static_mem,
            });
        }
        // the stored length is halved, so the image itself is checked too
        let length = header.len_file.max(memory.len());
        if length > MAX_FILE_LENGTH {
            return Err(ZError::FileTooLarge(length));
        }

        debug!(
            "header: version {} release {} pc {:04x} dynamic {:04x}",
            header.version, header.release, header.initial_pc, header.base_static_mem
        );
        Ok(header)
    }

    pub fn serial_string(&self) -> String {
        self.serial.iter().map(|&b| b as char).collect()
    }

    /// First address past dynamic memory.
    pub fn dynamic_limit(&self) -> usize {
        self.base_static_mem as usize
    }
}

impl Display for Header {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let flags = if self.flags & 0x02 != 0 {
            "Display hours:min"
        } else {
            "Display score/turns"
        };
        write!(
            f,
            "
    **** Story file header ****

  Z-code version:           {}
  Interpreter flags:        {}
  Release number:           {}
  Size of resident memory:  {:04x}
  Start PC:                 {:04x}
  Dictionary address:       {:04x}
  Object table address:     {:04x}
  Global variables address: {:04x}
  Size of dynamic memory:   {:04x}
  Serial number:            {}
  Abbreviations address:    {:04x}
  File size:                {:05x}
  Checksum:                 {:04x}
",
            self.version,
            flags,
            self.release,
            self.base_high_mem,
            self.initial_pc,
            self.dictionary,
            self.object_table_addr,
            self.global_variables,
            self.base_static_mem,
            self.serial_string(),
            self.abbrev_table,
            self.len_file,
            self.checksum_file,
        )
    }
}
