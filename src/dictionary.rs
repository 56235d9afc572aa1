use std::fmt::Display;
use std::fmt::Error;
use std::fmt::Formatter;

use log::debug;

use crate::error::ZResult;
use crate::memory::MemoryImage;
use crate::text::{self, AbbreviationTable, DICTIONARY_ZCHARS};

/// The story's word list. Entries are sorted by their encoded text, which
/// is the order the search relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictionary {
    pub address: usize,
    pub separators: Vec<u8>,
    pub entry_length: u8,
    pub entries_addr: usize,
    pub words: Vec<String>,
    keys: Vec<u32>,
}

/// A word cut from an input line, with its byte offset in that line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub offset: usize,
}

impl Dictionary {
    pub fn load(
        memory: &MemoryImage,
        address: usize,
        abbrevs: &AbbreviationTable,
    ) -> ZResult<Dictionary> {
        let mut seq = memory.cursor(address);
        let n = seq.read_byte()?;
        let mut separators = Vec::with_capacity(n as usize);
        for _ in 0..n {
            separators.push(seq.read_byte()?);
        }
        let entry_length = seq.read_byte()?;
        let count = seq.read_word()? as usize;
        let entries_addr = seq.pos;

        let mut words = Vec::with_capacity(count);
        let mut keys = Vec::with_capacity(count);
        for i in 0..count {
            let entry = entries_addr + i * entry_length as usize;
            keys.push(memory.uint32_at(entry)?);
            words.push(text::decode(memory, entry, abbrevs)?);
        }
        debug!(
            "dictionary at {:04x}: {} words of {} bytes",
            address, count, entry_length
        );

        Ok(Dictionary {
            address,
            separators,
            entry_length,
            entries_addr,
            words,
            keys,
        })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn entry_address(&self, index: usize) -> usize {
        self.entries_addr + index * self.entry_length as usize
    }

    /// Encoded form of `word` as stored in an entry, if it fits in one.
    fn key_for(word: &str) -> Option<u32> {
        let mut zchars = text::encode_zchars(word).ok()?;
        if zchars.len() > DICTIONARY_ZCHARS {
            return None;
        }
        zchars.resize(DICTIONARY_ZCHARS, 5);
        let packed = text::pack_zchars(&zchars);
        Some(((packed[0] as u32) << 16) | packed[1] as u32)
    }

    /// Address of the entry spelled exactly `word`.
    pub fn search(&self, word: &str) -> Option<usize> {
        let key = Self::key_for(word)?;
        self.keys
            .binary_search(&key)
            .ok()
            .map(|i| self.entry_address(i))
    }

    /// Look up a typed word after cutting it down to what an entry can hold.
    pub fn lookup(&self, typed: &str) -> Option<usize> {
        let [hi, lo] = text::encode_dictionary_key(typed, self.entry_length as usize).ok()?;
        let key = ((hi as u32) << 16) | lo as u32;
        self.keys
            .binary_search(&key)
            .ok()
            .map(|i| self.entry_address(i))
    }

    /// Split a line into words. Spaces separate words; each separator
    /// character is a word of its own.
    pub fn tokenise(&self, line: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut start: Option<usize> = None;
        let bytes = line.as_bytes();

        let flush = |start: &mut Option<usize>, end: usize, tokens: &mut Vec<Token>| {
            if let Some(s) = start.take() {
                tokens.push(Token {
                    text: line[s..end].to_string(),
                    offset: s,
                });
            }
        };

        for (i, &b) in bytes.iter().enumerate() {
            if b == b' ' {
                flush(&mut start, i, &mut tokens);
            } else if self.separators.contains(&b) {
                flush(&mut start, i, &mut tokens);
                tokens.push(Token {
                    text: (b as char).to_string(),
                    offset: i,
                });
            } else if start.is_none() {
                start = Some(i);
            }
        }
        flush(&mut start, bytes.len(), &mut tokens);
        tokens
    }
}

impl Display for Dictionary {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        let separators: String = self.separators.iter().map(|&b| b as char).collect();
        writeln!(f, "\n    **** Dictionary ****\n")?;
        writeln!(f, "  Word separators = \"{}\"", separators)?;
        writeln!(
            f,
            "  Word count = {}, word size = {}\n",
            self.words.len(),
            self.entry_length
        )?;
        for (i, word) in self.words.iter().enumerate() {
            writeln!(f, "  [{:4}] {}", i + 1, word)?;
        }
        Ok(())
    }
}
