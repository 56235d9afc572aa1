use std::collections::HashMap;

use bitreader::{BitReader, BitReaderError};
use log::{debug, trace};

use crate::error::{ZError, ZResult};
use crate::memory::MemoryImage;

/// The three alphabets for Z-string decoding
pub const ALPHABET_A0: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const ALPHABET_A1: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ALPHABET_A2: &[u8] = b" \n0123456789.,!?_#'\"/\\-:()";
const ALPHABETS: [&[u8]; 3] = [ALPHABET_A0, ALPHABET_A1, ALPHABET_A2];

/// Abbreviation strings may not themselves use abbreviations; this leaves
/// room for slightly malformed files without looping forever.
pub const MAX_ABBREVIATION_DEPTH: u8 = 3;

/// Number of abbreviation slots in a v3 story (3 tables of 32)
pub const ABBREVIATION_COUNT: usize = 96;

/// Z-characters stored in a v3 dictionary entry (4 bytes of text)
pub const DICTIONARY_ZCHARS: usize = 6;

const PAD_ZCHAR: u8 = 5;

lazy_static! {
    /// Character to the z-characters that produce it.
    static ref ENCODE_MAP: HashMap<char, Vec<u8>> = {
        let mut m = HashMap::new();
        for (i, &c) in ALPHABET_A2.iter().enumerate().skip(2) {
            m.insert(c as char, vec![5, i as u8 + 6]);
        }
        m.insert('\n', vec![5, 7]);
        for (i, &c) in ALPHABET_A1.iter().enumerate() {
            m.insert(c as char, vec![4, i as u8 + 6]);
        }
        for (i, &c) in ALPHABET_A0.iter().enumerate() {
            m.insert(c as char, vec![i as u8 + 6]);
        }
        m.insert(' ', vec![0]);
        m
    };
}

/// Location of the 96 abbreviation string pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbbreviationTable {
    pub address: usize,
}

impl AbbreviationTable {
    pub fn new(address: usize) -> AbbreviationTable {
        AbbreviationTable { address }
    }

    /// Byte address of the string for abbreviation `index` (0..96).
    pub fn string_address(&self, memory: &MemoryImage, index: usize) -> ZResult<usize> {
        let packed = memory.word_at(self.address + index * 2)?;
        Ok(packed as usize * 2)
    }

    /// Decode one abbreviation on demand.
    pub fn get(&self, memory: &MemoryImage, index: usize) -> ZResult<String> {
        let addr = self.string_address(memory, index)?;
        decode_recursive(memory, addr, self, 1)
    }

    /// All 96 abbreviations, in table order.
    pub fn all(&self, memory: &MemoryImage) -> ZResult<Vec<String>> {
        (0..ABBREVIATION_COUNT)
            .map(|i| self.get(memory, i))
            .collect()
    }
}

/// Split a word into its end flag and three z-characters.
fn split_word(word: u16) -> ZResult<(bool, [u8; 3])> {
    let bytes = word.to_be_bytes();
    let mut reader = BitReader::new(&bytes);
    let bad = |e: BitReaderError| ZError::InvalidOperand(format!("z-character split: {e}"));
    let is_end = reader.read_bool().map_err(bad)?;
    let mut codes = [0u8; 3];
    for code in codes.iter_mut() {
        *code = reader.read_u8(5).map_err(bad)?;
    }
    Ok((is_end, codes))
}

/// Decode a Z-string at `addr`.
pub fn decode(memory: &MemoryImage, addr: usize, abbrevs: &AbbreviationTable) -> ZResult<String> {
    decode_recursive(memory, addr, abbrevs, 0)
}

/// Decode the string at a packed address.
pub fn decode_packed(
    memory: &MemoryImage,
    packed: u16,
    abbrevs: &AbbreviationTable,
) -> ZResult<String> {
    decode(memory, packed as usize * 2, abbrevs)
}

/// Bytes occupied by the Z-string at `addr`, including the terminating word.
pub fn encoded_length(memory: &MemoryImage, addr: usize) -> ZResult<usize> {
    let mut cursor = memory.cursor(addr);
    while cursor.read_word()? & 0x8000 == 0 {}
    Ok(cursor.pos - addr)
}

fn read_zchars(memory: &MemoryImage, addr: usize) -> ZResult<Vec<u8>> {
    let mut cursor = memory.cursor(addr);
    let mut zchars = Vec::new();
    loop {
        let word = cursor.read_word()?;
        let (is_end, codes) = split_word(word)?;
        trace!("Z-word {:04x} = Z-chars {:?}, is_end={}", word, codes, is_end);
        zchars.extend_from_slice(&codes);
        if is_end {
            return Ok(zchars);
        }
    }
}

fn decode_recursive(
    memory: &MemoryImage,
    addr: usize,
    abbrevs: &AbbreviationTable,
    depth: u8,
) -> ZResult<String> {
    if depth > MAX_ABBREVIATION_DEPTH {
        debug!("abbreviation depth {} exceeded at {:04x}", depth, addr);
        return Err(ZError::AbbreviationTooDeep(addr));
    }
    let zchars = read_zchars(memory, addr)?;
    decode_zchars(&zchars, |table, index| {
        let entry = abbrevs.address + 64 * table + index * 2;
        let target = memory.word_at(entry)? as usize * 2;
        decode_recursive(memory, target, abbrevs, depth + 1)
    })
}

/// Run the decoding state machine over a z-character sequence.
/// `abbreviation(table, index)` expands codes 1-3.
fn decode_zchars<F>(zchars: &[u8], mut abbreviation: F) -> ZResult<String>
where
    F: FnMut(usize, usize) -> ZResult<String>,
{
    let mut result = String::new();
    let mut alphabet = 0usize;
    let shift_lock = 0usize;
    let mut pending_abbrev: Option<usize> = None;
    // high 5 bits of a 10-bit escape, once read
    let mut escape: Option<Option<u16>> = None;

    for &zc in zchars {
        if let Some(table) = pending_abbrev.take() {
            result.push_str(&abbreviation(table, zc as usize)?);
            alphabet = shift_lock;
            continue;
        }
        if let Some(high) = escape {
            match high {
                None => escape = Some(Some(zc as u16)),
                Some(high) => {
                    let code = (high << 5) | zc as u16;
                    if let Some(c) = char::from_u32(code as u32) {
                        result.push(c);
                    }
                    escape = None;
                }
            }
            continue;
        }
        match zc {
            0 => {
                result.push(' ');
                alphabet = shift_lock;
            }
            1..=3 => pending_abbrev = Some(zc as usize - 1),
            4 | 5 => alphabet = zc as usize - 3,
            6 if alphabet == 2 => {
                escape = Some(None);
                alphabet = shift_lock;
            }
            7 if alphabet == 2 => {
                result.push('\n');
                alphabet = shift_lock;
            }
            _ => {
                result.push(ALPHABETS[alphabet][zc as usize - 6] as char);
                alphabet = shift_lock;
            }
        }
    }
    Ok(result)
}

/// Map text to z-characters without packing.
pub fn encode_zchars(text: &str) -> ZResult<Vec<u8>> {
    let mut zchars = Vec::with_capacity(text.len());
    for c in text.chars() {
        match ENCODE_MAP.get(&c) {
            Some(codes) => zchars.extend_from_slice(codes),
            None if (c as u32) < 0x400 => {
                let code = c as u32;
                zchars.extend_from_slice(&[5, 6, (code >> 5) as u8, (code & 0x1F) as u8]);
            }
            None => return Err(ZError::UnencodableCharacter(c)),
        }
    }
    Ok(zchars)
}

/// Pack z-characters three to a word, padding with 5s and marking the last word.
pub fn pack_zchars(zchars: &[u8]) -> Vec<u16> {
    let mut padded = zchars.to_vec();
    while padded.is_empty() || padded.len() % 3 != 0 {
        padded.push(PAD_ZCHAR);
    }
    let mut words: Vec<u16> = padded
        .chunks(3)
        .map(|c| ((c[0] as u16) << 10) | ((c[1] as u16) << 5) | c[2] as u16)
        .collect();
    if let Some(last) = words.last_mut() {
        *last |= 0x8000;
    }
    words
}

/// Encode text into Z-string words.
pub fn encode(text: &str) -> ZResult<Vec<u16>> {
    Ok(pack_zchars(&encode_zchars(text)?))
}

/// The two packed words a v3 dictionary entry for `word` starts with. The
/// word is clipped to the characters an entry of `entry_size` bytes can
/// name, then its z-characters are cut to six, so a long escape may be cut
/// part way through exactly as the story's own dictionary stores it.
pub fn encode_dictionary_key(word: &str, entry_size: usize) -> ZResult<[u16; 2]> {
    let clipped: String = word.chars().take(entry_size.saturating_sub(1)).collect();
    let mut zchars = encode_zchars(&clipped)?;
    zchars.truncate(DICTIONARY_ZCHARS);
    zchars.resize(DICTIONARY_ZCHARS, PAD_ZCHAR);
    let packed = pack_zchars(&zchars);
    Ok([packed[0], packed[1]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn memory_with_words(words: &[u16], at: usize) -> MemoryImage {
        let mut bytes = vec![0u8; at];
        for w in words {
            bytes.extend_from_slice(&w.to_be_bytes());
        }
        MemoryImage::new(bytes)
    }

    fn no_abbrevs() -> AbbreviationTable {
        AbbreviationTable::new(0)
    }

    #[test]
    fn test_encode_known_words() {
        assert_eq!(encode("zork").unwrap(), vec![0x7E97, 0xC0A5]);
        assert_eq!(encode("cyclop").unwrap(), vec![0x23C8, 0xC695]);
    }

    #[test]
    fn test_round_trip() {
        for s in ["zork", "cyclop", "i", "Hello, World!", "room 42", "a\nb", "x{y}"] {
            let words = encode(s).unwrap();
            let mem = memory_with_words(&words, 0);
            assert_eq!(decode(&mem, 0, &no_abbrevs()).unwrap(), s, "round trip of {s:?}");
        }
    }

    #[test]
    fn test_escape_for_characters_outside_alphabets() {
        // '{' is not in any alphabet: shift 5, escape 6, then 0x7B split 3/27
        let zchars = encode_zchars("{").unwrap();
        assert_eq!(zchars, vec![5, 6, 3, 27]);
        assert!(encode("\u{263A}").is_err());
    }

    #[test]
    fn test_encoded_length_stops_at_terminator() {
        let mem = memory_with_words(&[0x7E97, 0xC0A5, 0x0000], 4);
        assert_eq!(encoded_length(&mem, 4).unwrap(), 4);
    }

    #[test]
    fn test_unterminated_string_runs_off_memory() {
        let mem = memory_with_words(&[0x1111, 0x2222], 0);
        assert!(matches!(
            decode(&mem, 0, &no_abbrevs()),
            Err(ZError::MemoryOutOfRange { .. })
        ));
    }

    #[test]
    fn test_abbreviation_expansion() {
        // abbreviation table at 0x10, entry 0 of table 0 -> string at 0x20
        let mut bytes = vec![0u8; 0x30];
        bytes[0x10..0x12].copy_from_slice(&0x0010u16.to_be_bytes());
        let zork = encode("zork").unwrap();
        bytes[0x20..0x22].copy_from_slice(&zork[0].to_be_bytes());
        bytes[0x22..0x24].copy_from_slice(&zork[1].to_be_bytes());
        // "the " via abbreviation 1/0, then "i"
        let words = pack_zchars(&[1, 0, 0, 14]);
        for (i, w) in words.iter().enumerate() {
            bytes[0x28 + i * 2..0x2A + i * 2].copy_from_slice(&w.to_be_bytes());
        }
        let mem = MemoryImage::new(bytes);
        let abbrevs = AbbreviationTable::new(0x10);
        assert_eq!(decode(&mem, 0x28, &abbrevs).unwrap(), "zork i");
        assert_eq!(abbrevs.get(&mem, 0).unwrap(), "zork");
    }

    #[test]
    fn test_self_referencing_abbreviation_is_an_error() {
        // abbreviation 0 points at a string that uses abbreviation 0
        let mut bytes = vec![0u8; 0x30];
        bytes[0x10..0x12].copy_from_slice(&0x0010u16.to_be_bytes());
        let words = pack_zchars(&[1, 0]);
        bytes[0x20..0x22].copy_from_slice(&words[0].to_be_bytes());
        let mem = MemoryImage::new(bytes);
        let err = decode(&mem, 0x20, &AbbreviationTable::new(0x10)).unwrap_err();
        assert!(matches!(err, ZError::AbbreviationTooDeep(0x20)));
    }

    #[test]
    fn test_encode_dictionary_key() {
        // "lantern" clips to "lanter" in a 7-byte entry
        assert_eq!(encode_dictionary_key("lantern", 7).unwrap(), [0x44D3, 0xE557]);
        assert_eq!(encode_dictionary_key("go", 7).unwrap(), [0x3285, 0x94A5]);
        // each digit takes two z-characters
        assert_eq!(
            encode_dictionary_key("1234", 7).unwrap(),
            encode_dictionary_key("123", 7).unwrap()
        );
    }

    #[test]
    fn test_dictionary_key_keeps_a_partial_escape() {
        // '{' escapes to 5 6 3 27; only 5 6 3 fit after "abc"
        assert_eq!(encode_dictionary_key("abc{", 7).unwrap(), [0x18E8, 0x94C3]);
    }
}
