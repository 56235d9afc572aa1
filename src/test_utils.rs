//! Synthetic story images for tests
//!
//! `StoryBuilder` lays out a small but complete version-3 image: header,
//! abbreviations, object table, globals, dictionary, strings and code.
//! Fixtures are test input, so the builder panics on anything it cannot
//! encode rather than returning errors.
//!
//! Layout:
//!
//! | range         | contents                                   |
//! |---------------|--------------------------------------------|
//! | 0x0000-0x003F | header                                     |
//! | 0x0040-0x00FF | abbreviation table                         |
//! | 0x0100-0x05FF | object table and property blocks           |
//! | 0x0600-0x07DF | globals                                    |
//! | 0x0800-0x08FF | scratch space for buffers (still dynamic)  |
//! | 0x0A00-0x0AFF | dictionary                                 |
//! | 0x0B00-0x0BFF | abbreviation strings                       |
//! | 0x1000-       | main code, then anything placed explicitly |

use crate::interpreter::Interpreter;
use crate::io_headless::HeadlessIo;
use crate::text;
use crate::vm::{Game, VM};
use crate::zrand::ZRand;

pub const ABBREVIATIONS_ADDR: usize = 0x0040;
pub const OBJECT_TABLE_ADDR: usize = 0x0100;
pub const GLOBALS_ADDR: usize = 0x0600;
pub const SCRATCH_ADDR: usize = 0x0800;
pub const DYNAMIC_LIMIT: usize = 0x0900;
pub const DICTIONARY_ADDR: usize = 0x0A00;
pub const ABBREVIATION_STRINGS_ADDR: usize = 0x0B00;
pub const STRINGS_ADDR: usize = 0x0C00;
pub const CODE_ADDR: usize = 0x1000;

const MIN_IMAGE_SIZE: usize = 0x1100;

/// Encoded bytes of `text`, as they appear inline after print.
pub fn zstring(text: &str) -> Vec<u8> {
    text::encode(text)
        .expect("fixture text must be encodable")
        .iter()
        .flat_map(|w| w.to_be_bytes())
        .collect()
}

/// Interpreter over `story` with scripted `input` and a fixed random seed.
/// The returned handle sees everything the story prints.
pub fn headless(story: Vec<u8>, input: &[&str]) -> (Interpreter, HeadlessIo) {
    let game = Game::from_memory(story).expect("fixture story must load");
    let vm = VM::with_rng(game, ZRand::new_predictable(0)).expect("fixture story must load");
    let io = HeadlessIo::with_input(input.iter().copied());
    (Interpreter::new(vm, Box::new(io.clone())), io)
}

/// One object in the fixture, built up field by field.
#[derive(Debug, Clone, Default)]
pub struct ObjectSpec {
    name: String,
    attributes: Vec<u8>,
    parent: u8,
    sibling: u8,
    child: u8,
    properties: Vec<(u8, Vec<u8>)>,
}

impl ObjectSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn attributes(mut self, attrs: &[u8]) -> Self {
        self.attributes = attrs.to_vec();
        self
    }

    pub fn parent(mut self, id: u8) -> Self {
        self.parent = id;
        self
    }

    pub fn sibling(mut self, id: u8) -> Self {
        self.sibling = id;
        self
    }

    pub fn child(mut self, id: u8) -> Self {
        self.child = id;
        self
    }

    /// Add property `id` with `data` (1 to 8 bytes).
    pub fn property(mut self, id: u8, data: &[u8]) -> Self {
        assert!((1..=31).contains(&id), "property id {id}");
        assert!((1..=8).contains(&data.len()), "property length {}", data.len());
        self.properties.push((id, data.to_vec()));
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct StoryBuilder {
    objects: Vec<ObjectSpec>,
    defaults: Vec<(u8, u16)>,
    globals: Vec<(u8, u16)>,
    abbreviations: Vec<(usize, String)>,
    separators: Vec<u8>,
    words: Vec<String>,
    code: Vec<u8>,
    placed: Vec<(usize, Vec<u8>)>,
}

impl StoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object(mut self, object: ObjectSpec) -> Self {
        self.objects.push(object);
        self
    }

    /// Set default value for property `id`.
    pub fn default_property(mut self, id: u8, value: u16) -> Self {
        self.defaults.push((id, value));
        self
    }

    /// Set global `index` (variable 16 + index).
    pub fn global(mut self, index: u8, value: u16) -> Self {
        assert!(index < 240, "global {index}");
        self.globals.push((index, value));
        self
    }

    pub fn abbreviation(mut self, index: usize, text: &str) -> Self {
        assert!(index < text::ABBREVIATION_COUNT, "abbreviation {index}");
        self.abbreviations.push((index, text.to_string()));
        self
    }

    /// Dictionary with entry length 7. Words are cut to what an entry
    /// holds and sorted the way the story file sorts them.
    pub fn dictionary(mut self, separators: &[u8], words: &[&str]) -> Self {
        self.separators = separators.to_vec();
        self.words = words.iter().map(|w| w.to_string()).collect();
        self
    }

    /// The main routine's code, placed at the initial PC.
    pub fn code(mut self, bytes: &[u8]) -> Self {
        self.code = bytes.to_vec();
        self
    }

    /// A routine at byte address `addr` (must be even) with local defaults.
    pub fn routine(self, addr: usize, locals: &[u16], code: &[u8]) -> Self {
        assert!(addr % 2 == 0, "routine at odd address {addr:#x}");
        assert!(locals.len() <= 15, "{} locals", locals.len());
        let mut bytes = vec![locals.len() as u8];
        for l in locals {
            bytes.extend_from_slice(&l.to_be_bytes());
        }
        bytes.extend_from_slice(code);
        self.bytes_at(addr, &bytes)
    }

    /// An encoded string at byte address `addr`.
    pub fn string_at(self, addr: usize, text: &str) -> Self {
        let bytes = zstring(text);
        self.bytes_at(addr, &bytes)
    }

    /// Raw bytes at `addr`, written last so they override anything else.
    pub fn bytes_at(mut self, addr: usize, bytes: &[u8]) -> Self {
        self.placed.push((addr, bytes.to_vec()));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut image = vec![0u8; MIN_IMAGE_SIZE];
        self.write_header(&mut image);
        self.write_abbreviations(&mut image);
        self.write_objects(&mut image);
        for &(index, value) in &self.globals {
            put_word(&mut image, GLOBALS_ADDR + index as usize * 2, value);
        }
        self.write_dictionary(&mut image);
        put_bytes(&mut image, CODE_ADDR, &self.code);
        for (addr, bytes) in &self.placed {
            put_bytes(&mut image, *addr, bytes);
        }
        if image.len() % 2 != 0 {
            image.push(0);
        }
        let half = (image.len() / 2) as u16;
        put_word(&mut image, 0x1A, half);
        image
    }

    fn write_header(&self, image: &mut [u8]) {
        image[0x00] = 3;
        put_word(image, 0x02, 1);
        put_word(image, 0x04, CODE_ADDR as u16);
        put_word(image, 0x06, CODE_ADDR as u16);
        put_word(image, 0x08, DICTIONARY_ADDR as u16);
        put_word(image, 0x0A, OBJECT_TABLE_ADDR as u16);
        put_word(image, 0x0C, GLOBALS_ADDR as u16);
        put_word(image, 0x0E, DYNAMIC_LIMIT as u16);
        image[0x12..0x18].copy_from_slice(b"261018");
        put_word(image, 0x18, ABBREVIATIONS_ADDR as u16);
    }

    fn write_abbreviations(&self, image: &mut Vec<u8>) {
        let mut next = ABBREVIATION_STRINGS_ADDR;
        for (index, text) in &self.abbreviations {
            let bytes = zstring(text);
            put_bytes(image, next, &bytes);
            put_word(image, ABBREVIATIONS_ADDR + index * 2, (next / 2) as u16);
            next += bytes.len();
            assert!(next <= STRINGS_ADDR, "abbreviation strings overflow");
        }
    }

    fn write_objects(&self, image: &mut Vec<u8>) {
        for &(id, value) in &self.defaults {
            put_word(image, OBJECT_TABLE_ADDR + (id as usize - 1) * 2, value);
        }
        let entries = OBJECT_TABLE_ADDR + 62;
        let mut props = entries + self.objects.len() * 9;
        for (i, obj) in self.objects.iter().enumerate() {
            let entry = entries + i * 9;
            let mut attrs = 0u32;
            for &a in &obj.attributes {
                attrs |= 0x8000_0000 >> a;
            }
            image[entry..entry + 4].copy_from_slice(&attrs.to_be_bytes());
            image[entry + 4] = obj.parent;
            image[entry + 5] = obj.sibling;
            image[entry + 6] = obj.child;
            put_word(image, entry + 7, props as u16);

            let mut block = Vec::new();
            if obj.name.is_empty() {
                block.push(0);
            } else {
                let name = zstring(&obj.name);
                block.push((name.len() / 2) as u8);
                block.extend_from_slice(&name);
            }
            let mut sorted = obj.properties.clone();
            sorted.sort_by(|a, b| b.0.cmp(&a.0));
            for (id, data) in sorted {
                block.push((((data.len() - 1) as u8) << 5) | id);
                block.extend_from_slice(&data);
            }
            block.push(0);
            put_bytes(image, props, &block);
            props += block.len();
            assert!(props <= GLOBALS_ADDR, "object table overflow");
        }
    }

    fn write_dictionary(&self, image: &mut Vec<u8>) {
        let mut entries: Vec<(u32, [u16; 2])> = self
            .words
            .iter()
            .map(|w| {
                let words = text::encode_dictionary_key(w, 7).expect("dictionary word");
                (((words[0] as u32) << 16) | words[1] as u32, words)
            })
            .collect();
        entries.sort_by_key(|e| e.0);
        entries.dedup_by_key(|e| e.0);

        let mut bytes = vec![self.separators.len() as u8];
        bytes.extend_from_slice(&self.separators);
        bytes.push(7);
        bytes.extend_from_slice(&(entries.len() as u16).to_be_bytes());
        for (_, words) in entries {
            bytes.extend_from_slice(&words[0].to_be_bytes());
            bytes.extend_from_slice(&words[1].to_be_bytes());
            bytes.extend_from_slice(&[0, 0, 0]);
        }
        assert!(DICTIONARY_ADDR + bytes.len() <= ABBREVIATION_STRINGS_ADDR, "dictionary overflow");
        put_bytes(image, DICTIONARY_ADDR, &bytes);
    }
}

fn put_word(image: &mut [u8], addr: usize, value: u16) {
    image[addr..addr + 2].copy_from_slice(&value.to_be_bytes());
}

fn put_bytes(image: &mut Vec<u8>, addr: usize, bytes: &[u8]) {
    if image.len() < addr + bytes.len() {
        image.resize(addr + bytes.len(), 0);
    }
    image[addr..addr + bytes.len()].copy_from_slice(bytes);
}
