use std::fmt::Display;
use std::fmt::Error;
use std::fmt::Formatter;

use bitvec::prelude::*;
use indexmap::IndexMap;
use log::debug;

use crate::error::{ZError, ZResult};
use crate::header::Header;
use crate::memory::MemoryImage;
use crate::text::{self, AbbreviationTable};

// In Versions 1 to 3, there are at most 255 objects, each having a 9-byte entry
pub const MAX_OBJECTS: usize = 255;
pub const MAX_ATTRIBUTES: u16 = 32;
pub const MAX_PROPERTIES: u16 = 31;
pub const OBJECT_ENTRY_SIZE: usize = 9;
const PROPERTY_DEFAULTS_SIZE: usize = MAX_PROPERTIES as usize * 2;
const PROPERTY_POINTER_OFFSET: usize = 7;

pub type Attributes = BitArray<[u8; 4], Msb0>;

/// One entry of an object's property list. `address` is where the data
/// bytes start; the size byte sits just before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub id: u8,
    pub address: usize,
    pub len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZObject {
    pub id: u8,
    pub attributes: Attributes,
    pub parent: u8,
    pub sibling: u8,
    pub child: u8,
    pub properties_addr: usize,
    pub name: Option<String>,
    /// In storage order, which is descending id.
    pub properties: IndexMap<u8, Property>,
}

impl ZObject {
    pub fn has_attribute(&self, attr: usize) -> bool {
        attr < self.attributes.len() && self.attributes[attr]
    }

    pub fn attribute_list(&self) -> Vec<usize> {
        self.attributes.iter_ones().collect()
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// Writes one object in the layout of the txd/infodump object listing.
pub struct ObjectDump<'a> {
    object: &'a ZObject,
    memory: &'a MemoryImage,
}

impl Display for ObjectDump<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let obj = self.object;
        write!(f, "Attributes: ")?;
        let attrs = obj.attribute_list();
        if attrs.is_empty() {
            writeln!(f, "None")?;
        } else {
            let list: Vec<String> = attrs.iter().map(|a| a.to_string()).collect();
            writeln!(f, "{}", list.join(", "))?;
        }
        writeln!(
            f,
            "     Parent object: {:3}  Sibling object: {:3}  Child object: {:3}",
            obj.parent, obj.sibling, obj.child
        )?;
        writeln!(f, "     Property address: {:04x}", obj.properties_addr)?;
        writeln!(f, "         Description: \"{}\"", obj.name())?;
        writeln!(f, "          Properties:")?;
        for prop in obj.properties.values() {
            write!(f, "              [{:2}] ", prop.id)?;
            if let Ok(bytes) = self.memory.slice(prop.address, prop.len) {
                for b in bytes {
                    write!(f, "{b:02x} ")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// The cached object tree. Every mutation is written through to memory so
/// that programs reading the table with loadb/loadw see the same state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectTable {
    pub table_addr: usize,
    pub objects: Vec<ZObject>,
}

impl ObjectTable {
    pub fn load(
        memory: &MemoryImage,
        header: &Header,
        abbrevs: &AbbreviationTable,
    ) -> ZResult<ObjectTable> {
        let table_addr = header.object_table_addr as usize;
        let count = Self::count_objects(memory, table_addr)?;
        let mut objects = Vec::with_capacity(count);
        for id in 1..=count {
            objects.push(Self::read_object(memory, table_addr, id as u8, abbrevs)?);
        }
        debug!("loaded {} objects from {:04x}", count, table_addr);
        Ok(ObjectTable {
            table_addr,
            objects,
        })
    }

    /// Objects are counted by walking entries until we run into the first
    /// property block, which always follows the last entry.
    pub fn count_objects(memory: &MemoryImage, table_addr: usize) -> ZResult<usize> {
        let base = table_addr + PROPERTY_DEFAULTS_SIZE;
        let mut lowest_property = usize::MAX;
        let mut count = 0;
        let mut addr = base;
        while addr < lowest_property && count < MAX_OBJECTS {
            let props = memory.word_at(addr + PROPERTY_POINTER_OFFSET)? as usize;
            // a pointer back into the entries means there is no object here
            if props < addr + OBJECT_ENTRY_SIZE {
                break;
            }
            lowest_property = lowest_property.min(props);
            count += 1;
            addr += OBJECT_ENTRY_SIZE;
        }
        Ok(count)
    }

    fn read_object(
        memory: &MemoryImage,
        table_addr: usize,
        id: u8,
        abbrevs: &AbbreviationTable,
    ) -> ZResult<ZObject> {
        let entry = Self::entry_address(table_addr, id);
        let mut seq = memory.cursor(entry);
        let attributes = Attributes::new(seq.read_uint32()?.to_be_bytes());
        let parent = seq.read_byte()?;
        let sibling = seq.read_byte()?;
        let child = seq.read_byte()?;
        let properties_addr = seq.read_word()? as usize;

        // text length is in words
        let name_words = memory.byte_at(properties_addr)? as usize;
        let name = if name_words > 0 {
            Some(text::decode(memory, properties_addr + 1, abbrevs)?)
        } else {
            None
        };

        let mut properties = IndexMap::new();
        let mut seq = memory.cursor(properties_addr + 1 + name_words * 2);
        loop {
            let size = seq.read_byte()?;
            if size == 0 {
                break;
            }
            let prop = Property {
                id: size & 0x1F,
                address: seq.pos,
                len: (size >> 5) as usize + 1,
            };
            seq.pos += prop.len;
            properties.insert(prop.id, prop);
        }

        Ok(ZObject {
            id,
            attributes,
            parent,
            sibling,
            child,
            properties_addr,
            name,
            properties,
        })
    }

    fn entry_address(table_addr: usize, id: u8) -> usize {
        table_addr + PROPERTY_DEFAULTS_SIZE + (id as usize - 1) * OBJECT_ENTRY_SIZE
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn index(&self, id: u16) -> ZResult<usize> {
        if id == 0 || id as usize > self.objects.len() {
            return Err(ZError::InvalidOperand(format!(
                "object {id} (table holds {})",
                self.objects.len()
            )));
        }
        Ok(id as usize - 1)
    }

    pub fn get(&self, id: u16) -> ZResult<&ZObject> {
        let i = self.index(id)?;
        Ok(&self.objects[i])
    }

    pub fn parent(&self, id: u16) -> ZResult<u8> {
        Ok(self.get(id)?.parent)
    }

    pub fn sibling(&self, id: u16) -> ZResult<u8> {
        Ok(self.get(id)?.sibling)
    }

    pub fn child(&self, id: u16) -> ZResult<u8> {
        Ok(self.get(id)?.child)
    }

    fn check_attribute(attr: u16) -> ZResult<usize> {
        if attr >= MAX_ATTRIBUTES {
            return Err(ZError::InvalidOperand(format!("attribute {attr}")));
        }
        Ok(attr as usize)
    }

    fn check_property(prop: u16) -> ZResult<u8> {
        if prop == 0 || prop > MAX_PROPERTIES {
            return Err(ZError::InvalidOperand(format!("property {prop}")));
        }
        Ok(prop as u8)
    }

    pub fn test_attribute(&self, id: u16, attr: u16) -> ZResult<bool> {
        let attr = Self::check_attribute(attr)?;
        Ok(self.get(id)?.attributes[attr])
    }

    pub fn set_attribute(
        &mut self,
        memory: &mut MemoryImage,
        id: u16,
        attr: u16,
        value: bool,
    ) -> ZResult<()> {
        let attr = Self::check_attribute(attr)?;
        let i = self.index(id)?;
        let entry = Self::entry_address(self.table_addr, i as u8 + 1);
        let obj = &mut self.objects[i];
        obj.attributes.set(attr, value);
        let raw = obj.attributes.into_inner();
        for (offset, byte) in raw.iter().enumerate() {
            memory.write_byte_at(entry + offset, *byte)?;
        }
        Ok(())
    }

    fn write_links(&self, memory: &mut MemoryImage, i: usize) -> ZResult<()> {
        let obj = &self.objects[i];
        let mut seq = memory.cursor_mut(Self::entry_address(self.table_addr, obj.id) + 4);
        seq.write_byte(obj.parent)?;
        seq.write_byte(obj.sibling)?;
        seq.write_byte(obj.child)?;
        Ok(())
    }

    /// Value from the default property table.
    pub fn default_property(&self, memory: &MemoryImage, prop: u16) -> ZResult<u16> {
        let prop = Self::check_property(prop)?;
        memory.word_at(self.table_addr + (prop as usize - 1) * 2)
    }

    /// Read a 1 or 2 byte property, falling back to the default table when
    /// the object doesn't carry it.
    pub fn get_property(&self, memory: &MemoryImage, id: u16, prop: u16) -> ZResult<u16> {
        let obj = self.get(id)?;
        let prop_id = Self::check_property(prop)?;
        match obj.properties.get(&prop_id) {
            Some(p) if p.len == 1 => Ok(memory.byte_at(p.address)? as u16),
            Some(p) if p.len == 2 => memory.word_at(p.address),
            Some(p) => Err(ZError::PropertyTooLong {
                object: obj.id,
                property: prop_id,
                length: p.len,
            }),
            None => self.default_property(memory, prop),
        }
    }

    /// Properties can only be overwritten, never added.
    pub fn set_property(
        &self,
        memory: &mut MemoryImage,
        id: u16,
        prop: u16,
        value: u16,
    ) -> ZResult<()> {
        let obj = self.get(id)?;
        let prop_id = Self::check_property(prop)?;
        let p = obj
            .properties
            .get(&prop_id)
            .ok_or(ZError::PropertyNotFound {
                object: obj.id,
                property: prop_id,
            })?;
        match p.len {
            1 => memory.write_byte_at(p.address, value as u8),
            2 => memory.write_word_at(p.address, value),
            length => Err(ZError::PropertyTooLong {
                object: obj.id,
                property: prop_id,
                length,
            }),
        }
    }

    /// Address of the property data, or 0 when the object lacks it.
    pub fn property_address(&self, id: u16, prop: u16) -> ZResult<usize> {
        let obj = self.get(id)?;
        Ok(u8::try_from(prop)
            .ok()
            .and_then(|p| obj.properties.get(&p))
            .map_or(0, |p| p.address))
    }

    /// Length of the property whose data starts at `addr`, read from the
    /// size byte just before it. Address 0 has length 0.
    pub fn property_length_at(memory: &MemoryImage, addr: usize) -> ZResult<usize> {
        if addr == 0 {
            return Ok(0);
        }
        let size = memory.byte_at(addr - 1)?;
        Ok((size >> 5) as usize + 1)
    }

    /// The property after `prop` in storage order; 0 starts the walk and a 0
    /// result ends it.
    pub fn next_property(&self, id: u16, prop: u16) -> ZResult<u8> {
        let obj = self.get(id)?;
        if prop == 0 {
            return Ok(obj.properties.keys().next().copied().unwrap_or(0));
        }
        let pos = u8::try_from(prop)
            .ok()
            .and_then(|p| obj.properties.get_index_of(&p))
            .ok_or(ZError::PropertyNotFound {
                object: obj.id,
                property: prop as u8,
            })?;
        Ok(obj
            .properties
            .get_index(pos + 1)
            .map_or(0, |(id, _)| *id))
    }

    /// Unlink `id` from its parent. The object keeps its own children.
    pub fn detach(&mut self, memory: &mut MemoryImage, id: u16) -> ZResult<()> {
        let i = self.index(id)?;
        let parent = self.objects[i].parent;
        if parent != 0 {
            let p = self.index(parent as u16)?;
            let next = self.objects[i].sibling;
            if self.objects[p].child as u16 == id {
                self.objects[p].child = next;
                self.write_links(memory, p)?;
            } else {
                let mut cur = self.objects[p].child;
                loop {
                    if cur == 0 {
                        return Err(ZError::InvalidOperand(format!(
                            "object {id} missing from children of {parent}"
                        )));
                    }
                    let c = self.index(cur as u16)?;
                    if self.objects[c].sibling as u16 == id {
                        self.objects[c].sibling = next;
                        self.write_links(memory, c)?;
                        break;
                    }
                    cur = self.objects[c].sibling;
                }
            }
        }
        self.objects[i].parent = 0;
        self.objects[i].sibling = 0;
        self.write_links(memory, i)
    }

    /// Move `id` to be the first child of `new_parent`.
    pub fn reparent(&mut self, memory: &mut MemoryImage, id: u16, new_parent: u16) -> ZResult<()> {
        if id == new_parent {
            return Err(ZError::InvalidOperand(format!(
                "object {id} cannot be its own parent"
            )));
        }
        let p = self.index(new_parent)?;
        let i = self.index(id)?;
        self.detach(memory, id)?;
        self.objects[i].sibling = self.objects[p].child;
        self.objects[i].parent = new_parent as u8;
        self.objects[p].child = id as u8;
        self.write_links(memory, i)?;
        self.write_links(memory, p)
    }

    pub fn dump<'a>(&'a self, memory: &'a MemoryImage, id: u16) -> ZResult<ObjectDump<'a>> {
        Ok(ObjectDump {
            object: self.get(id)?,
            memory,
        })
    }

    /// Display adapter drawing the object forest.
    pub fn tree(&self) -> ObjectTree<'_> {
        ObjectTree { table: self }
    }
}

pub struct ObjectTree<'a> {
    table: &'a ObjectTable,
}

impl ObjectTree<'_> {
    fn write_chain(&self, f: &mut Formatter<'_>, first: u8, depth: usize) -> Result<(), Error> {
        let mut cur = first;
        // a corrupt table could loop forever, so bound the walk
        let mut budget = self.table.len();
        while cur != 0 && budget > 0 {
            let Ok(obj) = self.table.get(cur as u16) else {
                return Ok(());
            };
            writeln!(f, "{}[{:3}] \"{}\"", " . ".repeat(depth), obj.id, obj.name())?;
            if obj.child != 0 && depth < MAX_OBJECTS {
                self.write_chain(f, obj.child, depth + 1)?;
            }
            cur = obj.sibling;
            budget -= 1;
        }
        Ok(())
    }
}

impl Display for ObjectTree<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        for obj in self.table.objects.iter().filter(|o| o.parent == 0) {
            // roots are printed one at a time; their siblings are roots too
            writeln!(f, "[{:3}] \"{}\"", obj.id, obj.name())?;
            if obj.child != 0 {
                self.write_chain(f, obj.child, 1)?;
            }
        }
        Ok(())
    }
}
