use byteorder::{ByteOrder, LittleEndian};

use crate::error::Result;
use super::container::{SectionHeader, SectionType};

/// Little-endian writer for resource and map data
pub struct BinaryWriter {
    data: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { data: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.data.push(v);
    }

    pub fn write_u16_le(&mut self, v: u16) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i16_le(&mut self, v: i16) {
        self.write_u16_le(v as u16);
    }

    pub fn write_u32_le(&mut self, v: u32) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i32_le(&mut self, v: i32) {
        self.write_u32_le(v as u32);
    }

    /// Overwrite a u32 already in the buffer.
    pub fn patch_u32_le(&mut self, pos: usize, v: u32) {
        LittleEndian::write_u32(&mut self.data[pos..pos + 4], v);
    }

    /// Write one container section.
    ///
    /// The header goes out with a zero next-section offset, `body` writes the
    /// section contents, and the offset is patched in once the body length is
    /// known. Data always starts right after the header.
    pub fn write_section<T>(
        &mut self,
        section_type: SectionType,
        element_count: u32,
        body: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let start = self.len();
        self.write_u8(section_type.to_u8());
        self.write_u32_le(0);
        self.write_u32_le(element_count);
        self.write_u16_le(0);

        let out = body(self)?;

        let next = self.len() - start - SectionHeader::NEXT_OFFSET_BASE;
        self.patch_u32_le(start + 1, next as u32);
        Ok(out)
    }
}

impl Default for BinaryWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BinaryWriter> for Vec<u8> {
    fn from(writer: BinaryWriter) -> Self {
        writer.into_vec()
    }
}
