use crate::error::{Error, Result};
use super::container::SectionType;

/// Bounds-checked little-endian reader over a byte range.
///
/// The range is the reader's hard limit: every read or skip checks the
/// remaining length before touching the data and advances only on success,
/// so a failed read leaves the position unchanged.
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
    section: Option<SectionType>,
}

impl<'a> BinaryReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0, base: 0, section: None }
    }

    /// Reader over at most `limit` bytes of `data`.
    pub fn with_limit(data: &'a [u8], limit: usize) -> Self {
        Self::new(&data[..limit.min(data.len())])
    }

    /// Record where `data[0]` lives in the file and which section it belongs
    /// to, so errors point at absolute offsets.
    pub fn located(mut self, base: usize, section: SectionType) -> Self {
        self.base = base;
        self.section = Some(section);
        self
    }

    /// Total length of the range, independent of position.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Absolute file offset of the next byte.
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    pub fn section(&self) -> Option<SectionType> {
        self.section
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Move to an absolute position within the range.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(Error::Overrun {
                section: self.section,
                offset: self.offset(),
                need: pos.saturating_sub(self.pos),
                have: self.remaining(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read a fixed-size block by value.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Carve the next `n` bytes off as their own reader, keeping location info.
    pub fn sub_reader(&mut self, n: usize) -> Result<BinaryReader<'a>> {
        let base = self.offset();
        let data = self.read_bytes(n)?;
        Ok(BinaryReader { data, pos: 0, base, section: self.section })
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let v = self.data[self.pos];
        self.pos += 1;
        Ok(v)
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i16_le(&mut self) -> Result<i16> {
        Ok(self.read_u16_le()? as i16)
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32_le(&mut self) -> Result<i32> {
        Ok(self.read_u32_le()? as i32)
    }

    /// Read `N` consecutive little-endian u16 values.
    pub fn read_u16_array_le<const N: usize>(&mut self) -> Result<[u16; N]> {
        self.ensure(N * 2)?;
        let mut out = [0u16; N];
        for v in out.iter_mut() {
            *v = self.read_u16_le()?;
        }
        Ok(out)
    }

    /// Read everything left in the range.
    pub fn read_remaining(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos..];
        self.pos = self.data.len();
        slice
    }

    fn ensure(&self, n: usize) -> Result<()> {
        if self.remaining() < n {
            return Err(Error::Overrun {
                section: self.section,
                offset: self.offset(),
                need: n,
                have: self.remaining(),
            });
        }
        Ok(())
    }
}
