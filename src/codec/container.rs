use std::ops::Range;
use std::path::Path;

use crate::error::{Error, Result};
use super::reader::BinaryReader;

/// Section type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionType {
    None,
    MapInfo,
    Objects,
    Command,
    ObjectsIds,
    Army,
    Vid,
    Sound,
    Weapon,
    TilesTable,
    Other(u8),
}

impl SectionType {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::None,
            1 => Self::MapInfo,
            2 => Self::Objects,
            4 => Self::Command,
            5 => Self::ObjectsIds,
            6 => Self::Army,
            b'!' => Self::Vid,
            b'"' => Self::Sound,
            b'#' => Self::Weapon,
            b'%' => Self::TilesTable,
            other => Self::Other(other),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Self::None => 0,
            Self::MapInfo => 1,
            Self::Objects => 2,
            Self::Command => 4,
            Self::ObjectsIds => 5,
            Self::Army => 6,
            Self::Vid => b'!',
            Self::Sound => b'"',
            Self::Weapon => b'#',
            Self::TilesTable => b'%',
            Self::Other(v) => v,
        }
    }
}

/// Raw 11-byte section header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    pub section_type: SectionType,
    /// Distance to the next section, counted from the byte after this field.
    pub next_section_offset: u32,
    /// Advisory element count; decoders go by byte exhaustion instead.
    pub element_count: u32,
    /// Padding between the end of the header and the section data.
    pub data_offset: u16,
}

impl SectionHeader {
    pub const SIZE: usize = 11;
    /// `next_section_offset` is measured from header start + 5 (type + offset field).
    pub const NEXT_OFFSET_BASE: usize = 5;

    pub fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            section_type: SectionType::from_u8(reader.read_u8()?),
            next_section_offset: reader.read_u32_le()?,
            element_count: reader.read_u32_le()?,
            data_offset: reader.read_u16_le()?,
        })
    }
}

/// One section of a container, addressed by absolute byte range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub header: SectionHeader,
    /// Absolute offset of the section header.
    pub header_offset: usize,
    /// Absolute range of the section data.
    pub data: Range<usize>,
}

impl Section {
    pub fn section_type(&self) -> SectionType {
        self.header.section_type
    }

    pub fn element_count(&self) -> u32 {
        self.header.element_count
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A whole resource or map file with its parsed section table.
///
/// The file bytes are kept in memory; section readers borrow from them.
pub struct Container {
    data: Vec<u8>,
    declared_sections: u32,
    sections: Vec<Section>,
}

impl Container {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "opening container");
        Self::parse(std::fs::read(path)?)
    }

    pub fn parse(data: Vec<u8>) -> Result<Self> {
        let mut reader = BinaryReader::new(&data);
        let declared_sections = reader.read_u32_le()?;
        let mut sections = Vec::with_capacity((declared_sections as usize).min(4096));

        for index in 0..declared_sections as usize {
            let header_offset = reader.position();
            let header = SectionHeader::read(&mut reader)?;
            if header.next_section_offset == 0 {
                tracing::trace!(index, header_offset, "end marker");
                break;
            }

            let corrupt = |reason| Error::CorruptContainer { index, offset: header_offset, reason };
            let end = header_offset + SectionHeader::NEXT_OFFSET_BASE + header.next_section_offset as usize;
            let start = header_offset + SectionHeader::SIZE + header.data_offset as usize;
            if end < header_offset + SectionHeader::SIZE {
                return Err(corrupt("section ends inside its own header"));
            }
            if end > data.len() {
                return Err(corrupt("section extends past end of file"));
            }
            if start > end {
                return Err(corrupt("data offset points past section end"));
            }

            tracing::trace!(
                index,
                section = ?header.section_type,
                start,
                end,
                elements = header.element_count,
                "section"
            );
            sections.push(Section { header, header_offset, data: start..end });
            reader.seek(end)?;
        }

        tracing::debug!(declared = declared_sections, found = sections.len(), "parsed section table");
        Ok(Self { data, declared_sections, sections })
    }

    /// Raw file data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn declared_sections(&self) -> u32 {
        self.declared_sections
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn sections_of(&self, section_type: SectionType) -> impl Iterator<Item = &Section> + '_ {
        self.sections.iter().filter(move |s| s.section_type() == section_type)
    }

    /// Reader scoped to one section's data range.
    pub fn reader(&self, section: &Section) -> BinaryReader<'_> {
        BinaryReader::new(&self.data[section.data.clone()])
            .located(section.data.start, section.section_type())
    }

    /// Bytes of an absolute range, if it lies inside the file.
    pub fn slice(&self, range: Range<usize>) -> Option<&[u8]> {
        self.data.get(range)
    }
}
