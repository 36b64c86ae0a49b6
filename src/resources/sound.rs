use std::ops::Range;

use crate::codec::BinaryReader;
use crate::error::Result;

/// One sound body inside a Sound section. Audio is not decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundEntry {
    pub kind: u8,
    /// Absolute byte range of the body in the resource file.
    pub range: Range<usize>,
}

impl SoundEntry {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Read up to `count` entries, stopping early when the section runs out.
pub fn read_sounds(reader: &mut BinaryReader, count: u32) -> Result<Vec<SoundEntry>> {
    let mut entries = Vec::new();
    while entries.len() < count as usize && !reader.is_empty() {
        let kind = reader.read_u8()?;
        let len = reader.read_u32_le()? as usize;
        let start = reader.offset();
        reader.skip(len)?;
        entries.push(SoundEntry { kind, range: start..start + len });
    }
    if entries.len() < count as usize {
        tracing::warn!(declared = count, found = entries.len(), "sound section ended early");
    }
    Ok(entries)
}
