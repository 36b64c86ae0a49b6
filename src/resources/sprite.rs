use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::codec::{BinaryReader, Rgba8, SectionType};
use crate::error::{Error, Result};

pub const PALETTE_SIZE: usize = 256 * 3;

/// Reference tag marking a frame that carries its own pixels.
const OWNED_FRAME: u16 = 0xFFFF;

/// Decoded pixels of one frame, shared between a frame and its references.
pub type FramePixels = Arc<[Rgba8]>;

/// 256-entry RGB palette
#[derive(Clone, PartialEq, Eq)]
pub struct Palette([u8; PALETTE_SIZE]);

impl Palette {
    pub fn new(raw: [u8; PALETTE_SIZE]) -> Self {
        Self(raw)
    }

    pub fn color(&self, index: u8) -> Rgba8 {
        let i = index as usize * 3;
        Rgba8::rgb(self.0[i], self.0[i + 1], self.0[i + 2])
    }

    pub fn as_bytes(&self) -> &[u8; PALETTE_SIZE] {
        &self.0
    }
}

impl fmt::Debug for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Palette(..)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteFormat {
    /// One palette index per pixel.
    Raw,
    /// Row-grouped run-length stream.
    RunLength,
    Unknown(u8),
}

impl SpriteFormat {
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            0 => Self::Raw,
            2 => Self::RunLength,
            other => Self::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Byte range of the frame's pixel stream within the set's data.
    Owned(Range<usize>),
    /// Same pixels as an earlier owned frame.
    Reference(usize),
}

/// Animation frames owned by a single vid
#[derive(Debug, Clone)]
pub struct SpriteSet {
    pub format_tag: u8,
    pub frame_duration: u16,
    /// Declared size of palette plus frame table.
    pub data_size: u32,
    pub width: u16,
    pub height: u16,
    pub palette: Palette,
    data: Vec<u8>,
    data_offset: usize,
    frames: Vec<Frame>,
}

impl SpriteSet {
    pub const HEADER_SIZE: usize = 13;

    pub fn read(reader: &mut BinaryReader) -> Result<Self> {
        let header_offset = reader.offset();
        let format_tag = reader.read_u8()?;
        let frame_duration = reader.read_u16_le()?;
        let frame_count = reader.read_u16_le()?;
        let data_size = reader.read_u32_le()?;
        let width = reader.read_u16_le()?;
        let height = reader.read_u16_le()?;

        let frame_bytes = (data_size as usize).checked_sub(PALETTE_SIZE).ok_or_else(|| {
            Error::Malformed {
                section: SectionType::Vid,
                offset: header_offset,
                reason: format!("graphics data size {data_size} is smaller than the palette"),
            }
        })?;
        if data_size as usize > reader.remaining() {
            return Err(Error::TruncatedRecord {
                section: SectionType::Vid,
                offset: header_offset,
                declared: data_size as usize,
                available: reader.remaining(),
            });
        }

        let palette = Palette::new(reader.read_array()?);
        let data_offset = reader.offset();
        let data = reader.read_bytes(frame_bytes)?;
        let frames = parse_frames(
            BinaryReader::new(data).located(data_offset, SectionType::Vid),
            frame_count as usize,
        )?;

        Ok(Self {
            format_tag,
            frame_duration,
            data_size,
            width,
            height,
            palette,
            data: data.to_vec(),
            data_offset,
            frames,
        })
    }

    pub fn format(&self) -> SpriteFormat {
        SpriteFormat::from_tag(self.format_tag)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Index of the owned frame whose pixels `index` shows.
    pub fn resolve(&self, index: usize) -> Option<usize> {
        match self.frames.get(index)? {
            Frame::Owned(_) => Some(index),
            Frame::Reference(target) => Some(*target),
        }
    }

    /// Encoded bytes behind frame `index`, following a reference if needed.
    pub fn frame_data(&self, index: usize) -> Option<&[u8]> {
        match self.frames.get(self.resolve(index)?)? {
            Frame::Owned(range) => self.data.get(range.clone()),
            Frame::Reference(_) => None,
        }
    }

    /// Decode every frame in order.
    ///
    /// Reference frames share the pixel buffer of their target. Unknown
    /// formats decode to no frames at all.
    pub fn decode(&self) -> Result<Vec<FramePixels>> {
        if let SpriteFormat::Unknown(tag) = self.format() {
            tracing::debug!(tag, "unknown sprite format, no frames decoded");
            return Ok(Vec::new());
        }

        let mut decoded: Vec<FramePixels> = Vec::with_capacity(self.frames.len());
        for (index, frame) in self.frames.iter().enumerate() {
            let pixels = match frame {
                Frame::Owned(range) => self.decode_owned(range.clone())?.into(),
                Frame::Reference(target) => Arc::clone(&decoded[*target]),
            };
            decoded.push(pixels);
            tracing::trace!(index, "decoded frame");
        }
        Ok(decoded)
    }

    /// Decode a single frame; `None` for an out-of-range index or unknown format.
    pub fn decode_frame(&self, index: usize) -> Result<Option<Vec<Rgba8>>> {
        if matches!(self.format(), SpriteFormat::Unknown(_)) {
            return Ok(None);
        }
        let Some(owner) = self.resolve(index) else {
            return Ok(None);
        };
        match &self.frames[owner] {
            Frame::Owned(range) => self.decode_owned(range.clone()).map(Some),
            Frame::Reference(_) => Ok(None),
        }
    }

    fn decode_owned(&self, range: Range<usize>) -> Result<Vec<Rgba8>> {
        let offset = self.data_offset + range.start;
        let bytes = &self.data[range];
        match self.format() {
            SpriteFormat::Raw => self.decode_raw(bytes, offset),
            SpriteFormat::RunLength => self.decode_run_length(bytes, offset),
            SpriteFormat::Unknown(_) => Ok(Vec::new()),
        }
    }

    fn decode_raw(&self, bytes: &[u8], offset: usize) -> Result<Vec<Rgba8>> {
        if bytes.len() != self.pixel_count() {
            return Err(malformed(
                offset,
                format!("raw frame has {} bytes, expected {}", bytes.len(), self.pixel_count()),
            ));
        }
        Ok(bytes.iter().map(|&i| self.palette.color(i)).collect())
    }

    fn decode_run_length(&self, bytes: &[u8], offset: usize) -> Result<Vec<Rgba8>> {
        let width = self.width as usize;
        let mut pixels = vec![Rgba8::TRANSPARENT; self.pixel_count()];
        let mut reader = BinaryReader::new(bytes).located(offset, SectionType::Vid);

        let start_row = reader.read_u16_le()? as usize;
        let row_count = reader.read_u16_le()? as usize;
        if start_row + row_count > self.height as usize {
            return Err(malformed(
                offset,
                format!("rows {start_row}..{} exceed frame height {}", start_row + row_count, self.height),
            ));
        }

        for y in start_row..start_row + row_count {
            let row = &mut pixels[y * width..(y + 1) * width];
            let mut x = 0;
            loop {
                let control_offset = reader.offset();
                let control = reader.read_u8()?;
                if control == 0 {
                    break;
                }

                let count = (control & 0x3F) as usize;
                if x + count > width {
                    return Err(malformed(
                        control_offset,
                        format!("run of {count} at column {x} exceeds frame width {width}"),
                    ));
                }
                let run = &mut row[x..x + count];
                match (control & 0x80 != 0, control & 0x40 != 0) {
                    (false, false) => {}
                    (false, true) => run.fill(Rgba8::SHADOW),
                    (true, false) => {
                        let indices = reader.read_bytes(count)?;
                        for (px, &i) in run.iter_mut().zip(indices) {
                            *px = self.palette.color(i);
                        }
                    }
                    (true, true) => run.fill(self.palette.color(reader.read_u8()?)),
                }
                x += count;
            }
        }
        Ok(pixels)
    }
}

fn parse_frames(mut reader: BinaryReader, count: usize) -> Result<Vec<Frame>> {
    let mut frames = Vec::with_capacity(count);
    for index in 0..count {
        let offset = reader.offset();
        let size = reader.read_u32_le()? as usize;
        let reference = reader.read_u16_le()?;
        let payload = size.checked_sub(2).ok_or_else(|| {
            malformed(offset, format!("frame {index} is {size} bytes, shorter than its reference tag"))
        })?;
        let start = reader.position();
        reader.skip(payload)?;

        if payload > 0 {
            frames.push(Frame::Owned(start..start + payload));
            continue;
        }
        if reference == OWNED_FRAME {
            return Err(malformed(offset, format!("frame {index} has neither data nor a reference")));
        }
        let target = reference as usize;
        if target >= index {
            return Err(malformed(offset, format!("frame {index} refers to frame {target}, which is not earlier")));
        }
        // Keep references one hop deep.
        let target = match frames[target] {
            Frame::Reference(owner) => owner,
            Frame::Owned(_) => target,
        };
        frames.push(Frame::Reference(target));
    }

    if !reader.is_empty() {
        tracing::warn!(trailing = reader.remaining(), "bytes left after frame table");
    }
    Ok(frames)
}

fn malformed(offset: usize, reason: String) -> Error {
    Error::Malformed { section: SectionType::Vid, offset, reason }
}
