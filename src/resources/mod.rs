//! Resource file catalog: vids with their sprites, and sound offsets.

pub mod animation;
pub mod sound;
pub mod sprite;
pub mod vid;

use std::path::Path;

use crate::codec::{Container, SectionType};
use crate::error::{Error, Result};

pub use animation::frame_range;
pub use sound::SoundEntry;
pub use sprite::{Frame, FramePixels, Palette, SpriteFormat, SpriteSet};
pub use vid::{UnitType, Vid, VidGraphics};

/// Behavior codes by nvid, all the map codec needs to know about vids.
pub trait BehaviorSource {
    fn vid_count(&self) -> usize;

    fn behavior(&self, nvid: usize) -> Option<u8>;
}

impl BehaviorSource for [Vid] {
    fn vid_count(&self) -> usize {
        self.len()
    }

    fn behavior(&self, nvid: usize) -> Option<u8> {
        self.get(nvid).map(|v| v.behave)
    }
}

impl BehaviorSource for [u8] {
    fn vid_count(&self) -> usize {
        self.len()
    }

    fn behavior(&self, nvid: usize) -> Option<u8> {
        self.get(nvid).copied()
    }
}

impl BehaviorSource for ResourceCatalog {
    fn vid_count(&self) -> usize {
        self.vids.len()
    }

    fn behavior(&self, nvid: usize) -> Option<u8> {
        self.vids.behavior(nvid)
    }
}

/// Decoded resource file. Built once, read-only afterwards.
pub struct ResourceCatalog {
    container: Container,
    vids: Vec<Vid>,
    sounds: Vec<SoundEntry>,
}

impl ResourceCatalog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_container(Container::open(path)?)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_container(Container::parse(data)?)
    }

    pub fn from_container(container: Container) -> Result<Self> {
        let mut vids = Vec::new();
        for section in container.sections_of(SectionType::Vid) {
            let mut reader = container.reader(section);
            let vid = Vid::read(&mut reader)?;
            if !reader.is_empty() {
                tracing::warn!(nvid = vids.len(), trailing = reader.remaining(), "bytes left after vid record");
            }
            tracing::trace!(nvid = vids.len(), name = %vid.name(), behave = vid.behave, "vid");
            vids.push(vid);
        }

        for (nvid, vid) in vids.iter().enumerate() {
            if let Some(owner) = vid.shared_from() {
                let reason = match vids.get(owner) {
                    None => Some("does not exist"),
                    Some(target) if target.owned_sprites().is_none() => Some("shares graphics itself"),
                    Some(_) => None,
                };
                if let Some(reason) = reason {
                    return Err(Error::SharedGraphics { nvid, owner, reason });
                }
            }
        }

        let mut sounds = Vec::new();
        for section in container.sections_of(SectionType::Sound) {
            let mut reader = container.reader(section);
            sounds.extend(sound::read_sounds(&mut reader, section.element_count())?);
        }

        tracing::debug!(vids = vids.len(), sounds = sounds.len(), "loaded resources");
        Ok(Self { container, vids, sounds })
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn vids(&self) -> &[Vid] {
        &self.vids
    }

    pub fn vid(&self, nvid: usize) -> Option<&Vid> {
        self.vids.get(nvid)
    }

    pub fn len(&self) -> usize {
        self.vids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vids.is_empty()
    }

    /// Index of the vid whose sprite set `nvid` displays.
    pub fn graphics_owner(&self, nvid: usize) -> Option<usize> {
        let vid = self.vids.get(nvid)?;
        Some(vid.shared_from().unwrap_or(nvid))
    }

    /// Sprite set shown by `nvid`, following a shared-graphics link.
    pub fn sprite_set(&self, nvid: usize) -> Option<&SpriteSet> {
        self.vids.get(self.graphics_owner(nvid)?)?.owned_sprites()
    }

    pub fn decode_frames(&self, nvid: usize) -> Result<Vec<FramePixels>> {
        let set = self.sprite_set(nvid).ok_or(Error::NoGraphics { nvid, count: self.vids.len() })?;
        set.decode()
    }

    pub fn sounds(&self) -> &[SoundEntry] {
        &self.sounds
    }

    /// Raw bytes of one sound body.
    pub fn sound_data(&self, index: usize) -> Option<&[u8]> {
        self.container.slice(self.sounds.get(index)?.range.clone())
    }
}
