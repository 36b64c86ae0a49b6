use bitflags::bitflags;

use crate::codec::{Action, BinaryReader, SectionType};
use crate::error::{Error, Result};
use super::sprite::SpriteSet;

pub const NAME_LEN: usize = 34;
pub const ACTION_TABLE_LEN: usize = 144;

bitflags! {
    /// Unit category. Files store a single flag, but the raw byte is kept as is.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct UnitType: u8 {
        const TERRAIN = 0x01;
        const OBJECT = 0x02;
        const MONSTER = 0x04;
        const AVIA = 0x08;
        const CANNON = 0x10;
        const SPRITE = 0x20;
        const ITEM = 0x40;
    }
}

impl UnitType {
    pub fn label(self) -> &'static str {
        match self {
            Self::TERRAIN => "terrain",
            Self::OBJECT => "object",
            Self::MONSTER => "monster",
            Self::AVIA => "avia",
            Self::CANNON => "cannon",
            Self::SPRITE => "sprite",
            Self::ITEM => "item",
            _ => "unknown",
        }
    }
}

/// Where a vid's frames come from
#[derive(Debug, Clone)]
pub enum VidGraphics {
    Owned(SpriteSet),
    /// Frames belong to the vid at this index.
    Shared(usize),
}

/// One object type record.
///
/// Fields whose meaning is not known are kept under neutral names so the
/// record can be inspected and exported without loss.
#[derive(Debug, Clone)]
pub struct Vid {
    pub name: [u8; NAME_LEN],
    pub unit_type: UnitType,
    pub behave: u8,
    pub flags: u16,

    pub collision_mask: u8,
    pub width: u16,
    pub height: u16,
    pub z_or_height: u16,
    pub max_hp: u8,
    pub grid_radius: u16,
    pub p6: u8,

    pub speed_x: u16,
    pub speed_y: u16,
    pub acceleration: u16,
    pub rotation_period: u8,

    pub army: u8,
    pub weapon_index: u8,
    pub unknown4: u8,
    pub death_damage_radius: u16,
    pub death_damage: u8,

    pub link_x: u8,
    pub link_y: u8,
    pub link_z: u8,
    pub linked_vid: u16,

    pub unknown6: u16,
    pub directions_count: u8,
    pub z_priority: u8,

    /// The first 16 bytes are animation lengths per action.
    pub action_table: [u8; ACTION_TABLE_LEN],
    pub children: [u16; 16],
    pub extra: [u8; 16],

    /// Raw graphics discriminator: negative means shared.
    pub graphics_tag: i32,
    pub graphics: VidGraphics,
}

impl Vid {
    pub const FIXED_SIZE: usize = 263;

    pub fn read(reader: &mut BinaryReader) -> Result<Self> {
        let mut vid = Self {
            name: reader.read_array()?,
            unit_type: UnitType::from_bits_retain(reader.read_u8()?),
            behave: reader.read_u8()?,
            flags: reader.read_u16_le()?,

            collision_mask: reader.read_u8()?,
            width: reader.read_u16_le()?,
            height: reader.read_u16_le()?,
            z_or_height: reader.read_u16_le()?,
            max_hp: reader.read_u8()?,
            grid_radius: reader.read_u16_le()?,
            p6: reader.read_u8()?,

            speed_x: reader.read_u16_le()?,
            speed_y: reader.read_u16_le()?,
            acceleration: reader.read_u16_le()?,
            rotation_period: reader.read_u8()?,

            army: reader.read_u8()?,
            weapon_index: reader.read_u8()?,
            unknown4: reader.read_u8()?,
            death_damage_radius: reader.read_u16_le()?,
            death_damage: reader.read_u8()?,

            link_x: reader.read_u8()?,
            link_y: reader.read_u8()?,
            link_z: reader.read_u8()?,
            linked_vid: reader.read_u16_le()?,

            unknown6: reader.read_u16_le()?,
            directions_count: reader.read_u8()?,
            z_priority: reader.read_u8()?,

            action_table: reader.read_array()?,
            children: reader.read_u16_array_le()?,
            extra: reader.read_array()?,

            graphics_tag: 0,
            graphics: VidGraphics::Shared(0),
        };

        let tag_offset = reader.offset();
        vid.graphics_tag = reader.read_i32_le()?;
        vid.graphics = if vid.graphics_tag < 0 {
            VidGraphics::Shared(vid.graphics_tag.unsigned_abs() as usize)
        } else {
            let declared = vid.graphics_tag as usize;
            if declared > reader.remaining() {
                return Err(Error::TruncatedRecord {
                    section: SectionType::Vid,
                    offset: tag_offset,
                    declared,
                    available: reader.remaining(),
                });
            }
            let mut block = reader.sub_reader(declared)?;
            let set = SpriteSet::read(&mut block)?;
            if !block.is_empty() {
                tracing::warn!(trailing = block.remaining(), "bytes left in graphics block");
            }
            VidGraphics::Owned(set)
        };

        Ok(vid)
    }

    /// Name up to the first NUL, lossily decoded.
    pub fn name(&self) -> String {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }

    /// Animation length in frames for each action.
    pub fn animation_lengths(&self) -> &[u8] {
        &self.action_table[..Action::COUNT]
    }

    pub fn owned_sprites(&self) -> Option<&SpriteSet> {
        match &self.graphics {
            VidGraphics::Owned(set) => Some(set),
            VidGraphics::Shared(_) => None,
        }
    }

    pub fn shared_from(&self) -> Option<usize> {
        match self.graphics {
            VidGraphics::Owned(_) => None,
            VidGraphics::Shared(owner) => Some(owner),
        }
    }
}
