//! Map documents: header, placed objects, commands and armies.

pub mod loader;
pub mod ordering;
pub mod payload;
pub mod saver;

use indexmap::IndexMap;
use serde::Serialize;

use crate::codec::{Action, Bounds};
use crate::error::{Error, Result};

pub use loader::{load_map, load_menu, parse_map, parse_menu, read_map};
pub use ordering::{normalize_origin, reorder, IdSource, RandomIds};
pub use payload::{classify, PayloadShape};
pub use saver::{encode_map, prepare, save_map, write_map, SaveOptions};

/// Map format revision; gates optional object payload fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[repr(u32)]
pub enum MapVersion {
    #[default]
    V0 = 0,
    V1 = 1,
    V2 = 2,
    V3 = 3,
}

impl MapVersion {
    pub const LATEST: Self = Self::V3;

    pub fn from_u32(v: u32) -> Result<Self> {
        match v {
            0 => Ok(Self::V0),
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            3 => Ok(Self::V3),
            other => Err(Error::UnsupportedVersion(other)),
        }
    }

    pub fn to_u32(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MapHeader {
    pub width: u32,
    pub height: u32,
    pub observer_x: i16,
    pub observer_y: i16,
    /// Meaning unknown, kept as read.
    pub field_e: u32,
    /// Meaning unknown, kept as read.
    pub field_f: u32,
    pub start_timer: u32,
    pub version: MapVersion,
}

impl MapHeader {
    /// MapInfo size without the version field.
    pub const SIZE_V0: usize = 24;
    pub const SIZE: usize = 28;
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AdvancedPayload {
    pub hp: u8,
    /// Present from V3 on.
    pub build_time: Option<u8>,
    /// Present from V2 on.
    pub army: Option<u8>,
    pub behave: u8,
    /// Absent in V0.
    pub items: Vec<i16>,
}

/// Per-object data whose layout follows the vid's behavior code
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    #[default]
    None,
    Base {
        hp: u8,
    },
    Advanced(AdvancedPayload),
}

impl Payload {
    pub fn shape(&self) -> PayloadShape {
        match self {
            Self::None => PayloadShape::None,
            Self::Base { .. } => PayloadShape::Base,
            Self::Advanced(_) => PayloadShape::Advanced,
        }
    }

    pub fn hp(&self) -> Option<u8> {
        match self {
            Self::None => None,
            Self::Base { hp } => Some(*hp),
            Self::Advanced(adv) => Some(adv.hp),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Command {
    /// Raw action code; see [`Command::action`].
    pub action: u8,
    pub p1: u32,
    pub p2: u32,
}

impl Command {
    pub fn action(&self) -> Option<Action> {
        Action::from_u8(self.action)
    }
}

/// Where an object sat in the file it was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EditorOrdering {
    pub id: u32,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct GameObject {
    pub nvid: u16,
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub direction: u8,
    pub action: u8,
    /// Persistent id; 0 means not assigned yet.
    pub id: u32,
    pub payload: Payload,
    pub commands: Vec<Command>,
    #[serde(skip)]
    pub ordering: Option<EditorOrdering>,
}

impl GameObject {
    pub fn new(nvid: u16, x: i16, y: i16, z: i16) -> Self {
        Self { nvid, x, y, z, ..Self::default() }
    }
}

/// Ordered member ids.
pub type Squad = Vec<u32>;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Army {
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub flagman: u32,
    pub squads: Vec<Squad>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MapDocument {
    pub header: MapHeader,
    pub objects: Vec<GameObject>,
    pub armies: [Army; 2],
}

impl MapDocument {
    pub fn object_by_id(&self, id: u32) -> Option<&GameObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Tightest box around all object positions.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::around(self.objects.iter().map(|o| (o.x, o.y)))
    }

    pub fn command_count(&self) -> usize {
        self.objects.iter().map(|o| o.commands.len()).sum()
    }

    /// Object count per nvid, in order of first appearance.
    pub fn census(&self) -> IndexMap<u16, usize> {
        let mut counts = IndexMap::new();
        for object in &self.objects {
            *counts.entry(object.nvid).or_insert(0) += 1;
        }
        counts
    }
}
