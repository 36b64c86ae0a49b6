//! Gromada file formats
//!
//! Reads the sectioned container used by the game's resource and map files,
//! decodes vids with their sprite animations, and loads and saves maps.

pub mod codec;
pub mod error;
pub mod export;
pub mod map;
pub mod resources;

pub use error::{Error, Result};
pub use codec::{
    Action, BinaryReader, BinaryWriter, Bounds, Container, Rgba8,
    Section, SectionHeader, SectionType,
};
pub use resources::{
    BehaviorSource, Frame, FramePixels, ResourceCatalog, SoundEntry,
    SpriteFormat, SpriteSet, UnitType, Vid, VidGraphics,
};
pub use map::{
    AdvancedPayload, Army, Command, EditorOrdering, GameObject, MapDocument,
    MapHeader, MapVersion, Payload, PayloadShape, SaveOptions,
    IdSource, RandomIds,
};
