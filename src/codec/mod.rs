pub mod reader;
pub mod writer;
pub mod types;
pub mod container;

pub use reader::BinaryReader;
pub use writer::BinaryWriter;
pub use types::*;
pub use container::{Container, Section, SectionHeader, SectionType};
