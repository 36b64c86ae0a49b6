use crate::codec::SectionType;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("read past end of {section:?} range at offset {offset:#x}: need {need} bytes, have {have}")]
    Overrun {
        section: Option<SectionType>,
        offset: usize,
        need: usize,
        have: usize,
    },

    #[error("corrupt container: section {index} at offset {offset:#x}: {reason}")]
    CorruptContainer {
        index: usize,
        offset: usize,
        reason: &'static str,
    },

    #[error("truncated {section:?} record at offset {offset:#x}: declares {declared} bytes, {available} available")]
    TruncatedRecord {
        section: SectionType,
        offset: usize,
        declared: usize,
        available: usize,
    },

    #[error("objects and ids disagree at offset {offset:#x}: {objects} objects, {ids} ids")]
    ObjectIdMismatch { objects: usize, ids: usize, offset: usize },

    #[error("command block at offset {offset:#x} refers to unknown object id {id}")]
    UnknownCommandSubject { id: u32, offset: usize },

    #[error("{section:?} object at offset {offset:#x}: vid {nvid} has behavior code {behavior} with no payload layout")]
    UnknownClassification {
        nvid: u16,
        behavior: u8,
        section: Option<SectionType>,
        offset: usize,
    },

    #[error("{section:?} object at offset {offset:#x} refers to vid {nvid}, catalog has {count} vids")]
    UnknownVid {
        nvid: i32,
        count: usize,
        section: Option<SectionType>,
        offset: usize,
    },

    #[error("vid {nvid} has no graphics, catalog has {count} vids")]
    NoGraphics { nvid: usize, count: usize },

    #[error("expected exactly {expected} {section:?} section(s), found {found}")]
    SectionCount {
        section: SectionType,
        expected: usize,
        found: usize,
    },

    #[error("malformed {section:?} data at offset {offset:#x}: {reason}")]
    Malformed {
        section: SectionType,
        offset: usize,
        reason: String,
    },

    #[error("vid {nvid} shares graphics of vid {owner}, which {reason}")]
    SharedGraphics {
        nvid: usize,
        owner: usize,
        reason: &'static str,
    },

    #[error("unsupported map version {0}")]
    UnsupportedVersion(u32),

    #[error("moving objects by ({dx}, {dy}) leaves the 16-bit coordinate range")]
    CoordinateOverflow { dx: i32, dy: i32 },

    #[error("id source failed: {0}")]
    IdSource(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
