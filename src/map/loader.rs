use std::path::Path;

use ahash::AHashMap;

use crate::codec::{BinaryReader, Container, Section, SectionType};
use crate::error::{Error, Result};
use crate::resources::BehaviorSource;
use super::payload::{read_payload, shape_of};
use super::{Army, Command, EditorOrdering, GameObject, MapDocument, MapHeader, MapVersion};

/// Number of object lists in a menu file.
pub const MENU_LISTS: usize = 16;
const MENU_PREFIX: usize = 4;

pub fn load_map<S: BehaviorSource + ?Sized>(path: impl AsRef<Path>, vids: &S) -> Result<MapDocument> {
    read_map(&Container::open(path)?, vids)
}

pub fn parse_map<S: BehaviorSource + ?Sized>(data: Vec<u8>, vids: &S) -> Result<MapDocument> {
    read_map(&Container::parse(data)?, vids)
}

/// Decode a map from its container.
///
/// Every object is tagged with its position and id in the file so a later
/// save can put it back in place.
pub fn read_map<S: BehaviorSource + ?Sized>(container: &Container, vids: &S) -> Result<MapDocument> {
    let header = read_header(container)?;
    tracing::debug!(?header, "map header");

    // end of the last object or id record read
    let mut end = 0;
    let mut objects = Vec::new();
    for section in container.sections_of(SectionType::Objects) {
        let before = objects.len();
        let mut reader = container.reader(section);
        read_objects(&mut reader, header.version, vids, &mut objects)?;
        end = reader.offset();
        tracing::debug!(offset = section.data.start, objects = objects.len() - before, "objects section");
    }

    let mut ids = Vec::new();
    for section in container.sections_of(SectionType::ObjectsIds) {
        let mut reader = container.reader(section);
        read_ids(&mut reader, &mut ids)?;
        end = reader.offset();
    }
    if ids.len() != objects.len() {
        return Err(Error::ObjectIdMismatch { objects: objects.len(), ids: ids.len(), offset: end });
    }
    for (index, (object, &id)) in objects.iter_mut().zip(&ids).enumerate() {
        object.id = id;
        object.ordering = Some(EditorOrdering { id, index });
    }

    let mut lookup = AHashMap::with_capacity(ids.len());
    for (index, &id) in ids.iter().enumerate() {
        lookup.entry(id).or_insert(index);
    }
    for section in container.sections_of(SectionType::Command) {
        read_commands(&mut container.reader(section), &lookup, &mut objects)?;
    }

    let armies = read_armies(container)?;

    tracing::debug!(
        version = ?header.version,
        objects = objects.len(),
        squads = armies[0].squads.len() + armies[1].squads.len(),
        "loaded map"
    );
    Ok(MapDocument { header, objects, armies })
}

/// Load the object lists of a menu file.
pub fn load_menu<S: BehaviorSource + ?Sized>(path: impl AsRef<Path>, vids: &S) -> Result<Vec<GameObject>> {
    parse_menu(&std::fs::read(path)?, vids)
}

/// A menu file is a 4-byte prefix followed by sixteen V0 object lists.
pub fn parse_menu<S: BehaviorSource + ?Sized>(data: &[u8], vids: &S) -> Result<Vec<GameObject>> {
    let mut reader = BinaryReader::new(data);
    reader.skip(MENU_PREFIX)?;
    let mut objects = Vec::new();
    for _ in 0..MENU_LISTS {
        read_objects(&mut reader, MapVersion::V0, vids, &mut objects)?;
    }
    Ok(objects)
}

fn exactly_one(container: &Container, section_type: SectionType) -> Result<&Section> {
    let mut sections = container.sections_of(section_type);
    match (sections.next(), sections.count()) {
        (Some(section), 0) => Ok(section),
        (first, rest) => Err(Error::SectionCount {
            section: section_type,
            expected: 1,
            found: first.map_or(0, |_| 1 + rest),
        }),
    }
}

fn read_header(container: &Container) -> Result<MapHeader> {
    let section = exactly_one(container, SectionType::MapInfo)?;
    let mut reader = container.reader(section);
    let mut header = MapHeader {
        width: reader.read_u32_le()?,
        height: reader.read_u32_le()?,
        observer_x: reader.read_i16_le()?,
        observer_y: reader.read_i16_le()?,
        field_e: reader.read_u32_le()?,
        field_f: reader.read_u32_le()?,
        start_timer: reader.read_u32_le()?,
        version: MapVersion::V0,
    };
    if reader.len() >= MapHeader::SIZE {
        header.version = MapVersion::from_u32(reader.read_u32_le()?)?;
    }
    Ok(header)
}

/// Read objects until an nvid of zero or less.
fn read_objects<S: BehaviorSource + ?Sized>(
    reader: &mut BinaryReader,
    version: MapVersion,
    vids: &S,
    out: &mut Vec<GameObject>,
) -> Result<()> {
    loop {
        let offset = reader.offset();
        let nvid = reader.read_i16_le()?;
        if nvid <= 0 {
            return Ok(());
        }
        let shape = shape_of(vids, nvid as i32, reader.section(), offset)?;
        let x = reader.read_i16_le()?;
        let y = reader.read_i16_le()?;
        let z = reader.read_i16_le()?;
        let direction = reader.read_u8()?;
        let action = reader.read_u8()?;
        let payload = read_payload(reader, shape, version)?;
        tracing::trace!(nvid, x, y, z, ?shape, "object");
        out.push(GameObject {
            nvid: nvid as u16,
            x,
            y,
            z,
            direction,
            action,
            payload,
            ..GameObject::default()
        });
    }
}

fn read_ids(reader: &mut BinaryReader, out: &mut Vec<u32>) -> Result<()> {
    let count = reader.read_u32_le()? as usize;
    // The whole array must fit before anything is reserved.
    if count.saturating_mul(4) > reader.remaining() {
        return Err(Error::TruncatedRecord {
            section: SectionType::ObjectsIds,
            offset: reader.offset(),
            declared: count.saturating_mul(4),
            available: reader.remaining(),
        });
    }
    out.reserve(count);
    for _ in 0..count {
        out.push(reader.read_u32_le()?);
    }
    Ok(())
}

fn read_commands(reader: &mut BinaryReader, lookup: &AHashMap<u32, usize>, objects: &mut [GameObject]) -> Result<()> {
    loop {
        let offset = reader.offset();
        let subject = reader.read_u32_le()?;
        if subject == 0 {
            return Ok(());
        }
        let &index = lookup
            .get(&subject)
            .ok_or(Error::UnknownCommandSubject { id: subject, offset })?;

        let count_offset = reader.offset();
        let count = reader.read_i32_le()?;
        let count = usize::try_from(count).map_err(|_| Error::Malformed {
            section: SectionType::Command,
            offset: count_offset,
            reason: format!("negative command count {count}"),
        })?;

        let commands = &mut objects[index].commands;
        for _ in 0..count {
            commands.push(Command {
                action: reader.read_u8()?,
                p1: reader.read_u32_le()?,
                p2: reader.read_u32_le()?,
            });
        }
        tracing::trace!(subject, count, "commands");
    }
}

fn read_armies(container: &Container) -> Result<[Army; 2]> {
    let section = exactly_one(container, SectionType::Army)?;
    let mut reader = container.reader(section);

    let offset = reader.offset();
    let count = reader.read_u8()?;
    if count != 2 {
        return Err(Error::Malformed {
            section: SectionType::Army,
            offset,
            reason: format!("expected 2 armies, found {count}"),
        });
    }

    let mut armies: [Army; 2] = Default::default();
    for army in &mut armies {
        army.a = reader.read_u32_le()?;
        army.b = reader.read_u32_le()?;
        army.c = reader.read_u32_le()?;
        army.flagman = reader.read_u32_le()?;
        loop {
            let first = reader.read_u32_le()?;
            if first == 0 {
                break;
            }
            let mut squad = vec![first];
            loop {
                let member = reader.read_u32_le()?;
                if member == 0 {
                    break;
                }
                squad.push(member);
            }
            army.squads.push(squad);
        }
    }
    Ok(armies)
}
