use crate::codec::{BinaryReader, BinaryWriter, SectionType};
use crate::error::{Error, Result};
use crate::resources::BehaviorSource;
use super::{AdvancedPayload, MapVersion, Payload};

const BASE_BEHAVIORS: [u8; 12] = [0, 1, 5, 6, 7, 8, 11, 14, 15, 16, 18, 20];
const ADVANCED_BEHAVIORS: [u8; 5] = [2, 3, 4, 13, 17];
const EMPTY_BEHAVIORS: [u8; 4] = [9, 10, 12, 19];

/// Layout of an object's payload, decided by its vid's behavior code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadShape {
    None,
    Base,
    Advanced,
}

/// Payload layout for a behavior code, `None` for codes with no known layout.
pub fn classify(behavior: u8) -> Option<PayloadShape> {
    if BASE_BEHAVIORS.contains(&behavior) {
        Some(PayloadShape::Base)
    } else if ADVANCED_BEHAVIORS.contains(&behavior) {
        Some(PayloadShape::Advanced)
    } else if EMPTY_BEHAVIORS.contains(&behavior) {
        Some(PayloadShape::None)
    } else {
        None
    }
}

/// Look up the payload layout for objects of vid `nvid`.
///
/// `section` and `offset` locate the object record in errors.
pub fn shape_of<S: BehaviorSource + ?Sized>(
    vids: &S,
    nvid: i32,
    section: Option<SectionType>,
    offset: usize,
) -> Result<PayloadShape> {
    let behavior = usize::try_from(nvid)
        .ok()
        .and_then(|n| vids.behavior(n))
        .ok_or(Error::UnknownVid { nvid, count: vids.vid_count(), section, offset })?;
    classify(behavior).ok_or(Error::UnknownClassification { nvid: nvid as u16, behavior, section, offset })
}

pub fn read_payload(reader: &mut BinaryReader, shape: PayloadShape, version: MapVersion) -> Result<Payload> {
    Ok(match shape {
        PayloadShape::None => Payload::None,
        PayloadShape::Base => Payload::Base { hp: reader.read_u8()? },
        PayloadShape::Advanced => {
            let hp = reader.read_u8()?;
            let build_time = if version > MapVersion::V2 { Some(reader.read_u8()?) } else { None };
            let army = if version > MapVersion::V1 { Some(reader.read_u8()?) } else { None };
            let behave = reader.read_u8()?;
            let mut items = Vec::new();
            if version != MapVersion::V0 {
                loop {
                    let item = reader.read_i16_le()?;
                    if item < 0 {
                        break;
                    }
                    items.push(item);
                }
            }
            Payload::Advanced(AdvancedPayload { hp, build_time, army, behave, items })
        }
    })
}

/// Write `payload` in the latest layout for `shape`.
///
/// A payload of a different variant is written as `shape` with its hp kept
/// and every other field zero. Negative items would end the item list early
/// and are rejected.
pub fn write_payload(writer: &mut BinaryWriter, shape: PayloadShape, payload: &Payload) -> Result<()> {
    match shape {
        PayloadShape::None => {}
        PayloadShape::Base => writer.write_u8(payload.hp().unwrap_or(0)),
        PayloadShape::Advanced => {
            let fallback;
            let adv = match payload {
                Payload::Advanced(adv) => adv,
                other => {
                    fallback = AdvancedPayload { hp: other.hp().unwrap_or(0), ..AdvancedPayload::default() };
                    &fallback
                }
            };
            writer.write_u8(adv.hp);
            writer.write_u8(adv.build_time.unwrap_or(0));
            writer.write_u8(adv.army.unwrap_or(0));
            writer.write_u8(adv.behave);
            for &item in &adv.items {
                if item < 0 {
                    return Err(Error::Malformed {
                        section: SectionType::Objects,
                        offset: writer.len(),
                        reason: format!("negative item {item}"),
                    });
                }
                writer.write_i16_le(item);
            }
            writer.write_i16_le(-1);
        }
    }
    Ok(())
}
