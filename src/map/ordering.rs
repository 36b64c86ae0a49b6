//! Output ordering and ids for saving an edited object set.
//!
//! Objects that came from a file carry an [`EditorOrdering`]; they go back to
//! their old index with their old id so an unedited map saves unchanged.
//! Everything else fills the gaps.

use std::collections::VecDeque;

use ahash::AHashSet;

use crate::error::{Error, Result};
use super::{EditorOrdering, GameObject, MapDocument};

/// Attempts at drawing an unused id before giving up.
const MAX_ID_ATTEMPTS: usize = 64;

/// Source of candidate object ids.
pub trait IdSource {
    fn next_id(&mut self) -> Result<u32>;
}

/// Ids from the operating system's random number generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_id(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        getrandom::getrandom(&mut buf).map_err(|e| Error::IdSource(e.to_string()))?;
        Ok(u32::from_le_bytes(buf))
    }
}

/// Arrange objects for writing and give every object a unique non-zero id.
///
/// Objects are placed as follows:
/// 1. loaded objects whose old index is still inside the output go to that index;
/// 2. loaded objects whose old index is past the end fill free slots, lowest old index first;
/// 3. new objects fill the remaining slots in the order given.
///
/// Loaded objects get their old id back. New objects keep their id unless it
/// is zero or already taken, in which case a fresh one is drawn from `ids`.
/// The result carries orderings matching its own layout.
///
/// # Panics
///
/// Panics if two objects claim the same old index, or if the placement
/// leaves a slot empty or an object unplaced.
pub fn reorder(objects: Vec<GameObject>, ids: &mut dyn IdSource) -> Result<Vec<GameObject>> {
    let total = objects.len();
    let mut slots: Vec<Option<GameObject>> = vec![None; total];
    let mut displaced = Vec::new();
    let mut fresh = VecDeque::new();
    let mut seen_indices = AHashSet::new();
    let mut taken: AHashSet<u32> = AHashSet::with_capacity(total);

    for mut object in objects {
        let Some(EditorOrdering { id, index }) = object.ordering else {
            fresh.push_back(object);
            continue;
        };
        assert!(seen_indices.insert(index), "two objects were loaded from index {index}");
        object.id = id;
        taken.insert(id);
        if index < total {
            slots[index] = Some(object);
        } else {
            displaced.push((index, object));
        }
    }
    displaced.sort_by_key(|(index, _)| *index);

    let mut displaced = displaced.into_iter().map(|(_, object)| object);
    let mut placed_fresh = 0;
    for slot in slots.iter_mut().filter(|s| s.is_none()) {
        if let Some(object) = displaced.next() {
            *slot = Some(object);
            continue;
        }
        let Some(mut object) = fresh.pop_front() else {
            panic!("free slot left without an object");
        };
        if object.id == 0 || taken.contains(&object.id) {
            object.id = fresh_id(ids, &taken)?;
        }
        taken.insert(object.id);
        placed_fresh += 1;
        *slot = Some(object);
    }
    assert!(displaced.next().is_none(), "displaced objects left without a slot");
    assert!(fresh.is_empty(), "new objects left without a slot");

    tracing::debug!(total, fresh = placed_fresh, "reordered objects");
    Ok(slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            let Some(mut object) = slot else {
                panic!("slot {index} left empty");
            };
            object.ordering = Some(EditorOrdering { id: object.id, index });
            object
        })
        .collect())
}

fn fresh_id(ids: &mut dyn IdSource, taken: &AHashSet<u32>) -> Result<u32> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let id = ids.next_id()?;
        if id != 0 && !taken.contains(&id) {
            return Ok(id);
        }
        tracing::trace!(id, "id rejected");
    }
    Err(Error::IdSource(format!("no unused id after {MAX_ID_ATTEMPTS} attempts")))
}

/// Move all objects so their bounding box starts at (0, 0).
///
/// The header's size and observer position move by the same amount, clamped
/// at zero. Returns the applied shift.
pub fn normalize_origin(doc: &mut MapDocument) -> Result<(i32, i32)> {
    let Some(bounds) = doc.bounds() else {
        return Ok((0, 0));
    };
    let dx = -(bounds.min_x as i32);
    let dy = -(bounds.min_y as i32);
    if dx == 0 && dy == 0 {
        return Ok((0, 0));
    }
    if bounds.max_x as i32 + dx > i16::MAX as i32 || bounds.max_y as i32 + dy > i16::MAX as i32 {
        return Err(Error::CoordinateOverflow { dx, dy });
    }

    for object in &mut doc.objects {
        object.x = (object.x as i32 + dx) as i16;
        object.y = (object.y as i32 + dy) as i16;
    }

    let header = &mut doc.header;
    header.width = shift_size(header.width, dx);
    header.height = shift_size(header.height, dy);
    header.observer_x = shift_coord(header.observer_x, dx);
    header.observer_y = shift_coord(header.observer_y, dy);

    tracing::debug!(dx, dy, "moved map origin");
    Ok((dx, dy))
}

fn shift_size(size: u32, delta: i32) -> u32 {
    (size as i64 + delta as i64).clamp(0, u32::MAX as i64) as u32
}

fn shift_coord(coord: i16, delta: i32) -> i16 {
    (coord as i32 + delta).clamp(0, i16::MAX as i32) as i16
}
