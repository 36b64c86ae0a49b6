use std::path::Path;

use crate::codec::{BinaryWriter, SectionType};
use crate::error::{Error, Result};
use crate::resources::BehaviorSource;
use super::ordering::{normalize_origin, reorder, IdSource, RandomIds};
use super::payload::{shape_of, write_payload};
use super::{MapDocument, MapVersion};

/// Sections written by [`encode_map`], in order.
const SECTION_COUNT: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// Shift the map so the objects' bounding box starts at (0, 0).
    pub normalize_origin: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self { normalize_origin: true }
    }
}

/// Reorder, assign ids and normalize a copy of `doc` the way it will be written.
pub fn prepare(doc: &MapDocument, ids: &mut dyn IdSource, options: &SaveOptions) -> Result<MapDocument> {
    let mut out = MapDocument {
        header: doc.header.clone(),
        objects: reorder(doc.objects.clone(), ids)?,
        armies: doc.armies.clone(),
    };
    out.header.version = MapVersion::LATEST;
    if options.normalize_origin {
        normalize_origin(&mut out)?;
    }
    Ok(out)
}

/// Prepare `doc` and serialize it. Returns the written document alongside the bytes.
pub fn write_map<S: BehaviorSource + ?Sized>(
    doc: &MapDocument,
    vids: &S,
    ids: &mut dyn IdSource,
    options: &SaveOptions,
) -> Result<(MapDocument, Vec<u8>)> {
    let prepared = prepare(doc, ids, options)?;
    let bytes = encode_map(&prepared, vids)?;
    Ok((prepared, bytes))
}

/// Save `doc` to `path` with random ids for new objects.
pub fn save_map<S: BehaviorSource + ?Sized>(
    path: impl AsRef<Path>,
    doc: &MapDocument,
    vids: &S,
    options: &SaveOptions,
) -> Result<MapDocument> {
    let path = path.as_ref();
    let (prepared, bytes) = write_map(doc, vids, &mut RandomIds, options)?;
    std::fs::write(path, &bytes)?;
    tracing::info!(path = %path.display(), objects = prepared.objects.len(), bytes = bytes.len(), "saved map");
    Ok(prepared)
}

/// Serialize `doc` exactly as given, in the latest layout.
pub fn encode_map<S: BehaviorSource + ?Sized>(doc: &MapDocument, vids: &S) -> Result<Vec<u8>> {
    let mut w = BinaryWriter::with_capacity(64 + doc.objects.len() * 16);
    w.write_u32_le(SECTION_COUNT);

    w.write_section(SectionType::MapInfo, 1, |w| {
        let header = &doc.header;
        w.write_u32_le(header.width);
        w.write_u32_le(header.height);
        w.write_i16_le(header.observer_x);
        w.write_i16_le(header.observer_y);
        w.write_u32_le(header.field_e);
        w.write_u32_le(header.field_f);
        w.write_u32_le(header.start_timer);
        w.write_u32_le(MapVersion::LATEST.to_u32());
        Ok(())
    })?;

    w.write_section(SectionType::Objects, 1, |w| {
        for object in &doc.objects {
            // the list ends at the first nvid that reads back as zero or negative
            if object.nvid == 0 || object.nvid > i16::MAX as u16 {
                return Err(Error::Malformed {
                    section: SectionType::Objects,
                    offset: w.len(),
                    reason: format!("nvid {} cannot be stored", object.nvid),
                });
            }
            let shape = shape_of(vids, object.nvid as i32, Some(SectionType::Objects), w.len())?;
            w.write_u16_le(object.nvid);
            w.write_i16_le(object.x);
            w.write_i16_le(object.y);
            w.write_i16_le(object.z);
            w.write_u8(object.direction);
            w.write_u8(object.action);
            write_payload(w, shape, &object.payload)?;
        }
        w.write_i16_le(-1);
        Ok(())
    })?;

    w.write_section(SectionType::ObjectsIds, 1, |w| {
        w.write_u32_le(doc.objects.len() as u32);
        for object in &doc.objects {
            w.write_u32_le(object.id);
        }
        Ok(())
    })?;

    w.write_section(SectionType::Command, 1, |w| {
        for object in doc.objects.iter().filter(|o| !o.commands.is_empty()) {
            w.write_u32_le(object.id);
            w.write_i32_le(object.commands.len() as i32);
            for command in &object.commands {
                w.write_u8(command.action);
                w.write_u32_le(command.p1);
                w.write_u32_le(command.p2);
            }
        }
        w.write_u32_le(0);
        Ok(())
    })?;

    w.write_section(SectionType::Army, 1, |w| {
        w.write_u8(doc.armies.len() as u8);
        for army in &doc.armies {
            w.write_u32_le(army.a);
            w.write_u32_le(army.b);
            w.write_u32_le(army.c);
            w.write_u32_le(army.flagman);
            for squad in &army.squads {
                if squad.is_empty() || squad.contains(&0) {
                    return Err(Error::Malformed {
                        section: SectionType::Army,
                        offset: w.len(),
                        reason: format!("squad {squad:?} is empty or holds id 0"),
                    });
                }
                for &member in squad {
                    w.write_u32_le(member);
                }
                w.write_u32_le(0);
            }
            w.write_u32_le(0);
        }
        Ok(())
    })?;

    tracing::debug!(objects = doc.objects.len(), bytes = w.len(), "encoded map");
    Ok(w.into_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Container;
    use crate::map::loader::parse_map;
    use crate::map::loader::tests::BEHAVIORS;
    use crate::map::ordering::tests::FixedIds;
    use crate::map::{AdvancedPayload, Army, Command, EditorOrdering, GameObject, MapHeader, Payload};

    fn sample() -> MapDocument {
        let mut tank = GameObject::new(5, 0, 4, 1);
        tank.id = 11;
        tank.direction = 64;
        tank.payload = Payload::Advanced(AdvancedPayload {
            hp: 90,
            build_time: Some(3),
            army: Some(1),
            behave: 2,
            items: vec![7, 8],
        });
        tank.commands = vec![Command { action: 2, p1: 10, p2: 20 }];

        let mut tree = GameObject::new(1, 12, 0, 0);
        tree.id = 12;
        tree.payload = Payload::Base { hp: 5 };

        MapDocument {
            header: MapHeader { width: 32, height: 32, version: MapVersion::V3, ..MapHeader::default() },
            objects: vec![tank, tree, GameObject { id: 13, ..GameObject::new(3, 1, 1, 0) }],
            armies: [
                Army { a: 1, b: 2, c: 3, flagman: 11, squads: vec![vec![11, 13]] },
                Army::default(),
            ],
        }
    }

    #[test]
    fn test_section_layout() {
        let bytes = encode_map(&sample(), BEHAVIORS).unwrap();
        let container = Container::parse(bytes).unwrap();
        let types: Vec<SectionType> = container.sections().iter().map(|s| s.section_type()).collect();
        assert_eq!(
            types,
            vec![
                SectionType::MapInfo,
                SectionType::Objects,
                SectionType::ObjectsIds,
                SectionType::Command,
                SectionType::Army,
            ]
        );
        assert_eq!(container.declared_sections(), 5);
        assert_eq!(container.sections()[0].len(), MapHeader::SIZE);
        assert!(container.sections().iter().all(|s| s.element_count() == 1));
    }

    #[test]
    fn test_encode_then_load() {
        let doc = sample();
        let loaded = parse_map(encode_map(&doc, BEHAVIORS).unwrap(), BEHAVIORS).unwrap();
        assert_eq!(loaded.header, doc.header);
        assert_eq!(loaded.armies, doc.armies);
        for (index, (a, b)) in loaded.objects.iter().zip(&doc.objects).enumerate() {
            assert_eq!(a.ordering, Some(EditorOrdering { id: b.id, index }));
            assert_eq!(GameObject { ordering: None, ..a.clone() }, *b);
        }
    }

    #[test]
    fn test_prepare_upgrades_and_normalizes() {
        let mut doc = sample();
        doc.header.version = MapVersion::V1;
        doc.objects[1].x = -4;
        doc.objects.push(GameObject::new(1, 2, 2, 0));

        let out = prepare(&doc, &mut FixedIds::new(&[99]), &SaveOptions::default()).unwrap();
        assert_eq!(out.header.version, MapVersion::V3);
        assert_eq!(out.header.width, 36);
        assert_eq!(out.objects[1].x, 0);
        assert_eq!(out.objects[0].x, 4);
        assert_eq!(out.objects[3].id, 99);

        let kept = prepare(&doc, &mut FixedIds::new(&[99]), &SaveOptions { normalize_origin: false }).unwrap();
        assert_eq!(kept.objects[1].x, -4);
        assert_eq!(kept.header.width, 32);
    }

    #[test]
    fn test_write_map_returns_written_document() {
        let mut doc = sample();
        doc.objects[0].ordering = Some(EditorOrdering { id: 11, index: 2 });
        doc.objects[2].ordering = Some(EditorOrdering { id: 13, index: 0 });

        let (written, bytes) = write_map(&doc, BEHAVIORS, &mut FixedIds::new(&[]), &SaveOptions::default()).unwrap();
        let reloaded = parse_map(bytes, BEHAVIORS).unwrap();
        let ids: Vec<u32> = reloaded.objects.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![13, 12, 11]);
        assert_eq!(written.objects.iter().map(|o| o.id).collect::<Vec<_>>(), ids);
    }

    #[test]
    fn test_object_without_layout_fails() {
        let mut doc = sample();
        doc.objects[0].nvid = 6;
        assert!(matches!(
            encode_map(&doc, BEHAVIORS),
            Err(Error::UnknownClassification { nvid: 6, behavior: 42, section: Some(SectionType::Objects), .. })
        ));
    }

    #[test]
    fn test_nvid_that_reads_back_as_terminator_fails() {
        let behaviors = vec![0u8; 40_000];
        for nvid in [0, 39_000] {
            let mut doc = sample();
            doc.objects[1].nvid = nvid;
            assert!(matches!(
                encode_map(&doc, behaviors.as_slice()),
                Err(Error::Malformed { section: SectionType::Objects, .. })
            ));
        }

        let mut doc = sample();
        doc.objects[1].nvid = i16::MAX as u16;
        let bytes = encode_map(&doc, behaviors.as_slice()).unwrap();
        assert_eq!(parse_map(bytes, behaviors.as_slice()).unwrap().objects.len(), 3);
    }

    #[test]
    fn test_negative_item_fails() {
        let mut doc = sample();
        if let Payload::Advanced(adv) = &mut doc.objects[0].payload {
            adv.items.push(-5);
        }
        assert!(matches!(
            encode_map(&doc, BEHAVIORS),
            Err(Error::Malformed { section: SectionType::Objects, .. })
        ));
    }

    #[test]
    fn test_squads_that_would_misalign_armies_fail() {
        for squads in [vec![vec![], vec![5]], vec![vec![5, 0, 6]]] {
            let mut doc = sample();
            doc.armies[0] = Army { a: 1, b: 2, c: 3, flagman: 5, squads };
            doc.armies[1] = Army { a: 7, b: 8, c: 9, ..Army::default() };
            assert!(matches!(
                encode_map(&doc, BEHAVIORS),
                Err(Error::Malformed { section: SectionType::Army, .. })
            ));
        }
    }

    /// Full resave cycles against a resource catalog.
    mod resave {
        use super::*;
        use crate::ResourceCatalog;

        /// Behavior code per nvid: placeholder, tree, tank, crater, bunker.
        const CATALOG_BEHAVIORS: [u8; 5] = [0, 0, 2, 9, 13];

        fn vid_record(behave: u8) -> Vec<u8> {
            let mut w = BinaryWriter::new();
            w.write_bytes(b"Thing");
            w.write_bytes(&[0; 29]);
            w.write_u8(0x02);
            w.write_u8(behave);
            w.write_bytes(&[0; 2 + 33 + 144 + 32 + 16]);

            // one 1x1 frame, palette index 0
            let frame_table = [3u8, 0, 0, 0, 0xFF, 0xFF, 0];
            let mut sprite = BinaryWriter::new();
            sprite.write_u8(0);
            sprite.write_u16_le(1);
            sprite.write_u16_le(1);
            sprite.write_u32_le((768 + frame_table.len()) as u32);
            sprite.write_u16_le(1);
            sprite.write_u16_le(1);
            sprite.write_bytes(&[0x80; 768]);
            sprite.write_bytes(&frame_table);

            w.write_i32_le(sprite.len() as i32);
            w.write_bytes(sprite.as_slice());
            w.into_vec()
        }

        fn catalog() -> ResourceCatalog {
            let mut w = BinaryWriter::new();
            w.write_u32_le(CATALOG_BEHAVIORS.len() as u32);
            for behave in CATALOG_BEHAVIORS {
                w.write_section(SectionType::Vid, 1, |w| {
                    w.write_bytes(&vid_record(behave));
                    Ok(())
                })
                .unwrap();
            }
            ResourceCatalog::from_bytes(w.into_vec()).unwrap()
        }

        /// (nvid, x, y, id)
        const PLACEMENTS: [(i16, i16, i16, u32); 4] = [(1, 0, 0, 1001), (2, 40, 8, 1002), (3, 12, 30, 1003), (4, 7, 0, 1004)];

        fn payload_bytes(w: &mut BinaryWriter, version: u32, nvid: i16) {
            match nvid {
                1 => w.write_u8(60),
                2 | 4 => {
                    w.write_u8(100);
                    if version > 2 {
                        w.write_u8(5);
                    }
                    if version > 1 {
                        w.write_u8(1);
                    }
                    w.write_u8(3);
                    if version != 0 {
                        w.write_i16_le(nvid * 10);
                        w.write_i16_le(-1);
                    }
                }
                _ => {}
            }
        }

        /// What a payload written by `payload_bytes` reads back as after one save.
        fn saved_payload(version: u32, nvid: i16) -> Payload {
            match nvid {
                1 => Payload::Base { hp: 60 },
                2 | 4 => Payload::Advanced(AdvancedPayload {
                    hp: 100,
                    build_time: Some(if version > 2 { 5 } else { 0 }),
                    army: Some(if version > 1 { 1 } else { 0 }),
                    behave: 3,
                    items: if version != 0 { vec![nvid * 10] } else { vec![] },
                }),
                _ => Payload::None,
            }
        }

        fn map_file(version: u32) -> Vec<u8> {
            let mut w = BinaryWriter::new();
            w.write_u32_le(5);
            w.write_section(SectionType::MapInfo, 1, |w| {
                w.write_u32_le(128);
                w.write_u32_le(96);
                w.write_i16_le(20);
                w.write_i16_le(10);
                w.write_u32_le(7);
                w.write_u32_le(8);
                w.write_u32_le(900);
                if version > 0 {
                    w.write_u32_le(version);
                }
                Ok(())
            })
            .unwrap();
            w.write_section(SectionType::Objects, 1, |w| {
                for (nvid, x, y, _) in PLACEMENTS {
                    w.write_i16_le(nvid);
                    w.write_i16_le(x);
                    w.write_i16_le(y);
                    w.write_i16_le(0);
                    w.write_u8(32);
                    w.write_u8(0);
                    payload_bytes(w, version, nvid);
                }
                w.write_i16_le(-1);
                Ok(())
            })
            .unwrap();
            w.write_section(SectionType::ObjectsIds, 1, |w| {
                w.write_u32_le(PLACEMENTS.len() as u32);
                for (_, _, _, id) in PLACEMENTS {
                    w.write_u32_le(id);
                }
                Ok(())
            })
            .unwrap();
            w.write_section(SectionType::Command, 1, |w| {
                w.write_u32_le(1002);
                w.write_i32_le(1);
                w.write_u8(2);
                w.write_u32_le(40);
                w.write_u32_le(8);
                w.write_u32_le(0);
                Ok(())
            })
            .unwrap();
            w.write_section(SectionType::Army, 1, |w| {
                w.write_u8(2);
                for flagman in [1002u32, 0] {
                    w.write_u32_le(1);
                    w.write_u32_le(2);
                    w.write_u32_le(3);
                    w.write_u32_le(flagman);
                    if flagman != 0 {
                        w.write_u32_le(1002);
                        w.write_u32_le(1004);
                        w.write_u32_le(0);
                    }
                    w.write_u32_le(0);
                }
                Ok(())
            })
            .unwrap();
            w.into_vec()
        }

        fn section_bytes(file: &[u8], section_type: SectionType) -> Vec<u8> {
            let container = Container::parse(file.to_vec()).unwrap();
            let section = container.sections_of(section_type).next().unwrap();
            container.data()[section.data.clone()].to_vec()
        }

        #[test]
        fn test_every_version_survives_a_save() {
            let catalog = catalog();
            for version in 0..=3 {
                let loaded = parse_map(map_file(version), &catalog).unwrap();
                assert_eq!(loaded.header.version.to_u32(), version);

                let (_, bytes) = write_map(&loaded, &catalog, &mut FixedIds::new(&[]), &SaveOptions::default()).unwrap();
                let reloaded = parse_map(bytes, &catalog).unwrap();

                assert_eq!(reloaded.header.version, MapVersion::V3);
                assert_eq!(
                    MapHeader { version: loaded.header.version, ..reloaded.header.clone() },
                    loaded.header
                );
                assert_eq!(reloaded.objects.len(), PLACEMENTS.len());
                for (object, (nvid, x, y, id)) in reloaded.objects.iter().zip(PLACEMENTS) {
                    assert_eq!((object.nvid as i16, object.x, object.y, object.id), (nvid, x, y, id));
                    assert_eq!(object.direction, 32);
                    assert_eq!(object.payload, saved_payload(version, nvid), "version {version} nvid {nvid}");
                }
                assert_eq!(reloaded.objects[1].commands, loaded.objects[1].commands);
                assert_eq!(reloaded.armies, loaded.armies);
            }
        }

        #[test]
        fn test_old_header_is_shorter() {
            let container = Container::parse(map_file(0)).unwrap();
            let info = container.sections_of(SectionType::MapInfo).next().unwrap();
            assert_eq!(info.len(), MapHeader::SIZE_V0);
        }

        #[test]
        fn test_unedited_resave_is_byte_identical() {
            let catalog = catalog();
            let original = map_file(3);
            let loaded = parse_map(original.clone(), &catalog).unwrap();
            let (_, resaved) = write_map(&loaded, &catalog, &mut FixedIds::new(&[]), &SaveOptions::default()).unwrap();

            assert_eq!(resaved, original);
            for section in [SectionType::Objects, SectionType::ObjectsIds] {
                assert_eq!(section_bytes(&resaved, section), section_bytes(&original, section));
            }
        }

        #[test]
        fn test_edited_map_keeps_surviving_objects_in_place() {
            let catalog = catalog();
            let mut doc = parse_map(map_file(3), &catalog).unwrap();

            // delete the crater, add a tree next to the tank
            doc.objects.retain(|o| o.nvid != 3);
            let mut tree = GameObject::new(1, 44, 8, 0);
            tree.payload = Payload::Base { hp: 10 };
            doc.objects.insert(0, tree);

            let (written, bytes) = write_map(&doc, &catalog, &mut FixedIds::new(&[1001, 0, 77]), &SaveOptions::default()).unwrap();
            let reloaded = parse_map(bytes, &catalog).unwrap();

            let layout: Vec<(u16, u32)> = reloaded.objects.iter().map(|o| (o.nvid, o.id)).collect();
            assert_eq!(layout, vec![(1, 1001), (2, 1002), (1, 77), (4, 1004)]);
            assert_eq!(written.objects[2].ordering, Some(EditorOrdering { id: 77, index: 2 }));
            assert_eq!(reloaded.objects[1].commands.len(), 1);
        }

        #[test]
        fn test_resave_moves_origin_unless_asked_not_to() {
            let catalog = catalog();
            let mut doc = parse_map(map_file(3), &catalog).unwrap();
            for object in &mut doc.objects {
                object.x += 5;
                object.y -= 3;
            }

            let moved = prepare(&doc, &mut FixedIds::new(&[]), &SaveOptions::default()).unwrap();
            assert_eq!((moved.objects[0].x, moved.objects[0].y), (0, 0));
            assert_eq!((moved.header.width, moved.header.height), (123, 99));
            assert_eq!((moved.header.observer_x, moved.header.observer_y), (15, 13));

            let kept = prepare(&doc, &mut FixedIds::new(&[]), &SaveOptions { normalize_origin: false }).unwrap();
            assert_eq!((kept.objects[0].x, kept.objects[0].y), (5, -3));
            assert_eq!(kept.header.width, 128);
        }

        #[test]
        fn test_catalog_frames_decode() {
            let catalog = catalog();
            assert_eq!(catalog.len(), CATALOG_BEHAVIORS.len());
            let frames = catalog.decode_frames(2).unwrap();
            assert_eq!(frames.len(), 1);
            assert_eq!(frames[0].len(), 1);
            assert_eq!(frames[0][0].a, 255);
            assert_eq!(frames[0][0].r, 0x80);
        }
    }
}
