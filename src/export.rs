//! Text exports for inspecting maps and vids.

use std::io::Write;

use crate::error::Result;
use crate::map::MapDocument;
use crate::resources::Vid;

const VID_CSV_HEADER: &str = "nvid,name,unit_type,behave,flags,collision_mask,width,height,z_or_height,max_hp,\
grid_radius,p6,speed_x,speed_y,acceleration,rotation_period,army,weapon_index,unknown4,death_damage_radius,\
death_damage,link_x,link_y,link_z,linked_vid,unknown6,directions_count,z_priority,graphics,\
sprite_format,frame_duration,frame_count,data_size,sprite_width,sprite_height";

/// Pretty-printed JSON of the whole document.
pub fn write_map_json<W: Write>(doc: &MapDocument, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, doc)?;
    Ok(())
}

pub fn map_to_json(doc: &MapDocument) -> Result<String> {
    Ok(serde_json::to_string_pretty(doc)?)
}

/// One line per vid. Sprite columns are `-` for vids that share graphics.
pub fn write_vids_csv<W: Write>(vids: &[Vid], mut writer: W) -> Result<()> {
    writeln!(writer, "{VID_CSV_HEADER}")?;
    for (nvid, vid) in vids.iter().enumerate() {
        write!(
            writer,
            "{nvid},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            csv_field(&vid.name()),
            vid.unit_type.bits(),
            vid.behave,
            vid.flags,
            vid.collision_mask,
            vid.width,
            vid.height,
            vid.z_or_height,
            vid.max_hp,
            vid.grid_radius,
            vid.p6,
            vid.speed_x,
            vid.speed_y,
            vid.acceleration,
            vid.rotation_period,
            vid.army,
            vid.weapon_index,
            vid.unknown4,
            vid.death_damage_radius,
            vid.death_damage,
            vid.link_x,
            vid.link_y,
            vid.link_z,
            vid.linked_vid,
            vid.unknown6,
            vid.directions_count,
            vid.z_priority,
            vid.graphics_tag,
        )?;
        match vid.owned_sprites() {
            Some(set) => writeln!(
                writer,
                ",{},{},{},{},{},{}",
                set.format_tag,
                set.frame_duration,
                set.frame_count(),
                set.data_size,
                set.width,
                set.height
            )?,
            None => writeln!(writer, ",-,-,-,-,-,-")?,
        }
    }
    writer.flush()?;
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains(|c: char| matches!(c, ',' | '"' | '\n')) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
