use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gromada::export::{write_map_json, write_vids_csv};
use gromada::map::{load_map, load_menu, save_map};
use gromada::{Action, ResourceCatalog, SaveOptions};

#[derive(Parser)]
#[command(name = "gromada")]
#[command(about = "Inspect Gromada resource files and load or re-save maps")]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List vids, or export them as CSV
    Vids {
        resources: PathBuf,
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Decode the frames of one vid
    Frames {
        resources: PathBuf,
        nvid: usize,
    },
    /// Summarize a map, or export it as JSON
    Map {
        resources: PathBuf,
        map: PathBuf,
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Load a map and save it again
    Resave {
        resources: PathBuf,
        map: PathBuf,
        output: PathBuf,
        /// Keep object coordinates as they are
        #[arg(long)]
        keep_origin: bool,
    },
    /// List the objects of a menu file
    Menu {
        resources: PathBuf,
        menu: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Vids { resources, csv } => {
            let catalog = ResourceCatalog::open(&resources)?;
            if let Some(path) = csv {
                write_vids_csv(catalog.vids(), BufWriter::new(File::create(&path)?))?;
                eprintln!("Wrote {} vids to {}", catalog.len(), path.display());
                return Ok(());
            }
            for (nvid, vid) in catalog.vids().iter().enumerate() {
                let graphics = match vid.shared_from() {
                    Some(owner) => format!("shares {owner}"),
                    None => match vid.owned_sprites() {
                        Some(set) => format!("{} frames {}x{}", set.frame_count(), set.width, set.height),
                        None => "-".to_string(),
                    },
                };
                println!(
                    "{nvid:5} {:<34} {:<8} behave={:<3} {graphics}",
                    vid.name(),
                    vid.unit_type.label(),
                    vid.behave
                );
            }
            println!("{} vids, {} sounds", catalog.len(), catalog.sounds().len());
        }
        Commands::Frames { resources, nvid } => {
            let catalog = ResourceCatalog::open(&resources)?;
            let vid = catalog.vid(nvid).ok_or_else(|| format!("no vid {nvid}, catalog has {}", catalog.len()))?;
            let frames = catalog.decode_frames(nvid)?;
            let set = catalog.sprite_set(nvid).ok_or("vid has no sprites")?;
            println!(
                "{} ({}): {} frames of {}x{}, format {:?}",
                vid.name(),
                nvid,
                frames.len(),
                set.width,
                set.height,
                set.format()
            );
            for code in 0..Action::COUNT as u8 {
                let Some(action) = Action::from_u8(code) else { continue };
                if vid.animation_lengths()[code as usize] == 0 {
                    continue;
                }
                if let Some(range) = gromada::resources::frame_range(vid, action, 0) {
                    println!("  {:<12} {:?}", action.name(), range);
                }
            }
        }
        Commands::Map { resources, map, json } => {
            let catalog = ResourceCatalog::open(&resources)?;
            let doc = load_map(&map, &catalog)?;
            if let Some(path) = json {
                write_map_json(&doc, BufWriter::new(File::create(&path)?))?;
                eprintln!("Wrote {} objects to {}", doc.objects.len(), path.display());
                return Ok(());
            }
            let header = &doc.header;
            println!(
                "{}x{} {:?}, observer ({}, {}), timer {}",
                header.width, header.height, header.version, header.observer_x, header.observer_y, header.start_timer
            );
            println!("{} objects, {} commands", doc.objects.len(), doc.command_count());
            for (nvid, count) in doc.census() {
                let name = catalog.vid(nvid as usize).map(|v| v.name()).unwrap_or_default();
                println!("  {nvid:5} {name:<34} {count}");
            }
            for (i, army) in doc.armies.iter().enumerate() {
                println!("army {i}: flagman {}, {} squads", army.flagman, army.squads.len());
            }
        }
        Commands::Resave { resources, map, output, keep_origin } => {
            let catalog = ResourceCatalog::open(&resources)?;
            let doc = load_map(&map, &catalog)?;
            let options = SaveOptions { normalize_origin: !keep_origin };
            let saved = save_map(&output, &doc, &catalog, &options)?;
            eprintln!("Saved {} objects to {}", saved.objects.len(), output.display());
        }
        Commands::Menu { resources, menu } => {
            let catalog = ResourceCatalog::open(&resources)?;
            for object in load_menu(&menu, &catalog)? {
                let name = catalog.vid(object.nvid as usize).map(|v| v.name()).unwrap_or_default();
                println!("{:5} {name:<34} ({}, {}, {})", object.nvid, object.x, object.y, object.z);
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
