//! `wldview`: a thin CLI front end over the `terraria-wld` decoder.
//!
//! Exercises the library end to end: inspect a world's header and flags,
//! count tiles/ores, locate a tile type, and optionally rasterize a
//! world to PNG.

use std::path::PathBuf;
use std::process::ExitCode;

use ansi_term::Colour::{Green, Red, Yellow};
use clap::{Parser, Subcommand};
use terraria_wld::color::{Bands, ColorMapper, Toggles};
use terraria_wld::decoder::decode_world;
use terraria_wld::minimap::MapDecoder;
use terraria_wld::tile::Tile;
use terraria_wld::{DecodeError, WorldModel};

#[derive(Parser)]
#[clap(name = "wldview", version, about = "Inspect Terraria .wld/.map files")]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print header and summary info for a world.
    Info { wld_path: PathBuf },
    /// Print the full world-flags schema.
    Flags { wld_path: PathBuf },
    /// Print tile/entity counts.
    Counts {
        wld_path: PathBuf,
        /// Also break down counts by common ore type.
        #[clap(long)]
        ores: bool,
    },
    /// Find every tile of a given numeric tile type.
    Find { wld_path: PathBuf, tile_type: u16 },
    /// Rasterize a world to a PNG image.
    Render {
        wld_path: PathBuf,
        out_path: PathBuf,
        #[clap(long)]
        no_tiles: bool,
        #[clap(long)]
        no_walls: bool,
        #[clap(long)]
        no_liquid: bool,
        #[clap(long)]
        no_bg: bool,
    },
    /// Print the header fields of a minimap (.map) file.
    MapInfo { map_path: PathBuf },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Info { wld_path } => info(&wld_path),
        Command::Flags { wld_path } => flags(&wld_path),
        Command::Counts { wld_path, ores } => counts(&wld_path, ores),
        Command::Find { wld_path, tile_type } => find(&wld_path, tile_type),
        Command::Render { wld_path, out_path, no_tiles, no_walls, no_liquid, no_bg } => {
            render(&wld_path, &out_path, no_tiles, no_walls, no_liquid, no_bg)
        }
        Command::MapInfo { map_path } => map_info(&map_path),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", Red.paint(e.to_string()));
            ExitCode::FAILURE
        }
    }
}

fn load_world(path: &PathBuf) -> Result<WorldModel, DecodeError> {
    let buf = std::fs::read(path).map_err(|e| DecodeError::MissingAsset {
        name: "world file",
        detail: e.to_string(),
    })?;
    let world = decode_world(&buf)?;
    for warning in world.warnings.iter() {
        log::warn!("{warning}");
        eprintln!("{}", Yellow.paint(format!("warning: {warning}")));
    }
    Ok(world)
}

fn info(path: &PathBuf) -> Result<(), DecodeError> {
    let world = load_world(path)?;
    let f = &world.flags;
    println!("title           {}", f.title);
    println!("world id        {}", f.world_id);
    println!("dimensions      {} x {}", f.tiles_wide, f.tiles_high);
    println!("spawn           ({}, {})", f.spawn_x, f.spawn_y);
    println!("ground/rock     {} / {}", f.ground_level, f.rock_level);
    println!("hard mode       {}", f.hard_mode);
    println!("expert mode     {}", f.expert_mode);
    println!("crimson world   {}", f.is_crimson);
    println!(
        "{}",
        Green.paint(format!(
            "corruption {:.1}%  crimson {:.1}%  hallow {:.1}%",
            corruption_percent(&world),
            crimson_percent(&world),
            hallow_percent(&world),
        ))
    );
    Ok(())
}

// §9's design note: represent the flags schema as one field per struct
// member rather than a dictionary. Printing it is then a flat list, at
// the cost of repeating each field name once here.
macro_rules! print_flags {
    ($f:expr, $($field:ident),+ $(,)?) => {
        $(println!("{:<24}{:?}", stringify!($field), $f.$field);)+
    };
}

fn flags(path: &PathBuf) -> Result<(), DecodeError> {
    let world = load_world(path)?;
    let f = &world.flags;
    print_flags!(
        f,
        title,
        world_id,
        left_world,
        right_world,
        top_world,
        bottom_world,
        tiles_high,
        tiles_wide,
        expert_mode,
        creation_time,
        moon_type,
        spawn_x,
        spawn_y,
        ground_level,
        rock_level,
        time,
        day_time,
        moon_phase,
        blood_moon,
        is_eclipse,
        dungeon_x,
        dungeon_y,
        is_crimson,
        downed_boss1,
        downed_boss2,
        downed_boss3,
        downed_queen_bee,
        downed_mech_boss1,
        downed_mech_boss2,
        downed_mech_boss3,
        downed_mech_boss_any,
        downed_plant_boss,
        downed_golem_boss,
        downed_slime_king_boss,
        saved_goblin,
        saved_wizard,
        saved_mech,
        downed_goblins,
        downed_clown,
        downed_frost,
        downed_pirates,
        shadow_orb_smashed,
        spawn_meteor,
        shadow_orb_count,
        altar_count,
        hard_mode,
        invasion_delay,
        invasion_size,
        invasion_type,
        invasion_x,
        slime_rain_time,
        sundial_cooldown,
        temp_raining,
        temp_rain_time,
        temp_max_rain,
        ore_tier1,
        ore_tier2,
        ore_tier3,
        cloud_bg_active,
        num_clouds,
        wind_speed_set,
        num_anglers,
        saved_angler,
        angler_quest,
        saved_stylist,
        saved_tax_collector,
        invasion_size_start,
        cultist_delay,
        killed_mob_count,
        fast_forward_time,
        downed_fishron,
        downed_martians,
        downed_lunatic_cultist,
        downed_moonlord,
        apocalypse,
    );
    println!("{:<24}{} strings", "anglers", f.anglers.len());
    println!("{:<24}{} entries", "killed_mobs", f.killed_mobs.len());
    println!("{:<24}{} byte(s)", "unknown_flags", f.unknown_flags.len());
    Ok(())
}

/// Tile-type IDs used for the corruption/crimson/hallow breakdown below.
/// Approximate, per the same public tile-ID reference `color.rs` draws
/// its rule table from; see that module's doc comment.
mod biome_tile {
    pub const CORRUPT_GRASS: u16 = 23;
    pub const EBONSTONE: u16 = 25;
    pub const CRIMSON_GRASS: u16 = 199;
    pub const CRIMSTONE: u16 = 203;
    pub const HALLOWED_GRASS: u16 = 109;
    pub const PEARLSTONE: u16 = 117;
}

fn biome_percent(world: &WorldModel, types: &[u16]) -> f64 {
    let grid = &world.tiles;
    let mut matching = 0u64;
    let mut total = 0u64;
    for x in 0..grid.width() {
        for y in 0..grid.height() {
            let tile: &Tile = grid.get(x, y);
            if tile.is_active {
                total += 1;
                if types.contains(&tile.tile_type) {
                    matching += 1;
                }
            }
        }
    }
    if total == 0 {
        0.0
    } else {
        100.0 * matching as f64 / total as f64
    }
}

fn corruption_percent(world: &WorldModel) -> f64 {
    biome_percent(world, &[biome_tile::CORRUPT_GRASS, biome_tile::EBONSTONE])
}

fn crimson_percent(world: &WorldModel) -> f64 {
    biome_percent(world, &[biome_tile::CRIMSON_GRASS, biome_tile::CRIMSTONE])
}

fn hallow_percent(world: &WorldModel) -> f64 {
    biome_percent(world, &[biome_tile::HALLOWED_GRASS, biome_tile::PEARLSTONE])
}

mod ore_tile {
    pub const IRON: u16 = 6;
    pub const COPPER: u16 = 7;
    pub const GOLD: u16 = 8;
    pub const SILVER: u16 = 9;
}

fn counts(path: &PathBuf, show_ores: bool) -> Result<(), DecodeError> {
    let world = load_world(path)?;
    let grid = &world.tiles;
    let mut active = 0u64;
    let mut ore_counts = [0u64; 4];
    for x in 0..grid.width() {
        for y in 0..grid.height() {
            let tile = grid.get(x, y);
            if tile.is_active {
                active += 1;
                match tile.tile_type {
                    ore_tile::IRON => ore_counts[0] += 1,
                    ore_tile::COPPER => ore_counts[1] += 1,
                    ore_tile::GOLD => ore_counts[2] += 1,
                    ore_tile::SILVER => ore_counts[3] += 1,
                    _ => {}
                }
            }
        }
    }
    println!("active tiles    {active}");
    println!("arena entries   {}", grid.arena_len());
    println!("chests          {}", world.chests.len());
    println!("signs           {}", world.signs.len());
    println!("npcs            {}", world.npcs.len());
    println!("mobs            {}", world.mobs.len());
    println!("tile entities   {}", world.tile_entities.len());
    if show_ores {
        println!("iron ore        {}", ore_counts[0]);
        println!("copper ore      {}", ore_counts[1]);
        println!("gold ore        {}", ore_counts[2]);
        println!("silver ore      {}", ore_counts[3]);
    }
    Ok(())
}

fn find(path: &PathBuf, tile_type: u16) -> Result<(), DecodeError> {
    let world = load_world(path)?;
    let grid = &world.tiles;
    let mut found = 0u64;
    for x in 0..grid.width() {
        for y in 0..grid.height() {
            let tile = grid.get(x, y);
            if tile.is_active && tile.tile_type == tile_type {
                println!("({x}, {y})");
                found += 1;
            }
        }
    }
    if found == 0 {
        eprintln!("{}", Yellow.paint(format!("no tiles of type {tile_type} found")));
    }
    Ok(())
}

fn render(
    wld_path: &PathBuf,
    out_path: &PathBuf,
    no_tiles: bool,
    no_walls: bool,
    no_liquid: bool,
    no_bg: bool,
) -> Result<(), DecodeError> {
    let world = load_world(wld_path)?;
    let mapper = ColorMapper::from_embedded()?;
    let toggles = Toggles { no_tiles, no_walls, no_liquid, no_bg };
    let bands = Bands {
        ground_level: world.flags.ground_level.max(0.0) as u32,
        rock_level: world.flags.rock_level.max(0.0) as u32,
        height: world.tiles.height(),
    };

    let width = world.tiles.width();
    let height = world.tiles.height();
    let mut img = image::RgbaImage::new(width, height);
    // Row-major per §6's image-writer collaborator, independent of the
    // decoder's own column-major grid layout.
    for y in 0..height {
        for x in 0..width {
            let tile = world.tiles.get(x, y);
            let lookup = mapper.tile_to_lookup(tile, x, y, toggles, bands);
            let color = mapper.resolve_color(lookup).unwrap_or([0, 0, 0, 0]);
            img.put_pixel(x, y, image::Rgba(color));
        }
    }
    img.save(out_path).map_err(|e| DecodeError::MissingAsset {
        name: "output image",
        detail: e.to_string(),
    })?;
    println!("{}", Green.paint(format!("wrote {}x{} image to {}", width, height, out_path.display())));
    Ok(())
}

fn map_info(path: &PathBuf) -> Result<(), DecodeError> {
    let buf = std::fs::read(path)
        .map_err(|e| DecodeError::MissingAsset { name: "minimap file", detail: e.to_string() })?;
    let map = MapDecoder::decode(&buf)?;
    println!("world name      {}", map.world_name);
    println!("world id        {}", map.world_id);
    println!("dimensions      {} x {}", map.tiles_x, map.tiles_y);
    println!("tile opts       {}", map.num_tile_opts);
    println!("wall opts       {}", map.num_wall_opts);
    println!("customized tile opts  {}", map.customized_tile_opts.len());
    println!("customized wall opts  {}", map.customized_wall_opts.len());
    println!("cells           {}", map.cells.len());
    Ok(())
}
