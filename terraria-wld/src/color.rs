//! Tile-to-color rendering rules: §4.5 `ColorMapper`.
//!
//! Three inputs — a [`Tile`], its grid coordinates, and four transparency
//! toggles — decide which of seven color tables a cell draws from, and
//! (for tiles and walls) which numbered variant within that table. The
//! variant rules are keyed on frame coordinates (`u`, `v`) exactly as the
//! decompiled game logic they're ported from; every documented branch is
//! implemented below, co-located with the `TileId` constants it dispatches
//! on.

use std::collections::{HashMap, HashSet};
use std::io::Read;

use crate::error::{DecodeError, Result};
use crate::tile::{LiquidType, Tile};

const DEFAULT_TILE_COLORS_CSV: &str = include_str!("../assets/MapTile_Colors.csv");
const DEFAULT_WALL_COLORS_CSV: &str = include_str!("../assets/MapTile_WallColors.csv");
const DEFAULT_LIQUID_COLORS_CSV: &str = include_str!("../assets/MapTile_LiquidColors.csv");

/// Hard-coded sky/dirt/rock gradient endpoints (§6); index 0 is the
/// shallow/near endpoint, index 1 the deep/far endpoint.
const SKY_GRADIENT: [(u8, u8, u8); 2] = [(50, 40, 255), (145, 185, 255)];
const DIRT_GRADIENT: [(u8, u8, u8); 2] = [(88, 61, 46), (37, 78, 123)];
const ROCK_GRADIENT: [(u8, u8, u8); 2] = [(74, 67, 60), (53, 70, 97)];

/// The wall type whose two color options alternate by column parity
/// rather than by frame coordinate (the planked/wood wall).
const PLANKED_WALL: u8 = 4;

/// Numeric tile-type IDs the per-type option rules below dispatch on.
///
/// These follow the public Terraria tile-ID reference (the same listing
/// that fixes `Containers = 21` and `Dressers = 88`, used elsewhere in
/// this crate for chest-type detection). IDs for less common types are a
/// best-effort reconstruction from that same public listing: a documented
/// assumption, not a verified fact, pending a real world file to check
/// against.
mod tile_id {
    pub const CONTAINERS: u16 = 21;
    pub const DEMON_ALTAR: u16 = 26;
    pub const SUNFLOWER: u16 = 27;
    pub const POTS: u16 = 28;
    pub const DRESSERS: u16 = 88;
    pub const MYTHRIL_ANVIL: u16 = 106;
    pub const SHADOW_ORBS: u16 = 25;
    pub const PRESSURE_PLATES: u16 = 147;
    pub const ADAMANTITE_FORGE: u16 = 216;
    pub const EXPOSED_GEMS: u16 = 178;
    pub const SMALL_PILES: u16 = 508;
    pub const LARGE_PILES: u16 = 509;
    pub const LARGE_PILES_2: u16 = 510;
    pub const LONG_MOSS: u16 = 219;
    pub const IMMATURE_HERBS: u16 = 220;
    pub const MATURE_HERBS: u16 = 221;
    pub const BLOOMING_HERBS: u16 = 222;
    pub const STATUES: u16 = 233;
    pub const HOLIDAY_LIGHTS: u16 = 299;
    pub const RAINBOW_BRICK: u16 = 179;
    pub const STALACTITE: u16 = 165;
    pub const DYE_PLANTS: u16 = 460;
    pub const PAINTING_3X3: u16 = 239;
    pub const PAINTING_6X4: u16 = 242;
}

fn clamp_div(value: i16, divisor: i16, max: u8) -> u8 {
    let q = (value.max(0) / divisor).max(0) as u32;
    q.min(max as u32) as u8
}

/// Resolves the per-type frame-coordinate disambiguation rule for an
/// active tile. `j` is the tile's row, needed by the handful of rules
/// that vary with vertical position instead of frame coordinates.
///
/// Running this twice on the same `(tile_type, u, v, j)` always yields
/// the same result (§8 property 10): every branch is a pure function of
/// its inputs, with no hidden state.
fn tile_option(tile_type: u16, u: i16, v: i16, j: u32) -> u8 {
    use tile_id::*;
    match tile_type {
        DEMON_ALTAR => {
            if u >= 54 {
                1
            } else {
                0
            }
        }
        SUNFLOWER => {
            if u < 34 {
                1
            } else {
                0
            }
        }
        POTS => {
            const BREAKS: [i16; 11] = [144, 252, 360, 468, 576, 648, 792, 898, 1006, 1114, 1222];
            const OPTIONS: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 8, 7, 0, 3, 7];
            let idx = BREAKS.iter().position(|&b| v < b).unwrap_or(BREAKS.len());
            OPTIONS[idx]
        }
        SHADOW_ORBS => {
            if u >= 36 {
                1
            } else {
                0
            }
        }
        LONG_MOSS => clamp_div(u, 22, 5),
        IMMATURE_HERBS | MATURE_HERBS | BLOOMING_HERBS => clamp_div(u, 18, 5),
        EXPOSED_GEMS => clamp_div(u, 18, 6),
        SMALL_PILES => {
            // Two v-bands, each its own run of u/18 variants (§4.5).
            let band = if v < 36 { 0 } else { 10 };
            band + clamp_div(u, 18, 9)
        }
        LARGE_PILES => clamp_div(u, 36, 9),
        LARGE_PILES_2 => clamp_div(u, 54, 9),
        ADAMANTITE_FORGE => {
            if u >= 52 {
                1
            } else {
                0
            }
        }
        MYTHRIL_ANVIL => {
            if u >= 28 {
                1
            } else {
                0
            }
        }
        PRESSURE_PLATES => {
            if u != 0 {
                1
            } else {
                0
            }
        }
        PAINTING_3X3 => {
            let col = (u.max(0) / 54) as u32;
            let row = (v.max(0) / 54) as u32;
            (col + row * 36).min(255) as u8
        }
        PAINTING_6X4 => {
            let band = v.max(0) / 72;
            if (22..=24).contains(&band) {
                1
            } else {
                0
            }
        }
        CONTAINERS | DRESSERS => clamp_div(u, 36, 4),
        STATUES => {
            if u < 72 {
                1
            } else {
                2
            }
        }
        HOLIDAY_LIGHTS | RAINBOW_BRICK => (j % 3) as u8,
        STALACTITE => clamp_div(u, 18, 3),
        DYE_PLANTS => clamp_div(u, 34, 255),
        _ => 0,
    }
}

/// Which of the seven color tables a lookup descriptor refers to (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    None,
    Tile,
    Liquid,
    Wall,
    Sky,
    Dirt,
    Rock,
}

/// Output of the tile-to-color decision: which table, which numbered
/// entry in that table, and which option within the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    pub table: Table,
    pub index: u32,
    pub option: u8,
}

/// Which layers the caller has asked to render as transparent (§4.5).
#[derive(Debug, Clone, Copy, Default)]
pub struct Toggles {
    pub no_tiles: bool,
    pub no_walls: bool,
    pub no_liquid: bool,
    pub no_bg: bool,
}

/// Vertical bands used by the background fallback (step 4 of §4.5),
/// derived from a world's flags (`ground_level`, `rock_level`, height).
#[derive(Debug, Clone, Copy)]
pub struct Bands {
    pub ground_level: u32,
    pub rock_level: u32,
    pub height: u32,
}

fn parse_csv_rows(text: &str, expected_cols: usize) -> Result<Vec<Vec<i64>>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(text.as_bytes());
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| DecodeError::MissingAsset {
            name: "color table",
            detail: e.to_string(),
        })?;
        if record.len() != expected_cols {
            return Err(DecodeError::MissingAsset {
                name: "color table",
                detail: format!("expected {expected_cols} columns, found {}", record.len()),
            });
        }
        let mut row = Vec::with_capacity(expected_cols);
        for field in record.iter() {
            row.push(field.parse::<i64>().map_err(|e| DecodeError::MissingAsset {
                name: "color table",
                detail: e.to_string(),
            })?);
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Static lookup tables plus the per-tile option rules, initialized once
/// from CSV and safe to share across threads (§5).
pub struct ColorMapper {
    tile_colors: HashMap<(u16, u8), (u8, u8, u8)>,
    wall_colors: HashMap<(u8, u8), (u8, u8, u8)>,
    liquid_colors: HashMap<u8, (u8, u8, u8)>,
    known_tiles: HashSet<u16>,
    known_walls: HashSet<u8>,
}

impl ColorMapper {
    /// Builds a mapper from the crate's embedded default CSVs, so
    /// rendering works without shipping external asset files.
    pub fn from_embedded() -> Result<Self> {
        Self::from_readers(
            DEFAULT_TILE_COLORS_CSV.as_bytes(),
            DEFAULT_WALL_COLORS_CSV.as_bytes(),
            DEFAULT_LIQUID_COLORS_CSV.as_bytes(),
        )
    }

    /// Builds a mapper from caller-supplied CSV sources, for callers who
    /// want to track a newer client's color tables than the ones bundled
    /// with this crate.
    pub fn from_readers<R1: Read, R2: Read, R3: Read>(
        mut tile_csv: R1,
        mut wall_csv: R2,
        mut liquid_csv: R3,
    ) -> Result<Self> {
        let mut tile_text = String::new();
        tile_csv
            .read_to_string(&mut tile_text)
            .map_err(|e| DecodeError::MissingAsset { name: "MapTile_Colors.csv", detail: e.to_string() })?;
        let mut wall_text = String::new();
        wall_csv
            .read_to_string(&mut wall_text)
            .map_err(|e| DecodeError::MissingAsset { name: "MapTile_WallColors.csv", detail: e.to_string() })?;
        let mut liquid_text = String::new();
        liquid_csv
            .read_to_string(&mut liquid_text)
            .map_err(|e| DecodeError::MissingAsset { name: "MapTile_LiquidColors.csv", detail: e.to_string() })?;

        let mut tile_colors = HashMap::new();
        let mut known_tiles = HashSet::new();
        for row in parse_csv_rows(&tile_text, 5)? {
            let (ty, opt, r, g, b) = (row[0] as u16, row[1] as u8, row[2] as u8, row[3] as u8, row[4] as u8);
            tile_colors.insert((ty, opt), (r, g, b));
            known_tiles.insert(ty);
        }

        let mut wall_colors = HashMap::new();
        let mut known_walls = HashSet::new();
        for row in parse_csv_rows(&wall_text, 5)? {
            let (wall, opt, r, g, b) = (row[0] as u8, row[1] as u8, row[2] as u8, row[3] as u8, row[4] as u8);
            wall_colors.insert((wall, opt), (r, g, b));
            known_walls.insert(wall);
        }

        let mut liquid_colors = HashMap::new();
        for row in parse_csv_rows(&liquid_text, 4)? {
            let (kind, r, g, b) = (row[0] as u8, row[1] as u8, row[2] as u8, row[3] as u8);
            liquid_colors.insert(kind, (r, g, b));
        }

        Ok(ColorMapper { tile_colors, wall_colors, liquid_colors, known_tiles, known_walls })
    }

    fn tile_is_missing(&self, tile_type: u16) -> bool {
        !self.known_tiles.contains(&tile_type)
    }

    fn wall_is_missing(&self, wall: u8) -> bool {
        !self.known_walls.contains(&wall)
    }

    /// The decision from §4.5: first match wins.
    pub fn tile_to_lookup(&self, tile: &Tile, i: u32, j: u32, toggles: Toggles, bands: Bands) -> Lookup {
        if tile.is_active && !self.tile_is_missing(tile.tile_type) && !toggles.no_tiles {
            let option = tile_option(tile.tile_type, tile.u, tile.v, j);
            return Lookup { table: Table::Tile, index: u32::from(tile.tile_type), option };
        }
        if tile.liquid_type != LiquidType::None && tile.liquid_amount > 32 && !toggles.no_liquid {
            let kind = match tile.liquid_type {
                LiquidType::Water => 0,
                LiquidType::Lava => 1,
                LiquidType::Honey => 2,
                LiquidType::None => unreachable!(),
            };
            return Lookup { table: Table::Liquid, index: kind, option: 0 };
        }
        if tile.wall != 0 && !self.wall_is_missing(tile.wall) && !toggles.no_walls {
            let option = if tile.wall == PLANKED_WALL { (i % 2) as u8 } else { 0 };
            return Lookup { table: Table::Wall, index: u32::from(tile.wall), option };
        }
        if !toggles.no_bg {
            if j < bands.ground_level {
                return Lookup { table: Table::Sky, index: 0, option: 0 };
            }
            if j < bands.rock_level {
                return Lookup { table: Table::Dirt, index: 0, option: 0 };
            }
            if bands.height >= 204 && j < bands.height - 204 {
                return Lookup { table: Table::Rock, index: 0, option: 0 };
            }
            return Lookup { table: Table::Rock, index: 1, option: 0 };
        }
        Lookup { table: Table::None, index: 0, option: 0 }
    }

    /// Resolves a lookup descriptor to an opaque RGBA color. Returns
    /// `None` for `Table::None` or when the descriptor names an entry
    /// absent from the loaded tables (shouldn't happen for descriptors
    /// produced by [`Self::tile_to_lookup`], but color lookup stays
    /// total rather than panicking on a caller-constructed `Lookup`).
    pub fn resolve_color(&self, lookup: Lookup) -> Option<[u8; 4]> {
        let (r, g, b) = match lookup.table {
            Table::None => return None,
            Table::Tile => *self.tile_colors.get(&(lookup.index as u16, lookup.option))?,
            Table::Wall => *self.wall_colors.get(&(lookup.index as u8, lookup.option))?,
            Table::Liquid => *self.liquid_colors.get(&(lookup.index as u8))?,
            Table::Sky => gradient_endpoint(SKY_GRADIENT, lookup.index),
            Table::Dirt => gradient_endpoint(DIRT_GRADIENT, lookup.index),
            Table::Rock => gradient_endpoint(ROCK_GRADIENT, lookup.index),
        };
        Some([r, g, b, 255])
    }
}

fn gradient_endpoint(gradient: [(u8, u8, u8); 2], index: u32) -> (u8, u8, u8) {
    gradient[index.min(1) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::BrickStyle;

    fn active_tile(tile_type: u16, u: i16, v: i16) -> Tile {
        Tile {
            is_active: true,
            tile_type,
            u,
            v,
            wall: 0,
            tile_color: 0,
            wall_color: 0,
            wire_red: false,
            wire_green: false,
            wire_blue: false,
            liquid_type: LiquidType::None,
            liquid_amount: 0,
            brick_style: BrickStyle::Full,
            actuator: false,
            inactive: false,
        }
    }

    fn bands() -> Bands {
        Bands { ground_level: 100, rock_level: 300, height: 2000 }
    }

    #[test]
    fn demon_altar_option_by_u_threshold() {
        assert_eq!(tile_option(tile_id::DEMON_ALTAR, 0, 0, 0), 0);
        assert_eq!(tile_option(tile_id::DEMON_ALTAR, 54, 0, 0), 1);
    }

    #[test]
    fn sunflower_option_by_u_threshold() {
        assert_eq!(tile_option(tile_id::SUNFLOWER, 10, 0, 0), 1);
        assert_eq!(tile_option(tile_id::SUNFLOWER, 40, 0, 0), 0);
    }

    #[test]
    fn pots_step_function_hits_every_band() {
        assert_eq!(tile_option(tile_id::POTS, 0, 0, 0), 0);
        assert_eq!(tile_option(tile_id::POTS, 0, 200, 0), 1);
        assert_eq!(tile_option(tile_id::POTS, 0, 1300, 0), 7);
    }

    #[test]
    fn option_rule_is_idempotent() {
        let a = tile_option(tile_id::EXPOSED_GEMS, 55, 0, 3);
        let b = tile_option(tile_id::EXPOSED_GEMS, 55, 0, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn mapper_loads_embedded_defaults() {
        let mapper = ColorMapper::from_embedded().unwrap();
        assert!(mapper.known_tiles.contains(&0));
        assert!(mapper.known_walls.contains(&4));
    }

    #[test]
    fn active_known_tile_takes_priority_over_background() {
        let mapper = ColorMapper::from_embedded().unwrap();
        let tile = active_tile(0, -1, -1);
        let lookup = mapper.tile_to_lookup(&tile, 0, 500, Toggles::default(), bands());
        assert_eq!(lookup.table, Table::Tile);
        assert_eq!(lookup.index, 0);
    }

    #[test]
    fn liquid_requires_amount_over_32() {
        let mapper = ColorMapper::from_embedded().unwrap();
        let mut tile = Tile::default();
        tile.liquid_type = LiquidType::Water;
        tile.liquid_amount = 10;
        let lookup = mapper.tile_to_lookup(&tile, 0, 500, Toggles::default(), bands());
        assert_ne!(lookup.table, Table::Liquid);
        tile.liquid_amount = 200;
        let lookup = mapper.tile_to_lookup(&tile, 0, 500, Toggles::default(), bands());
        assert_eq!(lookup.table, Table::Liquid);
        assert_eq!(lookup.index, 0);
    }

    #[test]
    fn planked_wall_alternates_by_column_parity() {
        let mapper = ColorMapper::from_embedded().unwrap();
        let mut tile = Tile::default();
        tile.wall = PLANKED_WALL;
        let even = mapper.tile_to_lookup(&tile, 4, 500, Toggles::default(), bands());
        let odd = mapper.tile_to_lookup(&tile, 5, 500, Toggles::default(), bands());
        assert_eq!(even.option, 0);
        assert_eq!(odd.option, 1);
    }

    #[test]
    fn background_falls_back_through_vertical_bands() {
        let mapper = ColorMapper::from_embedded().unwrap();
        let tile = Tile::default();
        let b = bands();
        assert_eq!(mapper.tile_to_lookup(&tile, 0, 50, Toggles::default(), b).table, Table::Sky);
        assert_eq!(mapper.tile_to_lookup(&tile, 0, 200, Toggles::default(), b).table, Table::Dirt);
        assert_eq!(mapper.tile_to_lookup(&tile, 0, 1000, Toggles::default(), b).table, Table::Rock);
        assert_eq!(mapper.tile_to_lookup(&tile, 0, 1999, Toggles::default(), b).index, 1);
    }

    #[test]
    fn toggles_suppress_their_layer() {
        let mapper = ColorMapper::from_embedded().unwrap();
        let tile = Tile::default();
        let toggles = Toggles { no_bg: true, ..Default::default() };
        let lookup = mapper.tile_to_lookup(&tile, 0, 50, toggles, bands());
        assert_eq!(lookup.table, Table::None);
    }

    #[test]
    fn missing_tile_type_falls_through_to_background() {
        let mapper = ColorMapper::from_embedded().unwrap();
        let tile = active_tile(60000, 0, 0);
        let lookup = mapper.tile_to_lookup(&tile, 0, 50, Toggles::default(), bands());
        assert_eq!(lookup.table, Table::Sky);
    }

    #[test]
    fn resolve_color_is_total_for_every_produced_lookup() {
        let mapper = ColorMapper::from_embedded().unwrap();
        for ty in [0u16, 21, 26, 27, 28] {
            for opt in 0..9u8 {
                if let Some((_, _)) = mapper.tile_colors.get(&(ty, opt)).map(|c| (c, ())) {
                    let lookup = Lookup { table: Table::Tile, index: u32::from(ty), option: opt };
                    assert!(mapper.resolve_color(lookup).is_some());
                }
            }
        }
    }
}
