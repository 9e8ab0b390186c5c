//! The tile grid cell and its run-length-encoded wire format.

use crate::error::Result;
use crate::stream::ByteStream;

const BIT_MORE_HDR: u8 = 0b0000_0001;
const BIT_ACTIVE: u8 = 0b0000_0010;
const BIT_HAS_WALL: u8 = 0b0000_0100;
const MASK_LIQUID: u8 = 0b0001_1000;
const SHIFT_LIQUID: u8 = 3;
const BIT_TYPE_16: u8 = 0b0010_0000;
const MASK_RLE: u8 = 0b1100_0000;
const SHIFT_RLE: u8 = 6;

const BIT_RED_WIRE: u8 = 0b0000_0010;
const BIT_GREEN_WIRE: u8 = 0b0000_0100;
const BIT_BLUE_WIRE: u8 = 0b0000_1000;
const MASK_BRICK_STYLE: u8 = 0b0111_0000;
const SHIFT_BRICK_STYLE: u8 = 4;

const BIT_ACTUATOR: u8 = 0b0000_0010;
const BIT_INACTIVE: u8 = 0b0000_0100;
const BIT_TILE_PAINT: u8 = 0b0000_1000;
const BIT_WALL_PAINT: u8 = 0b0001_0000;

/// Tile ID that always forces `v = 0` regardless of its stored frame
/// coordinate (the "timer" tile, id 144 in the public Terraria tile ID
/// listing).
const TIMER_TILE_ID: u16 = 144;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiquidType {
    None,
    Water,
    Lava,
    Honey,
}

impl LiquidType {
    fn from_bits(bits: u8) -> Self {
        match bits {
            0 => LiquidType::None,
            1 => LiquidType::Water,
            2 => LiquidType::Lava,
            _ => LiquidType::Honey,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrickStyle {
    Full,
    HalfBrick,
    SlopeTopLeftDown,
    SlopeBottomLeftDown,
    SlopeTopLeftUp,
    SlopeBottomLeftUp,
    Unknown06,
    Unknown07,
}

impl BrickStyle {
    fn from_bits(bits: u8) -> Self {
        match bits {
            0 => BrickStyle::Full,
            1 => BrickStyle::HalfBrick,
            2 => BrickStyle::SlopeTopLeftDown,
            3 => BrickStyle::SlopeBottomLeftDown,
            4 => BrickStyle::SlopeTopLeftUp,
            5 => BrickStyle::SlopeBottomLeftUp,
            6 => BrickStyle::Unknown06,
            _ => BrickStyle::Unknown07,
        }
    }
}

/// A single grid cell. Unused fields keep their default values (§3
/// invariants): `tile_type == 0`, `u == v == -1`, `wall == 0`, colors
/// `== 0`, liquid `None`/`0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub is_active: bool,
    pub tile_type: u16,
    pub wall: u8,
    pub u: i16,
    pub v: i16,
    pub tile_color: u8,
    pub wall_color: u8,
    pub wire_red: bool,
    pub wire_green: bool,
    pub wire_blue: bool,
    pub liquid_type: LiquidType,
    pub liquid_amount: u8,
    pub brick_style: BrickStyle,
    pub actuator: bool,
    pub inactive: bool,
}

impl Default for Tile {
    fn default() -> Self {
        Tile {
            is_active: false,
            tile_type: 0,
            wall: 0,
            u: -1,
            v: -1,
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
}

fn test_bit(value: u8, mask: u8) -> bool {
    value & mask == mask
}

/// Decodes one `(Tile, rle_count)` pair. `rle_count` is the number of
/// *additional* tiles sharing this column that are identical copies; the
/// caller is responsible for writing `rle_count + 1` cells (§4.2, §4.3).
pub fn read_tile(stream: &mut ByteStream, important_tiles: &[bool]) -> Result<(Tile, u16)> {
    let mut tile = Tile::default();

    let header1 = stream.read_u8()?;
    let header2 = if test_bit(header1, BIT_MORE_HDR) { stream.read_u8()? } else { 0 };
    let header3 = if test_bit(header2, BIT_MORE_HDR) { stream.read_u8()? } else { 0 };

    if test_bit(header1, BIT_ACTIVE) {
        tile.is_active = true;
        tile.tile_type =
            if test_bit(header1, BIT_TYPE_16) { stream.read_u16()? } else { u16::from(stream.read_u8()?) };
        if important_tiles.get(tile.tile_type as usize).copied().unwrap_or(false) {
            tile.u = stream.read_i16()?;
            tile.v = stream.read_i16()?;
            if tile.tile_type == TIMER_TILE_ID {
                tile.v = 0;
            }
        }
        if test_bit(header3, BIT_TILE_PAINT) {
            tile.tile_color = stream.read_u8()?;
        }
    }

    if test_bit(header1, BIT_HAS_WALL) {
        tile.wall = stream.read_u8()?;
        if test_bit(header3, BIT_WALL_PAINT) {
            tile.wall_color = stream.read_u8()?;
        }
    }

    tile.liquid_type = LiquidType::from_bits((header1 & MASK_LIQUID) >> SHIFT_LIQUID);
    if tile.liquid_type != LiquidType::None {
        tile.liquid_amount = stream.read_u8()?;
    }

    if header2 != 0 {
        tile.wire_red = test_bit(header2, BIT_RED_WIRE);
        tile.wire_green = test_bit(header2, BIT_GREEN_WIRE);
        tile.wire_blue = test_bit(header2, BIT_BLUE_WIRE);
        tile.brick_style = BrickStyle::from_bits((header2 & MASK_BRICK_STYLE) >> SHIFT_BRICK_STYLE);
    }
    if header3 != 0 {
        tile.actuator = test_bit(header3, BIT_ACTUATOR);
        tile.inactive = test_bit(header3, BIT_INACTIVE);
    }

    let rle_width = (header1 & MASK_RLE) >> SHIFT_RLE;
    let rle = match rle_width {
        0 => 0,
        1 => u16::from(stream.read_u8()?),
        _ => stream.read_i16()?.max(0) as u16,
    };

    Ok((tile, rle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tile_is_inactive() {
        let buf = [0b0000_0000];
        let mut s = ByteStream::new(&buf);
        let (tile, rle) = read_tile(&mut s, &[]).unwrap();
        assert!(!tile.is_active);
        assert_eq!(tile.wall, 0);
        assert_eq!(tile.liquid_type, LiquidType::None);
        assert_eq!(rle, 0);
    }

    #[test]
    fn active_tile_small_type_no_extras() {
        let buf = [0x02, 0x05];
        let mut s = ByteStream::new(&buf);
        let (tile, rle) = read_tile(&mut s, &[false; 16]).unwrap();
        assert!(tile.is_active);
        assert_eq!(tile.tile_type, 5);
        assert_eq!(rle, 0);
    }

    #[test]
    fn active_tile_with_wire_and_paint() {
        // header1 = 0b0000_0011 (more-hdr, active); header2 = 0b0000_0011
        // (more-hdr, red wire); header3 = 0b0000_1000 (tile paint)
        let buf = [0x03, 0x03, 0x08, 0x07, 0x2a];
        let mut s = ByteStream::new(&buf);
        let (tile, rle) = read_tile(&mut s, &[false; 16]).unwrap();
        assert!(tile.is_active);
        assert!(tile.wire_red);
        assert_eq!(tile.tile_type, 7);
        assert_eq!(tile.tile_color, 0x2a);
        assert_eq!(rle, 0);
    }

    #[test]
    fn rle_u8_width() {
        // bits 6-7 = 01 (u8 rle), trailing byte 0x04 -> caller emits 5 copies
        let buf = [0b0100_0000, 0x04];
        let mut s = ByteStream::new(&buf);
        let (_tile, rle) = read_tile(&mut s, &[]).unwrap();
        assert_eq!(rle, 4);
        assert_eq!(rle + 1, 5);
    }

    #[test]
    fn important_tile_reads_frame_coords() {
        let mut important = vec![false; 10];
        important[5] = true;
        // active, type u8 = 5, u=3 v=7 (both i16 LE)
        let buf = [0x02, 0x05, 0x03, 0x00, 0x07, 0x00];
        let mut s = ByteStream::new(&buf);
        let (tile, _) = read_tile(&mut s, &important).unwrap();
        assert_eq!(tile.u, 3);
        assert_eq!(tile.v, 7);
    }

    #[test]
    fn timer_tile_forces_v_zero() {
        let mut important = vec![false; 200];
        important[TIMER_TILE_ID as usize] = true;
        let mut buf = Vec::new();
        buf.push(0b0010_0010u8); // active + type16
        buf.extend_from_slice(&TIMER_TILE_ID.to_le_bytes());
        buf.extend_from_slice(&9i16.to_le_bytes()); // u
        buf.extend_from_slice(&77i16.to_le_bytes()); // v, should be overridden to 0
        let mut s = ByteStream::new(&buf);
        let (tile, _) = read_tile(&mut s, &important).unwrap();
        assert_eq!(tile.tile_type, TIMER_TILE_ID);
        assert_eq!(tile.u, 9);
        assert_eq!(tile.v, 0);
    }
}
