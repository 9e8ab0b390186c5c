//! Minimap (`.map`) file layout: §4.4 `MapDecoder`.
//!
//! Shares the four-field file prologue and the primitive reader with the
//! world decoder (§4.3); everything past the prologue is a different,
//! much smaller layout ending in a compressed per-cell grid.

use std::io::Read;

use flate2::read::DeflateDecoder;

use crate::error::{DecodeError, Result};
use crate::header::{FileMeta, FILETYPE_MAP};
use crate::stream::ByteStream;

/// Historical option-table sizes the format has shipped with (§4.4 step
/// 2); not enforced, just the values a well-formed file is expected to
/// carry.
pub const EXPECTED_TILE_OPTS: i16 = 419;
pub const EXPECTED_WALL_OPTS: i16 = 225;
pub const EXPECTED_LIQUID_OPTS: i16 = 3;
pub const EXPECTED_BAND_OPTS: i16 = 256;

/// One decoded map cell: a section tag, the type index within that
/// section (inherited from the previous cell when the header omits it),
/// a light level, and the variant/RLE fields (§4.4 step 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapCell {
    pub section: u8,
    pub type_index: u16,
    pub light: u8,
    pub variant: u8,
    pub rle: u16,
}

/// A cell's section tag (§4.4 step 5).
pub mod section {
    pub const EMPTY: u8 = 0;
    pub const TILE: u8 = 1;
    pub const WALL: u8 = 2;
    pub const WATER: u8 = 3;
    pub const LAVA: u8 = 4;
    pub const HONEY: u8 = 5;
    pub const HEAVEN_OR_HELL: u8 = 6;
    pub const BACKGROUND: u8 = 7;
}

fn section_carries_explicit_type(section: u8) -> bool {
    matches!(section, section::TILE | section::WALL | section::BACKGROUND)
}

/// The decoded minimap: header metadata plus the flattened cell stream,
/// in the same row-major order the compressed body stores them.
#[derive(Debug, Clone)]
pub struct MinimapModel {
    pub meta: FileMeta,
    pub world_name: String,
    pub world_id: i32,
    pub tiles_x: i32,
    pub tiles_y: i32,
    pub num_tile_opts: i16,
    pub num_wall_opts: i16,
    pub num_liquid_opts: i16,
    pub num_sky_opts: i16,
    pub num_dirt_opts: i16,
    pub num_rock_opts: i16,
    /// Which tile/wall option indices are customized (§4.4 step 3), and
    /// how many options each customized entry declares (step 4).
    pub customized_tile_opts: Vec<(i16, u8)>,
    pub customized_wall_opts: Vec<(i16, u8)>,
    pub cells: Vec<MapCell>,
}

/// Reads the cell header's section tag.
///
/// §9's Open Question: the source reads this as `(header1 & 14) >> 3` in
/// one place and `>> 1` in another. `0b0000_1110 >> 1` right-aligns bits
/// 1-3 into `0..=7`; `>> 3` instead discards bit 3 and mixes in bit 4
/// (the type-width flag), which cannot be the intended reading since it
/// would make the section tag depend on an unrelated flag. We take `>> 1`
/// as correct and treat `>> 3` as the bug.
fn cell_section(header1: u8) -> u8 {
    (header1 & 0b0000_1110) >> 1
}

pub struct MapDecoder;

impl MapDecoder {
    pub fn decode(buf: &[u8]) -> Result<MinimapModel> {
        let mut stream = ByteStream::new(buf);
        let meta = FileMeta::read(&mut stream)?;
        meta.assert_filetype(FILETYPE_MAP)?;
        meta.assert_compatible_version()?;

        let world_name = stream.read_string()?;
        let world_id = stream.read_i32()?;
        let tiles_y = stream.read_i32()?;
        let tiles_x = stream.read_i32()?;
        let num_tile_opts = stream.read_i16()?;
        let num_wall_opts = stream.read_i16()?;
        let num_liquid_opts = stream.read_i16()?;
        let num_sky_opts = stream.read_i16()?;
        let num_dirt_opts = stream.read_i16()?;
        let num_rock_opts = stream.read_i16()?;

        let tile_bits = read_nonnegative_bit_array(&mut stream, num_tile_opts)?;
        let wall_bits = read_nonnegative_bit_array(&mut stream, num_wall_opts)?;

        let mut customized_tile_opts = Vec::new();
        for (i, set) in tile_bits.iter().enumerate() {
            if *set {
                customized_tile_opts.push((i as i16, stream.read_u8()?));
            }
        }
        let mut customized_wall_opts = Vec::new();
        for (i, set) in wall_bits.iter().enumerate() {
            if *set {
                customized_wall_opts.push((i as i16, stream.read_u8()?));
            }
        }

        let body_start = stream.tell() as usize;
        let compressed = &buf[body_start..];
        let mut decompressed = Vec::new();
        DeflateDecoder::new(compressed)
            .read_to_end(&mut decompressed)
            .map_err(|e| DecodeError::MissingAsset { name: "minimap body", detail: e.to_string() })?;

        let total_cells = (tiles_x as i64 * tiles_y as i64).max(0) as usize;
        let cells = decode_cells(&decompressed, total_cells)?;

        Ok(MinimapModel {
            meta,
            world_name,
            world_id,
            tiles_x,
            tiles_y,
            num_tile_opts,
            num_wall_opts,
            num_liquid_opts,
            num_sky_opts,
            num_dirt_opts,
            num_rock_opts,
            customized_tile_opts,
            customized_wall_opts,
            cells,
        })
    }
}

fn read_nonnegative_bit_array(stream: &mut ByteStream, n_bits: i16) -> Result<Vec<bool>> {
    if n_bits < 0 {
        return Err(DecodeError::out_of_range("option-table bit count was negative", stream.tell()));
    }
    stream.read_bit_array(n_bits as usize)
}

fn decode_cells(body: &[u8], total_cells: usize) -> Result<Vec<MapCell>> {
    let mut stream = ByteStream::new(body);
    let mut cells = Vec::with_capacity(total_cells.min(1 << 20));
    let mut last_index: u16 = 0;

    while cells.len() < total_cells {
        let header1 = stream.read_u8()?;
        let header2 = if header1 & 0b0000_0001 != 0 { stream.read_u8()? } else { 0 };

        let section = cell_section(header1);
        let wide_index = header1 & 0b0001_0000 != 0;
        let has_light = header1 & 0b0010_0000 != 0;
        let rle_width = (header1 & 0b1100_0000) >> 6;

        let type_index = if section_carries_explicit_type(section) {
            let idx = if wide_index { stream.read_u16()? } else { u16::from(stream.read_u8()?) };
            last_index = idx;
            idx
        } else {
            last_index
        };

        let light = if has_light { stream.read_u8()? } else { 255 };
        let variant = (header2 >> 1) & 0x1f;
        let rle = match rle_width {
            0 => 0,
            1 => u16::from(stream.read_u8()?),
            _ => stream.read_i16()?.max(0) as u16,
        };

        cells.push(MapCell { section, type_index, light, variant, rle });
        for _ in 0..rle {
            if cells.len() >= total_cells {
                break;
            }
            cells.push(MapCell { section, type_index, light, variant, rle: 0 });
        }
    }
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::RELOGIC_MAGIC;
    use flate2::write::DeflateEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn deflate(bytes: &[u8]) -> Vec<u8> {
        let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
        enc.write_all(bytes).unwrap();
        enc.finish().unwrap()
    }

    fn build_minimal_map(cell_body: &[u8], tiles_x: i32, tiles_y: i32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&crate::header::COMPATIBLE_VERSION.to_le_bytes());
        let meta_magic = RELOGIC_MAGIC | ((FILETYPE_MAP as u64) << 56);
        buf.extend_from_slice(&meta_magic.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&0u64.to_le_bytes());

        buf.push(4);
        buf.extend_from_slice(b"test");
        buf.extend_from_slice(&1i32.to_le_bytes()); // world_id
        buf.extend_from_slice(&tiles_y.to_le_bytes());
        buf.extend_from_slice(&tiles_x.to_le_bytes());
        buf.extend_from_slice(&0i16.to_le_bytes()); // num_tile_opts
        buf.extend_from_slice(&0i16.to_le_bytes()); // num_wall_opts
        buf.extend_from_slice(&3i16.to_le_bytes()); // num_liquid_opts
        buf.extend_from_slice(&256i16.to_le_bytes()); // num_sky_opts
        buf.extend_from_slice(&256i16.to_le_bytes()); // num_dirt_opts
        buf.extend_from_slice(&256i16.to_le_bytes()); // num_rock_opts
        // tile_bits (0 bits) and wall_bits (0 bits) take 0 bytes each.

        buf.extend_from_slice(&deflate(cell_body));
        buf
    }

    #[test]
    fn cell_section_uses_the_shift_by_one_reading() {
        // section = WALL (2): bits 1-3 store `section << 1` = 0b100
        assert_eq!(cell_section(0b0000_0100), section::WALL);
    }

    #[test]
    fn decodes_a_tiny_cell_grid() {
        // Two cells: an explicit-type tile (section 1, u8 index 7, no
        // light byte, no rle), then an empty cell (section 0, inherited
        // index, implicit light).
        let cell_body = [0b0000_0010u8, 7, 0b0000_0000u8];
        let buf = build_minimal_map(&cell_body, 2, 1);
        let map = MapDecoder::decode(&buf).unwrap();
        assert_eq!(map.world_name, "test");
        assert_eq!(map.cells.len(), 2);
        assert_eq!(map.cells[0].section, section::TILE);
        assert_eq!(map.cells[0].type_index, 7);
        assert_eq!(map.cells[0].light, 255);
        assert_eq!(map.cells[1].section, section::EMPTY);
    }

    #[test]
    fn rle_expands_into_repeated_cells() {
        // header1: section=TILE(1), u8 rle width (bits6-7=01): 0b0100_0010
        let cell_body = [0b0100_0010u8, 9, 4u8];
        let buf = build_minimal_map(&cell_body, 5, 1);
        let map = MapDecoder::decode(&buf).unwrap();
        assert_eq!(map.cells.len(), 5);
        assert!(map.cells.iter().all(|c| c.type_index == 9));
    }

    #[test]
    fn rejects_wrong_filetype_tag() {
        let mut buf = build_minimal_map(&[0u8], 1, 1);
        // flip the filetype byte (top byte of meta_magic) from MAP to WORLD
        buf[11] = crate::header::FILETYPE_WORLD;
        assert!(matches!(MapDecoder::decode(&buf), Err(DecodeError::InvalidFile { .. })));
    }
}
