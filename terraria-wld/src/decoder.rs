//! Top-level world decode: §4.3 `WorldDecoder`.

use crate::diagnostics::{Warning, Warnings};
use crate::error::{DecodeError, Result};
use crate::flags::WorldFlags;
use crate::header::{
    WorldHeader, SECTION_CHESTS, SECTION_FLAGS, SECTION_NPCS, SECTION_SIGNS, SECTION_TILES,
    VERSION_140,
};
use crate::model::{
    Chest, Item, MobEntity, NpcEntity, Sign, TileEntity, TileEntityKind, TileGridBuilder, WorldModel,
};
use crate::stream::ByteStream;
use crate::tile::read_tile;

const MAX_CHEST_ITEMS: usize = 40;

/// Drives the full decode of one `.wld` buffer into a [`WorldModel`].
///
/// `shared_tiles` controls the arena sharing mode described in §4.3's
/// read-only/copy-on-write note; it defaults to shared, matching the
/// source's default.
pub struct WorldDecoder {
    shared_tiles: bool,
}

impl Default for WorldDecoder {
    fn default() -> Self {
        WorldDecoder { shared_tiles: true }
    }
}

impl WorldDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shared_tiles(mut self, shared: bool) -> Self {
        self.shared_tiles = shared;
        self
    }

    pub fn decode(&self, buf: &[u8]) -> Result<WorldModel> {
        let mut stream = ByteStream::new(buf);
        let header = WorldHeader::read(&mut stream)?;
        let mut warnings = Warnings::new();

        let flags_ptr = section_pointer(&header, SECTION_FLAGS, "flags")?;
        let tiles_ptr = section_pointer(&header, SECTION_TILES, "tiles")?;
        stream.seek_set(flags_ptr);
        let flags = WorldFlags::read(&mut stream, header.meta.version, tiles_ptr)?;

        check_boundary(&mut warnings, "tiles", tiles_ptr, stream.tell());
        stream.seek_set(tiles_ptr);
        let tiles = {
            let mut builder =
                TileGridBuilder::new(flags.tiles_wide, flags.tiles_high, self.shared_tiles);
            while builder.cells_written() < builder.total_cells() {
                let (tile, rle) = read_tile(&mut stream, &header.important_tiles)?;
                builder.push_run(tile, u32::from(rle) + 1)?;
            }
            builder.finish()
        };

        let chests_ptr = section_pointer(&header, SECTION_CHESTS, "chests")?;
        check_boundary(&mut warnings, "chests", chests_ptr, stream.tell());
        stream.seek_set(chests_ptr);
        let chests = read_chests(&mut stream)?;

        let signs_ptr = section_pointer(&header, SECTION_SIGNS, "signs")?;
        check_boundary(&mut warnings, "signs", signs_ptr, stream.tell());
        stream.seek_set(signs_ptr);
        let signs = read_signs(&mut stream)?;

        let npcs_ptr = section_pointer(&header, SECTION_NPCS, "npcs")?;
        check_boundary(&mut warnings, "npcs", npcs_ptr, stream.tell());
        stream.seek_set(npcs_ptr);
        let (npcs, mobs) = read_npcs_and_mobs(&mut stream, header.meta.version)?;

        let tile_entities = if let Some(te_ptr) = header.tile_entities_pointer() {
            check_boundary(&mut warnings, "tile_entities", te_ptr, stream.tell());
            stream.seek_set(te_ptr);
            read_tile_entities(&mut stream, &mut warnings)?
        } else {
            Vec::new()
        };

        let footer_ptr = header
            .footer_pointer()
            .ok_or_else(|| DecodeError::invalid("world file declares no footer section"))?;
        check_boundary(&mut warnings, "footer", footer_ptr, stream.tell());
        stream.seek_set(footer_ptr);
        let footer_loaded = stream.read_bool()?;
        let footer_title = stream.read_string()?;
        let footer_world_id = stream.read_i32()?;
        if footer_title != flags.title {
            warnings.push(Warning::FooterMismatch { field: "title" });
        }
        if footer_world_id != flags.world_id as i32 {
            warnings.push(Warning::FooterMismatch { field: "world_id" });
        }

        Ok(WorldModel {
            flags,
            tiles,
            chests,
            signs,
            npcs,
            mobs,
            tile_entities,
            footer_loaded,
            footer_title,
            footer_world_id,
            warnings,
        })
    }
}

fn section_pointer(header: &WorldHeader, section: usize, name: &'static str) -> Result<u64> {
    header
        .section_pointer(section)
        .ok_or_else(|| DecodeError::MissingAsset { name, detail: "section pointer absent from header".into() })
}

fn check_boundary(warnings: &mut Warnings, section: &'static str, expected: u64, actual: u64) {
    if expected != actual {
        warnings.push(Warning::SectionDrift { section, expected, actual });
    }
}

fn read_item(stream: &mut ByteStream) -> Result<Item> {
    let stack = stream.read_i16()?;
    if stack == 0 {
        return Ok(Item::default());
    }
    let item_id = stream.read_i32()?;
    let prefix = stream.read_u8()?;
    Ok(Item { item_id, prefix, stack })
}

fn read_chests(stream: &mut ByteStream) -> Result<Vec<Chest>> {
    let total = stream.read_u16()?;
    let max_items = stream.read_u16()? as usize;
    let items_per_chest = max_items.min(MAX_CHEST_ITEMS);
    let overflow_count = max_items.saturating_sub(MAX_CHEST_ITEMS);

    let mut chests = Vec::with_capacity(total as usize);
    for _ in 0..total {
        let x = stream.read_i32()?;
        let y = stream.read_i32()?;
        let name = stream.read_string()?;
        let mut items = Vec::with_capacity(items_per_chest);
        for _ in 0..items_per_chest {
            items.push(read_item(stream)?);
        }
        let mut overflow = Vec::with_capacity(overflow_count);
        for _ in 0..overflow_count {
            overflow.push(read_item(stream)?);
        }
        chests.push(Chest { x, y, name, items, overflow });
    }
    Ok(chests)
}

fn read_signs(stream: &mut ByteStream) -> Result<Vec<Sign>> {
    let total = stream.read_i16()?.max(0);
    let mut signs = Vec::with_capacity(total as usize);
    for _ in 0..total {
        let text = stream.read_string()?;
        let x = stream.read_i32()?;
        let y = stream.read_i32()?;
        signs.push(Sign { x, y, text });
    }
    Ok(signs)
}

fn read_npcs_and_mobs(stream: &mut ByteStream, version: u32) -> Result<(Vec<NpcEntity>, Vec<MobEntity>)> {
    let mut npcs = Vec::new();
    while stream.read_bool()? {
        let name = stream.read_string()?;
        let display_name = stream.read_string()?;
        let x = stream.read_f32()?;
        let y = stream.read_f32()?;
        let homeless = stream.read_bool()?;
        let home_x = stream.read_i32()?;
        let home_y = stream.read_i32()?;
        npcs.push(NpcEntity { name, display_name, x, y, homeless, home_x, home_y });
    }

    let mut mobs = Vec::new();
    if version >= VERSION_140 {
        while stream.read_bool()? {
            let name = stream.read_string()?;
            let x = stream.read_f32()?;
            let y = stream.read_f32()?;
            mobs.push(MobEntity { name, x, y });
        }
    }
    Ok((npcs, mobs))
}

fn read_tile_entities(stream: &mut ByteStream, warnings: &mut Warnings) -> Result<Vec<TileEntity>> {
    let count = stream.read_i32()?.max(0);
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let kind_tag = stream.read_u8()?;
        let id = stream.read_i32()?;
        let pos_x = stream.read_i16()?;
        let pos_y = stream.read_i16()?;
        let kind = match kind_tag {
            0 => TileEntityKind::Dummy { npc: stream.read_i16()? },
            1 => {
                let item = stream.read_i16()?;
                let prefix = stream.read_u8()?;
                let stack = stream.read_i16()?;
                TileEntityKind::ItemFrame { item, prefix, stack }
            }
            other => {
                // The record's remaining length depends entirely on its
                // type tag, which we don't recognize; there's no safe way
                // to keep reading past this point.
                warnings.push(Warning::UnknownTileEntityType(other));
                break;
            }
        };
        out.push(TileEntity { id, pos_x, pos_y, kind });
    }
    Ok(out)
}

/// Decodes a complete `.wld` buffer with default (shared-tile) settings.
pub fn decode_world(buf: &[u8]) -> Result<WorldModel> {
    WorldDecoder::new().decode(buf)
}
