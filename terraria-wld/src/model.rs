//! In-memory world containers: §3 `WorldModel` and its entity types.

use crate::diagnostics::Warnings;
use crate::flags::WorldFlags;
use crate::tile::Tile;

/// The tile grid, indexed `(x, y)` with `(0, 0)` at the top-left and `y`
/// increasing downward.
///
/// Tiles are stored in an arena; the grid itself holds one arena index per
/// cell. When built in shared mode (the default, matching the source's
/// `read_only` flag) every cell produced by the same RLE run points at the
/// *same* arena entry, so mutating one observably mutates its siblings. An
/// owning grid gives each cell a distinct arena entry up front, so later
/// mutation never aliases.
#[derive(Debug, Clone)]
pub struct TileGrid {
    width: u32,
    height: u32,
    arena: Vec<Tile>,
    indices: Vec<u32>,
}

impl TileGrid {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn cell_index(&self, x: u32, y: u32) -> usize {
        x as usize * self.height as usize + y as usize
    }

    pub fn get(&self, x: u32, y: u32) -> &Tile {
        &self.arena[self.indices[self.cell_index(x, y)] as usize]
    }

    pub fn get_mut(&mut self, x: u32, y: u32) -> &mut Tile {
        let arena_idx = self.indices[self.cell_index(x, y)] as usize;
        &mut self.arena[arena_idx]
    }

    /// Arena size; in shared mode this is far smaller than `width * height`
    /// whenever long RLE runs are common.
    pub fn arena_len(&self) -> usize {
        self.arena.len()
    }
}

/// Assembles a [`TileGrid`] one RLE run at a time, in the decoder's native
/// column-major order (x outer, y inner; §4.3).
pub struct TileGridBuilder {
    width: u32,
    height: u32,
    arena: Vec<Tile>,
    indices: Vec<u32>,
    shared: bool,
    next: usize,
}

impl TileGridBuilder {
    pub fn new(width: u32, height: u32, shared: bool) -> Self {
        TileGridBuilder {
            width,
            height,
            arena: Vec::new(),
            indices: vec![0; width as usize * height as usize],
            shared,
            next: 0,
        }
    }

    /// Appends `count` copies of `tile` as the next `count` cells in
    /// column-major order. Errs if `count` would overrun `width * height`.
    pub fn push_run(&mut self, tile: Tile, count: u32) -> crate::error::Result<()> {
        if self.next + count as usize > self.indices.len() {
            return Err(crate::error::DecodeError::out_of_range(
                "RLE run overruns the declared tile grid dimensions",
                self.next as u64,
            ));
        }
        if self.shared {
            let arena_idx = self.arena.len() as u32;
            self.arena.push(tile);
            for _ in 0..count {
                self.indices[self.next] = arena_idx;
                self.next += 1;
            }
        } else {
            for _ in 0..count {
                self.indices[self.next] = self.arena.len() as u32;
                self.arena.push(tile);
                self.next += 1;
            }
        }
        Ok(())
    }

    pub fn cells_written(&self) -> usize {
        self.next
    }

    pub fn total_cells(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn finish(self) -> TileGrid {
        TileGrid { width: self.width, height: self.height, arena: self.arena, indices: self.indices }
    }
}

/// A chest inventory slot. `stack == 0` means the slot is empty, in which
/// case `item_id` and `prefix` are meaningless (§3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Item {
    pub item_id: i32,
    pub prefix: u8,
    pub stack: i16,
}

#[derive(Debug, Clone)]
pub struct Chest {
    pub x: i32,
    pub y: i32,
    pub name: String,
    /// `min(max_items, 40)` slots, read in file order.
    pub items: Vec<Item>,
    /// Slots beyond the 40 the client renders, if the file declares more.
    pub overflow: Vec<Item>,
}

#[derive(Debug, Clone)]
pub struct Sign {
    pub x: i32,
    pub y: i32,
    pub text: String,
}

/// A placed, named NPC. `display_name` is empty when the player hasn't
/// renamed this NPC.
#[derive(Debug, Clone)]
pub struct NpcEntity {
    pub name: String,
    pub display_name: String,
    pub x: f32,
    pub y: f32,
    pub homeless: bool,
    pub home_x: i32,
    pub home_y: i32,
}

/// A placed town-mob record, added for `version >= 140` worlds. Unlike
/// [`NpcEntity`] it carries only a name and a position (§4.3 step 6).
#[derive(Debug, Clone)]
pub struct MobEntity {
    pub name: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileEntityKind {
    Dummy { npc: i16 },
    ItemFrame { item: i16, prefix: u8, stack: i16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileEntity {
    pub id: i32,
    pub pos_x: i16,
    pub pos_y: i16,
    pub kind: TileEntityKind,
}

/// The fully decoded world: everything a [`crate::decoder::WorldDecoder`]
/// produces from one `.wld` buffer (§3, §4.3).
#[derive(Debug, Clone)]
pub struct WorldModel {
    pub flags: WorldFlags,
    pub tiles: TileGrid,
    pub chests: Vec<Chest>,
    pub signs: Vec<Sign>,
    pub npcs: Vec<NpcEntity>,
    pub mobs: Vec<MobEntity>,
    pub tile_entities: Vec<TileEntity>,
    pub footer_loaded: bool,
    pub footer_title: String,
    pub footer_world_id: i32,
    pub warnings: Warnings,
}
