//! Read-only decoder for Terraria's `.wld` world format and its
//! companion `.map` minimap format, plus the tile-to-color table used to
//! rasterize a decoded world.
//!
//! The crate is organized the way the format itself is layered:
//!
//! - [`stream`] — the positional byte reader every other module reads
//!   through (§4.1).
//! - [`tile`] — one grid cell and its run-length-encoded wire format
//!   (§4.2).
//! - [`header`] / [`flags`] — the `.wld` file prologue, section-pointer
//!   table, and the ~110-field flags schema (§4.3 steps 1-2).
//! - [`decoder`] — drives the full `.wld` layout into a [`model::WorldModel`]
//!   (§4.3).
//! - [`minimap`] — the separate `.map` layout (§4.4).
//! - [`color`] — tile/wall/liquid/background color lookup (§4.5).
//! - [`diagnostics`] / [`error`] — the warning sink and fatal error type
//!   shared by every decoder in this crate (§7).
//!
//! Decoding is synchronous and single-threaded: a decoder owns its
//! [`stream::ByteStream`], reads it start to finish, and either returns a
//! complete model or a fatal [`error::DecodeError`] (§5).

pub mod color;
pub mod decoder;
pub mod diagnostics;
pub mod error;
pub mod flags;
pub mod header;
pub mod minimap;
pub mod model;
pub mod stream;
pub mod tile;

pub use color::{Bands, ColorMapper, Lookup, Table, Toggles};
pub use decoder::{decode_world, WorldDecoder};
pub use diagnostics::{Warning, Warnings};
pub use error::{DecodeError, Result};
pub use minimap::{MapCell, MapDecoder, MinimapModel};
pub use model::{
    Chest, Item, MobEntity, NpcEntity, Sign, TileEntity, TileEntityKind, TileGrid, WorldModel,
};
pub use tile::{BrickStyle, LiquidType, Tile};
