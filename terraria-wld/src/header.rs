//! File header and section-pointer table: §3 `WorldHeader`, §6 byte layout.

use crate::error::{DecodeError, Result};
use crate::stream::ByteStream;

/// Low 56 bits of `meta_magic` on every Relogic-engine save file ("relogic"
/// read as a little-endian 7-byte ASCII string), §6.
pub const RELOGIC_MAGIC: u64 = 0x6369_676f_6c65_72;
const MAGIC_MASK: u64 = 0x00ff_ffff_ffff_ffff;

pub const FILETYPE_WORLD: u8 = 1;
pub const FILETYPE_MAP: u8 = 2;

/// Minimum `version` this decoder accepts (§1 Non-goals, §7).
pub const COMPATIBLE_VERSION: u32 = 102;
pub const VERSION_95: u32 = 95;
pub const VERSION_99: u32 = 99;
pub const VERSION_101: u32 = 101;
pub const VERSION_104: u32 = 104;
pub const VERSION_140: u32 = 140;
pub const VERSION_147: u32 = 147;

pub const SECTION_FLAGS: usize = 0;
pub const SECTION_TILES: usize = 1;
pub const SECTION_CHESTS: usize = 2;
pub const SECTION_SIGNS: usize = 3;
pub const SECTION_NPCS: usize = 4;
pub const SECTION_TILE_ENTITIES: usize = 5;
pub const SECTION_FOOTER_OLD: usize = 5;
pub const SECTION_FOOTER_140: usize = 6;

/// The common four-field prologue shared by `.wld` and `.map` files.
#[derive(Debug, Clone, Copy)]
pub struct FileMeta {
    pub version: u32,
    pub meta_magic: u64,
    pub revision: u32,
    pub world_bits: u64,
}

impl FileMeta {
    pub fn read(stream: &mut ByteStream) -> Result<Self> {
        Ok(FileMeta {
            version: stream.read_u32()?,
            meta_magic: stream.read_u64()?,
            revision: stream.read_u32()?,
            world_bits: stream.read_u64()?,
        })
    }

    /// Validates the magic signature and file-type tag, rejecting anything
    /// that isn't `expected_filetype`.
    pub fn assert_filetype(&self, expected_filetype: u8) -> Result<()> {
        // meta_magic is the second of the four prologue fields, right
        // after the 4-byte version (§6).
        const META_MAGIC_OFFSET: u64 = 4;
        if self.meta_magic & MAGIC_MASK != RELOGIC_MAGIC {
            return Err(DecodeError::invalid_at(
                "magic signature mismatch, not a Relogic save file",
                META_MAGIC_OFFSET,
            ));
        }
        let filetype = (self.meta_magic >> 56) as u8;
        if filetype != expected_filetype {
            return Err(DecodeError::invalid_at(
                "file-type tag does not match the expected format",
                META_MAGIC_OFFSET,
            ));
        }
        Ok(())
    }

    pub fn assert_compatible_version(&self) -> Result<()> {
        if self.version < COMPATIBLE_VERSION {
            return Err(DecodeError::UnsupportedVersion {
                found: self.version,
                minimum: COMPATIBLE_VERSION,
            });
        }
        Ok(())
    }
}

/// The `.wld` file header: common prologue, section pointer table, and the
/// important-tiles bitset.
#[derive(Debug, Clone)]
pub struct WorldHeader {
    pub meta: FileMeta,
    pub section_pointers: Vec<u32>,
    pub important_tiles: Vec<bool>,
    pub file_size: u64,
}

impl WorldHeader {
    pub fn read(stream: &mut ByteStream) -> Result<Self> {
        let meta = FileMeta::read(stream)?;
        meta.assert_filetype(FILETYPE_WORLD)?;
        meta.assert_compatible_version()?;

        let n_sections = stream.read_u16()? as usize;
        let mut section_pointers = Vec::with_capacity(n_sections);
        for _ in 0..n_sections {
            section_pointers.push(stream.read_u32()?);
        }
        let important_tiles = stream.read_prefixed_bit_array()?;
        Ok(WorldHeader { meta, section_pointers, important_tiles, file_size: stream.len() })
    }

    pub fn section_pointer(&self, section: usize) -> Option<u64> {
        self.section_pointers.get(section).map(|&p| p as u64)
    }

    pub fn tile_entities_pointer(&self) -> Option<u64> {
        if self.meta.version >= VERSION_140 {
            self.section_pointer(SECTION_TILE_ENTITIES)
        } else {
            None
        }
    }

    pub fn footer_pointer(&self) -> Option<u64> {
        if self.meta.version >= VERSION_140 {
            self.section_pointer(SECTION_FOOTER_140)
        } else {
            self.section_pointer(SECTION_FOOTER_OLD)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_minimal_header_bytes(version: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&version.to_le_bytes());
        let meta_magic = RELOGIC_MAGIC | ((FILETYPE_WORLD as u64) << 56);
        buf.extend_from_slice(&meta_magic.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes()); // revision
        buf.extend_from_slice(&0u64.to_le_bytes()); // world_bits
        buf.extend_from_slice(&1u16.to_le_bytes()); // n_sections
        buf.extend_from_slice(&0u32.to_le_bytes()); // section_pointers[0]
        buf.extend_from_slice(&0i16.to_le_bytes()); // important_tiles bit count
        buf
    }

    #[test]
    fn header_survives_assert_valid_with_good_magic() {
        let buf = build_minimal_header_bytes(COMPATIBLE_VERSION);
        let mut s = ByteStream::new(&buf);
        let header = WorldHeader::read(&mut s).unwrap();
        assert_eq!(header.meta.version, COMPATIBLE_VERSION);
        assert_eq!(header.section_pointers.len(), 1);
    }

    #[test]
    fn rejects_version_below_compatible() {
        let buf = build_minimal_header_bytes(COMPATIBLE_VERSION - 1);
        let mut s = ByteStream::new(&buf);
        assert!(matches!(WorldHeader::read(&mut s), Err(DecodeError::UnsupportedVersion { .. })));
    }

    #[test]
    fn rejects_bad_magic() {
        let mut buf = build_minimal_header_bytes(COMPATIBLE_VERSION);
        buf[4] ^= 0xff; // corrupt a magic byte
        let mut s = ByteStream::new(&buf);
        assert!(matches!(WorldHeader::read(&mut s), Err(DecodeError::InvalidFile { .. })));
    }
}
