//! The world flags block: §3 `WorldFlags`, an ordered schema of scalar
//! fields gated by `version`, read sequentially starting right after the
//! world title (§4.3 step 2).
//!
//! Three entries in the schema aren't fixed-width scalars: `Anglers` and
//! `KilledMobs` are count-prefixed lists whose count is itself an earlier
//! field in the same schema, and `UnknownFlags` is whatever bytes remain
//! between the end of the schema and the tiles section pointer. All three
//! are read in place below rather than factored out, so the byte order
//! matches the schema exactly.

use crate::error::Result;
use crate::header::{
    COMPATIBLE_VERSION, VERSION_101, VERSION_104, VERSION_140, VERSION_147, VERSION_95, VERSION_99,
};
use crate::stream::ByteStream;

#[derive(Debug, Clone, Default)]
pub struct WorldFlags {
    pub title: String,

    pub world_id: u32,
    pub left_world: u32,
    pub right_world: u32,
    pub top_world: u32,
    pub bottom_world: u32,
    pub tiles_high: u32,
    pub tiles_wide: u32,
    pub expert_mode: bool,
    pub creation_time: u64,
    pub moon_type: i8,
    pub tree_x0: u32,
    pub tree_x1: u32,
    pub tree_x2: u32,
    pub tree_style0: u32,
    pub tree_style1: u32,
    pub tree_style2: u32,
    pub tree_style3: u32,
    pub cave_back_x0: u32,
    pub cave_back_x1: u32,
    pub cave_back_x2: u32,
    pub cave_back_style0: u32,
    pub cave_back_style1: u32,
    pub cave_back_style2: u32,
    pub cave_back_style3: u32,
    pub ice_back_style: u32,
    pub jungle_back_style: u32,
    pub hell_back_style: u32,
    pub spawn_x: u32,
    pub spawn_y: u32,
    pub ground_level: f64,
    pub rock_level: f64,
    pub time: f64,
    pub day_time: bool,
    pub moon_phase: u32,
    pub blood_moon: bool,
    pub is_eclipse: bool,
    pub dungeon_x: u32,
    pub dungeon_y: u32,
    pub is_crimson: bool,
    pub downed_boss1: bool,
    pub downed_boss2: bool,
    pub downed_boss3: bool,
    pub downed_queen_bee: bool,
    pub downed_mech_boss1: bool,
    pub downed_mech_boss2: bool,
    pub downed_mech_boss3: bool,
    pub downed_mech_boss_any: bool,
    pub downed_plant_boss: bool,
    pub downed_golem_boss: bool,
    pub downed_slime_king_boss: bool,
    pub saved_goblin: bool,
    pub saved_wizard: bool,
    pub saved_mech: bool,
    pub downed_goblins: bool,
    pub downed_clown: bool,
    pub downed_frost: bool,
    pub downed_pirates: bool,
    pub shadow_orb_smashed: bool,
    pub spawn_meteor: bool,
    pub shadow_orb_count: i8,
    pub altar_count: u32,
    pub hard_mode: bool,
    pub invasion_delay: u32,
    pub invasion_size: u32,
    pub invasion_type: u32,
    pub invasion_x: f64,
    pub slime_rain_time: f64,
    pub sundial_cooldown: i8,
    pub temp_raining: bool,
    pub temp_rain_time: u32,
    pub temp_max_rain: f32,
    pub ore_tier1: u32,
    pub ore_tier2: u32,
    pub ore_tier3: u32,
    pub bg_tree: i8,
    pub bg_corruption: i8,
    pub bg_jungle: i8,
    pub bg_snow: i8,
    pub bg_hallow: i8,
    pub bg_crimson: i8,
    pub bg_desert: i8,
    pub bg_ocean: i8,
    pub cloud_bg_active: u32,
    pub num_clouds: u16,
    pub wind_speed_set: f32,

    pub num_anglers: u32,
    pub anglers: Vec<String>,
    pub saved_angler: bool,
    pub angler_quest: u32,
    pub saved_stylist: bool,
    pub saved_tax_collector: bool,
    pub invasion_size_start: u32,
    pub cultist_delay: u32,
    pub killed_mob_count: u16,
    pub killed_mobs: Vec<u32>,
    pub fast_forward_time: bool,
    pub downed_fishron: bool,
    pub downed_martians: bool,
    pub downed_lunatic_cultist: bool,
    pub downed_moonlord: bool,
    pub downed_halloween_king: bool,
    pub downed_halloween_tree: bool,
    pub downed_christmas_queen: bool,
    pub downed_santa: bool,
    pub downed_christmas_tree: bool,
    pub downed_celestial_colar: bool,
    pub downed_celestial_vortex: bool,
    pub downed_celestial_nebula: bool,
    pub downed_celestial_stardust: bool,
    pub celestial_solar_active: bool,
    pub celestial_vortex_active: bool,
    pub celestial_nebula_active: bool,
    pub celestial_stardust_active: bool,
    pub apocalypse: bool,

    /// Bytes left unread between the end of the known schema and the
    /// tiles section pointer — newer-client fields this decoder doesn't
    /// know the layout of yet.
    pub unknown_flags: Vec<u8>,
}

impl WorldFlags {
    /// Reads the title string and the full flags schema, then consumes
    /// whatever bytes remain up to `tiles_pointer` as `unknown_flags`.
    pub fn read(stream: &mut ByteStream, version: u32, tiles_pointer: u64) -> Result<Self> {
        let mut flags = WorldFlags { title: stream.read_string()?, ..Default::default() };

        if version >= COMPATIBLE_VERSION {
            flags.world_id = stream.read_u32()?;
            flags.left_world = stream.read_u32()?;
            flags.right_world = stream.read_u32()?;
            flags.top_world = stream.read_u32()?;
            flags.bottom_world = stream.read_u32()?;
            flags.tiles_high = stream.read_u32()?;
            flags.tiles_wide = stream.read_u32()?;
        }
        if version >= VERSION_147 {
            flags.expert_mode = stream.read_bool()?;
            flags.creation_time = stream.read_u64()?;
        }
        if version >= COMPATIBLE_VERSION {
            flags.moon_type = stream.read_i8()?;
            flags.tree_x0 = stream.read_u32()?;
            flags.tree_x1 = stream.read_u32()?;
            flags.tree_x2 = stream.read_u32()?;
            flags.tree_style0 = stream.read_u32()?;
            flags.tree_style1 = stream.read_u32()?;
            flags.tree_style2 = stream.read_u32()?;
            flags.tree_style3 = stream.read_u32()?;
            flags.cave_back_x0 = stream.read_u32()?;
            flags.cave_back_x1 = stream.read_u32()?;
            flags.cave_back_x2 = stream.read_u32()?;
            flags.cave_back_style0 = stream.read_u32()?;
            flags.cave_back_style1 = stream.read_u32()?;
            flags.cave_back_style2 = stream.read_u32()?;
            flags.cave_back_style3 = stream.read_u32()?;
            flags.ice_back_style = stream.read_u32()?;
            flags.jungle_back_style = stream.read_u32()?;
            flags.hell_back_style = stream.read_u32()?;
            flags.spawn_x = stream.read_u32()?;
            flags.spawn_y = stream.read_u32()?;
            flags.ground_level = stream.read_f64()?;
            flags.rock_level = stream.read_f64()?;
            flags.time = stream.read_f64()?;
            flags.day_time = stream.read_bool()?;
            flags.moon_phase = stream.read_u32()?;
            flags.blood_moon = stream.read_bool()?;
            flags.is_eclipse = stream.read_bool()?;
            flags.dungeon_x = stream.read_u32()?;
            flags.dungeon_y = stream.read_u32()?;
            flags.is_crimson = stream.read_bool()?;
            flags.downed_boss1 = stream.read_bool()?;
            flags.downed_boss2 = stream.read_bool()?;
            flags.downed_boss3 = stream.read_bool()?;
            flags.downed_queen_bee = stream.read_bool()?;
            flags.downed_mech_boss1 = stream.read_bool()?;
            flags.downed_mech_boss2 = stream.read_bool()?;
            flags.downed_mech_boss3 = stream.read_bool()?;
            flags.downed_mech_boss_any = stream.read_bool()?;
            flags.downed_plant_boss = stream.read_bool()?;
            flags.downed_golem_boss = stream.read_bool()?;
        }
        if version >= VERSION_147 {
            flags.downed_slime_king_boss = stream.read_bool()?;
        }
        if version >= COMPATIBLE_VERSION {
            flags.saved_goblin = stream.read_bool()?;
            flags.saved_wizard = stream.read_bool()?;
            flags.saved_mech = stream.read_bool()?;
            flags.downed_goblins = stream.read_bool()?;
            flags.downed_clown = stream.read_bool()?;
            flags.downed_frost = stream.read_bool()?;
            flags.downed_pirates = stream.read_bool()?;
            flags.shadow_orb_smashed = stream.read_bool()?;
            flags.spawn_meteor = stream.read_bool()?;
            flags.shadow_orb_count = stream.read_i8()?;
            flags.altar_count = stream.read_u32()?;
            flags.hard_mode = stream.read_bool()?;
            flags.invasion_delay = stream.read_u32()?;
            flags.invasion_size = stream.read_u32()?;
            flags.invasion_type = stream.read_u32()?;
            flags.invasion_x = stream.read_f64()?;
        }
        if version >= VERSION_147 {
            flags.slime_rain_time = stream.read_f64()?;
            flags.sundial_cooldown = stream.read_i8()?;
        }
        if version >= COMPATIBLE_VERSION {
            flags.temp_raining = stream.read_bool()?;
            flags.temp_rain_time = stream.read_u32()?;
            flags.temp_max_rain = stream.read_f32()?;
            flags.ore_tier1 = stream.read_u32()?;
            flags.ore_tier2 = stream.read_u32()?;
            flags.ore_tier3 = stream.read_u32()?;
            flags.bg_tree = stream.read_i8()?;
            flags.bg_corruption = stream.read_i8()?;
            flags.bg_jungle = stream.read_i8()?;
            flags.bg_snow = stream.read_i8()?;
            flags.bg_hallow = stream.read_i8()?;
            flags.bg_crimson = stream.read_i8()?;
            flags.bg_desert = stream.read_i8()?;
            flags.bg_ocean = stream.read_i8()?;
            flags.cloud_bg_active = stream.read_u32()?;
            flags.num_clouds = stream.read_u16()?;
            flags.wind_speed_set = stream.read_f32()?;
        }

        if version >= VERSION_95 {
            flags.num_anglers = stream.read_u32()?;
            for _ in 0..flags.num_anglers {
                flags.anglers.push(stream.read_string()?);
            }
        }
        if version >= VERSION_99 {
            flags.saved_angler = stream.read_bool()?;
        }
        if version >= VERSION_101 {
            flags.angler_quest = stream.read_u32()?;
        }
        if version >= VERSION_104 {
            flags.saved_stylist = stream.read_bool()?;
        }
        if version >= VERSION_140 {
            flags.saved_tax_collector = stream.read_bool()?;
            flags.invasion_size_start = stream.read_u32()?;
            flags.cultist_delay = stream.read_u32()?;
            flags.killed_mob_count = stream.read_u16()?;
            for _ in 0..flags.killed_mob_count {
                flags.killed_mobs.push(stream.read_u32()?);
            }
            flags.fast_forward_time = stream.read_bool()?;
            flags.downed_fishron = stream.read_bool()?;
            flags.downed_martians = stream.read_bool()?;
            flags.downed_lunatic_cultist = stream.read_bool()?;
            flags.downed_moonlord = stream.read_bool()?;
            flags.downed_halloween_king = stream.read_bool()?;
            flags.downed_halloween_tree = stream.read_bool()?;
            flags.downed_christmas_queen = stream.read_bool()?;
            flags.downed_santa = stream.read_bool()?;
            flags.downed_christmas_tree = stream.read_bool()?;
            flags.downed_celestial_colar = stream.read_bool()?;
            flags.downed_celestial_vortex = stream.read_bool()?;
            flags.downed_celestial_nebula = stream.read_bool()?;
            flags.downed_celestial_stardust = stream.read_bool()?;
            flags.celestial_solar_active = stream.read_bool()?;
            flags.celestial_vortex_active = stream.read_bool()?;
            flags.celestial_nebula_active = stream.read_bool()?;
            flags.celestial_stardust_active = stream.read_bool()?;
            flags.apocalypse = stream.read_bool()?;
        }

        let remaining = tiles_pointer.saturating_sub(stream.tell());
        flags.unknown_flags = stream.read_bytes(remaining as usize)?;

        Ok(flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_below_compatible_skips_the_whole_schema() {
        // version 0 fails every gate in the schema, so read() should only
        // consume the title before falling straight into unknown_flags.
        let mut buf = Vec::new();
        buf.push(5u8); // title length (varint)
        buf.extend_from_slice(b"hello");
        buf.extend_from_slice(&[0xaa, 0xbb]);
        let tiles_pointer = buf.len() as u64;
        let mut s = ByteStream::new(&buf);
        let flags = WorldFlags::read(&mut s, 0, tiles_pointer).unwrap();
        assert_eq!(flags.title, "hello");
        assert_eq!(flags.world_id, 0);
        assert_eq!(flags.unknown_flags, vec![0xaa, 0xbb]);
    }

    /// Builds a buffer that mirrors `WorldFlags::read`'s own gate
    /// structure field-for-field, so it stays correct as the schema
    /// grows. Every multi-byte field is zeroed except `world_id`,
    /// `expert_mode` and `creation_time`, which get distinct marker
    /// values to prove the version-147 block lines up.
    fn full_schema_buf(version: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.push(0u8); // empty title
        if version >= COMPATIBLE_VERSION {
            buf.extend_from_slice(&42u32.to_le_bytes()); // world_id
            buf.extend_from_slice(&[0u8; 6 * 4]); // left/right/top/bottom/high/wide
        }
        if version >= VERSION_147 {
            buf.push(1); // expert_mode
            buf.extend_from_slice(&123u64.to_le_bytes()); // creation_time
        }
        if version >= COMPATIBLE_VERSION {
            buf.extend_from_slice(&[0u8; 127]); // moon_type .. downed_golem_boss
        }
        if version >= VERSION_147 {
            buf.push(0); // downed_slime_king_boss
        }
        if version >= COMPATIBLE_VERSION {
            buf.extend_from_slice(&[0u8; 35]); // saved_goblin .. invasion_x
        }
        if version >= VERSION_147 {
            buf.extend_from_slice(&[0u8; 9]); // slime_rain_time, sundial_cooldown
        }
        if version >= COMPATIBLE_VERSION {
            buf.extend_from_slice(&[0u8; 39]); // temp_raining .. wind_speed_set
        }
        if version >= VERSION_95 {
            buf.extend_from_slice(&0u32.to_le_bytes()); // num_anglers = 0
        }
        if version >= VERSION_99 {
            buf.push(0); // saved_angler
        }
        if version >= VERSION_101 {
            buf.extend_from_slice(&0u32.to_le_bytes()); // angler_quest
        }
        if version >= VERSION_104 {
            buf.push(0); // saved_stylist
        }
        if version >= VERSION_140 {
            buf.push(0); // saved_tax_collector
            buf.extend_from_slice(&0u32.to_le_bytes()); // invasion_size_start
            buf.extend_from_slice(&0u32.to_le_bytes()); // cultist_delay
            buf.extend_from_slice(&0u16.to_le_bytes()); // killed_mob_count = 0
            buf.extend_from_slice(&[0u8; 19]); // fast_forward_time .. apocalypse
        }
        buf
    }

    #[test]
    fn version_147_reads_expert_mode_and_creation_time() {
        let buf = full_schema_buf(VERSION_147);
        let tiles_pointer = buf.len() as u64;
        let mut s = ByteStream::new(&buf);
        let flags = WorldFlags::read(&mut s, VERSION_147, tiles_pointer).unwrap();
        assert_eq!(flags.world_id, 42);
        assert!(flags.expert_mode);
        assert_eq!(flags.creation_time, 123);
        assert!(flags.unknown_flags.is_empty());
    }

    #[test]
    fn anglers_list_reads_num_anglers_strings() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&2u32.to_le_bytes()); // num_anglers
        buf.push(3);
        buf.extend_from_slice(b"Bob");
        buf.push(5);
        buf.extend_from_slice(b"Alice");
        let mut s = ByteStream::new(&buf);
        let mut flags = WorldFlags::default();
        flags.num_anglers = s.read_u32().unwrap();
        for _ in 0..flags.num_anglers {
            flags.anglers.push(s.read_string().unwrap());
        }
        assert_eq!(flags.anglers, vec!["Bob".to_string(), "Alice".to_string()]);
    }

    #[test]
    fn killed_mobs_list_reads_killed_mob_count_u32s() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&3u16.to_le_bytes()); // killed_mob_count
        buf.extend_from_slice(&10u32.to_le_bytes());
        buf.extend_from_slice(&20u32.to_le_bytes());
        buf.extend_from_slice(&30u32.to_le_bytes());
        let mut s = ByteStream::new(&buf);
        let mut flags = WorldFlags::default();
        flags.killed_mob_count = s.read_u16().unwrap();
        for _ in 0..flags.killed_mob_count {
            flags.killed_mobs.push(s.read_u32().unwrap());
        }
        assert_eq!(flags.killed_mobs, vec![10, 20, 30]);
    }

    #[test]
    fn unknown_flags_consumes_exactly_up_to_tiles_pointer() {
        let mut buf = Vec::new();
        buf.push(0); // empty title
        buf.extend_from_slice(&[0u8; 28 * 4]); // plenty of zeroed schema bytes
        let tiles_pointer = buf.len() as u64 + 3;
        buf.extend_from_slice(&[0xaa, 0xbb, 0xcc]);
        // version 0 so every gated block is skipped and only title + the
        // trailing unknown bytes are consumed.
        let mut s = ByteStream::new(&buf);
        let flags = WorldFlags::read(&mut s, 0, tiles_pointer).unwrap();
        assert_eq!(flags.unknown_flags, vec![0xaa, 0xbb, 0xcc]);
        assert_eq!(s.tell(), tiles_pointer);
    }
}
