//! # Block and Biome Handles
//!
//! The host owns the real block and biome registries. The pipeline only
//! ever sees these opaque `u16` handles, plus a small name table so that
//! configuration files can refer to them.

use bytemuck::{Pod, Zeroable};
use std::fmt;

/// Opaque block-state handle.
///
/// `BlockState::AIR` is the zero value, so a zeroed buffer is empty space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
#[repr(transparent)]
pub struct BlockState(pub u16);

impl BlockState {
    /// Empty space.
    pub const AIR: Self = Self(0);
    /// The solid skeleton block produced by base terrain.
    pub const STONE: Self = Self(1);
    /// Grass-topped dirt.
    pub const GRASS: Self = Self(2);
    /// Dirt.
    pub const DIRT: Self = Self(3);
    /// Sand.
    pub const SAND: Self = Self(4);
    /// Gravel, the loose sediment of deep sea floors.
    pub const GRAVEL: Self = Self(5);
    /// Still water.
    pub const WATER: Self = Self(6);
    /// Unbreakable world floor.
    pub const BEDROCK: Self = Self(7);
    /// Thin snow cover.
    pub const SNOW_LAYER: Self = Self(8);
    /// Full snow block.
    pub const SNOW_BLOCK: Self = Self(9);
    /// Ice.
    pub const ICE: Self = Self(10);
    /// Tree trunk.
    pub const LOG: Self = Self(11);
    /// Tree canopy.
    pub const LEAVES: Self = Self(12);
    /// Coal ore.
    pub const COAL_ORE: Self = Self(13);
    /// Iron ore.
    pub const IRON_ORE: Self = Self(14);
    /// Sandstone.
    pub const SANDSTONE: Self = Self(15);
    /// Clay.
    pub const CLAY: Self = Self(16);
    /// Structure walls.
    pub const STONE_BRICKS: Self = Self(17);
    /// Weathered structure walls.
    pub const MOSSY_STONE_BRICKS: Self = Self(18);

    const NAMES: [(&'static str, Self); 19] = [
        ("air", Self::AIR),
        ("stone", Self::STONE),
        ("grass", Self::GRASS),
        ("dirt", Self::DIRT),
        ("sand", Self::SAND),
        ("gravel", Self::GRAVEL),
        ("water", Self::WATER),
        ("bedrock", Self::BEDROCK),
        ("snow_layer", Self::SNOW_LAYER),
        ("snow_block", Self::SNOW_BLOCK),
        ("ice", Self::ICE),
        ("log", Self::LOG),
        ("leaves", Self::LEAVES),
        ("coal_ore", Self::COAL_ORE),
        ("iron_ore", Self::IRON_ORE),
        ("sandstone", Self::SANDSTONE),
        ("clay", Self::CLAY),
        ("stone_bricks", Self::STONE_BRICKS),
        ("mossy_stone_bricks", Self::MOSSY_STONE_BRICKS),
    ];

    /// Looks a block up by its configuration name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, state)| *state)
    }

    /// Returns the configuration name, if this handle is a known one.
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        Self::NAMES
            .iter()
            .find(|(_, state)| *state == self)
            .map(|(n, _)| *n)
    }

    /// Returns true for empty space.
    #[inline]
    #[must_use]
    pub const fn is_air(self) -> bool {
        self.0 == Self::AIR.0
    }

    /// Returns true for liquids.
    #[inline]
    #[must_use]
    pub const fn is_fluid(self) -> bool {
        self.0 == Self::WATER.0
    }

    /// Returns true for anything that is neither air nor liquid.
    #[inline]
    #[must_use]
    pub const fn is_solid(self) -> bool {
        !self.is_air() && !self.is_fluid()
    }
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "block#{}", self.0),
        }
    }
}

/// Opaque biome handle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
#[repr(transparent)]
pub struct BiomeId(pub u16);

impl BiomeId {
    /// Deep ocean.
    pub const DEEP_OCEAN: Self = Self(0);
    /// Shallow ocean.
    pub const OCEAN: Self = Self(1);
    /// Beach / coastline.
    pub const BEACH: Self = Self(2);
    /// Plains.
    pub const PLAINS: Self = Self(3);
    /// Forest.
    pub const FOREST: Self = Self(4);
    /// Jungle.
    pub const JUNGLE: Self = Self(5);
    /// Desert.
    pub const DESERT: Self = Self(6);
    /// Tundra.
    pub const TUNDRA: Self = Self(7);
    /// Snowy taiga.
    pub const TAIGA: Self = Self(8);
    /// Mountains.
    pub const MOUNTAINS: Self = Self(9);
    /// Snowy peaks.
    pub const SNOWY_PEAKS: Self = Self(10);
    /// Swamp.
    pub const SWAMP: Self = Self(11);
    /// Savanna.
    pub const SAVANNA: Self = Self(12);
    /// Badlands.
    pub const BADLANDS: Self = Self(13);

    /// Every biome the built-in classifier can emit.
    pub const ALL: [Self; 14] = [
        Self::DEEP_OCEAN,
        Self::OCEAN,
        Self::BEACH,
        Self::PLAINS,
        Self::FOREST,
        Self::JUNGLE,
        Self::DESERT,
        Self::TUNDRA,
        Self::TAIGA,
        Self::MOUNTAINS,
        Self::SNOWY_PEAKS,
        Self::SWAMP,
        Self::SAVANNA,
        Self::BADLANDS,
    ];

    const NAMES: [&'static str; 14] = [
        "deep_ocean",
        "ocean",
        "beach",
        "plains",
        "forest",
        "jungle",
        "desert",
        "tundra",
        "taiga",
        "mountains",
        "snowy_peaks",
        "swamp",
        "savanna",
        "badlands",
    ];

    /// Looks a biome up by its configuration name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| Self(i as u16))
    }

    /// Returns the configuration name, if this handle is a known one.
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        Self::NAMES.get(usize::from(self.0)).copied()
    }

    /// Returns true for biomes where snow settles.
    #[must_use]
    pub const fn is_cold(self) -> bool {
        matches!(self.0, 7 | 8 | 10)
    }

    /// Returns true for water-covered biomes.
    #[must_use]
    pub const fn is_ocean(self) -> bool {
        matches!(self.0, 0 | 1)
    }
}

impl fmt::Display for BiomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "biome#{}", self.0),
        }
    }
}
