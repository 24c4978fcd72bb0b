//! # Generator Configuration
//!
//! TOML-backed settings for one world's generator. Every field has a
//! default, so an empty file is a valid configuration.
//!
//! ```toml
//! sea_level = 64
//! world_height = 256
//! soft_pad = 8
//!
//! [surface]
//! stone_noise_scale = 0.0625
//! solid_marker = "stone"
//! loose_sediment = "gravel"
//!
//! [decoration]
//! biome_sample_offset = 8
//!
//! [structures]
//! enabled = true
//! spacing = 24
//! separation = 8
//!
//! [biomes.desert]
//! ground_cover = [{ block = "sand", depth = 1 }, { block = "sandstone", depth = 3 }]
//! ```
//!
//! Names are resolved and validated when the file is parsed, so a bad
//! configuration fails before any chunk is generated.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_core::{BiomeId, BlockState, CHUNK_WIDTH};
use tracing::debug;

use crate::error::{GenError, GenResult};
use crate::settings::MAX_GROUND_COVER_LAYERS;
use crate::surface::GroundCoverLayer;

/// Largest soft padding the four-chunk decoration working set can hold.
pub const MAX_SOFT_PAD: i32 = 8;

/// Top-level generator configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Y of the sea surface.
    pub sea_level: i32,
    /// Number of block layers in a chunk.
    pub world_height: usize,
    /// Horizontal padding of the decoration buffer.
    pub soft_pad: i32,
    /// Surface layering.
    pub surface: SurfaceConfig,
    /// Decoration pass.
    pub decoration: DecorationConfig,
    /// Scattered structures.
    pub structures: StructureConfig,
    /// Per-biome overrides keyed by biome name.
    pub biomes: BTreeMap<String, BiomeOverrideConfig>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            sea_level: 64,
            world_height: 256,
            soft_pad: MAX_SOFT_PAD,
            surface: SurfaceConfig::default(),
            decoration: DecorationConfig::default(),
            structures: StructureConfig::default(),
            biomes: BTreeMap::new(),
        }
    }
}

/// Surface layering settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SurfaceConfig {
    /// Horizontal frequency of the per-chunk stone noise.
    pub stone_noise_scale: f64,
    /// The block base terrain uses for "solid"; only it is replaced.
    pub solid_marker: String,
    /// Block placed on deep underwater surfaces.
    pub loose_sediment: String,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            stone_noise_scale: 0.0625,
            solid_marker: "stone".into(),
            loose_sediment: "gravel".into(),
        }
    }
}

/// Decoration settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecorationConfig {
    /// Local X/Z within the target chunk sampled for the dominant biome.
    pub biome_sample_offset: i32,
}

impl Default for DecorationConfig {
    fn default() -> Self {
        Self { biome_sample_offset: 8 }
    }
}

/// Scattered structure placement, in chunks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StructureConfig {
    /// Whether the default structure populator is registered.
    pub enabled: bool,
    /// Side length of a placement region.
    pub spacing: i32,
    /// Margin at the far edge of a region where no start is placed.
    pub separation: i32,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            spacing: 24,
            separation: 8,
        }
    }
}

/// Per-biome settings override.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BiomeOverrideConfig {
    /// Replacement ground cover, top layer first.
    pub ground_cover: Vec<GroundCoverConfig>,
}

/// One fixed ground-cover layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroundCoverConfig {
    /// Block name.
    pub block: String,
    /// Layer thickness.
    pub depth: i32,
}

impl GeneratorConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for syntax or range errors, `UnknownBlock` /
    /// `UnknownBiome` for unresolvable names, `MalformedGroundCover` for
    /// bad layers.
    pub fn from_toml_str(source: &str) -> GenResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| GenError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        debug!(
            sea_level = config.sea_level,
            world_height = config.world_height,
            overrides = config.biomes.len(),
            "Generator config loaded"
        );
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn load(path: &Path) -> GenResult<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| GenError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Serializes back to TOML.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if serialization fails.
    pub fn to_toml_string(&self) -> GenResult<String> {
        toml::to_string_pretty(self).map_err(|e| GenError::InvalidConfig(e.to_string()))
    }

    /// Checks ranges and resolves every name.
    ///
    /// # Errors
    ///
    /// See [`Self::from_toml_str`].
    pub fn validate(&self) -> GenResult<()> {
        if self.world_height == 0 || self.world_height > 4096 {
            return Err(GenError::InvalidConfig(format!(
                "world_height must be in 1..=4096, got {}",
                self.world_height
            )));
        }
        if self.sea_level < 0 || self.sea_level >= self.world_height as i32 {
            return Err(GenError::InvalidConfig(format!(
                "sea_level {} outside world height {}",
                self.sea_level, self.world_height
            )));
        }
        if !(0..=MAX_SOFT_PAD).contains(&self.soft_pad) {
            return Err(GenError::InvalidConfig(format!(
                "soft_pad must be in 0..={MAX_SOFT_PAD}, got {}",
                self.soft_pad
            )));
        }
        if !self.surface.stone_noise_scale.is_finite() || self.surface.stone_noise_scale <= 0.0 {
            return Err(GenError::InvalidConfig("stone_noise_scale must be positive".into()));
        }
        if !(0..CHUNK_WIDTH as i32).contains(&self.decoration.biome_sample_offset) {
            return Err(GenError::InvalidConfig(format!(
                "biome_sample_offset must be in 0..16, got {}",
                self.decoration.biome_sample_offset
            )));
        }
        let structures = &self.structures;
        if structures.separation < 0 || structures.spacing <= structures.separation {
            return Err(GenError::InvalidConfig(format!(
                "structure spacing {} must exceed separation {}",
                structures.spacing, structures.separation
            )));
        }

        self.solid_marker()?;
        self.loose_sediment()?;
        self.ground_cover_overrides()?;
        Ok(())
    }

    /// The resolved solid marker block.
    ///
    /// # Errors
    ///
    /// `UnknownBlock` if the name does not resolve.
    pub fn solid_marker(&self) -> GenResult<BlockState> {
        resolve_block(&self.surface.solid_marker)
    }

    /// The resolved loose sediment block.
    ///
    /// # Errors
    ///
    /// `UnknownBlock` if the name does not resolve.
    pub fn loose_sediment(&self) -> GenResult<BlockState> {
        resolve_block(&self.surface.loose_sediment)
    }

    /// Ground-cover overrides resolved to layers, keyed by biome.
    ///
    /// # Errors
    ///
    /// `UnknownBiome`, `UnknownBlock` or `MalformedGroundCover`.
    pub fn ground_cover_overrides(&self) -> GenResult<HashMap<BiomeId, Vec<GroundCoverLayer>>> {
        let mut resolved = HashMap::with_capacity(self.biomes.len());

        for (name, entry) in &self.biomes {
            let biome = BiomeId::from_name(name).ok_or_else(|| GenError::UnknownBiome(name.clone()))?;

            if entry.ground_cover.len() > MAX_GROUND_COVER_LAYERS {
                return Err(GenError::MalformedGroundCover {
                    biome,
                    layer: MAX_GROUND_COVER_LAYERS,
                    reason: format!("more than {MAX_GROUND_COVER_LAYERS} layers"),
                });
            }

            let mut layers = Vec::with_capacity(entry.ground_cover.len());
            for (index, layer) in entry.ground_cover.iter().enumerate() {
                let block = resolve_block(&layer.block)?;
                if block.is_air() {
                    return Err(GenError::MalformedGroundCover {
                        biome,
                        layer: index,
                        reason: "cover block is air".into(),
                    });
                }
                if layer.depth < 0 {
                    return Err(GenError::MalformedGroundCover {
                        biome,
                        layer: index,
                        reason: format!("negative depth {}", layer.depth),
                    });
                }
                layers.push(GroundCoverLayer::fixed(block, layer.depth));
            }

            resolved.insert(biome, layers);
        }

        Ok(resolved)
    }
}

fn resolve_block(name: &str) -> GenResult<BlockState> {
    BlockState::from_name(name).ok_or_else(|| GenError::UnknownBlock(name.to_owned()))
}
