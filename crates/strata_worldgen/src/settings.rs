//! # Biome Generation Settings
//!
//! Per-biome configuration: ground cover, decoration populators and
//! generation populators.
//!
//! Settings are only ever produced through [`BiomeSettingsBuilder`],
//! which validates ground cover, and are cached per biome by
//! [`SettingsCache`] so each biome is built at most once per world.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use strata_core::{BiomeId, BlockState};
use tracing::{debug, trace};

use crate::config::GeneratorConfig;
use crate::error::{GenError, GenResult};
use crate::populator::{GenerationPopulator, Populator};
use crate::populators::{LakePopulator, OrePopulator, SnowPopulator, TreePopulator};
use crate::surface::GroundCoverLayer;

/// Most ground-cover layers a biome may declare.
pub const MAX_GROUND_COVER_LAYERS: usize = 16;

/// Everything biome-specific the pipelines need.
#[derive(Clone, Default)]
pub struct BiomeGenerationSettings {
    ground_cover: Vec<GroundCoverLayer>,
    populators: Vec<Arc<dyn Populator>>,
    generation_populators: Vec<Arc<dyn GenerationPopulator>>,
}

impl BiomeGenerationSettings {
    /// Starts a builder.
    #[must_use]
    pub fn builder() -> BiomeSettingsBuilder {
        BiomeSettingsBuilder::default()
    }

    /// Ground cover, top layer first.
    #[must_use]
    pub fn ground_cover(&self) -> &[GroundCoverLayer] {
        &self.ground_cover
    }

    /// Decoration populators for this biome.
    #[must_use]
    pub fn populators(&self) -> &[Arc<dyn Populator>] {
        &self.populators
    }

    /// Generation populators for this biome.
    #[must_use]
    pub fn generation_populators(&self) -> &[Arc<dyn GenerationPopulator>] {
        &self.generation_populators
    }

    /// Builder pre-filled with these settings.
    #[must_use]
    pub fn to_builder(&self) -> BiomeSettingsBuilder {
        BiomeSettingsBuilder {
            ground_cover: self.ground_cover.clone(),
            populators: self.populators.clone(),
            generation_populators: self.generation_populators.clone(),
        }
    }
}

impl fmt::Debug for BiomeGenerationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BiomeGenerationSettings")
            .field("ground_cover", &self.ground_cover)
            .field("populators", &self.populators.len())
            .field("generation_populators", &self.generation_populators.len())
            .finish()
    }
}

/// Validating builder for [`BiomeGenerationSettings`].
#[derive(Clone, Default)]
pub struct BiomeSettingsBuilder {
    ground_cover: Vec<GroundCoverLayer>,
    populators: Vec<Arc<dyn Populator>>,
    generation_populators: Vec<Arc<dyn GenerationPopulator>>,
}

impl BiomeSettingsBuilder {
    /// Appends a ground-cover layer below the existing ones.
    #[must_use]
    pub fn ground_cover(mut self, layer: GroundCoverLayer) -> Self {
        self.ground_cover.push(layer);
        self
    }

    /// Replaces the whole ground cover.
    #[must_use]
    pub fn replace_ground_cover(mut self, layers: Vec<GroundCoverLayer>) -> Self {
        self.ground_cover = layers;
        self
    }

    /// Appends a decoration populator.
    #[must_use]
    pub fn populator(mut self, populator: Arc<dyn Populator>) -> Self {
        self.populators.push(populator);
        self
    }

    /// Appends a generation populator.
    #[must_use]
    pub fn generation_populator(mut self, populator: Arc<dyn GenerationPopulator>) -> Self {
        self.generation_populators.push(populator);
        self
    }

    /// Validates and builds the settings for `biome`.
    ///
    /// Fixed layers must have a non-air block and a non-negative depth.
    /// Dynamic layers are checked when they run.
    ///
    /// # Errors
    ///
    /// `MalformedGroundCover` naming the first bad layer.
    pub fn build(self, biome: BiomeId) -> GenResult<BiomeGenerationSettings> {
        if self.ground_cover.len() > MAX_GROUND_COVER_LAYERS {
            return Err(GenError::MalformedGroundCover {
                biome,
                layer: MAX_GROUND_COVER_LAYERS,
                reason: format!("more than {MAX_GROUND_COVER_LAYERS} layers"),
            });
        }

        for (layer, cover) in self.ground_cover.iter().enumerate() {
            if let Some((block, depth)) = cover.as_fixed() {
                if block.is_air() {
                    return Err(GenError::MalformedGroundCover {
                        biome,
                        layer,
                        reason: "cover block is air".into(),
                    });
                }
                if depth < 0 {
                    return Err(GenError::MalformedGroundCover {
                        biome,
                        layer,
                        reason: format!("negative depth {depth}"),
                    });
                }
            }
        }

        Ok(BiomeGenerationSettings {
            ground_cover: self.ground_cover,
            populators: self.populators,
            generation_populators: self.generation_populators,
        })
    }
}

/// Source of per-biome settings.
pub trait BiomeSettingsProvider: Send + Sync {
    /// Builds the settings for `biome`.
    ///
    /// # Errors
    ///
    /// `MissingBiomeSettings` for biomes the provider does not know, or
    /// any validation error from the builder.
    fn settings_for(&self, biome: BiomeId) -> GenResult<BiomeGenerationSettings>;
}

/// The same settings for every biome.
#[derive(Clone, Debug, Default)]
pub struct UniformBiomeSettings(pub BiomeGenerationSettings);

impl BiomeSettingsProvider for UniformBiomeSettings {
    fn settings_for(&self, _biome: BiomeId) -> GenResult<BiomeGenerationSettings> {
        Ok(self.0.clone())
    }
}

/// Built-in settings for every [`BiomeId::ALL`] biome.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultBiomeSettings;

impl DefaultBiomeSettings {
    /// Sub-soil depth around 3, varying with stone noise.
    fn subsoil_depth(noise: f64, _y: i32) -> i32 {
        (noise / 3.0 + 3.0) as i32
    }

    fn cover(top: BlockState, below: BlockState) -> Vec<GroundCoverLayer> {
        vec![
            GroundCoverLayer::fixed(top, 1),
            GroundCoverLayer::new(move |_| below, Self::subsoil_depth),
        ]
    }

    /// Tree density per biome (0-100).
    const fn tree_density(biome: BiomeId) -> u32 {
        match biome {
            BiomeId::FOREST => 50,
            BiomeId::JUNGLE => 80,
            BiomeId::TAIGA => 40,
            BiomeId::SWAMP => 30,
            BiomeId::PLAINS => 5,
            BiomeId::SAVANNA => 10,
            _ => 0,
        }
    }
}

impl BiomeSettingsProvider for DefaultBiomeSettings {
    fn settings_for(&self, biome: BiomeId) -> GenResult<BiomeGenerationSettings> {
        if !BiomeId::ALL.contains(&biome) {
            return Err(GenError::MissingBiomeSettings(biome));
        }

        let ground_cover = match biome {
            BiomeId::DESERT => Self::cover(BlockState::SAND, BlockState::SANDSTONE),
            BiomeId::BEACH => Self::cover(BlockState::SAND, BlockState::SAND),
            BiomeId::BADLANDS => Self::cover(BlockState::SAND, BlockState::CLAY),
            BiomeId::OCEAN | BiomeId::DEEP_OCEAN => Self::cover(BlockState::SAND, BlockState::GRAVEL),
            BiomeId::SNOWY_PEAKS => Self::cover(BlockState::SNOW_BLOCK, BlockState::STONE),
            BiomeId::MOUNTAINS => Vec::new(),
            _ => Self::cover(BlockState::GRASS, BlockState::DIRT),
        };

        let mut builder = BiomeGenerationSettings::builder().replace_ground_cover(ground_cover);

        let density = Self::tree_density(biome);
        if density > 0 {
            builder = builder.populator(Arc::new(TreePopulator::with_density(density)));
        }
        if matches!(biome, BiomeId::PLAINS | BiomeId::FOREST | BiomeId::SWAMP | BiomeId::TAIGA) {
            builder = builder.populator(Arc::new(LakePopulator::water()));
        }
        if biome.is_cold() {
            builder = builder.populator(Arc::new(SnowPopulator));
        }
        if biome == BiomeId::MOUNTAINS || biome == BiomeId::BADLANDS {
            builder = builder.populator(Arc::new(OrePopulator::iron()));
        }

        builder.build(biome)
    }
}

/// Lazily built, at-most-once settings per biome.
///
/// Reads are lock-free of each other; a miss takes the build lock,
/// re-checks, builds, and publishes. Concurrent misses for the same
/// biome therefore build it once.
pub struct SettingsCache {
    provider: Arc<dyn BiomeSettingsProvider>,
    overrides: HashMap<BiomeId, Arc<BiomeGenerationSettings>>,
    cover_overrides: HashMap<BiomeId, Vec<GroundCoverLayer>>,
    built: RwLock<HashMap<BiomeId, Arc<BiomeGenerationSettings>>>,
    build_lock: Mutex<()>,
    builds: Mutex<HashMap<BiomeId, u32>>,
}

impl SettingsCache {
    /// Creates the cache.
    ///
    /// `overrides` win outright; config ground cover replaces the
    /// provider's cover for its biome.
    ///
    /// # Errors
    ///
    /// Config ground-cover resolution errors.
    pub fn new(
        provider: Arc<dyn BiomeSettingsProvider>,
        overrides: HashMap<BiomeId, BiomeGenerationSettings>,
        config: &GeneratorConfig,
    ) -> GenResult<Self> {
        Ok(Self {
            provider,
            overrides: overrides.into_iter().map(|(b, s)| (b, Arc::new(s))).collect(),
            cover_overrides: config.ground_cover_overrides()?,
            built: RwLock::new(HashMap::new()),
            build_lock: Mutex::new(()),
            builds: Mutex::new(HashMap::new()),
        })
    }

    /// Settings for `biome`, building them on first use.
    ///
    /// # Errors
    ///
    /// Provider or validation errors. Failures are not cached.
    pub fn get(&self, biome: BiomeId) -> GenResult<Arc<BiomeGenerationSettings>> {
        if let Some(settings) = self.overrides.get(&biome) {
            return Ok(Arc::clone(settings));
        }
        if let Some(settings) = self.built.read().get(&biome) {
            return Ok(Arc::clone(settings));
        }

        let _guard = self.build_lock.lock();
        if let Some(settings) = self.built.read().get(&biome) {
            trace!(biome = %biome, "Settings published while waiting");
            return Ok(Arc::clone(settings));
        }

        let settings = Arc::new(self.build(biome)?);
        *self.builds.lock().entry(biome).or_insert(0) += 1;
        self.built.write().insert(biome, Arc::clone(&settings));

        debug!(
            biome = %biome,
            layers = settings.ground_cover().len(),
            populators = settings.populators().len(),
            "Biome settings built"
        );
        Ok(settings)
    }

    /// How many times `biome` has been built.
    #[must_use]
    pub fn build_count(&self, biome: BiomeId) -> u32 {
        self.builds.lock().get(&biome).copied().unwrap_or(0)
    }

    fn build(&self, biome: BiomeId) -> GenResult<BiomeGenerationSettings> {
        let settings = self.provider.settings_for(biome)?;

        match self.cover_overrides.get(&biome) {
            Some(layers) => settings.to_builder().replace_ground_cover(layers.clone()).build(biome),
            None => Ok(settings),
        }
    }
}

impl fmt::Debug for SettingsCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsCache")
            .field("overrides", &self.overrides.len())
            .field("built", &self.built.read().len())
            .finish_non_exhaustive()
    }
}
