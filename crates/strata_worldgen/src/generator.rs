//! # World Generator
//!
//! [`WorldGenerator`] is the mutable description of a world's generation:
//! which biome generator and base generator to use, the global populator
//! lists and per-biome overrides. The host and its plugins reconfigure it
//! freely, then freeze it with [`WorldGenerator::build`] into a shared
//! [`GeneratorCore`] that both pipelines read from.
//!
//! ## Lifecycle
//!
//! ```text
//! WorldGenerator::overworld(seed, config)
//!        │  accessors / setters / modifiers
//!        ▼
//! build() ── modifiers applied in registration order
//!        │
//!        ▼
//! Arc<GeneratorCore> ── read-only, shared by every chunk thread
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use strata_core::BiomeId;
use tracing::debug;

use crate::biome::{BiomeGenerator, ClimateBiomeGenerator};
use crate::config::GeneratorConfig;
use crate::error::GenResult;
use crate::populator::{GenerationPopulator, Populator, Structures};
use crate::populators::{BedrockFloor, CaveCarver, OrePopulator};
use crate::rng::{SeedMixer, WorldSeed};
use crate::settings::{BiomeGenerationSettings, BiomeSettingsProvider, DefaultBiomeSettings, SettingsCache};
use crate::structure::ScatteredStructure;
use crate::surface::SurfaceLayerer;
use crate::terrain::{BaseTerrainGenerator, NoiseTerrainGenerator};

/// A plugin reconfiguration point, run once before the generator is
/// frozen.
pub trait WorldGeneratorModifier: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Adjusts the generator.
    ///
    /// # Errors
    ///
    /// Any error aborts [`WorldGenerator::build`].
    fn modify(&self, generator: &mut WorldGenerator) -> GenResult<()>;
}

impl<F> WorldGeneratorModifier for F
where
    F: Fn(&mut WorldGenerator) -> GenResult<()> + Send + Sync,
{
    fn name(&self) -> &str {
        "closure"
    }

    fn modify(&self, generator: &mut WorldGenerator) -> GenResult<()> {
        self(generator)
    }
}

/// Mutable generation setup for one world.
pub struct WorldGenerator {
    seed: WorldSeed,
    config: GeneratorConfig,
    biome_generator: Arc<dyn BiomeGenerator>,
    base_generator: Arc<dyn BaseTerrainGenerator>,
    generation_populators: Vec<Arc<dyn GenerationPopulator>>,
    populators: Vec<Arc<dyn Populator>>,
    settings_provider: Arc<dyn BiomeSettingsProvider>,
    biome_overrides: HashMap<BiomeId, BiomeGenerationSettings>,
    modifiers: Vec<Arc<dyn WorldGeneratorModifier>>,
}

impl WorldGenerator {
    /// A bare generator: climate biomes, noise terrain, built-in biome
    /// settings, no global populators.
    ///
    /// # Errors
    ///
    /// Configuration errors from [`GeneratorConfig::validate`].
    pub fn new(seed: WorldSeed, config: GeneratorConfig) -> GenResult<Self> {
        config.validate()?;
        let solid = config.solid_marker()?;

        Ok(Self {
            seed,
            biome_generator: Arc::new(ClimateBiomeGenerator::new(seed)),
            base_generator: Arc::new(NoiseTerrainGenerator::new(seed, solid, config.world_height)),
            generation_populators: Vec::new(),
            populators: Vec::new(),
            settings_provider: Arc::new(DefaultBiomeSettings),
            biome_overrides: HashMap::new(),
            modifiers: Vec::new(),
            config,
        })
    }

    /// The standard world: bedrock, caves, ruins when enabled, and coal
    /// everywhere.
    ///
    /// # Errors
    ///
    /// Configuration errors.
    pub fn overworld(seed: WorldSeed, config: GeneratorConfig) -> GenResult<Self> {
        let mut generator = Self::new(seed, config)?;

        generator.generation_populators.push(Arc::new(BedrockFloor::default()));
        generator.generation_populators.push(Arc::new(CaveCarver::new(seed)));
        if generator.config.structures.enabled {
            let ruins = ScatteredStructure::new(seed, &generator.config.structures, generator.config.sea_level)?;
            generator.generation_populators.push(Arc::new(ruins));
        }
        generator.populators.push(Arc::new(OrePopulator::coal()));

        Ok(generator)
    }

    /// The world seed.
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The biome generator.
    #[must_use]
    pub fn biome_generator(&self) -> &Arc<dyn BiomeGenerator> {
        &self.biome_generator
    }

    /// Replaces the biome generator.
    pub fn set_biome_generator(&mut self, generator: Arc<dyn BiomeGenerator>) {
        self.biome_generator = generator;
    }

    /// The base terrain generator.
    #[must_use]
    pub fn base_generator(&self) -> &Arc<dyn BaseTerrainGenerator> {
        &self.base_generator
    }

    /// Replaces the base terrain generator.
    pub fn set_base_generator(&mut self, generator: Arc<dyn BaseTerrainGenerator>) {
        self.base_generator = generator;
    }

    /// Global generation populators, in run order.
    #[must_use]
    pub fn generation_populators(&self) -> &[Arc<dyn GenerationPopulator>] {
        &self.generation_populators
    }

    /// Mutable global generation populators.
    pub fn generation_populators_mut(&mut self) -> &mut Vec<Arc<dyn GenerationPopulator>> {
        &mut self.generation_populators
    }

    /// Global decoration populators, in list order.
    #[must_use]
    pub fn populators(&self) -> &[Arc<dyn Populator>] {
        &self.populators
    }

    /// Mutable global decoration populators.
    pub fn populators_mut(&mut self) -> &mut Vec<Arc<dyn Populator>> {
        &mut self.populators
    }

    /// Per-biome settings that bypass the provider entirely.
    pub fn biome_overrides_mut(&mut self) -> &mut HashMap<BiomeId, BiomeGenerationSettings> {
        &mut self.biome_overrides
    }

    /// Replaces the source of per-biome settings.
    pub fn set_settings_provider(&mut self, provider: Arc<dyn BiomeSettingsProvider>) {
        self.settings_provider = provider;
    }

    /// Registers a modifier to run at [`Self::build`].
    pub fn add_modifier(&mut self, modifier: Arc<dyn WorldGeneratorModifier>) {
        self.modifiers.push(modifier);
    }

    /// Runs every registered modifier in registration order.
    ///
    /// # Errors
    ///
    /// The first modifier error.
    pub fn apply_modifiers(&mut self) -> GenResult<()> {
        let modifiers = std::mem::take(&mut self.modifiers);
        for modifier in &modifiers {
            debug!(modifier = modifier.name(), "Applying generator modifier");
            modifier.modify(self)?;
        }
        Ok(())
    }

    /// Applies modifiers and freezes the generator.
    ///
    /// # Errors
    ///
    /// Modifier errors, or configuration errors resolving surface blocks
    /// and biome overrides.
    pub fn build(mut self) -> GenResult<Arc<GeneratorCore>> {
        self.apply_modifiers()?;

        let settings = SettingsCache::new(self.settings_provider, self.biome_overrides, &self.config)?;
        let surface = SurfaceLayerer::new(self.seed, &self.config)?;

        debug!(
            seed = self.seed.value(),
            base = self.base_generator.name(),
            generation_populators = self.generation_populators.len(),
            populators = self.populators.len(),
            "World generator frozen"
        );

        Ok(Arc::new(GeneratorCore {
            mixer: SeedMixer::new(self.seed),
            seed: self.seed,
            config: self.config,
            biome_generator: self.biome_generator,
            base_generator: self.base_generator,
            generation_populators: self.generation_populators,
            populators: self.populators,
            settings,
            surface,
        }))
    }
}

impl fmt::Debug for WorldGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldGenerator")
            .field("seed", &self.seed)
            .field("base_generator", &self.base_generator.name())
            .field("generation_populators", &self.generation_populators.len())
            .field("populators", &self.populators.len())
            .field("biome_overrides", &self.biome_overrides.len())
            .finish_non_exhaustive()
    }
}

/// The frozen, shareable generation setup.
pub struct GeneratorCore {
    seed: WorldSeed,
    config: GeneratorConfig,
    mixer: SeedMixer,
    biome_generator: Arc<dyn BiomeGenerator>,
    base_generator: Arc<dyn BaseTerrainGenerator>,
    generation_populators: Vec<Arc<dyn GenerationPopulator>>,
    populators: Vec<Arc<dyn Populator>>,
    settings: SettingsCache,
    surface: SurfaceLayerer,
}

impl GeneratorCore {
    /// The world seed.
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Per-chunk seed mixing.
    #[must_use]
    pub const fn mixer(&self) -> &SeedMixer {
        &self.mixer
    }

    /// The biome generator.
    #[must_use]
    pub fn biome_generator(&self) -> &dyn BiomeGenerator {
        &*self.biome_generator
    }

    /// The base terrain generator.
    #[must_use]
    pub fn base_generator(&self) -> &dyn BaseTerrainGenerator {
        &*self.base_generator
    }

    /// Global generation populators.
    #[must_use]
    pub fn generation_populators(&self) -> &[Arc<dyn GenerationPopulator>] {
        &self.generation_populators
    }

    /// Global decoration populators.
    #[must_use]
    pub fn populators(&self) -> &[Arc<dyn Populator>] {
        &self.populators
    }

    /// Structure queries over the global generation populators.
    #[must_use]
    pub fn structures(&self) -> Structures<'_> {
        Structures::new(&self.generation_populators)
    }

    /// The per-biome settings cache.
    #[must_use]
    pub const fn settings(&self) -> &SettingsCache {
        &self.settings
    }

    /// The surface layerer.
    #[must_use]
    pub const fn surface(&self) -> &SurfaceLayerer {
        &self.surface
    }
}

impl fmt::Debug for GeneratorCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorCore")
            .field("seed", &self.seed)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::SingleBiomeGenerator;
    use crate::error::GenError;
    use crate::populators::SnowPopulator;
    use crate::terrain::FlatTerrainGenerator;
    use strata_core::BlockState;

    #[test]
    fn test_overworld_lists() {
        let generator = WorldGenerator::overworld(WorldSeed::new(1), GeneratorConfig::default()).unwrap();
        let names: Vec<&str> = generator.generation_populators().iter().map(|p| p.name()).collect();

        assert_eq!(names, vec!["bedrock", "caves", "ruins"]);
        assert_eq!(generator.populators().len(), 1);
    }

    #[test]
    fn test_structures_can_be_disabled() {
        let mut config = GeneratorConfig::default();
        config.structures.enabled = false;
        let generator = WorldGenerator::overworld(WorldSeed::new(1), config).unwrap();
        let core = generator.build().unwrap();

        assert_eq!(core.structures().iter().count(), 0);
    }

    #[test]
    fn test_modifiers_run_in_order() {
        let mut generator = WorldGenerator::new(WorldSeed::new(2), GeneratorConfig::default()).unwrap();
        generator.add_modifier(Arc::new(|g: &mut WorldGenerator| -> GenResult<()> {
            g.set_base_generator(Arc::new(FlatTerrainGenerator::new(3, BlockState::STONE)));
            Ok(())
        }));
        generator.add_modifier(Arc::new(|g: &mut WorldGenerator| -> GenResult<()> {
            g.set_biome_generator(Arc::new(SingleBiomeGenerator(BiomeId::TUNDRA)));
            g.populators_mut().push(Arc::new(SnowPopulator));
            Ok(())
        }));

        let core = generator.build().unwrap();

        assert_eq!(core.base_generator().name(), "flat");
        assert_eq!(core.biome_generator().biome_at(100, -100), BiomeId::TUNDRA);
        assert_eq!(core.populators().len(), 1);
    }

    #[test]
    fn test_failing_modifier_aborts_build() {
        let mut generator = WorldGenerator::new(WorldSeed::new(2), GeneratorConfig::default()).unwrap();
        generator.add_modifier(Arc::new(|_: &mut WorldGenerator| -> GenResult<()> {
            Err(GenError::InvalidConfig("nope".into()))
        }));

        assert_eq!(generator.build().err(), Some(GenError::InvalidConfig("nope".into())));
    }

    #[test]
    fn test_invalid_config_rejected_eagerly() {
        let config = GeneratorConfig {
            soft_pad: 12,
            ..GeneratorConfig::default()
        };
        assert!(WorldGenerator::new(WorldSeed::new(0), config).is_err_and(|e| e.is_config()));
    }
}
