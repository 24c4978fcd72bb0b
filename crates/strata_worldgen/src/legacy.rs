//! # Legacy Generators
//!
//! Older generators build a whole chunk in one pass, surface included,
//! and carry their own decoration step that is not expressed as
//! populators. [`LegacyGeneratorAdapter`] plugs such a generator into the
//! pipeline as a base generator with both capability flags set: surface
//! layering is skipped, and its decoration runs after every populator.

use std::fmt;

use strata_core::{BiomeId, BlockState, ChunkPos};

use crate::biome::ElevationModel;
use crate::biome_field::BiomeField;
use crate::error::GenResult;
use crate::noise::SimplexNoise;
use crate::populator::{DecorationContext, GenerationContext};
use crate::populators::TreePopulator;
use crate::rng::WorldSeed;
use crate::terrain::{BaseTerrainGenerator, GeneratorCapabilities};
use crate::volume::BlockVolume;

/// A self-contained chunk generator with its own decoration step.
pub trait LegacyChunkGenerator: Send + Sync {
    /// Name used in logs and error reports.
    fn name(&self) -> &str;

    /// Writes the finished terrain of `chunk` into `volume`.
    ///
    /// # Errors
    ///
    /// Any error aborts generation of the chunk.
    fn generate_chunk(&self, chunk: ChunkPos, volume: &mut BlockVolume, biomes: &BiomeField, sea_level: i32) -> GenResult<()>;

    /// The generator's own decoration.
    ///
    /// # Errors
    ///
    /// Any error aborts the rest of the decoration pass.
    fn decorate_chunk(&self, ctx: &mut DecorationContext<'_>) -> GenResult<()>;
}

/// Runs a [`LegacyChunkGenerator`] as a base terrain generator.
pub struct LegacyGeneratorAdapter<G> {
    inner: G,
}

impl<G: LegacyChunkGenerator> LegacyGeneratorAdapter<G> {
    /// Wraps `inner`.
    #[must_use]
    pub const fn new(inner: G) -> Self {
        Self { inner }
    }

    /// The wrapped generator.
    #[must_use]
    pub const fn inner(&self) -> &G {
        &self.inner
    }
}

impl<G: LegacyChunkGenerator> BaseTerrainGenerator for LegacyGeneratorAdapter<G> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fill(&self, ctx: &mut GenerationContext<'_>) -> GenResult<()> {
        self.inner.generate_chunk(ctx.chunk, ctx.buffer, ctx.biomes, ctx.sea_level)
    }

    fn capabilities(&self) -> GeneratorCapabilities {
        GeneratorCapabilities {
            handles_surface: true,
            wraps_legacy: true,
        }
    }

    fn legacy_decorate(&self, ctx: &mut DecorationContext<'_>) -> GenResult<()> {
        self.inner.decorate_chunk(ctx)
    }
}

impl<G: LegacyChunkGenerator> fmt::Debug for LegacyGeneratorAdapter<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegacyGeneratorAdapter")
            .field("inner", &self.inner.name())
            .finish()
    }
}

/// One-pass column generator: bedrock, stone, dirt, a biome surface
/// block and sea water, with noise-placed trees as its decoration.
#[derive(Clone, Debug)]
pub struct ClassicGenerator {
    elevation: ElevationModel,
    tree_noise: SimplexNoise,
    world_height: i32,
}

impl ClassicGenerator {
    /// Depth of dirt under the surface block.
    const SUBSOIL_DEPTH: i32 = 4;

    /// Creates the generator for `seed`.
    #[must_use]
    pub fn new(seed: WorldSeed, world_height: usize) -> Self {
        Self {
            elevation: ElevationModel::new(seed),
            tree_noise: SimplexNoise::new(seed.derive(102)),
            world_height: world_height as i32,
        }
    }

    const fn surface_block(biome: BiomeId) -> BlockState {
        match biome {
            BiomeId::BEACH | BiomeId::DESERT | BiomeId::BADLANDS | BiomeId::OCEAN | BiomeId::DEEP_OCEAN => {
                BlockState::SAND
            }
            BiomeId::MOUNTAINS => BlockState::STONE,
            BiomeId::SNOWY_PEAKS => BlockState::SNOW_BLOCK,
            _ => BlockState::GRASS,
        }
    }

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

    fn generate_column(&self, volume: &mut BlockVolume, x: i32, z: i32, biome: BiomeId, sea_level: i32) -> GenResult<()> {
        let (min, max) = (volume.min(), volume.max());
        let height = self
            .elevation
            .surface_height(x, z, sea_level, self.world_height)
            .min(max.y - 1);
        let surface = Self::surface_block(biome);

        for y in min.y..max.y {
            let block = if y == 0 {
                BlockState::BEDROCK
            } else if y < height - Self::SUBSOIL_DEPTH {
                BlockState::STONE
            } else if y < height {
                BlockState::DIRT
            } else if y == height {
                surface
            } else if y < sea_level {
                BlockState::WATER
            } else {
                break;
            };
            volume.set(x, y, z, block)?;
        }

        Ok(())
    }
}

impl LegacyChunkGenerator for ClassicGenerator {
    fn name(&self) -> &str {
        "classic"
    }

    fn generate_chunk(&self, _chunk: ChunkPos, volume: &mut BlockVolume, biomes: &BiomeField, sea_level: i32) -> GenResult<()> {
        let (min, max) = (volume.min(), volume.max());
        for z in min.z..max.z {
            for x in min.x..max.x {
                self.generate_column(volume, x, z, biomes.biome_at(x, z)?, sea_level)?;
            }
        }
        Ok(())
    }

    fn decorate_chunk(&self, ctx: &mut DecorationContext<'_>) -> GenResult<()> {
        let density = Self::tree_density(ctx.biome);
        if density == 0 {
            return Ok(());
        }

        // 2% of columns at density 5 up to about 16% in jungle
        let threshold = 1.0 - (0.02 + f64::from(density) / 100.0 * 0.18);
        let trees = TreePopulator::with_density(density);
        let core = ctx.buffer.core_min();
        let width = ctx.buffer.core_width() as i32;

        for z in core.z..core.z + width {
            for x in core.x..core.x + width {
                let value = self.tree_noise.sample(f64::from(x) * 0.3, f64::from(z) * 0.3);
                if value > threshold {
                    trees.grow(ctx, x, z)?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::SingleBiomeGenerator;
    use strata_core::Vector3i;

    #[test]
    fn test_adapter_flags() {
        let adapter = LegacyGeneratorAdapter::new(ClassicGenerator::new(WorldSeed::new(1), 128));
        let caps = adapter.capabilities();

        assert!(caps.handles_surface);
        assert!(caps.wraps_legacy);
        assert_eq!(adapter.name(), "classic");
    }

    #[test]
    fn test_classic_column_layout() {
        let classic = ClassicGenerator::new(WorldSeed::new(42), 128);
        let chunk = ChunkPos::new(0, 0);
        let mut volume = BlockVolume::new(Vector3i::ZERO, 16, 128, 16);
        let mut biomes = BiomeField::for_chunk(0, 0);
        biomes.generate(&SingleBiomeGenerator(BiomeId::PLAINS));

        classic.generate_chunk(chunk, &mut volume, &biomes, 64).unwrap();

        for z in 0..16 {
            for x in 0..16 {
                assert_eq!(volume.get(x, 0, z), Ok(BlockState::BEDROCK));
                let top = volume.top_non_air(x, z).unwrap();
                let block = volume.get(x, top, z).unwrap();
                assert!(block == BlockState::GRASS || block == BlockState::WATER);
            }
        }
    }
}
