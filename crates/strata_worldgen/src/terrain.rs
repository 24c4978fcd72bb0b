//! # Base Terrain
//!
//! The first block-writing stage of generation. A base generator turns
//! an all-air chunk volume into a skeleton of solid marker blocks and
//! sea water; surface layering and populators refine it afterwards.

use strata_core::BlockState;

use crate::biome::ElevationModel;
use crate::error::GenResult;
use crate::populator::{DecorationContext, GenerationContext};
use crate::rng::WorldSeed;

/// What a base generator does on its own.
///
/// The pipelines read these flags instead of inspecting types.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GeneratorCapabilities {
    /// The generator writes its own surface; skip surface layering.
    pub handles_surface: bool,
    /// The generator wraps a legacy generator with its own decoration
    /// step, run after all populators.
    pub wraps_legacy: bool,
}

/// Produces the raw terrain of one chunk.
pub trait BaseTerrainGenerator: Send + Sync {
    /// Name used in logs and error reports.
    fn name(&self) -> &str;

    /// Fills `ctx.buffer`, which arrives all air.
    ///
    /// # Errors
    ///
    /// Any error aborts generation of the chunk.
    fn fill(&self, ctx: &mut GenerationContext<'_>) -> GenResult<()>;

    /// Capability flags; none by default.
    fn capabilities(&self) -> GeneratorCapabilities {
        GeneratorCapabilities::default()
    }

    /// Generator-internal decoration. Only called when
    /// [`GeneratorCapabilities::wraps_legacy`] is set.
    ///
    /// # Errors
    ///
    /// Any error aborts the rest of the decoration pass.
    fn legacy_decorate(&self, _ctx: &mut DecorationContext<'_>) -> GenResult<()> {
        Ok(())
    }
}

/// Rolling terrain from the elevation model: solid below the surface
/// height, water up to sea level.
#[derive(Clone, Debug)]
pub struct NoiseTerrainGenerator {
    elevation: ElevationModel,
    solid: BlockState,
    world_height: i32,
}

impl NoiseTerrainGenerator {
    /// Terrain for `seed`, writing `solid` as the skeleton block.
    #[must_use]
    pub fn new(seed: WorldSeed, solid: BlockState, world_height: usize) -> Self {
        Self {
            elevation: ElevationModel::new(seed),
            solid,
            world_height: world_height as i32,
        }
    }

    /// Surface height of a column.
    #[must_use]
    pub fn height_at(&self, x: i32, z: i32, sea_level: i32) -> i32 {
        self.elevation.surface_height(x, z, sea_level, self.world_height)
    }
}

impl BaseTerrainGenerator for NoiseTerrainGenerator {
    fn name(&self) -> &str {
        "noise"
    }

    fn fill(&self, ctx: &mut GenerationContext<'_>) -> GenResult<()> {
        let (min, max) = (ctx.buffer.min(), ctx.buffer.max());
        let top = max.y - 1;

        for z in min.z..max.z {
            for x in min.x..max.x {
                let height = self.height_at(x, z, ctx.sea_level).min(top);

                for y in min.y..=height {
                    ctx.buffer.set(x, y, z, self.solid)?;
                }
                for y in (height + 1).max(min.y)..ctx.sea_level.min(max.y) {
                    ctx.buffer.set(x, y, z, BlockState::WATER)?;
                }
            }
        }

        Ok(())
    }
}

/// A flat slab of fixed thickness.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlatTerrainGenerator {
    thickness: i32,
    solid: BlockState,
}

impl FlatTerrainGenerator {
    /// A slab `thickness` blocks deep of `solid`.
    #[must_use]
    pub const fn new(thickness: i32, solid: BlockState) -> Self {
        Self { thickness, solid }
    }
}

impl BaseTerrainGenerator for FlatTerrainGenerator {
    fn name(&self) -> &str {
        "flat"
    }

    fn fill(&self, ctx: &mut GenerationContext<'_>) -> GenResult<()> {
        let (min, max) = (ctx.buffer.min(), ctx.buffer.max());
        let top = (min.y + self.thickness).min(max.y);

        for y in min.y..top {
            for z in min.z..max.z {
                for x in min.x..max.x {
                    ctx.buffer.set(x, y, z, self.solid)?;
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
    use crate::biome_field::BiomeField;
    use crate::rng::SeedMixer;
    use crate::volume::BlockVolume;
    use strata_core::{BiomeId, ChunkPos, Vector3i};

    fn run(generator: &dyn BaseTerrainGenerator, sea_level: i32, height: usize) -> BlockVolume {
        let chunk = ChunkPos::new(2, -3);
        let mut volume = BlockVolume::new(Vector3i::new(chunk.min_block_x(), 0, chunk.min_block_z()), 16, height, 16);
        let mut biomes = BiomeField::for_chunk(chunk.min_block_x(), chunk.min_block_z());
        biomes.generate(&SingleBiomeGenerator(BiomeId::PLAINS));
        let mut rng = SeedMixer::new(WorldSeed::new(4)).generation_rng(chunk.x, chunk.z);

        generator
            .fill(&mut GenerationContext {
                chunk,
                seed: WorldSeed::new(4),
                buffer: &mut volume,
                biomes: &biomes,
                rng: &mut rng,
                sea_level,
            })
            .unwrap();
        volume
    }

    #[test]
    fn test_flat_slab() {
        let volume = run(&FlatTerrainGenerator::new(4, BlockState::STONE), 2, 16);
        let min = volume.min();

        for y in 0..4 {
            assert_eq!(volume.get(min.x + 3, y, min.z + 9), Ok(BlockState::STONE));
        }
        assert_eq!(volume.get(min.x + 3, 4, min.z + 9), Ok(BlockState::AIR));
        assert_eq!(volume.top_non_air(min.x, min.z), Some(3));
    }

    #[test]
    fn test_noise_columns_are_solid_then_water_then_air() {
        let generator = NoiseTerrainGenerator::new(WorldSeed::new(4), BlockState::STONE, 128);
        let volume = run(&generator, 64, 128);
        let min = volume.min();

        for dz in 0..16 {
            for dx in 0..16 {
                let (x, z) = (min.x + dx, min.z + dz);
                let height = generator.height_at(x, z, 64);
                assert_eq!(volume.get(x, height, z), Ok(BlockState::STONE));
                assert_eq!(volume.get(x, 0, z), Ok(BlockState::STONE));

                let above = volume.get(x, height + 1, z).unwrap();
                if height + 1 < 64 {
                    assert_eq!(above, BlockState::WATER);
                } else {
                    assert!(above.is_air());
                }
            }
        }
    }

    #[test]
    fn test_default_capabilities() {
        assert_eq!(FlatTerrainGenerator::new(1, BlockState::STONE).capabilities(), GeneratorCapabilities::default());
    }
}
