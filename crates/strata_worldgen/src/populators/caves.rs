//! Worm caves.
//!
//! Every chunk within `range` of the target may start worms. A worm's
//! path depends only on the seed and its source chunk, and each target
//! carves just the part of the path that crosses it, so a cave joins up
//! across chunk seams no matter which side generates first.

use std::f64::consts::{PI, TAU};

use rand::Rng;
use strata_core::{BlockState, ChunkPos};
use tracing::trace;

use crate::error::GenResult;
use crate::populator::{GenerationContext, GenerationPopulator};
use crate::rng::{SeedMixer, WorldSeed};
use crate::volume::BlockVolume;

/// Seed purpose for cave streams.
const CAVE_PURPOSE: u64 = 0xCA7E;

/// Carves cross-chunk worm caves.
#[derive(Clone, Debug)]
pub struct CaveCarver {
    mixer: SeedMixer,
    range: i32,
    rarity: u32,
    min_start_y: i32,
    max_start_y: i32,
}

impl CaveCarver {
    /// Longest worm, in steps of one block.
    const MAX_LENGTH: u32 = 64;

    /// Creates a carver for `seed`.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            mixer: SeedMixer::new(seed.derive(CAVE_PURPOSE)),
            range: 5,
            rarity: 7,
            min_start_y: 8,
            max_start_y: 64,
        }
    }

    /// Restricts worm start heights to `[min, max)`.
    #[must_use]
    pub fn with_start_heights(mut self, min: i32, max: i32) -> Self {
        self.min_start_y = min;
        self.max_start_y = max.max(min + 1);
        self
    }

    /// One chunk in `rarity` starts worms (at least 1).
    #[must_use]
    pub fn with_rarity(mut self, rarity: u32) -> Self {
        self.rarity = rarity.max(1);
        self
    }

    /// Carves every worm from `source` that reaches `target`.
    fn carve_from(&self, source: ChunkPos, target: &mut BlockVolume) -> GenResult<usize> {
        let mut rng = self.mixer.generation_rng(source.x, source.z);
        if rng.gen_range(0..self.rarity) != 0 {
            return Ok(0);
        }

        let mut carved = 0;
        let worms = rng.gen_range(1..=3);
        for _ in 0..worms {
            let mut x = f64::from(source.min_block_x()) + rng.gen_range(0.0..16.0);
            let mut y = f64::from(rng.gen_range(self.min_start_y..self.max_start_y));
            let mut z = f64::from(source.min_block_z()) + rng.gen_range(0.0..16.0);
            let mut yaw: f64 = rng.gen_range(0.0..TAU);
            let mut pitch: f64 = rng.gen_range(-0.25..0.25);
            let length = rng.gen_range(24..=Self::MAX_LENGTH);
            let thickness = rng.gen_range(1.0..3.0);

            for step in 0..length {
                let radius = 1.5 + thickness * (PI * f64::from(step) / f64::from(length)).sin();

                x += yaw.cos() * pitch.cos();
                y += pitch.sin();
                z += yaw.sin() * pitch.cos();
                yaw += rng.gen_range(-0.3..0.3);
                pitch = pitch * 0.7 + rng.gen_range(-0.2..0.2);

                carved += carve_sphere(target, x, y, z, radius)?;
            }
        }

        Ok(carved)
    }
}

impl GenerationPopulator for CaveCarver {
    fn name(&self) -> &str {
        "caves"
    }

    fn populate(&self, ctx: &mut GenerationContext<'_>) -> GenResult<()> {
        let mut carved = 0;
        for dz in -self.range..=self.range {
            for dx in -self.range..=self.range {
                carved += self.carve_from(ctx.chunk.offset(dx, dz), ctx.buffer)?;
            }
        }

        trace!(chunk = %ctx.chunk, carved, "Caves carved");
        Ok(())
    }
}

/// Blocks a cave may remove.
fn is_carvable(block: BlockState) -> bool {
    matches!(
        block,
        BlockState::STONE
            | BlockState::GRASS
            | BlockState::DIRT
            | BlockState::SAND
            | BlockState::GRAVEL
            | BlockState::SANDSTONE
            | BlockState::CLAY
    )
}

/// Clears carvable blocks inside a sphere, clipped to the volume.
///
/// Keeps the bottom layer and never opens a block directly under water.
fn carve_sphere(volume: &mut BlockVolume, cx: f64, cy: f64, cz: f64, radius: f64) -> GenResult<usize> {
    let min = volume.min();
    let max = volume.max();

    let x0 = ((cx - radius).floor() as i32).max(min.x);
    let x1 = ((cx + radius).ceil() as i32).min(max.x - 1);
    let y0 = ((cy - radius).floor() as i32).max(min.y + 1);
    let y1 = ((cy + radius).ceil() as i32).min(max.y - 2);
    let z0 = ((cz - radius).floor() as i32).max(min.z);
    let z1 = ((cz + radius).ceil() as i32).min(max.z - 1);

    if x0 > x1 || y0 > y1 || z0 > z1 {
        return Ok(0);
    }

    let mut carved = 0;
    for x in x0..=x1 {
        let nx = (f64::from(x) + 0.5 - cx) / radius;
        for z in z0..=z1 {
            let nz = (f64::from(z) + 0.5 - cz) / radius;
            for y in y0..=y1 {
                let ny = (f64::from(y) + 0.5 - cy) / radius;
                if nx * nx + ny * ny + nz * nz >= 1.0 {
                    continue;
                }
                if !is_carvable(volume.get(x, y, z)?) || volume.get(x, y + 1, z)?.is_fluid() {
                    continue;
                }
                volume.set(x, y, z, BlockState::AIR)?;
                carved += 1;
            }
        }
    }

    Ok(carved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::SingleBiomeGenerator;
    use crate::biome_field::BiomeField;
    use strata_core::{BiomeId, Vector3i};

    fn carve(carver: &CaveCarver, chunk: ChunkPos) -> BlockVolume {
        let mut volume = BlockVolume::new(Vector3i::new(chunk.min_block_x(), 0, chunk.min_block_z()), 16, 80, 16);
        volume.fill(BlockState::STONE);
        let mut biomes = BiomeField::for_chunk(chunk.min_block_x(), chunk.min_block_z());
        biomes.generate(&SingleBiomeGenerator(BiomeId::PLAINS));
        let mut rng = SeedMixer::new(WorldSeed::new(1)).generation_rng(chunk.x, chunk.z);

        let mut ctx = GenerationContext {
            chunk,
            seed: WorldSeed::new(1),
            buffer: &mut volume,
            biomes: &biomes,
            rng: &mut rng,
            sea_level: 64,
        };
        carver.populate(&mut ctx).unwrap();
        volume
    }

    #[test]
    fn test_sphere_respects_bottom_and_water() {
        let mut volume = BlockVolume::new(Vector3i::ZERO, 8, 8, 8);
        volume.fill(BlockState::STONE);
        volume.set(4, 5, 4, BlockState::WATER).unwrap();

        let carved = carve_sphere(&mut volume, 4.5, 2.5, 4.5, 3.0).unwrap();

        assert!(carved > 0);
        assert_eq!(volume.get(4, 0, 4), Ok(BlockState::STONE));
        assert_eq!(volume.get(4, 4, 4), Ok(BlockState::STONE)); // under water
        assert_eq!(volume.get(4, 2, 4), Ok(BlockState::AIR));
    }

    #[test]
    fn test_sphere_outside_volume_is_noop() {
        let mut volume = BlockVolume::new(Vector3i::ZERO, 4, 4, 4);
        volume.fill(BlockState::STONE);
        assert_eq!(carve_sphere(&mut volume, 100.0, 2.0, 100.0, 3.0), Ok(0));
    }

    #[test]
    fn test_caves_are_deterministic() {
        let carver = CaveCarver::new(WorldSeed::new(77));
        let a = carve(&carver, ChunkPos::new(3, -2));
        let b = carve(&CaveCarver::new(WorldSeed::new(77)), ChunkPos::new(3, -2));
        assert_eq!(a.blocks(), b.blocks());
    }

    #[test]
    fn test_caves_open_some_air_somewhere() {
        let carver = CaveCarver::new(WorldSeed::new(2024)).with_rarity(1);
        let volume = carve(&carver, ChunkPos::new(0, 0));
        assert!(volume.blocks().iter().any(|b| b.is_air()));
    }

    #[test]
    fn test_caves_match_across_seam() {
        // Carving a wider volume once must equal carving each chunk alone
        let carver = CaveCarver::new(WorldSeed::new(9)).with_rarity(1);
        let left = carve(&carver, ChunkPos::new(0, 0));
        let right = carve(&carver, ChunkPos::new(1, 0));

        let mut wide = BlockVolume::new(Vector3i::ZERO, 32, 80, 16);
        wide.fill(BlockState::STONE);
        for dz in -5..=5 {
            for dx in -5..=6 {
                carver.carve_from(ChunkPos::new(dx, dz), &mut wide).unwrap();
            }
        }

        for y in 1..78 {
            for z in 0..16 {
                assert_eq!(wide.get(15, y, z), left.get(15, y, z));
                assert_eq!(wide.get(16, y, z), right.get(16, y, z));
            }
        }
    }
}
