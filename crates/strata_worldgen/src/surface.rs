//! # Surface Layering
//!
//! Replaces the top of each solid mass in a column with the column's
//! biome ground cover (grass over dirt, sand over sandstone, ...).
//!
//! ## Column Walk
//!
//! Each column is scanned top to bottom. Air resets the walk, so every
//! separate solid mass (floating island, overhang, cave ceiling) gets its
//! own cover. Only the configured solid marker is ever replaced; water,
//! bedrock and anything a custom generator placed are left alone.
//!
//! At the first marker block after air, layer 0 decides:
//!
//! | Case                         | Result                                   |
//! |------------------------------|------------------------------------------|
//! | depth ≤ 0                    | nothing; the next block is a new top     |
//! | y ≥ sea − 1                  | place layer 0, continue with layer 1     |
//! | y < sea − 7 − depth          | place loose sediment, stop until air     |
//! | otherwise                    | continue with layer 1 from this block    |
//!
//! In the last case layer 1 starts at the current Y and fills exactly its
//! depth; there is no extra block for the top. When a layer runs out, any
//! following layer with depth ≤ 0 at that Y is skipped and the walk moves
//! on to the next layer with positive depth. The mass is finished only
//! when no such layer remains.

use std::fmt;
use std::sync::Arc;

use strata_core::{BiomeId, BlockState, ChunkPos, CHUNK_WIDTH, COLUMNS_PER_CHUNK};

use crate::biome_field::BiomeField;
use crate::config::GeneratorConfig;
use crate::error::GenResult;
use crate::noise::SimplexNoise;
use crate::rng::WorldSeed;
use crate::settings::BiomeGenerationSettings;
use crate::volume::BlockVolume;

/// Seed purpose for the stone noise channel.
const STONE_NOISE_PURPOSE: u64 = 0x5707;
/// Octaves of stone noise.
const STONE_NOISE_OCTAVES: u32 = 4;
/// Stone noise is scaled to roughly [-3, 3].
const STONE_NOISE_AMPLITUDE: f64 = 3.0;
/// Below `sea_level - DEEP_WATER_MARGIN - depth` the top becomes sediment.
const DEEP_WATER_MARGIN: i32 = 7;

type BlockFn = dyn Fn(f64) -> BlockState + Send + Sync;
type DepthFn = dyn Fn(f64, i32) -> i32 + Send + Sync;

/// One layer of a biome's ground cover.
///
/// Both the block and the depth may vary with the column's stone noise;
/// depth may also vary with the Y it is evaluated at.
#[derive(Clone)]
pub struct GroundCoverLayer {
    block: Arc<BlockFn>,
    depth: Arc<DepthFn>,
    fixed: Option<(BlockState, i32)>,
}

impl GroundCoverLayer {
    /// A layer whose block and depth are computed per column.
    pub fn new<B, D>(block: B, depth: D) -> Self
    where
        B: Fn(f64) -> BlockState + Send + Sync + 'static,
        D: Fn(f64, i32) -> i32 + Send + Sync + 'static,
    {
        Self {
            block: Arc::new(block),
            depth: Arc::new(depth),
            fixed: None,
        }
    }

    /// A layer with a constant block and depth.
    #[must_use]
    pub fn fixed(block: BlockState, depth: i32) -> Self {
        Self {
            block: Arc::new(move |_| block),
            depth: Arc::new(move |_, _| depth),
            fixed: Some((block, depth)),
        }
    }

    /// Block placed for a column with the given stone noise.
    #[inline]
    #[must_use]
    pub fn block_for(&self, noise: f64) -> BlockState {
        (self.block)(noise)
    }

    /// Layer thickness for a column evaluated at height `y`.
    #[inline]
    #[must_use]
    pub fn depth_at(&self, noise: f64, y: i32) -> i32 {
        (self.depth)(noise, y)
    }

    /// The constant block and depth, for layers built with [`Self::fixed`].
    #[must_use]
    pub const fn as_fixed(&self) -> Option<(BlockState, i32)> {
        self.fixed
    }
}

impl fmt::Debug for GroundCoverLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fixed {
            Some((block, depth)) => write!(f, "GroundCoverLayer({block} x{depth})"),
            None => f.write_str("GroundCoverLayer(dynamic)"),
        }
    }
}

/// Per-chunk stone noise, one value per column, `[z][x]`.
///
/// Computed fresh for every chunk call.
#[derive(Clone, Debug)]
pub struct StoneNoise([f64; COLUMNS_PER_CHUNK]);

impl StoneNoise {
    /// Noise for a local column.
    #[inline]
    #[must_use]
    pub fn at(&self, x: usize, z: usize) -> f64 {
        self.0[z * CHUNK_WIDTH + x]
    }

    /// Uniform noise; used where no noise channel exists.
    #[must_use]
    pub const fn constant(value: f64) -> Self {
        Self([value; COLUMNS_PER_CHUNK])
    }
}

/// Where the column walk is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Walk {
    /// Waiting for the top of the next solid mass.
    Searching,
    /// Placing `block` for `remaining` more marker blocks.
    Layering {
        index: usize,
        remaining: i32,
        block: BlockState,
    },
    /// Cover for this mass is done; wait for air.
    Exhausted,
}

/// Applies biome ground cover to a generated volume.
#[derive(Clone, Debug)]
pub struct SurfaceLayerer {
    noise: SimplexNoise,
    scale: f64,
    solid_marker: BlockState,
    loose_sediment: BlockState,
    sea_level: i32,
}

impl SurfaceLayerer {
    /// Builds the layerer for a world.
    ///
    /// # Errors
    ///
    /// `UnknownBlock` if the configured marker or sediment do not resolve.
    pub fn new(seed: WorldSeed, config: &GeneratorConfig) -> GenResult<Self> {
        Ok(Self {
            noise: SimplexNoise::new(seed.derive(STONE_NOISE_PURPOSE)),
            scale: config.surface.stone_noise_scale,
            solid_marker: config.solid_marker()?,
            loose_sediment: config.loose_sediment()?,
            sea_level: config.sea_level,
        })
    }

    /// The block treated as replaceable solid.
    #[must_use]
    pub const fn solid_marker(&self) -> BlockState {
        self.solid_marker
    }

    /// Computes the stone noise for one chunk.
    #[must_use]
    pub fn stone_noise(&self, chunk: ChunkPos) -> StoneNoise {
        let mut values = [0.0; COLUMNS_PER_CHUNK];
        self.noise.fill_region(
            &mut values,
            chunk.min_block_x(),
            chunk.min_block_z(),
            CHUNK_WIDTH,
            CHUNK_WIDTH,
            self.scale,
            STONE_NOISE_OCTAVES,
        );
        for value in &mut values {
            *value *= STONE_NOISE_AMPLITUDE;
        }
        StoneNoise(values)
    }

    /// Applies ground cover to every column of a chunk-sized volume.
    ///
    /// `settings_for` is asked once per distinct biome.
    ///
    /// # Errors
    ///
    /// Propagates biome field, settings and buffer errors.
    pub fn apply<F>(&self, volume: &mut BlockVolume, biomes: &BiomeField, noise: &StoneNoise, settings_for: F) -> GenResult<()>
    where
        F: Fn(BiomeId) -> GenResult<Arc<BiomeGenerationSettings>>,
    {
        let min = volume.min();
        let mut resolved: Vec<(BiomeId, Arc<BiomeGenerationSettings>)> = Vec::new();

        for dz in 0..CHUNK_WIDTH {
            for dx in 0..CHUNK_WIDTH {
                let (x, z) = (min.x + dx as i32, min.z + dz as i32);
                let biome = biomes.biome_at(x, z)?;

                let settings = match resolved.iter().find(|(b, _)| *b == biome) {
                    Some((_, settings)) => Arc::clone(settings),
                    None => {
                        let settings = settings_for(biome)?;
                        resolved.push((biome, Arc::clone(&settings)));
                        settings
                    }
                };

                self.cover_column(volume, x, z, noise.at(dx, dz), settings.ground_cover())?;
            }
        }

        Ok(())
    }

    /// Applies `layers` to one column.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` if the column is not inside `volume`.
    pub fn cover_column(
        &self,
        volume: &mut BlockVolume,
        x: i32,
        z: i32,
        noise: f64,
        layers: &[GroundCoverLayer],
    ) -> GenResult<()> {
        if layers.is_empty() {
            return Ok(());
        }

        let bottom = volume.min().y;
        let top = volume.max().y - 1;
        let mut walk = Walk::Searching;

        for y in (bottom..=top).rev() {
            let current = volume.get(x, y, z)?;

            if current.is_air() {
                walk = Walk::Searching;
                continue;
            }
            if current != self.solid_marker {
                continue;
            }

            walk = match walk {
                Walk::Searching => self.begin_mass(volume, x, y, z, noise, layers)?,
                Walk::Layering { index, remaining, block } => {
                    Self::place(volume, x, y, z, noise, layers, index, remaining, block)?
                }
                Walk::Exhausted => Walk::Exhausted,
            };
        }

        Ok(())
    }

    /// Handles the topmost marker block of a solid mass.
    fn begin_mass(
        &self,
        volume: &mut BlockVolume,
        x: i32,
        y: i32,
        z: i32,
        noise: f64,
        layers: &[GroundCoverLayer],
    ) -> GenResult<Walk> {
        let first = &layers[0];
        let block = first.block_for(noise);
        let depth = first.depth_at(noise, y);

        if depth <= 0 {
            return Ok(Walk::Searching);
        }

        if y >= self.sea_level - 1 {
            volume.set(x, y, z, block)?;
            return Ok(Self::next_layer(layers, 0, noise, y - 1));
        }

        if y < self.sea_level - DEEP_WATER_MARGIN - depth {
            volume.set(x, y, z, self.loose_sediment)?;
            return Ok(Walk::Exhausted);
        }

        match Self::next_layer(layers, 0, noise, y) {
            Walk::Layering { index, remaining, block } => {
                Self::place(volume, x, y, z, noise, layers, index, remaining, block)
            }
            other => Ok(other),
        }
    }

    /// Places one block of the current layer, advancing when it runs out.
    #[allow(clippy::too_many_arguments)]
    fn place(
        volume: &mut BlockVolume,
        x: i32,
        y: i32,
        z: i32,
        noise: f64,
        layers: &[GroundCoverLayer],
        index: usize,
        remaining: i32,
        block: BlockState,
    ) -> GenResult<Walk> {
        volume.set(x, y, z, block)?;

        let remaining = remaining - 1;
        if remaining > 0 {
            Ok(Walk::Layering { index, remaining, block })
        } else {
            Ok(Self::next_layer(layers, index, noise, y - 1))
        }
    }

    /// The first layer after `index` with positive depth at `y`.
    fn next_layer(layers: &[GroundCoverLayer], index: usize, noise: f64, y: i32) -> Walk {
        layers
            .iter()
            .enumerate()
            .skip(index + 1)
            .find_map(|(i, layer)| {
                let remaining = layer.depth_at(noise, y);
                (remaining > 0).then(|| Walk::Layering {
                    index: i,
                    remaining,
                    block: layer.block_for(noise),
                })
            })
            .unwrap_or(Walk::Exhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::Vector3i;

    fn layerer(sea_level: i32) -> SurfaceLayerer {
        let config = GeneratorConfig {
            sea_level,
            ..GeneratorConfig::default()
        };
        SurfaceLayerer::new(WorldSeed::new(1), &config).unwrap()
    }

    fn column(blocks: &[BlockState]) -> BlockVolume {
        let mut volume = BlockVolume::new(Vector3i::ZERO, 1, blocks.len(), 1);
        for (y, &b) in blocks.iter().enumerate() {
            volume.set(0, y as i32, 0, b).unwrap();
        }
        volume
    }

    fn read(volume: &BlockVolume) -> Vec<BlockState> {
        let (_, height, _) = volume.size();
        (0..height as i32).map(|y| volume.get(0, y, 0).unwrap()).collect()
    }

    fn grass_dirt() -> Vec<GroundCoverLayer> {
        vec![
            GroundCoverLayer::fixed(BlockState::GRASS, 1),
            GroundCoverLayer::fixed(BlockState::DIRT, 3),
        ]
    }

    const S: BlockState = BlockState::STONE;
    const A: BlockState = BlockState::AIR;

    #[test]
    fn test_above_sea_grass_then_dirt() {
        let mut volume = column(&[S, S, S, S, S, S, A, A]);
        layerer(2).cover_column(&mut volume, 0, 0, 0.0, &grass_dirt()).unwrap();

        assert_eq!(
            read(&volume),
            vec![S, S, BlockState::DIRT, BlockState::DIRT, BlockState::DIRT, BlockState::GRASS, A, A]
        );
    }

    #[test]
    fn test_short_column_runs_out_of_blocks() {
        let mut volume = column(&[S, S, S, S, A]);
        layerer(2).cover_column(&mut volume, 0, 0, 0.0, &grass_dirt()).unwrap();

        assert_eq!(
            read(&volume),
            vec![BlockState::DIRT, BlockState::DIRT, BlockState::DIRT, BlockState::GRASS, A]
        );
    }

    #[test]
    fn test_empty_layers_leave_column_untouched() {
        let original = [S, S, A, S, S, A];
        let mut volume = column(&original);
        layerer(2).cover_column(&mut volume, 0, 0, 0.0, &[]).unwrap();

        assert_eq!(read(&volume), original.to_vec());
    }

    #[test]
    fn test_air_gap_restarts_layering() {
        let mut volume = column(&[S, S, S, A, S, S, A]);
        let layers = vec![
            GroundCoverLayer::fixed(BlockState::GRASS, 1),
            GroundCoverLayer::fixed(BlockState::DIRT, 1),
        ];
        layerer(0).cover_column(&mut volume, 0, 0, 0.0, &layers).unwrap();

        assert_eq!(
            read(&volume),
            vec![
                S,
                BlockState::DIRT,
                BlockState::GRASS,
                A,
                BlockState::DIRT,
                BlockState::GRASS,
                A
            ]
        );
    }

    #[test]
    fn test_deep_underwater_gets_sediment_once() {
        // Sea level 30, top solid at 10: 10 < 30 - 7 - 1
        let mut blocks = vec![S; 11];
        blocks.extend(std::iter::repeat(BlockState::WATER).take(19));
        let mut volume = column(&blocks);
        layerer(30).cover_column(&mut volume, 0, 0, 0.0, &grass_dirt()).unwrap();

        let result = read(&volume);
        assert_eq!(result[10], BlockState::GRAVEL);
        assert!(result[..10].iter().all(|&b| b == S));
        assert!(result[11..].iter().all(|&b| b == BlockState::WATER));
    }

    #[test]
    fn test_shallow_underwater_skips_top_layer() {
        // Sea level 10, top at 5: not >= 9, not < 10 - 7 - 1
        let mut volume = column(&[S, S, S, S, S, S, A, A, A, A]);
        layerer(10).cover_column(&mut volume, 0, 0, 0.0, &grass_dirt()).unwrap();

        assert_eq!(
            read(&volume),
            vec![S, S, S, BlockState::DIRT, BlockState::DIRT, BlockState::DIRT, A, A, A, A]
        );
    }

    #[test]
    fn test_zero_depth_top_defers_to_next_block() {
        let layers = vec![
            GroundCoverLayer::new(|_| BlockState::SAND, |_, y| if y >= 4 { 0 } else { 1 }),
            GroundCoverLayer::fixed(BlockState::SANDSTONE, 1),
        ];
        let mut volume = column(&[S, S, S, S, S, A]);
        layerer(0).cover_column(&mut volume, 0, 0, 0.0, &layers).unwrap();

        assert_eq!(
            read(&volume),
            vec![S, S, BlockState::SANDSTONE, BlockState::SAND, S, A]
        );
    }

    #[test]
    fn test_zero_depth_inner_layer_is_passed_over() {
        let layers = vec![
            GroundCoverLayer::fixed(BlockState::GRASS, 1),
            GroundCoverLayer::fixed(BlockState::DIRT, 0),
            GroundCoverLayer::fixed(BlockState::SAND, 2),
        ];
        let mut volume = column(&[S, S, S, S, S, A]);
        layerer(0).cover_column(&mut volume, 0, 0, 0.0, &layers).unwrap();

        assert_eq!(
            read(&volume),
            vec![S, S, BlockState::SAND, BlockState::SAND, BlockState::GRASS, A]
        );
    }

    #[test]
    fn test_only_marker_is_replaced() {
        let mut volume = column(&[S, BlockState::BEDROCK, S, A]);
        layerer(0).cover_column(&mut volume, 0, 0, 0.0, &grass_dirt()).unwrap();

        assert_eq!(read(&volume), vec![BlockState::DIRT, BlockState::BEDROCK, BlockState::GRASS, A]);
    }

    #[test]
    fn test_stone_noise_is_pure() {
        let layerer = layerer(64);
        let a = layerer.stone_noise(ChunkPos::new(3, -2));
        let b = layerer.stone_noise(ChunkPos::new(3, -2));
        assert_eq!(a.at(5, 9), b.at(5, 9));
        assert!(a.at(0, 0).abs() <= STONE_NOISE_AMPLITUDE * 1.5);
    }
}
