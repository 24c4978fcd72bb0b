//! # Scattered Structures
//!
//! Ruins placed on a coarse region grid. Each `spacing × spacing` chunk
//! region holds exactly one candidate start, positioned by an RNG seeded
//! from the world seed and the region coordinates alone. A start's layout
//! therefore never depends on which chunk asked first, and every chunk
//! its footprint crosses carves the same walls.
//!
//! Starts are memoised per region. The memo is only a cache: dropping it
//! and re-deriving yields identical structures.

use std::collections::{BTreeSet, HashMap};

use parking_lot::{Mutex, RwLock};
use rand::Rng;
use strata_core::{BlockState, ChunkPos, Vector3i, CHUNK_WIDTH};
use tracing::trace;

use crate::config::StructureConfig;
use crate::error::{GenError, GenResult};
use crate::populator::{GenerationContext, GenerationPopulator, StructureGenerationPopulator};
use crate::rng::{SeedMixer, WorldSeed};
use crate::volume::BlockVolume;

/// Seed purpose for structure placement.
const STRUCTURE_PURPOSE: u64 = 0x5757_0001;

/// How many regions out `nearest_structure_position` looks.
const SEARCH_REGIONS: i32 = 8;

/// One placed structure: an axis-aligned walled ruin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StructureStart {
    /// Minimum corner; `y` is the floor.
    pub min: Vector3i,
    /// Footprint along X.
    pub size_x: i32,
    /// Footprint along Z.
    pub size_z: i32,
    /// Tallest wall above the floor.
    pub height: i32,
}

impl StructureStart {
    /// Centre of the floor.
    #[must_use]
    pub const fn center(&self) -> Vector3i {
        Vector3i::new(self.min.x + self.size_x / 2, self.min.y, self.min.z + self.size_z / 2)
    }

    /// Returns true if `pos` lies inside the bounding box.
    #[must_use]
    pub const fn contains(&self, pos: Vector3i) -> bool {
        pos.x >= self.min.x
            && pos.x < self.min.x + self.size_x
            && pos.z >= self.min.z
            && pos.z < self.min.z + self.size_z
            && pos.y >= self.min.y
            && pos.y <= self.min.y + self.height
    }

    /// Returns true if the footprint crosses `chunk`.
    #[must_use]
    pub const fn intersects(&self, chunk: ChunkPos) -> bool {
        let (cx, cz) = (chunk.min_block_x(), chunk.min_block_z());
        let width = CHUNK_WIDTH as i32;
        self.min.x < cx + width
            && self.min.x + self.size_x > cx
            && self.min.z < cz + width
            && self.min.z + self.size_z > cz
    }
}

/// Walled ruins, one per region.
pub struct ScatteredStructure {
    mixer: SeedMixer,
    spacing: i32,
    separation: i32,
    floor_y: i32,
    starts: RwLock<HashMap<(i32, i32), StructureStart>>,
    touched: Mutex<BTreeSet<ChunkPos>>,
}

impl ScatteredStructure {
    /// Smallest footprint side.
    const MIN_SIZE: i32 = 7;
    /// Largest footprint side.
    const MAX_SIZE: i32 = 13;

    /// Ruins for `seed` laid out on the configured grid, floors at
    /// `floor_y`.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` unless `spacing > separation >= 0`.
    pub fn new(seed: WorldSeed, config: &StructureConfig, floor_y: i32) -> GenResult<Self> {
        if config.separation < 0 || config.spacing <= config.separation {
            return Err(GenError::InvalidConfig(format!(
                "structure spacing {} must exceed separation {}",
                config.spacing, config.separation
            )));
        }

        Ok(Self {
            mixer: SeedMixer::new(seed.derive(STRUCTURE_PURPOSE)),
            spacing: config.spacing,
            separation: config.separation,
            floor_y,
            starts: RwLock::new(HashMap::new()),
            touched: Mutex::new(BTreeSet::new()),
        })
    }

    /// Region holding `chunk`.
    #[must_use]
    pub const fn region_of(&self, chunk: ChunkPos) -> (i32, i32) {
        (chunk.x.div_euclid(self.spacing), chunk.z.div_euclid(self.spacing))
    }

    /// The start of a region, derived on first use.
    #[must_use]
    pub fn start_in(&self, region: (i32, i32)) -> StructureStart {
        if let Some(start) = self.starts.read().get(&region) {
            return *start;
        }

        let start = self.derive_start(region);
        self.starts.write().entry(region).or_insert(start);
        trace!(region_x = region.0, region_z = region.1, origin = ?start.min, "Structure start derived");
        start
    }

    /// Number of memoised starts.
    #[must_use]
    pub fn memoised_starts(&self) -> usize {
        self.starts.read().len()
    }

    fn derive_start(&self, (rx, rz): (i32, i32)) -> StructureStart {
        let mut rng = self.mixer.generation_rng(rx, rz);
        let span = self.spacing - self.separation;

        let chunk = ChunkPos::new(
            rx * self.spacing + rng.gen_range(0..span),
            rz * self.spacing + rng.gen_range(0..span),
        );
        let width = CHUNK_WIDTH as i32;

        StructureStart {
            min: Vector3i::new(
                chunk.min_block_x() + rng.gen_range(0..width),
                self.floor_y,
                chunk.min_block_z() + rng.gen_range(0..width),
            ),
            size_x: rng.gen_range(Self::MIN_SIZE..=Self::MAX_SIZE),
            size_z: rng.gen_range(Self::MIN_SIZE..=Self::MAX_SIZE),
            height: rng.gen_range(3..=6),
        }
    }

    /// Starts that may cross `chunk`.
    ///
    /// A footprint is at most 13 blocks wide, so only the regions of the
    /// chunk and of its -X/-Z neighbours can reach it.
    fn starts_near(&self, chunk: ChunkPos) -> Vec<StructureStart> {
        let mut regions = BTreeSet::new();
        for dz in -1..=0 {
            for dx in -1..=0 {
                regions.insert(self.region_of(chunk.offset(dx, dz)));
            }
        }

        regions
            .into_iter()
            .map(|region| self.start_in(region))
            .filter(|start| start.intersects(chunk))
            .collect()
    }

    /// Carves the part of `start` that lies inside `volume`.
    fn carve(&self, start: &StructureStart, volume: &mut BlockVolume) -> GenResult<usize> {
        let (min, max) = (volume.min(), volume.max());
        let mut written = 0;

        for z in start.min.z.max(min.z)..(start.min.z + start.size_z).min(max.z) {
            for x in start.min.x.max(min.x)..(start.min.x + start.size_x).min(max.x) {
                let edge = x == start.min.x
                    || z == start.min.z
                    || x == start.min.x + start.size_x - 1
                    || z == start.min.z + start.size_z - 1;
                let wall_top = start.min.y + 1 + (position_hash(x, z) % start.height as u32) as i32;

                for y in start.min.y.max(min.y)..=(start.min.y + start.height).min(max.y - 1) {
                    let block = if y == start.min.y || (edge && y < wall_top) {
                        brick_at(x, y, z)
                    } else {
                        BlockState::AIR
                    };
                    volume.set(x, y, z, block)?;
                    written += 1;
                }
            }
        }

        Ok(written)
    }
}

/// Stable per-column hash for wall heights and moss.
const fn position_hash(x: i32, z: i32) -> u32 {
    let mut h = (x as u32).wrapping_mul(0x9E37_79B1) ^ (z as u32).wrapping_mul(0x85EB_CA77);
    h ^= h >> 15;
    h = h.wrapping_mul(0x2C1B_3C6D);
    h ^ (h >> 12)
}

fn brick_at(x: i32, y: i32, z: i32) -> BlockState {
    if position_hash(x ^ y.rotate_left(7), z) % 3 == 0 {
        BlockState::MOSSY_STONE_BRICKS
    } else {
        BlockState::STONE_BRICKS
    }
}

impl GenerationPopulator for ScatteredStructure {
    fn name(&self) -> &str {
        "ruins"
    }

    fn populate(&self, ctx: &mut GenerationContext<'_>) -> GenResult<()> {
        for start in self.starts_near(ctx.chunk) {
            let written = self.carve(&start, ctx.buffer)?;
            if written > 0 {
                self.touched.lock().insert(ctx.chunk);
            }
        }
        Ok(())
    }

    fn as_structure(&self) -> Option<&dyn StructureGenerationPopulator> {
        Some(self)
    }
}

impl StructureGenerationPopulator for ScatteredStructure {
    fn place_if_eligible(&self, chunk: ChunkPos) -> bool {
        let overlaps = !self.starts_near(chunk).is_empty();
        if overlaps {
            self.touched.lock().insert(chunk);
        }
        overlaps
    }

    fn is_inside_structure(&self, pos: Vector3i) -> bool {
        self.starts_near(pos.chunk()).iter().any(|start| start.contains(pos))
    }

    fn nearest_structure_position(&self, origin: Vector3i) -> Option<Vector3i> {
        let (ox, oz) = self.region_of(origin.chunk());
        let region_blocks = i64::from(self.spacing) * CHUNK_WIDTH as i64;
        let mut best: Option<(i64, Vector3i)> = None;

        for ring in 0..=SEARCH_REGIONS {
            // Anything on this ring is at least (ring - 1) regions away
            if let Some((dist_sq, _)) = best {
                let floor = i64::from(ring - 1).max(0) * region_blocks;
                if floor * floor > dist_sq {
                    break;
                }
            }

            for dz in -ring..=ring {
                for dx in -ring..=ring {
                    if dx.abs() != ring && dz.abs() != ring {
                        continue;
                    }
                    let center = self.start_in((ox + dx, oz + dz)).center();
                    let dist_sq = center.horizontal_distance_sq(origin);
                    if best.map_or(true, |(d, _)| dist_sq < d) {
                        best = Some((dist_sq, center));
                    }
                }
            }
        }

        best.map(|(_, pos)| pos)
    }

    fn touched_chunks(&self) -> Vec<ChunkPos> {
        self.touched.lock().iter().copied().collect()
    }

    fn take_touched_chunks(&self) -> Vec<ChunkPos> {
        std::mem::take(&mut *self.touched.lock()).into_iter().collect()
    }
}

impl std::fmt::Debug for ScatteredStructure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScatteredStructure")
            .field("spacing", &self.spacing)
            .field("separation", &self.separation)
            .field("floor_y", &self.floor_y)
            .finish_non_exhaustive()
    }
}
