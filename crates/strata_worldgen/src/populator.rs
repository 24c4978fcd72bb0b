//! # Strategy Traits
//!
//! The pluggable pieces of the pipeline and the contexts they run with.
//!
//! - [`GenerationPopulator`]: runs during generation on one chunk's
//!   block volume (caves, bedrock, structures).
//! - [`Populator`]: runs during decoration on the padded soft buffer
//!   (ores, trees, lakes, snow).
//! - [`StructureGenerationPopulator`]: a generation populator that also
//!   answers structure queries.
//!
//! Strategies are shared between threads, so they hold no per-call
//! state: everything mutable arrives through the context.

use std::fmt;
use std::sync::Arc;

use strata_core::{BiomeId, ChunkPos, Vector3i};

use crate::biome_field::BiomeField;
use crate::error::GenResult;
use crate::rng::{ChunkRng, WorldSeed};
use crate::volume::{BlockVolume, SoftBuffer};

/// Identifies a populator for events, timing and error reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PopulatorKind(&'static str);

impl PopulatorKind {
    /// Ore veins.
    pub const ORE: Self = Self("ore");
    /// Trees.
    pub const TREE: Self = Self("tree");
    /// Surface lakes.
    pub const LAKE: Self = Self("lake");
    /// Snow cover and ice.
    pub const SNOW: Self = Self("snow");
    /// The decoration step of a wrapped legacy generator.
    pub const LEGACY: Self = Self("legacy");

    /// A kind for host-defined populators.
    #[must_use]
    pub const fn custom(name: &'static str) -> Self {
        Self(name)
    }

    /// The kind's name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for PopulatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Everything a generation populator may see and touch for one chunk.
pub struct GenerationContext<'a> {
    /// The chunk being generated.
    pub chunk: ChunkPos,
    /// The world seed.
    pub seed: WorldSeed,
    /// The chunk's block volume, absolute coordinates.
    pub buffer: &'a mut BlockVolume,
    /// The chunk's biomes.
    pub biomes: &'a BiomeField,
    /// The chunk's generation RNG.
    pub rng: &'a mut ChunkRng,
    /// Y of the sea surface.
    pub sea_level: i32,
}

impl fmt::Debug for GenerationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationContext")
            .field("chunk", &self.chunk)
            .field("seed", &self.seed)
            .field("sea_level", &self.sea_level)
            .finish_non_exhaustive()
    }
}

/// Read-only view over the structure populators registered globally.
#[derive(Clone, Copy)]
pub struct Structures<'a> {
    populators: &'a [Arc<dyn GenerationPopulator>],
}

impl<'a> Structures<'a> {
    /// Wraps a generation populator list; non-structures are ignored.
    #[must_use]
    pub const fn new(populators: &'a [Arc<dyn GenerationPopulator>]) -> Self {
        Self { populators }
    }

    /// A view with no structures.
    #[must_use]
    pub const fn none() -> Self {
        Self { populators: &[] }
    }

    /// Iterates the structure populators.
    pub fn iter(&self) -> impl Iterator<Item = &'a dyn StructureGenerationPopulator> + 'a {
        let populators = self.populators;
        populators.iter().filter_map(|p| p.as_structure())
    }

    /// Returns true if any structure occupies `pos`.
    #[must_use]
    pub fn is_inside(&self, pos: Vector3i) -> bool {
        self.iter().any(|s| s.is_inside_structure(pos))
    }

    /// Nearest structure start to `origin` across all structure kinds.
    #[must_use]
    pub fn nearest(&self, origin: Vector3i) -> Option<Vector3i> {
        self.iter()
            .filter_map(|s| s.nearest_structure_position(origin))
            .min_by_key(|p| p.horizontal_distance_sq(origin))
    }
}

impl fmt::Debug for Structures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Structures").field("count", &self.iter().count()).finish()
    }
}

/// Everything a decoration populator may see and touch.
pub struct DecorationContext<'a> {
    /// The chunk being decorated.
    pub chunk: ChunkPos,
    /// The world seed.
    pub seed: WorldSeed,
    /// The padded buffer; writes outside it fail.
    pub buffer: &'a mut SoftBuffer,
    /// The dominant biome of the target chunk.
    pub biome: BiomeId,
    /// The chunk's decoration RNG.
    pub rng: &'a mut ChunkRng,
    /// Y of the sea surface.
    pub sea_level: i32,
    /// Structure queries.
    pub structures: Structures<'a>,
}

impl fmt::Debug for DecorationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecorationContext")
            .field("chunk", &self.chunk)
            .field("biome", &self.biome)
            .field("sea_level", &self.sea_level)
            .finish_non_exhaustive()
    }
}

/// A mutation applied to a chunk's volume during generation.
pub trait GenerationPopulator: Send + Sync {
    /// Name used in logs and error reports.
    fn name(&self) -> &str;

    /// Mutates `ctx.buffer`.
    ///
    /// # Errors
    ///
    /// Any error aborts generation of the chunk.
    fn populate(&self, ctx: &mut GenerationContext<'_>) -> GenResult<()>;

    /// Returns the structure view of this populator, if it is one.
    fn as_structure(&self) -> Option<&dyn StructureGenerationPopulator> {
        None
    }
}

/// A feature placed during decoration.
pub trait Populator: Send + Sync {
    /// The populator's kind.
    fn kind(&self) -> PopulatorKind;

    /// Snow-like populators run after everything else.
    fn is_snow_like(&self) -> bool {
        self.kind() == PopulatorKind::SNOW
    }

    /// Places features into `ctx.buffer`.
    ///
    /// # Errors
    ///
    /// Any error aborts the decoration pass; earlier writes are kept.
    fn populate(&self, ctx: &mut DecorationContext<'_>) -> GenResult<()>;
}

/// A generation populator that places large cross-chunk structures.
///
/// Structure layout must be a pure function of the seed, so the same
/// structure is carved identically from whichever chunk reaches it.
pub trait StructureGenerationPopulator: GenerationPopulator {
    /// Records that `chunk` is being decorated; returns true if any
    /// structure overlaps it.
    fn place_if_eligible(&self, chunk: ChunkPos) -> bool;

    /// Returns true if a structure occupies `pos`.
    fn is_inside_structure(&self, pos: Vector3i) -> bool;

    /// The structure start nearest to `origin` within search range.
    fn nearest_structure_position(&self, origin: Vector3i) -> Option<Vector3i>;

    /// Chunks this populator has written to so far, sorted.
    fn touched_chunks(&self) -> Vec<ChunkPos>;

    /// Returns the touched chunks, sorted, and forgets them. The host
    /// calls this once it has re-lit or re-decorated them.
    fn take_touched_chunks(&self) -> Vec<ChunkPos>;
}
