//! # Chunk Decoration
//!
//! Decorating chunk `(x, z)` works on a 16×16 region offset by half a
//! chunk, so the region straddles the seams with the +X, +Z and +X+Z
//! neighbours. Those four chunks are the working set; all must exist.
//!
//! ```text
//!   z ▲
//!     │ ┌─────────┬─────────┐
//!     │ │ (x,z+1) │(x+1,z+1)│
//!     │ │    ┌────┼────┐    │   inner square: core region
//!     │ ├────┼────┼────┼────┤   outer square: core + soft pad
//!     │ │    └────┼────┘    │
//!     │ │  (x,z)  │ (x+1,z) │
//!     │ └─────────┴─────────┘
//!     └──────────────────────► x
//! ```
//!
//! Blocks are gathered from the working set into a [`SoftBuffer`],
//! populators run against it, and the buffer is scattered back into the
//! chunks it touched. Writes beyond the pad fail with `OutOfBounds` and
//! never reach any chunk.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use strata_core::{post_and_check, BiomeId, ChunkPos, Vector3i, CHUNK_WIDTH};
use tracing::{debug, trace, warn};

use crate::chunk::{ChunkAccess, DecorationState};
use crate::error::{GenError, GenResult};
use crate::events::{DecorationHooks, PopulateEvent, PostDecorateEvent, PreDecorateEvent};
use crate::generator::GeneratorCore;
use crate::ordering::effective_populators;
use crate::pipeline::timings::PopulatorTimings;
use crate::populator::{DecorationContext, Populator, PopulatorKind};
use crate::volume::SoftBuffer;

/// What one decoration pass did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecorationReport {
    /// The decorated chunk.
    pub chunk: ChunkPos,
    /// Its dominant biome.
    pub biome: BiomeId,
    /// Populators that ran, in order.
    pub applied: Vec<PopulatorKind>,
    /// Populators removed by the pre hook or vetoed by the populate hook.
    pub skipped: Vec<PopulatorKind>,
    /// Wall time of each applied populator, in run order.
    pub timings: Vec<(PopulatorKind, Duration)>,
    /// Chunks that received writes, sorted.
    pub touched: Vec<ChunkPos>,
    /// Chunks carved so far by structures overlapping this chunk, sorted.
    /// May lie outside the working set.
    pub structures_touched: Vec<ChunkPos>,
    /// Whether a wrapped legacy generator's decoration ran.
    pub legacy_decorated: bool,
}

/// Result of [`ChunkDecorationPipeline::decorate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecorationOutcome {
    /// The pre-decoration hook vetoed the chunk; nothing was written.
    Cancelled,
    /// The chunk was already fully decorated; nothing was written.
    AlreadyDecorated,
    /// The pass ran to the end.
    Completed(DecorationReport),
}

/// Decorates generated chunks.
pub struct ChunkDecorationPipeline {
    core: Arc<GeneratorCore>,
    hooks: DecorationHooks,
    timings: PopulatorTimings,
}

impl ChunkDecorationPipeline {
    /// A pipeline over `core` with no hooks.
    #[must_use]
    pub fn new(core: Arc<GeneratorCore>) -> Self {
        Self::with_hooks(core, DecorationHooks::none())
    }

    /// A pipeline posting to `hooks`.
    #[must_use]
    pub fn with_hooks(core: Arc<GeneratorCore>, hooks: DecorationHooks) -> Self {
        Self {
            core,
            hooks,
            timings: PopulatorTimings::new(),
        }
    }

    /// The generator this pipeline runs.
    #[must_use]
    pub const fn core(&self) -> &Arc<GeneratorCore> {
        &self.core
    }

    /// Cumulative per-populator timings.
    #[must_use]
    pub const fn timings(&self) -> &PopulatorTimings {
        &self.timings
    }

    /// Chunks that must exist before `chunk` can be decorated.
    #[must_use]
    pub fn working_set(chunk: ChunkPos) -> [ChunkPos; 4] {
        [chunk, chunk.offset(1, 0), chunk.offset(0, 1), chunk.offset(1, 1)]
    }

    /// Decorates chunk `(x, z)`.
    ///
    /// On success the chunk is flagged `Decorated`. If a populator fails,
    /// writes made so far are committed, the chunk is flagged `Partial`
    /// and the error is returned.
    ///
    /// # Errors
    ///
    /// `MissingNeighbor` if the working set is incomplete, settings
    /// errors for the dominant biome, or `GenError::Decoration` wrapping
    /// a populator failure.
    pub fn decorate<A: ChunkAccess + ?Sized>(&self, access: &mut A, x: i32, z: i32) -> GenResult<DecorationOutcome> {
        let target = ChunkPos::new(x, z);
        let working_set = Self::working_set(target);

        for pos in working_set {
            if access.chunk(pos).is_none() {
                return Err(GenError::MissingNeighbor(pos));
            }
        }
        let target_chunk = access.chunk(target).ok_or(GenError::MissingNeighbor(target))?;
        if target_chunk.decoration_state() == DecorationState::Decorated {
            trace!(chunk = %target, "Already decorated");
            return Ok(DecorationOutcome::AlreadyDecorated);
        }
        let height = target_chunk.height();

        let core = &*self.core;
        let config = core.config();
        let half = (CHUNK_WIDTH / 2) as i32;

        // Dominant biome
        let offset = config.decoration.biome_sample_offset;
        let biome = target_chunk.biome(offset as usize, offset as usize);
        let settings = core.settings().get(biome)?;

        let populators = effective_populators(core.populators(), settings.populators());
        let mut pre = PreDecorateEvent::new(target, biome, populators.iter().map(|p| p.kind()).collect());
        if !post_and_check(self.hooks.pre(), &mut pre) {
            debug!(chunk = %target, "Decoration cancelled by hook");
            return Ok(DecorationOutcome::Cancelled);
        }
        let mut skipped = Vec::new();
        let populators = retain_listed(populators, &pre.populators, &mut skipped);

        let core_min = Vector3i::new(target.min_block_x() + half, 0, target.min_block_z() + half);
        let mut soft = SoftBuffer::new(core_min, CHUNK_WIDTH, height, config.soft_pad);
        gather(access, &mut soft, &working_set)?;

        let structures = core.structures();
        let mut structures_touched = BTreeSet::new();
        for structure in structures.iter() {
            if structure.place_if_eligible(target) {
                structures_touched.extend(structure.touched_chunks());
            }
        }
        if !structures_touched.is_empty() {
            debug!(chunk = %target, chunks = ?structures_touched, "Structures overlap chunk");
        }

        let mut rng = core.mixer().decoration_rng(x, z);
        let mut applied = Vec::with_capacity(populators.len());
        let mut timings = Vec::with_capacity(populators.len());
        let mut legacy_decorated = false;

        let failure = {
            let mut ctx = DecorationContext {
                chunk: target,
                seed: core.seed(),
                buffer: &mut soft,
                biome,
                rng: &mut rng,
                sea_level: config.sea_level,
                structures,
            };

            let mut failure = None;
            for populator in &populators {
                let kind = populator.kind();
                let mut event = PopulateEvent::new(target, kind);
                if !post_and_check(self.hooks.populate(), &mut event) {
                    trace!(chunk = %target, populator = %kind, "Populator vetoed");
                    skipped.push(kind);
                    continue;
                }

                let started = Instant::now();
                let result = populator.populate(&mut ctx);
                let elapsed = started.elapsed();
                self.timings.record(kind, elapsed);

                if let Err(source) = result {
                    failure = Some((kind, source));
                    break;
                }
                trace!(chunk = %target, populator = %kind, elapsed_us = elapsed.as_micros() as u64, "Populator applied");
                applied.push(kind);
                timings.push((kind, elapsed));
            }

            let base = core.base_generator();
            if failure.is_none() && base.capabilities().wraps_legacy {
                let started = Instant::now();
                match base.legacy_decorate(&mut ctx) {
                    Ok(()) => {
                        let elapsed = started.elapsed();
                        self.timings.record(PopulatorKind::LEGACY, elapsed);
                        timings.push((PopulatorKind::LEGACY, elapsed));
                        legacy_decorated = true;
                    }
                    Err(source) => failure = Some((PopulatorKind::LEGACY, source)),
                }
            }

            failure
        };

        scatter(access, &soft, &working_set)?;
        let touched: Vec<ChunkPos> = soft.touched_chunks().iter().copied().collect();

        if let Some((populator, source)) = failure {
            set_state(access, target, DecorationState::Partial);
            warn!(chunk = %target, populator = %populator, error = %source, "Decoration aborted");
            return Err(GenError::Decoration {
                chunk: target,
                populator,
                source: Box::new(source),
            });
        }

        set_state(access, target, DecorationState::Decorated);
        self.hooks.post().post(&mut PostDecorateEvent {
            chunk: target,
            applied: applied.clone(),
        });
        debug!(
            chunk = %target,
            biome = %biome,
            applied = applied.len(),
            skipped = skipped.len(),
            touched = touched.len(),
            "Chunk decorated"
        );

        Ok(DecorationOutcome::Completed(DecorationReport {
            chunk: target,
            biome,
            applied,
            skipped,
            timings,
            touched,
            structures_touched: structures_touched.into_iter().collect(),
            legacy_decorated,
        }))
    }
}

/// Keeps the populators the pre hook left listed, in run order.
///
/// Each listed kind admits one populator of that kind; the rest are
/// pushed to `dropped`. Kinds the hook added or reordered have no effect.
fn retain_listed(
    populators: Vec<Arc<dyn Populator>>,
    listed: &[PopulatorKind],
    dropped: &mut Vec<PopulatorKind>,
) -> Vec<Arc<dyn Populator>> {
    let mut remaining = listed.to_vec();
    populators
        .into_iter()
        .filter(|populator| {
            let kind = populator.kind();
            match remaining.iter().position(|k| *k == kind) {
                Some(index) => {
                    remaining.swap_remove(index);
                    true
                }
                None => {
                    trace!(populator = %kind, "Populator removed by pre hook");
                    dropped.push(kind);
                    false
                }
            }
        })
        .collect()
}

impl std::fmt::Debug for ChunkDecorationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkDecorationPipeline")
            .field("core", &self.core)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

/// Block-space overlap of a chunk with the soft buffer, as
/// `(x0, x1, z0, z1)` half-open ranges.
fn overlap(soft: &SoftBuffer, pos: ChunkPos) -> Option<(i32, i32, i32, i32)> {
    let (min, max) = (soft.min(), soft.max());
    let width = CHUNK_WIDTH as i32;
    let x0 = min.x.max(pos.min_block_x());
    let x1 = max.x.min(pos.min_block_x() + width);
    let z0 = min.z.max(pos.min_block_z());
    let z1 = max.z.min(pos.min_block_z() + width);
    (x0 < x1 && z0 < z1).then_some((x0, x1, z0, z1))
}

/// Copies every spanned chunk's overlap into the buffer.
fn gather<A: ChunkAccess + ?Sized>(access: &A, soft: &mut SoftBuffer, working_set: &[ChunkPos]) -> GenResult<()> {
    for pos in soft.spanned_chunks() {
        if !working_set.contains(&pos) {
            return Err(GenError::MissingNeighbor(pos));
        }
        let chunk = access.chunk(pos).ok_or(GenError::MissingNeighbor(pos))?;
        let Some((x0, x1, z0, z1)) = overlap(soft, pos) else {
            continue;
        };

        let lx0 = (x0 - pos.min_block_x()) as usize;
        let lx1 = (x1 - pos.min_block_x()) as usize;
        let height = soft.max().y.min(chunk.height() as i32);
        for y in 0..height {
            for z in z0..z1 {
                let lz = (z - pos.min_block_z()) as usize;
                let Some(row) = chunk.row(y as usize, lz) else {
                    continue;
                };
                soft.volume_mut().write_row(x0, y, z, &row[lx0..lx1])?;
            }
        }
    }
    Ok(())
}

/// Copies the buffer back into every chunk it wrote to.
fn scatter<A: ChunkAccess + ?Sized>(access: &mut A, soft: &SoftBuffer, working_set: &[ChunkPos]) -> GenResult<()> {
    for &pos in soft.touched_chunks() {
        if !working_set.contains(&pos) {
            return Err(GenError::MissingNeighbor(pos));
        }
        let Some((x0, x1, z0, z1)) = overlap(soft, pos) else {
            continue;
        };
        let chunk = access.chunk_mut(pos).ok_or(GenError::MissingNeighbor(pos))?;

        let lx0 = (x0 - pos.min_block_x()) as usize;
        let lx1 = (x1 - pos.min_block_x()) as usize;
        let height = soft.max().y.min(chunk.height() as i32);
        for y in 0..height {
            for z in z0..z1 {
                let lz = (z - pos.min_block_z()) as usize;
                let src = soft.volume().row(x0, y, z, lx1 - lx0)?;
                if let Some(row) = chunk.row_mut(y as usize, lz) {
                    row[lx0..lx1].copy_from_slice(src);
                }
            }
        }
    }
    Ok(())
}

fn set_state<A: ChunkAccess + ?Sized>(access: &mut A, pos: ChunkPos, state: DecorationState) {
    if let Some(chunk) = access.chunk_mut(pos) {
        chunk.set_decoration_state(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::biome::SingleBiomeGenerator;
    use crate::chunk::Chunk;
    use crate::config::GeneratorConfig;
    use crate::generator::WorldGenerator;
    use crate::pipeline::ChunkGenerationPipeline;
    use crate::populator::Populator;
    use crate::rng::WorldSeed;
    use crate::terrain::FlatTerrainGenerator;
    use strata_core::BlockState;

    /// Writes a marker at a fixed offset from the core corner.
    struct Stamp {
        kind: PopulatorKind,
        dx: i32,
        fail: bool,
    }

    impl Populator for Stamp {
        fn kind(&self) -> PopulatorKind {
            self.kind
        }

        fn populate(&self, ctx: &mut DecorationContext<'_>) -> GenResult<()> {
            let core = ctx.buffer.core_min();
            ctx.buffer.set_block(core.x + self.dx, 10, core.z, BlockState::LOG)?;
            if self.fail {
                return Err(GenError::Populator("stamp failed".into()));
            }
            Ok(())
        }
    }

    fn setup(populators: Vec<Arc<dyn Populator>>) -> (Arc<GeneratorCore>, HashMap<ChunkPos, Chunk>) {
        let config = GeneratorConfig {
            world_height: 32,
            sea_level: 2,
            ..GeneratorConfig::default()
        };
        let mut generator = WorldGenerator::new(WorldSeed::new(9), config).unwrap();
        generator.set_biome_generator(Arc::new(SingleBiomeGenerator(BiomeId::DESERT)));
        generator.set_base_generator(Arc::new(FlatTerrainGenerator::new(4, BlockState::STONE)));
        *generator.populators_mut() = populators;
        let core = generator.build().unwrap();

        let generation = ChunkGenerationPipeline::new(Arc::clone(&core));
        let mut world = HashMap::new();
        for z in 0..2 {
            for x in 0..2 {
                world.insert(ChunkPos::new(x, z), generation.generate(x, z).unwrap());
            }
        }
        (core, world)
    }

    fn stamp(kind: &'static str, dx: i32, fail: bool) -> Arc<dyn Populator> {
        Arc::new(Stamp {
            kind: PopulatorKind::custom(kind),
            dx,
            fail,
        })
    }

    #[test]
    fn test_missing_neighbor() {
        let (core, mut world) = setup(Vec::new());
        world.remove(&ChunkPos::new(1, 1));

        let result = ChunkDecorationPipeline::new(core).decorate(&mut world, 0, 0);

        assert_eq!(result, Err(GenError::MissingNeighbor(ChunkPos::new(1, 1))));
    }

    #[test]
    fn test_writes_cross_into_neighbor() {
        let (core, mut world) = setup(vec![stamp("a", 12, false)]);
        let pipeline = ChunkDecorationPipeline::new(core);

        let outcome = pipeline.decorate(&mut world, 0, 0).unwrap();

        // core starts at block 8; 8 + 12 = 20 lies in chunk (1, 0)
        assert_eq!(world[&ChunkPos::new(1, 0)].get_block(4, 10, 8), BlockState::LOG);
        assert_eq!(world[&ChunkPos::new(0, 0)].decoration_state(), DecorationState::Decorated);
        assert_eq!(world[&ChunkPos::new(1, 0)].decoration_state(), DecorationState::Undecorated);
        match outcome {
            DecorationOutcome::Completed(report) => {
                assert_eq!(report.touched, vec![ChunkPos::new(1, 0)]);
                assert_eq!(report.applied, vec![PopulatorKind::custom("a")]);
                assert_eq!(report.biome, BiomeId::DESERT);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_second_pass_is_noop() {
        let (core, mut world) = setup(vec![stamp("a", 0, false)]);
        let pipeline = ChunkDecorationPipeline::new(core);

        pipeline.decorate(&mut world, 0, 0).unwrap();
        assert_eq!(pipeline.decorate(&mut world, 0, 0), Ok(DecorationOutcome::AlreadyDecorated));
        assert_eq!(pipeline.timings().get(PopulatorKind::custom("a")).unwrap().calls, 1);
    }

    #[test]
    fn test_failure_commits_and_flags_partial() {
        let (core, mut world) = setup(vec![stamp("first", 0, false), stamp("broken", 1, true), stamp("never", 2, false)]);
        let pipeline = ChunkDecorationPipeline::new(core);

        let err = pipeline.decorate(&mut world, 0, 0).unwrap_err();

        assert!(matches!(
            err,
            GenError::Decoration { populator, .. } if populator == PopulatorKind::custom("broken")
        ));
        let chunk = &world[&ChunkPos::new(0, 0)];
        assert_eq!(chunk.decoration_state(), DecorationState::Partial);
        assert_eq!(chunk.get_block(8, 10, 8), BlockState::LOG);
        assert_eq!(chunk.get_block(9, 10, 8), BlockState::LOG);
        assert_eq!(chunk.get_block(10, 10, 8), BlockState::AIR);
    }

    #[test]
    fn test_pre_hook_cancels_everything() {
        let (core, mut world) = setup(vec![stamp("a", 0, false)]);
        let before = world.clone();
        let hooks = DecorationHooks::none().with_pre(|event: &mut PreDecorateEvent| {
            strata_core::Cancellable::set_cancelled(event, true);
        });

        let outcome = ChunkDecorationPipeline::with_hooks(core, hooks).decorate(&mut world, 0, 0);

        assert_eq!(outcome, Ok(DecorationOutcome::Cancelled));
        assert_eq!(world, before);
    }
}
