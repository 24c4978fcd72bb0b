//! # Chunk Generation
//!
//! ```text
//! Uninitialized ─► BiomesGenerated ─► BaseGenerated ─► SurfaceReplaced
//!                                                          │
//!                        Assembled ◄─ GenPopulatorsApplied ◄┘
//! ```
//!
//! Each call owns its RNG and a pooled scratch set (biome field + block
//! volume) for its whole duration; nothing mutable is shared between
//! concurrent calls. A failure anywhere leaves nothing assembled.

use std::sync::Arc;
use std::time::Instant;

use strata_core::{BiomeId, BlockState, ChunkPos, ScratchPool, Vector3i, CHUNK_WIDTH};
use tracing::{debug, trace};

use crate::biome_field::BiomeField;
use crate::chunk::{Chunk, ChunkAssembler, ChunkSink};
use crate::error::{GenError, GenResult};
use crate::generator::GeneratorCore;
use crate::populator::GenerationContext;
use crate::volume::BlockVolume;

/// Progress of one generation call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GenerationStage {
    /// Nothing done yet.
    Uninitialized,
    /// The biome field covers the chunk.
    BiomesGenerated,
    /// The base generator has filled the volume.
    BaseGenerated,
    /// Ground cover applied, or skipped for generators with their own.
    SurfaceReplaced,
    /// Global and per-biome generation populators applied.
    GenPopulatorsApplied,
    /// Handed to the sink.
    Assembled,
}

/// Reusable per-call buffers.
struct Scratch {
    biomes: BiomeField,
    volume: BlockVolume,
}

/// Idle scratch sets kept for reuse.
const SCRATCH_POOL_SIZE: usize = 16;

/// Generates chunks from a frozen [`GeneratorCore`].
pub struct ChunkGenerationPipeline {
    core: Arc<GeneratorCore>,
    scratch: ScratchPool<Scratch>,
}

impl ChunkGenerationPipeline {
    /// Creates a pipeline over `core`.
    #[must_use]
    pub fn new(core: Arc<GeneratorCore>) -> Self {
        Self {
            core,
            scratch: ScratchPool::new(SCRATCH_POOL_SIZE),
        }
    }

    /// The generator this pipeline runs.
    #[must_use]
    pub const fn core(&self) -> &Arc<GeneratorCore> {
        &self.core
    }

    /// Scratch sets waiting for reuse.
    #[must_use]
    pub fn idle_scratch(&self) -> usize {
        self.scratch.idle_count()
    }

    /// Generates chunk `(x, z)`.
    ///
    /// # Errors
    ///
    /// `GenError::Generation` naming the last completed stage and the
    /// failing step.
    pub fn generate(&self, x: i32, z: i32) -> GenResult<Chunk> {
        self.generate_into(x, z, &mut ChunkAssembler)
    }

    /// Generates chunk `(x, z)` and hands the arrays to `sink`.
    ///
    /// The sink is only called on success.
    ///
    /// # Errors
    ///
    /// See [`Self::generate`].
    pub fn generate_into<S: ChunkSink>(&self, x: i32, z: i32, sink: &mut S) -> GenResult<S::Output> {
        let chunk = ChunkPos::new(x, z);
        let started = Instant::now();
        let height = self.core.config().world_height;

        let mut scratch = self.scratch.take_or_else(|| Scratch {
            biomes: BiomeField::for_chunk(chunk.min_block_x(), chunk.min_block_z()),
            volume: BlockVolume::new(Vector3i::ZERO, CHUNK_WIDTH, height, CHUNK_WIDTH),
        });

        let result = self.run(chunk, &mut scratch);
        self.scratch.give_back(scratch);
        let (blocks, biomes) = result?;

        let output = sink.assemble(chunk, blocks, biomes);
        debug!(
            chunk = %chunk,
            stage = ?GenerationStage::Assembled,
            elapsed_us = started.elapsed().as_micros() as u64,
            "Chunk generated"
        );
        Ok(output)
    }

    fn run(&self, chunk: ChunkPos, scratch: &mut Scratch) -> GenResult<(Box<[BlockState]>, Box<[BiomeId]>)> {
        let core = &*self.core;
        let fail = |stage: GenerationStage, step: &str, source: GenError| GenError::Generation {
            chunk,
            stage,
            step: step.to_owned(),
            source: Box::new(source),
        };

        let mut rng = core.mixer().generation_rng(chunk.x, chunk.z);
        let (min_x, min_z) = (chunk.min_block_x(), chunk.min_block_z());

        // Biomes
        scratch.biomes.reuse_at(min_x, min_z, CHUNK_WIDTH, CHUNK_WIDTH);
        scratch.biomes.generate(core.biome_generator());
        let mut stage = GenerationStage::BiomesGenerated;
        trace!(chunk = %chunk, ?stage, "Stage complete");

        // Base terrain
        scratch.volume.reposition(Vector3i::new(min_x, 0, min_z));
        scratch.volume.fill(BlockState::AIR);

        let base = core.base_generator();
        let sea_level = core.config().sea_level;
        {
            let mut ctx = GenerationContext {
                chunk,
                seed: core.seed(),
                buffer: &mut scratch.volume,
                biomes: &scratch.biomes,
                rng: &mut rng,
                sea_level,
            };
            base.fill(&mut ctx).map_err(|e| fail(stage, base.name(), e))?;
        }
        stage = GenerationStage::BaseGenerated;
        trace!(chunk = %chunk, ?stage, "Stage complete");

        // Surface
        if base.capabilities().handles_surface {
            trace!(chunk = %chunk, base = base.name(), "Surface handled by base generator");
        } else {
            let surface = core.surface();
            let noise = surface.stone_noise(chunk);
            surface
                .apply(&mut scratch.volume, &scratch.biomes, &noise, |biome| core.settings().get(biome))
                .map_err(|e| fail(stage, "surface", e))?;
        }
        stage = GenerationStage::SurfaceReplaced;
        trace!(chunk = %chunk, ?stage, "Stage complete");

        // Generation populators: global, then per biome in first-encounter order
        let distinct = scratch.biomes.distinct_biomes().map_err(|e| fail(stage, "biomes", e))?;
        let mut biome_settings = Vec::with_capacity(distinct.len());
        for biome in distinct {
            let settings = core.settings().get(biome).map_err(|e| fail(stage, "biome settings", e))?;
            biome_settings.push(settings);
        }

        {
            let mut ctx = GenerationContext {
                chunk,
                seed: core.seed(),
                buffer: &mut scratch.volume,
                biomes: &scratch.biomes,
                rng: &mut rng,
                sea_level,
            };

            let global = core.generation_populators().iter();
            let per_biome = biome_settings.iter().flat_map(|s| s.generation_populators().iter());
            for populator in global.chain(per_biome) {
                populator
                    .populate(&mut ctx)
                    .map_err(|e| fail(stage, populator.name(), e))?;
                trace!(chunk = %chunk, populator = populator.name(), "Generation populator applied");
            }
        }
        stage = GenerationStage::GenPopulatorsApplied;
        trace!(chunk = %chunk, ?stage, "Stage complete");

        let blocks: Box<[BlockState]> = scratch.volume.blocks().into();
        let biomes = scratch.biomes.detach().map_err(|e| fail(stage, "detach", e))?;
        Ok((blocks, biomes))
    }
}

impl std::fmt::Debug for ChunkGenerationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkGenerationPipeline")
            .field("core", &self.core)
            .field("idle_scratch", &self.scratch.idle_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::SingleBiomeGenerator;
    use crate::config::GeneratorConfig;
    use crate::generator::WorldGenerator;
    use crate::populator::GenerationPopulator;
    use crate::rng::WorldSeed;
    use crate::terrain::FlatTerrainGenerator;

    struct Failing;

    impl GenerationPopulator for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn populate(&self, _ctx: &mut GenerationContext<'_>) -> GenResult<()> {
            Err(GenError::Populator("boom".into()))
        }
    }

    fn flat_core(populators: Vec<Arc<dyn GenerationPopulator>>) -> Arc<GeneratorCore> {
        let config = GeneratorConfig {
            world_height: 32,
            sea_level: 2,
            ..GeneratorConfig::default()
        };
        let mut generator = WorldGenerator::new(WorldSeed::new(0), config).unwrap();
        generator.set_biome_generator(Arc::new(SingleBiomeGenerator(BiomeId::PLAINS)));
        generator.set_base_generator(Arc::new(FlatTerrainGenerator::new(4, BlockState::STONE)));
        *generator.generation_populators_mut() = populators;
        generator.build().unwrap()
    }

    #[test]
    fn test_stage_order() {
        assert!(GenerationStage::Uninitialized < GenerationStage::BiomesGenerated);
        assert!(GenerationStage::SurfaceReplaced < GenerationStage::GenPopulatorsApplied);
        assert!(GenerationStage::GenPopulatorsApplied < GenerationStage::Assembled);
    }

    #[test]
    fn test_failure_reports_stage_and_step() {
        let pipeline = ChunkGenerationPipeline::new(flat_core(vec![Arc::new(Failing)]));

        let err = pipeline.generate(3, 4).unwrap_err();

        match err {
            GenError::Generation { chunk, stage, step, .. } => {
                assert_eq!(chunk, ChunkPos::new(3, 4));
                assert_eq!(stage, GenerationStage::SurfaceReplaced);
                assert_eq!(step, "failing");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(err_root(&pipeline), GenError::Populator("boom".into()));
        // Scratch is returned even on failure
        assert_eq!(pipeline.idle_scratch(), 1);
    }

    fn err_root(pipeline: &ChunkGenerationPipeline) -> GenError {
        pipeline.generate(0, 0).unwrap_err().root_cause().clone()
    }

    #[test]
    fn test_scratch_reuse_matches_fresh() {
        let pipeline = ChunkGenerationPipeline::new(flat_core(Vec::new()));

        let _ = pipeline.generate(10, 10).unwrap();
        let reused = pipeline.generate(-4, 7).unwrap();
        let fresh = ChunkGenerationPipeline::new(Arc::clone(pipeline.core())).generate(-4, 7).unwrap();

        assert_eq!(reused, fresh);
        assert_eq!(pipeline.idle_scratch(), 1);
    }

    #[test]
    fn test_flat_plains_gets_grass() {
        let pipeline = ChunkGenerationPipeline::new(flat_core(Vec::new()));
        let chunk = pipeline.generate(0, 0).unwrap();

        assert_eq!(chunk.get_block(5, 3, 5), BlockState::GRASS);
        assert_eq!(chunk.biome(5, 5), BiomeId::PLAINS);
        assert_eq!(chunk.height(), 32);
    }
}
