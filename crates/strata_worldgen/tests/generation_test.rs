//! # Generation Pipeline Tests
//!
//! End-to-end behaviour of `ChunkGenerationPipeline`: determinism,
//! ground cover on a known column, and generation populator ordering.

use std::sync::Arc;

use strata_worldgen::{
    BiomeGenerationSettings, BiomeId, BlockState, ChunkGenerationPipeline, FlatTerrainGenerator, GenResult,
    GenerationContext, GenerationPopulator, GeneratorConfig, GroundCoverLayer, SingleBiomeGenerator,
    WorldGenerator, WorldSeed,
};
use strata_worldgen::settings::UniformBiomeSettings;

fn small_config() -> GeneratorConfig {
    GeneratorConfig {
        world_height: 128,
        sea_level: 48,
        ..GeneratorConfig::default()
    }
}

fn flat_generator(seed: i64) -> WorldGenerator {
    let config = GeneratorConfig {
        world_height: 16,
        sea_level: 2,
        ..GeneratorConfig::default()
    };
    let mut generator = WorldGenerator::new(WorldSeed::new(seed), config).unwrap();
    generator.set_biome_generator(Arc::new(SingleBiomeGenerator(BiomeId::PLAINS)));
    generator.set_base_generator(Arc::new(FlatTerrainGenerator::new(4, BlockState::STONE)));
    generator
}

/// Writes one block at a fixed local position of every chunk.
struct Marker {
    name: &'static str,
    block: BlockState,
    at: (i32, i32, i32),
}

impl GenerationPopulator for Marker {
    fn name(&self) -> &str {
        self.name
    }

    fn populate(&self, ctx: &mut GenerationContext<'_>) -> GenResult<()> {
        let min = ctx.buffer.min();
        let (dx, y, dz) = self.at;
        ctx.buffer.set(min.x + dx, y, min.z + dz, self.block)
    }
}

/// Test: same seed and chunk produce identical chunks from separate cores.
#[test]
fn test_generation_is_deterministic() {
    let a = ChunkGenerationPipeline::new(WorldGenerator::overworld(WorldSeed::new(42), small_config()).unwrap().build().unwrap());
    let b = ChunkGenerationPipeline::new(WorldGenerator::overworld(WorldSeed::new(42), small_config()).unwrap().build().unwrap());

    for (x, z) in [(0, 0), (3, -2), (-7, 11)] {
        assert_eq!(a.generate(x, z).unwrap(), b.generate(x, z).unwrap(), "chunk ({x}, {z}) differs");
    }
}

/// Test: different seeds give different terrain.
#[test]
fn test_seed_changes_terrain() {
    let a = ChunkGenerationPipeline::new(WorldGenerator::overworld(WorldSeed::new(1), small_config()).unwrap().build().unwrap());
    let b = ChunkGenerationPipeline::new(WorldGenerator::overworld(WorldSeed::new(2), small_config()).unwrap().build().unwrap());

    assert_ne!(a.generate(0, 0).unwrap(), b.generate(0, 0).unwrap());
}

/// Test: generating chunks concurrently from one core matches serial output.
#[test]
fn test_concurrent_generation_matches_serial() {
    let core = WorldGenerator::overworld(WorldSeed::new(7), small_config()).unwrap().build().unwrap();
    let pipeline = Arc::new(ChunkGenerationPipeline::new(core));

    let serial: Vec<_> = (0..4).map(|x| pipeline.generate(x, 1).unwrap()).collect();

    let handles: Vec<_> = (0..4)
        .map(|x| {
            let pipeline = Arc::clone(&pipeline);
            std::thread::spawn(move || pipeline.generate(x, 1).unwrap())
        })
        .collect();

    for (x, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), serial[x]);
    }
}

/// Test: overworld chunks have bedrock at the bottom and air at the top.
#[test]
fn test_overworld_column_shape() {
    let core = WorldGenerator::overworld(WorldSeed::new(99), small_config()).unwrap().build().unwrap();
    let chunk = ChunkGenerationPipeline::new(core).generate(2, 5).unwrap();

    for z in 0..16 {
        for x in 0..16 {
            assert_eq!(chunk.get_block(x, 0, z), BlockState::BEDROCK, "column ({x}, {z})");
            assert_eq!(chunk.get_block(x, 127, z), BlockState::AIR, "column ({x}, {z})");
        }
    }
}

/// Test: grass over three dirt on a four-block slab with the sea at Y 2.
#[test]
fn test_ground_cover_on_flat_slab() {
    let settings = BiomeGenerationSettings::builder()
        .ground_cover(GroundCoverLayer::fixed(BlockState::GRASS, 1))
        .ground_cover(GroundCoverLayer::fixed(BlockState::DIRT, 3))
        .build(BiomeId::PLAINS)
        .unwrap();

    let mut generator = flat_generator(0);
    generator.set_settings_provider(Arc::new(UniformBiomeSettings(settings)));
    let chunk = ChunkGenerationPipeline::new(generator.build().unwrap()).generate(0, 0).unwrap();

    for z in 0..16 {
        for x in 0..16 {
            assert_eq!(chunk.get_block(x, 3, z), BlockState::GRASS);
            assert_eq!(chunk.get_block(x, 2, z), BlockState::DIRT);
            assert_eq!(chunk.get_block(x, 1, z), BlockState::DIRT);
            assert_eq!(chunk.get_block(x, 0, z), BlockState::DIRT);
            assert_eq!(chunk.get_block(x, 4, z), BlockState::AIR);
        }
    }
}

/// Test: later generation populators overwrite earlier ones.
#[test]
fn test_generation_populators_apply_in_order() {
    let mut generator = flat_generator(5);
    generator.generation_populators_mut().push(Arc::new(Marker {
        name: "a",
        block: BlockState::LOG,
        at: (3, 8, 3),
    }));
    generator.generation_populators_mut().push(Arc::new(Marker {
        name: "a-only",
        block: BlockState::LOG,
        at: (4, 8, 4),
    }));
    generator.generation_populators_mut().push(Arc::new(Marker {
        name: "b",
        block: BlockState::LEAVES,
        at: (3, 8, 3),
    }));

    let chunk = ChunkGenerationPipeline::new(generator.build().unwrap()).generate(-1, 2).unwrap();

    assert_eq!(chunk.get_block(3, 8, 3), BlockState::LEAVES);
    assert_eq!(chunk.get_block(4, 8, 4), BlockState::LOG);
}

/// Test: per-biome generation populators run after the global ones.
#[test]
fn test_biome_generation_populators_follow_global() {
    let settings = BiomeGenerationSettings::builder()
        .generation_populator(Arc::new(Marker {
            name: "biome",
            block: BlockState::CLAY,
            at: (0, 9, 0),
        }))
        .build(BiomeId::PLAINS)
        .unwrap();

    let mut generator = flat_generator(5);
    generator.set_settings_provider(Arc::new(UniformBiomeSettings(settings)));
    generator.generation_populators_mut().push(Arc::new(Marker {
        name: "global",
        block: BlockState::LOG,
        at: (0, 9, 0),
    }));

    let chunk = ChunkGenerationPipeline::new(generator.build().unwrap()).generate(0, 0).unwrap();

    assert_eq!(chunk.get_block(0, 9, 0), BlockState::CLAY);
}
