//! # Strata Worldgen
//!
//! Deterministic chunk generation and decoration for a block world.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: same seed and chunk always produce the same blocks
//! 2. **Two phases**: generation fills one chunk in isolation; decoration
//!    spills features across the seams with its +X/+Z neighbours
//! 3. **Pluggable**: biome source, base terrain, populators and per-biome
//!    settings are all trait objects chosen before the generator is frozen
//! 4. **Thread-safe**: a frozen [`GeneratorCore`] is shared; each call owns
//!    its own RNG and scratch buffers
//!
//! ## Core Components
//!
//! - [`WorldGenerator`]: mutable builder, frozen by `build()`
//! - [`ChunkGenerationPipeline`]: biomes, terrain, surface, generation populators
//! - [`ChunkDecorationPipeline`]: ores, trees, lakes, snow over a soft buffer
//! - [`SettingsCache`]: lazily built per-biome settings
//! - [`ScatteredStructure`]: ruins placed on a region grid
//!
//! ## Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use strata_worldgen::{
//!     ChunkDecorationPipeline, ChunkGenerationPipeline, ChunkPos, DecorationOutcome, GeneratorConfig,
//!     WorldGenerator, WorldSeed,
//! };
//!
//! let core = WorldGenerator::overworld(WorldSeed::new(12345), GeneratorConfig::default())?.build()?;
//!
//! let generation = ChunkGenerationPipeline::new(core.clone());
//! let mut world = HashMap::new();
//! for (x, z) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
//!     world.insert(ChunkPos::new(x, z), generation.generate(x, z)?);
//! }
//!
//! let decoration = ChunkDecorationPipeline::new(core);
//! let outcome = decoration.decorate(&mut world, 0, 0)?;
//! assert!(matches!(outcome, DecorationOutcome::Completed(_)));
//! # Ok::<(), strata_worldgen::GenError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod biome;
pub mod biome_field;
pub mod chunk;
pub mod config;
pub mod error;
pub mod events;
pub mod generator;
pub mod legacy;
pub mod noise;
pub mod ordering;
pub mod pipeline;
pub mod populator;
pub mod populators;
pub mod rng;
pub mod settings;
pub mod structure;
pub mod surface;
pub mod terrain;
pub mod volume;

pub use biome::{BiomeGenerator, ClimateBiomeGenerator, SingleBiomeGenerator};
pub use biome_field::BiomeField;
pub use chunk::{Chunk, ChunkAccess, ChunkAssembler, ChunkSink, DecorationState};
pub use config::GeneratorConfig;
pub use error::{GenError, GenResult};
pub use events::{DecorationHooks, PopulateEvent, PostDecorateEvent, PreDecorateEvent};
pub use generator::{GeneratorCore, WorldGenerator, WorldGeneratorModifier};
pub use legacy::{ClassicGenerator, LegacyChunkGenerator, LegacyGeneratorAdapter};
pub use pipeline::{
    ChunkDecorationPipeline, ChunkGenerationPipeline, DecorationOutcome, DecorationReport, GenerationStage,
    PopulatorTimings, TimingStat,
};
pub use populator::{
    DecorationContext, GenerationContext, GenerationPopulator, Populator, PopulatorKind, StructureGenerationPopulator,
    Structures,
};
pub use rng::{ChunkRng, SeedMixer, WorldSeed};
pub use settings::{BiomeGenerationSettings, BiomeSettingsProvider, DefaultBiomeSettings, SettingsCache};
pub use structure::{ScatteredStructure, StructureStart};
pub use surface::{GroundCoverLayer, SurfaceLayerer};
pub use terrain::{BaseTerrainGenerator, FlatTerrainGenerator, GeneratorCapabilities, NoiseTerrainGenerator};
pub use volume::{BlockVolume, SoftBuffer};

pub use strata_core::{BiomeId, BlockState, ChunkPos, Vector3i, CHUNK_WIDTH};
