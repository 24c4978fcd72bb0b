//! # Pipelines
//!
//! The two entry points the host calls:
//!
//! - [`ChunkGenerationPipeline::generate`]: seed, biomes, base terrain,
//!   surface, generation populators, assembly. All or nothing.
//! - [`ChunkDecorationPipeline::decorate`]: populators over a padded
//!   buffer spanning the chunk and its +X/+Z neighbours. May stop part-way
//!   on error, leaving the chunk flagged `Partial`.

mod decoration;
mod generation;
mod timings;

pub use decoration::{ChunkDecorationPipeline, DecorationOutcome, DecorationReport};
pub use generation::{ChunkGenerationPipeline, GenerationStage};
pub use timings::{PopulatorTimings, TimingStat};
