//! # Generation Error Types
//!
//! Everything that can go wrong while configuring, generating or
//! decorating a chunk. Cancellation through a hook is *not* an error and
//! never appears here.

use strata_core::{BiomeId, ChunkPos};
use thiserror::Error;

use crate::pipeline::GenerationStage;
use crate::populator::PopulatorKind;

/// Errors raised by the generation subsystem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenError {
    /// Invalid generator configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file named a block the handle table does not know.
    #[error("unknown block name: {0}")]
    UnknownBlock(String),

    /// A configuration file named a biome the handle table does not know.
    #[error("unknown biome name: {0}")]
    UnknownBiome(String),

    /// No settings could be produced for a biome.
    #[error("no generation settings for biome {0}")]
    MissingBiomeSettings(BiomeId),

    /// A ground-cover layer list failed validation.
    #[error("malformed ground cover for biome {biome}, layer {layer}: {reason}")]
    MalformedGroundCover {
        /// The biome whose settings were being built.
        biome: BiomeId,
        /// Index of the offending layer.
        layer: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// A block access fell outside a buffer.
    #[error("position ({x}, {y}, {z}) is outside the buffer")]
    OutOfBounds {
        /// Absolute X.
        x: i32,
        /// Absolute Y.
        y: i32,
        /// Absolute Z.
        z: i32,
    },

    /// A biome lookup fell outside the field's region.
    #[error("column ({x}, {z}) is outside the biome field")]
    ColumnOutOfRange {
        /// Absolute X.
        x: i32,
        /// Absolute Z.
        z: i32,
    },

    /// The biome field was repositioned or detached and not regenerated.
    #[error("biome field has not been generated for its current origin")]
    StaleBiomeField,

    /// A chunk in the decoration working set does not exist yet.
    #[error("chunk {0} is required for decoration but has not been generated")]
    MissingNeighbor(ChunkPos),

    /// A populator or generator strategy reported a failure of its own.
    #[error("populator failed: {0}")]
    Populator(String),

    /// Generation of a chunk was aborted.
    #[error("generation of chunk {chunk} failed after {stage:?} in {step}: {source}")]
    Generation {
        /// The chunk being generated.
        chunk: ChunkPos,
        /// The last stage that completed.
        stage: GenerationStage,
        /// The step that failed.
        step: String,
        /// The underlying failure.
        source: Box<GenError>,
    },

    /// Decoration of a chunk was aborted part-way.
    #[error("decoration of chunk {chunk} failed in {populator}: {source}")]
    Decoration {
        /// The chunk being decorated.
        chunk: ChunkPos,
        /// The populator that failed.
        populator: PopulatorKind,
        /// The underlying failure.
        source: Box<GenError>,
    },
}

impl GenError {
    /// Returns true for errors detected while building configuration.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig(_)
                | Self::UnknownBlock(_)
                | Self::UnknownBiome(_)
                | Self::MissingBiomeSettings(_)
                | Self::MalformedGroundCover { .. }
        )
    }

    /// Returns the innermost cause, unwrapping pipeline context.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Generation { source, .. } | Self::Decoration { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type for generation operations.
pub type GenResult<T> = Result<T, GenError>;
