//! # Strata Core
//!
//! The types a host engine and the generation pipeline agree on.
//!
//! ## Contents
//!
//! 1. **Handles**: `BlockState` and `BiomeId` are opaque `u16` handles
//! 2. **Coordinates**: `Vector3i` block positions and `ChunkPos` columns
//! 3. **Events**: "post and check cancelled" veto points
//! 4. **Pooling**: `ScratchPool` recycles per-chunk buffers
//!
//! ## Example
//!
//! ```rust
//! use strata_core::{BlockState, ChunkPos, Vector3i};
//!
//! let pos = Vector3i::new(-1, 64, 17);
//! assert_eq!(ChunkPos::from_block(pos.x, pos.z), ChunkPos::new(-1, 1));
//! assert!(BlockState::AIR.is_air());
//! ```

#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod block;
pub mod coords;
pub mod events;
pub mod pool;

pub use block::{BiomeId, BlockState};
pub use coords::{ChunkPos, Vector3i, CHUNK_WIDTH, COLUMNS_PER_CHUNK};
pub use events::{post_and_check, Cancellable, EventBus, NoopBus};
pub use pool::ScratchPool;
