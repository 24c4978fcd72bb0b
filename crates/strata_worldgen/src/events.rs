//! # Decoration Hooks
//!
//! Three synchronous notifications around each decoration pass:
//!
//! ```text
//! PreDecorateEvent ──veto──► whole chunk skipped (DecorationOutcome::Cancelled)
//!        │
//!        ▼
//! PopulateEvent (per populator) ──veto──► that populator skipped
//!        │
//!        ▼
//! PostDecorateEvent (what actually ran)
//! ```
//!
//! A veto is not an error; it only changes what gets applied.

use std::fmt;
use std::sync::Arc;

use strata_core::{BiomeId, Cancellable, ChunkPos, EventBus, NoopBus};

use crate::populator::PopulatorKind;

/// Fired once before a chunk is decorated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreDecorateEvent {
    /// The chunk about to be decorated.
    pub chunk: ChunkPos,
    /// Its dominant biome.
    pub biome: BiomeId,
    /// The effective populator list, in run order. Removing an entry
    /// skips that populator; added or reordered entries are ignored.
    pub populators: Vec<PopulatorKind>,
    cancelled: bool,
}

impl PreDecorateEvent {
    /// A fresh, uncancelled event.
    #[must_use]
    pub const fn new(chunk: ChunkPos, biome: BiomeId, populators: Vec<PopulatorKind>) -> Self {
        Self {
            chunk,
            biome,
            populators,
            cancelled: false,
        }
    }
}

impl Cancellable for PreDecorateEvent {
    fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }
}

/// Fired before each populator runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PopulateEvent {
    /// The chunk being decorated.
    pub chunk: ChunkPos,
    /// The populator about to run.
    pub kind: PopulatorKind,
    cancelled: bool,
}

impl PopulateEvent {
    /// A fresh, uncancelled event.
    #[must_use]
    pub const fn new(chunk: ChunkPos, kind: PopulatorKind) -> Self {
        Self {
            chunk,
            kind,
            cancelled: false,
        }
    }
}

impl Cancellable for PopulateEvent {
    fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }
}

/// Fired after a chunk has been decorated successfully.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostDecorateEvent {
    /// The decorated chunk.
    pub chunk: ChunkPos,
    /// Populators that actually ran, in order.
    pub applied: Vec<PopulatorKind>,
}

/// The buses a decoration pipeline posts to.
#[derive(Clone)]
pub struct DecorationHooks {
    pre: Arc<dyn EventBus<PreDecorateEvent>>,
    populate: Arc<dyn EventBus<PopulateEvent>>,
    post: Arc<dyn EventBus<PostDecorateEvent>>,
}

impl DecorationHooks {
    /// Hooks with no handlers.
    #[must_use]
    pub fn none() -> Self {
        Self {
            pre: Arc::new(NoopBus),
            populate: Arc::new(NoopBus),
            post: Arc::new(NoopBus),
        }
    }

    /// Replaces the pre-decoration bus.
    #[must_use]
    pub fn with_pre(mut self, bus: impl EventBus<PreDecorateEvent> + 'static) -> Self {
        self.pre = Arc::new(bus);
        self
    }

    /// Replaces the per-populator bus.
    #[must_use]
    pub fn with_populate(mut self, bus: impl EventBus<PopulateEvent> + 'static) -> Self {
        self.populate = Arc::new(bus);
        self
    }

    /// Replaces the post-decoration bus.
    #[must_use]
    pub fn with_post(mut self, bus: impl EventBus<PostDecorateEvent> + 'static) -> Self {
        self.post = Arc::new(bus);
        self
    }

    pub(crate) fn pre(&self) -> &dyn EventBus<PreDecorateEvent> {
        &*self.pre
    }

    pub(crate) fn populate(&self) -> &dyn EventBus<PopulateEvent> {
        &*self.populate
    }

    pub(crate) fn post(&self) -> &dyn EventBus<PostDecorateEvent> {
        &*self.post
    }
}

impl Default for DecorationHooks {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for DecorationHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecorationHooks").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::post_and_check;

    #[test]
    fn test_populate_hook_vetoes_by_kind() {
        let hooks = DecorationHooks::none().with_populate(|event: &mut PopulateEvent| {
            if event.kind == PopulatorKind::LAKE {
                event.set_cancelled(true);
            }
        });

        let mut lake = PopulateEvent::new(ChunkPos::new(0, 0), PopulatorKind::LAKE);
        let mut tree = PopulateEvent::new(ChunkPos::new(0, 0), PopulatorKind::TREE);

        assert!(!post_and_check(hooks.populate(), &mut lake));
        assert!(post_and_check(hooks.populate(), &mut tree));
    }

    #[test]
    fn test_default_hooks_never_veto() {
        let hooks = DecorationHooks::default();
        let mut event = PreDecorateEvent::new(ChunkPos::new(1, 1), BiomeId::PLAINS, vec![PopulatorKind::ORE]);
        assert!(post_and_check(hooks.pre(), &mut event));
    }
}
