//! Per-populator timing aggregates for diagnostics.

use std::collections::BTreeMap;
use std::time::Duration;

use parking_lot::Mutex;

use crate::populator::PopulatorKind;

/// Aggregate timing of one populator kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimingStat {
    /// Number of runs recorded.
    pub calls: u64,
    /// Sum of all runs.
    pub total: Duration,
    /// Slowest single run.
    pub max: Duration,
}

impl TimingStat {
    /// Mean run time, zero before the first run.
    #[must_use]
    pub fn mean(&self) -> Duration {
        if self.calls == 0 {
            return Duration::ZERO;
        }
        self.total / u32::try_from(self.calls).unwrap_or(u32::MAX)
    }

    fn record(&mut self, elapsed: Duration) {
        self.calls += 1;
        self.total += elapsed;
        self.max = self.max.max(elapsed);
    }
}

/// Cumulative timings across every decoration pass of a pipeline.
#[derive(Debug, Default)]
pub struct PopulatorTimings {
    stats: Mutex<BTreeMap<PopulatorKind, TimingStat>>,
}

impl PopulatorTimings {
    /// Empty timings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one run of `kind`.
    pub fn record(&self, kind: PopulatorKind, elapsed: Duration) {
        self.stats.lock().entry(kind).or_default().record(elapsed);
    }

    /// The aggregate for `kind`, if it has run.
    #[must_use]
    pub fn get(&self, kind: PopulatorKind) -> Option<TimingStat> {
        self.stats.lock().get(&kind).copied()
    }

    /// Every aggregate, sorted by kind.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(PopulatorKind, TimingStat)> {
        self.stats.lock().iter().map(|(k, s)| (*k, *s)).collect()
    }

    /// Forgets everything.
    pub fn reset(&self) {
        self.stats.lock().clear();
    }
}
