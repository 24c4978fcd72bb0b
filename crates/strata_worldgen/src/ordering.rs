//! # Populator Ordering
//!
//! Builds the list a decoration pass actually runs: global populators,
//! then the biome's own, with snow-like populators moved to the end so
//! snow settles on trees and lakes placed earlier in the same pass.

use std::sync::Arc;

use crate::populator::Populator;

/// Global then biome populators, snow-like ones last.
///
/// The move is stable: relative order is kept within the snow-like group
/// and within the rest.
#[must_use]
pub fn effective_populators(global: &[Arc<dyn Populator>], biome: &[Arc<dyn Populator>]) -> Vec<Arc<dyn Populator>> {
    let (snow, rest): (Vec<_>, Vec<_>) = global
        .iter()
        .chain(biome)
        .cloned()
        .partition(|p| p.is_snow_like());

    let mut ordered = rest;
    ordered.extend(snow);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenResult;
    use crate::populator::{DecorationContext, PopulatorKind};

    struct Named(PopulatorKind);

    impl Populator for Named {
        fn kind(&self) -> PopulatorKind {
            self.0
        }

        fn populate(&self, _ctx: &mut DecorationContext<'_>) -> GenResult<()> {
            Ok(())
        }
    }

    struct Frost;

    impl Populator for Frost {
        fn kind(&self) -> PopulatorKind {
            PopulatorKind::custom("frost")
        }

        fn is_snow_like(&self) -> bool {
            true
        }

        fn populate(&self, _ctx: &mut DecorationContext<'_>) -> GenResult<()> {
            Ok(())
        }
    }

    fn kinds(list: &[Arc<dyn Populator>]) -> Vec<&'static str> {
        list.iter().map(|p| p.kind().name()).collect()
    }

    #[test]
    fn test_global_before_biome() {
        let global: Vec<Arc<dyn Populator>> = vec![Arc::new(Named(PopulatorKind::ORE))];
        let biome: Vec<Arc<dyn Populator>> = vec![Arc::new(Named(PopulatorKind::TREE))];

        assert_eq!(kinds(&effective_populators(&global, &biome)), vec!["ore", "tree"]);
    }

    #[test]
    fn test_snow_moves_last_stably() {
        let global: Vec<Arc<dyn Populator>> = vec![
            Arc::new(Named(PopulatorKind::SNOW)),
            Arc::new(Named(PopulatorKind::ORE)),
        ];
        let biome: Vec<Arc<dyn Populator>> = vec![
            Arc::new(Frost),
            Arc::new(Named(PopulatorKind::TREE)),
            Arc::new(Named(PopulatorKind::LAKE)),
        ];

        assert_eq!(
            kinds(&effective_populators(&global, &biome)),
            vec!["ore", "tree", "lake", "snow", "frost"]
        );
    }

    #[test]
    fn test_empty_lists() {
        assert!(effective_populators(&[], &[]).is_empty());
    }
}
