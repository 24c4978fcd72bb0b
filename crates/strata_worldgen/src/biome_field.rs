//! # Biome Field
//!
//! A rectangular grid of biomes for a horizontal region.
//!
//! ## Lifecycle
//!
//! ```text
//! new / reuse_at ──► Pending ──generate──► Live ──detach──► Detached
//!        ▲                                   │                  │
//!        └───────────────────────────────────┴──────────────────┘
//! ```
//!
//! Reads are only valid while `Live`. Repositioning a field always
//! invalidates it, so stale biomes from a previous chunk can never leak
//! into the next one.

use std::mem;

use strata_core::{BiomeId, CHUNK_WIDTH};
use tracing::trace;

use crate::biome::BiomeGenerator;
use crate::error::{GenError, GenResult};

/// Where a biome field is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldState {
    /// Positioned, but not yet filled for that position.
    Pending,
    /// Filled for the current position; reads are valid.
    Live,
    /// The backing array was handed out; must be repositioned before use.
    Detached,
}

/// Biomes for a `width × depth` region starting at `(origin_x, origin_z)`.
///
/// Stored row-major by Z then X: entry `dz * width + dx`.
#[derive(Clone, Debug)]
pub struct BiomeField {
    origin_x: i32,
    origin_z: i32,
    width: usize,
    depth: usize,
    biomes: Vec<BiomeId>,
    state: FieldState,
}

impl BiomeField {
    /// Allocates a pending field for the given region.
    #[must_use]
    pub fn new(origin_x: i32, origin_z: i32, width: usize, depth: usize) -> Self {
        Self {
            origin_x,
            origin_z,
            width,
            depth,
            biomes: vec![BiomeId::default(); width * depth],
            state: FieldState::Pending,
        }
    }

    /// Allocates a pending field covering one chunk footprint.
    #[must_use]
    pub fn for_chunk(min_x: i32, min_z: i32) -> Self {
        Self::new(min_x, min_z, CHUNK_WIDTH, CHUNK_WIDTH)
    }

    /// Repositions the field for a new region.
    ///
    /// Storage is kept when the size is unchanged and still attached;
    /// otherwise fresh storage is allocated. Either way the field is
    /// `Pending` afterwards.
    pub fn reuse_at(&mut self, origin_x: i32, origin_z: i32, width: usize, depth: usize) {
        let len = width * depth;
        if self.biomes.len() != len {
            self.biomes = vec![BiomeId::default(); len];
        }

        self.origin_x = origin_x;
        self.origin_z = origin_z;
        self.width = width;
        self.depth = depth;
        self.state = FieldState::Pending;
    }

    /// Fills every column from `generator`; the field becomes `Live`.
    pub fn generate(&mut self, generator: &dyn BiomeGenerator) {
        let len = self.width * self.depth;
        if self.biomes.len() != len {
            self.biomes = vec![BiomeId::default(); len];
        }

        for dz in 0..self.depth {
            let z = self.origin_z + dz as i32;
            let row = &mut self.biomes[dz * self.width..(dz + 1) * self.width];
            for (dx, slot) in row.iter_mut().enumerate() {
                *slot = generator.biome_at(self.origin_x + dx as i32, z);
            }
        }

        self.state = FieldState::Live;
        trace!(
            origin_x = self.origin_x,
            origin_z = self.origin_z,
            "Biome field generated"
        );
    }

    /// Biome at an absolute column.
    ///
    /// # Errors
    ///
    /// `StaleBiomeField` unless `Live`; `ColumnOutOfRange` outside the
    /// region.
    pub fn biome_at(&self, x: i32, z: i32) -> GenResult<BiomeId> {
        if self.state != FieldState::Live {
            return Err(GenError::StaleBiomeField);
        }

        let index = self.index(x, z).ok_or(GenError::ColumnOutOfRange { x, z })?;
        Ok(self.biomes[index])
    }

    /// Biome at a column relative to the origin.
    ///
    /// # Errors
    ///
    /// Same as [`Self::biome_at`].
    pub fn biome_local(&self, dx: usize, dz: usize) -> GenResult<BiomeId> {
        self.biome_at(self.origin_x + dx as i32, self.origin_z + dz as i32)
    }

    /// Distinct biomes in order of first encounter (row-major).
    ///
    /// # Errors
    ///
    /// `StaleBiomeField` unless `Live`.
    pub fn distinct_biomes(&self) -> GenResult<Vec<BiomeId>> {
        if self.state != FieldState::Live {
            return Err(GenError::StaleBiomeField);
        }

        let mut seen = Vec::new();
        for &biome in &self.biomes {
            if !seen.contains(&biome) {
                seen.push(biome);
            }
        }
        Ok(seen)
    }

    /// Hands out the flat biome array.
    ///
    /// A chunk-sized field gives up its storage and becomes `Detached`;
    /// any other field returns a copy and stays `Live`.
    ///
    /// # Errors
    ///
    /// `StaleBiomeField` unless `Live`.
    pub fn detach(&mut self) -> GenResult<Box<[BiomeId]>> {
        if self.state != FieldState::Live {
            return Err(GenError::StaleBiomeField);
        }

        if self.width == CHUNK_WIDTH && self.depth == CHUNK_WIDTH {
            self.state = FieldState::Detached;
            Ok(mem::take(&mut self.biomes).into_boxed_slice())
        } else {
            Ok(self.biomes.clone().into_boxed_slice())
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> FieldState {
        self.state
    }

    /// Minimum corner of the region.
    #[must_use]
    pub const fn origin(&self) -> (i32, i32) {
        (self.origin_x, self.origin_z)
    }

    /// Region size as `(width, depth)`.
    #[must_use]
    pub const fn size(&self) -> (usize, usize) {
        (self.width, self.depth)
    }

    fn index(&self, x: i32, z: i32) -> Option<usize> {
        let dx = usize::try_from(x.checked_sub(self.origin_x)?).ok()?;
        let dz = usize::try_from(z.checked_sub(self.origin_z)?).ok()?;
        (dx < self.width && dz < self.depth).then(|| dz * self.width + dx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::SingleBiomeGenerator;

    /// Stripes of biome by absolute X.
    struct Stripes;

    impl BiomeGenerator for Stripes {
        fn biome_at(&self, x: i32, _z: i32) -> BiomeId {
            if x.rem_euclid(16) < 8 {
                BiomeId::PLAINS
            } else {
                BiomeId::DESERT
            }
        }
    }

    #[test]
    fn test_read_before_generate_is_stale() {
        let field = BiomeField::for_chunk(0, 0);
        assert_eq!(field.biome_at(0, 0), Err(GenError::StaleBiomeField));
        assert_eq!(field.distinct_biomes(), Err(GenError::StaleBiomeField));
    }

    #[test]
    fn test_generate_and_lookup() {
        let mut field = BiomeField::for_chunk(-16, 32);
        field.generate(&Stripes);

        assert_eq!(field.state(), FieldState::Live);
        assert_eq!(field.biome_at(-16, 32), Ok(BiomeId::PLAINS));
        assert_eq!(field.biome_at(-1, 47), Ok(BiomeId::DESERT));
        assert_eq!(
            field.biome_at(0, 32),
            Err(GenError::ColumnOutOfRange { x: 0, z: 32 })
        );
        assert_eq!(
            field.biome_at(-17, 32),
            Err(GenError::ColumnOutOfRange { x: -17, z: 32 })
        );
    }

    #[test]
    fn test_distinct_biomes_first_encounter_order() {
        let mut field = BiomeField::for_chunk(8, 0);
        field.generate(&Stripes);

        // Column x=8 is desert, x=16 is plains
        assert_eq!(
            field.distinct_biomes(),
            Ok(vec![BiomeId::DESERT, BiomeId::PLAINS])
        );
    }

    #[test]
    fn test_reuse_invalidates() {
        let mut field = BiomeField::for_chunk(0, 0);
        field.generate(&SingleBiomeGenerator(BiomeId::FOREST));

        field.reuse_at(16, 0, 16, 16);
        assert_eq!(field.state(), FieldState::Pending);
        assert_eq!(field.biome_at(16, 0), Err(GenError::StaleBiomeField));

        field.generate(&SingleBiomeGenerator(BiomeId::TAIGA));
        assert_eq!(field.biome_at(20, 4), Ok(BiomeId::TAIGA));
    }

    #[test]
    fn test_reuse_with_new_size_reallocates() {
        let mut field = BiomeField::for_chunk(0, 0);
        field.reuse_at(0, 0, 4, 2);
        field.generate(&SingleBiomeGenerator(BiomeId::SWAMP));

        assert_eq!(field.size(), (4, 2));
        assert_eq!(field.biome_at(3, 1), Ok(BiomeId::SWAMP));
        assert!(field.biome_at(4, 1).is_err());
    }

    #[test]
    fn test_detach_chunk_sized_takes_ownership() {
        let mut field = BiomeField::for_chunk(0, 0);
        field.generate(&SingleBiomeGenerator(BiomeId::JUNGLE));

        let biomes = field.detach().unwrap();
        assert_eq!(biomes.len(), 256);
        assert!(biomes.iter().all(|&b| b == BiomeId::JUNGLE));
        assert_eq!(field.state(), FieldState::Detached);
        assert_eq!(field.biome_at(0, 0), Err(GenError::StaleBiomeField));

        // Reusable after repositioning
        field.reuse_at(16, 16, 16, 16);
        field.generate(&SingleBiomeGenerator(BiomeId::BEACH));
        assert_eq!(field.biome_at(31, 31), Ok(BiomeId::BEACH));
    }

    #[test]
    fn test_detach_other_size_copies() {
        let mut field = BiomeField::new(0, 0, 3, 3);
        field.generate(&SingleBiomeGenerator(BiomeId::TUNDRA));

        let biomes = field.detach().unwrap();
        assert_eq!(biomes.len(), 9);
        assert_eq!(field.state(), FieldState::Live);
        assert_eq!(field.biome_local(2, 2), Ok(BiomeId::TUNDRA));
    }
}
