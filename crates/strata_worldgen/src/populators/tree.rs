use rand::Rng;
use strata_core::BlockState;

use crate::error::GenResult;
use crate::populator::{DecorationContext, Populator, PopulatorKind};

/// Simple trees: a log trunk with a rounded leaf crown.
///
/// Trunks stand in the core region; leaves may reach into the padding
/// and are skipped where they would leave the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreePopulator {
    density: u32,
    min_height: i32,
    max_height: i32,
    leaf_radius: i32,
}

impl TreePopulator {
    /// Minimum trunk height.
    const MIN_HEIGHT: i32 = 4;
    /// Maximum trunk height.
    const MAX_HEIGHT: i32 = 6;

    /// Trees at `density` (0-100) per chunk.
    ///
    /// Every 10 points of density is one placement attempt; the remainder
    /// is the chance of one more.
    #[must_use]
    pub const fn with_density(density: u32) -> Self {
        Self {
            density,
            min_height: Self::MIN_HEIGHT,
            max_height: Self::MAX_HEIGHT,
            leaf_radius: 2,
        }
    }

    fn attempts(&self, ctx: &mut DecorationContext<'_>) -> u32 {
        let extra = u32::from(ctx.rng.gen_range(0..10) < self.density % 10);
        self.density / 10 + extra
    }

    /// Grows one tree on the column's top block. Returns false if the
    /// spot is unsuitable.
    pub(crate) fn grow(&self, ctx: &mut DecorationContext<'_>, x: i32, z: i32) -> GenResult<bool> {
        let Some(ground) = ctx.buffer.top_non_air(x, z) else {
            return Ok(false);
        };
        let soil = ctx.buffer.get_block(x, ground, z)?;
        if soil != BlockState::GRASS && soil != BlockState::DIRT {
            return Ok(false);
        }

        let base = ground + 1;
        let height = ctx.rng.gen_range(self.min_height..=self.max_height);
        if !ctx.buffer.contains(x, base + height + 2, z) {
            return Ok(false);
        }
        if ctx.structures.is_inside(strata_core::Vector3i::new(x, base, z)) {
            return Ok(false);
        }

        // Trunk
        for y in base..base + height {
            if !ctx.buffer.get_block(x, y, z)?.is_air() {
                return Ok(false);
            }
        }
        for y in base..base + height {
            ctx.buffer.set_block(x, y, z, BlockState::LOG)?;
        }

        // Crown
        let r = self.leaf_radius;
        for y in base + height - 2..base + height + 2 {
            for dz in -r..=r {
                for dx in -r..=r {
                    if dx * dx + dz * dz > r * r + 1 {
                        continue;
                    }
                    let (lx, lz) = (x + dx, z + dz);
                    if !ctx.buffer.contains(lx, y, lz) {
                        continue;
                    }
                    if ctx.buffer.get_block(lx, y, lz)?.is_air() {
                        ctx.buffer.set_block(lx, y, lz, BlockState::LEAVES)?;
                    }
                }
            }
        }

        Ok(true)
    }
}

impl Populator for TreePopulator {
    fn kind(&self) -> PopulatorKind {
        PopulatorKind::TREE
    }

    fn populate(&self, ctx: &mut DecorationContext<'_>) -> GenResult<()> {
        let core = ctx.buffer.core_min();
        let width = ctx.buffer.core_width() as i32;

        for _ in 0..self.attempts(ctx) {
            let x = core.x + ctx.rng.gen_range(0..width);
            let z = core.z + ctx.rng.gen_range(0..width);
            self.grow(ctx, x, z)?;
        }

        Ok(())
    }
}
