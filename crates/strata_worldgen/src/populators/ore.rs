use rand::Rng;
use strata_core::BlockState;

use crate::error::GenResult;
use crate::populator::{DecorationContext, Populator, PopulatorKind};

/// Ore veins grown by a short random walk through stone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrePopulator {
    ore: BlockState,
    host: BlockState,
    veins: u32,
    vein_size: u32,
    min_y: i32,
    max_y: i32,
}

impl OrePopulator {
    /// Veins of `ore` replacing stone between `min_y` and `max_y`.
    #[must_use]
    pub fn new(ore: BlockState, veins: u32, vein_size: u32, min_y: i32, max_y: i32) -> Self {
        Self {
            ore,
            host: BlockState::STONE,
            veins,
            vein_size,
            min_y,
            max_y: max_y.max(min_y + 1),
        }
    }

    /// Common coal.
    #[must_use]
    pub fn coal() -> Self {
        Self::new(BlockState::COAL_ORE, 20, 8, 5, 128)
    }

    /// Iron, deeper and rarer.
    #[must_use]
    pub fn iron() -> Self {
        Self::new(BlockState::IRON_ORE, 12, 6, 5, 64)
    }
}

impl Populator for OrePopulator {
    fn kind(&self) -> PopulatorKind {
        PopulatorKind::ORE
    }

    fn populate(&self, ctx: &mut DecorationContext<'_>) -> GenResult<()> {
        let core = ctx.buffer.core_min();
        let width = ctx.buffer.core_width() as i32;

        for _ in 0..self.veins {
            let mut x = core.x + ctx.rng.gen_range(0..width);
            let mut y = ctx.rng.gen_range(self.min_y..self.max_y);
            let mut z = core.z + ctx.rng.gen_range(0..width);

            for _ in 0..self.vein_size {
                if ctx.buffer.contains(x, y, z) && ctx.buffer.get_block(x, y, z)? == self.host {
                    ctx.buffer.set_block(x, y, z, self.ore)?;
                }
                x += ctx.rng.gen_range(-1..=1);
                y += ctx.rng.gen_range(-1..=1);
                z += ctx.rng.gen_range(-1..=1);
            }
        }

        Ok(())
    }
}
