use rand::Rng;
use strata_core::{BlockState, Vector3i};

use crate::error::GenResult;
use crate::populator::{DecorationContext, Populator, PopulatorKind};

/// Small elliptical surface lakes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LakePopulator {
    fluid: BlockState,
    rarity: u32,
}

impl LakePopulator {
    /// One lake of `fluid` in roughly `rarity` chunks.
    #[must_use]
    pub fn new(fluid: BlockState, rarity: u32) -> Self {
        Self {
            fluid,
            rarity: rarity.max(1),
        }
    }

    /// Water lakes, one in four chunks.
    #[must_use]
    pub fn water() -> Self {
        Self::new(BlockState::WATER, 4)
    }
}

impl Populator for LakePopulator {
    fn kind(&self) -> PopulatorKind {
        PopulatorKind::LAKE
    }

    fn populate(&self, ctx: &mut DecorationContext<'_>) -> GenResult<()> {
        if ctx.rng.gen_range(0..self.rarity) != 0 {
            return Ok(());
        }

        let core = ctx.buffer.core_min();
        let width = ctx.buffer.core_width() as i32;
        let cx = core.x + ctx.rng.gen_range(0..width);
        let cz = core.z + ctx.rng.gen_range(0..width);
        let radius_x = ctx.rng.gen_range(3..=5);
        let radius_z = ctx.rng.gen_range(3..=5);
        let depth = ctx.rng.gen_range(2..=3);

        let Some(level) = ctx.buffer.top_non_air(cx, cz) else {
            return Ok(());
        };
        if !ctx.buffer.get_block(cx, level, cz)?.is_solid()
            || ctx.structures.is_inside(Vector3i::new(cx, level, cz))
        {
            return Ok(());
        }

        for dz in -radius_z..=radius_z {
            for dx in -radius_x..=radius_x {
                let nx = f64::from(dx) / f64::from(radius_x);
                let nz = f64::from(dz) / f64::from(radius_z);
                if nx * nx + nz * nz > 1.0 {
                    continue;
                }

                let (x, z) = (cx + dx, cz + dz);
                if !ctx.buffer.contains(x, level - depth, z) {
                    continue;
                }
                // Lower ground would leave the water hanging
                let Some(top) = ctx.buffer.top_non_air(x, z) else {
                    continue;
                };
                if top < level {
                    continue;
                }

                for y in level - depth + 1..=level {
                    ctx.buffer.set_block(x, y, z, self.fluid)?;
                }
                for y in level + 1..=top {
                    ctx.buffer.set_block(x, y, z, BlockState::AIR)?;
                }
            }
        }

        Ok(())
    }
}
