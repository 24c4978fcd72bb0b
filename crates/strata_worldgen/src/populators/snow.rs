use strata_core::BlockState;

use crate::error::GenResult;
use crate::populator::{DecorationContext, Populator, PopulatorKind};

/// Snow on every exposed top in a cold biome; surface water freezes.
///
/// Snow-like, so it runs after trees and lakes and settles on them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SnowPopulator;

impl Populator for SnowPopulator {
    fn kind(&self) -> PopulatorKind {
        PopulatorKind::SNOW
    }

    fn is_snow_like(&self) -> bool {
        true
    }

    fn populate(&self, ctx: &mut DecorationContext<'_>) -> GenResult<()> {
        if !ctx.biome.is_cold() {
            return Ok(());
        }

        let core = ctx.buffer.core_min();
        let width = ctx.buffer.core_width() as i32;

        for z in core.z..core.z + width {
            for x in core.x..core.x + width {
                let Some(top) = ctx.buffer.top_non_air(x, z) else {
                    continue;
                };

                match ctx.buffer.get_block(x, top, z)? {
                    BlockState::WATER => ctx.buffer.set_block(x, top, z, BlockState::ICE)?,
                    BlockState::SNOW_LAYER | BlockState::ICE => {}
                    block if block.is_solid() && ctx.buffer.contains(x, top + 1, z) => {
                        ctx.buffer.set_block(x, top + 1, z, BlockState::SNOW_LAYER)?;
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }
}
