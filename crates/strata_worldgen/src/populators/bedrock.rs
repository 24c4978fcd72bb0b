use rand::Rng;
use strata_core::{BlockState, CHUNK_WIDTH};

use crate::error::GenResult;
use crate::populator::{GenerationContext, GenerationPopulator};

/// Ragged bedrock floor.
///
/// The lowest layer is solid bedrock; each layer above it is bedrock
/// with decreasing probability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BedrockFloor {
    thickness: i32,
}

impl BedrockFloor {
    /// A floor up to `thickness` layers high (at least 1).
    #[must_use]
    pub fn new(thickness: i32) -> Self {
        Self {
            thickness: thickness.max(1),
        }
    }
}

impl Default for BedrockFloor {
    fn default() -> Self {
        Self::new(5)
    }
}

impl GenerationPopulator for BedrockFloor {
    fn name(&self) -> &str {
        "bedrock"
    }

    fn populate(&self, ctx: &mut GenerationContext<'_>) -> GenResult<()> {
        let min = ctx.buffer.min();
        let top = ctx.buffer.max().y;

        for dz in 0..CHUNK_WIDTH as i32 {
            for dx in 0..CHUNK_WIDTH as i32 {
                for layer in 0..self.thickness {
                    let y = min.y + layer;
                    if y >= top {
                        break;
                    }
                    if layer <= ctx.rng.gen_range(0..self.thickness) {
                        ctx.buffer.set(min.x + dx, y, min.z + dz, BlockState::BEDROCK)?;
                    }
                }
            }
        }

        Ok(())
    }
}
