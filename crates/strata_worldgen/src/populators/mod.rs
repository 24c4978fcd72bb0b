//! # Built-in Populators
//!
//! Generation populators (run on one chunk's volume):
//! - [`BedrockFloor`]: ragged bedrock at the bottom of the world
//! - [`CaveCarver`]: worm caves that cross chunk seams
//!
//! Decoration populators (run on the padded soft buffer):
//! - [`OrePopulator`]: ore veins
//! - [`TreePopulator`]: trees, leaves may spill into the padding
//! - [`LakePopulator`]: small surface lakes
//! - [`SnowPopulator`]: snow and ice, always last

mod bedrock;
mod caves;
mod lake;
mod ore;
mod snow;
mod tree;

pub use bedrock::BedrockFloor;
pub use caves::CaveCarver;
pub use lake::LakePopulator;
pub use ore::OrePopulator;
pub use snow::SnowPopulator;
pub use tree::TreePopulator;
