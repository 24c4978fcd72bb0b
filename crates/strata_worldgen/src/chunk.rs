//! # Chunks
//!
//! The assembled output of generation and the unit decoration works on.
//!
//! ## Chunk Format
//!
//! A chunk is `16 × world_height × 16` block states indexed `[y][z][x]`,
//! plus 256 biomes indexed `[z][x]`. Both are flat boxed slices so the
//! host can take them without copying.

use std::collections::HashMap;

use strata_core::{BiomeId, BlockState, ChunkPos, CHUNK_WIDTH, COLUMNS_PER_CHUNK};

/// How far decoration has progressed on a chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DecorationState {
    /// Generated, not yet decorated.
    #[default]
    Undecorated,
    /// A decoration pass failed part-way; committed writes are present.
    Partial,
    /// Fully decorated.
    Decorated,
}

/// A generated chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pos: ChunkPos,
    height: usize,
    blocks: Box<[BlockState]>,
    biomes: Box<[BiomeId]>,
    decoration: DecorationState,
}

impl Chunk {
    /// Creates an all-air chunk.
    #[must_use]
    pub fn empty(pos: ChunkPos, height: usize) -> Self {
        Self {
            pos,
            height,
            blocks: vec![BlockState::AIR; COLUMNS_PER_CHUNK * height].into_boxed_slice(),
            biomes: vec![BiomeId::default(); COLUMNS_PER_CHUNK].into_boxed_slice(),
            decoration: DecorationState::Undecorated,
        }
    }

    /// Builds a chunk from assembled arrays.
    ///
    /// Returns `None` if the arrays do not match a `16 × height × 16`
    /// chunk.
    #[must_use]
    pub fn from_parts(pos: ChunkPos, blocks: Box<[BlockState]>, biomes: Box<[BiomeId]>) -> Option<Self> {
        if biomes.len() != COLUMNS_PER_CHUNK || blocks.len() % COLUMNS_PER_CHUNK != 0 {
            return None;
        }

        Some(Self {
            pos,
            height: blocks.len() / COLUMNS_PER_CHUNK,
            blocks,
            biomes,
            decoration: DecorationState::Undecorated,
        })
    }

    /// Position in the chunk grid.
    #[inline]
    #[must_use]
    pub const fn pos(&self) -> ChunkPos {
        self.pos
    }

    /// Number of block layers.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Gets a block at local coordinates; air outside the chunk.
    #[inline]
    #[must_use]
    pub fn get_block(&self, x: usize, y: usize, z: usize) -> BlockState {
        self.index(x, y, z).map_or(BlockState::AIR, |i| self.blocks[i])
    }

    /// Sets a block at local coordinates. Returns false outside the chunk.
    #[inline]
    pub fn set_block(&mut self, x: usize, y: usize, z: usize, state: BlockState) -> bool {
        match self.index(x, y, z) {
            Some(i) => {
                self.blocks[i] = state;
                true
            }
            None => false,
        }
    }

    /// Biome at a local column; the default biome outside the chunk.
    #[inline]
    #[must_use]
    pub fn biome(&self, x: usize, z: usize) -> BiomeId {
        if x < CHUNK_WIDTH && z < CHUNK_WIDTH {
            self.biomes[z * CHUNK_WIDTH + x]
        } else {
            BiomeId::default()
        }
    }

    /// Highest non-air Y in a local column.
    #[must_use]
    pub fn surface_y(&self, x: usize, z: usize) -> Option<usize> {
        (0..self.height).rev().find(|&y| !self.get_block(x, y, z).is_air())
    }

    /// All blocks, `[y][z][x]`.
    #[must_use]
    pub fn blocks(&self) -> &[BlockState] {
        &self.blocks
    }

    /// All biomes, `[z][x]`.
    #[must_use]
    pub fn biomes(&self) -> &[BiomeId] {
        &self.biomes
    }

    /// Block data as raw bytes for the host's storage layer.
    #[must_use]
    pub fn block_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.blocks)
    }

    /// Mutable 16-wide row at `(y, z)`.
    pub(crate) fn row_mut(&mut self, y: usize, z: usize) -> Option<&mut [BlockState]> {
        let start = self.index(0, y, z)?;
        Some(&mut self.blocks[start..start + CHUNK_WIDTH])
    }

    /// One 16-wide row at `(y, z)`.
    pub(crate) fn row(&self, y: usize, z: usize) -> Option<&[BlockState]> {
        let start = self.index(0, y, z)?;
        Some(&self.blocks[start..start + CHUNK_WIDTH])
    }

    /// Decoration progress.
    #[must_use]
    pub const fn decoration_state(&self) -> DecorationState {
        self.decoration
    }

    /// Records decoration progress.
    pub fn set_decoration_state(&mut self, state: DecorationState) {
        self.decoration = state;
    }

    /// Consumes the chunk, returning its arrays.
    #[must_use]
    pub fn into_parts(self) -> (ChunkPos, Box<[BlockState]>, Box<[BiomeId]>) {
        (self.pos, self.blocks, self.biomes)
    }

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize) -> Option<usize> {
        (x < CHUNK_WIDTH && y < self.height && z < CHUNK_WIDTH)
            .then(|| (y * CHUNK_WIDTH + z) * CHUNK_WIDTH + x)
    }
}

/// Receives a chunk's finished arrays.
///
/// The host implements this to build its own chunk object. Ownership of
/// both arrays passes to the sink.
pub trait ChunkSink {
    /// What the host builds from the arrays.
    type Output;

    /// Assembles the host chunk.
    fn assemble(&mut self, pos: ChunkPos, blocks: Box<[BlockState]>, biomes: Box<[BiomeId]>) -> Self::Output;
}

/// Sink producing this crate's [`Chunk`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ChunkAssembler;

impl ChunkSink for ChunkAssembler {
    type Output = Chunk;

    fn assemble(&mut self, pos: ChunkPos, blocks: Box<[BlockState]>, biomes: Box<[BiomeId]>) -> Chunk {
        let height = blocks.len() / COLUMNS_PER_CHUNK;
        Chunk {
            pos,
            height,
            blocks,
            biomes,
            decoration: DecorationState::Undecorated,
        }
    }
}

/// Host world storage as seen by decoration.
pub trait ChunkAccess {
    /// The chunk at `pos`, if generated.
    fn chunk(&self, pos: ChunkPos) -> Option<&Chunk>;

    /// Mutable access to the chunk at `pos`, if generated.
    fn chunk_mut(&mut self, pos: ChunkPos) -> Option<&mut Chunk>;
}

impl<S: std::hash::BuildHasher> ChunkAccess for HashMap<ChunkPos, Chunk, S> {
    fn chunk(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.get(&pos)
    }

    fn chunk_mut(&mut self, pos: ChunkPos) -> Option<&mut Chunk> {
        self.get_mut(&pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_get_set() {
        let mut chunk = Chunk::empty(ChunkPos::new(0, 0), 32);

        assert!(chunk.set_block(3, 10, 5, BlockState::STONE));
        assert!(!chunk.set_block(16, 0, 0, BlockState::STONE));
        assert!(!chunk.set_block(0, 32, 0, BlockState::STONE));

        assert_eq!(chunk.get_block(3, 10, 5), BlockState::STONE);
        assert_eq!(chunk.get_block(99, 0, 0), BlockState::AIR);
        assert_eq!(chunk.surface_y(3, 5), Some(10));
        assert_eq!(chunk.surface_y(0, 0), None);
    }

    #[test]
    fn test_from_parts_validates_shape() {
        let pos = ChunkPos::new(1, 1);
        let biomes = vec![BiomeId::PLAINS; 256].into_boxed_slice();

        assert!(Chunk::from_parts(pos, vec![BlockState::AIR; 256 * 4].into(), biomes.clone()).is_some());
        assert!(Chunk::from_parts(pos, vec![BlockState::AIR; 100].into(), biomes).is_none());
        assert!(Chunk::from_parts(pos, vec![BlockState::AIR; 256].into(), vec![BiomeId::PLAINS; 3].into()).is_none());
    }

    #[test]
    fn test_block_bytes_length() {
        let chunk = Chunk::empty(ChunkPos::new(0, 0), 8);
        assert_eq!(chunk.block_bytes().len(), 256 * 8 * 2);
    }

    #[test]
    fn test_decoration_state_default() {
        let mut chunk = Chunk::empty(ChunkPos::new(0, 0), 1);
        assert_eq!(chunk.decoration_state(), DecorationState::Undecorated);
        chunk.set_decoration_state(DecorationState::Partial);
        assert_eq!(chunk.decoration_state(), DecorationState::Partial);
    }

    #[test]
    fn test_hashmap_access() {
        let mut world: HashMap<ChunkPos, Chunk> = HashMap::new();
        world.insert(ChunkPos::new(2, 3), Chunk::empty(ChunkPos::new(2, 3), 4));

        assert!(world.chunk(ChunkPos::new(2, 3)).is_some());
        assert!(world.chunk(ChunkPos::new(0, 0)).is_none());
        if let Some(chunk) = world.chunk_mut(ChunkPos::new(2, 3)) {
            chunk.set_block(0, 0, 0, BlockState::SAND);
        }
        assert_eq!(world[&ChunkPos::new(2, 3)].get_block(0, 0, 0), BlockState::SAND);
    }
}
