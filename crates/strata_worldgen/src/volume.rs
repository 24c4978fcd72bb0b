//! # Block Buffers
//!
//! Two mutable 3D views over block states:
//!
//! - [`BlockVolume`]: an axis-aligned box addressed by absolute or
//!   relative coordinates. Generation writes one chunk column stack here.
//! - [`SoftBuffer`]: a volume centred on a core region with a padding
//!   margin on each horizontal side. Decoration may write anywhere inside
//!   it, and nowhere outside it.
//!
//! Blocks are stored `[y][z][x]`, matching chunk storage so columns can be
//! copied in and out with plain slices.

use std::collections::BTreeSet;

use strata_core::{BlockState, ChunkPos, Vector3i};

use crate::error::{GenError, GenResult};

/// An axis-aligned box of block states.
#[derive(Clone, Debug)]
pub struct BlockVolume {
    min: Vector3i,
    size_x: usize,
    size_y: usize,
    size_z: usize,
    blocks: Vec<BlockState>,
}

impl BlockVolume {
    /// Creates a volume filled with air.
    #[must_use]
    pub fn new(min: Vector3i, size_x: usize, size_y: usize, size_z: usize) -> Self {
        Self {
            min,
            size_x,
            size_y,
            size_z,
            blocks: vec![BlockState::AIR; size_x * size_y * size_z],
        }
    }

    /// Moves the volume to a new minimum corner, keeping its size.
    ///
    /// Contents are left as they were; callers fill before use.
    pub fn reposition(&mut self, min: Vector3i) {
        self.min = min;
    }

    /// Minimum corner (inclusive).
    #[inline]
    #[must_use]
    pub const fn min(&self) -> Vector3i {
        self.min
    }

    /// Maximum corner (exclusive).
    #[inline]
    #[must_use]
    pub const fn max(&self) -> Vector3i {
        Vector3i::new(
            self.min.x + self.size_x as i32,
            self.min.y + self.size_y as i32,
            self.min.z + self.size_z as i32,
        )
    }

    /// Size as `(x, y, z)`.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> (usize, usize, usize) {
        (self.size_x, self.size_y, self.size_z)
    }

    /// Returns true if the absolute position lies inside the volume.
    #[inline]
    #[must_use]
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        self.index(x, y, z).is_some()
    }

    /// Block at an absolute position.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` outside the volume.
    #[inline]
    pub fn get(&self, x: i32, y: i32, z: i32) -> GenResult<BlockState> {
        self.index(x, y, z)
            .map(|i| self.blocks[i])
            .ok_or(GenError::OutOfBounds { x, y, z })
    }

    /// Sets the block at an absolute position.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` outside the volume; nothing is written.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, z: i32, state: BlockState) -> GenResult<()> {
        let i = self.index(x, y, z).ok_or(GenError::OutOfBounds { x, y, z })?;
        self.blocks[i] = state;
        Ok(())
    }

    /// Block at a position relative to the minimum corner.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` outside the volume.
    pub fn get_relative(&self, dx: i32, dy: i32, dz: i32) -> GenResult<BlockState> {
        self.get(self.min.x + dx, self.min.y + dy, self.min.z + dz)
    }

    /// Sets a block relative to the minimum corner.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` outside the volume.
    pub fn set_relative(&mut self, dx: i32, dy: i32, dz: i32, state: BlockState) -> GenResult<()> {
        self.set(self.min.x + dx, self.min.y + dy, self.min.z + dz, state)
    }

    /// Overwrites every block.
    pub fn fill(&mut self, state: BlockState) {
        self.blocks.fill(state);
    }

    /// Highest Y in the column holding a non-air block, if any.
    #[must_use]
    pub fn top_non_air(&self, x: i32, z: i32) -> Option<i32> {
        let max_y = self.max().y;
        (self.min.y..max_y)
            .rev()
            .find(|&y| self.get(x, y, z).is_ok_and(|b| !b.is_air()))
    }

    /// The raw `[y][z][x]` block slice.
    #[must_use]
    pub fn blocks(&self) -> &[BlockState] {
        &self.blocks
    }

    /// Copies an X run from `src` into the row starting at
    /// absolute `(x, y, z)`.
    pub(crate) fn write_row(&mut self, x: i32, y: i32, z: i32, src: &[BlockState]) -> GenResult<()> {
        let start = self.index(x, y, z).ok_or(GenError::OutOfBounds { x, y, z })?;
        let last_x = x + src.len() as i32 - 1;
        if !self.contains(last_x, y, z) {
            return Err(GenError::OutOfBounds { x: last_x, y, z });
        }
        self.blocks[start..start + src.len()].copy_from_slice(src);
        Ok(())
    }

    /// Borrows an X run of `len` blocks starting at absolute `(x, y, z)`.
    pub(crate) fn row(&self, x: i32, y: i32, z: i32, len: usize) -> GenResult<&[BlockState]> {
        let start = self.index(x, y, z).ok_or(GenError::OutOfBounds { x, y, z })?;
        let last_x = x + len as i32 - 1;
        if !self.contains(last_x, y, z) {
            return Err(GenError::OutOfBounds { x: last_x, y, z });
        }
        Ok(&self.blocks[start..start + len])
    }

    #[inline]
    fn index(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        let dx = usize::try_from(x.checked_sub(self.min.x)?).ok()?;
        let dy = usize::try_from(y.checked_sub(self.min.y)?).ok()?;
        let dz = usize::try_from(z.checked_sub(self.min.z)?).ok()?;

        if dx < self.size_x && dy < self.size_y && dz < self.size_z {
            Some((dy * self.size_z + dz) * self.size_x + dx)
        } else {
            None
        }
    }
}

/// The padded buffer a decoration pass writes into.
///
/// The core region is the 16×16 footprint being decorated; `pad` blocks
/// on every horizontal side may also be written, so features can spill
/// across chunk seams without touching chunks outside the working set.
#[derive(Clone, Debug)]
pub struct SoftBuffer {
    volume: BlockVolume,
    core_min: Vector3i,
    core_width: usize,
    pad: i32,
    touched: BTreeSet<ChunkPos>,
}

impl SoftBuffer {
    /// Creates an air-filled buffer around a square core region.
    #[must_use]
    pub fn new(core_min: Vector3i, core_width: usize, height: usize, pad: i32) -> Self {
        let pad_blocks = pad.max(0);
        let span = core_width + 2 * pad_blocks as usize;
        let min = Vector3i::new(core_min.x - pad_blocks, core_min.y, core_min.z - pad_blocks);

        Self {
            volume: BlockVolume::new(min, span, height, span),
            core_min,
            core_width,
            pad: pad_blocks,
            touched: BTreeSet::new(),
        }
    }

    /// Minimum corner of the core region.
    #[must_use]
    pub const fn core_min(&self) -> Vector3i {
        self.core_min
    }

    /// Maximum corner (exclusive) of the core region.
    #[must_use]
    pub fn core_max(&self) -> Vector3i {
        let width = self.core_width as i32;
        Vector3i::new(self.core_min.x + width, self.volume.max().y, self.core_min.z + width)
    }

    /// Width of the core region.
    #[must_use]
    pub const fn core_width(&self) -> usize {
        self.core_width
    }

    /// Padding on each horizontal side.
    #[must_use]
    pub const fn pad(&self) -> i32 {
        self.pad
    }

    /// Minimum corner of the whole buffer, padding included.
    #[must_use]
    pub const fn min(&self) -> Vector3i {
        self.volume.min()
    }

    /// Maximum corner (exclusive) of the whole buffer.
    #[must_use]
    pub const fn max(&self) -> Vector3i {
        self.volume.max()
    }

    /// Returns true if the position lies inside the padded extent.
    #[must_use]
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        self.volume.contains(x, y, z)
    }

    /// Returns true if the column lies inside the core region.
    #[must_use]
    pub fn in_core(&self, x: i32, z: i32) -> bool {
        let max = self.core_max();
        (self.core_min.x..max.x).contains(&x) && (self.core_min.z..max.z).contains(&z)
    }

    /// Block at an absolute position.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` outside the padded extent.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> GenResult<BlockState> {
        self.volume.get(x, y, z)
    }

    /// Writes a block at an absolute position.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` outside the padded extent; nothing is written.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, state: BlockState) -> GenResult<()> {
        self.volume.set(x, y, z, state)?;
        self.touched.insert(ChunkPos::from_block(x, z));
        Ok(())
    }

    /// Highest non-air Y in a column, if any.
    #[must_use]
    pub fn top_non_air(&self, x: i32, z: i32) -> Option<i32> {
        self.volume.top_non_air(x, z)
    }

    /// Chunks that received at least one write.
    #[must_use]
    pub const fn touched_chunks(&self) -> &BTreeSet<ChunkPos> {
        &self.touched
    }

    /// Chunks overlapping the padded extent.
    #[must_use]
    pub fn spanned_chunks(&self) -> Vec<ChunkPos> {
        let min = self.min();
        let max = self.max();
        let low = ChunkPos::from_block(min.x, min.z);
        let high = ChunkPos::from_block(max.x - 1, max.z - 1);

        let mut chunks = Vec::new();
        for cz in low.z..=high.z {
            for cx in low.x..=high.x {
                chunks.push(ChunkPos::new(cx, cz));
            }
        }
        chunks
    }

    pub(crate) const fn volume(&self) -> &BlockVolume {
        &self.volume
    }

    pub(crate) fn volume_mut(&mut self) -> &mut BlockVolume {
        &mut self.volume
    }
}
