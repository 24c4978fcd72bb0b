//! # Coordinates
//!
//! Block positions are absolute `i32` triples. Chunks are 16×16 columns
//! identified by their `(x, z)` index in the chunk grid.

use std::fmt;
use std::ops::{Add, Sub};

/// Chunk width/depth in blocks.
pub const CHUNK_WIDTH: usize = 16;

/// Columns in one chunk footprint.
pub const COLUMNS_PER_CHUNK: usize = CHUNK_WIDTH * CHUNK_WIDTH;

/// An absolute block position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Vector3i {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate (height).
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl Vector3i {
    /// The origin.
    pub const ZERO: Self = Self::new(0, 0, 0);

    /// Creates a new position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Squared horizontal distance, ignoring Y.
    #[inline]
    #[must_use]
    pub fn horizontal_distance_sq(self, other: Self) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dz = i64::from(self.z - other.z);
        dx * dx + dz * dz
    }

    /// Returns the chunk containing this position.
    #[inline]
    #[must_use]
    pub const fn chunk(self) -> ChunkPos {
        ChunkPos::from_block(self.x, self.z)
    }
}

impl Add for Vector3i {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3i {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl fmt::Display for Vector3i {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Chunk coordinate (identifies a 16×16 column in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPos {
    /// X coordinate (in chunks, not blocks).
    pub x: i32,
    /// Z coordinate (in chunks, not blocks).
    pub z: i32,
}

impl ChunkPos {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Converts absolute block coordinates to the owning chunk.
    #[inline]
    #[must_use]
    pub const fn from_block(block_x: i32, block_z: i32) -> Self {
        Self {
            x: block_x.div_euclid(CHUNK_WIDTH as i32),
            z: block_z.div_euclid(CHUNK_WIDTH as i32),
        }
    }

    /// World X of the chunk's minimum corner.
    #[inline]
    #[must_use]
    pub const fn min_block_x(self) -> i32 {
        self.x * CHUNK_WIDTH as i32
    }

    /// World Z of the chunk's minimum corner.
    #[inline]
    #[must_use]
    pub const fn min_block_z(self) -> i32 {
        self.z * CHUNK_WIDTH as i32
    }

    /// Returns the neighbouring chunk at the given chunk offset.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            z: self.z + dz,
        }
    }

    /// Squared distance in chunk units.
    #[inline]
    #[must_use]
    pub fn distance_sq(self, other: Self) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dz = i64::from(self.z - other.z);
        dx * dx + dz * dz
    }

    /// Returns true if the absolute column lies in this chunk.
    #[inline]
    #[must_use]
    pub const fn contains_column(self, block_x: i32, block_z: i32) -> bool {
        block_x.div_euclid(CHUNK_WIDTH as i32) == self.x
            && block_z.div_euclid(CHUNK_WIDTH as i32) == self.z
    }
}

impl From<(i32, i32)> for ChunkPos {
    fn from(value: (i32, i32)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_from_block() {
        assert_eq!(ChunkPos::from_block(0, 0), ChunkPos::new(0, 0));
        assert_eq!(ChunkPos::from_block(15, 15), ChunkPos::new(0, 0));
        assert_eq!(ChunkPos::from_block(16, 16), ChunkPos::new(1, 1));
        assert_eq!(ChunkPos::from_block(-1, -1), ChunkPos::new(-1, -1));
        assert_eq!(ChunkPos::from_block(-16, -16), ChunkPos::new(-1, -1));
        assert_eq!(ChunkPos::from_block(-17, -17), ChunkPos::new(-2, -2));
    }

    #[test]
    fn test_chunk_corners() {
        let pos = ChunkPos::new(-2, 3);
        assert_eq!(pos.min_block_x(), -32);
        assert_eq!(pos.min_block_z(), 48);
        assert!(pos.contains_column(-32, 63));
        assert!(!pos.contains_column(-33, 48));
        assert_eq!(pos.offset(1, -1), ChunkPos::new(-1, 2));
    }

    #[test]
    fn test_vector_math() {
        let a = Vector3i::new(1, 2, 3);
        let b = Vector3i::new(4, 0, 7);
        assert_eq!(a + b, Vector3i::new(5, 2, 10));
        assert_eq!(b - a, Vector3i::new(3, -2, 4));
        assert_eq!(a.horizontal_distance_sq(b), 9 + 16);
        assert_eq!(Vector3i::new(-1, 0, 16).chunk(), ChunkPos::new(-1, 1));
    }
}
