//! # Simplex Noise
//!
//! Deterministic 2D simplex noise used for climate, elevation and the
//! per-chunk stone noise that drives surface layering.
//!
//! ## Determinism Guarantee
//!
//! Given the same `WorldSeed`, this implementation will produce
//! **exactly** the same values on any platform, any time. The
//! permutation is a ChaCha-driven shuffle, never a thread-local RNG.

use rand::seq::SliceRandom;

use crate::rng::WorldSeed;

/// Skewing factor for the 2D simplex grid: (sqrt(3) - 1) / 2.
const F2: f64 = 0.366_025_403_784_439;
/// Unskewing factor for the 2D simplex grid: (3 - sqrt(3)) / 6.
const G2: f64 = 0.211_324_865_405_187;
/// Normalizes the summed corner contributions to [-1, 1].
const OUTPUT_SCALE: f64 = 70.0;

/// 12 gradient directions for 2D simplex.
const GRADIENTS: [(f64, f64); 12] = [
    (1.0, 0.0),
    (1.0, 1.0),
    (0.0, 1.0),
    (-1.0, 1.0),
    (-1.0, 0.0),
    (-1.0, -1.0),
    (0.0, -1.0),
    (1.0, -1.0),
    (1.0, 0.0),
    (0.0, 1.0),
    (-1.0, 0.0),
    (0.0, -1.0),
];

/// Doubled permutation table so lookups never wrap.
#[derive(Clone)]
struct Permutation([u8; 512]);

impl Permutation {
    fn shuffled(seed: WorldSeed) -> Self {
        let mut base: Vec<u8> = (0..=255).collect();
        base.shuffle(&mut seed.rng());

        let mut table = [0u8; 512];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = base[i & 255];
        }
        Self(table)
    }

    #[inline]
    fn hash(&self, i: i32, j: i32) -> usize {
        let inner = usize::from(self.0[(j & 255) as usize]);
        usize::from(self.0[(i & 255) as usize + inner])
    }
}

/// 2D Simplex noise generator.
///
/// Produces smooth, continuous noise values in the range [-1, 1].
///
/// # Example
///
/// ```rust
/// use strata_worldgen::noise::SimplexNoise;
/// use strata_worldgen::WorldSeed;
///
/// let noise = SimplexNoise::new(WorldSeed::new(42));
/// let value = noise.sample(100.5, 200.3);
/// assert!((-1.0..=1.0).contains(&value));
/// ```
#[derive(Clone)]
pub struct SimplexNoise {
    perm: Permutation,
}

impl std::fmt::Debug for SimplexNoise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimplexNoise").finish_non_exhaustive()
    }
}

impl SimplexNoise {
    /// Creates a new simplex noise generator from a seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            perm: Permutation::shuffled(seed),
        }
    }

    /// Samples 2D simplex noise at the given coordinates.
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let skew = (x + y) * F2;
        let i = fast_floor(x + skew);
        let j = fast_floor(y + skew);

        let unskew = f64::from(i + j) * G2;
        let x0 = x - (f64::from(i) - unskew);
        let y0 = y - (f64::from(j) - unskew);

        // Upper or lower triangle of the skewed cell
        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let corners = [
            (x0, y0, self.perm.hash(i, j)),
            (
                x0 - f64::from(i1) + G2,
                y0 - f64::from(j1) + G2,
                self.perm.hash(i + i1, j + j1),
            ),
            (
                x0 - 1.0 + 2.0 * G2,
                y0 - 1.0 + 2.0 * G2,
                self.perm.hash(i + 1, j + 1),
            ),
        ];

        let total: f64 = corners
            .iter()
            .map(|&(cx, cy, hash)| corner(cx, cy, hash))
            .sum();

        OUTPUT_SCALE * total
    }

    /// Fractal noise: `octaves` layers, each `lacunarity` times the
    /// frequency and `persistence` times the amplitude of the last.
    ///
    /// Normalized back to roughly [-1, 1].
    #[must_use]
    pub fn octaved(&self, x: f64, y: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..octaves {
            total += self.sample(x * frequency, y * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        if max_amplitude == 0.0 {
            0.0
        } else {
            total / max_amplitude
        }
    }

    /// Ridged noise in [0, 1], sharp crests where the base noise crosses 0.
    #[must_use]
    pub fn ridged(&self, x: f64, y: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..octaves {
            let ridge = 1.0 - self.sample(x * frequency, y * frequency).abs();
            total += ridge * ridge * amplitude;
            max_amplitude += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        if max_amplitude == 0.0 {
            0.0
        } else {
            total / max_amplitude
        }
    }

    /// Fills `out` with a `width × depth` grid of octaved samples.
    ///
    /// Entry `dz * width + dx` holds the value at
    /// `((origin_x + dx) · scale, (origin_z + dz) · scale)`.
    ///
    /// # Panics
    ///
    /// Panics if `out` is shorter than `width * depth`.
    #[allow(clippy::too_many_arguments)]
    pub fn fill_region(
        &self,
        out: &mut [f64],
        origin_x: i32,
        origin_z: i32,
        width: usize,
        depth: usize,
        scale: f64,
        octaves: u32,
    ) {
        assert!(out.len() >= width * depth, "Output slice too small for region");

        for dz in 0..depth {
            let wz = f64::from(origin_z) + dz as f64;
            for dx in 0..width {
                let wx = f64::from(origin_x) + dx as f64;
                out[dz * width + dx] = self.octaved(wx * scale, wz * scale, octaves, 0.5, 2.0);
            }
        }
    }
}

#[inline]
fn corner(x: f64, y: f64, hash: usize) -> f64 {
    let t = 0.5 - x * x - y * y;
    if t < 0.0 {
        return 0.0;
    }
    let (gx, gy) = GRADIENTS[hash % GRADIENTS.len()];
    let t2 = t * t;
    t2 * t2 * (x * gx + y * gy)
}

/// Floor without the libm call.
#[inline]
fn fast_floor(x: f64) -> i32 {
    let xi = x as i32;
    if x < f64::from(xi) {
        xi - 1
    } else {
        xi
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let seed = WorldSeed::new(12345);
        let noise1 = SimplexNoise::new(seed);
        let noise2 = SimplexNoise::new(seed);

        for i in 0..100 {
            let x = f64::from(i) * 0.1;
            let y = f64::from(i) * 0.17;
            assert_eq!(noise1.sample(x, y), noise2.sample(x, y), "Noise should be deterministic");
        }
    }

    #[test]
    fn test_different_seeds_different_results() {
        let noise1 = SimplexNoise::new(WorldSeed::new(1));
        let noise2 = SimplexNoise::new(WorldSeed::new(2));

        let differs = (0..32).any(|i| {
            let p = f64::from(i) * 3.7 + 0.5;
            noise1.sample(p, p * 0.5) != noise2.sample(p, p * 0.5)
        });
        assert!(differs, "Different seeds should produce different results");
    }

    #[test]
    fn test_range() {
        let noise = SimplexNoise::new(WorldSeed::new(42));

        for i in 0..10000 {
            let x = f64::from(i) * 0.1 - 500.0;
            let y = f64::from(i) * 0.13 - 650.0;
            let value = noise.sample(x, y);

            assert!((-1.0..=1.0).contains(&value), "Value {value} out of range at ({x}, {y})");
        }
    }

    #[test]
    fn test_continuity() {
        let noise = SimplexNoise::new(WorldSeed::new(42));
        let v1 = noise.sample(100.0, 100.0);
        let v2 = noise.sample(100.001, 100.0);

        assert!((v1 - v2).abs() < 0.01, "Noise should be continuous");
    }

    #[test]
    fn test_ridged_range() {
        let noise = SimplexNoise::new(WorldSeed::new(9));
        for i in 0..500 {
            let v = noise.ridged(f64::from(i) * 0.37, f64::from(i) * 0.11, 4, 0.5, 2.0);
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_fill_region_matches_point_samples() {
        let noise = SimplexNoise::new(WorldSeed::new(3));
        let mut grid = [0.0; 16 * 16];
        noise.fill_region(&mut grid, -16, 32, 16, 16, 0.0625, 4);

        let expected = noise.octaved(f64::from(-16 + 5) * 0.0625, f64::from(32 + 7) * 0.0625, 4, 0.5, 2.0);
        assert_eq!(grid[7 * 16 + 5], expected);
    }

    #[test]
    fn test_fast_floor() {
        assert_eq!(fast_floor(1.5), 1);
        assert_eq!(fast_floor(-1.5), -2);
        assert_eq!(fast_floor(-2.0), -2);
        assert_eq!(fast_floor(0.0), 0);
    }
}
