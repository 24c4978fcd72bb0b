//! # Biome Generation
//!
//! Determines the biome of every column from noise values.
//!
//! Uses a climate model based on:
//! - Temperature (from latitude and elevation)
//! - Humidity (from a separate noise channel)
//! - Elevation (shared with the noise terrain generator)

use strata_core::BiomeId;

use crate::noise::SimplexNoise;
use crate::rng::WorldSeed;

/// Seed purpose for the temperature channel.
const TEMPERATURE_PURPOSE: u64 = 1;
/// Seed purpose for the humidity channel.
const HUMIDITY_PURPOSE: u64 = 2;
/// Seed purpose for the elevation channel.
pub(crate) const ELEVATION_PURPOSE: u64 = 3;

/// Maps absolute columns to biomes.
///
/// Implementations must be pure: the same column always yields the same
/// biome for the lifetime of the generator.
pub trait BiomeGenerator: Send + Sync {
    /// Returns the biome at absolute column `(x, z)`.
    fn biome_at(&self, x: i32, z: i32) -> BiomeId;
}

/// Every column is the same biome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SingleBiomeGenerator(pub BiomeId);

impl BiomeGenerator for SingleBiomeGenerator {
    fn biome_at(&self, _x: i32, _z: i32) -> BiomeId {
        self.0
    }
}

/// Continental elevation in roughly [-1, 1].
///
/// Built from a derived seed so the biome generator and the terrain
/// generator agree on where the oceans are.
#[derive(Clone, Debug)]
pub struct ElevationModel {
    noise: SimplexNoise,
}

impl ElevationModel {
    /// Scale for elevation noise.
    const SCALE: f64 = 0.0025;

    /// Creates the elevation channel for `seed`.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            noise: SimplexNoise::new(seed.derive(ELEVATION_PURPOSE)),
        }
    }

    /// Elevation at absolute column `(x, z)`.
    ///
    /// - `< -0.5`: deep water
    /// - `< -0.2`: water
    /// - `< 0.0`: low land
    /// - `< 0.5`: normal land
    /// - `>= 0.5`: mountains
    #[must_use]
    pub fn elevation(&self, x: f64, z: f64) -> f64 {
        let base = self.noise.octaved(x * Self::SCALE, z * Self::SCALE, 4, 0.5, 2.0);
        let ridged = self.noise.ridged(x * Self::SCALE * 1.5, z * Self::SCALE * 1.5, 3, 0.5, 2.0);

        Self::curve(base * 0.8 + ridged * 0.2)
    }

    /// Flattens valleys into walkable plains, keeps mountains steep.
    #[inline]
    fn curve(elevation: f64) -> f64 {
        if elevation < -0.3 {
            elevation
        } else if elevation < -0.1 {
            -0.3 + (elevation + 0.3) * 0.5
        } else if elevation < 0.3 {
            // [-0.1, 0.3] -> [-0.2, 0.1]
            let t = (elevation + 0.1) / 0.4;
            -0.2 + t * 0.3
        } else if elevation < 0.5 {
            // [0.3, 0.5] -> [0.1, 0.4]
            let t = (elevation - 0.3) / 0.2;
            0.1 + t * 0.3
        } else {
            // [0.5, 1.0] -> [0.4, 1.0]
            let t = (elevation - 0.5) / 0.5;
            0.4 + t * 0.6
        }
    }

    /// Surface Y for a column, clamped to `[1, world_height - 1]`.
    #[must_use]
    pub fn surface_height(&self, x: i32, z: i32, sea_level: i32, world_height: i32) -> i32 {
        let elevation = self.elevation(f64::from(x), f64::from(z));

        let range = (world_height - sea_level).max(2);
        let offset = ((elevation + 1.0) * 0.5 * f64::from(range)) as i32;

        (sea_level + offset - range / 2).clamp(1, (world_height - 1).max(1))
    }
}

/// Climate-driven biome generator.
///
/// Uses three noise channels; deterministic per seed.
#[derive(Clone, Debug)]
pub struct ClimateBiomeGenerator {
    temperature: SimplexNoise,
    humidity: SimplexNoise,
    elevation: ElevationModel,
}

impl ClimateBiomeGenerator {
    /// Scale for temperature noise (larger = more gradual changes).
    const TEMPERATURE_SCALE: f64 = 0.002;
    /// Scale for humidity noise.
    const HUMIDITY_SCALE: f64 = 0.003;

    /// Creates a new climate generator from a world seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            temperature: SimplexNoise::new(seed.derive(TEMPERATURE_PURPOSE)),
            humidity: SimplexNoise::new(seed.derive(HUMIDITY_PURPOSE)),
            elevation: ElevationModel::new(seed),
        }
    }

    /// The elevation channel, shared with terrain.
    #[must_use]
    pub const fn elevation_model(&self) -> &ElevationModel {
        &self.elevation
    }

    /// Temperature in [-1, 1]; colder away from z = 0 and at altitude.
    #[must_use]
    pub fn temperature(&self, x: f64, z: f64, elevation: f64) -> f64 {
        let base = self
            .temperature
            .sample(x * Self::TEMPERATURE_SCALE, z * Self::TEMPERATURE_SCALE);

        let latitude = (z.abs() * 0.0001).min(1.0);
        let altitude = elevation.max(0.0) * 0.5;

        (base - latitude * 0.5 - altitude).clamp(-1.0, 1.0)
    }

    /// Humidity in roughly [-1, 1].
    #[must_use]
    pub fn humidity(&self, x: f64, z: f64) -> f64 {
        self.humidity
            .octaved(x * Self::HUMIDITY_SCALE, z * Self::HUMIDITY_SCALE, 4, 0.5, 2.0)
    }

    /// Classifies a biome from climate values.
    #[must_use]
    pub fn classify(elevation: f64, temperature: f64, humidity: f64) -> BiomeId {
        if elevation < -0.5 {
            return BiomeId::DEEP_OCEAN;
        }
        if elevation < -0.2 {
            return BiomeId::OCEAN;
        }
        if elevation < -0.1 {
            return BiomeId::BEACH;
        }

        if elevation > 0.7 {
            return if temperature < -0.2 {
                BiomeId::SNOWY_PEAKS
            } else {
                BiomeId::MOUNTAINS
            };
        }

        match (temperature, humidity) {
            // Cold
            (t, _) if t < -0.5 => BiomeId::TUNDRA,
            (t, h) if t < -0.2 && h > 0.0 => BiomeId::TAIGA,
            (t, _) if t < -0.2 => BiomeId::TUNDRA,

            // Hot
            (t, h) if t > 0.5 && h < -0.3 => BiomeId::DESERT,
            (t, h) if t > 0.5 && h > 0.5 => BiomeId::JUNGLE,
            (t, h) if t > 0.3 && h < 0.0 => BiomeId::SAVANNA,
            (t, _) if t > 0.6 => BiomeId::BADLANDS,

            // Temperate
            (_, h) if h > 0.5 && elevation < 0.1 => BiomeId::SWAMP,
            (_, h) if h > 0.2 => BiomeId::FOREST,
            _ => BiomeId::PLAINS,
        }
    }
}

impl BiomeGenerator for ClimateBiomeGenerator {
    fn biome_at(&self, x: i32, z: i32) -> BiomeId {
        let (fx, fz) = (f64::from(x), f64::from(z));
        let elevation = self.elevation.elevation(fx, fz);
        let temperature = self.temperature(fx, fz, elevation);
        let humidity = self.humidity(fx, fz);

        Self::classify(elevation, temperature, humidity)
    }
}
