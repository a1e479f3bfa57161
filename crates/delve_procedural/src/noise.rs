//! # Noise Field
//!
//! Deterministic simplex noise plus the per-session offsets that turn it
//! into the terrain and ore density fields used by the world builder.
//!
//! ## Determinism Guarantee
//!
//! Given the same `WorldSeed`, the same `NoiseOffsets` and the same scale,
//! every sample is **exactly** the same on any platform, any time.
//! Offsets are drawn once per session start and then frozen.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Smallest scale a noise field will divide by.
///
/// Zero, negative and non-finite scales are clamped up to this value.
pub const MIN_NOISE_SCALE: f64 = 1.0e-4;

/// Terrain offsets are drawn from `[0, TERRAIN_OFFSET_SPAN)`.
pub const TERRAIN_OFFSET_SPAN: f64 = 9_999.0;

/// Ore offsets are drawn from `[ORE_OFFSET_BASE, ORE_OFFSET_BASE + TERRAIN_OFFSET_SPAN)`.
pub const ORE_OFFSET_BASE: f64 = 10_000.0;

/// Seed purpose used when deriving the offset stream.
const OFFSET_STREAM: u64 = 0x0FF5_E7;

/// World seed for deterministic generation.
///
/// All procedural generation derives from this seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives a sub-seed for a specific purpose (e.g., stage index).
    ///
    /// Uses a hash function to create independent streams from one seed.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        // FNV-1a style mixing
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(42)
    }
}

/// Pre-computed permutation table for noise.
///
/// This is computed once from the seed and reused.
#[derive(Clone)]
struct PermutationTable {
    /// 512-entry permutation table (256 entries, doubled for overflow handling).
    perm: [u8; 512],
}

impl PermutationTable {
    /// 12 gradient vectors for 2D simplex.
    const GRADIENTS: [[i8; 2]; 12] = [
        [1, 0], [1, 1], [0, 1], [-1, 1],
        [-1, 0], [-1, -1], [0, -1], [1, -1],
        [1, 0], [0, 1], [-1, 0], [0, -1],
    ];

    fn new(seed: WorldSeed) -> Self {
        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().take(256).enumerate() {
            *slot = i as u8;
        }

        // Fisher-Yates shuffle driven by xorshift64
        let mut rng_state = seed.value() | 1;
        for i in (1..256).rev() {
            rng_state ^= rng_state << 13;
            rng_state ^= rng_state >> 7;
            rng_state ^= rng_state << 17;

            let j = (rng_state as usize) % (i + 1);
            perm.swap(i, j);
        }

        for i in 0..256 {
            perm[256 + i] = perm[i];
        }

        Self { perm }
    }

    #[inline]
    fn get(&self, index: usize) -> u8 {
        self.perm[index & 511]
    }

    #[inline]
    fn gradient(hash: u8) -> [i8; 2] {
        Self::GRADIENTS[(hash % 12) as usize]
    }
}

/// 2D Simplex noise generator.
///
/// Produces smooth, continuous noise values in the range [-1, 1].
#[derive(Clone)]
pub struct SimplexNoise {
    perm_table: PermutationTable,
}

impl SimplexNoise {
    /// Skewing factor for 2D simplex grid.
    const F2: f64 = 0.366_025_403_784_439; // (sqrt(3) - 1) / 2
    /// Unskewing factor for 2D simplex grid.
    const G2: f64 = 0.211_324_865_405_187; // (3 - sqrt(3)) / 6

    /// Creates a new simplex noise generator from a seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            perm_table: PermutationTable::new(seed),
        }
    }

    /// Samples 2D simplex noise at the given coordinates.
    ///
    /// # Returns
    ///
    /// A value in the range [-1, 1].
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let skew = (x + y) * Self::F2;
        let i = fast_floor(x + skew);
        let j = fast_floor(y + skew);

        let unskew = f64::from(i + j) * Self::G2;
        let x0 = x - (f64::from(i) - unskew);
        let y0 = y - (f64::from(j) - unskew);

        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - i1 as f64 + Self::G2;
        let y1 = y0 - j1 as f64 + Self::G2;
        let x2 = x0 - 1.0 + 2.0 * Self::G2;
        let y2 = y0 - 1.0 + 2.0 * Self::G2;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;

        let gi0 = self.perm_table.get(ii + self.perm_table.get(jj) as usize);
        let gi1 = self
            .perm_table
            .get(ii + i1 + self.perm_table.get(jj + j1) as usize);
        let gi2 = self.perm_table.get(ii + 1 + self.perm_table.get(jj + 1) as usize);

        let n0 = Self::contribution(x0, y0, gi0);
        let n1 = Self::contribution(x1, y1, gi1);
        let n2 = Self::contribution(x2, y2, gi2);

        // 70.0 normalizes the sum to [-1, 1]
        (70.0 * (n0 + n1 + n2)).clamp(-1.0, 1.0)
    }

    #[inline]
    fn contribution(x: f64, y: f64, gradient_index: u8) -> f64 {
        let t = 0.5 - x * x - y * y;
        if t < 0.0 {
            0.0
        } else {
            let grad = PermutationTable::gradient(gradient_index);
            let t2 = t * t;
            t2 * t2 * (x * f64::from(grad[0]) + y * f64::from(grad[1]))
        }
    }
}

/// Fast floor function.
#[inline]
fn fast_floor(x: f64) -> i32 {
    let xi = x as i32;
    if x < f64::from(xi) {
        xi - 1
    } else {
        xi
    }
}

/// Clamps a scale to a usable positive value.
#[inline]
#[must_use]
pub fn clamp_scale(scale: f64) -> f64 {
    if scale.is_finite() && scale > MIN_NOISE_SCALE {
        scale
    } else {
        MIN_NOISE_SCALE
    }
}

/// Offsets that shift the sampled region of the noise plane.
///
/// Drawn once per session start, then frozen for the whole session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoiseOffsets {
    /// Terrain offsets on (x, z).
    pub terrain: [f64; 2],
    /// Ore offsets on (x, y, z).
    pub ore: [f64; 3],
}

impl NoiseOffsets {
    /// Draws offsets from a ChaCha8 stream derived from the seed.
    #[must_use]
    pub fn randomize(seed: WorldSeed) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.derive(OFFSET_STREAM).value());
        let terrain = [
            rng.gen_range(0.0..TERRAIN_OFFSET_SPAN),
            rng.gen_range(0.0..TERRAIN_OFFSET_SPAN),
        ];
        let ore_range = ORE_OFFSET_BASE..ORE_OFFSET_BASE + TERRAIN_OFFSET_SPAN;
        let ore = [
            rng.gen_range(ore_range.clone()),
            rng.gen_range(ore_range.clone()),
            rng.gen_range(ore_range),
        ];
        Self { terrain, ore }
    }
}

/// Seeded terrain and ore density sampler.
///
/// # Example
///
/// ```rust,ignore
/// let field = NoiseField::new(WorldSeed::new(42), 20.0, 10.0);
/// let height01 = field.sample_2d(3.0, 7.0);
/// let density = field.sample_3d(3.0, -2.0, 7.0);
/// ```
#[derive(Clone)]
pub struct NoiseField {
    noise: SimplexNoise,
    offsets: NoiseOffsets,
    terrain_scale: f64,
    ore_scale: f64,
}

impl NoiseField {
    /// Creates a field with offsets drawn from the seed.
    #[must_use]
    pub fn new(seed: WorldSeed, terrain_scale: f64, ore_scale: f64) -> Self {
        Self::with_offsets(seed, NoiseOffsets::randomize(seed), terrain_scale, ore_scale)
    }

    /// Creates a field with explicit, frozen offsets.
    #[must_use]
    pub fn with_offsets(
        seed: WorldSeed,
        offsets: NoiseOffsets,
        terrain_scale: f64,
        ore_scale: f64,
    ) -> Self {
        let clamped_terrain = clamp_scale(terrain_scale);
        let clamped_ore = clamp_scale(ore_scale);
        if clamped_terrain != terrain_scale || clamped_ore != ore_scale {
            tracing::warn!(
                terrain_scale,
                ore_scale,
                "degenerate noise scale clamped to {MIN_NOISE_SCALE}"
            );
        }
        Self {
            noise: SimplexNoise::new(seed),
            offsets,
            terrain_scale: clamped_terrain,
            ore_scale: clamped_ore,
        }
    }

    /// Returns the frozen offsets.
    #[inline]
    #[must_use]
    pub const fn offsets(&self) -> NoiseOffsets {
        self.offsets
    }

    /// Returns the effective (clamped) terrain scale.
    #[inline]
    #[must_use]
    pub const fn terrain_scale(&self) -> f64 {
        self.terrain_scale
    }

    /// Returns the effective (clamped) ore scale.
    #[inline]
    #[must_use]
    pub const fn ore_scale(&self) -> f64 {
        self.ore_scale
    }

    /// Samples the terrain height field.
    ///
    /// # Returns
    ///
    /// A value in the range [0, 1].
    #[must_use]
    pub fn sample_2d(&self, x: f64, z: f64) -> f64 {
        let [ox, oz] = self.offsets.terrain;
        let s = self.terrain_scale;
        to_unit(self.noise.sample((x + ox) / s, (z + oz) / s))
    }

    /// Samples the ore density field.
    ///
    /// Averages the xy, xz and yz planes so density varies in all three axes.
    ///
    /// # Returns
    ///
    /// A value in the range [0, 1].
    #[must_use]
    pub fn sample_3d(&self, x: f64, y: f64, z: f64) -> f64 {
        let [ox, oy, oz] = self.offsets.ore;
        let s = self.ore_scale;
        let (sx, sy, sz) = ((x + ox) / s, (y + oy) / s, (z + oz) / s);

        let xy = self.noise.sample(sx, sy);
        let xz = self.noise.sample(sx, sz);
        let yz = self.noise.sample(sy, sz);

        to_unit((xy + xz + yz) / 3.0)
    }
}

/// Maps [-1, 1] to [0, 1].
#[inline]
fn to_unit(value: f64) -> f64 {
    ((value + 1.0) * 0.5).clamp(0.0, 1.0)
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
            assert_eq!(
                noise1.sample(x, y),
                noise2.sample(x, y),
                "Noise should be deterministic"
            );
        }
    }

    #[test]
    fn test_simplex_range() {
        let noise = SimplexNoise::new(WorldSeed::new(42));

        for i in 0..10_000 {
            let x = (f64::from(i) * 0.1) - 500.0;
            let y = (f64::from(i) * 0.13) - 650.0;
            let value = noise.sample(x, y);
            assert!(
                (-1.0..=1.0).contains(&value),
                "Value {value} out of range at ({x}, {y})"
            );
        }
    }

    #[test]
    fn test_seed_derivation() {
        let base = WorldSeed::new(42);
        let derived1 = base.derive(1);
        let derived2 = base.derive(2);

        assert_ne!(derived1, derived2, "Different purposes should give different seeds");
        assert_eq!(derived1, base.derive(1), "Same purpose should give same seed");
        assert_ne!(derived1, base, "Derived seed should differ from base");
    }

    #[test]
    fn test_offsets_ranges() {
        for seed in 0..50 {
            let offsets = NoiseOffsets::randomize(WorldSeed::new(seed));
            for o in offsets.terrain {
                assert!((0.0..TERRAIN_OFFSET_SPAN).contains(&o), "terrain offset {o}");
            }
            for o in offsets.ore {
                assert!(
                    (ORE_OFFSET_BASE..ORE_OFFSET_BASE + TERRAIN_OFFSET_SPAN).contains(&o),
                    "ore offset {o}"
                );
            }
        }
    }

    #[test]
    fn test_field_is_pure_function_of_inputs() {
        let seed = WorldSeed::new(7);
        let a = NoiseField::new(seed, 20.0, 10.0);
        let b = NoiseField::with_offsets(seed, a.offsets(), 20.0, 10.0);

        for i in 0..200 {
            let x = f64::from(i);
            let z = f64::from(i * 3 % 17);
            assert_eq!(a.sample_2d(x, z), b.sample_2d(x, z));
            assert_eq!(a.sample_3d(x, -f64::from(i % 5), z), b.sample_3d(x, -f64::from(i % 5), z));
        }
    }

    #[test]
    fn test_field_range() {
        let field = NoiseField::new(WorldSeed::new(99), 20.0, 10.0);
        for x in -30..30 {
            for z in -30..30 {
                let h = field.sample_2d(f64::from(x), f64::from(z));
                let d = field.sample_3d(f64::from(x), f64::from(z % 7), f64::from(z));
                assert!((0.0..=1.0).contains(&h), "2D sample {h} out of range");
                assert!((0.0..=1.0).contains(&d), "3D sample {d} out of range");
            }
        }
    }

    #[test]
    fn test_degenerate_scale_is_clamped() {
        for scale in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            let field = NoiseField::new(WorldSeed::new(1), scale, scale);
            assert_eq!(field.terrain_scale(), MIN_NOISE_SCALE);
            assert_eq!(field.ore_scale(), MIN_NOISE_SCALE);
            let v = field.sample_2d(1.0, 2.0);
            assert!(v.is_finite(), "clamped scale must still sample: {v}");
        }
    }
}
