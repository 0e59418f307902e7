//! Random sampling helpers.

use lux_math::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, UnitSphere};

/// Sums shorter than this are resampled when building a bounce direction.
const MIN_DIRECTION_LENGTH: f32 = 1e-6;

/// Uniformly distributed point on the unit sphere.
pub fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let [x, y, z]: [f32; 3] = UnitSphere.sample(rng);
    Vec3::new(x, y, z)
}

/// Diffuse bounce direction: `normalize(normal + random_unit_vector())`.
///
/// Resamples when the sum nearly cancels out.
pub fn diffuse_direction<R: Rng + ?Sized>(normal: Vec3, rng: &mut R) -> Vec3 {
    loop {
        let direction = normal + random_unit_vector(rng);
        let length = direction.length();
        if length > MIN_DIRECTION_LENGTH {
            return direction / length;
        }
    }
}

/// SplitMix64 finalizer.
fn mix(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Independent generator for one image row.
///
/// Depends only on `(seed, row)`, so images do not change with the
/// number of threads.
pub fn row_rng(seed: u64, row: usize) -> StdRng {
    let stream = mix(seed.wrapping_add((row as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15)));
    StdRng::seed_from_u64(stream)
}
