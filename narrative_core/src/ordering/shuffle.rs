//! Seeded, reproducible permutations.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a hash of a string.
pub fn hash32(input: &str) -> u32 {
    input.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Generator keyed by a seed string. Same seed, same stream.
pub fn seeded_rng(seed: &str) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(u64::from(hash32(seed)))
}

/// Fisher-Yates permutation driven by `seed`.
pub fn seeded_shuffle<T>(items: &mut [T], seed: &str) {
    let mut rng = seeded_rng(seed);
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}
