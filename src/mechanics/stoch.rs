/// Stochastic mechanics: scoped RNG streams and the draws built on them.
/// Note: every game and every trial builds its own `bevy_prng::WyRand` from a
/// `u64` seed and threads it by `&mut`; nothing is shared across calls.
use bevy_prng::WyRand;
use rand::Rng;
use rand::seq::index;
use rand_core::SeedableRng;

use crate::mechanics::response::Action;

/// Upper bound (exclusive) of the range batch seeds are drawn from.
pub const SEED_SPACE: u64 = 1_000_000_000;

/// A fresh stream for `seed`. Same seed, same sequence.
#[inline]
pub fn stream(seed: u64) -> WyRand {
    WyRand::from_seed(seed.to_le_bytes())
}

/// Uniform integer in `[lo, hi]` (inclusive). Caller guarantees `lo <= hi`.
#[inline]
pub fn uniform_int(rng: &mut WyRand, lo: i64, hi: i64) -> i64 {
    rng.random_range(lo..=hi)
}

/// Fair draw over the two actions.
#[inline]
pub fn coin(rng: &mut WyRand) -> Action {
    if rng.random_range(0..=1u8) == 0 { Action::First } else { Action::Second }
}

/// `n` distinct seeds from `0..SEED_SPACE`, in draw order.
/// Returns `None` when `n` exceeds the seed space.
pub fn sample_seeds(rng: &mut WyRand, n: usize) -> Option<Vec<u64>> {
    let space = SEED_SPACE as usize;
    if n > space {
        return None;
    }
    Some(index::sample(rng, space, n).into_iter().map(|i| i as u64).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn same_seed_same_stream() {
        let mut a = stream(132);
        let mut b = stream(132);
        let xs: Vec<i64> = (0..16).map(|_| uniform_int(&mut a, -100, 100)).collect();
        let ys: Vec<i64> = (0..16).map(|_| uniform_int(&mut b, -100, 100)).collect();
        assert_eq!(xs, ys);
        assert!(xs.iter().all(|x| (-100..=100).contains(x)));
    }

    #[test]
    fn degenerate_range_is_constant() {
        let mut r = stream(7);
        assert!((0..32).all(|_| uniform_int(&mut r, 4, 4) == 4));
    }

    #[test]
    fn coin_hits_both_sides() {
        let mut r = stream(99);
        let draws: HashSet<Action> = (0..64).map(|_| coin(&mut r)).collect();
        assert_eq!(draws.len(), 2);
    }

    #[test]
    fn sampled_seeds_are_distinct_and_in_range() {
        let mut r = stream(1);
        let seeds = sample_seeds(&mut r, 500).unwrap();
        assert_eq!(seeds.len(), 500);
        let uniq: HashSet<u64> = seeds.iter().copied().collect();
        assert_eq!(uniq.len(), 500);
        assert!(seeds.iter().all(|s| *s < SEED_SPACE));
    }
}
