//! the permutation prior: a raw-geometric, pop-from-queue sampler biased
//! toward permutations close to identity (the secret mapping is assumed to
//! be a handful of rank confusions, not an arbitrary shuffle), together with
//! the matching analytic density `compute_prior` needs for Metropolis-
//! Hastings acceptance ratios.
//!
//! grounded in `permutation_filter.cpp`'s `PriorSample`/`ComputePrior`.

use crate::cards::Permutation;
use crate::GEOMETRIC_P;
use rand::Rng;
use rand_distr::{Distribution, Geometric};

/// terms of the wraparound sum `compute_prior` needs, and the cutoff past
/// which `0.75^n` is negligible -- both lifted verbatim from the original's
/// `pow_precompute_` (a `std::array<double, 40>` of `0.75^i`).
const WRAP_TERMS: i32 = 5;
const POW_CUTOFF: i32 = 40;

/// draw a raw `Geometric(0.25)` value for each of the 13 slots, reduce it
/// modulo the size of the still-unassigned pool, and pop that element off
/// the front. small geometric draws are far more likely than large ones, so
/// early pool positions -- and hence the identity permutation -- dominate,
/// without the mod-reduction ever ruling a permutation out.
pub fn sample(rng: &mut impl Rng) -> Permutation {
    let geometric = Geometric::new(GEOMETRIC_P).expect("0 < GEOMETRIC_P < 1");
    let mut pool: Vec<u8> = (0..13).collect();
    let mut values = [0u8; 13];
    for slot in values.iter_mut() {
        let s: u64 = geometric.sample(rng);
        let pop_i = (s as usize) % pool.len();
        *slot = pool.remove(pop_i);
    }
    Permutation::new(values)
}

/// the density `sample` draws from, for a specific permutation. walks
/// `perm_val` from 0 to 12 in the same order `sample` assigns slots, and for
/// each one recovers the offset `s` the raw geometric draw must have landed
/// on (before mod-reduction) to have popped `true_val = perm[perm_val]` off
/// the front of the pool, then sums the geometric pmf over every `s` that
/// reduces to that offset: `s`, `s + pool_size`, `s + 2*pool_size`, ...
pub fn compute_prior(perm: &Permutation) -> f64 {
    let mut prob = 1.0f64;
    // `queue_pos[v]` is how many not-yet-popped values less than `v` remain,
    // i.e. `v`'s offset within the current pool if `v` is still in it.
    let mut queue_pos: [i32; 13] = std::array::from_fn(|i| i as i32);

    for perm_val in 0u8..13 {
        let true_val = perm.values()[perm_val as usize] as usize;

        for q in queue_pos.iter_mut().skip(true_val + 1) {
            *q -= 1;
        }

        let s = queue_pos[true_val];
        let pool_size = 13 - perm_val as i32;
        let mut prob_sum = 0.0f64;
        for i in 0..WRAP_TERMS {
            let s_wrap = s + i * pool_size;
            if s_wrap < POW_CUTOFF {
                prob_sum += GEOMETRIC_P * (0.75f64).powi(s_wrap);
            }
        }
        prob *= prob_sum;
    }

    prob
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn samples_are_always_valid_permutations() {
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..500 {
            assert!(sample(&mut rng).is_valid());
        }
    }

    #[test]
    fn identity_has_higher_prior_mass_than_a_full_reversal() {
        let identity = Permutation::identity();
        let reversed = Permutation::new([12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0]);
        assert!(compute_prior(&identity) > compute_prior(&reversed));
    }

    #[test]
    fn prior_is_a_valid_probability() {
        let mut rng = SmallRng::seed_from_u64(2);
        for _ in 0..100 {
            let perm = sample(&mut rng);
            let p = compute_prior(&perm);
            assert!(p > 0.0 && p <= 1.0, "prior {p} out of range");
        }
    }
}
