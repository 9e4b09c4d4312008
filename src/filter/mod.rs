//! Permutation Particle Filter (component H): a population of candidate
//! rank permutations, kept consistent with every showdown observed so far
//! by Metropolis-Hastings resampling against [`prior`], and queried for the
//! equity / opponent-strength estimates the policy player needs.
//!
//! grounded in `permutation_filter.hpp`/`permutation_filter.cpp`.

pub mod prior;

use crate::cards::{Card, Permutation, Rank};
use crate::equity::{Equity, EquityQuery, HandEvaluator};
use crate::kmeans::{self, Centroids, OpponentBuckets, StrengthVector};
use crate::equity::preflop::PreflopTable;
use crate::{K_INVALID_RETRIES, K_VALID_RETRIES};
use rand::rngs::SmallRng;
use rand::Rng;
use std::collections::BTreeMap;

/// one observed showdown: both hole-card pairs (as dealt, i.e. under the
/// secret label permutation) and the five-card board. grounded in
/// `ShowdownResult`; held as actual cards rather than OMPEval-ASCII
/// strings, since every other module in this crate already speaks `Card`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowdownResult {
    pub winner_hole: [Card; 2],
    pub loser_hole: [Card; 2],
    pub board: [Card; 5],
}

impl ShowdownResult {
    fn winner_labels(&self) -> [Rank; 2] {
        [self.winner_hole[0].rank(), self.winner_hole[1].rank()]
    }
    fn loser_labels(&self) -> [Rank; 2] {
        [self.loser_hole[0].rank(), self.loser_hole[1].rank()]
    }
    fn board_labels(&self) -> [Rank; 5] {
        std::array::from_fn(|i| self.board[i].rank())
    }
}

fn map_transform(p: &Permutation, cards: &[Card]) -> Vec<Card> {
    cards.iter().map(|&c| p.transform(c)).collect()
}

/// the particle population. holds one candidate [`Permutation`] per
/// particle, a parallel live/dead flag (`dead_indices` doubles as the
/// original's `weights_ == 0` check and its LIFO resurrection queue), a
/// running multiset of distinct permutations (`Unique`/`MaybeAddUnique` in
/// the original), and every showdown it has been updated against so far
/// (needed by `satisfies_all` when repairing a particle).
pub struct PermutationParticleFilter {
    particles: Vec<Permutation>,
    alive: Vec<bool>,
    dead_indices: Vec<usize>,
    unique: BTreeMap<[u8; 13], u32>,
    results: Vec<ShowdownResult>,
}

impl PermutationParticleFilter {
    /// draw `n` particles from [`prior::sample`].
    pub fn new(n: usize, rng: &mut impl Rng) -> Self {
        let mut particles = Vec::with_capacity(n);
        let mut unique = BTreeMap::new();
        for _ in 0..n {
            let p = prior::sample(rng);
            *unique.entry(*p.values()).or_insert(0) += 1;
            particles.push(p);
        }
        Self {
            alive: vec![true; n],
            dead_indices: Vec::new(),
            unique,
            particles,
            results: Vec::new(),
        }
    }

    fn add_unique(&mut self, p: &Permutation) {
        *self.unique.entry(*p.values()).or_insert(0) += 1;
    }

    fn remove_unique(&mut self, p: &Permutation) {
        if let Some(count) = self.unique.get_mut(p.values()) {
            *count -= 1;
            if *count == 0 {
                self.unique.remove(p.values());
            }
        }
    }

    /// number of particles still alive.
    pub fn nonzero(&self) -> usize {
        self.particles.len() - self.dead_indices.len()
    }

    /// number of distinct permutations among the live particles.
    pub fn unique(&self) -> usize {
        self.unique.len()
    }

    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    /// does `p`, mapped onto both hands and the board, have the winner's
    /// hand scoring at least as high as the loser's?
    pub fn satisfies(&self, p: &Permutation, r: &ShowdownResult, evaluator: &impl HandEvaluator) -> bool {
        let seven = |hole: [Card; 2]| -> [Card; 7] {
            let mut cards = [hole[0], hole[1], r.board[0], r.board[1], r.board[2], r.board[3], r.board[4]];
            for c in cards.iter_mut() {
                *c = p.transform(*c);
            }
            cards
        };
        let win_score = evaluator.score(&seven(r.winner_hole));
        let lose_score = evaluator.score(&seven(r.loser_hole));
        win_score >= lose_score
    }

    /// does `p` satisfy every showdown observed so far?
    pub fn satisfies_all(&self, p: &Permutation, evaluator: &impl HandEvaluator) -> bool {
        self.results.iter().all(|r| self.satisfies(p, r, evaluator))
    }

    /// a particle that already satisfies `r`: swap two ranks that can't
    /// move it out of that satisfaction, preferring swaps within one hand
    /// or within the board over swaps touching the undealt "other" ranks.
    /// grounded in `MakeProposalFromValid`.
    fn make_proposal_from_valid(p: &Permutation, r: &ShowdownResult, rng: &mut impl Rng) -> Permutation {
        let win_hand = r.winner_labels();
        let los_hand = r.loser_labels();
        let board = r.board_labels();
        let which: u8 = rng.random_range(0..=12);

        let (vi, vj) = if which < 2 {
            let i = (rng.random_range(0..=3u8) % 2) as usize;
            (win_hand[i], win_hand[(i + 1) % 2])
        } else if which < 4 {
            let i = (rng.random_range(0..=3u8) % 2) as usize;
            (los_hand[i], los_hand[(i + 1) % 2])
        } else if which < 9 {
            let i = rng.random_range(0..=4usize);
            let j = rng.random_range(0..=4usize);
            (board[i], board[j])
        } else {
            let others = other_ranks(&win_hand, &los_hand, &board);
            let i = rng.random_range(0..=3usize);
            let j = rng.random_range(0..=3usize);
            (others[i], others[j])
        };
        p.swapped(vi, vj)
    }

    /// a particle that `r` just invalidated: swap one card from the
    /// winner's or loser's hand with one of the six ranks never dealt
    /// (the "others" pool plus that same hand) -- the repair has to touch
    /// the hand that lost the showdown to have a chance of fixing it.
    /// grounded in `MakeProposalFromInvalid`'s bounded-range variant
    /// (`sampler4(0,3)`/`sampler6(0,5)`), not the wider `(0,4)`/`(0,6)`
    /// variant found elsewhere in the corpus.
    fn make_proposal_from_invalid(p: &Permutation, r: &ShowdownResult, rng: &mut impl Rng) -> Permutation {
        let win_hand = r.winner_labels();
        let los_hand = r.loser_labels();
        let board = r.board_labels();
        let mut pool = other_ranks(&win_hand, &los_hand, &board).to_vec();

        let i = (rng.random_range(0..=3u8) % 2) as usize;
        let j = rng.random_range(0..=5usize);

        let (vi, vj) = if rng.random::<f64>() < 0.5 {
            let vi = win_hand[i];
            pool.extend_from_slice(&win_hand);
            (vi, pool[j])
        } else {
            let vi = los_hand[i];
            pool.extend_from_slice(&los_hand);
            (vi, pool[j])
        };
        p.swapped(vi, vj)
    }

    /// accept `prop` over `orig` with probability `min(1, prior(prop) /
    /// prior(orig))`, and only if the accepted proposal still satisfies
    /// every showdown recorded so far. grounded in `MetropolisHastings`.
    fn metropolis_hastings(
        &self,
        orig: &Permutation,
        prop: &Permutation,
        evaluator: &impl HandEvaluator,
        rng: &mut impl Rng,
    ) -> Option<Permutation> {
        let prior_prop = prior::compute_prior(prop);
        let prior_orig = prior::compute_prior(orig);
        let acceptance = (prior_prop / prior_orig).min(1.0);
        if rng.random::<f64>() < acceptance && self.satisfies_all(prop, evaluator) {
            Some(*prop)
        } else {
            None
        }
    }

    fn sample_mcmc_invalid(
        &self,
        orig: &Permutation,
        r: &ShowdownResult,
        evaluator: &impl HandEvaluator,
        rng: &mut impl Rng,
    ) -> Option<Permutation> {
        let prop = Self::make_proposal_from_invalid(orig, r, rng);
        self.metropolis_hastings(orig, &prop, evaluator, rng)
    }

    fn sample_mcmc_valid(
        &self,
        orig: &Permutation,
        r: &ShowdownResult,
        evaluator: &impl HandEvaluator,
        rng: &mut impl Rng,
    ) -> Option<Permutation> {
        let prop = Self::make_proposal_from_valid(orig, r, rng);
        self.metropolis_hastings(orig, &prop, evaluator, rng)
    }

    /// fold a newly observed showdown into the population: every live
    /// particle it contradicts gets `K_INVALID_RETRIES` chances to repair
    /// itself by MCMC before being killed; every live particle it doesn't
    /// contradict gets `K_VALID_RETRIES` chances to resurrect a dead slot
    /// with a diversifying MCMC sample. grounded in `Update`.
    pub fn update(&mut self, r: ShowdownResult, evaluator: &impl HandEvaluator, rng: &mut impl Rng) {
        if self.nonzero() == 0 {
            self.results.push(r);
            return;
        }

        for i in 0..self.particles.len() {
            if !self.alive[i] {
                continue;
            }
            let p = self.particles[i];

            if !self.satisfies(&p, &r, evaluator) {
                self.remove_unique(&p);
                let mut repaired = None;
                for _ in 0..K_INVALID_RETRIES {
                    if let Some(fixed) = self.sample_mcmc_invalid(&p, &r, evaluator, rng) {
                        repaired = Some(fixed);
                        break;
                    }
                }
                match repaired {
                    Some(fixed) => {
                        self.particles[i] = fixed;
                        self.add_unique(&fixed);
                    }
                    None => {
                        self.alive[i] = false;
                        self.dead_indices.push(i);
                    }
                }
            } else {
                for _ in 0..K_VALID_RETRIES {
                    if self.dead_indices.is_empty() {
                        break;
                    }
                    if let Some(diversified) = self.sample_mcmc_valid(&p, &r, evaluator, rng) {
                        let revived = self.dead_indices.pop().expect("checked non-empty above");
                        self.alive[revived] = true;
                        self.particles[revived] = diversified;
                        self.add_unique(&diversified);
                        break;
                    }
                }
            }
        }

        self.results.push(r);
    }

    fn valid_indices(&self) -> Vec<usize> {
        (0..self.particles.len()).filter(|&i| self.alive[i]).collect()
    }

    /// mean equity of `hand` vs. a uniformly random opponent, averaged over
    /// `nsamples` particles drawn uniformly from the live population, each
    /// mapped through its own candidate permutation before the true-rank
    /// lookup/oracle is consulted. `-1.0` if fewer than `nsamples` particles
    /// are alive. grounded in `ComputeEvRandom`.
    #[allow(clippy::too_many_arguments)]
    pub fn compute_ev_random(
        &self,
        hand: [Card; 2],
        board: &[Card],
        dead: &[Card],
        nsamples: usize,
        iters: usize,
        equity: &impl Equity,
        preflop: &PreflopTable,
        rng: &mut impl Rng,
    ) -> f32 {
        let valid_idx = self.valid_indices();
        if valid_idx.len() < nsamples {
            return -1.0;
        }

        let mut total = 0.0f32;
        for _ in 0..nsamples {
            let rand_idx = valid_idx[rng.random_range(0..valid_idx.len())];
            let perm = &self.particles[rand_idx];
            if board.is_empty() {
                let mapped = [perm.transform(hand[0]), perm.transform(hand[1])];
                total += preflop.get(mapped);
            } else {
                let mapped_hand = [perm.transform(hand[0]), perm.transform(hand[1])];
                let mapped_board: Vec<Card> = map_transform(perm, board);
                let mapped_dead: Vec<Card> = map_transform(perm, dead);
                total += equity.evaluate(
                    EquityQuery::VsRandom { hero: mapped_hand },
                    &mapped_board,
                    &mapped_dead,
                    iters,
                );
            }
        }
        total / nsamples as f32
    }

    /// same sampling scheme as [`Self::compute_ev_random`], but averaging
    /// opponent-strength vectors instead of a scalar equity. `[0.0; 8]` if
    /// fewer than `nsamples` particles are alive. grounded in
    /// `ComputeStrengthRandom`.
    #[allow(clippy::too_many_arguments)]
    pub fn compute_strength_vector_random(
        &self,
        hand: [Card; 2],
        board: &[Card],
        buckets: &OpponentBuckets,
        nsamples: usize,
        iters: usize,
        equity: &impl Equity,
        rng: &mut impl Rng,
    ) -> StrengthVector {
        let valid_idx = self.valid_indices();
        if valid_idx.len() < nsamples {
            return [0.0; 8];
        }

        let mut total = [0.0f32; 8];
        for _ in 0..nsamples {
            let rand_idx = valid_idx[rng.random_range(0..valid_idx.len())];
            let perm = &self.particles[rand_idx];
            let mapped_hand = [perm.transform(hand[0]), perm.transform(hand[1])];
            let mapped_board: Vec<Card> = map_transform(perm, board);
            let sampled = kmeans::strength_vector(buckets, equity, mapped_hand, &mapped_board, iters);
            for (t, s) in total.iter_mut().zip(sampled.iter()) {
                *t += s;
            }
        }
        for t in total.iter_mut() {
            *t /= nsamples as f32;
        }
        total
    }
}

/// every rank that appears in neither hand nor the board: the "undealt"
/// pool `MakeProposalFromValid`/`MakeProposalFromInvalid` swap into.
fn other_ranks(win_hand: &[Rank; 2], los_hand: &[Rank; 2], board: &[Rank; 5]) -> Vec<Rank> {
    let mut mask = [true; 13];
    for &r in win_hand.iter().chain(los_hand.iter()).chain(board.iter()) {
        mask[r as usize] = false;
    }
    (0u8..13).filter(|&i| mask[i as usize]).map(Rank::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equity::StandardEvaluator;
    use rand::SeedableRng;

    fn parse_hand(a: &str, b: &str) -> [Card; 2] {
        [Card::parse(a).unwrap(), Card::parse(b).unwrap()]
    }

    fn parse_board(cards: [&str; 5]) -> [Card; 5] {
        std::array::from_fn(|i| Card::parse(cards[i]).unwrap())
    }

    fn sample_showdown() -> ShowdownResult {
        ShowdownResult {
            winner_hole: parse_hand("As", "Ah"),
            loser_hole: parse_hand("7c", "2d"),
            board: parse_board(["Ks", "Qs", "Js", "3h", "4h"]),
        }
    }

    #[test]
    fn identity_satisfies_an_unpermuted_showdown() {
        let filter = PermutationParticleFilter::new(4, &mut SmallRng::seed_from_u64(1));
        let evaluator = StandardEvaluator;
        assert!(filter.satisfies(&Permutation::identity(), &sample_showdown(), &evaluator));
    }

    #[test]
    fn swapping_winner_and_loser_stops_satisfying() {
        let evaluator = StandardEvaluator;
        let r = sample_showdown();
        // swap ace and 7: now the "winner" hole cards are a pair of 7s losing to king-high.
        let broken = Permutation::identity().swapped(Rank::Ace, Rank::Seven);
        let filter = PermutationParticleFilter::new(1, &mut SmallRng::seed_from_u64(1));
        assert!(!filter.satisfies(&broken, &r, &evaluator));
    }

    #[test]
    fn new_filter_starts_fully_alive_and_update_keeps_it_consistent() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut filter = PermutationParticleFilter::new(64, &mut rng);
        assert_eq!(filter.nonzero(), 64);

        let evaluator = StandardEvaluator;
        filter.update(sample_showdown(), &evaluator, &mut rng);

        assert!(filter.nonzero() <= 64);
        for i in 0..filter.particles.len() {
            if filter.alive[i] {
                assert!(filter.satisfies(&filter.particles[i], &filter.results[0], &evaluator));
            }
        }
    }

    #[test]
    fn update_with_no_live_particles_is_a_noop_that_still_records_the_result() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut filter = PermutationParticleFilter::new(2, &mut rng);
        filter.alive = vec![false; 2];
        filter.dead_indices = vec![0, 1];
        let evaluator = StandardEvaluator;
        filter.update(sample_showdown(), &evaluator, &mut rng);
        assert_eq!(filter.nonzero(), 0);
        assert_eq!(filter.results.len(), 1);
    }

    #[test]
    fn compute_ev_random_reports_sentinel_when_starved_of_particles() {
        let mut rng = SmallRng::seed_from_u64(9);
        let filter = PermutationParticleFilter::new(4, &mut rng);
        let equity = crate::equity::MonteCarloEquity::new(StandardEvaluator);
        let preflop = PreflopTable::generate(&equity, 2);
        let hand = parse_hand("As", "Ah");
        let ev = filter.compute_ev_random(hand, &[], &[], 100, 10, &equity, &preflop, &mut rng);
        assert_eq!(ev, -1.0);
    }

    #[test]
    fn compute_ev_random_uses_preflop_table_when_board_is_empty() {
        let mut rng = SmallRng::seed_from_u64(9);
        let filter = PermutationParticleFilter::new(8, &mut rng);
        let equity = crate::equity::MonteCarloEquity::new(StandardEvaluator);
        let preflop = PreflopTable::generate(&equity, 2);
        let hand = parse_hand("As", "Ah");
        let ev = filter.compute_ev_random(hand, &[], &[], 4, 10, &equity, &preflop, &mut rng);
        assert!((0.0..=1.0).contains(&ev));
    }

    #[test]
    fn other_ranks_excludes_every_dealt_rank() {
        let r = sample_showdown();
        let others = other_ranks(&r.winner_labels(), &r.loser_labels(), &r.board_labels());
        assert_eq!(others.len(), 13 - 2 - 2 - 5 + 0); // no rank repeats across the sample showdown
        for dealt in r.winner_labels().iter().chain(r.loser_labels().iter()).chain(r.board_labels().iter()) {
            assert!(!others.contains(dealt));
        }
    }
}
