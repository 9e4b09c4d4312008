//! Offline opponent-strength clustering (component J). Two clustering
//! passes share one Lloyd's-algorithm primitive, grounded in
//! `hand_clustering.hpp`'s single `kmeans(samples, num_iters, num_clusters)`
//! function used for both layers there:
//!
//! 1. [`OpponentBuckets`] groups the 169 starting hands into 8 opponent
//!    strength classes by preflop equity (the `opponent_clusters.txt` input
//!    `hand_clustering.cpp::LoadOpponentBuckets` only ever loads -- this
//!    crate also builds it, since nothing upstream of this system ships it).
//! 2. [`Centroids`] clusters sampled 8-dim strength vectors (equity of a
//!    hand against each of the 8 opponent classes) into 8-10 final HS
//!    buckets, exactly `hand_clustering_main.cpp`'s `kmeans(samples, 1000, 10)`.

use crate::cards::{Card, Rank, Suit};
use crate::equity::{Equity, EquityQuery};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

pub type StrengthVector = [f32; 8];

const NUM_OPPONENT_CLASSES: usize = 8;

/// every one of the 169 canonical starting hands: 13 pairs, 78 suited, 78
/// offsuit, highest rank first (`"AKs"`, not `"KAs"`).
pub fn canonical_hand_labels() -> Vec<String> {
    let mut labels = Vec::with_capacity(169);
    for hi in (0u8..13).rev() {
        for lo in (0..=hi).rev() {
            let hi_char = Rank::from(hi);
            let lo_char = Rank::from(lo);
            if hi == lo {
                labels.push(format!("{hi_char}{lo_char}"));
            } else {
                labels.push(format!("{hi_char}{lo_char}s"));
                labels.push(format!("{hi_char}{lo_char}o"));
            }
        }
    }
    labels
}

/// concrete card combinations a canonical label denotes, with any combo
/// touching a dead card dropped -- `hand_clustering.cpp::IsPossible`
/// reduced to "enumerate, then filter" instead of a separate boolean check.
fn label_combos(label: &str, dead: &[Card]) -> Vec<[Card; 2]> {
    let chars: Vec<char> = label.chars().collect();
    let hi = Rank::try_from(chars[0]).expect("canonical label has a valid rank char");
    let is_dead = |c: &Card| dead.contains(c);
    if chars.len() == 2 {
        let mut combos = Vec::new();
        for s1 in 0u8..4 {
            for s2 in (s1 + 1)..4 {
                let c1 = Card::new(hi, Suit::from(s1));
                let c2 = Card::new(hi, Suit::from(s2));
                if !is_dead(&c1) && !is_dead(&c2) {
                    combos.push([c1, c2]);
                }
            }
        }
        return combos;
    }
    let lo = Rank::try_from(chars[1]).expect("canonical label has a valid rank char");
    let suited = chars[2] == 's';
    let mut combos = Vec::new();
    if suited {
        for s in 0u8..4 {
            let c1 = Card::new(hi, Suit::from(s));
            let c2 = Card::new(lo, Suit::from(s));
            if !is_dead(&c1) && !is_dead(&c2) {
                combos.push([c1, c2]);
            }
        }
    } else {
        for s1 in 0u8..4 {
            for s2 in 0u8..4 {
                if s1 == s2 {
                    continue;
                }
                let c1 = Card::new(hi, Suit::from(s1));
                let c2 = Card::new(lo, Suit::from(s2));
                if !is_dead(&c1) && !is_dead(&c2) {
                    combos.push([c1, c2]);
                }
            }
        }
    }
    combos
}

/// a representative single combo for a label, for preflop-equity feature
/// extraction where "possible given dead cards" doesn't apply yet (no
/// hand or board is dealt).
fn label_representative(label: &str) -> [Card; 2] {
    label_combos(label, &[])
        .into_iter()
        .next()
        .expect("every canonical label has at least one combo with no dead cards")
}

fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt()
}

fn nearest(centroids: &[Vec<f32>], point: &[f32]) -> usize {
    centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, euclidean(c, point)))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
        .map(|(i, _)| i)
        .expect("at least one centroid")
}

/// Lloyd's algorithm with random initial medoids, iterating until no
/// centroid moves by more than `1e-5` or `max_iters` is hit -- shared by
/// both clustering layers in this module.
fn lloyds_kmeans(points: &[Vec<f32>], k: usize, max_iters: usize, seed: u64) -> Vec<Vec<f32>> {
    use rand::seq::index::sample;
    let dim = points[0].len();
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut centroids: Vec<Vec<f32>> = sample(&mut rng, points.len(), k)
        .into_iter()
        .map(|i| points[i].clone())
        .collect();

    for _ in 0..max_iters {
        let mut sums = vec![vec![0.0f32; dim]; k];
        let mut counts = vec![0usize; k];
        for point in points {
            let c = nearest(&centroids, point);
            for d in 0..dim {
                sums[c][d] += point[d];
            }
            counts[c] += 1;
        }
        let mut moved = 0.0f32;
        for c in 0..k {
            if counts[c] == 0 {
                continue; // keep the previous centroid rather than dividing by zero
            }
            let mut updated = vec![0.0f32; dim];
            for d in 0..dim {
                updated[d] = sums[c][d] / counts[c] as f32;
            }
            moved = moved.max(euclidean(&updated, &centroids[c]));
            centroids[c] = updated;
        }
        if moved <= 1e-5 {
            break;
        }
    }
    centroids
}

/// maps each of the 169 canonical starting hands to one of 8 opponent
/// strength classes, by preflop equity vs. a random hand.
#[derive(Debug, Clone, Default)]
pub struct OpponentBuckets {
    assignments: BTreeMap<String, u8>,
}

impl OpponentBuckets {
    pub fn cluster(equity: &impl Equity, iters: usize, seed: u64) -> Self {
        let labels = canonical_hand_labels();
        let points: Vec<Vec<f32>> = labels
            .iter()
            .map(|label| {
                let hero = label_representative(label);
                vec![equity.evaluate(EquityQuery::VsRandom { hero }, &[], &[], iters)]
            })
            .collect();
        let centroids = lloyds_kmeans(&points, NUM_OPPONENT_CLASSES, 1000, seed);
        let assignments = labels
            .into_iter()
            .zip(points.iter())
            .map(|(label, point)| (label, nearest(&centroids, point) as u8 + 1))
            .collect();
        Self { assignments }
    }

    pub fn bucket_of(&self, label: &str) -> Option<u8> {
        self.assignments.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// `<hand_label> <bucket_id>`, 169 lines (spec §6).
    pub fn save(&self, writer: &mut impl Write) -> io::Result<()> {
        for (label, id) in self.assignments.iter() {
            writeln!(writer, "{label} {id}")?;
        }
        Ok(())
    }

    pub fn load(reader: impl BufRead) -> io::Result<Self> {
        let mut assignments = BTreeMap::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let label = fields
                .next()
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing hand label"))?
                .to_string();
            let id: u8 = fields
                .next()
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing bucket id"))?
                .parse()
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "non-numeric bucket id"))?;
            assignments.insert(label, id);
        }
        Ok(Self { assignments })
    }
}

/// average equity of `hand` against each of the 8 opponent classes,
/// skipping any label with no remaining combo given `dead` (hole cards +
/// board), grounded in `hand_clustering.cpp::ComputeStrengthVector`.
pub fn strength_vector(
    buckets: &OpponentBuckets,
    equity: &impl Equity,
    hand: [Card; 2],
    board: &[Card],
    iters: usize,
) -> StrengthVector {
    let dead: Vec<Card> = hand.iter().chain(board.iter()).copied().collect();
    let mut sums = [0.0f32; NUM_OPPONENT_CLASSES];
    let mut counts = [0u32; NUM_OPPONENT_CLASSES];
    for (label, &id) in buckets.assignments.iter() {
        let combos = label_combos(label, &dead);
        if combos.is_empty() {
            continue;
        }
        let total: f32 = combos
            .iter()
            .map(|&villain| equity.evaluate(EquityQuery::VsKnown { hero: hand, villain }, board, &[], iters))
            .sum();
        let slot = (id - 1) as usize;
        sums[slot] += total / combos.len() as f32;
        counts[slot] += 1;
    }
    let mut out = [0.0f32; NUM_OPPONENT_CLASSES];
    for i in 0..NUM_OPPONENT_CLASSES {
        if counts[i] > 0 {
            out[i] = sums[i] / counts[i] as f32;
        }
    }
    out
}

/// offline sample generation for [`Centroids::train`], grounded in
/// `hand_clustering.cpp::GenerateSamples`: deal `n` random un-permuted
/// rounds, and for every street of both hands record the strength vector.
pub fn generate_samples(
    buckets: &OpponentBuckets,
    equity: &impl Equity,
    n: usize,
    iters: usize,
    seed: u64,
) -> Vec<StrengthVector> {
    let mut samples = Vec::with_capacity(n * 8);
    for i in 0..n {
        let round = crate::engine::Round::new_round(0, seed.wrapping_add(i as u64));
        for street_index in 0..4 {
            let revealed = crate::engine::Street::from_index0123(street_index).board_cards();
            let board = &round.board[..revealed];
            samples.push(strength_vector(buckets, equity, round.hands[0], board, iters));
            samples.push(strength_vector(buckets, equity, round.hands[1], board, iters));
        }
    }
    samples
}

/// 8-10 centroids in strength-vector space, used as the HS abstraction by
/// [`crate::bucket::BucketFn::Kmeans`].
#[derive(Debug, Clone, Default)]
pub struct Centroids {
    points: Vec<StrengthVector>,
}

impl Centroids {
    pub fn train(samples: &[StrengthVector], k: usize, max_iters: usize, seed: u64) -> Self {
        let points: Vec<Vec<f32>> = samples.iter().map(|s| s.to_vec()).collect();
        let centroids = lloyds_kmeans(&points, k, max_iters, seed);
        let points = centroids
            .into_iter()
            .map(|v| v.try_into().expect("centroid has 8 dimensions"))
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn nearest_id(&self, strength: &StrengthVector) -> usize {
        let points: Vec<Vec<f32>> = self.points.iter().map(|p| p.to_vec()).collect();
        nearest(&points, strength) + 1
    }

    /// `<id> <v0>..<v7>`, one line per cluster (spec §6).
    pub fn save(&self, writer: &mut impl Write) -> io::Result<()> {
        for (i, point) in self.points.iter().enumerate() {
            write!(writer, "{}", i + 1)?;
            for v in point {
                write!(writer, " {v}")?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    pub fn load(reader: impl BufRead) -> io::Result<Self> {
        let mut rows: BTreeMap<usize, StrengthVector> = BTreeMap::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let id: usize = fields
                .next()
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing centroid id"))?
                .parse()
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "non-numeric centroid id"))?;
            let mut point = [0.0f32; 8];
            for slot in point.iter_mut() {
                *slot = fields
                    .next()
                    .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "short centroid row"))?
                    .parse()
                    .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "non-numeric centroid value"))?;
            }
            rows.insert(id, point);
        }
        let points = rows.into_values().collect();
        Ok(Self { points })
    }
}

/// nearest centroid by Euclidean distance, rendered as the bucket-16
/// slot-2 replacement string (`"C3"`, ...).
pub fn bucket_hand_kmeans(centroids: &Centroids, strength: &StrengthVector) -> String {
    format!("C{}", centroids.nearest_id(strength))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equity::{MonteCarloEquity, StandardEvaluator};

    #[test]
    fn canonical_labels_count_169() {
        assert_eq!(canonical_hand_labels().len(), 169);
    }

    #[test]
    fn pair_has_six_combos_with_no_dead_cards() {
        assert_eq!(label_combos("AA", &[]).len(), 6);
    }

    #[test]
    fn suited_has_four_combos_offsuit_has_twelve() {
        assert_eq!(label_combos("AKs", &[]).len(), 4);
        assert_eq!(label_combos("AKo", &[]).len(), 12);
    }

    #[test]
    fn dead_cards_shrink_the_combo_set() {
        let ace_spade = Card::parse("As").unwrap();
        let combos = label_combos("AA", &[ace_spade]);
        assert_eq!(combos.len(), 3); // remaining 3 suits choose 2
    }

    #[test]
    fn opponent_buckets_assign_every_label() {
        let equity = MonteCarloEquity::new(StandardEvaluator);
        let buckets = OpponentBuckets::cluster(&equity, 5, 11);
        assert_eq!(buckets.len(), 169);
        for label in canonical_hand_labels() {
            assert!(buckets.bucket_of(&label).is_some());
            assert!((1..=8).contains(&buckets.bucket_of(&label).unwrap()));
        }
    }

    #[test]
    fn opponent_buckets_round_trip_through_text_format() {
        let equity = MonteCarloEquity::new(StandardEvaluator);
        let buckets = OpponentBuckets::cluster(&equity, 5, 3);
        let mut buf = Vec::new();
        buckets.save(&mut buf).unwrap();
        let reloaded = OpponentBuckets::load(io::Cursor::new(buf)).unwrap();
        assert_eq!(reloaded.len(), buckets.len());
        assert_eq!(reloaded.bucket_of("AA"), buckets.bucket_of("AA"));
    }

    #[test]
    fn strength_vector_is_bounded() {
        let equity = MonteCarloEquity::new(StandardEvaluator);
        let buckets = OpponentBuckets::cluster(&equity, 5, 3);
        let hero = [Card::parse("As").unwrap(), Card::parse("Ah").unwrap()];
        let strength = strength_vector(&buckets, &equity, hero, &[], 5);
        for v in strength {
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn centroids_round_trip_and_assign_nearest() {
        let samples = vec![[1.0; 8], [1.0; 8], [0.0; 8], [0.0; 8]];
        let centroids = Centroids::train(&samples, 2, 100, 1);
        assert_eq!(centroids.len(), 2);

        let mut buf = Vec::new();
        centroids.save(&mut buf).unwrap();
        let reloaded = Centroids::load(io::Cursor::new(buf)).unwrap();
        assert_eq!(reloaded.len(), centroids.len());

        let near_one = bucket_hand_kmeans(&reloaded, &[0.9; 8]);
        let near_zero = bucket_hand_kmeans(&reloaded, &[0.1; 8]);
        assert_ne!(near_one, near_zero);
    }
}
