//! Offline exploitability evaluation driver (component G): loads a
//! checkpoint `train` already wrote and runs a fresh, larger batch of the
//! same no-update evaluation pass the trainer interleaves with learning,
//! reporting the mean/stdev/stderr of summed exploitability across
//! sampled deals without touching the tables on disk.
//!
//! grounded in `cfr_trainer.cpp`'s `Evaluate`, run here standalone against
//! a trained checkpoint instead of mid-training. Offline binaries take no
//! flags (spec.md §6); everything that varies per invocation lives in
//! [`EvaluateConfig`].

use permuted_holdem_agent::bucket::BucketFn;
use permuted_holdem_agent::cfr;
use permuted_holdem_agent::equity::{MonteCarloEquity, StandardEvaluator};
use permuted_holdem_agent::error;
use permuted_holdem_agent::kmeans::{Centroids, OpponentBuckets};
use permuted_holdem_agent::strategy::StrategyTable;
use std::path::PathBuf;

struct EvaluateConfig {
    regrets_p0_path: PathBuf,
    regrets_p1_path: PathBuf,
    strategy_p0_path: PathBuf,
    strategy_p1_path: PathBuf,
    opponent_buckets_path: PathBuf,
    centroids_path: PathBuf,
    samples: usize,
    seed: u64,
    ev_iters: [usize; 4],
    strength_iters: usize,
}

impl Default for EvaluateConfig {
    fn default() -> Self {
        Self {
            regrets_p0_path: PathBuf::from("strategy/regrets_p0.txt"),
            regrets_p1_path: PathBuf::from("strategy/regrets_p1.txt"),
            strategy_p0_path: PathBuf::from("strategy/strategy_p0.txt"),
            strategy_p1_path: PathBuf::from("strategy/strategy_p1.txt"),
            opponent_buckets_path: PathBuf::from("strategy/opponent_buckets.txt"),
            centroids_path: PathBuf::from("strategy/centroids.txt"),
            samples: 1000,
            seed: 0x5EED,
            ev_iters: [1, 200, 200, 1326],
            strength_iters: 50,
        }
    }
}

fn main() {
    permuted_holdem_agent::init();
    let config = EvaluateConfig::default();

    let evaluator = StandardEvaluator;
    let equity = MonteCarloEquity::new(StandardEvaluator);

    let buckets = OpponentBuckets::load(
        error::open(&config.opponent_buckets_path).expect("load opponent buckets; run `cluster` first"),
    )
    .expect("parse opponent-bucket file");
    let centroids =
        Centroids::load(error::open(&config.centroids_path).expect("load centroids; run `cluster` first"))
            .expect("parse centroid file");
    let bucket_fn = BucketFn::Kmeans(centroids);

    let mut regrets = [
        StrategyTable::load(error::open(&config.regrets_p0_path).expect("load player-0 regret table; run `train` first"))
            .expect("parse player-0 regret table"),
        StrategyTable::load(error::open(&config.regrets_p1_path).expect("load player-1 regret table; run `train` first"))
            .expect("parse player-1 regret table"),
    ];
    let mut strategies = [
        StrategyTable::load(error::open(&config.strategy_p0_path).expect("load player-0 strategy table; run `train` first"))
            .expect("parse player-0 strategy table"),
        StrategyTable::load(error::open(&config.strategy_p1_path).expect("load player-1 strategy table; run `train` first"))
            .expect("parse player-1 strategy table"),
    ];

    log::info!("evaluating exploitability over {} sampled deals", config.samples);
    let (mean, stdev, stderr) = cfr::evaluate_exploitability(
        &mut regrets,
        &mut strategies,
        config.samples,
        config.seed,
        config.ev_iters,
        config.strength_iters,
        &equity,
        &evaluator,
        &buckets,
        &bucket_fn,
    );

    log::info!("summed exploitability: mean={mean:.4} stdev={stdev:.4} stderr={stderr:.4}");
    println!("mean={mean:.4} stdev={stdev:.4} stderr={stderr:.4}");
}
