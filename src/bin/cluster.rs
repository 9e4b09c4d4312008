//! Offline clustering driver (component J): builds the three artifacts
//! [`crate::player::Player`] and the trainer both need before a single
//! hand can be played -- the 169-label opponent-strength buckets, the
//! kmeans centroids over sampled strength vectors, and the preflop
//! equity lookup table -- and writes each to disk in the whitespace-
//! delimited text formats spec.md §6 names.
//!
//! grounded in `hand_clustering_main.cpp`'s sequence of
//! `LoadOpponentBuckets`-or-build, `GenerateSamples`, `kmeans(..., 1000, 10)`.
//! Offline binaries take no flags (spec.md §6); everything that varies
//! per invocation lives in [`ClusterConfig`].

use permuted_holdem_agent::equity::preflop::PreflopTable;
use permuted_holdem_agent::equity::{MonteCarloEquity, StandardEvaluator};
use permuted_holdem_agent::kmeans::{self, Centroids, OpponentBuckets};
use std::path::PathBuf;

struct ClusterConfig {
    output_dir: PathBuf,
    opponent_cluster_iters: usize,
    opponent_cluster_seed: u64,
    sample_rounds: usize,
    sample_iters: usize,
    sample_seed: u64,
    centroid_count: usize,
    centroid_max_iters: usize,
    centroid_seed: u64,
    preflop_iters: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("strategy"),
            opponent_cluster_iters: 200,
            opponent_cluster_seed: 1,
            sample_rounds: 20_000,
            sample_iters: 50,
            sample_seed: 2,
            centroid_count: 10,
            centroid_max_iters: 1000,
            centroid_seed: 3,
            preflop_iters: 100,
        }
    }
}

fn main() {
    permuted_holdem_agent::init();
    let config = ClusterConfig::default();
    std::fs::create_dir_all(&config.output_dir).expect("create output directory");

    let equity = MonteCarloEquity::new(StandardEvaluator);

    log::info!("clustering 169 canonical hands into opponent-strength classes");
    let buckets = OpponentBuckets::cluster(&equity, config.opponent_cluster_iters, config.opponent_cluster_seed);
    let buckets_path = config.output_dir.join("opponent_buckets.txt");
    let mut writer = std::fs::File::create(&buckets_path).expect("create opponent-bucket file");
    buckets.save(&mut writer).expect("write opponent-bucket file");
    log::info!("wrote {} opponent-bucket assignments to {}", buckets.len(), buckets_path.display());

    log::info!("sampling {} rounds for strength-vector training data", config.sample_rounds);
    let samples = kmeans::generate_samples(&buckets, &equity, config.sample_rounds, config.sample_iters, config.sample_seed);
    log::info!("sampled {} strength vectors, training {} centroids", samples.len(), config.centroid_count);
    let centroids = Centroids::train(&samples, config.centroid_count, config.centroid_max_iters, config.centroid_seed);
    let centroids_path = config.output_dir.join("centroids.txt");
    let mut writer = std::fs::File::create(&centroids_path).expect("create centroid file");
    centroids.save(&mut writer).expect("write centroid file");
    log::info!("wrote {} centroids to {}", centroids.len(), centroids_path.display());

    log::info!("generating the preflop equity lookup table (2652 entries)");
    let preflop = PreflopTable::generate(&equity, config.preflop_iters);
    let preflop_path = config.output_dir.join("preflop_equity.txt");
    let mut writer = std::fs::File::create(&preflop_path).expect("create preflop equity file");
    preflop.save(&mut writer).expect("write preflop equity file");
    log::info!("wrote the preflop equity table to {}", preflop_path.display());

    log::info!("clustering complete; artifacts are in {}", config.output_dir.display());
}
