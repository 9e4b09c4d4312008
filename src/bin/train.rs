//! Offline MCCFR training driver (component G's outer loop): alternates
//! `do_cfr_iteration_for_player` across both players, periodically runs
//! an exploitability evaluation pass with regret updates disabled, and
//! checkpoints the regret and average-strategy tables to disk.
//!
//! grounded in `cfr_trainer.cpp`'s `main`, which alternates
//! `DoCfrIterationForPlayer(0, ...)`/`DoCfrIterationForPlayer(1, ...)` and
//! calls `Evaluate` every so many iterations. Offline binaries take no
//! flags (spec.md §6); everything that varies per invocation lives in
//! [`TrainConfig`].

use permuted_holdem_agent::bucket::BucketFn;
use permuted_holdem_agent::cfr;
use permuted_holdem_agent::equity::{MonteCarloEquity, StandardEvaluator};
use permuted_holdem_agent::error;
use permuted_holdem_agent::kmeans::{Centroids, OpponentBuckets};
use permuted_holdem_agent::strategy::StrategyTable;
use std::path::{Path, PathBuf};

struct TrainConfig {
    experiment_name: String,
    output_dir: PathBuf,
    opponent_buckets_path: PathBuf,
    centroids_path: PathBuf,
    iterations: usize,
    eval_every: usize,
    eval_samples: usize,
    ev_iters: [usize; 4],
    strength_iters: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            experiment_name: "MC_CFR_KMEANS".to_string(),
            output_dir: PathBuf::from("strategy"),
            opponent_buckets_path: PathBuf::from("strategy/opponent_buckets.txt"),
            centroids_path: PathBuf::from("strategy/centroids.txt"),
            iterations: permuted_holdem_agent::CFR_ITERATIONS,
            eval_every: permuted_holdem_agent::EVAL_EVERY,
            eval_samples: 200,
            ev_iters: [1, 200, 200, 1326],
            strength_iters: 50,
        }
    }
}

fn save_tables(dir: &Path, prefix: &str, tables: &[StrategyTable; 2]) {
    for (p, table) in tables.iter().enumerate() {
        let path = dir.join(format!("{prefix}_p{p}.txt"));
        let mut writer = std::fs::File::create(&path).expect("create strategy checkpoint file");
        table.save(&mut writer).expect("write strategy checkpoint file");
    }
}

fn main() {
    permuted_holdem_agent::init();
    let config = TrainConfig::default();
    std::fs::create_dir_all(&config.output_dir).expect("create output directory");

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

    let mut regrets = [StrategyTable::new(), StrategyTable::new()];
    let mut strategies = [StrategyTable::new(), StrategyTable::new()];

    log::info!("training experiment '{}' for {} iterations", config.experiment_name, config.iterations);
    let progress = permuted_holdem_agent::progress(config.iterations);
    for t in 0..config.iterations {
        for traverse_plyr in 0..2usize {
            let seed = (t as u64) * 2 + traverse_plyr as u64 + 1;
            cfr::do_cfr_iteration_for_player(
                &mut regrets,
                &mut strategies,
                traverse_plyr,
                seed,
                config.ev_iters,
                config.strength_iters,
                &equity,
                &evaluator,
                &buckets,
                &bucket_fn,
            );
        }
        progress.inc(1);

        let is_eval_iteration = (t + 1) % config.eval_every == 0 || t + 1 == config.iterations;
        if is_eval_iteration {
            let (mean, stdev, stderr) = cfr::evaluate_exploitability(
                &mut regrets,
                &mut strategies,
                config.eval_samples,
                t as u64 + 1,
                config.ev_iters,
                config.strength_iters,
                &equity,
                &evaluator,
                &buckets,
                &bucket_fn,
            );
            log::info!(
                "iteration {}/{}: summed exploitability mean={mean:.4} stdev={stdev:.4} stderr={stderr:.4}",
                t + 1,
                config.iterations,
            );
            save_tables(&config.output_dir, "regrets", &regrets);
            save_tables(&config.output_dir, "strategy", &strategies);
        }
    }
    progress.finish();

    save_tables(&config.output_dir, "regrets", &regrets);
    save_tables(&config.output_dir, "strategy", &strategies);
    log::info!("finished training experiment '{}'", config.experiment_name);
}
