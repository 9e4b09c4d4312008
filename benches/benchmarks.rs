criterion::criterion_main!(benches);
criterion::criterion_group! {
    name = benches;
    config = criterion::Criterion::default()
        .without_plots()
        .noise_threshold(3.0)
        .significance_level(0.01)
        .sample_size(10)
        .measurement_time(std::time::Duration::from_secs(1));
    targets =
        scoring_a_seven_card_hand,
        estimating_monte_carlo_equity,
        updating_the_particle_filter,
        running_one_cfr_iteration,
        clustering_opponent_strength_vectors,
}

use permuted_holdem_agent::bucket::BucketFn;
use permuted_holdem_agent::cards::Card;
use permuted_holdem_agent::cfr;
use permuted_holdem_agent::equity::{Equity, EquityQuery, HandEvaluator, MonteCarloEquity, StandardEvaluator};
use permuted_holdem_agent::filter::{PermutationParticleFilter, ShowdownResult};
use permuted_holdem_agent::kmeans::{Centroids, OpponentBuckets};
use permuted_holdem_agent::strategy::StrategyTable;
use rand::rngs::SmallRng;
use rand::SeedableRng;

fn seven_card_hand() -> [Card; 7] {
    ["As", "Ks", "Qs", "Js", "Ts", "2h", "3d"].map(|s| Card::parse(s).unwrap())
}

fn scoring_a_seven_card_hand(c: &mut criterion::Criterion) {
    let evaluator = StandardEvaluator;
    let cards = seven_card_hand();
    c.bench_function("score a 7-card hand", |b| b.iter(|| evaluator.score(&cards)));
}

fn estimating_monte_carlo_equity(c: &mut criterion::Criterion) {
    let equity = MonteCarloEquity::new(StandardEvaluator);
    let hero = [Card::parse("Ah").unwrap(), Card::parse("Kh").unwrap()];
    c.bench_function("estimate preflop equity vs a random hand (200 iters)", |b| {
        b.iter(|| equity.evaluate(EquityQuery::VsRandom { hero }, &[], &[], 200))
    });
}

fn updating_the_particle_filter(c: &mut criterion::Criterion) {
    let evaluator = StandardEvaluator;
    let mut rng = SmallRng::seed_from_u64(7);
    let showdown = ShowdownResult {
        winner_hole: [Card::parse("Ah").unwrap(), Card::parse("Kh").unwrap()],
        loser_hole: [Card::parse("2c").unwrap(), Card::parse("7d").unwrap()],
        board: ["Qs", "Js", "Ts", "3h", "4h"].map(|s| Card::parse(s).unwrap()),
    };
    c.bench_function("fold one showdown into a 1000-particle filter", |b| {
        b.iter_batched(
            || PermutationParticleFilter::new(1_000, &mut rng),
            |mut filter| filter.update(showdown, &evaluator, &mut rng),
            criterion::BatchSize::SmallInput,
        )
    });
}

fn running_one_cfr_iteration(c: &mut criterion::Criterion) {
    let evaluator = StandardEvaluator;
    let equity = MonteCarloEquity::new(StandardEvaluator);
    let buckets = OpponentBuckets::cluster(&equity, 5, 1);
    let bucket_fn = BucketFn::Small;
    c.bench_function("run one MCCFR traversal for a single player", |b| {
        b.iter_batched(
            || [StrategyTable::new(), StrategyTable::new()],
            |mut regrets| {
                let mut strategies = [StrategyTable::new(), StrategyTable::new()];
                cfr::do_cfr_iteration_for_player(
                    &mut regrets,
                    &mut strategies,
                    0,
                    11,
                    [1, 3, 3, 3],
                    1,
                    &equity,
                    &evaluator,
                    &buckets,
                    &bucket_fn,
                )
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn clustering_opponent_strength_vectors(c: &mut criterion::Criterion) {
    let equity = MonteCarloEquity::new(StandardEvaluator);
    let buckets = OpponentBuckets::cluster(&equity, 5, 1);
    let samples = permuted_holdem_agent::kmeans::generate_samples(&buckets, &equity, 200, 5, 2);
    c.bench_function("train 8 centroids over 200 sampled strength vectors", |b| {
        b.iter(|| Centroids::train(&samples, 8, 50, 3))
    });
}
