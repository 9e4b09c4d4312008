pub mod bucket;
pub mod cards;
pub mod cfr;
pub mod engine;
pub mod equity;
pub mod error;
pub mod filter;
pub mod history;
pub mod kmeans;
pub mod player;
pub mod strategy;

/// dimensional analysis types
pub type Chips = i32;
pub type Probability = f32;
pub type Utility = f32;
pub type Equity = f32;

// match protocol parameters (spec.md §6)
pub const NUM_ROUNDS: usize = 1000;
pub const STARTING_STACK: Chips = 200;
pub const BIG_BLIND: Chips = 2;
pub const SMALL_BLIND: Chips = 1;

// bet-history abstraction width
pub const MAX_ACTIONS_PER_STREET: usize = 4;

// permutation particle filter
pub const NUM_PARTICLES: usize = 25_000;
pub const K_INVALID_RETRIES: usize = 5;
pub const K_VALID_RETRIES: usize = 2;
pub const GEOMETRIC_P: f64 = 0.25;

// mccfr training parameters
pub const CFR_BATCH_SIZE: usize = 0x100;
pub const CFR_TREE_COUNT: usize = 0x4000;
pub const CFR_ITERATIONS: usize = CFR_TREE_COUNT / CFR_BATCH_SIZE;
pub const EVAL_EVERY: usize = 0x40;

// regret matching
pub const REGRET_EPSILON: Utility = 1e-3;

/// trait for random generation, mainly (strictly?) for testing
pub trait Arbitrary {
    fn random() -> Self;
}

/// progress bar, ported from the teacher's `lib.rs` helper.
#[cfg(feature = "cli")]
pub fn progress(n: usize) -> indicatif::ProgressBar {
    let tick = std::time::Duration::from_secs(5);
    let style = "{spinner:.cyan} {elapsed} ~ {percent:>3}% {wide_bar:.cyan} {pos}/{len}";
    let style = indicatif::ProgressStyle::with_template(style).unwrap();
    let progress = indicatif::ProgressBar::new(n as u64);
    progress.set_style(style);
    progress.enable_steady_tick(tick);
    progress
}

/// initialize logging, matching the teacher's `init()`: a terminal logger
/// for interactive feedback plus a per-run file logger under `logs/`.
#[cfg(feature = "cli")]
pub fn init() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves forward")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{time}.log")).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}
