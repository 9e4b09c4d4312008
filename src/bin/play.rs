//! Online player binary (component I): loads a trained strategy table and
//! the offline clustering artifacts, then drives [`Player`]'s three
//! callbacks across a line-based TCP connection to the match runner.
//!
//! grounded in `main.cpp`'s `run_bot(&player, args)`; the socket/line
//! protocol itself belongs to the enclosing runner collaborator
//! (spec.md §6's glossary: `T`ime/`P`osition/`H`and/`F`lop-`D`eal/
//! `B`oard/`O`pponent action/`Y`our action/`D`elta/`G`ameover), so this
//! binary implements only the client side of that contract: one message
//! per line, first whitespace-separated field is the tag.
//!
//! this is the only binary with a flag surface (spec.md §6): `--host`/
//! `--port`, via `clap` derive, collected into [`PlayConfig`].

use clap::Parser;
use permuted_holdem_agent::cards::Card;
use permuted_holdem_agent::engine::{Action, LegalActions, Street};
use permuted_holdem_agent::equity::preflop::PreflopTable;
use permuted_holdem_agent::equity::{Equity, HandEvaluator, MonteCarloEquity, StandardEvaluator};
use permuted_holdem_agent::error;
use permuted_holdem_agent::kmeans::{Centroids, OpponentBuckets};
use permuted_holdem_agent::player::Player;
use permuted_holdem_agent::strategy::StrategyTable;
use permuted_holdem_agent::Chips;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "plays heads-up no-limit hold'em against the match runner over a line-based socket protocol")]
struct Args {
    #[arg(long, default_value = "localhost")]
    host: String,
    #[arg(long, default_value_t = 3000)]
    port: u16,
}

struct PlayConfig {
    strategy_p0_path: PathBuf,
    strategy_p1_path: PathBuf,
    opponent_buckets_path: PathBuf,
    centroids_path: PathBuf,
    preflop_path: PathBuf,
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self {
            strategy_p0_path: PathBuf::from("strategy/strategy_p0.txt"),
            strategy_p1_path: PathBuf::from("strategy/strategy_p1.txt"),
            opponent_buckets_path: PathBuf::from("strategy/opponent_buckets.txt"),
            centroids_path: PathBuf::from("strategy/centroids.txt"),
            preflop_path: PathBuf::from("strategy/preflop_equity.txt"),
        }
    }
}

fn parse_cards(fields: &[&str]) -> Vec<Card> {
    fields.iter().map(|s| Card::parse(s).expect("well-formed card code from the match runner")).collect()
}

fn render_action(action: Action) -> String {
    match action {
        Action::Fold => "A FOLD".to_string(),
        Action::Call => "A CALL".to_string(),
        Action::Check => "A CHECK".to_string(),
        Action::Raise(amount) => format!("A RAISE {amount}"),
    }
}

/// drives `player` to completion against `reader`/`writer`, one line at a
/// time, until the runner closes the connection or sends `G`.
#[allow(clippy::too_many_arguments)]
fn run_match(
    player: &mut Player,
    reader: &mut impl BufRead,
    writer: &mut impl Write,
    evaluator: &impl HandEvaluator,
    equity: &impl Equity,
    rng: &mut impl Rng,
) {
    let mut board: Vec<Card> = Vec::new();
    let mut hole: [Card; 2] = [Card::from(0u8), Card::from(1u8)];

    let mut line = String::new();
    loop {
        line.clear();
        let bytes = reader.read_line(&mut line).expect("read from match runner socket");
        if bytes == 0 {
            log::info!("match runner closed the connection");
            break;
        }

        let mut fields = line.trim().split_whitespace();
        let Some(tag) = fields.next() else { continue };
        let rest: Vec<&str> = fields.collect();

        match tag {
            "T" => { /* game clock, not enforced by the core (spec.md §7) */ }
            "P" => {
                let seat: usize = rest[0].parse().expect("seat field");
                let bankroll: Chips = rest[1].parse().expect("bankroll field");
                let round_num: usize = rest[2].parse().expect("round number field");
                board.clear();
                player.handle_new_round(seat == 1, bankroll, round_num);
            }
            "H" => {
                let cards = parse_cards(&rest);
                hole = [cards[0], cards[1]];
            }
            "B" => {
                board = parse_cards(&rest);
            }
            "O" => { /* opponent's action, informational: contributions already arrive via the Y line */ }
            "Y" => {
                let street = Street::from_index0123(rest[0].parse().expect("street field"));
                let my_pip: Chips = rest[1].parse().expect("my pip");
                let opp_pip: Chips = rest[2].parse().expect("opp pip");
                let my_stack: Chips = rest[3].parse().expect("my stack");
                let opp_stack: Chips = rest[4].parse().expect("opp stack");
                let min_raise: Chips = rest[5].parse().expect("min raise");
                let max_raise: Chips = rest[6].parse().expect("max raise");
                let mask = rest[7];
                let legal = LegalActions {
                    fold: mask.contains('F'),
                    call: mask.contains('C'),
                    check: mask.contains('K'),
                    raise: mask.contains('R'),
                };
                let action = player.get_action(
                    street, hole, &board, my_pip, opp_pip, my_stack, opp_stack, legal, min_raise, max_raise,
                    evaluator, equity, rng,
                );
                writeln!(writer, "{}", render_action(action)).expect("write to match runner socket");
            }
            "D" => {
                let my_delta: Chips = rest[0].parse().expect("delta field");
                let ending_street = Street::from_index0123(rest[1].parse().expect("ending street field"));
                let my_contribution: Chips = rest[2].parse().expect("my contribution field");
                let opp_contribution: Chips = rest[3].parse().expect("opp contribution field");
                let opp_hole = if rest.len() >= 6 && rest[4] != "xx" {
                    Some([
                        Card::parse(rest[4]).expect("opponent card"),
                        Card::parse(rest[5]).expect("opponent card"),
                    ])
                } else {
                    None
                };
                let board_full: [Card; 5] = if rest.len() >= 11 {
                    std::array::from_fn(|i| Card::parse(rest[6 + i]).expect("board card"))
                } else {
                    std::array::from_fn(|i| *board.get(i).unwrap_or(&Card::from(0u8)))
                };
                player.handle_round_over(
                    my_delta, ending_street, my_contribution, opp_contribution, hole, opp_hole, board_full,
                    evaluator, rng,
                );
            }
            "G" => {
                log::info!("match finished");
                break;
            }
            other => log::warn!("unrecognized match-runner message tag {other:?}"),
        }
    }
}

fn main() {
    permuted_holdem_agent::init();
    let args = Args::parse();
    let config = PlayConfig::default();

    let mut strategy = StrategyTable::load(
        error::open(&config.strategy_p0_path).expect("load player-0 strategy table; run `train` first"),
    )
    .expect("parse player-0 strategy table");
    let strategy_p1 = StrategyTable::load(
        error::open(&config.strategy_p1_path).expect("load player-1 strategy table; run `train` first"),
    )
    .expect("parse player-1 strategy table");
    strategy.merge_from(&strategy_p1);

    let buckets = OpponentBuckets::load(
        error::open(&config.opponent_buckets_path).expect("load opponent buckets; run `cluster` first"),
    )
    .expect("parse opponent-bucket file");
    let centroids =
        Centroids::load(error::open(&config.centroids_path).expect("load centroids; run `cluster` first"))
            .expect("parse centroid file");
    let preflop =
        PreflopTable::load(error::open(&config.preflop_path).expect("load preflop equity table; run `cluster` first"))
            .expect("parse preflop equity file");

    let evaluator = StandardEvaluator;
    let equity = MonteCarloEquity::new(StandardEvaluator);
    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves forward")
        .as_nanos() as u64;
    let mut rng = SmallRng::seed_from_u64(seed);

    let mut player = Player::new(strategy, centroids, buckets, preflop, &mut rng);

    log::info!("connecting to match runner at {}:{}", args.host, args.port);
    let stream = TcpStream::connect((args.host.as_str(), args.port)).expect("connect to match runner");
    let mut reader = BufReader::new(stream.try_clone().expect("clone socket for reading"));
    let mut writer = stream;

    run_match(&mut player, &mut reader, &mut writer, &evaluator, &equity, &mut rng);
}
