use crate::cards::{Card, Deck};
use crate::equity::HandEvaluator;

/// the opponent side of an equity query: either a fully known hand (a
/// heads-up showdown already happened, or we're asking "how would hand X
/// have done against hand Y") or an unknown hand drawn from whatever's
/// left in the deck.
#[derive(Debug, Clone, Copy)]
pub enum EquityQuery {
    VsKnown { hero: [Card; 2], villain: [Card; 2] },
    VsRandom { hero: [Card; 2] },
}

/// opaque service boundary (spec §6): `Equity(query, board, dead, iters)
/// -> f32`, a win-rate in `[0, 1]` with ties worth half a win.
pub trait Equity: Send + Sync {
    fn evaluate(&self, query: EquityQuery, board: &[Card], dead: &[Card], iters: usize) -> f32;
}

/// Monte Carlo equity over an explicit evaluator. `VsKnown` with a
/// complete five-card board has only one outcome and is scored directly,
/// ignoring `iters`; everything else deals `iters` independent completions
/// of the unknown cards (villain hand and/or remaining board) and averages.
pub struct MonteCarloEquity<E: HandEvaluator> {
    evaluator: E,
}

impl<E: HandEvaluator> MonteCarloEquity<E> {
    pub fn new(evaluator: E) -> Self {
        Self { evaluator }
    }

    fn seven(hole: [Card; 2], board: &[Card]) -> [Card; 7] {
        let mut cards = [hole[0], hole[1], Card::from(0u8), Card::from(0u8), Card::from(0u8), Card::from(0u8), Card::from(0u8)];
        for (slot, card) in cards.iter_mut().skip(2).zip(board.iter()) {
            *slot = *card;
        }
        cards
    }

    fn outcome(&self, hero: [Card; 2], villain: [Card; 2], board: &[Card]) -> f32 {
        let hero_score = self.evaluator.score(&Self::seven(hero, board));
        let villain_score = self.evaluator.score(&Self::seven(villain, board));
        match hero_score.cmp(&villain_score) {
            std::cmp::Ordering::Greater => 1.0,
            std::cmp::Ordering::Equal => 0.5,
            std::cmp::Ordering::Less => 0.0,
        }
    }
}

impl<E: HandEvaluator> Equity for MonteCarloEquity<E> {
    fn evaluate(&self, query: EquityQuery, board: &[Card], dead: &[Card], iters: usize) -> f32 {
        match query {
            EquityQuery::VsKnown { hero, villain } if board.len() == 5 => {
                self.outcome(hero, villain, board)
            }
            EquityQuery::VsKnown { hero, villain } => {
                let known: Vec<Card> = hero.iter().chain(villain.iter()).chain(board.iter()).chain(dead.iter()).copied().collect();
                let need = 5 - board.len();
                let mut total = 0.0f32;
                for sample in 0..iters.max(1) {
                    let mut deck = Deck::shuffled_excluding(sample as u64, &known);
                    let mut full_board = board.to_vec();
                    full_board.extend(deck.draw(need));
                    total += self.outcome(hero, villain, &full_board);
                }
                total / iters.max(1) as f32
            }
            EquityQuery::VsRandom { hero } => {
                let known: Vec<Card> = hero.iter().chain(board.iter()).chain(dead.iter()).copied().collect();
                let need_board = 5 - board.len();
                let mut total = 0.0f32;
                for sample in 0..iters.max(1) {
                    let mut deck = Deck::shuffled_excluding(sample as u64 ^ 0x9E3779B9, &known);
                    let villain = [deck.draw(1)[0], deck.draw(1)[0]];
                    let mut full_board = board.to_vec();
                    full_board.extend(deck.draw(need_board));
                    total += self.outcome(hero, villain, &full_board);
                }
                total / iters.max(1) as f32
            }
        }
    }
}
