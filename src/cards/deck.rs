use super::card::Card;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// a shuffled 52-card deck. dealing just walks the vector front to back;
/// the shuffle itself is the only source of randomness.
#[derive(Debug, Clone)]
pub struct Deck(Vec<Card>);

impl Deck {
    /// deterministic shuffle from an explicit seed. no core code may call
    /// `rand::rng()`/`thread_rng()` directly -- all randomness routes
    /// through an explicit, seedable generator so tests stay reproducible.
    pub fn shuffle(seed: u64) -> Self {
        let mut cards = (0u8..52).map(Card::from).collect::<Vec<_>>();
        let mut rng = SmallRng::seed_from_u64(seed);
        cards.shuffle(&mut rng);
        Self(cards)
    }

    pub fn ordered() -> Self {
        Self((0u8..52).map(Card::from).collect())
    }

    /// shuffled deck with `exclude` removed first, for equity sampling
    /// where some cards are already known (hole cards, board, dead cards).
    pub fn shuffled_excluding(seed: u64, exclude: &[Card]) -> Self {
        let mut cards: Vec<Card> = (0u8..52)
            .map(Card::from)
            .filter(|c| !exclude.contains(c))
            .collect();
        let mut rng = SmallRng::seed_from_u64(seed);
        cards.shuffle(&mut rng);
        Self(cards)
    }

    pub fn draw(&mut self, n: usize) -> Vec<Card> {
        self.0.split_off(self.0.len() - n)
    }

    pub fn remaining(&self) -> usize {
        self.0.len()
    }
}
