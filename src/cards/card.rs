use super::rank::Rank;
use super::suit::Suit;
use std::fmt::{Display, Formatter, Result as FmtResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Card {
    rank: Rank,
    suit: Suit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCardError(pub String);

impl Display for ParseCardError {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for ParseCardError {}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }
    pub fn rank(&self) -> Rank {
        self.rank
    }
    pub fn suit(&self) -> Suit {
        self.suit
    }
    pub fn code(&self) -> u8 {
        (self.rank as u8) * 4 + (self.suit as u8)
    }
    pub fn parse(s: &str) -> std::result::Result<Self, ParseCardError> {
        Self::try_from(s)
    }
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl TryFrom<&str> for Card {
    type Error = ParseCardError;
    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        let mut chars = s.chars();
        let (Some(r), Some(s), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(ParseCardError(format!("'{s}' is not a two-character card")));
        };
        Ok(Card::new(Rank::try_from(r)?, Suit::try_from(s)?))
    }
}

impl From<u8> for Card {
    fn from(n: u8) -> Self {
        Self {
            rank: Rank::from(n / 4),
            suit: Suit::from(n % 4),
        }
    }
}

impl From<Card> for u8 {
    fn from(c: Card) -> u8 {
        c.code()
    }
}

impl Display for Card {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

impl crate::Arbitrary for Card {
    fn random() -> Self {
        use crate::Arbitrary;
        Card::new(Rank::random(), Suit::random())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_render_round_trips() {
        for code in 0u8..52 {
            let card = Card::from(code);
            let rendered = card.render();
            assert_eq!(Card::parse(&rendered).unwrap(), card);
        }
    }

    #[test]
    fn code_is_bijective() {
        for code in 0u8..52 {
            assert_eq!(Card::from(code).code(), code);
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(Card::parse("").is_err());
        assert!(Card::parse("Ax").is_err());
        assert!(Card::parse("As2").is_err());
    }
}
