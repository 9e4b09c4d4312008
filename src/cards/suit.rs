use std::fmt::{Display, Formatter, Result};

/// suit codes are fixed by spec: s=0, h=1, c=2, d=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Suit {
    Spade = 0,
    Heart = 1,
    Club = 2,
    Diamond = 3,
}

impl Suit {
    pub const fn all() -> [Suit; 4] {
        [Suit::Spade, Suit::Heart, Suit::Club, Suit::Diamond]
    }
}

impl From<u8> for Suit {
    fn from(n: u8) -> Self {
        match n {
            0 => Suit::Spade,
            1 => Suit::Heart,
            2 => Suit::Club,
            3 => Suit::Diamond,
            _ => panic!("invalid suit code {n}"),
        }
    }
}

impl From<Suit> for u8 {
    fn from(s: Suit) -> u8 {
        s as u8
    }
}

impl TryFrom<char> for Suit {
    type Error = crate::cards::card::ParseCardError;

    fn try_from(c: char) -> std::result::Result<Self, Self::Error> {
        match c {
            's' => Ok(Suit::Spade),
            'h' => Ok(Suit::Heart),
            'c' => Ok(Suit::Club),
            'd' => Ok(Suit::Diamond),
            _ => Err(crate::cards::card::ParseCardError(format!(
                "invalid suit char '{c}'"
            ))),
        }
    }
}

impl Display for Suit {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(
            f,
            "{}",
            match self {
                Suit::Spade => "s",
                Suit::Heart => "h",
                Suit::Club => "c",
                Suit::Diamond => "d",
            }
        )
    }
}

impl crate::Arbitrary for Suit {
    fn random() -> Self {
        use rand::Rng;
        Suit::from(rand::rng().random_range(0..4u8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        for s in Suit::all() {
            assert_eq!(Suit::try_from(s.to_string().chars().next().unwrap()).unwrap(), s);
        }
    }

    #[test]
    fn stable_codes() {
        assert_eq!(Suit::Spade as u8, 0);
        assert_eq!(Suit::Heart as u8, 1);
        assert_eq!(Suit::Club as u8, 2);
        assert_eq!(Suit::Diamond as u8, 3);
    }
}
