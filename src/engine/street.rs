/// the street is literally the number of board cards revealed so far;
/// preflop has none, and the jump from 0 straight to 3 is deliberate
/// (flop deals three at once, there's no one- or two-card street).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Street {
    Preflop = 0,
    Flop = 3,
    Turn = 4,
    River = 5,
}

impl Street {
    pub fn board_cards(self) -> usize {
        self as usize
    }

    /// the street dealt immediately after this one finishes betting.
    /// `None` on the river, which proceeds to showdown instead.
    pub fn next(self) -> Option<Street> {
        match self {
            Street::Preflop => Some(Street::Flop),
            Street::Flop => Some(Street::Turn),
            Street::Turn => Some(Street::River),
            Street::River => None,
        }
    }

    /// dense `0..=3` index, for arrays indexed by street rather than by
    /// board-card count.
    pub fn index0123(self) -> usize {
        match self {
            Street::Preflop => 0,
            Street::Flop => 1,
            Street::Turn => 2,
            Street::River => 3,
        }
    }

    pub fn from_index0123(i: usize) -> Street {
        match i {
            0 => Street::Preflop,
            1 => Street::Flop,
            2 => Street::Turn,
            3 => Street::River,
            _ => panic!("street index out of range: {i}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_cards_match_the_street_number() {
        assert_eq!(Street::Preflop.board_cards(), 0);
        assert_eq!(Street::Flop.board_cards(), 3);
        assert_eq!(Street::Turn.board_cards(), 4);
        assert_eq!(Street::River.board_cards(), 5);
    }

    #[test]
    fn river_has_no_next_street() {
        assert_eq!(Street::River.next(), None);
    }

    #[test]
    fn streets_chain_preflop_to_river() {
        let mut street = Street::Preflop;
        let mut seen = vec![street];
        while let Some(next) = street.next() {
            seen.push(next);
            street = next;
        }
        assert_eq!(seen, vec![Street::Preflop, Street::Flop, Street::Turn, Street::River]);
    }
}
