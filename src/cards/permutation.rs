use super::rank::Rank;

/// a bijection on rank codes. `perm[perm_val] = true_val`: the label whose
/// ordinal-in-the-permuted-deck is `perm_val` actually has true rank
/// `true_val`. grounded in the teacher's own `Permutation` (suit-space,
/// `src/cards/permutation.rs`); this one permutes ranks instead of suits,
/// since that's the secret this variant of hold'em hides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permutation([u8; 13]);

impl Permutation {
    pub const fn identity() -> Self {
        Self([0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12])
    }

    /// construct from a raw array, checking the permutation invariant.
    pub fn new(values: [u8; 13]) -> Self {
        let perm = Self(values);
        assert!(perm.is_valid(), "not a permutation of 0..12: {values:?}");
        perm
    }

    pub fn is_valid(&self) -> bool {
        let mut seen = [false; 13];
        for &v in self.0.iter() {
            if v > 12 || seen[v as usize] {
                return false;
            }
            seen[v as usize] = true;
        }
        true
    }

    pub fn values(&self) -> &[u8; 13] {
        &self.0
    }

    /// true rank of the label whose permuted ordinal is `perm_val`.
    pub fn true_of(&self, perm_val: Rank) -> Rank {
        Rank::from(self.0[perm_val as usize])
    }

    /// substitute true ranks for the label ranks in a card, keeping suit.
    pub fn transform(&self, card: super::card::Card) -> super::card::Card {
        super::card::Card::new(self.true_of(card.rank()), card.suit())
    }

    /// swap the true ranks assigned to two label ranks. swapping two
    /// entries of a permutation is always itself a permutation, so this
    /// skips the validity assertion `new` pays for.
    pub fn swapped(&self, i: Rank, j: Rank) -> Self {
        let mut values = self.0;
        values.swap(i as usize, j as usize);
        Self(values)
    }
}

impl std::fmt::Display for Permutation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            write!(f, "{}->{} ", Rank::from(i as u8), Rank::from(*v))?;
        }
        Ok(())
    }
}

impl crate::Arbitrary for Permutation {
    /// uniform-ish random permutation for tests; NOT the PPF prior (see
    /// `crate::filter::prior`), just a Fisher-Yates shuffle of 0..12.
    fn random() -> Self {
        use rand::seq::SliceRandom;
        let mut values: Vec<u8> = (0..13).collect();
        values.shuffle(&mut rand::rng());
        Self::new(values.try_into().unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Arbitrary;

    #[test]
    fn identity_is_noop() {
        let identity = Permutation::identity();
        for r in Rank::all() {
            assert_eq!(identity.true_of(r), r);
        }
    }

    #[test]
    fn random_samples_are_valid_permutations() {
        for _ in 0..1000 {
            assert!(Permutation::random().is_valid());
        }
    }

    #[test]
    #[should_panic]
    fn rejects_duplicate_values() {
        let mut values = [0u8; 13];
        values[1] = 0;
        Permutation::new(values);
    }

    #[test]
    fn swapped_stays_a_valid_permutation() {
        let identity = Permutation::identity();
        let swapped = identity.swapped(Rank::from(2), Rank::from(9));
        assert!(swapped.is_valid());
        assert_eq!(swapped.true_of(Rank::from(2)), Rank::from(9));
        assert_eq!(swapped.true_of(Rank::from(9)), Rank::from(2));
    }
}
