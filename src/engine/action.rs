use crate::Chips;

/// a move the active player may make. `Raise(amount)` carries the new pip
/// target (the total this street, not the incremental contribution).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Fold,
    Call,
    Check,
    Raise(Chips),
}

/// which of the four move kinds are legal in a given state. the original
/// engine returns this as an `int` bitmask over `{FOLD, CALL, CHECK,
/// RAISE}`; a small struct of flags is the same contract without
/// magic numbers at every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LegalActions {
    pub fold: bool,
    pub call: bool,
    pub check: bool,
    pub raise: bool,
}

impl LegalActions {
    pub fn allows(&self, action: &Action) -> bool {
        match action {
            Action::Fold => self.fold,
            Action::Call => self.call,
            Action::Check => self.check,
            Action::Raise(_) => self.raise,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_matches_the_flag_for_each_kind() {
        let legal = LegalActions { fold: true, call: true, check: false, raise: false };
        assert!(legal.allows(&Action::Fold));
        assert!(legal.allows(&Action::Call));
        assert!(!legal.allows(&Action::Check));
        assert!(!legal.allows(&Action::Raise(10)));
    }
}
