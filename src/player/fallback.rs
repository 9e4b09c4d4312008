//! The hand-coded policy consulted when the trained average strategy has
//! no entry for the current information set. Grounded in
//! `HandleActionConverged`/`HandleActionNotConverged`: `did_converge`
//! selects the more aggressive, tighter-calling thresholds a well-identified
//! opponent earns.

use crate::engine::{Action, LegalActions};
use crate::Chips;

fn make_relative_bet(frac: f32, pot_size: Chips, min_raise: Chips, max_raise: Chips) -> Chips {
    let amt = (frac * pot_size as f32) as Chips;
    amt.clamp(min_raise, max_raise)
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn fallback_action(
    ev: f32,
    pot_size: Chips,
    continue_cost: Chips,
    opp_contribution: Chips,
    legal: LegalActions,
    min_raise: Chips,
    max_raise: Chips,
    did_converge: bool,
) -> Action {
    if legal.check {
        let check_threshold = if did_converge { 0.6 } else { 0.7 };
        if ev < check_threshold || !legal.raise {
            return Action::Check;
        }
        if !did_converge {
            return Action::Raise(make_relative_bet(1.0, pot_size, min_raise, max_raise));
        }
        return if ev <= 0.8 {
            Action::Raise(make_relative_bet(1.0, pot_size, min_raise, max_raise))
        } else {
            Action::Raise(make_relative_bet(2.0, pot_size, min_raise, max_raise))
        };
    }

    let pot_after_call = 2 * opp_contribution;
    let equity = ev * pot_after_call as f32;
    let worth_multiplier = if did_converge { 1.8 } else { 1.2 };
    if equity < worth_multiplier * continue_cost as f32 {
        return Action::Fold;
    }
    if ev >= 0.7 && legal.raise {
        Action::Raise(make_relative_bet(1.0, pot_size, min_raise, max_raise))
    } else {
        Action::Call
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checks_back_weak_equity() {
        let legal = LegalActions { check: true, raise: true, ..Default::default() };
        let action = fallback_action(0.3, 20, 0, 2, legal, 4, 200, false);
        assert_eq!(action, Action::Check);
    }

    #[test]
    fn folds_when_continuing_is_not_worth_the_price() {
        let legal = LegalActions { fold: true, call: true, ..Default::default() };
        let action = fallback_action(0.1, 20, 50, 10, legal, 4, 200, false);
        assert_eq!(action, Action::Fold);
    }

    #[test]
    fn a_converged_read_raises_bigger_on_strong_equity() {
        let legal = LegalActions { check: true, raise: true, ..Default::default() };
        let action = fallback_action(0.95, 20, 0, 2, legal, 4, 200, true);
        assert_eq!(action, Action::Raise(40));
    }
}
