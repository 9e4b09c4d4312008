use crate::engine::Street;
use crate::{Chips, BIG_BLIND, MAX_ACTIONS_PER_STREET, SMALL_BLIND};

/// width of a flattened, wrapped bet history: 2 preflop blind slots plus
/// `MAX_ACTIONS_PER_STREET` action slots per street.
pub const FIXED_WIDTH: usize = 2 + 4 * MAX_ACTIONS_PER_STREET;

/// observes a stream of `(my_contribution, opp_contribution, street)`
/// snapshots -- the only thing the match protocol actually hands a
/// player between decisions -- and reconstructs the flex bet history: one
/// `Vec<Chips>` of chip-add amounts per street, in the same shape
/// `engine::Round::bet_history` itself uses.
///
/// grounded in the original bot's `HistoryTracker::Update` (a fixed,
/// wraparound array of width `4*K`), adapted to the flex representation
/// this crate treats as canonical: the original backpatches and wraps in
/// the same pass because its storage is already fixed-width; here the
/// wrap is deferred to `to_fixed`, so `update` only ever appends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTracker {
    history: Vec<Vec<Chips>>,
    is_big_blind: bool,
    prev_street: Option<Street>,
    recorded: [Chips; 2],
    prev_street_contrib: Chips,
}

impl HistoryTracker {
    pub fn new(is_big_blind: bool) -> Self {
        let recorded = if is_big_blind { [BIG_BLIND, SMALL_BLIND] } else { [SMALL_BLIND, BIG_BLIND] };
        Self {
            history: vec![vec![SMALL_BLIND, BIG_BLIND]],
            is_big_blind,
            prev_street: None,
            recorded,
            prev_street_contrib: 0,
        }
    }

    pub fn history(&self) -> &[Vec<Chips>] {
        &self.history
    }

    /// who acts first on a given street: the small blind preflop, the big
    /// blind every street after.
    fn we_go_first(&self, street: Street) -> bool {
        if street == Street::Preflop {
            !self.is_big_blind
        } else {
            self.is_big_blind
        }
    }

    /// feed the tracker the latest observed cumulative contributions. call
    /// this once per decision point (and once more at round end) with
    /// whatever the engine currently reports -- it is idempotent against
    /// repeated identical snapshots (the deltas it records are simply 0).
    pub fn update(&mut self, my_contrib: Chips, opp_contrib: Chips, street: Street) {
        let started_new_street = self.prev_street != Some(street);

        if started_new_street {
            if self.prev_street.is_some() {
                // the street that just ended must have equalized; recover
                // whichever side's implicit closing call we never saw as
                // its own observation and patch it onto that street.
                let abs_level = my_contrib.min(opp_contrib);
                self.backpatch_previous_street(abs_level);
                self.recorded = [abs_level, abs_level];
                self.prev_street_contrib = abs_level;
                self.history.push(Vec::new());
            }
            self.prev_street = Some(street);
        }

        let we_go_first = self.we_go_first(street);
        if !we_go_first && started_new_street {
            self.record_opponent(opp_contrib);
        } else if !started_new_street {
            self.record_mine(my_contrib);
            self.record_opponent(opp_contrib);
        }
        // `we_go_first && started_new_street`: we haven't acted yet this
        // street, nothing to record.
    }

    fn record_mine(&mut self, my_contrib: Chips) {
        let delta = my_contrib - self.recorded[0];
        debug_assert!(delta >= 0, "contribution must not decrease");
        self.recorded[0] = my_contrib;
        self.history.last_mut().expect("at least one street").push(delta);
    }

    fn record_opponent(&mut self, opp_contrib: Chips) {
        let delta = opp_contrib - self.recorded[1];
        debug_assert!(delta >= 0, "contribution must not decrease");
        self.recorded[1] = opp_contrib;
        self.history.last_mut().expect("at least one street").push(delta);
    }

    fn backpatch_previous_street(&mut self, abs_level: Chips) {
        let missing_mine = abs_level - self.recorded[0];
        let missing_opp = abs_level - self.recorded[1];
        let street_vec = self.history.last_mut().expect("at least one street");
        if missing_mine == 0 && missing_opp == 0 && street_vec.is_empty() {
            // the street was reached (its vector exists) but closed before we
            // were ever asked again -- the only way that happens is a
            // check-check. record both explicit zeros so a street that was
            // actually played isn't mistaken for one that never started.
            street_vec.push(0);
            street_vec.push(0);
            return;
        }
        if missing_mine > 0 {
            street_vec.push(missing_mine);
            self.recorded[0] = abs_level;
        }
        if missing_opp > 0 {
            street_vec.push(missing_opp);
            self.recorded[1] = abs_level;
        }
    }

    /// flatten the flex history into the fixed, wrapped width CFR's
    /// information sets are keyed on. actions beyond `MAX_ACTIONS_PER_STREET`
    /// on a street fold into the last two slots (one per parity), matching
    /// the original `MakeInfoSet`'s conversion from `FlexHistory` to
    /// `FixedHistory`.
    pub fn to_fixed(&self) -> [Chips; FIXED_WIDTH] {
        to_fixed(&self.history)
    }
}

/// free function so `bucket` (and anything else building an infoset from
/// a raw `Vec<Vec<Chips>>`, e.g. `engine::Round::bet_history` directly
/// during training) doesn't need a whole `HistoryTracker` just to wrap.
pub fn to_fixed(history: &[Vec<Chips>]) -> [Chips; FIXED_WIDTH] {
    let mut fixed = [0 as Chips; FIXED_WIDTH];
    for (street, actions) in history.iter().enumerate() {
        let offset = street * MAX_ACTIONS_PER_STREET + if street > 0 { 2 } else { 0 };
        let max_this_street = if street > 0 { MAX_ACTIONS_PER_STREET } else { MAX_ACTIONS_PER_STREET + 2 };
        for (i, &amount) in actions.iter().enumerate() {
            let wrap = i.min(max_this_street - 2 + i % 2);
            fixed[offset + wrap] += amount;
        }
    }
    fixed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_the_posted_blinds() {
        let tracker = HistoryTracker::new(false);
        assert_eq!(tracker.history(), &[vec![SMALL_BLIND, BIG_BLIND]]);
    }

    #[test]
    fn sb_completing_preflop_is_recorded_against_the_closing_street() {
        // small blind, we call the extra chip to equalize at BIG_BLIND,
        // and the opponent checks the option shut: engine would record
        // bet_history[0] == [1, 2, 1, 0].
        let mut tracker = HistoryTracker::new(false);
        tracker.update(BIG_BLIND, BIG_BLIND, Street::Preflop); // our completing call
        tracker.update(BIG_BLIND, BIG_BLIND, Street::Flop); // street advances, bb checked the option
        assert_eq!(tracker.history()[0], vec![SMALL_BLIND, BIG_BLIND, 1]);
    }

    #[test]
    fn double_check_closes_a_street_at_zero_zero() {
        let mut tracker = HistoryTracker::new(true); // we're the big blind, go first postflop
        tracker.update(BIG_BLIND, BIG_BLIND, Street::Preflop);
        tracker.update(BIG_BLIND, BIG_BLIND, Street::Flop); // our check
        tracker.update(BIG_BLIND, BIG_BLIND, Street::Turn); // opponent's check closed it
        assert_eq!(tracker.history()[1], vec![0, 0]);
    }

    #[test]
    fn to_fixed_wraps_overflow_actions_into_the_last_slot_of_each_parity() {
        // six actions on the flop (street 1): with K=4, offsets 1*4+2=6..10.
        let history = vec![
            vec![SMALL_BLIND, BIG_BLIND],
            vec![1, 1, 1, 1, 1, 1],
            vec![],
            vec![],
        ];
        let fixed = to_fixed(&history);
        // i=0,1,2,3 map to wrap 0,1,2,3 (no overflow yet: max_this_street-2=2, so
        // wrap=min(i, 2+i%2) -> i=0:0, i=1:1, i=2:2, i=3:3, i=4:min(4,2)=2, i=5:min(5,3)=3
        assert_eq!(fixed[6], 1); // i=0
        assert_eq!(fixed[7], 1); // i=1
        assert_eq!(fixed[8], 1 + 1); // i=2 and i=4 fold together
        assert_eq!(fixed[9], 1 + 1); // i=3 and i=5 fold together
    }

    #[test]
    fn history_round_trips_against_a_played_out_round() {
        use crate::engine::{Action, RoundState};
        use crate::equity::StandardEvaluator;

        let evaluator = StandardEvaluator;
        let mut state = RoundState::Round(crate::engine::Round::new_round(0, 7));
        let mut tracker_sb = HistoryTracker::new(false);
        let mut tracker_bb = HistoryTracker::new(true);

        loop {
            let round = match &state {
                RoundState::Round(r) => r.clone(),
                RoundState::Terminal(_) => break,
            };
            let committed = round.committed();
            let (my0, opp0) = (committed[0], committed[1]);
            tracker_sb.update(my0, opp0, round.street);
            tracker_bb.update(opp0, my0, round.street);

            let legal = round.legal_actions();
            let action = if legal.check {
                Action::Check
            } else if legal.call {
                Action::Call
            } else {
                Action::Fold
            };
            state = round.proceed(action, &evaluator);
        }

        if let RoundState::Terminal(terminal) = state {
            let flat: Chips = terminal.bet_history.iter().flatten().sum();
            let sb_flat: Chips = tracker_sb.history().iter().flatten().sum();
            assert_eq!(flat, sb_flat);
        }
    }
}
