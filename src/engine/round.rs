use crate::cards::{Card, Deck};
use crate::engine::action::{Action, LegalActions};
use crate::engine::street::Street;
use crate::equity::HandEvaluator;
use crate::{Chips, BIG_BLIND, SMALL_BLIND, STARTING_STACK};

/// one hand in progress. all community cards are dealt up front (the deal
/// is decided the moment the deck is shuffled); `street` only controls how
/// much of `board` is currently visible to legality and showdown logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    pub button: u32,
    pub street: Street,
    pub pips: [Chips; 2],
    pub stacks: [Chips; 2],
    pub hands: [[Card; 2]; 2],
    pub board: [Card; 5],
    pub bet_history: Vec<Vec<Chips>>,
    pub sb_player: usize,
}

/// terminal payoff. per the flagged redesign, this carries the betting
/// history by value instead of a back-pointer chain to the state that
/// produced it -- nothing downstream needs the chain, only the final tally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminal {
    pub deltas: [Chips; 2],
    pub bet_history: Vec<Vec<Chips>>,
}

/// tagged union in place of the `State`/`RoundState`/`TerminalState` class
/// hierarchy: a hand is either still in progress or has paid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundState {
    Round(Round),
    Terminal(Terminal),
}

impl Round {
    /// deals 9 cards (2 + 2 + 5), posts blinds `{SMALL_BLIND, BIG_BLIND}`
    /// against `STARTING_STACK`, and seats `sb_player` on the button.
    pub fn new_round(sb_player: usize, seed: u64) -> Self {
        let mut deck = Deck::shuffle(seed);
        let hand0: [Card; 2] = deck.draw(2).try_into().unwrap();
        let hand1: [Card; 2] = deck.draw(2).try_into().unwrap();
        let board: [Card; 5] = deck.draw(5).try_into().unwrap();

        let mut pips = [0; 2];
        let mut stacks = [STARTING_STACK; 2];
        pips[sb_player] = SMALL_BLIND;
        pips[1 - sb_player] = BIG_BLIND;
        stacks[sb_player] -= SMALL_BLIND;
        stacks[1 - sb_player] -= BIG_BLIND;

        Self {
            button: sb_player as u32,
            street: Street::Preflop,
            pips,
            stacks,
            hands: [hand0, hand1],
            board,
            bet_history: vec![vec![SMALL_BLIND, BIG_BLIND]],
            sb_player,
        }
    }

    pub fn active(&self) -> usize {
        (self.button % 2) as usize
    }

    fn continue_cost(&self) -> Chips {
        let active = self.active();
        self.pips[1 - active] - self.pips[active]
    }

    /// `{FOLD, CALL, CHECK, RAISE}` legality for the active player.
    pub fn legal_actions(&self) -> LegalActions {
        let active = self.active();
        let continue_cost = self.continue_cost();
        if continue_cost == 0 {
            let bets_forbidden = self.stacks[0] == 0 || self.stacks[1] == 0;
            if bets_forbidden {
                return LegalActions { check: true, ..Default::default() };
            }
            return LegalActions { check: true, raise: true, ..Default::default() };
        }
        let raises_forbidden = continue_cost == self.stacks[active] || self.stacks[1 - active] == 0;
        if raises_forbidden {
            return LegalActions { fold: true, call: true, ..Default::default() };
        }
        LegalActions { fold: true, call: true, raise: true, ..Default::default() }
    }

    /// `(min, max)` total pip targets a RAISE may name.
    pub fn raise_bounds(&self) -> (Chips, Chips) {
        let active = self.active();
        let continue_cost = self.continue_cost();
        let max_contribution = self.stacks[active].min(self.stacks[1 - active] + continue_cost);
        let min_contribution = max_contribution.min(continue_cost + continue_cost.max(BIG_BLIND));
        (self.pips[active] + min_contribution, self.pips[active] + max_contribution)
    }

    fn push_contribution(&self, contribution: Chips) -> Vec<Vec<Chips>> {
        let mut history = self.bet_history.clone();
        history.last_mut().expect("every street has a bet vector").push(contribution);
        history
    }

    /// advances the tree by one action. needs the evaluator because a CALL
    /// or CHECK that closes out the river must resolve straight to a
    /// showdown, not merely to a `Round` sitting past the last street.
    pub fn proceed(&self, action: Action, evaluator: &impl HandEvaluator) -> RoundState {
        debug_assert!(self.legal_actions().allows(&action), "illegal action {action:?}");
        let active = self.active();
        match action {
            Action::Fold => {
                let folder = active;
                let winner = 1 - active;
                let mut deltas = [0; 2];
                deltas[folder] = self.stacks[folder] - STARTING_STACK;
                deltas[winner] = -deltas[folder];
                RoundState::Terminal(Terminal { deltas, bet_history: self.bet_history.clone() })
            }
            Action::Call => {
                if self.button as usize == self.sb_player && self.street == Street::Preflop {
                    let bet_history = self.push_contribution(1);
                    return RoundState::Round(Round {
                        button: self.button + 1,
                        street: Street::Preflop,
                        pips: [BIG_BLIND, BIG_BLIND],
                        stacks: [STARTING_STACK - BIG_BLIND, STARTING_STACK - BIG_BLIND],
                        hands: self.hands,
                        board: self.board,
                        bet_history,
                        sb_player: self.sb_player,
                    });
                }
                let contribution = self.continue_cost();
                let mut pips = self.pips;
                let mut stacks = self.stacks;
                stacks[active] -= contribution;
                pips[active] += contribution;
                let bet_history = self.push_contribution(contribution);
                Round {
                    button: self.button + 1,
                    street: self.street,
                    pips,
                    stacks,
                    hands: self.hands,
                    board: self.board,
                    bet_history,
                    sb_player: self.sb_player,
                }
                .proceed_street(evaluator)
            }
            Action::Check => {
                let both_acted = (self.street == Street::Preflop && self.button as usize > self.sb_player)
                    || active == self.sb_player;
                let bet_history = self.push_contribution(0);
                let unchanged = Round {
                    button: self.button,
                    street: self.street,
                    pips: self.pips,
                    stacks: self.stacks,
                    hands: self.hands,
                    board: self.board,
                    bet_history: bet_history.clone(),
                    sb_player: self.sb_player,
                };
                if both_acted {
                    unchanged.proceed_street(evaluator)
                } else {
                    RoundState::Round(Round { button: self.button + 1, ..unchanged })
                }
            }
            Action::Raise(amount) => {
                let contribution = amount - self.pips[active];
                let mut pips = self.pips;
                let mut stacks = self.stacks;
                stacks[active] -= contribution;
                pips[active] += contribution;
                let bet_history = self.push_contribution(contribution);
                RoundState::Round(Round {
                    button: self.button + 1,
                    street: self.street,
                    pips,
                    stacks,
                    hands: self.hands,
                    board: self.board,
                    bet_history,
                    sb_player: self.sb_player,
                })
            }
        }
    }

    /// resets pips and advances to the next street; from the river,
    /// resolves to showdown instead.
    pub fn proceed_street(&self, evaluator: &impl HandEvaluator) -> RoundState {
        match self.street.next() {
            None => self.showdown(evaluator),
            Some(next) => {
                let mut bet_history = self.bet_history.clone();
                bet_history.push(Vec::new());
                RoundState::Round(Round {
                    button: 1 - self.sb_player as u32,
                    street: next,
                    pips: [0, 0],
                    stacks: self.stacks,
                    hands: self.hands,
                    board: self.board,
                    bet_history,
                    sb_player: self.sb_player,
                })
            }
        }
    }

    /// builds both 7-card hands, scores them via the external evaluator,
    /// and splits the pot accordingly (evenly on a tie).
    pub fn showdown(&self, evaluator: &impl HandEvaluator) -> RoundState {
        let seven = |hand: [Card; 2]| -> [Card; 7] {
            [hand[0], hand[1], self.board[0], self.board[1], self.board[2], self.board[3], self.board[4]]
        };
        let score0 = evaluator.score(&seven(self.hands[0]));
        let score1 = evaluator.score(&seven(self.hands[1]));
        let delta0 = match score0.cmp(&score1) {
            std::cmp::Ordering::Greater => STARTING_STACK - self.stacks[1],
            std::cmp::Ordering::Less => self.stacks[0] - STARTING_STACK,
            std::cmp::Ordering::Equal => (self.stacks[0] - self.stacks[1]) / 2,
        };
        RoundState::Terminal(Terminal { deltas: [delta0, -delta0], bet_history: self.bet_history.clone() })
    }

    /// chips actually committed by both players so far, for the
    /// bet-history invariant and for history-tracker bookkeeping.
    pub fn committed(&self) -> [Chips; 2] {
        [STARTING_STACK - self.stacks[0], STARTING_STACK - self.stacks[1]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equity::StandardEvaluator;

    fn flat_history_sum(history: &[Vec<Chips>]) -> Chips {
        history.iter().flatten().sum()
    }

    #[test]
    fn new_round_posts_blinds() {
        let round = Round::new_round(0, 1);
        assert_eq!(round.pips, [SMALL_BLIND, BIG_BLIND]);
        assert_eq!(round.stacks, [STARTING_STACK - SMALL_BLIND, STARTING_STACK - BIG_BLIND]);
        assert_eq!(flat_history_sum(&round.bet_history), 2 * STARTING_STACK - round.stacks[0] - round.stacks[1]);
    }

    #[test]
    fn legal_actions_forbid_raise_when_a_stack_is_empty() {
        let mut round = Round::new_round(0, 1);
        round.stacks = [0, STARTING_STACK];
        round.pips = [0, 0];
        let legal = round.legal_actions();
        assert!(legal.check);
        assert!(!legal.raise);
    }

    #[test]
    fn fold_pays_the_pot_to_the_opponent() {
        let evaluator = StandardEvaluator;
        let round = Round::new_round(0, 2);
        let active = round.active();
        let next = round.proceed(Action::Fold, &evaluator);
        match next {
            RoundState::Terminal(terminal) => {
                assert_eq!(terminal.deltas[0] + terminal.deltas[1], 0);
                assert!(terminal.deltas[active] < 0);
            }
            _ => panic!("fold must be terminal"),
        }
    }

    #[test]
    fn sb_call_preflop_equalises_to_the_big_blind() {
        let evaluator = StandardEvaluator;
        let round = Round::new_round(0, 3);
        let next = round.proceed(Action::Call, &evaluator);
        match next {
            RoundState::Round(r) => {
                assert_eq!(r.pips, [BIG_BLIND, BIG_BLIND]);
                assert_eq!(r.street, Street::Preflop);
            }
            _ => panic!("sb call must stay in a round"),
        }
    }

    #[test]
    fn checking_through_every_street_reaches_showdown() {
        let evaluator = StandardEvaluator;
        let mut state = RoundState::Round(Round::new_round(0, 4));
        state = match state {
            RoundState::Round(r) => r.proceed(Action::Call, &evaluator), // sb equalises preflop
            _ => unreachable!(),
        };
        for _ in 0..12 {
            state = match state {
                RoundState::Round(r) => {
                    let action = if r.legal_actions().check { Action::Check } else { Action::Call };
                    r.proceed(action, &evaluator)
                }
                terminal @ RoundState::Terminal(_) => return assert!(matches!(terminal, RoundState::Terminal(_))),
            };
        }
        panic!("four streets of checking should have reached showdown by now");
    }

    #[test]
    fn invariant_bet_history_matches_committed_chips() {
        let evaluator = StandardEvaluator;
        let round = Round::new_round(1, 5);
        let after = round.proceed(Action::Call, &evaluator);
        if let RoundState::Round(r) = after {
            let committed = r.committed();
            assert_eq!(flat_history_sum(&r.bet_history), committed[0] + committed[1]);
        }
    }
}
