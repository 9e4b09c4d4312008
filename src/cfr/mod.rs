//! Monte-Carlo CFR traversal (component G): the abstracted-action-set
//! builder, the information-set / precomputed-equity plumbing that feeds
//! [`crate::bucket`], and the recursive regret/average-strategy update that
//! walks one externally-sampled deal's whole game tree.
//!
//! grounded in `cfr.cpp`'s `MakeActions`/`MakeInfoSet`/`MakePrecomputedEv`/
//! `TraverseCfr` and `cfr_trainer.cpp`'s `DoCfrIterationForPlayer`.

use crate::bucket::{BucketFn, InfoSet};
use crate::engine::{Action, Round, RoundState, Street};
use crate::equity::{Equity, EquityQuery, HandEvaluator};
use crate::history;
use crate::kmeans::{self, OpponentBuckets, StrengthVector};
use crate::strategy::{apply_mask_and_uniform, StrategyTable, NUM_ACTIONS};
use crate::{Chips, Probability, MAX_ACTIONS_PER_STREET};

/// hero's precomputed equity vs. a random villain, one entry per player per
/// dense street index `0..=3`. computed once per sampled deal and consulted
/// by every infoset along that deal's tree, instead of recomputing equity
/// at every node. grounded in `MakePrecomputedEv`, including its quirk of
/// evaluating against the full five-card board at every street rather than
/// only the board cards that street has actually revealed -- the traversal
/// already knows the whole sampled deal, so this is a cheap "how good is
/// this hand really" feature rather than a leak, and the street-by-street
/// `iters` schedule (coarse preflop, exhaustive river) is what actually
/// varies the signal.
pub type PrecomputedEv = [[f32; 4]; 2];

pub fn make_precomputed_ev(round: &Round, equity: &impl Equity, iters: [usize; 4]) -> PrecomputedEv {
    let mut out = [[0.0f32; 4]; 2];
    for (p, row) in out.iter_mut().enumerate() {
        for (s, slot) in row.iter_mut().enumerate() {
            *slot = equity.evaluate(EquityQuery::VsRandom { hero: round.hands[p] }, &round.board, &[], iters[s]);
        }
    }
    out
}

/// hero's precomputed opponent-bucket strength vector, one entry per player
/// per dense street index `0..=3`. unlike [`PrecomputedEv`] this uses only
/// the board cards that street has actually revealed -- there is no upstream
/// `MakePrecomputedStrength` to mirror a quirk from; this exists so the
/// trainer can bucket with [`BucketFn::Kmeans`] the same way the online
/// player does (see `crate::player`'s module doc for why the two need to
/// agree on a single bucketing scheme), without recomputing a strength
/// vector from scratch at every node of the traversal.
pub type PrecomputedStrength = [[StrengthVector; 4]; 2];

pub fn make_precomputed_strength(round: &Round, buckets: &OpponentBuckets, equity: &impl Equity, iters: usize) -> PrecomputedStrength {
    std::array::from_fn(|p| {
        std::array::from_fn(|s| {
            let revealed = Street::from_index0123(s).board_cards();
            kmeans::strength_vector(buckets, equity, round.hands[p], &round.board[..revealed], iters)
        })
    })
}

/// six abstract half-pot-multiple raise sizes plus fold/call/check, and
/// which of them are legal here. grounded in `MakeActions`: the same
/// schedule of `{HP, 1P, 2P}` raises clamped to `raise_bounds`, with raises
/// masked off once the street's action-slot budget is down to its last
/// wrapped slot (`force_fold_call`).
pub fn make_actions(round: &Round, active: usize) -> ([Action; NUM_ACTIONS], [bool; NUM_ACTIONS]) {
    let legal = round.legal_actions();
    let my_pip = round.pips[active];
    let opp_pip = round.pips[1 - active];
    let (min_raise, max_raise) = round.raise_bounds();
    let committed = round.committed();
    let pot_size = committed[0] + committed[1];

    let bet_actions_so_far = round.bet_history.last().map_or(0, |v| v.len());
    let bet_actions_this_street =
        if round.street == Street::Preflop { MAX_ACTIONS_PER_STREET + 2 } else { MAX_ACTIONS_PER_STREET };
    let force_fold_call = bet_actions_so_far >= bet_actions_this_street - 1;

    let pot_size_after_call = pot_size + (my_pip - opp_pip).abs();
    let half_pot_mults = [1u32, 2, 4];
    let mut actions = [Action::Fold, Action::Call, Action::Check, Action::Raise(0), Action::Raise(0), Action::Raise(0)];
    for (slot, &mult) in half_pot_mults.iter().enumerate() {
        let amt_to_add = (pot_size_after_call as f32 * mult as f32 / 2.0) as Chips;
        let amt_to_raise = my_pip.max(opp_pip) + amt_to_add;
        actions[3 + slot] = Action::Raise(amt_to_raise.clamp(min_raise, max_raise));
    }

    let legal_flags = [legal.fold, legal.call, legal.check, legal.raise, legal.raise, legal.raise];
    let mut mask = [false; NUM_ACTIONS];
    for i in 0..NUM_ACTIONS {
        let is_raise = i >= 3;
        mask[i] = legal_flags[i] && !(is_raise && force_fold_call);
    }

    (actions, mask)
}

/// wraps the current round's flex bet history into the fixed width and
/// pairs it with this player's precomputed street equity and opponent-
/// strength vector. grounded in `MakeInfoSet`.
pub fn make_infoset(
    round: &Round,
    active_plyr_idx: usize,
    player_is_sb: bool,
    precomputed_ev: &PrecomputedEv,
    precomputed_strength: &PrecomputedStrength,
) -> InfoSet {
    let street0123 = round.street.index0123();
    InfoSet {
        equity: precomputed_ev[active_plyr_idx][street0123],
        bet_history_fixed: history::to_fixed(&round.bet_history),
        player_position: if player_is_sb { 0 } else { 1 },
        street: street0123,
        strength_vector: Some(precomputed_strength[active_plyr_idx][street0123]),
    }
}

/// strategy-value and best-response-value of a node for both players, and
/// the resulting exploitability (`best_response_ev - strategy_ev`).
/// grounded in `NodeInfo`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeInfo {
    pub strategy_ev: [f64; 2],
    pub best_response_ev: [f64; 2],
    pub exploitability: [f64; 2],
}

fn compute_ev(values: &[[f64; 2]; NUM_ACTIONS], probs: &[Probability; NUM_ACTIONS]) -> [f64; 2] {
    let mut ev = [0.0; 2];
    for i in 0..NUM_ACTIONS {
        ev[0] += values[i][0] * probs[i] as f64;
        ev[1] += values[i][1] * probs[i] as f64;
    }
    ev
}

/// recursively walk one sampled deal's game tree, regret-matching at every
/// node the traversing player owns and accumulating both players'
/// counterfactual regret and average-strategy mass. grounded in
/// `TraverseCfr`.
///
/// `do_external_sampling` is accepted for fidelity with the upstream
/// signature but, as in every call site there, is never actually consulted
/// -- every legal action is explored at every node regardless (the
/// "Monte Carlo" in this trainer's name comes from sampling the deal once
/// per traversal, not from sampling actions within it).
#[allow(clippy::too_many_arguments, unused_variables)]
pub fn traverse_cfr(
    state: &RoundState,
    traverse_plyr: usize,
    sb_plyr_idx: usize,
    regrets: &mut [StrategyTable; 2],
    strategies: &mut [StrategyTable; 2],
    reach_probabilities: [f64; 2],
    precomputed_ev: &PrecomputedEv,
    precomputed_strength: &PrecomputedStrength,
    evaluator: &impl HandEvaluator,
    bucket_fn: &BucketFn,
    allow_updates: bool,
    do_external_sampling: bool,
    skip_unreachable_actions: bool,
) -> NodeInfo {
    let round = match state {
        RoundState::Terminal(terminal) => {
            let ev = [terminal.deltas[0] as f64, terminal.deltas[1] as f64];
            return NodeInfo { strategy_ev: ev, best_response_ev: ev, exploitability: [0.0, 0.0] };
        }
        RoundState::Round(round) => round,
    };

    let active = round.active();
    let inactive = 1 - active;

    let (actions, mask) = make_actions(round, active);
    let infoset = make_infoset(round, active, active == sb_plyr_idx, precomputed_ev, precomputed_strength);
    let key = bucket_fn.key(&infoset);

    let raw_probs = regrets[active].get_strategy(&key);
    let action_probs = apply_mask_and_uniform(&raw_probs, &mask);

    let mut action_values = [[0.0f64; 2]; NUM_ACTIONS];
    let mut br_values = [[0.0f64; 2]; NUM_ACTIONS];

    for i in 0..NUM_ACTIONS {
        if !mask[i] || (skip_unreachable_actions && action_probs[i] <= 0.0) {
            continue;
        }
        let next_state = round.proceed(actions[i], evaluator);
        let mut next_reach = reach_probabilities;
        next_reach[active] *= action_probs[i] as f64;

        let child = traverse_cfr(
            &next_state,
            traverse_plyr,
            sb_plyr_idx,
            regrets,
            strategies,
            next_reach,
            precomputed_ev,
            precomputed_strength,
            evaluator,
            bucket_fn,
            allow_updates,
            do_external_sampling,
            skip_unreachable_actions,
        );
        action_values[i] = child.strategy_ev;
        br_values[i] = child.best_response_ev;
    }

    let mut node_info = NodeInfo::default();
    node_info.strategy_ev = compute_ev(&action_values, &action_probs);

    let mut immediate_regrets = [0.0f32; NUM_ACTIONS];
    for i in 0..NUM_ACTIONS {
        if mask[i] {
            immediate_regrets[i] = (action_values[i][active] - node_info.strategy_ev[active]) as f32;
        }
    }

    let mut br_active = f64::NEG_INFINITY;
    for i in 0..NUM_ACTIONS {
        if mask[i] {
            br_active = br_active.max(br_values[i][active]);
        }
    }
    node_info.best_response_ev[active] = br_active;
    node_info.best_response_ev[inactive] = compute_ev(&br_values, &action_probs)[inactive];
    node_info.exploitability = [
        node_info.best_response_ev[0] - node_info.strategy_ev[0],
        node_info.best_response_ev[1] - node_info.strategy_ev[1],
    ];

    if allow_updates && active == traverse_plyr {
        let counterfactual = reach_probabilities[inactive] as f32;
        let mut weighted_probs = action_probs;
        for p in weighted_probs.iter_mut() {
            *p *= counterfactual;
        }
        for r in immediate_regrets.iter_mut() {
            *r *= counterfactual;
        }
        strategies[active].add_regret(&key, &weighted_probs);
        regrets[active].add_regret(&key, &immediate_regrets);
    }

    node_info
}

/// one training iteration for `traverse_plyr`: a fresh random deal for each
/// of the two small-blind assignments, fully traversed. grounded in
/// `DoCfrIterationForPlayer`.
#[allow(clippy::too_many_arguments)]
pub fn do_cfr_iteration_for_player(
    regrets: &mut [StrategyTable; 2],
    strategies: &mut [StrategyTable; 2],
    traverse_plyr: usize,
    seed: u64,
    ev_iters: [usize; 4],
    strength_iters: usize,
    equity: &impl Equity,
    evaluator: &impl HandEvaluator,
    buckets: &OpponentBuckets,
    bucket_fn: &BucketFn,
) -> NodeInfo {
    let mut info = NodeInfo::default();
    for k in 0..2u64 {
        let sb_plyr_idx = (k % 2) as usize;
        let round = Round::new_round(sb_plyr_idx, seed.wrapping_mul(0x9E3779B97F4A7C15).wrapping_add(k));
        let precomputed_ev = make_precomputed_ev(&round, equity, ev_iters);
        let precomputed_strength = make_precomputed_strength(&round, buckets, equity, strength_iters);
        info = traverse_cfr(
            &RoundState::Round(round),
            traverse_plyr,
            sb_plyr_idx,
            regrets,
            strategies,
            [1.0, 1.0],
            &precomputed_ev,
            &precomputed_strength,
            evaluator,
            bucket_fn,
            true,
            false,
            false,
        );
    }
    info
}

/// runs `n` sampled full traversals with regret updates disabled and
/// reports the mean/standard-deviation/standard-error of each deal's
/// summed (both players') exploitability. grounded in `cfr_trainer.cpp`'s
/// periodic evaluation pass, the same one `do_cfr_iteration_for_player`
/// is interleaved with during training.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_exploitability(
    regrets: &mut [StrategyTable; 2],
    strategies: &mut [StrategyTable; 2],
    n: usize,
    seed: u64,
    ev_iters: [usize; 4],
    strength_iters: usize,
    equity: &impl Equity,
    evaluator: &impl HandEvaluator,
    buckets: &OpponentBuckets,
    bucket_fn: &BucketFn,
) -> (f64, f64, f64) {
    let mut samples = Vec::with_capacity(n);
    for i in 0..n {
        let sb_plyr_idx = i % 2;
        let round = Round::new_round(sb_plyr_idx, seed.wrapping_mul(0xD1B54A32D192ED03).wrapping_add(i as u64));
        let precomputed_ev = make_precomputed_ev(&round, equity, ev_iters);
        let precomputed_strength = make_precomputed_strength(&round, buckets, equity, strength_iters);
        let info = traverse_cfr(
            &RoundState::Round(round),
            0,
            sb_plyr_idx,
            regrets,
            strategies,
            [1.0, 1.0],
            &precomputed_ev,
            &precomputed_strength,
            evaluator,
            bucket_fn,
            false,
            false,
            true,
        );
        samples.push(info.exploitability[0] + info.exploitability[1]);
    }

    let mean = samples.iter().sum::<f64>() / n as f64;
    let denom = if n > 1 { (n - 1) as f64 } else { 1.0 };
    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / denom;
    let stdev = variance.sqrt();
    let stderr = stdev / (n as f64).sqrt();
    (mean, stdev, stderr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equity::{MonteCarloEquity, StandardEvaluator};

    fn new_tables() -> [StrategyTable; 2] {
        [StrategyTable::new(), StrategyTable::new()]
    }

    fn tiny_buckets(equity: &impl Equity) -> OpponentBuckets {
        OpponentBuckets::cluster(equity, 1, 3)
    }

    #[test]
    fn make_actions_masks_raises_once_the_street_wraps() {
        let round = Round::new_round(0, 1);
        let mut r = round.clone();
        r.bet_history = vec![vec![1, 2, 3, 3, 3]]; // preflop slot budget is 6 (4+2); one left
        let (_, mask) = make_actions(&r, r.active());
        assert!(!mask[3] && !mask[4] && !mask[5], "raises should be masked once force_fold_call triggers");
    }

    #[test]
    fn make_actions_clamps_raise_amounts_to_bounds() {
        let round = Round::new_round(0, 1);
        let (actions, _) = make_actions(&round, round.active());
        let (min_raise, max_raise) = round.raise_bounds();
        for a in actions {
            if let Action::Raise(amt) = a {
                assert!(amt >= min_raise && amt <= max_raise);
            }
        }
    }

    #[test]
    fn terminal_state_reports_its_deltas_as_both_evs() {
        let evaluator = StandardEvaluator;
        let round = Round::new_round(0, 9);
        let terminal = round.proceed(Action::Fold, &evaluator);
        let precomputed_ev = [[0.0; 4]; 2];
        let precomputed_strength = [[[0.0f32; 8]; 4]; 2];
        let bucket_fn = BucketFn::Small;
        let mut regrets = new_tables();
        let mut strategies = new_tables();
        let info = traverse_cfr(
            &terminal,
            0,
            0,
            &mut regrets,
            &mut strategies,
            [1.0, 1.0],
            &precomputed_ev,
            &precomputed_strength,
            &evaluator,
            &bucket_fn,
            true,
            false,
            false,
        );
        assert_eq!(info.strategy_ev, info.best_response_ev);
        assert_eq!(info.exploitability, [0.0, 0.0]);
    }

    #[test]
    fn one_traversal_grows_both_players_regret_tables() {
        let evaluator = StandardEvaluator;
        let equity = MonteCarloEquity::new(StandardEvaluator);
        let buckets = tiny_buckets(&equity);
        let bucket_fn = BucketFn::Small;
        let mut regrets = new_tables();
        let mut strategies = new_tables();

        do_cfr_iteration_for_player(&mut regrets, &mut strategies, 0, 42, [1, 3, 3, 3], 1, &equity, &evaluator, &buckets, &bucket_fn);

        assert!(!regrets[0].is_empty());
        assert!(!strategies[0].is_empty());
    }

    #[test]
    fn exploitability_is_nonnegative_at_the_root_of_a_full_traversal() {
        let evaluator = StandardEvaluator;
        let equity = MonteCarloEquity::new(StandardEvaluator);
        let buckets = tiny_buckets(&equity);
        let bucket_fn = BucketFn::Small;
        let mut regrets = new_tables();
        let mut strategies = new_tables();

        let info = do_cfr_iteration_for_player(
            &mut regrets, &mut strategies, 0, 7, [1, 3, 3, 3], 1, &equity, &evaluator, &buckets, &bucket_fn,
        );

        assert!(info.exploitability[0] >= -1e-6);
        assert!(info.exploitability[1] >= -1e-6);
    }

    #[test]
    fn evaluate_exploitability_reports_a_sane_summary() {
        let evaluator = StandardEvaluator;
        let equity = MonteCarloEquity::new(StandardEvaluator);
        let buckets = tiny_buckets(&equity);
        let bucket_fn = BucketFn::Small;
        let mut regrets = new_tables();
        let mut strategies = new_tables();
        do_cfr_iteration_for_player(&mut regrets, &mut strategies, 0, 3, [1, 3, 3, 3], 1, &equity, &evaluator, &buckets, &bucket_fn);

        let (mean, stdev, stderr) = evaluate_exploitability(
            &mut regrets, &mut strategies, 4, 11, [1, 3, 3, 3], 1, &equity, &evaluator, &buckets, &bucket_fn,
        );

        assert!(mean >= -1e-6);
        assert!(stdev >= 0.0);
        assert!(stderr >= 0.0);
    }
}
