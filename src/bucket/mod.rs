use crate::history::FIXED_WIDTH;
use crate::{Chips, MAX_ACTIONS_PER_STREET};

/// everything a bucket function needs to key an information set: current
/// equity estimate, the fixed (wrapped) bet history, whose seat we're in,
/// and the dense `0..=3` street index. `strength_vector` is only consulted
/// by [`BucketFn::Kmeans`], grounded in `RegretMatchedStrategyKmeans`'s
/// override of the base class's bucket computation.
pub struct InfoSet {
    pub equity: f32,
    pub bet_history_fixed: [Chips; FIXED_WIDTH],
    /// 0 = small blind, 1 = big blind.
    pub player_position: usize,
    /// dense street index, 0 (preflop) through 3 (river).
    pub street: usize,
    pub strength_vector: Option<crate::kmeans::StrengthVector>,
}

/// one bucket granularity, replacing the original's `std::function<string
/// (EvInfoSet)>` callback with a closed sum type -- there are exactly five
/// bucket functions in this system and none of them are supplied by a
/// caller, so a `dyn Fn` had no one to serve.
pub enum BucketFn {
    Small,
    Medium,
    Large,
    Ten16,
    Kmeans(crate::kmeans::Centroids),
}

impl BucketFn {
    pub fn key(&self, infoset: &InfoSet) -> String {
        match self {
            BucketFn::Small => bucket_small_join(&bucket_small_slots(infoset)),
            BucketFn::Medium => {
                let mut b = bucket_betting16_slots(infoset);
                b[2] = bucket_ev5(infoset);
                bucket_join19(&b)
            }
            BucketFn::Large => {
                let mut b = bucket_betting16_slots(infoset);
                b[2] = bucket_ev7(infoset);
                bucket_join19(&b)
            }
            BucketFn::Ten16 => {
                let mut b = bucket_betting16_slots(infoset);
                b[2] = bucket_ev10(infoset);
                bucket_join19(&b)
            }
            BucketFn::Kmeans(centroids) => {
                let mut b = bucket_betting16_slots(infoset);
                let strength = infoset
                    .strength_vector
                    .expect("the kmeans bucket function needs an opponent-strength vector");
                b[2] = crate::kmeans::bucket_hand_kmeans(centroids, &strength);
                bucket_join19(&b)
            }
        }
    }
}

fn street_letter(street: usize) -> &'static str {
    match street {
        0 => "P",
        1 => "F",
        2 => "T",
        _ => "R",
    }
}

fn position_letters(player_position: usize) -> &'static str {
    if player_position == 0 {
        "SB"
    } else {
        "BB"
    }
}

fn raise_label(raise_amt: f32) -> &'static str {
    if raise_amt <= 0.75 {
        "HP"
    } else if raise_amt <= 1.5 {
        "1P"
    } else {
        "2P"
    }
}

fn cumulative(bh: &[Chips]) -> Vec<Chips> {
    let mut cumul = vec![bh[0]];
    for i in 1..bh.len() {
        cumul.push(cumul[i - 1] + bh[i]);
    }
    cumul
}

/// `[SB/BB, street, EV-quartile, P-raised x4, O-raised x4, current-street
/// actions x4]`, 15 slots, perfect recall only within the current street.
///
/// grounded line-for-line in `BucketInfoSetSmall`, with the fix from the
/// redesign applied: the current-street CHECK slot is only filled in when
/// it's the opponent's check, or the player's check is itself followed
/// by a bet -- a player's own check that closes the street silently
/// leaving slot 0 blank was the original's bug.
pub fn bucket_small_slots(infoset: &InfoSet) -> [String; 15] {
    let mut h: [String; 15] = std::array::from_fn(|_| "x".to_string());
    h[0] = position_letters(infoset.player_position).to_string();
    h[1] = street_letter(infoset.street).to_string();
    h[2] = if infoset.equity < 0.4 {
        "H0"
    } else if infoset.equity < 0.6 {
        "H1"
    } else if infoset.equity < 0.8 {
        "H2"
    } else {
        "H3"
    }
    .to_string();

    let bh = &infoset.bet_history_fixed;
    debug_assert_eq!(bh.len(), FIXED_WIDTH);

    const PLYR_RAISED_OFFSET: usize = 3;
    const OPP_RAISED_OFFSET: usize = 7;
    const STREET_ACTIONS_OFFSET: usize = 11;

    let cumul = cumulative(bh);
    let mut pips = [0 as Chips; 2];

    for i in 0..bh.len() {
        let is_new_street = i > 2 && (i - 2) % MAX_ACTIONS_PER_STREET == 0;
        if is_new_street {
            pips = [0, 0];
        }

        let street = if i > 2 { (i - 2) / MAX_ACTIONS_PER_STREET } else { 0 };
        if street > infoset.street {
            break;
        }

        let is_player = (street == 0 && (i % 2 == infoset.player_position))
            || (street > 0 && (i % 2 != infoset.player_position));

        let amt_after_action = pips[i % 2] + bh[i];
        let action_is_fold = amt_after_action < pips[1 - i % 2] && bh[i] == 0;
        let action_is_wrapped_raise = amt_after_action < pips[1 - i % 2] && bh[i] > 0;

        if action_is_fold {
            break;
        }

        let action_is_check = amt_after_action == pips[1 - i % 2] && bh[i] == 0;
        let action_is_call = amt_after_action == pips[1 - i % 2] && bh[i] > 0;
        let action_is_raise = amt_after_action > pips[1 - i % 2];

        if action_is_raise && i >= 2 {
            if is_player {
                h[PLYR_RAISED_OFFSET + street] = "R".to_string();
            } else {
                h[OPP_RAISED_OFFSET + street] = "R".to_string();
            }
        }

        if street == infoset.street && i >= 2 {
            let call_amt = (pips[0] - pips[1]).abs();
            let raise_amt = (bh[i] - call_amt) as f32 / (cumul[i - 1] + call_amt) as f32;
            let action_offset = if street == 0 { i - 2 } else { (i - 2) % MAX_ACTIONS_PER_STREET };

            if action_is_check {
                let bet_occurs_after = i < bh.len() - 1 && bh[i + 1] > 0;
                if action_offset == 0 && (!is_player || bet_occurs_after) {
                    h[STREET_ACTIONS_OFFSET + action_offset] = "CK".to_string();
                } else {
                    break;
                }
            } else if action_is_call {
                h[STREET_ACTIONS_OFFSET + action_offset] = "CL".to_string();
            } else if action_is_wrapped_raise {
                h[STREET_ACTIONS_OFFSET + action_offset] = "?P".to_string();
            } else {
                debug_assert!(raise_amt > 0.0);
                h[STREET_ACTIONS_OFFSET + action_offset] = raise_label(raise_amt).to_string();
            }
        }

        pips[i % 2] += bh[i];
    }

    h
}

pub fn bucket_small_join(b: &[String; 15]) -> String {
    let meta = format!("{}.{}.{}", b[0], b[1], b[2]);
    let plyr = format!("{}.{}.{}.{}", b[3], b[4], b[5], b[6]);
    let opp = format!("{}.{}.{}.{}", b[7], b[8], b[9], b[10]);
    let street = format!("{}.{}.{}.{}", b[11], b[12], b[13], b[14]);
    format!("{meta}|{plyr}|{opp}|{street}")
}

/// `[SB/BB, street, EV-bucket(overwritten by caller), 16 betting-action
/// slots with perfect recall across all four streets]`.
///
/// grounded line-for-line in `BucketBetting16`. slot 2 is always left as
/// the default "x" placeholder here -- the EV-quantile wrapper
/// (`bucket_ev5`/`7`/`10`/kmeans) fills it in after the fact, matching the
/// original's `BucketInfoSetMedium/Large/_10_16` pattern.
pub fn bucket_betting16_slots(infoset: &InfoSet) -> [String; 19] {
    let mut h: [String; 19] = std::array::from_fn(|_| "x".to_string());
    h[0] = position_letters(infoset.player_position).to_string();
    h[1] = street_letter(infoset.street).to_string();

    let bh = &infoset.bet_history_fixed;
    debug_assert_eq!(bh.len(), FIXED_WIDTH);

    let cumul = cumulative(bh);
    let mut pips = [0 as Chips; 2];

    for i in 0..bh.len() {
        let is_new_street = i > 2 && (i - 2) % MAX_ACTIONS_PER_STREET == 0;
        if is_new_street {
            pips = [0, 0];
        }

        let street = if i > 2 { (i - 2) / MAX_ACTIONS_PER_STREET } else { 0 };
        if street > infoset.street {
            break;
        }

        let is_player = (street == 0 && (i % 2 == infoset.player_position))
            || (street > 0 && (i % 2 != infoset.player_position));

        let amt_after_action = pips[i % 2] + bh[i];
        let action_is_fold = amt_after_action < pips[1 - i % 2] && bh[i] == 0;
        let action_is_wrapped_raise = amt_after_action < pips[1 - i % 2] && bh[i] > 0;

        if action_is_fold {
            break;
        }

        let action_is_check = amt_after_action == pips[1 - i % 2] && bh[i] == 0;
        let action_is_call = amt_after_action == pips[1 - i % 2] && bh[i] > 0;

        if street <= infoset.street && i >= 2 {
            let call_amt = (pips[0] - pips[1]).abs();
            let raise_amt = (bh[i] - call_amt) as f32 / (cumul[i - 1] + call_amt) as f32;
            let action_offset = i - 2;

            if action_is_check {
                let bet_occurs_after = i < bh.len() - 1 && bh[i + 1] > 0;
                if is_new_street && (!is_player || bet_occurs_after) {
                    h[3 + action_offset] = "CK".to_string();
                }
                if infoset.street > street && action_offset % MAX_ACTIONS_PER_STREET < 2 {
                    h[3 + action_offset] = "CK".to_string();
                }
            } else if action_is_call {
                h[3 + action_offset] = "CL".to_string();
            } else if action_is_wrapped_raise {
                h[3 + action_offset] = "?P".to_string();
            } else {
                h[3 + action_offset] = raise_label(raise_amt).to_string();
            }
        }

        pips[i % 2] += bh[i];
    }

    h
}

pub fn bucket_join19(b: &[String; 19]) -> String {
    let mut out = format!("{}.{}.{}", b[0], b[1], b[2]);
    for i in 0..16 {
        if i % 4 == 0 {
            out.push('|');
        } else {
            out.push('.');
        }
        out.push_str(&b[3 + i]);
    }
    out
}

/// five equity-quartile buckets.
pub fn bucket_ev5(infoset: &InfoSet) -> String {
    if infoset.equity < 0.2 {
        "H0"
    } else if infoset.equity < 0.4 {
        "H1"
    } else if infoset.equity < 0.6 {
        "H2"
    } else if infoset.equity < 0.8 {
        "H3"
    } else {
        "H4"
    }
    .to_string()
}

/// nine real equity buckets, preserved exactly as found: equity `>= 0.9`
/// returns the "x" sentinel (meant to read as "H10") rather than a
/// tenth labeled bucket. left as-is rather than fixed -- a strategy table
/// trained against this quirk depends on the same quirk at play time.
pub fn bucket_ev7(infoset: &InfoSet) -> String {
    if infoset.equity < 0.2 {
        "H2"
    } else if infoset.equity < 0.4 {
        "H4"
    } else if infoset.equity < 0.5 {
        "H5"
    } else if infoset.equity < 0.6 {
        "H6"
    } else if infoset.equity < 0.7 {
        "H7"
    } else if infoset.equity < 0.8 {
        "H8"
    } else if infoset.equity < 0.9 {
        "H9"
    } else {
        "x"
    }
    .to_string()
}

/// ten equity deciles.
pub fn bucket_ev10(infoset: &InfoSet) -> String {
    if infoset.equity < 0.1 {
        "H0"
    } else if infoset.equity < 0.2 {
        "H1"
    } else if infoset.equity < 0.3 {
        "H2"
    } else if infoset.equity < 0.4 {
        "H3"
    } else if infoset.equity < 0.5 {
        "H4"
    } else if infoset.equity < 0.6 {
        "H5"
    } else if infoset.equity < 0.7 {
        "H6"
    } else if infoset.equity < 0.8 {
        "H7"
    } else if infoset.equity < 0.9 {
        "H8"
    } else {
        "H9"
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history;

    fn infoset(equity: f32, street: usize, player_position: usize, history: &[Vec<Chips>]) -> InfoSet {
        InfoSet {
            equity,
            bet_history_fixed: crate::history::to_fixed(history),
            player_position,
            street,
            strength_vector: None,
        }
    }

    #[test]
    fn preflop_open_fold_small_bucket_reads_sb_on_big_blind() {
        let history = vec![vec![1, 2]];
        let infoset = infoset(0.3, 0, 1, &history);
        let slots = bucket_small_slots(&infoset);
        assert_eq!(slots[0], "BB");
        assert_eq!(slots[1], "P");
        assert_eq!(slots[2], "H0");
    }

    #[test]
    fn opponent_checking_into_us_is_tagged_ck() {
        // sb completes preflop; postflop the big blind (our opponent, since
        // we are the small blind) acts first and checks to us.
        let history = vec![vec![1, 2, 1], vec![0]];
        let infoset = infoset(0.5, 1, 0, &history);
        let slots = bucket_small_slots(&infoset);
        assert_eq!(slots[11], "CK");
    }

    #[test]
    fn a_pot_sized_raise_on_our_street_is_1p() {
        // preflop: blinds (pot 3), then a raise that adds 5 over a 1-chip
        // call: raise_amt = (5-1)/(3+1) = 1.0, a full pot-sized raise.
        let history = vec![vec![1, 2, 5]];
        let infoset = infoset(0.5, 0, 0, &history);
        let slots = bucket_betting16_slots(&infoset);
        assert_eq!(slots[3], "1P");
    }

    #[test]
    fn join_functions_produce_the_documented_delimiter_shape() {
        let history = vec![vec![1, 2]];
        let infoset = infoset(0.9, 0, 0, &history);
        let small = bucket_small_join(&bucket_small_slots(&infoset));
        assert_eq!(small.matches('|').count(), 3);
        let betting = bucket_join19(&bucket_betting16_slots(&infoset));
        assert_eq!(betting.matches('|').count(), 4);
    }

    #[test]
    fn ev7_preserves_the_sentinel_for_the_top_decile() {
        let history = vec![vec![1, 2]];
        let infoset = infoset(0.95, 0, 0, &history);
        assert_eq!(bucket_ev7(&infoset), "x");
    }
}
