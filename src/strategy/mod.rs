use crate::{Probability, Utility, REGRET_EPSILON};
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

/// the six abstract action slots every bucket's strategy vector is keyed
/// over: `[FOLD, CALL, CHECK, RAISE½P, RAISE·P, RAISE·2P]`.
pub const NUM_ACTIONS: usize = 6;

/// nonnegative cumulative regret under CFR+ semantics, one vector per
/// bucket key. grounded in `regret_matched_strategy.cpp`'s
/// `RegretMatchedStrategy`, which is really two of these (`regrets_` and,
/// via a second instance, the average-strategy accumulator) sharing the
/// same add/get/save/load shape -- this crate keeps them as two values of
/// one type rather than duplicating the type.
#[derive(Debug, Default, Clone)]
pub struct StrategyTable {
    entries: BTreeMap<String, [Utility; NUM_ACTIONS]>,
}

impl StrategyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_bucket(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// CFR+ update: `R[i] <- max(0, R[i] + r[i])`. creates a zero entry
    /// on demand, matching `RegretMatchedStrategy::AddRegret`.
    pub fn add_regret(&mut self, key: &str, r: &[Utility; NUM_ACTIONS]) {
        let entry = self.entries.entry(key.to_string()).or_insert([0.0; NUM_ACTIONS]);
        for i in 0..NUM_ACTIONS {
            entry[i] = (entry[i] + r[i]).max(0.0);
        }
    }

    /// regret-matching: normalized positive regret, uniform if the total
    /// is at or below `REGRET_EPSILON`. creates a zero entry on demand so
    /// a never-visited bucket still returns a usable distribution.
    pub fn get_strategy(&mut self, key: &str) -> [Probability; NUM_ACTIONS] {
        let entry = self.entries.entry(key.to_string()).or_insert([0.0; NUM_ACTIONS]);
        Self::regret_match(entry)
    }

    /// same as [`Self::get_strategy`] but never mutates -- used by the
    /// online player, which must not silently grow the loaded table.
    pub fn peek_strategy(&self, key: &str) -> [Probability; NUM_ACTIONS] {
        match self.entries.get(key) {
            Some(r) => Self::regret_match(r),
            None => [1.0 / NUM_ACTIONS as Probability; NUM_ACTIONS],
        }
    }

    fn regret_match(regret: &[Utility; NUM_ACTIONS]) -> [Probability; NUM_ACTIONS] {
        let mut rplus = [0.0; NUM_ACTIONS];
        let mut denom = 0.0;
        for i in 0..NUM_ACTIONS {
            rplus[i] = regret[i].max(0.0);
            denom += rplus[i];
        }
        if denom <= REGRET_EPSILON {
            [1.0 / NUM_ACTIONS as Probability; NUM_ACTIONS]
        } else {
            for p in rplus.iter_mut() {
                *p /= denom;
            }
            rplus
        }
    }

    /// merge another table's entries into this one (last writer wins on a
    /// key collision). used to recombine the two per-player average-
    /// strategy tables `do_cfr_iteration_for_player` trains separately
    /// (one traversal root per player) into the single table the online
    /// player looks strategy up in -- since infoset keys already encode
    /// seat (SB/BB), the two tables are disjoint in practice.
    pub fn merge_from(&mut self, other: &StrategyTable) {
        for (key, regrets) in other.entries.iter() {
            self.entries.insert(key.clone(), *regrets);
        }
    }

    /// whitespace-delimited text format: `<key> r0 r1 r2 r3 r4 r5`, one
    /// line per bucket. this is the format the external match protocol
    /// ships/consumes (spec §6), not a binary framing.
    pub fn save(&self, writer: &mut impl Write) -> io::Result<()> {
        for (key, regrets) in self.entries.iter() {
            write!(writer, "{key}")?;
            for r in regrets {
                write!(writer, " {r}")?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    /// tolerant of blank trailing lines; any other malformed line (not
    /// exactly `1 + NUM_ACTIONS` fields) is an environment error per
    /// spec §7 and aborts construction.
    pub fn load(reader: impl BufRead) -> io::Result<Self> {
        let mut entries = BTreeMap::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let key = fields
                .next()
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing bucket key"))?
                .to_string();
            let mut regrets = [0.0 as Utility; NUM_ACTIONS];
            for slot in regrets.iter_mut() {
                *slot = fields
                    .next()
                    .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "short regret row"))?
                    .parse()
                    .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "non-numeric regret"))?;
            }
            if fields.next().is_some() {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "extra fields in regret row"));
            }
            entries.insert(key, regrets);
        }
        Ok(Self { entries })
    }
}

/// zero the probabilities of illegal actions; if all mass is eliminated,
/// uniform over the legal ones; else renormalize. grounded in
/// `cfr.cpp::ApplyMaskAndUniform`.
pub fn apply_mask_and_uniform(
    p: &[Probability; NUM_ACTIONS],
    mask: &[bool; NUM_ACTIONS],
) -> [Probability; NUM_ACTIONS] {
    let mut out = [0.0; NUM_ACTIONS];
    let mut denom = 0.0;
    let mut legal = 0;
    for i in 0..NUM_ACTIONS {
        if mask[i] {
            out[i] = p[i];
            denom += p[i];
            legal += 1;
        }
    }
    assert!(legal > 0, "apply_mask_and_uniform needs at least one legal action");
    if denom <= REGRET_EPSILON {
        for i in 0..NUM_ACTIONS {
            out[i] = if mask[i] { 1.0 / legal as Probability } else { 0.0 };
        }
    } else {
        for p in out.iter_mut() {
            *p /= denom;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_key_is_uniform() {
        let mut table = StrategyTable::new();
        let strategy = table.get_strategy("fresh");
        for p in strategy {
            assert!((p - 1.0 / NUM_ACTIONS as Probability).abs() < 1e-6);
        }
        assert!((strategy.iter().sum::<Probability>() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn single_positive_regret_is_degenerate() {
        let mut table = StrategyTable::new();
        table.add_regret("k", &[0.0, 5.0, 0.0, 0.0, 0.0, 0.0]);
        let strategy = table.get_strategy("k");
        assert_eq!(strategy[1], 1.0);
        for (i, &p) in strategy.iter().enumerate() {
            if i != 1 {
                assert_eq!(p, 0.0);
            }
        }
    }

    #[test]
    fn cfr_plus_clips_regret_at_zero() {
        let mut table = StrategyTable::new();
        table.add_regret("k", &[-10.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        table.add_regret("k", &[-10.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        // first update clips action 0's regret to 0, not -10; second update
        // starts from 0 again, not -20.
        let strategy = table.get_strategy("k");
        assert_eq!(strategy[0], 0.0);
    }

    #[test]
    fn mask_zeroes_illegal_actions_and_renormalizes() {
        let p = [0.5, 0.5, 0.0, 0.0, 0.0, 0.0];
        let mask = [true, false, true, false, false, false];
        let out = apply_mask_and_uniform(&p, &mask);
        assert_eq!(out[1], 0.0);
        assert!((out[0] - 1.0).abs() < 1e-6);
        assert_eq!(out[2], 0.0);
    }

    #[test]
    fn mask_falls_back_to_uniform_when_all_mass_eliminated() {
        let p = [0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
        let mask = [true, false, true, false, false, false];
        let out = apply_mask_and_uniform(&p, &mask);
        assert!((out[0] - 0.5).abs() < 1e-6);
        assert!((out[2] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn merge_from_combines_disjoint_keys_and_keeps_the_receiver_on_collision() {
        let mut a = StrategyTable::new();
        a.add_regret("sb|k", &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        a.add_regret("shared", &[9.0, 0.0, 0.0, 0.0, 0.0, 0.0]);

        let mut b = StrategyTable::new();
        b.add_regret("bb|k", &[0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        b.add_regret("shared", &[0.0, 0.0, 0.0, 0.0, 0.0, 9.0]);

        a.merge_from(&b);

        assert!(a.has_bucket("sb|k"));
        assert!(a.has_bucket("bb|k"));
        assert_eq!(a.len(), 3);
        // collision: b's entry for "shared" wins.
        assert_eq!(a.peek_strategy("shared")[5], 1.0);
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut table = StrategyTable::new();
        table.add_regret("a|b.c", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        table.add_regret("x|y.z", &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);

        let mut buf = Vec::new();
        table.save(&mut buf).unwrap();
        let reloaded = StrategyTable::load(io::Cursor::new(buf)).unwrap();

        assert_eq!(reloaded.len(), table.len());
        assert_eq!(reloaded.peek_strategy("a|b.c"), table.peek_strategy("a|b.c"));
    }

    #[test]
    fn load_rejects_malformed_rows() {
        let malformed = "a 1 2 3\n";
        assert!(StrategyTable::load(io::Cursor::new(malformed)).is_err());
    }

    #[test]
    fn load_tolerates_blank_trailing_lines() {
        let text = "a 1 2 3 4 5 6\n\n\n";
        let table = StrategyTable::load(io::Cursor::new(text)).unwrap();
        assert_eq!(table.len(), 1);
    }
}
