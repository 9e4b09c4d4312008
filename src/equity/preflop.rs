use crate::equity::{Equity, EquityQuery};
use crate::cards::Card;
use std::io::{self, BufRead, Write};

/// precomputed preflop equity (hero hole cards vs a uniformly random
/// villain hand, no board) for every ordered pair of distinct card codes.
/// the particle filter's `compute_ev_random` consults this instead of
/// running Monte Carlo on every particle on every update -- the same
/// tradeoff the original bot made with its own preflop cache. the table
/// has `52 * 51 = 2652` meaningful entries; implementers must generate or
/// ship it (see `generate`), it is never computed lazily at match time.
pub struct PreflopTable {
    values: Vec<f32>,
}

const DIM: usize = 52;

impl PreflopTable {
    fn index(a: u8, b: u8) -> usize {
        a as usize * DIM + b as usize
    }

    pub fn get(&self, hero: [Card; 2]) -> f32 {
        let a: u8 = hero[0].into();
        let b: u8 = hero[1].into();
        self.values[Self::index(a, b)]
    }

    /// runs `iters` Monte Carlo trials for every ordered pair of distinct
    /// card codes. expensive (2652 * iters evaluations) -- meant to be run
    /// once offline by the `cluster` binary and cached to disk, not during
    /// training or play.
    pub fn generate(equity: &impl Equity, iters: usize) -> Self {
        let mut values = vec![0.0f32; DIM * DIM];
        for a in 0u8..DIM as u8 {
            for b in 0u8..DIM as u8 {
                if a == b {
                    continue;
                }
                let hero = [Card::from(a), Card::from(b)];
                let value = equity.evaluate(EquityQuery::VsRandom { hero }, &[], &[], iters);
                values[Self::index(a, b)] = value;
            }
        }
        Self { values }
    }

    pub fn save(&self, writer: &mut impl Write) -> io::Result<()> {
        for a in 0u8..DIM as u8 {
            for b in 0u8..DIM as u8 {
                if a == b {
                    continue;
                }
                writeln!(writer, "{a} {b} {}", self.values[Self::index(a, b)])?;
            }
        }
        Ok(())
    }

    pub fn load(reader: impl BufRead) -> io::Result<Self> {
        let mut values = vec![0.0f32; DIM * DIM];
        for line in reader.lines() {
            let line = line?;
            let mut parts = line.split_whitespace();
            let a: u8 = parts
                .next()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing card a"))?;
            let b: u8 = parts
                .next()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing card b"))?;
            let value: f32 = parts
                .next()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing equity"))?;
            values[Self::index(a, b)] = value;
        }
        Ok(Self { values })
    }
}
