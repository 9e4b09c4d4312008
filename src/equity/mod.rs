//! The hand-evaluation and equity-estimation primitives are, per spec,
//! external collaborators that the core only consumes through two opaque
//! contracts (`HandEvaluator::score`, `Equity::evaluate`). This module
//! provides one concrete, reasonably efficient implementation of each so
//! the rest of the crate has something real to call; the core modules
//! (engine, filter, player) depend only on the traits.

pub mod evaluator;
pub mod oracle;
pub mod preflop;

pub use evaluator::{HandEvaluator, StandardEvaluator};
pub use oracle::{Equity, EquityQuery, MonteCarloEquity};
