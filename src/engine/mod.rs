pub mod action;
pub mod round;
pub mod street;

pub use action::{Action, LegalActions};
pub use round::{Round, RoundState, Terminal};
pub use street::Street;
