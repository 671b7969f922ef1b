pub mod cli;
pub mod signals;

pub use cli::{Args, Commands, StrategyArg};
