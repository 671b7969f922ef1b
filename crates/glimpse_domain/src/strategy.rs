//! Indexing strategy names and observable stats (§4.9).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyName {
    Realtime,
    Lazy,
    Git,
}

impl StrategyName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Realtime => "realtime",
            Self::Lazy => "lazy",
            Self::Git => "git",
        }
    }
}

impl std::str::FromStr for StrategyName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "realtime" => Ok(Self::Realtime),
            "lazy" => Ok(Self::Lazy),
            "git" => Ok(Self::Git),
            other => Err(format!("unknown strategy `{other}`, expected realtime|lazy|git")),
        }
    }
}

/// `{initialize, start, stop, isActive, onFileEvent, flush, getStats}`
/// state machine: `Created -> Initialized -> Active -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyState {
    Created,
    Initialized,
    Active,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyStats {
    pub name: StrategyName,
    pub is_active: bool,
    pub pending_files: usize,
    pub processed_files: usize,
    pub last_activity: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn strategy_name_round_trips_through_str() {
        for name in [StrategyName::Realtime, StrategyName::Lazy, StrategyName::Git] {
            let parsed: StrategyName = name.as_str().parse().unwrap();
            assert_eq!(parsed, name);
        }
    }

    #[test]
    fn unknown_strategy_name_is_rejected() {
        assert!("bogus".parse::<StrategyName>().is_err());
    }
}
