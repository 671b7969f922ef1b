use clap::Parser;
use glimpse_domain::StrategyName;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Project directory; defaults to the current directory, and the
    /// project root is detected upward from there.
    #[arg(long, global = true, default_value = ".")]
    pub path: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Parser, Debug)]
pub enum Commands {
    /// Report index health: fingerprint count, strategy, last drift check.
    Status,
    /// Full scan and index of the project from scratch.
    Index,
    /// Incremental reindex of whatever has drifted since the last run.
    Update,
    /// Tear down and fully re-index, ignoring any existing state.
    Rebuild,
    /// Run drift detection and reconciliation immediately.
    Drift,
    /// Switch the active indexing strategy.
    Strategy {
        #[arg(value_enum)]
        name: StrategyArg,
    },
    /// Run as a long-lived process under the given strategy, reindexing on
    /// filesystem events until shutdown.
    Watch {
        #[arg(long, value_enum, default_value = "realtime")]
        strategy: StrategyArg,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum StrategyArg {
    Realtime,
    Lazy,
    Git,
}

impl From<StrategyArg> for StrategyName {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Realtime => StrategyName::Realtime,
            StrategyArg::Lazy => StrategyName::Lazy,
            StrategyArg::Git => StrategyName::Git,
        }
    }
}
