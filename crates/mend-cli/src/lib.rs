//! Library surface for the `mend` binary: config, catalog loading,
//! replay executor, and report sinks.

pub mod catalog;
pub mod config;
pub mod errors;
pub mod replay;
pub mod sink;

pub use catalog::load_catalog;
pub use config::{Config, TableOverride};
pub use errors::CliError;
pub use replay::{FixtureFile, FixtureRule, ReplayExecutor};
pub use sink::{JsonLinesSink, MultiSink, StdoutSink};
