pub mod cache;
pub mod cli;
pub mod collect;
pub mod config;
pub mod error;
pub mod git;
pub mod model;
pub mod parse;
pub mod report;
pub mod util;

pub use cache::LookupCache;
pub use collect::{Aggregates, Fact, GitDataCollector, Phase};
pub use config::Config;
pub use error::{Result, StatsError};
