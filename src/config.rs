use crate::error::{Result, StatsError};
use serde::{Deserialize, Serialize};

/// Tunables handed to the collector and parsers at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub max_domains: usize,
    pub max_ext_length: usize,
    pub max_authors: usize,
    pub style: String,
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_domains: 10,
            max_ext_length: 10,
            max_authors: 20,
            style: "gitstats.css".to_string(),
            progress: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Apply a single `key=value` override, as given on the command line.
    pub fn apply_override(&mut self, pair: &str) -> Result<()> {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| StatsError::Config(format!("Expected key=value, got '{pair}'")))?;
        self.set(key.trim(), value.trim())
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "max_domains" => self.max_domains = parse_count(key, value)?,
            "max_ext_length" => self.max_ext_length = parse_count(key, value)?,
            "max_authors" => self.max_authors = parse_count(key, value)?,
            "style" => self.style = value.to_string(),
            "progress" => {
                self.progress = value
                    .parse()
                    .map_err(|_| StatsError::Config(format!("'{value}' is not a boolean for {key}")))?
            }
            _ => return Err(StatsError::Config(format!("No such key '{key}' in config"))),
        }
        Ok(())
    }
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    value
        .parse()
        .map_err(|_| StatsError::Config(format!("'{value}' is not a valid integer for {key}")))
}
