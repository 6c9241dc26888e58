use crate::cache::LookupCache;
use crate::collect::GitDataCollector;
use crate::config::Config;
use crate::git::{GitRepo, ProcessRunner};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gitstats")]
#[command(about = "Git history statistics: activity, authors, files and tags")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, help = "Path to git repository")]
    pub repo: Option<PathBuf>,

    #[arg(long, help = "Path to the lookup cache file")]
    pub cache: Option<PathBuf>,

    #[arg(short = 'c', value_name = "KEY=VALUE", help = "Override a configuration value")]
    pub config: Vec<String>,

    #[arg(long, help = "Hide progress bars", default_value_t = false)]
    pub no_progress: bool,

    #[arg(short, long, help = "Log external commands and phase changes")]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Headline numbers, tags and extensions
    Summary,
    /// Authors ranked by commit count
    Authors {
        #[arg(long, help = "Maximum number of authors to list (defaults to max_authors)")]
        limit: Option<usize>,
    },
    /// Every aggregate as JSON
    Export {
        #[arg(long, help = "Write to this file instead of stdout")]
        output: Option<PathBuf>,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        init_tracing(self.common.verbose);
        let started = Instant::now();

        let mut config = Config::new().with_progress(!self.common.no_progress);
        for pair in &self.common.config {
            config
                .apply_override(pair)
                .with_context(|| format!("Invalid configuration override '{pair}'"))?;
        }

        let repo = GitRepo::open(self.common.repo.as_ref()).context("Failed to open git repository")?;
        let cache_path = self
            .common
            .cache
            .clone()
            .unwrap_or_else(|| LookupCache::default_path(repo.git_dir()));
        let cache = LookupCache::load(&cache_path);

        let mut data = GitDataCollector::new(config, ProcessRunner::new(repo.path()), cache)
            .with_project_name(repo.project_name());
        data.collect();
        data.cache()
            .save(&cache_path)
            .context("Failed to save lookup cache")?;
        data.refine().context("Failed to refine collected data")?;

        match self.command {
            Commands::Summary => crate::report::output_summary(&data)?,
            Commands::Authors { limit } => {
                let limit = limit.unwrap_or(data.config().max_authors);
                crate::report::output_authors(&data, limit)?
            }
            Commands::Export { output } => crate::report::output_json(&data, output.as_deref())?,
        }

        info!(
            "Execution time {}, {} in external commands",
            humantime::format_duration(std::time::Duration::from_millis(
                started.elapsed().as_millis() as u64
            )),
            humantime::format_duration(std::time::Duration::from_millis(
                data.runner().external_time().as_millis() as u64
            ))
        );
        Ok(())
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
