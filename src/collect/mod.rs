//! The aggregation engine.
//!
//! [`GitDataCollector`] drives the external queries, feeds each parsed line to
//! [`GitDataCollector::ingest`] and owns the resulting [`Aggregates`]. Collection is a
//! two-phase affair: facts are ingested first, then [`GitDataCollector::refine`]
//! derives rankings. Accessors that depend on rankings refuse to answer before that.

pub mod aggregate;
pub mod fetch;
pub mod query;
pub mod refine;

pub use aggregate::Aggregates;

use crate::cache::LookupCache;
use crate::config::Config;
use crate::error::{Result, StatsError};
use crate::git::{CommandRunner, Stage};
use crate::model::{ChangeRecord, CommitRecord, ShortlogEntry, TagRef, TreeEntry};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    Ingested,
    Refined,
}

/// A parsed unit of input for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fact {
    Commit(CommitRecord),
    Tag { tag: TagRef, stamp: DateTime<Utc> },
    TagAuthors { tag: String, entry: ShortlogEntry },
    Revision { stamp: DateTime<Utc>, tree: String },
    File(TreeEntry),
    Change(ChangeRecord),
}

pub struct GitDataCollector<R: CommandRunner> {
    config: Config,
    runner: R,
    cache: LookupCache,
    stats: Aggregates,
    phase: Phase,
    project_name: String,
    generated_at: DateTime<Utc>,
}

impl<R: CommandRunner> GitDataCollector<R> {
    pub fn new(config: Config, runner: R, cache: LookupCache) -> Self {
        Self {
            config,
            runner,
            cache,
            stats: Aggregates::new(),
            phase: Phase::Empty,
            project_name: String::new(),
            generated_at: Utc::now(),
        }
    }

    pub fn with_project_name<S: Into<String>>(mut self, name: S) -> Self {
        self.project_name = name.into();
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn cache(&self) -> &LookupCache {
        &self.cache
    }

    pub fn into_cache(self) -> LookupCache {
        self.cache
    }

    /// Read access to every aggregate table.
    pub fn stats(&self) -> &Aggregates {
        &self.stats
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Applies one fact to the tables. Ingesting after refinement makes the
    /// rankings stale, so the collector drops back to [`Phase::Ingested`].
    pub fn ingest(&mut self, fact: Fact) {
        match fact {
            Fact::Commit(record) => self.stats.record_commit(&record),
            Fact::Tag { tag, stamp } => self.stats.record_tag(&tag, stamp),
            Fact::TagAuthors { tag, entry } => {
                if !self.stats.record_tag_authors(&tag, &entry) {
                    warn!("Shortlog entry for unknown tag \"{tag}\"");
                }
            }
            Fact::Revision { stamp, tree } => match self.files_in_tree(&tree) {
                Ok(files) => self.stats.record_revision(stamp, files),
                Err(e) => warn!("Could not count files in tree {tree}: {e}"),
            },
            Fact::File(entry) => {
                let lines = if entry.kind == "blob" {
                    match self.lines_in_blob(&entry.sha1) {
                        Ok(lines) => Some(lines),
                        Err(e) => {
                            warn!("Could not count lines for file \"{}\": {e}", entry.path);
                            None
                        }
                    }
                } else {
                    None
                };
                self.stats.record_file(&entry, lines);
            }
            Fact::Change(record) => self.stats.record_change(record),
        }
        self.phase = Phase::Ingested;
    }

    /// Second pass: ranks and fractions. Valid once data has been ingested;
    /// repeating it is harmless.
    pub fn refine(&mut self) -> Result<()> {
        if self.phase == Phase::Empty {
            return Err(StatsError::InvalidState(
                "refinement requires ingested data".to_string(),
            ));
        }
        info!(authors = self.stats.authors.len(), "Refining data");
        refine::refine(&mut self.stats);
        self.phase = Phase::Refined;
        Ok(())
    }

    pub(crate) fn require_refined(&self) -> Result<()> {
        if self.phase != Phase::Refined {
            return Err(StatsError::InvalidState(format!(
                "rankings are not available in phase {:?}",
                self.phase
            )));
        }
        Ok(())
    }

    fn files_in_tree(&mut self, tree: &str) -> Result<u64> {
        let runner = &self.runner;
        self.cache.files_in_tree(tree, || {
            let output = runner.run(&[
                Stage::git(["ls-tree", "-r", "--name-only", tree]),
                Stage::line_count(),
            ])?;
            parse_count(&output)
        })
    }

    fn lines_in_blob(&mut self, sha1: &str) -> Result<u64> {
        let runner = &self.runner;
        self.cache.lines_in_blob(sha1, || {
            let output = runner.run(&[Stage::git(["cat-file", "blob", sha1]), Stage::line_count()])?;
            parse_count(&output)
        })
    }
}

/// First integer of `wc -l` style output.
pub(crate) fn parse_count(output: &str) -> Result<u64> {
    output
        .split_whitespace()
        .next()
        .and_then(|count| count.parse().ok())
        .ok_or_else(|| StatsError::Parse(format!("expected a count, got \"{output}\"")))
}
