//! Line parsers for the text emitted by git.
//!
//! Every parser takes one line (or one whole command output) and returns either a
//! structured record or a `StatsError::Parse` describing why the line was rejected.
//! Callers log the rejection and carry on with the next line.

pub mod commit;
pub mod shortstat;
pub mod tag;
pub mod tree;

pub use commit::{parse_commit_line, parse_revision_line};
pub use shortstat::{parse_shortstat_line, ChangeWindow, ShortstatLine};
pub use tag::{parse_shortlog_line, parse_tag_ref, parse_tag_stamp};
pub use tree::{extension_of, parse_tree_line};

use crate::error::StatsError;

pub(crate) fn malformed(kind: &str, line: &str) -> StatsError {
    StatsError::Parse(format!("unexpected {kind} line \"{line}\""))
}
