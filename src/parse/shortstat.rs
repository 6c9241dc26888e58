use super::malformed;
use crate::error::Result;
use crate::model::{Change, ChangeRecord};
use crate::util::from_epoch;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SUMMARY: Regex = Regex::new(r"^\s*\d+ files? changed").unwrap();
    static ref FILES: Regex = Regex::new(r"(\d+) file").unwrap();
    static ref INSERTIONS: Regex = Regex::new(r"(\d+) insertion").unwrap();
    static ref DELETIONS: Regex = Regex::new(r"(\d+) delet").unwrap();
}

/// A classified line of `git log --shortstat --pretty=format:"%at %an"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortstatLine {
    Blank,
    Header {
        timestamp: DateTime<Utc>,
        author: String,
    },
    Summary {
        files: u64,
        inserted: u64,
        deleted: u64,
    },
}

pub fn parse_shortstat_line(line: &str) -> Result<ShortstatLine> {
    if line.trim().is_empty() {
        return Ok(ShortstatLine::Blank);
    }

    if SUMMARY.is_match(line) {
        return Ok(ShortstatLine::Summary {
            files: leading_count(&FILES, line),
            inserted: leading_count(&INSERTIONS, line),
            deleted: leading_count(&DELETIONS, line),
        });
    }

    let (epoch, author) = line
        .trim()
        .split_once(' ')
        .ok_or_else(|| malformed("shortstat", line))?;
    let secs: i64 = epoch.parse().map_err(|_| malformed("shortstat", line))?;

    Ok(ShortstatLine::Header {
        timestamp: from_epoch(secs),
        author: author.trim().to_string(),
    })
}

/// The integer immediately before the first match of `keyword`, or 0.
fn leading_count(keyword: &Regex, line: &str) -> u64 {
    keyword
        .captures(line)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0)
}

/// Pairs summary lines with the header that follows them.
///
/// The stream is consumed oldest first, so a commit's summary line arrives just before
/// its header. The window holds the pending counts until the header claims them; a
/// blank line or a claimed header empties the window, so a commit without a summary
/// (merges, empty commits) is reported with zero counts.
#[derive(Debug, Default)]
pub struct ChangeWindow {
    pending: Change,
    total_lines: i64,
}

impl ChangeWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, line: ShortstatLine) -> Option<ChangeRecord> {
        match line {
            ShortstatLine::Blank => {
                self.reset();
                None
            }
            ShortstatLine::Summary {
                files,
                inserted,
                deleted,
            } => {
                self.total_lines += inserted as i64 - deleted as i64;
                self.pending = Change {
                    files,
                    inserted,
                    deleted,
                    total_lines: self.total_lines,
                };
                None
            }
            ShortstatLine::Header { timestamp, author } => {
                let change = Change {
                    total_lines: self.total_lines,
                    ..std::mem::take(&mut self.pending)
                };
                Some(ChangeRecord {
                    timestamp,
                    author,
                    change,
                })
            }
        }
    }

    /// Running total of lines in the repository after everything fed so far.
    pub fn total_lines(&self) -> i64 {
        self.total_lines
    }

    fn reset(&mut self) {
        self.pending = Change::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(lines: &[&str]) -> (Vec<ChangeRecord>, usize) {
        let mut window = ChangeWindow::new();
        let mut records = Vec::new();
        let mut rejected = 0;
        for line in lines {
            match parse_shortstat_line(line) {
                Ok(parsed) => records.extend(window.feed(parsed)),
                Err(_) => rejected += 1,
            }
        }
        (records, rejected)
    }

    #[test]
    fn extracts_counts_from_summary_lines() {
        assert_eq!(
            parse_shortstat_line(" 3 files changed, 10 insertions(+), 2 deletions(-)").unwrap(),
            ShortstatLine::Summary { files: 3, inserted: 10, deleted: 2 }
        );
        assert_eq!(
            parse_shortstat_line(" 1 file changed, 1 insertion(+)").unwrap(),
            ShortstatLine::Summary { files: 1, inserted: 1, deleted: 0 }
        );
        assert_eq!(
            parse_shortstat_line(" 1 file changed, 4 deletions(-)").unwrap(),
            ShortstatLine::Summary { files: 1, inserted: 0, deleted: 4 }
        );
    }

    #[test]
    fn headers_keep_multi_word_authors() {
        match parse_shortstat_line("1700000000 Mary Jane Watson").unwrap() {
            ShortstatLine::Header { timestamp, author } => {
                assert_eq!(timestamp.timestamp(), 1_700_000_000);
                assert_eq!(author, "Mary Jane Watson");
            }
            other => panic!("expected header, got {other:?}"),
        }
    }

    #[test]
    fn header_claims_the_preceding_summary() {
        // oldest first, as produced by reversing `git log` output
        let (records, rejected) = feed_all(&[
            " 2 files changed, 2 insertions(+)",
            "100 Alice",
            "200 Alice",
            "",
            " 1 file changed, 3 insertions(+), 1 deletion(-)",
            "300 Bob",
        ]);
        assert_eq!(rejected, 0);
        assert_eq!(records.len(), 3);
        assert_eq!(
            records[0].change,
            Change { files: 2, inserted: 2, deleted: 0, total_lines: 2 }
        );
        // empty commit: nothing left in the window
        assert_eq!(
            records[1].change,
            Change { files: 0, inserted: 0, deleted: 0, total_lines: 2 }
        );
        assert_eq!(records[2].author, "Bob");
        assert_eq!(
            records[2].change,
            Change { files: 1, inserted: 3, deleted: 1, total_lines: 4 }
        );
    }

    #[test]
    fn malformed_line_between_commits_is_skipped() {
        let (records, rejected) = feed_all(&["100 Alice", "this line is not a summary", "200 Bob"]);
        assert_eq!(rejected, 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].author, "Bob");
        assert_eq!(records[1].change, Change::default());
    }

    #[test]
    fn author_named_changed_is_still_a_header() {
        assert_eq!(
            parse_shortstat_line("1700000000 Bob changed").unwrap(),
            ShortstatLine::Header {
                timestamp: from_epoch(1_700_000_000),
                author: "Bob changed".to_string(),
            }
        );

        let (records, rejected) = feed_all(&[
            " 1 file changed, 4 insertions(+)",
            "100 Bob changed",
            "",
            " 1 file changed, 1 insertion(+)",
            "200 Alice",
        ]);
        assert_eq!(rejected, 0);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].author, "Bob changed");
        assert_eq!(records[0].change.inserted, 4);
        assert_eq!(records[1].author, "Alice");
        assert_eq!(records[1].change.inserted, 1);
    }

    #[test]
    fn non_numeric_header_epoch_is_rejected() {
        assert!(parse_shortstat_line("yesterday Alice").is_err());
        assert!(parse_shortstat_line("lonely").is_err());
    }
}
