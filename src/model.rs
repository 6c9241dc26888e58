use crate::util::{epoch_zero, DefaultMap};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

pub const SCHEMA_VERSION: u32 = 1;

/// One line of the commit stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub timestamp: DateTime<Utc>,
    pub timezone: String,
    pub author_name: String,
    pub author_email: String,
    pub domain: String,
}

/// One `<hash> refs/tags/<name>` line of `git show-ref --tags`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    pub name: String,
    pub hash: String,
}

/// One `<mode> <type> <sha1> <path>` entry of a recursive tree listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: String,
    pub kind: String,
    pub sha1: String,
    pub path: String,
    pub extension: String,
}

/// One `<count> <author>` line of `git shortlog -s`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortlogEntry {
    pub commits: u64,
    pub author: String,
}

/// Snapshot emitted by the shortstat stream for one commit header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub timestamp: DateTime<Utc>,
    pub author: String,
    pub change: Change,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Change {
    pub files: u64,
    pub inserted: u64,
    pub deleted: u64,
    pub total_lines: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Author {
    pub commits: u64,
    pub lines_added: u64,
    pub lines_removed: u64,
    pub first_commit_stamp: Option<DateTime<Utc>>,
    pub last_commit_stamp: Option<DateTime<Utc>>,
    pub last_active_day: Option<NaiveDate>,
    pub active_days: u64,
    pub place_by_commits: Option<usize>,
    pub commits_frac: f64,
    pub date_first: Option<DateTime<Utc>>,
    pub date_last: Option<DateTime<Utc>>,
    #[serde(serialize_with = "serialize_seconds")]
    pub time_delta: Duration,
}

impl Default for Author {
    fn default() -> Self {
        Self {
            commits: 0,
            lines_added: 0,
            lines_removed: 0,
            first_commit_stamp: None,
            last_commit_stamp: None,
            last_active_day: None,
            active_days: 0,
            place_by_commits: None,
            commits_frac: 0.0,
            date_first: None,
            date_last: None,
            time_delta: Duration::zero(),
        }
    }
}

impl Author {
    /// Widens the first/last stamps to cover `stamp`.
    pub fn record_stamp(&mut self, stamp: DateTime<Utc>) {
        self.first_commit_stamp = Some(self.first_commit_stamp.map_or(stamp, |s| s.min(stamp)));
        self.last_commit_stamp = Some(self.last_commit_stamp.map_or(stamp, |s| s.max(stamp)));
    }

    /// Counts `day` as a new active day unless it equals the previous one.
    ///
    /// Only the immediately preceding day is compared, so a day that comes back after a
    /// different day is counted again: days `A, B, A` give three active days. The
    /// project-wide active-day list is a set and never double counts.
    pub fn record_active_day(&mut self, day: NaiveDate) {
        if self.last_active_day != Some(day) {
            self.last_active_day = Some(day);
            self.active_days += 1;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Domain {
    pub commits: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub stamp: DateTime<Utc>,
    pub hash: String,
    pub commits: u64,
    pub authors: BTreeMap<String, u64>,
}

impl Default for Tag {
    fn default() -> Self {
        Self::new(String::new(), epoch_zero())
    }
}

impl Tag {
    pub fn new(hash: String, stamp: DateTime<Utc>) -> Self {
        Self {
            stamp,
            hash,
            commits: 0,
            authors: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtensionStats {
    pub files: u64,
    pub lines: u64,
}

/// Headline numbers for a renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub project_name: String,
    pub generated_at: DateTime<Utc>,
    pub first_commit: Option<DateTime<Utc>>,
    pub last_commit: Option<DateTime<Utc>>,
    pub age_days: i64,
    pub active_days: usize,
    pub active_day_percentage: f64,
    pub total_files: u64,
    pub total_lines: i64,
    pub total_lines_added: u64,
    pub total_lines_removed: u64,
    pub total_commits: u64,
    pub commits_per_active_day: f64,
    pub commits_per_day: f64,
    pub total_authors: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedAuthor {
    pub name: String,
    #[serde(flatten)]
    pub author: Author,
}

#[derive(Debug, Clone, Serialize)]
pub struct Calendar<'a> {
    pub hour_of_day: &'a DefaultMap<u32, u64>,
    pub hour_of_day_busiest: u64,
    pub day_of_week: &'a DefaultMap<u32, u64>,
    pub hour_of_week: &'a DefaultMap<u32, DefaultMap<u32, u64>>,
    pub hour_of_week_busiest: u64,
    pub month_of_year: &'a DefaultMap<u32, u64>,
    pub year_week: &'a DefaultMap<String, u64>,
    pub year_week_peak: u64,
    pub commits_by_year: &'a DefaultMap<i32, u64>,
    pub commits_by_month: &'a DefaultMap<String, u64>,
    pub commits_by_timezone: &'a DefaultMap<String, u64>,
}

/// Everything a renderer needs, in one serializable document.
#[derive(Debug, Clone, Serialize)]
pub struct Report<'a> {
    pub version: u32,
    pub summary: Summary,
    pub authors: Vec<RankedAuthor>,
    pub domains: Vec<(String, u64)>,
    pub tags: Vec<(String, Tag)>,
    pub extensions: &'a DefaultMap<String, ExtensionStats>,
    pub calendar: Calendar<'a>,
}

fn serialize_seconds<S: Serializer>(delta: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(delta.num_seconds())
}
