use crate::model::{
    Author, Change, ChangeRecord, CommitRecord, Domain, ExtensionStats, ShortlogEntry, Tag, TagRef,
    TreeEntry,
};
use crate::util::{day_of_week, hour_of_day, month_key, week_key, DefaultMap};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::collections::BTreeSet;

/// Every running table the collector maintains.
///
/// Fields are public for read access by renderers; all mutation goes through the
/// `record_*` methods so each fact touches a fixed set of tables together.
#[derive(Debug, Clone, Default)]
pub struct Aggregates {
    pub authors: DefaultMap<String, Author>,
    pub domains: DefaultMap<String, Domain>,
    pub tags: DefaultMap<String, Tag>,
    pub extensions: DefaultMap<String, ExtensionStats>,
    pub changes_by_date: DefaultMap<i64, Change>,
    pub files_by_stamp: DefaultMap<i64, u64>,

    pub hour_of_day: DefaultMap<u32, u64>,
    pub hour_of_day_busiest: u64,
    pub day_of_week: DefaultMap<u32, u64>,
    pub hour_of_week: DefaultMap<u32, DefaultMap<u32, u64>>,
    pub hour_of_week_busiest: u64,
    pub month_of_year: DefaultMap<u32, u64>,
    pub year_week: DefaultMap<String, u64>,
    pub year_week_peak: u64,
    pub commits_by_year: DefaultMap<i32, u64>,
    pub commits_by_month: DefaultMap<String, u64>,
    pub author_of_year: DefaultMap<i32, DefaultMap<String, u64>>,
    pub author_of_month: DefaultMap<String, DefaultMap<String, u64>>,
    pub commits_by_timezone: DefaultMap<String, u64>,

    pub active_days: BTreeSet<NaiveDate>,
    pub last_active_day: Option<NaiveDate>,

    pub total_commits: u64,
    pub total_authors: u64,
    pub total_files: u64,
    pub total_lines: i64,
    pub total_lines_added: u64,
    pub total_lines_removed: u64,
    pub first_commit_stamp: Option<DateTime<Utc>>,
    pub last_commit_stamp: Option<DateTime<Utc>>,
}

impl Aggregates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_commit(&mut self, record: &CommitRecord) {
        let stamp = record.timestamp;
        self.first_commit_stamp = Some(self.first_commit_stamp.map_or(stamp, |s| s.min(stamp)));
        self.last_commit_stamp = Some(self.last_commit_stamp.map_or(stamp, |s| s.max(stamp)));
        self.total_commits += 1;

        let hour = hour_of_day(&stamp);
        let hits = self.hour_of_day.increment(hour);
        if hits > self.hour_of_day_busiest {
            self.hour_of_day_busiest = hits;
        }

        let day = day_of_week(&stamp);
        self.day_of_week.increment(day);

        let hits = self.hour_of_week.entry_mut(day).increment(hour);
        if hits > self.hour_of_week_busiest {
            self.hour_of_week_busiest = hits;
        }

        self.month_of_year.increment(stamp.month());

        let hits = self.year_week.increment(week_key(&stamp));
        if hits > self.year_week_peak {
            self.year_week_peak = hits;
        }

        self.domains.entry_mut(record.domain.clone()).commits += 1;

        let date = stamp.date_naive();
        let author = self.authors.entry_mut(record.author_name.clone());
        author.commits += 1;
        author.record_stamp(stamp);
        author.record_active_day(date);

        let month = month_key(&stamp);
        self.author_of_month
            .entry_mut(month.clone())
            .increment(record.author_name.clone());
        self.commits_by_month.increment(month);

        let year = stamp.year();
        self.author_of_year
            .entry_mut(year)
            .increment(record.author_name.clone());
        self.commits_by_year.increment(year);

        if self.last_active_day != Some(date) {
            self.last_active_day = Some(date);
            self.active_days.insert(date);
        }

        self.commits_by_timezone.increment(record.timezone.clone());
    }

    pub fn record_tag(&mut self, tag: &TagRef, stamp: DateTime<Utc>) {
        self.tags
            .insert(tag.name.clone(), Tag::new(tag.hash.clone(), stamp));
    }

    /// Adds one shortlog line to a known tag. Returns false for unknown tags.
    pub fn record_tag_authors(&mut self, tag: &str, entry: &ShortlogEntry) -> bool {
        match self.tags.get_mut(tag) {
            Some(tag) => {
                tag.commits += entry.commits;
                tag.authors.insert(entry.author.clone(), entry.commits);
                true
            }
            None => false,
        }
    }

    pub fn record_revision(&mut self, stamp: DateTime<Utc>, files: u64) {
        self.files_by_stamp.insert(stamp.timestamp(), files);
    }

    /// Counts one file of the current tree. `lines` is `None` when the line
    /// count could not be obtained; the file still counts.
    pub fn record_file(&mut self, entry: &TreeEntry, lines: Option<u64>) {
        self.total_files += 1;
        let stats = self.extensions.entry_mut(entry.extension.to_lowercase());
        stats.files += 1;
        if let Some(lines) = lines {
            stats.lines += lines;
        }
    }

    pub fn record_change(&mut self, record: ChangeRecord) {
        let author = self.authors.entry_mut(record.author);
        author.lines_added += record.change.inserted;
        author.lines_removed += record.change.deleted;

        self.total_lines_added += record.change.inserted;
        self.total_lines_removed += record.change.deleted;
        self.total_lines = record.change.total_lines;
        self.changes_by_date
            .insert(record.timestamp.timestamp(), record.change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_commit_line;

    fn commit(line: &str) -> CommitRecord {
        parse_commit_line(line).unwrap()
    }

    #[test]
    fn busiest_trackers_follow_the_running_maximum() {
        let mut stats = Aggregates::new();
        // Tuesday 2023-11-14, 22h and 23h UTC
        stats.record_commit(&commit("1700000000 2023-11-14 22:13:20 +0000 A <a@x.org>"));
        stats.record_commit(&commit("1700000100 2023-11-14 22:15:00 +0000 A <a@x.org>"));
        stats.record_commit(&commit("1700003600 2023-11-14 23:13:20 +0000 B <b@y.org>"));

        assert_eq!(stats.hour_of_day.get(&22), 2);
        assert_eq!(stats.hour_of_day.get(&23), 1);
        assert_eq!(stats.hour_of_day_busiest, 2);
        assert_eq!(stats.hour_of_week.get_ref(&1).get(&22), 2);
        assert_eq!(stats.hour_of_week_busiest, 2);
        assert_eq!(stats.year_week_peak, 3);
        assert_eq!(stats.day_of_week.get(&1), 3);
        assert_eq!(stats.month_of_year.get(&11), 3);
        assert_eq!(stats.commits_by_month.get("2023-11"), 3);
        assert_eq!(stats.author_of_month.get_ref("2023-11").get("A"), 2);
        assert_eq!(stats.author_of_year.get_ref(&2023).get("B"), 1);
        assert_eq!(stats.domains.get_ref("x.org").commits, 2);
        assert_eq!(stats.commits_by_timezone.get("+0000"), 3);
    }

    #[test]
    fn active_days_compare_against_the_previous_day_only() {
        let mut stats = Aggregates::new();
        let day_one = "1700000000 2023-11-14 22:13:20 +0000 A <a@x.org>";
        let day_two = "1700090000 2023-11-15 23:13:20 +0000 A <a@x.org>";
        stats.record_commit(&commit(day_one));
        stats.record_commit(&commit(day_one));
        stats.record_commit(&commit(day_two));
        stats.record_commit(&commit(day_one));

        assert_eq!(stats.authors.get_ref("A").active_days, 3);
        assert_eq!(stats.active_days.len(), 2);
    }

    #[test]
    fn failed_line_count_still_counts_the_file() {
        let mut stats = Aggregates::new();
        let entry = TreeEntry {
            mode: "100644".into(),
            kind: "blob".into(),
            sha1: "abc".into(),
            path: "README.MD".into(),
            extension: "MD".into(),
        };
        stats.record_file(&entry, Some(10));
        stats.record_file(&entry, None);

        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.extensions.get_ref("md"), &ExtensionStats { files: 2, lines: 10 });
    }

    #[test]
    fn shortlog_for_unknown_tag_is_ignored() {
        let mut stats = Aggregates::new();
        let entry = ShortlogEntry { commits: 3, author: "A".into() };
        assert!(!stats.record_tag_authors("v9", &entry));
        assert!(stats.tags.is_empty());
    }
}
