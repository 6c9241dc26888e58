use super::GitDataCollector;
use crate::error::{Result, StatsError};
use crate::git::CommandRunner;
use crate::model::{
    Author, Calendar, Domain, ExtensionStats, RankedAuthor, Report, Summary, Tag, SCHEMA_VERSION,
};
use crate::util::{percentage, ratio};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeSet;

impl<R: CommandRunner> GitDataCollector<R> {
    /// Author names by rank, best first, capped at `limit` when given.
    pub fn authors(&self, limit: Option<usize>) -> Result<Vec<String>> {
        self.require_refined()?;
        let mut ranked: Vec<(&String, &Author)> = self.stats.authors.iter().collect();
        ranked.sort_by_key(|(_, author)| author.place_by_commits.unwrap_or(usize::MAX));
        Ok(ranked
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|(name, _)| name.clone())
            .collect())
    }

    pub fn ranked_authors(&self, limit: Option<usize>) -> Result<Vec<RankedAuthor>> {
        Ok(self
            .authors(limit)?
            .into_iter()
            .map(|name| RankedAuthor {
                author: self.stats.authors.get(&name),
                name,
            })
            .collect())
    }

    pub fn author_info(&self, name: &str) -> Result<&Author> {
        self.require_refined()?;
        if !self.stats.authors.contains_key(name) {
            return Err(StatsError::NotFound(format!("author \"{name}\"")));
        }
        Ok(self.stats.authors.get_ref(name))
    }

    /// Unknown domains read as zero commits.
    pub fn domain_info(&self, domain: &str) -> &Domain {
        self.stats.domains.get_ref(domain)
    }

    /// Domains by commit count, capped at `max_domains`.
    pub fn domains_by_commits(&self) -> Vec<(String, u64)> {
        let mut domains: Vec<(String, u64)> = self
            .stats
            .domains
            .iter()
            .map(|(name, domain)| (name.clone(), domain.commits))
            .collect();
        domains.sort_by(|a, b| b.1.cmp(&a.1));
        domains.truncate(self.config.max_domains);
        domains
    }

    pub fn tag_info(&self, tag: &str) -> Option<&Tag> {
        if self.stats.tags.contains_key(tag) {
            Some(self.stats.tags.get_ref(tag))
        } else {
            None
        }
    }

    pub fn tags_by_date_desc(&self) -> Vec<(&String, &Tag)> {
        let mut tags: Vec<(&String, &Tag)> = self.stats.tags.iter().collect();
        tags.sort_by(|a, b| (b.1.stamp, b.0).cmp(&(a.1.stamp, a.0)));
        tags
    }

    pub fn extensions_by_files(&self) -> Vec<(&String, &ExtensionStats)> {
        let mut extensions: Vec<(&String, &ExtensionStats)> = self.stats.extensions.iter().collect();
        extensions.sort_by(|a, b| b.1.files.cmp(&a.1.files));
        extensions
    }

    /// Most active author of a `YYYY-MM` month and their commit count.
    pub fn author_of_month(&self, month: &str) -> Option<(&String, u64)> {
        leader(self.stats.author_of_month.get_ref(month).iter())
    }

    pub fn author_of_year(&self, year: i32) -> Option<(&String, u64)> {
        leader(self.stats.author_of_year.get_ref(&year).iter())
    }

    pub fn first_commit_date(&self) -> Option<DateTime<Utc>> {
        self.stats.first_commit_stamp
    }

    pub fn last_commit_date(&self) -> Option<DateTime<Utc>> {
        self.stats.last_commit_stamp
    }

    pub fn active_days(&self) -> &BTreeSet<NaiveDate> {
        &self.stats.active_days
    }

    /// Whole days between the first and last commit, never less than 1.
    pub fn commit_delta_days(&self) -> i64 {
        match (self.stats.first_commit_stamp, self.stats.last_commit_stamp) {
            (Some(first), Some(last)) => (last - first).num_days().max(1),
            _ => 1,
        }
    }

    pub fn active_day_percentage(&self) -> f64 {
        percentage(self.stats.active_days.len() as f64, self.commit_delta_days() as f64)
    }

    pub fn average_commits_per_active_day(&self) -> f64 {
        ratio(self.stats.total_commits as f64, self.stats.active_days.len() as f64)
    }

    pub fn average_commits_per_day(&self) -> f64 {
        ratio(self.stats.total_commits as f64, self.commit_delta_days() as f64)
    }

    pub fn calendar(&self) -> Calendar<'_> {
        let stats = &self.stats;
        Calendar {
            hour_of_day: &stats.hour_of_day,
            hour_of_day_busiest: stats.hour_of_day_busiest,
            day_of_week: &stats.day_of_week,
            hour_of_week: &stats.hour_of_week,
            hour_of_week_busiest: stats.hour_of_week_busiest,
            month_of_year: &stats.month_of_year,
            year_week: &stats.year_week,
            year_week_peak: stats.year_week_peak,
            commits_by_year: &stats.commits_by_year,
            commits_by_month: &stats.commits_by_month,
            commits_by_timezone: &stats.commits_by_timezone,
        }
    }

    pub fn summary(&self) -> Summary {
        let stats = &self.stats;
        Summary {
            project_name: self.project_name.clone(),
            generated_at: self.generated_at,
            first_commit: stats.first_commit_stamp,
            last_commit: stats.last_commit_stamp,
            age_days: self.commit_delta_days(),
            active_days: stats.active_days.len(),
            active_day_percentage: self.active_day_percentage(),
            total_files: stats.total_files,
            total_lines: stats.total_lines,
            total_lines_added: stats.total_lines_added,
            total_lines_removed: stats.total_lines_removed,
            total_commits: stats.total_commits,
            commits_per_active_day: self.average_commits_per_active_day(),
            commits_per_day: self.average_commits_per_day(),
            total_authors: stats.total_authors,
        }
    }

    /// Full read-only snapshot, authors capped at `max_authors`.
    pub fn report(&self) -> Result<Report<'_>> {
        Ok(Report {
            version: SCHEMA_VERSION,
            summary: self.summary(),
            authors: self.ranked_authors(Some(self.config.max_authors))?,
            domains: self.domains_by_commits(),
            tags: self
                .tags_by_date_desc()
                .into_iter()
                .map(|(name, tag)| (name.clone(), tag.clone()))
                .collect(),
            extensions: &self.stats.extensions,
            calendar: self.calendar(),
        })
    }
}

fn leader<'a, I>(counts: I) -> Option<(&'a String, u64)>
where
    I: Iterator<Item = (&'a String, &'a u64)>,
{
    counts
        .map(|(name, commits)| (name, *commits))
        .fold(None, |best, (name, commits)| match best {
            Some((_, top)) if top >= commits => best,
            _ => Some((name, commits)),
        })
}
