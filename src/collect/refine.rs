use super::aggregate::Aggregates;
use crate::model::Author;
use crate::util::{percentage, DefaultMap};
use chrono::Duration;

/// Author names ordered by commit count, most commits first. Ties keep the map's
/// iteration order (the sort is stable).
pub fn authors_by_commits(authors: &DefaultMap<String, Author>) -> Vec<String> {
    let mut ranked: Vec<(&String, u64)> = authors
        .iter()
        .map(|(name, author)| (name, author.commits))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.into_iter().map(|(name, _)| name.clone()).collect()
}

/// Derives ranks, commit fractions and first/last dates from finished counters.
/// Reads only final aggregates, so running it again yields the same values.
pub fn refine(stats: &mut Aggregates) {
    for (place, name) in authors_by_commits(&stats.authors).iter().enumerate() {
        if let Some(author) = stats.authors.get_mut(name) {
            author.place_by_commits = Some(place + 1);
        }
    }

    let total_commits = stats.total_commits;
    for (_, author) in stats.authors.iter_mut() {
        if total_commits > 0 {
            author.commits_frac = percentage(author.commits as f64, total_commits as f64);
        }
        author.date_first = author.first_commit_stamp;
        author.date_last = author.last_commit_stamp;
        author.time_delta = match (author.first_commit_stamp, author.last_commit_stamp) {
            (Some(first), Some(last)) => last - first,
            _ => Duration::zero(),
        };
    }
}
