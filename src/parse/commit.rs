use super::malformed;
use crate::error::Result;
use crate::model::CommitRecord;
use crate::util::{from_epoch, parse_epoch};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // <epoch> <date> <time> <tz> <name> <<email>>
    static ref COMMIT_LINE: Regex = Regex::new(
        r"^(?P<epoch>\S+)\s+(?P<date>\d{4}-\d{2}-\d{2})\s+(?P<time>\d{2}:\d{2}:\d{2})\s+(?P<tz>[+-]?\d{4})\s+(?P<name>[^<]*)<(?P<email>[^>]*)>?\s*$"
    )
    .unwrap();
}

/// Parses one line of `git rev-list --pretty=format:"%at %ai %an <%aE>"`.
///
/// A non-numeric epoch decodes to the epoch-zero sentinel instead of failing; only a
/// line that does not have the overall shape is rejected.
pub fn parse_commit_line(line: &str) -> Result<CommitRecord> {
    let caps = COMMIT_LINE
        .captures(line.trim_end())
        .ok_or_else(|| malformed("commit", line))?;

    let author_email = caps["email"].trim().to_string();
    let domain = match author_email.split_once('@') {
        Some((_, domain)) => domain.to_string(),
        None => "?".to_string(),
    };

    Ok(CommitRecord {
        timestamp: parse_epoch(&caps["epoch"]),
        timezone: caps["tz"].to_string(),
        author_name: caps["name"].trim().to_string(),
        author_email,
        domain,
    })
}

/// Parses one `<epoch> <tree>` line of `git rev-list --pretty=format:"%at %T"`.
pub fn parse_revision_line(line: &str) -> Result<(DateTime<Utc>, String)> {
    let mut fields = line.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some(epoch), Some(tree), None) => {
            let secs: i64 = epoch.parse().map_err(|_| malformed("revision", line))?;
            Ok((from_epoch(secs), tree.to_string()))
        }
        _ => Err(malformed("revision", line)),
    }
}
