use super::malformed;
use crate::error::Result;
use crate::model::{ShortlogEntry, TagRef};
use crate::util::{epoch_zero, parse_epoch};
use chrono::{DateTime, Utc};

/// Parses one `<hash> refs/tags/<name>` line of `git show-ref --tags`.
pub fn parse_tag_ref(line: &str) -> Result<TagRef> {
    let mut fields = line.split_whitespace();
    let (hash, reference) = match (fields.next(), fields.next()) {
        (Some(hash), Some(reference)) => (hash, reference),
        _ => return Err(malformed("tag", line)),
    };
    let name = reference
        .strip_prefix("refs/tags/")
        .filter(|name| !name.is_empty())
        .ok_or_else(|| malformed("tag", line))?;

    Ok(TagRef {
        name: name.to_string(),
        hash: hash.to_string(),
    })
}

/// Reads the stamp out of `git log <hash> --pretty=format:"%at %an" -n 1` output.
pub fn parse_tag_stamp(output: &str) -> DateTime<Utc> {
    output
        .split_whitespace()
        .next()
        .map(parse_epoch)
        .unwrap_or_else(epoch_zero)
}

/// Parses one `<count>\t<author>` line of `git shortlog -s`.
pub fn parse_shortlog_line(line: &str) -> Result<ShortlogEntry> {
    let (count, author) = line
        .trim()
        .split_once(char::is_whitespace)
        .ok_or_else(|| malformed("shortlog", line))?;
    let commits = count.parse().map_err(|_| malformed("shortlog", line))?;

    Ok(ShortlogEntry {
        commits,
        author: author.trim().to_string(),
    })
}
