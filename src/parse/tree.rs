use super::malformed;
use crate::error::Result;
use crate::model::TreeEntry;

/// Parses one `<mode> <type> <sha1>\t<path>` entry of `git ls-tree -r`.
pub fn parse_tree_line(line: &str, max_ext_length: usize) -> Result<TreeEntry> {
    let (meta, path) = match line.split_once('\t') {
        Some((meta, path)) => (meta, path),
        None => {
            let mut parts = line.splitn(4, char::is_whitespace);
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(mode), Some(kind), Some(sha1), Some(path)) => {
                    return build(mode, kind, sha1, path, line, max_ext_length)
                }
                _ => return Err(malformed("tree", line)),
            }
        }
    };

    let mut fields = meta.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some(mode), Some(kind), Some(sha1)) => build(mode, kind, sha1, path, line, max_ext_length),
        _ => Err(malformed("tree", line)),
    }
}

fn build(
    mode: &str,
    kind: &str,
    sha1: &str,
    path: &str,
    line: &str,
    max_ext_length: usize,
) -> Result<TreeEntry> {
    if path.is_empty() {
        return Err(malformed("tree", line));
    }
    Ok(TreeEntry {
        mode: mode.to_string(),
        kind: kind.to_string(),
        sha1: sha1.to_string(),
        path: path.to_string(),
        extension: extension_of(path, max_ext_length),
    })
}

/// Suffix after the last `.` of the file name.
///
/// Empty when the name has no dot, starts with its only dot, or the suffix is longer
/// than `max_length`. Case is preserved.
pub fn extension_of(path: &str, max_length: usize) -> String {
    let filename = path.rsplit('/').next().unwrap_or(path);
    match filename.rfind('.') {
        None | Some(0) => String::new(),
        Some(pos) => {
            let ext = &filename[pos + 1..];
            if ext.chars().count() > max_length {
                String::new()
            } else {
                ext.to_string()
            }
        }
    }
}
