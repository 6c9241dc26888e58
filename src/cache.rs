use crate::error::{Result, StatsError};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Bump to discard caches written by an incompatible build.
pub const CACHE_VERSION: u32 = 1;

const CACHE_DIR: &str = "gitstats";
const CACHE_FILE: &str = "cache.json.gz";

/// Memoized results of expensive per-object queries.
///
/// Keys are content identifiers (tree ids, blob ids), so an entry never goes stale and
/// nothing is evicted. The whole cache is persisted as one gzip-compressed JSON
/// document; a cache that cannot be read is treated as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupCache {
    files_in_tree: BTreeMap<String, u64>,
    lines_in_blob: BTreeMap<String, u64>,
}

#[derive(Serialize)]
struct PersistedRef<'a> {
    version: u32,
    files_in_tree: &'a BTreeMap<String, u64>,
    lines_in_blob: &'a BTreeMap<String, u64>,
}

#[derive(Deserialize)]
struct Persisted {
    version: u32,
    files_in_tree: BTreeMap<String, u64>,
    lines_in_blob: BTreeMap<String, u64>,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache location inside the git directory, so the working tree stays clean.
    pub fn default_path<P: AsRef<Path>>(git_dir: P) -> PathBuf {
        git_dir.as_ref().join(CACHE_DIR).join(CACHE_FILE)
    }

    /// Number of files in the tree `rev`, computing it on a miss.
    pub fn files_in_tree<F>(&mut self, rev: &str, compute: F) -> Result<u64>
    where
        F: FnOnce() -> Result<u64>,
    {
        get_or_compute(&mut self.files_in_tree, rev, compute)
    }

    /// Number of lines in the blob `sha1`, computing it on a miss.
    pub fn lines_in_blob<F>(&mut self, sha1: &str, compute: F) -> Result<u64>
    where
        F: FnOnce() -> Result<u64>,
    {
        get_or_compute(&mut self.lines_in_blob, sha1, compute)
    }

    pub fn cached_files_in_tree(&self, rev: &str) -> Option<u64> {
        self.files_in_tree.get(rev).copied()
    }

    pub fn cached_lines_in_blob(&self, sha1: &str) -> Option<u64> {
        self.lines_in_blob.get(sha1).copied()
    }

    pub fn len(&self) -> usize {
        self.files_in_tree.len() + self.lines_in_blob.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loads the cache at `path`. Never fails: a missing, corrupt or
    /// version-mismatched file yields an empty cache.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(Some(cache)) => {
                info!(entries = cache.len(), "Loaded cache from {}", path.display());
                cache
            }
            Ok(None) => {
                debug!("No cache at {}, starting empty", path.display());
                Self::new()
            }
            Err(e) => {
                warn!("Ignoring unreadable cache {}: {e}", path.display());
                Self::new()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Option<Self>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let persisted: Persisted = serde_json::from_reader(GzDecoder::new(BufReader::new(file)))?;
        if persisted.version != CACHE_VERSION {
            return Err(StatsError::Parse(format!(
                "Cache version mismatch: expected {}, found {}",
                CACHE_VERSION, persisted.version
            )));
        }
        Ok(Some(Self {
            files_in_tree: persisted.files_in_tree,
            lines_in_blob: persisted.lines_in_blob,
        }))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        serde_json::to_writer(
            &mut encoder,
            &PersistedRef {
                version: CACHE_VERSION,
                files_in_tree: &self.files_in_tree,
                lines_in_blob: &self.lines_in_blob,
            },
        )?;
        encoder.finish()?.flush()?;

        info!(entries = self.len(), "Saved cache to {}", path.display());
        Ok(())
    }
}

fn get_or_compute<F>(map: &mut BTreeMap<String, u64>, key: &str, compute: F) -> Result<u64>
where
    F: FnOnce() -> Result<u64>,
{
    if let Some(value) = map.get(key) {
        return Ok(*value);
    }
    let value = compute()?;
    map.insert(key.to_string(), value);
    Ok(value)
}
