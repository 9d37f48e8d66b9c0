use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors surfaced by [`Store::write_json`]. Reads never fail — they fall
/// back to the caller's default (corrupt history must not block future
/// runs).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialize {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The staged file did not read back as valid JSON. The previously
    /// committed document is untouched.
    #[error("staged write for {key} failed validation: {reason}")]
    Validation { key: String, reason: String },
}

// ─── Document keys ──────────────────────────────────────────────────────────

/// Key of the published leaderboard artifact.
pub const LEADERBOARD_KEY: &str = "leaderboard.json";

/// Key of the global summary document.
pub const SUMMARY_KEY: &str = "stats/summary.json";

/// Key of the legacy-schema mirror.
pub const COMPAT_KEY: &str = "checkin_stats.json";

/// Directory key holding one document per calendar date.
pub const DAILY_DIR: &str = "stats/daily";

/// Key of the daily record for `date`.
pub fn daily_key(date: NaiveDate) -> String {
    format!("{DAILY_DIR}/{}.json", date.format("%Y-%m-%d"))
}

/// Key of the per-user streak record, sharded by the first two hex
/// characters of the address to bound per-directory file counts.
///
/// Addresses come from on-disk documents as well as the chain, so a
/// corrupted-but-parsable record can carry arbitrary text here. Anything
/// not starting with two hex characters lands in a fallback shard with a
/// warning instead of failing.
pub fn user_key(address: &str) -> String {
    let hex = address.strip_prefix("0x").unwrap_or(address);
    let shard = match hex.get(..2) {
        Some(s) if s.chars().all(|c| c.is_ascii_hexdigit()) => s,
        _ => {
            warn!(address, "Address does not start with two hex characters, using fallback shard");
            "__"
        }
    };
    format!("stats/users/{shard}/{address}.json")
}

// ─── Store ──────────────────────────────────────────────────────────────────

/// Durable JSON document store over a directory tree.
///
/// Writes are atomic with respect to a crash mid-write: the document is
/// staged to `<path>.tmp`, read back and re-parsed, the previous version is
/// copied to `<path>.bak` (best effort), and only then is the staged file
/// renamed over the original. A half-written staging file is never
/// promoted.
///
/// Reads go through a run-scoped cache that hands out deep copies, so a
/// caller mutating what it read cannot poison a later read of the same key.
#[derive(Debug)]
pub struct Store {
    root: PathBuf,
    max_file_bytes: u64,
    cache: HashMap<String, Value>,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>, max_file_bytes: u64) -> Self {
        Self {
            root: root.into(),
            max_file_bytes,
            cache: HashMap::new(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Read a document, returning `default` when it is missing, oversized,
    /// or unparsable. Never fails.
    pub fn read_json<T: DeserializeOwned>(&mut self, key: &str, default: T) -> T {
        if let Some(cached) = self.cache.get(key) {
            match serde_json::from_value(cached.clone()) {
                Ok(value) => return value,
                Err(e) => {
                    warn!(key, error = %e, "Cached document does not match requested schema");
                    return default;
                }
            }
        }

        let path = self.path_for(key);
        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(_) => {
                debug!(key, "Document missing, using default");
                return default;
            }
        };
        if meta.len() > self.max_file_bytes {
            warn!(key, size = meta.len(), limit = self.max_file_bytes, "Document exceeds size ceiling, using default");
            return default;
        }

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "Failed to read document, using default");
                return default;
            }
        };
        let parsed: Value = match serde_json::from_str(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(key, error = %e, "Document is not valid JSON, using default");
                return default;
            }
        };
        let value = match serde_json::from_value(parsed.clone()) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Document does not match requested schema, using default");
                return default;
            }
        };

        self.cache.insert(key.to_string(), parsed);
        value
    }

    /// Atomically replace a document: stage, validate, back up, rename.
    /// On any failure before the rename the committed document is intact.
    pub fn write_json<T: Serialize>(&mut self, key: &str, document: &T) -> Result<(), StoreError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                key: key.to_string(),
                source,
            })?;
        }

        let json =
            serde_json::to_string_pretty(document).map_err(|source| StoreError::Serialize {
                key: key.to_string(),
                source,
            })?;

        let staged = staging_path(&path);
        fs::write(&staged, &json).map_err(|source| StoreError::Io {
            key: key.to_string(),
            source,
        })?;

        // Validate the staged bytes before promoting them.
        let parsed = match fs::read_to_string(&staged)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str::<Value>(&raw).map_err(|e| e.to_string()))
        {
            Ok(parsed) => parsed,
            Err(reason) => {
                let _ = fs::remove_file(&staged);
                return Err(StoreError::Validation {
                    key: key.to_string(),
                    reason,
                });
            }
        };

        // Best-effort backup of the previous version.
        if path.exists() {
            if let Err(e) = fs::copy(&path, backup_path(&path)) {
                warn!(key, error = %e, "Failed to back up previous document");
            }
        }

        fs::rename(&staged, &path).map_err(|source| StoreError::Io {
            key: key.to_string(),
            source,
        })?;

        self.cache.insert(key.to_string(), parsed);
        debug!(key, bytes = json.len(), "Document written");
        Ok(())
    }

    /// File stems (without `.json`) under a directory key, sorted
    /// ascending. Staging and backup leftovers are skipped.
    pub fn list_stems(&self, dir: &str) -> Vec<String> {
        let path = self.path_for(dir);
        let entries = match fs::read_dir(&path) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut stems: Vec<String> = entries
            .filter_map(|entry| {
                let name = entry.ok()?.file_name().into_string().ok()?;
                name.strip_suffix(".json").map(str::to_string)
            })
            .collect();
        stems.sort();
        stems
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

fn backup_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".bak");
    PathBuf::from(os)
}
