//! Persistent store adapter.
//!
//! One logical key maps to one JSON document. Reads that fail for any reason
//! (missing key, unreadable backend, malformed payload) fall back to the
//! caller's initial value; writes are best-effort. The backend is a port so
//! tests can substitute an in-memory fake for the on-disk implementation.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Raw key/value backend underneath the typed adapter.
pub trait StorageBackend {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&mut self, key: &str, payload: &str) -> Result<()>;
}

/// On-disk backend: `<root>/<key>.json` per key. Writes go through a
/// temp file and rename so a crash mid-write cannot truncate the store.
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .with_context(|| format!("reading {}", path.display()))
    }

    fn write(&mut self, key: &str, payload: &str) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("creating {}", self.root.display()))?;
        let tmp = self.root.join(format!("{key}.json.tmp"));
        fs::write(&tmp, payload).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, self.path_for(key)).context("committing store write")?;
        Ok(())
    }
}

/// In-memory backend, the substitutable fake for tests.
#[derive(Default)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
    fail_writes: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose writes always fail, for exercising write tolerance.
    pub fn broken() -> Self {
        Self { entries: HashMap::new(), fail_writes: true }
    }

    /// Pre-seeds a key, e.g. with a malformed payload.
    pub fn with_entry(key: &str, payload: &str) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.to_string(), payload.to_string());
        Self { entries, fail_writes: false }
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, payload: &str) -> Result<()> {
        if self.fail_writes {
            bail!("backing store unavailable");
        }
        self.entries.insert(key.to_string(), payload.to_string());
        Ok(())
    }
}

/// Typed get/set over a [`StorageBackend`].
pub struct Store {
    backend: Box<dyn StorageBackend + Send>,
}

impl Store {
    pub fn new(backend: impl StorageBackend + Send + 'static) -> Self {
        Self { backend: Box::new(backend) }
    }

    /// File-backed store rooted at `data_dir`.
    pub fn open(data_dir: impl Into<PathBuf>) -> Self {
        Self::new(FileBackend::new(data_dir))
    }

    /// Reads and parses the value under `key`. Missing key, backend failure
    /// and parse failure all yield `initial`; none of them reach the caller.
    pub fn load<T: DeserializeOwned>(&self, key: &str, initial: T) -> T {
        match self.backend.read(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(err) => {
                    warn!("discarding malformed payload under {key:?}: {err}");
                    initial
                }
            },
            Ok(None) => initial,
            Err(err) => {
                warn!("failed to read {key:?}: {err}");
                initial
            }
        }
    }

    /// Serializes `value` under `key`. Failures are logged; in-memory state
    /// is the caller's and stays untouched.
    pub fn save<T: Serialize>(&mut self, key: &str, value: &T) {
        let payload = match serde_json::to_string_pretty(value) {
            Ok(payload) => payload,
            Err(err) => {
                warn!("failed to serialize {key:?}: {err}");
                return;
            }
        };
        if let Err(err) = self.backend.write(key, &payload) {
            warn!("failed to persist {key:?}: {err}");
        }
    }
}
