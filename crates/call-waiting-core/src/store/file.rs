//! JSON file backed preference store
//!
//! The whole document is kept in memory and rewritten on every batch through
//! a temporary file followed by a rename, so a crash leaves either the old or
//! the new document on disk.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{PreferenceField, PreferenceKey, PreferenceStore};
use crate::error::{CallWaitingError, Result};

/// group -> field -> scope -> value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PreferenceDocument {
    groups: BTreeMap<String, BTreeMap<PreferenceField, BTreeMap<i32, i32>>>,
}

impl PreferenceDocument {
    fn get(&self, group: &str, key: PreferenceKey) -> Option<i32> {
        self.groups
            .get(group)?
            .get(&key.field)?
            .get(&key.scope)
            .copied()
    }

    fn insert(&mut self, group: &str, key: PreferenceKey, value: i32) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .entry(key.field)
            .or_default()
            .insert(key.scope, value);
    }
}

/// Preference store persisted as a JSON document
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    document: Mutex<PreferenceDocument>,
}

impl FilePreferenceStore {
    /// Open the store at `path`, starting empty if the file does not exist
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let document = match std::fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => PreferenceDocument::default(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => PreferenceDocument::default(),
            Err(e) => return Err(e.into()),
        };

        debug!(target: "call_waiting", "Opened preference store at {}", path.display());

        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, document: &PreferenceDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let bytes = serde_json::to_vec_pretty(document)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            CallWaitingError::storage(format!(
                "failed to replace {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get_int(&self, group: &str, key: PreferenceKey, default: i32) -> i32 {
        self.document.lock().get(group, key).unwrap_or(default)
    }

    fn put_ints(&self, group: &str, entries: &[(PreferenceKey, i32)]) -> Result<()> {
        let mut document = self.document.lock();
        let mut updated = document.clone();
        for (key, value) in entries {
            updated.insert(group, *key, *value);
        }
        // Only a batch that reached the disk becomes visible
        self.flush(&updated)?;
        *document = updated;
        Ok(())
    }
}
