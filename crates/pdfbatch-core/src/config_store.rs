//! Persists named parameter presets to `<temp_dir>/batch_configs/<name>.json`.
//!
//! Writes are atomic (write a `.json.tmp` sibling, then rename over the
//! final path) so readers never observe a half-written file.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BatchError;
use crate::model::{JobId, OperationParams};

/// The on-disk shape of a saved configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub name: String,
    pub operation: String,
    pub parameters: OperationParams,
    pub created_at: DateTime<Utc>,
    pub source_job_id: JobId,
}

/// Thread-safe, last-writer-wins persistence of [`ConfigEntry`] records.
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    /// Creates a store rooted at `<temp_dir>/batch_configs`, creating the
    /// directory if it does not yet exist.
    pub fn new(temp_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = temp_dir.into().join("batch_configs");
        std::fs::create_dir_all(&dir)?;
        Ok(ConfigStore { dir })
    }

    fn entry_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Persists `entry` under its own name, overwriting any prior entry of
    /// the same name.
    pub fn save(&self, entry: &ConfigEntry) -> Result<(), BatchError> {
        let path = self.entry_path(&entry.name);
        let json = serde_json::to_string_pretty(entry).map_err(BatchError::system)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(BatchError::system)?;
        std::fs::rename(&tmp, &path).map_err(BatchError::system)?;
        Ok(())
    }

    /// Loads the entry named `name`. A missing file is `not-found`; a file
    /// that fails to parse (e.g. torn write, disk corruption) is logged and
    /// also treated as `not-found` rather than propagating a parse error.
    pub fn load(&self, name: &str) -> Result<ConfigEntry, BatchError> {
        let path = self.entry_path(name);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(BatchError::NotFound(format!("no saved config named '{name}'")));
            }
            Err(err) => return Err(BatchError::system(err)),
        };

        match serde_json::from_str(&raw) {
            Ok(entry) => Ok(entry),
            Err(err) => {
                tracing::warn!(config_name = %name, error = %err, "skipping unreadable config file");
                Err(BatchError::NotFound(format!("no saved config named '{name}'")))
            }
        }
    }

    /// The directory configs are persisted under, for diagnostics/tests.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry(name: &str) -> ConfigEntry {
        ConfigEntry {
            name: name.to_string(),
            operation: "compress".to_string(),
            parameters: OperationParams::new(),
            created_at: Utc::now(),
            source_job_id: JobId::new(),
        }
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path()).unwrap();
        let entry = sample_entry("nightly-compress");
        store.save(&entry).unwrap();

        let loaded = store.load("nightly-compress").unwrap();
        assert_eq!(loaded.operation, "compress");
        assert_eq!(loaded.source_job_id, entry.source_job_id);
    }

    #[test]
    fn load_missing_name_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path()).unwrap();
        assert!(matches!(store.load("nope"), Err(BatchError::NotFound(_))));
    }

    #[test]
    fn save_overwrites_prior_entry_with_same_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path()).unwrap();
        store.save(&sample_entry("preset")).unwrap();
        let mut second = sample_entry("preset");
        second.operation = "ocr".to_string();
        store.save(&second).unwrap();

        let loaded = store.load("preset").unwrap();
        assert_eq!(loaded.operation, "ocr");
    }

    #[test]
    fn corrupt_file_is_treated_as_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path()).unwrap();
        std::fs::write(store.dir().join("broken.json"), b"not json").unwrap();
        assert!(matches!(store.load("broken"), Err(BatchError::NotFound(_))));
    }
}
