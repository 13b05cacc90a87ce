//! Per-user preference store
//!
//! A flat string map persisted as one JSON file per namespace. Every write
//! replaces the file through a temp file and rename. On Unix the file is
//! readable by its owner only, since it may hold a password.

use super::SessionError;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct PreferenceStore {
    file_path: PathBuf,
    lock: Mutex<()>,
}

impl PreferenceStore {
    /// Store for `namespace` inside `dir`. The directory is created lazily on
    /// the first write.
    pub fn open(dir: &Path, namespace: &str) -> Self {
        Self {
            file_path: dir.join(format!("{namespace}.json")),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let _guard = self.lock.lock();
        Ok(self.read()?.remove(key))
    }

    /// Set several keys in one write
    pub fn put_all(&self, entries: &[(&str, &str)]) -> Result<(), SessionError> {
        let _guard = self.lock.lock();
        let mut map = self.read()?;
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        self.write(&map)
    }

    /// Remove several keys in one write; absent keys are ignored
    pub fn remove_all(&self, keys: &[&str]) -> Result<(), SessionError> {
        let _guard = self.lock.lock();
        let mut map = self.read()?;
        let before = map.len();
        for key in keys {
            map.remove(*key);
        }
        if map.len() == before {
            return Ok(());
        }
        self.write(&map)
    }

    fn read(&self) -> Result<BTreeMap<String, String>, SessionError> {
        match std::fs::read_to_string(&self.file_path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, map: &BTreeMap<String, String>) -> Result<(), SessionError> {
        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(map)?;
        let tmp = self.file_path.with_extension("json.tmp");

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
            options.mode(0o600);
            // mode() only applies on creation; a leftover temp file keeps its bits
            if tmp.exists() {
                std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))?;
            }
        }
        let mut file = options.open(&tmp)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&tmp, &self.file_path)?;
        tracing::debug!(path = %self.file_path.display(), keys = map.len(), "Preferences saved");
        Ok(())
    }
}
