//! Local key-value store
//!
//! A single JSON object on disk holding the session (auth token, cached
//! profile) and small client-side state. Writes replace the file atomically.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::UserProfile;

pub const AUTH_TOKEN_KEY: &str = "authToken";
pub const USER_KEY: &str = "user";
pub const CALCULATOR_HISTORY_KEY: &str = "calculatorHistory";

/// Entries kept in the calculator history
pub const CALCULATOR_HISTORY_LIMIT: usize = 20;

/// One remembered calculator evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatorEntry {
    pub expression: String,
    pub result: f64,
}

/// Default store location
pub fn default_store_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("financeflow").join("store.json"))
}

#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    values: BTreeMap<String, Value>,
}

impl LocalStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    Error::Storage(format!("{} is not a valid store: {}", path.display(), e))
                })?
            }
        } else {
            BTreeMap::new()
        };

        debug!("Opened store {} ({} keys)", path.display(), values.len());
        Ok(Self { path, values })
    }

    /// Open the store at the platform default location
    pub fn open_default() -> Result<Self> {
        let path = default_store_path()
            .ok_or_else(|| Error::Storage("No data directory available".into()))?;
        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.values.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        self.values
            .insert(key.to_string(), serde_json::to_value(value)?);
        self.persist()
    }

    /// Remove `key`; returns whether it was present
    pub fn remove(&mut self, key: &str) -> Result<bool> {
        if self.values.remove(key).is_none() {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    fn persist(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, &self.values)?;
        file.write_all(b"\n")?;
        file.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    pub fn auth_token(&self) -> Result<Option<String>> {
        self.get(AUTH_TOKEN_KEY)
    }

    pub fn set_auth_token(&mut self, token: &str) -> Result<()> {
        self.set(AUTH_TOKEN_KEY, &token)
    }

    pub fn cached_user(&self) -> Result<Option<UserProfile>> {
        self.get(USER_KEY)
    }

    pub fn set_cached_user(&mut self, user: &UserProfile) -> Result<()> {
        self.set(USER_KEY, user)
    }

    pub fn calculator_history(&self) -> Result<Vec<CalculatorEntry>> {
        Ok(self.get(CALCULATOR_HISTORY_KEY)?.unwrap_or_default())
    }

    /// Record an evaluation, newest first, keeping the last 20
    pub fn push_calculator_entry(&mut self, entry: CalculatorEntry) -> Result<()> {
        let mut history = self.calculator_history()?;
        history.insert(0, entry);
        history.truncate(CALCULATOR_HISTORY_LIMIT);
        self.set(CALCULATOR_HISTORY_KEY, &history)
    }

    /// Returns whether there was any history to clear
    pub fn clear_calculator_history(&mut self) -> Result<bool> {
        self.remove(CALCULATOR_HISTORY_KEY)
    }

    /// Forget the token and cached profile. Other keys survive a logout.
    pub fn clear_session(&mut self) -> Result<()> {
        let had_token = self.values.remove(AUTH_TOKEN_KEY).is_some();
        let had_user = self.values.remove(USER_KEY).is_some();
        if had_token || had_user {
            self.persist()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("nested").join("store.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let (_dir, store) = store();
        assert_eq!(store.auth_token().unwrap(), None);
        assert!(store.calculator_history().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_values_survive_reopen() {
        let (_dir, mut store) = store();
        store.set_auth_token("abc123").unwrap();
        store
            .set_cached_user(&UserProfile {
                id: "u1".into(),
                name: Some("Ana".into()),
                email: None,
            })
            .unwrap();

        let reopened = LocalStore::open(store.path()).unwrap();
        assert_eq!(reopened.auth_token().unwrap().as_deref(), Some("abc123"));
        assert_eq!(reopened.cached_user().unwrap().unwrap().id, "u1");
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(LocalStore::open(&path), Err(Error::Storage(_))));
    }

    #[test]
    fn test_calculator_history_is_capped() {
        let (_dir, mut store) = store();
        for i in 0..25 {
            store
                .push_calculator_entry(CalculatorEntry {
                    expression: format!("{} + 1", i),
                    result: i as f64 + 1.0,
                })
                .unwrap();
        }
        let history = store.calculator_history().unwrap();
        assert_eq!(history.len(), CALCULATOR_HISTORY_LIMIT);
        assert_eq!(history[0].expression, "24 + 1");
    }

    #[test]
    fn test_clear_session_keeps_other_keys() {
        let (_dir, mut store) = store();
        store.set_auth_token("abc123").unwrap();
        store
            .push_calculator_entry(CalculatorEntry {
                expression: "2 * 3".into(),
                result: 6.0,
            })
            .unwrap();

        store.clear_session().unwrap();
        let reopened = LocalStore::open(store.path()).unwrap();
        assert_eq!(reopened.auth_token().unwrap(), None);
        assert_eq!(reopened.calculator_history().unwrap().len(), 1);
    }

    #[test]
    fn test_remove_reports_presence() {
        let (_dir, mut store) = store();
        store.set("theme", &"dark").unwrap();
        assert!(store.remove("theme").unwrap());
        assert!(!store.remove("theme").unwrap());
    }
}
