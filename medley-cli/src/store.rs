//! JSON-file implementation of the engine's roster storage seam.

use std::fs;
use std::io;
use std::path::PathBuf;

use medley_engine::{Roster, RosterStore};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: io::Error,
    },
    #[error("failed to serialize roster: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Stores one pretty-printed JSON document per team key inside a
/// directory. A malformed document falls back to an empty roster with a
/// warning rather than failing the whole command.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    #[must_use]
    pub fn document_path(&self, key: &str) -> PathBuf {
        self.path(key)
    }
}

impl RosterStore for JsonFileStore {
    type Error = StoreError;

    fn load_roster(&self, key: &str) -> Result<Option<Roster>, Self::Error> {
        let path = self.path(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        match Roster::from_json(&raw) {
            Ok(roster) => Ok(Some(roster)),
            Err(err) => {
                log::warn!("{} is not a valid roster document ({err}); starting fresh", path.display());
                Ok(None)
            }
        }
    }

    fn save_roster(&self, key: &str, roster: &Roster) -> Result<(), Self::Error> {
        let path = self.path(key);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: path.clone(),
                source,
            })?;
        }
        let json = roster.to_json()?;
        fs::write(&path, json).map_err(|source| StoreError::Write { path, source })
    }
}
