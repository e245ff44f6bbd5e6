//! Best-score persistence
//!
//! A single integer keyed by a constant string. Stores never fail loudly:
//! read errors yield 0 and write errors are logged.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::StoreError;

/// Integer key-value cell shared across restarts and sessions
pub trait ScoreStore {
    /// Stored value, 0 when absent
    fn get_int(&self, key: &str) -> i64;
    fn set_int(&mut self, key: &str, value: i64);
}

/// In-memory store. Clones share the same cells.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    cells: Rc<RefCell<HashMap<String, i64>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryStore {
    fn get_int(&self, key: &str) -> i64 {
        self.cells.borrow().get(key).copied().unwrap_or(0)
    }

    fn set_int(&mut self, key: &str, value: i64) {
        self.cells.borrow_mut().insert(key.to_string(), value);
    }
}

/// JSON object on disk, rewritten on every set
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    cells: HashMap<String, i64>,
}

impl JsonFileStore {
    /// Open the store, starting empty if the file is missing or unreadable
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let cells = match Self::read(&path) {
            Ok(cells) => {
                log::info!("Loaded {} score entries from {}", cells.len(), path.display());
                cells
            }
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No score file at {}, starting fresh", path.display());
                HashMap::new()
            }
            Err(e) => {
                log::warn!("Ignoring score file {}: {}", path.display(), e);
                HashMap::new()
            }
        };
        Self { path, cells }
    }

    fn read(path: &Path) -> Result<HashMap<String, i64>, StoreError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn write(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.cells)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl ScoreStore for JsonFileStore {
    fn get_int(&self, key: &str) -> i64 {
        self.cells.get(key).copied().unwrap_or(0)
    }

    fn set_int(&mut self, key: &str, value: i64) {
        self.cells.insert(key.to_string(), value);
        if let Err(e) = self.write() {
            log::warn!("Failed to save {} to {}: {}", key, self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_defaults_to_zero() {
        let store = MemoryStore::new();
        assert_eq!(store.get_int("BEST"), 0);
    }

    #[test]
    fn test_memory_store_clones_share_cells() {
        let mut a = MemoryStore::new();
        let b = a.clone();
        a.set_int("BEST", 7);
        assert_eq!(b.get_int("BEST"), 7);
    }

    #[test]
    fn test_file_store_persists() {
        let path = std::env::temp_dir().join(format!(
            "sky_glider_store_{}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let mut store = JsonFileStore::open(&path);
        assert_eq!(store.get_int("BEST"), 0);
        store.set_int("BEST", 12);

        let reopened = JsonFileStore::open(&path);
        assert_eq!(reopened.get_int("BEST"), 12);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_file_store_ignores_garbage() {
        let path = std::env::temp_dir().join(format!(
            "sky_glider_garbage_{}.json",
            std::process::id()
        ));
        std::fs::write(&path, "not json").unwrap();
        let store = JsonFileStore::open(&path);
        assert_eq!(store.get_int("BEST"), 0);
        let _ = std::fs::remove_file(&path);
    }
}
