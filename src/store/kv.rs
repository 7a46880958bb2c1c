use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("i/o error on `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize `{key}`: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("unsupported export version: {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("import failed during {stage}: {reason}")]
    Import { stage: &'static str, reason: String },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// String-keyed document storage. Values are serialized JSON text.
///
/// A missing key reads as `Ok(None)`; `Err` means the backend itself failed.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> StorageResult<()>;

    fn set_many(&self, entries: &[(&str, String)]) -> StorageResult<()> {
        for (key, value) in entries {
            self.set_item(key, value)?;
        }
        Ok(())
    }

    fn multi_remove(&self, keys: &[&str]) -> StorageResult<()> {
        for key in keys {
            self.remove_item(key)?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct MemoryInner {
    items: HashMap<String, String>,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
}

/// In-process store. Clones share the same map, so a test can keep a handle
/// for inspection and failure injection after handing one to the app store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.inner.borrow_mut().fail_reads = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.borrow_mut().fail_writes = fail;
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.borrow().items.contains_key(key)
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.borrow().items.get(key).cloned()
    }

    /// Successful writes and removals so far.
    pub fn write_count(&self) -> usize {
        self.inner.borrow().writes
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let inner = self.inner.borrow();
        if inner.fail_reads {
            return Err(StorageError::Unavailable(format!("read of `{key}` rejected")));
        }
        Ok(inner.items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_writes {
            return Err(StorageError::Unavailable(format!("write of `{key}` rejected")));
        }
        inner.items.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_writes {
            return Err(StorageError::Unavailable(format!("removal of `{key}` rejected")));
        }
        inner.items.remove(key);
        inner.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get_item("words").unwrap(), None);
        store.set_item("words", "[]").unwrap();
        assert_eq!(store.get_item("words").unwrap().as_deref(), Some("[]"));
        store.remove_item("words").unwrap();
        store.remove_item("words").unwrap();
        assert!(!store.contains("words"));
    }

    #[test]
    fn test_clones_share_state() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store.set_item("theme", "\"dark\"").unwrap();
        assert_eq!(handle.raw("theme").as_deref(), Some("\"dark\""));
        assert_eq!(handle.write_count(), 1);
    }

    #[test]
    fn test_injected_failures() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        assert!(matches!(
            store.set_item("k", "v"),
            Err(StorageError::Unavailable(_))
        ));
        store.set_fail_writes(false);
        store.set_fail_reads(true);
        assert!(store.get_item("k").is_err());
    }

    #[test]
    fn test_multi_remove_default() {
        let store = MemoryStore::new();
        store
            .set_many(&[("a", "1".to_string()), ("b", "2".to_string())])
            .unwrap();
        store.multi_remove(&["a", "b", "c"]).unwrap();
        assert!(!store.contains("a"));
        assert!(!store.contains("b"));
    }
}
