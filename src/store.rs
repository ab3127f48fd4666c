use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

/// Durable string-to-string store shared by the chat session, the roadmap
/// cache, and the auth profile. Backed by a single JSON file that is
/// rewritten on every `set`.
///
/// The store never fails loudly: a missing or corrupt file loads as empty,
/// and a write that cannot reach disk is logged and dropped. Callers treat
/// a failed read as a miss and carry on.
#[derive(Debug, Clone)]
pub struct KvStore {
    inner: Arc<Mutex<StoreInner>>,
}

#[derive(Debug)]
struct StoreInner {
    path: Option<PathBuf>,
    entries: HashMap<String, String>,
}

impl KvStore {
    /// Opens the store at the platform data directory
    /// (e.g. `~/.local/share/triadhub/store.json` on Linux).
    pub fn open_default() -> Self {
        match dirs::data_dir() {
            Some(dir) => Self::open(dir.join("triadhub").join("store.json")),
            None => {
                warn!("could not determine data directory, store will not persist");
                Self::in_memory()
            }
        }
    }

    /// Opens the store at an explicit path.
    pub fn open(path: PathBuf) -> Self {
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "store file is corrupt, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                path: Some(path),
                entries,
            })),
        }
    }

    /// A store with no backing file. Reads and writes work but nothing
    /// survives the process.
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                path: None,
                entries: HashMap::new(),
            })),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().entries.get(key).cloned()
    }

    pub fn set(&self, key: &str, value: &str) {
        let mut inner = self.lock();
        inner.entries.insert(key.to_string(), value.to_string());
        inner.flush();
    }

    pub fn remove(&self, key: &str) {
        let mut inner = self.lock();
        if inner.entries.remove(key).is_some() {
            inner.flush();
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl StoreInner {
    fn flush(&self) {
        let Some(path) = &self.path else {
            return;
        };
        if let Some(parent) = path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                warn!(path = %path.display(), error = %err, "could not create store directory");
                return;
            }
        }
        let raw = match serde_json::to_string_pretty(&self.entries) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "could not serialize store");
                return;
            }
        };
        if let Err(err) = fs::write(path, raw) {
            warn!(path = %path.display(), error = %err, "could not write store file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        let store = KvStore::in_memory();
        store.set("greeting", "hello");
        assert_eq!(store.get("greeting"), Some("hello".to_string()));
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = KvStore::open(path.clone());
        store.set("triadhub_user", "{\"username\":\"Architect_User\"}");
        drop(store);

        let reopened = KvStore::open(path);
        assert_eq!(
            reopened.get("triadhub_user"),
            Some("{\"username\":\"Architect_User\"}".to_string())
        );
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "not json at all {{{").unwrap();

        let store = KvStore::open(path);
        assert_eq!(store.get("anything"), None);

        // A corrupt store is still writable.
        store.set("key", "value");
        assert_eq!(store.get("key"), Some("value".to_string()));
    }

    #[test]
    fn test_remove_deletes_key() {
        let store = KvStore::in_memory();
        store.set("key", "value");
        store.remove("key");
        assert_eq!(store.get("key"), None);
    }

    #[test]
    fn test_unwritable_path_does_not_panic() {
        let store = KvStore::open(PathBuf::from("/proc/no-such-dir/store.json"));
        store.set("key", "value");
        // The write fails quietly but the entry stays readable in memory.
        assert_eq!(store.get("key"), Some("value".to_string()));
    }
}
