use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::{DashMap, Result};

/// A string key/value namespace that survives restarts of the host.
pub trait NamedCollection: Send + Sync {
    fn get_string(&self, key: &str) -> Option<String>;

    fn set_string(&self, key: &str, value: &str);

    fn remove(&self, key: &str);

    fn contains(&self, key: &str) -> bool;
}

pub trait DataStoring: Send + Sync {
    fn named_collection(&self, name: &str) -> Option<Arc<dyn NamedCollection>>;
}

/// In-memory named collections, optionally mirrored to a JSON file on every write.
#[derive(Clone, Default)]
pub struct MemoryDataStore {
    inner: Arc<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    path: Option<PathBuf>,
    collections: DashMap<String, DashMap<String, String>>,
}

impl MemoryDataStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a file-backed store, loading existing content if the file exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let collections: DashMap<String, DashMap<String, String>> = DashMap::default();
        if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            if !data.trim().is_empty() {
                let loaded: Map<String, Value> = serde_json::from_str(&data)?;
                for (name, entries) in loaded {
                    let entries = match entries {
                        Value::Object(entries) => entries,
                        _ => continue,
                    };
                    let collection: DashMap<String, String> = DashMap::default();
                    for (k, v) in entries {
                        if let Value::String(v) = v {
                            collection.insert(k, v);
                        }
                    }
                    collections.insert(name, collection);
                }
            }
        }
        log::debug!("datastore opened, path: {:?}, collections: {}", path, collections.len());
        Ok(Self { inner: Arc::new(StoreInner { path: Some(path), collections }) })
    }
}

impl DataStoring for MemoryDataStore {
    fn named_collection(&self, name: &str) -> Option<Arc<dyn NamedCollection>> {
        if name.is_empty() {
            return None;
        }
        Some(Arc::new(MemoryCollection { name: name.to_owned(), inner: self.inner.clone() }))
    }
}

struct MemoryCollection {
    name: String,
    inner: Arc<StoreInner>,
}

impl MemoryCollection {
    fn flush(&self) {
        if let Some(path) = self.inner.path.as_ref() {
            if let Err(e) = self.inner.save(path) {
                log::warn!("datastore flush to {:?} failed, {}", path, e);
            }
        }
    }
}

impl StoreInner {
    fn save(&self, path: &Path) -> Result<()> {
        let mut root = Map::new();
        for collection in self.collections.iter() {
            let entries = collection
                .value()
                .iter()
                .map(|e| (e.key().clone(), Value::String(e.value().clone())))
                .collect::<Map<String, Value>>();
            root.insert(collection.key().clone(), Value::Object(entries));
        }
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(&Value::Object(root))?)?;
        Ok(())
    }
}

impl NamedCollection for MemoryCollection {
    fn get_string(&self, key: &str) -> Option<String> {
        self.inner.collections.get(&self.name).and_then(|c| c.get(key).map(|v| v.value().clone()))
    }

    fn set_string(&self, key: &str, value: &str) {
        self.inner.collections.entry(self.name.clone()).or_default().insert(key.to_owned(), value.to_owned());
        self.flush();
    }

    fn remove(&self, key: &str) {
        let removed = self.inner.collections.get(&self.name).and_then(|c| c.remove(key)).is_some();
        if removed {
            self.flush();
        }
    }

    fn contains(&self, key: &str) -> bool {
        self.inner.collections.get(&self.name).map(|c| c.contains_key(key)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_ops() {
        let store = MemoryDataStore::new();
        let c = store.named_collection("a").unwrap();
        assert!(!c.contains("k"));
        c.set_string("k", "v");
        assert_eq!(c.get_string("k").as_deref(), Some("v"));
        assert!(store.named_collection("b").unwrap().get_string("k").is_none());

        c.remove("k");
        assert!(!c.contains("k"));

        assert!(store.named_collection("").is_none());
    }

    #[test]
    fn test_file_backed() {
        let path = std::env::temp_dir().join(format!("mobile-store-{}.json", uuid::Uuid::new_v4()));
        {
            let store = MemoryDataStore::open(&path).unwrap();
            store.named_collection("a").unwrap().set_string("k", "v");
        }
        let store = MemoryDataStore::open(&path).unwrap();
        assert_eq!(store.named_collection("a").unwrap().get_string("k").as_deref(), Some("v"));
        let _ = std::fs::remove_file(path);
    }
}
