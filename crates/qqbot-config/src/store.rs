use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{ConfigError, Result};

/// Plugin-keyed persistent JSON document (C1).
///
/// A single process-wide instance is constructed once (via [`ConfigStore::load`])
/// and shared by `Arc` — every read and write goes through the in-memory
/// [`Value`] tree guarded by a single `Mutex`; the critical section never
/// spans the file I/O in `save`/`reload` beyond what's needed to hand off to
/// `std::fs`, matching §5's "hold duration strictly bounded to in-memory
/// manipulation" guidance for this component's synchronous API.
///
/// `serde_json::Value`'s default `Map` implementation is backed by a
/// `BTreeMap`, so every `to_string_pretty` call below naturally emits keys
/// in sorted order — no extra normalization step is needed to satisfy the
/// "sorted keys" requirement in §4.1.
pub struct ConfigStore {
    path: PathBuf,
    doc: Mutex<Value>,
}

impl ConfigStore {
    /// Load the document at `path`, creating an empty one in memory if the
    /// file is missing or fails to parse. Never fails at startup.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let doc = read_or_empty(&path);
        Self {
            path,
            doc: Mutex::new(doc),
        }
    }

    /// Walk `dotted_key.split('.')`; any missing or non-object segment
    /// along the way yields `default` instead of the deserialized value.
    pub fn get<T: DeserializeOwned>(&self, dotted_key: &str, default: T) -> T {
        self.get_value(dotted_key)
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or(default)
    }

    /// Same as [`ConfigStore::get`] but returns the raw JSON value, or
    /// `None` if the path doesn't resolve.
    pub fn get_value(&self, dotted_key: &str) -> Option<Value> {
        let doc = self.doc.lock().expect("config store poisoned");
        walk(&doc, dotted_key)
    }

    /// Auto-vivify intermediate objects along `dotted_key` and set the leaf
    /// to `value`. A non-object value encountered mid-path is overwritten
    /// with a fresh empty object so the set can proceed.
    pub fn set(&self, dotted_key: &str, value: impl Serialize) {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        let mut doc = self.doc.lock().expect("config store poisoned");
        set_path(&mut doc, dotted_key, value);
    }

    /// Convenience for `plugins.<plugin>.<leaf>` keys.
    pub fn plugin_get<T: DeserializeOwned>(&self, plugin: &str, leaf: &str, default: T) -> T {
        self.get(&format!("plugins.{plugin}.{leaf}"), default)
    }

    /// Convenience for `plugins.<plugin>.<leaf>` keys.
    pub fn plugin_set(&self, plugin: &str, leaf: &str, value: impl Serialize) {
        self.set(&format!("plugins.{plugin}.{leaf}"), value);
    }

    /// Serialize the in-memory document to `<path>.tmp`, then atomically
    /// rename it over `path`. Parent directories are created on demand.
    pub fn save(&self) -> Result<()> {
        let doc = self.doc.lock().expect("config store poisoned");
        let mut rendered = serde_json::to_string_pretty(&*doc)?;
        rendered.push('\n');
        drop(doc);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                    path: parent.display().to_string(),
                    source: e,
                })?;
            }
        }

        let tmp_path = tmp_path_for(&self.path);
        std::fs::write(&tmp_path, rendered).map_err(|e| ConfigError::Io {
            path: tmp_path.display().to_string(),
            source: e,
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| ConfigError::Io {
            path: self.path.display().to_string(),
            source: e,
        })?;

        Ok(())
    }

    /// Discard the in-memory cache and re-read from disk. Degrades to an
    /// empty document on any error, same as `load`.
    pub fn reload(&self) {
        let fresh = read_or_empty(&self.path);
        let mut doc = self.doc.lock().expect("config store poisoned");
        *doc = fresh;
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut os_string = path.as_os_str().to_os_string();
    os_string.push(".tmp");
    PathBuf::from(os_string)
}

fn read_or_empty(path: &Path) -> Value {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "config file is not valid JSON, starting empty");
            Value::Object(Default::default())
        }),
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "could not read config file, starting empty");
            }
            Value::Object(Default::default())
        }
    }
}

fn walk(root: &Value, dotted_key: &str) -> Option<Value> {
    let mut current = root;
    for segment in dotted_key.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current.clone())
}

fn set_path(root: &mut Value, dotted_key: &str, value: Value) {
    let segments: Vec<&str> = dotted_key.split('.').collect();
    let mut current = root;

    for segment in &segments[..segments.len().saturating_sub(1)] {
        if !current.is_object() {
            *current = Value::Object(Default::default());
        }
        let map = current.as_object_mut().expect("just normalized to object");
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
    }

    if !current.is_object() {
        *current = Value::Object(Default::default());
    }
    if let Some(leaf) = segments.last() {
        let map = current.as_object_mut().expect("just normalized to object");
        map.insert(leaf.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_degrades_to_empty_document() {
        let store = ConfigStore::load("/nonexistent/path/does-not-exist.json");
        assert_eq!(store.get::<bool>("plugins.anti_recall.enabled", false), false);
    }

    #[test]
    fn corrupt_file_degrades_to_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = ConfigStore::load(&path);
        assert_eq!(store.get::<i64>("anything", 7), 7);
    }

    #[test]
    fn set_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::load(dir.path().join("config.json"));
        store.set("plugins.anti_recall.enabled", true);
        assert!(store.get::<bool>("plugins.anti_recall.enabled", false));
    }

    #[test]
    fn get_missing_key_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::load(dir.path().join("config.json"));
        assert_eq!(store.get::<i64>("plugins.x.y", 42), 42);
    }

    #[test]
    fn set_overwrites_scalar_in_path_with_map() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::load(dir.path().join("config.json"));
        store.set("plugins.anti_recall", "not-a-map");
        store.set("plugins.anti_recall.enabled", true);
        assert!(store.get::<bool>("plugins.anti_recall.enabled", false));
    }

    #[test]
    fn save_then_reload_on_fresh_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = ConfigStore::load(&path);
        store.set("plugins.anti_recall.enabled", true);
        store.save().unwrap();

        let reloaded = ConfigStore::load(&path);
        assert!(reloaded.get::<bool>("plugins.anti_recall.enabled", false));

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.ends_with('\n'));
        assert!(!tmp_path_for(&path).exists());
    }

    #[test]
    fn reload_discards_in_memory_changes_not_yet_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = ConfigStore::load(&path);
        store.set("plugins.anti_recall.enabled", true);
        store.save().unwrap();

        store.set("plugins.anti_recall.enabled", false);
        store.reload();
        assert!(store.get::<bool>("plugins.anti_recall.enabled", false));
    }
}
