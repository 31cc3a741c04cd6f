use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::entry::{timestamp_now, LogEntry, LogFilter, LogPage, NewLogEntry};
use crate::error::{StoreError, StoreResult};
use crate::limit::clamp_limit;

/// On-disk document layout: `{ "logs": [ ... ] }`.
#[derive(Serialize, Deserialize, Default)]
struct StoreFile {
    logs: Vec<LogEntry>,
}

/// Log store backed by a single JSON file.
///
/// Every operation reloads the file, works on the in-memory collection and,
/// for mutations, rewrites the whole file before returning. The sequence runs
/// under a per-store lock so concurrent callers never overwrite each other's
/// changes.
pub struct Store {
    path: PathBuf,
    lock: Mutex<()>,
}

impl Store {
    /// Open the store at `path`. A missing file is an empty store; a file
    /// that exists but cannot be parsed is an error.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let store = Self {
            path: path.into(),
            lock: Mutex::new(()),
        };
        let logs = store.load()?;
        info!(
            path = %store.path.display(),
            entries = logs.len(),
            "opened log store"
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn create(&self, new: NewLogEntry) -> StoreResult<LogEntry> {
        if new.prompt.trim().is_empty() {
            return Err(StoreError::Validation { field: "prompt" });
        }
        if new.response.trim().is_empty() {
            return Err(StoreError::Validation { field: "response" });
        }

        let _guard = self.guard();
        let mut logs = self.load()?;

        let id = loop {
            let candidate = Uuid::new_v4().to_string();
            if !logs.iter().any(|l| l.id == candidate) {
                break candidate;
            }
        };

        let entry = LogEntry {
            id,
            prompt: new.prompt,
            response: new.response,
            engine: new.engine.filter(|e| !e.is_empty()),
            tags: new.tags,
            created_at: timestamp_now(),
        };

        logs.push(entry.clone());
        self.persist(logs)?;
        debug!(id = %entry.id, "created log entry");
        Ok(entry)
    }

    /// Matching entries in insertion order, truncated to `limit` (clamped to
    /// `1..=100`, zero meaning the default). `total` is the count before
    /// truncation.
    pub fn list(&self, filter: &LogFilter, limit: usize) -> StoreResult<LogPage> {
        let limit = clamp_limit(limit);

        let _guard = self.guard();
        let matching: Vec<LogEntry> = self
            .load()?
            .into_iter()
            .filter(|l| filter.matches(l))
            .collect();

        let total = matching.len();
        let logs = matching.into_iter().take(limit).collect();
        Ok(LogPage { logs, total })
    }

    pub fn get(&self, id: &str) -> StoreResult<LogEntry> {
        let _guard = self.guard();
        self.load()?
            .into_iter()
            .find(|l| l.id == id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    /// Remove the entry with `id` and return it. Nothing is written when the
    /// id is unknown.
    pub fn delete(&self, id: &str) -> StoreResult<LogEntry> {
        let _guard = self.guard();
        let mut logs = self.load()?;

        let Some(index) = logs.iter().position(|l| l.id == id) else {
            return Err(StoreError::NotFound { id: id.to_string() });
        };

        let removed = logs.remove(index);
        self.persist(logs)?;
        debug!(id = %removed.id, "deleted log entry");
        Ok(removed)
    }

    // The guarded data is `()`; a poisoned lock carries no broken state
    // because the collection is always reloaded from disk.
    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load(&self) -> StoreResult<Vec<LogEntry>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let file: StoreFile =
            serde_json::from_str(&content).map_err(|e| self.corrupt(e.to_string()))?;

        {
            let mut seen = HashSet::with_capacity(file.logs.len());
            for entry in &file.logs {
                if !seen.insert(entry.id.as_str()) {
                    return Err(self.corrupt(format!("duplicate id {}", entry.id)));
                }
            }
        }

        Ok(file.logs)
    }

    /// Write the full collection to a sibling temp file and rename it over the
    /// store file, so readers only ever see a complete document.
    fn persist(&self, logs: Vec<LogEntry>) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(&StoreFile { logs })
            .map_err(|e| self.corrupt(format!("failed to serialize: {}", e)))?;

        let parent = self.path.parent().unwrap_or_else(|| Path::new(""));
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("store");
        // Unique per write: other stores or processes may persist the same
        // file concurrently.
        let tmp_name = format!(
            ".{}.tmp-{}-{}",
            file_name,
            process::id(),
            Uuid::new_v4().simple()
        );
        let tmp_path = parent.join(tmp_name);

        fs::write(&tmp_path, bytes).map_err(|e| StoreError::Io {
            path: tmp_path.clone(),
            source: e,
        })?;
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(StoreError::Io {
                path: tmp_path,
                source: e,
            });
        }

        debug!(path = %self.path.display(), "persisted log store");
        Ok(())
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn corrupt(&self, reason: String) -> StoreError {
        StoreError::Corrupt {
            path: self.path.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("db.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn missing_file_opens_empty_and_is_not_created() {
        let (dir, store) = temp_store();
        let page = store.list(&LogFilter::default(), 20).unwrap();
        assert_eq!(page.total, 0);
        assert!(!dir.path().join("db.json").exists());
    }

    #[test]
    fn persisted_document_has_logs_field_only() {
        let (_dir, store) = temp_store();
        store
            .create(NewLogEntry::new("Hello world", "Hi there"))
            .unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let obj = doc.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["logs"].as_array().unwrap().len(), 1);
        assert_eq!(obj["logs"][0]["engine"], serde_json::Value::Null);
    }

    #[test]
    fn persist_leaves_no_temp_file_behind() {
        let (dir, store) = temp_store();
        store.create(NewLogEntry::new("p", "r")).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["db.json".to_string()]);
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data").join("db.json");
        let store = Store::open(&path).unwrap();
        store.create(NewLogEntry::new("p", "r")).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn blank_file_is_an_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, "  \n").unwrap();
        let store = Store::open(&path).unwrap();
        assert_eq!(store.list(&LogFilter::default(), 20).unwrap().total, 0);
    }

    #[test]
    fn wrong_shape_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, r#"{"entries": []}"#).unwrap();
        assert!(matches!(
            Store::open(&path),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn duplicate_ids_are_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let entry = serde_json::json!({
            "id": "same",
            "prompt": "p",
            "response": "r",
            "engine": null,
            "tags": [],
            "createdAt": "2024-05-01T12:00:00.000Z"
        });
        fs::write(
            &path,
            serde_json::json!({ "logs": [entry.clone(), entry] }).to_string(),
        )
        .unwrap();

        let err = Store::open(&path).err().unwrap();
        assert!(err.is_storage());
        assert!(err.to_string().contains("duplicate id same"));
    }

    #[test]
    fn empty_engine_is_stored_as_none() {
        let (_dir, store) = temp_store();
        let entry = store
            .create(NewLogEntry::new("p", "r").engine(""))
            .unwrap();
        assert_eq!(entry.engine, None);
    }

    #[test]
    fn failed_delete_does_not_rewrite() {
        let (_dir, store) = temp_store();
        store.create(NewLogEntry::new("p", "r")).unwrap();
        let before = fs::metadata(store.path()).unwrap().modified().unwrap();
        let before_content = fs::read_to_string(store.path()).unwrap();

        assert!(matches!(
            store.delete("nope"),
            Err(StoreError::NotFound { .. })
        ));

        assert_eq!(fs::read_to_string(store.path()).unwrap(), before_content);
        assert_eq!(fs::metadata(store.path()).unwrap().modified().unwrap(), before);
    }
}
