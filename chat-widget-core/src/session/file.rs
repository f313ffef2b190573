//! File-backed session store
//!
//! The token lives in a small JSON key/value document, one key per value,
//! much like a browser's local storage. Other keys in the document are left
//! alone.

use super::store::{SessionStore, SessionToken};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Session store persisted to a JSON document on disk
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    key: String,
    token: Option<SessionToken>,
    degraded: bool,
}

impl FileSessionStore {
    /// Open the store, reading the persisted token once.
    ///
    /// A missing document means "no token yet". An unreadable or corrupt
    /// document puts the store in memory-only mode.
    pub fn open(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        let path = path.into();
        let key = key.into();

        let (token, degraded) = match read_document(&path) {
            Ok(doc) => {
                let token = doc
                    .get(&key)
                    .and_then(Value::as_str)
                    .and_then(SessionToken::new);
                debug!(path = %path.display(), found = token.is_some(), "Loaded session storage");
                (token, false)
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Session storage unavailable, keeping token in memory only"
                );
                (None, true)
            }
        };

        Self {
            path,
            key,
            token,
            degraded,
        }
    }

    /// Whether writes have been abandoned for this run
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    fn persist(&self, token: &SessionToken) -> crate::Result<()> {
        let mut doc = read_document(&self.path)?;
        doc.insert(self.key.clone(), Value::String(token.as_str().to_string()));

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // write-then-rename so a crash never leaves a truncated document
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(&Value::Object(doc))?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Option<SessionToken> {
        self.token.clone()
    }

    fn set(&mut self, token: SessionToken) {
        if self.token.as_ref() == Some(&token) {
            return;
        }

        if !self.degraded {
            match self.persist(&token) {
                Ok(()) => info!(path = %self.path.display(), "Persisted session token"),
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        error = %e,
                        "Failed to persist session token, keeping it in memory only"
                    );
                    self.degraded = true;
                }
            }
        }
        self.token = Some(token);
    }
}

fn read_document(path: &Path) -> crate::Result<Map<String, Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => return Err(e.into()),
    };

    if content.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(&content)? {
        Value::Object(map) => Ok(map),
        other => Err(crate::Error::Storage(format!(
            "expected a JSON object, found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn token(s: &str) -> SessionToken {
        SessionToken::new(s).unwrap()
    }

    #[test]
    fn test_missing_document_means_no_token() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::open(temp_dir.path().join("storage.json"), "sid");
        assert!(store.get().is_none());
        assert!(!store.is_degraded());
    }

    #[test]
    fn test_set_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("storage.json");

        let mut store = FileSessionStore::open(&path, "sid");
        store.set(token("abc"));
        assert_eq!(store.get().unwrap().as_str(), "abc");

        let reopened = FileSessionStore::open(&path, "sid");
        assert_eq!(reopened.get().unwrap().as_str(), "abc");
    }

    #[test]
    fn test_stored_as_plain_string_under_key() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");

        let mut store = FileSessionStore::open(&path, "sid");
        store.set(token("abc"));

        let doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["sid"], Value::String("abc".to_string()));
    }

    #[test]
    fn test_other_keys_are_preserved() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        std::fs::write(&path, r#"{"theme":"dark","sid":"old"}"#).unwrap();

        let mut store = FileSessionStore::open(&path, "sid");
        assert_eq!(store.get().unwrap().as_str(), "old");
        store.set(token("new"));

        let doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["theme"], "dark");
        assert_eq!(doc["sid"], "new");
    }

    #[test]
    fn test_empty_persisted_value_is_absent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        std::fs::write(&path, r#"{"sid":""}"#).unwrap();

        let store = FileSessionStore::open(&path, "sid");
        assert!(store.get().is_none());
        assert!(!store.is_degraded());
    }

    #[test]
    fn test_corrupt_document_degrades_to_memory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        std::fs::write(&path, "{not json").unwrap();

        let mut store = FileSessionStore::open(&path, "sid");
        assert!(store.is_degraded());
        assert!(store.get().is_none());

        store.set(token("abc"));
        assert_eq!(store.get().unwrap().as_str(), "abc");
        // the unreadable document is not clobbered
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{not json");
    }

    #[test]
    fn test_non_object_document_degrades() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        std::fs::write(&path, "[1,2,3]").unwrap();

        let store = FileSessionStore::open(&path, "sid");
        assert!(store.is_degraded());
    }

    #[test]
    fn test_unwritable_location_keeps_token_in_memory() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "i am a file").unwrap();
        // parent "directory" is a regular file, so nothing can be written below it
        let path = blocker.join("storage.json");

        let mut store = FileSessionStore::open(&path, "sid");
        store.set(token("abc"));
        assert!(store.is_degraded());
        assert_eq!(store.get().unwrap().as_str(), "abc");

        store.set(token("def"));
        assert_eq!(store.get().unwrap().as_str(), "def");
    }
}
