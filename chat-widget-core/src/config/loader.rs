//! Configuration loading and management

use super::schema::Config;
use super::validate::validate_config;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Configuration loader
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Create a new config loader with the default config directory
    pub fn new() -> Self {
        let config_dir = dirs::home_dir()
            .map(|h| h.join(".chat-widget"))
            .unwrap_or_else(|| PathBuf::from(".chat-widget"));

        Self { config_dir }
    }

    /// Create a new config loader with a custom config directory
    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            config_dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Load configuration from file and environment
    pub fn load(&self) -> crate::Result<Config> {
        let config_path = self.config_dir.join("config.json");
        let mut merged = serde_json::to_value(Config::default())?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let file_value: Value = serde_json::from_str(&content)?;
            merge_values(&mut merged, file_value);
        }

        apply_alias_overrides(&mut merged);
        apply_path_overrides(&mut merged);

        let config: Config = serde_json::from_value(merged)?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                if let Some(existing) = base_map.get_mut(&key) {
                    merge_values(existing, value);
                } else {
                    base_map.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

/// Interpret an override against the value it replaces.
///
/// Only booleans, numbers and maps are parsed; everything else stays a
/// string so that e.g. a storage key of `2024` is not turned into a number.
fn parse_env_value(raw: &str, existing: Option<&Value>) -> Value {
    match existing {
        Some(Value::Bool(_)) => {
            if raw.eq_ignore_ascii_case("true") {
                return Value::Bool(true);
            }
            if raw.eq_ignore_ascii_case("false") {
                return Value::Bool(false);
            }
        }
        Some(Value::Number(_)) => {
            if let Ok(v @ Value::Number(_)) = serde_json::from_str::<Value>(raw) {
                return v;
            }
        }
        Some(Value::Object(_)) => {
            if let Ok(v @ Value::Object(_)) = serde_json::from_str::<Value>(raw) {
                return v;
            }
        }
        _ => {}
    }
    Value::String(raw.to_string())
}

fn get_path_value<'v>(root: &'v Value, path: &[String]) -> Option<&'v Value> {
    path.iter()
        .try_fold(root, |current, segment| current.get(segment.as_str()))
}

fn set_path_value(root: &mut Value, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        *root = value;
        return;
    };

    let mut current = root;
    for segment in parents {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        current = map
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    if let Some(map) = current.as_object_mut() {
        map.insert(last.clone(), value);
    }
}

fn apply_alias_overrides(config: &mut Value) {
    let aliases = [("CHAT_WIDGET_URL", "service.base_url")];

    for (env_key, target_path) in aliases {
        if let Ok(value) = std::env::var(env_key) {
            let path: Vec<String> = target_path.split('.').map(ToString::to_string).collect();
            set_path_value(config, &path, Value::String(value));
        }
    }
}

fn apply_path_overrides(config: &mut Value) {
    const PREFIX: &str = "CHAT_WIDGET__";
    for (key, value) in std::env::vars() {
        let Some(suffix) = key.strip_prefix(PREFIX) else {
            continue;
        };
        let segments: Vec<String> = suffix
            .split("__")
            .filter(|s| !s.is_empty())
            .map(|s| s.to_ascii_lowercase())
            .collect();
        if segments.is_empty() {
            continue;
        }
        let value = parse_env_value(&value, get_path_value(config, &segments));
        set_path_value(config, &segments, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::sync::{Mutex, MutexGuard};
    use tempfile::TempDir;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    struct EnvVarGuard {
        key: String,
        original: Option<String>,
    }

    impl EnvVarGuard {
        fn set(key: &str, value: &str) -> Self {
            let original = std::env::var(key).ok();
            // SAFETY: tests serialize env mutations with ENV_LOCK.
            unsafe { std::env::set_var(key, value) };
            Self {
                key: key.to_string(),
                original,
            }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.original {
                // SAFETY: tests serialize env mutations with ENV_LOCK.
                unsafe { std::env::set_var(&self.key, value) };
            } else {
                // SAFETY: tests serialize env mutations with ENV_LOCK.
                unsafe { std::env::remove_var(&self.key) };
            }
        }
    }

    fn lock_env() -> MutexGuard<'static, ()> {
        ENV_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[test]
    fn test_load_default_config() {
        let _lock = lock_env();
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());
        let config = loader.load().unwrap();

        assert_eq!(config.service.base_url, "http://localhost:8000");
        assert_eq!(config.session.storage_key, "chat_widget_session_id");
        assert!(config.widget.greeting.is_none());
    }

    #[test]
    fn test_load_applies_alias_env_override() {
        let _lock = lock_env();
        let _url_guard = EnvVarGuard::set("CHAT_WIDGET_URL", "https://answers.example.org");

        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());
        let config = loader.load().unwrap();

        assert_eq!(config.service.base_url, "https://answers.example.org");
    }

    #[test]
    fn test_load_applies_path_env_overrides() {
        let _lock = lock_env();
        let _persist_guard = EnvVarGuard::set("CHAT_WIDGET__SESSION__PERSIST", "false");
        let _key_guard = EnvVarGuard::set("CHAT_WIDGET__SESSION__STORAGE_KEY", "my_key");
        let _label_guard = EnvVarGuard::set("CHAT_WIDGET__WIDGET__SOURCES_LABEL", "Refs");

        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());
        let config = loader.load().unwrap();

        assert!(!config.session.persist);
        assert_eq!(config.session.storage_key, "my_key");
        assert_eq!(config.widget.sources_label, "Refs");
    }

    #[test]
    fn test_path_env_overrides_alias_and_file() {
        let _lock = lock_env();
        let _alias_guard = EnvVarGuard::set("CHAT_WIDGET_URL", "http://alias.local");
        let _path_guard = EnvVarGuard::set("CHAT_WIDGET__SERVICE__BASE_URL", "http://path.local");

        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());

        std::fs::write(
            temp_dir.path().join("config.json"),
            r#"{"service":{"base_url":"http://file.local"}}"#,
        )
        .unwrap();

        let config = loader.load().unwrap();
        assert_eq!(config.service.base_url, "http://path.local");
    }

    #[test]
    fn test_file_values_merge_over_defaults() {
        let _lock = lock_env();
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());

        std::fs::write(
            temp_dir.path().join("config.json"),
            r#"{"widget":{"fallback_message":"Try again later"}}"#,
        )
        .unwrap();

        let config = loader.load().unwrap();
        assert_eq!(config.widget.fallback_message, "Try again later");
        assert_eq!(config.widget.sources_label, "Sources:");
    }

    #[test]
    fn test_validation_rejects_bad_base_url() {
        let _lock = lock_env();
        let _url_guard = EnvVarGuard::set("CHAT_WIDGET__SERVICE__BASE_URL", "localhost:8000");

        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());
        let err = loader.load().unwrap_err();
        assert!(err.to_string().contains("service.base_url"));
    }

    #[test]
    fn test_file_greeting_is_loaded() {
        let _lock = lock_env();
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("config.json"),
            r#"{"widget":{"greeting":"Welcome"}}"#,
        )
        .unwrap();

        let config = ConfigLoader::with_dir(temp_dir.path()).load().unwrap();
        assert_eq!(config.widget.greeting.as_deref(), Some("Welcome"));
    }

    #[test]
    fn test_string_overrides_keep_literal_text() {
        let _lock = lock_env();
        let _key_guard = EnvVarGuard::set("CHAT_WIDGET__SESSION__STORAGE_KEY", "2024");
        let _fallback_guard = EnvVarGuard::set("CHAT_WIDGET__WIDGET__FALLBACK_MESSAGE", "true");
        let _greeting_guard = EnvVarGuard::set("CHAT_WIDGET__WIDGET__GREETING", "null");

        let temp_dir = TempDir::new().unwrap();
        let config = ConfigLoader::with_dir(temp_dir.path()).load().unwrap();

        assert_eq!(config.session.storage_key, "2024");
        assert_eq!(config.widget.fallback_message, "true");
        assert_eq!(config.widget.greeting.as_deref(), Some("null"));
    }

    #[test]
    fn test_parse_env_value_follows_existing_type() {
        assert_eq!(
            parse_env_value("TRUE", Some(&Value::Bool(false))),
            Value::Bool(true)
        );
        assert_eq!(
            parse_env_value("42", Some(&serde_json::json!(1))),
            serde_json::json!(42)
        );
        assert_eq!(
            parse_env_value(r#"{"a":"b"}"#, Some(&serde_json::json!({}))),
            serde_json::json!({"a": "b"})
        );
        assert_eq!(
            parse_env_value("42", Some(&Value::String("x".to_string()))),
            Value::String("42".to_string())
        );
        assert_eq!(parse_env_value("42", None), Value::String("42".to_string()));
        // a value that does not fit is passed through for serde to report
        assert_eq!(
            parse_env_value("yes", Some(&Value::Bool(true))),
            Value::String("yes".to_string())
        );
    }
}
