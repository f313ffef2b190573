//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration for chat-widget
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Answering service configuration
    #[serde(default)]
    pub service: ServiceConfig,
    /// Session token persistence
    #[serde(default)]
    pub session: SessionConfig,
    /// Fixed widget strings
    #[serde(default)]
    pub widget: WidgetConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote answering service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL; the chat endpoint is `{base_url}/chat`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_user_agent() -> String {
    format!("chat-widget/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
        }
    }
}

/// Session token persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Persist the token on disk; when false the token lives for one run only
    #[serde(default = "default_persist")]
    pub persist: bool,
    /// Key/value document holding the token
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    /// Key the token is stored under
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

fn default_persist() -> bool {
    true
}

fn default_storage_path() -> String {
    "~/.chat-widget/storage.json".to_string()
}

fn default_storage_key() -> String {
    "chat_widget_session_id".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            persist: default_persist(),
            storage_path: default_storage_path(),
            storage_key: default_storage_key(),
        }
    }
}

/// Fixed strings shown by the widget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Bot message shown when an exchange fails
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,
    /// Label above the citation list
    #[serde(default = "default_sources_label")]
    pub sources_label: String,
    /// Optional opening bot message
    #[serde(default)]
    pub greeting: Option<String>,
}

fn default_fallback_message() -> String {
    "Sorry, something went wrong. Please try again.".to_string()
}

fn default_sources_label() -> String {
    "Sources:".to_string()
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            fallback_message: default_fallback_message(),
            sources_label: default_sources_label(),
            greeting: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Directory for log files
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Module-specific overrides
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_dir() -> String {
    "~/.chat-widget/logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            dir: default_log_dir(),
            overrides: HashMap::new(),
        }
    }
}
