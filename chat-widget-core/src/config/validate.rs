//! Configuration validation rules.

use super::schema::Config;

/// Validate configuration and return aggregated validation errors.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    let base_url = config.service.base_url.trim();
    if base_url.is_empty() {
        errors.push("service.base_url must not be empty".to_string());
    } else if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        errors.push("service.base_url must start with http:// or https://".to_string());
    }

    if config.session.storage_key.trim().is_empty() {
        errors.push("session.storage_key must not be empty".to_string());
    }
    if config.session.persist && config.session.storage_path.trim().is_empty() {
        errors.push("session.storage_path is required when session.persist is true".to_string());
    }

    if config.widget.fallback_message.trim().is_empty() {
        errors.push("widget.fallback_message must not be empty".to_string());
    }

    let format = config.logging.format.to_ascii_lowercase();
    if format != "text" && format != "json" {
        errors.push(format!(
            "logging.format must be 'text' or 'json', got '{}'",
            config.logging.format
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}
