//! Configuration schema definitions using serde.

use lexload_common::logging::LoggingConfig;
use lexload_common::LexloadError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use unic_langid::LanguageIdentifier;

/// Main configuration structure for lexload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Resource loading configuration.
    pub resources: ResourcesConfig,
    /// Bundle engine configuration.
    pub engine: EngineConfig,
    /// Logging configuration.
    pub logging: LogSettings,
}

/// Where bundles come from and which namespaces are special.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcesConfig {
    /// Root directory laid out as `<language>/<namespace>.json`.
    pub locales_dir: PathBuf,
    /// Namespaces loaded eagerly at startup.
    pub preload_namespaces: Vec<String>,
    /// Namespace preserved by a registry-wide clear.
    pub reserved_namespace: String,
}

/// Bundle engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Language active at startup.
    pub default_language: String,
    /// Language consulted when a message is missing from the active one.
    pub fallback_language: Option<String>,
    /// Pause after applying a namespace before the engine is re-checked, in milliseconds.
    /// Zero yields to the scheduler once instead of sleeping.
    pub settle_tick_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Log level filter.
    pub level: String,
    /// Whether to emit one JSON object per log event.
    pub json_format: bool,
    /// Optional file path for log output.
    pub file_path: Option<String>,
}

impl EngineConfig {
    /// The settle tick as a [`Duration`].
    #[must_use]
    pub const fn settle_tick(&self) -> Duration {
        Duration::from_millis(self.settle_tick_ms)
    }
}

impl From<&LogSettings> for LoggingConfig {
    fn from(settings: &LogSettings) -> Self {
        Self {
            level: settings.level.clone(),
            json_format: settings.json_format,
            pretty_format: !settings.json_format,
            file_path: settings.file_path.clone(),
            ..Self::default()
        }
    }
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first offending field.
    pub fn validate(&self) -> Result<(), LexloadError> {
        validate_language(&self.engine.default_language, "engine.default_language")?;

        if let Some(fallback) = &self.engine.fallback_language {
            validate_language(fallback, "engine.fallback_language")?;
        }

        validate_namespace(&self.resources.reserved_namespace, "resources.reserved_namespace")?;

        for namespace in &self.resources.preload_namespaces {
            validate_namespace(namespace, "resources.preload_namespaces")?;
        }

        if self.resources.locales_dir.as_os_str().is_empty() {
            return Err(LexloadError::validation_field(
                "Locales directory cannot be empty",
                "resources.locales_dir",
            ));
        }

        Ok(())
    }
}

fn validate_language(tag: &str, field: &str) -> Result<(), LexloadError> {
    tag.parse::<LanguageIdentifier>().map(|_| ()).map_err(|e| {
        LexloadError::validation_field(format!("Invalid language tag '{tag}': {e}"), field)
    })
}

fn validate_namespace(namespace: &str, field: &str) -> Result<(), LexloadError> {
    if namespace.is_empty() || namespace.trim() != namespace {
        return Err(LexloadError::validation_field(
            format!("Invalid namespace '{namespace}': must be non-empty and trimmed"),
            field,
        ));
    }
    Ok(())
}
