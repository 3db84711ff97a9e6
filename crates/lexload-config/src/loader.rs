//! Configuration loading and persistence with atomic file operations.

use crate::schema::Config;
use lexload_common::{LexloadError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable overriding `resources.locales_dir`.
pub const ENV_LOCALES_DIR: &str = "LEXLOAD_LOCALES_DIR";
/// Environment variable overriding `engine.default_language`.
pub const ENV_LANGUAGE: &str = "LEXLOAD_LANGUAGE";
/// Environment variable overriding `logging.level`.
pub const ENV_LOG: &str = "LEXLOAD_LOG";

/// On-disk configuration format, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.yaml` / `.yml`
    Yaml,
    /// `.toml`
    Toml,
}

impl ConfigFormat {
    /// Detects the format from a path's extension.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unknown or missing extensions.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            other => Err(LexloadError::config(format!(
                "Unsupported configuration format {other:?} for {}",
                path.display()
            ))),
        }
    }

    fn parse(self, content: &str) -> Result<Config> {
        match self {
            Self::Yaml => Ok(serde_yaml::from_str(content)?),
            Self::Toml => Ok(toml::from_str(content)?),
        }
    }

    fn render(self, config: &Config) -> Result<String> {
        match self {
            Self::Yaml => serde_yaml::to_string(config)
                .map_err(|e| LexloadError::serialization_with_source("YAML serialization error", e)),
            Self::Toml => Ok(toml::to_string_pretty(config)?),
        }
    }
}

/// Configuration loader with atomic file operations.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path this loader reads from and writes to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and validates configuration from file.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, parse errors, or validation errors.
    pub async fn load(&self) -> Result<Config> {
        let format = ConfigFormat::from_path(&self.path)?;
        debug!("Loading configuration from {}", self.path.display());

        let content = tokio::fs::read_to_string(&self.path).await?;
        let config = format.parse(&content)?;
        config.validate()?;

        info!("Loaded configuration from {}", self.path.display());
        Ok(config)
    }

    /// Saves configuration to file atomically.
    ///
    /// # Errors
    ///
    /// Fails on serialization or I/O errors.
    pub async fn save(&self, config: &Config) -> Result<()> {
        let format = ConfigFormat::from_path(&self.path)?;
        let rendered = format.render(config)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomically(&path, rendered.as_bytes()))
            .await
            .map_err(|e| LexloadError::with_source("Configuration writer task failed", e))??;

        info!("Saved configuration to {}", self.path.display());
        Ok(())
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| LexloadError::Io(e.error))?;
    Ok(())
}

/// Applies `LEXLOAD_*` environment overrides on top of a configuration.
pub fn apply_env_overrides(config: &mut Config) {
    apply_overrides(config, |key| std::env::var(key).ok());
}

/// Applies overrides from an arbitrary lookup, so tests need not touch the
/// process environment.
pub fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(dir) = lookup(ENV_LOCALES_DIR) {
        config.resources.locales_dir = PathBuf::from(dir);
    }
    if let Some(language) = lookup(ENV_LANGUAGE) {
        config.engine.default_language = language;
    }
    if let Some(level) = lookup(ENV_LOG) {
        config.logging.level = level;
    }
}
