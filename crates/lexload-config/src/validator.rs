//! Validation entry point shared by the loader and the CLI.

use crate::schema::Config;
use lexload_common::Result;
use std::path::Path;
use tracing::warn;

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn validate(config: &Config) -> Result<()> {
        config.validate()
    }

    /// Validates a configuration and warns about settings that are legal but
    /// probably unintended, such as a locales directory that does not exist.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn validate_with_warnings(config: &Config) -> Result<Vec<String>> {
        config.validate()?;

        let mut warnings = Vec::new();

        if !Path::new(&config.resources.locales_dir).is_dir() {
            warnings.push(format!(
                "Locales directory {} does not exist",
                config.resources.locales_dir.display()
            ));
        }

        if config.engine.fallback_language.as_deref() == Some(config.engine.default_language.as_str()) {
            warnings.push("Fallback language equals the default language".to_string());
        }

        for warning in &warnings {
            warn!("{}", warning);
        }

        Ok(warnings)
    }
}
