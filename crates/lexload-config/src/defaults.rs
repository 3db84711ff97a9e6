//! Default values for every configuration section.

use crate::schema::*;
use lexload_common::COMMON_NAMESPACE;
use std::path::PathBuf;

impl Default for Config {
    fn default() -> Self {
        Self {
            resources: ResourcesConfig::default(),
            engine: EngineConfig::default(),
            logging: LogSettings::default(),
        }
    }
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            locales_dir: PathBuf::from("locales"),
            preload_namespaces: vec![COMMON_NAMESPACE.to_string()],
            reserved_namespace: COMMON_NAMESPACE.to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            fallback_language: Some("en".to_string()),
            settle_tick_ms: 0,
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            file_path: None,
        }
    }
}
