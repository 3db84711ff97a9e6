//! Integration tests for lexload-config crate.

use lexload_common::test_utils::capture_logs;
use lexload_config::{Config, ConfigCache, ConfigLoader, ConfigValidator};
use std::path::PathBuf;

#[test]
fn test_default_config_validation() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.resources.reserved_namespace, "common");
    assert_eq!(config.engine.default_language, "en");
}

#[test]
fn test_invalid_fallback_language() {
    let mut config = Config::default();
    config.engine.fallback_language = Some("??".to_string());
    assert!(ConfigValidator::validate(&config).is_err());
}

#[test]
fn test_validate_with_warnings_reports_missing_dir() {
    let mut config = Config::default();
    config.resources.locales_dir = PathBuf::from("/definitely/not/here");

    let warnings = ConfigValidator::validate_with_warnings(&config).unwrap();
    assert!(warnings.iter().any(|w| w.contains("does not exist")));
    assert!(warnings.iter().any(|w| w.contains("Fallback language")));
}

#[test]
fn test_validate_with_warnings_logs_each_warning_once() {
    let mut config = Config::default();
    config.resources.locales_dir = PathBuf::from("/definitely/not/here");

    let (warnings, logs) = capture_logs(|| ConfigValidator::validate_with_warnings(&config).unwrap());

    let logged: Vec<&str> = logs.lines().filter(|line| line.contains("WARN")).collect();
    assert_eq!(warnings.len(), 2);
    assert_eq!(logged.len(), warnings.len(), "{logs}");
    for warning in &warnings {
        assert_eq!(logged.iter().filter(|line| line.contains(warning.as_str())).count(), 1);
    }
}

#[test]
fn test_config_cache() {
    let config = Config::default();
    let cache = ConfigCache::new(config.clone());

    let cached_config = cache.get();
    assert_eq!(cached_config.engine.default_language, config.engine.default_language);

    let mut new_config = config;
    new_config.engine.default_language = "fr".to_string();
    let previous = cache.update(new_config);
    assert_eq!(previous.engine.default_language, "en");
    assert!(std::sync::Arc::ptr_eq(&previous, &cached_config));
    assert_eq!(cache.get().engine.default_language, "fr");

    let previous = cache.modify(|c| c.engine.settle_tick_ms = 5);
    assert_eq!(previous.engine.settle_tick_ms, 0);
    assert_eq!(cache.get().engine.settle_tick_ms, 5);
    assert_eq!(cache.get().engine.default_language, "fr");
}

#[tokio::test]
async fn test_yaml_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let loader = ConfigLoader::new(dir.path().join("lexload.yaml"));

    let mut config = Config::default();
    config.resources.preload_namespaces = vec!["common".to_string(), "settings".to_string()];
    config.engine.default_language = "de".to_string();

    loader.save(&config).await.unwrap();
    let loaded = loader.load().await.unwrap();
    assert_eq!(loaded, config);
}

#[tokio::test]
async fn test_partial_toml_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lexload.toml");
    tokio::fs::write(&path, "[engine]\ndefault_language = \"es\"\n").await.unwrap();

    let loaded = ConfigLoader::new(&path).load().await.unwrap();
    assert_eq!(loaded.engine.default_language, "es");
    assert_eq!(loaded.engine.fallback_language.as_deref(), Some("en"));
    assert_eq!(loaded.resources.reserved_namespace, "common");
}

#[tokio::test]
async fn test_invalid_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lexload.yaml");
    tokio::fs::write(&path, "engine:\n  default_language: \"not a tag\"\n").await.unwrap();

    assert!(ConfigLoader::new(&path).load().await.is_err());
}

#[tokio::test]
async fn test_missing_file_is_io_error() {
    let loader = ConfigLoader::new("/definitely/not/here/lexload.yaml");
    let err = loader.load().await.unwrap_err();
    assert!(err.to_string().contains("I/O error"));
}
