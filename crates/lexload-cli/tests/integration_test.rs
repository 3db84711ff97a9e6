//! Integration tests for lexload-cli crate.
//!
//! These tests drive a full run against a temporary locales directory.

use lexload_cli::App;
use lexload_common::test_utils::{create_test_locales, init_test_logging};
use lexload_config::Config;
use lexload_i18n::{BundleEngine, LoadPhase};
use std::path::Path;
use std::time::Duration;
use tokio::time::timeout;

fn config_for(locales: &Path, language: &str) -> Config {
    let mut config = Config::default();
    config.resources.locales_dir = locales.to_path_buf();
    config.engine.default_language = language.to_string();
    config
}

fn namespaces(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

#[tokio::test]
async fn test_run_loads_requested_and_preloaded() {
    init_test_logging();
    let locales = create_test_locales(&["common", "settings"], &["en", "de"]);
    let app = App::new(config_for(locales.path(), "de")).unwrap();

    let reports = timeout(Duration::from_secs(5), app.run(&namespaces(&["settings"])))
        .await
        .unwrap()
        .unwrap();

    let loaded: Vec<&str> = reports.iter().map(|report| report.namespace.as_str()).collect();
    assert_eq!(loaded, vec!["common", "settings"]);
    assert!(reports.iter().all(|report| report.ready()));
    assert!(app.engine().has_bundle("de", "settings"));
    assert_eq!(app.translate("settings", "menu.open").as_deref(), Some("Öffnen"));
    assert_eq!(app.engine().listener_count(), 0);
}

#[tokio::test]
async fn test_missing_namespace_is_reported_as_failed() {
    init_test_logging();
    let locales = create_test_locales(&["common"], &["en"]);
    let app = App::new(config_for(locales.path(), "en")).unwrap();

    let reports = app.run(&namespaces(&["missing"])).await.unwrap();
    let missing = reports.iter().find(|report| report.namespace == "missing").unwrap();

    assert_eq!(missing.state.phase, LoadPhase::Failed);
    assert!(missing.error.is_some());
    assert!(missing.to_string().starts_with("missing [en]: failed"));
    assert!(reports.iter().any(|report| report.namespace == "common" && report.ready()));
}

#[tokio::test]
async fn test_fallback_language_fills_gaps() {
    init_test_logging();
    let locales = create_test_locales(&["common", "settings"], &["en", "es"]);
    let app = App::new(config_for(locales.path(), "en")).unwrap();
    app.run(&namespaces(&["settings"])).await.unwrap();

    assert!(app.switch_language("fr"));
    assert_eq!(app.translate("settings", "title").as_deref(), Some("Welcome"));
}

#[tokio::test]
async fn test_second_run_uses_cache() {
    init_test_logging();
    let locales = create_test_locales(&["common", "settings"], &["en"]);
    let app = App::new(config_for(locales.path(), "en")).unwrap();

    app.run(&namespaces(&["settings"])).await.unwrap();
    let misses = app.coordinator().cache().stats().misses;

    app.engine().reset();
    app.run(&namespaces(&["settings"])).await.unwrap();

    let stats = app.coordinator().cache().stats();
    assert_eq!(stats.misses, misses);
    assert_eq!(stats.hits, 2);
}
