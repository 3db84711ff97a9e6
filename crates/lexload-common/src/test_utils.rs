//! Test utilities and shared test helpers for lexload.
//!
//! This module provides common testing utilities and fixtures that can be
//! used across all crates in the workspace for unit and integration testing.

use crate::Bundle;
use serde_json::json;
use std::io;
use std::sync::{Arc, Mutex, Once};
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize test logging once per test run.
static INIT: Once = Once::new();

/// Initialize logging for tests with a sensible default configuration.
/// This function is safe to call multiple times and will only initialize once.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// In-memory sink for formatted log lines.
#[derive(Debug, Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    /// Everything written so far.
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().map(|bytes| bytes.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut bytes) = self.0.lock() {
            bytes.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a subscriber scoped to the current thread and returns its
/// result together with the plain-text log output.
///
/// Tasks spawned on a current-thread runtime built inside `f` log into the
/// same buffer.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = fmt()
        .with_writer(move || writer.clone())
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    (result, buffer.contents())
}

/// Bundle fixtures shared by the i18n and CLI tests.
pub mod bundle_fixtures {
    use super::*;

    /// A tiny greeting bundle, `{ "greeting": "hi" }`.
    pub fn greeting_bundle() -> Bundle {
        Bundle::new(json!({ "greeting": "hi" }))
    }

    /// A nested bundle resembling a real namespace file.
    pub fn sample_bundle(language: &str) -> Bundle {
        let (title, open) = match language {
            "de" => ("Willkommen", "Öffnen"),
            "es" => ("Bienvenido", "Abrir"),
            _ => ("Welcome", "Open"),
        };

        Bundle::new(json!({
            "title": title,
            "menu": { "open": open },
        }))
    }
}

/// Create a temporary locales directory laid out as
/// `<root>/<language>/<namespace>.json`.
#[cfg(feature = "tempfile")]
pub fn create_test_locales(namespaces: &[&str], languages: &[&str]) -> tempfile::TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temporary directory");

    for language in languages {
        let dir = temp_dir.path().join(language);
        std::fs::create_dir_all(&dir).expect("Failed to create locale directory");

        for namespace in namespaces {
            let bundle = bundle_fixtures::sample_bundle(language);
            std::fs::write(
                dir.join(format!("{namespace}.json")),
                serde_json::to_vec_pretty(&bundle).expect("Failed to serialize bundle"),
            )
            .expect("Failed to write bundle file");
        }
    }

    temp_dir
}

/// Property-based testing utilities using proptest.
#[cfg(feature = "proptest")]
pub mod property_testing {
    use proptest::prelude::*;

    /// Strategy for generating well-formed namespace names.
    pub fn namespace_strategy() -> impl Strategy<Value = String> {
        r"[a-z][a-z0-9_-]{0,15}".prop_map(|s| s.to_string())
    }

    /// Strategy for generating simple language tags such as `en` or `pt-BR`.
    pub fn language_strategy() -> impl Strategy<Value = String> {
        r"[a-z]{2}(-[A-Z]{2})?".prop_map(|s| s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_multiple_calls() {
        // Should not panic when called multiple times
        init_test_logging();
        init_test_logging();
        init_test_logging();
    }

    #[test]
    fn test_capture_logs_collects_events() {
        let (value, logs) = capture_logs(|| {
            tracing::warn!(namespace = "foo", "something odd");
            7
        });

        assert_eq!(value, 7);
        assert!(logs.contains("WARN"));
        assert!(logs.contains("something odd namespace=\"foo\""));
    }

    #[test]
    fn test_sample_bundle_is_language_specific() {
        let en = bundle_fixtures::sample_bundle("en");
        let de = bundle_fixtures::sample_bundle("de");
        assert_eq!(en.message("menu.open"), Some("Open"));
        assert_eq!(de.message("menu.open"), Some("Öffnen"));
    }

    #[cfg(feature = "tempfile")]
    #[test]
    fn test_create_test_locales_layout() {
        let dir = create_test_locales(&["common", "settings"], &["en", "de"]);
        assert!(dir.path().join("en/common.json").exists());
        assert!(dir.path().join("de/settings.json").exists());
    }
}
