//! Loader trait and the directory-backed loader.

use crate::error::{load_error, LoadError};
use futures::future::BoxFuture;
use futures::FutureExt;
use lexload_common::Bundle;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Fetches the bundle for one `(namespace, language)` pair.
///
/// The returned future is `'static` so it can be driven on its own task,
/// independent of whoever asked for it.
pub trait ResourceLoader: Send + Sync {
    /// Starts fetching the bundle.
    fn load(&self, namespace: &str, language: &str) -> BoxFuture<'static, Result<Bundle, LoadError>>;
}

impl<F, Fut> ResourceLoader for F
where
    F: Fn(String, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Bundle, LoadError>> + Send + 'static,
{
    fn load(&self, namespace: &str, language: &str) -> BoxFuture<'static, Result<Bundle, LoadError>> {
        self(namespace.to_string(), language.to_string()).boxed()
    }
}

/// Reads bundles from `<root>/<language>/<namespace>.json`.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    /// Create a loader rooted at the given locales directory
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the root directory for resources
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing a `(namespace, language)` pair
    #[must_use]
    pub fn resource_path(&self, namespace: &str, language: &str) -> PathBuf {
        self.root.join(language).join(format!("{namespace}.json"))
    }
}

impl ResourceLoader for DirectoryLoader {
    fn load(&self, namespace: &str, language: &str) -> BoxFuture<'static, Result<Bundle, LoadError>> {
        let path = self.resource_path(namespace, language);

        async move {
            debug!("Loading resource file: {:?}", path);

            let content = tokio::fs::read(&path).await.map_err(load_error)?;
            let bundle: Bundle = serde_json::from_slice(&content).map_err(load_error)?;
            Ok(bundle)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexload_common::test_utils::create_test_locales;

    #[tokio::test]
    async fn test_directory_loader_reads_bundle() {
        let dir = create_test_locales(&["settings"], &["en", "de"]);
        let loader = DirectoryLoader::new(dir.path());

        let bundle = loader.load("settings", "de").await.unwrap();
        assert_eq!(bundle.message("menu.open"), Some("Öffnen"));
    }

    #[tokio::test]
    async fn test_directory_loader_missing_file() {
        let dir = create_test_locales(&["settings"], &["en"]);
        let loader = DirectoryLoader::new(dir.path());

        let err = loader.load("settings", "fr").await.unwrap_err();
        assert!(err.downcast_ref::<std::io::Error>().is_some());
    }

    #[tokio::test]
    async fn test_directory_loader_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("en")).unwrap();
        std::fs::write(dir.path().join("en/broken.json"), "{ nope").unwrap();

        let loader = DirectoryLoader::new(dir.path());
        let err = loader.load("broken", "en").await.unwrap_err();
        assert!(err.downcast_ref::<serde_json::Error>().is_some());
    }

    #[tokio::test]
    async fn test_closure_loader() {
        let loader = |namespace: String, language: String| async move {
            Ok::<_, LoadError>(Bundle::new(serde_json::json!({ "key": format!("{namespace}:{language}") })))
        };

        let bundle = ResourceLoader::load(&loader, "foo", "en").await.unwrap();
        assert_eq!(bundle.message("key"), Some("foo:en"));
    }
}
