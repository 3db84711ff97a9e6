//! Wiring of the resource store, engine and controllers for one run.

use crate::error::{CliError, CliResult};
use futures::future::join_all;
use lexload_config::{Config, ConfigCache};
use lexload_i18n::{
    BundleEngine, ConsumerState, DirectoryLoader, LoadController, MemoryEngine, ResourceCoordinator,
    ResourceStore, SharedLoader,
};
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// How one namespace settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceReport {
    /// The namespace that was loaded.
    pub namespace: String,
    /// Final controller state.
    pub state: ConsumerState,
    /// Error message when the load failed.
    pub error: Option<String>,
}

impl NamespaceReport {
    /// Whether the namespace ended up ready.
    pub fn ready(&self) -> bool {
        self.state.ready()
    }
}

impl fmt::Display for NamespaceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: ", self.namespace, self.state.current_language)?;
        match &self.error {
            Some(error) => write!(f, "failed ({error})"),
            None if self.ready() => f.write_str("ready"),
            None => write!(f, "{:?}", self.state.phase),
        }
    }
}

/// Owns everything a run needs: configuration, store, engine and coordinator.
///
/// Each run reads a fresh configuration snapshot, so
/// [`update_config`](Self::update_config) takes effect on the next run.
pub struct App {
    config: ConfigCache,
    store: ResourceStore,
    engine: Arc<MemoryEngine>,
    coordinator: Arc<ResourceCoordinator>,
}

impl App {
    /// Builds the application from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] when the configuration does not validate.
    pub fn new(config: Config) -> CliResult<Self> {
        config.validate()?;

        let store = ResourceStore::with_reserved_namespace(config.resources.reserved_namespace.clone());
        let mut engine = MemoryEngine::new(config.engine.default_language.clone());
        if let Some(fallback) = &config.engine.fallback_language {
            engine = engine.with_fallback(fallback.clone());
        }
        let engine = Arc::new(engine);
        let coordinator = store.coordinator(engine.clone());

        Ok(Self {
            config: ConfigCache::new(config),
            store,
            engine,
            coordinator,
        })
    }

    /// Preload namespaces followed by `requested`, without duplicates.
    pub fn namespaces(&self, requested: &[String]) -> Vec<String> {
        let mut namespaces: Vec<String> = Vec::new();
        let config = self.config.get();
        for namespace in config.resources.preload_namespaces.iter().chain(requested) {
            if !namespaces.contains(namespace) {
                namespaces.push(namespace.clone());
            }
        }
        namespaces
    }

    /// Registers one directory loader, rooted at the configured locales
    /// directory, for every namespace.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Resource`] for a malformed namespace name.
    pub fn register_namespaces(&self, namespaces: &[String]) -> CliResult<()> {
        let loader: SharedLoader = Arc::new(DirectoryLoader::new(&self.config.get().resources.locales_dir));
        for namespace in namespaces {
            self.store.registry().register(namespace, Arc::clone(&loader))?;
        }
        Ok(())
    }

    /// Loads the preload namespaces and `requested` for the active language,
    /// one controller per namespace, and reports how each settled.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Usage`] when nothing was requested, or a resource
    /// error when a namespace name is malformed. Failed loads are reported,
    /// not returned as errors.
    #[instrument(skip(self))]
    pub async fn run(&self, requested: &[String]) -> CliResult<Vec<NamespaceReport>> {
        if requested.is_empty() {
            return Err(CliError::Usage("at least one namespace is required".to_string()));
        }

        let config = self.config.get();
        let namespaces = self.namespaces(requested);
        self.register_namespaces(&namespaces)?;

        info!(
            "Loading {} namespaces for language '{}' from {:?}",
            namespaces.len(),
            self.engine.language(),
            config.resources.locales_dir
        );

        let settle_tick = config.engine.settle_tick();
        let controllers: Vec<LoadController> = namespaces
            .iter()
            .map(|namespace| {
                LoadController::mount_with_tick(namespace.clone(), Arc::clone(&self.coordinator), settle_tick)
            })
            .collect();

        let states = join_all(controllers.iter().map(LoadController::wait_settled)).await;

        let mut reports = Vec::with_capacity(controllers.len());
        for (controller, state) in controllers.into_iter().zip(states) {
            let error = controller.last_error().map(|err| err.to_string());
            match &error {
                Some(err) => warn!("Namespace '{}' failed: {}", controller.namespace(), err),
                None => info!("Namespace '{}' settled as {:?}", controller.namespace(), state.phase),
            }

            reports.push(NamespaceReport {
                namespace: controller.namespace().to_string(),
                state,
                error,
            });
            controller.unmount().await;
        }

        Ok(reports)
    }

    /// Makes `language` active. Returns `false` if it already was.
    pub fn switch_language(&self, language: &str) -> bool {
        self.engine.change_language(language)
    }

    /// Looks up a message in an applied namespace.
    pub fn translate(&self, namespace: &str, path: &str) -> Option<String> {
        self.engine.translate(namespace, path)
    }

    /// Validates and installs a new configuration, switching the engine to
    /// its default language. Returns whether the active language changed.
    ///
    /// The reserved namespace and the fallback language are fixed when the
    /// app is built.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] and keeps the current configuration when
    /// `config` does not validate.
    pub fn update_config(&self, config: Config) -> CliResult<bool> {
        config.validate()?;
        let language = config.engine.default_language.clone();
        self.config.update(config);
        info!("Configuration updated, default language '{}'", language);
        Ok(self.switch_language(&language))
    }

    /// Snapshot of the configuration in use
    pub fn config(&self) -> Arc<Config> {
        self.config.get()
    }

    /// The resource store
    pub const fn store(&self) -> &ResourceStore {
        &self.store
    }

    /// The in-memory bundle engine
    pub fn engine(&self) -> &Arc<MemoryEngine> {
        &self.engine
    }

    /// The coordinator shared by all controllers
    pub fn coordinator(&self) -> &Arc<ResourceCoordinator> {
        &self.coordinator
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
