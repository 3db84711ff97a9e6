//! Per-consumer load state machine driven by language changes.

use crate::coordinator::ResourceCoordinator;
use crate::error::ResourceError;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Where a consumer's namespace stands for its current language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadPhase {
    /// Not activated yet.
    Idle,
    /// A load for the current language is running.
    Loading,
    /// The bundle for the current language is applied.
    Ready,
    /// The last load for the current language failed.
    Failed,
}

/// Snapshot of a consumer's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerState {
    /// Current phase.
    pub phase: LoadPhase,
    /// Last language seen from the engine.
    pub current_language: String,
}

impl ConsumerState {
    /// Whether a load is running.
    pub fn loading(&self) -> bool {
        self.phase == LoadPhase::Loading
    }

    /// Whether the bundle for the current language is applied.
    pub fn ready(&self) -> bool {
        self.phase == LoadPhase::Ready
    }

    const fn is_settled(&self) -> bool {
        matches!(self.phase, LoadPhase::Ready | LoadPhase::Failed)
    }
}

struct ControllerInner {
    namespace: String,
    coordinator: Arc<ResourceCoordinator>,
    state: watch::Sender<ConsumerState>,
    last_error: Mutex<Option<ResourceError>>,
    settle_tick: Duration,
}

impl ControllerInner {
    fn current_language(&self) -> String {
        self.state.borrow().current_language.clone()
    }

    /// Records `language` as current and starts loading it unless the engine
    /// already has it.
    fn switch_to(self: &Arc<Self>, language: String) {
        if self.coordinator.engine().has_bundle(&language, &self.namespace) {
            debug!(
                "Namespace '{}' already applied for '{}', ready",
                self.namespace, language
            );
            self.state.send_replace(ConsumerState {
                phase: LoadPhase::Ready,
                current_language: language,
            });
            return;
        }

        self.state.send_replace(ConsumerState {
            phase: LoadPhase::Loading,
            current_language: language.clone(),
        });

        let inner = Arc::clone(self);
        tokio::spawn(async move { inner.load(language).await });
    }

    fn on_language_changed(self: &Arc<Self>, language: String) {
        if self.state.borrow().current_language == language {
            return;
        }
        debug!("Consumer of '{}' observed language '{}'", self.namespace, language);
        self.switch_to(language);
    }

    async fn load(self: Arc<Self>, language: String) {
        let engine = self.coordinator.engine();

        match self.coordinator.ensure_bundle(&self.namespace, &language).await {
            Ok(bundle) => {
                if let Some(bundle) = bundle {
                    if let Err(err) = engine.apply_namespace(&self.namespace, &language, bundle).await {
                        warn!("Applying namespace '{}' for '{}' failed: {}", self.namespace, language, err);
                        self.fail(&language, err);
                        return;
                    }
                }

                if self.settle_tick.is_zero() {
                    tokio::task::yield_now().await;
                } else {
                    tokio::time::sleep(self.settle_tick).await;
                }

                // The language may have moved on while the fetch was running.
                let current = self.current_language();
                if engine.has_bundle(&current, &self.namespace) {
                    self.transition(&current, LoadPhase::Ready);
                } else if current == language {
                    self.fail(
                        &language,
                        ResourceError::engine(format!(
                            "namespace '{}' not present for '{}' after applying",
                            self.namespace, language
                        )),
                    );
                } else {
                    debug!(
                        "Ignoring completed load of '{}' for stale language '{}'",
                        self.namespace, language
                    );
                }
            }
            Err(err) => self.fail(&language, err),
        }
    }

    fn fail(&self, language: &str, err: ResourceError) {
        if self.transition(language, LoadPhase::Failed) {
            *self.last_error.lock() = Some(err);
        }
    }

    /// Moves `Loading` to `phase`, but only while `language` is still current.
    fn transition(&self, language: &str, phase: LoadPhase) -> bool {
        self.state.send_if_modified(|state| {
            if state.current_language == language && state.phase == LoadPhase::Loading {
                state.phase = phase;
                true
            } else {
                false
            }
        })
    }
}

/// Drives loading of one namespace for one consumer, following the engine's
/// active language.
///
/// The controller listens for language changes until it is dropped or
/// [`unmount`](Self::unmount)ed. Fetches it started keep running and still
/// fill the cache after teardown.
pub struct LoadController {
    inner: Arc<ControllerInner>,
    listener: JoinHandle<()>,
}

impl LoadController {
    /// Starts watching `namespace`. Must be called within a tokio runtime.
    pub fn mount(namespace: impl Into<String>, coordinator: Arc<ResourceCoordinator>) -> Self {
        Self::mount_with_tick(namespace, coordinator, Duration::ZERO)
    }

    /// Like [`mount`](Self::mount), pausing `settle_tick` after each apply
    /// before re-checking the engine.
    pub fn mount_with_tick(
        namespace: impl Into<String>,
        coordinator: Arc<ResourceCoordinator>,
        settle_tick: Duration,
    ) -> Self {
        // Subscribe before reading the language so no change is missed.
        let mut subscription = coordinator.engine().subscribe_language();
        let language = subscription.current();

        let (state, _) = watch::channel(ConsumerState {
            phase: LoadPhase::Idle,
            current_language: language.clone(),
        });

        let inner = Arc::new(ControllerInner {
            namespace: namespace.into(),
            coordinator,
            state,
            last_error: Mutex::new(None),
            settle_tick,
        });

        inner.switch_to(language);

        let listener = tokio::spawn({
            let inner = Arc::clone(&inner);
            async move {
                while let Some(language) = subscription.changed().await {
                    inner.on_language_changed(language);
                }
            }
        });

        Self { inner, listener }
    }

    /// The namespace being watched
    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    /// Current state snapshot
    pub fn state(&self) -> ConsumerState {
        self.inner.state.borrow().clone()
    }

    /// Current phase
    pub fn phase(&self) -> LoadPhase {
        self.inner.state.borrow().phase
    }

    /// Whether a load is running
    pub fn loading(&self) -> bool {
        self.inner.state.borrow().loading()
    }

    /// Whether the bundle for the current language is applied
    pub fn ready(&self) -> bool {
        self.inner.state.borrow().ready()
    }

    /// Last language seen from the engine
    pub fn current_language(&self) -> String {
        self.inner.current_language()
    }

    /// The error behind the most recent `Failed` transition
    pub fn last_error(&self) -> Option<ResourceError> {
        self.inner.last_error.lock().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<ConsumerState> {
        self.inner.state.subscribe()
    }

    /// Waits until the state is `Ready` or `Failed` and returns it.
    pub async fn wait_settled(&self) -> ConsumerState {
        let mut receiver = self.subscribe();
        let settled = receiver.wait_for(ConsumerState::is_settled).await;
        settled.map_or_else(|_| self.state(), |state| state.clone())
    }

    /// Tries the current language again, e.g. after a failure.
    pub fn reload(&self) {
        let language = self.inner.current_language();
        self.inner.switch_to(language);
    }

    /// Stops listening for language changes and waits for the listener to end.
    pub async fn unmount(mut self) {
        self.listener.abort();
        let _ = (&mut self.listener).await;
    }
}

impl Drop for LoadController {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

impl std::fmt::Debug for LoadController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadController")
            .field("namespace", &self.inner.namespace)
            .field("state", &self.state())
            .finish()
    }
}
