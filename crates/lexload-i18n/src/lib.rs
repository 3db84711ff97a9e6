//! # Lexload I18n
//!
//! On-demand loading of namespaced, language-scoped bundles with load
//! de-duplication.
//!
//! - [`LoaderRegistry`] maps a namespace to the loader that fetches it.
//! - [`ResourceCache`] holds completed bundles and in-flight fetches.
//! - [`ResourceCoordinator`] makes a bundle available, starting at most one
//!   fetch per `(namespace, language)` no matter how many callers ask.
//! - [`LoadController`] follows the engine's active language for one consumer
//!   and exposes `loading`/`ready`.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use lexload_common::Bundle;
//! use lexload_i18n::{LoadError, MemoryEngine, ResourceStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ResourceStore::new();
//! store.registry().register_fn("common", |_namespace, _language| async {
//!     Ok::<_, LoadError>(Bundle::new(serde_json::json!({ "greeting": "hi" })))
//! })?;
//!
//! let coordinator = store.coordinator(Arc::new(MemoryEngine::new("en")));
//! coordinator.ensure_resource_loaded("common", "en").await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod controller;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod loader;
pub mod registry;
pub mod store;

pub use cache::{CacheStats, Claim, InFlight, ResourceCache, SharedFetch};
pub use controller::{ConsumerState, LoadController, LoadPhase};
pub use coordinator::ResourceCoordinator;
pub use engine::{BundleEngine, LanguageSubscription, MemoryEngine};
pub use error::{load_error, load_error_msg, LoadError, ResourceError, ResourceResult};
pub use loader::{DirectoryLoader, ResourceLoader};
pub use registry::{LoaderRegistry, SharedLoader};
pub use store::ResourceStore;
