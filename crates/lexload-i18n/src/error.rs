//! Error types for resource loading operations

use std::error::Error;
use std::sync::Arc;
use thiserror::Error;

/// A loader's own failure, opaque to the coordinator.
///
/// Shared behind an `Arc` so every caller joined on the same fetch receives
/// the very same error value.
pub type LoadError = Arc<dyn Error + Send + Sync>;

/// Errors that can occur while registering loaders or loading bundles
#[deny(missing_docs)]
#[derive(Error, Debug, Clone)]
pub enum ResourceError {
    /// A registry call received a malformed argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong with the argument.
        message: String,
        /// Name of the offending argument.
        field: Option<String>,
    },

    /// A cold-start fetch found no loader for the namespace
    #[error("No loader registered for namespace '{namespace}'")]
    NoLoaderRegistered {
        /// The namespace that was requested.
        namespace: String,
    },

    /// The loader rejected
    #[error("Failed to load namespace '{namespace}' for language '{language}': {source}")]
    LoadFailure {
        /// Namespace being loaded.
        namespace: String,
        /// Language being loaded.
        language: String,
        /// The loader's own error, shared by every joined caller.
        #[source]
        source: LoadError,
    },

    /// The task driving the loader panicked before producing a result
    #[error("Loader for namespace '{namespace}' and language '{language}' panicked")]
    LoaderPanicked {
        /// Namespace being loaded.
        namespace: String,
        /// Language being loaded.
        language: String,
    },

    /// The bundle engine refused to apply a bundle
    #[error("Bundle engine error: {message}")]
    Engine {
        /// What the engine reported.
        message: String,
    },
}

impl ResourceError {
    /// Create an invalid-argument error for the given field
    pub fn invalid_argument(msg: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a load failure wrapping the loader's error
    pub fn load_failure(namespace: &str, language: &str, source: LoadError) -> Self {
        Self::LoadFailure {
            namespace: namespace.to_string(),
            language: language.to_string(),
            source,
        }
    }

    /// Create an engine error
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine {
            message: msg.into(),
        }
    }

    /// The loader's own error, for load failures
    #[must_use]
    pub fn load_error(&self) -> Option<&LoadError> {
        match self {
            Self::LoadFailure { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type for resource operations
pub type ResourceResult<T> = Result<T, ResourceError>;

/// Wraps any error as a [`LoadError`].
pub fn load_error(err: impl Error + Send + Sync + 'static) -> LoadError {
    Arc::new(err)
}

/// Builds a [`LoadError`] from a plain message, e.g. `load_error_msg("network")`.
pub fn load_error_msg(msg: impl Into<String>) -> LoadError {
    Arc::new(MessageError(msg.into()))
}

#[derive(Debug)]
struct MessageError(String);

impl std::fmt::Display for MessageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for MessageError {}
