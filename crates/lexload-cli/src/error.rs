//! Application-wide error types using thiserror.

use lexload_common::LexloadError;
use lexload_i18n::ResourceError;

/// Main application error type.
#[derive(thiserror::Error, Debug)]
pub enum CliError {
    /// Configuration or logging setup error.
    #[error("Configuration error: {0}")]
    Config(#[from] LexloadError),

    /// Registry or loading error.
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// The command line asked for something unusable.
    #[error("Usage error: {0}")]
    Usage(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the command-line application.
pub type CliResult<T> = Result<T, CliError>;
