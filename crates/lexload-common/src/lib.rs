//! # Lexload Common
//!
//! Shared types, error handling, and logging bootstrap for lexload.
//!
//! This crate provides the foundational types used across all other crates
//! in the workspace: the [`CacheKey`] identifying a `(namespace, language)`
//! pair, the opaque [`Bundle`] payload, and the workspace error type.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use error::*;
pub use types::*;
