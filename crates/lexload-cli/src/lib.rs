//! # Lexload CLI
//!
//! Loads namespaces from a locales directory through the de-duplicating
//! coordinator and reports how each one settled.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod error;

pub use app::*;
pub use error::*;
