//! Shared error definitions used across all tickface crates.

pub mod error;

pub use error::{Error, FromMessage, Result};
