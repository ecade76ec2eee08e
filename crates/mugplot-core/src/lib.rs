//! # mugplot Core
//!
//! Error types and shared aliases used by every mugplot crate.
//! The other crates depend on this one and nothing else in the workspace.

pub mod error;
pub mod types;

pub use error::{ConfigError, ConnectionError, Error, ImportError, Result};
pub use types::ProgressFn;
