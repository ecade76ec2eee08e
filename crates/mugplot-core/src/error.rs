//! Error handling for mugplot
//!
//! Provides error types for each layer of the application:
//! - Connection errors (serial transport)
//! - Import errors (SVG parsing)
//! - Configuration errors (loading and validation)
//!
//! Controller-side faults (`error:` and `ALARM:` responses) are not errors here.
//! They are collected into the stream summary so a caller always gets a result.

use thiserror::Error;

/// Connection error type
///
/// Represents failures of the byte channel to the controller.
/// None of these are retried: recovering requires an explicit reconnect.
#[derive(Error, Debug, Clone)]
pub enum ConnectionError {
    /// An operation needing an open channel was called without one
    #[error("Not connected: call connect() first")]
    NotConnected,

    /// Failed to open port
    #[error("Failed to open port {port}: {reason}")]
    FailedToOpen {
        /// The name of the port that failed to open.
        port: String,
        /// The reason the port failed to open.
        reason: String,
    },

    /// I/O error on an open channel
    #[error("I/O error: {reason}")]
    Io {
        /// The reason for the I/O error.
        reason: String,
    },

    /// A program line cannot fit in the controller's receive buffer
    #[error("Line {line} is {len} bytes, receive buffer holds {capacity}")]
    LineTooLong {
        /// 1-based line number in the program.
        line: usize,
        /// Line length including the terminator.
        len: usize,
        /// Configured receive buffer size.
        capacity: usize,
    },
}

/// SVG import error type
#[derive(Error, Debug, Clone)]
pub enum ImportError {
    /// Source file does not exist
    #[error("SVG file not found: {path}")]
    FileNotFound {
        /// The path that was looked up.
        path: String,
    },

    /// The document is not well-formed XML
    #[error("Invalid SVG markup: {reason}")]
    Xml {
        /// The parser message.
        reason: String,
    },

    /// A `d` attribute or point list could not be parsed
    #[error("Invalid path data in <{element}>: {reason}")]
    PathData {
        /// The element carrying the bad data.
        element: String,
        /// The parser message.
        reason: String,
    },

    /// No root `<svg>` element was found
    #[error("Invalid SVG: missing <svg> element")]
    MissingSvgElement,
}

/// Configuration error type
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    /// A setting violates its invariant
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting {
        /// Dotted key of the setting, e.g. `machine.bed_width`.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The file extension is not a supported format
    #[error("Unsupported config format: {0} (expected .toml or .json)")]
    UnsupportedFormat(String),

    /// The file could not be parsed
    #[error("Failed to parse config {path}: {reason}")]
    Parse {
        /// The config file path.
        path: String,
        /// The parser message.
        reason: String,
    },

    /// An explicitly requested file does not exist
    #[error("Config file not found: {0}")]
    NotFound(String),
}

/// Main error type for mugplot
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// SVG import error
    #[error(transparent)]
    Import(#[from] ImportError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Shorthand for an invalid setting
    pub fn invalid_setting(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Config(ConfigError::InvalidSetting {
            key: key.into(),
            reason: reason.into(),
        })
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Check if this is an import error
    pub fn is_import_error(&self) -> bool {
        matches!(self, Error::Import(_))
    }

    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
