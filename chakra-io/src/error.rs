//! Error types for ChakraIO

use std::time::Duration;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// ChakraIO error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// The remote unit did not acknowledge a command in time
    #[error("Actuator timeout: {command} not acknowledged within {after:?}")]
    Timeout {
        /// Command that timed out
        command: String,
        /// Configured timeout
        after: Duration,
    },

    /// Link to the remote unit is gone
    #[error("Actuator disconnected: {0}")]
    Disconnected(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
