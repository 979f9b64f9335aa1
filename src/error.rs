//! Error handling for the signal relay
//!
//! This module defines the relay's error type and a Result alias for use
//! throughout the crate.
//!
//! [`RelayError::is_fatal`] decides which errors end a worker task.
//! Malformed and unknown messages are recovered by the consumer, which
//! drops the message and keeps running.

use thiserror::Error;

/// Main error type for relay operations
#[derive(Error, Debug)]
pub enum RelayError {
    /// The message is not a single-key mapping with an integer value
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// The decoded parameter name is not one of the known signals
    #[error("Unknown parameter: {0:?}")]
    UnknownParameter(String),

    /// The channel was closed while a task was using it
    #[error("Channel closed")]
    ChannelClosed,

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// A worker thread panicked or could not be spawned
    #[error("Worker error: {0}")]
    Worker(String),
}

impl RelayError {
    /// Whether this error ends the task that hit it
    pub fn is_fatal(&self) -> bool {
        matches!(self, RelayError::ChannelClosed | RelayError::Worker(_))
    }
}

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;
