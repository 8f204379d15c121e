//! # Synchronization Error Types
//!
//! Structured error handling for the cluster event-synchronization engine using
//! thiserror instead of `Box<dyn Error>` patterns.
//!
//! The taxonomy mirrors the engine's failure boundaries: handler resolution,
//! payload encoding/decoding, local apply, transport send/receive, and
//! configuration loading.

use thiserror::Error;

/// Errors raised by the event-synchronization engine
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("no handler found for {lookup}")]
    NoHandlerFound { lookup: String },

    #[error("duplicate handler factory id: {handler_id}")]
    DuplicateHandlerId { handler_id: String },

    #[error("event serialization failed: {message}")]
    Serialization { message: String },

    #[error("payload deserialization failed: {message}")]
    Deserialization { message: String },

    #[error("unable to apply event: {message}")]
    Apply { message: String },

    #[error("transport failure: {message}")]
    Transport { message: String },

    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl SyncError {
    /// Resolution failure on the producer side: no registered factory accepted
    /// the event.
    pub fn no_handler_for_event(event_kind: impl Into<String>) -> Self {
        Self::NoHandlerFound {
            lookup: format!("event of type: {}", event_kind.into()),
        }
    }

    /// Resolution failure on the consumer side: no factory registered under
    /// the identifier carried by the message.
    pub fn no_handler_for_id(handler_id: impl Into<String>) -> Self {
        Self::NoHandlerFound {
            lookup: format!("handler id: {}", handler_id.into()),
        }
    }

    pub fn duplicate_handler_id(handler_id: impl Into<String>) -> Self {
        Self::DuplicateHandlerId {
            handler_id: handler_id.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::Deserialization {
            message: message.into(),
        }
    }

    pub fn apply(message: impl Into<String>) -> Self {
        Self::Apply {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether this error names a failed handler lookup (either resolution
    /// path).
    pub fn is_no_handler_found(&self) -> bool {
        matches!(self, Self::NoHandlerFound { .. })
    }
}

impl From<config::ConfigError> for SyncError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
