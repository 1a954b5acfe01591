//! Error types for seqthink.

use crate::validation::ValidationError;
use thiserror::Error;

/// A shared error type for the entire seqthink workspace.
///
/// Every failure is local to the operation that raised it: the session a
/// failing operation was applied to is left exactly as it was.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeqThinkError {
    /// Malformed, missing or out-of-range submission
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// A revise/branch operation referenced a thought number absent from the log
    #[error("Thought {number} not found")]
    ThoughtNotFound { number: u32 },

    /// Export or output requested in an unrecognized mode
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SeqThinkError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a ThoughtNotFound error
    pub fn thought_not_found(number: u32) -> Self {
        Self::ThoughtNotFound { number }
    }

    /// Creates an UnsupportedFormat error
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a ThoughtNotFound error
    pub fn is_thought_not_found(&self) -> bool {
        matches!(self, Self::ThoughtNotFound { .. })
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an UnsupportedFormat error
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, Self::UnsupportedFormat { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for SeqThinkError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for SeqThinkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for SeqThinkError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for SeqThinkError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for SeqThinkError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, SeqThinkError>`.
pub type Result<T> = std::result::Result<T, SeqThinkError>;
