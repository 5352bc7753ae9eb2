//! Error types for voxshift.

use thiserror::Error;

/// Coarse classification used to pick the HTTP status of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed request input (400).
    Validation,
    /// Unknown identifier (404).
    NotFound,
    /// Upload exceeds the configured size limit (413).
    PayloadTooLarge,
    /// Transcription or synthesis backend failure (500).
    Model,
    /// Anything else that is the server's fault (500).
    Internal,
}

#[derive(Error, Debug)]
pub enum VoxError {
    // Request validation errors
    #[error("{message}")]
    Validation { message: String },

    #[error("Unsupported audio format: {mime}")]
    UnsupportedFormat { mime: String },

    #[error("Text too long: {length} characters (limit {limit})")]
    TextTooLong { length: usize, limit: usize },

    #[error("Payload too large: {size} bytes (limit {limit})")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Request body too large: {message}")]
    BodyTooLarge { message: String },

    // Lookup errors
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    #[error("Invalid voice reference: {message}")]
    InvalidVoiceReference { message: String },

    // Engine errors
    #[error("Transcription failed: {message}")]
    Transcription { message: String },

    #[error("Synthesis failed: {message}")]
    Synthesis { message: String },

    #[error("Engine timed out after {secs}s")]
    Timeout { secs: f64 },

    // Job state errors
    #[error("Invalid job transition for {job_id}: {from} -> {to}")]
    InvalidTransition {
        job_id: String,
        from: String,
        to: String,
    },

    // Configuration errors
    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Client errors
    #[error("Failed to reach server: {message}")]
    Connection { message: String },

    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },

    // Storage errors
    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl VoxError {
    /// Shorthand for a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a not-found error.
    pub fn not_found(what: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            id: id.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VoxError::Validation { .. }
            | VoxError::UnsupportedFormat { .. }
            | VoxError::TextTooLong { .. } => ErrorKind::Validation,
            VoxError::PayloadTooLarge { .. } | VoxError::BodyTooLarge { .. } => {
                ErrorKind::PayloadTooLarge
            }
            VoxError::NotFound { .. } | VoxError::InvalidVoiceReference { .. } => {
                ErrorKind::NotFound
            }
            VoxError::Transcription { .. } | VoxError::Synthesis { .. } | VoxError::Timeout { .. } => {
                ErrorKind::Model
            }
            VoxError::InvalidTransition { .. }
            | VoxError::ConfigParse { .. }
            | VoxError::ConfigInvalidValue { .. }
            | VoxError::Config(_)
            | VoxError::Connection { .. }
            | VoxError::Server { .. }
            | VoxError::Storage { .. }
            | VoxError::Io(_)
            | VoxError::Json(_)
            | VoxError::Other(_) => ErrorKind::Internal,
        }
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, VoxError>;
