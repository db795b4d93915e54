//! Error types for isoform.
//!
//! This module defines all error types used throughout the isoform crate.
//! None of them is fatal: every failure leaves the form usable.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for isoform operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// The saved form snapshot could not be parsed.
    #[error("saved form snapshot is unreadable: {message}")]
    PersistenceRead {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Photo Errors ===
    /// The supplied photo could not be decoded as an image.
    #[error("failed to decode image: {message}")]
    ImageDecode {
        /// Description of what went wrong.
        message: String,
    },

    /// The normalized photo could not be re-encoded.
    #[error("failed to encode image: {message}")]
    ImageEncode {
        /// Description of what went wrong.
        message: String,
    },

    // === AI Errors ===
    /// The AI provider call failed or no credential was configured.
    #[error("AI analysis failed: {message}")]
    AiRequest {
        /// Detail shown to the operator.
        message: String,
        /// Whether another attempt may succeed (rate limit, 5xx, network).
        retryable: bool,
    },

    // === Export Errors ===
    /// Rendering or saving the exported document failed.
    #[error("report export failed: {message}")]
    Export {
        /// Description of what went wrong.
        message: String,
    },

    // === Form Errors ===
    /// A field path did not name any form field.
    #[error("unknown field: {path}")]
    UnknownField {
        /// The path as supplied.
        path: String,
    },

    /// A value was not acceptable for the named field.
    #[error("invalid value '{value}' for {field}: {reason}")]
    InvalidValue {
        /// The field being set.
        field: String,
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// No MEDIC record or mayday log row has the given id.
    #[error("no {kind} row with id {id}")]
    RowNotFound {
        /// Row kind ("medic" or "mayday").
        kind: &'static str,
        /// The id that was looked up.
        id: u64,
    },

    /// Every row id has been handed out.
    #[error("no row ids left; reset the form to start a new one")]
    RowIdsExhausted,

    /// A confirmation token did not match the pending action.
    #[error("confirmation token {token} does not match the pending action")]
    ConfirmationMismatch {
        /// The token that was supplied.
        token: u64,
    },

    /// Confirm was called with nothing pending.
    #[error("no action is awaiting confirmation")]
    NoPendingConfirmation,

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An operation timed out.
    #[error("operation timed out: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
    },
}

/// A specialized Result type for isoform operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new AI request error that retrying will not fix.
    #[must_use]
    pub fn ai_request(message: impl Into<String>) -> Self {
        Self::AiRequest {
            message: message.into(),
            retryable: false,
        }
    }

    /// Create a new AI request error for a transient failure.
    #[must_use]
    pub fn ai_transient(message: impl Into<String>) -> Self {
        Self::AiRequest {
            message: message.into(),
            retryable: true,
        }
    }

    /// Create a new image decode error.
    #[must_use]
    pub fn image_decode(message: impl Into<String>) -> Self {
        Self::ImageDecode {
            message: message.into(),
        }
    }

    /// Create a new export error.
    #[must_use]
    pub fn export(message: impl Into<String>) -> Self {
        Self::Export {
            message: message.into(),
        }
    }

    /// Create an invalid value error.
    #[must_use]
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error came from the AI provider boundary.
    #[must_use]
    pub fn is_ai_error(&self) -> bool {
        matches!(self, Self::AiRequest { .. } | Self::Timeout { .. })
    }

    /// Check if retrying the failed operation may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::AiRequest {
                retryable: true,
                ..
            } | Self::Timeout { .. }
        )
    }

    /// Check if this error means a confirmation step failed.
    #[must_use]
    pub fn is_confirmation_error(&self) -> bool {
        matches!(
            self,
            Self::ConfirmationMismatch { .. } | Self::NoPendingConfirmation
        )
    }
}
