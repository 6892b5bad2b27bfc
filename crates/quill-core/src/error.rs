//! Error types for quill.

use thiserror::Error;

/// Result type alias using quill's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Sub-reason for external generative-text provider failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Provider unreachable or timed out.
    Unavailable,
    /// Content rejected by the provider's safety filters.
    SafetyBlocked,
    /// Missing, placeholder, or rejected credentials.
    InvalidCredentials,
    /// Provider quota or rate limit exhausted.
    QuotaExceeded,
    /// Provider responded but no text could be extracted.
    MalformedResponse,
}

impl ProviderErrorKind {
    /// Stable machine-readable tag for this sub-reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::SafetyBlocked => "safety_blocked",
            Self::InvalidCredentials => "invalid_credentials",
            Self::QuotaExceeded => "quota_exceeded",
            Self::MalformedResponse => "malformed_response",
        }
    }
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core error type for quill operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed required field.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced entity absent or not owned by the caller.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness violation.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Generative-text provider failure, with the provider's diagnostic message.
    #[error("External service error ({kind}): {message}")]
    ExternalService {
        kind: ProviderErrorKind,
        message: String,
    },

    /// Database operation failed (wraps sqlx::Error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Unexpected failure with the underlying message preserved.
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for an external-service failure.
    pub fn external(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Error::ExternalService {
            kind,
            message: message.into(),
        }
    }

    /// Stable machine-discriminable kind tag for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::NotFound(_) => "not_found",
            Error::Conflict(_) => "conflict",
            Error::ExternalService { .. } => "external_service",
            Error::Database(_) => "database",
            Error::Config(_) => "config",
            Error::Serialization(_) => "serialization",
            Error::Internal(_) => "internal",
            Error::Io(_) => "io",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() || e.is_connect() {
            ProviderErrorKind::Unavailable
        } else {
            ProviderErrorKind::MalformedResponse
        };
        Error::external(kind, e.to_string())
    }
}

/// Returns true if the sqlx error is a unique-constraint violation.
///
/// The storage layer's constraint is the authoritative conflict
/// detector; callers translate this into [`Error::Conflict`].
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}
