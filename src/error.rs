//! Error types for the NutriTrack core
//!
//! All errors use thiserror for structured error handling.
//! Credential failures carry a machine-readable code via `AuthError` so the
//! caller can map them to user-facing messages without string matching.

use thiserror::Error;

/// Coded authentication failures reported by the identity provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredential,

    #[error("An account with this email already exists")]
    EmailAlreadyInUse,

    #[error("Password is too weak, use at least 6 characters")]
    WeakPassword,

    #[error("Identity provider error: {0}")]
    Provider(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Sync error: {0}")]
    Sync(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("{0}")]
    Validation(String),

    #[error("Feature unavailable: {0}")]
    FeatureUnavailable(String),

    #[error("{0}")]
    Generic(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
