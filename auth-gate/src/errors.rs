//! Error types for the authentication gate.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Result alias used throughout the crate.
pub type AuthResult<T> = Result<T, AuthError>;

/// Reasons a request fails authentication.
///
/// Every variant maps to the same client-visible outcome (`401`, empty body);
/// only the log line differs.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization` header, or an empty one.
    #[error("missing authorization header")]
    MissingCredential,

    /// Header present but not of the form `<scheme><token>`.
    #[error("malformed authorization header, expected scheme {scheme:?}")]
    MalformedCredential { scheme: String },

    /// The auth service could not be reached or its body could not be read.
    #[error("auth service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The auth service answered with something other than the expected JSON.
    #[error("auth service returned an unparseable body: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    /// The auth service rejected the token.
    #[error("auth service rejected the token with code {code:?}")]
    Rejected { code: String },
}

impl AuthError {
    /// Short machine-friendly label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::MalformedCredential { .. } => "malformed_credential",
            AuthError::Transport(_) => "transport",
            AuthError::MalformedResponse(_) => "malformed_response",
            AuthError::Rejected { .. } => "rejected",
        }
    }

    /// Whether the failure happened talking to the auth service rather than
    /// being a verdict about the caller's credential.
    pub fn is_upstream_failure(&self) -> bool {
        matches!(self, AuthError::Transport(_) | AuthError::MalformedResponse(_))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}
