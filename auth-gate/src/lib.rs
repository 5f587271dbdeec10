//! Token authentication gate backed by a remote authentication service.
//!
//! Wraps axum routes with [`middleware::auth_middleware`], which forwards the
//! caller's `Authorization: JWT <token>` credential to the configured auth
//! service and only lets the request through when the service answers with
//! `code == "0"`.

pub mod client;
pub mod config;
pub mod errors;
pub mod middleware;

pub use client::{AuthRequest, AuthResponse, Credential, RemoteVerifier, TokenVerifier};
pub use config::{AppConfig, AuthConfig};
pub use errors::{AuthError, AuthResult, ConfigError};
pub use middleware::{auth_middleware, AuthGate};
