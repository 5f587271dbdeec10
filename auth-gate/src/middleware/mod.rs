//! Middleware components.

pub mod auth;

// Re-export commonly used types
pub use auth::{auth_middleware, extract_token, AuthGate};
