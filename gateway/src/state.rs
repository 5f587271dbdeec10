//! Application state for gateway service.

use std::sync::Arc;

use auth_gate::{AuthConfig, AuthGate, AuthResult, RemoteVerifier};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub gate: AuthGate,
    /// Handle on the gate's verifier, kept for endpoint reloads.
    pub verifier: RemoteVerifier,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(auth: &AuthConfig) -> AuthResult<Self> {
        let verifier = RemoteVerifier::new(auth)?;
        let gate = AuthGate::new(Arc::new(verifier.clone()), &auth.token_scheme);

        Ok(Self { gate, verifier })
    }
}
