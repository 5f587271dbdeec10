//! Authentication middleware.
//!
//! Checks every request against the remote auth service before it reaches
//! the wrapped handler.

use std::{fmt, net::SocketAddr, sync::Arc};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::client::{AuthResponse, Credential, TokenVerifier};
use crate::errors::{AuthError, AuthResult};

/// Gate state shared by every request passing through [`auth_middleware`].
#[derive(Clone)]
pub struct AuthGate {
    verifier: Arc<dyn TokenVerifier>,
    scheme: Arc<str>,
}

impl AuthGate {
    /// Creates a gate that expects `Authorization: <scheme><token>`.
    pub fn new(verifier: Arc<dyn TokenVerifier>, scheme: impl AsRef<str>) -> Self {
        Self {
            verifier,
            scheme: Arc::from(scheme.as_ref()),
        }
    }

    /// Scheme prefix this gate strips from the header.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Runs the full check for one request's headers.
    ///
    /// # Errors
    /// Any [`AuthError`]; the caller turns all of them into `401`.
    pub async fn authenticate(&self, headers: &HeaderMap) -> AuthResult<AuthResponse> {
        let header = match headers.get(AUTHORIZATION) {
            Some(value) if !value.is_empty() => value,
            _ => return Err(AuthError::MissingCredential),
        };
        let header = header.to_str().map_err(|_| self.malformed())?;
        let token = extract_token(header, &self.scheme).ok_or_else(|| self.malformed())?;

        self.verifier.verify(&Credential { header, token }).await
    }

    fn malformed(&self) -> AuthError {
        AuthError::MalformedCredential {
            scheme: self.scheme.to_string(),
        }
    }
}

impl fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGate")
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}

/// Authentication middleware handler.
///
/// Attach with `axum::middleware::from_fn_with_state(gate, auth_middleware)`.
///
/// # Arguments
/// * `gate` - The gate holding the verifier and token scheme
/// * `req` - The incoming HTTP request
/// * `next` - The wrapped handler
///
/// # Returns
/// The wrapped handler's response untouched, or `401` with an empty body.
pub async fn auth_middleware(State(gate): State<AuthGate>, req: Request, next: Next) -> Response {
    let (parts, body) = req.into_parts();
    let remote_addr = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let outcome = gate.authenticate(&parts.headers).await;
    match outcome {
        Ok(_) => {
            tracing::debug!(remote_addr = %remote_addr, "request authenticated");
            next.run(Request::from_parts(parts, body)).await
        }
        Err(err) => {
            if err.is_upstream_failure() {
                tracing::error!(remote_addr = %remote_addr, reason = err.kind(), error = %err, "auth check failed");
            } else {
                tracing::warn!(remote_addr = %remote_addr, reason = err.kind(), "request unauthorized");
            }
            err.into_response()
        }
    }
}

/// Extracts the token from an `Authorization` header value.
///
/// Returns `None` unless the value starts with `scheme` and something follows it.
pub fn extract_token<'a>(header: &'a str, scheme: &str) -> Option<&'a str> {
    header.strip_prefix(scheme).filter(|token| !token.is_empty())
}
