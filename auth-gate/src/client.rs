//! Client side of the auth-service round trip.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::errors::{AuthError, AuthResult};

/// `code` value the auth service uses to accept a token.
pub const SUCCESS_CODE: &str = "0";

/// Body sent to the auth service.
#[derive(Debug, Serialize)]
pub struct AuthRequest<'a> {
    pub token: &'a str,
}

/// Body returned by the auth service.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
}

impl AuthResponse {
    /// Exact string comparison against [`SUCCESS_CODE`].
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }
}

/// Credential taken from an inbound request.
#[derive(Debug, Clone, Copy)]
pub struct Credential<'a> {
    /// The `Authorization` header value, forwarded as-is.
    pub header: &'a str,
    /// The token with the scheme prefix removed.
    pub token: &'a str,
}

/// Decides whether a credential is acceptable.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Returns the service's answer on acceptance, an [`AuthError`] otherwise.
    async fn verify(&self, credential: &Credential<'_>) -> AuthResult<AuthResponse>;
}

/// Verifies tokens by posting them to a remote auth service.
#[derive(Clone)]
pub struct RemoteVerifier {
    http: reqwest::Client,
    endpoint: Arc<RwLock<String>>,
}

impl RemoteVerifier {
    /// Builds the HTTP client once; certificate checking and timeout are
    /// fixed for the lifetime of the verifier.
    pub fn new(config: &AuthConfig) -> AuthResult<Self> {
        let mut builder =
            reqwest::Client::builder().danger_accept_invalid_certs(config.accept_invalid_certs);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if config.accept_invalid_certs {
            tracing::warn!(url = %config.url, "TLS certificate verification disabled for auth service");
        }

        Ok(Self {
            http: builder.build()?,
            endpoint: Arc::new(RwLock::new(config.url.clone())),
        })
    }

    /// Current auth-service URL.
    pub fn endpoint(&self) -> String {
        self.endpoint
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Points subsequent verifications at `url`. Requests already in flight
    /// keep the URL they started with.
    pub fn set_endpoint(&self, url: impl Into<String>) {
        let url = url.into();
        tracing::info!(url = %url, "auth service endpoint updated");
        *self
            .endpoint
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = url;
    }
}

#[async_trait]
impl TokenVerifier for RemoteVerifier {
    async fn verify(&self, credential: &Credential<'_>) -> AuthResult<AuthResponse> {
        let endpoint = self.endpoint();

        let response = self
            .http
            .post(&endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, credential.header)
            .json(&AuthRequest {
                token: credential.token,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        let parsed: AuthResponse = serde_json::from_slice(&body)?;

        if parsed.is_success() {
            return Ok(parsed);
        }

        tracing::debug!(
            status = %status,
            code = %parsed.code,
            message = %parsed.message,
            "auth service refused token"
        );
        Err(AuthError::Rejected { code: parsed.code })
    }
}
