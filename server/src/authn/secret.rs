//! Shared-secret authentication for management routes

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::errors::ServiceError;
use crate::server::state::ServerState;

/// Header carrying the shared secret
pub const SECRET_HEADER: &str = "secret";

/// Route prefixes reachable without the secret
pub const OPEN_PREFIXES: &[&str] = &["/health", "/version", "/checkUpdate", "/files/"];

/// Decides whether a request may reach a protected route
#[derive(Clone)]
pub struct SecretGate {
    secret: Option<SecretString>,
    open_prefixes: Vec<String>,
}

impl SecretGate {
    pub fn new(secret: Option<SecretString>) -> Self {
        Self {
            secret,
            open_prefixes: OPEN_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    pub fn is_open(&self, path: &str) -> bool {
        self.open_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Constant-time comparison against the configured secret. Without a
    /// configured secret nothing verifies.
    pub fn verify(&self, provided: Option<&str>) -> bool {
        let (Some(expected), Some(provided)) = (self.secret.as_ref(), provided) else {
            return false;
        };
        let expected = expected.expose_secret().as_bytes();
        let provided = provided.as_bytes();
        if expected.len() != provided.len() {
            return false;
        }
        expected.ct_eq(provided).into()
    }
}

impl std::fmt::Debug for SecretGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretGate")
            .field("configured", &self.is_configured())
            .field("open_prefixes", &self.open_prefixes)
            .finish()
    }
}

/// Middleware rejecting protected requests without a valid `secret` header
pub async fn require_secret(
    State(state): State<Arc<ServerState>>,
    req: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let path = req.uri().path();
    if state.gate.is_open(path) {
        return Ok(next.run(req).await);
    }

    let provided = req
        .headers()
        .get(SECRET_HEADER)
        .and_then(|value| value.to_str().ok());

    if !state.gate.verify(provided) {
        warn!("Rejected unauthenticated request to {}", path);
        return Err(ServiceError::Unauthorized("Unauthorized".to_string()));
    }

    Ok(next.run(req).await)
}
