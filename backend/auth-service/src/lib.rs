//! Auth Service
//!
//! Issues RS512 session tokens signed with a versioned RSA key and publishes
//! the public half of every key version for remote verifiers.
//!
//! ## Endpoints
//! - `GET|POST /login`: `{name, password}` in, `201` with a `token` header out
//! - `GET /get-cert/{version}`: `{"publicKey": "<base64 PEM>"}`
//! - `GET /health`

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;

pub use config::Settings;
pub use routes::{configure, response_headers};

use config::CertificateConfig;
use crypto_core::{CertificatePublisher, CertificateStore, CertificateVersion, TokenIssuer};
use std::time::Duration;

/// Shared state handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub issuer: TokenIssuer,
    pub publisher: CertificatePublisher,
    /// Version new tokens are signed with
    pub signing_version: CertificateVersion,
    pub token_ttl: Duration,
}

impl AppState {
    pub fn new(config: &CertificateConfig) -> Self {
        let store = CertificateStore::new(&config.path);

        Self {
            issuer: TokenIssuer::new(store.clone()),
            publisher: CertificatePublisher::new(store),
            signing_version: config.version.clone(),
            token_ttl: config.token_expire,
        }
    }
}
