//! Authentication error taxonomy shared by the issuer, publisher and verifier.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

/// Every failure the token subsystem can report.
///
/// None of these are retried internally; each one ends the current request.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Authorization header is not `bearer <token>` or the token cannot be parsed.
    #[error("malformed credential: {0}")]
    MalformedCredential(String),

    #[error("token expired")]
    TokenExpired,

    /// The public key for the token's version could not be fetched.
    #[error("public key unavailable: {0}")]
    KeyUnavailable(String),

    /// A public key was fetched but could not be decoded.
    #[error("public key malformed: {0}")]
    KeyMalformed(String),

    #[error("signature invalid")]
    SignatureInvalid,

    #[error("key material not found: {}", path.display())]
    KeyMaterialNotFound { path: PathBuf },

    #[error("key material malformed at {}: {reason}", path.display())]
    KeyMaterialMalformed { path: PathBuf, reason: String },

    /// The encoder refused to sign the claims.
    #[error("token signing failed: {0}")]
    Signing(String),
}

impl AuthError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        AuthError::MalformedCredential(msg.into())
    }

    /// Errors caused by what the caller sent, as opposed to a server-side fault.
    ///
    /// Client errors are safe to echo back; the rest are logged and hidden.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AuthError::MalformedCredential(_) | AuthError::TokenExpired | AuthError::SignatureInvalid
        )
    }
}
