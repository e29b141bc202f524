//! Bearer credential verification
//!
//! Each call walks the same fixed sequence and keeps no state between calls:
//!
//! ```text
//! "bearer <token>" ─ split ─▶ UnverifiedClaims ─ expiry gate ─▶ resolve key(keyVersion) ─▶ signature ─▶ Identity
//! ```
//!
//! Expiry is checked before the key fetch so that trivially expired tokens
//! never cost a network round trip. Both gates are mandatory.

use crate::certificate::CertificateVersion;
use crate::claims::{Identity, UnverifiedClaims};
use crate::error::{AuthError, Result};
use crate::jwt::parse_bearer;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

/// Source of PEM-encoded public keys by certificate version.
///
/// Implementations may cross a process boundary. Transport failures should
/// surface as `KeyUnavailable`, undecodable payloads as `KeyMalformed`.
#[async_trait]
pub trait PublicKeyResolver: Send + Sync {
    async fn resolve_public_key(&self, version: &CertificateVersion) -> Result<Vec<u8>>;
}

#[async_trait]
impl<T: PublicKeyResolver + ?Sized> PublicKeyResolver for Arc<T> {
    async fn resolve_public_key(&self, version: &CertificateVersion) -> Result<Vec<u8>> {
        (**self).resolve_public_key(version).await
    }
}

/// Validates bearer credentials against keys from a [`PublicKeyResolver`].
#[derive(Debug, Clone)]
pub struct TokenVerifier<R> {
    resolver: R,
}

impl<R: PublicKeyResolver> TokenVerifier<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Verify an `Authorization` header value against the current time.
    pub async fn verify(&self, bearer_header: &str) -> Result<Identity> {
        self.verify_at(bearer_header, Utc::now().timestamp()).await
    }

    /// Verify an `Authorization` header value as of `now` (Unix seconds).
    pub async fn verify_at(&self, bearer_header: &str, now: i64) -> Result<Identity> {
        let token = parse_bearer(bearer_header)?;
        let claims = UnverifiedClaims::decode(token)?;

        if claims.is_expired_at(now) {
            tracing::debug!(exp = claims.expires_at(), now, "Rejected expired token");
            return Err(AuthError::TokenExpired);
        }

        let key_version = claims.key_version().clone();
        let public_key = self.resolver.resolve_public_key(&key_version).await?;

        let identity = claims.verify_signature(token, &public_key).map_err(|e| {
            tracing::warn!(key_version = %key_version, error = %e, "Token signature check failed");
            e
        })?;

        tracing::debug!(name = %identity.name, key_version = %key_version, "Token verified");

        Ok(identity)
    }
}
