//! Session token issuance
//!
//! Tokens are compact JWS signed with RS512. The signing key is chosen by
//! certificate version and read from the [`CertificateStore`] on every call,
//! so a rotated key file is picked up without a restart.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use crypto_core::{CertificateStore, Identity, TokenIssuer};
//! use std::time::Duration;
//!
//! let issuer = TokenIssuer::new(CertificateStore::new("./certificates"));
//! let token = issuer
//!     .issue(&Identity::new("bob"), &"1".into(), Duration::from_secs(600))
//!     .expect("key material for version 1");
//! println!("{token}");
//! ```

use crate::certificate::{CertificateStore, CertificateVersion};
use crate::claims::{Identity, SessionClaims, SessionToken};
use crate::error::{AuthError, Result};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs1::EncodeRsaPrivateKey;
use std::time::Duration;

/// Signing algorithm for every session token
pub const JWT_ALGORITHM: Algorithm = Algorithm::RS512;

/// Scheme expected in the `Authorization` header. Matched case-sensitively.
pub const BEARER_SCHEME: &str = "bearer";

/// Split an `Authorization` header value into its token part.
///
/// The value must be exactly two space-separated parts, the first being
/// `bearer`. Anything else is a `MalformedCredential`.
pub fn parse_bearer(header: &str) -> Result<&str> {
    let parts: Vec<&str> = header.split(' ').collect();
    if parts.len() != 2 {
        return Err(AuthError::malformed(
            "malformed auth token, could not split two parts",
        ));
    }

    if parts[0] != BEARER_SCHEME {
        return Err(AuthError::malformed(
            "malformed auth token, the first part is not bearer",
        ));
    }

    if parts[1].is_empty() {
        return Err(AuthError::malformed("malformed auth token, empty token"));
    }

    Ok(parts[1])
}

/// Signs session claims with the private key of a certificate version.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    store: CertificateStore,
}

impl TokenIssuer {
    pub fn new(store: CertificateStore) -> Self {
        Self { store }
    }

    /// Issue a token for `identity` under `version`, valid for `ttl` from now.
    ///
    /// Key material errors propagate unchanged; no partial token is returned.
    pub fn issue(
        &self,
        identity: &Identity,
        version: &CertificateVersion,
        ttl: Duration,
    ) -> Result<SessionToken> {
        self.issue_at(identity, version, ttl, Utc::now().timestamp())
    }

    /// Like [`issue`](Self::issue) with an explicit clock (Unix seconds).
    pub fn issue_at(
        &self,
        identity: &Identity,
        version: &CertificateVersion,
        ttl: Duration,
        now: i64,
    ) -> Result<SessionToken> {
        let exp = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(secs))
            .ok_or_else(|| AuthError::Signing(format!("token lifetime {ttl:?} out of range")))?;

        let private_key = self.store.resolve_private_key(version)?;

        let der = private_key
            .to_pkcs1_der()
            .map_err(|e| AuthError::Signing(e.to_string()))?;
        let encoding_key = EncodingKey::from_rsa_der(der.as_bytes());

        let claims = SessionClaims {
            name: identity.name.clone(),
            key_version: version.clone(),
            exp,
        };

        let token = encode(&Header::new(JWT_ALGORITHM), &claims, &encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        tracing::debug!(name = %identity.name, key_version = %version, exp = claims.exp, "Issued session token");

        Ok(SessionToken::new(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::UnverifiedClaims;

    fn fixture_issuer() -> TokenIssuer {
        TokenIssuer::new(CertificateStore::new(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures"
        )))
    }

    #[test]
    fn test_unrepresentable_lifetime_is_rejected() {
        let issuer = fixture_issuer();
        let bob = Identity::new("bob");

        let err = issuer
            .issue_at(&bob, &"1".into(), Duration::MAX, 1_700_000_000)
            .unwrap_err();
        assert!(matches!(err, AuthError::Signing(_)));

        let err = issuer
            .issue_at(&bob, &"1".into(), Duration::from_secs(i64::MAX as u64), 1_700_000_000)
            .unwrap_err();
        assert!(matches!(err, AuthError::Signing(_)));
    }

    #[test]
    fn test_parse_bearer_accepts_lowercase_scheme() {
        assert_eq!(parse_bearer("bearer abc.def.ghi").unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_parse_bearer_rejects_malformed_headers() {
        for header in [
            "Bearer abc.def.ghi",
            "basic abc.def.ghi",
            "bearerabc.def.ghi",
            "bearer abc def",
            "bearer  abc",
            "bearer ",
            "",
        ] {
            let err = parse_bearer(header).unwrap_err();
            assert!(
                matches!(err, AuthError::MalformedCredential(_)),
                "header {header:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_issue_embeds_version_and_expiry() {
        let token = fixture_issuer()
            .issue_at(&Identity::new("bob"), &"1".into(), Duration::from_secs(600), 1_000)
            .unwrap();

        assert_eq!(token.as_str().matches('.').count(), 2);

        let claims = UnverifiedClaims::decode(token.as_str()).unwrap();
        assert_eq!(claims.key_version().as_str(), "1");
        assert_eq!(claims.expires_at(), 1_600);
    }

    #[test]
    fn test_issue_missing_version_fails() {
        let err = fixture_issuer()
            .issue(&Identity::new("bob"), &"0".into(), Duration::from_secs(600))
            .unwrap_err();
        assert!(matches!(err, AuthError::KeyMaterialNotFound { .. }));
    }

    #[test]
    fn test_issue_wrong_base_dir_fails() {
        let err = TokenIssuer::new(CertificateStore::new("./"))
            .issue(&Identity::new("bob"), &"1".into(), Duration::from_secs(600))
            .unwrap_err();
        assert!(matches!(err, AuthError::KeyMaterialNotFound { .. }));
    }

    #[test]
    fn test_issue_malformed_key_fails() {
        let err = fixture_issuer()
            .issue(&Identity::new("bob"), &"9".into(), Duration::from_secs(600))
            .unwrap_err();
        assert!(matches!(err, AuthError::KeyMaterialMalformed { .. }));
    }
}
