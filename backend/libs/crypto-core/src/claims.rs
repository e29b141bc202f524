//! Session claims and the two-phase trust model
//!
//! A token's claims have to be read before its signature can be checked,
//! because the claims name the key version to verify against. To keep that
//! window explicit, decoding yields [`UnverifiedClaims`], which exposes only
//! what the verifier needs for key lookup and the expiry gate. The only way
//! to obtain an [`Identity`] from a token is [`UnverifiedClaims::verify_signature`].

use crate::certificate::CertificateVersion;
use crate::error::{AuthError, Result};
use crate::jwt::JWT_ALGORITHM;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A verified caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
}

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Payload signed into every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub name: String,
    #[serde(rename = "keyVersion")]
    pub key_version: CertificateVersion,
    /// Expiration time (Unix timestamp, seconds)
    pub exp: i64,
}

/// Compact-serialised signed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub(crate) fn new(token: String) -> Self {
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Claims parsed from a token whose signature has not been checked yet.
#[derive(Debug, Clone)]
pub struct UnverifiedClaims {
    claims: SessionClaims,
}

impl UnverifiedClaims {
    /// Parse the payload of `token` without checking its signature.
    ///
    /// Fails with `MalformedCredential` if the token is not a three-part
    /// RS512 JWS with a JSON payload carrying `name`, `keyVersion` and `exp`.
    pub fn decode(token: &str) -> Result<Self> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(AuthError::malformed("token must have 3 parts separated by dots"));
        }

        let header = decode_header(token)
            .map_err(|e| AuthError::malformed(format!("failed to decode token header: {e}")))?;
        if header.alg != JWT_ALGORITHM {
            return Err(AuthError::malformed(format!(
                "unexpected signing algorithm {:?}",
                header.alg
            )));
        }

        let payload = URL_SAFE_NO_PAD
            .decode(parts[1])
            .map_err(|e| AuthError::malformed(format!("failed to decode token payload: {e}")))?;

        let claims: SessionClaims = serde_json::from_slice(&payload)
            .map_err(|e| AuthError::malformed(format!("failed to parse token claims: {e}")))?;

        if claims.name.is_empty() {
            return Err(AuthError::malformed("token has an empty name claim"));
        }
        if claims.key_version.as_str().is_empty() {
            return Err(AuthError::malformed("token has an empty keyVersion claim"));
        }

        Ok(Self { claims })
    }

    /// Version of the key the token claims to be signed with.
    pub fn key_version(&self) -> &CertificateVersion {
        &self.claims.key_version
    }

    pub fn expires_at(&self) -> i64 {
        self.claims.exp
    }

    /// A token is live only while `exp` is strictly after `now`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.claims.exp <= now
    }

    /// Check `token`'s signature against `public_key_pem` and release the identity.
    ///
    /// Expiry is not re-checked here; the caller gates on
    /// [`is_expired_at`](Self::is_expired_at) with its own clock.
    pub fn verify_signature(self, token: &str, public_key_pem: &[u8]) -> Result<Identity> {
        let key = DecodingKey::from_rsa_pem(public_key_pem)
            .map_err(|e| AuthError::KeyMalformed(e.to_string()))?;

        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();

        let data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => AuthError::SignatureInvalid,
            ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
                AuthError::KeyMalformed(e.to_string())
            }
            _ => AuthError::malformed(e.to_string()),
        })?;

        // Same bytes as the unverified payload, now backed by the signature
        debug_assert_eq!(data.claims, self.claims);

        Ok(Identity {
            name: data.claims.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unsigned_token(header: &str, payload: &str) -> String {
        format!(
            "{}.{}.c2lnbmF0dXJl",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_decode_reads_claims_without_key() {
        let token = unsigned_token(
            r#"{"alg":"RS512","typ":"JWT"}"#,
            r#"{"name":"bob","keyVersion":"3","exp":1700000000}"#,
        );

        let claims = UnverifiedClaims::decode(&token).unwrap();
        assert_eq!(claims.key_version().as_str(), "3");
        assert_eq!(claims.expires_at(), 1_700_000_000);
    }

    #[test]
    fn test_expiry_is_strict() {
        let token = unsigned_token(
            r#"{"alg":"RS512","typ":"JWT"}"#,
            r#"{"name":"bob","keyVersion":"1","exp":100}"#,
        );
        let claims = UnverifiedClaims::decode(&token).unwrap();

        assert!(!claims.is_expired_at(99));
        assert!(claims.is_expired_at(100));
        assert!(claims.is_expired_at(101));
    }

    #[test]
    fn test_decode_rejects_two_parts() {
        let err = UnverifiedClaims::decode("abc.def").unwrap_err();
        assert!(matches!(err, AuthError::MalformedCredential(_)));
    }

    #[test]
    fn test_decode_rejects_other_algorithms() {
        let token = unsigned_token(
            r#"{"alg":"HS256","typ":"JWT"}"#,
            r#"{"name":"bob","keyVersion":"1","exp":100}"#,
        );
        let err = UnverifiedClaims::decode(&token).unwrap_err();
        assert!(matches!(err, AuthError::MalformedCredential(_)));
    }

    #[test]
    fn test_decode_rejects_missing_claims() {
        let token = unsigned_token(r#"{"alg":"RS512","typ":"JWT"}"#, r#"{"name":"bob"}"#);
        assert!(UnverifiedClaims::decode(&token).is_err());

        let token = unsigned_token(
            r#"{"alg":"RS512","typ":"JWT"}"#,
            r#"{"name":"","keyVersion":"1","exp":100}"#,
        );
        assert!(UnverifiedClaims::decode(&token).is_err());
    }

    #[test]
    fn test_verify_signature_rejects_bad_pem() {
        let token = unsigned_token(
            r#"{"alg":"RS512","typ":"JWT"}"#,
            r#"{"name":"bob","keyVersion":"1","exp":100}"#,
        );
        let claims = UnverifiedClaims::decode(&token).unwrap();

        let err = claims.verify_signature(&token, b"not a pem").unwrap_err();
        assert!(matches!(err, AuthError::KeyMalformed(_)));
    }

    #[test]
    fn test_claims_wire_names() {
        let claims = SessionClaims {
            name: "bob".to_string(),
            key_version: "1".into(),
            exp: 42,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["keyVersion"], "1");
        assert_eq!(json["name"], "bob");
        assert_eq!(json["exp"], 42);
    }
}
