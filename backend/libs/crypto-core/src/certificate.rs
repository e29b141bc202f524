//! Filesystem-backed certificate material
//!
//! Each certificate version is a single RSA private key on disk at
//! `<base_dir>/private_key<version>.pem`. The store re-reads and re-parses the
//! file on every lookup; nothing is cached, so rotating a file on disk takes
//! effect on the next request.
//!
//! The publisher derives the public half of a version and serialises it as a
//! PEM-wrapped SubjectPublicKeyInfo, which is what remote verifiers fetch.

use crate::error::{AuthError, Result};
use async_trait::async_trait;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey, LineEnding};
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::verifier::PublicKeyResolver;

/// Identifier selecting which key pair signs or verifies a token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateVersion(String);

impl CertificateVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Versions become part of a file name, so only a conservative alphabet is allowed.
    fn is_file_safe(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl fmt::Display for CertificateVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CertificateVersion {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CertificateVersion {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Resolves certificate versions to RSA private keys on disk.
#[derive(Debug, Clone)]
pub struct CertificateStore {
    base_dir: PathBuf,
}

impl CertificateStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of the private key file for `version`.
    pub fn key_path(&self, version: &CertificateVersion) -> PathBuf {
        self.base_dir.join(format!("private_key{}.pem", version))
    }

    /// Read and parse the private key for `version`.
    ///
    /// Accepts PKCS#1 (`RSA PRIVATE KEY`) and PKCS#8 (`PRIVATE KEY`) PEM.
    ///
    /// ## Errors
    ///
    /// - `KeyMaterialNotFound` if the file is missing or unreadable, or the
    ///   version contains characters that cannot name a key file
    /// - `KeyMaterialMalformed` if the bytes are not an RSA private key
    pub fn resolve_private_key(&self, version: &CertificateVersion) -> Result<RsaPrivateKey> {
        let path = self.key_path(version);

        if !version.is_file_safe() {
            tracing::warn!(key_version = %version, "Rejected certificate version with unsafe characters");
            return Err(AuthError::KeyMaterialNotFound { path });
        }

        let pem = std::fs::read_to_string(&path).map_err(|e| {
            tracing::debug!(path = %path.display(), error = %e, "Failed to read key material");
            AuthError::KeyMaterialNotFound { path: path.clone() }
        })?;

        RsaPrivateKey::from_pkcs1_pem(&pem)
            .or_else(|_| RsaPrivateKey::from_pkcs8_pem(&pem))
            .map_err(|e| AuthError::KeyMaterialMalformed {
                path,
                reason: e.to_string(),
            })
    }
}

/// Publishes the public half of a certificate version.
///
/// Side-effect free and idempotent: the same version always yields the same
/// PEM as long as the file on disk is unchanged.
#[derive(Debug, Clone)]
pub struct CertificatePublisher {
    store: CertificateStore,
}

impl CertificatePublisher {
    pub fn new(store: CertificateStore) -> Self {
        Self { store }
    }

    /// PEM-encoded SubjectPublicKeyInfo for `version`.
    pub fn public_key_pem(&self, version: &CertificateVersion) -> Result<String> {
        let private_key = self.store.resolve_private_key(version)?;

        private_key
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| AuthError::KeyMaterialMalformed {
                path: self.store.key_path(version),
                reason: e.to_string(),
            })
    }
}

/// In-process resolver. Key files are read on the blocking pool, so this
/// must run inside a tokio runtime.
#[async_trait]
impl PublicKeyResolver for CertificatePublisher {
    async fn resolve_public_key(&self, version: &CertificateVersion) -> Result<Vec<u8>> {
        let publisher = self.clone();
        let version = version.clone();
        tokio::task::spawn_blocking(move || publisher.public_key_pem(&version))
            .await
            .map_err(|e| AuthError::KeyUnavailable(format!("key lookup task failed: {e}")))?
            .map(String::into_bytes)
            .map_err(|e| match e {
                AuthError::KeyMaterialMalformed { reason, .. } => AuthError::KeyMalformed(reason),
                other => AuthError::KeyUnavailable(other.to_string()),
            })
    }
}

/// JSON envelope served by the certificate endpoint: `{"publicKey": "<base64>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyEnvelope {
    #[serde(rename = "publicKey", with = "base64_bytes")]
    pub public_key: Vec<u8>,
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
