//! Remote public key resolution
//!
//! Fetches `{"publicKey": "<base64 PEM>"}` from the auth service's
//! certificate endpoint. Nothing is cached: a rotated key is picked up on the
//! very next request.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use crypto_core::{AuthError, CertificateVersion, PublicKeyEnvelope, PublicKeyResolver};
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

/// [`PublicKeyResolver`] backed by `GET <base_url>/<version>`
#[derive(Debug, Clone)]
pub struct RemoteCertificateClient {
    http: Client,
    base_url: Url,
}

impl RemoteCertificateClient {
    /// `timeout` bounds the whole exchange, connect through body.
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid certificate endpoint URL {base_url:?}"))?;

        if base_url.cannot_be_a_base() {
            return Err(anyhow!("Certificate endpoint URL {base_url} cannot take a path"));
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http, base_url })
    }

    /// URL serving the public key of `version`.
    pub fn cert_url(&self, version: &CertificateVersion) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(version.as_str());
        }
        url
    }
}

#[async_trait]
impl PublicKeyResolver for RemoteCertificateClient {
    async fn resolve_public_key(&self, version: &CertificateVersion) -> crypto_core::Result<Vec<u8>> {
        let url = self.cert_url(version);
        debug!(url = %url, "Fetching public key");

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AuthError::KeyUnavailable(format!("GET {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::KeyUnavailable(format!(
                "GET {url}: unexpected status {status}"
            )));
        }

        let envelope: PublicKeyEnvelope = response.json().await.map_err(|e| {
            if e.is_decode() {
                AuthError::KeyMalformed(format!("GET {url}: {e}"))
            } else {
                AuthError::KeyUnavailable(format!("GET {url}: {e}"))
            }
        })?;

        if envelope.public_key.is_empty() {
            return Err(AuthError::KeyMalformed(format!("GET {url}: empty public key")));
        }

        Ok(envelope.public_key)
    }
}
