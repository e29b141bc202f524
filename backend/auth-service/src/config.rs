//! Configuration for Auth Service
//!
//! Loads settings from environment variables once at start-up (a `.env` file
//! is honoured for local development). Nothing downstream reads the
//! environment again.

use anyhow::{Context, Result};
use crypto_core::CertificateVersion;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Settings {
    /// HTTP listener configuration
    pub server: ServerConfig,

    /// Signing key material and token lifetime
    pub certificates: CertificateConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct CertificateConfig {
    /// Directory holding `private_key<version>.pem` files
    pub path: PathBuf,
    /// Version used to sign new tokens
    pub version: CertificateVersion,
    pub token_expire: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server = ServerConfig {
            host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "SERVER_PORT", 8081)?,
            shutdown_timeout: parse_or(&lookup, "SERVER_SHUTDOWN_TIMEOUT", 5)?,
        };

        let token_expire_minutes: u64 = required(&lookup, "TOKEN_EXPIRE")?
            .parse()
            .context("TOKEN_EXPIRE must be a whole number of minutes")?;

        let token_expire_secs = token_expire_minutes
            .checked_mul(60)
            .context("TOKEN_EXPIRE is too large")?;

        let certificates = CertificateConfig {
            path: PathBuf::from(required(&lookup, "CERT_PATH")?),
            version: CertificateVersion::new(required(&lookup, "CERT_VERSION")?),
            token_expire: Duration::from_secs(token_expire_secs),
        };

        Ok(Self {
            server,
            certificates,
        })
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.is_empty())
        .with_context(|| format!("{key} must be set"))
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .parse()
            .with_context(|| format!("{key} has invalid value {value:?}")),
        None => Ok(default),
    }
}
