//! Configuration for API Gateway
//!
//! Loads settings from:
//! 1. Environment variables
//! 2. .env file (local development)

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Settings {
    /// HTTP listener address (`host:port`)
    pub http_address: String,

    /// Where public keys are fetched from
    pub cert_endpoint: CertEndpointConfig,

    /// Backend gRPC services
    pub downstream: DownstreamConfig,
}

#[derive(Debug, Clone)]
pub struct CertEndpointConfig {
    /// Base URL; the certificate version is appended as the last path segment
    pub url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DownstreamConfig {
    pub users_address: String,
    pub accounts_address: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
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
        let string_or =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            http_address: string_or("HTTP_ADDRESS", "127.0.0.1:8080"),
            cert_endpoint: CertEndpointConfig {
                url: string_or("JWT_ADDRESS", "http://127.0.0.1:8081/get-cert"),
                timeout: seconds_or(&lookup, "KEY_FETCH_TIMEOUT_SECS", 5)?,
            },
            downstream: DownstreamConfig {
                users_address: string_or("USERS_GRPC_ADDRESS", "http://127.0.0.1:50051"),
                accounts_address: string_or("ACCOUNTS_GRPC_ADDRESS", "http://127.0.0.1:50052"),
                connect_timeout: seconds_or(&lookup, "GRPC_CONNECT_TIMEOUT_SECS", 5)?,
                request_timeout: seconds_or(&lookup, "GRPC_REQUEST_TIMEOUT_SECS", 10)?,
            },
        })
    }
}

fn seconds_or<F>(lookup: &F, key: &str, default: u64) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = match lookup(key) {
        Some(value) => value
            .parse()
            .with_context(|| format!("{key} must be a whole number of seconds, got {value:?}"))?,
        None => default,
    };

    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(|_| None).unwrap();

        assert_eq!(settings.http_address, "127.0.0.1:8080");
        assert_eq!(settings.cert_endpoint.url, "http://127.0.0.1:8081/get-cert");
        assert_eq!(settings.cert_endpoint.timeout, Duration::from_secs(5));
        assert_eq!(settings.downstream.users_address, "http://127.0.0.1:50051");
        assert_eq!(settings.downstream.accounts_address, "http://127.0.0.1:50052");
        assert_eq!(settings.downstream.connect_timeout, Duration::from_secs(5));
        assert_eq!(settings.downstream.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(|key| match key {
            "JWT_ADDRESS" => Some("http://auth:8081/get-cert".to_string()),
            "KEY_FETCH_TIMEOUT_SECS" => Some("2".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(settings.cert_endpoint.url, "http://auth:8081/get-cert");
        assert_eq!(settings.cert_endpoint.timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_invalid_timeout_is_error() {
        let err = Settings::from_lookup(|key| {
            (key == "GRPC_REQUEST_TIMEOUT_SECS").then(|| "soon".to_string())
        })
        .unwrap_err();

        assert!(err.to_string().contains("GRPC_REQUEST_TIMEOUT_SECS"));
    }
}
