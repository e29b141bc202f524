//! gRPC channels to the backend services
//!
//! Channels are created lazily and shared across requests. Every call made on
//! behalf of an external request goes through [`DownstreamServices::correlated`],
//! which stamps the request id into the call's metadata.

use crate::config::DownstreamConfig;
use anyhow::{Context, Result};
use crypto_core::CorrelationContext;
use futures::future::join_all;
use grpc_correlation::RequestIdInjector;
use serde::Serialize;
use std::fmt;
use tonic::service::interceptor::InterceptedService;
use tonic::transport::{Channel, Endpoint};
use tonic_health::pb::health_client::HealthClient;
use tonic_health::pb::HealthCheckRequest;
use tracing::{debug, warn};

/// Status reported for a service whose health check call failed
pub const UNREACHABLE: &str = "UNREACHABLE";

/// Backend services reachable from the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Downstream {
    Users,
    Accounts,
}

impl Downstream {
    pub const ALL: [Downstream; 2] = [Downstream::Users, Downstream::Accounts];

    pub fn as_str(&self) -> &'static str {
        match self {
            Downstream::Users => "users",
            Downstream::Accounts => "accounts",
        }
    }
}

impl fmt::Display for Downstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel wrapped so every call carries one request id
pub type CorrelatedChannel = InterceptedService<Channel, RequestIdInjector>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceHealth {
    pub service: Downstream,
    /// `grpc.health.v1` serving status name, or [`UNREACHABLE`]
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct DownstreamServices {
    users: Channel,
    accounts: Channel,
}

impl DownstreamServices {
    /// Build lazily connecting channels; no network I/O happens here.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect_lazy(config: &DownstreamConfig) -> Result<Self> {
        Ok(Self {
            users: make_endpoint(&config.users_address, config)?.connect_lazy(),
            accounts: make_endpoint(&config.accounts_address, config)?.connect_lazy(),
        })
    }

    pub fn channel(&self, service: Downstream) -> Channel {
        match service {
            Downstream::Users => self.users.clone(),
            Downstream::Accounts => self.accounts.clone(),
        }
    }

    /// Channel for calls made on behalf of `ctx`.
    ///
    /// Wrap it in any generated client, e.g. `UserServiceClient::new(..)`.
    pub fn correlated(&self, service: Downstream, ctx: &CorrelationContext) -> CorrelatedChannel {
        InterceptedService::new(self.channel(service), RequestIdInjector::new(&ctx.request_id))
    }

    /// `grpc.health.v1.Health/Check` against one service, carrying the request id.
    pub async fn check_health(&self, service: Downstream, ctx: &CorrelationContext) -> ServiceHealth {
        let mut client = HealthClient::new(self.correlated(service, ctx));

        let status = match client
            .check(HealthCheckRequest {
                service: String::new(),
            })
            .await
        {
            Ok(response) => {
                let status = response.into_inner().status().as_str_name().to_string();
                debug!(service = %service, status = %status, "Downstream health checked");
                status
            }
            Err(e) => {
                warn!(service = %service, error = %e, "Downstream health check failed");
                UNREACHABLE.to_string()
            }
        };

        ServiceHealth { service, status }
    }

    /// Health of every downstream service, checked concurrently.
    pub async fn check_all(&self, ctx: &CorrelationContext) -> Vec<ServiceHealth> {
        join_all(
            Downstream::ALL
                .iter()
                .map(|service| self.check_health(*service, ctx)),
        )
        .await
    }
}

fn make_endpoint(url: &str, config: &DownstreamConfig) -> Result<Endpoint> {
    Ok(Endpoint::from_shared(url.to_string())
        .with_context(|| format!("Invalid gRPC address {url:?}"))?
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .tcp_nodelay(true))
}
