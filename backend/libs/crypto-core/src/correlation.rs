//! Request correlation identifiers
//!
//! A request id is minted once at the HTTP edge from the verified identity
//! and travels with the request from there on.
//!
//! ## Flow
//! ```text
//! HTTP request
//!   ↓ (JwtAuthMiddleware verifies bearer token → Identity)
//! RequestIdMiddleware
//!   ↓ (mints "<name>_<uuid>", stores CorrelationContext, opens tracing span)
//! Handler
//!   ↓ (gRPC call: RequestIdInjector writes metadata "requestid")
//! Remote service
//!   ↓ (RequestIdExtractor reads "requestid", handler logs inside correlation span)
//! ```

use crate::claims::Identity;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// gRPC metadata key carrying the request id
pub const GRPC_REQUEST_ID_KEY: &str = "requestid";

/// HTTP response header echoing the request id
pub const HTTP_REQUEST_ID_HEADER: &str = "x-request-id";

/// Opaque id tying together every log line and RPC of one external request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Fresh id for a request made by `identity`: `<name>_<uuid v4>`.
    pub fn mint(identity: &Identity) -> Self {
        Self(format!("{}_{}", identity.name, Uuid::new_v4()))
    }

    /// Wrap an id received from another process.
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request-scoped correlation state at the HTTP edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationContext {
    pub identity: Identity,
    pub request_id: RequestId,
}

impl CorrelationContext {
    /// Start a new correlation for `identity`.
    pub fn start(identity: Identity) -> Self {
        let request_id = RequestId::mint(&identity);
        Self {
            identity,
            request_id,
        }
    }
}
