//! Server-side request id extraction
//!
//! Reads the request id written by [`RequestIdInjector`](crate::RequestIdInjector)
//! and stores it in request extensions for handler access.

use crypto_core::{RequestId, GRPC_REQUEST_ID_KEY};
use tonic::metadata::MetadataMap;
use tonic::service::Interceptor;
use tonic::{Request, Status};
use tracing::{debug, warn};

/// Server-side interceptor that recovers the caller's request id
///
/// This interceptor never rejects a request. Calls that bypass the gateway
/// carry no request id; they are logged at WARN and served uncorrelated.
///
/// ## Usage
///
/// ```rust,no_run
/// use grpc_correlation::RequestIdExtractor;
///
/// // let service = UserServiceServer::with_interceptor(MyUserService, RequestIdExtractor);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestIdExtractor;

impl Interceptor for RequestIdExtractor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        match extract_request_id(request.metadata()) {
            Some(request_id) => {
                debug!(request_id = %request_id, "Recovered request id from metadata");
                request.extensions_mut().insert(request_id);
            }
            None => {
                warn!("Incoming call carries no request id; continuing without correlation");
            }
        }

        Ok(request)
    }
}

/// Read the request id out of incoming metadata, if any.
pub fn extract_request_id(metadata: &MetadataMap) -> Option<RequestId> {
    let value = metadata.get(GRPC_REQUEST_ID_KEY)?;

    match value.to_str() {
        Ok(s) if !s.is_empty() => Some(RequestId::from_raw(s)),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "Request id metadata is not valid ASCII");
            None
        }
    }
}
