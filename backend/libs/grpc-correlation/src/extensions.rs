//! Request extension trait for correlated logging
//!
//! Gives gRPC handlers the request id recovered by
//! [`RequestIdExtractor`](crate::RequestIdExtractor) and a tracing span that
//! stamps it on every log line emitted while the handler runs.

use crate::server::extract_request_id;
use crypto_core::RequestId;
use tonic::Request;
use tracing::Span;

/// Placeholder recorded when a call arrives without a request id
pub const UNKNOWN_REQUEST_ID: &str = "unknown";

/// Extension trait for reading correlation state off gRPC requests
///
/// ## Usage
///
/// ```rust,no_run
/// use grpc_correlation::RequestIdExt;
/// use tonic::{Request, Response, Status};
/// use tracing::Instrument;
///
/// async fn get_user(request: Request<()>) -> Result<Response<()>, Status> {
///     let span = request.correlation_span("GetUser");
///     async move {
///         tracing::info!("GRPC Server: Command GetUser received...");
///         Ok(Response::new(()))
///     }
///     .instrument(span)
///     .await
/// }
/// ```
pub trait RequestIdExt {
    /// Request id of the originating external request.
    ///
    /// Prefers the value stored by the server interceptor and falls back to
    /// raw metadata, so it also works on services without the interceptor.
    fn request_id(&self) -> Option<RequestId>;

    /// `info` span named `grpc_request` carrying `rpc` and `request_id`.
    fn correlation_span(&self, rpc: &'static str) -> Span;
}

impl<T> RequestIdExt for Request<T> {
    fn request_id(&self) -> Option<RequestId> {
        self.extensions()
            .get::<RequestId>()
            .cloned()
            .or_else(|| extract_request_id(self.metadata()))
    }

    fn correlation_span(&self, rpc: &'static str) -> Span {
        match self.request_id() {
            Some(id) => tracing::info_span!("grpc_request", rpc, request_id = %id),
            None => tracing::info_span!("grpc_request", rpc, request_id = UNKNOWN_REQUEST_ID),
        }
    }
}
