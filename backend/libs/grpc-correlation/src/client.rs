//! Client-side request id injection
//!
//! Writes the caller's request id into outgoing gRPC metadata under
//! [`GRPC_REQUEST_ID_KEY`]. Only the request id crosses the boundary; the
//! identity stays at the edge.

use crypto_core::{RequestId, GRPC_REQUEST_ID_KEY};
use tonic::metadata::AsciiMetadataValue;
use tonic::service::Interceptor;
use tonic::{Request, Status};
use tracing::warn;

/// Interceptor that stamps every outgoing request with one request id
///
/// Build one per inbound request and attach it to the client used while
/// serving that request:
///
/// ```rust,no_run
/// use crypto_core::{CorrelationContext, Identity};
/// use grpc_correlation::RequestIdInjector;
/// use tonic::transport::Channel;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let ctx = CorrelationContext::start(Identity::new("bob"));
/// let channel = Channel::from_static("http://[::1]:50051").connect().await?;
/// let interceptor = RequestIdInjector::new(&ctx.request_id);
/// // let mut client = UserServiceClient::with_interceptor(channel, interceptor);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct RequestIdInjector {
    /// `None` when the id cannot be carried as ASCII metadata
    value: Option<AsciiMetadataValue>,
}

impl RequestIdInjector {
    pub fn new(request_id: &RequestId) -> Self {
        Self {
            value: to_metadata_value(request_id),
        }
    }

    /// Whether this injector will actually write the metadata key.
    pub fn is_active(&self) -> bool {
        self.value.is_some()
    }
}

impl Interceptor for RequestIdInjector {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        if let Some(value) = &self.value {
            request
                .metadata_mut()
                .insert(GRPC_REQUEST_ID_KEY, value.clone());
        }

        Ok(request)
    }
}

/// Stamp a single request with `request_id`.
///
/// For call sites that build `tonic::Request`s by hand instead of attaching
/// an interceptor to the client.
pub fn inject_request_id<T>(request: &mut Request<T>, request_id: &RequestId) {
    if let Some(value) = to_metadata_value(request_id) {
        request.metadata_mut().insert(GRPC_REQUEST_ID_KEY, value);
    }
}

fn to_metadata_value(request_id: &RequestId) -> Option<AsciiMetadataValue> {
    match request_id.as_str().parse::<AsciiMetadataValue>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(
                request_id = %request_id,
                error = %e,
                "Request id is not valid ASCII metadata; outgoing calls will not be correlated"
            );
            None
        }
    }
}
