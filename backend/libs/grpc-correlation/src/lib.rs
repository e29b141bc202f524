//! Request id propagation for gRPC microservices
//!
//! Carries the request id minted at the HTTP edge across gRPC calls as
//! metadata under the `requestid` key, and rebuilds a logging context from it
//! on the receiving side.
//!
//! ## Core Components
//!
//! - **RequestIdInjector**: client interceptor writing the request id into metadata
//! - **RequestIdExtractor**: server interceptor reading it back into request extensions
//! - **RequestIdExt**: request extension trait yielding the id and a correlation span
//!
//! ## Missing metadata
//!
//! Calls that bypass the gateway have no request id. The server side logs a
//! warning and serves them uncorrelated rather than failing them.
//!
//! ## Usage Example
//!
//! ### Client Side (Gateway)
//!
//! ```rust,no_run
//! use crypto_core::{CorrelationContext, Identity};
//! use grpc_correlation::RequestIdInjector;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = CorrelationContext::start(Identity::new("bob"));
//! let channel = tonic::transport::Channel::from_static("http://[::1]:50051")
//!     .connect()
//!     .await?;
//! let interceptor = RequestIdInjector::new(&ctx.request_id);
//! // let mut client = AccountServiceClient::with_interceptor(channel, interceptor);
//! # Ok(())
//! # }
//! ```
//!
//! ### Server Side (Backend Service)
//!
//! ```rust,no_run
//! use grpc_correlation::{RequestIdExtractor, RequestIdExt};
//! use tonic::{Request, Response, Status};
//!
//! async fn create_account(request: Request<()>) -> Result<Response<()>, Status> {
//!     let _entered = request.correlation_span("CreateAccount").entered();
//!     tracing::info!("GRPC Server: Command CreateAccount received...");
//!     Ok(Response::new(()))
//! }
//! ```

mod client;
mod extensions;
mod server;

pub use client::{inject_request_id, RequestIdInjector};
pub use extensions::{RequestIdExt, UNKNOWN_REQUEST_ID};
pub use server::{extract_request_id, RequestIdExtractor};

// Re-export tonic Status for convenience
pub use tonic::Status;
