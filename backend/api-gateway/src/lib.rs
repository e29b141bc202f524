//! API Gateway Library
//!
//! HTTP edge of the system: verifies bearer tokens against public keys served
//! by the auth service, mints a request id per authenticated request and
//! forwards it on every gRPC call to the backend services.

pub mod cert_client;
pub mod config;
pub mod downstream;
pub mod routes;

pub use cert_client::RemoteCertificateClient;
pub use config::Settings;
pub use downstream::{Downstream, DownstreamServices, ServiceHealth};
pub use routes::configure;
