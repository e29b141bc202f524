//! Access log middleware
//!
//! Emits one line per finished request. Requests that passed
//! [`JwtAuthMiddleware`](crate::JwtAuthMiddleware) and
//! [`RequestIdMiddleware`](crate::RequestIdMiddleware) are logged with the
//! caller name and request id, so an access line can be joined with the
//! downstream gRPC logs of the same request. Wrap it outermost.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use crypto_core::CorrelationContext;
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::time::Instant;

/// Access log keyed by request id
#[derive(Clone, Default)]
pub struct Logging;

impl<S, B> Transform<S, ServiceRequest> for Logging
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = LoggingService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LoggingService { service }))
    }
}

pub struct LoggingService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for LoggingService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let method = req.method().clone();
        let path = req.path().to_string();

        tracing::debug!(method = %method, path = %path, "HTTP request received");

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = match fut.await {
                Ok(res) => res,
                Err(e) => {
                    tracing::error!(
                        method = %method,
                        path = %path,
                        duration_ms = start.elapsed().as_millis() as u64,
                        error = %e,
                        "HTTP request failed"
                    );
                    return Err(e);
                }
            };

            // Set by RequestIdMiddleware on authenticated routes only
            let (request_id, caller) = match res.request().extensions().get::<CorrelationContext>()
            {
                Some(ctx) => (
                    Some(ctx.request_id.to_string()),
                    Some(ctx.identity.name.clone()),
                ),
                None => (None, None),
            };

            let status = res.status();
            let duration_ms = start.elapsed().as_millis() as u64;

            macro_rules! access_line {
                ($level:ident) => {
                    tracing::$level!(
                        method = %method,
                        path = %path,
                        status = status.as_u16(),
                        duration_ms,
                        request_id = request_id.as_deref(),
                        caller = caller.as_deref(),
                        "HTTP request completed"
                    )
                };
            }

            match status {
                s if s.is_server_error() => access_line!(error),
                s if s.is_client_error() => access_line!(warn),
                _ => access_line!(info),
            }

            Ok(res)
        })
    }
}
