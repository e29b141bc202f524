//! Request id middleware
//!
//! Mints the request id for every authenticated request and makes it visible
//! to handlers, logs and the caller:
//! - `CorrelationContext` in request extensions (see [`RequestContext`])
//! - `request_id` field on a tracing span wrapping the handler
//! - `x-request-id` response header
//!
//! Must sit inside [`JwtAuthMiddleware`](crate::JwtAuthMiddleware), since the
//! id is derived from the verified identity.
//!
//! ## Example
//! ```rust,ignore
//! use actix_middleware::{JwtAuthMiddleware, RequestIdMiddleware};
//! use actix_web::web;
//!
//! let protected = web::scope("")
//!     .wrap(RequestIdMiddleware)
//!     .wrap(JwtAuthMiddleware::new(verifier));
//! ```

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error, HttpMessage, HttpResponse,
};
use crypto_core::{CorrelationContext, Identity, HTTP_REQUEST_ID_HEADER};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use tracing::Instrument;

/// Middleware that starts a correlation for each authenticated request
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestIdMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RequestIdMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestIdMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestIdMiddlewareService { service }))
    }
}

pub struct RequestIdMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestIdMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let identity = req.extensions().get::<Identity>().cloned();

        let Some(identity) = identity else {
            tracing::error!(path = %req.path(), "No verified identity on request; is JwtAuthMiddleware mounted?");
            let res = req.into_response(HttpResponse::InternalServerError().finish());
            return Box::pin(ready(Ok(res.map_into_right_body())));
        };

        let ctx = CorrelationContext::start(identity);
        let request_id = ctx.request_id.clone();
        let span = tracing::info_span!(
            "http_request",
            request_id = %request_id,
            name = %ctx.identity.name,
        );

        // Store in request extensions for handler access
        req.extensions_mut().insert(ctx);

        let fut = span.in_scope(|| self.service.call(req));

        Box::pin(
            async move {
                let mut res = fut.await?;

                match HeaderValue::from_str(request_id.as_str()) {
                    Ok(value) => {
                        res.headers_mut()
                            .insert(HeaderName::from_static(HTTP_REQUEST_ID_HEADER), value);
                    }
                    Err(_) => {
                        tracing::warn!("Request id is not a valid header value; not echoed");
                    }
                }

                Ok(res.map_into_left_body())
            }
            .instrument(span),
        )
    }
}

/// Correlation context of the current request, extracted from request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext(pub CorrelationContext);

impl actix_web::FromRequest for RequestContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<CorrelationContext>() {
            Some(ctx) => ready(Ok(RequestContext(ctx.clone()))),
            None => {
                tracing::error!(path = %req.path(), "RequestIdMiddleware is not mounted on this route");
                ready(Err(actix_web::error::ErrorInternalServerError(
                    "request context unavailable",
                )))
            }
        }
    }
}
