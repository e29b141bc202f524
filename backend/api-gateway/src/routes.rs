/// Gateway routes
///
/// `/health` is public. Everything else sits behind bearer authentication
/// followed by request id minting.
use crate::downstream::{DownstreamServices, ServiceHealth};
use actix_middleware::{JwtAuthMiddleware, RequestContext, RequestIdMiddleware};
use actix_web::{web, HttpResponse};
use crypto_core::{PublicKeyResolver, TokenVerifier};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub name: String,
    pub request_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownstreamHealthReport {
    pub request_id: String,
    pub services: Vec<ServiceHealth>,
}

async fn health_handler() -> &'static str {
    "ok"
}

/// Who the caller is and which request id this call was given
async fn session_handler(ctx: RequestContext) -> HttpResponse {
    let ctx = ctx.0;
    info!("Session lookup");

    HttpResponse::Ok().json(SessionInfo {
        name: ctx.identity.name,
        request_id: ctx.request_id.to_string(),
    })
}

async fn downstream_health_handler(
    services: web::Data<DownstreamServices>,
    ctx: RequestContext,
) -> HttpResponse {
    let ctx = ctx.0;
    let services = services.check_all(&ctx).await;

    HttpResponse::Ok().json(DownstreamHealthReport {
        request_id: ctx.request_id.to_string(),
        services,
    })
}

/// Mount the gateway routes; protected routes verify through `verifier`.
///
/// Callers must register `web::Data<DownstreamServices>` on the app.
pub fn configure<R>(verifier: Arc<TokenVerifier<R>>) -> impl FnOnce(&mut web::ServiceConfig)
where
    R: PublicKeyResolver + 'static,
{
    move |cfg| {
        cfg.route("/health", web::get().to(health_handler)).service(
            web::scope("")
                .wrap(RequestIdMiddleware)
                .wrap(JwtAuthMiddleware::new(verifier))
                .route("/session", web::get().to(session_handler))
                .route("/downstream-health", web::get().to(downstream_health_handler)),
        );
    }
}
