use actix_middleware::Logging;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use api_gateway::{configure, DownstreamServices, RemoteCertificateClient, Settings};
use crypto_core::TokenVerifier;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::prelude::*;

#[actix_web::main]
async fn main() -> Result<()> {
    // Initialize structured logging with JSON format
    // Span context carries the request id of the current request
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,api_gateway=debug,crypto_core=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true),
        )
        .init();

    info!("Starting API Gateway...");

    let settings = Settings::from_env().context("Failed to load configuration")?;

    let cert_client =
        RemoteCertificateClient::new(&settings.cert_endpoint.url, settings.cert_endpoint.timeout)?;
    let verifier = Arc::new(TokenVerifier::new(cert_client));

    info!(
        cert_endpoint = %settings.cert_endpoint.url,
        timeout_secs = settings.cert_endpoint.timeout.as_secs(),
        "Token verification uses remote public keys"
    );

    let downstream = web::Data::new(DownstreamServices::connect_lazy(&settings.downstream)?);

    info!(
        users = %settings.downstream.users_address,
        accounts = %settings.downstream.accounts_address,
        "Downstream channels initialized"
    );

    info!("API Gateway starting on http://{}", settings.http_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Logging)
            .app_data(downstream.clone())
            .configure(configure(verifier.clone()))
    })
    .bind(&settings.http_address)
    .with_context(|| format!("Failed to bind {}", settings.http_address))?
    .run()
    .await
    .context("HTTP server terminated with error")?;

    Ok(())
}
