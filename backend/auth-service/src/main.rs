/// Auth Service - Main entry point
///
/// Serves token issuance and public key distribution over HTTP.
use actix_middleware::Logging;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use auth_service::{configure, response_headers, AppState, Settings};
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

#[actix_web::main]
async fn main() -> Result<()> {
    // Structured JSON logs; span fields (request ids) ride along on every line
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,auth_service=debug,crypto_core=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true),
        )
        .init();

    info!("Starting Auth Service...");

    let settings = Settings::from_env().context("Failed to load configuration")?;

    info!(
        cert_path = %settings.certificates.path.display(),
        cert_version = %settings.certificates.version,
        token_expire_secs = settings.certificates.token_expire.as_secs(),
        "Configuration loaded"
    );

    let state = AppState::new(&settings.certificates);

    // Login keeps answering 500 until the key appears, so only warn
    if let Err(e) = state.publisher.public_key_pem(&state.signing_version) {
        warn!(error = %e, "Signing key for the configured version is not usable");
    }

    let state = web::Data::new(state);
    let bind_addr = (settings.server.host.clone(), settings.server.port);

    info!(
        "Auth Service starting on http://{}:{}",
        settings.server.host, settings.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(response_headers())
            .wrap(Logging)
            .app_data(state.clone())
            .configure(configure)
    })
    .shutdown_timeout(settings.server.shutdown_timeout)
    .bind(bind_addr)
    .context("Failed to bind HTTP listener")?
    .run()
    .await
    .context("HTTP server terminated with error")?;

    info!("Auth Service stopped");

    Ok(())
}
