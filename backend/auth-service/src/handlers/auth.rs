/// Login and certificate publishing handlers
use crate::error::{AppError, Result};
use crate::AppState;
use actix_web::{web, HttpResponse};
use crypto_core::{CertificateVersion, Identity, PublicKeyEnvelope};
use serde::Deserialize;
use tracing::info;

/// Response header carrying a freshly issued session token
pub const TOKEN_HEADER: &str = "token";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    #[serde(default)]
    pub password: String,
}

/// Issue a session token signed with the current certificate version.
///
/// The only credential rule enforced here is a non-empty password; user
/// lookup belongs to the user store.
pub async fn login(state: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse> {
    let request: LoginRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("invalid login payload: {e}")))?;

    if request.password.is_empty() {
        return Err(AppError::WrongPassword);
    }
    // Tokens with an empty name never verify
    if request.name.is_empty() {
        return Err(AppError::BadRequest("empty name".to_string()));
    }

    let identity = Identity::new(request.name);
    let signer = state.clone();
    let token = web::block(move || {
        signer
            .issuer
            .issue(&identity, &signer.signing_version, signer.token_ttl)
    })
    .await??;

    info!(key_version = %state.signing_version, "Issued session token");

    Ok(HttpResponse::Created()
        .insert_header((TOKEN_HEADER, token.as_str()))
        .finish())
}

/// Publish the public key of `version` as `{"publicKey": "<base64 PEM>"}`.
pub async fn get_cert(
    state: web::Data<AppState>,
    version: web::Path<String>,
) -> Result<HttpResponse> {
    let version = CertificateVersion::new(version.into_inner());
    let publisher = state.clone();

    let pem = web::block(move || publisher.publisher.public_key_pem(&version)).await??;

    Ok(HttpResponse::Ok().json(PublicKeyEnvelope {
        public_key: pem.into_bytes(),
    }))
}
