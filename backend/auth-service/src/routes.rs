/// Route definitions and middleware setup
use crate::handlers::{get_cert, health, login};
use actix_web::{http::header, middleware::DefaultHeaders, web};

/// Register the login, certificate and health endpoints.
///
/// `/login` answers both GET and POST.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/login")
            .route(web::get().to(login))
            .route(web::post().to(login)),
    )
    .route("/get-cert/{version}", web::get().to(get_cert))
    .route("/health", web::get().to(health));
}

/// Headers stamped on every response
pub fn response_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((
            header::ACCESS_CONTROL_ALLOW_METHODS,
            "POST, GET, PUT, DELETE",
        ))
        .add((header::CONTENT_TYPE, "application/json"))
}
