pub mod auth;

pub use auth::{get_cert, login, LoginRequest, TOKEN_HEADER};

use actix_web::HttpResponse;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json("ok")
}
