//! Loopback servers shared by the gateway integration tests

#![allow(dead_code)]

use actix_web::{web, App, HttpResponse, HttpServer};
use auth_service::config::CertificateConfig;
use auth_service::AppState;
use crypto_core::{CertificateVersion, RequestId};
use grpc_correlation::{RequestIdExt, RequestIdExtractor};
use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tonic::service::Interceptor;
use tonic::{Request, Status};
use tokio_stream::wrappers::TcpListenerStream;

pub const CERTIFICATES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../auth-service/certificates");

/// Start the real auth service on an ephemeral port. Returns its base URL.
pub fn spawn_auth_service() -> String {
    let state = web::Data::new(AppState::new(&CertificateConfig {
        path: PathBuf::from(CERTIFICATES),
        version: CertificateVersion::new("1"),
        token_expire: Duration::from_secs(600),
    }));

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(auth_service::configure)
    })
    .workers(1)
    .disable_signals()
    .listen(listener)
    .unwrap()
    .run();
    actix_web::rt::spawn(server);

    format!("http://{addr}")
}

/// Log in against a running auth service and return the issued token.
pub async fn login(auth_base: &str, name: &str) -> String {
    let response = reqwest::Client::new()
        .get(format!("{auth_base}/login"))
        .json(&serde_json::json!({ "name": name, "password": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    response
        .headers()
        .get("token")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

/// Certificate endpoints that misbehave in specific ways. Returns the base URL.
pub fn spawn_faulty_cert_endpoints() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(|| {
        App::new()
            .route(
                "/bad-json/{version}",
                web::get().to(|| async { HttpResponse::Ok().body("not json") }),
            )
            .route(
                "/bad-base64/{version}",
                web::get().to(|| async {
                    HttpResponse::Ok().json(serde_json::json!({ "publicKey": "!!!" }))
                }),
            )
            .route(
                "/bad-pem/{version}",
                web::get().to(|| async {
                    // base64("garbage")
                    HttpResponse::Ok().json(serde_json::json!({ "publicKey": "Z2FyYmFnZQ==" }))
                }),
            )
            .route(
                "/error/{version}",
                web::get().to(|| async { HttpResponse::InternalServerError().finish() }),
            )
            .route(
                "/slow/{version}",
                web::get().to(|| async {
                    actix_web::rt::time::sleep(Duration::from_secs(2)).await;
                    HttpResponse::Ok().json(serde_json::json!({ "publicKey": "" }))
                }),
            )
    })
    .workers(1)
    .disable_signals()
    .listen(listener)
    .unwrap()
    .run();
    actix_web::rt::spawn(server);

    format!("http://{addr}")
}

/// Address nothing listens on.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub type Seen = Arc<Mutex<Vec<Option<RequestId>>>>;

/// gRPC health server recording the request id of every call it receives.
pub async fn spawn_health_backend() -> (SocketAddr, Seen) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen: Seen = Arc::default();

    let recorder = {
        let seen = seen.clone();
        move |request: Request<()>| -> Result<Request<()>, Status> {
            let request = RequestIdExtractor.call(request)?;
            seen.lock().unwrap().push(request.request_id());
            Ok(request)
        }
    };

    let (_reporter, health_service) = tonic_health::server::health_reporter();

    tokio::spawn(
        tonic::transport::Server::builder()
            .layer(tonic::service::interceptor(recorder))
            .add_service(health_service)
            .serve_with_incoming(TcpListenerStream::new(listener)),
    );

    (addr, seen)
}
