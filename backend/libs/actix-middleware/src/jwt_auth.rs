use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header, StatusCode},
    Error, HttpMessage, HttpResponse, ResponseError,
};
use crypto_core::{AuthError, Identity, PublicKeyResolver, TokenVerifier};
use futures::future::{ready, LocalBoxFuture, Ready};
use serde_json::json;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Verified caller, extracted from request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Identity);

/// Why the authentication middleware refused a request
#[derive(Debug)]
pub enum AuthRejection {
    /// `Authorization` header absent or empty
    MissingCredential,
    /// The verifier refused the credential
    Verification(AuthError),
}

impl fmt::Display for AuthRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthRejection::MissingCredential => f.write_str("missing Authorization header"),
            AuthRejection::Verification(e) => write!(f, "{e}"),
        }
    }
}

impl ResponseError for AuthRejection {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthRejection::MissingCredential => StatusCode::FORBIDDEN,
            AuthRejection::Verification(e) if e.is_client_error() => StatusCode::UNAUTHORIZED,
            AuthRejection::Verification(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AuthRejection::Verification(e) if e.is_client_error() => {
                HttpResponse::build(self.status_code()).json(json!({ "error": e.to_string() }))
            }
            _ => HttpResponse::build(self.status_code()).finish(),
        }
    }
}

/// JWT Authentication Middleware
///
/// Verifies `Authorization: bearer <token>` with the shared [`TokenVerifier`]
/// and stores the resulting [`Identity`] in request extensions.
pub struct JwtAuthMiddleware<R> {
    verifier: Arc<TokenVerifier<R>>,
}

impl<R> JwtAuthMiddleware<R> {
    pub fn new(verifier: Arc<TokenVerifier<R>>) -> Self {
        Self { verifier }
    }
}

impl<R> Clone for JwtAuthMiddleware<R> {
    fn clone(&self) -> Self {
        Self {
            verifier: Arc::clone(&self.verifier),
        }
    }
}

impl<S, B, R> Transform<S, ServiceRequest> for JwtAuthMiddleware<R>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    R: PublicKeyResolver + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = JwtAuthMiddlewareService<S, R>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            verifier: Arc::clone(&self.verifier),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S, R> {
    service: Rc<S>,
    verifier: Arc<TokenVerifier<R>>,
}

impl<S, B, R> Service<ServiceRequest> for JwtAuthMiddlewareService<S, R>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    R: PublicKeyResolver + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let verifier = Arc::clone(&self.verifier);

        Box::pin(async move {
            // Extract Authorization header
            let auth_header = match req.headers().get(header::AUTHORIZATION) {
                Some(value) if !value.is_empty() => value.to_str().map(str::to_owned),
                _ => return Ok(reject(req, AuthRejection::MissingCredential)),
            };

            let verified = match auth_header {
                Ok(auth_header) => verifier.verify(&auth_header).await,
                Err(_) => Err(AuthError::malformed("Authorization header is not valid ASCII")),
            };

            match verified {
                Ok(identity) => {
                    req.extensions_mut().insert(identity);
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(e) => {
                    if e.is_client_error() {
                        tracing::warn!(path = %req.path(), error = %e, "JWT validation failed");
                    } else {
                        tracing::error!(path = %req.path(), error = %e, "Public key retrieval failed");
                    }
                    Ok(reject(req, AuthRejection::Verification(e)))
                }
            }
        })
    }
}

fn reject<B>(req: ServiceRequest, rejection: AuthRejection) -> ServiceResponse<EitherBody<B>> {
    req.into_response(rejection.error_response())
        .map_into_right_body()
}

/// FromRequest implementation for AuthenticatedUser
impl actix_web::FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<Identity>() {
            Some(identity) => ready(Ok(AuthenticatedUser(identity.clone()))),
            None => ready(Err(actix_web::error::ErrorUnauthorized(
                "User not authenticated",
            ))),
        }
    }
}
