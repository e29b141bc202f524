/// Error types for Auth Service
///
/// Client errors map to 4xx with an empty body. Key material failures are
/// logged here and surface as a bare 500.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use crypto_core::AuthError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Request body could not be decoded
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Wrong password")]
    WrongPassword,

    /// Signing or publishing failed on our side
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::WrongPassword => StatusCode::BAD_REQUEST,
            AppError::Auth(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Rejected request");
        }

        HttpResponse::build(status).finish()
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::Internal(e.to_string())
    }
}
