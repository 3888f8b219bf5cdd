use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use shared::error::{ApiException, ErrorCode};

pub type AppResult<T> = Result<T, AppError>;

/// Handler-level error: carries the taxonomy code for the status mapping and
/// logs on the way out. Internal details never reach the body.
#[derive(Debug)]
pub struct AppError(pub ApiException);

impl From<ApiException> for AppError {
    fn from(e: ApiException) -> Self {
        Self(e)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        Self(ApiException::internal(format!("{e:#}")))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0.code {
            ErrorCode::NotFound => (StatusCode::NOT_FOUND, self.0.message.clone()),
            ErrorCode::Validation => (StatusCode::BAD_REQUEST, self.0.message.clone()),
            ErrorCode::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too Many Requests".to_owned(),
            ),
            ErrorCode::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_owned(),
            ),
        };

        warn!(code = self.0.code.as_str(), error = %self.0.message, "handler error");

        (status, body).into_response()
    }
}
