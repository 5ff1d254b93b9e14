use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use linkhop_service::ServiceError;
use serde::Serialize;
use tracing::{error, warn};

use crate::headers::{quota_headers, retry_after};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    /// The request body could not be decoded.
    BadRequest(String),
    Service(ServiceError),
}

impl From<ServiceError> for AppError {
    fn from(value: ServiceError) -> Self {
        AppError::Service(value)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn body(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let e = match self {
            AppError::BadRequest(message) => {
                return body(StatusCode::BAD_REQUEST, message).into_response();
            }
            AppError::Service(e) => e,
        };
        match e {
            ServiceError::Validation(message) => {
                body(StatusCode::BAD_REQUEST, message).into_response()
            }
            ServiceError::AliasTaken(alias) => body(
                StatusCode::CONFLICT,
                format!("alias '{alias}' is already in use"),
            )
            .into_response(),
            ServiceError::NotFound(_) => {
                body(StatusCode::NOT_FOUND, "Short URL not found or expired").into_response()
            }
            ServiceError::RateLimited { retry_after: delay, quota } => (
                quota_headers(Some(&quota)),
                [retry_after(delay)],
                body(
                    StatusCode::TOO_MANY_REQUESTS,
                    "Too many requests, please try again later.",
                ),
            )
                .into_response(),
            e @ ServiceError::ExhaustedCapacity { .. } => {
                warn!(error = %e, "code space exhausted");
                body(StatusCode::SERVICE_UNAVAILABLE, "no short code available").into_response()
            }
            ServiceError::Unavailable(cause) => {
                error!(%cause, "request failed on unavailable infrastructure");
                body(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service temporarily unavailable",
                )
                .into_response()
            }
        }
    }
}
