use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use retailpos_core::errors::{DatabaseError, Error as CoreError};
use retailpos_core::sales::CheckoutError;
use retailpos_core::segmentation::SegmentationError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("{0}")]
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    code: u16,
    message: String,
}

fn core_status(err: &CoreError) -> StatusCode {
    match err {
        CoreError::NotFound(_)
        | CoreError::Database(DatabaseError::NotFound(_))
        | CoreError::Checkout(CheckoutError::CustomerNotFound { .. })
        | CoreError::Checkout(CheckoutError::ProductNotFound { .. }) => StatusCode::NOT_FOUND,
        CoreError::Validation(_)
        | CoreError::Promotion(_)
        | CoreError::Checkout(_)
        | CoreError::Segmentation(SegmentationError::InvalidClusterCount(_))
        | CoreError::Segmentation(SegmentationError::InsufficientData) => StatusCode::BAD_REQUEST,
        CoreError::ConcurrencyConflict(_)
        | CoreError::Segmentation(SegmentationError::RunConflict { .. })
        | CoreError::Database(DatabaseError::UniqueViolation(_)) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Core(e) => core_status(e),
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let body = Json(ErrorBody {
            success: false,
            code: status.as_u16(),
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
