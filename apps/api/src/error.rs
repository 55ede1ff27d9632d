//! Wire-level error envelope.
//!
//! Domain and storage errors are mapped to HTTP statuses here and nowhere
//! else. Database internals are logged server-side and never leak into the
//! response body.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use viajes_core::CoreError;
use viajes_db::BookingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    Duplicate,
    AlreadyFinalized,
    EmptyCart,
    InsufficientStock,
    Validation,
    Internal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::NotFound,
            message: message.into(),
        }
    }

    fn status(&self) -> StatusCode {
        match self.code {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Duplicate | ErrorCode::AlreadyFinalized => StatusCode::CONFLICT,
            ErrorCode::EmptyCart | ErrorCode::InsufficientStock | ErrorCode::Validation => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Domain(core) => {
                let code = match &core {
                    CoreError::PackageNotFound(_)
                    | CoreError::ServiceNotFound(_)
                    | CoreError::UserNotFound(_)
                    | CoreError::CartItemNotFound(_)
                    | CoreError::ReservationNotFound(_) => ErrorCode::NotFound,
                    CoreError::DuplicateItem { .. } => ErrorCode::Duplicate,
                    CoreError::AlreadyFinalized { .. } => ErrorCode::AlreadyFinalized,
                    CoreError::EmptyCart => ErrorCode::EmptyCart,
                    CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
                    CoreError::CartTooLarge { .. }
                    | CoreError::TravelDateInPast { .. }
                    | CoreError::Validation(_) => ErrorCode::Validation,
                };
                Self {
                    code,
                    message: core.to_string(),
                }
            }
            BookingError::Db(db) => {
                tracing::error!(error = %db, "database error");
                Self {
                    code: ErrorCode::Internal,
                    message: "Internal server error".to_string(),
                }
            }
        }
    }
}

impl From<viajes_db::DbError> for ApiError {
    fn from(err: viajes_db::DbError) -> Self {
        BookingError::Db(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        (status, Json(self)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_keep_their_message() {
        let err: ApiError = BookingError::Domain(CoreError::EmptyCart).into();
        assert_eq!(err.code, ErrorCode::EmptyCart);
        assert_eq!(err.message, "The cart is empty");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn database_errors_get_a_generic_body() {
        let err: ApiError =
            BookingError::Db(viajes_db::DbError::PoolExhausted).into();
        assert_eq!(err.code, ErrorCode::Internal);
        assert_eq!(err.message, "Internal server error");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
