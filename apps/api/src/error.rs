//! Error types for the API.
//!
//! Every failure leaves the server as `{ "code": ..., "message": ... }` with
//! a status taken from the error taxonomy:
//!
//! ```text
//! Validation, BusinessRule → 400
//! Unauthenticated          → 401
//! Authorization            → 403
//! NotFound                 → 404
//! Dependency               → 500 (generic message unless exposed)
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use culturaft_core::{CoreError, ErrorKind, ValidationError};
use culturaft_db::DbError;

const GENERIC_MESSAGE: &str = "Something went wrong. Please try again later.";

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No identity was forwarded by the gateway.
    #[error("Authentication required")]
    Unauthenticated,

    /// Authenticated, but not an admin.
    #[error("Admin access required")]
    AdminOnly,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(DbError),

    /// A malformed request the extractors rejected.
    #[error("{0}")]
    BadRequest(String),
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Core(core) => ApiError::Core(core),
            other => ApiError::Db(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Core(CoreError::Validation(err))
    }
}

impl ApiError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ApiError::Unauthenticated => None,
            ApiError::AdminOnly => Some(ErrorKind::Authorization),
            ApiError::Core(err) => Some(err.kind()),
            ApiError::Db(err) => Some(err.kind()),
            ApiError::BadRequest(_) => Some(ErrorKind::Validation),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            None => StatusCode::UNAUTHORIZED,
            Some(ErrorKind::Validation | ErrorKind::BusinessRule) => StatusCode::BAD_REQUEST,
            Some(ErrorKind::NotFound) => StatusCode::NOT_FOUND,
            Some(ErrorKind::Authorization) => StatusCode::FORBIDDEN,
            Some(ErrorKind::Dependency) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated => "UNAUTHENTICATED",
            ApiError::AdminOnly => "FORBIDDEN",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Core(err) => match err {
                CoreError::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
                CoreError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
                CoreError::OrderNotFound(_) => "ORDER_NOT_FOUND",
                CoreError::EmptyCart => "EMPTY_CART",
                CoreError::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
                CoreError::Forbidden => "FORBIDDEN",
                CoreError::MissingInvoiceData { .. } => "MISSING_INVOICE_DATA",
                CoreError::Validation(_) => "VALIDATION_ERROR",
            },
            ApiError::Db(DbError::NotFound { .. }) => "NOT_FOUND",
            ApiError::Db(_) => "INTERNAL_ERROR",
        }
    }

    /// Renders the body, hiding dependency details unless `expose`.
    pub fn body(&self, expose: bool) -> ErrorBody {
        let message = match self.kind() {
            Some(ErrorKind::Dependency) if !expose => GENERIC_MESSAGE.to_string(),
            _ => self.to_string(),
        };

        ErrorBody {
            code: self.code(),
            message,
        }
    }
}

/// Full error body for a dependency failure, carried in the response
/// extensions so the router can reveal it when configured to.
#[derive(Debug, Clone)]
pub struct ExposedError(pub ErrorBody);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.code(), error = %self, "Request failed");
        }

        let mut response = (status, Json(self.body(false))).into_response();
        if self.kind() == Some(ErrorKind::Dependency) {
            response.extensions_mut().insert(ExposedError(self.body(true)));
        }
        response
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::AdminOnly.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::from(CoreError::EmptyCart).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(CoreError::InvalidStatusTransition {
                from: "pending".into(),
                to: "shipped".into(),
            })
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(DbError::not_found("Product", "p1")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(CoreError::Forbidden).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_db_core_errors_unwrap() {
        let err = ApiError::from(DbError::Core(CoreError::OrderNotFound("o1".into())));
        assert!(matches!(err, ApiError::Core(CoreError::OrderNotFound(_))));
        assert_eq!(err.code(), "ORDER_NOT_FOUND");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_dependency_message_hidden_unless_exposed() {
        let err = ApiError::from(DbError::QueryFailed("disk I/O error".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let hidden = err.body(false);
        assert_eq!(hidden.code, "INTERNAL_ERROR");
        assert_eq!(hidden.message, GENERIC_MESSAGE);

        assert!(err.body(true).message.contains("disk I/O error"));
    }

    #[test]
    fn test_validation_message_is_shown() {
        let err = ApiError::from(ValidationError::required("shippingAddress.city"));
        let body = err.body(false);
        assert_eq!(body.code, "VALIDATION_ERROR");
        assert_eq!(body.message, "shippingAddress.city is required");
    }
}
