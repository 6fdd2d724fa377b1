//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Meridian                               │
//! │                                                                         │
//! │  Handler ──► Service ──► Result<T, ApiError>                            │
//! │                              ▲        ▲        ▲                        │
//! │                              │        │        │                        │
//! │            CoreError ────────┘        │        │                        │
//! │            (domain rules)             │        │                        │
//! │            DbError ───────────────────┘        │                        │
//! │            (infrastructure)                    │                        │
//! │            JSON / query rejections ────────────┘                        │
//! │                                                                         │
//! │  ApiError ──IntoResponse──► status + { code, message, details }         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Response Body
//! ```json
//! {
//!   "code": "BUSINESS_RULE",
//!   "message": "Not enough stock for \"Lamp\". Available: 2, Requested: 5",
//!   "details": []
//! }
//! ```

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use meridian_core::{CoreError, ValidationError, ValidationErrors};
use meridian_db::DbError;

/// Result type for services and handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// API error returned from handlers.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,

    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// One entry per failed field, for validation errors
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

/// Error codes for API responses.
///
/// ## Usage in Frontend
/// ```typescript
/// switch (body.code) {
///   case 'BUSINESS_RULE':
///     showNotification(body.message);
///     break;
///   case 'VALIDATION_ERROR':
///     showFieldErrors(body.details);
///     break;
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (422, or 400 for unparseable input)
    ValidationError,

    /// Resource not found (404)
    NotFound,

    /// Missing or invalid credentials (401)
    Unauthorized,

    /// Authenticated but not allowed (403)
    Forbidden,

    /// Duplicate or state conflict (409)
    Conflict,

    /// Request is well-formed but violates a checkout rule (422)
    BusinessRule,

    /// Internal server error (500)
    InternalError,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::BusinessRule => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error with the code's default status.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            status: code.status(),
            code,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden() -> Self {
        ApiError::new(ErrorCode::Forbidden, "forbidden")
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Conflict, message)
    }

    pub fn business_rule(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::BusinessRule, message)
    }

    /// Itemized validation failure (422).
    pub fn validation(errors: ValidationErrors) -> Self {
        ApiError {
            details: errors.messages(),
            ..ApiError::new(ErrorCode::ValidationError, "Validation failed")
        }
    }

    /// Input that could not be parsed at all (400).
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            ..ApiError::new(ErrorCode::ValidationError, message)
        }
    }

    /// Logs the cause and hides it from the client.
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        error!(error = %cause, "Internal error");
        ApiError::new(ErrorCode::InternalError, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                ApiError::conflict(format!("{} '{}' already exists", field, value))
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!(message = %message, "Foreign key violation");
                ApiError::validation(
                    ValidationError::InvalidFormat {
                        field: "reference".to_string(),
                        reason: "refers to a record that does not exist".to_string(),
                    }
                    .into(),
                )
            }
            other => ApiError::internal(other),
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::OrderNotFound(id) => ApiError::not_found("Order", &id),
            CoreError::ItemNotInCart(_) => ApiError::new(ErrorCode::NotFound, err.to_string()),
            CoreError::Forbidden => ApiError::forbidden(),
            CoreError::OrderAlreadyProcessed { .. } | CoreError::InvalidStatusTransition { .. } => {
                ApiError::conflict(err.to_string())
            }
            CoreError::InsufficientStock { .. }
            | CoreError::EmptyCart
            | CoreError::NoAddressAvailable
            | CoreError::CartTooLarge { .. }
            | CoreError::AmountOverflow(_) => ApiError::business_rule(err.to_string()),
            CoreError::QuantityTooLarge { .. } => ApiError::validation(
                ValidationError::InvalidFormat {
                    field: "quantity".to_string(),
                    reason: err.to_string(),
                }
                .into(),
            ),
            CoreError::Validation(e) => ApiError::validation(e.into()),
            CoreError::InvalidInput(errors) => ApiError::validation(errors),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::validation(errors)
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApiError::validation(error.into())
    }
}

/// Malformed JSON is a 400; well-formed JSON of the wrong shape is a 422.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        match rejection {
            JsonRejection::JsonDataError(_) => ApiError {
                details: vec![message.clone()],
                ..ApiError::new(ErrorCode::ValidationError, "Request body has the wrong shape")
            },
            _ => ApiError::bad_request(message),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::OrderStatus;

    #[test]
    fn test_core_error_mapping() {
        let cases = [
            (CoreError::EmptyCart, StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::BusinessRule),
            (CoreError::NoAddressAvailable, StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::BusinessRule),
            (CoreError::Forbidden, StatusCode::FORBIDDEN, ErrorCode::Forbidden),
            (CoreError::OrderNotFound("o".into()), StatusCode::NOT_FOUND, ErrorCode::NotFound),
            (
                CoreError::OrderAlreadyProcessed {
                    order_id: "o".into(),
                    status: OrderStatus::Pending,
                },
                StatusCode::CONFLICT,
                ErrorCode::Conflict,
            ),
            (
                CoreError::InsufficientStock {
                    product_id: "p".into(),
                    title: "Lamp".into(),
                    available: 2,
                    requested: 5,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::BusinessRule,
            ),
        ];

        for (err, status, code) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status, status);
            assert_eq!(api.code, code);
        }
    }

    #[test]
    fn test_forbidden_message_is_fixed() {
        let api: ApiError = CoreError::Forbidden.into();
        assert_eq!(api.message, "forbidden");
    }

    #[test]
    fn test_validation_is_itemized() {
        let mut errors = ValidationErrors::new();
        errors.push(ValidationError::Required { field: "city".into() });
        errors.push(ValidationError::Required { field: "country".into() });

        let api: ApiError = CoreError::InvalidInput(errors).into();
        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(api.details, vec!["city is required", "country is required"]);
    }

    #[test]
    fn test_db_errors() {
        let api: ApiError = DbError::duplicate("promocode", "SAVE20").into();
        assert_eq!(api.status, StatusCode::CONFLICT);

        let api: ApiError = DbError::QueryFailed("disk I/O error".into()).into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, "Internal server error");
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::business_rule("Your cart is empty")).unwrap();
        assert_eq!(json["code"], "BUSINESS_RULE");
        assert_eq!(json["message"], "Your cart is empty");
        assert!(json.get("details").is_none());
        assert!(json.get("status").is_none());
    }
}
