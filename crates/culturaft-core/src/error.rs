//! # Error Types
//!
//! Domain-specific error types for culturaft-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  culturaft-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule and domain failures              │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  culturaft-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  API errors (apps/api)                                                 │
//! │  └── ApiError         - What the SPA sees (JSON + HTTP status)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant reports an [`ErrorKind`], which is the only thing the HTTP
//! layer looks at when choosing a status code.

use thiserror::Error;

/// Error taxonomy shared by every layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed input (400).
    Validation,
    /// Referenced entity absent (404).
    NotFound,
    /// Input is well-formed but breaks a business rule (400).
    BusinessRule,
    /// Caller is not allowed to see or change the entity (403).
    Authorization,
    /// Store or other collaborator failed (500).
    Dependency,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    ///
    /// ## When This Occurs
    /// - Cart references an ID that never existed
    /// - Product was deleted after being added to the client's cart
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Requested quantity exceeds stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (Block-print Scarf × 11)
    ///      │
    ///      ▼
    /// Check stock: available=10
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Block-print Scarf", available: 10, requested: 11 }
    /// ```
    #[error("Not enough stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Checkout with no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Status request rejected by the transition table.
    #[error("Cannot change order status from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    /// The caller does not own the order.
    #[error("Unauthorized")]
    Forbidden,

    /// Legacy order written before shipping/payment were captured.
    #[error("This order does not have invoice details. Please place a new order to generate an invoice.")]
    MissingInvoiceData { order_id: String },

    /// Validation error (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::ProductNotFound(_) | CoreError::OrderNotFound(_) => ErrorKind::NotFound,
            CoreError::InsufficientStock { .. }
            | CoreError::InvalidStatusTransition { .. }
            | CoreError::MissingInvoiceData { .. } => ErrorKind::BusinessRule,
            CoreError::Forbidden => ErrorKind::Authorization,
            CoreError::EmptyCart | CoreError::Validation(_) => ErrorKind::Validation,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., bad card expiry).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required { field: field.into() }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "Brass Diya".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Not enough stock for Brass Diya: available 3, requested 5"
        );
        assert_eq!(err.kind(), ErrorKind::BusinessRule);
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("shippingAddress.city");
        assert_eq!(err.to_string(), "shippingAddress.city is required");

        let err = ValidationError::TooLong {
            field: "title".to_string(),
            max: 200,
        };
        assert_eq!(err.to_string(), "title must be at most 200 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("items").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::Validation);
        assert_eq!(core_err.to_string(), "items is required");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(CoreError::Forbidden.kind(), ErrorKind::Authorization);
        assert_eq!(CoreError::OrderNotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            CoreError::MissingInvoiceData { order_id: "x".into() }.kind(),
            ErrorKind::BusinessRule
        );
    }
}
