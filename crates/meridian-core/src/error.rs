//! # Domain Errors
//!
//! [`CoreError`] is what pricing, stock and permission checks return.
//! Input checks produce [`ValidationError`]s, which request handlers
//! collect into [`ValidationErrors`] so one response lists every problem.
//! The API crate owns the mapping to HTTP status codes.

use thiserror::Error;

use crate::types::OrderStatus;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Also raised at payment when a line's product was deleted after
    /// checkout.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// At checkout, or at payment under the stock floor when another
    /// order took the units first.
    #[error("Not enough stock for \"{title}\". Available: {available}, Requested: {requested}")]
    InsufficientStock {
        product_id: String,
        title: String,
        available: i64,
        requested: i64,
    },

    #[error("Your cart is empty")]
    EmptyCart,

    /// Neither the request nor the account carries a shipping address.
    #[error("No shipping address provided and no default address found")]
    NoAddressAvailable,

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// The order has left `not_paid`. Of two racing confirmations, the
    /// loser gets this.
    #[error("Order {order_id} has already been processed (status: {status})")]
    OrderAlreadyProcessed {
        order_id: String,
        status: OrderStatus,
    },

    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Role or ownership check failed. Details go to the log only.
    #[error("forbidden")]
    Forbidden,

    /// A line total, subtotal or grand total does not fit in `i64` cents.
    #[error("{0} is too large")]
    AmountOverflow(&'static str),

    #[error("Product {0} is not in the cart")]
    ItemNotInCart(String),

    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Validation failed: {0}")]
    InvalidInput(#[from] ValidationErrors),
}

/// One failed input check. `field` uses the request's JSON field name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} cannot be negative")]
    Negative { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

/// An itemized list of validation failures from one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Records the error from `result`, if any.
    pub fn check(&mut self, result: Result<(), ValidationError>) {
        if let Err(e) = result {
            self.0.push(e);
        }
    }

    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Human-readable messages, one per failure.
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(|e| e.to_string()).collect()
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(e: ValidationError) -> Self {
        Self(vec![e])
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
