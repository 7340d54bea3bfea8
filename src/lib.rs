//! OpenSASE Back Office
//!
//! Catalog administration, session carts and the order lifecycle behind a
//! small self-hosted shop.
//!
//! ## Features
//! - Catalog, supplier and item registry
//! - Per-user session cart with price snapshots
//! - Checkout that clears the cart in the same transaction as the order insert
//! - Order lifecycle: `Pending` orders may be edited or cancelled, `Cancelled` is terminal
//! - Owner-or-admin access to every order

pub mod access;
pub mod api;
pub mod config;
pub mod domain;
pub mod publisher;
pub mod services;
pub mod store;

use thiserror::Error;
use domain::aggregates::{OrderError, OrderStatus};
use domain::value_objects::{MoneyError, QuantityError};

pub use access::{Caller, Role};
pub use services::Backoffice;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum BackofficeError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("authentication required")]
    Unauthenticated,

    #[error("not allowed")]
    Forbidden,

    #[error("cannot {action} an order that is {status}")]
    InvalidTransition { status: OrderStatus, action: &'static str },

    #[error("cart is empty")]
    EmptyCart,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<OrderError> for BackofficeError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::InvalidTransition { status, action } => Self::InvalidTransition { status, action },
            OrderError::LineNotFound(id) => Self::NotFound(format!("order line {id}")),
            OrderError::NoLines => Self::EmptyCart,
            OrderError::BlankStatus | OrderError::MissingCustomerField(_) => Self::Validation(e.to_string()),
        }
    }
}

impl From<QuantityError> for BackofficeError {
    fn from(e: QuantityError) -> Self { Self::Validation(e.to_string()) }
}

impl From<MoneyError> for BackofficeError {
    fn from(e: MoneyError) -> Self { Self::Validation(e.to_string()) }
}

impl From<validator::ValidationErrors> for BackofficeError {
    fn from(e: validator::ValidationErrors) -> Self { Self::Validation(e.to_string()) }
}

impl From<sqlx::Error> for BackofficeError {
    fn from(e: sqlx::Error) -> Self { Self::Storage(e.to_string()) }
}

impl From<serde_json::Error> for BackofficeError {
    fn from(e: serde_json::Error) -> Self { Self::Storage(e.to_string()) }
}

pub type Result<T> = std::result::Result<T, BackofficeError>;
