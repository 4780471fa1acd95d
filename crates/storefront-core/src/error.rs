//! Commerce error types.

use crate::ids::ProductId;
use thiserror::Error;

/// Errors that can occur in cart, wishlist and checkout operations.
///
/// Local validation variants (`Validation`, `OutOfStock`, `StockExceeded`,
/// `ProductNotFound`, `AuthRequired`) are raised before any state is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommerceError {
    /// Missing or malformed user input (e.g. no size chosen).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The requested size has no stock at all.
    #[error("Size {size} of product {product_id} is out of stock")]
    OutOfStock { product_id: ProductId, size: String },

    /// The requested quantity is above the available stock.
    #[error("Cannot set {requested} of size {size}: only {available} available for {product_id}")]
    StockExceeded {
        product_id: ProductId,
        size: String,
        requested: u32,
        available: u32,
    },

    /// Product is not in the current catalog snapshot.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The action needs an authenticated session.
    #[error("Please login to continue")]
    AuthRequired,

    /// Checkout needs at least one item in the cart.
    #[error("Your cart is empty")]
    CartEmpty,

    /// A remote call failed or returned a non-success payload.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Payment provider initiation or capture failed.
    #[error("Payment error: {0}")]
    Payment(String),

    /// Invalid checkout state transition.
    #[error("Invalid checkout transition from {from} to {to}")]
    InvalidCheckoutTransition { from: String, to: String },

    /// Order cannot be cancelled in its current state.
    #[error("Order {0} can no longer be cancelled")]
    NotCancellable(String),

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CommerceError {
    /// Whether the error came from local validation rather than a remote call.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            CommerceError::Validation(_)
                | CommerceError::OutOfStock { .. }
                | CommerceError::StockExceeded { .. }
                | CommerceError::ProductNotFound(_)
                | CommerceError::AuthRequired
                | CommerceError::CartEmpty
        )
    }
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::Serialization(e.to_string())
    }
}
