//! Errors returned by cart operations.
//!
//! Every variant is terminal for the single call that produced it. A failed
//! operation never leaves the cart partially mutated and publishes nothing.

use go_marketplace_core::ProductId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Error type for cart mutations and UI actions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// No line item with this id is in the cart.
    #[error("Product not found in cart: {0}")]
    NotFound(ProductId),

    /// A product was offered with a price below zero.
    #[error("Product {id} has a negative price: {price}")]
    NegativePrice { id: ProductId, price: Decimal },

    /// Adding one more of this product would push the cart total past what a
    /// [`Decimal`] can hold.
    #[error("Cart total would overflow adding product {0}")]
    TotalOutOfRange(ProductId),

    /// A UI action id that is neither `increment-<id>` nor `decrement-<id>`.
    #[error("Unknown cart action: {0}")]
    UnknownAction(String),
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
