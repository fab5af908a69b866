//! Catalog products and the cart line items built from them.

use std::num::NonZeroU32;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ProductId;

/// A catalog product offered to the cart.
///
/// Prices are unit prices in the store currency's standard unit and are
/// serialized as exact JSON numbers, digit for digit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog identifier.
    pub id: ProductId,
    /// Display name.
    pub title: String,
    /// Display image reference.
    pub image_url: String,
    /// Unit price.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub price: Decimal,
}

impl Product {
    /// Create a new product.
    #[must_use]
    pub fn new(
        id: ProductId,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: Decimal,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            image_url: image_url.into(),
            price,
        }
    }
}

/// One distinct product held in a cart.
///
/// The quantity is never zero; a line that would drop to zero is removed
/// from the cart instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub price: Decimal,
    pub quantity: NonZeroU32,
}

impl LineItem {
    /// Start a new line for `product` with a quantity of one.
    #[must_use]
    pub fn from_product(product: Product) -> Self {
        Self {
            id: product.id,
            title: product.title,
            image_url: product.image_url,
            price: product.price,
            quantity: NonZeroU32::MIN,
        }
    }

    /// Unit price multiplied by quantity, or `None` if the product does not
    /// fit in a [`Decimal`].
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity.get()))
    }
}
