//! The cart: an ordered, id-unique list of line items.
//!
//! Order is observable. Incrementing or decrementing a line moves it to the
//! end, so the most recently touched lines sit at the bottom of the list.
//!
//! The cart total always fits in a [`Decimal`]. Changes that would push it
//! past that are rejected before anything is touched.

use std::collections::HashSet;
use std::num::NonZeroU32;

use go_marketplace_core::{LineItem, Product, ProductId};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{CartError, Result};
use crate::snapshot::SnapshotError;

/// Ordered collection of line items, unique by product id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from previously stored lines, checking cart invariants.
    ///
    /// # Errors
    ///
    /// Returns an error if two lines share an id, a line has a negative
    /// price, or the lines together overflow the cart total.
    pub fn try_from_items(items: Vec<LineItem>) -> std::result::Result<Self, SnapshotError> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(&item.id) {
                return Err(SnapshotError::DuplicateId(item.id.clone()));
            }
            if is_negative(item.price) {
                return Err(SnapshotError::NegativePrice(item.id.clone()));
            }
        }
        if checked_total(&items).is_none() {
            return Err(SnapshotError::TotalOutOfRange);
        }
        Ok(Self { items })
    }

    /// Lines in display order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Consume the cart and return its lines.
    #[must_use]
    pub fn into_items(self) -> Vec<LineItem> {
        self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a line by product id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Add a product.
    ///
    /// A product already in the cart is incremented instead of added twice.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NegativePrice`] if the product's price is below
    /// zero, or [`CartError::TotalOutOfRange`] if the cart total would
    /// overflow.
    pub fn add(&mut self, product: Product) -> Result<()> {
        if self.contains(&product.id) {
            return self.increment(&product.id);
        }
        if is_negative(product.price) {
            return Err(CartError::NegativePrice {
                id: product.id,
                price: product.price,
            });
        }
        if self.total_price().checked_add(product.price).is_none() {
            return Err(CartError::TotalOutOfRange(product.id));
        }
        self.items.push(LineItem::from_product(product));
        Ok(())
    }

    /// Raise a line's quantity by one and move it to the end.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotFound`] if no line has this id, or
    /// [`CartError::TotalOutOfRange`] if the cart total would overflow.
    pub fn increment(&mut self, id: &ProductId) -> Result<()> {
        let item = self.get(id).ok_or_else(|| CartError::NotFound(id.clone()))?;
        let grows = item.quantity < NonZeroU32::MAX;
        if grows && self.total_price().checked_add(item.price).is_none() {
            return Err(CartError::TotalOutOfRange(id.clone()));
        }

        let mut item = self.take(id)?;
        item.quantity = item.quantity.saturating_add(1);
        self.items.push(item);
        Ok(())
    }

    /// Lower a line's quantity by one and move it to the end.
    ///
    /// A line at quantity one is removed.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotFound`] if no line has this id.
    pub fn decrement(&mut self, id: &ProductId) -> Result<()> {
        let mut item = self.take(id)?;
        if let Some(quantity) = NonZeroU32::new(item.quantity.get() - 1) {
            item.quantity = quantity;
            self.items.push(item);
        }
        Ok(())
    }

    /// Sum of unit price times quantity over all lines.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        // Every constructor and mutation keeps the total in range.
        checked_total(&self.items).unwrap_or(Decimal::MAX)
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }

    /// Remove and return the line with this id.
    fn take(&mut self, id: &ProductId) -> Result<LineItem> {
        let index = self
            .items
            .iter()
            .position(|item| &item.id == id)
            .ok_or_else(|| CartError::NotFound(id.clone()))?;
        Ok(self.items.remove(index))
    }
}

fn is_negative(price: Decimal) -> bool {
    price.is_sign_negative() && !price.is_zero()
}

fn checked_total(items: &[LineItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |total, item| total.checked_add(item.line_total()?))
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
