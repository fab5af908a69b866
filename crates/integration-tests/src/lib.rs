//! Integration tests for Go Marketplace.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p go-marketplace-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_restart` - Cart state surviving a process restart through `FileStore`
//! - `cart_screen` - Cart screen flows against a file-backed store
//!
//! Shared fixtures live here so every test file builds carts the same way.

use std::path::Path;
use std::sync::Arc;

use go_marketplace_cart::snapshot::{self, DEFAULT_NAMESPACE};
use go_marketplace_cart::{CartStore, FileStore};
use go_marketplace_core::{Product, ProductId};
use rust_decimal::Decimal;

/// Storage key used by every fixture store.
#[must_use]
pub fn cart_key() -> String {
    snapshot::storage_key(DEFAULT_NAMESPACE)
}

/// Open a store over the snapshot directory `dir`, as a fresh app launch would.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
#[must_use]
pub fn open_store(dir: &Path) -> CartStore {
    CartStore::new(Arc::new(FileStore::new(dir)), cart_key())
}

/// A catalog product priced in whole currency units.
///
/// # Panics
///
/// Panics if `id` is empty.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn product(id: &str, title: &str, price: i64) -> Product {
    Product::new(
        ProductId::parse(id).unwrap(),
        title,
        format!("https://cdn.example.test/{id}.png"),
        Decimal::new(price, 0),
    )
}
