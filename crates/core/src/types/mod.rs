//! Core types for Go Marketplace.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod product;

pub use id::{ProductId, ProductIdError};
pub use price::{CurrencyCode, CurrencyCodeError, FormatCurrency};
pub use product::{LineItem, Product};
