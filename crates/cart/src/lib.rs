//! Go Marketplace Cart library.
//!
//! The cart is a single source of truth for what the shopper intends to buy.
//! Mutations go through [`CartStore`], which publishes every change to its
//! subscribers and writes the same snapshot through to a [`KeyValueStore`].
//! [`CartScreen`] turns the current cart into a render-ready [`CartView`] and
//! forwards button presses back into the store.
//!
//! # Modules
//!
//! - [`cart`] - Ordered, id-unique collection of line items and its mutations
//! - [`store`] - Observable cart store with background write-through
//! - [`snapshot`] - JSON snapshot codec and validation
//! - [`storage`] - Durable key-value capability and its backends
//! - [`view`] - Cart screen model, totals, and UI actions
//! - [`config`] - Environment configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod snapshot;
pub mod storage;
pub mod store;
pub mod view;

pub use cart::Cart;
pub use config::{CartConfig, ConfigError};
pub use error::{CartError, Result};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use store::{CartStore, RestoreOutcome};
pub use view::{CartAction, CartItemView, CartScreen, CartView};
