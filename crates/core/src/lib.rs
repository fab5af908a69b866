//! Go Marketplace Core - Shared types library.
//!
//! This crate provides the types shared by every Go Marketplace component:
//! - `cart` - Cart store, persistence, and cart screen model
//! - `cli` - Command-line front end for a locally persisted cart
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage access,
//! no async runtime. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product identifiers, catalog products, cart line items, and currencies

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
