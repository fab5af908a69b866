//! Cart commands.
//!
//! Every command opens the file-backed cart, restores the last snapshot,
//! applies at most one change, waits for the snapshot to reach disk, and
//! prints the rendered cart.
//!
//! # Environment Variables
//!
//! - `CART_STORAGE_DIR` - Directory holding the cart snapshot
//! - `CART_STORAGE_NAMESPACE` - Storage key namespace
//! - `CART_CURRENCY` - Display currency

use std::sync::Arc;

use go_marketplace_cart::{
    CartAction, CartConfig, CartError, CartScreen, CartStore, CartView, ConfigError, FileStore,
    StorageError,
};
use go_marketplace_core::{Product, ProductId, ProductIdError};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur while running a cart command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The cart rejected the change.
    #[error("{0}")]
    Cart(#[from] CartError),

    /// The changed cart could not be written to storage.
    #[error("Failed to save cart: {0}")]
    Storage(#[from] StorageError),

    /// Invalid product id argument.
    #[error("Invalid product id: {0}")]
    ProductId(#[from] ProductIdError),

    /// Rendering the cart as JSON failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// An open cart for the duration of one command.
pub struct Session {
    screen: CartScreen,
}

impl Session {
    /// Open the configured cart and restore its last snapshot.
    pub async fn open(config: &CartConfig) -> Self {
        let storage = Arc::new(FileStore::new(&config.storage_dir));
        let store = CartStore::new(storage, config.storage_key());

        let outcome = store.restore().await;
        debug!(?outcome, dir = %config.storage_dir.display(), "Cart opened");

        Self {
            screen: CartScreen::new(store, config.currency),
        }
    }

    /// Print the cart.
    pub fn show(&self, json: bool) -> Result<(), CommandError> {
        print_view(&self.screen.render(), json)
    }

    /// Add a product, or bump its quantity if it is already in the cart.
    pub async fn add(
        &self,
        id: &str,
        title: String,
        image_url: String,
        price: Decimal,
    ) -> Result<(), CommandError> {
        let product = Product::new(ProductId::parse(id)?, title, image_url, price);
        self.screen.store().add_to_cart(product)?;
        self.save_and_show().await
    }

    /// Apply a quantity change.
    pub async fn apply(&self, action: &CartAction) -> Result<(), CommandError> {
        self.screen.dispatch(action)?;
        self.save_and_show().await
    }

    /// Dispatch a cart screen action id.
    pub async fn press(&self, action_id: &str) -> Result<(), CommandError> {
        self.screen.press(action_id)?;
        self.save_and_show().await
    }

    async fn save_and_show(&self) -> Result<(), CommandError> {
        self.screen.store().flush().await?;
        info!(key = %self.screen.store().key(), "Cart saved");
        self.show(false)
    }
}

#[allow(clippy::print_stdout)]
fn print_view(view: &CartView, json: bool) -> Result<(), CommandError> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }

    if view.is_empty() {
        println!("Cart is empty");
        return Ok(());
    }

    for item in &view.items {
        println!("{}", item.title);
        println!(
            "  {} x{} = {}    [{}] [{}]",
            item.price, item.quantity, item.line_price, item.increment_action, item.decrement_action
        );
    }
    println!();
    println!("{}    {}", view.item_count_label(), view.subtotal);
    Ok(())
}
