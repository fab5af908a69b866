//! Cart screen model.
//!
//! [`CartView`] is a pure derivation of a [`Cart`]: line rows, totals, and
//! formatted prices. [`CartScreen`] holds an explicit [`CartStore`] handle,
//! re-derives the view from the store's current cart on every render, and
//! turns button presses into store operations.
//!
//! Each row exposes two action ids, `increment-<id>` and `decrement-<id>`,
//! which are what the rendering layer attaches to its buttons and sends back
//! through [`CartScreen::press`].

use core::fmt;

use go_marketplace_core::{CurrencyCode, FormatCurrency, LineItem, ProductId};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::watch;
use tracing::instrument;

use crate::cart::Cart;
use crate::error::{CartError, Result};
use crate::store::CartStore;

const INCREMENT_PREFIX: &str = "increment-";
const DECREMENT_PREFIX: &str = "decrement-";

/// A quantity change requested from the cart screen.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CartAction {
    Increment(ProductId),
    Decrement(ProductId),
}

impl CartAction {
    /// Parse a UI action id such as `increment-42`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UnknownAction`] if the prefix is not recognized
    /// or the product id is missing.
    pub fn parse(action_id: &str) -> Result<Self> {
        let unknown = || CartError::UnknownAction(action_id.to_owned());

        if let Some(id) = action_id.strip_prefix(INCREMENT_PREFIX) {
            let id = ProductId::parse(id).map_err(|_| unknown())?;
            return Ok(Self::Increment(id));
        }
        if let Some(id) = action_id.strip_prefix(DECREMENT_PREFIX) {
            let id = ProductId::parse(id).map_err(|_| unknown())?;
            return Ok(Self::Decrement(id));
        }
        Err(unknown())
    }

    /// Product the action applies to.
    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        match self {
            Self::Increment(id) | Self::Decrement(id) => id,
        }
    }
}

impl fmt::Display for CartAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Increment(id) => write!(f, "{INCREMENT_PREFIX}{id}"),
            Self::Decrement(id) => write!(f, "{DECREMENT_PREFIX}{id}"),
        }
    }
}

impl std::str::FromStr for CartAction {
    type Err = CartError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// One rendered cart row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItemView {
    pub id: String,
    pub title: String,
    pub image_url: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    /// Formatted unit price.
    pub price: String,
    /// Formatted line subtotal.
    pub line_price: String,
    pub increment_action: String,
    pub decrement_action: String,
}

impl CartItemView {
    fn new(item: &LineItem, formatter: &impl FormatCurrency) -> Self {
        // A cart line never exceeds the cart total, which always fits.
        let line_total = item.line_total().unwrap_or(Decimal::MAX);
        Self {
            id: item.id.to_string(),
            title: item.title.clone(),
            image_url: item.image_url.clone(),
            quantity: item.quantity.get(),
            unit_price: item.price,
            line_total,
            price: formatter.format(item.price),
            line_price: formatter.format(line_total),
            increment_action: CartAction::Increment(item.id.clone()).to_string(),
            decrement_action: CartAction::Decrement(item.id.clone()).to_string(),
        }
    }
}

/// Rendered cart: rows plus footer totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total_price: Decimal,
    pub total_quantity: u64,
    /// Formatted `total_price`.
    pub subtotal: String,
}

impl CartView {
    /// Derive the view for `cart`.
    #[must_use]
    pub fn from_cart(cart: &Cart, formatter: &impl FormatCurrency) -> Self {
        let total_price = cart.total_price();
        Self {
            items: cart
                .items()
                .iter()
                .map(|item| CartItemView::new(item, formatter))
                .collect(),
            total_price,
            total_quantity: cart.total_quantity(),
            subtotal: formatter.format(total_price),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Footer label, e.g. `"3 items"`.
    #[must_use]
    pub fn item_count_label(&self) -> String {
        match self.total_quantity {
            1 => "1 item".to_string(),
            n => format!("{n} items"),
        }
    }
}

/// The cart screen: renders the store's cart and forwards quantity changes.
pub struct CartScreen<F = CurrencyCode> {
    store: CartStore,
    updates: watch::Receiver<Cart>,
    formatter: F,
}

impl<F: FormatCurrency> CartScreen<F> {
    /// Attach a screen to `store`, formatting prices with `formatter`.
    #[must_use]
    pub fn new(store: CartStore, formatter: F) -> Self {
        let updates = store.subscribe();
        Self {
            store,
            updates,
            formatter,
        }
    }

    /// Store this screen dispatches to.
    #[must_use]
    pub const fn store(&self) -> &CartStore {
        &self.store
    }

    /// Render the store's current cart.
    #[must_use]
    pub fn render(&self) -> CartView {
        CartView::from_cart(&self.store.read(), &self.formatter)
    }

    /// Wait for the next published cart and render it.
    ///
    /// Returns `None` once the store can no longer publish.
    pub async fn next_render(&mut self) -> Option<CartView> {
        self.updates.changed().await.ok()?;
        let cart = self.updates.borrow_and_update().clone();
        Some(CartView::from_cart(&cart, &self.formatter))
    }

    /// Handle a press on the control with `action_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UnknownAction`] for an unrecognized action id and
    /// [`CartError::NotFound`] if the product is no longer in the cart.
    #[instrument(skip(self))]
    pub fn press(&self, action_id: &str) -> Result<()> {
        let action = CartAction::parse(action_id)?;
        self.dispatch(&action)
    }

    /// Apply `action` to the store.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotFound`] if the product is not in the cart.
    pub fn dispatch(&self, action: &CartAction) -> Result<()> {
        match action {
            CartAction::Increment(id) => self.store.increment(id),
            CartAction::Decrement(id) => self.store.decrement(id),
        }
    }
}
