//! Cart snapshots: the JSON form of a cart in durable storage.
//!
//! A snapshot is a JSON array of line items:
//!
//! ```json
//! [{"id":"1","title":"Cadeira","image_url":"c.png","price":400,"quantity":2}]
//! ```
//!
//! Decoding checks the same invariants the cart enforces in memory, so a
//! snapshot edited or truncated outside the app is rejected as a whole.

use go_marketplace_core::{LineItem, ProductId};
use thiserror::Error;

use crate::cart::Cart;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "@GoMarketplace";

/// Errors decoding or encoding a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Not a JSON array of line items.
    #[error("Snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Two lines share the same product id.
    #[error("Snapshot contains product {0} more than once")]
    DuplicateId(ProductId),

    /// A line has a price below zero.
    #[error("Snapshot has a negative price for product {0}")]
    NegativePrice(ProductId),

    /// The line totals do not fit in a `Decimal`.
    #[error("Snapshot total is out of range")]
    TotalOutOfRange,
}

/// Storage key for the cart under `namespace`.
#[must_use]
pub fn storage_key(namespace: &str) -> String {
    format!("{namespace}:products")
}

/// Serialize a cart into its snapshot form.
///
/// # Errors
///
/// Returns [`SnapshotError::Json`] if serialization fails.
pub fn encode(cart: &Cart) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string(cart.items())?)
}

/// Parse a snapshot back into a cart.
///
/// # Errors
///
/// Returns an error if the input is not a JSON array of line items or if it
/// breaks a cart invariant.
pub fn decode(raw: &str) -> Result<Cart, SnapshotError> {
    let items: Vec<LineItem> = serde_json::from_str(raw)?;
    Cart::try_from_items(items)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use go_marketplace_core::Product;
    use rust_decimal::Decimal;

    use super::*;

    fn sample_cart() -> Cart {
        let mut cart = Cart::new();
        for (id, price) in [("1", Decimal::new(1950, 2)), ("2", Decimal::new(400, 0))] {
            cart.add(Product::new(
                ProductId::parse(id).unwrap(),
                format!("Item {id}"),
                format!("https://cdn.example.test/{id}.png"),
                price,
            ))
            .unwrap();
        }
        cart.add(Product::new(
            ProductId::parse("2").unwrap(),
            "Item 2",
            "https://cdn.example.test/2.png",
            Decimal::new(400, 0),
        ))
        .unwrap();
        cart
    }

    #[test]
    fn test_storage_key() {
        assert_eq!(storage_key(DEFAULT_NAMESPACE), "@GoMarketplace:products");
    }

    #[test]
    fn test_restore_equals_persisted() {
        let cart = sample_cart();
        let restored = decode(&encode(&cart).unwrap()).unwrap();
        assert_eq!(restored, cart);
        assert_eq!(restored.total_quantity(), 3);
    }

    #[test]
    fn test_high_precision_price_round_trips() {
        let mut cart = Cart::new();
        cart.add(Product::new(
            ProductId::parse("1").unwrap(),
            "Item 1",
            "1.png",
            "12345678901234567.89".parse().unwrap(),
        ))
        .unwrap();
        cart.add(Product::new(
            ProductId::parse("2").unwrap(),
            "Item 2",
            "2.png",
            Decimal::new(1, 28),
        ))
        .unwrap();

        assert_eq!(decode(&encode(&cart).unwrap()).unwrap(), cart);
    }

    #[test]
    fn test_decode_legacy_float_prices() {
        let raw = r#"[{"id":"1","title":"t","image_url":"i","price":19.5,"quantity":2}]"#;
        assert_eq!(decode(raw).unwrap().total_price(), Decimal::new(39, 0));
    }

    #[test]
    fn test_decode_total_out_of_range() {
        let raw = r#"[
            {"id":"1","title":"t","image_url":"i","price":79228162514264337593543950335,"quantity":1},
            {"id":"2","title":"t","image_url":"i","price":1,"quantity":1}
        ]"#;
        assert!(matches!(decode(raw), Err(SnapshotError::TotalOutOfRange)));
    }

    #[test]
    fn test_decode_empty_array() {
        assert!(decode("[]").unwrap().is_empty());
    }

    #[test]
    fn test_decode_not_json() {
        assert!(matches!(decode("{not json"), Err(SnapshotError::Json(_))));
        assert!(matches!(decode("null"), Err(SnapshotError::Json(_))));
    }

    #[test]
    fn test_decode_missing_quantity() {
        let raw = r#"[{"id":"1","title":"t","image_url":"i","price":1}]"#;
        assert!(matches!(decode(raw), Err(SnapshotError::Json(_))));
    }

    #[test]
    fn test_decode_duplicate_ids() {
        let raw = r#"[
            {"id":"1","title":"t","image_url":"i","price":1,"quantity":1},
            {"id":"1","title":"t","image_url":"i","price":1,"quantity":3}
        ]"#;
        assert!(matches!(decode(raw), Err(SnapshotError::DuplicateId(_))));
    }

    #[test]
    fn test_decode_negative_price() {
        let raw = r#"[{"id":"1","title":"t","image_url":"i","price":-1,"quantity":1}]"#;
        assert!(matches!(decode(raw), Err(SnapshotError::NegativePrice(_))));
    }
}
