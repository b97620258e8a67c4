//! Cart data model.
//!
//! Product and stock records come from the stock API; line items are what the
//! cart stores and persists.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use storefront_cart_core::{Price, ProductId};

/// Product metadata as returned by the product lookup.
///
/// Attributes beyond the ones the cart reads are kept in `extra` and carried
/// into the line item untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    #[serde(default)]
    pub image: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Available stock for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: ProductId,
    pub amount: u32,
}

/// One product entry in the cart with its requested quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    #[serde(default)]
    pub image: String,
    pub amount: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CartLineItem {
    /// Create a line item for `product` with the given amount.
    #[must_use]
    pub fn new(product: Product, amount: u32) -> Self {
        Self {
            id: product.id,
            title: product.title,
            price: product.price,
            image: product.image,
            amount,
            extra: product.extra,
        }
    }

    /// Price of this line (unit price times amount).
    #[must_use]
    pub fn line_price(&self) -> Price {
        self.price.times(self.amount)
    }
}

/// Ordered cart contents, in the order products were first added.
pub type CartSnapshot = Vec<CartLineItem>;

/// Input for an absolute quantity change.
///
/// `amount` is caller-supplied and may be zero or negative; such updates are
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductAmount {
    pub product_id: ProductId,
    pub amount: i64,
}

/// Drop line items that break the cart invariants.
///
/// Removes zero amounts and keeps only the first line item per product id.
/// Returns the dropped items so callers can report them.
pub(crate) fn sanitize(items: CartSnapshot) -> (CartSnapshot, Vec<CartLineItem>) {
    let mut seen = HashSet::new();
    let mut dropped = Vec::new();
    let mut kept = Vec::with_capacity(items.len());

    for item in items {
        if item.amount == 0 || !seen.insert(item.id) {
            dropped.push(item);
        } else {
            kept.push(item);
        }
    }

    (kept, dropped)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn line(id: i32, amount: u32) -> CartLineItem {
        CartLineItem {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            price: Price::from_cents(1000),
            image: format!("https://cdn.example.com/{id}.jpg"),
            amount,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_line_item_json_shape() {
        let json = serde_json::to_value(line(1, 2)).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["amount"], 2);
        assert_eq!(json["title"], "Product 1");
        assert_eq!(json["price"], "10.00");
    }

    #[test]
    fn test_product_accepts_numeric_price() {
        let product: Product = serde_json::from_str(
            r#"{"id":3,"title":"Sneaker","price":139.9,"image":"https://cdn.example.com/3.jpg"}"#,
        )
        .unwrap();
        assert_eq!(product.price, Price::from_cents(13990));

        let item = CartLineItem::new(product, 2);
        assert_eq!(item.line_price(), Price::from_cents(27980));
    }

    #[test]
    fn test_extra_product_attributes_survive_into_snapshot() {
        let product: Product = serde_json::from_str(
            r#"{"id":1,"title":"Runner","price":139.9,"image":"x.jpg","brand":"Acme","sizes":[38,39]}"#,
        )
        .unwrap();
        assert_eq!(product.extra["brand"], "Acme");

        let item = CartLineItem::new(product, 1);
        let raw = serde_json::to_string(&vec![item.clone()]).unwrap();
        let json: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json[0]["brand"], "Acme");
        assert_eq!(json[0]["sizes"], serde_json::json!([38, 39]));
        assert_eq!(json[0]["amount"], 1);

        let reloaded: Vec<CartLineItem> = serde_json::from_str(&raw).unwrap();
        assert_eq!(reloaded, vec![item]);
        assert!(!reloaded[0].extra.contains_key("amount"));
    }

    #[test]
    fn test_product_without_image() {
        let product: Product =
            serde_json::from_str(r#"{"id":2,"title":"Slide","price":"49.90"}"#).unwrap();
        assert_eq!(product.image, "");
        assert!(product.extra.is_empty());
    }

    #[test]
    fn test_update_input_uses_camel_case() {
        let input: UpdateProductAmount =
            serde_json::from_str(r#"{"productId":4,"amount":-1}"#).unwrap();
        assert_eq!(input.product_id, ProductId::new(4));
        assert_eq!(input.amount, -1);
    }

    #[test]
    fn test_sanitize_drops_zero_amounts_and_duplicates() {
        let (kept, dropped) = sanitize(vec![line(1, 1), line(2, 0), line(1, 5), line(3, 2)]);

        let kept_ids: Vec<i32> = kept.iter().map(|i| i.id.as_i32()).collect();
        assert_eq!(kept_ids, vec![1, 3]);
        assert_eq!(kept[0].amount, 1);
        assert_eq!(dropped.len(), 2);
    }

    #[test]
    fn test_sanitize_keeps_valid_snapshot_untouched() {
        let items = vec![line(5, 1), line(2, 3)];
        let (kept, dropped) = sanitize(items.clone());
        assert_eq!(kept, items);
        assert!(dropped.is_empty());
    }
}
