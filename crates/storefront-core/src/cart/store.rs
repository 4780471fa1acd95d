//! Cart Store: the only mutable cart state.

use crate::cart::CartPush;
use crate::ids::ProductId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from product to size label to requested quantity.
///
/// Every stored quantity is positive; setting a quantity of 0 removes the
/// entry. Serializes to the same `{productId: {size: quantity}}` shape the
/// Order Gateway uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartStore {
    items: BTreeMap<ProductId, BTreeMap<String, u32>>,
}

/// A single (product, size, quantity) entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub size: String,
    pub quantity: u32,
}

impl CartStore {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from the Gateway's cart payload.
    ///
    /// Entries whose quantity is not a positive whole number (0, negative,
    /// fractional, strings, null) are dropped, as are non-object values.
    pub fn from_remote(raw: &serde_json::Value) -> Self {
        let mut store = Self::new();
        let Some(products) = raw.as_object() else {
            return store;
        };

        for (product_id, sizes) in products {
            let Some(sizes) = sizes.as_object() else {
                continue;
            };
            for (size, quantity) in sizes {
                if let Some(quantity) = positive_quantity(quantity) {
                    store
                        .items
                        .entry(ProductId::new(product_id.as_str()))
                        .or_default()
                        .insert(size.clone(), quantity);
                }
            }
        }
        store
    }

    /// Quantity held for a product/size pair (0 when absent).
    pub fn quantity(&self, product_id: &ProductId, size: &str) -> u32 {
        self.items
            .get(product_id)
            .and_then(|sizes| sizes.get(size))
            .copied()
            .unwrap_or(0)
    }

    /// Apply an already validated push.
    pub fn apply(&mut self, push: &CartPush) {
        if push.quantity == 0 {
            if let Some(sizes) = self.items.get_mut(&push.product_id) {
                sizes.remove(&push.size);
                if sizes.is_empty() {
                    self.items.remove(&push.product_id);
                }
            }
            return;
        }

        self.items
            .entry(push.product_id.clone())
            .or_default()
            .insert(push.size.clone(), push.quantity);
    }

    /// All entries, ordered by product then size.
    pub fn lines(&self) -> impl Iterator<Item = CartLine> + '_ {
        self.items.iter().flat_map(|(product_id, sizes)| {
            sizes.iter().map(move |(size, &quantity)| CartLine {
                product_id: product_id.clone(),
                size: size.clone(),
                quantity,
            })
        })
    }

    /// Product ids present in the cart.
    pub fn product_ids(&self) -> impl Iterator<Item = &ProductId> {
        self.items.keys()
    }

    /// Total item count (sum of quantities).
    pub fn count(&self) -> u64 {
        self.items
            .values()
            .flat_map(|sizes| sizes.values())
            .map(|&q| u64::from(q))
            .sum()
    }

    /// Number of distinct product/size entries.
    pub fn line_count(&self) -> usize {
        self.items.values().map(BTreeMap::len).sum()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

fn positive_quantity(value: &serde_json::Value) -> Option<u32> {
    if let Some(q) = value.as_u64() {
        return u32::try_from(q).ok().filter(|&q| q > 0);
    }
    let q = value.as_f64()?;
    if q.is_finite() && q >= 1.0 && q.fract() == 0.0 && q <= f64::from(u32::MAX) {
        Some(q as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn push(product: &str, size: &str, quantity: u32) -> CartPush {
        CartPush {
            product_id: ProductId::new(product),
            size: size.to_string(),
            quantity,
        }
    }

    #[test]
    fn test_apply_and_count() {
        let mut cart = CartStore::new();
        cart.apply(&push("a", "M", 2));
        cart.apply(&push("a", "L", 1));
        cart.apply(&push("b", "S", 3));

        assert_eq!(cart.count(), 6);
        assert_eq!(cart.line_count(), 3);
        assert_eq!(cart.quantity(&"a".into(), "M"), 2);
    }

    #[test]
    fn test_zero_removes_entry() {
        let mut cart = CartStore::new();
        cart.apply(&push("a", "M", 2));
        cart.apply(&push("a", "M", 0));

        assert_eq!(cart.quantity(&"a".into(), "M"), 0);
        assert!(cart.is_empty());
        assert_eq!(cart.count(), 0);
    }

    #[test]
    fn test_from_remote_drops_invalid_quantities() {
        let raw = json!({
            "a": {"M": 2, "L": 0, "XL": -1, "S": "3"},
            "b": {"M": 1.5, "L": 2.0, "S": null},
            "c": "garbage",
            "d": {}
        });

        let cart = CartStore::from_remote(&raw);
        assert_eq!(cart.count(), 4);
        assert_eq!(cart.quantity(&"a".into(), "M"), 2);
        assert_eq!(cart.quantity(&"b".into(), "L"), 2);
        assert_eq!(cart.line_count(), 2);
    }

    #[test]
    fn test_from_remote_non_object() {
        assert!(CartStore::from_remote(&json!(null)).is_empty());
        assert!(CartStore::from_remote(&json!([1, 2])).is_empty());
    }

    #[test]
    fn test_serializes_in_gateway_shape() {
        let mut cart = CartStore::new();
        cart.apply(&push("a", "M", 2));
        assert_eq!(serde_json::to_value(&cart).unwrap(), json!({"a": {"M": 2}}));
    }
}
