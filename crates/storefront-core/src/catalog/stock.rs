//! Stock Index: per-product, per-size available quantity lookup.

use crate::catalog::Product;
use crate::ids::ProductId;
use std::collections::HashMap;

/// Read-only view over a full catalog snapshot.
///
/// Refreshed wholesale with [`StockIndex::replace`]; there is no
/// incremental patching.
#[derive(Debug, Clone, Default)]
pub struct StockIndex {
    products: Vec<Product>,
    by_id: HashMap<ProductId, usize>,
}

impl StockIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from a catalog snapshot.
    pub fn from_products(products: Vec<Product>) -> Self {
        let mut index = Self::new();
        index.replace(products);
        index
    }

    /// Replace the backing product collection.
    ///
    /// When the snapshot holds duplicate ids the last record wins.
    pub fn replace(&mut self, products: Vec<Product>) {
        self.by_id = products
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();
        self.products = products;
    }

    /// Available stock for a product/size pair.
    ///
    /// Returns 0 for unknown products and undeclared sizes.
    pub fn available_stock(&self, product_id: &ProductId, size: &str) -> u32 {
        self.product(product_id)
            .map(|p| p.stock_for(size))
            .unwrap_or(0)
    }

    /// Look up a product by id.
    pub fn product(&self, product_id: &ProductId) -> Option<&Product> {
        self.by_id.get(product_id).and_then(|&i| self.products.get(i))
    }

    /// Check if a product is in the snapshot.
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.by_id.contains_key(product_id)
    }

    /// All products in catalog order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Number of products in the snapshot.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Check if the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> StockIndex {
        StockIndex::from_products(vec![
            Product::new("a", "Tee", 100).with_size("M", 2),
            Product::new("b", "Cap", 50).with_size("S", 0),
        ])
    }

    #[test]
    fn test_lookup() {
        let index = index();
        assert_eq!(index.available_stock(&"a".into(), "M"), 2);
        assert_eq!(index.available_stock(&"b".into(), "S"), 0);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_unknown_pairs_are_zero() {
        let index = index();
        assert_eq!(index.available_stock(&"a".into(), "XL"), 0);
        assert_eq!(index.available_stock(&"missing".into(), "M"), 0);
    }

    #[test]
    fn test_replace_is_wholesale() {
        let mut index = index();
        index.replace(vec![Product::new("c", "Socks", 20).with_size("M", 9)]);

        assert!(!index.contains(&"a".into()));
        assert_eq!(index.available_stock(&"c".into(), "M"), 9);
        assert_eq!(index.len(), 1);
    }
}
