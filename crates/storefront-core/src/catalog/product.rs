//! Product records as served by the Catalog Provider.

use crate::ids::ProductId;
use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A product in the catalog.
///
/// Owned by the Catalog Provider; the client treats a product as immutable
/// until the next wholesale catalog refresh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product identifier.
    #[serde(rename = "_id")]
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Long description.
    #[serde(default)]
    pub description: String,
    /// Unit price in minor currency units.
    pub price: i64,
    /// Ordered image references; the first one is the listing image.
    #[serde(rename = "image", default)]
    pub images: Vec<String>,
    /// Top-level category (e.g. "Men").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Sub-category (e.g. "Topwear").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    /// Size labels this product is sold in.
    #[serde(default)]
    pub sizes: Vec<String>,
    /// Available stock per size label.
    #[serde(default, deserialize_with = "lenient_stocks")]
    pub size_stocks: BTreeMap<String, i64>,
    /// Featured in the bestseller listing.
    #[serde(default)]
    pub bestseller: bool,
}

impl Product {
    /// Create a product with no sizes.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price,
            images: Vec::new(),
            category: None,
            sub_category: None,
            sizes: Vec::new(),
            size_stocks: BTreeMap::new(),
            bestseller: false,
        }
    }

    /// Declare a size with its available stock.
    pub fn with_size(mut self, size: impl Into<String>, stock: i64) -> Self {
        let size = size.into();
        if !self.sizes.contains(&size) {
            self.sizes.push(size.clone());
        }
        self.size_stocks.insert(size, stock);
        self
    }

    /// Add an image reference.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.images.push(image.into());
        self
    }

    /// Check if the product is sold in the given size.
    pub fn declares_size(&self, size: &str) -> bool {
        self.sizes.iter().any(|s| s == size) || self.size_stocks.contains_key(size)
    }

    /// Available stock for a size.
    ///
    /// Undeclared sizes and negative figures read as 0.
    pub fn stock_for(&self, size: &str) -> u32 {
        if !self.declares_size(size) {
            return 0;
        }
        self.size_stocks
            .get(size)
            .map(|&stock| u32::try_from(stock.max(0)).unwrap_or(u32::MAX))
            .unwrap_or(0)
    }

    /// Sum of available stock over all sizes.
    pub fn total_stock(&self) -> u64 {
        self.size_stocks
            .keys()
            .map(|size| u64::from(self.stock_for(size)))
            .sum()
    }

    /// Check if no size has any stock left.
    pub fn is_sold_out(&self) -> bool {
        self.total_stock() == 0
    }

    /// Unit price as money in the store currency.
    pub fn unit_price(&self, currency: Currency) -> Money {
        Money::new(self.price, currency)
    }

    /// The listing image, if any.
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Reads `sizeStocks`; a value that is not a whole number counts as 0.
fn lenient_stocks<'de, D>(deserializer: D) -> Result<BTreeMap<String, i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(size, value)| (size, whole_number(&value).unwrap_or(0)))
        .collect())
}

fn whole_number(value: &serde_json::Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_backend_record() {
        let json = r#"{
            "_id": "p1",
            "name": "Oversized Tee",
            "description": "Cotton",
            "price": 250000,
            "image": ["a.jpg", "b.jpg"],
            "category": "Men",
            "subCategory": "Topwear",
            "sizes": ["S", "M"],
            "sizeStocks": {"S": 0, "M": 4},
            "bestseller": true
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id.as_str(), "p1");
        assert_eq!(product.primary_image(), Some("a.jpg"));
        assert_eq!(product.sub_category.as_deref(), Some("Topwear"));
        assert_eq!(product.stock_for("M"), 4);
        assert_eq!(product.stock_for("S"), 0);
    }

    #[test]
    fn test_missing_stock_map_reads_as_zero() {
        let json = r#"{"_id": "p2", "name": "Cap", "price": 90000, "sizes": ["M"]}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.stock_for("M"), 0);
        assert!(product.is_sold_out());
    }

    #[test]
    fn test_stock_fails_closed() {
        let product = Product::new("p3", "Hoodie", 400_000)
            .with_size("L", -3)
            .with_size("XL", 2);

        assert_eq!(product.stock_for("L"), 0);
        assert_eq!(product.stock_for("XL"), 2);
        assert_eq!(product.stock_for("XXL"), 0);
        assert_eq!(product.total_stock(), 2);
    }

    #[test]
    fn test_malformed_stock_values_read_as_zero() {
        let json = r#"{
            "_id": "p4",
            "name": "Scarf",
            "price": 120000,
            "sizes": ["S", "M", "L", "XL", "XXL"],
            "sizeStocks": {"S": "x", "M": 3, "L": null, "XL": 2.5, "XXL": 6.0}
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();

        assert_eq!(product.stock_for("S"), 0);
        assert_eq!(product.stock_for("M"), 3);
        assert_eq!(product.stock_for("L"), 0);
        assert_eq!(product.stock_for("XL"), 0);
        assert_eq!(product.stock_for("XXL"), 6);
    }

    #[test]
    fn test_null_stock_map_reads_as_empty() {
        let json = r#"{"_id": "p5", "name": "Belt", "price": 80000, "sizeStocks": null}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert!(product.size_stocks.is_empty());
    }
}
