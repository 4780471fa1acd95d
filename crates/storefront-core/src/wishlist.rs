//! Wishlist: a set of products keyed by product id, independent of the cart.

use crate::catalog::Product;
use crate::ids::ProductId;
use serde::{Deserialize, Serialize};

/// Direction of a wishlist toggle, as sent to the Gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WishlistAction {
    Add,
    Remove,
}

impl WishlistAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            WishlistAction::Add => "add",
            WishlistAction::Remove => "remove",
        }
    }
}

/// Products the customer saved for later, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wishlist {
    products: Vec<Product>,
}

impl Wishlist {
    /// Create an empty wishlist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a remote fetch, dropping duplicate ids.
    pub fn from_products(products: Vec<Product>) -> Self {
        let mut wishlist = Self::new();
        wishlist.replace(products);
        wishlist
    }

    /// Replace the whole list.
    pub fn replace(&mut self, products: Vec<Product>) {
        self.products.clear();
        for product in products {
            self.insert(product);
        }
    }

    /// Check membership by product id.
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.products.iter().any(|p| &p.id == product_id)
    }

    /// The action a toggle of this product would perform.
    pub fn action_for(&self, product_id: &ProductId) -> WishlistAction {
        if self.contains(product_id) {
            WishlistAction::Remove
        } else {
            WishlistAction::Add
        }
    }

    /// Add a product. Returns false if it was already present.
    pub fn insert(&mut self, product: Product) -> bool {
        if self.contains(&product.id) {
            return false;
        }
        self.products.push(product);
        true
    }

    /// Remove a product. Returns true if it was present.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let len_before = self.products.len();
        self.products.retain(|p| &p.id != product_id);
        self.products.len() < len_before
    }

    /// Saved products.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Remove everything (logout only).
    pub fn clear(&mut self) {
        self.products.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_actions() {
        let mut wishlist = Wishlist::new();
        let id = ProductId::new("p1");
        assert_eq!(wishlist.action_for(&id), WishlistAction::Add);

        assert!(wishlist.insert(Product::new("p1", "Tee", 10)));
        assert!(!wishlist.insert(Product::new("p1", "Tee", 10)));
        assert_eq!(wishlist.action_for(&id), WishlistAction::Remove);

        assert!(wishlist.remove(&id));
        assert!(wishlist.is_empty());
    }

    #[test]
    fn test_from_products_dedups() {
        let wishlist = Wishlist::from_products(vec![
            Product::new("p1", "Tee", 10),
            Product::new("p2", "Cap", 20),
            Product::new("p1", "Tee", 10),
        ]);
        assert_eq!(wishlist.len(), 2);
    }

    #[test]
    fn test_action_wire_form() {
        assert_eq!(serde_json::to_string(&WishlistAction::Remove).unwrap(), "\"remove\"");
    }
}
