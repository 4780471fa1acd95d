//! Cart Mutator: validates cart commands against the Stock Index.
//!
//! Mutation is split into a pure planning step that produces the outbound
//! side-effect description ([`CartPush`]) and an infallible apply step, so a
//! rejected command never touches the store.

use crate::cart::CartStore;
use crate::catalog::StockIndex;
use crate::error::CommerceError;
use crate::ids::ProductId;
use serde::{Deserialize, Serialize};

/// A user-initiated cart change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartCommand {
    /// Increment the quantity of a product/size pair by exactly one.
    Add { product_id: ProductId, size: String },
    /// Set an absolute quantity; 0 removes the entry.
    SetQuantity {
        product_id: ProductId,
        size: String,
        quantity: u32,
    },
}

impl CartCommand {
    /// Build an add command.
    pub fn add(product_id: impl Into<ProductId>, size: impl Into<String>) -> Self {
        CartCommand::Add {
            product_id: product_id.into(),
            size: size.into(),
        }
    }

    /// Build a set-quantity command.
    pub fn set(product_id: impl Into<ProductId>, size: impl Into<String>, quantity: u32) -> Self {
        CartCommand::SetQuantity {
            product_id: product_id.into(),
            size: size.into(),
            quantity,
        }
    }

    pub fn product_id(&self) -> &ProductId {
        match self {
            CartCommand::Add { product_id, .. } | CartCommand::SetQuantity { product_id, .. } => {
                product_id
            }
        }
    }

    pub fn size(&self) -> &str {
        match self {
            CartCommand::Add { size, .. } | CartCommand::SetQuantity { size, .. } => size,
        }
    }
}

/// Absolute quantity for one product/size pair, mirrored to the Gateway.
///
/// Carries the resulting quantity rather than a delta so that repeated or
/// reordered pushes converge on last-write-wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartPush {
    pub product_id: ProductId,
    pub size: String,
    pub quantity: u32,
}

/// Stateless validator for cart commands.
pub struct CartMutator;

impl CartMutator {
    /// Validate a command against the current cart and stock.
    ///
    /// Returns the push that applying the command would produce.
    pub fn plan(
        store: &CartStore,
        stock: &StockIndex,
        command: &CartCommand,
    ) -> Result<CartPush, CommerceError> {
        let product_id = command.product_id();
        let size = command.size().trim();

        if size.is_empty() {
            return Err(CommerceError::Validation("Select product size".to_string()));
        }
        if !stock.contains(product_id) {
            return Err(CommerceError::ProductNotFound(product_id.clone()));
        }

        let available = stock.available_stock(product_id, size);
        let quantity = match command {
            CartCommand::Add { .. } => {
                if available == 0 {
                    return Err(CommerceError::OutOfStock {
                        product_id: product_id.clone(),
                        size: size.to_string(),
                    });
                }
                let current = store.quantity(product_id, size);
                let requested = current.saturating_add(1);
                if requested > available {
                    return Err(CommerceError::StockExceeded {
                        product_id: product_id.clone(),
                        size: size.to_string(),
                        requested,
                        available,
                    });
                }
                requested
            }
            CartCommand::SetQuantity { quantity, .. } => {
                if *quantity > available {
                    return Err(CommerceError::StockExceeded {
                        product_id: product_id.clone(),
                        size: size.to_string(),
                        requested: *quantity,
                        available,
                    });
                }
                *quantity
            }
        };

        Ok(CartPush {
            product_id: product_id.clone(),
            size: size.to_string(),
            quantity,
        })
    }

    /// Validate and apply a command. The store is unchanged on error.
    pub fn execute(
        store: &mut CartStore,
        stock: &StockIndex,
        command: &CartCommand,
    ) -> Result<CartPush, CommerceError> {
        let push = Self::plan(store, stock, command)?;
        store.apply(&push);
        Ok(push)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Product;

    fn stock() -> StockIndex {
        StockIndex::from_products(vec![
            Product::new("A", "Tee", 100_000).with_size("M", 2).with_size("S", 0),
            Product::new("B", "Cap", 50_000).with_size("L", 5),
        ])
    }

    #[test]
    fn test_add_succeeds_exactly_stock_times() {
        let stock = stock();
        let mut cart = CartStore::new();

        for expected in 1..=5 {
            let push = CartMutator::execute(&mut cart, &stock, &CartCommand::add("B", "L")).unwrap();
            assert_eq!(push.quantity, expected);
        }

        let err = CartMutator::execute(&mut cart, &stock, &CartCommand::add("B", "L")).unwrap_err();
        assert!(matches!(err, CommerceError::StockExceeded { requested: 6, available: 5, .. }));
        assert_eq!(cart.count(), 5);
    }

    #[test]
    fn test_add_then_set_quantity_scenario() {
        let stock = stock();
        let mut cart = CartStore::new();

        CartMutator::execute(&mut cart, &stock, &CartCommand::add("A", "M")).unwrap();
        CartMutator::execute(&mut cart, &stock, &CartCommand::add("A", "M")).unwrap();
        let third = CartMutator::execute(&mut cart, &stock, &CartCommand::add("A", "M"));
        assert!(matches!(third, Err(CommerceError::StockExceeded { .. })));

        CartMutator::execute(&mut cart, &stock, &CartCommand::set("A", "M", 1)).unwrap();
        assert_eq!(cart.count(), 1);
    }

    #[test]
    fn test_add_requires_size() {
        let stock = stock();
        let mut cart = CartStore::new();

        let err = CartMutator::execute(&mut cart, &stock, &CartCommand::add("A", "  ")).unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_out_of_stock() {
        let stock = stock();
        let mut cart = CartStore::new();

        let err = CartMutator::execute(&mut cart, &stock, &CartCommand::add("A", "S")).unwrap_err();
        assert!(matches!(err, CommerceError::OutOfStock { .. }));

        // Undeclared sizes fail closed the same way.
        let err = CartMutator::execute(&mut cart, &stock, &CartCommand::add("A", "XXL")).unwrap_err();
        assert!(matches!(err, CommerceError::OutOfStock { .. }));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_unknown_product_leaves_cart_unchanged() {
        let stock = stock();
        let mut cart = CartStore::new();
        CartMutator::execute(&mut cart, &stock, &CartCommand::add("A", "M")).unwrap();
        let before = cart.clone();

        let err = CartMutator::execute(&mut cart, &stock, &CartCommand::add("Z", "M")).unwrap_err();
        assert_eq!(err, CommerceError::ProductNotFound("Z".into()));
        let err = CartMutator::execute(&mut cart, &stock, &CartCommand::set("Z", "M", 0)).unwrap_err();
        assert_eq!(err, CommerceError::ProductNotFound("Z".into()));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_set_quantity_is_absolute() {
        let stock = stock();
        let mut cart = CartStore::new();

        let push = CartMutator::execute(&mut cart, &stock, &CartCommand::set("B", "L", 4)).unwrap();
        assert_eq!(push.quantity, 4);
        CartMutator::execute(&mut cart, &stock, &CartCommand::set("B", "L", 2)).unwrap();
        assert_eq!(cart.quantity(&"B".into(), "L"), 2);

        let err = CartMutator::execute(&mut cart, &stock, &CartCommand::set("B", "L", 6)).unwrap_err();
        assert!(matches!(err, CommerceError::StockExceeded { requested: 6, .. }));
        assert_eq!(cart.quantity(&"B".into(), "L"), 2);
    }

    #[test]
    fn test_set_zero_removes() {
        let stock = stock();
        let mut cart = CartStore::new();
        CartMutator::execute(&mut cart, &stock, &CartCommand::add("A", "M")).unwrap();

        let push = CartMutator::execute(&mut cart, &stock, &CartCommand::set("A", "M", 0)).unwrap();
        assert_eq!(push.quantity, 0);
        assert_eq!(cart.quantity(&"A".into(), "M"), 0);
        assert_eq!(cart.count(), 0);
    }

    #[test]
    fn test_plan_is_pure() {
        let stock = stock();
        let cart = CartStore::new();
        let push = CartMutator::plan(&cart, &stock, &CartCommand::add("A", "M")).unwrap();
        assert_eq!(push.quantity, 1);
        assert!(cart.is_empty());
    }
}
