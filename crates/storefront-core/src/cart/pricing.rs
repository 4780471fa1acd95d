//! Cart pricing calculations.

use crate::cart::CartStore;
use crate::catalog::StockIndex;
use crate::ids::ProductId;
use crate::money::{Currency, Money};
use crate::settings::StoreSettings;
use serde::Serialize;

/// Sum of price × quantity over all resolvable cart entries.
///
/// Entries whose product is missing from the catalog contribute nothing;
/// the cart may briefly reference a delisted product before reconciliation.
pub fn amount(store: &CartStore, stock: &StockIndex, currency: Currency) -> Money {
    store
        .lines()
        .filter_map(|line| {
            stock
                .product(&line.product_id)
                .map(|p| p.unit_price(currency).saturating_multiply(i64::from(line.quantity)))
        })
        .fold(Money::zero(currency), |acc, m| acc.saturating_add(&m))
}

/// Complete pricing breakdown for a cart.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CartPricing {
    /// Sum of resolvable lines.
    pub subtotal: Money,
    /// Flat delivery fee.
    pub delivery_fee: Money,
    /// Amount due (subtotal + delivery fee).
    pub total: Money,
    /// Per-line breakdown, unresolvable lines excluded.
    pub lines: Vec<LinePricing>,
}

impl CartPricing {
    /// Price the cart against the current catalog snapshot.
    pub fn compute(store: &CartStore, stock: &StockIndex, settings: &StoreSettings) -> Self {
        let currency = settings.currency;
        let lines: Vec<LinePricing> = store
            .lines()
            .filter_map(|line| {
                let product = stock.product(&line.product_id)?;
                let unit_price = product.unit_price(currency);
                Some(LinePricing {
                    product_id: line.product_id,
                    name: product.name.clone(),
                    size: line.size,
                    quantity: line.quantity,
                    unit_price,
                    subtotal: unit_price.saturating_multiply(i64::from(line.quantity)),
                })
            })
            .collect();

        let subtotal = amount(store, stock, currency);
        let delivery_fee = settings.delivery_fee();
        Self {
            subtotal,
            delivery_fee,
            total: subtotal.saturating_add(&delivery_fee),
            lines,
        }
    }
}

/// Pricing for a single cart entry.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LinePricing {
    pub product_id: ProductId,
    pub name: String,
    pub size: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartPush;
    use crate::catalog::Product;

    fn cart(entries: &[(&str, &str, u32)]) -> CartStore {
        let mut cart = CartStore::new();
        for (product, size, quantity) in entries {
            cart.apply(&CartPush {
                product_id: ProductId::new(*product),
                size: size.to_string(),
                quantity: *quantity,
            });
        }
        cart
    }

    fn stock() -> StockIndex {
        StockIndex::from_products(vec![
            Product::new("a", "Tee", 100_000).with_size("M", 5),
            Product::new("b", "Cap", 50_000).with_size("S", 5),
        ])
    }

    #[test]
    fn test_amount_sums_resolvable_lines() {
        let cart = cart(&[("a", "M", 2), ("b", "S", 1)]);
        assert_eq!(amount(&cart, &stock(), Currency::VND).amount, 250_000);
    }

    #[test]
    fn test_amount_skips_unknown_products() {
        let cart = cart(&[("a", "M", 1), ("delisted", "M", 7)]);
        assert_eq!(amount(&cart, &stock(), Currency::VND).amount, 100_000);
    }

    #[test]
    fn test_pricing_adds_delivery_fee() {
        let cart = cart(&[("a", "M", 1), ("delisted", "M", 1)]);
        let pricing = CartPricing::compute(&cart, &stock(), &StoreSettings::default());

        assert_eq!(pricing.subtotal.amount, 100_000);
        assert_eq!(pricing.delivery_fee.amount, 30_000);
        assert_eq!(pricing.total.amount, 130_000);
        assert_eq!(pricing.lines.len(), 1);
        assert_eq!(pricing.lines[0].name, "Tee");
    }

    #[test]
    fn test_empty_cart_costs_only_delivery() {
        let pricing = CartPricing::compute(&CartStore::new(), &stock(), &StoreSettings::default());
        assert!(pricing.subtotal.is_zero());
        assert_eq!(pricing.total.amount, 30_000);
    }
}
