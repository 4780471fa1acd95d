//! Pending order draft: the cart denormalized against current product data.

use crate::cart::{CartPricing, CartStore};
use crate::catalog::StockIndex;
use crate::checkout::ShippingAddress;
use crate::ids::ProductId;
use crate::money::Money;
use crate::settings::StoreSettings;
use serde::{Deserialize, Serialize};

/// One line of an order draft with a price snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DraftLine {
    #[serde(rename = "_id")]
    pub product_id: ProductId,
    pub name: String,
    /// Unit price at draft time, minor units.
    pub price: i64,
    #[serde(rename = "image", default)]
    pub images: Vec<String>,
    pub size: String,
    pub quantity: u32,
}

/// Everything submitted to the Order Gateway for one checkout attempt.
///
/// Built fresh for every submission and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderDraft {
    pub address: ShippingAddress,
    pub items: Vec<DraftLine>,
    /// Amount due: cart amount plus delivery fee.
    #[serde(with = "amount_minor_units")]
    pub amount: Money,
}

impl OrderDraft {
    /// Denormalize the cart against the catalog.
    ///
    /// Entries whose product is no longer listed are left out, matching how
    /// the amount skips them.
    pub fn build(
        store: &CartStore,
        stock: &StockIndex,
        address: &ShippingAddress,
        settings: &StoreSettings,
    ) -> Self {
        let items = store
            .lines()
            .filter_map(|line| {
                let product = stock.product(&line.product_id)?;
                Some(DraftLine {
                    product_id: line.product_id,
                    name: product.name.clone(),
                    price: product.price,
                    images: product.images.clone(),
                    size: line.size,
                    quantity: line.quantity,
                })
            })
            .collect();

        Self {
            address: address.clone(),
            items,
            amount: CartPricing::compute(store, stock, settings).total,
        }
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|l| u64::from(l.quantity)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The Gateway expects `amount` as a bare number in minor units.
mod amount_minor_units {
    use crate::money::{Currency, Money};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(money: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(money.amount)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        let amount = i64::deserialize(deserializer)?;
        Ok(Money::new(amount, Currency::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{CartCommand, CartMutator};
    use crate::catalog::Product;

    #[test]
    fn test_build_draft() {
        let stock = StockIndex::from_products(vec![
            Product::new("a", "Tee", 100_000).with_size("M", 3).with_image("tee.jpg"),
        ]);
        let mut cart = CartStore::new();
        CartMutator::execute(&mut cart, &stock, &CartCommand::set("a", "M", 2)).unwrap();

        let draft = OrderDraft::build(&cart, &stock, &ShippingAddress::default(), &StoreSettings::default());

        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].price, 100_000);
        assert_eq!(draft.item_count(), 2);
        assert_eq!(draft.amount.amount, 230_000);
    }

    #[test]
    fn test_draft_wire_form() {
        let draft = OrderDraft {
            address: ShippingAddress::default(),
            items: vec![DraftLine {
                product_id: "a".into(),
                name: "Tee".into(),
                price: 10,
                images: vec!["tee.jpg".into()],
                size: "M".into(),
                quantity: 1,
            }],
            amount: Money::new(30_010, Default::default()),
        };

        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["amount"], 30_010);
        assert_eq!(json["items"][0]["_id"], "a");
        assert_eq!(json["items"][0]["image"][0], "tee.jpg");
    }
}
