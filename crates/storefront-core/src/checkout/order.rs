//! Orders as reported by the Order Gateway.
//!
//! The client never mutates an order except by asking the Gateway to cancel
//! it.

use crate::checkout::ShippingAddress;
use crate::ids::{OrderId, ProductId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment method label the Gateway stores for cash-on-delivery orders.
pub const COD_METHOD_LABEL: &str = "COD";

/// Fulfillment status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FulfillmentStatus {
    /// Order received, nothing done yet.
    #[default]
    #[serde(rename = "Order Placed")]
    OrderPlaced,
    Packing,
    Shipped,
    #[serde(rename = "Out for delivery")]
    OutForDelivery,
    Delivered,
    Cancelled,
    /// A status this client does not know about.
    #[serde(untagged)]
    Other(String),
}

impl FulfillmentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            FulfillmentStatus::OrderPlaced => "Order Placed",
            FulfillmentStatus::Packing => "Packing",
            FulfillmentStatus::Shipped => "Shipped",
            FulfillmentStatus::OutForDelivery => "Out for delivery",
            FulfillmentStatus::Delivered => "Delivered",
            FulfillmentStatus::Cancelled => "Cancelled",
            FulfillmentStatus::Other(s) => s,
        }
    }

    /// Check if order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FulfillmentStatus::Delivered | FulfillmentStatus::Cancelled
        )
    }
}

impl fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line item in an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(rename = "_id")]
    pub product_id: ProductId,
    pub name: String,
    pub price: i64,
    #[serde(rename = "image", default)]
    pub images: Vec<String>,
    pub size: String,
    pub quantity: u32,
}

/// An order owned by the Order Gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub address: ShippingAddress,
    /// Amount charged in minor units, delivery included.
    pub amount: i64,
    pub payment_method: String,
    /// Whether payment has been received.
    #[serde(default)]
    pub payment: bool,
    #[serde(default)]
    pub status: FulfillmentStatus,
    /// Creation time, epoch milliseconds.
    #[serde(default)]
    pub date: i64,
    /// Set once the order moved to history, epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<i64>,
}

impl Order {
    /// Get total item count.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    pub fn is_cash_on_delivery(&self) -> bool {
        self.payment_method.eq_ignore_ascii_case(COD_METHOD_LABEL)
    }

    /// Only unprocessed cash-on-delivery orders may be cancelled.
    pub fn can_cancel(&self) -> bool {
        self.archived_at.is_none()
            && self.status == FulfillmentStatus::OrderPlaced
            && self.is_cash_on_delivery()
    }
}

/// The customer's orders split the way the Gateway reports them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderHistory {
    #[serde(default)]
    pub active_orders: Vec<Order>,
    #[serde(default)]
    pub archived_orders: Vec<Order>,
}

impl OrderHistory {
    /// Find an order in either list.
    pub fn find(&self, order_id: &OrderId) -> Option<&Order> {
        self.active_orders
            .iter()
            .chain(self.archived_orders.iter())
            .find(|o| &o.id == order_id)
    }

    pub fn is_empty(&self) -> bool {
        self.active_orders.is_empty() && self.archived_orders.is_empty()
    }
}

/// Why the customer is cancelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CancelReason {
    ChangedMind,
    FoundCheaper,
    DeliveryTooSlow,
    WrongItemOrSize,
    NoLongerNeeded,
    Other(String),
}

impl CancelReason {
    /// Preset reasons offered to the customer, in display order.
    pub const PRESETS: [CancelReason; 5] = [
        CancelReason::ChangedMind,
        CancelReason::FoundCheaper,
        CancelReason::DeliveryTooSlow,
        CancelReason::WrongItemOrSize,
        CancelReason::NoLongerNeeded,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            CancelReason::ChangedMind => "Changed my mind",
            CancelReason::FoundCheaper => "Found a similar product for less",
            CancelReason::DeliveryTooSlow => "Delivery time is too long",
            CancelReason::WrongItemOrSize => "Ordered the wrong product or size",
            CancelReason::NoLongerNeeded => "No longer needed",
            CancelReason::Other(text) => text,
        }
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_json(status: &str, method: &str) -> String {
        format!(
            r#"{{
                "_id": "o1",
                "items": [{{"_id": "p1", "name": "Tee", "price": 100000, "image": [], "size": "M", "quantity": 2}}],
                "amount": 230000,
                "paymentMethod": "{method}",
                "payment": false,
                "status": "{status}",
                "date": 1718000000000
            }}"#
        )
    }

    #[test]
    fn test_deserialize_order() {
        let order: Order = serde_json::from_str(&order_json("Order Placed", "COD")).unwrap();
        assert_eq!(order.status, FulfillmentStatus::OrderPlaced);
        assert_eq!(order.item_count(), 2);
        assert!(order.can_cancel());
    }

    #[test]
    fn test_unknown_status_is_preserved() {
        let order: Order = serde_json::from_str(&order_json("Returned", "COD")).unwrap();
        assert_eq!(order.status, FulfillmentStatus::Other("Returned".into()));
        assert!(!order.can_cancel());
    }

    #[test]
    fn test_only_cod_orders_are_cancellable() {
        let order: Order = serde_json::from_str(&order_json("Order Placed", "MoMo")).unwrap();
        assert!(!order.can_cancel());

        let order: Order = serde_json::from_str(&order_json("Shipped", "COD")).unwrap();
        assert!(!order.can_cancel());
    }

    #[test]
    fn test_history_find() {
        let order: Order = serde_json::from_str(&order_json("Delivered", "COD")).unwrap();
        let history = OrderHistory {
            active_orders: vec![],
            archived_orders: vec![order],
        };
        assert!(history.find(&OrderId::new("o1")).is_some());
        assert!(history.find(&OrderId::new("o2")).is_none());
    }
}
