//! The two interfaces the storefront consumes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use storefront_core::cart::{CartPush, CartStore};
use storefront_core::catalog::Product;
use storefront_core::checkout::{CancelReason, OrderDraft, OrderHistory};
use storefront_core::wishlist::WishlistAction;
use storefront_core::{OrderId, ProductId};
use storefront_session::SessionToken;

use crate::GatewayError;

/// Source of the product catalog.
///
/// Always returns a full snapshot; there is no paging contract.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>, GatewayError>;
}

/// Acknowledgement of an order the Gateway created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    /// Present when the backend reports the new order's id.
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Service of record for carts, wishlists and orders.
///
/// Every call is authenticated with the opaque session token.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Fetch the authoritative cart.
    async fn get_cart(&self, session: &SessionToken) -> Result<CartStore, GatewayError>;

    /// Set the absolute quantity of one (product, size) entry.
    async fn mutate_cart(&self, session: &SessionToken, push: &CartPush) -> Result<(), GatewayError>;

    /// Place a cash-on-delivery order.
    async fn place_order(
        &self,
        session: &SessionToken,
        draft: &OrderDraft,
    ) -> Result<PlacedOrder, GatewayError>;

    /// Ask the wallet provider for a payment page. Returns the URL to navigate to.
    async fn initiate_wallet_payment(
        &self,
        session: &SessionToken,
        draft: &OrderDraft,
    ) -> Result<String, GatewayError>;

    /// Forward a captured widget payment together with the draft it paid for.
    async fn capture_embedded_payment(
        &self,
        session: &SessionToken,
        draft: &OrderDraft,
        receipt: &serde_json::Value,
    ) -> Result<PlacedOrder, GatewayError>;

    async fn get_wishlist(&self, session: &SessionToken) -> Result<Vec<Product>, GatewayError>;

    async fn mutate_wishlist(
        &self,
        session: &SessionToken,
        product_id: &ProductId,
        action: WishlistAction,
    ) -> Result<(), GatewayError>;

    async fn list_orders(&self, session: &SessionToken) -> Result<OrderHistory, GatewayError>;

    async fn cancel_order(
        &self,
        session: &SessionToken,
        order_id: &OrderId,
        reason: &CancelReason,
    ) -> Result<(), GatewayError>;
}
