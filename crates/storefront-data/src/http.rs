//! JSON-over-HTTP gateway for the store backend.
//!
//! Every response is an envelope `{ "success": bool, "message"?: string, ... }`
//! with the payload in sibling fields. Authenticated routes take the session
//! token in a `token` header.

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use storefront_core::cart::{CartPush, CartStore};
use storefront_core::catalog::Product;
use storefront_core::checkout::{CancelReason, OrderDraft, OrderHistory};
use storefront_core::wishlist::WishlistAction;
use storefront_core::{OrderId, ProductId};
use storefront_session::SessionToken;

use crate::{CatalogProvider, GatewayConfig, GatewayError, OrderGateway, PlacedOrder};

mod routes {
    pub const PRODUCT_LIST: &str = "/api/product/list";
    pub const CART_GET: &str = "/api/cart/get";
    pub const CART_UPDATE: &str = "/api/cart/update";
    pub const ORDER_PLACE: &str = "/api/order/place";
    pub const ORDER_WALLET: &str = "/api/order/momo";
    pub const ORDER_WIDGET: &str = "/api/order/paypal";
    pub const ORDER_LIST: &str = "/api/order/userorders";
    pub const ORDER_CANCEL: &str = "/api/order/cancel";
    pub const WISHLIST_GET: &str = "/api/user/get-wishlist";
    pub const WISHLIST_UPDATE: &str = "/api/user/wishlist";
}

/// HTTP implementation of [`CatalogProvider`] and [`OrderGateway`].
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl HttpGateway {
    /// Build a client with the configured timeouts.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let timeout = config.timeout();
        let client = reqwest::Client::builder()
            .connect_timeout(timeout.connect)
            .timeout(timeout.total)
            .user_agent(concat!("storefront/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    async fn get(&self, path: &str) -> Result<Value, GatewayError> {
        let url = self.config.url(path);
        self.send(self.client.get(&url), &url).await
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        session: &SessionToken,
        body: &B,
    ) -> Result<Value, GatewayError> {
        let url = self.config.url(path);
        let request = self
            .client
            .post(&url)
            .header("token", session.expose())
            .json(body);
        self.send(request, &url).await
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Value, GatewayError> {
        tracing::debug!(url, "Gateway request");

        let response = request.send().await.map_err(|e| {
            tracing::warn!(url, error = %e, "Gateway request failed");
            GatewayError::from(e)
        })?;
        let status = response.status();
        let bytes = response.bytes().await?;

        // Backends answer rejections with a 4xx and an envelope; prefer its message.
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(body) if body.get("success").is_some() => open_envelope(body),
            _ if !status.is_success() => Err(GatewayError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            }),
            Ok(_) => Err(GatewayError::Decode(format!("{url}: response is not an envelope"))),
            Err(e) => Err(e.into()),
        }
    }
}

/// Check `success` and hand back the body for field extraction.
fn open_envelope(body: Value) -> Result<Value, GatewayError> {
    if body.get("success").and_then(Value::as_bool) == Some(true) {
        return Ok(body);
    }
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or("Request was not successful");
    Err(GatewayError::Rejected(message.to_string()))
}

fn take_field<T: DeserializeOwned>(body: &mut Value, name: &str) -> Result<T, GatewayError> {
    let value = body
        .get_mut(name)
        .map(Value::take)
        .ok_or_else(|| GatewayError::Decode(format!("missing field `{name}`")))?;
    Ok(serde_json::from_value(value)?)
}

fn placed_order(body: &Value) -> PlacedOrder {
    let order_id = body
        .get("orderId")
        .or_else(|| body.pointer("/order/_id"))
        .and_then(Value::as_str)
        .map(OrderId::new);
    let message = body.get("message").and_then(Value::as_str).map(str::to_string);
    PlacedOrder { order_id, message }
}

#[async_trait]
impl CatalogProvider for HttpGateway {
    async fn list_products(&self) -> Result<Vec<Product>, GatewayError> {
        let mut body = self.get(routes::PRODUCT_LIST).await?;
        take_field(&mut body, "product")
    }
}

#[async_trait]
impl OrderGateway for HttpGateway {
    async fn get_cart(&self, session: &SessionToken) -> Result<CartStore, GatewayError> {
        let body = self.post(routes::CART_GET, session, &json!({})).await?;
        Ok(body
            .get("cartData")
            .map(CartStore::from_remote)
            .unwrap_or_default())
    }

    async fn mutate_cart(&self, session: &SessionToken, push: &CartPush) -> Result<(), GatewayError> {
        let body = json!({
            "itemId": push.product_id,
            "size": push.size,
            "quantity": push.quantity,
        });
        self.post(routes::CART_UPDATE, session, &body).await?;
        Ok(())
    }

    async fn place_order(
        &self,
        session: &SessionToken,
        draft: &OrderDraft,
    ) -> Result<PlacedOrder, GatewayError> {
        let body = self.post(routes::ORDER_PLACE, session, draft).await?;
        Ok(placed_order(&body))
    }

    async fn initiate_wallet_payment(
        &self,
        session: &SessionToken,
        draft: &OrderDraft,
    ) -> Result<String, GatewayError> {
        let mut body = self.post(routes::ORDER_WALLET, session, draft).await?;
        take_field(&mut body, "payUrl")
    }

    async fn capture_embedded_payment(
        &self,
        session: &SessionToken,
        draft: &OrderDraft,
        receipt: &serde_json::Value,
    ) -> Result<PlacedOrder, GatewayError> {
        let request = json!({ "orderData": draft, "paypalInfo": receipt });
        let body = self.post(routes::ORDER_WIDGET, session, &request).await?;
        Ok(placed_order(&body))
    }

    async fn get_wishlist(&self, session: &SessionToken) -> Result<Vec<Product>, GatewayError> {
        let mut body = self.post(routes::WISHLIST_GET, session, &json!({})).await?;
        take_field(&mut body, "wishlist")
    }

    async fn mutate_wishlist(
        &self,
        session: &SessionToken,
        product_id: &ProductId,
        action: WishlistAction,
    ) -> Result<(), GatewayError> {
        let body = json!({ "productId": product_id, "action": action });
        self.post(routes::WISHLIST_UPDATE, session, &body).await?;
        Ok(())
    }

    async fn list_orders(&self, session: &SessionToken) -> Result<OrderHistory, GatewayError> {
        let body = self.post(routes::ORDER_LIST, session, &json!({})).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn cancel_order(
        &self,
        session: &SessionToken,
        order_id: &OrderId,
        reason: &CancelReason,
    ) -> Result<(), GatewayError> {
        let body = json!({ "orderId": order_id, "reason": reason.as_str() });
        self.post(routes::ORDER_CANCEL, session, &body).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success() {
        let body = open_envelope(json!({"success": true, "payUrl": "https://pay"})).unwrap();
        let mut body = body;
        let url: String = take_field(&mut body, "payUrl").unwrap();
        assert_eq!(url, "https://pay");
    }

    #[test]
    fn test_envelope_rejection_message() {
        let err = open_envelope(json!({"success": false, "message": "Out of stock"})).unwrap_err();
        assert_eq!(err, GatewayError::Rejected("Out of stock".into()));

        let err = open_envelope(json!({"success": false})).unwrap_err();
        assert!(matches!(err, GatewayError::Rejected(_)));
    }

    #[test]
    fn test_missing_payload_field() {
        let mut body = json!({"success": true});
        let err = take_field::<Vec<Product>>(&mut body, "product").unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));
    }

    #[test]
    fn test_placed_order_id_shapes() {
        let flat = placed_order(&json!({"success": true, "orderId": "o1"}));
        assert_eq!(flat.order_id, Some(OrderId::new("o1")));

        let nested = placed_order(&json!({"success": true, "order": {"_id": "o2"}, "message": "Order Placed"}));
        assert_eq!(nested.order_id, Some(OrderId::new("o2")));
        assert_eq!(nested.message.as_deref(), Some("Order Placed"));

        assert_eq!(placed_order(&json!({"success": true})).order_id, None);
    }

    #[test]
    fn test_order_history_from_envelope() {
        let body = json!({
            "success": true,
            "activeOrders": [],
            "archivedOrders": [{
                "_id": "o9", "items": [], "amount": 30000,
                "paymentMethod": "COD", "status": "Delivered", "date": 1
            }]
        });
        let history: OrderHistory = serde_json::from_value(body).unwrap();
        assert_eq!(history.archived_orders.len(), 1);
    }
}
