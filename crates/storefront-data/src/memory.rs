//! In-memory gateway for tests.
//!
//! Behaves like a single-customer backend: it keeps a server-side cart,
//! wishlist and order book, decrements stock when orders are created, and
//! records every call. Individual operations can be scripted to fail or to
//! block until released.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use storefront_core::cart::{CartPush, CartStore};
use storefront_core::catalog::Product;
use storefront_core::checkout::{
    CancelReason, FulfillmentStatus, Order, OrderDraft, OrderHistory, OrderItem,
    COD_METHOD_LABEL,
};
use storefront_core::wishlist::WishlistAction;
use storefront_core::{OrderId, ProductId};
use storefront_session::SessionToken;
use tokio::sync::Semaphore;

use crate::{CatalogProvider, GatewayError, OrderGateway, PlacedOrder};

/// Operations of the two interfaces, for scripting and inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListProducts,
    GetCart,
    MutateCart,
    PlaceOrder,
    InitiateWalletPayment,
    CaptureEmbeddedPayment,
    GetWishlist,
    MutateWishlist,
    ListOrders,
    CancelOrder,
}

/// A recorded call with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    ListProducts,
    GetCart,
    MutateCart(CartPush),
    PlaceOrder(OrderDraft),
    InitiateWalletPayment(OrderDraft),
    CaptureEmbeddedPayment {
        draft: OrderDraft,
        receipt: serde_json::Value,
    },
    GetWishlist,
    MutateWishlist {
        product_id: ProductId,
        action: WishlistAction,
    },
    ListOrders,
    CancelOrder {
        order_id: OrderId,
        reason: String,
    },
}

impl GatewayCall {
    pub fn operation(&self) -> Operation {
        match self {
            GatewayCall::ListProducts => Operation::ListProducts,
            GatewayCall::GetCart => Operation::GetCart,
            GatewayCall::MutateCart(_) => Operation::MutateCart,
            GatewayCall::PlaceOrder(_) => Operation::PlaceOrder,
            GatewayCall::InitiateWalletPayment(_) => Operation::InitiateWalletPayment,
            GatewayCall::CaptureEmbeddedPayment { .. } => Operation::CaptureEmbeddedPayment,
            GatewayCall::GetWishlist => Operation::GetWishlist,
            GatewayCall::MutateWishlist { .. } => Operation::MutateWishlist,
            GatewayCall::ListOrders => Operation::ListOrders,
            GatewayCall::CancelOrder { .. } => Operation::CancelOrder,
        }
    }

    /// The order draft carried by a checkout call.
    pub fn draft(&self) -> Option<&OrderDraft> {
        match self {
            GatewayCall::PlaceOrder(draft)
            | GatewayCall::InitiateWalletPayment(draft)
            | GatewayCall::CaptureEmbeddedPayment { draft, .. } => Some(draft),
            _ => None,
        }
    }
}

#[derive(Default)]
struct MemoryState {
    token: Option<SessionToken>,
    products: Vec<Product>,
    cart: CartStore,
    wishlist: Vec<ProductId>,
    active: Vec<Order>,
    archived: Vec<Order>,
    calls: Vec<GatewayCall>,
    failures: HashMap<Operation, GatewayError>,
    holds: HashMap<Operation, Arc<Semaphore>>,
    wallet_url: String,
    next_order: u64,
    clock: i64,
}

/// In-memory [`CatalogProvider`] and [`OrderGateway`].
///
/// Cloning yields another handle to the same backend.
#[derive(Clone)]
pub struct MemoryGateway {
    state: Arc<Mutex<MemoryState>>,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        let state = MemoryState {
            wallet_url: "https://wallet.test/pay".to_string(),
            clock: 1_700_000_000_000,
            ..MemoryState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Seed the catalog.
    pub fn with_products(self, products: Vec<Product>) -> Self {
        self.state.lock().products = products;
        self
    }

    /// Only accept this token. Without one, any token is accepted.
    pub fn with_token(self, token: impl Into<SessionToken>) -> Self {
        self.state.lock().token = Some(token.into());
        self
    }

    /// Seed the server-side cart.
    pub fn with_cart(self, cart: CartStore) -> Self {
        self.state.lock().cart = cart;
        self
    }

    /// Seed the server-side wishlist.
    pub fn with_wishlist(self, ids: Vec<ProductId>) -> Self {
        self.state.lock().wishlist = ids;
        self
    }

    /// Seed an order. Orders with `archived_at` set go to the archive.
    pub fn with_order(self, order: Order) -> Self {
        {
            let mut state = self.state.lock();
            if order.archived_at.is_some() {
                state.archived.push(order);
            } else {
                state.active.push(order);
            }
        }
        self
    }

    pub fn set_products(&self, products: Vec<Product>) {
        self.state.lock().products = products;
    }

    /// Make every call to `op` fail with `error` until [`recover`](Self::recover).
    pub fn fail(&self, op: Operation, error: GatewayError) {
        self.state.lock().failures.insert(op, error);
    }

    pub fn recover(&self, op: Operation) {
        self.state.lock().failures.remove(&op);
    }

    /// Block calls to `op` until [`release`](Self::release). The call is
    /// recorded before it blocks.
    pub fn hold(&self, op: Operation) {
        self.state
            .lock()
            .holds
            .insert(op, Arc::new(Semaphore::new(0)));
    }

    pub fn release(&self, op: Operation) {
        if let Some(gate) = self.state.lock().holds.remove(&op) {
            gate.close();
        }
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state.lock().calls.clone()
    }

    pub fn calls_to(&self, op: Operation) -> Vec<GatewayCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.operation() == op)
            .cloned()
            .collect()
    }

    /// Server-side cart as the backend currently holds it.
    pub fn server_cart(&self) -> CartStore {
        self.state.lock().cart.clone()
    }

    pub fn server_wishlist(&self) -> Vec<ProductId> {
        self.state.lock().wishlist.clone()
    }

    pub fn orders(&self) -> OrderHistory {
        let state = self.state.lock();
        OrderHistory {
            active_orders: state.active.clone(),
            archived_orders: state.archived.clone(),
        }
    }

    /// Record the call, wait on a hold, then check session and scripted failure.
    async fn enter(&self, call: GatewayCall, session: Option<&SessionToken>) -> Result<(), GatewayError> {
        let op = call.operation();
        let gate = {
            let mut state = self.state.lock();
            state.calls.push(call);
            state.holds.get(&op).cloned()
        };
        if let Some(gate) = gate {
            // Closed on release; the error is the wake-up signal.
            let _ = gate.acquire().await;
        }

        let state = self.state.lock();
        if let (Some(expected), Some(given)) = (&state.token, session) {
            if expected != given {
                return Err(GatewayError::Rejected("Not Authorized Login Again".into()));
            }
        }
        match state.failures.get(&op) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    /// Turn a draft into an order, consuming stock and the server cart.
    fn create_order(&self, draft: &OrderDraft, payment_method: &str, paid: bool) -> Result<OrderId, GatewayError> {
        let mut state = self.state.lock();

        for line in &draft.items {
            let available = state
                .products
                .iter()
                .find(|p| p.id == line.product_id)
                .map(|p| p.stock_for(&line.size))
                .unwrap_or(0);
            if line.quantity > available {
                return Err(GatewayError::Rejected(format!(
                    "Only {available} left of {} ({})",
                    line.name, line.size
                )));
            }
        }
        for line in &draft.items {
            if let Some(product) = state.products.iter_mut().find(|p| p.id == line.product_id) {
                if let Some(stock) = product.size_stocks.get_mut(&line.size) {
                    *stock -= i64::from(line.quantity);
                }
            }
        }

        state.next_order += 1;
        state.clock += 1_000;
        let id = OrderId::new(format!("order-{}", state.next_order));
        let order = Order {
            id: id.clone(),
            items: draft
                .items
                .iter()
                .map(|line| OrderItem {
                    product_id: line.product_id.clone(),
                    name: line.name.clone(),
                    price: line.price,
                    images: line.images.clone(),
                    size: line.size.clone(),
                    quantity: line.quantity,
                })
                .collect(),
            address: draft.address.clone(),
            amount: draft.amount.amount,
            payment_method: payment_method.to_string(),
            payment: paid,
            status: FulfillmentStatus::OrderPlaced,
            date: state.clock,
            archived_at: None,
        };
        state.active.push(order);
        state.cart.clear();
        Ok(id)
    }
}

#[async_trait]
impl CatalogProvider for MemoryGateway {
    async fn list_products(&self) -> Result<Vec<Product>, GatewayError> {
        self.enter(GatewayCall::ListProducts, None).await?;
        Ok(self.state.lock().products.clone())
    }
}

#[async_trait]
impl OrderGateway for MemoryGateway {
    async fn get_cart(&self, session: &SessionToken) -> Result<CartStore, GatewayError> {
        self.enter(GatewayCall::GetCart, Some(session)).await?;
        Ok(self.state.lock().cart.clone())
    }

    async fn mutate_cart(&self, session: &SessionToken, push: &CartPush) -> Result<(), GatewayError> {
        self.enter(GatewayCall::MutateCart(push.clone()), Some(session)).await?;
        self.state.lock().cart.apply(push);
        Ok(())
    }

    async fn place_order(
        &self,
        session: &SessionToken,
        draft: &OrderDraft,
    ) -> Result<PlacedOrder, GatewayError> {
        self.enter(GatewayCall::PlaceOrder(draft.clone()), Some(session)).await?;
        let id = self.create_order(draft, COD_METHOD_LABEL, false)?;
        Ok(PlacedOrder {
            order_id: Some(id),
            message: Some("Order Placed".into()),
        })
    }

    async fn initiate_wallet_payment(
        &self,
        session: &SessionToken,
        draft: &OrderDraft,
    ) -> Result<String, GatewayError> {
        self.enter(GatewayCall::InitiateWalletPayment(draft.clone()), Some(session))
            .await?;
        let state = self.state.lock();
        Ok(format!("{}?amount={}", state.wallet_url, draft.amount.amount))
    }

    async fn capture_embedded_payment(
        &self,
        session: &SessionToken,
        draft: &OrderDraft,
        receipt: &serde_json::Value,
    ) -> Result<PlacedOrder, GatewayError> {
        let call = GatewayCall::CaptureEmbeddedPayment {
            draft: draft.clone(),
            receipt: receipt.clone(),
        };
        self.enter(call, Some(session)).await?;
        let id = self.create_order(draft, "PayPal", true)?;
        Ok(PlacedOrder {
            order_id: Some(id),
            message: None,
        })
    }

    async fn get_wishlist(&self, session: &SessionToken) -> Result<Vec<Product>, GatewayError> {
        self.enter(GatewayCall::GetWishlist, Some(session)).await?;
        let state = self.state.lock();
        Ok(state
            .wishlist
            .iter()
            .filter_map(|id| state.products.iter().find(|p| &p.id == id).cloned())
            .collect())
    }

    async fn mutate_wishlist(
        &self,
        session: &SessionToken,
        product_id: &ProductId,
        action: WishlistAction,
    ) -> Result<(), GatewayError> {
        let call = GatewayCall::MutateWishlist {
            product_id: product_id.clone(),
            action,
        };
        self.enter(call, Some(session)).await?;
        let mut state = self.state.lock();
        state.wishlist.retain(|id| id != product_id);
        if action == WishlistAction::Add {
            state.wishlist.push(product_id.clone());
        }
        Ok(())
    }

    async fn list_orders(&self, session: &SessionToken) -> Result<OrderHistory, GatewayError> {
        self.enter(GatewayCall::ListOrders, Some(session)).await?;
        Ok(self.orders())
    }

    async fn cancel_order(
        &self,
        session: &SessionToken,
        order_id: &OrderId,
        reason: &CancelReason,
    ) -> Result<(), GatewayError> {
        let call = GatewayCall::CancelOrder {
            order_id: order_id.clone(),
            reason: reason.to_string(),
        };
        self.enter(call, Some(session)).await?;

        let mut state = self.state.lock();
        let index = state
            .active
            .iter()
            .position(|o| &o.id == order_id)
            .ok_or_else(|| GatewayError::Rejected("Order not found".into()))?;
        if !state.active[index].can_cancel() {
            return Err(GatewayError::Rejected(
                "Only unprocessed cash-on-delivery orders can be cancelled".into(),
            ));
        }
        state.clock += 1_000;
        let mut order = state.active.remove(index);
        order.status = FulfillmentStatus::Cancelled;
        order.archived_at = Some(state.clock);
        state.archived.push(order);
        Ok(())
    }
}
