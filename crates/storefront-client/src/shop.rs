//! The storefront state container.
//!
//! A `Shop` owns the catalog snapshot, the cart, the wishlist, the session
//! and the checkout flow for one customer. It is created at startup, bound
//! to a session by [`Shop::establish_session`] or [`Shop::restore`] and
//! emptied by [`Shop::logout`]. Clones share the same state.
//!
//! All state sits behind one `parking_lot::Mutex` that is never held across
//! an `.await`. Anything written after a network call first checks that the
//! session it started under is still current.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use storefront_core::cart::{self, CartCommand, CartMutator, CartPricing, CartPush, CartStore};
use storefront_core::catalog::{Product, StockIndex};
use storefront_core::checkout::{CancelReason, CheckoutFlow, OrderHistory, ShippingAddress};
use storefront_core::wishlist::{Wishlist, WishlistAction};
use storefront_core::{CommerceError, Money, OrderId, ProductId, StoreSettings};
use storefront_data::{CatalogProvider, OrderGateway};
use storefront_session::{SessionToken, TokenStore};
use tokio::sync::watch;

use crate::checkout::WidgetInstance;
use crate::notify::{LogNotifier, Notice, Notifier};
use crate::sync::{RemoteSync, SyncStats};

/// Mutable state of one storefront session.
#[derive(Debug, Default)]
pub(crate) struct ShopState {
    pub(crate) catalog: StockIndex,
    pub(crate) cart: CartStore,
    pub(crate) wishlist: Wishlist,
    pub(crate) session: Option<SessionToken>,
    /// Bumped on every login and logout.
    pub(crate) epoch: u64,
    pub(crate) checkout: CheckoutFlow,
    pub(crate) widget: Option<WidgetInstance>,
    pub(crate) next_widget_id: u64,
    pub(crate) orders: Option<OrderHistory>,
    /// Cart pushes made while the session's cart is being fetched.
    /// Replayed over the fetched cart.
    pub(crate) pending_pushes: Option<Vec<CartPush>>,
}

impl ShopState {
    pub(crate) fn pricing(&self, settings: &StoreSettings) -> CartPricing {
        CartPricing::compute(&self.cart, &self.catalog, settings)
    }

    /// Session token, if it is still the one captured at `epoch`.
    pub(crate) fn session_at(&self, epoch: u64) -> Option<&SessionToken> {
        self.session.as_ref().filter(|_| self.epoch == epoch)
    }

    fn require_session(&self) -> Result<(SessionToken, u64), CommerceError> {
        self.session
            .clone()
            .map(|token| (token, self.epoch))
            .ok_or(CommerceError::AuthRequired)
    }
}

pub(crate) struct ShopInner {
    pub(crate) state: Mutex<ShopState>,
    pub(crate) catalog: Arc<dyn CatalogProvider>,
    pub(crate) gateway: Arc<dyn OrderGateway>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) settings: StoreSettings,
    tokens: Option<TokenStore>,
    sync: RemoteSync,
    revision: watch::Sender<u64>,
}

/// Builder for [`Shop`].
pub struct ShopBuilder {
    catalog: Arc<dyn CatalogProvider>,
    gateway: Arc<dyn OrderGateway>,
    notifier: Arc<dyn Notifier>,
    settings: StoreSettings,
    tokens: Option<TokenStore>,
}

impl ShopBuilder {
    pub fn settings(mut self, settings: StoreSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Persist the session token so it survives a restart.
    pub fn token_store(mut self, tokens: TokenStore) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Build the shop and start its Remote Sync worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Shop {
        let sync = RemoteSync::spawn(self.gateway.clone(), self.notifier.clone());
        let (revision, _) = watch::channel(0);
        Shop {
            inner: Arc::new(ShopInner {
                state: Mutex::new(ShopState::default()),
                catalog: self.catalog,
                gateway: self.gateway,
                notifier: self.notifier,
                settings: self.settings,
                tokens: self.tokens,
                sync,
                revision,
            }),
        }
    }
}

/// Cloneable handle to the storefront state.
#[derive(Clone)]
pub struct Shop {
    pub(crate) inner: Arc<ShopInner>,
}

/// Non-owning handle; does not keep the shop alive.
#[derive(Clone)]
pub(crate) struct WeakShop(Weak<ShopInner>);

impl WeakShop {
    pub(crate) fn upgrade(&self) -> Option<Shop> {
        self.0.upgrade().map(|inner| Shop { inner })
    }
}

impl Shop {
    pub fn builder(
        catalog: Arc<dyn CatalogProvider>,
        gateway: Arc<dyn OrderGateway>,
    ) -> ShopBuilder {
        ShopBuilder {
            catalog,
            gateway,
            notifier: Arc::new(LogNotifier),
            settings: StoreSettings::default(),
            tokens: None,
        }
    }

    /// Shorthand for a backend implementing both interfaces.
    pub fn new<G>(backend: Arc<G>) -> ShopBuilder
    where
        G: CatalogProvider + OrderGateway + 'static,
    {
        Self::builder(backend.clone(), backend)
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.inner.settings
    }

    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut ShopState) -> R) -> R {
        f(&mut self.inner.state.lock())
    }

    pub(crate) fn notify(&self, notice: Notice) {
        self.inner.notifier.notify(notice);
    }

    /// Revision counter, bumped whenever the cart or the catalog changes.
    pub fn revisions(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    pub(crate) fn bump_revision(&self) {
        self.inner.revision.send_modify(|r| *r += 1);
    }

    pub(crate) fn downgrade(&self) -> WeakShop {
        WeakShop(Arc::downgrade(&self.inner))
    }

    // ---- session lifecycle ----

    pub fn is_authenticated(&self) -> bool {
        self.with_state(|s| s.session.is_some())
    }

    pub fn session(&self) -> Option<SessionToken> {
        self.with_state(|s| s.session.clone())
    }

    /// Resume the persisted session, if any. Returns whether one was found.
    pub async fn restore(&self) -> Result<bool, CommerceError> {
        let Some(tokens) = &self.inner.tokens else {
            return Ok(false);
        };
        let token = match tokens.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read the saved session");
                None
            }
        };
        match token {
            Some(token) => {
                self.establish_session(token).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Bind the shop to `token` and rehydrate cart and wishlist from the Gateway.
    ///
    /// The Gateway's cart replaces the local one; edits made before login are
    /// not merged. Edits made while the fetch is in flight are replayed on top
    /// of it. If another login or a logout happens meanwhile, the results are
    /// discarded.
    pub async fn establish_session(&self, token: SessionToken) -> Result<(), CommerceError> {
        if token.is_blank() {
            return Err(CommerceError::Validation("session token is empty".into()));
        }
        if let Some(tokens) = &self.inner.tokens {
            if let Err(e) = tokens.save(&token) {
                tracing::warn!(error = %e, "Could not persist the session");
                self.notify(Notice::warning("You will need to log in again next time"));
            }
        }

        let epoch = self.with_state(|s| {
            s.epoch += 1;
            s.session = Some(token.clone());
            s.orders = None;
            s.checkout.reset();
            s.widget = None;
            s.pending_pushes = Some(Vec::new());
            s.epoch
        });
        tracing::info!(epoch, "Session established");

        let gateway = &self.inner.gateway;
        let (cart, wishlist) =
            futures::join!(gateway.get_cart(&token), gateway.get_wishlist(&token));

        let mut first_error = None;
        self.with_state(|s| {
            if s.session_at(epoch).is_none() {
                tracing::debug!(epoch, "Session changed during rehydration; discarding");
                return;
            }
            let pending = s.pending_pushes.take().unwrap_or_default();
            match cart {
                Ok(mut cart) => {
                    for push in &pending {
                        cart.apply(push);
                    }
                    if !pending.is_empty() {
                        tracing::debug!(replayed = pending.len(), "Replayed cart edits over the fetched cart");
                    }
                    s.cart = cart;
                }
                Err(e) => first_error = Some(e),
            }
            match wishlist {
                Ok(products) => s.wishlist.replace(products),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        });
        self.bump_revision();

        match first_error {
            Some(e) => {
                tracing::warn!(error = %e, "Rehydration failed");
                self.notify(Notice::error(e.user_message()));
                Err(e.into())
            }
            None => Ok(()),
        }
    }

    /// Drop the session and everything tied to it.
    pub fn logout(&self) {
        if let Some(tokens) = &self.inner.tokens {
            if let Err(e) = tokens.clear() {
                tracing::warn!(error = %e, "Could not remove the saved session");
            }
        }
        self.with_state(|s| {
            s.epoch += 1;
            s.session = None;
            s.cart.clear();
            s.wishlist.clear();
            s.checkout.reset();
            s.widget = None;
            s.orders = None;
            s.pending_pushes = None;
        });
        self.bump_revision();
        tracing::info!("Logged out");
    }

    // ---- catalog ----

    /// Replace the catalog snapshot with a fresh one from the provider.
    pub async fn refresh_catalog(&self) -> Result<usize, CommerceError> {
        match self.inner.catalog.list_products().await {
            Ok(products) => {
                let count = products.len();
                self.with_state(|s| s.catalog.replace(products));
                self.bump_revision();
                tracing::debug!(products = count, "Catalog refreshed");
                Ok(count)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Catalog refresh failed");
                self.notify(Notice::error(e.user_message()));
                Err(e.into())
            }
        }
    }

    pub fn products(&self) -> Vec<Product> {
        self.with_state(|s| s.catalog.products().to_vec())
    }

    pub fn product(&self, product_id: &ProductId) -> Option<Product> {
        self.with_state(|s| s.catalog.product(product_id).cloned())
    }

    pub fn available_stock(&self, product_id: &ProductId, size: &str) -> u32 {
        self.with_state(|s| s.catalog.available_stock(product_id, size))
    }

    // ---- cart ----

    /// Add one unit of `product_id` in `size`.
    pub fn add_to_cart(
        &self,
        product_id: impl Into<ProductId>,
        size: impl Into<String>,
    ) -> Result<CartPush, CommerceError> {
        self.mutate_cart(CartCommand::add(product_id, size))
    }

    /// Set the absolute quantity; 0 removes the entry.
    pub fn set_quantity(
        &self,
        product_id: impl Into<ProductId>,
        size: impl Into<String>,
        quantity: u32,
    ) -> Result<CartPush, CommerceError> {
        self.mutate_cart(CartCommand::set(product_id, size, quantity))
    }

    /// Validate and apply locally, then hand the push to Remote Sync.
    ///
    /// Without a session the change stays local.
    pub fn mutate_cart(&self, command: CartCommand) -> Result<CartPush, CommerceError> {
        let (push, session) = self.with_state(|s| {
            let push = CartMutator::execute(&mut s.cart, &s.catalog, &command)?;
            if let Some(pending) = s.pending_pushes.as_mut() {
                pending.push(push.clone());
            }
            Ok::<_, CommerceError>((push, s.session.clone()))
        })?;
        self.bump_revision();

        match session {
            Some(session) => {
                if !self.inner.sync.enqueue(session, push.clone()) {
                    tracing::warn!(product_id = %push.product_id, "Remote Sync is stopped; change kept locally");
                }
            }
            None => tracing::debug!(
                product_id = %push.product_id,
                size = %push.size,
                quantity = push.quantity,
                "No session; cart change kept locally"
            ),
        }
        Ok(push)
    }

    pub fn cart(&self) -> CartStore {
        self.with_state(|s| s.cart.clone())
    }

    /// Total units in the cart.
    pub fn count(&self) -> u64 {
        self.with_state(|s| s.cart.count())
    }

    /// Cart amount before delivery.
    pub fn amount(&self) -> Money {
        self.with_state(|s| cart::amount(&s.cart, &s.catalog, self.inner.settings.currency))
    }

    pub fn pricing(&self) -> CartPricing {
        self.with_state(|s| s.pricing(&self.inner.settings))
    }

    /// Wait until queued cart pushes have been attempted.
    pub async fn flush(&self) {
        self.inner.sync.flush().await;
    }

    /// Stop Remote Sync after draining its queue.
    pub async fn shutdown(&self) -> SyncStats {
        self.inner.sync.shutdown().await
    }

    // ---- wishlist ----

    pub fn wishlist(&self) -> Wishlist {
        self.with_state(|s| s.wishlist.clone())
    }

    /// Toggle membership of `product_id`. Returns whether it is now wishlisted.
    ///
    /// Remote-first: the local wishlist only changes after the Gateway
    /// accepted the change.
    pub async fn toggle_wishlist(&self, product_id: &ProductId) -> Result<bool, CommerceError> {
        let (session, epoch, action, product) = self.with_state(|s| {
            let (session, epoch) = s.require_session()?;
            let action = s.wishlist.action_for(product_id);
            let product = match action {
                WishlistAction::Add => Some(
                    s.catalog
                        .product(product_id)
                        .cloned()
                        .ok_or_else(|| CommerceError::ProductNotFound(product_id.clone()))?,
                ),
                WishlistAction::Remove => None,
            };
            Ok::<_, CommerceError>((session, epoch, action, product))
        })?;

        if let Err(e) = self
            .inner
            .gateway
            .mutate_wishlist(&session, product_id, action)
            .await
        {
            tracing::warn!(product_id = %product_id, action = action.as_str(), error = %e, "Wishlist update failed");
            self.notify(Notice::error(e.user_message()));
            return Err(e.into());
        }

        self.with_state(|s| {
            if s.session_at(epoch).is_none() {
                return Err(CommerceError::AuthRequired);
            }
            match product {
                Some(product) => {
                    s.wishlist.insert(product);
                }
                None => {
                    s.wishlist.remove(product_id);
                }
            }
            Ok(())
        })?;

        tracing::debug!(product_id = %product_id, action = action.as_str(), "Wishlist updated");
        Ok(action == WishlistAction::Add)
    }

    // ---- orders ----

    /// Fetch the customer's orders.
    pub async fn order_history(&self) -> Result<OrderHistory, CommerceError> {
        let (session, epoch) = self.with_state(|s| s.require_session())?;
        let history = self.inner.gateway.list_orders(&session).await?;
        self.with_state(|s| {
            if s.session_at(epoch).is_some() {
                s.orders = Some(history.clone());
            }
        });
        Ok(history)
    }

    /// Ask the Gateway to cancel an order.
    ///
    /// Refused locally when the last fetched history shows the order can no
    /// longer be cancelled. The history is refetched afterwards.
    pub async fn cancel_order(
        &self,
        order_id: &OrderId,
        reason: CancelReason,
    ) -> Result<OrderHistory, CommerceError> {
        let (session, _) = self.with_state(|s| {
            if let Some(order) = s.orders.as_ref().and_then(|h| h.find(order_id)) {
                if !order.can_cancel() {
                    return Err(CommerceError::NotCancellable(order_id.to_string()));
                }
            }
            s.require_session()
        })?;

        if let Err(e) = self
            .inner
            .gateway
            .cancel_order(&session, order_id, &reason)
            .await
        {
            tracing::warn!(order_id = %order_id, error = %e, "Cancel failed");
            self.notify(Notice::error(e.user_message()));
            return Err(e.into());
        }
        tracing::info!(order_id = %order_id, reason = %reason, "Order cancelled");
        self.notify(Notice::success("Order cancelled"));
        self.order_history().await
    }

    /// Shipping address remembered from the last checkout.
    pub fn saved_address(&self) -> ShippingAddress {
        self.with_state(|s| s.checkout.address().clone())
    }
}
