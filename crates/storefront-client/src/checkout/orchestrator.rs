//! Checkout Orchestrator.
//!
//! Drives the checkout state machine for a [`Shop`]: guards entry, keeps the
//! amount due in sync with the cart, and runs the active payment strategy
//! with single-flight semantics per method.

use std::sync::Arc;
use storefront_core::checkout::{
    CheckoutState, OrderDraft, PaymentMethod, ShippingAddress, SubmissionStart,
};
use storefront_core::{CommerceError, Money, OrderId};

use super::{CashOnDelivery, CheckoutHost, EmbeddedWidget, PaymentOutcome, PaymentStrategy, WalletRedirect};
use crate::notify::Notice;
use crate::shop::{Shop, ShopState};

/// A mounted payment widget, bound to the total and address it was built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetInstance {
    pub id: u64,
    pub total: Money,
    pub address: ShippingAddress,
}

/// Result of a submission that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The order exists. The cart has been cleared.
    Placed {
        order_id: Option<OrderId>,
        amount: Money,
    },
    /// The customer was sent to the wallet page.
    Redirected { url: String, amount: Money },
    /// A submission for this method is already pending; nothing was sent.
    AlreadyInFlight,
}

/// Drives checkout for one shop.
#[derive(Clone)]
pub struct CheckoutOrchestrator {
    shop: Shop,
    host: Arc<dyn CheckoutHost>,
}

impl CheckoutOrchestrator {
    /// Create the orchestrator and start following the shop's revisions, so a
    /// mounted widget is rebuilt whenever the cart or the catalog moves its
    /// total.
    ///
    /// Must be called from within a tokio runtime. The follower ends when the
    /// last [`Shop`] handle is dropped.
    pub fn new(shop: Shop, host: Arc<dyn CheckoutHost>) -> Self {
        let orchestrator = Self { shop, host };
        orchestrator.follow_revisions();
        orchestrator
    }

    fn follow_revisions(&self) {
        let mut revisions = self.shop.revisions();
        let shop = self.shop.downgrade();
        let host = self.host.clone();
        tokio::spawn(async move {
            while revisions.changed().await.is_ok() {
                let Some(shop) = shop.upgrade() else { break };
                let orchestrator = CheckoutOrchestrator {
                    shop,
                    host: host.clone(),
                };
                if orchestrator.sync_widget() {
                    tracing::debug!("Payment widget rebuilt after a cart change");
                }
            }
        });
    }

    pub fn shop(&self) -> &Shop {
        &self.shop
    }

    pub fn state(&self) -> CheckoutState {
        self.shop.with_state(|s| s.checkout.state().clone())
    }

    /// Message from the last rejected submission.
    pub fn last_error(&self) -> Option<String> {
        self.shop
            .with_state(|s| s.checkout.last_error().map(str::to_string))
    }

    pub fn widget(&self) -> Option<WidgetInstance> {
        self.shop.with_state(|s| s.widget.clone())
    }

    /// Enter checkout.
    ///
    /// Without a session the host is sent to login; with an empty cart, back
    /// to the cart.
    pub fn begin(&self) -> Result<(), CommerceError> {
        let result = self
            .shop
            .with_state(|s| s.checkout.begin(s.session.is_some(), s.cart.count()));
        match &result {
            Err(CommerceError::AuthRequired) => self.host.redirect_to_login(),
            Err(CommerceError::CartEmpty) => self.host.redirect_to_cart(),
            Err(e) => tracing::debug!(error = %e, "Checkout entry refused"),
            Ok(()) => tracing::debug!("Checkout started"),
        }
        result
    }

    /// Leave checkout, discarding any widget.
    pub fn cancel(&self) {
        let widget = self.shop.with_state(|s| {
            s.checkout.reset();
            s.widget.take()
        });
        if let Some(widget) = widget {
            self.host.discard_widget(widget.id);
        }
    }

    /// Amount due: cart amount plus delivery fee, computed from the current cart.
    pub fn total(&self) -> Money {
        self.shop.pricing().total
    }

    /// The draft that would be submitted right now.
    pub fn draft(&self) -> OrderDraft {
        let settings = *self.shop.settings();
        self.shop.with_state(|s| {
            OrderDraft::build(&s.cart, &s.catalog, s.checkout.address(), &settings)
        })
    }

    /// Update the shipping address. A mounted widget is rebuilt for it.
    pub fn set_address(&self, address: ShippingAddress) -> Result<(), CommerceError> {
        let changed = self.shop.with_state(|s| s.checkout.set_address(address))?;
        if changed {
            self.sync_widget();
        }
        Ok(())
    }

    /// Make `method` the active payment method.
    ///
    /// Leaving the embedded widget discards its instance. Selecting it mounts
    /// one as soon as the address form is valid.
    pub fn select_method(&self, method: PaymentMethod) -> Result<(), CommerceError> {
        let discarded = self.shop.with_state(|s| {
            s.checkout.select_method(method)?;
            Ok::<_, CommerceError>(if method == PaymentMethod::EmbeddedWidget {
                None
            } else {
                s.widget.take()
            })
        })?;
        if let Some(widget) = discarded {
            self.host.discard_widget(widget.id);
        }
        tracing::debug!(method = method.as_str(), "Payment method selected");

        if method == PaymentMethod::EmbeddedWidget && self.shop.saved_address().is_form_valid() {
            self.mount_widget()?;
        }
        Ok(())
    }

    /// Build a fresh widget instance for the current total and address.
    ///
    /// Any previous instance is discarded first.
    pub fn mount_widget(&self) -> Result<WidgetInstance, CommerceError> {
        let settings = *self.shop.settings();
        let (widget, previous) = self.shop.with_state(|s| {
            if s.checkout.state().method() != Some(PaymentMethod::EmbeddedWidget)
                || !matches!(s.checkout.state(), CheckoutState::MethodSelected { .. })
            {
                return Err(CommerceError::InvalidCheckoutTransition {
                    from: s.checkout.state().as_str().to_string(),
                    to: "widget_mounted".to_string(),
                });
            }
            require_valid_address(s.checkout.address())?;
            s.next_widget_id += 1;
            let widget = WidgetInstance {
                id: s.next_widget_id,
                total: s.pricing(&settings).total,
                address: s.checkout.address().clone(),
            };
            let previous = s.widget.replace(widget.clone());
            Ok((widget, previous))
        })?;

        if let Some(previous) = previous {
            self.host.discard_widget(previous.id);
        }
        self.host.mount_widget(&widget);
        tracing::debug!(widget_id = widget.id, total = widget.total.amount, "Payment widget mounted");
        Ok(widget)
    }

    /// Rebuild the widget if the total or address moved since it was mounted.
    ///
    /// Runs on every shop revision. Returns whether a new instance was mounted.
    pub fn sync_widget(&self) -> bool {
        let settings = *self.shop.settings();
        let stale = self.shop.with_state(|s| match &s.widget {
            Some(widget) => !widget_is_current(s, widget, &settings),
            None => false,
        });
        if !stale {
            return false;
        }
        match self.mount_widget() {
            Ok(_) => true,
            Err(e) => {
                // The address no longer validates: a stale widget must go.
                let widget = self.shop.with_state(|s| s.widget.take());
                if let Some(widget) = widget {
                    self.host.discard_widget(widget.id);
                }
                tracing::debug!(error = %e, "Payment widget withdrawn");
                false
            }
        }
    }

    /// Submit with the active method (cash on delivery or wallet redirect).
    ///
    /// The embedded widget submits through [`confirm_capture`](Self::confirm_capture).
    pub async fn submit(&self) -> Result<SubmitOutcome, CommerceError> {
        let method = self.shop.with_state(|s| s.checkout.state().method());
        match method {
            Some(PaymentMethod::Cod) => self.run(&CashOnDelivery).await,
            Some(PaymentMethod::WalletRedirect) => self.run(&WalletRedirect).await,
            Some(PaymentMethod::EmbeddedWidget) => Err(CommerceError::Validation(
                "complete the payment in the widget".into(),
            )),
            None => Err(CommerceError::Validation("choose a payment method".into())),
        }
    }

    /// The widget reported a captured payment.
    ///
    /// Rejected if `widget_id` is not the current instance or if the total or
    /// address changed since it was mounted; in that case a fresh widget is
    /// mounted and nothing is sent.
    pub async fn confirm_capture(
        &self,
        widget_id: u64,
        receipt: serde_json::Value,
    ) -> Result<SubmitOutcome, CommerceError> {
        let settings = *self.shop.settings();
        let current = self.shop.with_state(|s| {
            s.widget
                .as_ref()
                .is_some_and(|w| w.id == widget_id && widget_is_current(s, w, &settings))
        });
        if !current {
            tracing::warn!(widget_id, "Capture from a stale payment widget");
            self.sync_widget();
            return Err(CommerceError::Payment(
                "the order changed; please confirm the payment again".into(),
            ));
        }
        self.run(&EmbeddedWidget { receipt }).await
    }

    /// Run a payment strategy through the state machine.
    pub async fn run(&self, strategy: &dyn PaymentStrategy) -> Result<SubmitOutcome, CommerceError> {
        let method = strategy.method();
        let settings = *self.shop.settings();

        let claim = self.shop.with_state(|s| {
            if s.checkout.is_busy(method) {
                return Ok(None);
            }
            let session = s.session.clone().ok_or(CommerceError::AuthRequired)?;
            if s.cart.is_empty() {
                return Err(CommerceError::CartEmpty);
            }
            require_valid_address(s.checkout.address())?;
            if s.checkout.start_submission(method)? == SubmissionStart::AlreadyInFlight {
                return Ok(None);
            }
            let draft = OrderDraft::build(&s.cart, &s.catalog, s.checkout.address(), &settings);
            Ok(Some((session, s.epoch, draft)))
        });

        let (session, epoch, draft) = match claim {
            Ok(Some(claim)) => claim,
            Ok(None) => {
                tracing::debug!(method = method.as_str(), "Submission already in flight");
                return Ok(SubmitOutcome::AlreadyInFlight);
            }
            Err(e) => {
                match &e {
                    CommerceError::AuthRequired => self.host.redirect_to_login(),
                    CommerceError::CartEmpty => self.host.redirect_to_cart(),
                    _ => {}
                }
                return Err(e);
            }
        };

        let amount = draft.amount;
        tracing::info!(
            method = method.as_str(),
            items = draft.item_count(),
            amount = amount.amount,
            "Submitting order"
        );
        let result = strategy
            .submit(self.shop.inner.gateway.as_ref(), &session, &draft)
            .await;

        match result {
            Ok(PaymentOutcome::Placed { order_id }) => {
                let widget = self.shop.with_state(|s| {
                    // A logout during the call already reset everything.
                    if s.session_at(epoch).is_none() {
                        return None;
                    }
                    s.checkout.mark_placed(method, order_id.clone());
                    s.cart.clear();
                    s.orders = None;
                    s.widget.take()
                });
                if let Some(widget) = widget {
                    self.host.discard_widget(widget.id);
                }
                self.shop.bump_revision();
                tracing::info!(method = method.as_str(), order_id = ?order_id, "Order placed");
                self.shop.notify(Notice::success("Order placed"));
                self.host.order_placed(order_id.as_ref());

                // Stock changed server-side.
                let _ = self.shop.refresh_catalog().await;
                Ok(SubmitOutcome::Placed { order_id, amount })
            }
            Ok(PaymentOutcome::Redirect { url }) => {
                self.shop.with_state(|s| s.checkout.mark_redirected(method));
                tracing::info!(method = method.as_str(), "Redirecting to payment page");
                self.host.navigate_external(&url);
                Ok(SubmitOutcome::Redirected { url, amount })
            }
            Err(e) => {
                let reason = e.to_string();
                self.shop.with_state(|s| s.checkout.mark_rejected(method, reason));
                tracing::warn!(method = method.as_str(), error = %e, "Order submission failed");
                self.shop.notify(Notice::error(user_message(&e)));
                Err(e)
            }
        }
    }
}

fn require_valid_address(address: &ShippingAddress) -> Result<(), CommerceError> {
    let missing = address.missing_fields();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CommerceError::Validation(format!(
            "missing delivery information: {}",
            missing.join(", ")
        )))
    }
}

fn widget_is_current(
    s: &ShopState,
    widget: &WidgetInstance,
    settings: &storefront_core::StoreSettings,
) -> bool {
    widget.total == s.pricing(settings).total && &widget.address == s.checkout.address()
}

fn user_message(e: &CommerceError) -> String {
    match e {
        CommerceError::Gateway(message) | CommerceError::Payment(message) => message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::{HostEvent, RecordingHost};
    use storefront_core::catalog::Product;
    use storefront_data::{GatewayCall, GatewayError, MemoryGateway, Operation};

    fn address() -> ShippingAddress {
        ShippingAddress {
            first_name: "Lan".into(),
            last_name: "Nguyen".into(),
            email: "lan@example.com".into(),
            street: "12 Le Loi".into(),
            city: "Hue".into(),
            state: String::new(),
            zipcode: "530000".into(),
            country: "Vietnam".into(),
            phone: "0901234567".into(),
        }
    }

    fn gateway() -> MemoryGateway {
        MemoryGateway::new().with_products(vec![
            Product::new("a", "Linen shirt", 100_000).with_size("M", 5),
            Product::new("b", "Canvas tote", 45_000).with_size("One", 5),
        ])
    }

    async fn checkout(gateway: &MemoryGateway) -> (CheckoutOrchestrator, Arc<RecordingHost>) {
        let shop = Shop::new(Arc::new(gateway.clone())).build();
        shop.refresh_catalog().await.unwrap();
        shop.establish_session("t".into()).await.unwrap();
        shop.add_to_cart("a", "M").unwrap();
        shop.set_quantity("b", "One", 2).unwrap();
        shop.flush().await;

        let host = Arc::new(RecordingHost::new());
        let orchestrator = CheckoutOrchestrator::new(shop, host.clone());
        orchestrator.begin().unwrap();
        orchestrator.set_address(address()).unwrap();
        (orchestrator, host)
    }

    #[tokio::test]
    async fn test_entry_guard_redirects() {
        let gateway = gateway();
        let shop = Shop::new(Arc::new(gateway.clone())).build();
        shop.refresh_catalog().await.unwrap();
        let host = Arc::new(RecordingHost::new());
        let orchestrator = CheckoutOrchestrator::new(shop.clone(), host.clone());

        assert_eq!(orchestrator.begin(), Err(CommerceError::AuthRequired));
        shop.establish_session("t".into()).await.unwrap();
        assert_eq!(orchestrator.begin(), Err(CommerceError::CartEmpty));
        assert_eq!(host.events(), vec![HostEvent::RedirectToLogin, HostEvent::RedirectToCart]);
        assert_eq!(orchestrator.state(), CheckoutState::Idle);
    }

    #[tokio::test]
    async fn test_cod_places_order_and_clears_cart() {
        let gateway = gateway();
        let (orchestrator, host) = checkout(&gateway).await;
        orchestrator.select_method(PaymentMethod::Cod).unwrap();

        let outcome = orchestrator.submit().await.unwrap();
        assert_eq!(
            outcome,
            SubmitOutcome::Placed {
                order_id: Some("order-1".into()),
                amount: Money::new(220_000, Default::default()),
            }
        );
        assert_eq!(orchestrator.shop().count(), 0);
        assert!(matches!(orchestrator.state(), CheckoutState::Placed { .. }));
        assert!(host.events().contains(&HostEvent::OrderPlaced(Some("order-1".into()))));
        // Catalog was refreshed with the decremented stock.
        assert_eq!(orchestrator.shop().available_stock(&"a".into(), "M"), 4);
    }

    #[tokio::test]
    async fn test_cod_failure_keeps_cart_and_method() {
        let gateway = gateway();
        let (orchestrator, _host) = checkout(&gateway).await;
        orchestrator.select_method(PaymentMethod::Cod).unwrap();
        gateway.fail(Operation::PlaceOrder, GatewayError::Rejected("Store closed".into()));

        let err = orchestrator.submit().await.unwrap_err();
        assert_eq!(err, CommerceError::Gateway("Store closed".into()));
        assert_eq!(orchestrator.shop().count(), 3);
        assert_eq!(
            orchestrator.state(),
            CheckoutState::MethodSelected { method: PaymentMethod::Cod }
        );
        assert!(orchestrator.last_error().unwrap().contains("Store closed"));
    }

    #[tokio::test]
    async fn test_invalid_address_blocks_submission() {
        let gateway = gateway();
        let (orchestrator, _host) = checkout(&gateway).await;
        let mut incomplete = address();
        incomplete.phone.clear();
        orchestrator.set_address(incomplete).unwrap();
        orchestrator.select_method(PaymentMethod::Cod).unwrap();

        assert!(matches!(orchestrator.submit().await, Err(CommerceError::Validation(_))));
        assert!(gateway.calls_to(Operation::PlaceOrder).is_empty());
        assert!(!orchestrator.shop().with_state(|s| s.checkout.is_busy(PaymentMethod::Cod)));
    }

    #[tokio::test]
    async fn test_same_total_across_payment_paths() {
        let gateway = gateway();
        let (orchestrator, _host) = checkout(&gateway).await;
        let expected = orchestrator.total();

        orchestrator.select_method(PaymentMethod::WalletRedirect).unwrap();
        orchestrator.submit().await.unwrap();

        orchestrator.select_method(PaymentMethod::EmbeddedWidget).unwrap();
        let widget = orchestrator.widget().unwrap();
        assert_eq!(widget.total, expected);

        gateway.fail(Operation::CaptureEmbeddedPayment, GatewayError::Rejected("declined".into()));
        let _ = orchestrator
            .confirm_capture(widget.id, serde_json::json!({"id": "cap"}))
            .await;

        orchestrator.select_method(PaymentMethod::Cod).unwrap();
        orchestrator.submit().await.unwrap();

        let amounts: Vec<i64> = gateway
            .calls()
            .iter()
            .filter_map(GatewayCall::draft)
            .map(|d| d.amount.amount)
            .collect();
        assert_eq!(amounts.len(), 3);
        assert!(amounts.iter().all(|a| *a == expected.amount));
        assert_eq!(expected.amount, 100_000 + 2 * 45_000 + 30_000);
    }

    #[tokio::test]
    async fn test_repeated_submit_is_single_flight() {
        let gateway = gateway();
        let (orchestrator, _host) = checkout(&gateway).await;
        orchestrator.select_method(PaymentMethod::Cod).unwrap();
        gateway.hold(Operation::PlaceOrder);

        let first = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move { orchestrator.submit().await }
        });
        while gateway.calls_to(Operation::PlaceOrder).is_empty() {
            tokio::task::yield_now().await;
        }

        assert_eq!(orchestrator.submit().await, Ok(SubmitOutcome::AlreadyInFlight));
        gateway.release(Operation::PlaceOrder);
        assert!(matches!(first.await.unwrap(), Ok(SubmitOutcome::Placed { .. })));
        assert_eq!(gateway.calls_to(Operation::PlaceOrder).len(), 1);
        assert_eq!(gateway.orders().active_orders.len(), 1);
    }

    #[tokio::test]
    async fn test_wallet_redirect_navigates_and_keeps_cart() {
        let gateway = gateway();
        let (orchestrator, host) = checkout(&gateway).await;
        orchestrator.select_method(PaymentMethod::WalletRedirect).unwrap();

        let outcome = orchestrator.submit().await.unwrap();
        let SubmitOutcome::Redirected { url, .. } = outcome else {
            panic!("expected a redirect, got {outcome:?}");
        };
        assert!(host.events().contains(&HostEvent::NavigateExternal(url)));
        assert_eq!(orchestrator.shop().count(), 3);
        assert_eq!(orchestrator.submit().await, Ok(SubmitOutcome::AlreadyInFlight));
    }

    #[tokio::test]
    async fn test_wallet_failure_moves_to_failed_and_allows_retry() {
        let gateway = gateway();
        let (orchestrator, _host) = checkout(&gateway).await;
        orchestrator.select_method(PaymentMethod::WalletRedirect).unwrap();
        gateway.fail(Operation::InitiateWalletPayment, GatewayError::Transport("timeout".into()));

        assert!(matches!(orchestrator.submit().await, Err(CommerceError::Payment(_))));
        assert!(matches!(orchestrator.state(), CheckoutState::Failed { .. }));

        gateway.recover(Operation::InitiateWalletPayment);
        orchestrator.select_method(PaymentMethod::WalletRedirect).unwrap();
        assert!(matches!(orchestrator.submit().await, Ok(SubmitOutcome::Redirected { .. })));
    }

    #[tokio::test]
    async fn test_widget_requires_valid_address() {
        let gateway = gateway();
        let (orchestrator, _host) = checkout(&gateway).await;
        orchestrator.set_address(ShippingAddress::default()).unwrap();

        orchestrator.select_method(PaymentMethod::EmbeddedWidget).unwrap();
        assert!(orchestrator.widget().is_none());
        assert!(matches!(orchestrator.mount_widget(), Err(CommerceError::Validation(_))));

        orchestrator.set_address(address()).unwrap();
        assert!(orchestrator.mount_widget().is_ok());
    }

    #[tokio::test]
    async fn test_stale_widget_cannot_capture() {
        let gateway = gateway();
        let (orchestrator, host) = checkout(&gateway).await;
        orchestrator.select_method(PaymentMethod::EmbeddedWidget).unwrap();
        let stale = orchestrator.widget().unwrap();

        orchestrator.shop().add_to_cart("a", "M").unwrap();
        let err = orchestrator
            .confirm_capture(stale.id, serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Payment(_)));
        assert!(gateway.calls_to(Operation::CaptureEmbeddedPayment).is_empty());

        let fresh = orchestrator.widget().unwrap();
        assert_ne!(fresh.id, stale.id);
        assert_eq!(fresh.total, orchestrator.total());
        assert!(host.events().contains(&HostEvent::DiscardWidget(stale.id)));

        let outcome = orchestrator
            .confirm_capture(fresh.id, serde_json::json!({"id": "cap-2"}))
            .await
            .unwrap();
        assert!(matches!(outcome, SubmitOutcome::Placed { .. }));
        assert_eq!(orchestrator.shop().count(), 0);
    }

    #[tokio::test]
    async fn test_cart_change_rebuilds_widget() {
        let gateway = gateway();
        let (orchestrator, host) = checkout(&gateway).await;
        orchestrator.select_method(PaymentMethod::EmbeddedWidget).unwrap();
        let before = orchestrator.widget().unwrap();

        orchestrator.shop().set_quantity("b", "One", 1).unwrap();
        let rebuilt = tokio::time::timeout(std::time::Duration::from_secs(2), async {
            loop {
                match orchestrator.widget() {
                    Some(widget) if widget.id != before.id => break widget,
                    _ => tokio::task::yield_now().await,
                }
            }
        })
        .await
        .expect("widget rebuilt after the cart changed");

        assert_eq!(rebuilt.total, orchestrator.total());
        assert_ne!(rebuilt.total, before.total);
        let events = host.events();
        assert!(events.contains(&HostEvent::DiscardWidget(before.id)));
        assert_eq!(
            events.last(),
            Some(&HostEvent::MountWidget {
                widget_id: rebuilt.id,
                total: rebuilt.total.amount,
            })
        );
    }

    #[tokio::test]
    async fn test_switching_method_discards_widget() {
        let gateway = gateway();
        let (orchestrator, host) = checkout(&gateway).await;
        orchestrator.select_method(PaymentMethod::EmbeddedWidget).unwrap();
        let widget = orchestrator.widget().unwrap();

        orchestrator.select_method(PaymentMethod::Cod).unwrap();
        assert!(orchestrator.widget().is_none());
        assert!(host.events().contains(&HostEvent::DiscardWidget(widget.id)));
    }
}
