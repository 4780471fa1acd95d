//! The host collaborator: whatever renders the storefront.

use parking_lot::Mutex;
use storefront_core::OrderId;

use super::WidgetInstance;

/// Side effects the orchestrator asks of its host.
///
/// Called after state has been updated and with no lock held.
pub trait CheckoutHost: Send + Sync {
    /// Checkout needs a session.
    fn redirect_to_login(&self);

    /// Checkout needs a non-empty cart.
    fn redirect_to_cart(&self);

    /// Full navigation away from the storefront, e.g. to a wallet page.
    fn navigate_external(&self, url: &str);

    /// An order was placed; typically show the order list.
    fn order_placed(&self, order_id: Option<&OrderId>);

    /// Render the payment widget for this instance, replacing any other.
    fn mount_widget(&self, widget: &WidgetInstance);

    /// Tear down a widget instance.
    fn discard_widget(&self, widget_id: u64);
}

/// Host events, as recorded by [`RecordingHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    RedirectToLogin,
    RedirectToCart,
    NavigateExternal(String),
    OrderPlaced(Option<OrderId>),
    MountWidget { widget_id: u64, total: i64 },
    DiscardWidget(u64),
}

/// Host that records what it was asked to do. Useful headless and in tests.
#[derive(Debug, Default)]
pub struct RecordingHost {
    events: Mutex<Vec<HostEvent>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().clone()
    }

    pub fn take_events(&self) -> Vec<HostEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    fn record(&self, event: HostEvent) {
        self.events.lock().push(event);
    }
}

impl CheckoutHost for RecordingHost {
    fn redirect_to_login(&self) {
        self.record(HostEvent::RedirectToLogin);
    }

    fn redirect_to_cart(&self) {
        self.record(HostEvent::RedirectToCart);
    }

    fn navigate_external(&self, url: &str) {
        self.record(HostEvent::NavigateExternal(url.to_string()));
    }

    fn order_placed(&self, order_id: Option<&OrderId>) {
        self.record(HostEvent::OrderPlaced(order_id.cloned()));
    }

    fn mount_widget(&self, widget: &WidgetInstance) {
        self.record(HostEvent::MountWidget {
            widget_id: widget.id,
            total: widget.total.amount,
        });
    }

    fn discard_widget(&self, widget_id: u64) {
        self.record(HostEvent::DiscardWidget(widget_id));
    }
}
