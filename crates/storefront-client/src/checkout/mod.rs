//! Checkout: the orchestrator, payment strategies and the host seam.

mod host;
mod orchestrator;
mod payment;

pub use host::{CheckoutHost, HostEvent, RecordingHost};
pub use orchestrator::{CheckoutOrchestrator, SubmitOutcome, WidgetInstance};
pub use payment::{CashOnDelivery, EmbeddedWidget, PaymentOutcome, PaymentStrategy, WalletRedirect};
