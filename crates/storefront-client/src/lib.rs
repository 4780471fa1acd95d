//! Storefront client runtime.
//!
//! Ties the pure domain in `storefront-core` to the Catalog Provider and
//! Order Gateway:
//!
//! - [`Shop`] - owned state container for one customer session
//! - [`RemoteSync`] - background mirroring of cart changes
//! - [`CheckoutOrchestrator`] - entry guard, totals, payment strategies
//! - [`Notifier`] - non-blocking notices (log, channel, fan-out)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use storefront_client::{CheckoutOrchestrator, RecordingHost, Shop};
//! use storefront_data::{GatewayConfig, HttpGateway};
//!
//! let backend = Arc::new(HttpGateway::new(GatewayConfig::new("https://api.shop.example"))?);
//! let shop = Shop::new(backend).build();
//! shop.refresh_catalog().await?;
//! shop.establish_session(token).await?;
//! shop.add_to_cart("p-42", "M")?;
//!
//! let checkout = CheckoutOrchestrator::new(shop.clone(), Arc::new(RecordingHost::new()));
//! checkout.begin()?;
//! ```

pub mod checkout;
mod notify;
mod shop;
mod sync;

pub use checkout::{
    CashOnDelivery, CheckoutHost, CheckoutOrchestrator, EmbeddedWidget, HostEvent,
    PaymentOutcome, PaymentStrategy, RecordingHost, SubmitOutcome, WalletRedirect,
    WidgetInstance,
};
pub use notify::{ChannelNotifier, LogNotifier, Notice, NoticeLevel, Notifier, NotifierRegistry};
pub use shop::{Shop, ShopBuilder};
pub use sync::{RemoteSync, SyncStats};
