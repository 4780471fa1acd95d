//! Checkout module.
//!
//! Contains the shipping address, the order draft, payment methods, orders
//! as reported by the Gateway, and the checkout state machine.

mod address;
mod draft;
mod flow;
mod method;
mod order;

pub use address::ShippingAddress;
pub use draft::{DraftLine, OrderDraft};
pub use flow::{CheckoutFlow, CheckoutState, SubmissionStart};
pub use method::PaymentMethod;
pub use order::{
    CancelReason, FulfillmentStatus, Order, OrderHistory, OrderItem, COD_METHOD_LABEL,
};
