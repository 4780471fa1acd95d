//! Storefront domain types and logic.
//!
//! Everything here is synchronous and free of I/O:
//!
//! - **Catalog**: Products and the per-size Stock Index
//! - **Cart**: Cart Store, Cart Mutator, pricing
//! - **Wishlist**: Product membership set
//! - **Checkout**: Address, order draft, orders, the checkout state machine
//!
//! # Example
//!
//! ```rust
//! use storefront_core::prelude::*;
//!
//! let stock = StockIndex::from_products(vec![
//!     Product::new("a", "Linen shirt", 100_000).with_size("M", 2),
//! ]);
//!
//! let mut cart = CartStore::new();
//! CartMutator::execute(&mut cart, &stock, &CartCommand::add("a", "M")).unwrap();
//!
//! let pricing = CartPricing::compute(&cart, &stock, &StoreSettings::default());
//! assert_eq!(pricing.total.amount, 130_000);
//! ```

pub mod error;
pub mod ids;
pub mod money;
pub mod settings;

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod wishlist;

pub use error::CommerceError;
pub use ids::*;
pub use money::{Currency, Money};
pub use settings::StoreSettings;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};
    pub use crate::settings::StoreSettings;

    // Catalog
    pub use crate::catalog::{Product, StockIndex};

    // Cart
    pub use crate::cart::{
        amount, CartCommand, CartLine, CartMutator, CartPricing, CartPush, CartStore,
        LinePricing,
    };

    // Wishlist
    pub use crate::wishlist::{Wishlist, WishlistAction};

    // Checkout
    pub use crate::checkout::{
        CancelReason, CheckoutFlow, CheckoutState, DraftLine, FulfillmentStatus, Order,
        OrderDraft, OrderHistory, OrderItem, PaymentMethod, ShippingAddress, SubmissionStart,
    };
}
