//! Shopping cart module.
//!
//! Contains the Cart Store, the validating Cart Mutator and pricing.

mod mutator;
mod pricing;
mod store;

pub use mutator::{CartCommand, CartMutator, CartPush};
pub use pricing::{amount, CartPricing, LinePricing};
pub use store::{CartLine, CartStore};
