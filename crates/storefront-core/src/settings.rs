//! Store-wide pricing settings.

use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};

/// Flat delivery fee charged on every order, in minor units.
pub const DEFAULT_DELIVERY_FEE: i64 = 30_000;

/// Currency and fee constants applied to every checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Trading currency for catalog prices.
    pub currency: Currency,
    /// Delivery fee in minor units of `currency`.
    pub delivery_fee: i64,
}

impl StoreSettings {
    /// Delivery fee as money.
    pub fn delivery_fee(&self) -> Money {
        Money::new(self.delivery_fee, self.currency)
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            currency: Currency::VND,
            delivery_fee: DEFAULT_DELIVERY_FEE,
        }
    }
}
