//! Payment methods offered at checkout.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three payment paths. Exactly one is active during checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    /// Cash on delivery: the order is placed synchronously.
    Cod,
    /// Wallet that takes payment on its own page after a full redirect.
    WalletRedirect,
    /// Provider widget embedded in the checkout page.
    EmbeddedWidget,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::Cod,
        PaymentMethod::WalletRedirect,
        PaymentMethod::EmbeddedWidget,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "cod",
            PaymentMethod::WalletRedirect => "wallet-redirect",
            PaymentMethod::EmbeddedWidget => "embedded-widget",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "Cash on delivery",
            PaymentMethod::WalletRedirect => "Wallet (redirect)",
            PaymentMethod::EmbeddedWidget => "Card / wallet widget",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cod" | "cash" => Ok(PaymentMethod::Cod),
            "wallet" | "wallet-redirect" | "momo" => Ok(PaymentMethod::WalletRedirect),
            "widget" | "embedded-widget" | "paypal" => Ok(PaymentMethod::EmbeddedWidget),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}
