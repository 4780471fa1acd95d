//! CLI command implementations.

pub mod cart;
pub mod checkout;
pub mod config;
pub mod orders;
pub mod products;
pub mod session;
pub mod wishlist;

use clap::{Args, Subcommand};
use storefront_core::checkout::PaymentMethod;

/// Arguments for the products command.
#[derive(Args)]
pub struct ProductsArgs {
    /// Only show products whose name contains this text.
    pub query: Option<String>,

    /// Hide sold-out products.
    #[arg(long)]
    pub in_stock: bool,
}

/// Arguments for the login command.
#[derive(Args)]
pub struct LoginArgs {
    /// Session token issued by the backend (prompted for if omitted).
    #[arg(long)]
    pub token: Option<String>,
}

/// Arguments for the cart command.
#[derive(Args)]
pub struct CartArgs {
    #[command(subcommand)]
    pub command: Option<CartCommand>,
}

#[derive(Subcommand)]
pub enum CartCommand {
    /// Show the cart with pricing.
    Show,
    /// Add one unit of a product size.
    Add {
        /// Product ID.
        product: String,
        /// Size label.
        size: String,
    },
    /// Set the quantity of a product size (0 removes it).
    Set {
        /// Product ID.
        product: String,
        /// Size label.
        size: String,
        /// New quantity.
        quantity: u32,
    },
}

/// Arguments for the wishlist command.
#[derive(Args)]
pub struct WishlistArgs {
    #[command(subcommand)]
    pub command: Option<WishlistCommand>,
}

#[derive(Subcommand)]
pub enum WishlistCommand {
    /// List wishlisted products.
    Show,
    /// Add or remove a product.
    Toggle {
        /// Product ID.
        product: String,
    },
}

/// Arguments for the checkout command.
#[derive(Args)]
pub struct CheckoutArgs {
    /// Shipping address file (TOML or JSON). Prompted for if omitted.
    #[arg(short, long)]
    pub address: Option<String>,

    /// Payment method: cod, wallet or widget.
    #[arg(short, long)]
    pub method: Option<PaymentMethod>,

    /// Provider receipt (JSON) captured by the payment widget.
    #[arg(long)]
    pub receipt: Option<String>,

    /// Skip confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the orders command.
#[derive(Args)]
pub struct OrdersArgs {
    #[command(subcommand)]
    pub command: Option<OrdersCommand>,
}

#[derive(Subcommand)]
pub enum OrdersCommand {
    /// List active and archived orders.
    List {
        /// Include archived orders.
        #[arg(short, long)]
        all: bool,
    },
    /// Cancel an unprocessed cash-on-delivery order.
    Cancel {
        /// Order ID.
        order: String,

        /// Cancellation reason (chosen interactively if omitted).
        #[arg(short, long)]
        reason: Option<String>,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}
