//! Storefront CLI - shop from the terminal against the storefront backend.
//!
//! Commands:
//! - `shop products` - Browse the catalog
//! - `shop login` / `shop logout` - Manage the session
//! - `shop cart` - Show or change the cart
//! - `shop wishlist` - Show or toggle wishlisted products
//! - `shop checkout` - Pay with cash on delivery, a wallet or the card widget
//! - `shop orders` - List or cancel orders
//! - `shop config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    CartArgs, CheckoutArgs, ConfigArgs, LoginArgs, OrdersArgs, ProductsArgs, WishlistArgs,
};

/// Storefront CLI - browse, fill the cart and check out
#[derive(Parser)]
#[command(name = "shop")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the catalog
    Products(ProductsArgs),

    /// Start a session with a backend-issued token
    Login(LoginArgs),

    /// End the session and forget the saved token
    Logout,

    /// Show or change the cart
    Cart(CartArgs),

    /// Show or change the wishlist
    Wishlist(WishlistArgs),

    /// Place an order for the cart
    Checkout(CheckoutArgs),

    /// List or cancel orders
    Orders(OrdersArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = match context::Context::load(config_path, output.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(2);
        }
    };
    ctx.config.logging.init(cli.verbose);

    // Execute command
    let result = match cli.command {
        Commands::Products(args) => commands::products::run(args, &ctx).await,
        Commands::Login(args) => commands::session::login(args, &ctx).await,
        Commands::Logout => commands::session::logout(&ctx).await,
        Commands::Cart(args) => commands::cart::run(args, &ctx).await,
        Commands::Wishlist(args) => commands::wishlist::run(args, &ctx).await,
        Commands::Checkout(args) => commands::checkout::run(args, &ctx).await,
        Commands::Orders(args) => commands::orders::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use storefront_core::checkout::PaymentMethod;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_checkout_method_aliases() {
        let cli = Cli::try_parse_from(["shop", "checkout", "--method", "momo", "--yes"]).unwrap();
        let Commands::Checkout(args) = cli.command else {
            panic!("expected checkout");
        };
        assert_eq!(args.method, Some(PaymentMethod::WalletRedirect));
        assert!(args.yes);
    }

    #[test]
    fn test_cart_set_parses_quantity() {
        let cli = Cli::try_parse_from(["shop", "cart", "set", "p1", "M", "0"]).unwrap();
        let Commands::Cart(CartArgs {
            command: Some(commands::CartCommand::Set { quantity, .. }),
        }) = cli.command
        else {
            panic!("expected cart set");
        };
        assert_eq!(quantity, 0);
    }

    #[test]
    fn test_rejects_unknown_method() {
        assert!(Cli::try_parse_from(["shop", "checkout", "--method", "cheque"]).is_err());
    }
}
