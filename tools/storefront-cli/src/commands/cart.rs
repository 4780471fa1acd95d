//! Cart commands.

use anyhow::Result;
use storefront_client::Shop;
use storefront_core::cart::CartPush;

use super::{CartArgs, CartCommand};
use crate::context::Context;
use crate::output::money_cell;

/// Run the cart command.
pub async fn run(args: CartArgs, ctx: &Context) -> Result<()> {
    let shop = ctx.shop().await?;
    let result = match args.command.unwrap_or(CartCommand::Show) {
        CartCommand::Show => Ok(()),
        CartCommand::Add { product, size } => {
            shop.add_to_cart(product, size).map(|push| report(&push, &shop, ctx))
        }
        CartCommand::Set {
            product,
            size,
            quantity,
        } => shop
            .set_quantity(product, size, quantity)
            .map(|push| report(&push, &shop, ctx)),
    };

    // Drain Remote Sync before the process exits; failures arrive as notices.
    let stats = shop.shutdown().await;
    ctx.output
        .debug(&format!("Synced {} change(s), {} failed", stats.pushed, stats.failed));
    result?;

    show(&shop, ctx);
    Ok(())
}

fn report(push: &CartPush, shop: &Shop, ctx: &Context) {
    if push.quantity == 0 {
        ctx.output
            .success(&format!("Removed {} ({})", push.product_id, push.size));
    } else {
        ctx.output.success(&format!(
            "{} ({}) x{}",
            push.product_id, push.size, push.quantity
        ));
    }
    if !shop.is_authenticated() {
        ctx.output
            .warn("Not logged in: this change is not saved. Run `shop login` first.");
    }
}

/// Print the cart with its pricing breakdown.
pub fn show(shop: &Shop, ctx: &Context) {
    let pricing = shop.pricing();

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "count": shop.count(),
            "cart": shop.cart(),
            "pricing": pricing,
        }));
        return;
    }

    ctx.output.header(&format!("Cart ({} item(s))", shop.count()));
    if pricing.lines.is_empty() {
        ctx.output.info("Your cart is empty");
        return;
    }

    let widths = [26, 28, 6, 5, 14];
    ctx.output
        .table_row(&["ID", "NAME", "SIZE", "QTY", "SUBTOTAL"], &widths);
    for line in &pricing.lines {
        ctx.output.table_row(
            &[
                line.product_id.as_str(),
                &line.name,
                &line.size,
                &line.quantity.to_string(),
                &money_cell(&line.subtotal),
            ],
            &widths,
        );
    }
    println!();
    ctx.output.kv("Subtotal", &pricing.subtotal.display());
    ctx.output.kv("Delivery", &pricing.delivery_fee.display());
    ctx.output.kv("Total", &pricing.total.display());
}
