//! Wishlist commands.

use anyhow::Result;
use storefront_core::ProductId;

use super::{WishlistArgs, WishlistCommand};
use crate::context::Context;

/// Run the wishlist command.
pub async fn run(args: WishlistArgs, ctx: &Context) -> Result<()> {
    let shop = ctx.shop().await?;

    let result = match args.command.unwrap_or(WishlistCommand::Show) {
        WishlistCommand::Show => Ok(None),
        WishlistCommand::Toggle { product } => {
            let product_id = ProductId::new(product);
            shop.toggle_wishlist(&product_id)
                .await
                .map(|added| Some((product_id, added)))
        }
    };
    shop.shutdown().await;
    let toggled = result?;

    let wishlist = shop.wishlist();
    if ctx.output.is_json() {
        ctx.output.json(&wishlist.products());
        return Ok(());
    }

    if let Some((product_id, added)) = toggled {
        if added {
            ctx.output.success(&format!("Added {} to your wishlist", product_id));
        } else {
            ctx.output.success(&format!("Removed {} from your wishlist", product_id));
        }
    }

    ctx.output.header(&format!("Wishlist ({})", wishlist.len()));
    if wishlist.is_empty() {
        ctx.output.info("Nothing saved yet");
        return Ok(());
    }
    let currency = shop.settings().currency;
    for product in wishlist.products() {
        ctx.output.list_item(&format!(
            "{}  {}  {}",
            product.id,
            product.name,
            product.unit_price(currency)
        ));
    }
    Ok(())
}
