//! Catalog listing.

use anyhow::Result;
use console::style;
use storefront_core::catalog::Product;

use super::ProductsArgs;
use crate::context::Context;
use crate::output::money_cell;

/// Run the products command.
pub async fn run(args: ProductsArgs, ctx: &Context) -> Result<()> {
    let shop = ctx.shop().await?;
    let currency = shop.settings().currency;

    let query = args.query.as_deref().map(str::to_lowercase);
    let products: Vec<Product> = shop
        .products()
        .into_iter()
        .filter(|p| !args.in_stock || !p.is_sold_out())
        .filter(|p| {
            query
                .as_deref()
                .map_or(true, |q| p.name.to_lowercase().contains(q))
        })
        .collect();

    shop.shutdown().await;

    if ctx.output.is_json() {
        ctx.output.json(&products);
        return Ok(());
    }

    ctx.output.header(&format!("Products ({})", products.len()));
    if products.is_empty() {
        ctx.output.info("No products match");
        return Ok(());
    }

    let widths = [26, 32, 14, 0];
    ctx.output.table_row(&["ID", "NAME", "PRICE", "STOCK"], &widths);
    for product in &products {
        let price = money_cell(&product.unit_price(currency));
        let stock = if product.is_sold_out() {
            style("sold out").red().to_string()
        } else {
            size_summary(product)
        };
        ctx.output
            .table_row(&[product.id.as_str(), &product.name, &price, &stock], &widths);
    }

    Ok(())
}

/// `S:3 M:0 L:5`, in the product's declared size order.
fn size_summary(product: &Product) -> String {
    product
        .sizes
        .iter()
        .map(|size| format!("{}:{}", size, product.stock_for(size)))
        .collect::<Vec<_>>()
        .join(" ")
}
