//! Order history and cancellation.

use anyhow::Result;
use dialoguer::{Confirm, Input, Select};
use storefront_client::Shop;
use storefront_core::checkout::{CancelReason, Order, OrderHistory};
use storefront_core::{Currency, Money, OrderId};

use super::{OrdersArgs, OrdersCommand};
use crate::context::Context;
use crate::output::{format_date, money_cell, status_badge};

/// Run the orders command.
pub async fn run(args: OrdersArgs, ctx: &Context) -> Result<()> {
    let shop = ctx.shop().await?;
    let currency = shop.settings().currency;

    let result = match args.command.unwrap_or(OrdersCommand::List { all: false }) {
        OrdersCommand::List { all } => shop
            .order_history()
            .await
            .map(|h| Some((h, all)))
            .map_err(Into::into),
        OrdersCommand::Cancel { order, reason, yes } => {
            cancel(&shop, OrderId::new(order), reason, yes, ctx).await
        }
    };
    shop.shutdown().await;

    if let Some((history, all)) = result? {
        print_history(&history, all, currency, ctx);
    }
    Ok(())
}

async fn cancel(
    shop: &Shop,
    order_id: OrderId,
    reason: Option<String>,
    yes: bool,
    ctx: &Context,
) -> Result<Option<(OrderHistory, bool)>> {
    let reason = match reason {
        Some(text) => CancelReason::Other(text),
        None if ctx.output.is_json() || yes => CancelReason::ChangedMind,
        None => prompt_reason()?,
    };

    if !yes && !ctx.output.is_json() {
        let confirmed = Confirm::new()
            .with_prompt(format!("Cancel order {}?", order_id))
            .default(false)
            .interact()?;
        if !confirmed {
            ctx.output.warn("Order kept");
            return Ok(None);
        }
    }

    // Cancellability is checked against the fetched history.
    shop.order_history().await?;
    let history = shop.cancel_order(&order_id, reason).await?;
    Ok(Some((history, false)))
}

fn prompt_reason() -> Result<CancelReason> {
    let presets = CancelReason::PRESETS;
    let mut items: Vec<&str> = presets.iter().map(CancelReason::as_str).collect();
    items.push("Other");

    let selection = Select::new()
        .with_prompt("Why are you cancelling?")
        .items(&items)
        .default(0)
        .interact()?;

    match presets.get(selection) {
        Some(reason) => Ok(reason.clone()),
        None => {
            let text: String = Input::new().with_prompt("Reason").interact_text()?;
            Ok(CancelReason::Other(text))
        }
    }
}

fn print_history(history: &OrderHistory, all: bool, currency: Currency, ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(history);
        return;
    }

    print_section("Active orders", &history.active_orders, currency, ctx);
    if all {
        print_section("Archived orders", &history.archived_orders, currency, ctx);
    } else if !history.archived_orders.is_empty() {
        ctx.output.debug(&format!(
            "{} archived order(s) hidden; use --all",
            history.archived_orders.len()
        ));
    }
}

fn print_section(title: &str, orders: &[Order], currency: Currency, ctx: &Context) {
    ctx.output.header(&format!("{} ({})", title, orders.len()));
    if orders.is_empty() {
        ctx.output.info("None");
        return;
    }

    let widths = [26, 16, 5, 14, 8, 0];
    ctx.output
        .table_row(&["ID", "DATE", "QTY", "AMOUNT", "PAYMENT", "STATUS"], &widths);
    for order in orders {
        let mut status = status_badge(&order.status);
        if order.can_cancel() {
            status.push_str(" (cancellable)");
        }
        ctx.output.table_row(
            &[
                order.id.as_str(),
                &format_date(order.date),
                &order.item_count().to_string(),
                &money_cell(&Money::new(order.amount, currency)),
                &order.payment_method,
                &status,
            ],
            &widths,
        );
    }
}
