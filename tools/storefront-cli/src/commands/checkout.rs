//! Checkout.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use dialoguer::{Confirm, Input, Select};
use storefront_client::{CheckoutHost, CheckoutOrchestrator, SubmitOutcome, WidgetInstance};
use storefront_core::checkout::{PaymentMethod, ShippingAddress};
use storefront_core::OrderId;

use super::CheckoutArgs;
use crate::context::Context;
use crate::output::Output;

/// Terminal host: prints where a browser would navigate.
struct TerminalHost {
    output: Output,
}

impl CheckoutHost for TerminalHost {
    fn redirect_to_login(&self) {
        self.output.warn("Log in first: shop login --token <TOKEN>");
    }

    fn redirect_to_cart(&self) {
        self.output
            .warn("Your cart is empty: add something with `shop cart add`");
    }

    fn navigate_external(&self, url: &str) {
        self.output.info("Complete the payment in your browser:");
        self.output.kv("URL", url);
    }

    fn order_placed(&self, order_id: Option<&OrderId>) {
        if let Some(order_id) = order_id {
            self.output.kv("Order", order_id.as_str());
        }
        self.output.info("Track it with `shop orders`");
    }

    fn mount_widget(&self, widget: &WidgetInstance) {
        self.output.debug(&format!(
            "Payment widget #{} ready for {}",
            widget.id, widget.total
        ));
    }

    fn discard_widget(&self, widget_id: u64) {
        self.output
            .debug(&format!("Payment widget #{} discarded", widget_id));
    }
}

/// Run the checkout command.
pub async fn run(args: CheckoutArgs, ctx: &Context) -> Result<()> {
    let shop = ctx.shop().await?;
    let host = Arc::new(TerminalHost {
        output: ctx.output.clone(),
    });
    let checkout = CheckoutOrchestrator::new(shop.clone(), host);

    let result = drive(&checkout, args, ctx).await;
    shop.shutdown().await;
    let Some(outcome) = result? else {
        return Ok(());
    };

    if ctx.output.is_json() {
        ctx.output.json(&outcome_json(&outcome));
        return Ok(());
    }
    match outcome {
        SubmitOutcome::Placed { amount, .. } => {
            ctx.output.kv("Charged", &amount.display());
        }
        SubmitOutcome::Redirected { amount, .. } => {
            ctx.output.kv("Amount", &amount.display());
            ctx.output
                .info("Your cart is kept until the wallet confirms the payment");
        }
        SubmitOutcome::AlreadyInFlight => {
            ctx.output.warn("A payment is already in progress");
        }
    }
    Ok(())
}

/// Walk the checkout states. `None` means the customer backed out.
async fn drive(
    checkout: &CheckoutOrchestrator,
    args: CheckoutArgs,
    ctx: &Context,
) -> Result<Option<SubmitOutcome>> {
    checkout.begin()?;

    let address = match &args.address {
        Some(path) => load_address(&ctx.resolve_path(path))?,
        None if ctx.output.is_json() => bail!("--address is required with --json"),
        None => prompt_address(checkout.shop().saved_address())?,
    };
    checkout.set_address(address)?;

    let method = match args.method {
        Some(method) => method,
        None if ctx.output.is_json() => bail!("--method is required with --json"),
        None => prompt_method()?,
    };
    checkout.select_method(method)?;

    // The receipt is needed before anything is shown as confirmed.
    let receipt = match (method, &args.receipt) {
        (PaymentMethod::EmbeddedWidget, Some(path)) => Some(load_receipt(&ctx.resolve_path(path))?),
        (PaymentMethod::EmbeddedWidget, None) => {
            bail!("Pay in the provider widget first, then pass its receipt with --receipt")
        }
        _ => None,
    };

    if !ctx.output.is_json() {
        super::cart::show(checkout.shop(), ctx);
        let draft = checkout.draft();
        ctx.output.kv("Ship to", &format!(
            "{}, {}",
            draft.address.full_name(),
            draft.address.one_line()
        ));
        ctx.output.kv("Payment", method.display_name());
    }

    if !args.yes && !ctx.output.is_json() {
        let confirmed = Confirm::new()
            .with_prompt(format!("Pay {}?", checkout.total()))
            .default(false)
            .interact()?;
        if !confirmed {
            checkout.cancel();
            ctx.output.warn("Checkout cancelled");
            return Ok(None);
        }
    }

    let spinner = ctx.output.spinner("Placing order...");
    let outcome = match receipt {
        Some(receipt) => {
            let widget = match checkout.widget() {
                Some(widget) => widget,
                None => checkout.mount_widget()?,
            };
            checkout.confirm_capture(widget.id, receipt).await
        }
        None => checkout.submit().await,
    };
    spinner.finish_and_clear();

    Ok(Some(outcome?))
}

fn load_address(path: &Path) -> Result<ShippingAddress> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read address file: {}", path.display()))?;
    if path.extension().is_some_and(|e| e == "json") {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse address: {}", path.display()))
    } else {
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse address: {}", path.display()))
    }
}

fn load_receipt(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read receipt: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Receipt is not valid JSON: {}", path.display()))
}

fn prompt_address(saved: ShippingAddress) -> Result<ShippingAddress> {
    fn ask(prompt: &str, current: String, optional: bool) -> Result<String> {
        let value: String = Input::new()
            .with_prompt(prompt)
            .with_initial_text(current)
            .allow_empty(optional)
            .interact_text()?;
        Ok(value.trim().to_string())
    }

    Ok(ShippingAddress {
        first_name: ask("First name", saved.first_name, false)?,
        last_name: ask("Last name", saved.last_name, false)?,
        email: ask("Email", saved.email, false)?,
        street: ask("Street", saved.street, false)?,
        city: ask("City", saved.city, false)?,
        state: ask("State (optional)", saved.state, true)?,
        zipcode: ask("Zip code", saved.zipcode, false)?,
        country: ask("Country", saved.country, false)?,
        phone: ask("Phone", saved.phone, false)?,
    })
}

fn prompt_method() -> Result<PaymentMethod> {
    let items: Vec<&str> = PaymentMethod::ALL.iter().map(|m| m.display_name()).collect();
    let selection = Select::new()
        .with_prompt("Payment method")
        .items(&items)
        .default(0)
        .interact()?;
    Ok(PaymentMethod::ALL[selection])
}

fn outcome_json(outcome: &SubmitOutcome) -> serde_json::Value {
    match outcome {
        SubmitOutcome::Placed { order_id, amount } => serde_json::json!({
            "status": "placed",
            "order_id": order_id,
            "amount": amount,
        }),
        SubmitOutcome::Redirected { url, amount } => serde_json::json!({
            "status": "redirected",
            "url": url,
            "amount": amount,
        }),
        SubmitOutcome::AlreadyInFlight => serde_json::json!({ "status": "in_flight" }),
    }
}
