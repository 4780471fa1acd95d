//! Login and logout.

use anyhow::{bail, Result};
use dialoguer::Password;
use storefront_session::SessionToken;

use super::LoginArgs;
use crate::context::Context;

/// Run the login command.
pub async fn login(args: LoginArgs, ctx: &Context) -> Result<()> {
    let raw = match args.token {
        Some(token) => token,
        None => {
            if ctx.output.is_json() {
                bail!("--token is required with --json");
            }
            Password::new().with_prompt("Session token").interact()?
        }
    };
    let token = SessionToken::new(raw.trim());
    if token.is_blank() {
        bail!("Session token is empty");
    }

    let shop = ctx.shop().await?;
    let spinner = ctx.output.spinner("Loading cart and wishlist...");
    let result = shop.establish_session(token).await;
    spinner.finish_and_clear();
    result?;

    let count = shop.count();
    let saved = shop.wishlist().len();
    shop.shutdown().await;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "authenticated": true,
            "cart_count": count,
            "wishlist_count": saved,
        }));
        return Ok(());
    }

    ctx.output.success("Logged in");
    ctx.output.kv("Cart", &format!("{} item(s)", count));
    ctx.output.kv("Wishlist", &format!("{} product(s)", saved));
    Ok(())
}

/// Run the logout command.
pub async fn logout(ctx: &Context) -> Result<()> {
    let shop = ctx.shop().await?;
    let was_authenticated = shop.is_authenticated();
    shop.logout();
    shop.shutdown().await;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "authenticated": false }));
    } else if was_authenticated {
        ctx.output.success("Logged out");
    } else {
        ctx.output.info("Not logged in");
    }
    Ok(())
}
