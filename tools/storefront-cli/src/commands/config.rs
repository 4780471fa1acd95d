//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CliConfig, BACKEND_URL_ENV, CONFIG_NAMES};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
        ConfigCommand::Validate => validate_config(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    let config = &ctx.config;
    ctx.output.info("[store]");
    ctx.output.kv("currency", &config.store.currency);
    ctx.output.kv("delivery_fee", &config.store.delivery_fee.to_string());

    ctx.output.info("[gateway]");
    ctx.output.kv("base_url", &config.gateway.base_url);
    if std::env::var_os(BACKEND_URL_ENV).is_some() {
        ctx.output.kv("", &format!("(from {})", BACKEND_URL_ENV));
    }
    ctx.output.kv("timeout_secs", &config.gateway.timeout_secs.to_string());

    ctx.output.info("[session]");
    ctx.output
        .kv("state_dir", &config.session.state_dir().display().to_string());

    ctx.output.info("[logging]");
    ctx.output.kv("level", &config.logging.level);
    ctx.output.kv("format", &config.logging.format);

    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())?;
    ctx.output
        .success(&format!("Created: {}", config_path.display()));

    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    let Some(path) = &ctx.config_path else {
        bail!("No config file found. Run `shop config init` to create one.");
    };
    ctx.output.header("Validating configuration");

    // Re-read without env overrides so the file itself is checked.
    let config = CliConfig::load(path)?;
    config.validate()?;

    let mut warnings: Vec<String> = Vec::new();
    if config.gateway.base_url.starts_with("http://")
        && !config.gateway.base_url.contains("localhost")
        && !config.gateway.base_url.contains("127.0.0.1")
    {
        warnings.push("gateway.base_url is not HTTPS; session tokens are sent in clear".into());
    }
    if config.gateway.timeout_secs == 0 {
        warnings.push("gateway.timeout_secs is 0; 1 second is used".into());
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }
    if warnings.is_empty() {
        ctx.output.success("Configuration is valid");
    } else {
        ctx.output.success("Configuration is valid (with warnings)");
    }
    Ok(())
}
