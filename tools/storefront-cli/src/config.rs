//! CLI configuration.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use storefront_core::{Currency, StoreSettings};
use storefront_data::GatewayConfig;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable overriding `gateway.base_url`.
pub const BACKEND_URL_ENV: &str = "STOREFRONT_BACKEND_URL";

/// File names searched for, in order, from the working directory upward.
pub const CONFIG_NAMES: [&str; 3] = ["shop.toml", ".shop.toml", "shop.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
        }
    }

    /// Save config to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if path.extension().is_some_and(|e| e == "json") {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Apply environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                self.gateway.base_url = url;
            }
        }
        self
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        self.store.settings()?;
        if !(self.gateway.base_url.starts_with("http://")
            || self.gateway.base_url.starts_with("https://"))
        {
            bail!(
                "gateway.base_url must start with http:// or https:// (got {:?})",
                self.gateway.base_url
            );
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            bail!("logging.format must be \"pretty\" or \"json\"");
        }
        Ok(())
    }
}

/// Store-wide pricing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// ISO currency code.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Flat delivery fee in minor units.
    #[serde(default = "default_delivery_fee")]
    pub delivery_fee: i64,
}

fn default_currency() -> String {
    Currency::default().code().to_string()
}

fn default_delivery_fee() -> i64 {
    storefront_core::settings::DEFAULT_DELIVERY_FEE
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            delivery_fee: default_delivery_fee(),
        }
    }
}

impl StoreConfig {
    pub fn settings(&self) -> Result<StoreSettings> {
        let currency = Currency::from_code(&self.currency)
            .with_context(|| format!("Unknown currency: {}", self.currency))?;
        if self.delivery_fee < 0 {
            bail!("store.delivery_fee cannot be negative");
        }
        Ok(StoreSettings {
            currency,
            delivery_fee: self.delivery_fee,
        })
    }
}

/// Where session state is kept between runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory for the saved session token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
}

impl SessionConfig {
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(default_state_dir)
    }
}

/// Platform-specific state directory.
fn default_state_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("XDG_STATE_HOME") {
        PathBuf::from(dir).join("storefront")
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local").join("state").join("storefront")
    } else {
        std::env::temp_dir().join("storefront")
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,

    /// `pretty` or `json`.
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_level() -> String {
    "warn".into()
}

fn default_format() -> String {
    "pretty".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

impl LoggingConfig {
    /// Initialize the tracing subscriber. `RUST_LOG` takes precedence.
    pub fn init(&self, verbose: bool) {
        let level = if verbose { "debug" } else { self.level.as_str() };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        let result = match self.format.as_str() {
            "json" => fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init(),
            _ => fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init(),
        };
        // Already installed (e.g. in tests): keep the existing one.
        let _ = result;
    }
}

/// Generate the default config file content.
pub fn generate_default_config() -> String {
    format!(
        r#"# Storefront CLI configuration

[store]
currency = "{currency}"
# Flat delivery fee in minor units
delivery_fee = {fee}

[gateway]
# Overridden by {env}
base_url = "{url}"
timeout_secs = 15

[session]
# state_dir = "~/.local/state/storefront"

[logging]
level = "warn"
format = "pretty"
"#,
        currency = default_currency(),
        fee = default_delivery_fee(),
        env = BACKEND_URL_ENV,
        url = storefront_data::DEFAULT_BASE_URL,
    )
}
