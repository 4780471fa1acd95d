//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use storefront_client::{LogNotifier, NotifierRegistry, Shop};
use storefront_data::HttpGateway;
use storefront_session::{Cache, TokenStore};

use crate::config::{CliConfig, CONFIG_NAMES};
use crate::output::{ConsoleNotifier, Output};

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// Where the configuration came from, if a file was found.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = match config_path {
            Some(path) => {
                let path = PathBuf::from(path);
                (CliConfig::load(&path)?, Some(path))
            }
            None => match find_config(&cwd) {
                Some(path) => (CliConfig::load(&path)?, Some(path)),
                None => (CliConfig::default(), None),
            },
        };
        let config = config.with_env_overrides();
        config.validate()?;

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Token store under the configured state directory.
    pub fn token_store(&self) -> Result<TokenStore> {
        let dir = self.config.session.state_dir();
        let cache = Cache::open(&dir)
            .with_context(|| format!("Failed to open state directory: {}", dir.display()))?;
        Ok(TokenStore::new(cache))
    }

    /// Build a shop against the configured backend and resume the saved
    /// session, if any.
    pub async fn shop(&self) -> Result<Shop> {
        let gateway = HttpGateway::new(self.config.gateway.clone())
            .context("Failed to create HTTP client")?;
        let notifier = NotifierRegistry::new()
            .with(LogNotifier)
            .with(ConsoleNotifier::new(self.output.clone()));

        let shop = Shop::new(Arc::new(gateway))
            .settings(self.config.store.settings()?)
            .notifier(Arc::new(notifier))
            .token_store(self.token_store()?)
            .build();

        let spinner = self.output.spinner("Loading catalog...");
        let loaded = shop.refresh_catalog().await;
        spinner.finish_and_clear();
        let count = loaded.context("Failed to load the catalog")?;
        self.output.debug(&format!("{} products in catalog", count));

        match shop.restore().await {
            Ok(true) => self.output.debug("Resumed saved session"),
            Ok(false) => self.output.debug("No saved session"),
            Err(e) => self
                .output
                .warn(&format!("Could not resume the saved session: {}", e)),
        }

        Ok(shop)
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }
}

/// Find config file in directory tree.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        for name in CONFIG_NAMES {
            let candidate = current.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_config_walks_upward() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".shop.toml"), "").unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_config(&nested).unwrap();
        assert_eq!(found, dir.path().join(".shop.toml"));
    }

    #[test]
    fn test_find_config_prefers_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("shop.json"), "{}").unwrap();
        std::fs::write(dir.path().join("shop.toml"), "").unwrap();

        assert_eq!(find_config(dir.path()).unwrap(), dir.path().join("shop.toml"));
    }
}
