pub mod history;
pub mod register;

use anyhow::{Context as _, Result};
use podchat_infrastructure::{AccountStore, PodChatConfig, PodChatPaths};
use std::path::Path;

/// Paths and configuration shared by all commands.
pub struct Context {
    pub paths: PodChatPaths,
    pub config: PodChatConfig,
}

impl Context {
    /// Resolves paths and loads the configuration; `server` overrides the
    /// configured server URL.
    pub fn load(config_dir: Option<&Path>, server: Option<&str>) -> Result<Self> {
        let paths = PodChatPaths::new(config_dir).context("Failed to resolve config directory")?;
        let mut config = PodChatConfig::load(&paths)
            .with_context(|| format!("Failed to load {}", paths.config_file().display()))?;
        if let Some(server) = server {
            config.server_url = server.to_string();
        }
        tracing::debug!(
            "[Cli] Config dir {}, server {}",
            paths.config_dir().display(),
            config.server_base()
        );
        Ok(Self { paths, config })
    }

    pub fn account_store(&self) -> AccountStore {
        AccountStore::new(self.paths.account_file())
    }
}
