//! Local storage of the registered account profile (`account.json`).

use anyhow::{Context, Result};
use podchat_core::account::Account;
use std::path::{Path, PathBuf};

/// Reads and writes the account profile.
#[derive(Debug, Clone)]
pub struct AccountStore {
    path: PathBuf,
}

impl AccountStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads the stored account, or `None` when nobody has registered yet.
    pub fn load(&self) -> Result<Option<Account>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let account = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse account profile {}", self.path.display()))?;
        Ok(Some(account))
    }

    /// Like [`AccountStore::load`], but a missing profile is an error.
    pub fn require(&self) -> Result<Account> {
        self.load()?.with_context(|| {
            format!(
                "No account at {}; run `podchat register` first",
                self.path.display()
            )
        })
    }

    /// Saves `account`, replacing any previous profile.
    pub fn save(&self, account: &Account) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(account).context("Failed to serialize account")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        // The profile holds the password: user read/write only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, permissions)
                .with_context(|| format!("Failed to set permissions on {}", self.path.display()))?;
        }

        tracing::info!("[AccountStore] Saved account {} to {}", account.name, self.path.display());
        Ok(())
    }
}
