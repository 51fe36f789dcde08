//! Path management for podchat's local files.

use std::path::{Path, PathBuf};

/// Environment variable that relocates the configuration directory.
pub const CONFIG_DIR_ENV: &str = "PODCHAT_CONFIG_DIR";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Neither an explicit directory nor a platform config directory exists.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find configuration directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Resolved locations of podchat's files.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/podchat/       # or $PODCHAT_CONFIG_DIR, or --config-dir
/// ├── config.toml          # Server URL, pod layout, timeouts
/// └── account.json         # Registered account (mode 600)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodChatPaths {
    config_dir: PathBuf,
}

impl PodChatPaths {
    /// Resolves the configuration directory.
    ///
    /// Precedence: `base_dir`, then `$PODCHAT_CONFIG_DIR`, then the platform
    /// config directory (`dirs::config_dir()`) joined with `podchat`.
    pub fn new(base_dir: Option<&Path>) -> Result<Self, PathError> {
        Self::resolve(base_dir, std::env::var_os(CONFIG_DIR_ENV).map(PathBuf::from))
    }

    fn resolve(base_dir: Option<&Path>, from_env: Option<PathBuf>) -> Result<Self, PathError> {
        let config_dir = match (base_dir, from_env) {
            (Some(dir), _) => dir.to_path_buf(),
            (None, Some(dir)) if !dir.as_os_str().is_empty() => dir,
            _ => dirs::config_dir()
                .ok_or(PathError::ConfigDirNotFound)?
                .join("podchat"),
        };
        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// The account profile.
    ///
    /// # Security Note
    ///
    /// Holds the account password; written with mode 600 on Unix.
    pub fn account_file(&self) -> PathBuf {
        self.config_dir.join("account.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_dir_wins() {
        let paths = PodChatPaths::resolve(
            Some(Path::new("/tmp/explicit")),
            Some(PathBuf::from("/tmp/env")),
        )
        .unwrap();
        assert_eq!(paths.config_dir(), Path::new("/tmp/explicit"));
        assert_eq!(paths.config_file(), Path::new("/tmp/explicit/config.toml"));
        assert_eq!(paths.account_file(), Path::new("/tmp/explicit/account.json"));
    }

    #[test]
    fn test_env_dir_used_without_explicit() {
        let paths = PodChatPaths::resolve(None, Some(PathBuf::from("/tmp/env"))).unwrap();
        assert_eq!(paths.config_dir(), Path::new("/tmp/env"));
    }

    #[test]
    fn test_platform_default_ends_with_podchat() {
        // Empty env value falls through to the platform default.
        if let Ok(paths) = PodChatPaths::resolve(None, Some(PathBuf::new())) {
            assert!(paths.config_dir().ends_with("podchat"));
        }
    }
}
