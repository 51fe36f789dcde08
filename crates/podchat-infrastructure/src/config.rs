//! Client configuration loaded from `config.toml`.
//!
//! Layering, lowest to highest: built-in defaults, the TOML file,
//! `PODCHAT_*` environment variables, then whatever the caller (the CLI)
//! overrides on the returned value.

use crate::paths::PodChatPaths;
use podchat_core::{PodError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const SERVER_URL_ENV: &str = "PODCHAT_SERVER_URL";
pub const TIMEOUT_ENV: &str = "PODCHAT_TIMEOUT_SECS";

/// Settings for talking to a pod server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PodChatConfig {
    /// Base URL of the pod server.
    pub server_url: String,
    /// Container holding the history, relative to the pod root.
    pub container: String,
    /// History document name inside `container`.
    pub document: String,
    /// Name given to issued client credentials.
    pub credential_name: String,
    /// Timeout applied to every HTTP request.
    pub request_timeout_secs: u64,
}

impl Default for PodChatConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:3000".to_string(),
            container: "private/".to_string(),
            document: "chatdocs.ttl".to_string(),
            credential_name: "podchat-client-credentials".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl PodChatConfig {
    /// Loads `config.toml` from `paths` (defaults when the file is absent)
    /// and applies environment overrides.
    pub fn load(paths: &PodChatPaths) -> Result<Self> {
        let mut config = Self::from_file(&paths.config_file())?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("[Config] {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        tracing::debug!("[Config] Loaded {}", path.display());
        Ok(config)
    }

    /// Writes the configuration, creating the directory if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Applies `PODCHAT_*` overrides looked up through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(SERVER_URL_ENV).filter(|v| !v.is_empty()) {
            self.server_url = url;
        }
        if let Some(secs) = lookup(TIMEOUT_ENV).filter(|v| !v.is_empty()) {
            self.request_timeout_secs = secs.trim().parse().map_err(|_| {
                PodError::config(format!("{TIMEOUT_ENV} must be a number of seconds, got '{secs}'"))
            })?;
        }
        Ok(())
    }

    /// Server URL without a trailing `/`.
    pub fn server_base(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// URL of the history container under `pod_base_url`.
    pub fn container_url(&self, pod_base_url: &str) -> String {
        let mut url = pod_base_url.to_string();
        if !url.ends_with('/') {
            url.push('/');
        }
        url.push_str(self.container.trim_start_matches('/'));
        if !url.ends_with('/') {
            url.push('/');
        }
        url
    }

    /// URL of the history document under `pod_base_url`.
    pub fn document_url(&self, pod_base_url: &str) -> String {
        format!("{}{}", self.container_url(pod_base_url), self.document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let paths = PodChatPaths::new(Some(dir.path())).unwrap();
        let config = PodChatConfig::from_file(&paths.config_file()).unwrap();
        assert_eq!(config, PodChatConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "server_url = \"https://solid.example/\"\nrequest_timeout_secs = 5\n")
            .unwrap();

        let config = PodChatConfig::from_file(&path).unwrap();
        assert_eq!(config.server_base(), "https://solid.example");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.document, "chatdocs.ttl");
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = PodChatConfig {
            container: "chats/".to_string(),
            ..PodChatConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(PodChatConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "server_url = [").unwrap();
        let err = PodChatConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, PodError::Serialization { .. }), "{err:?}");
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = PodChatConfig::default();
        config
            .apply_env(|key| match key {
                SERVER_URL_ENV => Some("https://env.example".to_string()),
                TIMEOUT_ENV => Some("12".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.server_url, "https://env.example");
        assert_eq!(config.request_timeout_secs, 12);

        let err = config
            .apply_env(|key| (key == TIMEOUT_ENV).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, PodError::Config(_)));
    }

    #[test]
    fn test_resource_urls() {
        let config = PodChatConfig::default();
        assert_eq!(
            config.container_url("https://pod.example/alice/"),
            "https://pod.example/alice/private/"
        );
        assert_eq!(
            config.document_url("https://pod.example/alice"),
            "https://pod.example/alice/private/chatdocs.ttl"
        );
    }
}
