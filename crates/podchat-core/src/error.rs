//! Error types for podchat.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the whole podchat workspace.
///
/// Variants follow the failure taxonomy of the store: provisioning failures
/// (`Registration`, `Credential`) abort setup, `Auth` is raised after the one
/// permitted re-authentication, `Transport` covers connection failures, and
/// `Provisioning` reports an unexpected failure while creating a resource.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PodError {
    /// Account registration was refused by the server.
    #[error("Could not create account: {status} {body}")]
    Registration { status: u16, body: String },

    /// Client credentials could not be issued.
    #[error("Could not create client credentials: {status} {body}")]
    Credential { status: u16, body: String },

    /// Authentication failed (token endpoint refused us, or a request was
    /// still unauthorized after re-authenticating).
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The request never produced an HTTP response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Creating a container or document failed unexpectedly.
    #[error("Provisioning error for {url}: {message}")]
    Provisioning { url: String, message: String },

    /// A conditional patch did not match exactly one binding.
    #[error("Patch condition matched {matches} bindings (expected exactly 1)")]
    PatchConflict { matches: usize },

    /// Parsing or serializing a graph document or patch failed.
    #[error("Codec error: {format} - {message}")]
    Codec {
        format: String, // "Turtle", "SPARQL Update"
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (local profile and config files)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },
}

impl PodError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates an Auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Creates a Provisioning error
    pub fn provisioning(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provisioning {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a Codec error
    pub fn codec(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Codec {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Registration and credential failures abort setup.
    pub fn is_fatal_setup(&self) -> bool {
        matches!(self, Self::Registration { .. } | Self::Credential { .. })
    }

    /// Check if this is an Auth error
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Check if this is a Transport error
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Check if this is a patch condition failure
    pub fn is_patch_conflict(&self) -> bool {
        matches!(self, Self::PatchConflict { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for PodError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for PodError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for PodError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for PodError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, PodError>`.
pub type Result<T> = std::result::Result<T, PodError>;
