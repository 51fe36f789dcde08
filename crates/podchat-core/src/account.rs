//! Pod account and client credential types.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// An account registered on a pod server.
///
/// Created once by registration and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Base URL of the pod server (identity provider), without trailing `/`.
    pub server_url: String,
    pub name: String,
    pub email: String,
    pub password: String,
    /// The account's WebID.
    pub web_id: String,
    /// Root of the account's pod, with trailing `/`.
    pub pod_base_url: String,
}

/// Client credentials issued for an account.
///
/// Only held in memory by the session that uses them.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Everything needed to register a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl AccountRequest {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// A throw-away account with a unique name, for experiments against a
    /// local server.
    pub fn random() -> Self {
        let name = format!("test-{}", Uuid::new_v4());
        let email = format!("{name}@example.org");
        let password = Uuid::new_v4().simple().to_string();
        Self {
            name,
            email,
            password,
        }
    }
}
