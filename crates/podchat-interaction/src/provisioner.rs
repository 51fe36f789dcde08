//! Account registration and client-credential issuance against a Community
//! Solid Server identity provider.
//!
//! Both calls are one-shot: any failure aborts setup and is returned to the
//! caller, there is no retry.

use podchat_core::account::{Account, AccountRequest, ClientCredentials};
use podchat_core::{PodError, Result};
use podchat_infrastructure::PodChatConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Creates accounts and issues client credentials for them.
#[derive(Debug, Clone)]
pub struct CredentialProvisioner {
    client: Client,
    server_url: String,
    credential_name: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegistrationBody<'a> {
    create_web_id: &'static str,
    web_id: &'static str,
    register: &'static str,
    create_pod: &'static str,
    pod_name: &'a str,
    email: &'a str,
    password: &'a str,
    confirm_password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistrationResponse {
    web_id: String,
    pod_base_url: String,
}

#[derive(Debug, Serialize)]
struct CredentialsBody<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct CredentialsResponse {
    id: String,
    secret: String,
}

impl CredentialProvisioner {
    pub fn new(config: &PodChatConfig) -> Self {
        Self {
            client: Client::new(),
            server_url: config.server_base().to_string(),
            credential_name: config.credential_name.clone(),
            timeout: config.request_timeout(),
        }
    }

    /// Uses `server_url` instead of the configured one.
    pub fn with_server_url(mut self, server_url: &str) -> Self {
        self.server_url = server_url.trim_end_matches('/').to_string();
        self
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Registers a new account with a WebID and a pod.
    ///
    /// # Errors
    ///
    /// - `PodError::Registration` on a non-success status or an unreadable body
    /// - `PodError::Transport` if the server cannot be reached or the response
    ///   body cannot be read
    pub async fn register(&self, request: &AccountRequest) -> Result<Account> {
        let url = format!("{}/idp/register/", self.server_url);
        tracing::info!("[Provisioner] Registering account {} at {}", request.name, url);

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&registration_body(request))
            .send()
            .await
            .map_err(|e| PodError::transport(format!("Registration request failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| PodError::transport(format!("Reading registration response failed: {e}")))?;
        let parsed = parse_registration(status, &body)?;

        tracing::info!("[Provisioner] Registered {} with pod {}", parsed.web_id, parsed.pod_base_url);
        Ok(Account {
            server_url: self.server_url.clone(),
            name: request.name.clone(),
            email: request.email.clone(),
            password: request.password.clone(),
            web_id: parsed.web_id,
            pod_base_url: parsed.pod_base_url,
        })
    }

    /// Issues client credentials for `account`.
    ///
    /// # Errors
    ///
    /// - `PodError::Credential` on a non-success status or an unreadable body
    /// - `PodError::Transport` if the server cannot be reached or the response
    ///   body cannot be read
    pub async fn issue_credentials(&self, account: &Account) -> Result<ClientCredentials> {
        let url = format!("{}/idp/credentials/", account.server_url.trim_end_matches('/'));
        tracing::debug!("[Provisioner] Requesting client credentials for {}", account.email);

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&CredentialsBody {
                name: &self.credential_name,
                email: &account.email,
                password: &account.password,
            })
            .send()
            .await
            .map_err(|e| PodError::transport(format!("Credentials request failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| PodError::transport(format!("Reading credentials response failed: {e}")))?;
        parse_credentials(status, &body)
    }
}

fn registration_body(request: &AccountRequest) -> RegistrationBody<'_> {
    RegistrationBody {
        create_web_id: "on",
        web_id: "",
        register: "on",
        create_pod: "on",
        pod_name: &request.name,
        email: &request.email,
        password: &request.password,
        confirm_password: &request.password,
    }
}

fn parse_registration(status: u16, body: &str) -> Result<RegistrationResponse> {
    let registration_error = || PodError::Registration {
        status,
        body: body.to_string(),
    };
    if !(200..300).contains(&status) {
        return Err(registration_error());
    }
    serde_json::from_str(body).map_err(|_| registration_error())
}

fn parse_credentials(status: u16, body: &str) -> Result<ClientCredentials> {
    let credential_error = || PodError::Credential {
        status,
        body: body.to_string(),
    };
    if !(200..300).contains(&status) {
        return Err(credential_error());
    }
    let parsed: CredentialsResponse = serde_json::from_str(body).map_err(|_| credential_error())?;
    Ok(ClientCredentials {
        client_id: parsed.id,
        client_secret: parsed.secret,
    })
}
