//! DPoP-bound [`AuthSession`] for Solid servers.
//!
//! The session obtains an access token with the `client_credentials` grant
//! and attaches it, together with a fresh proof, to every request. A 401
//! triggers one re-authentication and one retry of the same request.
//!
//! Redirects are followed here rather than by the HTTP client, so each hop
//! carries a proof for its own URL. Only same-origin redirects are followed;
//! the token is never sent to another origin.

use crate::dpop::DpopKey;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use podchat_core::account::ClientCredentials;
use podchat_core::session::{AuthSession, HttpMethod, PodRequest, PodResponse};
use podchat_core::{PodError, Result};
use reqwest::{Client, Method};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use url::Url;

/// Refresh this long before the server-announced expiry.
const EXPIRY_MARGIN_SECS: i64 = 30;
/// Assumed lifetime when the token response has no `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 300;
const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Deserialize)]
struct OpenIdConfiguration {
    token_endpoint: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// An `expires_in` that does not fit a timestamp counts as absent.
    fn new(value: String, expires_in: Option<i64>, now: DateTime<Utc>) -> Self {
        let expires_at = expires_in
            .and_then(ChronoDuration::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .unwrap_or_else(|| now + ChronoDuration::seconds(DEFAULT_EXPIRES_IN_SECS));
        Self { value, expires_at }
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + ChronoDuration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

#[derive(Debug, Default)]
struct TokenState {
    endpoint: Option<String>,
    token: Option<AccessToken>,
}

/// Session authenticating with client credentials and DPoP proofs.
pub struct DpopSession {
    client: Client,
    issuer: String,
    credentials: ClientCredentials,
    key: DpopKey,
    timeout: Duration,
    state: Mutex<TokenState>,
}

impl DpopSession {
    /// Creates a session for `issuer` (the pod server's identity provider).
    ///
    /// No request is sent until the first [`AuthSession::send`].
    pub fn new(
        issuer: impl Into<String>,
        credentials: ClientCredentials,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| PodError::transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            issuer: issuer.into().trim_end_matches('/').to_string(),
            credentials,
            key: DpopKey::generate()?,
            timeout,
            state: Mutex::new(TokenState::default()),
        })
    }

    /// Returns a usable access token, fetching a new one when none is cached,
    /// the cached one is about to expire, or `refresh` is set.
    async fn access_token(&self, refresh: bool) -> Result<String> {
        let mut state = self.state.lock().await;
        if !refresh {
            if let Some(token) = state.token.as_ref().filter(|t| t.is_fresh(Utc::now())) {
                return Ok(token.value.clone());
            }
        }

        let endpoint = match &state.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => {
                let endpoint = self.discover_token_endpoint().await?;
                state.endpoint = Some(endpoint.clone());
                endpoint
            }
        };

        let token = self.request_token(&endpoint).await?;
        let value = token.value.clone();
        state.token = Some(token);
        Ok(value)
    }

    async fn discover_token_endpoint(&self) -> Result<String> {
        let url = format!("{}/.well-known/openid-configuration", self.issuer);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| PodError::transport(format!("OpenID discovery failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PodError::auth(format!(
                "OpenID discovery at {url} returned {}",
                response.status()
            )));
        }
        let configuration: OpenIdConfiguration = response
            .json()
            .await
            .map_err(|e| PodError::auth(format!("Invalid OpenID configuration: {e}")))?;

        tracing::debug!("[DpopSession] Token endpoint: {}", configuration.token_endpoint);
        Ok(configuration.token_endpoint)
    }

    async fn request_token(&self, endpoint: &str) -> Result<AccessToken> {
        let proof = self.key.proof("POST", endpoint)?;
        let response = self
            .client
            .post(endpoint)
            .timeout(self.timeout)
            .basic_auth(
                form_encode(&self.credentials.client_id),
                Some(form_encode(&self.credentials.client_secret)),
            )
            .header("DPoP", proof)
            .form(&[("grant_type", "client_credentials"), ("scope", "webid")])
            .send()
            .await
            .map_err(|e| PodError::transport(format!("Token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PodError::auth(format!("Token request returned {status}: {body}")));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PodError::auth(format!("Invalid token response: {e}")))?;

        tracing::info!("[DpopSession] Obtained access token");
        Ok(AccessToken::new(token.access_token, token.expires_in, Utc::now()))
    }

    /// One authenticated exchange, without retry. Same-origin redirects are
    /// followed with a fresh proof per hop.
    async fn send_with_token(&self, request: &PodRequest, token: &str) -> Result<PodResponse> {
        let mut method = request.method;
        let mut url = request.url.clone();
        let mut body = request.body.clone();

        for _ in 0..=MAX_REDIRECTS {
            let proof = self.key.proof(method.as_str(), &url)?;
            let mut builder = self
                .client
                .request(reqwest_method(method), &url)
                .timeout(self.timeout)
                .header("Authorization", format!("DPoP {token}"))
                .header("DPoP", proof);
            let dropped_body = request.body.is_some() && body.is_none();
            for (name, value) in &request.headers {
                if dropped_body && name.eq_ignore_ascii_case("content-type") {
                    continue;
                }
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = &body {
                builder = builder.body(body.clone());
            }

            let response = builder
                .send()
                .await
                .map_err(|e| PodError::transport(format!("{method} {url} failed: {e}")))?;
            let status = response.status().as_u16();
            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            let text = response.text().await.map_err(|e| {
                PodError::transport(format!("{method} {url} failed reading the body: {e}"))
            })?;
            tracing::debug!("[DpopSession] {} {} -> {}", method, url, status);

            let Some(next) = location.and_then(|l| redirect(status, &l, &url, method)) else {
                return Ok(PodResponse::new(status, text));
            };
            if !next.keep_body {
                body = None;
            }
            method = next.method;
            url = next.url;
        }
        Err(PodError::transport(format!(
            "{} {}: more than {MAX_REDIRECTS} redirects",
            request.method, request.url
        )))
    }
}

#[async_trait]
impl AuthSession for DpopSession {
    async fn send(&self, request: PodRequest) -> Result<PodResponse> {
        let request = &request;
        retry_once_on_unauthorized(|refresh| async move {
            let token = self.access_token(refresh).await?;
            self.send_with_token(request, &token).await
        })
        .await
    }
}

/// Runs `attempt(false)`; on a 401 runs `attempt(true)` once more.
///
/// The flag asks the attempt to re-authenticate first. A second 401 is an
/// authentication error; errors from either attempt are returned as is.
pub(crate) async fn retry_once_on_unauthorized<F, Fut>(mut attempt: F) -> Result<PodResponse>
where
    F: FnMut(bool) -> Fut,
    Fut: Future<Output = Result<PodResponse>>,
{
    let response = attempt(false).await?;
    if response.status != 401 {
        return Ok(response);
    }

    tracing::debug!("[DpopSession] Unauthorized, re-authenticating once");
    let retried = attempt(true).await?;
    if retried.status == 401 {
        return Err(PodError::auth(format!(
            "Still unauthorized after re-authentication: {}",
            retried.body
        )));
    }
    Ok(retried)
}

/// Where a redirect sends the next request.
#[derive(Debug, PartialEq, Eq)]
struct Redirect {
    method: HttpMethod,
    url: String,
    keep_body: bool,
}

/// The request to send after a `status` response carrying `location`, or
/// `None` when the response is final. 301/302/303 turn anything but GET and
/// HEAD into a GET without body; 307/308 repeat the request as is.
/// Redirects to another origin are not followed.
fn redirect(status: u16, location: &str, current: &str, method: HttpMethod) -> Option<Redirect> {
    let repeat = match status {
        301..=303 => matches!(method, HttpMethod::Get | HttpMethod::Head),
        307 | 308 => true,
        _ => return None,
    };
    let from = Url::parse(current).ok()?;
    let to = from.join(location).ok()?;
    if to.origin() != from.origin() {
        tracing::warn!("[DpopSession] Not following redirect from {} to {}", current, to);
        return None;
    }
    Some(Redirect {
        method: if repeat { method } else { HttpMethod::Get },
        url: to.into(),
        keep_body: repeat,
    })
}

fn reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// `application/x-www-form-urlencoded` encoding, as required for the Basic
/// credentials of the token request.
fn form_encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
