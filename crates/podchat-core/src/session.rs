//! Authenticated session capability.
//!
//! Every request against the pod goes through an [`AuthSession`]. The
//! production implementation binds each request to a freshly minted
//! proof-of-possession token; tests substitute an in-memory pod.

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;

/// The HTTP methods the store uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outbound request to the pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl PodRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// The pod's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodResponse {
    pub status: u16,
    pub body: String,
}

impl PodResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A session that authenticates every request it sends.
///
/// Implementations must not retry on transport failures; that policy belongs
/// to callers.
#[async_trait]
pub trait AuthSession: Send + Sync {
    /// Sends a request and returns the response, whatever its status.
    ///
    /// # Errors
    ///
    /// - `PodError::Transport` if no response was received
    /// - `PodError::Auth` if the request stays unauthorized after
    ///   re-authenticating
    async fn send(&self, request: PodRequest) -> Result<PodResponse>;

    async fn get(&self, url: &str) -> Result<PodResponse> {
        self.send(PodRequest::new(HttpMethod::Get, url)).await
    }

    async fn head(&self, url: &str) -> Result<PodResponse> {
        self.send(PodRequest::new(HttpMethod::Head, url)).await
    }

    async fn put(&self, url: &str, headers: Vec<(String, String)>) -> Result<PodResponse> {
        let mut request = PodRequest::new(HttpMethod::Put, url);
        request.headers = headers;
        self.send(request).await
    }

    async fn patch(&self, url: &str, content_type: &str, body: String) -> Result<PodResponse> {
        self.send(
            PodRequest::new(HttpMethod::Patch, url)
                .with_header("Content-Type", content_type)
                .with_body(body),
        )
        .await
    }

    async fn delete(&self, url: &str) -> Result<PodResponse> {
        self.send(PodRequest::new(HttpMethod::Delete, url)).await
    }
}
