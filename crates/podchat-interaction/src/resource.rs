//! Making sure a container or document exists before it is used.

use podchat_core::session::AuthSession;
use podchat_core::vocab::{LDP_BASIC_CONTAINER, LDP_RESOURCE, TURTLE_MEDIA_TYPE};
use podchat_core::{PodError, Result};

/// Status a server answers to `If-None-Match: *` when the resource appeared
/// in the meantime.
const PRECONDITION_FAILED: u16 = 412;

/// Creates pod resources on demand.
#[derive(Debug)]
pub struct ResourceManager<'s, S: AuthSession + ?Sized> {
    session: &'s S,
}

impl<'s, S: AuthSession + ?Sized> ResourceManager<'s, S> {
    pub fn new(session: &'s S) -> Self {
        Self { session }
    }

    /// Ensures the resource at `url` exists, creating it empty if needed.
    ///
    /// A URL ending in `/` is created as a container, anything else as a
    /// plain resource. Returns `false` when the server refused the creation.
    ///
    /// # Errors
    ///
    /// `PodError::Provisioning` when the creation request itself fails.
    pub async fn ensure(&self, url: &str) -> Result<bool> {
        match self.session.head(url).await {
            Ok(response) if response.is_success() => {
                tracing::debug!("[ResourceManager] {} exists", url);
                return Ok(true);
            }
            Ok(response) => {
                tracing::debug!("[ResourceManager] HEAD {} -> {}, creating", url, response.status);
            }
            Err(e) => {
                tracing::debug!("[ResourceManager] HEAD {} failed ({}), creating", url, e);
            }
        }

        let response = self
            .session
            .put(url, creation_headers(url))
            .await
            .map_err(|e| PodError::provisioning(url, e.to_string()))?;

        if response.is_success() {
            tracing::info!("[ResourceManager] Created {}", url);
            Ok(true)
        } else if response.status == PRECONDITION_FAILED {
            tracing::debug!("[ResourceManager] {} was created concurrently", url);
            Ok(true)
        } else {
            tracing::warn!(
                "[ResourceManager] Could not create {}: {} {}",
                url,
                response.status,
                response.body
            );
            Ok(false)
        }
    }
}

/// Headers of the conditional creation `PUT`.
fn creation_headers(url: &str) -> Vec<(String, String)> {
    let kind = if url.ends_with('/') {
        LDP_BASIC_CONTAINER
    } else {
        LDP_RESOURCE
    };
    vec![
        ("Accept".to_string(), TURTLE_MEDIA_TYPE.to_string()),
        ("If-None-Match".to_string(), "*".to_string()),
        ("Link".to_string(), format!("<{kind}>; rel=\"type\"")),
        ("Slug".to_string(), slug_for(url)),
        ("Content-Type".to_string(), TURTLE_MEDIA_TYPE.to_string()),
    ]
}

/// The name of the item `url` points to: the last path segment, ignoring
/// one trailing `/`. A bare origin has no name.
pub fn slug_for(url: &str) -> String {
    let trimmed = url.strip_suffix('/').unwrap_or(url);
    let path_start = match trimmed.find("://") {
        Some(i) => i + 3,
        None => 0,
    };
    match trimmed[path_start..].rfind('/') {
        Some(i) => trimmed[path_start + i + 1..].to_string(),
        None if path_start > 0 => String::new(),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_for() {
        assert_eq!(slug_for("https://pod.example/alice/private/"), "private");
        assert_eq!(
            slug_for("https://pod.example/alice/private/chatdocs.ttl"),
            "chatdocs.ttl"
        );
        assert_eq!(slug_for("https://pod.example/"), "");
        assert_eq!(slug_for("https://pod.example"), "");
        assert_eq!(slug_for("chatdocs.ttl"), "chatdocs.ttl");
    }

    #[test]
    fn test_creation_headers() {
        let container = creation_headers("https://pod.example/alice/private/");
        assert!(container.contains(&(
            "Link".to_string(),
            "<http://www.w3.org/ns/ldp#BasicContainer>; rel=\"type\"".to_string()
        )));
        assert!(container.contains(&("Slug".to_string(), "private".to_string())));
        assert!(container.contains(&("If-None-Match".to_string(), "*".to_string())));

        let document = creation_headers("https://pod.example/alice/private/chatdocs.ttl");
        assert!(document.contains(&(
            "Link".to_string(),
            "<http://www.w3.org/ns/ldp#Resource>; rel=\"type\"".to_string()
        )));
        assert!(document.contains(&("Content-Type".to_string(), "text/turtle".to_string())));
    }
}
