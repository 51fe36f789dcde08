//! Chat history stored in a Solid pod document.
//!
//! The store keeps a mirror of the remote document. Reads replace the mirror
//! with what the server returned; appends send a patch computed from the
//! mirror and apply the same patch locally once the server accepted it.
//! Nothing here raises: failures are logged and degrade to an empty history
//! or an unchanged one.

use crate::auth_session::DpopSession;
use crate::provisioner::CredentialProvisioner;
use crate::resource::ResourceManager;
use async_trait::async_trait;
use podchat_core::Result;
use podchat_core::account::Account;
use podchat_core::codec::GraphCodec;
use podchat_core::graph::Graph;
use podchat_core::history::{AppendOutcome, ChatHistory, Message, list_codec};
use podchat_core::session::{AuthSession, HttpMethod, PodRequest};
use podchat_infrastructure::{PodChatConfig, TurtleCodec};

/// A [`ChatHistory`] backed by one document in a pod.
///
/// Operations take `&mut self`, so one instance never runs two of them at
/// once. Several instances on the same document are ordered by the server.
pub struct SolidChatHistory<S, C = TurtleCodec> {
    session: S,
    codec: C,
    container_url: String,
    document_url: String,
    mirror: Graph,
}

impl SolidChatHistory<DpopSession, TurtleCodec> {
    /// Issues client credentials for `account` and opens a DPoP session on
    /// its pod.
    ///
    /// # Errors
    ///
    /// Credential issuance and session setup errors; these are fatal.
    pub async fn connect(account: &Account, config: &PodChatConfig) -> Result<Self> {
        let credentials = CredentialProvisioner::new(config)
            .issue_credentials(account)
            .await?;
        let session = DpopSession::new(&account.server_url, credentials, config.request_timeout())?;

        tracing::info!("[SolidHistory] Connected to pod {}", account.pod_base_url);
        Ok(Self::with_session(
            session,
            TurtleCodec::new(),
            config.container_url(&account.pod_base_url),
            config.document_url(&account.pod_base_url),
        ))
    }
}

impl<S: AuthSession, C: GraphCodec> SolidChatHistory<S, C> {
    pub fn with_session(
        session: S,
        codec: C,
        container_url: impl Into<String>,
        document_url: impl Into<String>,
    ) -> Self {
        Self {
            session,
            codec,
            container_url: container_url.into(),
            document_url: document_url.into(),
            mirror: Graph::new(),
        }
    }

    pub fn document_url(&self) -> &str {
        &self.document_url
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Messages as of the last successful read or append, without I/O.
    pub fn messages_cached(&self) -> Vec<Message> {
        list_codec::decode(&self.mirror)
    }

    /// Reads the history from the pod, creating the container and document
    /// first if they do not exist.
    pub async fn list(&mut self) -> Vec<Message> {
        let resources = ResourceManager::new(&self.session);
        for url in [&self.container_url, &self.document_url] {
            match resources.ensure(url).await {
                Ok(true) => {}
                Ok(false) => tracing::warn!("[SolidHistory] {} is not available", url),
                Err(e) => tracing::warn!("[SolidHistory] Failed to ensure {}: {}", url, e),
            }
        }

        let request = PodRequest::new(HttpMethod::Get, &self.document_url)
            .with_header("Accept", self.codec.document_media_type());
        let response = match self.session.send(request).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                tracing::warn!(
                    "[SolidHistory] GET {} returned {}",
                    self.document_url,
                    response.status
                );
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!("[SolidHistory] GET {} failed: {}", self.document_url, e);
                return Vec::new();
            }
        };

        match self.codec.parse_document(&response.body, &self.document_url) {
            Ok(graph) => {
                self.mirror = graph;
                let messages = list_codec::decode(&self.mirror);
                tracing::debug!("[SolidHistory] Loaded {} messages", messages.len());
                messages
            }
            Err(e) => {
                tracing::warn!(
                    "[SolidHistory] Could not parse {}: {}",
                    self.document_url,
                    e
                );
                Vec::new()
            }
        }
    }

    /// Appends `message` after the tail the mirror knows about.
    ///
    /// If another writer moved the tail since the last [`Self::list`], the
    /// server rejects the patch (`Rejected` with a 409 from Solid servers);
    /// list again before retrying.
    pub async fn append(&mut self, message: Message) -> AppendOutcome {
        let patch = list_codec::build_append_patch(&self.mirror, &message, &self.document_url);
        let body = self.codec.serialize_patch(&patch);

        let response = match self
            .session
            .patch(&self.document_url, self.codec.patch_media_type(), body)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("[SolidHistory] PATCH {} failed: {}", self.document_url, e);
                return AppendOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        if !response.is_success() {
            tracing::warn!(
                "[SolidHistory] PATCH {} rejected: {} {}",
                self.document_url,
                response.status,
                response.body
            );
            return AppendOutcome::Rejected {
                status: response.status,
            };
        }

        if let Err(e) = patch.apply(&mut self.mirror) {
            // The server accepted a patch the mirror cannot take; the next
            // list() resynchronises.
            tracing::warn!("[SolidHistory] Mirror out of sync after append: {}", e);
        }
        tracing::debug!("[SolidHistory] Appended {} message", message.role);
        AppendOutcome::Committed
    }

    /// Deletes the document. The mirror is emptied whatever the outcome.
    pub async fn clear(&mut self) {
        match self.session.delete(&self.document_url).await {
            Ok(response) if response.is_success() => {
                tracing::info!("[SolidHistory] Cleared {}", self.document_url);
            }
            Ok(response) => tracing::warn!(
                "[SolidHistory] DELETE {} returned {}",
                self.document_url,
                response.status
            ),
            Err(e) => tracing::warn!("[SolidHistory] DELETE {} failed: {}", self.document_url, e),
        }
        self.mirror.clear();
    }
}

#[async_trait]
impl<S: AuthSession, C: GraphCodec> ChatHistory for SolidChatHistory<S, C> {
    async fn list(&mut self) -> Vec<Message> {
        SolidChatHistory::list(self).await
    }

    async fn append(&mut self, message: Message) -> AppendOutcome {
        SolidChatHistory::append(self, message).await
    }

    async fn clear(&mut self) {
        SolidChatHistory::clear(self).await
    }
}
