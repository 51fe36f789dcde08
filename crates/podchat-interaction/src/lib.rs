//! Talking to a Solid pod server: account provisioning, the DPoP-bound
//! session, resource creation and the pod-backed chat history.

pub mod auth_session;
pub mod dpop;
pub mod provisioner;
pub mod resource;
pub mod solid_history;

pub use auth_session::DpopSession;
pub use provisioner::CredentialProvisioner;
pub use resource::ResourceManager;
pub use solid_history::SolidChatHistory;
