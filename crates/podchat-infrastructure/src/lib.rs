//! Local infrastructure for podchat: the Turtle/SPARQL codec, configuration,
//! paths and the stored account profile.

pub mod account_store;
pub mod config;
pub mod paths;
pub mod sparql;
pub mod turtle;

pub use crate::account_store::AccountStore;
pub use crate::config::PodChatConfig;
pub use crate::paths::PodChatPaths;
pub use crate::turtle::TurtleCodec;
