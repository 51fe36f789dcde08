//! Domain model and capability traits for podchat.
//!
//! This crate has no I/O. It defines the graph model of the history
//! document, the linked-list encoding of a conversation inside it, the patch
//! descriptors that extend that list, and the traits through which the rest
//! of the workspace plugs in a wire format ([`codec::GraphCodec`]) and an
//! authenticated transport ([`session::AuthSession`]).

pub mod account;
pub mod codec;
pub mod error;
pub mod graph;
pub mod history;
pub mod patch;
pub mod session;
pub mod vocab;

// Re-export common error type
pub use error::{PodError, Result};
