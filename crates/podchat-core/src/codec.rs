//! Graph codec capability.
//!
//! Defines how the history document and patches are put on the wire. The
//! history store is generic over this trait, so the concrete format is chosen
//! when the store is built.

use crate::error::Result;
use crate::graph::Graph;
use crate::patch::PatchDescriptor;

/// Serialization of documents and patches.
pub trait GraphCodec: Send + Sync {
    /// Media type of serialized documents (`Content-Type` / `Accept`).
    fn document_media_type(&self) -> &'static str;

    /// Media type of serialized patches.
    fn patch_media_type(&self) -> &'static str;

    /// Parses a document, resolving relative IRIs against `base_iri`.
    fn parse_document(&self, text: &str, base_iri: &str) -> Result<Graph>;

    /// Serializes a graph as a document.
    fn serialize_document(&self, graph: &Graph) -> String;

    /// Serializes a patch.
    fn serialize_patch(&self, patch: &PatchDescriptor) -> String;

    /// Parses a patch produced by [`GraphCodec::serialize_patch`].
    fn parse_patch(&self, text: &str, base_iri: &str) -> Result<PatchDescriptor>;
}
