//! Turtle documents and SPARQL Update patches.
//!
//! # Module Structure
//!
//! - `lexer`: tokens shared by both languages
//! - `parser`: Turtle triples (documents, and the blocks inside updates)
//! - `writer`: Turtle output with the well-known prefixes

mod lexer;
pub(crate) mod parser;
pub(crate) mod writer;

use crate::sparql;
use parser::Parser;
use podchat_core::codec::GraphCodec;
use podchat_core::graph::Graph;
use podchat_core::patch::PatchDescriptor;
use podchat_core::vocab::{SPARQL_UPDATE_MEDIA_TYPE, TURTLE_MEDIA_TYPE};
use podchat_core::Result;

const FORMAT: &str = "Turtle";

/// [`GraphCodec`] for `text/turtle` documents and `application/sparql-update`
/// patches, the pair spoken by Solid servers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TurtleCodec;

impl TurtleCodec {
    pub fn new() -> Self {
        Self
    }
}

impl GraphCodec for TurtleCodec {
    fn document_media_type(&self) -> &'static str {
        TURTLE_MEDIA_TYPE
    }

    fn patch_media_type(&self) -> &'static str {
        SPARQL_UPDATE_MEDIA_TYPE
    }

    fn parse_document(&self, text: &str, base_iri: &str) -> Result<Graph> {
        Parser::new(text, base_iri, FORMAT)?.parse_document()
    }

    fn serialize_document(&self, graph: &Graph) -> String {
        writer::write_document(graph)
    }

    fn serialize_patch(&self, patch: &PatchDescriptor) -> String {
        sparql::write_update(patch)
    }

    fn parse_patch(&self, text: &str, base_iri: &str) -> Result<PatchDescriptor> {
        sparql::parse_update(text, base_iri)
    }
}
