//! Encodes the chat history as an RDF list inside the history document.
//!
//! Layout (compatible with documents written by earlier clients):
//!
//! ```text
//! <doc#messages> a rdf:List ;            # head, also the first cell
//!     rdf:first <doc#msg-…> ;
//!     rdf:rest  <doc#item-…> .
//! <doc#item-…> rdf:first <doc#msg-…> ;
//!     rdf:rest  rdf:nil .                 # tail
//! <doc#msg-…> a prof:ResourceDescriptor ;
//!     prof:hasResource "content"^^xsd:string ;
//!     prof:hasRole     "human"^^xsd:string .
//! ```
//!
//! Everything here is pure: the patch builder only looks at the mirror
//! snapshot it is given, and the network layer decides what to do with the
//! resulting [`PatchDescriptor`].

use super::message::{Message, MessageRole};
use crate::graph::{Graph, Literal, Term, Triple};
use crate::patch::{Condition, PatchDescriptor, PatternTerm, TriplePattern};
use crate::vocab::{
    PROF_HAS_RESOURCE, PROF_HAS_ROLE, PROF_RESOURCE_DESCRIPTOR, RDF_FIRST, RDF_LIST, RDF_NIL,
    RDF_REST, RDF_TYPE, XSD_STRING,
};
use std::collections::HashSet;
use uuid::Uuid;

/// Fragment of the list head node inside the history document.
pub const LIST_HEAD_FRAGMENT: &str = "messages";

/// Variable bound to the tail cell in conditional patches.
const TAIL_VAR: &str = "end";

/// Returns the list head, if the document has one.
///
/// A well-formed document has exactly one; when concurrent first appends
/// created several, the first in graph order wins.
pub fn list_head(graph: &Graph) -> Option<&Term> {
    let list_type = Term::iri(RDF_LIST);
    let mut heads = graph.matching(None, Some(RDF_TYPE), Some(&list_type)).map(|t| &t.subject);
    let head = heads.next()?;
    if heads.next().is_some() {
        tracing::warn!("[ListCodec] Multiple list heads in document, using {}", head);
    }
    Some(head)
}

/// The list cells in chain order, starting at `head`.
fn cells<'a>(graph: &'a Graph, head: &'a Term) -> Vec<&'a Term> {
    let mut visited = HashSet::new();
    let mut cells = Vec::new();
    let mut current = head;

    while !current.is_iri(RDF_NIL) {
        if !visited.insert(current) {
            tracing::warn!("[ListCodec] Cycle detected at {}, truncating list", current);
            break;
        }
        cells.push(current);
        match graph.object(current, RDF_REST) {
            Some(next) => current = next,
            None => {
                tracing::warn!("[ListCodec] Cell {} has no rdf:rest, truncating list", current);
                break;
            }
        }
    }
    cells
}

/// The last cell of the chain, i.e. the one a new message is attached to.
pub fn tail(graph: &Graph) -> Option<&Term> {
    let head = list_head(graph)?;
    cells(graph, head).last().copied()
}

/// Decodes the messages of the history document in append order.
///
/// A document without a list head is an empty history.
pub fn decode(graph: &Graph) -> Vec<Message> {
    let Some(head) = list_head(graph) else {
        return Vec::new();
    };

    cells(graph, head)
        .into_iter()
        .filter_map(|cell| {
            let Some(descriptor) = graph.object(cell, RDF_FIRST) else {
                tracing::warn!("[ListCodec] Cell {} has no rdf:first, skipping", cell);
                return None;
            };
            let Some(content) = literal_value(graph, descriptor, PROF_HAS_RESOURCE) else {
                tracing::warn!("[ListCodec] Descriptor {} has no content, skipping", descriptor);
                return None;
            };
            let role = literal_value(graph, descriptor, PROF_HAS_ROLE)
                .map(MessageRole::from)
                .unwrap_or_else(|| MessageRole::Other(String::new()));
            Some(Message {
                role,
                content: content.to_string(),
            })
        })
        .collect()
}

fn literal_value<'a>(graph: &'a Graph, subject: &Term, predicate: &str) -> Option<&'a str> {
    graph
        .object(subject, predicate)
        .and_then(Term::as_literal)
        .map(|literal| literal.lexical.as_str())
}

/// Builds the patch that appends `message` to the history in `mirror`.
///
/// Without a list head the patch is insert-only and creates the head as the
/// first cell. Otherwise the patch is conditional: it rebinds the cell whose
/// `rdf:rest` is `rdf:nil` on the server and, when the mirror's tail has a
/// stable IRI, requires that cell to be the one the mirror believes in. A
/// second append built from the same stale snapshot therefore fails on the
/// server instead of silently attaching to an outdated tail.
pub fn build_append_patch(mirror: &Graph, message: &Message, document_iri: &str) -> PatchDescriptor {
    let document_iri = document_iri.split('#').next().unwrap_or(document_iri);
    let descriptor = mint(document_iri, "msg");

    let Some(believed_tail) = tail(mirror) else {
        let head = Term::iri(format!("{document_iri}#{LIST_HEAD_FRAGMENT}"));
        let mut triples = vec![
            Triple::new(head.clone(), RDF_TYPE, Term::iri(RDF_LIST)),
            Triple::new(head.clone(), RDF_FIRST, descriptor.clone()),
            Triple::new(head, RDF_REST, Term::iri(RDF_NIL)),
        ];
        triples.extend(descriptor_triples(&descriptor, message));
        return PatchDescriptor::insert_data(triples);
    };

    let cell = mint(document_iri, "item");
    let end = PatternTerm::var(TAIL_VAR);
    let rest = PatternTerm::Term(Term::iri(RDF_REST));
    let nil = PatternTerm::Term(Term::iri(RDF_NIL));

    let mut insert = vec![
        TriplePattern::new(end.clone(), rest.clone(), cell.clone()),
        TriplePattern::new(cell.clone(), Term::iri(RDF_FIRST), descriptor.clone()),
        TriplePattern::new(cell, rest.clone(), nil.clone()),
    ];
    insert.extend(
        descriptor_triples(&descriptor, message)
            .into_iter()
            .map(TriplePattern::from),
    );

    // Blank tails cannot be named across documents; let the server pick.
    let filters = match believed_tail {
        Term::Iri(_) => vec![(TAIL_VAR.to_string(), believed_tail.clone())],
        _ => Vec::new(),
    };

    PatchDescriptor::conditional(
        vec![TriplePattern::new(end.clone(), rest.clone(), nil.clone())],
        insert,
        Condition {
            patterns: vec![TriplePattern::new(end, rest, nil)],
            filters,
        },
    )
}

fn descriptor_triples(descriptor: &Term, message: &Message) -> Vec<Triple> {
    vec![
        Triple::new(
            descriptor.clone(),
            RDF_TYPE,
            Term::iri(PROF_RESOURCE_DESCRIPTOR),
        ),
        Triple::new(
            descriptor.clone(),
            PROF_HAS_RESOURCE,
            Term::Literal(Literal::typed(message.content.clone(), XSD_STRING)),
        ),
        Triple::new(
            descriptor.clone(),
            PROF_HAS_ROLE,
            Term::Literal(Literal::typed(message.role.as_str(), XSD_STRING)),
        ),
    ]
}

fn mint(document_iri: &str, kind: &str) -> Term {
    Term::iri(format!("{document_iri}#{kind}-{}", Uuid::new_v4().simple()))
}
