//! Turtle output.

use podchat_core::graph::{Graph, Literal, Term};
use podchat_core::patch::{PatternTerm, TriplePattern};
use podchat_core::vocab::{RDF_TYPE, WELL_KNOWN_PREFIXES};
use std::fmt::Write as _;

/// Writes terms, abbreviating IRIs under the well-known prefixes.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TermWriter;

impl TermWriter {
    /// `@prefix` lines (Turtle) or `PREFIX` lines (SPARQL).
    pub(crate) fn prefix_header(&self, sparql: bool) -> String {
        let mut out = String::new();
        for (prefix, ns) in WELL_KNOWN_PREFIXES {
            if sparql {
                let _ = writeln!(out, "PREFIX {prefix}: <{ns}>");
            } else {
                let _ = writeln!(out, "@prefix {prefix}: <{ns}>.");
            }
        }
        out
    }

    pub(crate) fn iri(&self, iri: &str) -> String {
        for (prefix, ns) in WELL_KNOWN_PREFIXES {
            if let Some(local) = iri.strip_prefix(ns) {
                if is_simple_local(local) {
                    return format!("{prefix}:{local}");
                }
            }
        }
        format!("<{}>", escape_iri(iri))
    }

    pub(crate) fn term(&self, term: &Term) -> String {
        match term {
            Term::Iri(iri) => self.iri(iri),
            Term::Blank(label) => format!("_:{label}"),
            Term::Literal(literal) => self.literal(literal),
        }
    }

    pub(crate) fn predicate(&self, term: &Term) -> String {
        if term.is_iri(RDF_TYPE) {
            "a".to_string()
        } else {
            self.term(term)
        }
    }

    pub(crate) fn pattern_term(&self, term: &PatternTerm) -> String {
        match term {
            PatternTerm::Var(name) => format!("?{name}"),
            PatternTerm::Term(term) => self.term(term),
        }
    }

    pub(crate) fn pattern(&self, pattern: &TriplePattern) -> String {
        let predicate = match &pattern.predicate {
            PatternTerm::Term(term) => self.predicate(term),
            var => self.pattern_term(var),
        };
        format!(
            "{} {} {}.",
            self.pattern_term(&pattern.subject),
            predicate,
            self.pattern_term(&pattern.object)
        )
    }

    fn literal(&self, literal: &Literal) -> String {
        let quoted = format!("\"{}\"", escape_string(&literal.lexical));
        match (&literal.language, &literal.datatype) {
            (Some(lang), _) => format!("{quoted}@{lang}"),
            (None, Some(datatype)) => format!("{quoted}^^{}", self.iri(datatype)),
            (None, None) => quoted,
        }
    }
}

/// Serializes `graph` grouping the statements of each subject.
pub(crate) fn write_document(graph: &Graph) -> String {
    let writer = TermWriter;
    let mut out = writer.prefix_header(false);
    let mut current: Option<&Term> = None;

    // Graph iteration is ordered by subject, so groups are contiguous.
    for triple in graph {
        if current == Some(&triple.subject) {
            out.push_str(";\n");
        } else {
            if current.is_some() {
                out.push_str(".\n");
            }
            let _ = write!(out, "\n{}\n", writer.term(&triple.subject));
            current = Some(&triple.subject);
        }
        let _ = write!(
            out,
            "    {} {}",
            writer.predicate(&triple.predicate),
            writer.term(&triple.object)
        );
    }
    if current.is_some() {
        out.push_str(".\n");
    }
    out
}

fn is_simple_local(local: &str) -> bool {
    let mut chars = local.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

fn escape_iri(iri: &str) -> String {
    let mut out = String::with_capacity(iri.len());
    for c in iri.chars() {
        match c {
            '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c if c <= ' ' => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use podchat_core::graph::Triple;
    use podchat_core::vocab::{PROF_HAS_RESOURCE, RDF_LIST, RDF_NIL, RDF_REST, XSD_INTEGER};

    #[test]
    fn test_iri_abbreviation() {
        let w = TermWriter;
        assert_eq!(w.iri(RDF_NIL), "rdf:nil");
        assert_eq!(w.iri("http://example.org/a b"), "<http://example.org/a\\u0020b>");
        // local part that Turtle would not read back as a prefixed name
        assert_eq!(
            w.iri("http://www.w3.org/ns/dx/prof/has.Resource"),
            "<http://www.w3.org/ns/dx/prof/has.Resource>"
        );
    }

    #[test]
    fn test_literal_rendering() {
        let w = TermWriter;
        assert_eq!(w.term(&Term::string("say \"hi\"\n")), r#""say \"hi\"\n""#);
        assert_eq!(
            w.term(&Term::Literal(Literal::typed("7", XSD_INTEGER))),
            r#""7"^^xsd:integer"#
        );
        assert_eq!(w.term(&Term::Literal(Literal::lang("hej", "sv"))), r#""hej"@sv"#);
    }

    #[test]
    fn test_document_groups_subjects() {
        let head = Term::iri("https://pod.example/doc#messages");
        let graph: Graph = [
            Triple::new(head.clone(), RDF_TYPE, Term::iri(RDF_LIST)),
            Triple::new(head.clone(), RDF_REST, Term::iri(RDF_NIL)),
            Triple::new(Term::blank("m"), PROF_HAS_RESOURCE, Term::string("x")),
        ]
        .into_iter()
        .collect();

        let text = write_document(&graph);
        assert!(text.starts_with("@prefix rdf:"));
        assert!(text.contains("<https://pod.example/doc#messages>\n    rdf:rest rdf:nil;\n    a rdf:List.\n"));
        assert!(text.contains("_:m\n    prof:hasResource \"x\".\n"));
    }

    #[test]
    fn test_empty_graph_is_prefixes_only() {
        let text = write_document(&Graph::new());
        assert_eq!(text.lines().count(), WELL_KNOWN_PREFIXES.len());
    }
}
