//! In-memory RDF graph model.
//!
//! A [`Graph`] is a set of [`Triple`]s. It is the shape of the history
//! document after parsing and the thing patches are applied to, both on the
//! client (the mirror) and in test doubles of the pod.

use crate::vocab;
use std::collections::BTreeSet;
use std::fmt;

/// A literal value with an optional datatype or language tag.
///
/// `xsd:string` is the implicit datatype of a plain literal, so it is stored
/// as `None` to make `"hi"` and `"hi"^^xsd:string` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    pub lexical: String,
    pub datatype: Option<String>,
    pub language: Option<String>,
}

impl Literal {
    pub fn string(lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn typed(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        let datatype = datatype.into();
        Self {
            lexical: lexical.into(),
            datatype: (datatype != vocab::XSD_STRING).then_some(datatype),
            language: None,
        }
    }

    pub fn lang(lexical: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: Some(language.into().to_ascii_lowercase()),
        }
    }

    /// The datatype IRI, with the implicit ones filled in.
    pub fn datatype_iri(&self) -> &str {
        match (&self.datatype, &self.language) {
            (Some(dt), _) => dt,
            (None, Some(_)) => vocab::RDF_LANG_STRING,
            (None, None) => vocab::XSD_STRING,
        }
    }
}

/// An RDF term.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    Iri(String),
    Blank(String),
    Literal(Literal),
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Self::Iri(iri.into())
    }

    pub fn blank(label: impl Into<String>) -> Self {
        Self::Blank(label.into())
    }

    pub fn string(lexical: impl Into<String>) -> Self {
        Self::Literal(Literal::string(lexical))
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Self::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank(_))
    }

    /// True if this term is the IRI `iri`.
    pub fn is_iri(&self, iri: &str) -> bool {
        self.as_iri() == Some(iri)
    }
}

/// N-Triples style rendering, used in log output.
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{iri}>"),
            Term::Blank(label) => write!(f, "_:{label}"),
            Term::Literal(literal) => {
                write!(f, "{:?}", literal.lexical)?;
                if let Some(lang) = &literal.language {
                    write!(f, "@{lang}")
                } else if let Some(dt) = &literal.datatype {
                    write!(f, "^^<{dt}>")
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// A single statement. The predicate is always an IRI term.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: impl Into<String>, object: Term) -> Self {
        Self {
            subject,
            predicate: Term::Iri(predicate.into()),
            object,
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

/// A set of triples with deterministic iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    triples: BTreeSet<Triple>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Inserts a triple, returning `false` if it was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        self.triples.insert(triple)
    }

    pub fn remove(&mut self, triple: &Triple) -> bool {
        self.triples.remove(triple)
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    pub fn clear(&mut self) {
        self.triples.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Triples matching the given positions; `None` is a wildcard.
    pub fn matching<'g, 'p>(
        &'g self,
        subject: Option<&'p Term>,
        predicate: Option<&'p str>,
        object: Option<&'p Term>,
    ) -> impl Iterator<Item = &'g Triple> {
        self.triples.iter().filter(move |t| {
            subject.is_none_or(|s| &t.subject == s)
                && predicate.is_none_or(|p| t.predicate.is_iri(p))
                && object.is_none_or(|o| &t.object == o)
        })
    }

    /// Subjects having `predicate` with value `object`.
    pub fn subjects<'g, 'p>(
        &'g self,
        predicate: &'p str,
        object: &'p Term,
    ) -> impl Iterator<Item = &'g Term> {
        self.matching(None, Some(predicate), Some(object))
            .map(|t| &t.subject)
    }

    /// The first value of `predicate` on `subject`, if any.
    pub fn object(&self, subject: &Term, predicate: &str) -> Option<&Term> {
        self.matching(Some(subject), Some(predicate), None)
            .map(|t| &t.object)
            .next()
    }
}

impl Extend<Triple> for Graph {
    fn extend<I: IntoIterator<Item = Triple>>(&mut self, iter: I) {
        self.triples.extend(iter);
    }
}

impl FromIterator<Triple> for Graph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        Self {
            triples: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Graph {
    type Item = &'a Triple;
    type IntoIter = std::collections::btree_set::Iter<'a, Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xsd_string_literal_equals_plain_literal() {
        let typed = Literal::typed("hi", vocab::XSD_STRING);
        assert_eq!(typed, Literal::string("hi"));
        assert_eq!(typed.datatype_iri(), vocab::XSD_STRING);
    }

    #[test]
    fn test_graph_deduplicates_and_matches() {
        let s = Term::iri("http://example.org/doc#a");
        let mut graph = Graph::new();
        assert!(graph.insert(Triple::new(s.clone(), vocab::RDF_TYPE, Term::iri(vocab::RDF_LIST))));
        assert!(!graph.insert(Triple::new(s.clone(), vocab::RDF_TYPE, Term::iri(vocab::RDF_LIST))));
        graph.insert(Triple::new(s.clone(), vocab::RDF_REST, Term::iri(vocab::RDF_NIL)));

        assert_eq!(graph.len(), 2);
        let list = Term::iri(vocab::RDF_LIST);
        let heads: Vec<_> = graph.subjects(vocab::RDF_TYPE, &list).collect();
        assert_eq!(heads, vec![&s]);
        assert_eq!(graph.object(&s, vocab::RDF_REST), Some(&Term::iri(vocab::RDF_NIL)));
        assert_eq!(graph.object(&s, vocab::RDF_FIRST), None);
    }

    #[test]
    fn test_display_is_ntriples_like() {
        let triple = Triple::new(
            Term::blank("b0"),
            vocab::PROF_HAS_ROLE,
            Term::Literal(Literal::lang("hello", "EN")),
        );
        assert_eq!(
            triple.to_string(),
            "_:b0 <http://www.w3.org/ns/dx/prof/hasRole> \"hello\"@en ."
        );
    }
}
