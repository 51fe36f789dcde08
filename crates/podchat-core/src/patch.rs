//! Patch descriptors: the update applied to the history document.
//!
//! A [`PatchDescriptor`] is the structured form of a SPARQL Update request
//! limited to what the history store needs: an insert-only request
//! (`INSERT DATA`), or a `DELETE { } INSERT { } WHERE { }` request whose
//! `WHERE` part is a basic graph pattern plus `FILTER (?var = term)`
//! constraints.
//!
//! The same descriptor is sent to the server and applied to the local mirror,
//! so [`PatchDescriptor::apply`] implements the server-side semantics with one
//! restriction taken from the pod server: a conditional patch must match
//! exactly one binding, otherwise it is rejected and nothing changes.

use crate::error::{PodError, Result};
use crate::graph::{Graph, Term, Triple};
use std::collections::BTreeMap;

/// A term position in a triple pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternTerm {
    Var(String),
    Term(Term),
}

impl PatternTerm {
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    fn resolve(&self, bindings: &Bindings) -> Option<Term> {
        match self {
            Self::Var(name) => bindings.get(name).cloned(),
            Self::Term(term) => Some(term.clone()),
        }
    }
}

impl From<Term> for PatternTerm {
    fn from(term: Term) -> Self {
        Self::Term(term)
    }
}

/// A triple whose positions may be variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriplePattern {
    pub subject: PatternTerm,
    pub predicate: PatternTerm,
    pub object: PatternTerm,
}

impl TriplePattern {
    pub fn new(
        subject: impl Into<PatternTerm>,
        predicate: impl Into<PatternTerm>,
        object: impl Into<PatternTerm>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// Instantiates the pattern; `None` if a variable is unbound.
    pub fn instantiate(&self, bindings: &Bindings) -> Option<Triple> {
        Some(Triple {
            subject: self.subject.resolve(bindings)?,
            predicate: self.predicate.resolve(bindings)?,
            object: self.object.resolve(bindings)?,
        })
    }

    fn unify(&self, triple: &Triple, bindings: &Bindings) -> Option<Bindings> {
        let mut next = bindings.clone();
        for (pattern, term) in [
            (&self.subject, &triple.subject),
            (&self.predicate, &triple.predicate),
            (&self.object, &triple.object),
        ] {
            match pattern {
                PatternTerm::Term(expected) if expected != term => return None,
                PatternTerm::Term(_) => {}
                PatternTerm::Var(name) => match next.get(name) {
                    Some(bound) if bound != term => return None,
                    Some(_) => {}
                    None => {
                        next.insert(name.clone(), term.clone());
                    }
                },
            }
        }
        Some(next)
    }
}

impl From<Triple> for TriplePattern {
    fn from(triple: Triple) -> Self {
        Self::new(triple.subject, triple.predicate, triple.object)
    }
}

/// Variable name → bound term.
pub type Bindings = BTreeMap<String, Term>;

/// The `WHERE` part of a conditional patch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Condition {
    pub patterns: Vec<TriplePattern>,
    /// `FILTER (?name = term)` constraints.
    pub filters: Vec<(String, Term)>,
}

impl Condition {
    /// All bindings of the pattern in `graph` that pass the filters.
    pub fn solutions(&self, graph: &Graph) -> Vec<Bindings> {
        let mut solutions = vec![Bindings::new()];
        for pattern in &self.patterns {
            solutions = solutions
                .iter()
                .flat_map(move |bindings| {
                    graph
                        .iter()
                        .filter_map(move |triple| pattern.unify(triple, bindings))
                })
                .collect();
            if solutions.is_empty() {
                break;
            }
        }
        solutions.retain(|bindings| {
            self.filters
                .iter()
                .all(|(name, expected)| bindings.get(name) == Some(expected))
        });
        solutions
    }
}

/// An update to the history document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchDescriptor {
    pub delete: Vec<TriplePattern>,
    pub insert: Vec<TriplePattern>,
    /// `None` for an insert-only patch.
    pub condition: Option<Condition>,
}

impl PatchDescriptor {
    /// An insert-only patch of ground triples.
    pub fn insert_data(triples: impl IntoIterator<Item = Triple>) -> Self {
        Self {
            delete: Vec::new(),
            insert: triples.into_iter().map(TriplePattern::from).collect(),
            condition: None,
        }
    }

    pub fn conditional(
        delete: Vec<TriplePattern>,
        insert: Vec<TriplePattern>,
        condition: Condition,
    ) -> Self {
        Self {
            delete,
            insert,
            condition: Some(condition),
        }
    }

    pub fn is_insert_only(&self) -> bool {
        self.condition.is_none()
    }

    /// Applies the patch to `graph`.
    ///
    /// On error the graph is left unchanged.
    pub fn apply(&self, graph: &mut Graph) -> Result<()> {
        let bindings = match &self.condition {
            None => Bindings::new(),
            Some(condition) => {
                let mut solutions = condition.solutions(graph);
                if solutions.len() != 1 {
                    return Err(PodError::PatchConflict {
                        matches: solutions.len(),
                    });
                }
                solutions.remove(0)
            }
        };

        let deletions = instantiate_all(&self.delete, &bindings)?;
        let insertions = instantiate_all(&self.insert, &bindings)?;

        for triple in &deletions {
            graph.remove(triple);
        }
        graph.extend(insertions);
        Ok(())
    }
}

fn instantiate_all(patterns: &[TriplePattern], bindings: &Bindings) -> Result<Vec<Triple>> {
    patterns
        .iter()
        .map(|pattern| {
            pattern.instantiate(bindings).ok_or_else(|| {
                PodError::codec("SPARQL Update", "template uses a variable the condition does not bind")
            })
        })
        .collect()
}
