//! Recursive-descent parser for Turtle triples.
//!
//! The same parser reads documents and the triple blocks inside SPARQL
//! Update requests; the latter may contain variables, which documents may not.

use super::lexer::{Lexer, Spanned, Token};
use podchat_core::graph::{Graph, Literal, Term, Triple};
use podchat_core::patch::{PatternTerm, TriplePattern};
use podchat_core::vocab::{RDF_FIRST, RDF_NIL, RDF_REST, RDF_TYPE, XSD_BOOLEAN, XSD_DECIMAL, XSD_DOUBLE, XSD_INTEGER};
use podchat_core::{PodError, Result};
use std::collections::{HashMap, HashSet};
use url::Url;

pub(crate) struct Parser {
    format: &'static str,
    tokens: Vec<Spanned>,
    pos: usize,
    base: Option<Url>,
    prefixes: HashMap<String, String>,
    allow_variables: bool,
    fresh_blanks: usize,
    /// Labels written as `_:label` in the input; fresh nodes avoid them.
    explicit_blanks: HashSet<String>,
    out: Vec<TriplePattern>,
}

impl Parser {
    pub(crate) fn new(input: &str, base_iri: &str, format: &'static str) -> Result<Self> {
        let tokens = Lexer::new(input, format).tokenize()?;
        let explicit_blanks = tokens
            .iter()
            .filter_map(|spanned| match &spanned.token {
                Token::Blank(label) => Some(label.clone()),
                _ => None,
            })
            .collect();
        Ok(Self {
            format,
            tokens,
            pos: 0,
            base: Url::parse(base_iri).ok(),
            prefixes: HashMap::new(),
            allow_variables: false,
            fresh_blanks: 0,
            explicit_blanks,
            out: Vec::new(),
        })
    }

    pub(crate) fn allow_variables(mut self) -> Self {
        self.allow_variables = true;
        self
    }

    // ------------------------------------------------------------------
    // Token access
    // ------------------------------------------------------------------

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].token
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn error(&self, message: impl AsRef<str>) -> PodError {
        let span = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        PodError::codec(
            self.format,
            format!(
                "line {}, column {}: {}",
                span.line,
                span.column,
                message.as_ref()
            ),
        )
    }

    pub(crate) fn checkpoint(&self) -> usize {
        self.pos
    }

    pub(crate) fn rewind(&mut self, checkpoint: usize) {
        self.pos = checkpoint;
    }

    pub(crate) fn at_punct(&self, c: char) -> bool {
        *self.peek() == Token::Punct(c)
    }

    pub(crate) fn expect_punct(&mut self, c: char) -> Result<()> {
        if self.at_punct(c) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected '{c}', found {:?}", self.peek())))
        }
    }

    /// Case-insensitive keyword check.
    pub(crate) fn at_word(&self, word: &str) -> bool {
        matches!(self.peek(), Token::Word(w) if w.eq_ignore_ascii_case(word))
    }

    pub(crate) fn expect_word(&mut self, word: &str) -> Result<()> {
        if self.at_word(word) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected {word}, found {:?}", self.peek())))
        }
    }

    pub(crate) fn at_eof(&self) -> bool {
        *self.peek() == Token::Eof
    }

    // ------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------

    /// Parses a whole Turtle document into a graph.
    pub(crate) fn parse_document(mut self) -> Result<Graph> {
        while !self.at_eof() {
            if !self.directive()? {
                self.triples()?;
                self.expect_punct('.')?;
            }
        }
        self.out
            .into_iter()
            .map(|pattern| ground(pattern, self.format))
            .collect()
    }

    /// Parses a `@prefix`/`@base`/`PREFIX`/`BASE` directive if one is next.
    pub(crate) fn directive(&mut self) -> Result<bool> {
        match self.peek().clone() {
            Token::At(word) if word == "prefix" => {
                self.advance();
                self.prefix_binding()?;
                self.expect_punct('.')?;
            }
            Token::At(word) if word == "base" => {
                self.advance();
                self.base_binding()?;
                self.expect_punct('.')?;
            }
            Token::Word(word) if word.eq_ignore_ascii_case("prefix") => {
                self.advance();
                self.prefix_binding()?;
            }
            Token::Word(word) if word.eq_ignore_ascii_case("base") => {
                self.advance();
                self.base_binding()?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn prefix_binding(&mut self) -> Result<()> {
        let Token::Prefixed { prefix, local } = self.advance() else {
            return Err(self.error("expected a prefix name like 'ex:'"));
        };
        if !local.is_empty() {
            return Err(self.error(format!("prefix name '{prefix}:{local}' must end with ':'")));
        }
        let Token::Iri(iri) = self.advance() else {
            return Err(self.error("expected an IRI after the prefix name"));
        };
        let resolved = self.resolve(&iri)?;
        self.prefixes.insert(prefix, resolved);
        Ok(())
    }

    fn base_binding(&mut self) -> Result<()> {
        let Token::Iri(iri) = self.advance() else {
            return Err(self.error("expected an IRI after base"));
        };
        let resolved = self.resolve(&iri)?;
        self.base = Some(
            Url::parse(&resolved).map_err(|e| self.error(format!("invalid base IRI: {e}")))?,
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Triples
    // ------------------------------------------------------------------

    /// Parses triple statements up to (not including) `}`, separated by `.`.
    pub(crate) fn triples_block(&mut self) -> Result<Vec<TriplePattern>> {
        let start = self.out.len();
        while !self.at_punct('}') && !self.at_eof() && !self.at_word("filter") {
            self.triples()?;
            if self.at_punct('.') {
                self.advance();
            } else {
                break;
            }
        }
        Ok(self.out.split_off(start))
    }

    fn triples(&mut self) -> Result<()> {
        if self.at_punct('[') {
            let subject = self.blank_property_list()?;
            // `[ … ] .` is a complete statement on its own
            if !self.at_punct('.') && !self.at_punct('}') {
                self.predicate_object_list(&subject)?;
            }
            return Ok(());
        }
        let subject = self.subject()?;
        self.predicate_object_list(&subject)
    }

    fn subject(&mut self) -> Result<PatternTerm> {
        match self.peek() {
            Token::Punct('(') => self.collection(),
            Token::Iri(_) | Token::Prefixed { .. } | Token::Blank(_) | Token::Var(_) => {
                self.term()
            }
            other => Err(self.error(format!("expected a subject, found {other:?}"))),
        }
    }

    fn predicate_object_list(&mut self, subject: &PatternTerm) -> Result<()> {
        loop {
            let predicate = self.verb()?;
            self.object_list(subject, &predicate)?;

            if !self.at_punct(';') {
                return Ok(());
            }
            while self.at_punct(';') {
                self.advance();
            }
            // trailing ';' before the end of the statement
            if self.at_punct('.') || self.at_punct(']') || self.at_punct('}') {
                return Ok(());
            }
        }
    }

    fn verb(&mut self) -> Result<PatternTerm> {
        match self.peek() {
            Token::Word(w) if w == "a" => {
                self.advance();
                Ok(PatternTerm::Term(Term::iri(RDF_TYPE)))
            }
            Token::Iri(_) | Token::Prefixed { .. } | Token::Var(_) => self.term(),
            other => Err(self.error(format!("expected a predicate, found {other:?}"))),
        }
    }

    fn object_list(&mut self, subject: &PatternTerm, predicate: &PatternTerm) -> Result<()> {
        loop {
            let object = self.object()?;
            self.out.push(TriplePattern {
                subject: subject.clone(),
                predicate: predicate.clone(),
                object,
            });
            if self.at_punct(',') {
                self.advance();
            } else {
                return Ok(());
            }
        }
    }

    fn object(&mut self) -> Result<PatternTerm> {
        match self.peek() {
            Token::Punct('(') => self.collection(),
            Token::Punct('[') => self.blank_property_list(),
            _ => self.term(),
        }
    }

    fn blank_property_list(&mut self) -> Result<PatternTerm> {
        self.expect_punct('[')?;
        let node = self.fresh_blank();
        if !self.at_punct(']') {
            self.predicate_object_list(&node)?;
        }
        self.expect_punct(']')?;
        Ok(node)
    }

    fn collection(&mut self) -> Result<PatternTerm> {
        self.expect_punct('(')?;
        let mut items = Vec::new();
        while !self.at_punct(')') {
            if self.at_eof() {
                return Err(self.error("unterminated collection"));
            }
            items.push(self.object()?);
        }
        self.advance();

        if items.is_empty() {
            return Ok(PatternTerm::Term(Term::iri(RDF_NIL)));
        }
        let cells: Vec<PatternTerm> = items.iter().map(|_| self.fresh_blank()).collect();
        for (i, item) in items.into_iter().enumerate() {
            let rest = cells
                .get(i + 1)
                .cloned()
                .unwrap_or_else(|| PatternTerm::Term(Term::iri(RDF_NIL)));
            self.out.push(TriplePattern::new(
                cells[i].clone(),
                Term::iri(RDF_FIRST),
                item,
            ));
            self.out
                .push(TriplePattern::new(cells[i].clone(), Term::iri(RDF_REST), rest));
        }
        Ok(cells[0].clone())
    }

    fn fresh_blank(&mut self) -> PatternTerm {
        loop {
            self.fresh_blanks += 1;
            let label = format!("genid-{}", self.fresh_blanks);
            if !self.explicit_blanks.contains(&label) {
                return PatternTerm::Term(Term::blank(label));
            }
        }
    }

    /// A single IRI, prefixed name, blank node, variable or literal.
    pub(crate) fn term(&mut self) -> Result<PatternTerm> {
        let term = match self.advance() {
            Token::Iri(iri) => Term::iri(self.resolve(&iri)?),
            Token::Prefixed { prefix, local } => Term::iri(self.expand(&prefix, &local)?),
            Token::Blank(label) => Term::blank(label),
            Token::Var(name) => {
                if !self.allow_variables {
                    return Err(self.error(format!("variable ?{name} not allowed here")));
                }
                return Ok(PatternTerm::Var(name));
            }
            Token::Str(lexical) => Term::Literal(self.literal_suffix(lexical)?),
            Token::Integer(n) => Term::Literal(Literal::typed(n, XSD_INTEGER)),
            Token::Decimal(n) => Term::Literal(Literal::typed(n, XSD_DECIMAL)),
            Token::Double(n) => Term::Literal(Literal::typed(n, XSD_DOUBLE)),
            Token::Word(w) if w == "true" || w == "false" => {
                Term::Literal(Literal::typed(w, XSD_BOOLEAN))
            }
            other => {
                self.pos = self.pos.saturating_sub(1);
                return Err(self.error(format!("expected a term, found {other:?}")));
            }
        };
        Ok(PatternTerm::Term(term))
    }

    fn literal_suffix(&mut self, lexical: String) -> Result<Literal> {
        match self.peek().clone() {
            Token::At(language) => {
                self.advance();
                Ok(Literal::lang(lexical, language))
            }
            Token::Carets => {
                self.advance();
                let datatype = match self.advance() {
                    Token::Iri(iri) => self.resolve(&iri)?,
                    Token::Prefixed { prefix, local } => self.expand(&prefix, &local)?,
                    other => {
                        return Err(self.error(format!("expected a datatype IRI, found {other:?}")));
                    }
                };
                Ok(Literal::typed(lexical, datatype))
            }
            _ => Ok(Literal::string(lexical)),
        }
    }

    fn expand(&self, prefix: &str, local: &str) -> Result<String> {
        self.prefixes
            .get(prefix)
            .map(|ns| format!("{ns}{local}"))
            .ok_or_else(|| self.error(format!("undefined prefix '{prefix}:'")))
    }

    /// Resolves a possibly relative IRI against the current base.
    pub(crate) fn resolve(&self, iri: &str) -> Result<String> {
        if has_scheme(iri) {
            return Ok(iri.to_string());
        }
        let base = self
            .base
            .as_ref()
            .ok_or_else(|| self.error(format!("relative IRI <{iri}> without a base")))?;
        base.join(iri)
            .map(String::from)
            .map_err(|e| self.error(format!("cannot resolve <{iri}>: {e}")))
    }
}

fn has_scheme(iri: &str) -> bool {
    match iri.split_once(':') {
        Some((scheme, _)) => {
            let mut chars = scheme.chars();
            chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

fn ground(pattern: TriplePattern, format: &str) -> Result<Triple> {
    let term = |position: PatternTerm| match position {
        PatternTerm::Term(term) => Ok(term),
        PatternTerm::Var(name) => Err(PodError::codec(
            format,
            format!("variable ?{name} in ground data"),
        )),
    };
    Ok(Triple {
        subject: term(pattern.subject)?,
        predicate: term(pattern.predicate)?,
        object: term(pattern.object)?,
    })
}

/// Converts parsed patterns to ground triples.
pub(crate) fn ground_all(patterns: Vec<TriplePattern>, format: &str) -> Result<Vec<Triple>> {
    patterns.into_iter().map(|p| ground(p, format)).collect()
}
