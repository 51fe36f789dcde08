//! SPARQL Update text for [`PatchDescriptor`]s.
//!
//! Only the forms the history store emits are read back:
//! `INSERT DATA { … }` and `[DELETE { … }] [INSERT { … }] WHERE { … }` with
//! `FILTER (?var = term)` constraints. Keywords are case-insensitive.

use crate::turtle::parser::{ground_all, Parser};
use crate::turtle::writer::TermWriter;
use podchat_core::graph::Term;
use podchat_core::patch::{Condition, PatchDescriptor, PatternTerm, TriplePattern};
use podchat_core::Result;
use std::fmt::Write as _;

const FORMAT: &str = "SPARQL Update";

/// Serializes `patch` as a SPARQL Update request.
pub fn write_update(patch: &PatchDescriptor) -> String {
    let writer = TermWriter;
    let mut out = writer.prefix_header(true);

    let Some(condition) = &patch.condition else {
        out.push_str("INSERT DATA {\n");
        write_block(&mut out, &writer, &patch.insert);
        out.push_str("}\n");
        return out;
    };

    if !patch.delete.is_empty() {
        out.push_str("DELETE {\n");
        write_block(&mut out, &writer, &patch.delete);
        out.push_str("}\n");
    }
    if !patch.insert.is_empty() {
        out.push_str("INSERT {\n");
        write_block(&mut out, &writer, &patch.insert);
        out.push_str("}\n");
    }
    out.push_str("WHERE {\n");
    write_block(&mut out, &writer, &condition.patterns);
    for (name, term) in &condition.filters {
        let _ = writeln!(out, "    FILTER (?{name} = {})", writer.term(term));
    }
    out.push_str("}\n");
    out
}

fn write_block(out: &mut String, writer: &TermWriter, patterns: &[TriplePattern]) {
    for pattern in patterns {
        let _ = writeln!(out, "    {}", writer.pattern(pattern));
    }
}

/// Parses an update produced by [`write_update`] (or an equivalent request
/// written by hand).
pub fn parse_update(text: &str, base_iri: &str) -> Result<PatchDescriptor> {
    let mut parser = Parser::new(text, base_iri, FORMAT)?.allow_variables();
    while parser.directive()? {}

    let patch = if parser.at_word("insert") && next_is_data(&mut parser) {
        let block = braced_triples(&mut parser)?;
        PatchDescriptor::insert_data(ground_all(block, FORMAT)?)
    } else {
        let mut delete = Vec::new();
        let mut insert = Vec::new();
        if parser.at_word("delete") {
            parser.advance();
            delete = braced_triples(&mut parser)?;
        }
        if parser.at_word("insert") {
            parser.advance();
            insert = braced_triples(&mut parser)?;
        }
        parser.expect_word("where")?;
        let condition = where_clause(&mut parser)?;
        PatchDescriptor::conditional(delete, insert, condition)
    };

    // A single trailing ';' is allowed between operations; we only carry one.
    if parser.at_punct(';') {
        parser.advance();
    }
    if !parser.at_eof() {
        return Err(parser.error(format!(
            "unexpected {:?} after the update operation",
            parser.peek()
        )));
    }
    Ok(patch)
}

/// Consumes `INSERT DATA` if that is what follows; otherwise leaves the
/// parser on `INSERT`.
fn next_is_data(parser: &mut Parser) -> bool {
    let checkpoint = parser.checkpoint();
    parser.advance();
    if parser.at_word("data") {
        parser.advance();
        true
    } else {
        parser.rewind(checkpoint);
        false
    }
}

fn braced_triples(parser: &mut Parser) -> Result<Vec<TriplePattern>> {
    parser.expect_punct('{')?;
    let triples = parser.triples_block()?;
    parser.expect_punct('}')?;
    Ok(triples)
}

fn where_clause(parser: &mut Parser) -> Result<Condition> {
    parser.expect_punct('{')?;
    let mut condition = Condition::default();
    while !parser.at_punct('}') {
        if parser.at_word("filter") {
            parser.advance();
            condition.filters.push(filter(parser)?);
            if parser.at_punct('.') {
                parser.advance();
            }
            continue;
        }
        let block = parser.triples_block()?;
        if block.is_empty() {
            return Err(parser.error(format!("unexpected {:?} in WHERE", parser.peek())));
        }
        condition.patterns.extend(block);
    }
    parser.expect_punct('}')?;
    Ok(condition)
}

/// `( ?var = term )`
fn filter(parser: &mut Parser) -> Result<(String, Term)> {
    parser.expect_punct('(')?;
    let PatternTerm::Var(name) = parser.term()? else {
        return Err(parser.error("FILTER must compare a variable"));
    };
    parser.expect_punct('=')?;
    let PatternTerm::Term(value) = parser.term()? else {
        return Err(parser.error("FILTER must compare against a constant term"));
    };
    parser.expect_punct(')')?;
    Ok((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use podchat_core::graph::Graph;
    use podchat_core::history::{list_codec, Message};
    use podchat_core::vocab::{RDF_NIL, RDF_REST};
    use podchat_core::PodError;

    const DOC: &str = "https://pod.example/alice/private/chatdocs.ttl";

    #[test]
    fn test_first_append_is_insert_data() {
        let patch = list_codec::build_append_patch(&Graph::new(), &Message::human("hi"), DOC);
        let text = write_update(&patch);
        assert!(text.contains("INSERT DATA {"), "{text}");
        assert!(!text.contains("WHERE"));
        assert_eq!(parse_update(&text, DOC).unwrap(), patch);
    }

    #[test]
    fn test_conditional_append_pins_tail() {
        let mut graph = Graph::new();
        list_codec::build_append_patch(&graph, &Message::human("hi"), DOC)
            .apply(&mut graph)
            .unwrap();
        let tail = list_codec::tail(&graph).cloned().unwrap();

        let patch = list_codec::build_append_patch(&graph, &Message::ai("hello"), DOC);
        let text = write_update(&patch);
        assert!(text.contains("DELETE {\n    ?end rdf:rest rdf:nil.\n}"), "{text}");
        assert!(text.contains(&format!("FILTER (?end = {tail})")), "{text}");

        let parsed = parse_update(&text, DOC).unwrap();
        assert_eq!(parsed, patch);
        parsed.apply(&mut graph).unwrap();
        assert_eq!(
            list_codec::decode(&graph),
            vec![Message::human("hi"), Message::ai("hello")]
        );
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let text = "prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
             delete { ?end rdf:rest rdf:nil }
             insert { ?end rdf:rest <#c> . <#c> rdf:rest rdf:nil }
             where { ?end rdf:rest rdf:nil . filter (?end = <#old>) }";
        let patch = parse_update(text, DOC).unwrap();
        assert_eq!(patch.delete.len(), 1);
        assert_eq!(patch.insert.len(), 2);
        let condition = patch.condition.unwrap();
        assert_eq!(
            condition.patterns,
            vec![TriplePattern::new(
                PatternTerm::var("end"),
                Term::iri(RDF_REST),
                Term::iri(RDF_NIL)
            )]
        );
        assert_eq!(
            condition.filters,
            vec![("end".to_string(), Term::iri(format!("{DOC}#old")))]
        );
    }

    #[test]
    fn test_rejects_malformed_updates() {
        for text in [
            "INSERT DATA { ?x <#p> <#o> }",
            "DELETE { <#a> <#b> <#c> }",
            "INSERT { <#a> <#b> <#c> } WHERE { FILTER (<#a> = <#b>) }",
            "INSERT DATA { <#a> <#b> <#c> } trailing",
        ] {
            let err = parse_update(text, DOC).unwrap_err();
            assert!(matches!(err, PodError::Codec { .. }), "{text}: {err:?}");
        }
    }
}
