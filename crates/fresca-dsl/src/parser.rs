#![allow(clippy::result_large_err)]

use indexmap::IndexMap;
use pest::Parser;
use pest_derive::Parser;

use crate::ast::*;
use crate::errors::ParseError;

#[derive(Parser)]
#[grammar = "grammar.pest"]
struct PiParser;

type Pair<'a> = pest::iterators::Pair<'a, Rule>;

fn span_from(pair: &Pair<'_>) -> Span {
    let s = pair.as_span();
    Span::new(s.start(), s.end())
}

/// Parse a .pi source file into a Program: the declaration table plus the
/// single undeclared (main) process.
pub fn parse(source: &str, filename: &str) -> Result<Program, ParseError> {
    let pairs = PiParser::parse(Rule::program, source).map_err(|e| {
        let (start, end) = match e.location {
            pest::error::InputLocation::Pos(p) => (p, p + 1),
            pest::error::InputLocation::Span((s, e)) => (s, e),
        };
        ParseError::syntax(format!("{e}"), Span::new(start, end), source, filename)
    })?;

    let program_pair = pairs.into_iter().next().expect("grammar yields a program");

    let mut declarations: IndexMap<String, ProcessDecl> = IndexMap::new();
    let mut mains: Vec<(Term, Span)> = Vec::new();

    for item in program_pair.into_inner() {
        match item.as_rule() {
            Rule::declaration => {
                let span = span_from(&item);
                let mut inner = item.into_inner();
                let name = inner.next().expect("declaration name").as_str().to_string();
                let mut params = Vec::new();
                let mut body_pair = inner.next().expect("declaration body or params");
                if body_pair.as_rule() == Rule::param_list {
                    params = body_pair
                        .into_inner()
                        .map(|p| p.as_str().to_string())
                        .collect();
                    body_pair = inner.next().expect("declaration body");
                }
                let body = build_process(body_pair);
                if declarations.contains_key(&name) {
                    return Err(ParseError::Duplicate {
                        name,
                        span: (span.start, span.end - span.start).into(),
                        src: miette::NamedSource::new(filename, source.to_owned()),
                    });
                }
                declarations.insert(name, ProcessDecl { body, params });
            }
            Rule::process => {
                let span = span_from(&item);
                mains.push((build_process(item), span));
            }
            Rule::EOI => {}
            _ => unreachable!("unexpected top-level rule"),
        }
    }

    if mains.is_empty() {
        return Err(ParseError::NoMain);
    }
    if mains.len() > 1 {
        let span = mains[1].1;
        return Err(ParseError::MultipleMain {
            span: (span.start, span.end - span.start).into(),
            src: miette::NamedSource::new(filename, source.to_owned()),
        });
    }

    let (main, _) = mains.into_iter().next().expect("exactly one main");
    Ok(Program { declarations, main })
}

/// Parallel composition; right-associative.
fn build_process(pair: Pair<'_>) -> Term {
    let sums: Vec<Term> = pair.into_inner().map(build_sum).collect();
    fold_right(sums, |left, right| Term::Parallel {
        left: Box::new(left),
        right: Box::new(right),
    })
}

/// Sum; right-associative, binds tighter than parallel.
fn build_sum(pair: Pair<'_>) -> Term {
    let prefixes: Vec<Term> = pair.into_inner().map(build_prefix).collect();
    fold_right(prefixes, |left, right| Term::Sum {
        left: Box::new(left),
        right: Box::new(right),
    })
}

fn fold_right(mut terms: Vec<Term>, combine: impl Fn(Term, Term) -> Term) -> Term {
    let last = terms.pop().expect("grammar guarantees at least one child");
    terms.into_iter().rev().fold(last, |acc, t| combine(t, acc))
}

fn build_prefix(pair: Pair<'_>) -> Term {
    match pair.as_rule() {
        Rule::nil => Term::Nil,
        Rule::restriction => {
            let mut inner = pair.into_inner();
            let name = name_from(inner.next().expect("restriction name"));
            let next = build_prefix(inner.next().expect("restriction body"));
            Term::Restriction {
                name,
                next: Box::new(next),
            }
        }
        Rule::matching => {
            let mut inner = pair.into_inner();
            let left = name_from(inner.next().expect("match lhs"));
            let negate = inner.next().expect("match operator").as_str() == "!=";
            let right = name_from(inner.next().expect("match rhs"));
            let next = build_prefix(inner.next().expect("match body"));
            Term::Match {
                left,
                right,
                negate,
                next: Box::new(next),
            }
        }
        Rule::output => {
            let mut inner = pair.into_inner();
            let channel = name_from(inner.next().expect("output channel"));
            let value = name_from(inner.next().expect("output value"));
            let next = build_prefix(inner.next().expect("output continuation"));
            Term::Output {
                channel,
                value,
                next: Box::new(next),
            }
        }
        Rule::input => {
            let mut inner = pair.into_inner();
            let channel = name_from(inner.next().expect("input channel"));
            let binding = name_from(inner.next().expect("input binding"));
            let next = build_prefix(inner.next().expect("input continuation"));
            Term::Input {
                channel,
                binding,
                next: Box::new(next),
            }
        }
        Rule::paren => build_process(pair.into_inner().next().expect("parenthesised process")),
        Rule::call => {
            let mut inner = pair.into_inner();
            let name = inner.next().expect("call name").as_str().to_string();
            let args = inner
                .next()
                .map(|list| list.into_inner().map(name_from).collect())
                .unwrap_or_default();
            Term::Call { name, args }
        }
        other => unreachable!("unexpected prefix rule: {other:?}"),
    }
}

fn name_from(pair: Pair<'_>) -> Name {
    Name::free(pair.as_str())
}
