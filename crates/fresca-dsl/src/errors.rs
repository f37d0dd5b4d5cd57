use miette::Diagnostic;
use thiserror::Error;

use crate::ast::Span;

#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("Syntax error: {message}")]
    #[diagnostic(code(fresca::parse::syntax))]
    Syntax {
        message: String,
        #[label("here")]
        span: miette::SourceSpan,
        #[source_code]
        src: miette::NamedSource<String>,
    },

    #[error("Duplicate declaration: {name}")]
    #[diagnostic(code(fresca::parse::duplicate))]
    Duplicate {
        name: String,
        #[label("redeclared here")]
        span: miette::SourceSpan,
        #[source_code]
        src: miette::NamedSource<String>,
    },

    #[error("a process must be undeclared to initialise the program")]
    #[diagnostic(
        code(fresca::parse::no_main),
        help("add a line holding a process expression, e.g. `a(b).0`")
    )]
    NoMain,

    #[error("there cannot be more than one undeclared processes")]
    #[diagnostic(code(fresca::parse::multiple_main))]
    MultipleMain {
        #[label("second undeclared process")]
        span: miette::SourceSpan,
        #[source_code]
        src: miette::NamedSource<String>,
    },
}

impl ParseError {
    pub fn syntax(message: impl Into<String>, span: Span, source: &str, filename: &str) -> Self {
        ParseError::Syntax {
            message: message.into(),
            span: (span.start, span.end.saturating_sub(span.start)).into(),
            src: miette::NamedSource::new(filename, source.to_owned()),
        }
    }
}
