use std::fmt;

use indexmap::IndexMap;

/// Source span for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Whether a name is observable (free) or under a binder (bound).
///
/// Parsed names are always `Free`; the engine flips names to `Bound` when
/// alpha-conversion or scope extrusion puts them under a binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum NameKind {
    #[default]
    Free,
    Bound,
}

/// A pi-calculus name: its text plus its binding kind.
///
/// Equality is on both fields; two names with the same text but different
/// kinds are distinct everywhere in the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Name {
    pub text: String,
    pub kind: NameKind,
}

impl Name {
    pub fn free(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NameKind::Free,
        }
    }

    pub fn bound(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NameKind::Bound,
        }
    }

    pub fn is_free(&self) -> bool {
        self.kind == NameKind::Free
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A pi-calculus process term. Owned tree; sharing is by explicit clone.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum Term {
    /// Inaction, `0`.
    Nil,
    /// Output prefix, `a'<b>.P`.
    Output {
        channel: Name,
        value: Name,
        next: Box<Term>,
    },
    /// Input prefix, `a(b).P`; `binding` binds in `next`.
    Input {
        channel: Name,
        binding: Name,
        next: Box<Term>,
    },
    /// Match `[a=b]P`, or mismatch `[a!=b]P` when `negate` is set.
    Match {
        left: Name,
        right: Name,
        negate: bool,
        next: Box<Term>,
    },
    /// Restriction, `$a.P`; `name` binds in `next`.
    Restriction { name: Name, next: Box<Term> },
    /// Nondeterministic choice, `P + Q`.
    Sum { left: Box<Term>, right: Box<Term> },
    /// Parallel composition, `P | Q`.
    Parallel { left: Box<Term>, right: Box<Term> },
    /// Invocation of a declared process, `P` or `P(a,b)`.
    Call { name: String, args: Vec<Name> },
    /// Sentinel wrapping the top-level term only. Canonicalization passes
    /// that replace their argument node rely on the root never changing.
    Root(Box<Term>),
}

impl Term {
    pub fn root(inner: Term) -> Self {
        Term::Root(Box::new(inner))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Term::Nil)
    }
}

/// The canonical rendering of a term back into surface syntax. This string
/// doubles as the process half of a configuration key, so it must be
/// injective on canonical terms.
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Nil => write!(f, "0"),
            Term::Output {
                channel,
                value,
                next,
            } => write!(f, "{channel}'<{value}>.{next}"),
            Term::Input {
                channel,
                binding,
                next,
            } => write!(f, "{channel}({binding}).{next}"),
            Term::Match {
                left,
                right,
                negate,
                next,
            } => {
                let op = if *negate { "!=" } else { "=" };
                write!(f, "[{left}{op}{right}]{next}")
            }
            Term::Restriction { name, next } => write!(f, "${name}.{next}"),
            Term::Sum { left, right } => write!(f, "({left} + {right})"),
            Term::Parallel { left, right } => write!(f, "({left} | {right})"),
            Term::Call { name, args } => {
                if args.is_empty() {
                    write!(f, "{name}")
                } else {
                    let args: Vec<String> = args.iter().map(|a| a.text.clone()).collect();
                    write!(f, "{}({})", name, args.join(", "))
                }
            }
            Term::Root(inner) => write!(f, "{inner}"),
        }
    }
}

/// A declared process: `P(x,y) = body`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct ProcessDecl {
    pub body: Term,
    pub params: Vec<String>,
}

/// A parsed program: the declaration table and the single main process.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Program {
    pub declarations: IndexMap<String, ProcessDecl>,
    pub main: Term,
}
