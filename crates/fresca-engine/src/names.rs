//! Name handling over process terms: capture-aware substitution, free-name
//! collection, and alpha-conversion with an explicitly threaded counter.

use fresca_dsl::ast::{Name, Term};
use indexmap::IndexSet;

/// Prefix of generated free names (`#1`, `#2`, ...).
pub const FREE_PREFIX: char = '#';
/// Prefix of generated bound names (`&b_0`, and `&1` after normalisation).
pub const BOUND_PREFIX: char = '&';
/// Prefix of marked names, kept verbatim and placed first in the root
/// registers.
pub const MARKED_PREFIX: char = '_';

/// Monotone counter for generated bound names. Threaded through the engine
/// explicitly; one supply per engine instance.
#[derive(Debug, Clone, Default)]
pub struct NameSupply {
    next: usize,
}

impl NameSupply {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh bound name derived from the binder's original text.
    pub fn fresh_bound(&mut self, base: &str) -> Name {
        let name = Name::bound(format!("{BOUND_PREFIX}{base}_{}", self.next));
        self.next += 1;
        name
    }

    /// Snapshot of the counter, for probe conversions that must not consume
    /// indices.
    pub fn mark(&self) -> usize {
        self.next
    }

    pub fn reset(&mut self, mark: usize) {
        self.next = mark;
    }
}

fn replace(slot: &mut Name, old: &Name, new: &Name) {
    if slot == old {
        *slot = new.clone();
    }
}

/// Replaces every occurrence of `old` (exact text and kind) by `new`.
///
/// Binder fields themselves are never rewritten, and subterms where an
/// Input or Restriction rebinds exactly `old` are skipped, so shadowing
/// resolves to the innermost binder.
pub fn substitute(term: &mut Term, old: &Name, new: &Name) {
    match term {
        Term::Nil => {}
        Term::Output {
            channel,
            value,
            next,
        } => {
            replace(channel, old, new);
            replace(value, old, new);
            substitute(next, old, new);
        }
        Term::Input {
            channel,
            binding,
            next,
        } => {
            replace(channel, old, new);
            if binding != old {
                substitute(next, old, new);
            }
        }
        Term::Match {
            left, right, next, ..
        } => {
            replace(left, old, new);
            replace(right, old, new);
            substitute(next, old, new);
        }
        Term::Restriction { name, next } => {
            if name != old {
                substitute(next, old, new);
            }
        }
        Term::Sum { left, right } | Term::Parallel { left, right } => {
            substitute(left, old, new);
            substitute(right, old, new);
        }
        Term::Call { args, .. } => {
            for arg in args {
                replace(arg, old, new);
            }
        }
        Term::Root(inner) => substitute(inner, old, new),
    }
}

/// True when `name` occurs anywhere in `term`, binder positions included.
pub fn appears_in(term: &Term, name: &Name) -> bool {
    match term {
        Term::Nil => false,
        Term::Output {
            channel,
            value,
            next,
        } => channel == name || value == name || appears_in(next, name),
        Term::Input {
            channel,
            binding,
            next,
        } => channel == name || binding == name || appears_in(next, name),
        Term::Match {
            left, right, next, ..
        } => left == name || right == name || appears_in(next, name),
        Term::Restriction { name: bound, next } => bound == name || appears_in(next, name),
        Term::Sum { left, right } | Term::Parallel { left, right } => {
            appears_in(left, name) || appears_in(right, name)
        }
        Term::Call { args, .. } => args.contains(name),
        Term::Root(inner) => appears_in(inner, name),
    }
}

/// Collects the texts of free-kind name occurrences, in first-occurrence
/// order.
pub fn free_names(term: &Term) -> IndexSet<String> {
    let mut out = IndexSet::new();
    collect_free(term, &mut out);
    out
}

fn note(name: &Name, out: &mut IndexSet<String>) {
    if name.is_free() {
        out.insert(name.text.clone());
    }
}

fn collect_free(term: &Term, out: &mut IndexSet<String>) {
    match term {
        Term::Nil => {}
        Term::Output {
            channel,
            value,
            next,
        } => {
            note(channel, out);
            note(value, out);
            collect_free(next, out);
        }
        Term::Input {
            channel,
            binding,
            next,
        } => {
            note(channel, out);
            note(binding, out);
            collect_free(next, out);
        }
        Term::Match {
            left, right, next, ..
        } => {
            note(left, out);
            note(right, out);
            collect_free(next, out);
        }
        Term::Restriction { name, next } => {
            note(name, out);
            collect_free(next, out);
        }
        Term::Sum { left, right } | Term::Parallel { left, right } => {
            collect_free(left, out);
            collect_free(right, out);
        }
        Term::Call { args, .. } => {
            for arg in args {
                note(arg, out);
            }
        }
        Term::Root(inner) => collect_free(inner, out),
    }
}

/// Alpha-converts `term` in place: every Input binding and Restriction name
/// becomes a fresh bound name, substituted through the binder's scope.
/// Top-down, so shadowed binders are renamed by their own visit.
pub fn alpha_convert(term: &mut Term, supply: &mut NameSupply) {
    match term {
        Term::Nil | Term::Call { .. } => {}
        Term::Output { next, .. } | Term::Match { next, .. } => alpha_convert(next, supply),
        Term::Input { binding, next, .. } => {
            let old = binding.clone();
            let fresh = supply.fresh_bound(&old.text);
            *binding = fresh.clone();
            substitute(next, &old, &fresh);
            alpha_convert(next, supply);
        }
        Term::Restriction { name, next } => {
            let old = name.clone();
            let fresh = supply.fresh_bound(&old.text);
            *name = fresh.clone();
            substitute(next, &old, &fresh);
            alpha_convert(next, supply);
        }
        Term::Sum { left, right } | Term::Parallel { left, right } => {
            alpha_convert(left, supply);
            alpha_convert(right, supply);
        }
        Term::Root(inner) => alpha_convert(inner, supply),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fresca_dsl::parse;

    fn main_term(src: &str) -> Term {
        parse(src, "test.pi").expect("parse succeeds").main
    }

    // ---------------------------------------------------------------
    // substitute
    // ---------------------------------------------------------------

    #[test]
    fn substitute_rewrites_matching_occurrences() {
        // a'<b>.a(d).0 with a -> b (bound): both channels rewritten, the
        // value `b` and the binder `d` untouched.
        let mut term = main_term("a'<b>.a(d).0");
        substitute(&mut term, &Name::free("a"), &Name::bound("b"));
        assert_eq!(
            term,
            Term::Output {
                channel: Name::bound("b"),
                value: Name::free("b"),
                next: Box::new(Term::Input {
                    channel: Name::bound("b"),
                    binding: Name::free("d"),
                    next: Box::new(Term::Nil),
                }),
            }
        );
    }

    #[test]
    fn substitute_is_kind_sensitive() {
        let mut term = main_term("a'<b>.(a(d).0 | [a=e]0)");
        // Flip the channels to bound first, then substitute the bound form.
        substitute(&mut term, &Name::free("a"), &Name::bound("a"));
        substitute(&mut term, &Name::bound("a"), &Name::free("b"));
        assert_eq!(term.to_string(), "b'<b>.(b(d).0 | [b=e]0)");
    }

    #[test]
    fn substitute_stops_at_rebinding_restriction() {
        let mut term = main_term("a'<b>.$b.c'<b>.0");
        substitute(&mut term, &Name::free("b"), &Name::free("x"));
        // The value before the restriction is rewritten; the occurrence
        // under $b stays bound to the inner binder.
        assert_eq!(term.to_string(), "a'<x>.$b.c'<b>.0");
    }

    #[test]
    fn substitute_stops_at_rebinding_input() {
        let mut term = main_term("c'<b>.a(b).c'<b>.0");
        substitute(&mut term, &Name::free("b"), &Name::free("x"));
        assert_eq!(term.to_string(), "c'<x>.a(b).c'<b>.0");
    }

    #[test]
    fn substitute_rewrites_call_arguments() {
        let mut term = main_term("P(a, b, a)");
        substitute(&mut term, &Name::free("a"), &Name::free("#1"));
        assert_eq!(term.to_string(), "P(#1, b, #1)");
    }

    #[test]
    fn substitute_missing_name_is_noop() {
        let mut term = main_term("a(b).c'<d>.0");
        let before = term.clone();
        substitute(&mut term, &Name::free("zz"), &Name::free("#1"));
        assert_eq!(term, before);
    }

    // ---------------------------------------------------------------
    // free_names / appears_in
    // ---------------------------------------------------------------

    #[test]
    fn free_names_in_first_occurrence_order() {
        let term = main_term("a'<b>.c(d).[e=b]0");
        let names = free_names(&term);
        let fns: Vec<&str> = names.iter().map(String::as_str).collect();
        assert_eq!(fns, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn free_names_skip_bound_occurrences() {
        let mut term = main_term("a(b).b'<c>.0");
        let mut supply = NameSupply::new();
        alpha_convert(&mut term, &mut supply);
        let names = free_names(&term);
        let fns: Vec<&str> = names.iter().map(String::as_str).collect();
        assert_eq!(fns, vec!["a", "c"]);
    }

    #[test]
    fn appears_in_sees_binders() {
        let term = main_term("$a.0");
        let mut converted = term.clone();
        alpha_convert(&mut converted, &mut NameSupply::new());
        assert!(appears_in(&term, &Name::free("a")));
        assert!(appears_in(&converted, &Name::bound("&a_0")));
        assert!(!appears_in(&term, &Name::bound("a")));
    }

    // ---------------------------------------------------------------
    // alpha_convert
    // ---------------------------------------------------------------

    #[test]
    fn alpha_conversion_numbers_binders_in_visit_order() {
        let mut term = main_term("a(b).$a.b(a).$a.(b'<a>.0 | $b.(a(b).0 | c(d).0))");
        let mut supply = NameSupply::new();
        alpha_convert(&mut term, &mut supply);
        assert_eq!(
            term.to_string(),
            "a(&b_0).$&a_1.&b_0(&a_2).$&a_3.(&b_0'<&a_3>.0 | $&b_4.(&a_3(&b_5).0 | c(&d_6).0))"
        );
        assert_eq!(supply.mark(), 7);
    }

    #[test]
    fn alpha_conversion_resolves_shadowing_to_innermost_binder() {
        let mut term = main_term("a(x).$x.x'<x>.0");
        alpha_convert(&mut term, &mut NameSupply::new());
        assert_eq!(term.to_string(), "a(&x_0).$&x_1.&x_1'<&x_1>.0");
    }

    #[test]
    fn mark_and_reset_make_probe_conversions_free() {
        let mut supply = NameSupply::new();
        let mut probe = main_term("a(b).0");
        let mark = supply.mark();
        alpha_convert(&mut probe, &mut supply);
        supply.reset(mark);
        let mut term = main_term("c(d).0");
        alpha_convert(&mut term, &mut supply);
        assert_eq!(term.to_string(), "c(&d_0).0");
    }
}
