//! Structural congruence normalisation. Every configuration is reduced to a
//! canonical representative before it is compared or stored, so that
//! structurally congruent states collapse to one.

use std::mem;

use fresca_dsl::ast::{Name, NameKind, Term};
use indexmap::{IndexMap, IndexSet};

use crate::names::{appears_in, free_names, substitute, BOUND_PREFIX, FREE_PREFIX};
use crate::transition::Configuration;

/// Rewrites `conf` into its canonical form. The passes run in a fixed
/// order; each later pass relies on the invariants established by the
/// earlier ones.
pub fn canonicalize(conf: &mut Configuration, disable_gc: bool) {
    if !disable_gc {
        garbage_collect(conf);
    }

    map_term(&mut conf.term, rm_res);
    map_term(&mut conf.term, scope_res);

    map_term(&mut conf.term, normalise_nil);
    normalise_fresh_names(conf);
    normalise_bound_names(conf);

    map_term(&mut conf.term, sort_sum_par);
    map_term(&mut conf.term, scope_res);
    map_term(&mut conf.term, sort_res);
}

/// The identity of a canonical configuration: register rendering followed
/// by the term rendering.
pub fn configuration_key(conf: &Configuration) -> String {
    format!("{}{}", conf.registers, conf.term)
}

fn map_term(term: &mut Term, pass: impl FnOnce(Term) -> Term) {
    let owned = mem::replace(term, Term::Nil);
    *term = pass(owned);
}

/// Drops register entries whose occupant no longer occurs free in the term.
fn garbage_collect(conf: &mut Configuration) {
    let fns = free_names(&conf.term);
    conf.registers.retain(|name| fns.contains(name));
}

/// Removes restrictions whose name does not appear in their scope.
fn rm_res(term: Term) -> Term {
    match term {
        Term::Nil | Term::Call { .. } => term,
        Term::Output {
            channel,
            value,
            next,
        } => Term::Output {
            channel,
            value,
            next: Box::new(rm_res(*next)),
        },
        Term::Input {
            channel,
            binding,
            next,
        } => Term::Input {
            channel,
            binding,
            next: Box::new(rm_res(*next)),
        },
        Term::Match {
            left,
            right,
            negate,
            next,
        } => Term::Match {
            left,
            right,
            negate,
            next: Box::new(rm_res(*next)),
        },
        Term::Restriction { name, next } => {
            let next = rm_res(*next);
            if appears_in(&next, &name) {
                Term::Restriction {
                    name,
                    next: Box::new(next),
                }
            } else {
                next
            }
        }
        Term::Sum { left, right } => Term::Sum {
            left: Box::new(rm_res(*left)),
            right: Box::new(rm_res(*right)),
        },
        Term::Parallel { left, right } => Term::Parallel {
            left: Box::new(rm_res(*left)),
            right: Box::new(rm_res(*right)),
        },
        Term::Root(inner) => Term::root(rm_res(*inner)),
    }
}

/// Narrows restriction scopes: a restriction over a composition is pushed
/// into whichever side its name occurs in, kept when both sides use it,
/// and dropped when neither does.
fn scope_res(term: Term) -> Term {
    match term {
        Term::Nil | Term::Call { .. } => term,
        Term::Output {
            channel,
            value,
            next,
        } => Term::Output {
            channel,
            value,
            next: Box::new(scope_res(*next)),
        },
        Term::Input {
            channel,
            binding,
            next,
        } => Term::Input {
            channel,
            binding,
            next: Box::new(scope_res(*next)),
        },
        Term::Match {
            left,
            right,
            negate,
            next,
        } => Term::Match {
            left,
            right,
            negate,
            next: Box::new(scope_res(*next)),
        },
        Term::Restriction { name, next } => match scope_res(*next) {
            Term::Parallel { left, right } => {
                narrow(name, *left, *right, |left, right| Term::Parallel {
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }
            Term::Sum { left, right } => narrow(name, *left, *right, |left, right| Term::Sum {
                left: Box::new(left),
                right: Box::new(right),
            }),
            next => Term::Restriction {
                name,
                next: Box::new(next),
            },
        },
        Term::Sum { left, right } => Term::Sum {
            left: Box::new(scope_res(*left)),
            right: Box::new(scope_res(*right)),
        },
        Term::Parallel { left, right } => Term::Parallel {
            left: Box::new(scope_res(*left)),
            right: Box::new(scope_res(*right)),
        },
        Term::Root(inner) => Term::root(scope_res(*inner)),
    }
}

fn narrow(name: Name, left: Term, right: Term, compose: impl Fn(Term, Term) -> Term) -> Term {
    let in_left = appears_in(&left, &name);
    let in_right = appears_in(&right, &name);
    match (in_left, in_right) {
        (false, false) => compose(left, right),
        (true, true) => Term::Restriction {
            name,
            next: Box::new(compose(left, right)),
        },
        (false, true) => compose(
            left,
            scope_res(Term::Restriction {
                name,
                next: Box::new(right),
            }),
        ),
        (true, false) => compose(
            scope_res(Term::Restriction {
                name,
                next: Box::new(left),
            }),
            right,
        ),
    }
}

/// Collapses inert subterms: a restriction over nil is nil, and nil is the
/// unit of parallel composition.
fn normalise_nil(term: Term) -> Term {
    match term {
        Term::Nil | Term::Call { .. } => term,
        Term::Output {
            channel,
            value,
            next,
        } => Term::Output {
            channel,
            value,
            next: Box::new(normalise_nil(*next)),
        },
        Term::Input {
            channel,
            binding,
            next,
        } => Term::Input {
            channel,
            binding,
            next: Box::new(normalise_nil(*next)),
        },
        Term::Match {
            left,
            right,
            negate,
            next,
        } => Term::Match {
            left,
            right,
            negate,
            next: Box::new(normalise_nil(*next)),
        },
        Term::Restriction { name, next } => {
            let next = normalise_nil(*next);
            if next.is_nil() {
                Term::Nil
            } else {
                Term::Restriction {
                    name,
                    next: Box::new(next),
                }
            }
        }
        Term::Sum { left, right } => Term::Sum {
            left: Box::new(normalise_nil(*left)),
            right: Box::new(normalise_nil(*right)),
        },
        Term::Parallel { left, right } => {
            let left = normalise_nil(*left);
            let right = normalise_nil(*right);
            if left.is_nil() {
                right
            } else if right.is_nil() {
                left
            } else {
                Term::Parallel {
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
        }
        Term::Root(inner) => Term::root(normalise_nil(*inner)),
    }
}

/// Renames bound-flavoured register occupants (`&`-prefixed) to generated
/// `#k` names, avoiding every name already held in a register, and rewrites
/// their free occurrences in the term.
fn normalise_fresh_names(conf: &mut Configuration) {
    let used: IndexSet<String> = conf
        .registers
        .labels()
        .into_iter()
        .filter_map(|label| conf.registers.name_at(label).map(str::to_owned))
        .collect();

    let mut counter = 1;
    for label in conf.registers.labels() {
        let Some(name) = conf.registers.name_at(label).map(str::to_owned) else {
            continue;
        };
        if !name.starts_with(BOUND_PREFIX) {
            continue;
        }
        let mut generated = format!("{FREE_PREFIX}{counter}");
        while used.contains(&generated) {
            counter += 1;
            generated = format!("{FREE_PREFIX}{counter}");
        }
        counter += 1;

        substitute(
            &mut conf.term,
            &Name::free(name),
            &Name::free(generated.clone()),
        );
        conf.registers.set(label, generated);
    }
}

/// Renames bound names to `&k` in order of first occurrence: first the
/// names occurring at action positions, then the restriction binders, then
/// any register occupants carrying a renamed name.
fn normalise_bound_names(conf: &mut Configuration) {
    let mut renaming = BoundRenaming::default();
    rename_bound(&mut conf.term, &mut renaming, Pass::Actions);
    rename_bound(&mut conf.term, &mut renaming, Pass::Binders);

    for label in conf.registers.labels() {
        let renamed = conf
            .registers
            .name_at(label)
            .and_then(|name| renaming.mapping.get(name))
            .cloned();
        if let Some(new_name) = renamed {
            conf.registers.set(label, new_name);
        }
    }
}

#[derive(Default)]
struct BoundRenaming {
    counter: usize,
    mapping: IndexMap<String, String>,
}

impl BoundRenaming {
    fn rename(&mut self, name: &mut Name) {
        if name.kind != NameKind::Bound {
            return;
        }
        if let Some(new_name) = self.mapping.get(&name.text) {
            name.text = new_name.clone();
            return;
        }
        self.counter += 1;
        let new_name = format!("{BOUND_PREFIX}{}", self.counter);
        self.mapping.insert(mem::take(&mut name.text), new_name.clone());
        name.text = new_name;
    }
}

#[derive(Clone, Copy)]
enum Pass {
    Actions,
    Binders,
}

fn rename_bound(term: &mut Term, renaming: &mut BoundRenaming, pass: Pass) {
    match term {
        Term::Nil => {}
        Term::Output {
            channel,
            value,
            next,
        } => {
            if matches!(pass, Pass::Actions) {
                renaming.rename(channel);
                renaming.rename(value);
            }
            rename_bound(next, renaming, pass);
        }
        Term::Input {
            channel,
            binding,
            next,
        } => {
            if matches!(pass, Pass::Actions) {
                renaming.rename(channel);
                renaming.rename(binding);
            }
            rename_bound(next, renaming, pass);
        }
        Term::Match {
            left, right, next, ..
        } => {
            if matches!(pass, Pass::Actions) {
                renaming.rename(left);
                renaming.rename(right);
            }
            rename_bound(next, renaming, pass);
        }
        Term::Restriction { name, next } => {
            if matches!(pass, Pass::Binders) {
                renaming.rename(name);
            }
            rename_bound(next, renaming, pass);
        }
        Term::Sum { left, right } | Term::Parallel { left, right } => {
            rename_bound(left, renaming, pass);
            rename_bound(right, renaming, pass);
        }
        Term::Call { args, .. } => {
            if matches!(pass, Pass::Actions) {
                for arg in args {
                    renaming.rename(arg);
                }
            }
        }
        Term::Root(inner) => rename_bound(inner, renaming, pass),
    }
}

/// Flattens chains of sums and parallels, sorts the operands by their
/// rendering, and rebuilds a right-leaning chain.
fn sort_sum_par(term: Term) -> Term {
    match term {
        Term::Nil | Term::Call { .. } => term,
        Term::Output {
            channel,
            value,
            next,
        } => Term::Output {
            channel,
            value,
            next: Box::new(sort_sum_par(*next)),
        },
        Term::Input {
            channel,
            binding,
            next,
        } => Term::Input {
            channel,
            binding,
            next: Box::new(sort_sum_par(*next)),
        },
        Term::Match {
            left,
            right,
            negate,
            next,
        } => Term::Match {
            left,
            right,
            negate,
            next: Box::new(sort_sum_par(*next)),
        },
        Term::Restriction { name, next } => Term::Restriction {
            name,
            next: Box::new(sort_sum_par(*next)),
        },
        Term::Sum { .. } => {
            let children = sorted_operands(term, &flatten_sum);
            rebuild(children, |left, right| Term::Sum {
                left: Box::new(left),
                right: Box::new(right),
            })
        }
        Term::Parallel { .. } => {
            let children = sorted_operands(term, &flatten_par);
            rebuild(children, |left, right| Term::Parallel {
                left: Box::new(left),
                right: Box::new(right),
            })
        }
        Term::Root(inner) => Term::root(sort_sum_par(*inner)),
    }
}

fn sorted_operands(term: Term, flatten: &dyn Fn(Term, &mut Vec<Term>)) -> Vec<Term> {
    let mut children = Vec::new();
    flatten(term, &mut children);
    let mut children: Vec<Term> = children.into_iter().map(sort_sum_par).collect();
    children.sort_by_key(|child| child.to_string());
    children
}

fn rebuild(children: Vec<Term>, compose: impl Fn(Term, Term) -> Term) -> Term {
    let mut iter = children.into_iter().rev();
    // Flattening a composition always yields at least two operands.
    let mut result = match iter.next() {
        Some(last) => last,
        None => Term::Nil,
    };
    for child in iter {
        result = compose(child, result);
    }
    result
}

fn flatten_sum(term: Term, out: &mut Vec<Term>) {
    if let Term::Sum { left, right } = term {
        flatten_sum(*left, out);
        flatten_sum(*right, out);
    } else {
        out.push(term);
    }
}

fn flatten_par(term: Term, out: &mut Vec<Term>) {
    if let Term::Parallel { left, right } = term {
        flatten_par(*left, out);
        flatten_par(*right, out);
    } else {
        out.push(term);
    }
}

/// Sorts consecutive restrictions by the text of their names.
fn sort_res(term: Term) -> Term {
    match term {
        Term::Nil | Term::Call { .. } => term,
        Term::Output {
            channel,
            value,
            next,
        } => Term::Output {
            channel,
            value,
            next: Box::new(sort_res(*next)),
        },
        Term::Input {
            channel,
            binding,
            next,
        } => Term::Input {
            channel,
            binding,
            next: Box::new(sort_res(*next)),
        },
        Term::Match {
            left,
            right,
            negate,
            next,
        } => Term::Match {
            left,
            right,
            negate,
            next: Box::new(sort_res(*next)),
        },
        Term::Restriction { name, next } => {
            let mut names = vec![name];
            let mut tail = *next;
            while let Term::Restriction { name, next } = tail {
                names.push(name);
                tail = *next;
            }
            names.sort_by(|a, b| a.text.cmp(&b.text));
            let mut result = sort_res(tail);
            for name in names.into_iter().rev() {
                result = Term::Restriction {
                    name,
                    next: Box::new(result),
                };
            }
            result
        }
        Term::Sum { left, right } => Term::Sum {
            left: Box::new(sort_res(*left)),
            right: Box::new(sort_res(*right)),
        },
        Term::Parallel { left, right } => Term::Parallel {
            left: Box::new(sort_res(*left)),
            right: Box::new(sort_res(*right)),
        },
        Term::Root(inner) => Term::root(sort_res(*inner)),
    }
}
