//! The double-transition relation of fresh-register automata over
//! pi-calculus configurations.

use std::collections::BTreeMap;
use std::fmt;

use fresca_dsl::ast::{Name, ProcessDecl, Term};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::names::{alpha_convert, free_names, substitute, NameSupply, FREE_PREFIX, MARKED_PREFIX};
use crate::registers::Registers;

/// The kind of one symbol of a transition label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum SymbolKind {
    #[default]
    Tau,
    Input,
    Output,
    FreshInput,
    FreshOutput,
    Known,
}

/// One half of a transition label: a kind plus a register label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub index: usize,
}

impl Symbol {
    pub fn new(kind: SymbolKind, index: usize) -> Self {
        Self { kind, index }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SymbolKind::Input => write!(f, "{} ", self.index),
            SymbolKind::Output => write!(f, "{}'", self.index),
            SymbolKind::FreshInput => write!(f, "{}*", self.index),
            SymbolKind::FreshOutput => write!(f, "{}^", self.index),
            SymbolKind::Tau => write!(f, "t   "),
            SymbolKind::Known => write!(f, "{} ", self.index),
        }
    }
}

/// A double-transition label: the channel symbol and the value symbol.
/// Tau labels leave both symbols at their default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Label {
    pub channel: Symbol,
    pub value: Symbol,
}

impl Label {
    pub fn tau() -> Self {
        Self::default()
    }

    pub fn is_tau(&self) -> bool {
        self.channel.kind == SymbolKind::Tau
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_tau() {
            write!(f, "t   ")
        } else {
            write!(f, "{}{}", self.channel, self.value)
        }
    }
}

/// A configuration: register assignment, process term, and the label of the
/// transition that produced it (default label on the root).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Configuration {
    pub registers: Registers,
    pub term: Term,
    pub label: Label,
}

/// The transition engine: the declaration table, the bound-name supply, and
/// the configured register bound.
#[derive(Debug)]
pub struct Semantics {
    decls: IndexMap<String, ProcessDecl>,
    supply: NameSupply,
    register_size: usize,
}

impl Semantics {
    pub fn new(decls: IndexMap<String, ProcessDecl>, register_size: usize) -> Self {
        Self {
            decls,
            supply: NameSupply::new(),
            register_size,
        }
    }

    /// Builds the root configuration: alpha-converts the main term, gathers
    /// free names from it and from every declared body (formals temporarily
    /// flipped to bound so they do not count), then loads the registers.
    /// Marked names (`_`-prefixed) come first and keep their text; the rest
    /// are replaced by generated `#i` names, in the main term and in every
    /// declared body.
    pub fn root_configuration(&mut self, main: Term) -> Configuration {
        let mut process = Term::root(main);
        alpha_convert(&mut process, &mut self.supply);

        let mut fns = free_names(&process);
        for decl in self.decls.values() {
            // Probe copy: alpha-convert to resolve scope, without consuming
            // bound-name indices.
            let mut probe = decl.body.clone();
            let mark = self.supply.mark();
            alpha_convert(&mut probe, &mut self.supply);
            self.supply.reset(mark);
            for param in &decl.params {
                substitute(&mut probe, &Name::free(param), &Name::bound(param));
            }
            fns.extend(free_names(&probe));
        }

        let mut marked: Vec<&String> = fns
            .iter()
            .filter(|n| n.starts_with(MARKED_PREFIX))
            .collect();
        let mut fresh: Vec<&String> = fns
            .iter()
            .filter(|n| !n.starts_with(MARKED_PREFIX))
            .collect();
        marked.sort();
        fresh.sort();
        let marked: Vec<String> = marked.into_iter().cloned().collect();
        let fresh: Vec<String> = fresh.into_iter().cloned().collect();

        let mut slots = BTreeMap::new();
        let mut reg_index = 1;
        for name in &marked {
            slots.insert(reg_index, name.clone());
            reg_index += 1;
        }
        for (i, name) in fresh.iter().enumerate() {
            let generated = format!("{FREE_PREFIX}{}", i + 1);
            slots.insert(reg_index, generated.clone());
            reg_index += 1;

            let old = Name::free(name.clone());
            let new = Name::free(generated);
            substitute(&mut process, &old, &new);

            for decl in self.decls.values_mut() {
                // Protect formals from capture while rewriting the body.
                let params = decl.params.clone();
                for param in &params {
                    substitute(&mut decl.body, &Name::free(param), &Name::bound(param));
                }
                substitute(&mut decl.body, &old, &new);
                for param in &params {
                    substitute(&mut decl.body, &Name::bound(param), &Name::free(param));
                }
            }
        }

        Configuration {
            registers: Registers::new(self.register_size, slots),
            term: process,
            label: Label::default(),
        }
    }

    /// All transitions enabled in `conf`, in rule order.
    pub fn successors(&mut self, conf: &Configuration) -> Vec<Configuration> {
        let mut unfolding = IndexSet::new();
        self.step(conf.clone(), &mut unfolding)
    }

    /// One level of the SOS rules. `unfolding` carries the names of process
    /// declarations currently being expanded with no intervening action
    /// prefix; re-entry on the same name is cut off regardless of the
    /// arguments.
    fn step(&mut self, conf: Configuration, unfolding: &mut IndexSet<String>) -> Vec<Configuration> {
        let Configuration {
            registers,
            term,
            label,
        } = conf;
        match term {
            Term::Nil => Vec::new(),

            // DBLINP: one successor per register entry plus the fresh input.
            Term::Input {
                channel,
                binding,
                next,
            } => {
                let Some(chan_label) = registers.label_of(&channel.text) else {
                    return Vec::new();
                };
                let channel_symbol = Symbol::new(SymbolKind::Input, chan_label);

                let mut confs = Vec::new();
                for slot in registers.labels() {
                    let occupant = match registers.name_at(slot) {
                        Some(n) => Name::free(n),
                        None => continue,
                    };
                    let mut residual = (*next).clone();
                    substitute(&mut residual, &binding, &occupant);
                    confs.push(Configuration {
                        registers: registers.clone(),
                        term: residual,
                        label: Label {
                            channel: channel_symbol,
                            value: Symbol::new(SymbolKind::Known, slot),
                        },
                    });
                }

                // Fresh input: instantiate the binding with its own text as
                // a free name, placed at the lowest slot not used by the
                // residual.
                let mut residual = *next;
                let fresh = Name::free(binding.text.clone());
                substitute(&mut residual, &binding, &fresh);
                let avoid = free_names(&residual);
                let mut fresh_registers = registers;
                let slot = fresh_registers.update_min(&binding.text, &avoid);
                confs.push(Configuration {
                    registers: fresh_registers,
                    term: residual,
                    label: Label {
                        channel: channel_symbol,
                        value: Symbol::new(SymbolKind::FreshInput, slot),
                    },
                });
                confs
            }

            // DBLOUT: a single successor with a known value.
            Term::Output {
                channel,
                value,
                next,
            } => {
                let Some(chan_label) = registers.label_of(&channel.text) else {
                    return Vec::new();
                };
                let Some(value_label) = registers.label_of(&value.text) else {
                    return Vec::new();
                };
                vec![Configuration {
                    registers,
                    term: *next,
                    label: Label {
                        channel: Symbol::new(SymbolKind::Output, chan_label),
                        value: Symbol::new(SymbolKind::Known, value_label),
                    },
                }]
            }

            // MATCH: guard by full name equality, then pass through.
            Term::Match {
                left,
                right,
                negate,
                next,
            } => {
                if (left == right) != negate {
                    self.step(
                        Configuration {
                            registers,
                            term: *next,
                            label,
                        },
                        unfolding,
                    )
                } else {
                    Vec::new()
                }
            }

            // RES and OPEN.
            Term::Restriction { name, next } => {
                let base_registers = registers.clone();
                let mut inner_registers = registers;
                let res_label = inner_registers.update_max(&name.text);

                let tconfs = self.step(
                    Configuration {
                        registers: inner_registers,
                        term: *next,
                        label: Label::default(),
                    },
                    unfolding,
                );

                let mut confs = Vec::new();
                for mut c in tconfs {
                    let touches_channel = c.label.channel.index == res_label;
                    let touches_value = c.label.value.index == res_label;

                    if !touches_channel && !touches_value {
                        // RES: the restricted name stayed private.
                        c.term = Term::Restriction {
                            name: name.clone(),
                            next: Box::new(c.term),
                        };
                        c.registers.remove_max();
                        substitute(
                            &mut c.term,
                            &Name::free(name.text.clone()),
                            &Name::bound(name.text.clone()),
                        );
                        confs.push(c);
                    } else if c.label.channel.kind == SymbolKind::Output
                        && c.label.value.kind == SymbolKind::Known
                        && !touches_channel
                        && touches_value
                    {
                        // OPEN: the restricted name escapes as a fresh
                        // output, re-minimised against the residual.
                        c.registers = base_registers.clone();
                        let avoid = free_names(&c.term);
                        let slot = c.registers.update_min(&name.text, &avoid);
                        c.label.value = Symbol::new(SymbolKind::FreshOutput, slot);
                        substitute(
                            &mut c.term,
                            &Name::bound(name.text.clone()),
                            &Name::free(name.text.clone()),
                        );
                        confs.push(c);
                    }
                }
                confs
            }

            // REC: unfold the declared body. Unknown names and arity
            // mismatches yield no successors; so does re-entry on a name
            // already being unfolded.
            Term::Call { name, args } => {
                let Some(decl) = self.decls.get(&name) else {
                    return Vec::new();
                };
                if decl.params.len() != args.len() {
                    return Vec::new();
                }
                if unfolding.contains(&name) {
                    return Vec::new();
                }
                let mut body = decl.body.clone();
                let params = decl.params.clone();
                for (formal, actual) in params.iter().zip(&args) {
                    substitute(&mut body, &Name::free(formal), actual);
                }
                alpha_convert(&mut body, &mut self.supply);

                unfolding.insert(name.clone());
                let tconfs = self.step(
                    Configuration {
                        registers,
                        term: body,
                        label,
                    },
                    unfolding,
                );
                unfolding.shift_remove(&name);
                tconfs
            }

            // SUM: union of both branches.
            Term::Sum { left, right } => {
                let mut confs = self.step(
                    Configuration {
                        registers: registers.clone(),
                        term: *left,
                        label,
                    },
                    unfolding,
                );
                confs.extend(self.step(
                    Configuration {
                        registers,
                        term: *right,
                        label,
                    },
                    unfolding,
                ));
                confs
            }

            // PAR1/PAR2, COMM, CLOSE.
            Term::Parallel { left, right } => {
                self.parallel_step(registers, *left, *right, unfolding)
            }

            Term::Root(inner) => {
                let tconfs = self.step(
                    Configuration {
                        registers,
                        term: *inner,
                        label,
                    },
                    unfolding,
                );
                tconfs
                    .into_iter()
                    .map(|mut c| {
                        c.term = Term::root(c.term);
                        c
                    })
                    .collect()
            }
        }
    }

    fn parallel_step(
        &mut self,
        registers: Registers,
        left: Term,
        right: Term,
        unfolding: &mut IndexSet<String>,
    ) -> Vec<Configuration> {
        let base_registers = registers.clone();

        // PAR1_L / PAR2_L: left component moves, fresh labels re-minimised
        // against the free names of both components.
        let ltrans = self.step(
            Configuration {
                registers: registers.clone(),
                term: left.clone(),
                label: Label::default(),
            },
            unfolding,
        );
        let lconfs = lift_component(ltrans, &base_registers, &right, Side::Left);

        // PAR1_R / PAR2_R.
        let rtrans = self.step(
            Configuration {
                registers: registers.clone(),
                term: right.clone(),
                label: Label::default(),
            },
            unfolding,
        );
        let rconfs = lift_component(rtrans, &base_registers, &left, Side::Right);

        let mut confs: Vec<Configuration> = Vec::new();
        confs.extend(lconfs.iter().cloned());
        confs.extend(rconfs.iter().cloned());

        // COMM_L: left outputs a known value the right inputs.
        for l in &lconfs {
            for r in &rconfs {
                if symbol_kinds(l) == (SymbolKind::Output, SymbolKind::Known)
                    && symbol_kinds(r) == (SymbolKind::Input, SymbolKind::Known)
                    && same_label_indices(l, r)
                {
                    if let Some(comm) = communicate(l, r, &base_registers) {
                        confs.push(comm);
                    }
                }
            }
        }
        // COMM_R: the mirror image.
        for l in &lconfs {
            for r in &rconfs {
                if symbol_kinds(l) == (SymbolKind::Input, SymbolKind::Known)
                    && symbol_kinds(r) == (SymbolKind::Output, SymbolKind::Known)
                    && same_label_indices(l, r)
                {
                    if let Some(comm) = communicate(l, r, &base_registers) {
                        confs.push(comm);
                    }
                }
            }
        }

        // CLOSE: reserve slot 1 on both sides and look for a fresh output
        // meeting a fresh input on the same channel.
        let mut shifted = base_registers.clone();
        shifted.add_placeholder();

        let cltrans = self.step(
            Configuration {
                registers: shifted.clone(),
                term: left,
                label: Label::default(),
            },
            unfolding,
        );
        let crtrans = self.step(
            Configuration {
                registers: shifted,
                term: right,
                label: Label::default(),
            },
            unfolding,
        );

        for l in &cltrans {
            for r in &crtrans {
                if symbol_kinds(l) == (SymbolKind::Output, SymbolKind::FreshOutput)
                    && l.label.value.index == 1
                    && symbol_kinds(r) == (SymbolKind::Input, SymbolKind::FreshInput)
                    && r.label.value.index == 1
                    && l.label.channel.index == r.label.channel.index
                {
                    if let Some(close) = close_scope(l, r, &base_registers, Side::Left) {
                        confs.push(close);
                    }
                }
                if symbol_kinds(l) == (SymbolKind::Input, SymbolKind::FreshInput)
                    && l.label.value.index == 1
                    && symbol_kinds(r) == (SymbolKind::Output, SymbolKind::FreshOutput)
                    && r.label.value.index == 1
                    && l.label.channel.index == r.label.channel.index
                {
                    if let Some(close) = close_scope(l, r, &base_registers, Side::Right) {
                        confs.push(close);
                    }
                }
            }
        }

        confs
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

fn symbol_kinds(conf: &Configuration) -> (SymbolKind, SymbolKind) {
    (conf.label.channel.kind, conf.label.value.kind)
}

fn same_label_indices(a: &Configuration, b: &Configuration) -> bool {
    a.label.channel.index == b.label.channel.index && a.label.value.index == b.label.value.index
}

/// Lifts component transitions over the parallel composition, re-minimising
/// fresh labels against the free names of both components.
fn lift_component(
    trans: Vec<Configuration>,
    base_registers: &Registers,
    other: &Term,
    side: Side,
) -> Vec<Configuration> {
    let mut lifted = Vec::new();
    for c in trans {
        let mut label = c.label;
        let registers;
        if matches!(
            label.value.kind,
            SymbolKind::FreshInput | SymbolKind::FreshOutput
        ) {
            let Some(occupant) = c.registers.name_at(label.value.index).map(str::to_owned) else {
                continue;
            };
            let mut avoid = free_names(&c.term);
            avoid.extend(free_names(other));
            let mut regs = base_registers.clone();
            label.value.index = regs.update_min(&occupant, &avoid);
            registers = regs;
        } else {
            registers = c.registers;
        }
        let term = match side {
            Side::Left => Term::Parallel {
                left: Box::new(c.term),
                right: Box::new(other.clone()),
            },
            Side::Right => Term::Parallel {
                left: Box::new(other.clone()),
                right: Box::new(c.term),
            },
        };
        lifted.push(Configuration {
            registers,
            term,
            label,
        });
    }
    lifted
}

/// Builds the tau successor of a communication: the moved residuals side by
/// side over the base registers.
fn communicate(l: &Configuration, r: &Configuration, base: &Registers) -> Option<Configuration> {
    let Term::Parallel { left: lp, .. } = &l.term else {
        return None;
    };
    let Term::Parallel { right: rp, .. } = &r.term else {
        return None;
    };
    Some(Configuration {
        registers: base.clone(),
        term: Term::Parallel {
            left: lp.clone(),
            right: rp.clone(),
        },
        label: Label::tau(),
    })
}

/// Builds the tau successor of a scope-closing communication: unify the
/// names held at the reserved slot, rebind them, and wrap the residual pair
/// in a new restriction.
fn close_scope(
    l: &Configuration,
    r: &Configuration,
    base: &Registers,
    output_side: Side,
) -> Option<Configuration> {
    let (out, inp) = match output_side {
        Side::Left => (l, r),
        Side::Right => (r, l),
    };
    let res_name = out.registers.name_at(1)?.to_owned();
    let input_name = inp.registers.name_at(1)?.to_owned();

    let mut out_term = out.term.clone();
    let mut inp_term = inp.term.clone();
    substitute(
        &mut inp_term,
        &Name::free(input_name),
        &Name::bound(res_name.clone()),
    );
    substitute(
        &mut out_term,
        &Name::free(res_name.clone()),
        &Name::bound(res_name.clone()),
    );

    let (left_term, right_term) = match output_side {
        Side::Left => (out_term, inp_term),
        Side::Right => (inp_term, out_term),
    };
    Some(Configuration {
        registers: base.clone(),
        term: Term::Restriction {
            name: Name::bound(res_name),
            next: Box::new(Term::Parallel {
                left: Box::new(left_term),
                right: Box::new(right_term),
            }),
        },
        label: Label::tau(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fresca_dsl::parse;

    const TEST_REGISTER_SIZE: usize = 1 << 30;

    fn transitions(src: &str) -> Vec<String> {
        let program = parse(src, "test.pi").expect("parse succeeds");
        let mut sem = Semantics::new(program.declarations, TEST_REGISTER_SIZE);
        let root = sem.root_configuration(program.main);
        sem.successors(&root)
            .iter()
            .map(|c| format!("{} -> {} ¦- {}", c.label, c.registers, c.term))
            .collect()
    }

    fn assert_transitions(src: &str, expected: &[&str]) {
        assert_eq!(transitions(src), expected, "program: {src}");
    }

    // ---------------------------------------------------------------
    // Input and output prefixes
    // ---------------------------------------------------------------

    #[test]
    fn input_yields_known_and_fresh_successors() {
        assert_transitions(
            "a(b).0",
            &["1 1  -> {(1,#1)} ¦- 0", "1 1* -> {(1,&b_0)} ¦- 0"],
        );
    }

    #[test]
    fn fresh_input_avoids_names_of_the_residual() {
        assert_transitions(
            "a(b).a(b).0",
            &[
                "1 1  -> {(1,#1)} ¦- #1(&b_1).0",
                "1 2* -> {(1,#1),(2,&b_0)} ¦- #1(&b_1).0",
            ],
        );
    }

    #[test]
    fn input_enumerates_every_register() {
        assert_transitions(
            "a(b).c(d).e(f).0",
            &[
                "1 1  -> {(1,#1),(2,#2),(3,#3)} ¦- #2(&d_1).#3(&f_2).0",
                "1 2  -> {(1,#1),(2,#2),(3,#3)} ¦- #2(&d_1).#3(&f_2).0",
                "1 3  -> {(1,#1),(2,#2),(3,#3)} ¦- #2(&d_1).#3(&f_2).0",
                "1 1* -> {(1,&b_0),(2,#2),(3,#3)} ¦- #2(&d_1).#3(&f_2).0",
            ],
        );
    }

    #[test]
    fn output_yields_single_known_successor() {
        assert_transitions("a'<b>.0", &["1'2  -> {(1,#1),(2,#2)} ¦- 0"]);
    }

    // ---------------------------------------------------------------
    // Restriction: RES and OPEN
    // ---------------------------------------------------------------

    #[test]
    fn restriction_stays_private_when_untouched() {
        assert_transitions("$a.b'<c>.0", &["1'2  -> {(1,#1),(2,#2)} ¦- $&a_0.0"]);
    }

    #[test]
    fn restriction_rewrap_keeps_residual_occurrences_bound() {
        assert_transitions(
            "$a.b'<c>.b'<c>.0",
            &["1'2  -> {(1,#1),(2,#2)} ¦- $&a_0.#1'<#2>.0"],
        );
    }

    // ---------------------------------------------------------------
    // Match
    // ---------------------------------------------------------------

    #[test]
    fn match_passes_through_on_equal_names() {
        assert_transitions(
            "[a=a]a(b).0",
            &["1 1  -> {(1,#1)} ¦- 0", "1 1* -> {(1,&b_0)} ¦- 0"],
        );
    }

    #[test]
    fn match_blocks_on_distinct_names() {
        assert_transitions("[a=b]a(b).0", &[]);
    }

    #[test]
    fn mismatch_passes_through_on_distinct_names() {
        assert_transitions(
            "[a!=b]a(c).0",
            &[
                "1 1  -> {(1,#1),(2,#2)} ¦- 0",
                "1 2  -> {(1,#1),(2,#2)} ¦- 0",
                "1 1* -> {(1,&c_0),(2,#2)} ¦- 0",
            ],
        );
    }

    // ---------------------------------------------------------------
    // Sum
    // ---------------------------------------------------------------

    #[test]
    fn sum_unions_both_branches() {
        assert_transitions(
            "a(b).b<b>.0 + a(b).a<b>.0",
            &[
                "1 1  -> {(1,#1)} ¦- #1'<#1>.0",
                "1 1* -> {(1,&b_0)} ¦- &b_0'<&b_0>.0",
                "1 1  -> {(1,#1)} ¦- #1'<#1>.0",
                "1 2* -> {(1,#1),(2,&b_1)} ¦- #1'<&b_1>.0",
            ],
        );
    }

    // ---------------------------------------------------------------
    // Recursion
    // ---------------------------------------------------------------

    #[test]
    fn call_is_left_folded_until_an_action() {
        assert_transitions(
            "P(b) = b'<b>.0\na(b).P(b)",
            &["1 1  -> {(1,#1)} ¦- P(#1)", "1 1* -> {(1,&b_0)} ¦- P(&b_0)"],
        );
    }

    #[test]
    fn undeclared_call_has_no_successors() {
        assert_transitions("Q(a)", &[]);
    }

    #[test]
    fn arity_mismatch_has_no_successors() {
        assert_transitions("P(x) = x(y).0\nP(a, b)", &[]);
    }

    #[test]
    fn self_recursive_call_without_prefix_is_cut_off() {
        assert_transitions("P(a) = P(a)\nP(b)", &[]);
    }

    #[test]
    fn mutually_recursive_calls_without_prefix_are_cut_off() {
        assert_transitions("P(a) = Q(a)\nQ(a) = P(a)\nP(b)", &[]);
    }

    #[test]
    fn reentry_is_cut_off_even_with_different_arguments() {
        // The cutoff keys on the process name alone, so P(c) inside P(b) is
        // treated as non-progressing although its argument differs.
        assert_transitions("P(a) = P(c)\nP(b)", &[]);
    }

    #[test]
    fn unfolding_reaches_through_guarded_recursion() {
        assert_transitions(
            "P(a) = a(x).P(a)\nP(b)",
            &[
                "1 1  -> {(1,#1)} ¦- P(#1)",
                "1 2* -> {(1,#1),(2,&x_0)} ¦- P(#1)",
            ],
        );
    }

    // ---------------------------------------------------------------
    // Parallel composition
    // ---------------------------------------------------------------

    #[test]
    fn parallel_interleaves_and_communicates() {
        assert_transitions(
            "a(b).0 | a<a>.0",
            &[
                "1 1  -> {(1,#1)} ¦- (0 | #1'<#1>.0)",
                "1 2* -> {(1,#1),(2,&b_0)} ¦- (0 | #1'<#1>.0)",
                "1'1  -> {(1,#1)} ¦- (#1(&b_0).0 | 0)",
                "t    -> {(1,#1)} ¦- (0 | 0)",
            ],
        );
    }

    #[test]
    fn parallel_communication_is_symmetric() {
        assert_transitions(
            "a<a>.0 | a(b).0",
            &[
                "1'1  -> {(1,#1)} ¦- (0 | #1(&b_0).0)",
                "1 1  -> {(1,#1)} ¦- (#1'<#1>.0 | 0)",
                "1 2* -> {(1,#1),(2,&b_0)} ¦- (#1'<#1>.0 | 0)",
                "t    -> {(1,#1)} ¦- (0 | 0)",
            ],
        );
    }

    #[test]
    fn fresh_input_is_reminimised_over_parallel() {
        assert_transitions(
            "a(b).0 | 0",
            &["1 1  -> {(1,#1)} ¦- (0 | 0)", "1 1* -> {(1,&b_0)} ¦- (0 | 0)"],
        );
    }

    #[test]
    fn restriction_steps_over_parallel() {
        assert_transitions("$x.a<a>.0 | 0", &["1'1  -> {(1,#1)} ¦- ($&x_0.0 | 0)"]);
    }

    #[test]
    fn fresh_output_avoids_names_of_the_other_component() {
        assert_transitions(
            "a(b).0 | $x.a<a>.0",
            &[
                "1 1  -> {(1,#1)} ¦- (0 | $&x_1.#1'<#1>.0)",
                "1 2* -> {(1,#1),(2,&b_0)} ¦- (0 | $&x_1.#1'<#1>.0)",
                "1'1  -> {(1,#1)} ¦- (#1(&b_0).0 | $&x_1.0)",
                "t    -> {(1,#1)} ¦- (0 | $&x_1.0)",
            ],
        );
    }

    #[test]
    fn restricted_output_communicates_without_closing() {
        assert_transitions(
            "$a.b'<c>.0 | b(x).0",
            &[
                "1'2  -> {(1,#1),(2,#2)} ¦- ($&a_0.0 | #1(&x_1).0)",
                "1 1  -> {(1,#1),(2,#2)} ¦- ($&a_0.#1'<#2>.0 | 0)",
                "1 2  -> {(1,#1),(2,#2)} ¦- ($&a_0.#1'<#2>.0 | 0)",
                "1 3* -> {(1,#1),(2,#2),(3,&x_1)} ¦- ($&a_0.#1'<#2>.0 | 0)",
                "t    -> {(1,#1),(2,#2)} ¦- ($&a_0.0 | 0)",
            ],
        );
    }

    // ---------------------------------------------------------------
    // CLOSE: scope extrusion through communication
    // ---------------------------------------------------------------

    #[test]
    fn close_left_restores_the_restriction() {
        assert_transitions(
            "$a.b'<a>.0 | b(a).a'<a>.0",
            &[
                "1'2^ -> {(1,#1),(2,&a_0)} ¦- (0 | #1(&a_1).&a_1'<&a_1>.0)",
                "1 1  -> {(1,#1)} ¦- ($&a_0.#1'<&a_0>.0 | #1'<#1>.0)",
                "1 2* -> {(1,#1),(2,&a_1)} ¦- ($&a_0.#1'<&a_0>.0 | &a_1'<&a_1>.0)",
                "t    -> {(1,#1)} ¦- $&a_0.(0 | &a_0'<&a_0>.0)",
            ],
        );
    }

    #[test]
    fn close_right_restores_the_restriction() {
        assert_transitions(
            "b(a).a'<a>.0 | $a.b'<a>.0",
            &[
                "1 1  -> {(1,#1)} ¦- (#1'<#1>.0 | $&a_1.#1'<&a_1>.0)",
                "1 2* -> {(1,#1),(2,&a_0)} ¦- (&a_0'<&a_0>.0 | $&a_1.#1'<&a_1>.0)",
                "1'2^ -> {(1,#1),(2,&a_1)} ¦- (#1(&a_0).&a_0'<&a_0>.0 | 0)",
                "t    -> {(1,#1)} ¦- $&a_1.(&a_1'<&a_1>.0 | 0)",
            ],
        );
    }

    // ---------------------------------------------------------------
    // Root configuration
    // ---------------------------------------------------------------

    #[test]
    fn root_registers_are_sorted_generated_names() {
        let program = parse("b'<a>.c(d).0", "test.pi").expect("parse succeeds");
        let mut sem = Semantics::new(program.declarations, TEST_REGISTER_SIZE);
        let root = sem.root_configuration(program.main);
        assert_eq!(root.registers.to_string(), "{(1,#1),(2,#2),(3,#3)}");
        assert_eq!(root.term.to_string(), "#2'<#1>.#3(&d_0).0");
    }

    #[test]
    fn marked_names_come_first_and_keep_their_text() {
        let program = parse("_chan(x).b'<_chan>.0", "test.pi").expect("parse succeeds");
        let mut sem = Semantics::new(program.declarations, TEST_REGISTER_SIZE);
        let root = sem.root_configuration(program.main);
        assert_eq!(root.registers.to_string(), "{(1,_chan),(2,#1)}");
        assert_eq!(root.term.to_string(), "_chan(&x_0).#1'<_chan>.0");
    }

    #[test]
    fn declared_bodies_share_the_generated_free_names() {
        let program = parse("P = c'<c>.0\na(b).P", "test.pi").expect("parse succeeds");
        let mut sem = Semantics::new(program.declarations, TEST_REGISTER_SIZE);
        let root = sem.root_configuration(program.main);
        // Free names: a (main) and c (declared body), sorted.
        assert_eq!(root.registers.to_string(), "{(1,#1),(2,#2)}");
        let confs = sem.successors(&root);
        assert_eq!(confs.len(), 3);
        // Unfolding P after the input must output the rewritten c.
        let after = &confs[0];
        let next = sem.successors(after);
        assert_eq!(next.len(), 1);
        assert_eq!(
            format!("{}", next[0].label),
            format!("{}", Label {
                channel: Symbol::new(SymbolKind::Output, 2),
                value: Symbol::new(SymbolKind::Known, 2),
            })
        );
    }
}
