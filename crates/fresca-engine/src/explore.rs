//! Breadth-first state-space exploration.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use serde::Serialize;
use tracing::debug;

use crate::congruence::{canonicalize, configuration_key};
use crate::transition::{Configuration, Label, Semantics};

/// Effectively unbounded registers: the default when no bound is given.
pub const UNLIMITED_REGISTERS: usize = 1 << 30;

/// Exploration limits and switches.
#[derive(Debug, Clone)]
pub struct ExploreOptions {
    pub max_states: usize,
    pub register_size: usize,
    pub disable_gc: bool,
}

impl Default for ExploreOptions {
    fn default() -> Self {
        Self {
            max_states: 20,
            register_size: UNLIMITED_REGISTERS,
            disable_gc: false,
        }
    }
}

/// A labelled transition between two state ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LtsTransition {
    pub source: usize,
    pub target: usize,
    pub label: Label,
}

/// The generated labelled transition system. State 0 is the root.
#[derive(Debug, Clone, Serialize)]
pub struct Lts {
    pub states: BTreeMap<usize, Configuration>,
    pub transitions: Vec<LtsTransition>,
    /// States left unexpanded because they exceeded the register bound.
    pub reg_size_reached: BTreeSet<usize>,
    pub states_explored: usize,
    pub states_generated: usize,
}

/// Explores the state space breadth-first from `root`, deduplicating states
/// by their canonical key and transitions by (source, target, label).
pub fn explore(sem: &mut Semantics, mut root: Configuration, opts: &ExploreOptions) -> Lts {
    let mut visited: HashMap<String, usize> = HashMap::new();
    let mut seen_transitions: HashSet<LtsTransition> = HashSet::new();
    let mut reg_size_reached = BTreeSet::new();
    let mut states = BTreeMap::new();
    let mut transitions = Vec::new();
    let mut next_id = 0;

    canonicalize(&mut root, opts.disable_gc);
    let root_key = configuration_key(&root);
    visited.insert(root_key.clone(), next_id);
    states.insert(next_id, root.clone());
    next_id += 1;

    let mut queue = VecDeque::new();
    queue.push_back((0, root));

    let mut states_explored = 0;
    let mut states_generated = 0;

    while states_explored < opts.max_states {
        let Some((source, state)) = queue.pop_front() else {
            break;
        };

        if state.registers.len() > opts.register_size {
            reg_size_reached.insert(source);
        } else {
            for mut conf in sem.successors(&state) {
                states_generated += 1;
                canonicalize(&mut conf, opts.disable_gc);
                let key = configuration_key(&conf);
                let target = match visited.get(&key) {
                    Some(&id) => id,
                    None => {
                        let id = next_id;
                        next_id += 1;
                        visited.insert(key, id);
                        states.insert(id, conf.clone());
                        queue.push_back((id, conf.clone()));
                        id
                    }
                };
                let transition = LtsTransition {
                    source,
                    target,
                    label: conf.label,
                };
                if seen_transitions.insert(transition) {
                    transitions.push(transition);
                }
            }
        }

        states_explored += 1;
    }

    debug!(
        states = states.len(),
        transitions = transitions.len(),
        states_explored,
        states_generated,
        "exploration finished"
    );

    Lts {
        states,
        transitions,
        reg_size_reached,
        states_explored,
        states_generated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fresca_dsl::parse;

    fn lts(src: &str, opts: &ExploreOptions) -> Lts {
        let program = parse(src, "test.pi").expect("parse succeeds");
        let mut sem = Semantics::new(program.declarations, opts.register_size);
        let root = sem.root_configuration(program.main);
        explore(&mut sem, root, opts)
    }

    // ---------------------------------------------------------------
    // Deduplication and counters
    // ---------------------------------------------------------------

    #[test]
    fn congruent_successors_collapse_to_one_state() {
        // Both successors of a(b).0 canonicalise to the empty configuration.
        let lts = lts("a(b).0", &ExploreOptions::default());
        assert_eq!(lts.states.len(), 2);
        assert_eq!(lts.transitions.len(), 2);
        assert_eq!(lts.states_explored, 2);
        assert_eq!(lts.states_generated, 2);
    }

    #[test]
    fn duplicate_transitions_are_recorded_once() {
        // Both sum branches step to nil with the same label.
        let lts = lts("a(b).0 + a(c).0", &ExploreOptions::default());
        assert_eq!(lts.states.len(), 2);
        assert_eq!(lts.transitions.len(), 2);
        assert_eq!(lts.states_generated, 4);
    }

    #[test]
    fn terminal_state_has_no_transitions() {
        let lts = lts("0", &ExploreOptions::default());
        assert_eq!(lts.states.len(), 1);
        assert!(lts.transitions.is_empty());
        assert_eq!(lts.states_explored, 1);
        assert_eq!(lts.states_generated, 0);
    }

    // ---------------------------------------------------------------
    // Limits
    // ---------------------------------------------------------------

    #[test]
    fn max_states_bounds_the_exploration() {
        let opts = ExploreOptions {
            max_states: 1,
            ..Default::default()
        };
        // Only the root is expanded; its successor stays on the queue.
        let lts = lts("a'<b>.c'<d>.0", &opts);
        assert_eq!(lts.states_explored, 1);
        assert_eq!(lts.states.len(), 2);
        assert_eq!(lts.transitions.len(), 1);
    }

    #[test]
    fn zero_max_states_keeps_only_the_root() {
        let opts = ExploreOptions {
            max_states: 0,
            ..Default::default()
        };
        let lts = lts("a(b).0", &opts);
        assert_eq!(lts.states.len(), 1);
        assert!(lts.transitions.is_empty());
        assert_eq!(lts.states_explored, 0);
    }

    #[test]
    fn register_bound_flags_oversized_states() {
        let opts = ExploreOptions {
            max_states: 10,
            register_size: 1,
            ..Default::default()
        };
        // The root needs two registers and is never expanded.
        let lts = lts("a'<b>.0", &opts);
        assert_eq!(lts.states.len(), 1);
        assert!(lts.transitions.is_empty());
        assert!(lts.reg_size_reached.contains(&0));
    }

    #[test]
    fn register_bound_allows_exact_fit() {
        let opts = ExploreOptions {
            max_states: 10,
            register_size: 2,
            ..Default::default()
        };
        let lts = lts("a'<b>.0", &opts);
        assert_eq!(lts.states.len(), 2);
        assert_eq!(lts.transitions.len(), 1);
        assert!(lts.reg_size_reached.is_empty());
    }

    // ---------------------------------------------------------------
    // Recursive processes
    // ---------------------------------------------------------------

    #[test]
    fn guarded_recursion_reaches_a_fixed_point() {
        // P loops on itself: the known input returns to the same canonical
        // state, the fresh input joins it after normalisation.
        let lts = lts("P(a) = a(x).P(a)\nP(b)", &ExploreOptions::default());
        assert_eq!(lts.states.len(), 1);
        assert_eq!(lts.transitions.len(), 2);
        let self_loops = lts
            .transitions
            .iter()
            .filter(|t| t.source == 0 && t.target == 0)
            .count();
        assert_eq!(self_loops, 2);
    }
}
