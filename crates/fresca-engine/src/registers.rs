//! Register assignments: finite maps from labels to names, with the update
//! operations of fresh-register automata.

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexSet;
use serde::Serialize;

/// A register assignment. Labels start at 1; `size` is the configured
/// register bound, which also acts as the high-water mark for the reserved
/// top slot used while a restriction is held open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registers {
    size: usize,
    slots: BTreeMap<usize, String>,
}

impl Registers {
    pub fn new(size: usize, slots: BTreeMap<usize, String>) -> Self {
        Self { size, slots }
    }

    /// Number of occupied registers.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Occupied labels in ascending order.
    pub fn labels(&self) -> Vec<usize> {
        self.slots.keys().copied().collect()
    }

    /// The name held at `label`, if the slot is occupied.
    pub fn name_at(&self, label: usize) -> Option<&str> {
        self.slots.get(&label).map(String::as_str)
    }

    /// The lowest label holding `name`, if any.
    pub fn label_of(&self, name: &str) -> Option<usize> {
        self.slots
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(l, _)| *l)
    }

    /// Adds `name` at the slot above the current size and bumps the size.
    /// σ+v = σ ∪ {(|σ|+1, v)}.
    pub fn update_max(&mut self, name: &str) -> usize {
        self.size += 1;
        self.slots.insert(self.size, name.to_owned());
        self.size
    }

    /// Removes the name at the current size and drops the size. Undoes
    /// `update_max`.
    pub fn remove_max(&mut self) {
        self.slots.remove(&self.size);
        self.size -= 1;
    }

    /// Shifts every entry up one label, leaving slot 1 empty.
    /// #+σ = {(1, #)} ∪ {(i+1, v) | (i, v) ∈ σ}.
    pub fn add_placeholder(&mut self) {
        let old = std::mem::take(&mut self.slots);
        self.slots = old.into_iter().map(|(l, n)| (l + 1, n)).collect();
    }

    /// Places `name` at the lowest label whose occupant is not in `avoid`
    /// (empty slots always qualify) and returns that label.
    pub fn update_min(&mut self, name: &str, avoid: &IndexSet<String>) -> usize {
        let mut label = 1;
        loop {
            match self.slots.get(&label) {
                Some(n) if avoid.contains(n.as_str()) => label += 1,
                _ => {
                    self.slots.insert(label, name.to_owned());
                    return label;
                }
            }
        }
    }

    /// Overwrites the occupant of `label`.
    pub fn set(&mut self, label: usize, name: String) {
        self.slots.insert(label, name);
    }

    /// Drops every slot whose occupant fails the predicate.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.slots.retain(|_, name| keep(name));
    }
}

/// The canonical register rendering, `{(1,#1),(2,&1)}`. Doubles as the
/// register half of a configuration key.
impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (label, name)) in self.slots.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "({label},{name})")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registers(names: &[&str]) -> Registers {
        let slots = names
            .iter()
            .enumerate()
            .map(|(i, n)| (i + 1, n.to_string()))
            .collect();
        Registers::new(8, slots)
    }

    fn avoid(names: &[&str]) -> IndexSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    // ---------------------------------------------------------------
    // update_max / remove_max
    // ---------------------------------------------------------------

    #[test]
    fn update_max_reserves_top_slot() {
        let mut reg = registers(&["#1", "#2"]);
        let label = reg.update_max("&a_0");
        assert_eq!(label, 9);
        assert_eq!(reg.name_at(9), Some("&a_0"));
        reg.remove_max();
        assert_eq!(reg.name_at(9), None);
        assert_eq!(reg.labels(), vec![1, 2]);
    }

    #[test]
    fn update_max_twice_stacks() {
        let mut reg = registers(&["#1"]);
        assert_eq!(reg.update_max("x"), 9);
        assert_eq!(reg.update_max("y"), 10);
        reg.remove_max();
        assert_eq!(reg.name_at(10), None);
        assert_eq!(reg.name_at(9), Some("x"));
    }

    // ---------------------------------------------------------------
    // add_placeholder
    // ---------------------------------------------------------------

    #[test]
    fn add_placeholder_shifts_and_clears_slot_one() {
        let mut reg = registers(&["#1", "#2", "#3"]);
        reg.add_placeholder();
        assert_eq!(reg.labels(), vec![2, 3, 4]);
        assert_eq!(reg.name_at(1), None);
        assert_eq!(reg.name_at(2), Some("#1"));
        assert_eq!(reg.name_at(4), Some("#3"));
    }

    // ---------------------------------------------------------------
    // update_min
    // ---------------------------------------------------------------

    #[test]
    fn update_min_takes_lowest_unprotected_slot() {
        let mut reg = registers(&["#1", "#2", "#3"]);
        let label = reg.update_min("&b_0", &avoid(&["#1", "#2"]));
        assert_eq!(label, 3);
        assert_eq!(reg.name_at(3), Some("&b_0"));
    }

    #[test]
    fn update_min_prefers_empty_slot() {
        let mut reg = registers(&["#1", "#2"]);
        reg.add_placeholder();
        let label = reg.update_min("&b_0", &avoid(&["#1", "#2"]));
        assert_eq!(label, 1);
    }

    #[test]
    fn update_min_overwrites_unprotected_occupant() {
        let mut reg = registers(&["#1", "#2"]);
        let label = reg.update_min("&b_0", &avoid(&[]));
        assert_eq!(label, 1);
        assert_eq!(reg.name_at(1), Some("&b_0"));
    }

    // ---------------------------------------------------------------
    // Rendering
    // ---------------------------------------------------------------

    #[test]
    fn display_is_the_register_key() {
        let reg = registers(&["#1", "&a_0"]);
        assert_eq!(reg.to_string(), "{(1,#1),(2,&a_0)}");
        assert_eq!(registers(&[]).to_string(), "{}");
    }

    #[test]
    fn label_of_finds_lowest_match() {
        let mut reg = registers(&["#1", "#2"]);
        reg.set(3, "#1".into());
        assert_eq!(reg.label_of("#1"), Some(1));
        assert_eq!(reg.label_of("#9"), None);
    }
}
