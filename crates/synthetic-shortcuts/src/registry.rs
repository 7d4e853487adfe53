use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, trace};

use crate::entry::{ShortcutEntry, NO_SHORTCUT};

/// All command bindings loaded from, or destined for, one shortcut file.
///
/// Command names are not forced to be unique in storage. Every lookup
/// resolves a name to its first entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutRegistry {
    #[serde(default)]
    entries: Vec<ShortcutEntry>,
}

/// Entries grouped by the key combinations bound to them.
///
/// Entries without any shortcut live in a separate bucket, once each. The
/// bucket is addressable through [`NO_SHORTCUT`].
#[derive(Debug)]
pub struct ShortcutIndex<'a> {
    bound: BTreeMap<&'a str, Vec<&'a ShortcutEntry>>,
    unbound: Vec<&'a ShortcutEntry>,
}

impl<'a> ShortcutIndex<'a> {
    pub fn build(entries: &'a [ShortcutEntry]) -> Self {
        let mut bound: BTreeMap<&'a str, Vec<&'a ShortcutEntry>> = BTreeMap::new();
        let mut unbound = Vec::new();
        for entry in entries {
            if !entry.has_shortcuts() {
                unbound.push(entry);
                continue;
            }
            for shortcut in entry.shortcuts() {
                bound.entry(shortcut.as_str()).or_default().push(entry);
            }
        }
        Self { bound, unbound }
    }

    /// Entries bound to `shortcut`; the placeholder yields the unbound bucket.
    pub fn get(&self, shortcut: &str) -> Option<&[&'a ShortcutEntry]> {
        if shortcut == NO_SHORTCUT {
            return (!self.unbound.is_empty()).then_some(self.unbound.as_slice());
        }
        self.bound.get(shortcut).map(Vec::as_slice)
    }

    pub fn bound(&self) -> impl Iterator<Item = (&'a str, &[&'a ShortcutEntry])> + '_ {
        self.bound
            .iter()
            .map(|(shortcut, entries)| (*shortcut, entries.as_slice()))
    }

    pub fn unbound(&self) -> &[&'a ShortcutEntry] {
        &self.unbound
    }

    fn bound_entries(&self, shortcut: &str) -> Option<&[&'a ShortcutEntry]> {
        self.bound.get(shortcut).map(Vec::as_slice)
    }
}

/// Result of comparing two registries binding by binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comparison {
    /// Same command bound to the same shortcut on both sides.
    pub duplicates: ShortcutRegistry,
    /// Different commands sharing a shortcut across the two sides.
    pub conflicts: ShortcutRegistry,
}

impl ShortcutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<ShortcutEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ShortcutEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: ShortcutEntry) {
        self.entries.push(entry);
    }

    pub fn command_index(&self) -> BTreeMap<&str, &ShortcutEntry> {
        let mut index = BTreeMap::new();
        for entry in &self.entries {
            index.entry(entry.command_name.as_str()).or_insert(entry);
        }
        index
    }

    pub fn shortcut_index(&self) -> ShortcutIndex<'_> {
        ShortcutIndex::build(&self.entries)
    }

    /// Merge each incoming entry into the entry with the same command name.
    ///
    /// The incoming entry's shortcuts are added to the existing entry, one
    /// flag per attempt. Unknown commands are appended whole with a single
    /// `true` flag.
    pub fn add_shortcuts(
        &mut self,
        entries: impl IntoIterator<Item = ShortcutEntry>,
    ) -> Vec<bool> {
        let mut results = Vec::new();
        for incoming in entries {
            match self.position_of(&incoming.command_name) {
                Some(index) => {
                    let existing = &mut self.entries[index];
                    for shortcut in incoming.shortcuts() {
                        let added = existing.merge_shortcut(shortcut);
                        trace!(
                            command = %existing.command_name,
                            %shortcut,
                            added,
                            "merge shortcut"
                        );
                        results.push(added);
                    }
                }
                None => {
                    trace!(command = %incoming.command_name, "append entry");
                    self.entries.push(incoming);
                    results.push(true);
                }
            }
        }
        results
    }

    /// Remove the incoming entries' shortcuts from the matching entries.
    ///
    /// Commands missing from the registry are skipped without a flag.
    pub fn remove_shortcuts(&mut self, entries: &[ShortcutEntry]) -> Vec<bool> {
        let mut results = Vec::new();
        for incoming in entries {
            let Some(index) = self.position_of(&incoming.command_name) else {
                trace!(command = %incoming.command_name, "skip removal for unknown command");
                continue;
            };
            let existing = &mut self.entries[index];
            for shortcut in incoming.shortcuts() {
                results.push(existing.remove_shortcut(shortcut));
            }
        }
        results
    }

    /// Merge every entry of `other` into this registry.
    pub fn merge_from(&mut self, other: &ShortcutRegistry) -> Vec<bool> {
        let results = self.add_shortcuts(other.entries.iter().cloned());
        debug!(
            incoming = other.len(),
            changed = results.iter().filter(|added| **added).count(),
            "merged shortcut registries"
        );
        results
    }

    /// New registry holding only the entries that have at least one shortcut.
    ///
    /// Each kept entry appears once, in registry order, however many
    /// shortcuts it carries.
    pub fn remove_empty_shortcuts(&self) -> ShortcutRegistry {
        let entries: Vec<ShortcutEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.has_shortcuts())
            .cloned()
            .collect();
        debug!(
            removed = self.entries.len() - entries.len(),
            kept = entries.len(),
            "purged unbound commands"
        );
        ShortcutRegistry { entries }
    }

    /// Shortcuts bound to more than one entry of this registry.
    pub fn duplicate_shortcuts(&self) -> BTreeMap<&str, Vec<&ShortcutEntry>> {
        self.shortcut_index()
            .bound
            .into_iter()
            .filter(|(_, entries)| entries.len() > 1)
            .collect()
    }

    pub fn contains_command(&self, command_name: &str) -> bool {
        self.get_by_command(command_name).is_some()
    }

    pub fn contains_shortcut(&self, shortcut: &str) -> bool {
        self.get_by_shortcut(shortcut).is_some()
    }

    pub fn get_by_command(&self, command_name: &str) -> Option<&ShortcutEntry> {
        self.entries
            .iter()
            .find(|entry| entry.command_name == command_name)
    }

    pub fn get_by_shortcut(&self, shortcut: &str) -> Option<Vec<&ShortcutEntry>> {
        self.shortcut_index().get(shortcut).map(<[_]>::to_vec)
    }

    /// Compare against `other`, see [`compare`].
    pub fn compare(&self, other: &ShortcutRegistry) -> Comparison {
        compare(self, other)
    }

    fn position_of(&self, command_name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.command_name == command_name)
    }
}

impl FromIterator<ShortcutEntry> for ShortcutRegistry {
    fn from_iter<T: IntoIterator<Item = ShortcutEntry>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Find bindings shared between two registries.
///
/// Every shortcut bound on both sides is checked pairwise across the two
/// buckets. A pair with the same command name lands in `duplicates` under
/// the first side's identity; any other pair puts both commands in
/// `conflicts`. Each recorded entry carries just the shared shortcut and is
/// merged with [`ShortcutRegistry::add_shortcuts`].
pub fn compare(first: &ShortcutRegistry, second: &ShortcutRegistry) -> Comparison {
    let first_index = first.shortcut_index();
    let second_index = second.shortcut_index();
    let mut comparison = Comparison::default();
    let mut shared = 0usize;

    for (shortcut, first_entries) in first_index.bound() {
        let Some(second_entries) = second_index.bound_entries(shortcut) else {
            continue;
        };
        shared += 1;

        for left in first_entries {
            for right in second_entries {
                if left.command_name == right.command_name {
                    comparison
                        .duplicates
                        .add_shortcuts([left.with_single_shortcut(shortcut)]);
                } else {
                    comparison.conflicts.add_shortcuts([
                        left.with_single_shortcut(shortcut),
                        right.with_single_shortcut(shortcut),
                    ]);
                }
            }
        }
    }

    debug!(
        shared,
        duplicates = comparison.duplicates.len(),
        conflicts = comparison.conflicts.len(),
        "compared shortcut registries"
    );
    comparison
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, shortcuts: &str) -> ShortcutEntry {
        ShortcutEntry::new(name, format!("ID_{}", name), Some(shortcuts), "Tests")
    }

    fn names(registry: &ShortcutRegistry) -> Vec<&str> {
        registry
            .entries()
            .iter()
            .map(|entry| entry.command_name.as_str())
            .collect()
    }

    #[test]
    fn add_shortcuts_appends_unknown_commands() {
        let mut registry = ShortcutRegistry::new();
        let results = registry.add_shortcuts([entry("Cmd.A", "A"), entry("Cmd.B", "")]);
        assert_eq!(results, vec![true, true]);
        assert_eq!(names(&registry), vec!["Cmd.A", "Cmd.B"]);
    }

    #[test]
    fn add_shortcuts_merges_into_existing_entry() {
        let mut registry = ShortcutRegistry::from_entries(vec![entry("Cmd.A", "A")]);
        let results = registry.add_shortcuts([entry("Cmd.A", "A#B")]);
        assert_eq!(results, vec![false, true]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.entries()[0].shortcuts(), ["A", "B"]);
        assert_eq!(registry.entries()[0].command_id, "ID_Cmd.A");
    }

    #[test]
    fn remove_shortcuts_reports_each_attempt() {
        let mut registry = ShortcutRegistry::from_entries(vec![entry("Cmd.A", "A#B")]);
        let results =
            registry.remove_shortcuts(&[entry("Cmd.A", "B#C"), entry("Cmd.Missing", "A")]);
        assert_eq!(results, vec![true, false]);
        assert_eq!(registry.entries()[0].shortcuts(), ["A"]);
    }

    #[test]
    fn remove_shortcuts_can_unbind_entry() {
        let mut registry = ShortcutRegistry::from_entries(vec![entry("Cmd.A", "A")]);
        assert_eq!(registry.remove_shortcuts(&[entry("Cmd.A", "A")]), vec![true]);
        assert!(!registry.entries()[0].has_shortcuts());
        assert!(registry.contains_command("Cmd.A"));
        assert!(!registry.contains_shortcut("A"));
    }

    #[test]
    fn shortcut_index_buckets_unbound_entries_once() {
        let registry = ShortcutRegistry::from_entries(vec![
            entry("Cmd.A", ""),
            entry("Cmd.B", "B#C"),
            entry("Cmd.C", NO_SHORTCUT),
        ]);
        let index = registry.shortcut_index();
        assert_eq!(index.unbound().len(), 2);
        assert_eq!(index.bound().count(), 2);
        assert_eq!(index.get(NO_SHORTCUT).map(<[_]>::len), Some(2));
        assert_eq!(registry.get_by_shortcut(NO_SHORTCUT).map(|found| found.len()), Some(2));
    }

    #[test]
    fn remove_empty_shortcuts_keeps_each_bound_entry_once() {
        let registry = ShortcutRegistry::from_entries(vec![
            entry("Cmd.A", ""),
            entry("Cmd.B", "B#C#D"),
            entry("Cmd.C", "C"),
        ]);
        let purged = registry.remove_empty_shortcuts();
        assert_eq!(names(&purged), vec!["Cmd.B", "Cmd.C"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn duplicate_shortcuts_within_registry() {
        let registry = ShortcutRegistry::from_entries(vec![
            entry("Cmd.Undo", "CTRL+Z"),
            entry("Cmd.Revert", "CTRL+Z#CTRL+R"),
            entry("Cmd.Save", "CTRL+S"),
        ]);
        let duplicates = registry.duplicate_shortcuts();
        assert_eq!(duplicates.len(), 1);
        let bound = &duplicates["CTRL+Z"];
        assert_eq!(bound.len(), 2);
        assert_eq!(bound[0].command_name, "Cmd.Undo");
        assert_eq!(bound[1].command_name, "Cmd.Revert");
        assert!(!duplicates.contains_key("CTRL+S"));
        assert!(!duplicates.contains_key("CTRL+R"));
    }

    #[test]
    fn lookups_on_empty_registry_are_absent() {
        let registry = ShortcutRegistry::new();
        assert!(!registry.contains_command("Cmd"));
        assert!(!registry.contains_shortcut("A"));
        assert!(registry.get_by_command("Cmd").is_none());
        assert!(registry.get_by_shortcut("A").is_none());
        assert!(registry.get_by_shortcut(NO_SHORTCUT).is_none());
    }

    #[test]
    fn lookups_use_first_entry_for_repeated_command() {
        let registry = ShortcutRegistry::from_entries(vec![entry("Cmd", "A"), entry("Cmd", "B")]);
        assert_eq!(registry.get_by_command("Cmd").unwrap().shortcuts(), ["A"]);
        assert_eq!(registry.command_index()["Cmd"].shortcuts(), ["A"]);
        assert_eq!(registry.get_by_shortcut("B").unwrap().len(), 1);
    }

    #[test]
    fn compare_finds_duplicates() {
        let first = ShortcutRegistry::from_entries(vec![entry("Cmd.Save", "CTRL+S")]);
        let second = ShortcutRegistry::from_entries(vec![entry("Cmd.Save", "CTRL+S")]);
        let result = compare(&first, &second);

        assert_eq!(result.duplicates.len(), 1);
        let duplicate = &result.duplicates.entries()[0];
        assert_eq!(duplicate.command_name, "Cmd.Save");
        assert_eq!(duplicate.shortcuts(), ["CTRL+S"]);
        assert!(result.conflicts.is_empty());
    }

    #[test]
    fn compare_finds_conflicts() {
        let first = ShortcutRegistry::from_entries(vec![entry("Cmd.Save", "CTRL+S")]);
        let second = ShortcutRegistry::from_entries(vec![entry("Cmd.Print", "CTRL+S")]);
        let result = first.compare(&second);

        assert!(result.duplicates.is_empty());
        assert_eq!(names(&result.conflicts), vec!["Cmd.Save", "Cmd.Print"]);
        for conflict in result.conflicts.entries() {
            assert_eq!(conflict.shortcuts(), ["CTRL+S"]);
        }
    }

    #[test]
    fn compare_only_records_shared_shortcuts() {
        let first = ShortcutRegistry::from_entries(vec![
            entry("Cmd.Save", "CTRL+S#F2"),
            entry("Cmd.Open", ""),
        ]);
        let second = ShortcutRegistry::from_entries(vec![
            entry("Cmd.Save", "CTRL+S#F3"),
            entry("Cmd.Open", ""),
            entry("Cmd.Rename", "F2"),
        ]);
        let result = compare(&first, &second);

        assert_eq!(names(&result.duplicates), vec!["Cmd.Save"]);
        assert_eq!(result.duplicates.entries()[0].shortcuts(), ["CTRL+S"]);
        assert_eq!(names(&result.conflicts), vec!["Cmd.Save", "Cmd.Rename"]);
        assert_eq!(result.conflicts.entries()[0].shortcuts(), ["F2"]);
    }

    #[test]
    fn compare_merges_repeated_commands_into_one_result_entry() {
        let first = ShortcutRegistry::from_entries(vec![entry("Cmd.Save", "A#B")]);
        let second = ShortcutRegistry::from_entries(vec![
            entry("Cmd.Save", "A#B"),
            entry("Cmd.Other", "A#B"),
        ]);
        let result = compare(&first, &second);

        assert_eq!(result.duplicates.len(), 1);
        assert_eq!(result.duplicates.entries()[0].shortcuts(), ["A", "B"]);
        assert_eq!(names(&result.conflicts), vec!["Cmd.Save", "Cmd.Other"]);
        assert_eq!(result.conflicts.entries()[1].shortcuts(), ["A", "B"]);
    }

    #[test]
    fn merge_from_combines_registries() {
        let mut base = ShortcutRegistry::from_entries(vec![entry("Cmd.A", "A")]);
        let other = ShortcutRegistry::from_entries(vec![entry("Cmd.A", "B"), entry("Cmd.C", "C")]);
        assert_eq!(base.merge_from(&other), vec![true, true]);
        assert_eq!(names(&base), vec!["Cmd.A", "Cmd.C"]);
        assert_eq!(base.entries()[0].shortcuts(), ["A", "B"]);
    }
}
