//! The per-build exercise registry.
//!
//! One entry per label, created while each document is parsed, purged when a
//! document is invalidated, merged when independently parsed partitions are
//! combined. Entries snapshot exactly what the resolution passes need; body
//! content never enters the registry.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::diagnostics::Warnings;
use crate::doctree::{EntryKind, ExerciseBlock, Inline};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    pub kind: EntryKind,
    pub label: String,
    pub docname: String,
    pub serial: usize,
    pub enumerable: bool,
    /// Snapshot of the declaration's custom subtitle, deep-cloned at parse
    /// time so later tree rewrites cannot corrupt it.
    pub title: Vec<Inline>,
    pub target_label: Option<String>,
    pub hidden: bool,
    pub line: usize,
}

impl RegistryEntry {
    /// Builds the registry snapshot for a parsed directive block.
    pub fn from_block(block: &ExerciseBlock, hidden: bool) -> RegistryEntry {
        RegistryEntry {
            kind: block.kind,
            label: block.label.clone(),
            docname: block.docname.clone(),
            serial: block.serial,
            enumerable: block.enumerable,
            title: block.title.clone(),
            target_label: block.target_label.clone(),
            hidden,
            line: block.line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Ok,
    /// The label was already taken; the registry is unchanged.
    Duplicate,
}

/// Label-keyed registry of every exercise and solution in the build.
///
/// Keyed storage is ordered so `--dump-registry` output and duplicate
/// detection are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExerciseRegistry {
    entries: BTreeMap<String, RegistryEntry>,
}

impl ExerciseRegistry {
    pub fn new() -> ExerciseRegistry {
        ExerciseRegistry::default()
    }

    /// Registers an entry. A duplicate label keeps the existing entry and
    /// emits a warning naming both declaration sites.
    pub fn register(&mut self, entry: RegistryEntry, warnings: &mut Warnings) -> RegisterOutcome {
        if let Some(existing) = self.entries.get(&entry.label) {
            warnings.push(
                entry.docname.clone(),
                Some(entry.line),
                format!(
                    "duplicate label: {}; other instance in {}",
                    entry.label, existing.docname
                ),
            );
            return RegisterOutcome::Duplicate;
        }

        self.entries.insert(entry.label.clone(), entry);
        RegisterOutcome::Ok
    }

    /// Removes every entry owned by `docname`. Called when a document is
    /// invalidated before it is reparsed.
    pub fn purge(&mut self, docname: &str) {
        self.entries.retain(|_, entry| entry.docname != docname);
    }

    /// Last-writer-wins union, used when combining registries built from
    /// independently processed document partitions.
    pub fn merge(&mut self, other: ExerciseRegistry) {
        self.entries.extend(other.entries);
    }

    pub fn get(&self, label: &str) -> Option<&RegistryEntry> {
        self.entries.get(label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in label order.
    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }

    /// Entries owned by one document, in label order.
    pub fn entries_for(&self, docname: &str) -> Vec<&RegistryEntry> {
        self.entries
            .values()
            .filter(|entry| entry.docname == docname)
            .collect()
    }
}
