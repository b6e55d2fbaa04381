//! Title and cross-reference resolution.
//!
//! Resolution runs as an explicit ordered pass list over the merged,
//! numbered document set:
//!
//! 1. upgrade bare `{ref}` roles that target enumerable exercises into
//!    numbered references,
//! 2. resolve exercise display titles,
//! 3. resolve solution display titles (this is where hyperlinks back to the
//!    answered exercise are built),
//! 4. resolve every remaining role into a hyperlink, propagating resolved
//!    title text into references without explicit display text.
//!
//! Every resolved title lands in a [`ResolvedTitles`] cache keyed by label.
//! Passes read the cache instead of re-deriving titles, and never mutate the
//! registry, so resolution is idempotent.

use std::collections::{BTreeMap, HashMap};

use crate::config::Settings;
use crate::diagnostics::Warnings;
use crate::doctree::{Block, Document, EntryKind, ExerciseBlock, Inline};
use crate::numbering::NumberingAssigner;
use crate::output::relative_uri;
use crate::registry::{ExerciseRegistry, RegistryEntry};

/// A fully resolved display title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTitle {
    pub inlines: Vec<Inline>,
    pub plain: String,
}

/// Label-keyed cache of resolved titles.
#[derive(Debug, Clone, Default)]
pub struct ResolvedTitles {
    titles: HashMap<String, ResolvedTitle>,
}

impl ResolvedTitles {
    pub fn get(&self, label: &str) -> Option<&ResolvedTitle> {
        self.titles.get(label)
    }

    fn insert(&mut self, label: &str, inlines: Vec<Inline>) -> &ResolvedTitle {
        let plain = Inline::plain_text(&inlines);
        self.titles
            .entry(label.to_string())
            .or_insert(ResolvedTitle { inlines, plain })
    }
}

/// Runs all resolution passes. `documents` must already be merged and
/// numbered.
pub fn resolve(
    settings: &Settings,
    registry: &ExerciseRegistry,
    numbering: &NumberingAssigner,
    documents: &mut BTreeMap<String, Document>,
    warnings: &mut Warnings,
) -> ResolvedTitles {
    let mut resolved = ResolvedTitles::default();

    upgrade_numbered_refs(registry, numbering, documents);
    resolve_exercise_titles(registry, numbering, documents, &mut resolved);
    resolve_solution_titles(settings, registry, documents, &mut resolved, warnings);
    resolve_references(registry, numbering, documents, &resolved, warnings);

    resolved
}

/// Pass 1: a bare `{ref}` to an enumerable exercise reads as a numbered
/// reference inheriting the category format.
///
/// Only targets that actually carry an ordinal are upgraded. An enumerable
/// entry can still lack one (a hidden declaration never enters the tree the
/// assigner walks); those stay plain references so pass 4 gives them the
/// resolved title text instead.
fn upgrade_numbered_refs(
    registry: &ExerciseRegistry,
    numbering: &NumberingAssigner,
    documents: &mut BTreeMap<String, Document>,
) {
    for document in documents.values_mut() {
        document.for_each_inline_mut(&mut |inline| {
            let Inline::Ref {
                target,
                explicit: None,
            } = inline
            else {
                return;
            };
            let numbered_exercise = registry
                .get(target)
                .is_some_and(|entry| entry.kind == EntryKind::Exercise && entry.enumerable)
                && numbering.number_of(target).is_some();
            if numbered_exercise {
                *inline = Inline::NumRef {
                    target: target.clone(),
                    format: String::new(),
                };
            }
        });
    }
}

fn exercise_title(numbering: &NumberingAssigner, entry: &RegistryEntry) -> Vec<Inline> {
    let base = match numbering.number_of(&entry.label) {
        Some(number) => numbering.format_number(entry.kind.as_str(), number),
        None => numbering.title_word(entry.kind.as_str()),
    };

    if entry.title.is_empty() {
        return vec![Inline::Text(base)];
    }
    let mut inlines = vec![Inline::Text(format!("{base} ("))];
    inlines.extend(entry.title.iter().cloned());
    inlines.push(Inline::Text(")".to_string()));
    inlines
}

/// Pass 2: every registered exercise gets a display title, and visible
/// exercise blocks adopt it. Hidden entries are resolved too so references
/// and solutions can still borrow their titles.
fn resolve_exercise_titles(
    registry: &ExerciseRegistry,
    numbering: &NumberingAssigner,
    documents: &mut BTreeMap<String, Document>,
    resolved: &mut ResolvedTitles,
) {
    for entry in registry.iter() {
        if entry.kind == EntryKind::Exercise {
            resolved.insert(&entry.label, exercise_title(numbering, entry));
        }
    }

    for document in documents.values_mut() {
        for_each_exercise_mut(&mut document.blocks, &mut |block| {
            if block.kind == EntryKind::Exercise {
                if let Some(title) = resolved.get(&block.label) {
                    block.title = title.inlines.clone();
                }
            }
        });
    }
}

/// Pass 3: solution titles. The default style links back to the answered
/// exercise; the `solution_follow_exercise` style uses the bare word with no
/// hyperlink because the exercise is right above.
fn resolve_solution_titles(
    settings: &Settings,
    registry: &ExerciseRegistry,
    documents: &mut BTreeMap<String, Document>,
    resolved: &mut ResolvedTitles,
    warnings: &mut Warnings,
) {
    let follow_style = settings.solution_follows_exercise();

    for (docname, document) in documents.iter_mut() {
        let docname = docname.clone();
        for_each_exercise_mut(&mut document.blocks, &mut |block| {
            if block.kind != EntryKind::Solution {
                return;
            }

            if follow_style {
                block.title = vec![Inline::Text("Solution".to_string())];
                resolved.insert(&block.label, block.title.clone());
                return;
            }

            let target = block.target_label.clone().unwrap_or_default();
            let Some(entry) = registry.get(&target) else {
                warnings.push(
                    docname.clone(),
                    Some(block.line),
                    format!("undefined label: {target}"),
                );
                block.title = vec![Inline::Text("Solution to".to_string())];
                resolved.insert(&block.label, block.title.clone());
                return;
            };

            let children = resolved
                .get(&target)
                .map(|title| title.inlines.clone())
                .unwrap_or_else(|| vec![Inline::Text(target.clone())]);
            block.title = vec![
                Inline::Text("Solution to ".to_string()),
                Inline::Link {
                    href: format!("{}#{}", relative_uri(&docname, &entry.docname), target),
                    refid: format!("{}:{}", entry.docname, target),
                    children,
                },
            ];
            resolved.insert(&block.label, block.title.clone());
        });
    }
}

/// Pass 4: remaining `{ref}`/`{numref}` roles become hyperlinks. Explicit
/// display text is kept verbatim; bare references borrow the target's
/// resolved title.
fn resolve_references(
    registry: &ExerciseRegistry,
    numbering: &NumberingAssigner,
    documents: &mut BTreeMap<String, Document>,
    resolved: &ResolvedTitles,
    warnings: &mut Warnings,
) {
    for (docname, document) in documents.iter_mut() {
        let docname = docname.clone();
        document.for_each_inline_mut(&mut |inline| {
            let (target, children) = match inline {
                Inline::Ref { target, explicit } => {
                    let Some(entry) = registry.get(target) else {
                        warnings.push(
                            docname.clone(),
                            None,
                            format!("reference label '{target}' is not in the exercise registry"),
                        );
                        return;
                    };
                    let children = match explicit.take() {
                        Some(explicit) => explicit,
                        None => resolved
                            .get(target)
                            .map(|title| title.inlines.clone())
                            .unwrap_or_else(|| vec![Inline::Text(target.clone())]),
                    };
                    (entry, children)
                }
                Inline::NumRef { target, format } => {
                    let Some(entry) = registry.get(target) else {
                        warnings.push(
                            docname.clone(),
                            None,
                            format!("reference label '{target}' is not in the exercise registry"),
                        );
                        return;
                    };
                    let children = match numbering.number_of(target) {
                        Some(number) => {
                            let text = if format.is_empty() {
                                numbering.format_number(entry.kind.as_str(), number)
                            } else {
                                format.replace("%s", &number.to_string())
                            };
                            vec![Inline::Text(text)]
                        }
                        // No ordinal to substitute; degrade to the resolved
                        // title so the reference text stays visible.
                        None => {
                            warnings.push(
                                docname.clone(),
                                None,
                                format!("numbered reference to unenumerable label '{target}'"),
                            );
                            resolved
                                .get(target)
                                .map(|title| title.inlines.clone())
                                .unwrap_or_else(|| vec![Inline::Text(target.clone())])
                        }
                    };
                    (entry, children)
                }
                _ => return,
            };

            let label = target.label.clone();
            *inline = Inline::Link {
                href: format!("{}#{}", relative_uri(&docname, &target.docname), label),
                refid: format!("{}:{}", target.docname, label),
                children,
            };
        });
    }
}

fn for_each_exercise_mut(blocks: &mut [Block], f: &mut impl FnMut(&mut ExerciseBlock)) {
    for block in blocks {
        if let Block::Exercise(exercise) = block {
            f(exercise);
            for_each_exercise_mut(&mut exercise.body, f);
        }
    }
}
