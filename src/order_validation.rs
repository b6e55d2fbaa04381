//! Optional reading-order validation.
//!
//! When the `solution_follow_exercise` authoring style is active, every
//! solution must appear strictly after the exercise it answers, within the
//! same document. This scan only reports; it never mutates the tree or the
//! registry.

use std::collections::HashMap;

use crate::diagnostics::Warnings;
use crate::doctree::EntryKind;
use crate::registry::ExerciseRegistry;

/// One exercise or solution declaration in document reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub kind: EntryKind,
    pub label: String,
    pub target_label: Option<String>,
    pub line: usize,
}

/// Validates one document's declaration order against the configured style.
pub fn validate_order(
    docname: &str,
    records: &[OrderRecord],
    registry: &ExerciseRegistry,
    warnings: &mut Warnings,
) {
    let exercise_lines: HashMap<&str, usize> = records
        .iter()
        .filter(|record| record.kind == EntryKind::Exercise)
        .map(|record| (record.label.as_str(), record.line))
        .collect();

    for record in records {
        if record.kind != EntryKind::Solution {
            continue;
        }
        let Some(target) = record.target_label.as_deref() else {
            continue;
        };

        if let Some(&exercise_line) = exercise_lines.get(target) {
            if record.line <= exercise_line {
                warnings.push(
                    docname,
                    Some(record.line),
                    format!(
                        "solution '{}' does not follow exercise '{}' (exercise at line {})",
                        record.label, target, exercise_line
                    ),
                );
            }
        } else if let Some(entry) = registry.get(target) {
            if entry.docname != docname {
                warnings.push(
                    docname,
                    Some(record.line),
                    format!(
                        "solution '{}' references exercise '{}' in another document ({}); \
                         this is incompatible with exercise_style=solution_follow_exercise",
                        record.label, target, entry.docname
                    ),
                );
            }
        }
        // A target that is nowhere in the registry is reported by the
        // solution-title resolution pass, not here.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryEntry;

    fn exercise(label: &str, line: usize) -> OrderRecord {
        OrderRecord {
            kind: EntryKind::Exercise,
            label: label.to_string(),
            target_label: None,
            line,
        }
    }

    fn solution(label: &str, target: &str, line: usize) -> OrderRecord {
        OrderRecord {
            kind: EntryKind::Solution,
            label: label.to_string(),
            target_label: Some(target.to_string()),
            line,
        }
    }

    fn registry_with(label: &str, docname: &str) -> ExerciseRegistry {
        let mut registry = ExerciseRegistry::new();
        let mut warnings = Warnings::new();
        registry.register(
            RegistryEntry {
                kind: EntryKind::Exercise,
                label: label.to_string(),
                docname: docname.to_string(),
                serial: 0,
                enumerable: true,
                title: vec![],
                target_label: None,
                hidden: false,
                line: 1,
            },
            &mut warnings,
        );
        registry
    }

    #[test]
    fn test_solution_after_exercise_is_quiet() {
        let records = vec![exercise("ex-1", 3), solution("sol-1", "ex-1", 10)];
        let registry = registry_with("ex-1", "doc");
        let mut warnings = Warnings::new();

        validate_order("doc", &records, &registry, &mut warnings);

        assert!(warnings.is_empty(), "unexpected: {}", warnings.as_text());
    }

    #[test]
    fn test_solution_before_exercise_warns_with_both_lines() {
        let records = vec![solution("sol-wrong-order", "my-test-exercise", 4), exercise("my-test-exercise", 11)];
        let registry = registry_with("my-test-exercise", "doc");
        let mut warnings = Warnings::new();

        validate_order("doc", &records, &registry, &mut warnings);

        assert_eq!(warnings.len(), 1);
        let warning = warnings.iter().next().unwrap();
        assert!(warning.message.contains("does not follow"), "{}", warning.message);
        assert!(warning.message.contains("sol-wrong-order"));
        assert!(warning.message.contains("my-test-exercise"));
        assert_eq!(warning.line, Some(4));
        assert!(warning.message.contains("line 11"));
    }

    #[test]
    fn test_cross_document_target_gets_style_warning() {
        let records = vec![solution("sol-1", "ex-remote", 4)];
        let registry = registry_with("ex-remote", "other-doc");
        let mut warnings = Warnings::new();

        validate_order("doc", &records, &registry, &mut warnings);

        assert_eq!(warnings.len(), 1);
        let warning = warnings.iter().next().unwrap();
        assert!(
            warning.message.contains("another document"),
            "{}",
            warning.message
        );
        assert!(warning.message.contains("other-doc"));
    }

    #[test]
    fn test_unknown_target_is_left_to_title_resolution() {
        let records = vec![solution("sol-1", "nowhere", 4)];
        let registry = ExerciseRegistry::new();
        let mut warnings = Warnings::new();

        validate_order("doc", &records, &registry, &mut warnings);

        assert!(warnings.is_empty());
    }
}
