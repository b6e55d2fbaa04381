//! Ordinal assignment for enumerable entries.
//!
//! The original delegates numbering to the host compiler's figure-numbering
//! service; here the assigner is explicit. It is configured with a display
//! format per category (`exercise` → `"Exercise %s"`) and assigns 1-based
//! ordinals to every enumerable exercise, in sorted document order so the
//! assignment is independent of parallel parse order.

use std::collections::HashMap;

use crate::doctree::{Document, EntryKind};

#[derive(Debug, Clone, Default)]
pub struct NumberingAssigner {
    formats: HashMap<String, String>,
    numbers: HashMap<String, usize>,
}

impl NumberingAssigner {
    pub fn new(formats: HashMap<String, String>) -> NumberingAssigner {
        NumberingAssigner {
            formats,
            numbers: HashMap::new(),
        }
    }

    /// Assigns ordinals for every enumerable exercise block. `documents`
    /// must already be sorted by docname.
    pub fn assign<'a>(&mut self, documents: impl Iterator<Item = &'a Document>) {
        let mut next = 1;
        for document in documents {
            for block in document.exercise_blocks() {
                if block.kind == EntryKind::Exercise && block.enumerable {
                    self.numbers.insert(block.label.clone(), next);
                    next += 1;
                }
            }
        }
    }

    pub fn number_of(&self, label: &str) -> Option<usize> {
        self.numbers.get(label).copied()
    }

    /// The display format for a category, e.g. `Exercise %s`.
    pub fn format_of(&self, category: &str) -> &str {
        self.formats
            .get(category)
            .map(String::as_str)
            .unwrap_or("%s")
    }

    /// Formats an assigned number, substituting `%s` in the category format.
    pub fn format_number(&self, category: &str, number: usize) -> String {
        self.format_of(category).replace("%s", &number.to_string())
    }

    /// The base noun of a category's format with the number slot stripped,
    /// e.g. `Exercise`. This is the localization surface: a translated
    /// format string yields a translated base word.
    pub fn title_word(&self, category: &str) -> String {
        self.format_of(category).replace("%s", "").trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doctree::{Block, ExerciseBlock, Inline};

    fn exercise(label: &str, docname: &str, enumerable: bool, line: usize) -> Block {
        Block::Exercise(ExerciseBlock {
            kind: EntryKind::Exercise,
            label: label.to_string(),
            docname: docname.to_string(),
            enumerable,
            gated: false,
            classes: vec![],
            serial: 0,
            line,
            title: vec![Inline::Text("t".to_string())],
            target_label: None,
            body: vec![],
        })
    }

    fn assigner() -> NumberingAssigner {
        NumberingAssigner::new(HashMap::from([(
            "exercise".to_string(),
            "Exercise %s".to_string(),
        )]))
    }

    #[test]
    fn test_sequential_assignment_across_documents() {
        let docs = vec![
            Document {
                docname: "a".to_string(),
                blocks: vec![exercise("ex-1", "a", true, 1), exercise("ex-2", "a", true, 5)],
            },
            Document {
                docname: "b".to_string(),
                blocks: vec![exercise("ex-3", "b", true, 1)],
            },
        ];

        let mut numbering = assigner();
        numbering.assign(docs.iter());

        assert_eq!(numbering.number_of("ex-1"), Some(1));
        assert_eq!(numbering.number_of("ex-2"), Some(2));
        assert_eq!(numbering.number_of("ex-3"), Some(3));
    }

    #[test]
    fn test_nonumber_blocks_are_skipped() {
        let docs = vec![Document {
            docname: "a".to_string(),
            blocks: vec![
                exercise("ex-1", "a", true, 1),
                exercise("ex-plain", "a", false, 4),
                exercise("ex-2", "a", true, 9),
            ],
        }];

        let mut numbering = assigner();
        numbering.assign(docs.iter());

        assert_eq!(numbering.number_of("ex-plain"), None);
        assert_eq!(
            numbering.number_of("ex-2"),
            Some(2),
            "unenumerable blocks must not consume ordinals"
        );
    }

    #[test]
    fn test_format_number_substitutes_slot() {
        let numbering = assigner();
        assert_eq!(numbering.format_number("exercise", 3), "Exercise 3");
    }

    #[test]
    fn test_title_word_strips_number_slot() {
        let numbering = assigner();
        assert_eq!(numbering.title_word("exercise"), "Exercise");
    }

    #[test]
    fn test_custom_format_is_the_localization_surface() {
        let numbering = NumberingAssigner::new(HashMap::from([(
            "exercise".to_string(),
            "Übung %s".to_string(),
        )]));
        assert_eq!(numbering.format_number("exercise", 2), "Übung 2");
        assert_eq!(numbering.title_word("exercise"), "Übung");
    }
}
