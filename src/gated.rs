//! Gated (start/end) directive handling.
//!
//! A gated pair stands in for one logical declaration whose body spans
//! multiple independently parsed blocks. Before any merge runs, each
//! document's marker sequence is validated: starts and ends must pair up
//! adjacently, with no interleaving. A malformed sequence is an authoring
//! error that would let the merger swallow arbitrary sibling content, so it
//! aborts the build.

use itertools::Itertools;
use thiserror::Error;

use crate::doctree::{Block, Document, EntryKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerRole {
    Start,
    End,
}

/// One start or end marker as encountered during parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatedMarker {
    pub role: MarkerRole,
    pub kind: EntryKind,
    pub line: usize,
    /// Start markers carry the declaration label; end markers do not.
    pub label: Option<String>,
}

impl GatedMarker {
    fn describe(&self) -> String {
        let directive = match self.role {
            MarkerRole::Start => self.kind.start_directive(),
            MarkerRole::End => self.kind.end_directive(),
        };
        format!("{} at line: {}", directive, self.line)
    }
}

/// Ordered marker sequence for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatedRecord {
    pub markers: Vec<GatedMarker>,
}

impl GatedRecord {
    pub fn push(&mut self, marker: GatedMarker) {
        self.markers.push(marker);
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    fn markers_of(&self, kind: EntryKind) -> Vec<&GatedMarker> {
        self.markers
            .iter()
            .filter(|marker| marker.kind == kind)
            .collect()
    }
}

/// Fatal structural violations in a gated marker sequence. The message
/// enumerates every marker of the offending kind so the author can see the
/// whole sequence at once.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GatedError {
    #[error("[{docname}] missing {kind}-end directive; markers: {markers}")]
    MissingEnd {
        docname: String,
        kind: &'static str,
        markers: String,
    },
    #[error("[{docname}] missing {kind}-start directive; markers: {markers}")]
    MissingStart {
        docname: String,
        kind: &'static str,
        markers: String,
    },
    #[error("[{docname}] {kind} start/end directives may not be nested; markers: {markers}")]
    Nesting {
        docname: String,
        kind: &'static str,
        markers: String,
    },
}

/// Checks that the document's marker sequence reduces to adjacent
/// start/end pairs for each directive kind.
pub fn validate(docname: &str, record: &GatedRecord) -> Result<(), GatedError> {
    for kind in [EntryKind::Exercise, EntryKind::Solution] {
        let markers = record.markers_of(kind);
        if markers.is_empty() {
            continue;
        }

        let starts = markers
            .iter()
            .filter(|m| m.role == MarkerRole::Start)
            .count();
        let ends = markers.len() - starts;
        let listing = markers.iter().map(|m| m.describe()).join(", ");

        if starts > ends {
            return Err(GatedError::MissingEnd {
                docname: docname.to_string(),
                kind: kind.as_str(),
                markers: listing,
            });
        }
        if ends > starts {
            return Err(GatedError::MissingStart {
                docname: docname.to_string(),
                kind: kind.as_str(),
                markers: listing,
            });
        }

        // Equal counts: the only legal shape is S E S E ... (adjacent,
        // non-nested pairs).
        let alternates = markers.iter().enumerate().all(|(idx, marker)| {
            let expected = if idx % 2 == 0 {
                MarkerRole::Start
            } else {
                MarkerRole::End
            };
            marker.role == expected
        });
        if !alternates {
            return Err(GatedError::Nesting {
                docname: docname.to_string(),
                kind: kind.as_str(),
                markers: listing,
            });
        }
    }

    Ok(())
}

/// Splices the siblings between each gated start block and its matching end
/// marker into the start block's body, then removes the consumed siblings
/// and the marker itself.
///
/// Validation has already guaranteed non-nested pairs, so the nearest
/// following end marker of the same kind is always the right one. If no end
/// is found (which validation prevents) the block is left gated rather than
/// corrupting siblings.
pub fn merge_gated_blocks(document: &mut Document) {
    merge_in(&mut document.blocks);
}

fn merge_in(blocks: &mut Vec<Block>) {
    let mut idx = 0;
    while idx < blocks.len() {
        let gated_kind = match &blocks[idx] {
            Block::Exercise(exercise) if exercise.gated => Some(exercise.kind),
            _ => None,
        };

        if let Some(kind) = gated_kind {
            let end = blocks[idx + 1..].iter().position(
                |block| matches!(block, Block::GatedEnd { kind: end_kind, .. } if *end_kind == kind),
            );

            if let Some(offset) = end {
                // Drain the span including the end marker, keep the content.
                let mut spliced: Vec<Block> = blocks.drain(idx + 1..idx + 2 + offset).collect();
                spliced.pop(); // the end marker

                if let Block::Exercise(exercise) = &mut blocks[idx] {
                    exercise.body.extend(spliced);
                    exercise.gated = false;
                }
            }
        }

        if let Block::Exercise(exercise) = &mut blocks[idx] {
            merge_in(&mut exercise.body);
        }
        idx += 1;
    }
}
