//! The build lifecycle.
//!
//! A [`Builder`] accumulates per-document parses (documents can be added,
//! replaced and purged independently, which is what an incremental caller
//! needs), then [`Builder::finish`] runs the build phases in a fixed order:
//!
//! 1. gated marker validation (fatal on malformed sequences),
//! 2. registry fold in sorted document order,
//! 3. gated block merging,
//! 4. ordinal assignment,
//! 5. declaration-order validation (style-gated),
//! 6. title and reference resolution.
//!
//! [`build`] is the batch entry point: discover every Markdown file under a
//! root, parse them in parallel, fold, finish.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use itertools::Itertools;
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::config::Settings;
use crate::diagnostics::Warnings;
use crate::directive::{parse_document, DocumentParse};
use crate::doctree::{Block, Document};
use crate::gated;
use crate::numbering::NumberingAssigner;
use crate::order_validation::validate_order;
use crate::output::{html, latex};
use crate::registry::{ExerciseRegistry, RegisterOutcome};
use crate::resolve::{resolve, ResolvedTitles};

/// Accumulates parsed documents until the build is finished.
#[derive(Debug, Clone)]
pub struct Builder {
    settings: Settings,
    parses: BTreeMap<String, DocumentParse>,
}

impl Builder {
    pub fn new(settings: Settings) -> Builder {
        Builder {
            settings,
            parses: BTreeMap::new(),
        }
    }

    /// Parses `text` and stores it under `docname`, replacing any previous
    /// parse of that document.
    pub fn add_document(&mut self, docname: &str, text: &str) {
        let parse = parse_document(&self.settings, docname, text);
        self.parses.insert(docname.to_string(), parse);
    }

    /// Drops a document and everything it contributed.
    pub fn purge_document(&mut self, docname: &str) {
        self.parses.remove(docname);
    }

    /// Runs the build phases over the accumulated documents.
    pub fn finish(self) -> anyhow::Result<Build> {
        let mut warnings = Warnings::new();
        let mut registry = ExerciseRegistry::new();
        let mut documents: BTreeMap<String, Document> = BTreeMap::new();
        let mut orders = BTreeMap::new();

        // The parses map is sorted by docname, which makes the registry
        // fold (and therefore duplicate-label resolution) deterministic no
        // matter how the documents were parsed.
        for (docname, mut parse) in self.parses {
            gated::validate(&docname, &parse.gated)?;

            warnings.extend(parse.warnings);
            for entry in parse.registry.iter() {
                if registry.register(entry.clone(), &mut warnings) == RegisterOutcome::Duplicate {
                    remove_labeled_blocks(&mut parse.document.blocks, &entry.label);
                }
            }

            gated::merge_gated_blocks(&mut parse.document);
            orders.insert(docname.clone(), parse.order);
            documents.insert(docname, parse.document);
        }

        let mut numbering = NumberingAssigner::new(self.settings.numfig_format.clone());
        numbering.assign(documents.values());

        if self.settings.solution_follows_exercise() {
            for (docname, order) in &orders {
                validate_order(docname, order, &registry, &mut warnings);
            }
        }

        let resolved = resolve(
            &self.settings,
            &registry,
            &numbering,
            &mut documents,
            &mut warnings,
        );

        Ok(Build {
            documents,
            registry,
            numbering,
            resolved,
            warnings,
        })
    }
}

/// A finished build: resolved trees plus everything derived from them.
#[derive(Debug, Clone)]
pub struct Build {
    pub documents: BTreeMap<String, Document>,
    pub registry: ExerciseRegistry,
    pub numbering: NumberingAssigner,
    pub resolved: ResolvedTitles,
    pub warnings: Warnings,
}

impl Build {
    /// HTML fragments keyed by docname.
    pub fn render_html(&self) -> BTreeMap<String, String> {
        self.documents
            .iter()
            .map(|(docname, document)| (docname.clone(), html::render_document(document)))
            .collect()
    }

    /// LaTeX fragments keyed by docname.
    pub fn render_latex(&self) -> BTreeMap<String, String> {
        self.documents
            .iter()
            .map(|(docname, document)| (docname.clone(), latex::render_document(document)))
            .collect()
    }
}

/// Every Markdown source under `root` as `(docname, path)` pairs, hidden
/// files and directories excluded. Docnames are `/`-separated relative
/// paths without the extension.
pub fn discover_documents(root: &Path) -> Vec<(String, PathBuf)> {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| {
            !entry
                .file_name()
                .to_str()
                .map(|name| name.starts_with('.'))
                .unwrap_or(false)
        })
        .flatten()
        .filter(|entry| entry.path().extension().and_then(|ext| ext.to_str()) == Some("md"))
        .flat_map(|entry| {
            let docname = entry
                .path()
                .strip_prefix(root)
                .ok()?
                .with_extension("")
                .to_str()?
                .replace('\\', "/");
            Some((docname, entry.path().to_path_buf()))
        })
        .sorted()
        .collect_vec()
}

/// Batch build: discover, parse in parallel, fold in sorted order, finish.
pub fn build(settings: &Settings, root: &Path) -> anyhow::Result<Build> {
    let sources = discover_documents(root);

    let parses: Vec<(String, DocumentParse)> = sources
        .par_iter()
        .map(|(docname, path)| {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok((docname.clone(), parse_document(settings, docname, &text)))
        })
        .collect::<anyhow::Result<_>>()?;

    let mut builder = Builder::new(settings.clone());
    for (docname, parse) in parses {
        builder.parses.insert(docname, parse);
    }
    builder.finish()
}

fn remove_labeled_blocks(blocks: &mut Vec<Block>, label: &str) {
    blocks.retain(|block| !matches!(block, Block::Exercise(e) if e.label == label));
    for block in blocks {
        if let Block::Exercise(exercise) = block {
            remove_labeled_blocks(&mut exercise.body, label);
        }
    }
}
