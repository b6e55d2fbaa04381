//! Directive extraction from MyST Markdown source.
//!
//! Exercise markup rides on fenced code blocks whose info string is a
//! `{name}` directive, the way MyST spells block-level directives:
//!
//! ````text
//! ```{exercise} Optional subtitle
//! :label: ex-1
//! :nonumber:
//!
//! Body content, possibly with $math$ and {ref}`roles`.
//! ```
//! ````
//!
//! Each document parses independently into a [`DocumentParse`]: the block
//! tree plus the per-document partial registry, gated marker record and
//! reading-order record. The build folds partials together afterwards.

use markdown::{mdast::Node, to_mdast, ParseOptions};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::Settings;
use crate::diagnostics::Warnings;
use crate::doctree::{Block, Document, EntryKind, ExerciseBlock, Inline};
use crate::gated::{GatedMarker, GatedRecord, MarkerRole};
use crate::order_validation::OrderRecord;
use crate::registry::{ExerciseRegistry, RegisterOutcome, RegistryEntry};

/// Everything one document contributes to the build before folding.
#[derive(Debug, Clone)]
pub struct DocumentParse {
    pub document: Document,
    /// Partial registry holding only this document's declarations.
    pub registry: ExerciseRegistry,
    pub gated: GatedRecord,
    pub order: Vec<OrderRecord>,
    pub warnings: Warnings,
}

static DIRECTIVE_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\{([a-z-]+)\}$").unwrap());

static OPTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:(?<name>[a-z-]+):[ \t]*(?<value>.*)$").unwrap());

const DIRECTIVE_NAMES: [&str; 6] = [
    "exercise",
    "exercise-start",
    "exercise-end",
    "solution",
    "solution-start",
    "solution-end",
];

/// Parses one document's source text.
pub fn parse_document(settings: &Settings, docname: &str, text: &str) -> DocumentParse {
    // CommonMark parsing is infallible with default options.
    let ast = to_mdast(text, &ParseOptions::default()).expect("markdown parse");

    let mut parser = Parser {
        settings,
        docname,
        serial: 0,
        blocks: vec![],
        registry: ExerciseRegistry::new(),
        gated: GatedRecord::default(),
        order: vec![],
        warnings: Warnings::new(),
    };

    if let Node::Root(root) = &ast {
        for child in &root.children {
            parser.block(child, text);
        }
    }

    DocumentParse {
        document: Document {
            docname: docname.to_string(),
            blocks: parser.blocks,
        },
        registry: parser.registry,
        gated: parser.gated,
        order: parser.order,
        warnings: parser.warnings,
    }
}

struct Parser<'a> {
    settings: &'a Settings,
    docname: &'a str,
    serial: usize,
    blocks: Vec<Block>,
    registry: ExerciseRegistry,
    gated: GatedRecord,
    order: Vec<OrderRecord>,
    warnings: Warnings,
}

#[derive(Debug, Default)]
struct DirectiveOptions {
    label: Option<String>,
    classes: Vec<String>,
    nonumber: bool,
    hidden: bool,
}

impl<'a> Parser<'a> {
    fn block(&mut self, node: &Node, text: &str) {
        let line = node
            .position()
            .map(|position| position.start.line)
            .unwrap_or(1);

        if let Node::Code(code) = node {
            let directive = code
                .lang
                .as_deref()
                .and_then(|lang| DIRECTIVE_NAME_RE.captures(lang))
                .map(|captures| captures[1].to_string())
                .filter(|name| DIRECTIVE_NAMES.contains(&name.as_str()));

            if let Some(name) = directive {
                self.directive(&name, code.meta.as_deref(), &code.value, line);
                return;
            }
        }

        // Everything else stays a flat paragraph of the original source
        // span; the exercise machinery does not care about deeper block
        // structure.
        if let Some(position) = node.position() {
            let source = &text[position.start.offset..position.end.offset];
            self.blocks.push(Block::Paragraph {
                inlines: Inline::parse(source),
                line,
            });
        }
    }

    fn directive(&mut self, name: &str, args: Option<&str>, body: &str, line: usize) {
        match name {
            "exercise" => self.exercise(false, args, body, line),
            "exercise-start" => self.exercise(true, args, body, line),
            "solution" => self.solution(false, args, body, line),
            "solution-start" => self.solution(true, args, body, line),
            "exercise-end" => self.gated_end(EntryKind::Exercise, line),
            "solution-end" => self.gated_end(EntryKind::Solution, line),
            _ => unreachable!("directive names are filtered by the caller"),
        }
    }

    fn next_serial(&mut self) -> usize {
        let serial = self.serial;
        self.serial += 1;
        serial
    }

    fn exercise(&mut self, gated: bool, args: Option<&str>, body: &str, line: usize) {
        let serial = self.next_serial();
        let (options, body_blocks) =
            parse_directive_body(body, line, self.docname, &mut self.warnings);

        let label = options
            .label
            .clone()
            .unwrap_or_else(|| format!("{}-exercise-{}", self.docname, serial));
        let title = args.map(Inline::parse).unwrap_or_default();

        let mut classes = vec!["exercise".to_string()];
        classes.extend(options.classes.iter().cloned());

        if gated {
            self.gated.push(GatedMarker {
                role: MarkerRole::Start,
                kind: EntryKind::Exercise,
                line,
                label: Some(label.clone()),
            });
        }

        let block = ExerciseBlock {
            kind: EntryKind::Exercise,
            label: label.clone(),
            docname: self.docname.to_string(),
            enumerable: !options.nonumber,
            gated,
            classes,
            serial,
            line,
            title,
            target_label: None,
            body: body_blocks,
        };

        let entry = RegistryEntry::from_block(&block, options.hidden);
        if self.registry.register(entry, &mut self.warnings) == RegisterOutcome::Duplicate {
            // The duplicate's content is dropped entirely.
            return;
        }

        self.order.push(OrderRecord {
            kind: EntryKind::Exercise,
            label,
            target_label: None,
            line,
        });

        if options.hidden {
            // Registered, referenceable, but absent from the output tree.
            return;
        }
        self.blocks.push(Block::Exercise(block));
    }

    fn solution(&mut self, gated: bool, args: Option<&str>, body: &str, line: usize) {
        if self.settings.hide_solutions {
            if gated {
                self.gated.push(GatedMarker {
                    role: MarkerRole::Start,
                    kind: EntryKind::Solution,
                    line,
                    label: None,
                });
            }
            return;
        }

        let Some(target) = args.map(str::trim).filter(|target| !target.is_empty()) else {
            self.warnings.push(
                self.docname,
                Some(line),
                "solution directive is missing its exercise label argument",
            );
            return;
        };

        let serial = self.next_serial();
        let (options, body_blocks) =
            parse_directive_body(body, line, self.docname, &mut self.warnings);

        let label = options
            .label
            .clone()
            .unwrap_or_else(|| format!("{}-solution-{}", self.docname, serial));

        let mut classes = vec!["solution".to_string()];
        classes.extend(options.classes.iter().cloned());

        if gated {
            self.gated.push(GatedMarker {
                role: MarkerRole::Start,
                kind: EntryKind::Solution,
                line,
                label: Some(label.clone()),
            });
        }

        let block = ExerciseBlock {
            kind: EntryKind::Solution,
            label: label.clone(),
            docname: self.docname.to_string(),
            enumerable: false,
            gated,
            classes,
            serial,
            line,
            title: vec![],
            target_label: Some(target.to_string()),
            body: body_blocks,
        };

        let entry = RegistryEntry::from_block(&block, options.hidden);
        if self.registry.register(entry, &mut self.warnings) == RegisterOutcome::Duplicate {
            return;
        }

        self.order.push(OrderRecord {
            kind: EntryKind::Solution,
            label,
            target_label: Some(target.to_string()),
            line,
        });

        if options.hidden {
            return;
        }
        self.blocks.push(Block::Exercise(block));
    }

    fn gated_end(&mut self, kind: EntryKind, line: usize) {
        self.gated.push(GatedMarker {
            role: MarkerRole::End,
            kind,
            line,
            label: None,
        });

        if kind == EntryKind::Solution && self.settings.hide_solutions {
            return;
        }
        self.blocks.push(Block::GatedEnd { kind, line });
    }
}

/// Splits a directive body into leading `:name: value` options and
/// paragraph blocks. `directive_line` is the fence line; body content
/// starts on the next line.
fn parse_directive_body(
    body: &str,
    directive_line: usize,
    docname: &str,
    warnings: &mut Warnings,
) -> (DirectiveOptions, Vec<Block>) {
    let mut options = DirectiveOptions::default();
    let lines: Vec<&str> = body.lines().collect();
    let first_content_line = directive_line + 1;

    let mut idx = 0;
    while idx < lines.len() {
        let Some(captures) = OPTION_RE.captures(lines[idx]) else {
            break;
        };
        let value = captures.name("value").expect("value group").as_str().trim();
        match captures.name("name").expect("name group").as_str() {
            "label" => options.label = Some(value.to_string()),
            "class" => options
                .classes
                .extend(value.split_whitespace().map(str::to_string)),
            "nonumber" => options.nonumber = true,
            "hidden" => options.hidden = true,
            unknown => warnings.push(
                docname,
                Some(first_content_line + idx),
                format!("unknown directive option: {unknown}"),
            ),
        }
        idx += 1;
    }

    let mut blocks = vec![];
    let mut paragraph: Vec<&str> = vec![];
    let mut paragraph_start = 0;
    for (offset, line_text) in lines.iter().enumerate().skip(idx) {
        if line_text.trim().is_empty() {
            if !paragraph.is_empty() {
                blocks.push(Block::Paragraph {
                    inlines: Inline::parse(&paragraph.join("\n")),
                    line: first_content_line + paragraph_start,
                });
                paragraph.clear();
            }
        } else {
            if paragraph.is_empty() {
                paragraph_start = offset;
            }
            paragraph.push(line_text);
        }
    }
    if !paragraph.is_empty() {
        blocks.push(Block::Paragraph {
            inlines: Inline::parse(&paragraph.join("\n")),
            line: first_content_line + paragraph_start,
        });
    }

    (options, blocks)
}
