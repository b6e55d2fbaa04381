//! The in-memory document tree the pipeline operates on.
//!
//! The tree is deliberately small: block structure is only as deep as the
//! exercise machinery needs (paragraph-level bodies), and inline structure
//! covers exactly the pieces title resolution must preserve: plain text,
//! `$math$` carried verbatim, `{ref}`/`{numref}` roles, and the hyperlinks
//! produced by resolution.
//!
//! Node kinds are closed enums checked by value. There is no open class
//! hierarchy here; "is this an exercise node" is always a `kind` match.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Which directive family a registry entry or block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntryKind {
    Exercise,
    Solution,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Exercise => "exercise",
            EntryKind::Solution => "solution",
        }
    }

    /// Directive name of the start marker for this kind.
    pub fn start_directive(&self) -> &'static str {
        match self {
            EntryKind::Exercise => "exercise-start",
            EntryKind::Solution => "solution-start",
        }
    }

    /// Directive name of the end marker for this kind.
    pub fn end_directive(&self) -> &'static str {
        match self {
            EntryKind::Exercise => "exercise-end",
            EntryKind::Solution => "solution-end",
        }
    }
}

/// Inline content. `Link` never comes out of the parser; it is produced by
/// the solution-title resolution pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Inline {
    Text(String),
    /// Inline math, source between the dollar signs, never re-escaped.
    Math(String),
    /// A `{ref}` role. `explicit` holds author-provided display text, which
    /// resolution must never rewrite.
    Ref {
        target: String,
        explicit: Option<Vec<Inline>>,
    },
    /// A numbered reference: display format with `%s` substituted by the
    /// target's assigned ordinal at render time.
    NumRef { target: String, format: String },
    /// A resolved hyperlink. `href` is the relative web target, `refid` the
    /// symbolic `<docname>:<label>` form used by the typesetting output.
    Link {
        href: String,
        refid: String,
        children: Vec<Inline>,
    },
}

static INLINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{(?<role>ref|numref)\}`(?<body>[^`]+)`|\$(?<math>[^\$\n]+)\$").unwrap()
});

static EXPLICIT_TARGET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?<display>.*\S)\s*<(?<target>[^<>]+)>$").unwrap());

impl Inline {
    /// Parses a run of source text into inlines, extracting roles and math.
    pub fn parse(text: &str) -> Vec<Inline> {
        let mut inlines = vec![];
        let mut cursor = 0;

        for captures in INLINE_RE.captures_iter(text) {
            let whole = captures.get(0).expect("capture 0 always present");
            if whole.start() > cursor {
                inlines.push(Inline::Text(text[cursor..whole.start()].to_string()));
            }
            cursor = whole.end();

            if let Some(math) = captures.name("math") {
                inlines.push(Inline::Math(math.as_str().to_string()));
                continue;
            }

            let role = captures.name("role").expect("role or math matched");
            let body = captures.name("body").expect("role bodies are non-empty");
            inlines.push(parse_role(role.as_str(), body.as_str()));
        }

        if cursor < text.len() {
            inlines.push(Inline::Text(text[cursor..].to_string()));
        }

        inlines
    }

    /// Flattens inlines to display text. Math keeps its dollar delimiters so
    /// the plain form stays round-trippable to the authored source.
    pub fn plain_text(inlines: &[Inline]) -> String {
        let mut out = String::new();
        for inline in inlines {
            match inline {
                Inline::Text(text) => out.push_str(text),
                Inline::Math(math) => {
                    out.push('$');
                    out.push_str(math);
                    out.push('$');
                }
                Inline::Ref { target, explicit } => match explicit {
                    Some(children) => out.push_str(&Inline::plain_text(children)),
                    None => out.push_str(target),
                },
                Inline::NumRef { format, .. } => out.push_str(format),
                Inline::Link { children, .. } => out.push_str(&Inline::plain_text(children)),
            }
        }
        out
    }
}

fn parse_role(role: &str, body: &str) -> Inline {
    match EXPLICIT_TARGET_RE.captures(body.trim()) {
        Some(captures) => {
            let display = captures.name("display").expect("display group").as_str();
            let target = captures
                .name("target")
                .expect("target group")
                .as_str()
                .to_string();
            match role {
                "numref" => Inline::NumRef {
                    target,
                    format: display.trim().to_string(),
                },
                _ => Inline::Ref {
                    target,
                    explicit: Some(Inline::parse(display.trim())),
                },
            }
        }
        None => {
            let target = body.trim().to_string();
            match role {
                // A bare {numref}`label` inherits the category format at
                // resolution time; an empty format marks that state.
                "numref" => Inline::NumRef {
                    target,
                    format: String::new(),
                },
                _ => Inline::Ref {
                    target,
                    explicit: None,
                },
            }
        }
    }
}

/// An exercise or solution admonition in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseBlock {
    pub kind: EntryKind,
    pub label: String,
    pub docname: String,
    /// Numbered by the numbering assigner unless `:nonumber:` was given.
    /// Solutions are never enumerable.
    pub enumerable: bool,
    /// Set on `-start` directives until the gated merger consumes the
    /// matching end marker.
    pub gated: bool,
    pub classes: Vec<String>,
    pub serial: usize,
    pub line: usize,
    /// Custom subtitle inlines (the directive argument), empty when none.
    pub title: Vec<Inline>,
    /// Solutions only: the exercise label this answers.
    pub target_label: Option<String>,
    pub body: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph { inlines: Vec<Inline>, line: usize },
    Exercise(ExerciseBlock),
    /// An `exercise-end` / `solution-end` marker awaiting the gated merger.
    GatedEnd { kind: EntryKind, line: usize },
}

impl Block {
    pub fn line(&self) -> usize {
        match self {
            Block::Paragraph { line, .. } => *line,
            Block::Exercise(block) => block.line,
            Block::GatedEnd { line, .. } => *line,
        }
    }
}

/// A parsed source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Relative path without extension, `/`-separated.
    pub docname: String,
    pub blocks: Vec<Block>,
}

impl Document {
    /// Visits every inline in the document (paragraphs, exercise subtitles
    /// and bodies), depth first, allowing mutation.
    pub fn for_each_inline_mut(&mut self, f: &mut impl FnMut(&mut Inline)) {
        for_each_inline_in_blocks(&mut self.blocks, f);
    }

    /// All exercise/solution blocks in the document, depth first.
    pub fn exercise_blocks(&self) -> Vec<&ExerciseBlock> {
        let mut found = vec![];
        collect_exercises(&self.blocks, &mut found);
        found
    }
}

fn for_each_inline_in_blocks(blocks: &mut [Block], f: &mut impl FnMut(&mut Inline)) {
    for block in blocks {
        match block {
            Block::Paragraph { inlines, .. } => inlines.iter_mut().for_each(&mut *f),
            Block::Exercise(exercise) => {
                exercise.title.iter_mut().for_each(&mut *f);
                for_each_inline_in_blocks(&mut exercise.body, f);
            }
            Block::GatedEnd { .. } => {}
        }
    }
}

fn collect_exercises<'a>(blocks: &'a [Block], found: &mut Vec<&'a ExerciseBlock>) {
    for block in blocks {
        if let Block::Exercise(exercise) = block {
            found.push(exercise);
            collect_exercises(&exercise.body, found);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_text() {
        let inlines = Inline::parse("just words");
        assert_eq!(inlines, vec![Inline::Text("just words".to_string())]);
    }

    #[test]
    fn test_parse_bare_ref_role() {
        let inlines = Inline::parse("see {ref}`ex-1` here");
        assert_eq!(
            inlines,
            vec![
                Inline::Text("see ".to_string()),
                Inline::Ref {
                    target: "ex-1".to_string(),
                    explicit: None,
                },
                Inline::Text(" here".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_ref_role_with_explicit_text() {
        let inlines = Inline::parse("{ref}`the first exercise <ex-1>`");
        assert_eq!(
            inlines,
            vec![Inline::Ref {
                target: "ex-1".to_string(),
                explicit: Some(vec![Inline::Text("the first exercise".to_string())]),
            }]
        );
    }

    #[test]
    fn test_parse_numref_role_with_format() {
        let inlines = Inline::parse("{numref}`Exercise %s <ex-1>`");
        assert_eq!(
            inlines,
            vec![Inline::NumRef {
                target: "ex-1".to_string(),
                format: "Exercise %s".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_inline_math_kept_verbatim() {
        let inlines = Inline::parse(r"solve $a^2 + b^2$ now");
        assert_eq!(
            inlines,
            vec![
                Inline::Text("solve ".to_string()),
                Inline::Math(r"a^2 + b^2".to_string()),
                Inline::Text(" now".to_string()),
            ]
        );
    }

    #[test]
    fn test_explicit_ref_text_may_contain_math() {
        let inlines = Inline::parse("{ref}`solve $x$ <ex-math>`");
        assert_eq!(
            inlines,
            vec![Inline::Ref {
                target: "ex-math".to_string(),
                explicit: Some(vec![
                    Inline::Text("solve ".to_string()),
                    Inline::Math("x".to_string()),
                ]),
            }]
        );
    }

    #[test]
    fn test_plain_text_keeps_math_delimiters() {
        let inlines = vec![
            Inline::Text("Exercise 1 (".to_string()),
            Inline::Math("n!".to_string()),
            Inline::Text(")".to_string()),
        ];
        assert_eq!(Inline::plain_text(&inlines), "Exercise 1 ($n!$)");
    }
}
