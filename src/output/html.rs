//! HTML emitter.
//!
//! Exercise and solution blocks render as admonition `<div>`s anchored by
//! their label, matching the markup theme stylesheets already target:
//!
//! ```html
//! <div class="admonition exercise" id="ex-1">
//! <p class="admonition-title">Exercise 1 (Addition)</p>
//! <p>body</p>
//! </div>
//! ```
//!
//! Inline math goes out in `\(...\)` delimiters for client-side typesetting.

use std::fmt::Write;

use crate::doctree::{Block, Document, ExerciseBlock, Inline};

use super::escape_html;

/// Renders one resolved document as an HTML fragment.
pub fn render_document(document: &Document) -> String {
    let mut out = String::new();
    render_blocks(&mut out, &document.blocks);
    out
}

fn render_blocks(out: &mut String, blocks: &[Block]) {
    for block in blocks {
        match block {
            Block::Paragraph { inlines, .. } => {
                let _ = writeln!(out, "<p>{}</p>", render_inlines(inlines));
            }
            Block::Exercise(exercise) => render_admonition(out, exercise),
            // Unmatched end markers are fatal before rendering; a matched
            // one was consumed by the merge.
            Block::GatedEnd { .. } => {}
        }
    }
}

fn render_admonition(out: &mut String, exercise: &ExerciseBlock) {
    let _ = writeln!(
        out,
        r#"<div class="admonition {}" id="{}">"#,
        exercise.classes.join(" "),
        escape_html(&exercise.label)
    );
    let _ = writeln!(
        out,
        r#"<p class="admonition-title">{}</p>"#,
        render_inlines(&exercise.title)
    );
    render_blocks(out, &exercise.body);
    out.push_str("</div>\n");
}

fn render_inlines(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.push_str(&escape_html(text)),
            Inline::Math(math) => {
                let _ = write!(
                    out,
                    r#"<span class="math">\({}\)</span>"#,
                    escape_html(math)
                );
            }
            Inline::Link {
                href, children, ..
            } => {
                let _ = write!(
                    out,
                    r#"<a href="{}">{}</a>"#,
                    escape_html(href),
                    render_inlines(children)
                );
            }
            // Unresolved roles degrade to their display text.
            Inline::Ref { target, explicit } => match explicit {
                Some(children) => out.push_str(&render_inlines(children)),
                None => out.push_str(&escape_html(target)),
            },
            Inline::NumRef { format, .. } => out.push_str(&escape_html(format)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doctree::EntryKind;

    fn exercise(title: Vec<Inline>, body: Vec<Block>) -> Document {
        Document {
            docname: "a".to_string(),
            blocks: vec![Block::Exercise(ExerciseBlock {
                kind: EntryKind::Exercise,
                label: "ex-1".to_string(),
                docname: "a".to_string(),
                enumerable: true,
                gated: false,
                classes: vec!["exercise".to_string()],
                serial: 0,
                line: 1,
                title,
                target_label: None,
                body,
            })],
        }
    }

    #[test]
    fn test_admonition_markup_and_anchor() {
        let document = exercise(
            vec![Inline::Text("Exercise 1".to_string())],
            vec![Block::Paragraph {
                inlines: vec![Inline::Text("Body.".to_string())],
                line: 3,
            }],
        );

        let html = render_document(&document);

        assert!(html.contains(r#"<div class="admonition exercise" id="ex-1">"#), "{html}");
        assert!(html.contains(r#"<p class="admonition-title">Exercise 1</p>"#));
        assert!(html.contains("<p>Body.</p>"));
        assert!(html.trim_end().ends_with("</div>"));
    }

    #[test]
    fn test_math_renders_in_client_side_delimiters() {
        let document = exercise(
            vec![
                Inline::Text("Exercise 1 (".to_string()),
                Inline::Math("a^2 < b".to_string()),
                Inline::Text(")".to_string()),
            ],
            vec![],
        );

        let html = render_document(&document);

        assert!(
            html.contains(r#"<span class="math">\(a^2 &lt; b\)</span>"#),
            "{html}"
        );
    }

    #[test]
    fn test_link_title_renders_as_anchor() {
        let document = exercise(
            vec![
                Inline::Text("Solution to ".to_string()),
                Inline::Link {
                    href: "a.html#ex-1".to_string(),
                    refid: "a:ex-1".to_string(),
                    children: vec![Inline::Text("Exercise 1".to_string())],
                },
            ],
            vec![],
        );

        let html = render_document(&document);

        assert!(
            html.contains(r##"Solution to <a href="a.html#ex-1">Exercise 1</a>"##),
            "{html}"
        );
    }

    #[test]
    fn test_body_text_is_escaped() {
        let document = exercise(
            vec![Inline::Text("T".to_string())],
            vec![Block::Paragraph {
                inlines: vec![Inline::Text("if a < b & b > c".to_string())],
                line: 3,
            }],
        );

        let html = render_document(&document);

        assert!(html.contains("<p>if a &lt; b &amp; b &gt; c</p>"), "{html}");
    }
}
