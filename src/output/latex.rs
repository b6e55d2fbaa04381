//! LaTeX emitter.
//!
//! Blocks render as admonition environments carrying a symbolic
//! `\label{docname:label}` so `\hyperref` links typeset across documents in
//! a single combined run. Inline math passes through in `$...$` verbatim.

use std::fmt::Write;

use crate::doctree::{Block, Document, ExerciseBlock, Inline};

/// Renders one resolved document as a LaTeX fragment.
pub fn render_document(document: &Document) -> String {
    let mut out = String::new();
    render_blocks(&mut out, &document.blocks);
    out
}

fn render_blocks(out: &mut String, blocks: &[Block]) {
    for block in blocks {
        match block {
            Block::Paragraph { inlines, .. } => {
                let _ = writeln!(out, "{}\n", render_inlines(inlines));
            }
            Block::Exercise(exercise) => render_environment(out, exercise),
            Block::GatedEnd { .. } => {}
        }
    }
}

fn render_environment(out: &mut String, exercise: &ExerciseBlock) {
    let _ = writeln!(
        out,
        r"\begin{{sphinxadmonition}}{{note}}{{{}}}",
        render_inlines(&exercise.title)
    );
    let _ = writeln!(
        out,
        r"\label{{{}:{}}}",
        escape_latex(&exercise.docname),
        escape_latex(&exercise.label)
    );
    render_blocks(out, &exercise.body);
    out.push_str("\\end{sphinxadmonition}\n");
}

fn render_inlines(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.push_str(&escape_latex(text)),
            Inline::Math(math) => {
                let _ = write!(out, "${math}$");
            }
            Inline::Link {
                refid, children, ..
            } => {
                let _ = write!(
                    out,
                    r"\hyperref[{}]{{{}}}",
                    escape_latex(refid),
                    render_inlines(children)
                );
            }
            Inline::Ref { target, explicit } => match explicit {
                Some(children) => out.push_str(&render_inlines(children)),
                None => out.push_str(&escape_latex(target)),
            },
            Inline::NumRef { format, .. } => out.push_str(&escape_latex(format)),
        }
    }
    out
}

fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            '\\' => out.push_str(r"\textbackslash{}"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doctree::EntryKind;

    fn solution(title: Vec<Inline>) -> Document {
        Document {
            docname: "guide/b".to_string(),
            blocks: vec![Block::Exercise(ExerciseBlock {
                kind: EntryKind::Solution,
                label: "sol-1".to_string(),
                docname: "guide/b".to_string(),
                enumerable: false,
                gated: false,
                classes: vec!["solution".to_string()],
                serial: 0,
                line: 1,
                title,
                target_label: Some("ex-1".to_string()),
                body: vec![Block::Paragraph {
                    inlines: vec![Inline::Text("Answer 100%.".to_string())],
                    line: 3,
                }],
            })],
        }
    }

    #[test]
    fn test_environment_carries_symbolic_label() {
        let latex = render_document(&solution(vec![Inline::Text("Solution".to_string())]));

        assert!(
            latex.contains(r"\begin{sphinxadmonition}{note}{Solution}"),
            "{latex}"
        );
        assert!(latex.contains(r"\label{guide/b:sol-1}"), "{latex}");
        assert!(latex.contains(r"\end{sphinxadmonition}"));
    }

    #[test]
    fn test_link_title_becomes_hyperref() {
        let latex = render_document(&solution(vec![
            Inline::Text("Solution to ".to_string()),
            Inline::Link {
                href: "../a.html#ex-1".to_string(),
                refid: "a:ex-1".to_string(),
                children: vec![Inline::Text("Exercise 1".to_string())],
            },
        ]));

        assert!(
            latex.contains(r"Solution to \hyperref[a:ex-1]{Exercise 1}"),
            "{latex}"
        );
    }

    #[test]
    fn test_math_passes_through_verbatim() {
        let latex = render_document(&solution(vec![
            Inline::Text("Solution to Exercise (".to_string()),
            Inline::Math(r"x_n^2".to_string()),
            Inline::Text(")".to_string()),
        ]));

        assert!(latex.contains(r"($x_n^2$)"), "{latex}");
    }

    #[test]
    fn test_text_specials_are_escaped() {
        let latex = render_document(&solution(vec![Inline::Text("Solution".to_string())]));

        assert!(latex.contains(r"Answer 100\%."), "{latex}");
    }
}
