//! Per-format emitters for resolved document trees.
//!
//! Emitters run after resolution, so the trees they see carry final display
//! titles and hyperlinks. Each backend is a standalone module with one
//! `render_document` entry point.

use std::path::{Path, PathBuf};

pub mod html;
pub mod latex;

/// The relative web path from one document's output page to another's,
/// always `/`-separated and ending in `.html`.
pub fn relative_uri(from_docname: &str, to_docname: &str) -> String {
    let from_dir = Path::new(from_docname)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let target = PathBuf::from(format!("{to_docname}.html"));
    let relative = pathdiff::diff_paths(&target, &from_dir).unwrap_or(target);
    relative.to_string_lossy().replace('\\', "/")
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
