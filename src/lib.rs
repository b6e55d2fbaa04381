//! myst-exercise: exercise and solution admonitions for MyST Markdown builds
//!
//! This crate turns `{exercise}` and `{solution}` directives in MyST
//! Markdown sources into numbered, cross-referenced admonitions.
//!
//! # Overview
//!
//! A build over a source tree provides:
//!
//! - **Directive extraction**: `{exercise}`, `{solution}` and their gated
//!   `-start`/`-end` variants, with labels, classes and visibility options
//! - **A label registry**: one entry per declaration, with duplicate
//!   detection and an incremental purge/merge lifecycle
//! - **Gated merging**: content between a start/end pair is folded into the
//!   declaration, after a fatal well-formedness check
//! - **Numbering**: sequential ordinals for enumerable exercises, with
//!   configurable display formats
//! - **Resolution**: exercise and solution display titles, and `{ref}` /
//!   `{numref}` roles resolved into hyperlinks
//! - **Emitters**: HTML and LaTeX fragments per document
//!
//! # Architecture
//!
//! The pipeline is organized around a few key modules:
//!
//! - [`directive`]: per-document parsing into a small block tree
//! - [`registry`]: the build-wide label registry
//! - [`build`]: the [`build::Builder`] lifecycle and phase ordering
//! - [`resolve`]: the ordered title/reference resolution passes
//! - [`output`]: the per-format emitters
//!
//! # Usage
//!
//! This crate backs the `myst-exercise` binary, and the same API serves
//! programmatic callers:
//!
//! ```ignore
//! use myst_exercise::build;
//! use myst_exercise::config::Settings;
//!
//! let settings = Settings::new(&root)?;
//! let build = build::build(&settings, &root)?;
//! eprintln!("{}", build.warnings);
//! ```

// Core pipeline modules
pub mod build;
pub mod directive;
pub mod doctree;
pub mod gated;
pub mod numbering;
pub mod order_validation;
pub mod registry;
pub mod resolve;

// Output backends
pub mod output;

// Configuration and reporting
pub mod config;
pub mod diagnostics;

// Test utilities (only available in test builds)
#[cfg(test)]
pub mod test_utils;
