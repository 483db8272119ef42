//! Safe Markdown - untrusted Markdown to sanitized HTML
//!
//! This library turns author-supplied Markdown (vehicle listing descriptions,
//! seller notes) into HTML that can be interpolated straight into a page.
//!
//! # Architecture
//!
//! The transform is three independent stages:
//! - `parser`: Markdown text to a [`DocumentNode`] tree; never fails
//! - `renderer`: tree to HTML, escaping all text and attribute values
//! - `sanitizer`: any HTML to allow-listed HTML; the security boundary
//!
//! Supporting modules:
//! - `allowlist`: the tag/attribute table shared by renderer and sanitizer
//! - `security`: per-element, per-attribute and URL-scheme decisions
//! - `pipeline`: the composed transform, fail-closed
//! - `cache`: BLAKE3-keyed memoization of transform results
//! - `ffi`: C ABI over the pipeline and the sanitizer
//! - `error`: error taxonomy
//!
//! # Examples
//!
//! ```rust
//! use safe_markdown::transform_markdown_sync;
//!
//! let html = transform_markdown_sync("# Title\n\n<script>alert(1)</script>");
//! assert_eq!(html, "<h1>Title</h1>\n<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>\n");
//! ```
//!
//! # Safety
//!
//! The sanitizer never trusts its input, even when it came from the renderer.
//! Every failure path returns an empty string rather than unsanitized markup.

pub mod allowlist;
pub mod ast;
pub mod cache;
pub mod error;
pub mod ffi;
pub mod parser;
pub mod pipeline;
pub mod renderer;
pub mod sanitizer;
pub mod security;

// Re-export main types for convenience
pub use ast::DocumentNode;
pub use error::TransformError;
pub use parser::{MarkdownParser, parse_markdown};
pub use pipeline::{MarkdownPipeline, PipelineOptions, transform_markdown, transform_markdown_sync};
pub use renderer::{HtmlRenderer, render_html};
pub use sanitizer::{SanitizedHtml, Sanitizer, sanitize_html};
