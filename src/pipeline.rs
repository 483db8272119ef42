//! Markdown to safe HTML transform
//!
//! Chains the three stages:
//!
//! ```text
//! raw text --parse--> DocumentNode --render--> HTML --sanitize--> safe HTML
//! ```
//!
//! Each stage is usable on its own ([`crate::parser`], [`crate::renderer`],
//! [`crate::sanitizer`]); this module only wires them together and enforces
//! the fail-closed contract at the boundary. Whatever happens inside, the
//! caller gets a `String` that has been through the sanitizer, or `""`.

use std::panic::{self, AssertUnwindSafe};

use crate::error::TransformError;
use crate::parser::{MarkdownParser, ParseOptions};
use crate::renderer::HtmlRenderer;
use crate::sanitizer::{Sanitizer, SanitizerOptions};

/// Options for the whole transform
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub parse: ParseOptions,
    pub sanitizer: SanitizerOptions,
}

/// Markdown to sanitized HTML pipeline
///
/// The pipeline holds only configuration and is safe to share between
/// threads; concurrent transforms do not interact.
///
/// # Examples
///
/// ```rust
/// use safe_markdown::pipeline::MarkdownPipeline;
///
/// let pipeline = MarkdownPipeline::new();
/// let html = pipeline.transform("# 2019 Civic\n\nOne **careful** owner.");
/// assert_eq!(html, "<h1>2019 Civic</h1>\n<p>One <strong>careful</strong> owner.</p>\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MarkdownPipeline {
    parser: MarkdownParser,
    renderer: HtmlRenderer,
    sanitizer: Sanitizer,
}

impl MarkdownPipeline {
    /// Create a pipeline with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pipeline with custom options
    pub fn with_options(options: PipelineOptions) -> Self {
        Self {
            parser: MarkdownParser::with_options(options.parse),
            renderer: HtmlRenderer::new(),
            sanitizer: Sanitizer::with_options(options.sanitizer),
        }
    }

    /// Transform Markdown into sanitized HTML
    ///
    /// Never fails: any internal error or panic produces an empty string.
    pub fn transform(&self, markdown: &str) -> String {
        match self.try_transform(markdown) {
            Ok(html) => html,
            Err(err) => {
                tracing::warn!(code = err.code(), "transform failed closed");
                String::new()
            }
        }
    }

    /// Transform Markdown into sanitized HTML, reporting failures
    ///
    /// # Errors
    ///
    /// Returns the sanitizer's error, or [`TransformError::SanitizerPanic`]
    /// if any stage panicked.
    pub fn try_transform(&self, markdown: &str) -> Result<String, TransformError> {
        if markdown.is_empty() {
            return Ok(String::new());
        }

        panic::catch_unwind(AssertUnwindSafe(|| {
            let document = self.parser.parse(markdown);
            let html = self.renderer.render(&document);
            self.sanitizer.try_sanitize(&html)
        }))
        .map_err(|_| TransformError::SanitizerPanic)?
        .map(String::from)
    }
}

/// Transform Markdown into sanitized HTML with default options
///
/// The transform itself is synchronous and CPU-bound; the async signature
/// lets display code await it alongside other work without blocking on a
/// separate API.
///
/// # Examples
///
/// ```rust
/// # async fn demo() {
/// let html = safe_markdown::transform_markdown("**bold**").await;
/// assert_eq!(html, "<p><strong>bold</strong></p>\n");
/// # }
/// ```
pub async fn transform_markdown(markdown: &str) -> String {
    transform_markdown_sync(markdown)
}

/// Synchronous form of [`transform_markdown`]
pub fn transform_markdown_sync(markdown: &str) -> String {
    MarkdownPipeline::new().transform(markdown)
}
