//! HTML sanitizer - the security boundary
//!
//! The sanitizer accepts any string, parses it with html5ever (the same
//! permissive, HTML5-conformant tree builder browsers use) and re-serializes
//! only what the allow-list in [`crate::allowlist`] permits. Nothing is ever
//! copied from the input verbatim: every tag, attribute and text run in the
//! output is written by this module.
//!
//! # Algorithm
//!
//! 1. Parse the input into an `RcDom` document and locate `<body>`.
//! 2. Walk the body's subtree depth-first:
//!    - elements whose tag is not allow-listed are dropped with all
//!      their descendants (so `<script>` text never surfaces);
//!    - allow-listed elements keep only the attributes the
//!      [`SecurityValidator`] approves (`on*` is always stripped, URL
//!      attributes are checked against the scheme allow-list);
//!    - text is escaped for `& < > " '`;
//!    - comments, doctypes and processing instructions are dropped.
//! 3. If the walk fails (nesting deeper than the configured limit, or a
//!    panic), the result is empty. The input is never returned.
//!
//! # Idempotence
//!
//! `sanitize(sanitize(s)) == sanitize(s)` holds because the serialized tree
//! re-parses to itself. A few shapes html5ever can build (through foster
//! parenting out of tables, for instance) would re-parse differently, so they
//! are dropped during the walk:
//!
//! - a block element anywhere inside a `<p>`
//! - an `<li>` inside an `<li>` with no list or other block container between
//! - a heading directly inside a heading
//! - an `<a>` inside an `<a>`
//!
//! Leading whitespace of the document is not emitted (the tree builder
//! discards it before `<body>` exists), and a `<pre>` whose text starts with a
//! newline gets one extra newline (the tree builder swallows the first).
//!
//! # Examples
//!
//! ```rust
//! use safe_markdown::sanitizer::sanitize_html;
//!
//! let clean = sanitize_html("<p onclick=\"x()\">Hi<script>alert(1)</script></p>");
//! assert_eq!(clean.as_str(), "<p>Hi</p>");
//! ```

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::cell::Ref;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use html5ever::Attribute;

use crate::allowlist::Tag;
use crate::error::TransformError;
use crate::renderer::push_escaped;
use crate::security::{MAX_NESTING_DEPTH, SanitizeAction, SecurityValidator};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Sanitizer configuration
#[derive(Debug, Clone)]
pub struct SanitizerOptions {
    /// Maximum element nesting depth; deeper input fails closed
    pub max_depth: usize,
    /// Keep raster `data:image/*` URLs on `img src`
    pub allow_data_images: bool,
}

impl Default for SanitizerOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_NESTING_DEPTH,
            allow_data_images: true,
        }
    }
}

/// HTML that has passed through the sanitizer
///
/// Only [`Sanitizer`] can construct a non-empty value, so holding a
/// `SanitizedHtml` means the allow-list has been applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SanitizedHtml(String);

impl SanitizedHtml {
    /// The empty result returned when sanitization fails
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for SanitizedHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SanitizedHtml {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<SanitizedHtml> for String {
    fn from(html: SanitizedHtml) -> Self {
        html.0
    }
}

/// Allow-list HTML sanitizer
///
/// # Examples
///
/// ```rust
/// use safe_markdown::sanitizer::{Sanitizer, SanitizerOptions};
///
/// let sanitizer = Sanitizer::with_options(SanitizerOptions {
///     allow_data_images: false,
///     ..Default::default()
/// });
/// let html = sanitizer.sanitize(r#"<img src="data:image/png;base64,AAAA" alt="x">"#);
/// assert_eq!(html.as_str(), r#"<img alt="x">"#);
/// ```
#[derive(Debug, Clone)]
pub struct Sanitizer {
    validator: SecurityValidator,
}

impl Sanitizer {
    /// Create a sanitizer with default options
    pub fn new() -> Self {
        Self::with_options(SanitizerOptions::default())
    }

    /// Create a sanitizer with custom options
    pub fn with_options(options: SanitizerOptions) -> Self {
        Self {
            validator: SecurityValidator::with_max_depth(options.max_depth)
                .allow_data_images(options.allow_data_images),
        }
    }

    /// Sanitize `html`, failing closed
    ///
    /// Any error or panic inside sanitization yields an empty result.
    pub fn sanitize(&self, html: &str) -> SanitizedHtml {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.try_sanitize(html)))
            .unwrap_or(Err(TransformError::SanitizerPanic));

        match outcome {
            Ok(clean) => clean,
            Err(err) => {
                tracing::warn!(code = err.code(), "sanitizer failed closed: {}", err);
                SanitizedHtml::empty()
            }
        }
    }

    /// Sanitize `html`, reporting failures
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::NestingTooDeep`] when the parsed tree nests
    /// allow-listed elements deeper than `max_depth`.
    pub fn try_sanitize(&self, html: &str) -> Result<SanitizedHtml, TransformError> {
        if html.is_empty() {
            return Ok(SanitizedHtml::empty());
        }

        let dom = parse_document(RcDom::default(), Default::default()).one(html);

        let Some(body) = find_body(&dom.document) else {
            tracing::debug!("parsed document has no body");
            return Ok(SanitizedHtml::empty());
        };

        let mut serializer = Serializer::new(&self.validator, html.len());
        serializer.walk_children(&body, Context::default(), 0)?;
        Ok(SanitizedHtml(serializer.finish()))
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Sanitize HTML with default options
pub fn sanitize_html(html: &str) -> SanitizedHtml {
    Sanitizer::new().sanitize(html)
}

fn is_html_element(node: &Handle, local: &str) -> bool {
    match node.data {
        NodeData::Element { ref name, .. } => {
            let ns: &str = name.ns.as_ref();
            let tag: &str = name.local.as_ref();
            ns == HTML_NAMESPACE && tag == local
        }
        _ => false,
    }
}

fn find_child(node: &Handle, local: &str) -> Option<Handle> {
    node.children
        .borrow()
        .iter()
        .find(|child| is_html_element(child, local))
        .cloned()
}

fn find_body(document: &Handle) -> Option<Handle> {
    let html = find_child(document, "html")?;
    find_child(&html, "body")
}

/// Ancestor facts needed to keep the output stable under re-parsing
#[derive(Debug, Clone, Copy, Default)]
struct Context {
    in_paragraph: bool,
    in_list_item: bool,
    in_link: bool,
    parent: Option<Tag>,
}

impl Context {
    fn misnesting(&self, tag: Tag) -> Option<&'static str> {
        if self.in_paragraph && tag.is_block() {
            Some("block element inside paragraph")
        } else if self.in_list_item && tag == Tag::Li {
            Some("list item inside list item")
        } else if tag.is_heading() && self.parent.is_some_and(Tag::is_heading) {
            Some("heading inside heading")
        } else if self.in_link && tag == Tag::A {
            Some("link inside link")
        } else {
            None
        }
    }

    fn enter(self, tag: Tag) -> Context {
        Context {
            in_paragraph: self.in_paragraph || tag == Tag::P,
            in_list_item: match tag {
                Tag::Li => true,
                Tag::P | Tag::Em | Tag::Strong | Tag::A | Tag::Code => self.in_list_item,
                _ => false,
            },
            in_link: self.in_link || tag == Tag::A,
            parent: Some(tag),
        }
    }
}

struct Serializer<'a> {
    validator: &'a SecurityValidator,
    output: String,
    /// Set right after `<pre>` until its first content is written
    pre_start: bool,
}

impl<'a> Serializer<'a> {
    fn new(validator: &'a SecurityValidator, capacity: usize) -> Self {
        Self {
            validator,
            output: String::with_capacity(capacity),
            pre_start: false,
        }
    }

    fn finish(self) -> String {
        let trimmed = self
            .output
            .trim_start_matches(['\t', '\n', '\x0C', '\r', ' ']);
        if trimmed.len() == self.output.len() {
            self.output
        } else {
            trimmed.to_string()
        }
    }

    fn walk_children(
        &mut self,
        node: &Handle,
        ctx: Context,
        depth: usize,
    ) -> Result<(), TransformError> {
        for child in node.children.borrow().iter() {
            self.walk(child, ctx, depth)?;
        }
        Ok(())
    }

    fn walk(&mut self, node: &Handle, ctx: Context, depth: usize) -> Result<(), TransformError> {
        match node.data {
            NodeData::Text { ref contents } => {
                let text = contents.borrow();
                if text.is_empty() {
                    return Ok(());
                }
                if std::mem::take(&mut self.pre_start) && text.starts_with('\n') {
                    self.output.push('\n');
                }
                push_escaped(&mut self.output, &text);
            }

            NodeData::Element {
                ref name,
                ref attrs,
                ..
            } => {
                let tag_name: &str = name.local.as_ref();
                let ns: &str = name.ns.as_ref();

                if ns != HTML_NAMESPACE
                    || self.validator.check_element(tag_name) == SanitizeAction::Remove
                {
                    tracing::debug!(element = tag_name, "removed element");
                    return Ok(());
                }
                let Some(tag) = Tag::from_name(tag_name) else {
                    return Ok(());
                };

                if let Some(reason) = ctx.misnesting(tag) {
                    tracing::debug!(element = tag_name, reason, "removed misnested element");
                    return Ok(());
                }

                let depth = depth + 1;
                self.validator.validate_depth(depth)?;

                self.pre_start = false;
                self.open_tag(tag, attrs.borrow());
                if tag.is_void() {
                    return Ok(());
                }

                self.pre_start = tag == Tag::Pre;
                self.walk_children(node, ctx.enter(tag), depth)?;
                self.pre_start = false;

                self.output.push_str("</");
                self.output.push_str(tag.name());
                self.output.push('>');
            }

            NodeData::Document => self.walk_children(node, ctx, depth)?,

            NodeData::Comment { .. }
            | NodeData::Doctype { .. }
            | NodeData::ProcessingInstruction { .. } => {}
        }

        Ok(())
    }

    fn open_tag(&mut self, tag: Tag, attrs: Ref<'_, Vec<Attribute>>) {
        self.output.push('<');
        self.output.push_str(tag.name());

        for attr in attrs.iter() {
            let attr_name: &str = attr.name.local.as_ref();
            let attr_ns: &str = attr.name.ns.as_ref();
            let value: &str = &attr.value;

            if !attr_ns.is_empty() {
                tracing::debug!(
                    element = tag.name(),
                    attribute = attr_name,
                    "stripped namespaced attribute"
                );
                continue;
            }

            match self.validator.check_attribute(tag, attr_name, value) {
                SanitizeAction::Allow => {
                    self.output.push(' ');
                    self.output.push_str(&attr_name.to_ascii_lowercase());
                    self.output.push_str("=\"");
                    push_escaped(&mut self.output, value);
                    self.output.push('"');
                }
                SanitizeAction::StripUrl => {
                    tracing::debug!(
                        element = tag.name(),
                        attribute = attr_name,
                        "stripped disallowed URL"
                    );
                }
                SanitizeAction::StripAttribute | SanitizeAction::Remove => {
                    tracing::debug!(
                        element = tag.name(),
                        attribute = attr_name,
                        "stripped attribute"
                    );
                }
            }
        }

        self.output.push('>');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn clean(html: &str) -> String {
        sanitize_html(html).into_string()
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(clean(""), "");
        assert_eq!(clean("   \n  "), "");
    }

    #[test]
    fn test_allowed_markup_is_preserved() {
        let html = "<h1>Title</h1>\n<p>Some <strong>bold</strong> and <em>it</em>.</p>\n";
        assert_eq!(clean(html), html);
    }

    #[test]
    fn test_script_removed_with_content() {
        assert_eq!(clean("<p>a<script>alert(1)</script>b</p>"), "<p>ab</p>");
        assert_eq!(clean("<script>alert(1)</script>"), "");
    }

    #[test]
    fn test_style_iframe_object_removed() {
        assert_eq!(
            clean("<style>p{}</style><iframe src=x></iframe><object data=y></object><p>ok</p>"),
            "<p>ok</p>"
        );
    }

    #[test]
    fn test_unknown_container_removed_with_descendants() {
        assert_eq!(clean("<div><p>inside</p></div><p>outside</p>"), "<p>outside</p>");
    }

    #[test]
    fn test_event_handlers_stripped() {
        assert_eq!(
            clean("<img src=x onerror=alert(1)>"),
            "<img src=\"x\">"
        );
        assert_eq!(clean("<a href=\"/x\" OnMouseOver=\"evil()\">x</a>"), "<a href=\"/x\">x</a>");
    }

    #[test]
    fn test_javascript_href_stripped() {
        assert_eq!(clean("<a href='javascript:evil()'>x</a>"), "<a>x</a>");
        assert_eq!(clean("<a href=\"&#106;avascript:evil()\">x</a>"), "<a>x</a>");
        assert_eq!(clean("<a href=\" JaVa&#9;ScRiPt:evil()\">x</a>"), "<a>x</a>");
    }

    #[test]
    fn test_data_urls() {
        assert_eq!(
            clean("<img src=\"data:image/png;base64,iVBO\">"),
            "<img src=\"data:image/png;base64,iVBO\">"
        );
        assert_eq!(clean("<img src=\"data:image/svg+xml,<svg onload=x>\">"), "<img>");
        assert_eq!(clean("<a href=\"data:text/html,<script>x</script>\">x</a>"), "<a>x</a>");
    }

    #[test]
    fn test_mailto_only_on_links() {
        assert_eq!(
            clean("<a href=\"mailto:sales@example.com\">mail</a>"),
            "<a href=\"mailto:sales@example.com\">mail</a>"
        );
        assert_eq!(clean("<img src=\"mailto:x@y.z\">"), "<img>");
    }

    #[test]
    fn test_disallowed_attributes_stripped() {
        assert_eq!(
            clean("<p style=\"color:red\" class=\"x\" id=\"y\">t</p>"),
            "<p>t</p>"
        );
        assert_eq!(
            clean("<code class=\"language-rust\">x</code><code class=\"evil\">y</code>"),
            "<code class=\"language-rust\">x</code><code>y</code>"
        );
        assert_eq!(
            clean("<ol start=\"3\"><li>a</li></ol><ol start=\"-1\"><li>b</li></ol>"),
            "<ol start=\"3\"><li>a</li></ol><ol><li>b</li></ol>"
        );
    }

    #[test]
    fn test_text_is_escaped_not_reinterpreted() {
        assert_eq!(
            clean("<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>"),
            "<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>"
        );
        assert_eq!(clean("<p>Tom's \"car\"</p>"), "<p>Tom&#39;s &quot;car&quot;</p>");
    }

    #[test]
    fn test_comments_and_doctype_dropped() {
        assert_eq!(clean("<!DOCTYPE html><!-- hi --><p>x</p><?php echo 1 ?>"), "<p>x</p>");
    }

    #[test]
    fn test_void_elements_have_no_end_tag() {
        assert_eq!(clean("<p>a<br/>b</p><hr></hr>"), "<p>a<br>b</p><hr>");
    }

    #[test]
    fn test_svg_namespace_elements_removed() {
        assert_eq!(clean("<svg><a href=\"/x\">x</a></svg><p>y</p>"), "<p>y</p>");
    }

    #[test]
    fn test_pre_leading_newline_survives_reparse() {
        let once = clean("<pre>\n\nindented</pre>");
        assert_eq!(once, "<pre>\n\nindented</pre>");
        assert_eq!(clean(&once), once);
    }

    #[test]
    fn test_foster_parented_paragraphs_are_stable() {
        let once = clean("<p><table><p>x</p></table>");
        assert_eq!(clean(&once), once);
        let once = clean("<li><table><li>x</li></table></li>");
        assert_eq!(clean(&once), once);
        let once = clean("<h1><table><h2>x</h2></table></h1>");
        assert_eq!(clean(&once), once);
        let once = clean("<a href=\"/a\"><table><a href=\"/b\">x</a></table></a>");
        assert_eq!(clean(&once), once);
    }

    #[test]
    fn test_leading_whitespace_is_not_emitted() {
        assert_eq!(clean("  \n hello"), "hello");
    }

    #[test]
    fn test_nesting_too_deep_fails_closed() {
        let sanitizer = Sanitizer::with_options(SanitizerOptions {
            max_depth: 2,
            ..Default::default()
        });
        let input = "<p><em><strong>x</strong></em></p>";
        assert!(matches!(
            sanitizer.try_sanitize(input),
            Err(TransformError::NestingTooDeep { depth: 3, max: 2 })
        ));
        assert!(sanitizer.sanitize(input).is_empty());
    }

    #[test]
    fn test_default_depth_limit() {
        let input = format!("{}x", "<em>".repeat(MAX_NESTING_DEPTH + 10));
        assert_eq!(clean(&input), "");
    }

    fn adversarial_html() -> impl Strategy<Value = String> {
        let fragments = prop::sample::select(vec![
            "<script>alert(1)</script>",
            "<img src=x onerror=alert(1)>",
            "<a href='javascript:evil()'>x</a>",
            "<a href=\"java\tscript:x\">y</a>",
            "<svg onload=alert(1)>",
            "<p onclick=\"x\">",
            "</p>",
            "<table><tr><td>",
            "<li>",
            "<pre>\n",
            "<h1>",
            "<a href=/ok>",
            "</a>",
            "<em>",
            "<strong>",
            "<!--",
            "-->",
            "<iframe src=//evil>",
            "<style>",
            "<textarea>",
            "<template>",
            "<noscript>",
            "<math><mi>",
            "<img src=\"data:image/png;base64,AA\">",
            "&lt;script&gt;",
            "text ",
            "\n",
            "<",
            ">",
            "\"",
            "'",
        ]);
        prop::collection::vec(fragments, 0..24).prop_map(|parts| parts.concat())
    }

    fn assert_safe(output: &str) {
        let lower = output.to_ascii_lowercase();
        assert!(!lower.contains("<script"), "{output}");
        assert!(!lower.contains("javascript:"), "{output}");
        assert!(!lower.contains(" on"), "{output}");
    }

    proptest! {
        #[test]
        fn prop_adversarial_output_is_safe(input in adversarial_html()) {
            assert_safe(&clean(&input));
        }

        #[test]
        fn prop_adversarial_output_is_idempotent(input in adversarial_html()) {
            let once = clean(&input);
            prop_assert_eq!(clean(&once), once);
        }

        #[test]
        fn prop_arbitrary_input_is_idempotent(input in "\\PC{0,120}") {
            let once = clean(&input);
            prop_assert_eq!(clean(&once), once);
        }
    }
}
