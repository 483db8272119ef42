//! HTML renderer - projects the Markdown document tree into markup
//!
//! The renderer is a single exhaustive walk over [`DocumentNode`]. Every tag
//! it writes comes from [`crate::allowlist::Tag`], so its vocabulary cannot
//! drift from what the sanitizer lets through.
//!
//! # Escaping
//!
//! Text node values and every attribute value (`href`, `src`, `alt`, `title`)
//! are escaped for `& < > " '` before they reach the output. This is a second
//! line of defence; the sanitizer still runs on the result.
//!
//! # Output Shape
//!
//! ```text
//! Heading        -> <hN>…</hN>
//! Paragraph      -> <p>…</p>
//! Emphasis       -> <em>…</em>
//! Strong         -> <strong>…</strong>
//! Link           -> <a href="…" title="…">…</a>
//! Image          -> <img src="…" alt="…" title="…">
//! CodeInline     -> <code>…</code>
//! CodeBlock      -> <pre><code class="language-…">…</code></pre>
//! ListOrdered    -> <ol start="…"><li>…</li></ol>
//! ListUnordered  -> <ul><li>…</li></ul>
//! Blockquote     -> <blockquote>…</blockquote>
//! LineBreak      -> <br>
//! ThematicBreak  -> <hr>
//! ```
//!
//! Block elements are followed by a newline so the markup stays readable.

use crate::allowlist::Tag;
use crate::ast::DocumentNode;
use crate::security::is_language_name;

/// Escape the five HTML-significant characters
///
/// # Examples
///
/// ```
/// use safe_markdown::renderer::escape_html;
///
/// assert_eq!(escape_html("<b>\"Tom\" & 'Jerry'</b>"),
///     "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;");
/// ```
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    push_escaped(&mut out, text);
    out
}

/// Append `text` to `out` with HTML escaping applied
pub fn push_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

/// Renders a [`DocumentNode`] tree to an HTML string
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlRenderer;

impl HtmlRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render a node (normally a `Document`) to HTML
    ///
    /// # Examples
    ///
    /// ```
    /// use safe_markdown::ast::DocumentNode;
    /// use safe_markdown::renderer::HtmlRenderer;
    ///
    /// let doc = DocumentNode::Document(vec![DocumentNode::Heading {
    ///     level: 1,
    ///     children: vec![DocumentNode::Text("Title".into())],
    /// }]);
    /// assert_eq!(HtmlRenderer::new().render(&doc), "<h1>Title</h1>\n");
    /// ```
    pub fn render(&self, node: &DocumentNode) -> String {
        let mut output = String::with_capacity(256);
        self.render_node(node, &mut output);
        output
    }

    fn render_node(&self, node: &DocumentNode, out: &mut String) {
        match node {
            DocumentNode::Document(children) => self.render_children(children, out),

            DocumentNode::Heading { level, children } => {
                self.render_block(Tag::heading(*level), children, out)
            }

            DocumentNode::Paragraph(children) => self.render_block(Tag::P, children, out),

            DocumentNode::Emphasis(children) => self.render_inline(Tag::Em, children, out),

            DocumentNode::Strong(children) => self.render_inline(Tag::Strong, children, out),

            DocumentNode::Link {
                url,
                title,
                children,
            } => {
                open_tag(out, Tag::A);
                push_attribute(out, "href", url);
                if let Some(title) = title {
                    push_attribute(out, "title", title);
                }
                out.push('>');
                self.render_children(children, out);
                close_tag(out, Tag::A);
            }

            DocumentNode::Image { url, title, alt } => {
                open_tag(out, Tag::Img);
                push_attribute(out, "src", url);
                push_attribute(out, "alt", alt);
                if let Some(title) = title {
                    push_attribute(out, "title", title);
                }
                out.push('>');
            }

            DocumentNode::ListOrdered { start, children } => {
                open_tag(out, Tag::Ol);
                if *start != 1 {
                    push_attribute(out, "start", &start.to_string());
                }
                out.push_str(">\n");
                self.render_children(children, out);
                close_tag(out, Tag::Ol);
                out.push('\n');
            }

            DocumentNode::ListUnordered(children) => {
                open_tag(out, Tag::Ul);
                out.push_str(">\n");
                self.render_children(children, out);
                close_tag(out, Tag::Ul);
                out.push('\n');
            }

            DocumentNode::ListItem(children) => self.render_block(Tag::Li, children, out),

            DocumentNode::CodeInline(code) => {
                open_tag(out, Tag::Code);
                out.push('>');
                push_escaped(out, code);
                close_tag(out, Tag::Code);
            }

            DocumentNode::CodeBlock { language, code } => {
                open_tag(out, Tag::Pre);
                out.push('>');
                open_tag(out, Tag::Code);
                if let Some(language) = language.as_deref().filter(|l| is_language_name(l)) {
                    push_attribute(out, "class", &format!("language-{language}"));
                }
                out.push('>');
                push_escaped(out, code);
                close_tag(out, Tag::Code);
                close_tag(out, Tag::Pre);
                out.push('\n');
            }

            DocumentNode::Blockquote(children) => {
                open_tag(out, Tag::Blockquote);
                out.push_str(">\n");
                self.render_children(children, out);
                close_tag(out, Tag::Blockquote);
                out.push('\n');
            }

            DocumentNode::Text(text) => push_escaped(out, text),

            DocumentNode::LineBreak => {
                open_tag(out, Tag::Br);
                out.push_str(">\n");
            }

            DocumentNode::ThematicBreak => {
                open_tag(out, Tag::Hr);
                out.push_str(">\n");
            }
        }
    }

    fn render_children(&self, children: &[DocumentNode], out: &mut String) {
        for child in children {
            self.render_node(child, out);
        }
    }

    fn render_inline(&self, tag: Tag, children: &[DocumentNode], out: &mut String) {
        open_tag(out, tag);
        out.push('>');
        self.render_children(children, out);
        close_tag(out, tag);
    }

    fn render_block(&self, tag: Tag, children: &[DocumentNode], out: &mut String) {
        self.render_inline(tag, children, out);
        out.push('\n');
    }
}

fn open_tag(out: &mut String, tag: Tag) {
    out.push('<');
    out.push_str(tag.name());
}

fn close_tag(out: &mut String, tag: Tag) {
    out.push_str("</");
    out.push_str(tag.name());
    out.push('>');
}

fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    push_escaped(out, value);
    out.push('"');
}

/// Render a document tree with the default renderer
pub fn render_html(node: &DocumentNode) -> String {
    HtmlRenderer::new().render(node)
}
