//! Markdown document tree
//!
//! The parser produces a [`DocumentNode::Document`] and the renderer walks it.
//! There is deliberately no variant for raw HTML: markup typed by an author is
//! carried as [`DocumentNode::Text`] and escaped on render.

/// A node of the parsed Markdown document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentNode {
    /// Root document container
    Document(Vec<DocumentNode>),

    /// Heading with level (1-6) and inline content
    Heading {
        level: u8,
        children: Vec<DocumentNode>,
    },

    /// Paragraph containing inline content
    Paragraph(Vec<DocumentNode>),

    /// Emphasis (italic)
    Emphasis(Vec<DocumentNode>),

    /// Strong emphasis (bold)
    Strong(Vec<DocumentNode>),

    /// Link with inline content, URL, and optional title
    Link {
        url: String,
        title: Option<String>,
        children: Vec<DocumentNode>,
    },

    /// Image with alt text, URL, and optional title
    Image {
        url: String,
        title: Option<String>,
        alt: String,
    },

    /// Ordered list; `start` is the number of the first item
    ListOrdered {
        start: u32,
        children: Vec<DocumentNode>,
    },

    /// Bullet list
    ListUnordered(Vec<DocumentNode>),

    /// List item containing inline or block content
    ListItem(Vec<DocumentNode>),

    /// Inline code span
    CodeInline(String),

    /// Fenced code block
    CodeBlock {
        language: Option<String>,
        code: String,
    },

    /// Block quote containing nested blocks
    Blockquote(Vec<DocumentNode>),

    /// Literal text, never interpreted as markup downstream
    Text(String),

    /// Hard line break
    LineBreak,

    /// Horizontal rule
    ThematicBreak,
}

impl DocumentNode {
    /// Child nodes of container variants; leaves return an empty slice.
    pub fn children(&self) -> &[DocumentNode] {
        match self {
            DocumentNode::Document(children)
            | DocumentNode::Paragraph(children)
            | DocumentNode::Emphasis(children)
            | DocumentNode::Strong(children)
            | DocumentNode::ListUnordered(children)
            | DocumentNode::ListItem(children)
            | DocumentNode::Blockquote(children)
            | DocumentNode::Heading { children, .. }
            | DocumentNode::Link { children, .. }
            | DocumentNode::ListOrdered { children, .. } => children,
            DocumentNode::Image { .. }
            | DocumentNode::CodeInline(_)
            | DocumentNode::CodeBlock { .. }
            | DocumentNode::Text(_)
            | DocumentNode::LineBreak
            | DocumentNode::ThematicBreak => &[],
        }
    }

    /// Concatenated literal text of this subtree.
    ///
    /// Used for image alt text, where nested formatting is flattened.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            DocumentNode::Text(text) | DocumentNode::CodeInline(text) => out.push_str(text),
            DocumentNode::CodeBlock { code, .. } => out.push_str(code),
            DocumentNode::Image { alt, .. } => out.push_str(alt),
            DocumentNode::LineBreak => out.push('\n'),
            _ => {
                for child in self.children() {
                    child.collect_text(out);
                }
            }
        }
    }
}

/// Merge adjacent `Text` nodes in place.
pub(crate) fn merge_text(nodes: Vec<DocumentNode>) -> Vec<DocumentNode> {
    let mut merged: Vec<DocumentNode> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if let DocumentNode::Text(text) = &node
            && let Some(DocumentNode::Text(prev)) = merged.last_mut()
        {
            prev.push_str(text);
            continue;
        }
        merged.push(node);
    }
    merged
}
