//! The tag and attribute allow-list
//!
//! This table is the single source of truth for both ends of the pipeline:
//! the renderer can only name tags through [`Tag`], and the sanitizer keeps an
//! element only if [`Tag::from_name`] recognises it. Adding a tag here makes it
//! both emittable and permitted; nothing else can be.
//!
//! | Tag | Attributes |
//! |---|---|
//! | `h1`-`h6`, `p`, `em`, `strong`, `blockquote`, `ul`, `li`, `pre`, `br`, `hr` | none |
//! | `ol` | `start` |
//! | `code` | `class` |
//! | `a` | `href`, `title` |
//! | `img` | `src`, `alt`, `title` |

/// An allow-listed HTML element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    P,
    Em,
    Strong,
    A,
    Img,
    Ol,
    Ul,
    Li,
    Code,
    Pre,
    Blockquote,
    Br,
    Hr,
}

/// Per-tag rule: element name, permitted attributes, and which of those
/// attributes carry URLs.
#[derive(Debug, Clone, Copy)]
pub struct TagRule {
    pub tag: Tag,
    pub name: &'static str,
    pub attributes: &'static [&'static str],
    pub url_attributes: &'static [&'static str],
    pub void: bool,
    /// Opening this element implicitly closes an open `<p>`
    pub block: bool,
}

const fn rule(tag: Tag, name: &'static str) -> TagRule {
    TagRule {
        tag,
        name,
        attributes: &[],
        url_attributes: &[],
        void: false,
        block: false,
    }
}

const fn block(tag: Tag, name: &'static str) -> TagRule {
    TagRule {
        block: true,
        ..rule(tag, name)
    }
}

/// The allow-list, in [`Tag`] declaration order.
pub const TAG_RULES: &[TagRule] = &[
    block(Tag::H1, "h1"),
    block(Tag::H2, "h2"),
    block(Tag::H3, "h3"),
    block(Tag::H4, "h4"),
    block(Tag::H5, "h5"),
    block(Tag::H6, "h6"),
    block(Tag::P, "p"),
    rule(Tag::Em, "em"),
    rule(Tag::Strong, "strong"),
    TagRule {
        attributes: &["href", "title"],
        url_attributes: &["href"],
        ..rule(Tag::A, "a")
    },
    TagRule {
        attributes: &["src", "alt", "title"],
        url_attributes: &["src"],
        void: true,
        ..rule(Tag::Img, "img")
    },
    TagRule {
        attributes: &["start"],
        ..block(Tag::Ol, "ol")
    },
    block(Tag::Ul, "ul"),
    block(Tag::Li, "li"),
    TagRule {
        attributes: &["class"],
        ..rule(Tag::Code, "code")
    },
    block(Tag::Pre, "pre"),
    block(Tag::Blockquote, "blockquote"),
    TagRule {
        void: true,
        ..rule(Tag::Br, "br")
    },
    TagRule {
        void: true,
        ..block(Tag::Hr, "hr")
    },
];

impl Tag {
    /// Every allow-listed tag
    pub const ALL: [Tag; 19] = [
        Tag::H1,
        Tag::H2,
        Tag::H3,
        Tag::H4,
        Tag::H5,
        Tag::H6,
        Tag::P,
        Tag::Em,
        Tag::Strong,
        Tag::A,
        Tag::Img,
        Tag::Ol,
        Tag::Ul,
        Tag::Li,
        Tag::Code,
        Tag::Pre,
        Tag::Blockquote,
        Tag::Br,
        Tag::Hr,
    ];

    /// Look up an element name (case-insensitive). `None` means the element
    /// is not allow-listed.
    pub fn from_name(name: &str) -> Option<Tag> {
        TAG_RULES
            .iter()
            .find(|rule| rule.name.eq_ignore_ascii_case(name))
            .map(|rule| rule.tag)
    }

    /// Heading tag for a level; levels outside 1-6 are clamped.
    pub fn heading(level: u8) -> Tag {
        match level {
            0 | 1 => Tag::H1,
            2 => Tag::H2,
            3 => Tag::H3,
            4 => Tag::H4,
            5 => Tag::H5,
            _ => Tag::H6,
        }
    }

    pub fn rule(self) -> &'static TagRule {
        // TAG_RULES is indexed by declaration order
        &TAG_RULES[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.rule().name
    }

    /// Void elements are serialized without an end tag
    pub fn is_void(self) -> bool {
        self.rule().void
    }

    pub fn is_heading(self) -> bool {
        matches!(
            self,
            Tag::H1 | Tag::H2 | Tag::H3 | Tag::H4 | Tag::H5 | Tag::H6
        )
    }

    /// Block elements close an open paragraph when they start
    pub fn is_block(self) -> bool {
        self.rule().block
    }

    pub fn allows_attribute(self, attr_name: &str) -> bool {
        self.rule()
            .attributes
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(attr_name))
    }

    pub fn is_url_attribute(self, attr_name: &str) -> bool {
        self.rule()
            .url_attributes
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(attr_name))
    }
}
