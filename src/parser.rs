//! Markdown parser - builds the document tree from author text
//!
//! Parsing never fails. Anything the parser cannot make sense of ends up as
//! literal [`DocumentNode::Text`], which the renderer escapes.
//!
//! # Two Phases
//!
//! 1. **Blocks**: the input is split into lines and grouped into headings,
//!    paragraphs, fenced/indented code, lists, block quotes and thematic
//!    breaks. Container blocks (quotes, list items) re-enter the block phase
//!    on their de-indented lines.
//! 2. **Inlines**: the text of each leaf block is scanned for emphasis,
//!    strong emphasis, code spans, links, images, autolinks, escapes and
//!    hard breaks.
//!
//! Inline scanning is confined to one leaf block, so an unterminated `*` or
//! `[` can never swallow the paragraphs or headings that follow it; it simply
//! stays literal text.
//!
//! # Supported Syntax
//!
//! - ATX headings (`#` to `######`) and setext headings (`===` / `---`)
//! - Paragraphs separated by blank lines, with lazy continuation
//! - `*em*`, `_em_`, `**strong**`, `__strong__`
//! - `` `code` `` spans and ```` ``` ```` / `~~~` fences with an info string
//! - Four-space indented code blocks
//! - `[text](url "title")`, `![alt](url "title")`, `<https://…>` autolinks
//! - `-`, `*`, `+` bullet lists and `1.` / `1)` ordered lists, nested by indentation
//! - `>` block quotes
//! - `---`, `***`, `___` thematic breaks
//! - Hard breaks from two trailing spaces or a trailing backslash
//!
//! # Examples
//!
//! ```rust
//! use safe_markdown::ast::DocumentNode;
//! use safe_markdown::parser::parse_markdown;
//!
//! let doc = parse_markdown("# Title\n\nSome **bold** text.");
//! let DocumentNode::Document(blocks) = doc else { unreachable!() };
//! assert_eq!(blocks.len(), 2);
//! ```
//!
//! # Nesting Limits
//!
//! Quotes, lists and inline brackets deeper than [`ParseOptions::max_nesting`]
//! are no longer recognised and degrade to text. This keeps every recursive
//! walk downstream bounded by input structure the parser has accepted.

use regex::Regex;
use std::sync::OnceLock;

use crate::ast::{DocumentNode, merge_text};

/// Default nesting limit for container blocks and inline brackets
pub const DEFAULT_MAX_NESTING: usize = 32;

/// Parser configuration
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Maximum depth of nested quotes/lists/inline constructs
    pub max_nesting: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }
}

/// A recognised list item marker at the start of a line
#[derive(Debug, Clone, PartialEq, Eq)]
struct ListMarker {
    /// `-`, `*`, `+` for bullets; `.` or `)` for ordered lists
    delimiter: char,
    ordered: bool,
    number: u32,
    /// Column at which item content starts
    content_offset: usize,
    content: String,
}

impl ListMarker {
    fn continues(&self, other: &ListMarker) -> bool {
        self.ordered == other.ordered && self.delimiter == other.delimiter
    }
}

/// An opening code fence
#[derive(Debug, Clone)]
struct Fence {
    marker: char,
    length: usize,
    indent: usize,
    language: Option<String>,
}

/// Parsed pieces of `[label](url "title")`
#[derive(Debug)]
struct LinkParts {
    label: Vec<char>,
    url: String,
    title: Option<String>,
    end: usize,
}

/// Markdown parser
///
/// Holds only configuration; every call to [`MarkdownParser::parse`] builds a
/// fresh tree, so one parser can be shared freely.
#[derive(Debug, Clone, Default)]
pub struct MarkdownParser {
    options: ParseOptions,
}

impl MarkdownParser {
    /// Create a parser with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with custom options
    pub fn with_options(options: ParseOptions) -> Self {
        Self { options }
    }

    /// Parse Markdown text into a `Document` node
    ///
    /// Empty or whitespace-only input yields an empty document.
    pub fn parse(&self, text: &str) -> DocumentNode {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        let lines: Vec<String> = normalized.split('\n').map(expand_leading_tabs).collect();

        let blocks = self.parse_blocks(&lines, 0);
        tracing::trace!(blocks = blocks.len(), "parsed markdown document");
        DocumentNode::Document(blocks)
    }

    fn can_nest(&self, depth: usize) -> bool {
        depth < self.options.max_nesting
    }

    // ------------------------------------------------------------------
    // Block phase
    // ------------------------------------------------------------------

    fn parse_blocks(&self, lines: &[String], depth: usize) -> Vec<DocumentNode> {
        let mut blocks = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let line = &lines[i];

            if is_blank(line) {
                i += 1;
                continue;
            }

            if let Some(fence) = fence_start(line) {
                let (block, next) = parse_fenced_code(lines, i, &fence);
                blocks.push(block);
                i = next;
                continue;
            }

            if leading_spaces(line) >= 4 {
                let (block, next) = parse_indented_code(lines, i);
                blocks.push(block);
                i = next;
                continue;
            }

            if let Some((level, content)) = atx_heading(line) {
                blocks.push(DocumentNode::Heading {
                    level,
                    children: self.parse_inline_str(&content, depth),
                });
                i += 1;
                continue;
            }

            if is_thematic_break(line) {
                blocks.push(DocumentNode::ThematicBreak);
                i += 1;
                continue;
            }

            if self.can_nest(depth) && is_blockquote_line(line) {
                let (block, next) = self.parse_blockquote(lines, i, depth);
                blocks.push(block);
                i = next;
                continue;
            }

            if self.can_nest(depth)
                && let Some(marker) = list_marker(line)
            {
                let (block, next) = self.parse_list(lines, i, &marker, depth);
                blocks.push(block);
                i = next;
                continue;
            }

            let (block, next) = self.parse_paragraph(lines, i, depth);
            blocks.push(block);
            i = next;
        }

        blocks
    }

    /// Whether `line` may interrupt a paragraph
    fn interrupts_paragraph(&self, line: &str, depth: usize) -> bool {
        if fence_start(line).is_some() || atx_heading(line).is_some() || is_thematic_break(line) {
            return true;
        }
        if !self.can_nest(depth) {
            return false;
        }
        if is_blockquote_line(line) {
            return true;
        }
        match list_marker(line) {
            Some(marker) => {
                !marker.content.trim().is_empty() && (!marker.ordered || marker.number == 1)
            }
            None => false,
        }
    }

    fn parse_paragraph(
        &self,
        lines: &[String],
        start: usize,
        depth: usize,
    ) -> (DocumentNode, usize) {
        let mut collected: Vec<&str> = vec![lines[start].trim_start()];
        let mut i = start + 1;

        while i < lines.len() {
            let line = &lines[i];
            if is_blank(line) {
                break;
            }
            if let Some(level) = setext_underline(line) {
                let text = collected.join("\n");
                return (
                    DocumentNode::Heading {
                        level,
                        children: self.parse_inline_str(text.trim(), depth),
                    },
                    i + 1,
                );
            }
            if self.interrupts_paragraph(line, depth) {
                break;
            }
            collected.push(line.trim_start());
            i += 1;
        }

        let text = collected.join("\n");
        (
            DocumentNode::Paragraph(self.parse_inline_str(text.trim_end(), depth)),
            i,
        )
    }

    fn parse_blockquote(
        &self,
        lines: &[String],
        start: usize,
        depth: usize,
    ) -> (DocumentNode, usize) {
        let mut inner: Vec<String> = Vec::new();
        let mut i = start;

        while i < lines.len() {
            let line = &lines[i];
            if is_blockquote_line(line) {
                inner.push(strip_blockquote_marker(line));
                i += 1;
                continue;
            }
            // Lazy continuation of a quoted paragraph
            if !is_blank(line)
                && !self.interrupts_paragraph(line, depth)
                && list_marker(line).is_none()
                && leaves_paragraph_open(&inner)
            {
                inner.push(line.trim_start().to_string());
                i += 1;
                continue;
            }
            break;
        }

        (
            DocumentNode::Blockquote(self.parse_blocks(&inner, depth + 1)),
            i,
        )
    }

    fn parse_list(
        &self,
        lines: &[String],
        start: usize,
        first: &ListMarker,
        depth: usize,
    ) -> (DocumentNode, usize) {
        let mut items: Vec<Vec<String>> = Vec::new();
        let mut current: Vec<String> = vec![first.content.clone()];
        let mut content_offset = first.content_offset;
        let mut pending_blank = 0usize;
        let mut loose = false;
        let mut i = start + 1;

        while i < lines.len() {
            let line = &lines[i];

            if is_blank(line) {
                pending_blank += 1;
                i += 1;
                continue;
            }

            if leading_spaces(line) >= content_offset {
                if pending_blank > 0 {
                    loose = true;
                    current.extend(std::iter::repeat_n(String::new(), pending_blank));
                }
                current.push(line[content_offset..].to_string());
                pending_blank = 0;
                i += 1;
                continue;
            }

            if !is_thematic_break(line)
                && let Some(marker) = list_marker(line)
                && marker.continues(first)
            {
                if pending_blank > 0 {
                    loose = true;
                }
                items.push(std::mem::take(&mut current));
                current.push(marker.content.clone());
                content_offset = marker.content_offset;
                pending_blank = 0;
                i += 1;
                continue;
            }

            // A marker that does not continue this list ends it
            if !is_thematic_break(line) && list_marker(line).is_some() {
                break;
            }

            if pending_blank == 0
                && !self.interrupts_paragraph(line, depth)
                && leaves_paragraph_open(&current)
            {
                current.push(line.trim_start().to_string());
                i += 1;
                continue;
            }

            break;
        }
        items.push(current);

        let children: Vec<DocumentNode> = items
            .iter()
            .map(|item_lines| {
                let blocks = self.parse_blocks(item_lines, depth + 1);
                DocumentNode::ListItem(if loose { blocks } else { tighten(blocks) })
            })
            .collect();

        let list = if first.ordered {
            DocumentNode::ListOrdered {
                start: first.number,
                children,
            }
        } else {
            DocumentNode::ListUnordered(children)
        };
        (list, i)
    }

    // ------------------------------------------------------------------
    // Inline phase
    // ------------------------------------------------------------------

    fn parse_inline_str(&self, text: &str, depth: usize) -> Vec<DocumentNode> {
        let chars: Vec<char> = text.chars().collect();
        self.parse_inline(&chars, depth, false)
    }

    fn parse_inline(&self, chars: &[char], depth: usize, in_link: bool) -> Vec<DocumentNode> {
        if depth > self.options.max_nesting {
            return vec![DocumentNode::Text(chars.iter().collect())];
        }

        let mut nodes = Vec::new();
        let mut text = String::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            match c {
                '\\' => match chars.get(i + 1) {
                    Some('\n') => {
                        trim_trailing_spaces(&mut text);
                        flush_text(&mut text, &mut nodes);
                        nodes.push(DocumentNode::LineBreak);
                        i += 2;
                    }
                    Some(&next) if next.is_ascii_punctuation() => {
                        text.push(next);
                        i += 2;
                    }
                    _ => {
                        text.push('\\');
                        i += 1;
                    }
                },

                '`' => {
                    let run = run_length(chars, i, '`');
                    match find_code_span_close(chars, i + run, run) {
                        Some(close) => {
                            flush_text(&mut text, &mut nodes);
                            nodes.push(DocumentNode::CodeInline(normalize_code_span(
                                &chars[i + run..close],
                            )));
                            i = close + run;
                        }
                        None => {
                            text.extend(std::iter::repeat_n('`', run));
                            i += run;
                        }
                    }
                }

                '!' if !in_link && chars.get(i + 1) == Some(&'[') => {
                    match parse_link_parts(chars, i + 1) {
                        Some(parts) => {
                            let label = self.parse_inline(&parts.label, depth + 1, true);
                            let alt = DocumentNode::Document(label).text_content();
                            flush_text(&mut text, &mut nodes);
                            nodes.push(DocumentNode::Image {
                                url: parts.url,
                                title: parts.title,
                                alt,
                            });
                            i = parts.end;
                        }
                        None => {
                            text.push('!');
                            i += 1;
                        }
                    }
                }

                '[' if !in_link => match parse_link_parts(chars, i) {
                    Some(parts) => {
                        let children = self.parse_inline(&parts.label, depth + 1, true);
                        flush_text(&mut text, &mut nodes);
                        nodes.push(DocumentNode::Link {
                            url: parts.url,
                            title: parts.title,
                            children,
                        });
                        i = parts.end;
                    }
                    None => {
                        text.push('[');
                        i += 1;
                    }
                },

                '<' if !in_link => match parse_autolink(chars, i) {
                    Some((url, label, end)) => {
                        flush_text(&mut text, &mut nodes);
                        nodes.push(DocumentNode::Link {
                            url,
                            title: None,
                            children: vec![DocumentNode::Text(label)],
                        });
                        i = end;
                    }
                    None => {
                        text.push('<');
                        i += 1;
                    }
                },

                '*' | '_' => {
                    let run = run_length(chars, i, c);
                    match self.parse_emphasis(chars, i, run, depth, in_link) {
                        Some((node, end)) => {
                            flush_text(&mut text, &mut nodes);
                            nodes.push(node);
                            i = end;
                        }
                        None => {
                            text.extend(std::iter::repeat_n(c, run));
                            i += run;
                        }
                    }
                }

                '\n' => {
                    let trailing = text.len() - text.trim_end_matches(' ').len();
                    trim_trailing_spaces(&mut text);
                    if trailing >= 2 {
                        flush_text(&mut text, &mut nodes);
                        nodes.push(DocumentNode::LineBreak);
                    } else {
                        text.push('\n');
                    }
                    i += 1;
                }

                _ => {
                    text.push(c);
                    i += 1;
                }
            }
        }

        flush_text(&mut text, &mut nodes);
        merge_text(nodes)
    }

    /// Try to open emphasis at `start`, a delimiter run of length `run`
    fn parse_emphasis(
        &self,
        chars: &[char],
        start: usize,
        run: usize,
        depth: usize,
        in_link: bool,
    ) -> Option<(DocumentNode, usize)> {
        let delim = chars[start];
        let after = start + run;

        // Opener must be left-flanking; `_` may not open inside a word
        if chars.get(after).is_none_or(|next| next.is_whitespace()) {
            return None;
        }
        if delim == '_' && start > 0 && chars[start - 1].is_alphanumeric() {
            return None;
        }

        for width in [2usize, 1] {
            if width > run {
                continue;
            }
            let Some((content_end, end)) = find_emphasis_close(chars, after, delim, width) else {
                continue;
            };
            let inner = &chars[start + width..content_end];
            if inner.is_empty() {
                continue;
            }
            let children = self.parse_inline(inner, depth + 1, in_link);
            let node = if width == 2 {
                DocumentNode::Strong(children)
            } else {
                DocumentNode::Emphasis(children)
            };
            return Some((node, end));
        }

        None
    }
}

/// Parse Markdown with default options
pub fn parse_markdown(text: &str) -> DocumentNode {
    MarkdownParser::new().parse(text)
}

// ----------------------------------------------------------------------
// Line classification
// ----------------------------------------------------------------------

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn leading_spaces(line: &str) -> usize {
    line.bytes().take_while(|b| *b == b' ').count()
}

fn expand_leading_tabs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for (idx, c) in line.char_indices() {
        match c {
            ' ' => {
                out.push(' ');
                column += 1;
            }
            '\t' => {
                let width = 4 - column % 4;
                out.extend(std::iter::repeat_n(' ', width));
                column += width;
            }
            _ => {
                out.push_str(&line[idx..]);
                return out;
            }
        }
    }
    out
}

fn atx_heading(line: &str) -> Option<(u8, String)> {
    let indent = leading_spaces(line);
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let level = rest.bytes().take_while(|b| *b == b'#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let after = &rest[level..];
    if !after.is_empty() && !after.starts_with([' ', '\t']) {
        return None;
    }

    let mut content = after.trim();
    let without_closing = content.trim_end_matches('#');
    if without_closing.is_empty() {
        content = "";
    } else if without_closing.ends_with([' ', '\t']) {
        content = without_closing.trim_end();
    }

    Some((level as u8, content.to_string()))
}

fn setext_underline(line: &str) -> Option<u8> {
    if leading_spaces(line) > 3 {
        return None;
    }
    let trimmed = line.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b == b'=') {
        Some(1)
    } else if !trimmed.is_empty() && trimmed.bytes().all(|b| b == b'-') {
        Some(2)
    } else {
        None
    }
}

fn is_thematic_break(line: &str) -> bool {
    if leading_spaces(line) > 3 {
        return false;
    }
    let mut marker = None;
    let mut count = 0;
    for c in line.chars() {
        match c {
            ' ' | '\t' => {}
            '-' | '*' | '_' => {
                if marker.is_some_and(|m| m != c) {
                    return false;
                }
                marker = Some(c);
                count += 1;
            }
            _ => return false,
        }
    }
    count >= 3
}

/// Strip any blockquote and list item markers opening `line`
fn container_content(line: &str) -> String {
    let mut content = line.to_string();
    loop {
        if is_blockquote_line(&content) {
            content = strip_blockquote_marker(&content);
        } else if !is_thematic_break(&content)
            && let Some(marker) = list_marker(&content)
        {
            content = marker.content;
        } else {
            return content;
        }
    }
}

/// Whether the last of `lines` is a paragraph line a lazy line may continue
///
/// Headings, thematic breaks, setext underlines, code blocks and blank lines
/// all close the paragraph; an unclosed fence keeps everything after it.
fn leaves_paragraph_open(lines: &[String]) -> bool {
    let mut fence: Option<Fence> = None;
    let mut paragraph = false;

    for line in lines {
        let content = container_content(line);
        if let Some(open) = &fence {
            if is_closing_fence(&content, open) {
                fence = None;
            }
            continue;
        }
        if is_blank(&content) {
            paragraph = false;
        } else if let Some(open) = fence_start(&content) {
            fence = Some(open);
            paragraph = false;
        } else if !paragraph && leading_spaces(&content) >= 4 {
            // indented code
        } else if atx_heading(&content).is_some() || is_thematic_break(&content) {
            paragraph = false;
        } else if paragraph && setext_underline(&content).is_some() {
            paragraph = false;
        } else {
            paragraph = true;
        }
    }

    fence.is_none() && paragraph
}

fn is_blockquote_line(line: &str) -> bool {
    leading_spaces(line) <= 3 && line.trim_start().starts_with('>')
}

fn strip_blockquote_marker(line: &str) -> String {
    let rest = &line.trim_start()[1..];
    rest.strip_prefix(' ').unwrap_or(rest).to_string()
}

fn list_marker(line: &str) -> Option<ListMarker> {
    static LIST_MARKER_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    let regex = LIST_MARKER_REGEX
        .get_or_init(|| Regex::new(r"^( {0,3})(?:([-+*])|([0-9]{1,9})([.)]))(?:( +)(.*))?$").ok())
        .as_ref()?;

    let caps = regex.captures(line)?;
    let indent = caps.get(1).map_or(0, |m| m.len());
    let (delimiter, ordered, number, marker_len) = match (caps.get(2), caps.get(3), caps.get(4)) {
        (Some(bullet), _, _) => (bullet.as_str().chars().next()?, false, 1, 1),
        (None, Some(digits), Some(delim)) => (
            delim.as_str().chars().next()?,
            true,
            digits.as_str().parse::<u32>().ok()?,
            digits.len() + 1,
        ),
        _ => return None,
    };

    let spaces = caps.get(5).map_or(0, |m| m.len());
    let content = caps.get(6).map_or("", |m| m.as_str());

    // Five or more spaces after the marker means indented content; the item
    // itself starts one column after the marker.
    let (spacing, content) = if spaces == 0 || spaces > 4 || content.is_empty() {
        (1, format!("{}{}", " ".repeat(spaces.saturating_sub(1)), content))
    } else {
        (spaces, content.to_string())
    };

    Some(ListMarker {
        delimiter,
        ordered,
        number,
        content_offset: indent + marker_len + spacing,
        content: if content.trim().is_empty() {
            String::new()
        } else {
            content
        },
    })
}

fn fence_start(line: &str) -> Option<Fence> {
    static FENCE_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    let regex = FENCE_REGEX
        .get_or_init(|| Regex::new(r"^( {0,3})(`{3,}|~{3,})[ \t]*(.*)$").ok())
        .as_ref()?;

    let caps = regex.captures(line)?;
    let fence = caps.get(2)?.as_str();
    let marker = fence.chars().next()?;
    let info = caps.get(3).map_or("", |m| m.as_str().trim());

    // Backtick fences cannot carry backticks in their info string
    if marker == '`' && info.contains('`') {
        return None;
    }

    Some(Fence {
        marker,
        length: fence.len(),
        indent: caps.get(1).map_or(0, |m| m.len()),
        language: info.split_whitespace().next().map(str::to_string),
    })
}

fn is_closing_fence(line: &str, fence: &Fence) -> bool {
    if leading_spaces(line) > 3 {
        return false;
    }
    let trimmed = line.trim();
    let run = trimmed.chars().take_while(|c| *c == fence.marker).count();
    run >= fence.length && trimmed.chars().all(|c| c == fence.marker)
}

fn parse_fenced_code(lines: &[String], start: usize, fence: &Fence) -> (DocumentNode, usize) {
    let mut body: Vec<&str> = Vec::new();
    let mut i = start + 1;
    let mut closed = false;

    while i < lines.len() {
        let line = &lines[i];
        if is_closing_fence(line, fence) {
            closed = true;
            i += 1;
            break;
        }
        let strip = leading_spaces(line).min(fence.indent);
        body.push(&line[strip..]);
        i += 1;
    }

    // An unterminated fence runs to the end of the document
    if !closed {
        while body.last().is_some_and(|l| is_blank(l)) {
            body.pop();
        }
    }

    let mut code = body.join("\n");
    if !body.is_empty() {
        code.push('\n');
    }

    (
        DocumentNode::CodeBlock {
            language: fence.language.clone(),
            code,
        },
        i,
    )
}

fn parse_indented_code(lines: &[String], start: usize) -> (DocumentNode, usize) {
    let mut body: Vec<&str> = Vec::new();
    let mut i = start;

    while i < lines.len() {
        let line = &lines[i];
        if is_blank(line) {
            body.push("");
        } else if leading_spaces(line) >= 4 {
            body.push(&line[4..]);
        } else {
            break;
        }
        i += 1;
    }

    while body.last().is_some_and(|l| l.is_empty()) {
        body.pop();
    }

    let mut code = body.join("\n");
    code.push('\n');
    (DocumentNode::CodeBlock { language: None, code }, i)
}

/// Tight list items show paragraph content inline
fn tighten(blocks: Vec<DocumentNode>) -> Vec<DocumentNode> {
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        match block {
            DocumentNode::Paragraph(children) => out.extend(children),
            other => out.push(other),
        }
    }
    merge_text(out)
}

// ----------------------------------------------------------------------
// Inline helpers
// ----------------------------------------------------------------------

fn flush_text(text: &mut String, nodes: &mut Vec<DocumentNode>) {
    if !text.is_empty() {
        nodes.push(DocumentNode::Text(std::mem::take(text)));
    }
}

fn trim_trailing_spaces(text: &mut String) {
    let len = text.trim_end_matches(' ').len();
    text.truncate(len);
}

fn run_length(chars: &[char], start: usize, c: char) -> usize {
    chars[start..].iter().take_while(|&&x| x == c).count()
}

fn find_code_span_close(chars: &[char], from: usize, run: usize) -> Option<usize> {
    let mut k = from;
    while k < chars.len() {
        if chars[k] == '`' {
            let r = run_length(chars, k, '`');
            if r == run {
                return Some(k);
            }
            k += r;
        } else {
            k += 1;
        }
    }
    None
}

fn normalize_code_span(content: &[char]) -> String {
    let text: String = content
        .iter()
        .map(|&c| if c == '\n' { ' ' } else { c })
        .collect();
    if text.len() >= 2 && text.starts_with(' ') && text.ends_with(' ') && !text.trim().is_empty() {
        text[1..text.len() - 1].to_string()
    } else {
        text
    }
}

/// Find the closing delimiter run for emphasis of `width` opened before `from`.
///
/// Returns `(content_end, end)`: where the emphasised content stops and where
/// parsing resumes. Inner openers of the same delimiter are matched first so
/// `*a **b** c*` closes on the final `*`.
fn find_emphasis_close(
    chars: &[char],
    from: usize,
    delim: char,
    width: usize,
) -> Option<(usize, usize)> {
    let mut inner_openers = 0usize;
    let mut k = from;

    while k < chars.len() {
        let c = chars[k];

        if c == '\\' {
            k += 2;
            continue;
        }

        if c == '`' {
            let r = run_length(chars, k, '`');
            k = match find_code_span_close(chars, k + r, r) {
                Some(close) => close + r,
                None => k + r,
            };
            continue;
        }

        if c != delim {
            k += 1;
            continue;
        }

        let r = run_length(chars, k, delim);
        let prev = chars[k - 1];
        let next = chars.get(k + r).copied();

        let mut right = !prev.is_whitespace();
        let mut left = next.is_some_and(|n| !n.is_whitespace());
        if delim == '_' {
            right = right && !next.is_some_and(|n| n.is_alphanumeric());
            left = left && !prev.is_alphanumeric();
        }

        if right {
            if inner_openers > 0 {
                inner_openers -= 1;
            } else if r >= width {
                return Some((k + r - width, k + r));
            }
        } else if left {
            inner_openers += 1;
        }

        k += r;
    }

    None
}

/// Find the `]` matching the `[` at `open`
fn find_label_close(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut k = open;

    while k < chars.len() {
        match chars[k] {
            '\\' => {
                k += 2;
                continue;
            }
            '`' => {
                let r = run_length(chars, k, '`');
                k = match find_code_span_close(chars, k + r, r) {
                    Some(close) => close + r,
                    None => k + r,
                };
                continue;
            }
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(k);
                }
            }
            _ => {}
        }
        k += 1;
    }

    None
}

fn unescape(chars: &[char]) -> String {
    let mut out = String::with_capacity(chars.len());
    let mut k = 0;
    while k < chars.len() {
        if chars[k] == '\\' && chars.get(k + 1).is_some_and(|c| c.is_ascii_punctuation()) {
            out.push(chars[k + 1]);
            k += 2;
        } else {
            out.push(chars[k]);
            k += 1;
        }
    }
    out
}

fn skip_whitespace(chars: &[char], mut k: usize) -> usize {
    while k < chars.len() && chars[k].is_whitespace() {
        k += 1;
    }
    k
}

/// Parse `[label](destination "title")` starting at the `[` at `open`
fn parse_link_parts(chars: &[char], open: usize) -> Option<LinkParts> {
    let close = find_label_close(chars, open)?;
    if chars.get(close + 1) != Some(&'(') {
        return None;
    }

    let mut k = skip_whitespace(chars, close + 2);

    let url = if chars.get(k) == Some(&'<') {
        let start = k + 1;
        let end = start + chars[start..].iter().position(|&c| c == '>' || c == '\n')?;
        if chars[end] != '>' {
            return None;
        }
        k = end + 1;
        unescape(&chars[start..end])
    } else {
        let start = k;
        let mut parens = 0usize;
        while k < chars.len() {
            let c = chars[k];
            if c == '\\' && k + 1 < chars.len() {
                k += 2;
                continue;
            }
            if c.is_whitespace() || c.is_ascii_control() {
                break;
            }
            if c == '(' {
                parens += 1;
            } else if c == ')' {
                if parens == 0 {
                    break;
                }
                parens -= 1;
            }
            k += 1;
        }
        unescape(&chars[start..k])
    };

    let before_title = k;
    k = skip_whitespace(chars, k);

    let mut title = None;
    if k > before_title
        && let Some(&quote) = chars.get(k)
        && matches!(quote, '"' | '\'' | '(')
    {
        let closing = if quote == '(' { ')' } else { quote };
        let start = k + 1;
        let mut end = start;
        while end < chars.len() && chars[end] != closing {
            if chars[end] == '\\' {
                end += 1;
            }
            end += 1;
        }
        if end >= chars.len() {
            return None;
        }
        title = Some(unescape(&chars[start..end]));
        k = skip_whitespace(chars, end + 1);
    }

    if chars.get(k) != Some(&')') {
        return None;
    }

    Some(LinkParts {
        label: chars[open + 1..close].to_vec(),
        url,
        title,
        end: k + 1,
    })
}

/// Parse `<scheme:…>` or `<user@host>` at `open`
fn parse_autolink(chars: &[char], open: usize) -> Option<(String, String, usize)> {
    let start = open + 1;
    let len = chars[start..]
        .iter()
        .position(|&c| c == '>' || c == '<' || c.is_whitespace())?;
    let end = start + len;
    if chars[end] != '>' || len == 0 {
        return None;
    }

    let inner: String = chars[start..end].iter().collect();
    let lower = inner.to_ascii_lowercase();

    if ["http://", "https://", "mailto:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return Some((inner.clone(), inner, end + 1));
    }

    if is_email_address(&inner) {
        return Some((format!("mailto:{inner}"), inner, end + 1));
    }

    None
}

fn is_email_address(text: &str) -> bool {
    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ".!#$%&'*+/=?^_`{|}~-".contains(c))
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}
