//! Formatting tree: the inline region of one block, independent of any
//! render target.
//!
//! Built fresh on every render of an inline-bearing block, then handed to
//! the [`patch`](super::patch) module. Mark nodes keep a reference to the
//! syntax node they came from; plain-text runs have none and always render
//! as `text[from..to]`.

use smallvec::SmallVec;

use super::schema::MarkKind;
use crate::syntax::{NodeKind, Span, SyntaxNode};
use crate::utils::url::sanitize_href;

/// Attributes computed for link and image marks.
pub type Attrs = SmallVec<[(&'static str, String); 2]>;

/// One node of the formatting tree.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatNode<'s> {
    /// Originating syntax node; `None` for plain text
    pub origin: Option<&'s SyntaxNode>,
    pub span: Span,
    pub children: Vec<FormatNode<'s>>,
    pub attrs: Option<Box<Attrs>>,
}

impl<'s> FormatNode<'s> {
    pub fn text(span: Span) -> Self {
        Self {
            origin: None,
            span,
            children: Vec::new(),
            attrs: None,
        }
    }

    pub fn mark(origin: &'s SyntaxNode, span: Span, children: Vec<Self>) -> Self {
        Self {
            origin: Some(origin),
            span,
            children,
            attrs: None,
        }
    }

    fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = Some(Box::new(attrs));
        self
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        self.origin.is_none()
    }

    /// Mark kind of the originating node (`None` for text).
    pub fn mark_kind(&self) -> Option<MarkKind> {
        self.origin.and_then(|o| MarkKind::of(o.kind))
    }

    pub fn attrs(&self) -> &[(&'static str, String)] {
        self.attrs.as_deref().map_or(&[], |a| a.as_slice())
    }

    /// Text covered by a plain-text leaf, or the concatenated text of a
    /// mark's leaves.
    pub fn plain_text(&self, source: &str) -> String {
        if self.is_text() {
            return self.span.slice(source).to_owned();
        }
        self.children.iter().map(|c| c.plain_text(source)).collect()
    }
}

/// Build the formatting tree for an inline-bearing block.
///
/// The root carries the block as its origin; blocks without inline content
/// produce a root with no children.
pub fn build_tree<'s>(source: &str, block: &'s SyntaxNode) -> FormatNode<'s> {
    let (children, span) = match block.inline_region() {
        Some((region, inline)) => (build_region(source, region, inline), region),
        None => (Vec::new(), block.span),
    };
    FormatNode::mark(block, span, children)
}

/// Walk `children` across `region`, emitting text leaves for the gaps.
///
/// Instruction children render nothing; the cursor skips over them.
/// Hard breaks are the exception and stay as marks.
pub fn build_region<'s>(
    source: &str,
    region: Span,
    children: &'s [SyntaxNode],
) -> Vec<FormatNode<'s>> {
    let mut out = Vec::with_capacity(children.len() * 2 + 1);
    let mut cursor = region.from;

    for child in children {
        if child.span.to <= cursor || child.span.from >= region.to {
            continue;
        }
        push_text(&mut out, cursor, child.span.from);
        cursor = cursor.max(child.span.from);

        match child.kind {
            NodeKind::HardBreak => out.push(FormatNode::mark(child, child.span, Vec::new())),
            kind if kind.is_instruction() => {}
            NodeKind::Link | NodeKind::Image => out.push(expand_link(source, child)),
            kind if kind.is_nestable_mark() => out.push(build_mark(source, child)),
            NodeKind::Escape => {
                // the escaped character alone, never formatted
                let from = (child.span.from + 1).min(child.span.to);
                push_text(&mut out, from, child.span.to);
            }
            // raw html and anything unrecognized: verbatim
            _ => push_text(&mut out, child.span.from, child.span.to),
        }
        cursor = cursor.max(child.span.to);
    }

    push_text(&mut out, cursor, region.to);
    out
}

#[inline]
fn push_text(out: &mut Vec<FormatNode<'_>>, from: usize, to: usize) {
    if to > from {
        out.push(FormatNode::text(Span::new(from, to)));
    }
}

// =============================================================================
// Nestable marks
// =============================================================================

fn build_mark<'s>(source: &str, node: &'s SyntaxNode) -> FormatNode<'s> {
    let (open, close) = delimiter_lengths(node);

    if node.kind == NodeKind::InlineCode {
        let inner = code_content(source, node.span, open, close);
        let children = if inner.is_empty() {
            Vec::new()
        } else {
            vec![FormatNode::text(inner)]
        };
        return FormatNode::mark(node, node.span, children);
    }

    // delimiters become part of the edge leaves, then get trimmed off
    let start = usize::from(open > 0);
    let end = node.children.len() - usize::from(close > 0);
    let inner = node.children.get(start..end).unwrap_or(&[]);
    let mut children = build_region(source, node.span, inner);
    trim_delimiters(&mut children, open, close);
    FormatNode::mark(node, node.span, children)
}

/// Lengths of the opening and closing delimiter tokens.
fn delimiter_lengths(node: &SyntaxNode) -> (usize, usize) {
    let first = node.children.first().filter(|c| c.kind.is_delimiter());
    let last = node
        .children
        .last()
        .filter(|c| c.kind.is_delimiter() && node.children.len() > 1);
    (
        first.map_or(0, |c| c.span.len()),
        last.map_or(0, |c| c.span.len()),
    )
}

/// Pull the first leaf's start past the opening delimiter and the last
/// leaf's end before the closing one. Leaves left empty are dropped.
fn trim_delimiters(children: &mut Vec<FormatNode<'_>>, open: usize, close: usize) {
    if open > 0
        && let Some(first) = children.first_mut()
        && first.is_text()
    {
        first.span.from = (first.span.from + open).min(first.span.to);
    }
    if close > 0
        && let Some(last) = children.last_mut()
        && last.is_text()
    {
        last.span.to = last.span.to.saturating_sub(close).max(last.span.from);
    }
    children.retain(|c| !(c.is_text() && c.span.is_empty()));
}

/// Code span content: delimiters off, and one padding space off each side
/// when both sides have one.
fn code_content(source: &str, span: Span, open: usize, close: usize) -> Span {
    let from = span.from + open;
    let to = span.to.saturating_sub(close).max(from);
    let inner = Span::new(from, to).slice(source);
    if inner.len() >= 2
        && inner.starts_with(' ')
        && inner.ends_with(' ')
        && !inner.bytes().all(|b| b == b' ')
    {
        return Span::new(from + 1, to - 1);
    }
    Span::new(from, to)
}

// =============================================================================
// Links
// =============================================================================

/// Expand a link or image into a mark with sanitized attributes, or a
/// plain-text leaf over its whole span when it is malformed.
fn expand_link<'s>(source: &str, node: &'s SyntaxNode) -> FormatNode<'s> {
    let fallback = || FormatNode::text(node.span);
    let children = &node.children;

    let brackets: SmallVec<[usize; 4]> = children
        .iter()
        .enumerate()
        .filter(|(_, c)| c.kind == NodeKind::LinkMark)
        .map(|(i, _)| i)
        .collect();
    let url = children.iter().position(|c| c.kind == NodeKind::Url);

    let dest = match (url, node.target.as_deref()) {
        (_, Some(target)) => target.dest.as_str(),
        (Some(index), None) if children.len() >= 3 => children[index].text(source),
        _ => return fallback(),
    };
    let title_node = children.iter().find(|c| c.kind == NodeKind::LinkTitle);
    let title = match (node.target.as_deref(), title_node) {
        (Some(target), _) => target.title.replace('"', ""),
        (None, Some(title)) => strip_title(title.text(source)),
        (None, None) => String::new(),
    };

    // `<url>` shorthand: the url is its own label
    if url == Some(1) {
        let url_node = &children[1];
        let label = vec![FormatNode::text(url_node.span)];
        return link_node(source, node, label, dest, &title);
    }

    let (Some(&open), Some(&close)) = (brackets.first(), brackets.get(1)) else {
        return fallback();
    };
    let label_span = Span::new(children[open].span.to, children[close].span.from);
    let label_children = &children[open + 1..close];

    let label = build_region(source, label_span, label_children);
    link_node(source, node, label, dest, &title)
}

fn link_node<'s>(
    source: &str,
    node: &'s SyntaxNode,
    label: Vec<FormatNode<'s>>,
    dest: &str,
    title: &str,
) -> FormatNode<'s> {
    let href = sanitize_href(dest).to_owned();
    let mut attrs = Attrs::new();

    if node.kind == NodeKind::Image {
        let alt: String = label.iter().map(|l| l.plain_text(source)).collect();
        attrs.push(("src", href));
        attrs.push(("alt", alt));
        if !title.is_empty() {
            attrs.push(("title", title.to_owned()));
        }
        return FormatNode::mark(node, node.span, Vec::new()).with_attrs(attrs);
    }

    attrs.push(("href", href));
    if !title.is_empty() {
        attrs.push(("title", title.to_owned()));
    }
    FormatNode::mark(node, node.span, label).with_attrs(attrs)
}

/// Title token without its enclosing quotes or parens and without any `"`.
fn strip_title(raw: &str) -> String {
    let inner = match raw.as_bytes() {
        [b'"', .., b'"'] | [b'\'', .., b'\''] | [b'(', .., b')'] => &raw[1..raw.len() - 1],
        [b'"' | b'\'' | b'(', ..] => &raw[1..],
        _ => raw,
    };
    inner.replace('"', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{IncrementalParser, MarkdownParser, Tree};

    fn parse(text: &str) -> Tree {
        MarkdownParser::default().parse_full(text)
    }

    /// Render a formatting tree as `kind(children)` / `"text"` for asserts.
    fn describe(source: &str, node: &FormatNode<'_>) -> String {
        match node.mark_kind() {
            None if node.is_text() => format!("{:?}", node.span.slice(source)),
            kind => {
                let name = kind.map_or("block", MarkKind::name);
                let inner: Vec<_> = node.children.iter().map(|c| describe(source, c)).collect();
                format!("{name}({})", inner.join(","))
            }
        }
    }

    fn shape(text: &str) -> String {
        let tree = parse(text);
        let block = tree.blocks()[0].as_ref();
        describe(text, &build_tree(text, block))
    }

    fn first_mark<'s>(root: &'s FormatNode<'s>) -> &'s FormatNode<'s> {
        root.children.iter().find(|c| !c.is_text()).unwrap()
    }

    #[test]
    fn test_plain_paragraph() {
        assert_eq!(shape("hello world"), "block(\"hello world\")");
    }

    #[test]
    fn test_strong_delimiters_trimmed() {
        assert_eq!(shape("**bold**"), "block(strong(\"bold\"))");
        assert_eq!(shape("a *b* c"), "block(\"a \",emphasis(\"b\"),\" c\")");
    }

    #[test]
    fn test_nested_marks() {
        assert_eq!(
            shape("**a *b* c**"),
            "block(strong(\"a \",emphasis(\"b\"),\" c\"))"
        );
        assert_eq!(shape("~~x~~ ^y^"), "block(strikethrough(\"x\"),\" \",superscript(\"y\"))");
    }

    #[test]
    fn test_inline_code_is_flat() {
        assert_eq!(shape("`a *b*`"), "block(inline_code(\"a *b*\"))");
        assert_eq!(shape("`` ` ``"), "block(inline_code(\"`\"))");
    }

    #[test]
    fn test_heading_marker_skipped() {
        assert_eq!(shape("# Hello"), "block(\"Hello\")");
    }

    #[test]
    fn test_escape_drops_backslash() {
        assert_eq!(shape("a \\*b"), "block(\"a \",\"*\",\"b\")");
    }

    #[test]
    fn test_hard_break_kept() {
        assert_eq!(shape("a\\\nb"), "block(\"a\",hard_break(),\"b\")");
        assert_eq!(shape("a  \nb"), "block(\"a\",hard_break(),\"b\")");
    }

    #[test]
    fn test_raw_html_is_text() {
        assert_eq!(shape("a <b>x</b>"), "block(\"a \",\"<b>\",\"x\",\"</b>\")");
    }

    #[test]
    fn test_link_attributes() {
        let text = "[x **y**](https://a.b \"Say \\\"hi\\\"\")";
        let tree = parse(text);
        let root = build_tree(text, tree.blocks()[0].as_ref());
        let link = first_mark(&root);
        assert_eq!(link.mark_kind(), Some(MarkKind::Link));
        assert_eq!(link.attrs()[0], ("href", "https://a.b".to_owned()));
        assert_eq!(link.attrs()[1].0, "title");
        assert!(!link.attrs()[1].1.contains('"'));
        assert_eq!(describe(text, link), "link(\"x \",strong(\"y\"))");
    }

    #[test]
    fn test_link_scheme_blocked() {
        let text = "[x](javascript:alert(1))";
        let tree = parse(text);
        let root = build_tree(text, tree.blocks()[0].as_ref());
        assert_eq!(first_mark(&root).attrs()[0], ("href", "#".to_owned()));
    }

    #[test]
    fn test_autolink_label_is_url() {
        let text = "<https://example.com>";
        let tree = parse(text);
        let root = build_tree(text, tree.blocks()[0].as_ref());
        let link = first_mark(&root);
        assert_eq!(describe(text, link), "link(\"https://example.com\")");
        assert_eq!(link.attrs()[0].1, "https://example.com");
    }

    #[test]
    fn test_email_autolink_uses_mailto() {
        let text = "<me@example.com>";
        let tree = parse(text);
        let root = build_tree(text, tree.blocks()[0].as_ref());
        assert_eq!(first_mark(&root).attrs()[0].1, "mailto:me@example.com");
    }

    #[test]
    fn test_reference_link() {
        let text = "[x][r]\n\n[r]: https://r.example \"T\"";
        let tree = parse(text);
        let root = build_tree(text, tree.blocks()[0].as_ref());
        let link = first_mark(&root);
        assert_eq!(describe(text, link), "link(\"x\")");
        assert_eq!(link.attrs()[0].1, "https://r.example");
        assert_eq!(link.attrs()[1], ("title", "T".to_owned()));
    }

    #[test]
    fn test_unclosed_link_is_text() {
        assert_eq!(shape("[not a link"), "block(\"[not a link\")");
    }

    #[test]
    fn test_image_attributes() {
        let text = "![alt text](https://i.example/a.png)";
        let tree = parse(text);
        let root = build_tree(text, tree.blocks()[0].as_ref());
        let image = first_mark(&root);
        assert_eq!(image.mark_kind(), Some(MarkKind::Image));
        assert!(image.children.is_empty());
        assert_eq!(image.attrs()[0], ("src", "https://i.example/a.png".to_owned()));
        assert_eq!(image.attrs()[1], ("alt", "alt text".to_owned()));
    }

    #[test]
    fn test_children_stay_inside_parent() {
        fn check(node: &FormatNode<'_>) {
            let mut last = node.span.from;
            for child in &node.children {
                assert!(child.span.from >= last);
                assert!(node.span.contains(child.span));
                last = child.span.to;
                check(child);
            }
        }
        let text = "a **b *c* `d`** [e](https://f.g) ~~h~~\\\n i";
        let tree = parse(text);
        check(&build_tree(text, tree.blocks()[0].as_ref()));
    }

    #[test]
    fn test_strip_title() {
        assert_eq!(strip_title("\"a\""), "a");
        assert_eq!(strip_title("'a\"b'"), "ab");
        assert_eq!(strip_title("(t)"), "t");
        assert_eq!(strip_title("\"open"), "open");
    }
}
