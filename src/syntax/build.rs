//! Offset-event folding: `pulldown-cmark` events → [`SyntaxNode`] tree.
//!
//! pulldown-cmark reports rendered content (text, code, breaks) with source
//! ranges but says nothing about the bytes in between. Those gaps are the
//! delimiters and markers, so every container is finalized by walking its
//! pieces and turning each gap into an instruction node:
//!
//! ```text
//! **a \* b**   Strong 0..10
//! ^^           EmphasisMark 0..2
//!     ^^       Escape 4..6
//!         ^^   EmphasisMark 8..10
//! ```

use std::ops::Range;

use pulldown_cmark::{BrokenLink, CodeBlockKind, CowStr, Event, LinkType, Options, Parser, Tag};
use rustc_hash::FxHashMap;

use super::node::{LinkTarget, NodeClass, NodeKind, SyntaxNode, Span};

/// Link reference definitions: normalized label → target.
pub type Definitions = FxHashMap<String, LinkTarget>;

/// Result of folding one event stream.
pub(crate) struct Built {
    pub blocks: Vec<SyntaxNode>,
    pub definitions: Definitions,
}

/// Parse `text` and fold its events into top-level blocks.
///
/// `known` resolves references that have no definition inside `text`.
pub(crate) fn build(text: &str, options: Options, known: &Definitions) -> Built {
    let callback = |link: BrokenLink<'_>| {
        known
            .get(&normalize_label(&link.reference))
            .map(|t| (CowStr::from(t.dest.clone()), CowStr::from(t.title.clone())))
    };
    let mut iter =
        Parser::new_with_broken_link_callback(text, options, Some(callback)).into_offset_iter();

    let mut builder = TreeBuilder::new(text);
    for (event, range) in iter.by_ref() {
        builder.push(event, range);
    }

    let definitions = iter
        .reference_definitions()
        .iter()
        .map(|(label, def)| {
            let target = LinkTarget {
                dest: def.dest.to_string(),
                title: def.title.as_ref().map(|t| t.to_string()).unwrap_or_default(),
            };
            (normalize_label(label), target)
        })
        .collect();

    Built {
        blocks: builder.finish(),
        definitions,
    }
}

/// Case-fold and collapse whitespace, the way reference labels match.
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// =============================================================================
// Tree Builder
// =============================================================================

/// Content collected inside an open container.
enum Piece {
    Node(SyntaxNode),
    Text(Span),
}

impl Piece {
    fn span(&self) -> Span {
        match self {
            Self::Node(node) => node.span,
            Self::Text(span) => *span,
        }
    }

    fn is_block(&self) -> bool {
        matches!(self, Self::Node(n) if n.kind.class() == NodeClass::Block)
    }
}

/// Link data captured at `Start(Link|Image)`.
struct LinkInfo {
    link_type: LinkType,
    dest: String,
    title: String,
}

/// An open container. `kind == None` marks tags this tree does not model;
/// their pieces are spliced into the parent on close.
struct Frame {
    kind: Option<NodeKind>,
    span: Span,
    pieces: Vec<Piece>,
    link: Option<LinkInfo>,
}

struct TreeBuilder<'a> {
    text: &'a str,
    stack: Vec<Frame>,
    blocks: Vec<SyntaxNode>,
}

impl<'a> TreeBuilder<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            stack: Vec::new(),
            blocks: Vec::new(),
        }
    }

    fn finish(mut self) -> Vec<SyntaxNode> {
        // pulldown-cmark closes every tag, but stay total on odd input
        while !self.stack.is_empty() {
            self.close();
        }
        self.blocks
    }

    fn push(&mut self, event: Event<'_>, range: Range<usize>) {
        let span = Span::from(range);
        match event {
            Event::Start(tag) => self.open(tag, span),
            Event::End(_) => self.close(),
            Event::Code(_) => {
                let node = code_span(self.text, span);
                self.add(Piece::Node(node));
            }
            Event::InlineHtml(_) => self.add(Piece::Node(SyntaxNode::new(NodeKind::InlineHtml, span))),
            Event::HardBreak => self.add(Piece::Node(SyntaxNode::new(NodeKind::HardBreak, span))),
            Event::Rule => self.add(Piece::Node(SyntaxNode::new(NodeKind::ThematicBreak, span))),
            // Text, soft breaks, block html lines, and anything from
            // extensions this tree does not enable
            _ => self.add(Piece::Text(span)),
        }
    }

    fn open(&mut self, tag: Tag<'_>, span: Span) {
        let mut link = None;
        let kind = match tag {
            Tag::Paragraph => Some(NodeKind::Paragraph),
            Tag::Heading { level, .. } => Some(NodeKind::Heading { level: level as u8 }),
            Tag::BlockQuote(_) => Some(NodeKind::BlockQuote),
            Tag::CodeBlock(kind) => Some(NodeKind::CodeBlock {
                fenced: matches!(kind, CodeBlockKind::Fenced(_)),
            }),
            Tag::HtmlBlock => Some(NodeKind::HtmlBlock),
            Tag::List(Some(start)) => Some(NodeKind::OrderedList { start }),
            Tag::List(None) => Some(NodeKind::BulletList),
            Tag::Item => Some(NodeKind::ListItem),
            Tag::Table(_) => Some(NodeKind::Table),
            Tag::TableHead => Some(NodeKind::TableHead),
            Tag::TableRow => Some(NodeKind::TableRow),
            Tag::TableCell => Some(NodeKind::TableCell),
            Tag::Emphasis => Some(NodeKind::Emphasis),
            Tag::Strong => Some(NodeKind::Strong),
            Tag::Strikethrough => Some(NodeKind::Strikethrough),
            Tag::Superscript => Some(NodeKind::Superscript),
            Tag::Subscript => Some(NodeKind::Subscript),
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => {
                link = Some(LinkInfo {
                    link_type,
                    dest: dest_url.to_string(),
                    title: title.to_string(),
                });
                Some(NodeKind::Link)
            }
            Tag::Image {
                link_type,
                dest_url,
                title,
                ..
            } => {
                link = Some(LinkInfo {
                    link_type,
                    dest: dest_url.to_string(),
                    title: title.to_string(),
                });
                Some(NodeKind::Image)
            }
            _ => None,
        };

        self.stack.push(Frame {
            kind,
            span,
            pieces: Vec::new(),
            link,
        });
    }

    fn close(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match frame.kind {
            Some(kind) => {
                let node = self.finalize(kind, frame.span, frame.pieces, frame.link);
                self.add(Piece::Node(node));
            }
            None => {
                for piece in frame.pieces {
                    self.add(piece);
                }
            }
        }
    }

    fn add(&mut self, piece: Piece) {
        if let Some(top) = self.stack.last_mut() {
            top.pieces.push(piece);
        } else if let Piece::Node(node) = piece
            && node.kind.class() == NodeClass::Block
        {
            self.blocks.push(node);
        }
    }

    fn finalize(
        &self,
        kind: NodeKind,
        span: Span,
        pieces: Vec<Piece>,
        link: Option<LinkInfo>,
    ) -> SyntaxNode {
        match kind {
            NodeKind::Paragraph | NodeKind::Heading { .. } | NodeKind::TableCell => {
                self.inline_block(kind, span, pieces)
            }
            NodeKind::CodeBlock { fenced } => self.code_block(span, pieces, fenced),
            NodeKind::HtmlBlock => self.html_block(span),
            NodeKind::ListItem => self.list_item(span, pieces),
            NodeKind::Link | NodeKind::Image => self.link(kind, span, pieces, link),
            k if k.is_nestable_mark() => self.mark(kind, span, pieces),
            _ => {
                let children = pieces
                    .into_iter()
                    .filter_map(|p| match p {
                        Piece::Node(n) if n.kind.class() == NodeClass::Block => Some(n),
                        _ => None,
                    })
                    .collect();
                SyntaxNode::new(kind, span).with_children(children)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Inline regions
    // -------------------------------------------------------------------------

    /// Paragraph, heading, or table cell.
    fn inline_block(&self, kind: NodeKind, span: Span, pieces: Vec<Piece>) -> SyntaxNode {
        let mut node = SyntaxNode::new(kind, span);
        let (Some(first), Some(last)) = (pieces.first(), pieces.last()) else {
            if matches!(kind, NodeKind::Heading { .. }) {
                self.push_trimmed(NodeKind::HeaderMark, span, &mut node.children);
            }
            return node;
        };
        let content = Span::new(first.span().from, last.span().to);

        let mut children = Vec::with_capacity(pieces.len());
        let is_heading = matches!(kind, NodeKind::Heading { .. });
        if is_heading && content.from > span.from {
            self.push_trimmed(NodeKind::HeaderMark, Span::new(span.from, content.from), &mut children);
        }
        self.weave(content.from, pieces, &mut children);
        if is_heading && span.to > content.to {
            self.push_trimmed(NodeKind::HeaderMark, Span::new(content.to, span.to), &mut children);
        }

        node.children = children;
        node.content = Some(content);
        node
    }

    /// Push pieces as nodes, turning the gaps between them into
    /// instructions. Returns the end of the last piece (or `from`).
    fn weave(&self, from: usize, pieces: Vec<Piece>, out: &mut Vec<SyntaxNode>) -> usize {
        let mut cursor = from;
        let mut pieces = pieces.into_iter().peekable();
        while let Some(piece) = pieces.next() {
            let span = piece.span();
            if span.from > cursor {
                self.gap(Span::new(cursor, span.from), Some(&piece), out);
            }
            cursor = cursor.max(span.to);
            if let Piece::Node(node) = piece {
                out.push(node);
            }
        }
        cursor
    }

    /// Classify a gap: an escape backslash in front of the escaped text, or
    /// a non-rendered continuation (quote markers, stripped indentation).
    fn gap(&self, gap: Span, next: Option<&Piece>, out: &mut Vec<SyntaxNode>) {
        if gap.is_empty() {
            return;
        }
        if gap.slice(self.text).ends_with('\\')
            && let Some(Piece::Text(next)) = next
            && let Some(c) = self.text.get(next.from..).and_then(|s| s.chars().next())
            && c.is_ascii_punctuation()
        {
            let backslash = gap.to - 1;
            if backslash > gap.from {
                out.push(SyntaxNode::new(NodeKind::Continuation, Span::new(gap.from, backslash)));
            }
            out.push(SyntaxNode::new(
                NodeKind::Escape,
                Span::new(backslash, next.from + c.len_utf8()),
            ));
            return;
        }
        out.push(SyntaxNode::new(NodeKind::Continuation, gap));
    }

    /// Emphasis, strong, strikethrough, superscript, subscript.
    fn mark(&self, kind: NodeKind, span: Span, pieces: Vec<Piece>) -> SyntaxNode {
        let (delim_kind, open, close) = self.delimiters(kind, span);
        let inner_to = span.to - close;

        let mut children = Vec::with_capacity(pieces.len() + 2);
        if open > 0 {
            children.push(SyntaxNode::new(delim_kind, Span::new(span.from, span.from + open)));
        }
        let cursor = self.weave(span.from + open, pieces, &mut children);
        if inner_to > cursor {
            self.gap(Span::new(cursor, inner_to), None, &mut children);
        }
        if close > 0 {
            children.push(SyntaxNode::new(delim_kind, Span::new(inner_to, span.to)));
        }

        SyntaxNode::new(kind, span).with_children(children)
    }

    /// Delimiter kind and the opening/closing run lengths of a mark.
    fn delimiters(&self, kind: NodeKind, span: Span) -> (NodeKind, usize, usize) {
        let raw = span.slice(self.text);
        let (delim_kind, want) = match kind {
            NodeKind::Strong => (NodeKind::EmphasisMark, 2),
            NodeKind::Strikethrough => {
                let run = raw.bytes().take_while(|b| *b == b'~').count().clamp(1, 2);
                (NodeKind::StrikethroughMark, run)
            }
            NodeKind::Superscript => (NodeKind::SuperscriptMark, 1),
            NodeKind::Subscript => (NodeKind::SubscriptMark, 1),
            _ => (NodeKind::EmphasisMark, 1),
        };
        // both runs must fit without overlapping
        let len = want.min(raw.len() / 2);
        (delim_kind, len, len)
    }

    // -------------------------------------------------------------------------
    // Links
    // -------------------------------------------------------------------------

    fn link(
        &self,
        kind: NodeKind,
        span: Span,
        pieces: Vec<Piece>,
        info: Option<LinkInfo>,
    ) -> SyntaxNode {
        let mut node = SyntaxNode::new(kind, span);
        let Some(info) = info else {
            return node;
        };

        match info.link_type {
            LinkType::Autolink | LinkType::Email if span.len() >= 2 => {
                let url = Span::new(span.from + 1, span.to - 1);
                node.children = vec![
                    SyntaxNode::new(NodeKind::LinkMark, Span::new(span.from, url.from)),
                    SyntaxNode::new(NodeKind::Url, url),
                    SyntaxNode::new(NodeKind::LinkMark, Span::new(url.to, span.to)),
                ];
                if info.link_type == LinkType::Email {
                    node.target = Some(Box::new(LinkTarget {
                        dest: format!("mailto:{}", url.slice(self.text)),
                        title: String::new(),
                    }));
                }
            }
            LinkType::Inline => {
                let open = if kind == NodeKind::Image { 2 } else { 1 };
                let open = open.min(span.len());
                let mut children = vec![SyntaxNode::new(
                    NodeKind::LinkMark,
                    Span::new(span.from, span.from + open),
                )];
                let cursor = self.weave(span.from + open, pieces, &mut children);
                match scan_inline_tail(self.text, Span::new(cursor, span.to)) {
                    Some(tail) => children.extend(tail),
                    None => {
                        self.reference_tail(Span::new(cursor, span.to), &mut children);
                        node.target = Some(Box::new(LinkTarget {
                            dest: info.dest,
                            title: info.title,
                        }));
                    }
                }
                node.children = children;
            }
            _ => {
                let open = if kind == NodeKind::Image { 2 } else { 1 };
                let open = open.min(span.len());
                let mut children = vec![SyntaxNode::new(
                    NodeKind::LinkMark,
                    Span::new(span.from, span.from + open),
                )];
                let cursor = self.weave(span.from + open, pieces, &mut children);
                self.reference_tail(Span::new(cursor, span.to), &mut children);
                node.children = children;
                node.target = Some(Box::new(LinkTarget {
                    dest: info.dest,
                    title: info.title,
                }));
            }
        }
        node
    }

    /// `]`, `][]` or `][label]` after a reference-style label.
    fn reference_tail(&self, tail: Span, out: &mut Vec<SyntaxNode>) {
        let Some(close) = tail.slice(self.text).find(']').map(|i| tail.from + i) else {
            if !tail.is_empty() {
                out.push(SyntaxNode::new(NodeKind::Continuation, tail));
            }
            return;
        };
        if close > tail.from {
            out.push(SyntaxNode::new(NodeKind::Continuation, Span::new(tail.from, close)));
        }
        out.push(SyntaxNode::new(NodeKind::LinkMark, Span::new(close, close + 1)));
        if tail.to > close + 1 {
            out.push(SyntaxNode::new(NodeKind::LinkLabel, Span::new(close + 1, tail.to)));
        }
    }

    // -------------------------------------------------------------------------
    // Blocks
    // -------------------------------------------------------------------------

    /// Tight items carry inline pieces directly; wrap each inline run in a
    /// paragraph so list items only ever hold blocks.
    fn list_item(&self, span: Span, pieces: Vec<Piece>) -> SyntaxNode {
        let mut children = Vec::new();
        let mut run: Vec<Piece> = Vec::new();

        for piece in pieces {
            if piece.is_block() {
                self.flush_run(&mut run, &mut children);
                if let Piece::Node(node) = piece {
                    children.push(node);
                }
            } else {
                run.push(piece);
            }
        }
        self.flush_run(&mut run, &mut children);

        SyntaxNode::new(NodeKind::ListItem, span).with_children(children)
    }

    fn flush_run(&self, run: &mut Vec<Piece>, out: &mut Vec<SyntaxNode>) {
        let (Some(first), Some(last)) = (run.first(), run.last()) else {
            return;
        };
        let span = Span::new(first.span().from, last.span().to);
        out.push(self.inline_block(NodeKind::Paragraph, span, std::mem::take(run)));
    }

    fn code_block(&self, span: Span, pieces: Vec<Piece>, fenced: bool) -> SyntaxNode {
        let mut children = Vec::with_capacity(pieces.len() + 3);
        let mut body_from = span.from;

        if fenced {
            let raw = span.slice(self.text);
            let line_end = span.from + raw.find('\n').unwrap_or(raw.len());
            let line = &self.text[span.from..line_end];
            let indent = line.len() - line.trim_start().len();
            let fence_char = line[indent..].chars().next().unwrap_or('`');
            let run = line[indent..]
                .chars()
                .take_while(|c| *c == fence_char)
                .count();
            let fence = Span::new(span.from + indent, span.from + indent + run);
            children.push(SyntaxNode::new(NodeKind::CodeMark, fence));
            self.push_trimmed(NodeKind::CodeInfo, Span::new(fence.to, line_end), &mut children);
            body_from = line_end;
        }

        let mut cursor = body_from;
        for piece in pieces {
            let piece_span = piece.span();
            if !piece_span.is_empty() {
                children.push(SyntaxNode::new(NodeKind::CodeText, piece_span));
            }
            cursor = cursor.max(piece_span.to);
        }

        if fenced && span.to > cursor {
            self.push_trimmed(NodeKind::CodeMark, Span::new(cursor, span.to), &mut children);
        }

        SyntaxNode::new(NodeKind::CodeBlock { fenced }, span).with_children(children)
    }

    fn html_block(&self, span: Span) -> SyntaxNode {
        let raw = span.slice(self.text).trim();
        let kind = if raw.starts_with("<!--") && raw.ends_with("-->") && raw.len() >= 7 {
            NodeKind::Comment
        } else {
            NodeKind::HtmlBlock
        };
        SyntaxNode::new(kind, span)
    }

    /// Push `kind` over `span` with surrounding whitespace removed, if any
    /// text remains.
    fn push_trimmed(&self, kind: NodeKind, span: Span, out: &mut Vec<SyntaxNode>) {
        let raw = span.slice(self.text);
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return;
        }
        let from = span.from + (raw.len() - raw.trim_start().len());
        out.push(SyntaxNode::new(kind, Span::new(from, from + trimmed.len())));
    }
}

/// Inline code: a backtick run at each end bounds the content.
fn code_span(text: &str, span: Span) -> SyntaxNode {
    let raw = span.slice(text);
    let run = raw.bytes().take_while(|b| *b == b'`').count().min(raw.len() / 2);
    let mut node = SyntaxNode::new(NodeKind::InlineCode, span);
    if run > 0 {
        node.children = vec![
            SyntaxNode::new(NodeKind::CodeMark, Span::new(span.from, span.from + run)),
            SyntaxNode::new(NodeKind::CodeMark, Span::new(span.to - run, span.to)),
        ];
    }
    node
}

/// Split `](dest "title")` into its tokens. `None` when the tail does not
/// have that shape.
fn scan_inline_tail(text: &str, tail: Span) -> Option<Vec<SyntaxNode>> {
    let bytes = text.as_bytes();
    let end = tail.to.min(bytes.len());
    let mut out = Vec::with_capacity(6);

    let close = tail.from + tail.slice(text).find(']')?;
    if close > tail.from {
        out.push(SyntaxNode::new(NodeKind::Continuation, Span::new(tail.from, close)));
    }
    out.push(SyntaxNode::new(NodeKind::LinkMark, Span::new(close, close + 1)));

    let mut pos = close + 1;
    if bytes.get(pos) != Some(&b'(') {
        return None;
    }
    out.push(SyntaxNode::new(NodeKind::LinkMark, Span::new(pos, pos + 1)));
    pos = skip_whitespace(bytes, pos + 1, end);

    let dest = if bytes.get(pos) == Some(&b'<') {
        let start = pos + 1;
        let stop = start + text.get(start..end)?.find('>')?;
        pos = stop + 1;
        Span::new(start, stop)
    } else {
        let start = pos;
        let mut depth = 0usize;
        while pos < end {
            match bytes[pos] {
                b'\\' => pos += 2,
                b'(' => {
                    depth += 1;
                    pos += 1;
                }
                b')' if depth == 0 => break,
                b')' => {
                    depth -= 1;
                    pos += 1;
                }
                b if b.is_ascii_whitespace() => break,
                _ => pos += 1,
            }
        }
        pos = pos.min(end);
        Span::new(start, pos)
    };
    if !dest.is_empty() {
        out.push(SyntaxNode::new(NodeKind::Url, dest));
    }

    pos = skip_whitespace(bytes, pos, end);
    if let Some(&quote) = bytes.get(pos)
        && pos + 1 < end
        && matches!(quote, b'"' | b'\'' | b'(')
    {
        let closing = if quote == b'(' { b')' } else { quote };
        let start = pos;
        pos += 1;
        while pos < end && bytes[pos] != closing {
            if bytes[pos] == b'\\' {
                pos += 1;
            }
            pos += 1;
        }
        let stop = (pos + 1).min(end);
        out.push(SyntaxNode::new(NodeKind::LinkTitle, Span::new(start, stop)));
        pos = stop;
    }

    pos = skip_whitespace(bytes, pos, end);
    if bytes.get(pos) != Some(&b')') || pos >= end {
        return None;
    }
    out.push(SyntaxNode::new(NodeKind::LinkMark, Span::new(pos, pos + 1)));
    Some(out)
}

fn skip_whitespace(bytes: &[u8], mut pos: usize, end: usize) -> usize {
    while pos < end && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_SUPERSCRIPT
            | Options::ENABLE_SUBSCRIPT
    }

    fn parse(text: &str) -> Vec<SyntaxNode> {
        build(text, options(), &Definitions::default()).blocks
    }

    fn kinds(nodes: &[SyntaxNode]) -> Vec<NodeKind> {
        nodes.iter().map(|n| n.kind).collect()
    }

    #[test]
    fn test_heading_content_excludes_marker() {
        let blocks = parse("## Title");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, NodeKind::Heading { level: 2 });
        let content = blocks[0].content.unwrap();
        assert_eq!(content.slice("## Title"), "Title");
        assert_eq!(blocks[0].children[0].kind, NodeKind::HeaderMark);
    }

    #[test]
    fn test_strong_delimiters() {
        let text = "**bold**";
        let blocks = parse(text);
        let strong = &blocks[0].children[0];
        assert_eq!(strong.kind, NodeKind::Strong);
        assert_eq!(
            kinds(&strong.children),
            vec![NodeKind::EmphasisMark, NodeKind::EmphasisMark]
        );
        assert_eq!(strong.children[0].text(text), "**");
        assert_eq!(strong.children[1].text(text), "**");
    }

    #[test]
    fn test_unterminated_mark_is_text() {
        let blocks = parse("**a");
        assert_eq!(blocks[0].kind, NodeKind::Paragraph);
        assert!(blocks[0].children.is_empty());
    }

    #[test]
    fn test_inline_link_tokens() {
        let text = "[x](https://a.b \"T\")";
        let blocks = parse(text);
        let link = &blocks[0].children[0];
        assert_eq!(link.kind, NodeKind::Link);
        let url = link.children.iter().find(|c| c.kind == NodeKind::Url).unwrap();
        assert_eq!(url.text(text), "https://a.b");
        let title = link
            .children
            .iter()
            .find(|c| c.kind == NodeKind::LinkTitle)
            .unwrap();
        assert_eq!(title.text(text), "\"T\"");
        assert!(link.target.is_none());
    }

    #[test]
    fn test_autolink_url_at_index_one() {
        let text = "<https://example.com>";
        let blocks = parse(text);
        let link = &blocks[0].children[0];
        assert_eq!(link.kind, NodeKind::Link);
        assert_eq!(link.children[1].kind, NodeKind::Url);
        assert_eq!(link.children[1].text(text), "https://example.com");
    }

    #[test]
    fn test_reference_link_carries_target() {
        let text = "[x][r]\n\n[r]: https://r.example";
        let built = build(text, options(), &Definitions::default());
        let link = &built.blocks[0].children[0];
        assert_eq!(link.target.as_ref().unwrap().dest, "https://r.example");
        assert!(built.definitions.contains_key("r"));
    }

    #[test]
    fn test_known_definitions_resolve_references() {
        let mut known = Definitions::default();
        known.insert(
            "r".to_string(),
            LinkTarget {
                dest: "https://r.example".to_string(),
                title: String::new(),
            },
        );
        let built = build("see [r]", options(), &known);
        let link = &built.blocks[0].children[0];
        assert_eq!(link.kind, NodeKind::Link);
        assert!(built.definitions.is_empty());
    }

    #[test]
    fn test_tight_list_items_wrap_paragraphs() {
        let blocks = parse("- a\n- b");
        assert_eq!(blocks[0].kind, NodeKind::BulletList);
        let items: Vec<_> = blocks[0].children.iter().collect();
        assert_eq!(items.len(), 2);
        assert_eq!(kinds(&items[0].children), vec![NodeKind::Paragraph]);
    }

    #[test]
    fn test_fenced_code_children() {
        let text = "```rust\nfn main() {}\n```";
        let blocks = parse(text);
        let code = &blocks[0];
        assert_eq!(code.kind, NodeKind::CodeBlock { fenced: true });
        assert_eq!(code.children[0].kind, NodeKind::CodeMark);
        assert_eq!(code.children[1].kind, NodeKind::CodeInfo);
        assert_eq!(code.children[1].text(text), "rust");
        assert!(code.children.iter().any(|c| c.kind == NodeKind::CodeText));
    }

    #[test]
    fn test_comment_block_kind() {
        let blocks = parse("<!-- note -->\n\ntext");
        assert_eq!(blocks[0].kind, NodeKind::Comment);
        assert_eq!(blocks[1].kind, NodeKind::Paragraph);
    }

    #[test]
    fn test_escape_node() {
        let text = "a \\* b";
        let blocks = parse(text);
        let escape = blocks[0]
            .children
            .iter()
            .find(|c| c.kind == NodeKind::Escape)
            .unwrap();
        assert_eq!(escape.text(text), "\\*");
    }

    #[test]
    fn test_quote_continuation_is_hidden() {
        let text = "> a\n> b";
        let blocks = parse(text);
        let para = &blocks[0].children[0];
        assert_eq!(para.kind, NodeKind::Paragraph);
        assert!(para.children.iter().any(|c| c.kind == NodeKind::Continuation));
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("  Foo\n  Bar "), "foo bar");
    }
}
