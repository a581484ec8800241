//! Syntax tree node types.
//!
//! A [`SyntaxNode`] is a read-only view of one construct in the source text:
//! its [`NodeKind`], a half-open byte [`Span`], and ordered children.
//! Plain text is never a node - text runs are the gaps between the inline
//! children of a block.

use std::fmt;

// =============================================================================
// Span
// =============================================================================

/// Half-open byte range `[from, to)` into the source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub from: usize,
    pub to: usize,
}

impl Span {
    pub const fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.to.saturating_sub(self.from)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.to <= self.from
    }

    /// Shift both ends by `offset` bytes.
    #[inline]
    pub const fn shifted(self, offset: usize) -> Self {
        Self {
            from: self.from + offset,
            to: self.to + offset,
        }
    }

    /// Whether `other` lies entirely within this span.
    #[inline]
    pub const fn contains(&self, other: Span) -> bool {
        self.from <= other.from && other.to <= self.to
    }

    /// Resolve against the source text. Out-of-range or non-boundary spans
    /// resolve to the empty string.
    #[inline]
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        text.get(self.from..self.to).unwrap_or("")
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.from, self.to)
    }
}

// =============================================================================
// Node Kind
// =============================================================================

/// Broad node category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    /// Structural construct (paragraph, heading, list, table ...)
    Block,
    /// Inline formatting construct with rendered content
    Mark,
    /// Delimiter or marker token with no rendered content of its own
    Instruction,
    /// Opaque content unit (code-block lines)
    Leaf,
}

/// Every construct the syntax tree can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // Blocks
    Paragraph,
    Heading { level: u8 },
    BlockQuote,
    BulletList,
    OrderedList { start: u64 },
    ListItem,
    CodeBlock { fenced: bool },
    HtmlBlock,
    Comment,
    Table,
    TableHead,
    TableRow,
    TableCell,
    ThematicBreak,

    // Marks
    Emphasis,
    Strong,
    Strikethrough,
    Superscript,
    Subscript,
    InlineCode,
    Link,
    Image,
    HardBreak,
    Escape,
    InlineHtml,

    // Instructions
    EmphasisMark,
    StrikethroughMark,
    SuperscriptMark,
    SubscriptMark,
    CodeMark,
    LinkMark,
    Url,
    LinkTitle,
    LinkLabel,
    HeaderMark,
    Continuation,
    CodeInfo,

    // Leaves
    CodeText,
}

impl NodeKind {
    pub const fn class(self) -> NodeClass {
        use NodeKind::*;
        match self {
            Paragraph | Heading { .. } | BlockQuote | BulletList | OrderedList { .. }
            | ListItem | CodeBlock { .. } | HtmlBlock | Comment | Table | TableHead
            | TableRow | TableCell | ThematicBreak => NodeClass::Block,

            Emphasis | Strong | Strikethrough | Superscript | Subscript | InlineCode | Link
            | Image | Escape | InlineHtml => NodeClass::Mark,

            // Hard breaks are instruction-class but still render
            HardBreak | EmphasisMark | StrikethroughMark | SuperscriptMark | SubscriptMark
            | CodeMark | LinkMark | Url | LinkTitle | LinkLabel | HeaderMark | Continuation
            | CodeInfo => NodeClass::Instruction,

            CodeText => NodeClass::Leaf,
        }
    }

    #[inline]
    pub const fn is_instruction(self) -> bool {
        matches!(self.class(), NodeClass::Instruction)
    }

    /// Delimiter tokens bounding a nestable mark.
    pub const fn is_delimiter(self) -> bool {
        matches!(
            self,
            Self::EmphasisMark
                | Self::StrikethroughMark
                | Self::SuperscriptMark
                | Self::SubscriptMark
                | Self::CodeMark
        )
    }

    /// Marks whose content recurses through the inline builder.
    pub const fn is_nestable_mark(self) -> bool {
        matches!(
            self,
            Self::Emphasis
                | Self::Strong
                | Self::Strikethrough
                | Self::Superscript
                | Self::Subscript
                | Self::InlineCode
        )
    }

    /// Blocks whose content is an inline region.
    pub const fn is_inline_bearing(self) -> bool {
        matches!(self, Self::Paragraph | Self::Heading { .. } | Self::TableCell)
    }

    /// Stable lowercase name used in logs and in schema configuration.
    pub const fn name(self) -> &'static str {
        use NodeKind::*;
        match self {
            Paragraph => "paragraph",
            Heading { .. } => "heading",
            BlockQuote => "blockquote",
            BulletList => "bullet_list",
            OrderedList { .. } => "ordered_list",
            ListItem => "list_item",
            CodeBlock { .. } => "code_block",
            HtmlBlock => "html_block",
            Comment => "comment",
            Table => "table",
            TableHead => "table_head",
            TableRow => "table_row",
            TableCell => "table_cell",
            ThematicBreak => "thematic_break",
            Emphasis => "emphasis",
            Strong => "strong",
            Strikethrough => "strikethrough",
            Superscript => "superscript",
            Subscript => "subscript",
            InlineCode => "inline_code",
            Link => "link",
            Image => "image",
            HardBreak => "hard_break",
            Escape => "escape",
            InlineHtml => "inline_html",
            EmphasisMark => "emphasis_mark",
            StrikethroughMark => "strikethrough_mark",
            SuperscriptMark => "superscript_mark",
            SubscriptMark => "subscript_mark",
            CodeMark => "code_mark",
            LinkMark => "link_mark",
            Url => "url",
            LinkTitle => "link_title",
            LinkLabel => "link_label",
            HeaderMark => "header_mark",
            Continuation => "continuation",
            CodeInfo => "code_info",
            CodeText => "code_text",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Syntax Node
// =============================================================================

/// Destination resolved from a link reference definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    pub dest: String,
    pub title: String,
}

/// One node of the syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub span: Span,
    pub children: Vec<SyntaxNode>,
    /// Inline region of an inline-bearing block (`None` when empty).
    pub content: Option<Span>,
    /// Destination of a reference-style link.
    pub target: Option<Box<LinkTarget>>,
}

impl SyntaxNode {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            span,
            children: Vec::new(),
            content: None,
            target: None,
        }
    }

    pub fn with_children(mut self, children: Vec<SyntaxNode>) -> Self {
        self.children = children;
        self
    }

    #[inline]
    pub fn from(&self) -> usize {
        self.span.from
    }

    #[inline]
    pub fn to(&self) -> usize {
        self.span.to
    }

    /// Source text covered by this node.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.slice(source)
    }

    /// Children that are themselves blocks.
    pub fn block_children(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.children
            .iter()
            .filter(|c| c.kind.class() == NodeClass::Block)
    }

    /// The inline region of an inline-bearing block and the children that
    /// lie inside it. `None` for blocks without inline content.
    pub fn inline_region(&self) -> Option<(Span, &[SyntaxNode])> {
        let content = self.content?;
        let start = self
            .children
            .partition_point(|c| c.span.from < content.from);
        let end = self.children.partition_point(|c| c.span.to <= content.to);
        let children = self.children.get(start..end.max(start)).unwrap_or(&[]);
        Some((content, children))
    }

    /// Shift this node and all descendants by `offset` bytes.
    pub fn shift(&mut self, offset: usize) {
        if offset == 0 {
            return;
        }
        self.span = self.span.shifted(offset);
        if let Some(content) = self.content.as_mut() {
            *content = content.shifted(offset);
        }
        for child in &mut self.children {
            child.shift(offset);
        }
    }
}

impl AsRef<SyntaxNode> for SyntaxNode {
    fn as_ref(&self) -> &SyntaxNode {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_slice_out_of_range() {
        let span = Span::new(3, 10);
        assert_eq!(span.slice("abc"), "");
        assert_eq!(Span::new(0, 2).slice("abc"), "ab");
    }

    #[test]
    fn test_kind_classes() {
        assert_eq!(NodeKind::Heading { level: 2 }.class(), NodeClass::Block);
        assert_eq!(NodeKind::Strong.class(), NodeClass::Mark);
        assert!(NodeKind::HardBreak.is_instruction());
        assert!(NodeKind::CodeMark.is_delimiter());
        assert!(!NodeKind::LinkMark.is_delimiter());
        assert!(NodeKind::InlineCode.is_nestable_mark());
        assert!(!NodeKind::Link.is_nestable_mark());
    }

    #[test]
    fn test_inline_region_slices_children() {
        let mut heading = SyntaxNode::new(NodeKind::Heading { level: 1 }, Span::new(0, 12));
        heading.children = vec![
            SyntaxNode::new(NodeKind::HeaderMark, Span::new(0, 1)),
            SyntaxNode::new(NodeKind::Strong, Span::new(2, 7)),
        ];
        heading.content = Some(Span::new(2, 12));

        let (content, children) = heading.inline_region().unwrap();
        assert_eq!(content, Span::new(2, 12));
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].kind, NodeKind::Strong);
    }

    #[test]
    fn test_shift_recurses() {
        let mut node = SyntaxNode::new(NodeKind::Paragraph, Span::new(0, 4))
            .with_children(vec![SyntaxNode::new(NodeKind::Emphasis, Span::new(1, 3))]);
        node.content = Some(Span::new(0, 4));
        node.shift(10);
        assert_eq!(node.span, Span::new(10, 14));
        assert_eq!(node.content, Some(Span::new(10, 14)));
        assert_eq!(node.children[0].span, Span::new(11, 13));
    }
}
