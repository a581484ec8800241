//! Render schema: kind → element template, render function, cleanup hook.
//!
//! The schema is plain data. Customizing a kind means replacing its record
//! ([`Schema::with_block`]) or overriding template fields from
//! configuration ([`Schema::apply_overrides`]).

use std::borrow::Cow;
use std::fmt;

use rustc_hash::FxHashMap;

use super::blocks;
use super::context::RenderContext;
use crate::config::{ConfigError, ElementOverride, SchemaConfig};
use crate::error::{Error, Result};
use crate::syntax::{NodeKind, SyntaxNode};
use crate::target::RenderTarget;

// =============================================================================
// Kinds
// =============================================================================

/// Structural kinds with a schema entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Paragraph,
    Heading,
    BlockQuote,
    BulletList,
    OrderedList,
    ListItem,
    CodeBlock,
    HtmlBlock,
    Table,
    TableHead,
    TableRow,
    TableCell,
    ThematicBreak,
}

impl BlockKind {
    pub const ALL: [Self; 13] = [
        Self::Paragraph,
        Self::Heading,
        Self::BlockQuote,
        Self::BulletList,
        Self::OrderedList,
        Self::ListItem,
        Self::CodeBlock,
        Self::HtmlBlock,
        Self::Table,
        Self::TableHead,
        Self::TableRow,
        Self::TableCell,
        Self::ThematicBreak,
    ];

    pub const fn of(kind: NodeKind) -> Option<Self> {
        Some(match kind {
            NodeKind::Paragraph => Self::Paragraph,
            NodeKind::Heading { .. } => Self::Heading,
            NodeKind::BlockQuote => Self::BlockQuote,
            NodeKind::BulletList => Self::BulletList,
            NodeKind::OrderedList { .. } => Self::OrderedList,
            NodeKind::ListItem => Self::ListItem,
            NodeKind::CodeBlock { .. } => Self::CodeBlock,
            NodeKind::HtmlBlock => Self::HtmlBlock,
            NodeKind::Table => Self::Table,
            NodeKind::TableHead => Self::TableHead,
            NodeKind::TableRow => Self::TableRow,
            NodeKind::TableCell => Self::TableCell,
            NodeKind::ThematicBreak => Self::ThematicBreak,
            _ => return None,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Heading => "heading",
            Self::BlockQuote => "blockquote",
            Self::BulletList => "bullet_list",
            Self::OrderedList => "ordered_list",
            Self::ListItem => "list_item",
            Self::CodeBlock => "code_block",
            Self::HtmlBlock => "html_block",
            Self::Table => "table",
            Self::TableHead => "table_head",
            Self::TableRow => "table_row",
            Self::TableCell => "table_cell",
            Self::ThematicBreak => "thematic_break",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

/// Inline kinds rendered as elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkKind {
    Emphasis,
    Strong,
    Strikethrough,
    Superscript,
    Subscript,
    InlineCode,
    Link,
    Image,
    HardBreak,
}

impl MarkKind {
    pub const ALL: [Self; 9] = [
        Self::Emphasis,
        Self::Strong,
        Self::Strikethrough,
        Self::Superscript,
        Self::Subscript,
        Self::InlineCode,
        Self::Link,
        Self::Image,
        Self::HardBreak,
    ];

    pub const fn of(kind: NodeKind) -> Option<Self> {
        Some(match kind {
            NodeKind::Emphasis => Self::Emphasis,
            NodeKind::Strong => Self::Strong,
            NodeKind::Strikethrough => Self::Strikethrough,
            NodeKind::Superscript => Self::Superscript,
            NodeKind::Subscript => Self::Subscript,
            NodeKind::InlineCode => Self::InlineCode,
            NodeKind::Link => Self::Link,
            NodeKind::Image => Self::Image,
            NodeKind::HardBreak => Self::HardBreak,
            _ => return None,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Emphasis => "emphasis",
            Self::Strong => "strong",
            Self::Strikethrough => "strikethrough",
            Self::Superscript => "superscript",
            Self::Subscript => "subscript",
            Self::InlineCode => "inline_code",
            Self::Link => "link",
            Self::Image => "image",
            Self::HardBreak => "hard_break",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for MarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Records
// =============================================================================

/// Renders `node` into its (new or reused) element.
pub type RenderFn<T> =
    fn(&mut RenderContext<'_, T>, &SyntaxNode, &<T as RenderTarget>::Node) -> Result<()>;

/// Runs once when a block stops being the document tail.
pub type CleanupFn<T> = fn(&mut T, &<T as RenderTarget>::Node);

/// Element template shared by block and mark records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    /// Element tag; for headings the prefix completed by the level
    pub tag: String,
    pub class: Option<String>,
    pub attrs: Vec<(String, String)>,
}

impl Template {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            class: None,
            attrs: Vec::new(),
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    fn apply(&mut self, patch: &ElementOverride) {
        if let Some(tag) = &patch.tag {
            self.tag.clone_from(tag);
        }
        if let Some(class) = &patch.class {
            self.class = Some(class.clone());
        }
        for (key, value) in &patch.attrs {
            match self.attrs.iter_mut().find(|(k, _)| k == key) {
                Some((_, v)) => v.clone_from(value),
                None => self.attrs.push((key.clone(), value.clone())),
            }
        }
    }

    /// Create a detached element from this template.
    pub fn instantiate<T: RenderTarget + ?Sized>(&self, target: &mut T, tag: &str) -> T::Node {
        let node = target.create_node(tag);
        if let Some(class) = &self.class {
            target.set_class(&node, class);
        }
        for (key, value) in &self.attrs {
            target.set_attribute(&node, key, value);
        }
        node
    }
}

/// Record for one structural kind.
pub struct BlockSpec<T: RenderTarget> {
    pub template: Template,
    pub render: RenderFn<T>,
    pub cleanup: Option<CleanupFn<T>>,
}

impl<T: RenderTarget> BlockSpec<T> {
    pub fn new(tag: impl Into<String>, render: RenderFn<T>) -> Self {
        Self {
            template: Template::new(tag),
            render,
            cleanup: None,
        }
    }

    pub fn with_cleanup(mut self, cleanup: CleanupFn<T>) -> Self {
        self.cleanup = Some(cleanup);
        self
    }

    pub fn with_template(mut self, template: Template) -> Self {
        self.template = template;
        self
    }
}

impl<T: RenderTarget> Clone for BlockSpec<T> {
    fn clone(&self) -> Self {
        Self {
            template: self.template.clone(),
            render: self.render,
            cleanup: self.cleanup,
        }
    }
}

impl<T: RenderTarget> fmt::Debug for BlockSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockSpec")
            .field("template", &self.template)
            .field("cleanup", &self.cleanup.is_some())
            .finish_non_exhaustive()
    }
}

/// Record for one mark kind.
pub type MarkSpec = Template;

// =============================================================================
// Schema
// =============================================================================

/// Lookup tables consulted by the reconciler and the inline patcher.
pub struct Schema<T: RenderTarget> {
    blocks: FxHashMap<BlockKind, BlockSpec<T>>,
    marks: FxHashMap<MarkKind, MarkSpec>,
    fallback: Option<BlockSpec<T>>,
}

impl<T: RenderTarget> Default for Schema<T> {
    fn default() -> Self {
        Self::builtin()
    }
}

impl<T: RenderTarget> Clone for Schema<T> {
    fn clone(&self) -> Self {
        Self {
            blocks: self.blocks.clone(),
            marks: self.marks.clone(),
            fallback: self.fallback.clone(),
        }
    }
}

impl<T: RenderTarget> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("blocks", &self.blocks.len())
            .field("marks", &self.marks.len())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl<T: RenderTarget> Schema<T> {
    /// A schema with no entries. Every kind is unmapped until registered.
    pub fn empty() -> Self {
        Self {
            blocks: FxHashMap::default(),
            marks: FxHashMap::default(),
            fallback: None,
        }
    }

    /// The built-in HTML tag map.
    pub fn builtin() -> Self {
        use BlockKind as B;
        use MarkKind as M;

        let inline: RenderFn<T> = blocks::render_inline;
        let container: RenderFn<T> = blocks::render_container;

        Self::empty()
            .with_block(B::Paragraph, BlockSpec::new("p", inline))
            .with_block(B::Heading, BlockSpec::new("h", inline))
            .with_block(B::BlockQuote, BlockSpec::new("blockquote", container))
            .with_block(B::BulletList, BlockSpec::new("ul", container))
            .with_block(B::OrderedList, BlockSpec::new("ol", blocks::render_ordered_list))
            .with_block(B::ListItem, BlockSpec::new("li", container))
            .with_block(
                B::CodeBlock,
                BlockSpec::new("pre", blocks::render_code).with_cleanup(blocks::finish_code),
            )
            .with_block(
                B::HtmlBlock,
                BlockSpec::new("div", blocks::render_html)
                    .with_template(Template::new("div").with_class("raw-html")),
            )
            .with_block(B::Table, BlockSpec::new("table", blocks::render_table))
            .with_block(B::TableHead, BlockSpec::new("thead", blocks::render_table_head))
            .with_block(B::TableRow, BlockSpec::new("tr", blocks::render_table_row))
            .with_block(B::TableCell, BlockSpec::new("td", inline))
            .with_block(B::ThematicBreak, BlockSpec::new("hr", blocks::render_nothing))
            .with_mark(M::Emphasis, Template::new("em"))
            .with_mark(M::Strong, Template::new("strong"))
            .with_mark(M::Strikethrough, Template::new("del"))
            .with_mark(M::Superscript, Template::new("sup"))
            .with_mark(M::Subscript, Template::new("sub"))
            .with_mark(M::InlineCode, Template::new("code"))
            .with_mark(M::Link, Template::new("a"))
            .with_mark(M::Image, Template::new("img"))
            .with_mark(M::HardBreak, Template::new("br"))
    }

    pub fn with_block(mut self, kind: BlockKind, spec: BlockSpec<T>) -> Self {
        self.blocks.insert(kind, spec);
        self
    }

    pub fn with_mark(mut self, kind: MarkKind, spec: MarkSpec) -> Self {
        self.marks.insert(kind, spec);
        self
    }

    /// Handler for structural kinds without their own record.
    pub fn with_fallback(mut self, spec: BlockSpec<T>) -> Self {
        self.fallback = Some(spec);
        self
    }

    /// Fold configuration overrides into the template records.
    pub fn apply_overrides(mut self, config: &SchemaConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        for (name, patch) in &config.blocks {
            let Some(spec) = BlockKind::from_name(name).and_then(|k| self.blocks.get_mut(&k))
            else {
                continue;
            };
            spec.template.apply(patch);
        }
        for (name, patch) in &config.marks {
            let Some(kind) = MarkKind::from_name(name) else {
                continue;
            };
            self.marks
                .entry(kind)
                .or_insert_with(|| Template::new(kind.name()))
                .apply(patch);
        }
        Ok(self)
    }

    /// Record for a structural kind, falling back to the default handler.
    pub fn block(&self, kind: NodeKind) -> Result<&BlockSpec<T>> {
        BlockKind::of(kind)
            .and_then(|k| self.blocks.get(&k))
            .or(self.fallback.as_ref())
            .ok_or(Error::UnmappedKind(kind.name()))
    }

    pub fn mark(&self, kind: MarkKind) -> Result<&MarkSpec> {
        self.marks.get(&kind).ok_or(Error::UnmappedMark(kind.name()))
    }

    /// Resolved element tag for a structural kind (`hN` for headings).
    pub fn block_tag(&self, kind: NodeKind) -> Result<Cow<'_, str>> {
        let tag = self.block(kind)?.template.tag.as_str();
        Ok(match kind {
            NodeKind::Heading { level } => Cow::Owned(format!("{tag}{level}")),
            _ => Cow::Borrowed(tag),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Dom;

    #[test]
    fn test_heading_tags() {
        let schema = Schema::<Dom>::builtin();
        assert_eq!(schema.block_tag(NodeKind::Heading { level: 1 }).unwrap(), "h1");
        assert_eq!(schema.block_tag(NodeKind::Heading { level: 6 }).unwrap(), "h6");
        assert_eq!(schema.block_tag(NodeKind::OrderedList { start: 3 }).unwrap(), "ol");
    }

    #[test]
    fn test_every_kind_mapped() {
        let schema = Schema::<Dom>::builtin();
        for kind in MarkKind::ALL {
            assert!(schema.mark(kind).is_ok(), "{kind}");
        }
        assert!(schema.block(NodeKind::ThematicBreak).is_ok());
        assert!(matches!(
            schema.block(NodeKind::Comment),
            Err(Error::UnmappedKind("comment"))
        ));
    }

    #[test]
    fn test_empty_schema_requires_fallback() {
        let schema = Schema::<Dom>::empty();
        assert!(matches!(
            schema.block(NodeKind::Paragraph),
            Err(Error::UnmappedKind("paragraph"))
        ));
        assert!(matches!(
            schema.mark(MarkKind::Strong),
            Err(Error::UnmappedMark("strong"))
        ));

        let schema = schema.with_fallback(BlockSpec::new("div", blocks::render_inline));
        assert_eq!(schema.block_tag(NodeKind::Paragraph).unwrap(), "div");
    }

    #[test]
    fn test_overrides_replace_template_fields() {
        let config: crate::config::Config = r#"
[schema.blocks.paragraph]
class = "md-p"

[schema.blocks.heading]
tag = "title-"

[schema.marks.strong]
tag = "b"
attrs = { role = "strong" }
"#
        .parse()
        .unwrap();

        let schema = Schema::<Dom>::builtin()
            .apply_overrides(&config.schema)
            .unwrap();
        let paragraph = schema.block(NodeKind::Paragraph).unwrap();
        assert_eq!(paragraph.template.tag, "p");
        assert_eq!(paragraph.template.class.as_deref(), Some("md-p"));
        assert_eq!(schema.block_tag(NodeKind::Heading { level: 2 }).unwrap(), "title-2");

        let strong = schema.mark(MarkKind::Strong).unwrap();
        assert_eq!(strong.tag, "b");
        assert_eq!(strong.attrs, vec![("role".to_owned(), "strong".to_owned())]);
    }

    #[test]
    fn test_template_instantiate() {
        let mut dom = Dom::new();
        let template = Template::new("div").with_class("raw-html").with_attr("lang", "en");
        let node = template.instantiate(&mut dom, "div");
        assert_eq!(dom.to_html(&node), "<div class=\"raw-html\" lang=\"en\"></div>");
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in BlockKind::ALL {
            assert_eq!(BlockKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(MarkKind::from_name("hard_break"), Some(MarkKind::HardBreak));
        assert_eq!(MarkKind::from_name("escape"), None);
    }
}
