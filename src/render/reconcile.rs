//! Structural reconciler: keeps a parent's element children in 1:1 order
//! with a list of syntax blocks.
//!
//! Elements are reused by index when their tag still matches the schema
//! tag of the block at that index. The first mismatch truncates the parent
//! from there on; everything after it is rebuilt.
//!
//! At the top level a [`Checkpoint`] remembers the previous tail block, so
//! an append resumes at that index instead of rescanning the document.

use super::blocks::rendered_children;
use super::context::RenderContext;
use crate::debug;
use crate::error::Result;
use crate::syntax::{NodeKind, Span, SyntaxNode};
use crate::target::RenderTarget;

/// The last top-level block handled by the previous pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub index: usize,
    pub span: Span,
    pub kind: NodeKind,
}

/// What one top-level pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// First top-level index visited
    pub first: usize,
    /// Top-level blocks visited
    pub rendered: usize,
    /// Elements removed by the sync pass at the top level
    pub truncated: usize,
}

/// Top-level reconciliation state, owned by one renderer.
#[derive(Debug, Default)]
pub struct Reconciler {
    checkpoint: Option<Checkpoint>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn checkpoint(&self) -> Option<Checkpoint> {
        self.checkpoint
    }

    /// Forget the checkpoint; the next pass scans from index 0.
    pub fn reset(&mut self) {
        self.checkpoint = None;
    }

    /// Reconcile the children of `root` with the top-level `blocks`.
    pub fn reconcile<T: RenderTarget>(
        &mut self,
        cx: &mut RenderContext<'_, T>,
        root: &T::Node,
        blocks: &[&SyntaxNode],
    ) -> Result<PassSummary> {
        let Some(last) = blocks.len().checked_sub(1) else {
            return Ok(PassSummary::default());
        };
        let mut first = self.checkpoint.map_or(0, |c| c.index.min(last));

        // The re-parsed tail can reach back into earlier blocks (a list
        // taking a new item), so resume at the first stale element
        while first > 0 && !is_current(cx, root, first - 1, blocks[first - 1]) {
            first -= 1;
        }

        // Unmapped kinds fail before the tree is touched
        for block in &blocks[first..] {
            cx.tag_for(block)?;
        }

        let truncated = sync(cx, root, blocks, first)?;
        for (index, block) in blocks.iter().enumerate().skip(first) {
            cx.is_tail = index == last;
            render_block(cx, root, index, block)?;
        }
        cx.is_tail = false;

        if let Some(previous) = self.checkpoint
            && previous.index < last
        {
            finish_tail(cx, root, blocks, previous)?;
        }

        self.checkpoint = Some(Checkpoint {
            index: last,
            span: blocks[last].span,
            kind: blocks[last].kind,
        });

        Ok(PassSummary {
            first,
            rendered: blocks.len() - first,
            truncated,
        })
    }
}

/// Reconcile the children of a container element (quote, list, item,
/// table section) with its block children. Always scans from index 0;
/// unchanged children are skipped by their span stamp.
pub fn reconcile_children<T: RenderTarget>(
    cx: &mut RenderContext<'_, T>,
    parent: &T::Node,
    blocks: &[&SyntaxNode],
) -> Result<()> {
    sync(cx, parent, blocks, 0)?;

    let is_tail = cx.is_tail;
    let last = blocks.len().saturating_sub(1);
    for (index, block) in blocks.iter().enumerate() {
        cx.is_tail = is_tail && index == last;
        render_block(cx, parent, index, block)?;
    }
    cx.is_tail = is_tail;
    Ok(())
}

/// Compare element tags with the expected block tags from `from` on; at the
/// first mismatch remove that element and every later sibling. Returns the
/// number of elements removed.
fn sync<T: RenderTarget>(
    cx: &mut RenderContext<'_, T>,
    parent: &T::Node,
    blocks: &[&SyntaxNode],
    from: usize,
) -> Result<usize> {
    let count = cx.target.child_count(parent);
    for index in from..count {
        let fits = match (blocks.get(index), cx.target.child_at(parent, index)) {
            (Some(block), Some(el)) => cx.tag_matches(&el, block)?,
            _ => false,
        };
        if !fits {
            cx.truncate(parent, index);
            debug!("render"; "sync: dropped {} element(s) from index {}", count - index, index);
            return Ok(count - index);
        }
    }
    Ok(0)
}

/// Whether the element at `index` was rendered from exactly `block`.
fn is_current<T: RenderTarget>(
    cx: &RenderContext<'_, T>,
    parent: &T::Node,
    index: usize,
    block: &SyntaxNode,
) -> bool {
    cx.target.child_at(parent, index).is_some_and(|el| {
        cx.tag_matches(&el, block).unwrap_or(false) && cx.stamps.is_fresh(&el, block.span)
    })
}

/// Render `block` into the element at `index`, creating it when missing.
fn render_block<T: RenderTarget>(
    cx: &mut RenderContext<'_, T>,
    parent: &T::Node,
    index: usize,
    block: &SyntaxNode,
) -> Result<()> {
    let schema = cx.schema;
    let spec = schema.block(block.kind)?;

    let existing = cx.target.child_at(parent, index);
    if let Some(el) = &existing
        && cx.tag_matches(el, block)?
    {
        if cx.stamps.is_fresh(el, block.span) {
            cx.stats.skipped += 1;
            return Ok(());
        }
        (spec.render)(cx, block, el)?;
        cx.stamps.stamp(el, block.span);
        return Ok(());
    }

    // Build detached, attach once complete
    let tag = cx.tag_for(block)?;
    let el = spec.template.instantiate(&mut *cx.target, &tag);
    cx.stats.created += 1;
    (spec.render)(cx, block, &el)?;
    cx.stamps.stamp(&el, block.span);

    match existing {
        Some(old) => {
            cx.stamps.forget_subtree(&*cx.target, &old);
            cx.target.replace_child(parent, &el, &old);
            cx.stats.removed += 1;
        }
        None => cx.target.append_child(parent, &el),
    }
    Ok(())
}

/// Run the cleanup hooks of the block that was the tail before this pass,
/// and of its last descendants down through quotes and lists.
fn finish_tail<T: RenderTarget>(
    cx: &mut RenderContext<'_, T>,
    root: &T::Node,
    blocks: &[&SyntaxNode],
    previous: Checkpoint,
) -> Result<()> {
    let Some(mut block) = blocks.get(previous.index).copied() else {
        return Ok(());
    };
    if block.kind != previous.kind {
        return Ok(());
    }
    let Some(mut el) = cx.target.child_at(root, previous.index) else {
        return Ok(());
    };

    let schema = cx.schema;
    loop {
        if !cx.tag_matches(&el, block)? {
            return Ok(());
        }
        if let Some(cleanup) = schema.block(block.kind)?.cleanup {
            debug!("render"; "closing {} at index {}", block.kind, previous.index);
            cleanup(&mut *cx.target, &el);
        }

        if !matches!(
            block.kind,
            NodeKind::BlockQuote
                | NodeKind::BulletList
                | NodeKind::OrderedList { .. }
                | NodeKind::ListItem
        ) {
            return Ok(());
        }
        let children = rendered_children(block);
        let Some(last) = children.len().checked_sub(1) else {
            return Ok(());
        };
        let Some(child_el) = cx.target.child_at(&el, last) else {
            return Ok(());
        };
        block = children[last];
        el = child_el;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::schema::{BlockSpec, Schema};
    use crate::syntax::{IncrementalParser, MarkdownParser, Tree};
    use crate::target::{Dom, NodeId, StampTable};

    struct Bench {
        dom: Dom,
        schema: Schema<Dom>,
        stamps: StampTable<NodeId>,
        reconciler: Reconciler,
    }

    impl Bench {
        fn new(schema: Schema<Dom>) -> Self {
            Self {
                dom: Dom::new(),
                schema,
                stamps: StampTable::new(),
                reconciler: Reconciler::new(),
            }
        }

        fn pass(&mut self, text: &str) -> Result<PassSummary> {
            let tree: Tree = MarkdownParser::default().parse_full(text);
            let blocks = tree.rendered_blocks();
            let root = self.dom.root();
            let mut cx = RenderContext::new(&mut self.dom, &self.schema, &mut self.stamps, text);
            self.reconciler.reconcile(&mut cx, &root, &blocks)
        }

        fn html(&self) -> String {
            self.dom.inner_html(&self.dom.root())
        }
    }

    #[test]
    fn test_empty_document_is_noop() {
        let mut bench = Bench::new(Schema::builtin());
        let summary = bench.pass("").unwrap();
        assert_eq!(summary, PassSummary::default());
        assert_eq!(bench.dom.mutations(), 0);
        assert!(bench.reconciler.checkpoint().is_none());
    }

    #[test]
    fn test_checkpoint_tracks_tail() {
        let mut bench = Bench::new(Schema::builtin());
        bench.pass("a\n\nb").unwrap();
        let checkpoint = bench.reconciler.checkpoint().unwrap();
        assert_eq!(checkpoint.index, 1);
        assert_eq!(checkpoint.kind, NodeKind::Paragraph);
        assert_eq!(checkpoint.span, Span::new(3, 4));

        let summary = bench.pass("a\n\nbc").unwrap();
        assert_eq!(summary.first, 1);
        assert_eq!(summary.rendered, 1);
        assert_eq!(bench.html(), "<p>a</p><p>bc</p>");
    }

    #[test]
    fn test_tag_change_replaces_tail() {
        let mut bench = Bench::new(Schema::builtin());
        bench.pass("a\n\ntitle").unwrap();
        let first = bench.dom.child_at(&bench.dom.root(), 0).unwrap();
        let summary = bench.pass("a\n\ntitle\n===").unwrap();
        assert_eq!(summary.truncated, 1);
        assert_eq!(bench.html(), "<p>a</p><h1>title</h1>");
        assert_eq!(bench.dom.child_at(&bench.dom.root(), 0), Some(first));
    }

    #[test]
    fn test_fewer_blocks_truncates() {
        let mut bench = Bench::new(Schema::builtin());
        bench.pass("1. a\n\n2").unwrap();
        assert_eq!(bench.dom.child_count(&bench.dom.root()), 2);
        bench.pass("1. a\n\n2. b").unwrap();
        assert_eq!(bench.dom.child_count(&bench.dom.root()), 1);
        assert!(bench.html().starts_with("<ol>"));
    }

    #[test]
    fn test_unmapped_kind_fails_before_mutation() {
        let mut bench = Bench::new(Schema::empty());
        let result = bench.pass("para");
        assert!(matches!(result, Err(crate::Error::UnmappedKind("paragraph"))));
        assert_eq!(bench.dom.mutations(), 0);
    }

    #[test]
    fn test_fallback_handler() {
        let schema = Schema::empty().with_fallback(BlockSpec::new(
            "section",
            crate::render::blocks::render_inline,
        ));
        let mut bench = Bench::new(schema);
        bench.pass("one\n\ntwo").unwrap();
        assert_eq!(bench.html(), "<section>one</section><section>two</section>");
    }

    #[test]
    fn test_cleanup_runs_once_when_tail_moves_on() {
        let mut bench = Bench::new(Schema::builtin());
        bench.pass("```\ncode\n```").unwrap();
        assert!(bench.html().contains("data-state=\"streaming\""));
        bench.pass("```\ncode\n```\n\nnext").unwrap();
        assert!(bench.html().contains("data-state=\"complete\""));
        let before = bench.dom.mutations();
        bench.pass("```\ncode\n```\n\nnext!").unwrap();
        assert_eq!(bench.dom.mutations() - before, 1);
    }

    #[test]
    fn test_cleanup_reaches_nested_code() {
        let mut bench = Bench::new(Schema::builtin());
        bench.pass("> - ```\n>   code").unwrap();
        assert!(bench.html().contains("data-state=\"streaming\""));
        bench.pass("> - ```\n>   code\n\nnext").unwrap();
        assert!(bench.html().contains("data-state=\"complete\""));
        assert!(!bench.html().contains("data-state=\"streaming\""));
    }

    #[test]
    fn test_resume_steps_back_to_stale_block() {
        let mut bench = Bench::new(Schema::builtin());
        bench.pass("1. a\n\n2").unwrap();
        assert_eq!(bench.reconciler.checkpoint().unwrap().index, 1);
        let summary = bench.pass("1. a\n\n2. b\n\nx").unwrap();
        assert_eq!(summary.first, 0);
        assert_eq!(
            bench.html(),
            "<ol><li><p>a</p></li><li><p>b</p></li></ol><p>x</p>"
        );
    }
}
