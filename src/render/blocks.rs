//! Built-in render functions for structural kinds.
//!
//! Every function receives the element chosen by the reconciler (reused or
//! freshly created from the schema template) and brings its content up to
//! date. Container kinds recurse through [`reconcile_children`].

use super::context::RenderContext;
use super::inline::build_tree;
use super::patch::patch_children;
use super::reconcile::reconcile_children;
use crate::error::Result;
use crate::syntax::{NodeKind, SyntaxNode};
use crate::target::RenderTarget;

/// `data-state` of a code block that may still grow.
pub const STATE_STREAMING: &str = "streaming";
/// `data-state` of a code block that is no longer the tail.
pub const STATE_COMPLETE: &str = "complete";

/// Paragraphs, headings, table cells.
pub fn render_inline<T: RenderTarget>(
    cx: &mut RenderContext<'_, T>,
    node: &SyntaxNode,
    el: &T::Node,
) -> Result<()> {
    let tree = build_tree(cx.text, node);
    patch_children(cx, el, &tree.children)
}

/// Quotes, bullet lists, list items.
pub fn render_container<T: RenderTarget>(
    cx: &mut RenderContext<'_, T>,
    node: &SyntaxNode,
    el: &T::Node,
) -> Result<()> {
    let children = rendered_children(node);
    reconcile_children(cx, el, &children)
}

pub fn render_ordered_list<T: RenderTarget>(
    cx: &mut RenderContext<'_, T>,
    node: &SyntaxNode,
    el: &T::Node,
) -> Result<()> {
    if let NodeKind::OrderedList { start } = node.kind
        && start != 1
    {
        cx.sync_attribute(el, "start", &start.to_string());
    }
    render_container(cx, node, el)
}

/// `pre > code`, with the info string's first word as `language-X`.
pub fn render_code<T: RenderTarget>(
    cx: &mut RenderContext<'_, T>,
    node: &SyntaxNode,
    el: &T::Node,
) -> Result<()> {
    let text = cx.text;
    let code = cx.ensure_child(el, 0, "code");

    let language = node
        .children
        .iter()
        .find(|c| c.kind == NodeKind::CodeInfo)
        .and_then(|info| info.text(text).split_whitespace().next());
    if let Some(language) = language {
        cx.sync_class(&code, &format!("language-{language}"));
    }

    let body: String = node
        .children
        .iter()
        .filter(|c| c.kind == NodeKind::CodeText)
        .map(|c| c.text(text))
        .collect();
    cx.sync_text(&code, &body);

    let state = if cx.is_tail {
        STATE_STREAMING
    } else {
        STATE_COMPLETE
    };
    cx.sync_attribute(el, "data-state", state);
    Ok(())
}

/// Cleanup hook: the code block stopped growing.
pub fn finish_code<T: RenderTarget>(target: &mut T, el: &T::Node) {
    if target.attribute(el, "data-state") != Some(STATE_COMPLETE) {
        target.set_attribute(el, "data-state", STATE_COMPLETE);
    }
}

/// Raw html blocks render as escaped text, never as markup.
pub fn render_html<T: RenderTarget>(
    cx: &mut RenderContext<'_, T>,
    node: &SyntaxNode,
    el: &T::Node,
) -> Result<()> {
    let raw = node.text(cx.text).trim_end_matches('\n');
    cx.sync_text(el, raw);
    Ok(())
}

/// `table > thead > tr > th*` then `tbody > tr > td*`.
pub fn render_table<T: RenderTarget>(
    cx: &mut RenderContext<'_, T>,
    node: &SyntaxNode,
    el: &T::Node,
) -> Result<()> {
    let mut index = 0;
    if let Some(head) = node.children.iter().find(|c| c.kind == NodeKind::TableHead) {
        let schema = cx.schema;
        let spec = schema.block(head.kind)?;
        let tag = cx.tag_for(head)?;
        let thead = cx.ensure_child(el, 0, &tag);
        (spec.render)(cx, head, &thead)?;
        index = 1;
    }

    let rows: Vec<&SyntaxNode> = node
        .children
        .iter()
        .filter(|c| c.kind == NodeKind::TableRow)
        .collect();
    if rows.is_empty() {
        cx.truncate(el, index);
        return Ok(());
    }
    let tbody = cx.ensure_child(el, index, "tbody");
    cx.truncate(el, index + 1);
    reconcile_children(cx, &tbody, &rows)
}

/// Header cells sit directly under the head; wrap them in one row.
pub fn render_table_head<T: RenderTarget>(
    cx: &mut RenderContext<'_, T>,
    node: &SyntaxNode,
    el: &T::Node,
) -> Result<()> {
    let row = cx.ensure_child(el, 0, "tr");
    let cells = rendered_children(node);

    cx.in_head = true;
    let result = reconcile_children(cx, &row, &cells);
    cx.in_head = false;
    result
}

pub fn render_table_row<T: RenderTarget>(
    cx: &mut RenderContext<'_, T>,
    node: &SyntaxNode,
    el: &T::Node,
) -> Result<()> {
    let cells = rendered_children(node);
    reconcile_children(cx, el, &cells)
}

/// Thematic breaks: the element is the whole output.
pub fn render_nothing<T: RenderTarget>(
    _cx: &mut RenderContext<'_, T>,
    _node: &SyntaxNode,
    _el: &T::Node,
) -> Result<()> {
    Ok(())
}

/// Block children that produce output.
pub(crate) fn rendered_children(node: &SyntaxNode) -> Vec<&SyntaxNode> {
    node.block_children()
        .filter(|c| c.kind != NodeKind::Comment)
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::render::{RenderContext, Reconciler, Schema};
    use crate::syntax::{IncrementalParser, MarkdownParser};
    use crate::target::{Dom, RenderTarget, StampTable};

    fn html(text: &str) -> String {
        let tree = MarkdownParser::default().parse_full(text);
        let blocks = tree.rendered_blocks();
        let mut dom = Dom::new();
        let root = dom.root();
        let schema = Schema::builtin();
        let mut stamps = StampTable::new();
        let mut cx = RenderContext::new(&mut dom, &schema, &mut stamps, text);
        Reconciler::new().reconcile(&mut cx, &root, &blocks).unwrap();
        dom.inner_html(&root)
    }

    #[test]
    fn test_headings() {
        assert_eq!(html("# text"), "<h1>text</h1>");
        assert_eq!(html("###### text"), "<h6>text</h6>");
    }

    #[test]
    fn test_lists() {
        assert_eq!(
            html("- a\n- b"),
            "<ul><li><p>a</p></li><li><p>b</p></li></ul>"
        );
        assert_eq!(html("3. x"), "<ol start=\"3\"><li><p>x</p></li></ol>");
    }

    #[test]
    fn test_blockquote() {
        assert_eq!(
            html("> a\n> b"),
            "<blockquote><p>a\nb</p></blockquote>"
        );
    }

    #[test]
    fn test_code_block() {
        assert_eq!(
            html("```rust\nfn main() {}\n```"),
            "<pre data-state=\"streaming\"><code class=\"language-rust\">fn main() {}\n</code></pre>"
        );
    }

    #[test]
    fn test_indented_code_has_no_language() {
        assert_eq!(
            html("    let x;\n"),
            "<pre data-state=\"streaming\"><code>let x;\n</code></pre>"
        );
    }

    #[test]
    fn test_finish_code() {
        let mut dom = Dom::new();
        let pre = dom.create_node("pre");
        super::finish_code(&mut dom, &pre);
        assert_eq!(dom.attribute(&pre, "data-state"), Some(super::STATE_COMPLETE));
        let before = dom.mutations();
        super::finish_code(&mut dom, &pre);
        assert_eq!(dom.mutations(), before);
    }

    #[test]
    fn test_html_block_is_escaped_text() {
        assert_eq!(
            html("<script>alert(1)</script>"),
            "<div class=\"raw-html\">&lt;script&gt;alert(1)&lt;/script&gt;</div>"
        );
    }

    #[test]
    fn test_table() {
        assert_eq!(
            html("a | b\n--|--\n1 | *2*"),
            "<table><thead><tr><th>a</th><th>b</th></tr></thead>\
             <tbody><tr><td>1</td><td><em>2</em></td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_table_without_body() {
        assert_eq!(
            html("a | b\n--|--"),
            "<table><thead><tr><th>a</th><th>b</th></tr></thead></table>"
        );
    }

    #[test]
    fn test_thematic_break() {
        assert_eq!(html("a\n\n---\n\nb"), "<p>a</p><hr><p>b</p>");
    }
}
