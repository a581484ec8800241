//! Inline patcher: bring an element's children in line with a formatting
//! tree using the fewest create/update/replace/remove operations.
//!
//! # Merge
//!
//! Old children and new nodes are walked with two cursors:
//!
//! | old      | new      | action                                         |
//! |----------|----------|------------------------------------------------|
//! | some     | none     | remove old                                     |
//! | none     | some     | create and append new                          |
//! | matches  | some     | update in place (skipped when the stamp fits)  |
//! | next old matches new | | remove old (it was deleted)                  |
//! | otherwise|          | replace old with a fresh node                  |
//!
//! A text leaf matches only a text unit; a mark matches only an element
//! whose tag is the schema tag for its kind. The one-step lookahead covers
//! the streaming case where a single trailing node keeps growing.

use super::context::RenderContext;
use super::inline::FormatNode;
use super::schema::MarkKind;
use crate::error::Result;
use crate::target::RenderTarget;

/// Patch the children of `parent` to match `nodes`.
pub fn patch_children<T: RenderTarget>(
    cx: &mut RenderContext<'_, T>,
    parent: &T::Node,
    nodes: &[FormatNode<'_>],
) -> Result<()> {
    let old = cx.target.children(parent);
    let (mut i, mut j) = (0, 0);

    loop {
        match (old.get(i), nodes.get(j)) {
            (None, None) => break,
            (Some(current), None) => {
                cx.remove(parent, current);
                i += 1;
            }
            (None, Some(node)) => {
                let created = create(cx, node)?;
                cx.target.append_child(parent, &created);
                j += 1;
            }
            (Some(current), Some(node)) => {
                if matches(cx, current, node)? {
                    update(cx, current, node)?;
                    i += 1;
                    j += 1;
                } else if let Some(next) = old.get(i + 1)
                    && matches(cx, next, node)?
                {
                    cx.remove(parent, current);
                    i += 1;
                } else {
                    let created = create(cx, node)?;
                    cx.stamps.forget_subtree(&*cx.target, current);
                    cx.target.replace_child(parent, &created, current);
                    cx.stats.removed += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
    }
    Ok(())
}

/// Whether `el` can be reused for `node`.
fn matches<T: RenderTarget>(
    cx: &RenderContext<'_, T>,
    el: &T::Node,
    node: &FormatNode<'_>,
) -> Result<bool> {
    let Some(kind) = node.mark_kind() else {
        return Ok(cx.target.tag(el).is_none());
    };
    let schema = cx.schema;
    let tag = schema.mark(kind)?.tag.as_str();
    Ok(cx.target.tag(el) == Some(tag))
}

fn update<T: RenderTarget>(
    cx: &mut RenderContext<'_, T>,
    el: &T::Node,
    node: &FormatNode<'_>,
) -> Result<()> {
    let text = cx.text;
    let Some(kind) = node.mark_kind() else {
        cx.sync_text(el, node.span.slice(text));
        return Ok(());
    };

    // url and title may still be growing even when the label is not
    for (key, value) in node.attrs() {
        cx.sync_attribute(el, key, value);
    }

    if cx.stamps.is_fresh(el, node.span) {
        cx.stats.skipped += 1;
        return Ok(());
    }

    match kind {
        MarkKind::InlineCode => cx.sync_text(el, &node.plain_text(text)),
        MarkKind::HardBreak | MarkKind::Image => {}
        _ => patch_children(cx, el, &node.children)?,
    }
    cx.stamps.stamp(el, node.span);
    Ok(())
}

/// Build a detached node for `node`, children included.
fn create<T: RenderTarget>(
    cx: &mut RenderContext<'_, T>,
    node: &FormatNode<'_>,
) -> Result<T::Node> {
    let text = cx.text;
    cx.stats.created += 1;

    let Some(kind) = node.mark_kind() else {
        return Ok(cx.target.create_text(node.span.slice(text)));
    };

    let schema = cx.schema;
    let template = schema.mark(kind)?;
    let el = template.instantiate(&mut *cx.target, &template.tag);
    for (key, value) in node.attrs() {
        cx.target.set_attribute(&el, key, value);
    }

    match kind {
        MarkKind::InlineCode => {
            let code = node.plain_text(text);
            if !code.is_empty() {
                cx.target.set_text_content(&el, &code);
            }
        }
        MarkKind::HardBreak | MarkKind::Image => {}
        _ => {
            for child in &node.children {
                let created = create(cx, child)?;
                cx.target.append_child(&el, &created);
            }
        }
    }

    cx.stamps.stamp(&el, node.span);
    Ok(el)
}
