//! State threaded through one structural pass.

use std::borrow::Cow;

use super::schema::Schema;
use crate::error::Result;
use crate::syntax::{NodeKind, SyntaxNode};
use crate::target::{RenderTarget, StampTable};

/// Counters collected during a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Elements and text units created
    pub created: usize,
    /// Elements removed (sync truncation, patch removals, replacements)
    pub removed: usize,
    /// Subtrees skipped because their stamp matched
    pub skipped: usize,
}

/// Everything a render function may touch.
pub struct RenderContext<'r, T: RenderTarget> {
    pub target: &'r mut T,
    pub schema: &'r Schema<T>,
    pub stamps: &'r mut StampTable<T::Node>,
    /// Full source text the tree was parsed from
    pub text: &'r str,
    /// Rendering inside the last top-level block
    pub is_tail: bool,
    /// Rendering a table header row
    pub(crate) in_head: bool,
    pub stats: PassStats,
}

impl<'r, T: RenderTarget> RenderContext<'r, T> {
    pub fn new(
        target: &'r mut T,
        schema: &'r Schema<T>,
        stamps: &'r mut StampTable<T::Node>,
        text: &'r str,
    ) -> Self {
        Self {
            target,
            schema,
            stamps,
            text,
            is_tail: false,
            in_head: false,
            stats: PassStats::default(),
        }
    }

    /// Element tag expected for `node` at its current position.
    pub fn tag_for(&self, node: &SyntaxNode) -> Result<Cow<'r, str>> {
        if self.in_head && node.kind == NodeKind::TableCell {
            return Ok(Cow::Borrowed("th"));
        }
        let schema: &'r Schema<T> = self.schema;
        schema.block_tag(node.kind)
    }

    /// Whether `el` already has the tag expected for `node`.
    pub fn tag_matches(&self, el: &T::Node, node: &SyntaxNode) -> Result<bool> {
        let expected = self.tag_for(node)?;
        Ok(self.target.tag(el) == Some(expected.as_ref()))
    }

    /// Detach `child` from `parent` and drop its stamps.
    pub fn remove(&mut self, parent: &T::Node, child: &T::Node) {
        self.stamps.forget_subtree(&*self.target, child);
        self.target.remove_child(parent, child);
        self.stats.removed += 1;
    }

    /// Remove every child of `parent` from index `keep` on.
    pub fn truncate(&mut self, parent: &T::Node, keep: usize) {
        while self.target.child_count(parent) > keep {
            let Some(last) = self.target.child_at(parent, self.target.child_count(parent) - 1)
            else {
                break;
            };
            self.remove(parent, &last);
        }
    }

    /// Child `index` of `parent` if it is an element with `tag`; otherwise
    /// truncate from `index` and append a fresh `tag` element.
    pub fn ensure_child(&mut self, parent: &T::Node, index: usize, tag: &str) -> T::Node {
        if let Some(child) = self.target.child_at(parent, index)
            && self.target.tag(&child) == Some(tag)
        {
            return child;
        }
        self.truncate(parent, index);
        let child = self.target.create_node(tag);
        self.target.append_child(parent, &child);
        self.stats.created += 1;
        child
    }

    /// Write an attribute only when its value differs.
    pub fn sync_attribute(&mut self, el: &T::Node, key: &str, value: &str) {
        if self.target.attribute(el, key) != Some(value) {
            self.target.set_attribute(el, key, value);
        }
    }

    pub fn sync_class(&mut self, el: &T::Node, value: &str) {
        if self.target.attribute(el, "class") != Some(value) {
            self.target.set_class(el, value);
        }
    }

    /// Write text content only when it differs. An element holding a
    /// single text unit has that unit overwritten in place.
    pub fn sync_text(&mut self, node: &T::Node, text: &str) {
        let unit = if self.target.tag(node).is_none() {
            Some(node.clone())
        } else if self.target.child_count(node) == 1 {
            self.target
                .child_at(node, 0)
                .filter(|c| self.target.tag(c).is_none())
        } else {
            None
        };

        match unit {
            Some(unit) if text.is_empty() && unit != *node => {
                self.target.set_text_content(node, text);
            }
            Some(unit) => {
                if self.target.text_content(&unit) != text {
                    self.target.set_text_content(&unit, text);
                }
            }
            None if text.is_empty() && self.target.child_count(node) == 0 => {}
            None => self.target.set_text_content(node, text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{Dom, NodeId};

    fn with_context(f: impl FnOnce(&mut RenderContext<'_, Dom>, NodeId)) -> Dom {
        let mut dom = Dom::new();
        let root = dom.root();
        let schema = Schema::builtin();
        let mut stamps = StampTable::new();
        let mut cx = RenderContext::new(&mut dom, &schema, &mut stamps, "");
        f(&mut cx, root);
        dom
    }

    #[test]
    fn test_sync_text_overwrites_single_unit() {
        let dom = with_context(|cx, root| {
            cx.sync_text(&root, "a");
            let unit = cx.target.child_at(&root, 0).unwrap();
            let allocated = cx.target.allocated();
            for body in ["ab", "abc", "abcd"] {
                cx.sync_text(&root, body);
            }
            assert_eq!(cx.target.allocated(), allocated);
            assert_eq!(cx.target.child_at(&root, 0), Some(unit));
        });
        assert_eq!(dom.inner_html(&dom.root()), "abcd");
    }

    #[test]
    fn test_sync_text_skips_equal_text() {
        let dom = with_context(|cx, root| {
            cx.sync_text(&root, "same");
            let before = cx.target.mutations();
            cx.sync_text(&root, "same");
            assert_eq!(cx.target.mutations(), before);
        });
        assert_eq!(dom.text_content(&dom.root()), "same");
    }

    #[test]
    fn test_sync_text_replaces_mixed_children() {
        let dom = with_context(|cx, root| {
            let em = cx.target.create_node("em");
            cx.target.append_child(&root, &em);
            cx.sync_text(&root, "plain");
            cx.sync_text(&root, "");
        });
        assert_eq!(dom.child_count(&dom.root()), 0);
    }
}
