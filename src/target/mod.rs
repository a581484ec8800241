//! Render target seam: the host tree the renderer mutates.
//!
//! - [`RenderTarget`] - tree mutation primitives the engine relies on
//! - [`TargetRoot`] - fixed root node or a resolver re-run on every use
//! - [`StampTable`] - span stamps keyed by node identity
//! - [`Dom`] - built-in arena tree with HTML/JSON output

pub mod dom;
mod stamp;

pub use dom::{Dom, NodeId};
pub use stamp::StampTable;

use std::fmt;
use std::hash::Hash;

/// Host tree primitives.
///
/// Nodes are cheap handles. A node without a tag is a text unit.
/// Detached nodes (created but not yet appended) must accept every
/// mutation, so elements can be fully built before they are attached.
pub trait RenderTarget {
    type Node: Clone + Eq + Hash + fmt::Debug;

    /// Create a detached element.
    fn create_node(&mut self, tag: &str) -> Self::Node;

    /// Create a detached text unit.
    fn create_text(&mut self, text: &str) -> Self::Node;

    /// Element tag, `None` for text units.
    fn tag(&self, node: &Self::Node) -> Option<&str>;

    fn attribute(&self, node: &Self::Node, key: &str) -> Option<&str>;

    fn set_attribute(&mut self, node: &Self::Node, key: &str, value: &str);

    fn set_class(&mut self, node: &Self::Node, value: &str);

    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);

    /// Insert `child` before `before`, or append when `before` is not a
    /// child of `parent`.
    fn insert_before(&mut self, parent: &Self::Node, child: &Self::Node, before: &Self::Node);

    fn replace_child(&mut self, parent: &Self::Node, new: &Self::Node, old: &Self::Node);

    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node);

    /// Ordered children.
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Concatenated text of the node and its descendants.
    fn text_content(&self, node: &Self::Node) -> String;

    /// Replace all children with one text unit (elements) or overwrite the
    /// text (text units).
    fn set_text_content(&mut self, node: &Self::Node, text: &str);

    fn child_count(&self, node: &Self::Node) -> usize {
        self.children(node).len()
    }

    fn child_at(&self, node: &Self::Node, index: usize) -> Option<Self::Node> {
        self.children(node).into_iter().nth(index)
    }
}

/// Where the renderer attaches its output.
pub enum TargetRoot<N> {
    Node(N),
    /// Resolved again before every pass
    Resolver(Box<dyn Fn() -> Option<N>>),
}

impl<N: Clone> TargetRoot<N> {
    pub fn resolver(f: impl Fn() -> Option<N> + 'static) -> Self {
        Self::Resolver(Box::new(f))
    }

    pub fn resolve(&self) -> Option<N> {
        match self {
            Self::Node(node) => Some(node.clone()),
            Self::Resolver(f) => f(),
        }
    }
}

impl<N> From<N> for TargetRoot<N> {
    fn from(node: N) -> Self {
        Self::Node(node)
    }
}

impl<N: fmt::Debug> fmt::Debug for TargetRoot<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(node) => f.debug_tuple("Node").field(node).finish(),
            Self::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_resolver_runs_every_time() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let root: TargetRoot<u32> = TargetRoot::resolver(move || {
            counter.set(counter.get() + 1);
            Some(7)
        });
        assert_eq!(root.resolve(), Some(7));
        assert_eq!(root.resolve(), Some(7));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_fixed_root() {
        let root = TargetRoot::from(3u32);
        assert_eq!(root.resolve(), Some(3));
    }
}
