//! Span stamps: the source span each rendered element was last built from.
//!
//! Kept beside the host tree instead of on it, so any [`RenderTarget`]
//! works without carrying custom metadata.

use std::hash::Hash;

use rustc_hash::FxHashMap;

use super::RenderTarget;
use crate::syntax::Span;

#[derive(Debug, Clone)]
pub struct StampTable<N> {
    spans: FxHashMap<N, Span>,
}

impl<N> Default for StampTable<N> {
    fn default() -> Self {
        Self {
            spans: FxHashMap::default(),
        }
    }
}

impl<N: Clone + Eq + Hash> StampTable<N> {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn stamp(&mut self, node: &N, span: Span) {
        self.spans.insert(node.clone(), span);
    }

    #[inline]
    pub fn get(&self, node: &N) -> Option<Span> {
        self.spans.get(node).copied()
    }

    /// Whether `node` was last built from exactly `span`.
    #[inline]
    pub fn is_fresh(&self, node: &N, span: Span) -> bool {
        self.get(node) == Some(span)
    }

    /// Drop the stamps of `node` and every descendant.
    pub fn forget_subtree<T>(&mut self, target: &T, node: &N)
    where
        T: RenderTarget<Node = N> + ?Sized,
    {
        if self.spans.is_empty() {
            return;
        }
        let mut stack = vec![node.clone()];
        while let Some(current) = stack.pop() {
            self.spans.remove(&current);
            if target.tag(&current).is_some() {
                stack.extend(target.children(&current));
            }
        }
    }

    pub fn clear(&mut self) {
        self.spans.clear();
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}
