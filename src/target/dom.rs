//! Arena-backed in-memory tree.
//!
//! The reference [`RenderTarget`]: used by the CLI, by one-shot renders,
//! and by every test. Nodes are never freed; removed subtrees stay in the
//! arena detached.

use std::fmt::Write as _;

use serde_json::{Map, Value};
use smallvec::SmallVec;

use super::RenderTarget;
use crate::utils::html::{escape, escape_attr, is_void_element};

/// Handle to a node in a [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

type Attrs = SmallVec<[(String, String); 2]>;

#[derive(Debug, Clone)]
enum Data {
    Element { tag: String, attrs: Attrs },
    Text(String),
}

#[derive(Debug, Clone)]
struct Slot {
    data: Data,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// In-memory element tree with a `div` root.
#[derive(Debug, Clone)]
pub struct Dom {
    slots: Vec<Slot>,
    mutations: usize,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub fn new() -> Self {
        let root = Slot {
            data: Data::Element {
                tag: "div".to_owned(),
                attrs: Attrs::new(),
            },
            parent: None,
            children: Vec::new(),
        };
        Self {
            slots: vec![root],
            mutations: 0,
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of mutating calls made so far.
    #[inline]
    pub fn mutations(&self) -> usize {
        self.mutations
    }

    /// Total nodes ever created (detached ones included).
    pub fn allocated(&self) -> usize {
        self.slots.len()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.slot(node).parent
    }

    #[inline]
    fn slot(&self, node: NodeId) -> &Slot {
        &self.slots[node.index()]
    }

    #[inline]
    fn slot_mut(&mut self, node: NodeId) -> &mut Slot {
        &mut self.slots[node.index()]
    }

    fn alloc(&mut self, data: Data) -> NodeId {
        let index = u32::try_from(self.slots.len()).expect("Dom arena exceeds u32::MAX nodes");
        let id = NodeId(index);
        self.slots.push(Slot {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.slot_mut(node).parent.take() {
            self.slot_mut(parent).children.retain(|c| *c != node);
        }
    }

    // -------------------------------------------------------------------------
    // Output
    // -------------------------------------------------------------------------

    /// Serialize `node` (itself included) as HTML.
    pub fn to_html(&self, node: &NodeId) -> String {
        let mut out = String::new();
        self.write_html(*node, &mut out);
        out
    }

    /// Serialize the children of `node` as HTML.
    pub fn inner_html(&self, node: &NodeId) -> String {
        let mut out = String::new();
        for child in &self.slot(*node).children {
            self.write_html(*child, &mut out);
        }
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let slot = self.slot(node);
        match &slot.data {
            Data::Text(text) => out.push_str(&escape(text)),
            Data::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (key, value) in attrs {
                    let _ = write!(out, " {}=\"{}\"", key, escape_attr(value));
                }
                out.push('>');
                if is_void_element(tag) {
                    return;
                }
                for child in &slot.children {
                    self.write_html(*child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }

    /// JSON snapshot: elements as `{tag, attrs, children}`, text as strings.
    pub fn to_json(&self, node: &NodeId) -> Value {
        let slot = self.slot(*node);
        match &slot.data {
            Data::Text(text) => Value::String(text.clone()),
            Data::Element { tag, attrs } => {
                let mut object = Map::new();
                object.insert("tag".to_owned(), Value::String(tag.clone()));
                if !attrs.is_empty() {
                    let attrs = attrs
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                        .collect();
                    object.insert("attrs".to_owned(), Value::Object(attrs));
                }
                if !slot.children.is_empty() {
                    let children = slot.children.iter().map(|c| self.to_json(c)).collect();
                    object.insert("children".to_owned(), Value::Array(children));
                }
                Value::Object(object)
            }
        }
    }
}

impl RenderTarget for Dom {
    type Node = NodeId;

    fn create_node(&mut self, tag: &str) -> NodeId {
        self.mutations += 1;
        self.alloc(Data::Element {
            tag: tag.to_owned(),
            attrs: Attrs::new(),
        })
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.mutations += 1;
        self.alloc(Data::Text(text.to_owned()))
    }

    fn tag(&self, node: &NodeId) -> Option<&str> {
        match &self.slot(*node).data {
            Data::Element { tag, .. } => Some(tag),
            Data::Text(_) => None,
        }
    }

    fn attribute(&self, node: &NodeId, key: &str) -> Option<&str> {
        match &self.slot(*node).data {
            Data::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            Data::Text(_) => None,
        }
    }

    fn set_attribute(&mut self, node: &NodeId, key: &str, value: &str) {
        self.mutations += 1;
        if let Data::Element { attrs, .. } = &mut self.slot_mut(*node).data {
            match attrs.iter_mut().find(|(k, _)| k == key) {
                Some((_, v)) => value.clone_into(v),
                None => attrs.push((key.to_owned(), value.to_owned())),
            }
        }
    }

    fn set_class(&mut self, node: &NodeId, value: &str) {
        self.set_attribute(node, "class", value);
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
        self.mutations += 1;
        self.detach(*child);
        self.slot_mut(*child).parent = Some(*parent);
        self.slot_mut(*parent).children.push(*child);
    }

    fn insert_before(&mut self, parent: &NodeId, child: &NodeId, before: &NodeId) {
        self.mutations += 1;
        self.detach(*child);
        self.slot_mut(*child).parent = Some(*parent);
        let children = &mut self.slot_mut(*parent).children;
        match children.iter().position(|c| c == before) {
            Some(index) => children.insert(index, *child),
            None => children.push(*child),
        }
    }

    fn replace_child(&mut self, parent: &NodeId, new: &NodeId, old: &NodeId) {
        let Some(index) = self.slot(*parent).children.iter().position(|c| c == old) else {
            return;
        };
        self.mutations += 1;
        self.detach(*new);
        // detaching `new` may have shifted `old`
        let index = self
            .slot(*parent)
            .children
            .iter()
            .position(|c| c == old)
            .unwrap_or(index);
        self.slot_mut(*parent).children[index] = *new;
        self.slot_mut(*new).parent = Some(*parent);
        self.slot_mut(*old).parent = None;
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) {
        if self.slot(*child).parent != Some(*parent) {
            return;
        }
        self.mutations += 1;
        self.detach(*child);
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.slot(*node).children.clone()
    }

    fn text_content(&self, node: &NodeId) -> String {
        let slot = self.slot(*node);
        match &slot.data {
            Data::Text(text) => text.clone(),
            Data::Element { .. } => slot
                .children
                .iter()
                .map(|c| self.text_content(c))
                .collect(),
        }
    }

    fn set_text_content(&mut self, node: &NodeId, text: &str) {
        self.mutations += 1;
        let id = *node;
        if let Data::Text(current) = &mut self.slot_mut(id).data {
            text.clone_into(current);
            return;
        }
        for child in std::mem::take(&mut self.slot_mut(id).children) {
            self.slot_mut(child).parent = None;
        }
        if !text.is_empty() {
            let unit = self.alloc(Data::Text(text.to_owned()));
            self.slot_mut(unit).parent = Some(id);
            self.slot_mut(id).children.push(unit);
        }
    }

    fn child_count(&self, node: &NodeId) -> usize {
        self.slot(*node).children.len()
    }

    fn child_at(&self, node: &NodeId, index: usize) -> Option<NodeId> {
        self.slot(*node).children.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_output() {
        let mut dom = Dom::new();
        let root = dom.root();
        let p = dom.create_node("p");
        let text = dom.create_text("a < b");
        let br = dom.create_node("br");
        dom.append_child(&p, &text);
        dom.append_child(&p, &br);
        dom.append_child(&root, &p);
        dom.set_attribute(&p, "title", "say \"hi\"");

        assert_eq!(
            dom.inner_html(&root),
            "<p title=\"say &quot;hi&quot;\">a &lt; b<br></p>"
        );
    }

    #[test]
    fn test_replace_and_insert() {
        let mut dom = Dom::new();
        let root = dom.root();
        let a = dom.create_node("a");
        let b = dom.create_node("b");
        let c = dom.create_node("i");
        dom.append_child(&root, &a);
        dom.append_child(&root, &b);
        dom.replace_child(&root, &c, &a);
        assert_eq!(dom.children(&root), vec![c, b]);
        assert_eq!(dom.parent(a), None);

        dom.insert_before(&root, &a, &b);
        assert_eq!(dom.children(&root), vec![c, a, b]);
        assert_eq!(dom.child_at(&root, 1), Some(a));
    }

    #[test]
    fn test_set_text_content_replaces_children() {
        let mut dom = Dom::new();
        let root = dom.root();
        let em = dom.create_node("em");
        dom.append_child(&root, &em);
        dom.set_text_content(&root, "plain");
        assert_eq!(dom.child_count(&root), 1);
        assert_eq!(dom.tag(&dom.child_at(&root, 0).unwrap()), None);
        assert_eq!(dom.text_content(&root), "plain");

        dom.set_text_content(&root, "");
        assert_eq!(dom.child_count(&root), 0);
    }

    #[test]
    fn test_set_text_content_on_unit_allocates_nothing() {
        let mut dom = Dom::new();
        let root = dom.root();
        dom.set_text_content(&root, "a");
        let unit = dom.child_at(&root, 0).unwrap();
        let allocated = dom.allocated();
        dom.set_text_content(&unit, "ab");
        assert_eq!(dom.allocated(), allocated);
        assert_eq!(dom.child_at(&root, 0), Some(unit));
        assert_eq!(dom.text_content(&root), "ab");
    }

    #[test]
    fn test_node_ids_are_sequential() {
        let mut dom = Dom::new();
        let a = dom.create_node("p");
        let b = dom.create_text("x");
        assert_eq!(b.index(), a.index() + 1);
        assert_eq!(dom.allocated(), b.index() + 1);
    }

    #[test]
    fn test_remove_ignores_foreign_child() {
        let mut dom = Dom::new();
        let root = dom.root();
        let p = dom.create_node("p");
        let before = dom.mutations();
        dom.remove_child(&root, &p);
        assert_eq!(dom.mutations(), before);
    }

    #[test]
    fn test_json_snapshot() {
        let mut dom = Dom::new();
        let root = dom.root();
        let h1 = dom.create_node("h1");
        dom.set_text_content(&h1, "Hi");
        dom.append_child(&root, &h1);

        let json = dom.to_json(&h1);
        assert_eq!(json, serde_json::json!({ "tag": "h1", "children": ["Hi"] }));
    }
}
