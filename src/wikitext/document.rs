//! Arena-backed document tree.
//!
//! A `Document` owns every node of one parse in a single vector. Parent and
//! child links are `NodeId`s into that vector. A node is attached to a parent
//! exactly once; after the parse finishes the tree is only read.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::wikitext::enums::{NodeType, Predicate};
use crate::wikitext::node::{Node, NodeId, NodeKind, TextNode};
use crate::wikitext::sections::Section;
use crate::wikitext::templates::{is_infobox, is_navbox};

/// A parsed wikitext document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    pub(crate) sections: OnceLock<Vec<Section>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document holding only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Document, BTreeMap::new())],
            sections: OnceLock::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of nodes in the arena, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes[0].children.is_empty()
    }

    /* Construction. Only the parser creates and attaches nodes. */

    pub(crate) fn create(&mut self, kind: NodeKind) -> NodeId {
        self.create_with_attrs(kind, BTreeMap::new())
    }

    pub(crate) fn create_with_attrs(
        &mut self,
        kind: NodeKind,
        attrs: BTreeMap<String, String>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(kind, attrs));
        id
    }

    /// Create a node and attach `children` to it.
    pub(crate) fn create_parent(&mut self, kind: NodeKind, children: Vec<NodeId>) -> NodeId {
        let id = self.create(kind);
        self.append_all(id, children);
        id
    }

    pub(crate) fn append(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(
            self.nodes[child.index()].parent.is_none(),
            "node {} is already attached",
            child
        );
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    pub(crate) fn append_all(&mut self, parent: NodeId, children: impl IntoIterator<Item = NodeId>) {
        for child in children {
            self.append(parent, child);
        }
    }

    pub(crate) fn text_mut(&mut self, id: NodeId) -> Option<&mut TextNode> {
        match &mut self.nodes[id.index()].kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Arena length, used to roll back an abandoned parse attempt.
    pub(crate) fn checkpoint(&self) -> usize {
        self.nodes.len()
    }

    /// Drop every node created after `checkpoint`. Nodes created since then
    /// must not have been attached to older nodes.
    pub(crate) fn rollback(&mut self, checkpoint: usize) {
        debug_assert!(checkpoint >= 1);
        self.nodes.truncate(checkpoint);
    }

    /// Rebuild the arena so that it only holds nodes reachable from the root,
    /// numbered in pre-order.
    pub(crate) fn compact(&mut self) {
        let order: Vec<NodeId> = self.descendants(NodeId::ROOT).collect();
        if order.len() == self.nodes.len() {
            return;
        }
        let mut remap = vec![None; self.nodes.len()];
        for (new, old) in order.iter().enumerate() {
            remap[old.index()] = Some(NodeId(new as u32));
        }
        let mut old_nodes: Vec<Option<Node>> = std::mem::take(&mut self.nodes)
            .into_iter()
            .map(Some)
            .collect();
        for old in &order {
            if let Some(mut node) = old_nodes[old.index()].take() {
                node.parent = node.parent.and_then(|p| remap[p.index()]);
                node.children = node
                    .children
                    .iter()
                    .filter_map(|c| remap[c.index()])
                    .collect();
                self.nodes.push(node);
            }
        }
    }

    /* Structural accessors. */

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn node_type(&self, id: NodeId) -> NodeType {
        self.nodes[id.index()].kind.node_type()
    }

    pub fn is(&self, id: NodeId, node_type: NodeType) -> bool {
        self.node_type(id) == node_type
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// Position of `id` among its parent's children.
    pub fn index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// All children of the parent, `id` included.
    pub fn siblings(&self, id: NodeId) -> &[NodeId] {
        match self.parent(id) {
            Some(parent) => self.children(parent),
            None => &[],
        }
    }

    pub fn attrs(&self, id: NodeId) -> &BTreeMap<String, String> {
        &self.nodes[id.index()].attrs
    }

    /// Attribute by name: payload-derived values (`level`, `name`, `link`, `url`...)
    /// first, then the attribute map.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<Cow<'_, str>> {
        let node = &self.nodes[id.index()];
        if let Some(value) = node.kind.payload_attr(name) {
            return Some(Cow::Owned(value));
        }
        node.attrs.get(name).map(|v| Cow::Borrowed(v.as_str()))
    }

    pub fn text_node(&self, id: NodeId) -> Option<&TextNode> {
        match &self.nodes[id.index()].kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Heading level, if `id` is a heading.
    pub fn heading_level(&self, id: NodeId) -> Option<u8> {
        match self.kind(id) {
            NodeKind::Heading { level } => Some(*level),
            _ => None,
        }
    }

    /// Template name, if `id` is a template.
    pub fn template_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Template(info) => Some(&info.name),
            _ => None,
        }
    }

    /// Pre-order traversal of `id` and all its descendants.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: vec![id],
        }
    }

    /// Strict ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |p| self.parent(*p))
    }

    /// Named zero-argument query.
    pub fn check(&self, id: NodeId, predicate: Predicate) -> bool {
        match predicate {
            Predicate::Infobox => self.template_name(id).is_some_and(is_infobox),
            Predicate::Navbox => self.template_name(id).is_some_and(is_navbox),
            Predicate::Empty => match self.text_node(id) {
                Some(text) => text.raw().trim().is_empty(),
                None => self.children(id).is_empty(),
            },
            Predicate::Inline => !self.node_type(id).is_block(),
            Predicate::Block => self.node_type(id).is_block(),
        }
    }

    /// Verify that every parent link agrees with the parent's child list and
    /// that every child appears exactly once. Returns the first offending node.
    pub fn check_ownership(&self) -> std::result::Result<(), NodeId> {
        for id in self.descendants(NodeId::ROOT) {
            for &child in self.children(id) {
                if self.parent(child) != Some(id) {
                    return Err(child);
                }
                if self.children(id).iter().filter(|c| **c == child).count() != 1 {
                    return Err(child);
                }
            }
            if id != NodeId::ROOT && self.index(id).is_none() {
                return Err(id);
            }
        }
        Ok(())
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(id).iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let a = doc.create(NodeKind::text("a"));
        let b = doc.create(NodeKind::text("b"));
        let p = doc.create_parent(NodeKind::Paragraph, vec![a, b]);
        doc.append(NodeId::ROOT, p);
        (doc, p, a, b)
    }

    #[test]
    fn append_sets_parent_and_index() {
        let (doc, p, a, b) = sample();
        assert_eq!(doc.parent(a), Some(p));
        assert_eq!(doc.index(b), Some(1));
        assert_eq!(doc.siblings(a), &[a, b]);
        assert_eq!(doc.index(doc.root()), None);
        assert!(doc.check_ownership().is_ok());
    }

    #[test]
    fn descendants_are_preorder() {
        let (doc, p, a, b) = sample();
        let order: Vec<NodeId> = doc.descendants(doc.root()).collect();
        assert_eq!(order, vec![NodeId::ROOT, p, a, b]);
        let up: Vec<NodeId> = doc.ancestors(a).collect();
        assert_eq!(up, vec![p, NodeId::ROOT]);
    }

    #[test]
    fn compact_drops_detached_nodes() {
        let mut doc = Document::new();
        let _garbage = doc.create(NodeKind::text("lost"));
        let t = doc.create(NodeKind::text("kept"));
        let p = doc.create_parent(NodeKind::Paragraph, vec![t]);
        doc.append(NodeId::ROOT, p);
        assert_eq!(doc.len(), 4);
        doc.compact();
        assert_eq!(doc.len(), 3);
        let p = doc.children(doc.root())[0];
        assert_eq!(doc.node_type(p), NodeType::Paragraph);
        let t = doc.children(p)[0];
        assert_eq!(doc.text_node(t).map(|t| t.raw()), Some("kept"));
        assert!(doc.check_ownership().is_ok());
    }

    #[test]
    fn attr_prefers_payload() {
        let mut doc = Document::new();
        let mut attrs = BTreeMap::new();
        attrs.insert("level".to_string(), "9".to_string());
        attrs.insert("id".to_string(), "top".to_string());
        let h = doc.create_with_attrs(NodeKind::Heading { level: 2 }, attrs);
        assert_eq!(doc.attr(h, "level").as_deref(), Some("2"));
        assert_eq!(doc.attr(h, "id").as_deref(), Some("top"));
        assert_eq!(doc.attr(h, "missing"), None);
        assert_eq!(doc.heading_level(h), Some(2));
    }

    #[test]
    fn predicates() {
        let (mut doc, p, a, _) = sample();
        let blank = doc.create(NodeKind::text("  "));
        assert!(doc.check(p, Predicate::Block));
        assert!(doc.check(a, Predicate::Inline));
        assert!(!doc.check(a, Predicate::Empty));
        assert!(doc.check(blank, Predicate::Empty));
    }
}
