//! Selectors and tree lookups.
//!
//! A `Selector` is a conjunction of constraints on a single node: its type,
//! attribute values, named predicates and arbitrary closures. It holds no
//! reference to a tree, so one selector can be reused across documents.
//! The `lookup*` methods on `Document` apply a selector over different
//! traversal orders and return matches in document order.

use regex::Regex;
use std::fmt;
use std::sync::Arc;

use crate::wikitext::document::Document;
use crate::wikitext::enums::{NodeType, Predicate};
use crate::wikitext::node::NodeId;

/// Expected value of an attribute.
#[derive(Debug, Clone)]
pub enum AttrMatch {
    Exact(String),
    Regex(Regex),
    /// Present, non-empty and not `false`/`0`.
    Truthy,
    /// Absent, empty, `false` or `0`.
    Falsy,
}

impl AttrMatch {
    fn matches(&self, value: Option<&str>) -> bool {
        match (self, value) {
            (AttrMatch::Falsy, v) => !AttrMatch::Truthy.matches(v),
            (_, None) => false,
            (AttrMatch::Exact(expected), Some(v)) => v == expected,
            (AttrMatch::Regex(re), Some(v)) => re.is_match(v),
            (AttrMatch::Truthy, Some(v)) => {
                let v = v.trim();
                !v.is_empty() && v != "false" && v != "0"
            }
        }
    }
}

impl From<&str> for AttrMatch {
    fn from(value: &str) -> Self {
        AttrMatch::Exact(value.to_string())
    }
}

impl From<String> for AttrMatch {
    fn from(value: String) -> Self {
        AttrMatch::Exact(value)
    }
}

impl From<Regex> for AttrMatch {
    fn from(value: Regex) -> Self {
        AttrMatch::Regex(value)
    }
}

impl From<bool> for AttrMatch {
    fn from(value: bool) -> Self {
        if value {
            AttrMatch::Truthy
        } else {
            AttrMatch::Falsy
        }
    }
}

impl From<u8> for AttrMatch {
    fn from(value: u8) -> Self {
        AttrMatch::Exact(value.to_string())
    }
}

type NodeFn = Arc<dyn Fn(&Document, NodeId) -> bool + Send + Sync>;

#[derive(Clone)]
enum Constraint {
    Kind(NodeType),
    Attr(String, AttrMatch),
    Predicate(Predicate),
    Func(NodeFn),
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Kind(t) => write!(f, "Kind({})", t),
            Constraint::Attr(name, m) => write!(f, "Attr({}, {:?})", name, m),
            Constraint::Predicate(p) => write!(f, "Predicate({})", p),
            Constraint::Func(_) => write!(f, "Func(..)"),
        }
    }
}

/// Reusable node matcher. All constraints must hold.
#[derive(Debug, Clone, Default)]
pub struct Selector {
    constraints: Vec<Constraint>,
}

impl Selector {
    /// A selector with no constraints matches every node.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(node_type: NodeType) -> Self {
        Self::new().kind(node_type)
    }

    pub fn kind(mut self, node_type: NodeType) -> Self {
        self.constraints.push(Constraint::Kind(node_type));
        self
    }

    /// Require attribute `name` to match. `None` drops the constraint.
    pub fn attr<M: Into<AttrMatch>>(mut self, name: &str, expected: Option<M>) -> Self {
        if let Some(expected) = expected {
            self.constraints
                .push(Constraint::Attr(name.to_string(), expected.into()));
        }
        self
    }

    /// Add every entry of an attribute map; `None` values are dropped.
    pub fn attrs<I, K, M>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<M>)>,
        K: AsRef<str>,
        M: Into<AttrMatch>,
    {
        entries
            .into_iter()
            .fold(self, |sel, (name, expected)| sel.attr(name.as_ref(), expected))
    }

    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.constraints.push(Constraint::Predicate(predicate));
        self
    }

    pub fn filter<F>(mut self, f: F) -> Self
    where
        F: Fn(&Document, NodeId) -> bool + Send + Sync + 'static,
    {
        self.constraints.push(Constraint::Func(Arc::new(f)));
        self
    }

    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        self.constraints.iter().all(|c| match c {
            Constraint::Kind(t) => doc.node_type(id) == *t,
            Constraint::Attr(name, expected) => expected.matches(doc.attr(id, name).as_deref()),
            Constraint::Predicate(p) => doc.check(id, *p),
            Constraint::Func(f) => f(doc, id),
        })
    }
}

impl From<NodeType> for Selector {
    fn from(node_type: NodeType) -> Self {
        Selector::of(node_type)
    }
}

impl From<Predicate> for Selector {
    fn from(predicate: Predicate) -> Self {
        Selector::new().predicate(predicate)
    }
}

impl Document {
    /// `id` and all its descendants that match, in pre-order.
    pub fn lookup(&self, id: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(id)
            .filter(|n| selector.matches(self, *n))
            .collect()
    }

    /// Matching direct children.
    pub fn lookup_children(&self, id: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|n| selector.matches(self, *n))
            .collect()
    }

    /// Every matching ancestor, nearest first.
    pub fn lookup_parents(&self, id: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.ancestors(id)
            .filter(|n| selector.matches(self, *n))
            .collect()
    }

    /// Matching siblings, `id` itself excluded.
    pub fn lookup_siblings(&self, id: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.siblings(id)
            .iter()
            .copied()
            .filter(|n| *n != id && selector.matches(self, *n))
            .collect()
    }

    /// Matching siblings before `id`.
    pub fn lookup_prev_siblings(&self, id: NodeId, selector: &Selector) -> Vec<NodeId> {
        let Some(index) = self.index(id) else {
            return Vec::new();
        };
        self.siblings(id)[..index]
            .iter()
            .copied()
            .filter(|n| selector.matches(self, *n))
            .collect()
    }

    /// Matching siblings after `id`.
    pub fn lookup_next_siblings(&self, id: NodeId, selector: &Selector) -> Vec<NodeId> {
        let Some(index) = self.index(id) else {
            return Vec::new();
        };
        self.siblings(id)[index + 1..]
            .iter()
            .copied()
            .filter(|n| selector.matches(self, *n))
            .collect()
    }
}
