//! Tree node types.
//!
//! Nodes live in the arena owned by a `Document` and refer to each other by
//! `NodeId`. The kind of a node is a closed sum type; kind-specific data sits in
//! the variant payload, free-form attributes (HTML attributes, image options,
//! table cell spans) sit in the node's attribute map.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use crate::wikitext::enums::NodeType;
use crate::wikitext::links::LinkTarget;
use crate::wikitext::templates::TemplateBehavior;

/// Index of a node within its `Document`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The document root (always 0).
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Leaf text: raw source plus its entity-decoded form, computed on first access.
#[derive(Debug, Clone, Default)]
pub struct TextNode {
    raw: String,
    decoded: OnceLock<String>,
}

impl TextNode {
    pub fn new<S: Into<String>>(raw: S) -> Self {
        Self {
            raw: raw.into(),
            decoded: OnceLock::new(),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Text with HTML entities (`&amp;`, `&nbsp;`, `&#8212;`) decoded.
    pub fn decoded(&self) -> &str {
        self.decoded
            .get_or_init(|| html_escape::decode_html_entities(&self.raw).into_owned())
    }

    /// Append to the raw text. Only valid before the decoded form was read.
    pub(crate) fn push_str(&mut self, s: &str) {
        self.raw.push_str(s);
        self.decoded = OnceLock::new();
    }
}

impl PartialEq for TextNode {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for TextNode {}

/// Template invocation: its name and the behavior resolved at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateInfo {
    pub name: String,
    pub behavior: TemplateBehavior,
}

/// Kind of a node, with kind-specific payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Text(TextNode),
    Bold,
    Italic,
    Wikilink(LinkTarget),
    Image { file: String },
    ExternalLink { url: String },
    Template(TemplateInfo),
    Var { name: String },
    HTMLTag { tag: String },
    HTMLOpeningTag { tag: String },
    HTMLClosingTag { tag: String },
    Ref,
    Math,
    Gallery,
    Nowiki,
    Heading { level: u8 },
    Paragraph,
    Pre,
    HR,
    UnorderedList,
    OrderedList,
    DefinitionList,
    ListItem,
    DTerm,
    DDefinition,
    Table,
    TableRow,
    TableCell,
    TableHeading,
    TableCaption,
}

impl NodeKind {
    pub fn text<S: Into<String>>(raw: S) -> Self {
        NodeKind::Text(TextNode::new(raw))
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Document => NodeType::Document,
            NodeKind::Text(_) => NodeType::Text,
            NodeKind::Bold => NodeType::Bold,
            NodeKind::Italic => NodeType::Italic,
            NodeKind::Wikilink(_) => NodeType::Wikilink,
            NodeKind::Image { .. } => NodeType::Image,
            NodeKind::ExternalLink { .. } => NodeType::ExternalLink,
            NodeKind::Template(_) => NodeType::Template,
            NodeKind::Var { .. } => NodeType::Var,
            NodeKind::HTMLTag { .. } => NodeType::HTMLTag,
            NodeKind::HTMLOpeningTag { .. } => NodeType::HTMLOpeningTag,
            NodeKind::HTMLClosingTag { .. } => NodeType::HTMLClosingTag,
            NodeKind::Ref => NodeType::Ref,
            NodeKind::Math => NodeType::Math,
            NodeKind::Gallery => NodeType::Gallery,
            NodeKind::Nowiki => NodeType::Nowiki,
            NodeKind::Heading { .. } => NodeType::Heading,
            NodeKind::Paragraph => NodeType::Paragraph,
            NodeKind::Pre => NodeType::Pre,
            NodeKind::HR => NodeType::HR,
            NodeKind::UnorderedList => NodeType::UnorderedList,
            NodeKind::OrderedList => NodeType::OrderedList,
            NodeKind::DefinitionList => NodeType::DefinitionList,
            NodeKind::ListItem => NodeType::ListItem,
            NodeKind::DTerm => NodeType::DTerm,
            NodeKind::DDefinition => NodeType::DDefinition,
            NodeKind::Table => NodeType::Table,
            NodeKind::TableRow => NodeType::TableRow,
            NodeKind::TableCell => NodeType::TableCell,
            NodeKind::TableHeading => NodeType::TableHeading,
            NodeKind::TableCaption => NodeType::TableCaption,
        }
    }

    /// Attribute values carried by the payload rather than the attribute map.
    pub fn payload_attr(&self, name: &str) -> Option<String> {
        match (self, name) {
            (NodeKind::Heading { level }, "level") => Some(level.to_string()),
            (NodeKind::Template(info), "name") => Some(info.name.clone()),
            (NodeKind::Var { name }, "name") => Some(name.clone()),
            (
                NodeKind::HTMLTag { tag }
                | NodeKind::HTMLOpeningTag { tag }
                | NodeKind::HTMLClosingTag { tag },
                "tag",
            ) => Some(tag.clone()),
            (NodeKind::Image { file }, "file") => Some(file.clone()),
            (NodeKind::ExternalLink { url }, "url") => Some(url.clone()),
            (NodeKind::Wikilink(target), key) => match key {
                "link" => Some(target.link.clone()),
                "page" => Some(target.page.clone()),
                "topic" => Some(target.topic.clone()),
                "namespace" => target.namespace.clone(),
                "interwiki" => target.interwiki.clone(),
                "anchor" => target.anchor.clone(),
                "refinement" => target.refinement.clone(),
                _ => None,
            },
            (NodeKind::Text(text), "text") => Some(text.raw().to_string()),
            _ => None,
        }
    }
}

/// A node in the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) attrs: BTreeMap<String, String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, attrs: BTreeMap<String, String>) -> Self {
        Self {
            kind,
            attrs,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}
