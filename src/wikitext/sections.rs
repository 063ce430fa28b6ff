//! Section views over a document.
//!
//! A `Section` is a heading plus a copy of the ids of the nodes that follow it
//! up to the next heading of the same level. Sections only reference
//! nodes; they never change a node's parent, so one node can be reachable from
//! the tree and from any number of sections at the same time.

use std::sync::OnceLock;

use crate::wikitext::document::Document;
use crate::wikitext::enums::NodeType;
use crate::wikitext::node::NodeId;
use crate::wikitext::selector::Selector;

#[derive(Debug, Clone)]
pub struct Section {
    heading: NodeId,
    level: u8,
    content: Vec<NodeId>,
    subsections: OnceLock<Vec<Section>>,
}

impl Section {
    pub fn heading(&self) -> NodeId {
        self.heading
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Nodes between the heading and the next heading of the same level.
    pub fn content(&self) -> &[NodeId] {
        &self.content
    }

    /// Plain text of the heading.
    pub fn title(&self, doc: &Document) -> String {
        doc.inner_text(self.heading).trim().to_string()
    }

    /// Sections nested in this one, computed on first use.
    pub fn subsections(&self, doc: &Document) -> &[Section] {
        self.subsections
            .get_or_init(|| split_sections(doc, &self.content))
    }

    /// Matches of `selector` within the section's content subtrees.
    pub fn lookup(&self, doc: &Document, selector: &Selector) -> Vec<NodeId> {
        self.content
            .iter()
            .flat_map(|id| doc.lookup(*id, selector))
            .collect()
    }

    /// Paragraph-level nodes before the first nested heading.
    pub fn intro(&self, doc: &Document) -> Vec<NodeId> {
        intro_of(doc, &self.content)
    }
}

/// Group `nodes` into sections at headings of the same level as the first
/// heading among them. Anything before that heading is left out.
pub(crate) fn split_sections(doc: &Document, nodes: &[NodeId]) -> Vec<Section> {
    let Some(level) = nodes.iter().find_map(|id| doc.heading_level(*id)) else {
        return Vec::new();
    };

    let mut out: Vec<Section> = Vec::new();
    for &id in nodes {
        match doc.heading_level(id) {
            Some(l) if l == level => out.push(Section {
                heading: id,
                level,
                content: Vec::new(),
                subsections: OnceLock::new(),
            }),
            _ => {
                if let Some(current) = out.last_mut() {
                    current.content.push(id);
                }
            }
        }
    }
    out
}

fn intro_of(doc: &Document, nodes: &[NodeId]) -> Vec<NodeId> {
    nodes
        .iter()
        .copied()
        .take_while(|id| !doc.is(*id, NodeType::Heading))
        .filter(|id| {
            matches!(
                doc.node_type(*id),
                NodeType::Paragraph
                    | NodeType::Pre
                    | NodeType::UnorderedList
                    | NodeType::OrderedList
                    | NodeType::DefinitionList
            )
        })
        .collect()
}

impl Document {
    /// Top-level sections of the document, computed once.
    pub fn sections(&self) -> &[Section] {
        self.sections
            .get_or_init(|| split_sections(self, self.children(self.root())))
    }

    /// Paragraph-level nodes preceding the first heading.
    pub fn intro(&self) -> Vec<NodeId> {
        intro_of(self, self.children(self.root()))
    }
}
