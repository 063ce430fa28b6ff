//! Enums used by the wikitext module.
//!
//! This module defines the plain (payload-free) enum types referenced by the
//! other submodules:
//! - `NodeType` - the kind tag of a tree node, used by selectors.
//! - `ListType` - list kinds, with the marker characters that open them.
//! - `QueryType` - strategies for matching template names.
//! - `LinkType` - distinguishes internal vs external links.
//! - `Predicate` - named node predicates usable inside a selector.
//!
//! Each type implements `Display` and `FromStr` so selectors and queries can be
//! built from textual form in tests or higher-level code.

use std::fmt;
use std::str::FromStr;

/// Kind tag of a node, mirroring `NodeKind` without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub enum NodeType {
    Document,
    Text,
    Bold,
    Italic,
    Wikilink,
    Image,
    ExternalLink,
    Template,
    Var,
    HTMLTag,
    HTMLOpeningTag,
    HTMLClosingTag,
    Ref,
    Math,
    Gallery,
    Nowiki,
    Heading,
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

impl NodeType {
    pub const ALL: [NodeType; 31] = [
        NodeType::Document,
        NodeType::Text,
        NodeType::Bold,
        NodeType::Italic,
        NodeType::Wikilink,
        NodeType::Image,
        NodeType::ExternalLink,
        NodeType::Template,
        NodeType::Var,
        NodeType::HTMLTag,
        NodeType::HTMLOpeningTag,
        NodeType::HTMLClosingTag,
        NodeType::Ref,
        NodeType::Math,
        NodeType::Gallery,
        NodeType::Nowiki,
        NodeType::Heading,
        NodeType::Paragraph,
        NodeType::Pre,
        NodeType::HR,
        NodeType::UnorderedList,
        NodeType::OrderedList,
        NodeType::DefinitionList,
        NodeType::ListItem,
        NodeType::DTerm,
        NodeType::DDefinition,
        NodeType::Table,
        NodeType::TableRow,
        NodeType::TableCell,
        NodeType::TableHeading,
        NodeType::TableCaption,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NodeType::Document => "Document",
            NodeType::Text => "Text",
            NodeType::Bold => "Bold",
            NodeType::Italic => "Italic",
            NodeType::Wikilink => "Wikilink",
            NodeType::Image => "Image",
            NodeType::ExternalLink => "ExternalLink",
            NodeType::Template => "Template",
            NodeType::Var => "Var",
            NodeType::HTMLTag => "HTMLTag",
            NodeType::HTMLOpeningTag => "HTMLOpeningTag",
            NodeType::HTMLClosingTag => "HTMLClosingTag",
            NodeType::Ref => "Ref",
            NodeType::Math => "Math",
            NodeType::Gallery => "Gallery",
            NodeType::Nowiki => "Nowiki",
            NodeType::Heading => "Heading",
            NodeType::Paragraph => "Paragraph",
            NodeType::Pre => "Pre",
            NodeType::HR => "HR",
            NodeType::UnorderedList => "UnorderedList",
            NodeType::OrderedList => "OrderedList",
            NodeType::DefinitionList => "DefinitionList",
            NodeType::ListItem => "ListItem",
            NodeType::DTerm => "DTerm",
            NodeType::DDefinition => "DDefinition",
            NodeType::Table => "Table",
            NodeType::TableRow => "TableRow",
            NodeType::TableCell => "TableCell",
            NodeType::TableHeading => "TableHeading",
            NodeType::TableCaption => "TableCaption",
        }
    }

    /// Block-level (paragraph-level) kinds.
    pub fn is_block(self) -> bool {
        matches!(
            self,
            NodeType::Heading
                | NodeType::Paragraph
                | NodeType::Pre
                | NodeType::HR
                | NodeType::UnorderedList
                | NodeType::OrderedList
                | NodeType::DefinitionList
                | NodeType::Table
                | NodeType::Gallery
        )
    }

    pub fn is_list(self) -> bool {
        matches!(
            self,
            NodeType::UnorderedList | NodeType::OrderedList | NodeType::DefinitionList
        )
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NodeType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown NodeType '{}'", s))
    }
}

/// The kind of list opened by a marker character.
///
/// Markers:
/// - `*` unordered
/// - `#` ordered (numbered)
/// - `;` definition term
/// - `:` definition description (also used for plain indentation)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListType {
    /// Unordered list (bulleted) - `*`
    Unordered,
    /// Ordered (numbered) list - `#`
    Ordered,
    /// Definition-style list (`;` or `:`)
    Definition,
}

impl ListType {
    /// List type and the item kind a marker character produces.
    pub fn from_marker(c: char) -> Option<(ListType, NodeType)> {
        match c {
            '*' => Some((ListType::Unordered, NodeType::ListItem)),
            '#' => Some((ListType::Ordered, NodeType::ListItem)),
            ';' => Some((ListType::Definition, NodeType::DTerm)),
            ':' => Some((ListType::Definition, NodeType::DDefinition)),
            _ => None,
        }
    }

    pub fn node_type(self) -> NodeType {
        match self {
            ListType::Unordered => NodeType::UnorderedList,
            ListType::Ordered => NodeType::OrderedList,
            ListType::Definition => NodeType::DefinitionList,
        }
    }
}

impl fmt::Display for ListType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListType::Unordered => write!(f, "Unordered"),
            ListType::Ordered => write!(f, "Ordered"),
            ListType::Definition => write!(f, "Definition"),
        }
    }
}

impl FromStr for ListType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "*" | "unordered" | "bullet" => Ok(ListType::Unordered),
            "#" | "ordered" | "numbered" => Ok(ListType::Ordered),
            ";" | ":" | "definition" | "def" => Ok(ListType::Definition),
            other => Err(format!("unknown ListType '{}'", other)),
        }
    }
}

/// Strategy used when searching for templates by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    /// Exact (case-insensitive) match.
    Exact,
    /// Prefix match (case-insensitive).
    StartsWith,
    /// Substring match (case-insensitive).
    Contains,
}

impl QueryType {
    /// Compare `candidate` against `query`, ignoring case.
    pub fn matches(self, candidate: &str, query: &str) -> bool {
        let cand = candidate.trim().to_lowercase();
        let query = query.trim().to_lowercase();
        match self {
            QueryType::Exact => cand == query,
            QueryType::StartsWith => cand.starts_with(&query),
            QueryType::Contains => cand.contains(&query),
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryType::Exact => write!(f, "Exact"),
            QueryType::StartsWith => write!(f, "StartsWith"),
            QueryType::Contains => write!(f, "Contains"),
        }
    }
}

impl FromStr for QueryType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" | "eq" | "e" => Ok(QueryType::Exact),
            "startswith" | "start" | "prefix" | "s" => Ok(QueryType::StartsWith),
            "contains" | "contain" | "substr" | "c" => Ok(QueryType::Contains),
            other => Err(format!("unknown QueryType '{}'", other)),
        }
    }
}

/// The kind of link encountered in parsed wikitext.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    /// Internal wiki link using `[[...]]`.
    Internal,
    /// External link using `[http://...]` or similar.
    External,
}

impl LinkType {
    pub fn node_type(self) -> NodeType {
        match self {
            LinkType::Internal => NodeType::Wikilink,
            LinkType::External => NodeType::ExternalLink,
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkType::Internal => write!(f, "Internal"),
            LinkType::External => write!(f, "External"),
        }
    }
}

impl FromStr for LinkType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "internal" | "int" | "i" => Ok(LinkType::Internal),
            "external" | "ext" | "e" => Ok(LinkType::External),
            other => Err(format!("unknown LinkType '{}'", other)),
        }
    }
}

/// Named zero-argument node queries a selector can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// Template whose name classifies it as an infobox.
    Infobox,
    /// Template whose name classifies it as a navigation box.
    Navbox,
    /// Node without children, or a text node with only whitespace.
    Empty,
    /// Not a block-level node.
    Inline,
    /// Block-level node.
    Block,
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Infobox => write!(f, "infobox"),
            Predicate::Navbox => write!(f, "navbox"),
            Predicate::Empty => write!(f, "empty"),
            Predicate::Inline => write!(f, "inline"),
            Predicate::Block => write!(f, "block"),
        }
    }
}

impl FromStr for Predicate {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_end_matches('?').to_lowercase().as_str() {
            "infobox" => Ok(Predicate::Infobox),
            "navbox" => Ok(Predicate::Navbox),
            "empty" => Ok(Predicate::Empty),
            "inline" => Ok(Predicate::Inline),
            "block" => Ok(Predicate::Block),
            other => Err(format!("unknown Predicate '{}'", other)),
        }
    }
}
