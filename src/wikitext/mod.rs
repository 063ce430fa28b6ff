//! Wikitext parser and document tree.
//!
//! Parsing is line-oriented: the block parser walks the input line by line,
//! hands inline content to the inline parser and tables to the table parser.
//! Every node lands in one arena `Document`, which is then queried through
//! selectors, sections and the render helpers.

pub mod block;
pub mod document;
pub mod enums;
pub mod errors;
pub mod inline;
pub mod links;
pub mod node;
pub mod parser;
pub mod render;
pub mod scanner;
pub mod sections;
pub mod selector;
pub mod split;
pub mod table;
pub mod templates;
pub mod traits;
pub mod wiki_text;

pub use document::Document;
pub use enums::{LinkType, ListType, NodeType, Predicate, QueryType};
pub use errors::{Result, WtError};
pub use links::{ImageOptions, LinkTarget};
pub use node::{Node, NodeId, NodeKind};
pub use parser::{parse_document, parse_fragment, parse_inline};
pub use sections::Section;
pub use selector::{AttrMatch, Selector};
pub use templates::{Extractor, TemplateBehavior, TemplateRegistry};
pub use traits::{SiteTraits, StaticTraits};
pub use wiki_text::WikiText;
