//! Parser state and entry points.
//!
//! A `Parser` owns the scan context and the arena being filled. The block,
//! inline and table routines are `impl Parser` blocks in their own modules.
//! Constructs whose body is cut out of the input first (template vars, link
//! labels, ref bodies, table cells) are parsed by swapping in a nested scanner
//! over that body.

use log::{debug, trace};
use regex::Regex;
use std::collections::HashMap;

use crate::wikitext::document::Document;
use crate::wikitext::errors::Result;
use crate::wikitext::node::{NodeId, NodeKind};
use crate::wikitext::scanner::Scanner;
use crate::wikitext::traits::SiteTraits;

pub struct Parser<'t> {
    pub(crate) sc: Scanner,
    pub(crate) doc: Document,
    pub(crate) traits: &'t dyn SiteTraits,
    close_tags: HashMap<String, Regex>,
}

impl<'t> Parser<'t> {
    pub fn new(text: &str, traits: &'t dyn SiteTraits) -> Self {
        Self {
            sc: Scanner::new(text),
            doc: Document::new(),
            traits,
            close_tags: HashMap::new(),
        }
    }

    /// Run `f` against a scanner over `text`, then restore the outer scanner.
    pub(crate) fn nested<T>(
        &mut self,
        text: &str,
        base_line: usize,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let outer = std::mem::replace(&mut self.sc, Scanner::nested(text, base_line));
        let result = f(self);
        self.sc = outer;
        result
    }

    /// Parse a cut-out piece of input: block-level when it spans several
    /// lines, inline otherwise.
    pub(crate) fn fragment(&mut self, text: &str, base_line: usize) -> Result<Vec<NodeId>> {
        if text.contains('\n') {
            self.nested(text, base_line, |p| p.blocks())
        } else {
            self.nested(text, base_line, |p| p.inline_all())
        }
    }

    /// Inline-parse a single-line piece of input.
    pub(crate) fn inline_str(&mut self, text: &str, base_line: usize) -> Result<Vec<NodeId>> {
        self.nested(text, base_line, |p| p.inline_all())
    }

    /// Block-parse a piece of input regardless of its shape.
    pub(crate) fn blocks_str(&mut self, text: &str, base_line: usize) -> Result<Vec<NodeId>> {
        self.nested(text, base_line, |p| p.blocks())
    }

    /// Pattern matching `</tag>` (any case), compiled once per tag name.
    pub(crate) fn close_tag(&mut self, tag: &str) -> Result<Regex> {
        if let Some(re) = self.close_tags.get(tag) {
            return Ok(re.clone());
        }
        let re = Regex::new(&format!(r"(?i)</{}\s*>", regex::escape(tag)))?;
        self.close_tags.insert(tag.to_string(), re.clone());
        Ok(re)
    }

    /// Text node, merged into the previous node of `out` when that is text.
    pub(crate) fn push_text(&mut self, out: &mut Vec<NodeId>, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(&last) = out.last()
            && let Some(prev) = self.doc.text_mut(last)
        {
            prev.push_str(text);
            return;
        }
        let id = self.doc.create(NodeKind::text(text));
        out.push(id);
    }

    /// Append `nodes` to `out`, merging a leading text node into a trailing one.
    pub(crate) fn extend_inline(&mut self, out: &mut Vec<NodeId>, nodes: Vec<NodeId>) {
        let mut iter = nodes.into_iter();
        if let Some(first) = iter.next() {
            match self.doc.text_node(first).map(|t| t.raw().to_string()) {
                Some(raw) if out.last().is_some_and(|l| self.doc.text_node(*l).is_some()) => {
                    self.push_text(out, &raw);
                }
                _ => out.push(first),
            }
        }
        out.extend(iter);
    }

    /// Attach `top` to the root and drop nodes of abandoned attempts.
    fn finish(mut self, top: Vec<NodeId>) -> Document {
        let root = self.doc.root();
        self.doc.append_all(root, top);
        let before = self.doc.len();
        self.doc.compact();
        if before != self.doc.len() {
            trace!("compacted arena from {} to {} nodes", before, self.doc.len());
        }
        self.doc
    }
}

/// Parse a whole document.
pub fn parse_document(text: &str, traits: &dyn SiteTraits) -> Result<Document> {
    let mut parser = Parser::new(text, traits);
    let top = parser.blocks()?;
    debug!("parsed document: {} top-level nodes", top.len());
    Ok(parser.finish(top))
}

/// Parse inline markup only. The nodes are the children of the returned
/// document's root.
pub fn parse_inline(text: &str, traits: &dyn SiteTraits) -> Result<(Document, Vec<NodeId>)> {
    let mut parser = Parser::new(text, traits);
    let top = parser.inline_all()?;
    let doc = parser.finish(top);
    let nodes = doc.children(doc.root()).to_vec();
    Ok((doc, nodes))
}

/// Block parse when `text` has a newline, inline parse otherwise.
pub fn parse_fragment(text: &str, traits: &dyn SiteTraits) -> Result<(Document, Vec<NodeId>)> {
    if text.contains('\n') {
        let doc = parse_document(text, traits)?;
        let nodes = doc.children(doc.root()).to_vec();
        Ok((doc, nodes))
    } else {
        parse_inline(text, traits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wikitext::enums::NodeType;
    use crate::wikitext::traits::StaticTraits;

    fn types(doc: &Document, ids: &[NodeId]) -> Vec<NodeType> {
        ids.iter().map(|id| doc.node_type(*id)).collect()
    }

    #[test]
    fn fragment_picks_mode_by_newline() {
        let traits = StaticTraits::default();
        let (doc, nodes) = parse_fragment("''a''", &traits).unwrap();
        assert_eq!(types(&doc, &nodes), vec![NodeType::Italic]);

        let (doc, nodes) = parse_fragment("a\n\nb", &traits).unwrap();
        assert_eq!(
            types(&doc, &nodes),
            vec![NodeType::Paragraph, NodeType::Paragraph]
        );
    }

    #[test]
    fn ownership_holds_for_every_node() {
        let text = "{{Infobox tower|name=Anger|floors=10}}\n\
            '''Tower of Anger''' is a [[tower]].<ref>Source {{cite|x}}</ref>\n\
            \n\
            == Layout ==\n\
            * one\n\
            *# two\n\
            {|\n\
            ! a !! b\n\
            |-\n\
            | [[c|d]] || e\n\
            |}";
        let doc = parse_document(text, &StaticTraits::default()).unwrap();
        assert!(doc.check_ownership().is_ok());
        for id in doc.descendants(doc.root()) {
            if let Some(parent) = doc.parent(id) {
                let pos = doc.children(parent).iter().position(|c| *c == id);
                assert_eq!(doc.index(id), pos);
            }
        }
        // compaction leaves only reachable nodes
        assert_eq!(doc.descendants(doc.root()).count(), doc.len());
    }

    #[test]
    fn parse_errors_carry_line_numbers() {
        let err = parse_document("intro\n\n{{broken\n|a=1", &StaticTraits::default()).unwrap_err();
        assert!(err.is_parse_error());
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn inline_keeps_newlines_as_text() {
        let (doc, nodes) = parse_inline("a\nb", &StaticTraits::default()).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(doc.inner_text(nodes[0]), "a\nb");
    }
}
