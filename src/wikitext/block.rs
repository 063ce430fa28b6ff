//! Block parser.
//!
//! Input is dispatched line by line into pending blocks. Paragraph, pre and
//! list blocks stay open for merging until a blank line closes them; the
//! merge and the collapsing of template-only paragraphs run once every line
//! has been consumed.

use lazy_regex::{regex, regex_captures};
use log::trace;
use regex::Regex;

use crate::wikitext::enums::{ListType, NodeType};
use crate::wikitext::errors::Result;
use crate::wikitext::inline::Stop;
use crate::wikitext::node::{NodeId, NodeKind};
use crate::wikitext::parser::Parser;

/// Inline content of a paragraph or pre block.
#[derive(Debug)]
struct Run {
    nodes: Vec<NodeId>,
    closed: bool,
    /// Only templates and whitespace; never merged with neighbours.
    templates_only: bool,
}

#[derive(Debug)]
struct ListItem {
    kind: NodeType,
    content: Vec<NodeId>,
    sublists: Vec<List>,
}

#[derive(Debug)]
struct List {
    ty: ListType,
    items: Vec<ListItem>,
}

#[derive(Debug)]
enum Block {
    Para(Run),
    Pre(Run),
    List { list: List, closed: bool },
    Done(NodeId),
}

impl Block {
    fn close(&mut self) {
        match self {
            Block::Para(run) | Block::Pre(run) => run.closed = true,
            Block::List { closed, .. } => *closed = true,
            Block::Done(_) => {}
        }
    }
}

impl Parser<'_> {
    /// Parse all remaining lines into top-level block nodes.
    pub(crate) fn blocks(&mut self) -> Result<Vec<NodeId>> {
        let mut pending = Vec::new();
        while !self.sc.eof() {
            self.block_line(&mut pending)?;
            self.sc.next_line()?;
        }

        let mut merged: Vec<Block> = Vec::with_capacity(pending.len());
        for block in pending {
            let unmerged = match merged.last_mut() {
                Some(prev) => self.merge(prev, block),
                None => Some(block),
            };
            if let Some(block) = unmerged {
                merged.push(block);
            }
        }

        let mut out = Vec::with_capacity(merged.len());
        for block in merged {
            self.materialize(block, &mut out);
        }
        Ok(out)
    }

    fn block_line(&mut self, pending: &mut Vec<Block>) -> Result<()> {
        let line = self.sc.rest().to_string();
        trace!("line {}: {:?}", self.sc.line_no(), line);

        if let Some(id) = self.heading(&line)? {
            self.sc.skip_rest();
            pending.push(Block::Done(id));
            return Ok(());
        }

        if regex!(r"^\s*\{\|").is_match(&line) {
            let id = self.table()?;
            pending.push(Block::Done(id));
            return Ok(());
        }

        if let Some(markers) = self.sc.scan(regex!(r"^[*#:;]+")) {
            let list = self.list_line(&markers)?;
            pending.push(Block::List {
                list,
                closed: false,
            });
            return Ok(());
        }

        if self.sc.skip(regex!(r"^-{4,}")) {
            pending.push(Block::Done(self.doc.create(NodeKind::HR)));
            self.sc.skip(regex!(r"^\s+"));
            if !self.sc.rest().is_empty() {
                let para = self.paragraph()?;
                pending.push(para);
            }
            return Ok(());
        }

        if line.trim().is_empty() {
            if let Some(last) = pending.last_mut() {
                last.close();
            }
            self.sc.skip_rest();
            return Ok(());
        }

        if line.starts_with(' ') && !line.trim_start().starts_with("{{") {
            self.sc.advance(1);
            let (nodes, _) = self.inline(None)?;
            pending.push(Block::Pre(Run {
                nodes,
                closed: false,
                templates_only: false,
            }));
            return Ok(());
        }

        let para = self.paragraph()?;
        pending.push(para);
        Ok(())
    }

    fn paragraph(&mut self) -> Result<Block> {
        let (nodes, _) = self.inline(None)?;
        let templates_only = self.is_templates_only(&nodes);
        Ok(Block::Para(Run {
            nodes,
            closed: false,
            templates_only,
        }))
    }

    /// `== Title ==`: the shorter `=` run gives the level; surplus `=` is text.
    fn heading(&mut self, line: &str) -> Result<Option<NodeId>> {
        let Some((_, open, inner, close)) = regex_captures!(r"^(=+)(.+?)(=+)\s*$", line) else {
            return Ok(None);
        };
        let level = open.len().min(close.len()).min(6);
        if level < 2 {
            return Ok(None);
        }
        let text = format!(
            "{}{}{}",
            "=".repeat(open.len() - level),
            inner,
            "=".repeat(close.len() - level)
        );
        let children = self.inline_str(text.trim(), self.sc.line_no())?;
        let id = self.doc.create_parent(
            NodeKind::Heading {
                level: level as u8,
            },
            children,
        );
        Ok(Some(id))
    }

    /// One list line; `markers` is already consumed. Each marker wraps the next.
    fn list_line(&mut self, markers: &str) -> Result<List> {
        let mut chars = markers.chars();
        let Some((ty, kind)) = chars.next().and_then(ListType::from_marker) else {
            return Ok(List {
                ty: ListType::Unordered,
                items: Vec::new(),
            });
        };
        let inner = chars.as_str();
        if !inner.is_empty() {
            let sublist = self.list_line(inner)?;
            return Ok(List {
                ty,
                items: vec![ListItem {
                    kind,
                    content: Vec::new(),
                    sublists: vec![sublist],
                }],
            });
        }

        self.sc.skip(regex!(r"^\s+"));
        if kind == NodeType::DTerm {
            // ;term : definition
            let colon: &Regex = regex!(":");
            let (term, stop) = self.inline(Some(colon))?;
            let mut items = vec![ListItem {
                kind,
                content: term,
                sublists: Vec::new(),
            }];
            if stop == Stop::Term {
                self.sc.skip(regex!(r"^\s+"));
                let (definition, _) = self.inline(None)?;
                items.push(ListItem {
                    kind: NodeType::DDefinition,
                    content: definition,
                    sublists: Vec::new(),
                });
            }
            return Ok(List { ty, items });
        }

        let (content, _) = self.inline(None)?;
        Ok(List {
            ty,
            items: vec![ListItem {
                kind,
                content,
                sublists: Vec::new(),
            }],
        })
    }

    fn is_templates_only(&self, nodes: &[NodeId]) -> bool {
        nodes.iter().any(|id| self.doc.is(*id, NodeType::Template))
            && nodes.iter().all(|id| match self.doc.text_node(*id) {
                Some(text) => text.raw().trim().is_empty(),
                None => self.doc.is(*id, NodeType::Template),
            })
    }

    /// Fold `next` into `prev` when both are open blocks of the same type.
    /// Returns `next` back when it has to stay a block of its own.
    fn merge(&mut self, prev: &mut Block, next: Block) -> Option<Block> {
        match (prev, next) {
            (Block::Para(prev), Block::Para(next))
                if !prev.closed && !prev.templates_only && !next.templates_only =>
            {
                self.push_text(&mut prev.nodes, " ");
                self.extend_inline(&mut prev.nodes, next.nodes);
                prev.closed = next.closed;
                None
            }
            (Block::Pre(prev), Block::Pre(next)) if !prev.closed => {
                self.push_text(&mut prev.nodes, "\n");
                self.extend_inline(&mut prev.nodes, next.nodes);
                prev.closed = next.closed;
                None
            }
            (
                Block::List {
                    list: prev,
                    closed: prev_closed,
                },
                Block::List { list, closed },
            ) if !*prev_closed && prev.ty == list.ty => {
                merge_list(prev, list);
                *prev_closed = closed;
                None
            }
            (_, next) => Some(next),
        }
    }

    fn materialize(&mut self, block: Block, out: &mut Vec<NodeId>) {
        match block {
            Block::Para(run) => {
                if run.nodes.is_empty() {
                    return;
                }
                if self.is_templates_only(&run.nodes) {
                    out.extend(
                        run.nodes
                            .into_iter()
                            .filter(|id| self.doc.is(*id, NodeType::Template)),
                    );
                } else {
                    out.push(self.doc.create_parent(NodeKind::Paragraph, run.nodes));
                }
            }
            Block::Pre(run) => out.push(self.doc.create_parent(NodeKind::Pre, run.nodes)),
            Block::List { list, .. } => {
                let id = self.build_list(list);
                out.push(id);
            }
            Block::Done(id) => out.push(id),
        }
    }

    fn build_list(&mut self, list: List) -> NodeId {
        let mut items = Vec::with_capacity(list.items.len());
        for item in list.items {
            let mut children = item.content;
            for sublist in item.sublists {
                children.push(self.build_list(sublist));
            }
            let kind = match item.kind {
                NodeType::DTerm => NodeKind::DTerm,
                NodeType::DDefinition => NodeKind::DDefinition,
                _ => NodeKind::ListItem,
            };
            items.push(self.doc.create_parent(kind, children));
        }
        let kind = match list.ty {
            ListType::Unordered => NodeKind::UnorderedList,
            ListType::Ordered => NodeKind::OrderedList,
            ListType::Definition => NodeKind::DefinitionList,
        };
        self.doc.create_parent(kind, items)
    }
}

/// Append the items of `from`. An item that only carries nested lists
/// continues the previous item of the same kind.
fn merge_list(into: &mut List, from: List) {
    for item in from.items {
        let continues = item.content.is_empty()
            && !item.sublists.is_empty()
            && into.items.last().is_some_and(|last| last.kind == item.kind);
        if continues && let Some(last) = into.items.last_mut() {
            for sublist in item.sublists {
                merge_sublist(last, sublist);
            }
        } else {
            into.items.push(item);
        }
    }
}

fn merge_sublist(item: &mut ListItem, sublist: List) {
    match item.sublists.last_mut() {
        Some(last) if last.ty == sublist.ty => merge_list(last, sublist),
        _ => item.sublists.push(sublist),
    }
}

#[cfg(test)]
mod tests {
    use crate::wikitext::document::Document;
    use crate::wikitext::enums::NodeType;
    use crate::wikitext::node::NodeId;
    use crate::wikitext::parser::parse_document;
    use crate::wikitext::traits::StaticTraits;

    fn parse(text: &str) -> Document {
        parse_document(text, &StaticTraits::default()).unwrap()
    }

    fn top(doc: &Document) -> Vec<NodeType> {
        types(doc, doc.children(doc.root()))
    }

    fn types(doc: &Document, ids: &[NodeId]) -> Vec<NodeType> {
        ids.iter().map(|id| doc.node_type(*id)).collect()
    }

    #[test]
    fn adjacent_lines_merge_into_one_paragraph() {
        let doc = parse("A\nB");
        assert_eq!(top(&doc), vec![NodeType::Paragraph]);
        let para = doc.children(doc.root())[0];
        assert_eq!(doc.children(para).len(), 1);
        assert_eq!(doc.inner_text(para), "A B");
    }

    #[test]
    fn blank_line_separates_paragraphs() {
        let doc = parse("A\n\nB");
        assert_eq!(top(&doc), vec![NodeType::Paragraph, NodeType::Paragraph]);
        let doc = parse("A\n   \nB");
        assert_eq!(top(&doc), vec![NodeType::Paragraph, NodeType::Paragraph]);
    }

    #[test]
    fn headings() {
        let doc = parse("== Two ==\n===Three===\n= One =\n=== Uneven ==");
        let ids = doc.children(doc.root()).to_vec();
        assert_eq!(
            types(&doc, &ids),
            vec![
                NodeType::Heading,
                NodeType::Heading,
                NodeType::Paragraph,
                NodeType::Heading
            ]
        );
        assert_eq!(doc.heading_level(ids[0]), Some(2));
        assert_eq!(doc.inner_text(ids[0]), "Two");
        assert_eq!(doc.heading_level(ids[1]), Some(3));
        assert_eq!(doc.heading_level(ids[3]), Some(2));
        assert_eq!(doc.inner_text(ids[3]), "= Uneven");
    }

    #[test]
    fn list_markers_nest_outermost_first() {
        let doc = parse("*#;term");
        let ul = doc.children(doc.root())[0];
        assert_eq!(doc.node_type(ul), NodeType::UnorderedList);
        let li = doc.children(ul)[0];
        assert_eq!(doc.node_type(li), NodeType::ListItem);
        let ol = doc.children(li)[0];
        assert_eq!(doc.node_type(ol), NodeType::OrderedList);
        let li2 = doc.children(ol)[0];
        let dl = doc.children(li2)[0];
        assert_eq!(doc.node_type(dl), NodeType::DefinitionList);
        let dt = doc.children(dl)[0];
        assert_eq!(doc.node_type(dt), NodeType::DTerm);
        assert_eq!(doc.inner_text(dt), "term");
    }

    #[test]
    fn list_lines_merge_and_nest() {
        let doc = parse("* one\n** one.a\n** one.b\n* two\n\n* other list");
        assert_eq!(
            top(&doc),
            vec![NodeType::UnorderedList, NodeType::UnorderedList]
        );
        let ul = doc.children(doc.root())[0];
        let items = doc.children(ul);
        assert_eq!(items.len(), 2);
        let first = doc.children(items[0]);
        assert_eq!(types(&doc, first), vec![NodeType::Text, NodeType::UnorderedList]);
        assert_eq!(doc.children(first[1]).len(), 2);
        assert_eq!(doc.inner_text(items[1]), "two");
    }

    #[test]
    fn mixed_list_types_do_not_merge() {
        let doc = parse("* a\n# b");
        assert_eq!(
            top(&doc),
            vec![NodeType::UnorderedList, NodeType::OrderedList]
        );
    }

    #[test]
    fn definition_on_one_line() {
        let doc = parse(";Term : definition\n: more");
        let dl = doc.children(doc.root())[0];
        assert_eq!(doc.node_type(dl), NodeType::DefinitionList);
        let items = doc.children(dl);
        assert_eq!(
            types(&doc, items),
            vec![NodeType::DTerm, NodeType::DDefinition, NodeType::DDefinition]
        );
        assert_eq!(doc.inner_text(items[1]), "definition");
    }

    #[test]
    fn template_only_paragraph_collapses() {
        let doc = parse("{{tpl}}\n\nparagraph");
        assert_eq!(top(&doc), vec![NodeType::Template, NodeType::Paragraph]);

        let doc = parse("{{a}} {{b}}\nText {{c}} here");
        assert_eq!(
            top(&doc),
            vec![NodeType::Template, NodeType::Template, NodeType::Paragraph]
        );
    }

    #[test]
    fn horizontal_rule_with_trailing_text() {
        let doc = parse("-----\n---- after");
        assert_eq!(
            top(&doc),
            vec![NodeType::HR, NodeType::HR, NodeType::Paragraph]
        );
        let para = doc.children(doc.root())[2];
        assert_eq!(doc.inner_text(para), "after");
    }

    #[test]
    fn preformatted_lines_join() {
        let doc = parse(" code 1\n code '''2'''\ntext");
        assert_eq!(top(&doc), vec![NodeType::Pre, NodeType::Paragraph]);
        let pre = doc.children(doc.root())[0];
        assert_eq!(doc.inner_text(pre), "code 1\ncode 2");
    }

    #[test]
    fn space_before_template_is_not_pre() {
        let doc = parse(" {{tpl}}");
        assert_eq!(top(&doc), vec![NodeType::Template]);
    }

    #[test]
    fn closed_paragraph_takes_no_merge() {
        let doc = parse("A\n\nB\nC");
        let ids = doc.children(doc.root()).to_vec();
        assert_eq!(ids.len(), 2);
        assert_eq!(doc.inner_text(ids[0]), "A");
        assert_eq!(doc.inner_text(ids[1]), "B C");
    }
}
