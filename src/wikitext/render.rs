//! Plain-text rendering, the `inspect` dump and the JSON tree.

use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::wikitext::document::Document;
use crate::wikitext::enums::NodeType;
use crate::wikitext::errors::Result;
use crate::wikitext::node::{NodeId, NodeKind};
use crate::wikitext::templates::TemplateBehavior;

/// Payload-derived attributes worth showing next to the node type.
const PAYLOAD_KEYS: &[&str] = &[
    "level", "name", "tag", "file", "url", "link", "interwiki", "namespace", "anchor",
];

/// Serializable view of a subtree.
#[derive(Debug, Serialize)]
pub struct JsonNode<'a> {
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<JsonNode<'a>>,
}

impl Document {
    /// Plain text of a node. Block nodes end with a blank line.
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_text(id, &mut out);
        out
    }

    /// Plain text of a node's children; the decoded text for a text node.
    pub fn inner_text(&self, id: NodeId) -> String {
        if let Some(text) = self.text_node(id) {
            return text.decoded().to_string();
        }
        let mut out = String::new();
        for child in self.children(id) {
            self.write_text(*child, &mut out);
        }
        out
    }

    fn write_text(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Text(text) => out.push_str(text.decoded()),
            NodeKind::Paragraph | NodeKind::Pre => {
                self.write_children(id, out);
                out.push_str("\n\n");
            }
            NodeKind::Heading { .. } => {
                out.push_str(self.inner_text(id).trim());
                out.push_str("\n\n");
            }
            NodeKind::HR => out.push('\n'),
            NodeKind::HTMLTag { tag } if tag == "br" => out.push('\n'),
            NodeKind::Image { .. }
            | NodeKind::Ref
            | NodeKind::Gallery
            | NodeKind::HTMLOpeningTag { .. }
            | NodeKind::HTMLClosingTag { .. } => {}
            NodeKind::Template(info) => match &info.behavior {
                TemplateBehavior::Base => {}
                TemplateBehavior::Replace(text) => out.push_str(text),
                TemplateBehavior::ShowChildren => {
                    let text = self
                        .vars(id)
                        .into_iter()
                        .filter(|v| self.attr(*v, "name").is_some_and(|n| n.parse::<usize>().is_ok()))
                        .map(|v| self.inner_text(v))
                        .join("");
                    out.push_str(&text);
                }
                TemplateBehavior::Custom { text, .. } => {
                    if let Some(value) = text.as_ref().and_then(|ex| self.extract(id, ex)) {
                        out.push_str(&value);
                    }
                }
            },
            NodeKind::UnorderedList | NodeKind::OrderedList | NodeKind::DefinitionList => {
                self.write_list(id, 0, out);
                out.push('\n');
            }
            NodeKind::Table => {
                self.write_children(id, out);
                out.push('\n');
            }
            NodeKind::TableCaption => {
                out.push_str(self.inner_text(id).trim());
                out.push('\n');
            }
            NodeKind::TableRow => {
                let row = self
                    .children(id)
                    .iter()
                    .map(|cell| self.inner_text(*cell).trim().to_string())
                    .join(" | ");
                out.push_str(&row);
                out.push('\n');
            }
            _ => self.write_children(id, out),
        }
    }

    fn write_children(&self, id: NodeId, out: &mut String) {
        for child in self.children(id) {
            self.write_text(*child, out);
        }
    }

    /// One line per item, nested lists indented below their item.
    fn write_list(&self, list: NodeId, depth: usize, out: &mut String) {
        for (n, item) in self.children(list).iter().enumerate() {
            let marker = match (self.node_type(list), self.node_type(*item)) {
                (NodeType::OrderedList, _) => format!("{}. ", n + 1),
                (_, NodeType::DDefinition) => ": ".to_string(),
                (_, NodeType::DTerm) => String::new(),
                _ => "* ".to_string(),
            };
            let (nested, content): (Vec<NodeId>, Vec<NodeId>) = self
                .children(*item)
                .iter()
                .partition(|c| self.node_type(**c).is_list());
            let mut line = String::new();
            for child in content {
                self.write_text(child, &mut line);
            }
            let line = line.trim();
            if !line.is_empty() || nested.is_empty() {
                out.push_str(&"  ".repeat(depth));
                out.push_str(&marker);
                out.push_str(line);
                out.push('\n');
            }
            for sublist in nested {
                self.write_list(sublist, depth + 1, out);
            }
        }
    }

    fn payload_attrs(&self, id: NodeId) -> BTreeMap<String, String> {
        let kind = self.kind(id);
        let mut attrs: BTreeMap<String, String> = PAYLOAD_KEYS
            .iter()
            .filter_map(|key| kind.payload_attr(key).map(|v| (key.to_string(), v)))
            .collect();
        attrs.extend(self.attrs(id).clone());
        attrs
    }

    /// Indented one-line-per-node dump of a subtree.
    pub fn inspect(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.inspect_into(id, 0, &mut out);
        out
    }

    fn inspect_into(&self, id: NodeId, depth: usize, out: &mut String) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(self.node_type(id).name());
        if let Some(text) = self.text_node(id) {
            out.push_str(&format!(" {:?}", text.raw()));
        }
        let attrs = self.payload_attrs(id);
        if !attrs.is_empty() {
            out.push(' ');
            out.push_str(
                &attrs
                    .iter()
                    .map(|(k, v)| format!("{}={:?}", k, v))
                    .join(" "),
            );
        }
        out.push('\n');
        for child in self.children(id) {
            self.inspect_into(*child, depth + 1, out);
        }
    }

    pub fn to_json_node(&self, id: NodeId) -> JsonNode<'_> {
        JsonNode {
            node_type: self.node_type(id),
            text: self.text_node(id).map(|t| t.decoded()),
            attrs: self.payload_attrs(id),
            children: self
                .children(id)
                .iter()
                .map(|c| self.to_json_node(*c))
                .collect(),
        }
    }

    /// Pretty-printed JSON of a subtree.
    pub fn to_json(&self, id: NodeId) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_json_node(id))?)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::wikitext::document::Document;
    use crate::wikitext::parser::parse_document;
    use crate::wikitext::traits::StaticTraits;

    fn parse(text: &str) -> Document {
        parse_document(text, &StaticTraits::default()).unwrap()
    }

    #[test]
    fn paragraphs_and_headings() {
        let doc = parse("== Title ==\nSome '''bold''' &amp; [[link|text]].\n\nNext.");
        assert_eq!(
            doc.text(doc.root()),
            "Title\n\nSome bold & text.\n\nNext.\n\n"
        );
    }

    #[test]
    fn lists() {
        let doc = parse("* a\n** b\n* c\n# one\n# two");
        assert_eq!(
            doc.text(doc.root()),
            "* a\n  * b\n* c\n\n1. one\n2. two\n\n"
        );
    }

    #[test]
    fn tables() {
        let doc = parse("{|\n|+ Caption\n! A !! B\n|-\n| 1 || 2\n|}");
        assert_eq!(doc.text(doc.root()), "Caption\nA | B\n1 | 2\n\n");
    }

    #[test]
    fn templates_by_behavior() {
        let doc = parse("a{{!}}b {{nowrap|x y}} {{lang|fr|bonjour}} {{convert|5|km}}{{unknown|z}}<ref>r</ref>");
        assert_eq!(doc.text(doc.root()), "a|b x y bonjour 5 km\n\n");
    }

    #[test]
    fn line_breaks() {
        let doc = parse("one<br/>two");
        assert_eq!(doc.text(doc.root()), "one\ntwo\n\n");
    }

    #[test]
    fn inspect_dump() {
        let doc = parse("== T ==\n[[Foo#bar|x]] {{Tpl|k=v}}");
        let expected = "\
Document
  Heading level=\"2\"
    Text \"T\"
  Paragraph
    Wikilink anchor=\"bar\" link=\"Foo#bar\"
      Text \"x\"
    Text \" \"
    Template name=\"Tpl\"
      Var name=\"k\"
        Text \"v\"
";
        assert_eq!(doc.inspect(doc.root()), expected);
    }

    #[test]
    fn json_tree() {
        let doc = parse("[[File:A.png|thumb]]");
        let json: serde_json::Value = serde_json::from_str(&doc.to_json(doc.root()).unwrap()).unwrap();
        assert_eq!(json["type"], "Document");
        let image = &json["children"][0]["children"][0];
        assert_eq!(image["type"], "Image");
        assert_eq!(image["attrs"]["file"], "A.png");
        assert_eq!(image["attrs"]["type"], "thumb");
    }
}
