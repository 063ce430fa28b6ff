//! Inline parser.
//!
//! Inline content runs until the end of the current line or until a caller
//! supplied terminator. The scanner jumps between formatting triggers; text in
//! between is collected into (coalesced) text nodes. Constructs with an
//! explicit closer (`]]`, `}}`, `</tag>`) may span lines and leave the scanner
//! on the line where they closed.

use lazy_regex::{regex, regex_captures};
use log::{debug, trace};
use regex::Regex;
use std::collections::BTreeMap;

use crate::wikitext::errors::Result;
use crate::wikitext::links::{ImageOptions, LinkTarget, file_name};
use crate::wikitext::node::{NodeId, NodeKind, TemplateInfo};
use crate::wikitext::parser::Parser;
use crate::wikitext::split::{parse_attrs, split_key_value, split_top_level};

/// Quote-delimited formatting currently open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Quote {
    Italic,
    Bold,
}

/// Why an inline run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stop {
    /// End of the current line.
    Eol,
    /// The caller's terminator matched.
    Term,
    /// The enclosing quote formatting closed.
    Quote,
}

/// Elements that never have a closing tag.
const VOID_TAGS: &[&str] = &[
    "br", "hr", "wbr", "img", "meta", "link", "input", "col", "area", "base", "embed",
];

fn trigger() -> &'static Regex {
    regex!(
        r"'{2,}|\[\[|\[(?i:https?://|ftps?://|sftp://|mailto:|irc://|ircs://|news:|gopher://|ssh://|git://|svn://|telnet://|//)|\{\{|<"
    )
}

impl Parser<'_> {
    /// All remaining input as inline content; line breaks are kept as text.
    pub(crate) fn inline_all(&mut self) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        while !self.sc.eof() {
            let (nodes, _) = self.inline(None)?;
            self.extend_inline(&mut out, nodes);
            self.sc.next_line()?;
            if !self.sc.eof() {
                self.push_text(&mut out, "\n");
            }
        }
        Ok(out)
    }

    /// Inline content up to `until` or the end of the current line. The
    /// terminator is consumed.
    pub(crate) fn inline(&mut self, until: Option<&Regex>) -> Result<(Vec<NodeId>, Stop)> {
        self.inline_run(until, None)
    }

    fn inline_run(
        &mut self,
        until: Option<&Regex>,
        quote: Option<Quote>,
    ) -> Result<(Vec<NodeId>, Stop)> {
        let mut out = Vec::new();
        loop {
            let found = match until {
                Some(term) => self.sc.scan_until_any(&[term, trigger()]),
                None => self.sc.scan_until(trigger()),
            };
            let Some(found) = found else {
                let rest = self.sc.skip_rest();
                self.push_text(&mut out, &rest);
                return Ok((out, Stop::Eol));
            };
            self.push_text(&mut out, &found.text);
            if until.is_some() && found.which == 0 {
                return Ok((out, Stop::Term));
            }
            trace!("inline trigger {:?} at line {}", found.delim, self.sc.line_no());
            if let Some(stop) = self.dispatch(&found.delim, until, quote, &mut out)? {
                return Ok((out, stop));
            }
        }
    }

    fn dispatch(
        &mut self,
        delim: &str,
        until: Option<&Regex>,
        quote: Option<Quote>,
        out: &mut Vec<NodeId>,
    ) -> Result<Option<Stop>> {
        if delim.starts_with("''") {
            return self.quotes(delim.len(), until, quote, out);
        }
        match delim {
            "[[" => self.wikilink(out)?,
            "{{" => self.template(out)?,
            "<" => self.tag(out)?,
            _ => {
                // `[` + scheme: step back to just after the bracket
                self.sc.unread(delim.len() - 1);
                self.external_link(out)?;
            }
        }
        Ok(None)
    }

    /// Handle a run of `n` apostrophes.
    fn quotes(
        &mut self,
        mut n: usize,
        until: Option<&Regex>,
        quote: Option<Quote>,
        out: &mut Vec<NodeId>,
    ) -> Result<Option<Stop>> {
        if n == 4 {
            self.push_text(out, "'");
            n = 3;
        } else if n > 5 {
            self.push_text(out, &"'".repeat(n - 5));
            n = 5;
        }

        match (quote, n) {
            (Some(Quote::Italic), 2) | (Some(Quote::Bold), 3) => Ok(Some(Stop::Quote)),
            (Some(Quote::Italic), 5) => {
                self.sc.unread(3);
                Ok(Some(Stop::Quote))
            }
            (Some(Quote::Bold), 5) => {
                self.sc.unread(2);
                Ok(Some(Stop::Quote))
            }
            (_, 2) => self.formatted(Quote::Italic, until, out),
            (_, 3) => self.formatted(Quote::Bold, until, out),
            _ => {
                // ''''' opens bold wrapping italic
                let (inner, mut stop) = self.inline_run(until, Some(Quote::Italic))?;
                let italic = self.doc.create_parent(NodeKind::Italic, inner);
                let mut children = vec![italic];
                if stop == Stop::Quote {
                    let (more, after) = self.inline_run(until, Some(Quote::Bold))?;
                    self.extend_inline(&mut children, more);
                    stop = after;
                }
                let bold = self.doc.create_parent(NodeKind::Bold, children);
                out.push(bold);
                Ok(self.after_formatting(stop))
            }
        }
    }

    fn formatted(
        &mut self,
        kind: Quote,
        until: Option<&Regex>,
        out: &mut Vec<NodeId>,
    ) -> Result<Option<Stop>> {
        let (children, stop) = self.inline_run(until, Some(kind))?;
        let node_kind = match kind {
            Quote::Italic => NodeKind::Italic,
            Quote::Bold => NodeKind::Bold,
        };
        let id = self.doc.create_parent(node_kind, children);
        out.push(id);
        Ok(self.after_formatting(stop))
    }

    /// A closed quote lets the enclosing run continue; anything else ends it too.
    fn after_formatting(&self, stop: Stop) -> Option<Stop> {
        match stop {
            Stop::Quote => None,
            Stop::Eol => {
                debug!("unclosed formatting closed at end of line {}", self.sc.line_no());
                Some(Stop::Eol)
            }
            term => Some(term),
        }
    }

    /// `[[target|label]]` or `[[File:...]]`; the scanner is past `[[`.
    fn wikilink(&mut self, out: &mut Vec<NodeId>) -> Result<()> {
        let line = self.sc.line_no();
        let body = self.sc.scan_through_until(regex!(r"\]\]"))?;
        let parts = split_top_level(&body, "|");
        let target = parts[0].trim();
        if target.is_empty() {
            self.push_text(out, &format!("[[{}]]", body));
            return Ok(());
        }

        if let Some(file) = file_name(target, self.traits) {
            let opts = ImageOptions::parse(parts[1..].iter().copied());
            let caption = match opts.caption.as_deref().map(str::trim) {
                Some(caption) if !caption.is_empty() => self.fragment(caption, line)?,
                _ => Vec::new(),
            };
            let id = self
                .doc
                .create_with_attrs(NodeKind::Image { file }, opts.attrs);
            self.doc.append_all(id, caption);
            out.push(id);
            return Ok(());
        }

        let link = LinkTarget::parse(target, self.traits);
        let mut children = Vec::new();
        if parts.len() > 1 {
            let label = parts[1..].join("|");
            if label.trim().is_empty() {
                // pipe trick: [[Foo (bar)|]] shows "Foo"
                let topic = link.topic.clone();
                self.push_text(&mut children, &topic);
            } else {
                children = self.fragment(&label, line)?;
            }
        } else {
            self.push_text(&mut children, target);
        }
        // link trail: [[apple]]s
        if let Some(trail) = self.sc.scan(regex!(r"^[a-z]+")) {
            self.push_text(&mut children, &trail);
        }
        let id = self.doc.create_parent(NodeKind::Wikilink(link), children);
        out.push(id);
        Ok(())
    }

    /// `[url label]`; the scanner is past `[`.
    fn external_link(&mut self, out: &mut Vec<NodeId>) -> Result<()> {
        let line = self.sc.line_no();
        let Some(found) = self.sc.scan_until(regex!(r"\]")) else {
            self.push_text(out, "[");
            return Ok(());
        };
        let content = found.text;
        let (url, label) = match content.split_once(char::is_whitespace) {
            Some((url, label)) => (url, label.trim()),
            None => (content.as_str(), ""),
        };
        let mut children = Vec::new();
        if label.is_empty() {
            self.push_text(&mut children, url);
        } else {
            children = self.inline_str(label, line)?;
        }
        let id = self.doc.create_parent(
            NodeKind::ExternalLink {
                url: url.to_string(),
            },
            children,
        );
        out.push(id);
        Ok(())
    }

    /// `{{name|vars}}`; the scanner is past `{{`.
    fn template(&mut self, out: &mut Vec<NodeId>) -> Result<()> {
        if self.sc.rest().starts_with('{') {
            // {{{param}}} is a parameter reference of a template body
            match self.sc.scan_raw_until(regex!(r"\}\}\}")) {
                Ok(body) => self.push_text(out, &format!("{{{{{}}}}}}}", body)),
                Err(_) => self.push_text(out, "{{"),
            }
            return Ok(());
        }
        let line = self.sc.line_no();
        let body = self.sc.scan_through_until(regex!(r"\}\}"))?;
        match self.template_node(&body, line)? {
            Some(id) => out.push(id),
            None => self.push_text(out, &format!("{{{{{}}}}}", body)),
        }
        Ok(())
    }

    /// Build a template from its body (without braces). `None` for an empty name.
    pub(crate) fn template_node(&mut self, body: &str, line: usize) -> Result<Option<NodeId>> {
        let parts = split_top_level(body, "|");
        let name = parts[0].trim().to_string();
        if name.is_empty() {
            return Ok(None);
        }
        let behavior = self.traits.template_definitions().find(&name).clone();

        let mut vars = Vec::with_capacity(parts.len() - 1);
        let mut position = 0usize;
        let mut part_line = line + parts[0].matches('\n').count();
        for part in &parts[1..] {
            let line = part_line;
            part_line += part.matches('\n').count();
            let (var_name, children) = match split_key_value(part) {
                Some((key, value)) if !key.trim().is_empty() => {
                    let leading = &part[..part.len() - value.trim_start().len()];
                    let value = value.trim();
                    let children = if value.is_empty() {
                        Vec::new()
                    } else {
                        self.fragment(value, line + leading.matches('\n').count())?
                    };
                    (key.trim().to_string(), children)
                }
                _ => {
                    position += 1;
                    let children = if part.trim().is_empty() {
                        Vec::new()
                    } else if part.trim().contains('\n') {
                        self.blocks_str(part, line)?
                    } else {
                        self.inline_str(part, line)?
                    };
                    (position.to_string(), children)
                }
            };
            let var = self
                .doc
                .create_parent(NodeKind::Var { name: var_name }, children);
            vars.push(var);
        }
        let id = self
            .doc
            .create_parent(NodeKind::Template(TemplateInfo { name, behavior }), vars);
        Ok(Some(id))
    }

    /// Anything starting with `<`; the scanner is past it.
    fn tag(&mut self, out: &mut Vec<NodeId>) -> Result<()> {
        let line = self.sc.line_no();
        let Some((whole, slash, name, attr_src, self_close)) = regex_captures!(
            r"^(/?)([A-Za-z][A-Za-z0-9]*)([^<>]*?)(/?)>",
            self.sc.rest()
        )
        .map(|(w, s, n, a, c)| {
            (
                w.len(),
                !s.is_empty(),
                n.to_lowercase(),
                a.to_string(),
                !c.is_empty(),
            )
        }) else {
            self.push_text(out, "<");
            return Ok(());
        };
        self.sc.advance(whole);

        if slash {
            debug!("orphan closing tag </{}> at line {}", name, line);
            let id = self.doc.create(NodeKind::HTMLClosingTag { tag: name });
            out.push(id);
            return Ok(());
        }

        let attrs = parse_attrs(&attr_src);
        let self_closing = self_close || VOID_TAGS.contains(&name.as_str());
        match name.as_str() {
            "ref" => self.reference(attrs, self_closing, line, out),
            "nowiki" if self_closing => Ok(()),
            "nowiki" | "math" | "chem" | "pre" | "syntaxhighlight" | "source" | "gallery"
                if !self_closing =>
            {
                self.raw_tag(name, attrs, line, out)
            }
            _ if self_closing => {
                let id = self
                    .doc
                    .create_with_attrs(NodeKind::HTMLTag { tag: name }, attrs);
                out.push(id);
                Ok(())
            }
            _ => {
                let close = self.close_tag(&name)?;
                match self.sc.scan_through_until_on_line(&close) {
                    Ok(content) => {
                        let children = self.fragment(&content, line)?;
                        let id = self
                            .doc
                            .create_with_attrs(NodeKind::HTMLTag { tag: name }, attrs);
                        self.doc.append_all(id, children);
                        out.push(id);
                    }
                    Err(_) => {
                        debug!("orphan opening tag <{}> at line {}", name, line);
                        let id = self
                            .doc
                            .create_with_attrs(NodeKind::HTMLOpeningTag { tag: name }, attrs);
                        out.push(id);
                    }
                }
                Ok(())
            }
        }
    }

    /// `<ref>` body, parsed as full content. A body that fails to parse is
    /// kept as a single text node.
    fn reference(
        &mut self,
        attrs: BTreeMap<String, String>,
        self_closing: bool,
        line: usize,
        out: &mut Vec<NodeId>,
    ) -> Result<()> {
        if self_closing {
            let id = self.doc.create_with_attrs(NodeKind::Ref, attrs);
            out.push(id);
            return Ok(());
        }
        let close = self.close_tag("ref")?;
        let body = match self.sc.scan_through_until(&close) {
            Ok(body) => body,
            Err(_) => {
                debug!("unclosed <ref> at line {}", line);
                let id = self.doc.create_with_attrs(
                    NodeKind::HTMLOpeningTag {
                        tag: "ref".to_string(),
                    },
                    attrs,
                );
                out.push(id);
                return Ok(());
            }
        };

        let checkpoint = self.doc.checkpoint();
        let children = match self.fragment(&body, line) {
            Ok(children) => children,
            Err(e) if e.is_parse_error() => {
                debug!("ref body kept as text: {}", e);
                self.doc.rollback(checkpoint);
                vec![self.doc.create(NodeKind::text(body))]
            }
            Err(e) => return Err(e),
        };
        let id = self.doc.create_with_attrs(NodeKind::Ref, attrs);
        self.doc.append_all(id, children);
        out.push(id);
        Ok(())
    }

    /// Tags whose content is not wikitext (`<nowiki>`, `<math>`, `<pre>`, `<gallery>`).
    fn raw_tag(
        &mut self,
        tag: String,
        attrs: BTreeMap<String, String>,
        line: usize,
        out: &mut Vec<NodeId>,
    ) -> Result<()> {
        let close = self.close_tag(&tag)?;
        let raw = match self.sc.scan_raw_until(&close) {
            Ok(raw) => raw,
            Err(_) => {
                debug!("orphan opening tag <{}> at line {}", tag, line);
                let id = self
                    .doc
                    .create_with_attrs(NodeKind::HTMLOpeningTag { tag }, attrs);
                out.push(id);
                return Ok(());
            }
        };

        let id = match tag.as_str() {
            "gallery" => self.gallery(&raw, attrs, line)?,
            other => {
                let kind = match other {
                    "nowiki" => NodeKind::Nowiki,
                    "math" | "chem" => NodeKind::Math,
                    _ => NodeKind::Pre,
                };
                let id = self.doc.create_with_attrs(kind, attrs);
                let text = raw.strip_prefix('\n').unwrap_or(&raw);
                if !text.is_empty() {
                    let text_id = self.doc.create(NodeKind::text(text));
                    self.doc.append(id, text_id);
                }
                id
            }
        };
        out.push(id);
        Ok(())
    }

    /// One image per non-empty line: `File:Name.jpg|caption` (prefix optional).
    fn gallery(
        &mut self,
        raw: &str,
        attrs: BTreeMap<String, String>,
        line: usize,
    ) -> Result<NodeId> {
        let mut images = Vec::new();
        for (offset, entry) in raw.lines().enumerate() {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let parts = split_top_level(entry, "|");
            let target = parts[0].trim();
            let file = file_name(target, self.traits).unwrap_or_else(|| target.to_string());
            let caption = parts[1..].join("|");
            let children = if caption.trim().is_empty() {
                Vec::new()
            } else {
                self.inline_str(caption.trim(), line + offset)?
            };
            images.push(self.doc.create_parent(NodeKind::Image { file }, children));
        }
        let id = self.doc.create_with_attrs(NodeKind::Gallery, attrs);
        self.doc.append_all(id, images);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use crate::wikitext::document::Document;
    use crate::wikitext::enums::NodeType;
    use crate::wikitext::node::{NodeId, NodeKind};
    use crate::wikitext::parser::{parse_document, parse_inline};
    use crate::wikitext::traits::StaticTraits;
    use std::time::{Duration, Instant};

    fn inline(text: &str) -> (Document, Vec<NodeId>) {
        parse_inline(text, &StaticTraits::default()).unwrap()
    }

    fn types(doc: &Document, ids: &[NodeId]) -> Vec<NodeType> {
        ids.iter().map(|id| doc.node_type(*id)).collect()
    }

    #[test]
    fn bold() {
        let (doc, nodes) = inline("'''bold'''");
        assert_eq!(types(&doc, &nodes), vec![NodeType::Bold]);
        assert_eq!(doc.inner_text(nodes[0]), "bold");
    }

    #[test]
    fn unterminated_bold_is_closed_implicitly() {
        let (doc, nodes) = inline("'''bold");
        assert_eq!(types(&doc, &nodes), vec![NodeType::Bold]);
        assert_eq!(doc.inner_text(nodes[0]), "bold");
    }

    #[test]
    fn bold_italic_and_nesting() {
        let (doc, nodes) = inline("'''''both''''' then ''it '''bo''' it''");
        assert_eq!(
            types(&doc, &nodes),
            vec![NodeType::Bold, NodeType::Text, NodeType::Italic]
        );
        let inner = doc.children(nodes[0]);
        assert_eq!(types(&doc, inner), vec![NodeType::Italic]);
        assert_eq!(doc.inner_text(inner[0]), "both");
        let italic = doc.children(nodes[2]);
        assert_eq!(
            types(&doc, italic),
            vec![NodeType::Text, NodeType::Bold, NodeType::Text]
        );
    }

    #[test]
    fn four_quotes_leave_an_apostrophe() {
        let (doc, nodes) = inline("''''x'''");
        assert_eq!(types(&doc, &nodes), vec![NodeType::Text, NodeType::Bold]);
        assert_eq!(doc.inner_text(nodes[0]), "'");
    }

    #[test]
    fn text_fragments_coalesce() {
        let (doc, nodes) = inline("a < b and c<d");
        assert_eq!(nodes.len(), 1);
        assert_eq!(doc.inner_text(nodes[0]), "a < b and c<d");
    }

    #[test]
    fn wikilink_with_label_and_trail() {
        let (doc, nodes) = inline("[[Tower of Anger|the '''tower''']]s and [[apple]]s");
        assert_eq!(
            types(&doc, &nodes),
            vec![NodeType::Wikilink, NodeType::Text, NodeType::Wikilink]
        );
        assert_eq!(doc.attr(nodes[0], "link").as_deref(), Some("Tower of Anger"));
        assert_eq!(doc.inner_text(nodes[0]), "the towers");
        assert_eq!(doc.inner_text(nodes[2]), "apples");
    }

    #[test]
    fn pipe_trick() {
        let (doc, nodes) = inline("[[Mercury (planet)|]]");
        assert_eq!(doc.inner_text(nodes[0]), "Mercury");
    }

    #[test]
    fn image_with_caption() {
        let (doc, nodes) = inline("[[File:Tower.png|thumb|200px|A [[tower]] here]]");
        assert_eq!(types(&doc, &nodes), vec![NodeType::Image]);
        let img = nodes[0];
        assert_eq!(doc.attr(img, "file").as_deref(), Some("Tower.png"));
        assert_eq!(doc.attr(img, "type").as_deref(), Some("thumb"));
        assert_eq!(doc.attr(img, "width").as_deref(), Some("200"));
        assert_eq!(doc.inner_text(img), "A tower here");
    }

    #[test]
    fn external_links() {
        let (doc, nodes) = inline("see [https://example.org the ''site''] or [http://x.org]");
        assert_eq!(
            types(&doc, &nodes),
            vec![
                NodeType::Text,
                NodeType::ExternalLink,
                NodeType::Text,
                NodeType::ExternalLink
            ]
        );
        assert_eq!(doc.attr(nodes[1], "url").as_deref(), Some("https://example.org"));
        assert_eq!(doc.inner_text(nodes[1]), "the site");
        assert_eq!(doc.inner_text(nodes[3]), "http://x.org");
    }

    #[test]
    fn bracket_without_scheme_is_text() {
        let (doc, nodes) = inline("[not a link]");
        assert_eq!(types(&doc, &nodes), vec![NodeType::Text]);
        assert_eq!(doc.inner_text(nodes[0]), "[not a link]");
    }

    #[test]
    fn template_vars_are_numbered() {
        let (doc, nodes) = inline("{{Tower|Anger|floors=10|[[Ring 1|r]]|2=x}}");
        let t = nodes[0];
        assert_eq!(doc.template_name(t), Some("Tower"));
        let names: Vec<String> = doc
            .children(t)
            .iter()
            .filter_map(|v| doc.attr(*v, "name").map(|n| n.into_owned()))
            .collect();
        assert_eq!(names, vec!["1", "floors", "2", "2"]);
        let ring = doc.children(doc.children(t)[2])[0];
        assert_eq!(doc.node_type(ring), NodeType::Wikilink);
    }

    #[test]
    fn multiline_template_in_paragraph() {
        let doc = parse_document(
            "{{Infobox tower\n| name = Anger\n| notes =\n* one\n* two\n}}",
            &StaticTraits::default(),
        )
        .unwrap();
        let top = doc.children(doc.root());
        assert_eq!(types(&doc, top), vec![NodeType::Template]);
        let vars = doc.children(top[0]);
        assert_eq!(doc.attr(vars[0], "name").as_deref(), Some("name"));
        assert_eq!(doc.inner_text(vars[0]), "Anger");
        let notes = doc.children(vars[1]);
        assert_eq!(types(&doc, notes), vec![NodeType::UnorderedList]);
    }

    #[test]
    fn errors_in_later_template_lines_report_their_line() {
        let traits = StaticTraits::default();
        let err = parse_document("{{Tower\n| a = 1\n| b = [[oops\n}}", &traits).unwrap_err();
        assert_eq!(err.line(), Some(3));

        let err = parse_document("{{Tower\n| a = 1\n| b =\n[[oops\n}}", &traits).unwrap_err();
        assert_eq!(err.line(), Some(4));
    }

    #[test]
    fn stray_link_openers_in_templates_finish_quickly() {
        let input = format!("{{{{x|{}}}}}", "[[a ".repeat(40));
        let started = Instant::now();
        let err = parse_inline(&input, &StaticTraits::default()).unwrap_err();
        assert!(err.is_parse_error());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn parameter_reference_is_text() {
        let (doc, nodes) = inline("{{{1|default}}}");
        assert_eq!(types(&doc, &nodes), vec![NodeType::Text]);
        assert_eq!(doc.inner_text(nodes[0]), "{{{1|default}}}");
    }

    #[test]
    fn unterminated_template_is_an_error() {
        let err = parse_inline("{{never", &StaticTraits::default()).unwrap_err();
        assert!(err.is_parse_error());
        assert_eq!(err.line(), Some(1));
    }

    #[test]
    fn refs_parse_their_body() {
        let (doc, nodes) = inline("Fact.<ref name=\"a\">See [[Source]].</ref><ref name=\"a\"/>");
        assert_eq!(
            types(&doc, &nodes),
            vec![NodeType::Text, NodeType::Ref, NodeType::Ref]
        );
        assert_eq!(doc.attr(nodes[1], "name").as_deref(), Some("a"));
        let body = doc.children(nodes[1]);
        assert_eq!(
            types(&doc, body),
            vec![NodeType::Text, NodeType::Wikilink, NodeType::Text]
        );
        assert!(doc.children(nodes[2]).is_empty());
    }

    #[test]
    fn broken_ref_body_falls_back_to_text() {
        let (doc, nodes) = inline("x<ref>{{cite|a</ref> y");
        assert_eq!(
            types(&doc, &nodes),
            vec![NodeType::Text, NodeType::Ref, NodeType::Text]
        );
        let body = doc.children(nodes[1]);
        assert_eq!(body.len(), 1);
        assert_eq!(doc.inner_text(body[0]), "{{cite|a");
        assert!(doc.check_ownership().is_ok());
        assert_eq!(doc.descendants(doc.root()).count(), doc.len());
    }

    #[test]
    fn html_tags() {
        let (doc, nodes) = inline("<span class=\"x\">in ''it''</span><br/><br><div>open");
        assert_eq!(
            types(&doc, &nodes),
            vec![
                NodeType::HTMLTag,
                NodeType::HTMLTag,
                NodeType::HTMLTag,
                NodeType::HTMLOpeningTag,
                NodeType::Text
            ]
        );
        assert_eq!(doc.attr(nodes[0], "class").as_deref(), Some("x"));
        assert_eq!(doc.attr(nodes[0], "tag").as_deref(), Some("span"));
        assert_eq!(doc.inner_text(nodes[0]), "in it");
        assert!(doc.children(nodes[1]).is_empty());
    }

    #[test]
    fn orphan_closing_tag() {
        let (doc, nodes) = inline("a</div>b");
        assert_eq!(
            types(&doc, &nodes),
            vec![NodeType::Text, NodeType::HTMLClosingTag, NodeType::Text]
        );
    }

    #[test]
    fn raw_content_tags() {
        let (doc, nodes) = inline("<nowiki>''x'' [[y]]</nowiki><math>a^2</math>a<nowiki/>b");
        assert_eq!(
            types(&doc, &nodes),
            vec![NodeType::Nowiki, NodeType::Math, NodeType::Text]
        );
        assert_eq!(doc.inner_text(nodes[0]), "''x'' [[y]]");
        assert_eq!(doc.inner_text(nodes[1]), "a^2");
        assert_eq!(doc.inner_text(nodes[2]), "ab");
    }

    #[test]
    fn gallery_lines_become_images() {
        let doc = parse_document(
            "<gallery>\nFile:A.png|First\nB.jpg\n</gallery>",
            &StaticTraits::default(),
        )
        .unwrap();
        let gallery = doc
            .descendants(doc.root())
            .find(|id| doc.node_type(*id) == NodeType::Gallery)
            .unwrap();
        let images = doc.children(gallery);
        assert_eq!(images.len(), 2);
        assert!(matches!(doc.kind(images[0]), NodeKind::Image { file } if file == "A.png"));
        assert!(matches!(doc.kind(images[1]), NodeKind::Image { file } if file == "B.jpg"));
        assert_eq!(doc.inner_text(images[0]), "First");
    }
}
