/*!
Link target decomposition and image option parsing.

This module implements the pure string side of `[[...]]` links:
- `LinkTarget::parse` splits a target into interwiki prefix, namespace, page,
  anchor and the "pipe trick" topic/refinement pair.
- `file_name` detects links into a file namespace (which become images).
- `ImageOptions::parse` classifies the `|`-separated options of an image link.

Nothing here recurses into the parser; labels and captions are parsed by the
inline parser after the split.
*/

use lazy_regex::regex_captures;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::wikitext::traits::SiteTraits;

/// Decomposed target of an internal link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkTarget {
    /// Target as written, trimmed.
    pub link: String,
    pub interwiki: Option<String>,
    pub namespace: Option<String>,
    /// Page title without interwiki, namespace and anchor.
    pub page: String,
    pub anchor: Option<String>,
    /// Page title without its disambiguating refinement.
    pub topic: String,
    /// `bar` in `Foo (bar)` or `Foo, bar`.
    pub refinement: Option<String>,
}

impl LinkTarget {
    pub fn parse(raw: &str, traits: &dyn SiteTraits) -> Self {
        let link = raw.trim().to_string();
        // A leading ':' forces a plain link ([[:Category:Foo]]).
        let stripped = link.strip_prefix(':').unwrap_or(&link).trim();

        let (mut rest, anchor) = match stripped.split_once('#') {
            Some((page, anchor)) => (page, Some(anchor.trim().to_string())),
            None => (stripped, None),
        };

        let mut interwiki = None;
        if let Some((prefix, after)) = rest.split_once(':')
            && traits.is_interwiki(prefix)
        {
            interwiki = Some(prefix.trim().to_string());
            rest = after;
        }

        let mut namespace = None;
        if let Some((prefix, after)) = rest.split_once(':')
            && traits.is_namespace(prefix)
        {
            namespace = Some(prefix.trim().to_string());
            rest = after;
        }

        let page = rest.trim().to_string();
        let (topic, refinement) = split_refinement(&page);

        Self {
            link,
            interwiki,
            namespace,
            page,
            anchor,
            topic,
            refinement,
        }
    }

    /// Full title including namespace, without anchor.
    pub fn full_title(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}:{}", ns, self.page),
            None => self.page.clone(),
        }
    }
}

/// Split `Foo (bar)` or `Foo, bar` into topic and refinement.
pub fn split_refinement(page: &str) -> (String, Option<String>) {
    if let Some((_, topic, refinement)) = regex_captures!(r"^(.+?)\s*\(([^()]+)\)$", page) {
        return (topic.to_string(), Some(refinement.trim().to_string()));
    }
    if let Some((_, topic, refinement)) = regex_captures!(r"^([^,]+?),\s*(.+)$", page) {
        return (topic.to_string(), Some(refinement.trim().to_string()));
    }
    (page.to_string(), None)
}

/// File name if `target` points into a file namespace (`File:Foo.png` -> `Foo.png`).
///
/// This is checked before interwiki classification, so a prefix that is both a
/// file namespace and an interwiki prefix always yields an image.
pub fn file_name(target: &str, traits: &dyn SiteTraits) -> Option<String> {
    let target = target.trim();
    if target.starts_with(':') {
        return None;
    }
    let (prefix, name) = target.split_once(':')?;
    if traits.is_file_namespace(prefix) {
        Some(name.trim().to_string())
    } else {
        None
    }
}

/// Options of an image link, plus its caption source text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageOptions {
    pub attrs: BTreeMap<String, String>,
    pub caption: Option<String>,
}

impl ImageOptions {
    /// Classify the `|`-separated option strings after the file name. An
    /// unrecognized option is the caption; the last one wins, as in MediaWiki.
    pub fn parse<'a>(parts: impl IntoIterator<Item = &'a str>) -> Self {
        let mut opts = ImageOptions::default();
        for part in parts {
            let trimmed = part.trim();
            let lower = trimmed.to_lowercase();
            match lower.as_str() {
                "thumb" | "thumbnail" | "frame" | "framed" | "frameless" => {
                    let kind = match lower.as_str() {
                        "thumbnail" => "thumb",
                        "framed" => "frame",
                        other => other,
                    };
                    opts.attrs.insert("type".into(), kind.into());
                }
                "border" => {
                    opts.attrs.insert("border".into(), "true".into());
                }
                "left" | "right" | "center" | "centre" | "none" => {
                    let loc = if lower == "centre" { "center" } else { lower.as_str() };
                    opts.attrs.insert("location".into(), loc.into());
                }
                "baseline" | "middle" | "sub" | "super" | "text-top" | "text-bottom" | "top"
                | "bottom" => {
                    opts.attrs.insert("alignment".into(), lower.clone());
                }
                "upright" => {
                    opts.attrs.insert("upright".into(), "true".into());
                }
                _ => {
                    if let Some((_, w, h)) = regex_captures!(r"^(\d*)(?:x(\d+))?\s*px$", &lower)
                        && !(w.is_empty() && h.is_empty())
                    {
                        if !w.is_empty() {
                            opts.attrs.insert("width".into(), w.into());
                        }
                        if !h.is_empty() {
                            opts.attrs.insert("height".into(), h.into());
                        }
                    } else if let Some((_, key, value)) = regex_captures!(
                        r"^(alt|link|page|class|lang|upright)\s*=(.*)$",
                        trimmed
                    ) {
                        opts.attrs
                            .insert(key.to_lowercase(), value.trim().to_string());
                    } else {
                        opts.caption = Some(part.to_string());
                    }
                }
            }
        }
        opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wikitext::traits::StaticTraits;

    #[test]
    fn plain_target() {
        let t = LinkTarget::parse(" Tower of Anger ", &StaticTraits::default());
        assert_eq!(t.link, "Tower of Anger");
        assert_eq!(t.page, "Tower of Anger");
        assert_eq!(t.namespace, None);
        assert_eq!(t.anchor, None);
        assert_eq!(t.topic, "Tower of Anger");
        assert_eq!(t.refinement, None);
    }

    #[test]
    fn namespace_anchor_and_refinement() {
        let t = LinkTarget::parse("Help:Mercury (planet)#Orbit", &StaticTraits::default());
        assert_eq!(t.namespace.as_deref(), Some("Help"));
        assert_eq!(t.page, "Mercury (planet)");
        assert_eq!(t.anchor.as_deref(), Some("Orbit"));
        assert_eq!(t.topic, "Mercury");
        assert_eq!(t.refinement.as_deref(), Some("planet"));
        assert_eq!(t.full_title(), "Help:Mercury (planet)");
    }

    #[test]
    fn comma_refinement_and_unknown_prefix() {
        let t = LinkTarget::parse("Paris, Texas", &StaticTraits::default());
        assert_eq!(t.topic, "Paris");
        assert_eq!(t.refinement.as_deref(), Some("Texas"));

        let t = LinkTarget::parse("Star Wars: A New Hope", &StaticTraits::default());
        assert_eq!(t.namespace, None);
        assert_eq!(t.page, "Star Wars: A New Hope");
    }

    #[test]
    fn interwiki_then_namespace() {
        let t = LinkTarget::parse("wikt:Category:Nouns", &StaticTraits::default());
        assert_eq!(t.interwiki.as_deref(), Some("wikt"));
        assert_eq!(t.namespace.as_deref(), Some("Category"));
        assert_eq!(t.page, "Nouns");
    }

    #[test]
    fn file_detection() {
        let traits = StaticTraits::default();
        assert_eq!(file_name("File:Tower.png", &traits).as_deref(), Some("Tower.png"));
        assert_eq!(file_name("image:Tower.png", &traits).as_deref(), Some("Tower.png"));
        assert_eq!(file_name(":File:Tower.png", &traits), None);
        assert_eq!(file_name("Category:Towers", &traits), None);
    }

    #[test]
    fn file_prefix_wins_over_interwiki() {
        let traits = StaticTraits::builder()
            .interwiki(vec!["file".to_string()])
            .build()
            .unwrap();
        assert!(traits.is_interwiki("File"));
        assert_eq!(file_name("File:X.png", &traits).as_deref(), Some("X.png"));
    }

    #[test]
    fn image_options() {
        let opts = ImageOptions::parse(
            ["thumb", "centre", "220x100px", "alt=A tower", "A [[tower]] caption"],
        );
        assert_eq!(opts.attrs.get("type").map(String::as_str), Some("thumb"));
        assert_eq!(opts.attrs.get("location").map(String::as_str), Some("center"));
        assert_eq!(opts.attrs.get("width").map(String::as_str), Some("220"));
        assert_eq!(opts.attrs.get("height").map(String::as_str), Some("100"));
        assert_eq!(opts.attrs.get("alt").map(String::as_str), Some("A tower"));
        assert_eq!(opts.caption.as_deref(), Some("A [[tower]] caption"));
    }

    #[test]
    fn image_height_only() {
        let opts = ImageOptions::parse(["x50px"]);
        assert_eq!(opts.attrs.get("width"), None);
        assert_eq!(opts.attrs.get("height").map(String::as_str), Some("50"));
    }
}
