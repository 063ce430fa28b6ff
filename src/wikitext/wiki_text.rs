//! Lazy page wrapper.
//!
//! `WikiText` holds the raw text of a page and computes the parsed document,
//! the redirect target and the external links on first access. Each result is
//! cached in a `OnceLock`, so a `WikiText` can be shared across threads.

use lazy_regex::regex_captures;
use log::debug;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock};
use url::Url;

use crate::wikitext::document::Document;
use crate::wikitext::enums::LinkType;
use crate::wikitext::errors::{Result, WtError};
use crate::wikitext::parser::parse_document;
use crate::wikitext::traits::{SiteTraits, StaticTraits};

#[derive(Clone)]
pub struct WikiText {
    /// Raw page text.
    pub raw: String,

    /// Name of the page, when known.
    pub page_name: Option<String>,

    traits: Arc<dyn SiteTraits>,
    document: OnceLock<Document>,
    redirect: OnceLock<Option<String>>,
    external_links: OnceLock<Vec<Url>>,
}

impl fmt::Debug for WikiText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WikiText")
            .field("page_name", &self.page_name)
            .field("len", &self.raw.len())
            .field("parsed", &self.document.get().is_some())
            .finish()
    }
}

impl WikiText {
    /// Wrap `input` using the default English site configuration.
    pub fn new(input: &str) -> Self {
        Self::with_traits(input, Arc::new(StaticTraits::default()))
    }

    pub fn with_traits(input: &str, traits: Arc<dyn SiteTraits>) -> Self {
        WikiText {
            raw: input.to_string(),
            page_name: None,
            traits,
            document: OnceLock::new(),
            redirect: OnceLock::new(),
            external_links: OnceLock::new(),
        }
    }

    pub fn with_page_name<S: Into<String>>(mut self, page_name: S) -> Self {
        self.page_name = Some(page_name.into());
        self
    }

    /// The parsed document. Parsing happens once; a parse error is returned
    /// again on every call and nothing is cached.
    pub fn document(&self) -> Result<&Document> {
        if let Some(doc) = self.document.get() {
            return Ok(doc);
        }
        let doc = parse_document(&self.raw, self.traits.as_ref())?;
        debug!(
            "parsed {} into {} nodes",
            self.page_name.as_deref().unwrap_or("<unnamed page>"),
            doc.len()
        );
        // a concurrent caller may have won the race; either value is identical
        let _ = self.document.set(doc);
        self.document
            .get()
            .ok_or_else(|| WtError::not_found("document cache is empty"))
    }

    /// Redirect target if the page is a redirect.
    pub fn redirect(&self) -> Option<&str> {
        self.redirect
            .get_or_init(|| parse_redirect(&self.raw))
            .as_deref()
    }

    /// Distinct external links in document order. Unparseable URLs are skipped.
    pub fn external_links(&self) -> Result<&[Url]> {
        if let Some(links) = self.external_links.get() {
            return Ok(links);
        }
        let doc = self.document()?;
        let mut seen = HashSet::new();
        let links: Vec<Url> = doc
            .links(doc.root(), LinkType::External)
            .into_iter()
            .filter_map(|id| {
                let raw = doc.attr(id, "url")?;
                match Url::parse(&raw) {
                    Ok(url) => Some(url),
                    Err(e) => {
                        debug!("skipping external link {:?}: {}", raw, e);
                        None
                    }
                }
            })
            .filter(|url| seen.insert(url.as_str().to_string()))
            .collect();
        let _ = self.external_links.set(links);
        Ok(self.external_links.get().map(Vec::as_slice).unwrap_or_default())
    }
}

/// `#REDIRECT [[Target]]` (any case) on the first non-blank line.
fn parse_redirect(input: &str) -> Option<String> {
    let line = input.lines().map(str::trim).find(|l| !l.is_empty())?;
    let (_, target) = regex_captures!(r"(?i)^#redirect\s*:?\s*\[\[([^\]|]+)(?:\|[^\]]*)?\]\]", line)?;
    let target = target.trim();
    (!target.is_empty()).then(|| target.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lazy_document_is_cached() {
        let wt = WikiText::new("Plain text {{T|x=1}} trailing").with_page_name("Test");
        let first = wt.document().unwrap() as *const Document;
        let second = wt.document().unwrap() as *const Document;
        assert_eq!(first, second);
        assert_eq!(wt.page_name.as_deref(), Some("Test"));
    }

    #[test]
    fn parse_errors_are_not_cached_as_documents() {
        let wt = WikiText::new("{{open");
        assert!(wt.document().unwrap_err().is_parse_error());
        assert!(wt.document().is_err());
    }

    #[test]
    fn redirects() {
        assert_eq!(
            WikiText::new("#REDIRECT [[Tower of Anger]]").redirect(),
            Some("Tower of Anger")
        );
        assert_eq!(
            WikiText::new("\n  #redirect: [[Ring 1|r]] extra").redirect(),
            Some("Ring 1")
        );
        assert_eq!(WikiText::new("Not a #REDIRECT [[x]]").redirect(), None);
    }

    #[test]
    fn external_links_are_deduplicated() {
        let wt = WikiText::new(
            "[https://example.org/a A] [http://example.org/b]\n{{cite|url=[https://example.org/a again]}} [mailto:x@example.org mail]",
        );
        let links: Vec<&str> = wt.external_links().unwrap().iter().map(Url::as_str).collect();
        assert_eq!(
            links,
            vec![
                "https://example.org/a",
                "http://example.org/b",
                "mailto:x@example.org"
            ]
        );
    }
}
