//! Site-specific configuration read by the parser.
//!
//! The parser never hard-codes namespace names: it asks a `SiteTraits`
//! implementation whether a link prefix is a namespace, an interwiki prefix or
//! a file namespace, and which template behaviors are registered. The traits are
//! set up before parsing and only read afterwards, so one value can be shared by
//! many concurrent parses.
//!
//! `StaticTraits` is the bundled implementation. It defaults to the English
//! MediaWiki namespaces and can be loaded from a `meta=siteinfo` API response.

use derive_builder::Builder;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::wikitext::errors::{Result, WtError};
use crate::wikitext::templates::TemplateRegistry;

/// Questions the parser asks about the wiki a text comes from.
pub trait SiteTraits: Send + Sync {
    /// True if `name` (the text before a link's first `:`) is a namespace.
    fn is_namespace(&self, name: &str) -> bool;
    /// True if `prefix` is an interwiki prefix.
    fn is_interwiki(&self, prefix: &str) -> bool;
    /// Prefixes (without `:`) that turn a wikilink into an image.
    fn file_namespace_prefixes(&self) -> &[String];
    fn template_definitions(&self) -> &TemplateRegistry;

    /// Matching file prefix of `prefix`, compared the way titles are.
    fn is_file_namespace(&self, prefix: &str) -> bool {
        let wanted = normalize_prefix(prefix);
        self.file_namespace_prefixes()
            .iter()
            .any(|p| normalize_prefix(p) == wanted)
    }
}

const DEFAULT_NAMESPACES: &[&str] = &[
    "Talk",
    "User",
    "User talk",
    "Project",
    "Project talk",
    "Wikipedia",
    "Wikipedia talk",
    "File",
    "File talk",
    "Image",
    "Image talk",
    "Media",
    "MediaWiki",
    "MediaWiki talk",
    "Template",
    "Template talk",
    "Help",
    "Help talk",
    "Category",
    "Category talk",
    "Portal",
    "Portal talk",
    "Draft",
    "Draft talk",
    "Module",
    "Module talk",
    "Special",
];

const DEFAULT_INTERWIKI: &[&str] = &[
    "commons",
    "d",
    "de",
    "en",
    "es",
    "fr",
    "it",
    "ja",
    "meta",
    "mw",
    "pl",
    "ru",
    "species",
    "wikibooks",
    "wikidata",
    "wikinews",
    "wikiquote",
    "wikisource",
    "wikivoyage",
    "wikt",
    "wiktionary",
    "zh",
];

const DEFAULT_FILE_PREFIXES: &[&str] = &["File", "Image"];

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Titles compare case-insensitively with `_` standing for a space.
fn normalize_prefix(prefix: &str) -> String {
    prefix.trim().replace('_', " ").to_lowercase()
}

/// Traits backed by fixed lists.
#[derive(Debug, Clone, Builder)]
#[builder(default)]
pub struct StaticTraits {
    #[builder(setter(into))]
    namespaces: Vec<String>,
    #[builder(setter(into))]
    interwiki: Vec<String>,
    #[builder(setter(into))]
    file_prefixes: Vec<String>,
    templates: TemplateRegistry,
}

impl Default for StaticTraits {
    fn default() -> Self {
        Self {
            namespaces: owned(DEFAULT_NAMESPACES),
            interwiki: owned(DEFAULT_INTERWIKI),
            file_prefixes: owned(DEFAULT_FILE_PREFIXES),
            templates: TemplateRegistry::default(),
        }
    }
}

impl From<StaticTraitsBuilderError> for WtError {
    fn from(e: StaticTraitsBuilderError) -> Self {
        WtError::invalid_arg(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct SiteInfoResponse {
    query: SiteInfoQuery,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SiteInfoQuery {
    namespaces: BTreeMap<String, RawNamespace>,
    namespacealiases: Vec<RawAlias>,
    interwikimap: Vec<RawInterwiki>,
}

#[derive(Debug, Deserialize)]
struct RawNamespace {
    id: i64,
    #[serde(alias = "*")]
    name: Option<String>,
    canonical: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAlias {
    id: i64,
    #[serde(alias = "*")]
    alias: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawInterwiki {
    prefix: String,
}

/// Namespace id of `File:` on every MediaWiki installation.
const FILE_NAMESPACE_ID: i64 = 6;

impl StaticTraits {
    pub fn builder() -> StaticTraitsBuilder {
        StaticTraitsBuilder::default()
    }

    /// Build traits from a `action=query&meta=siteinfo&siprop=namespaces|namespacealiases|interwikimap`
    /// response. Both the legacy (`"*"`) and `formatversion=2` (`"name"`) layouts are accepted.
    /// The template registry keeps its defaults.
    pub fn from_siteinfo_json(json: &str) -> Result<Self> {
        let response: SiteInfoResponse = serde_json::from_str(json)?;
        let query = response.query;

        let mut namespaces = Vec::new();
        let mut file_prefixes = Vec::new();
        for (key, ns) in &query.namespaces {
            let names = [ns.name.as_deref(), ns.canonical.as_deref()];
            let names = names.iter().flatten().filter(|n| !n.is_empty());
            let mut seen_any = false;
            for name in names {
                seen_any = true;
                if !namespaces.contains(&name.to_string()) {
                    namespaces.push(name.to_string());
                }
                if ns.id == FILE_NAMESPACE_ID && !file_prefixes.contains(&name.to_string()) {
                    file_prefixes.push(name.to_string());
                }
            }
            if !seen_any && ns.id != 0 {
                warn!("siteinfo namespace {} has no name; skipped", key);
            }
        }

        for alias in &query.namespacealiases {
            let Some(name) = alias.alias.as_deref().filter(|a| !a.is_empty()) else {
                warn!("siteinfo alias for namespace {} has no name; skipped", alias.id);
                continue;
            };
            namespaces.push(name.to_string());
            if alias.id == FILE_NAMESPACE_ID {
                file_prefixes.push(name.to_string());
            }
        }

        let interwiki: Vec<String> = query
            .interwikimap
            .into_iter()
            .map(|iw| iw.prefix)
            .collect();

        debug!(
            "siteinfo: {} namespaces, {} file prefixes, {} interwiki prefixes",
            namespaces.len(),
            file_prefixes.len(),
            interwiki.len()
        );

        let traits = StaticTraits::builder()
            .namespaces(namespaces)
            .interwiki(interwiki)
            .file_prefixes(file_prefixes)
            .build()?;
        Ok(traits)
    }

    /// Replace the template registry.
    pub fn with_templates(mut self, templates: TemplateRegistry) -> Self {
        self.templates = templates;
        self
    }

    pub fn templates_mut(&mut self) -> &mut TemplateRegistry {
        &mut self.templates
    }
}

impl SiteTraits for StaticTraits {
    fn is_namespace(&self, name: &str) -> bool {
        let wanted = normalize_prefix(name);
        !wanted.is_empty() && self.namespaces.iter().any(|n| normalize_prefix(n) == wanted)
    }

    fn is_interwiki(&self, prefix: &str) -> bool {
        let wanted = normalize_prefix(prefix);
        !wanted.is_empty() && self.interwiki.iter().any(|n| normalize_prefix(n) == wanted)
    }

    fn file_namespace_prefixes(&self) -> &[String] {
        &self.file_prefixes
    }

    fn template_definitions(&self) -> &TemplateRegistry {
        &self.templates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wikitext::templates::TemplateBehavior;

    #[test]
    fn defaults_know_english_namespaces() {
        let t = StaticTraits::default();
        assert!(t.is_namespace("category"));
        assert!(t.is_namespace("User_talk"));
        assert!(!t.is_namespace("Tower"));
        assert!(!t.is_namespace(""));
        assert!(t.is_interwiki("wikt"));
        assert!(t.is_file_namespace("image"));
        assert!(!t.is_file_namespace("Category"));
    }

    #[test]
    fn builder_keeps_defaults_for_unset_fields() {
        let t = StaticTraits::builder()
            .file_prefixes(vec!["Datei".to_string()])
            .build()
            .unwrap();
        assert!(t.is_file_namespace("Datei"));
        assert!(!t.is_file_namespace("File"));
        assert!(t.is_namespace("Template"));
        assert_eq!(
            t.template_definitions().find("!"),
            &TemplateBehavior::Replace("|".into())
        );
    }

    #[test]
    fn siteinfo_legacy_format() {
        let json = r#"{
            "batchcomplete": "",
            "query": {
                "namespaces": {
                    "0": {"id": 0, "case": "first-letter", "*": "", "content": ""},
                    "6": {"id": 6, "case": "first-letter", "canonical": "File", "*": "Datei"},
                    "14": {"id": 14, "canonical": "Category", "*": "Kategorie"}
                },
                "namespacealiases": [{"id": 6, "*": "Bild"}],
                "interwikimap": [{"prefix": "en", "url": "https://en.wikipedia.org/wiki/$1"}]
            }
        }"#;
        let t = StaticTraits::from_siteinfo_json(json).unwrap();
        assert!(t.is_namespace("Kategorie"));
        assert!(t.is_namespace("Category"));
        assert!(t.is_file_namespace("Bild"));
        assert!(t.is_file_namespace("Datei"));
        assert!(t.is_file_namespace("File"));
        assert!(t.is_interwiki("en"));
        assert!(!t.is_interwiki("fr"));
    }

    #[test]
    fn siteinfo_formatversion_2() {
        let json = r#"{"query": {"namespaces": {"6": {"id": 6, "name": "File", "canonical": "File"}}}}"#;
        let t = StaticTraits::from_siteinfo_json(json).unwrap();
        assert_eq!(t.file_namespace_prefixes(), &["File".to_string()]);
    }

    #[test]
    fn siteinfo_rejects_garbage() {
        let err = StaticTraits::from_siteinfo_json("{\"nope\": 1}").unwrap_err();
        assert_eq!(err.kind(), "Json");
    }
}
