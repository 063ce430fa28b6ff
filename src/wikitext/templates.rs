//! Template behavior registry.
//!
//! Templates are never expanded; the registry only decides how a template
//! invocation renders as plain text and which named fields it exposes. A
//! behavior is a small closed enum selected by template name (exact, after
//! MediaWiki title normalization, or by regex). Unregistered names fall back to
//! the registry's default behavior.

use lazy_regex::regex_is_match;
use regex::Regex;
use std::collections::BTreeMap;

use crate::wikitext::document::Document;
use crate::wikitext::enums::{LinkType, NodeType, QueryType};
use crate::wikitext::errors::{Result, WtError};
use crate::wikitext::node::{NodeId, NodeKind};

/// How to pull a value out of a template's vars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extractor {
    /// Positional var `n` (1-based, as MediaWiki numbers them).
    Positional(usize),
    /// Named var.
    Named(String),
    /// All positional vars, joined with the separator.
    JoinPositional(String),
}

/// Text rendering strategy of a template.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TemplateBehavior {
    /// Renders as nothing.
    #[default]
    Base,
    /// Renders as a fixed string (`{{!}}` -> `|`).
    Replace(String),
    /// Renders the text of its positional vars.
    ShowChildren,
    /// Renders via `text` and exposes named `fields`.
    Custom {
        text: Option<Extractor>,
        fields: BTreeMap<String, Extractor>,
    },
}

impl TemplateBehavior {
    /// Custom behavior with a text extractor and no fields.
    pub fn text(extractor: Extractor) -> Self {
        TemplateBehavior::Custom {
            text: Some(extractor),
            fields: BTreeMap::new(),
        }
    }

    /// Extractor registered for `field`, if this is a custom behavior.
    pub fn field(&self, field: &str) -> Option<&Extractor> {
        match self {
            TemplateBehavior::Custom { fields, .. } => fields.get(field),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
enum NamePattern {
    Exact(String),
    Regex(Regex),
}

impl NamePattern {
    fn matches(&self, normalized: &str) -> bool {
        match self {
            NamePattern::Exact(name) => name == normalized,
            NamePattern::Regex(re) => re.is_match(normalized),
        }
    }
}

/// Maps template names to behaviors.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    entries: Vec<(NamePattern, TemplateBehavior)>,
    fallback: TemplateBehavior,
}

impl TemplateRegistry {
    /// A registry with no definitions; everything resolves to `Base`.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            fallback: TemplateBehavior::Base,
        }
    }

    /// Register a behavior for an exact template name. Later definitions
    /// for the same name take precedence.
    pub fn define(&mut self, name: &str, behavior: TemplateBehavior) -> &mut Self {
        self.entries
            .insert(0, (NamePattern::Exact(normalize_name(name)), behavior));
        self
    }

    /// Register a behavior for every template whose normalized name matches `pattern`.
    pub fn define_pattern(&mut self, pattern: &str, behavior: TemplateBehavior) -> Result<&mut Self> {
        let re = Regex::new(pattern)?;
        self.entries.insert(0, (NamePattern::Regex(re), behavior));
        Ok(self)
    }

    /// Replace the behavior used for unregistered names.
    pub fn set_fallback(&mut self, behavior: TemplateBehavior) -> &mut Self {
        self.fallback = behavior;
        self
    }

    pub fn find(&self, name: &str) -> &TemplateBehavior {
        let normalized = normalize_name(name);
        self.entries
            .iter()
            .find(|(pattern, _)| pattern.matches(&normalized))
            .map(|(_, behavior)| behavior)
            .unwrap_or(&self.fallback)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TemplateRegistry {
    /// Common formatting templates found on most MediaWiki installations.
    fn default() -> Self {
        let mut reg = TemplateRegistry::empty();
        reg.define("!", TemplateBehavior::Replace("|".into()))
            .define("!!", TemplateBehavior::Replace("||".into()))
            .define("=", TemplateBehavior::Replace("=".into()))
            .define("'", TemplateBehavior::Replace("'".into()))
            .define("nbsp", TemplateBehavior::Replace("\u{a0}".into()))
            .define("mdash", TemplateBehavior::Replace("\u{2014}".into()))
            .define("ndash", TemplateBehavior::Replace("\u{2013}".into()))
            .define("clear", TemplateBehavior::Base)
            .define("nowrap", TemplateBehavior::ShowChildren)
            .define("small", TemplateBehavior::ShowChildren)
            .define("lang", TemplateBehavior::text(Extractor::Positional(2)))
            .define(
                "convert",
                TemplateBehavior::Custom {
                    text: Some(Extractor::JoinPositional(" ".into())),
                    fields: BTreeMap::from([
                        ("value".to_string(), Extractor::Positional(1)),
                        ("unit".to_string(), Extractor::Positional(2)),
                    ]),
                },
            );
        reg
    }
}

/// Normalize a template name the way MediaWiki compares titles: underscores
/// are spaces, runs of whitespace collapse and the first letter is case-insensitive.
pub fn normalize_name(name: &str) -> String {
    let collapsed = name
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let mut chars = collapsed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn is_infobox(name: &str) -> bool {
    regex_is_match!(r"(?i)(^|[\s_])infobox([\s_]|$)", name.trim())
}

pub fn is_navbox(name: &str) -> bool {
    regex_is_match!(r"(?i)navbox", name.trim())
}

impl Document {
    /// Vars of a template in source order; empty for any other node.
    pub fn vars(&self, template: NodeId) -> Vec<NodeId> {
        if !self.is(template, NodeType::Template) {
            return Vec::new();
        }
        self.children(template)
            .iter()
            .copied()
            .filter(|id| self.is(*id, NodeType::Var))
            .collect()
    }

    /// First var called `name`.
    pub fn var(&self, template: NodeId, name: &str) -> Option<NodeId> {
        self.vars(template)
            .into_iter()
            .find(|id| self.var_name(*id) == Some(name))
    }

    /// Every var called `name` (names may repeat).
    pub fn vars_named(&self, template: NodeId, name: &str) -> Vec<NodeId> {
        self.vars(template)
            .into_iter()
            .filter(|id| self.var_name(*id) == Some(name))
            .collect()
    }

    /// Trimmed plain text of the first var called `name`.
    pub fn var_text(&self, template: NodeId, name: &str) -> Option<String> {
        self.var(template, name)
            .map(|id| self.inner_text(id).trim().to_string())
    }

    fn var_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Var { name } => Some(name),
            _ => None,
        }
    }

    /// Apply an extractor to a template's vars.
    pub(crate) fn extract(&self, template: NodeId, extractor: &Extractor) -> Option<String> {
        match extractor {
            Extractor::Positional(n) => self.var_text(template, &n.to_string()),
            Extractor::Named(name) => self.var_text(template, name),
            Extractor::JoinPositional(sep) => {
                let parts: Vec<String> = self
                    .vars(template)
                    .into_iter()
                    .filter(|id| {
                        self.var_name(*id)
                            .is_some_and(|n| n.chars().all(|c| c.is_ascii_digit()))
                    })
                    .map(|id| self.inner_text(id).trim().to_string())
                    .collect();
                Some(parts.join(sep))
            }
        }
    }

    /// Value of `field`: the behavior's extractor when it defines one,
    /// otherwise the var of that name.
    pub fn template_field(&self, template: NodeId, field: &str) -> Result<String> {
        let NodeKind::Template(info) = self.kind(template) else {
            return Err(WtError::invalid_arg(format!(
                "{} is a {}, not a template",
                template,
                self.node_type(template)
            )));
        };
        let value = match info.behavior.field(field) {
            Some(extractor) => self.extract(template, extractor),
            None => self.var_text(template, field),
        };
        value.ok_or_else(|| {
            WtError::not_found(format!("template {:?} has no field {:?}", info.name, field))
        })
    }

    /// Templates under `id` (itself included) whose name matches `name`.
    pub fn templates(&self, id: NodeId, name: &str, query: QueryType) -> Vec<NodeId> {
        self.descendants(id)
            .filter(|n| {
                self.template_name(*n)
                    .is_some_and(|t| query.matches(&normalize_name(t), &normalize_name(name)))
            })
            .collect()
    }

    /// Links of one kind under `id`, in document order.
    pub fn links(&self, id: NodeId, kind: LinkType) -> Vec<NodeId> {
        let node_type = kind.node_type();
        self.descendants(id)
            .filter(|n| self.is(*n, node_type))
            .collect()
    }
}
