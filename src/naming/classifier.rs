//! Token and naming-pattern classification

use crate::taxonomy::{self, is_environment_keyword, Taxonomy};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static INSTANCE_RE: OnceLock<Regex> = OnceLock::new();
static PASCAL_RE: OnceLock<Regex> = OnceLock::new();

fn instance_re() -> &'static Regex {
    INSTANCE_RE.get_or_init(|| Regex::new(r"(?i)^(?:\d{1,3}|[a-z]+\d{1,3})$").expect("valid regex"))
}

fn pascal_re() -> &'static Regex {
    PASCAL_RE.get_or_init(|| Regex::new(r"^[A-Z][a-zA-Z0-9]*$").expect("valid regex"))
}

/// Instance component: `01`, `vm001`
pub fn is_instance_component(token: &str) -> bool {
    instance_re().is_match(token)
}

/// What a single name token most likely represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    #[serde(rename = "resource-type")]
    ResourceType,
    #[serde(rename = "environment")]
    Environment,
    #[serde(rename = "instance")]
    Instance,
    #[serde(rename = "company")]
    Company,
    #[serde(rename = "service")]
    Service,
    #[serde(rename = "")]
    Unclassified,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::ResourceType => "resource-type",
            ComponentKind::Environment => "environment",
            ComponentKind::Instance => "instance",
            ComponentKind::Company => "company",
            ComponentKind::Service => "service",
            ComponentKind::Unclassified => "",
        }
    }
}

/// Classify one token of a name belonging to a resource of `resource_type`.
///
/// Total: every input maps to exactly one kind.
pub fn classify_component(token: &str, resource_type: &str) -> ComponentKind {
    let tax = Taxonomy::global();

    if tax.is_abbreviation_for(token, resource_type) {
        return ComponentKind::ResourceType;
    }
    if is_environment_keyword(token) {
        return ComponentKind::Environment;
    }
    if is_instance_component(token) {
        return ComponentKind::Instance;
    }

    let len = token.chars().count();
    if (2..=5).contains(&len) && !tax.is_known_abbreviation(token) {
        return ComponentKind::Company;
    }
    let digit_leading = token.chars().next().is_some_and(|c| c.is_ascii_digit());
    if len > 3 && !digit_leading {
        return ComponentKind::Service;
    }

    ComponentKind::Unclassified
}

/// Overall naming style of a resource name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NamingPattern {
    #[serde(rename = "uuid")]
    Uuid,
    #[serde(rename = "contains-uuid")]
    ContainsUuid,
    #[serde(rename = "snake_case")]
    SnakeCase,
    #[serde(rename = "kebab-case")]
    KebabCase,
    #[serde(rename = "UPPERCASE")]
    Uppercase,
    #[serde(rename = "lowercase")]
    Lowercase,
    #[serde(rename = "PascalCase")]
    PascalCase,
    #[serde(rename = "camelCase")]
    CamelCase,
    #[serde(rename = "other")]
    Other,
}

impl NamingPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            NamingPattern::Uuid => "uuid",
            NamingPattern::ContainsUuid => "contains-uuid",
            NamingPattern::SnakeCase => "snake_case",
            NamingPattern::KebabCase => "kebab-case",
            NamingPattern::Uppercase => "UPPERCASE",
            NamingPattern::Lowercase => "lowercase",
            NamingPattern::PascalCase => "PascalCase",
            NamingPattern::CamelCase => "camelCase",
            NamingPattern::Other => "other",
        }
    }

    pub fn is_uuid_style(&self) -> bool {
        matches!(self, NamingPattern::Uuid | NamingPattern::ContainsUuid)
    }
}

impl std::fmt::Display for NamingPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn classify_naming_pattern(name: &str) -> NamingPattern {
    if let Some(m) = taxonomy::uuid_re().find(name) {
        if m.start() == 0 && m.end() == name.len() {
            return NamingPattern::Uuid;
        }
        return NamingPattern::ContainsUuid;
    }
    if name.contains('_') {
        return NamingPattern::SnakeCase;
    }
    if name.contains('-') {
        return NamingPattern::KebabCase;
    }

    let has_letters = name.chars().any(|c| c.is_alphabetic());
    if has_letters && name.chars().filter(|c| c.is_alphabetic()).all(|c| c.is_uppercase()) {
        return NamingPattern::Uppercase;
    }
    if has_letters && name.chars().filter(|c| c.is_alphabetic()).all(|c| c.is_lowercase()) {
        return NamingPattern::Lowercase;
    }
    if pascal_re().is_match(name) {
        return NamingPattern::PascalCase;
    }
    let starts_lower = name.chars().next().is_some_and(|c| c.is_lowercase());
    if starts_lower && name.chars().skip(1).any(|c| c.is_uppercase()) {
        return NamingPattern::CamelCase;
    }

    NamingPattern::Other
}

/// First of `-`, `_`, `.` present in the name
pub fn detect_separator(name: &str) -> Option<char> {
    ['-', '_', '.'].into_iter().find(|sep| name.contains(*sep))
}

/// Split a separator-less name at case and digit boundaries
/// (`abcProdWebVm01` → `abc`, `Prod`, `Web`, `Vm`, `01`)
pub fn split_case_boundaries(name: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;

    for (i, c) in name.char_indices() {
        if let Some(p) = prev {
            let upper_boundary = c.is_uppercase();
            let digit_boundary = c.is_ascii_digit() && !p.is_ascii_digit();
            if (upper_boundary || digit_boundary) && i > start {
                parts.push(&name[start..i]);
                start = i;
            }
        }
        prev = Some(c);
    }
    if start < name.len() {
        parts.push(&name[start..]);
    }
    parts
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedToken {
    pub token: String,
    pub kind: ComponentKind,
}

/// Full breakdown of a single name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameAnalysis {
    pub name: String,
    pub pattern: NamingPattern,
    pub separator: Option<char>,
    pub tokens: Vec<ClassifiedToken>,
}

pub fn analyze_name(name: &str, resource_type: &str) -> NameAnalysis {
    let separator = detect_separator(name);
    let raw_tokens = match separator {
        Some(_) => taxonomy::tokenize(name),
        None => split_case_boundaries(name),
    };
    let tokens = raw_tokens
        .into_iter()
        .map(|t| ClassifiedToken {
            token: t.to_string(),
            kind: classify_component(t, resource_type),
        })
        .collect();

    NameAnalysis {
        name: name.to_string(),
        pattern: classify_naming_pattern(name),
        separator,
        tokens,
    }
}
