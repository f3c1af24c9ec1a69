//! Tenant naming schemes
//!
//! A scheme is an ordered list of components joined by a separator and
//! rendered in one case format. It is loaded read-only, validated before a
//! run, and then used to generate example names and to check existing ones.

use super::classifier::{is_instance_component, split_case_boundaries};
use crate::error::SchemeError;
use crate::taxonomy::{is_environment_keyword, TenantOverrides, Taxonomy};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentType {
    Company,
    Environment,
    Service,
    ResourceType,
    Instance,
    Location,
}

impl ComponentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Company => "company",
            ComponentType::Environment => "environment",
            ComponentType::Service => "service",
            ComponentType::ResourceType => "resource-type",
            ComponentType::Instance => "instance",
            ComponentType::Location => "location",
        }
    }

    fn placeholder(&self) -> &'static str {
        match self {
            ComponentType::Company => "contoso",
            ComponentType::Environment => "prod",
            ComponentType::Service => "web",
            ComponentType::ResourceType => "vm",
            ComponentType::Instance => "01",
            ComponentType::Location => "eus",
        }
    }
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDefinition {
    pub component_type: ComponentType,
    pub position: u32,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub allowed_values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl ComponentDefinition {
    pub fn new(component_type: ComponentType, position: u32) -> Self {
        Self {
            component_type,
            position,
            required: true,
            allowed_values: Vec::new(),
            default_value: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_allowed_values(mut self, values: &[&str]) -> Self {
        self.allowed_values = values.iter().map(|v| v.to_string()).collect();
        self
    }

    /// Allowed values with empty entries ignored
    fn effective_allowed_values(&self) -> impl Iterator<Item = &str> {
        self.allowed_values
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CaseFormat {
    #[default]
    #[serde(rename = "lowercase")]
    Lowercase,
    #[serde(rename = "uppercase")]
    Uppercase,
    #[serde(rename = "PascalCase")]
    PascalCase,
    #[serde(rename = "camelCase")]
    CamelCase,
}

impl CaseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseFormat::Lowercase => "lowercase",
            CaseFormat::Uppercase => "uppercase",
            CaseFormat::PascalCase => "PascalCase",
            CaseFormat::CamelCase => "camelCase",
        }
    }
}

/// Tenant-specific service abbreviation (case-sensitive)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAbbreviation {
    pub abbreviation: String,
    pub full_name: String,
}

fn default_separator() -> String {
    "-".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamingScheme {
    pub components: Vec<ComponentDefinition>,
    #[serde(default = "default_separator")]
    pub separator: String,
    #[serde(default)]
    pub case_format: CaseFormat,
    #[serde(default)]
    pub accepted_company_names: Vec<String>,
    #[serde(default)]
    pub service_abbreviations: Vec<ServiceAbbreviation>,
}

impl Default for NamingScheme {
    fn default() -> Self {
        Self {
            components: Vec::new(),
            separator: default_separator(),
            case_format: CaseFormat::default(),
            accepted_company_names: Vec::new(),
            service_abbreviations: Vec::new(),
        }
    }
}

/// Outcome of checking one name against a scheme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameCheck {
    pub compliant: bool,
    pub violations: Vec<String>,
}

impl NamingScheme {
    /// `[company, environment, service, resource-type, instance]` joined by `-`
    pub fn standard(company: &str) -> Self {
        let components = [
            ComponentType::Company,
            ComponentType::Environment,
            ComponentType::Service,
            ComponentType::ResourceType,
            ComponentType::Instance,
        ]
        .into_iter()
        .enumerate()
        .map(|(i, t)| ComponentDefinition::new(t, i as u32))
        .collect();

        Self {
            components,
            accepted_company_names: vec![company.to_string()],
            ..Default::default()
        }
    }

    pub fn with_case_format(mut self, case_format: CaseFormat) -> Self {
        self.case_format = case_format;
        self
    }

    pub fn with_service_abbreviation(mut self, abbreviation: &str, full_name: &str) -> Self {
        self.service_abbreviations.push(ServiceAbbreviation {
            abbreviation: abbreviation.to_string(),
            full_name: full_name.to_string(),
        });
        self
    }

    /// Reject schemes that could never produce or match a name
    pub fn validate(&self) -> Result<(), SchemeError> {
        if self.components.is_empty() {
            return Err(SchemeError::NoComponents);
        }

        let mut positions: Vec<(u32, ComponentType)> = Vec::new();
        let mut types = HashSet::new();
        for component in &self.components {
            if let Some((_, first)) = positions.iter().find(|(p, _)| *p == component.position) {
                return Err(SchemeError::DuplicatePosition {
                    position: component.position,
                    first: first.to_string(),
                    second: component.component_type.to_string(),
                });
            }
            positions.push((component.position, component.component_type));

            if !types.insert(component.component_type) {
                return Err(SchemeError::DuplicateComponent(
                    component.component_type.to_string(),
                ));
            }

            if component.required
                && !component.allowed_values.is_empty()
                && component.effective_allowed_values().next().is_none()
            {
                return Err(SchemeError::EmptyAllowedValues(
                    component.component_type.to_string(),
                ));
            }
        }

        let mut sep_chars = self.separator.chars();
        match (sep_chars.next(), sep_chars.next()) {
            (Some(_), Some(_)) => return Err(SchemeError::InvalidSeparator(self.separator.clone())),
            (Some(c), None) if c.is_alphanumeric() => {
                return Err(SchemeError::InvalidSeparator(self.separator.clone()))
            }
            (None, _)
                if matches!(self.case_format, CaseFormat::Lowercase | CaseFormat::Uppercase) =>
            {
                return Err(SchemeError::MissingSeparator(
                    self.case_format.as_str().to_string(),
                ))
            }
            _ => {}
        }

        let mut seen = HashSet::new();
        for (i, entry) in self.service_abbreviations.iter().enumerate() {
            if entry.abbreviation.trim().is_empty() {
                return Err(SchemeError::EmptyAbbreviation(i));
            }
            if !seen.insert(entry.abbreviation.as_str()) {
                return Err(SchemeError::DuplicateAbbreviation(entry.abbreviation.clone()));
            }
        }

        Ok(())
    }

    pub fn sorted_components(&self) -> Vec<&ComponentDefinition> {
        let mut sorted: Vec<_> = self.components.iter().collect();
        sorted.sort_by_key(|c| c.position);
        sorted
    }

    /// Separator actually used; camelCase always joins without one
    pub fn effective_separator(&self) -> &str {
        match self.case_format {
            CaseFormat::CamelCase => "",
            _ => &self.separator,
        }
    }

    pub fn required_count(&self) -> usize {
        self.components.iter().filter(|c| c.required).count()
    }

    pub fn is_accepted_company(&self, token: &str) -> bool {
        self.accepted_company_names
            .iter()
            .any(|c| c.eq_ignore_ascii_case(token))
    }

    pub fn tenant_overrides(&self) -> TenantOverrides {
        TenantOverrides::new(
            self.service_abbreviations
                .iter()
                .map(|s| (s.abbreviation.as_str(), s.full_name.as_str())),
        )
    }

    /// Example resource name built from placeholder values
    pub fn example_name(&self) -> String {
        let parts: Vec<String> = self
            .sorted_components()
            .into_iter()
            .map(|c| match c.component_type {
                ComponentType::Company => self
                    .accepted_company_names
                    .first()
                    .cloned()
                    .unwrap_or_else(|| c.component_type.placeholder().to_string()),
                other => other.placeholder().to_string(),
            })
            .collect();

        self.apply_case(&parts)
    }

    fn apply_case(&self, parts: &[String]) -> String {
        let sep = self.effective_separator();
        match self.case_format {
            CaseFormat::Lowercase => parts.join(sep).to_lowercase(),
            CaseFormat::Uppercase => parts.join(sep).to_uppercase(),
            CaseFormat::PascalCase => parts
                .iter()
                .map(|p| title_case(p))
                .collect::<Vec<_>>()
                .join(sep),
            CaseFormat::CamelCase => parts
                .iter()
                .enumerate()
                .map(|(i, p)| if i == 0 { p.to_lowercase() } else { title_case(p) })
                .collect::<Vec<_>>()
                .join(sep),
        }
    }

    /// Split a name into its components according to this scheme
    pub fn split_name<'a>(&self, name: &'a str) -> Vec<&'a str> {
        let sep = self.effective_separator();
        if sep.is_empty() {
            split_case_boundaries(name)
        } else {
            name.split(sep).filter(|t| !t.is_empty()).collect()
        }
    }

    /// Check an existing name against the scheme
    pub fn check_name(&self, name: &str, resource_type: &str) -> NameCheck {
        let mut violations = Vec::new();

        if let Some(violation) = self.case_violation(name) {
            violations.push(violation);
        }

        let tokens = self.split_name(name);
        let required = self.required_count();
        if tokens.len() < required {
            violations.push(format!(
                "Name has {} components but the scheme requires at least {}",
                tokens.len(),
                required
            ));
        }

        let taxonomy = Taxonomy::global();
        for (component, token) in self.sorted_components().into_iter().zip(tokens.iter()) {
            let kind = component.component_type;

            if component.effective_allowed_values().next().is_some() {
                if !component
                    .effective_allowed_values()
                    .any(|v| v.eq_ignore_ascii_case(token))
                {
                    violations.push(format!(
                        "{} component '{}' is not one of the allowed values",
                        kind, token
                    ));
                }
                continue;
            }

            match kind {
                ComponentType::Environment if !is_environment_keyword(token) => {
                    violations.push(format!(
                        "environment component '{}' is not a recognised environment",
                        token
                    ));
                }
                ComponentType::ResourceType
                    if !taxonomy.valid_abbreviations(resource_type).is_empty()
                        && !taxonomy.is_abbreviation_for(token, resource_type) =>
                {
                    violations.push(format!(
                        "resource-type component '{}' should be one of: {}",
                        token,
                        taxonomy.valid_abbreviations(resource_type).join(", ")
                    ));
                }
                ComponentType::Instance if !is_instance_component(token) => {
                    violations.push(format!(
                        "instance component '{}' is not a numeric instance",
                        token
                    ));
                }
                ComponentType::Company
                    if !self.accepted_company_names.is_empty()
                        && !self.is_accepted_company(token) =>
                {
                    violations.push(format!(
                        "company component '{}' is not an accepted company name",
                        token
                    ));
                }
                _ => {}
            }
        }

        NameCheck {
            compliant: violations.is_empty(),
            violations,
        }
    }

    fn case_violation(&self, name: &str) -> Option<String> {
        let ok = match self.case_format {
            CaseFormat::Lowercase => !name.chars().any(|c| c.is_uppercase()),
            CaseFormat::Uppercase => !name.chars().any(|c| c.is_lowercase()),
            CaseFormat::PascalCase => {
                let parts = self.split_name(name);
                !parts.is_empty()
                    && parts[0].chars().next().is_some_and(|c| c.is_uppercase())
                    && parts
                        .iter()
                        .all(|p| p.chars().next().is_some_and(|c| !c.is_lowercase()))
            }
            CaseFormat::CamelCase => {
                name.chars().next().is_some_and(|c| c.is_lowercase())
                    && name.chars().all(|c| c.is_alphanumeric())
            }
        };

        if ok {
            None
        } else {
            Some(format!(
                "Name does not follow the {} case format",
                self.case_format.as_str()
            ))
        }
    }
}

fn title_case(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}
