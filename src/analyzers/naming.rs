//! Naming convention analyzer
//!
//! With a tenant scheme every name is checked against it. Without one the
//! analyzer infers the dominant naming style of the snapshot and reports
//! names that deviate from it, UUID-style names, and names that carry no
//! resource-type abbreviation.

use super::base::{finish, AnalysisContext, Analyzer};
use crate::models::{AnalysisResult, Finding, ResourceDescriptor, Severity};
use crate::naming::{analyze_name, ComponentKind, NamingPattern, NamingScheme};
use crate::scoring::{category, naming_score, round2};
use crate::taxonomy::{extract_service, valid_abbreviations, TenantOverrides};
use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

pub struct NamingAnalyzer;

impl NamingAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NamingAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Most common pattern that is not UUID-style; ties go to the first in enum order
pub fn dominant_pattern(counts: &BTreeMap<NamingPattern, usize>) -> Option<NamingPattern> {
    let mut best: Option<(NamingPattern, usize)> = None;
    for (&pattern, &count) in counts {
        if pattern.is_uuid_style() {
            continue;
        }
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((pattern, count));
        }
    }
    best.map(|(p, _)| p)
}

fn scheme_findings(scheme: &NamingScheme, resource: &ResourceDescriptor) -> Vec<Finding> {
    let check = scheme.check_name(&resource.name, &resource.resource_type);
    if check.compliant {
        return Vec::new();
    }
    vec![Finding::for_resource(
        category::NAMING,
        resource,
        Severity::Medium,
        format!(
            "Name '{}' does not follow the naming scheme: {}",
            resource.name,
            check.violations.join("; ")
        ),
        format!("Rename following the scheme, e.g. '{}'", scheme.example_name()),
    )
    .with_effort("Medium (recreate or redeploy the resource)")]
}

fn heuristic_findings(resource: &ResourceDescriptor, pattern: NamingPattern, dominant: Option<NamingPattern>) -> Vec<Finding> {
    let mut findings = Vec::new();

    if pattern.is_uuid_style() {
        findings.push(Finding::for_resource(
            category::NAMING,
            resource,
            Severity::Medium,
            format!("Name '{}' is a generated identifier ({})", resource.name, pattern),
            "Give the resource a descriptive name that states its purpose and environment",
        ));
        return findings;
    }

    if let Some(dominant) = dominant {
        if pattern != dominant {
            findings.push(Finding::for_resource(
                category::NAMING,
                resource,
                Severity::Low,
                format!(
                    "Name '{}' uses {} while most resources use {}",
                    resource.name, pattern, dominant
                ),
                format!("Align the name with the {} convention", dominant),
            ));
        }
    }

    let expected = valid_abbreviations(&resource.resource_type);
    if !expected.is_empty() {
        let analysis = analyze_name(&resource.name, &resource.resource_type);
        if !analysis
            .tokens
            .iter()
            .any(|t| t.kind == ComponentKind::ResourceType)
        {
            findings.push(Finding::for_resource(
                category::NAMING,
                resource,
                Severity::Low,
                format!(
                    "Name '{}' contains no recognizable resource-type abbreviation",
                    resource.name
                ),
                format!("Include one of: {}", expected.join(", ")),
            ));
        }
    }

    findings
}

impl Analyzer for NamingAnalyzer {
    fn name(&self) -> &'static str {
        "naming"
    }

    fn category(&self) -> &'static str {
        category::NAMING
    }

    fn description(&self) -> &'static str {
        "Checks resource names against the tenant scheme or the dominant convention"
    }

    fn analyze_enhanced(&self, ctx: &AnalysisContext<'_>) -> Result<AnalysisResult> {
        let mut result = AnalysisResult::new(self.name(), self.category());
        let resources = ctx.resources;

        let mut patterns: BTreeMap<NamingPattern, usize> = BTreeMap::new();
        let classified: Vec<NamingPattern> = resources
            .iter()
            .map(|r| crate::naming::classify_naming_pattern(&r.name))
            .collect();
        for pattern in &classified {
            *patterns.entry(*pattern).or_insert(0) += 1;
        }
        let dominant = dominant_pattern(&patterns);

        let (companies, overrides) = match ctx.scheme {
            Some(scheme) => (scheme.accepted_company_names.clone(), scheme.tenant_overrides()),
            None => (Vec::new(), TenantOverrides::default()),
        };

        let mut compliant = 0usize;
        let mut services = BTreeSet::new();
        let mut groups = BTreeSet::new();

        for (resource, pattern) in resources.iter().zip(classified.iter()) {
            let findings = match ctx.scheme {
                Some(scheme) => scheme_findings(scheme, resource),
                None => heuristic_findings(resource, *pattern, dominant),
            };
            if findings.is_empty() {
                compliant += 1;
            }
            result.findings.extend(findings);

            if let Some(service) = extract_service(&resource.name, &companies, &overrides) {
                services.insert(service.to_lowercase());
            }
            if !resource.resource_group.is_empty() {
                groups.insert(resource.resource_group.to_ascii_lowercase());
            }
        }

        debug!(
            "Naming: {}/{} compliant (scheme: {})",
            compliant,
            resources.len(),
            ctx.scheme.is_some()
        );

        let base = naming_score(compliant, resources.len());
        for (pattern, count) in &patterns {
            result.set_metric(format!("pattern_{}", pattern.as_str()), *count);
        }
        if let Some(dominant) = dominant {
            result.set_metric("dominant_pattern", dominant.as_str());
        }
        result.set_metric("scheme_applied", ctx.scheme.is_some());
        result.set_metric("compliant_resources", compliant);
        result.set_metric("compliance_rate", round2(base));
        result.set_metric("distinct_services", services.len());
        result.set_metric("resource_groups", groups.len());
        result.resources_analyzed = resources.len();

        Ok(finish(result, base))
    }
}
