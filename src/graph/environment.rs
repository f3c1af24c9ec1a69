//! Environment detection and environment-mixing findings

use super::store::DependencyGraph;
use super::store_models::types;
use super::topology::vnet_attached_resources;
use crate::models::{Finding, ResourceDescriptor, Severity};
use crate::taxonomy::{is_environment_keyword, normalize_environment, tokenize};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Tag keys consulted (case-insensitively) before falling back to the name
pub const ENVIRONMENT_TAG_KEYS: &[&str] = &["environment", "env", "stage"];

/// Environment of a resource: tag value first, then name tokens
pub fn detect_environment(resource: &ResourceDescriptor) -> Option<String> {
    for key in ENVIRONMENT_TAG_KEYS {
        if let Some(value) = resource.tag(key) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            return Some(
                normalize_environment(value)
                    .map(str::to_string)
                    .unwrap_or_else(|| value.to_lowercase()),
            );
        }
    }

    tokenize(&resource.name)
        .into_iter()
        .find(|t| is_environment_keyword(t))
        .and_then(normalize_environment)
        .map(str::to_string)
}

/// A VNet whose attached resources span several environments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentMixing {
    pub vnet_id: String,
    pub vnet_name: String,
    pub environments: Vec<String>,
    pub resource_count: usize,
    pub severity: Severity,
}

impl EnvironmentMixing {
    pub fn to_finding(&self, category: &str) -> Finding {
        Finding::new(
            category,
            self.vnet_id.as_str(),
            self.vnet_name.as_str(),
            self.severity,
            format!(
                "VNet {} connects {} resources across environments: {}",
                self.vnet_name,
                self.resource_count,
                self.environments.join(", ")
            ),
            "Separate environments into dedicated virtual networks so non-production workloads cannot reach production",
        )
        .with_effort(if self.environments.len() >= 3 { "days" } else { "hours" })
    }
}

/// Severity for a VNet mixing `environments` environments over `resources` resources
pub fn mixing_severity(environments: usize, resources: usize) -> Severity {
    if environments >= 3 && resources >= 10 {
        Severity::Critical
    } else if environments >= 3 || resources >= 10 {
        Severity::High
    } else {
        Severity::Medium
    }
}

pub fn environment_mixing(graph: &DependencyGraph<'_>) -> Vec<EnvironmentMixing> {
    let mut out = Vec::new();
    for vnet in graph.resources_of_type(types::VNET) {
        let attached = vnet_attached_resources(graph, vnet);
        let environments: BTreeSet<String> = attached.iter().filter_map(|r| detect_environment(r)).collect();
        if environments.len() < 2 {
            continue;
        }
        out.push(EnvironmentMixing {
            vnet_id: vnet.id.clone(),
            vnet_name: vnet.name.clone(),
            severity: mixing_severity(environments.len(), attached.len()),
            environments: environments.into_iter().collect(),
            resource_count: attached.len(),
        });
    }
    out
}
