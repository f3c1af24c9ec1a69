//! Resource filter
//!
//! Removes system-generated records that nobody can rename or tag from the
//! analyzable set. Rules are checked in a fixed order and the first match
//! gives the exclusion reason:
//!
//! 1. system resource type (plus configured extra types)
//! 2. system-generated name (plus configured extra name patterns)
//! 3. reserved system database name on a database/table record
//! 4. name shorter than two characters, or all digits
//!
//! Filtering is pure and idempotent: `filter(filter(R)) == filter(R)`.

use crate::error::ConfigError;
use crate::models::ResourceDescriptor;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;
use tracing::debug;

/// Maximum number of example exclusions kept in the stats
pub const MAX_EXAMPLES: usize = 10;

const SYSTEM_TYPES: &[&str] = &[
    "microsoft.managedidentity/userassignedidentities/federatedidentitycredentials",
    "microsoft.authorization/roleassignments",
    "microsoft.authorization/roledefinitions",
    "microsoft.authorization/denyassignments",
    "microsoft.resources/deployments",
    "microsoft.resources/deploymentscripts",
    "microsoft.resources/templatespecs/versions",
    "microsoft.insights/diagnosticsettings",
    "microsoft.security/assessments",
    "microsoft.security/assessmentmetadata",
    "microsoft.security/assessments/subassessments",
];

const SYSTEM_DATABASES: &[&str] = &[
    "master",
    "tempdb",
    "model",
    "msdb",
    "information_schema",
    "mysql",
    "sys",
    "performance_schema",
    "postgres",
    "azure_maintenance",
    "azure_sys",
];

const SMART_DETECTION_NAME: &str = "Application Insights Smart Detection";

static SYSTEM_NAME_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

fn system_name_patterns() -> &'static [Regex] {
    SYSTEM_NAME_PATTERNS.get_or_init(|| {
        [
            // Bare UUID
            r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
            r"(?i)^DefaultWorkspace-[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}",
            r"(?i)^NetworkWatcher_",
            r"(?i)^DefaultBackupVault-",
            r"(?i)^(ClassicCompute|ClassicStorage|ClassicNetwork|cs-classic)",
            // Auto-created identity suffix
            r"(?i)-id-[0-9a-f]+$",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
    })
}

/// Why a record was left out of the analyzable set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExclusionReason {
    SystemType,
    ConfiguredType,
    SystemName,
    ConfiguredPattern,
    SystemDatabase,
    InvalidName,
}

impl ExclusionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionReason::SystemType => "system-type",
            ExclusionReason::ConfiguredType => "configured-type",
            ExclusionReason::SystemName => "system-name",
            ExclusionReason::ConfiguredPattern => "configured-pattern",
            ExclusionReason::SystemDatabase => "system-database",
            ExclusionReason::InvalidName => "invalid-name",
        }
    }
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One excluded record, kept as an example in the stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredExample {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub reason: ExclusionReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteringStats {
    pub total: usize,
    pub analyzable: usize,
    pub filtered_out: usize,
    /// Share of filtered-out records, rounded to 2 decimals
    pub percentage: f64,
    pub reasons: BTreeMap<ExclusionReason, usize>,
    pub examples: Vec<FilteredExample>,
}

/// Filter with optional configured exclusions on top of the built-in rules
#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    extra_types: HashSet<String>,
    extra_patterns: Vec<Regex>,
}

impl ResourceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add configured exclusions. Fails on the first invalid regex.
    pub fn with_exclusions(types: &[String], patterns: &[String]) -> Result<Self, ConfigError> {
        let extra_types = types.iter().map(|t| t.to_ascii_lowercase()).collect();
        let extra_patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::InvalidPattern {
                    pattern: p.clone(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            extra_types,
            extra_patterns,
        })
    }

    /// First matching exclusion rule, or `None` when the record is analyzable
    pub fn exclusion_reason(&self, resource: &ResourceDescriptor) -> Option<ExclusionReason> {
        let type_lower = resource.type_lower();
        let name = resource.name.as_str();

        if SYSTEM_TYPES.contains(&type_lower.as_str()) {
            return Some(ExclusionReason::SystemType);
        }
        if self.extra_types.contains(&type_lower) {
            return Some(ExclusionReason::ConfiguredType);
        }

        if name == SMART_DETECTION_NAME || system_name_patterns().iter().any(|re| re.is_match(name)) {
            return Some(ExclusionReason::SystemName);
        }
        if self.extra_patterns.iter().any(|re| re.is_match(name)) {
            return Some(ExclusionReason::ConfiguredPattern);
        }

        if is_database_record(&type_lower)
            && SYSTEM_DATABASES.contains(&name.to_ascii_lowercase().as_str())
        {
            return Some(ExclusionReason::SystemDatabase);
        }

        if name.chars().count() < 2 || name.chars().all(|c| c.is_ascii_digit()) {
            return Some(ExclusionReason::InvalidName);
        }

        None
    }

    pub fn is_analyzable(&self, resource: &ResourceDescriptor) -> bool {
        self.exclusion_reason(resource).is_none()
    }

    /// Split the input into the analyzable records and their stats
    pub fn filter(&self, resources: &[ResourceDescriptor]) -> (Vec<ResourceDescriptor>, FilteringStats) {
        let mut kept = Vec::with_capacity(resources.len());
        let mut stats = FilteringStats {
            total: resources.len(),
            ..Default::default()
        };

        for resource in resources {
            match self.exclusion_reason(resource) {
                None => kept.push(resource.clone()),
                Some(reason) => {
                    *stats.reasons.entry(reason).or_insert(0) += 1;
                    if stats.examples.len() < MAX_EXAMPLES {
                        stats.examples.push(FilteredExample {
                            name: resource.name.clone(),
                            resource_type: resource.resource_type.clone(),
                            reason,
                        });
                    }
                }
            }
        }

        stats.analyzable = kept.len();
        stats.filtered_out = stats.total - stats.analyzable;
        stats.percentage = if stats.total == 0 {
            0.0
        } else {
            round2(stats.filtered_out as f64 / stats.total as f64 * 100.0)
        };

        debug!(
            "Filtered {} of {} resources ({}%)",
            stats.filtered_out, stats.total, stats.percentage
        );

        (kept, stats)
    }
}

/// Filter with the built-in rules only
pub fn filter_resources(resources: &[ResourceDescriptor]) -> (Vec<ResourceDescriptor>, FilteringStats) {
    ResourceFilter::new().filter(resources)
}

fn is_database_record(type_lower: &str) -> bool {
    type_lower.ends_with("/databases") || type_lower.ends_with("/tables")
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
