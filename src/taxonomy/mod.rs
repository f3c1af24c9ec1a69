//! Taxonomy registry
//!
//! Process-wide, read-only lookup tables:
//! - resource type → valid abbreviations (primary first) and category
//! - service token → canonical service name, plus equivalence groups
//! - region → short code
//!
//! The tables are built once on first use and never mutated afterwards.
//! Tenant-specific service abbreviations live in [`TenantOverrides`] and
//! are consulted by [`extract_service`] before the global tables.

mod extract;
mod regions;
mod resource_types;
mod services;

pub use extract::{extract_service, is_instance_token, TenantOverrides};
pub use resource_types::ResourceTypeEntry;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// Keywords recognised as environment markers in resource names
pub const ENVIRONMENT_KEYWORDS: &[&str] = &[
    "dev",
    "test",
    "staging",
    "stage",
    "prod",
    "production",
    "qa",
    "uat",
    "shared",
];

/// Separators that split a resource name into tokens
pub const NAME_SEPARATORS: &[char] = &['-', '_', '.', ' '];

/// Broad functional grouping of resource types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceCategory {
    Compute,
    Storage,
    Network,
    Database,
    Security,
    Identity,
    Web,
    Analytics,
    Integration,
    Management,
    Other,
}

impl std::fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResourceCategory::Compute => "compute",
            ResourceCategory::Storage => "storage",
            ResourceCategory::Network => "network",
            ResourceCategory::Database => "database",
            ResourceCategory::Security => "security",
            ResourceCategory::Identity => "identity",
            ResourceCategory::Web => "web",
            ResourceCategory::Analytics => "analytics",
            ResourceCategory::Integration => "integration",
            ResourceCategory::Management => "management",
            ResourceCategory::Other => "other",
        };
        write!(f, "{}", s)
    }
}

/// Immutable lookup tables
pub struct Taxonomy {
    by_type: HashMap<&'static str, &'static ResourceTypeEntry>,
    abbreviations: HashSet<&'static str>,
    services: HashMap<&'static str, &'static str>,
    equivalents: HashMap<&'static str, &'static str>,
    regions: HashMap<&'static str, &'static str>,
    region_codes: HashSet<&'static str>,
}

static TAXONOMY: OnceLock<Taxonomy> = OnceLock::new();

impl Taxonomy {
    /// The process-wide registry
    pub fn global() -> &'static Taxonomy {
        TAXONOMY.get_or_init(Taxonomy::build)
    }

    fn build() -> Self {
        let mut by_type = HashMap::new();
        let mut abbreviations = HashSet::new();
        for entry in resource_types::RESOURCE_TYPES {
            by_type.insert(entry.resource_type, entry);
            abbreviations.extend(entry.abbreviations.iter().copied());
        }

        let services = services::SERVICE_ABBREVIATIONS.iter().copied().collect();

        let mut equivalents = HashMap::new();
        for group in services::EQUIVALENCE_GROUPS {
            let canonical = group[0];
            for member in group.iter() {
                equivalents.insert(*member, canonical);
            }
        }

        let regions: HashMap<_, _> = regions::REGION_ABBREVIATIONS.iter().copied().collect();
        let region_codes = regions.values().copied().collect();

        Self {
            by_type,
            abbreviations,
            services,
            equivalents,
            regions,
            region_codes,
        }
    }

    /// Whether `token` abbreviates any known resource type (case-insensitive)
    pub fn is_known_abbreviation(&self, token: &str) -> bool {
        self.abbreviations.contains(token.to_ascii_lowercase().as_str())
    }

    pub fn entry(&self, resource_type: &str) -> Option<&'static ResourceTypeEntry> {
        self.by_type
            .get(resource_type.to_ascii_lowercase().as_str())
            .copied()
    }

    pub fn primary_abbreviation(&self, resource_type: &str) -> Option<&'static str> {
        self.valid_abbreviations(resource_type).first().copied()
    }

    pub fn valid_abbreviations(&self, resource_type: &str) -> &'static [&'static str] {
        self.entry(resource_type)
            .map(|e| e.abbreviations)
            .unwrap_or(&[])
    }

    /// Whether `token` is a valid abbreviation for this specific type
    pub fn is_abbreviation_for(&self, token: &str, resource_type: &str) -> bool {
        self.valid_abbreviations(resource_type)
            .iter()
            .any(|a| a.eq_ignore_ascii_case(token))
    }

    pub fn category(&self, resource_type: &str) -> ResourceCategory {
        let lower = resource_type.to_ascii_lowercase();
        match self.by_type.get(lower.as_str()) {
            Some(entry) => entry.category,
            None => resource_types::category_by_namespace(&lower),
        }
    }

    /// Canonical service name for a token, via equivalence groups then the
    /// abbreviation table
    pub fn canonical_service_name(&self, token: &str) -> Option<&'static str> {
        let lower = token.to_ascii_lowercase();
        self.equivalents
            .get(lower.as_str())
            .or_else(|| self.services.get(lower.as_str()))
            .copied()
    }

    /// Whether two service tokens name the same service
    pub fn are_equivalent(&self, a: &str, b: &str) -> bool {
        if a.eq_ignore_ascii_case(b) {
            return true;
        }
        match (self.canonical_service_name(a), self.canonical_service_name(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Short code for a region name (`eastus` → `eus`)
    pub fn region_abbreviation(&self, location: &str) -> Option<&'static str> {
        let key: String = location
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        self.regions.get(key.as_str()).copied()
    }

    /// Whether `token` is a region name or region short code
    pub fn is_region_token(&self, token: &str) -> bool {
        let lower = token.to_ascii_lowercase();
        self.region_codes.contains(lower.as_str()) || self.regions.contains_key(lower.as_str())
    }
}

/// Last segment of a provider type (`Microsoft.Compute/virtualMachines` → `virtualMachines`)
pub fn short_type(resource_type: &str) -> &str {
    resource_type.rsplit('/').next().unwrap_or(resource_type)
}

pub fn is_environment_keyword(token: &str) -> bool {
    ENVIRONMENT_KEYWORDS
        .iter()
        .any(|k| k.eq_ignore_ascii_case(token))
}

/// Map a tag value or name token onto a canonical environment label
pub fn normalize_environment(value: &str) -> Option<&'static str> {
    let lower = value.trim().to_ascii_lowercase();
    let env = match lower.as_str() {
        "dev" | "development" | "devel" => "dev",
        "test" | "testing" | "tst" => "test",
        "qa" => "qa",
        "uat" => "uat",
        "staging" | "stage" | "preprod" | "pre-prod" => "staging",
        "prod" | "production" | "prd" | "live" => "prod",
        "shared" | "common" => "shared",
        "sandbox" | "sbx" => "sandbox",
        _ => return None,
    };
    Some(env)
}

/// Split a resource name into its non-empty tokens
pub fn tokenize(name: &str) -> Vec<&str> {
    name.split(NAME_SEPARATORS)
        .filter(|t| !t.is_empty())
        .collect()
}

static UUID_RE: OnceLock<Regex> = OnceLock::new();

/// Matches a canonical 8-4-4-4-12 UUID anywhere in the input
pub(crate) fn uuid_re() -> &'static Regex {
    UUID_RE.get_or_init(|| {
        Regex::new(r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
            .expect("valid regex")
    })
}

/// Convenience wrappers over the global registry
pub fn is_known_abbreviation(token: &str) -> bool {
    Taxonomy::global().is_known_abbreviation(token)
}

pub fn primary_abbreviation(resource_type: &str) -> Option<&'static str> {
    Taxonomy::global().primary_abbreviation(resource_type)
}

pub fn valid_abbreviations(resource_type: &str) -> &'static [&'static str] {
    Taxonomy::global().valid_abbreviations(resource_type)
}

pub fn canonical_service_name(token: &str) -> Option<&'static str> {
    Taxonomy::global().canonical_service_name(token)
}

pub fn are_equivalent(a: &str, b: &str) -> bool {
    Taxonomy::global().are_equivalent(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VM: &str = "Microsoft.Compute/virtualMachines";

    #[test]
    fn test_abbreviation_lookups_are_case_insensitive() {
        assert!(is_known_abbreviation("vm"));
        assert!(is_known_abbreviation("VNET"));
        assert!(!is_known_abbreviation("payroll"));
        assert_eq!(primary_abbreviation(VM), Some("vm"));
        assert_eq!(primary_abbreviation("microsoft.compute/VIRTUALMACHINES"), Some("vm"));
        assert!(valid_abbreviations(VM).contains(&"vms"));
        assert!(valid_abbreviations("Contoso.Custom/widgets").is_empty());
    }

    #[test]
    fn test_abbreviation_for_specific_type() {
        let tax = Taxonomy::global();
        assert!(tax.is_abbreviation_for("VM", VM));
        assert!(!tax.is_abbreviation_for("nic", VM));
    }

    #[test]
    fn test_categories() {
        let tax = Taxonomy::global();
        assert_eq!(tax.category(VM), ResourceCategory::Compute);
        assert_eq!(
            tax.category("Microsoft.KeyVault/vaults"),
            ResourceCategory::Security
        );
        // Not in the table: falls back to the provider namespace
        assert_eq!(
            tax.category("Microsoft.Network/ipGroups"),
            ResourceCategory::Network
        );
        assert_eq!(tax.category("Contoso.Custom/widgets"), ResourceCategory::Other);
    }

    #[test]
    fn test_service_equivalence() {
        assert_eq!(canonical_service_name("stg"), Some("storage"));
        assert_eq!(canonical_service_name("STORE"), Some("storage"));
        assert_eq!(canonical_service_name("cmp"), Some("compute"));
        assert_eq!(canonical_service_name("zzz"), None);
        assert!(are_equivalent("stg", "stor"));
        assert!(are_equivalent("storage", "store"));
        assert!(are_equivalent("Billing", "billing"));
        assert!(!are_equivalent("stg", "db"));
        assert!(!are_equivalent("foo", "bar"));
    }

    #[test]
    fn test_regions() {
        let tax = Taxonomy::global();
        assert_eq!(tax.region_abbreviation("East US"), Some("eus"));
        assert_eq!(tax.region_abbreviation("westeurope"), Some("weu"));
        assert!(tax.is_region_token("weu"));
        assert!(tax.is_region_token("uksouth"));
        assert!(!tax.is_region_token("web"));
    }

    #[test]
    fn test_environment_helpers() {
        assert!(is_environment_keyword("PROD"));
        assert!(!is_environment_keyword("live"));
        assert_eq!(normalize_environment("Production"), Some("prod"));
        assert_eq!(normalize_environment("stage"), Some("staging"));
        assert_eq!(normalize_environment("payments"), None);
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("abc-prod_web.vm--01"), vec!["abc", "prod", "web", "vm", "01"]);
        assert!(tokenize("").is_empty());
    }
}
