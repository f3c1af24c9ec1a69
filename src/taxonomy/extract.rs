//! Service extraction from resource names

use super::{is_environment_keyword, tokenize, Taxonomy};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

static INSTANCE_TOKEN: OnceLock<Regex> = OnceLock::new();

fn instance_token_re() -> &'static Regex {
    INSTANCE_TOKEN.get_or_init(|| {
        Regex::new(r"^(?:\d+|[a-zA-Z]{1,2}\d+|\d+[a-zA-Z])$").expect("valid regex")
    })
}

/// Numeric instance marker: `01`, `v2`, `01a`
pub fn is_instance_token(token: &str) -> bool {
    instance_token_re().is_match(token)
}

/// Tenant-scoped service abbreviations
///
/// Exact lookups are case-sensitive; the lowercase map is only a fallback
/// for tokens that don't match any entry exactly.
#[derive(Debug, Clone, Default)]
pub struct TenantOverrides {
    exact: HashMap<String, String>,
    folded: HashMap<String, String>,
}

impl TenantOverrides {
    pub fn new<I, A, F>(entries: I) -> Self
    where
        I: IntoIterator<Item = (A, F)>,
        A: Into<String>,
        F: Into<String>,
    {
        let mut overrides = Self::default();
        for (abbreviation, full_name) in entries {
            let abbreviation = abbreviation.into();
            let full_name = full_name.into();
            // First definition wins for the folded key
            overrides
                .folded
                .entry(abbreviation.to_lowercase())
                .or_insert_with(|| full_name.clone());
            overrides.exact.insert(abbreviation, full_name);
        }
        overrides
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    /// Exact match, then case-insensitive fallback
    pub fn lookup(&self, token: &str) -> Option<&str> {
        self.exact
            .get(token)
            .or_else(|| self.folded.get(&token.to_lowercase()))
            .map(String::as_str)
    }
}

/// Pull the service component out of a resource name.
///
/// Tokens that are company names, environment keywords, resource-type
/// abbreviations or instance markers are skipped. The first remaining token
/// that resolves through the tenant overrides, the global service table, or
/// is simply longer than two characters wins.
pub fn extract_service(
    name: &str,
    accepted_company_names: &[String],
    overrides: &TenantOverrides,
) -> Option<String> {
    let taxonomy = Taxonomy::global();

    for token in tokenize(name) {
        if accepted_company_names
            .iter()
            .any(|c| c.eq_ignore_ascii_case(token))
        {
            continue;
        }
        if is_environment_keyword(token)
            || taxonomy.is_known_abbreviation(token)
            || is_instance_token(token)
        {
            continue;
        }

        if let Some(full) = overrides.lookup(token) {
            return Some(full.to_string());
        }
        if let Some(canonical) = taxonomy.canonical_service_name(token) {
            return Some(canonical.to_string());
        }
        if token.chars().count() > 2 {
            return Some(token.to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn companies(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_instance_tokens() {
        assert!(is_instance_token("01"));
        assert!(is_instance_token("v2"));
        assert!(is_instance_token("01a"));
        assert!(is_instance_token("AB12"));
        assert!(!is_instance_token("abc1"));
        assert!(!is_instance_token("web"));
    }

    #[test]
    fn test_tenant_override_beats_global_table() {
        let overrides = TenantOverrides::new([("cmp", "Compass")]);
        let svc = extract_service("abc-prod-cmp-vm-01", &companies(&["abc"]), &overrides);
        assert_eq!(svc.as_deref(), Some("Compass"));

        let svc = extract_service("abc-prod-cmp-vm-01", &companies(&["abc"]), &TenantOverrides::default());
        assert_eq!(svc.as_deref(), Some("compute"));
    }

    #[test]
    fn test_exact_override_precedes_case_fallback() {
        let overrides = TenantOverrides::new([("PAY", "Payroll"), ("pay", "Payments Gateway")]);
        assert_eq!(overrides.lookup("PAY"), Some("Payroll"));
        assert_eq!(overrides.lookup("pay"), Some("Payments Gateway"));
        // No exact entry: folded key keeps the first definition
        assert_eq!(overrides.lookup("Pay"), Some("Payroll"));
    }

    #[test]
    fn test_skips_company_env_type_and_instance_tokens() {
        let svc = extract_service("ABC_dev_vnet_02_billing", &companies(&["abc"]), &TenantOverrides::default());
        assert_eq!(svc.as_deref(), Some("billing"));
    }

    #[test]
    fn test_short_unknown_tokens_are_not_services() {
        let svc = extract_service("xy-prod-vm-01", &[], &TenantOverrides::default());
        assert_eq!(svc, None);
        assert_eq!(extract_service("", &[], &TenantOverrides::default()), None);
    }
}
