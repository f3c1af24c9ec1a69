//! Stale identity analyzer

use crate::analyzers::base::{finish, AnalysisContext, Analyzer};
use crate::graph::types;
use crate::models::{AnalysisResult, Finding, ResourceDescriptor, Severity};
use crate::providers::Capability;
use crate::scoring::{category, stale_identity_score};
use anyhow::Result;
use std::collections::HashSet;

pub struct StaleIdentityAnalyzer;

impl StaleIdentityAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StaleIdentityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Whole resource ids each resource mentions, excluding its own
fn referenced_ids(resources: &[ResourceDescriptor]) -> HashSet<String> {
    let mut referenced = HashSet::new();
    for resource in resources {
        let mut ids = resource.properties.resource_ids();
        if let Some(identity) = &resource.identity {
            ids.extend(identity.resource_ids());
        }
        ids.remove(resource.id_key().trim_end_matches('/'));
        referenced.extend(ids);
    }
    referenced
}

impl Analyzer for StaleIdentityAnalyzer {
    fn name(&self) -> &'static str {
        "identity-stale"
    }

    fn category(&self) -> &'static str {
        category::STALE_IDENTITY
    }

    fn description(&self) -> &'static str {
        "Finds accounts that no longer sign in and unused managed identities"
    }

    fn required_capabilities(&self) -> &'static [Capability] {
        &[Capability::Users]
    }

    fn analyze_enhanced(&self, ctx: &AnalysisContext<'_>) -> Result<AnalysisResult> {
        let mut result = AnalysisResult::new(self.name(), self.category());
        let users = ctx.directory.users(ctx.cancel)?;
        ctx.check_cancelled()?;

        let window = i64::from(ctx.config.identity.stale_after_days);
        let (mut inactive, mut never) = (0usize, 0usize);

        for user in users.iter().filter(|u| u.account_enabled) {
            let resource_id = format!("user:{}", user.id);
            match user.last_sign_in {
                Some(last) => {
                    let days = ctx.days_since(last);
                    if days > window {
                        inactive += 1;
                        result.findings.push(Finding::new(
                            category::STALE_IDENTITY,
                            resource_id,
                            user.label(),
                            Severity::Medium,
                            format!("{} has not signed in for {} days", user.label(), days),
                            "Disable the account and remove its access if it is no longer needed",
                        ));
                    }
                }
                None => {
                    // Accounts created inside the window get a grace period
                    let recent = user.created.is_some_and(|c| ctx.days_since(c) <= window);
                    if !recent {
                        never += 1;
                        result.findings.push(Finding::new(
                            category::STALE_IDENTITY,
                            resource_id,
                            user.label(),
                            Severity::Low,
                            format!("{} has never signed in", user.label()),
                            "Confirm the account is still required, otherwise delete it",
                        ));
                    }
                }
            }
        }

        result.set_metric("enabled_users", users.iter().filter(|u| u.account_enabled).count());
        result.set_metric("inactive_users", inactive);
        result.set_metric("never_signed_in", never);
        result.set_metric("stale_after_days", window);
        result.resources_analyzed = users.len();

        Ok(finish(result, stale_identity_score(inactive + never)))
    }

    fn analyze_limited(&self, ctx: &AnalysisContext<'_>) -> Result<AnalysisResult> {
        let mut result = AnalysisResult::new(self.name(), self.category());
        let identities: Vec<_> = ctx
            .resources
            .iter()
            .filter(|r| r.is_type(types::MANAGED_IDENTITY))
            .collect();

        let referenced = referenced_ids(ctx.all_resources);
        for identity in &identities {
            if referenced.contains(identity.id_key().trim_end_matches('/')) {
                continue;
            }
            result.findings.push(Finding::for_resource(
                category::STALE_IDENTITY,
                identity,
                Severity::Low,
                format!("Managed identity {} is not assigned to any resource", identity.name),
                "Delete the identity if no workload uses it",
            ));
        }

        let unused = result.findings.len();
        result.set_metric("managed_identities", identities.len());
        result.set_metric("unused_managed_identities", unused);
        result.resources_analyzed = identities.len();

        Ok(finish(result, stale_identity_score(unused)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::testing::Fixture;
    use crate::models::MetricValue;
    use crate::providers::{DirectorySnapshot, DirectoryUser, NoDirectory, StaticDirectory};
    use serde_json::json;

    #[test]
    fn test_stale_users() {
        let fx = Fixture::new();
        let user = |id: &str, enabled: bool, last: Option<i64>, created: Option<i64>| DirectoryUser {
            id: id.to_string(),
            user_principal_name: format!("{id}@contoso.com"),
            display_name: id.to_string(),
            account_enabled: enabled,
            is_guest: false,
            mfa_registered: None,
            last_sign_in: last.map(|d| fx.days_ago(d)),
            created: created.map(|d| fx.days_ago(d)),
            assignment_count: 0,
        };
        let directory = StaticDirectory::new(DirectorySnapshot {
            users: Some(vec![
                user("active", true, Some(3), None),
                user("idle", true, Some(120), None),
                user("ghost", true, None, Some(400)),
                user("new", true, None, Some(5)),
                user("gone", false, Some(500), None),
            ]),
            ..Default::default()
        });

        let result = StaleIdentityAnalyzer::new()
            .analyze_enhanced(&fx.context(&[], &directory))
            .expect("stale");

        assert_eq!(result.metric("inactive_users"), Some(&MetricValue::Integer(1)));
        assert_eq!(result.metric("never_signed_in"), Some(&MetricValue::Integer(1)));
        assert_eq!(result.findings.len(), 2);
        assert_eq!(result.score, 90.0);
    }

    #[test]
    fn test_window_is_configurable() {
        let mut fx = Fixture::new();
        fx.config.identity.stale_after_days = 2;
        let directory = StaticDirectory::new(DirectorySnapshot {
            users: Some(vec![DirectoryUser {
                id: "u1".into(),
                user_principal_name: "u1@contoso.com".into(),
                display_name: String::new(),
                account_enabled: true,
                is_guest: false,
                mfa_registered: Some(true),
                last_sign_in: Some(fx.days_ago(3)),
                created: None,
                assignment_count: 0,
            }]),
            ..Default::default()
        });
        let result = StaleIdentityAnalyzer::new()
            .analyze_enhanced(&fx.context(&[], &directory))
            .expect("stale");
        assert_eq!(result.findings.len(), 1);
        assert!(result.findings[0].issue.contains("3 days"));
    }

    #[test]
    fn test_limited_finds_unreferenced_identities() {
        let fx = Fixture::new();
        let used = "/subscriptions/s1/resourceGroups/rg/providers/Microsoft.ManagedIdentity/userAssignedIdentities/id-app";
        let mut assigned = serde_json::Map::new();
        assigned.insert(used.to_uppercase(), json!({}));
        let resources = vec![
            ResourceDescriptor::new(used, "id-app", "Microsoft.ManagedIdentity/userAssignedIdentities"),
            ResourceDescriptor::new(
                "/subscriptions/s1/resourceGroups/rg/providers/Microsoft.ManagedIdentity/userAssignedIdentities/id-old",
                "id-old",
                "Microsoft.ManagedIdentity/userAssignedIdentities",
            ),
            ResourceDescriptor::new("/r/web", "web", "Microsoft.Web/sites").with_identity(json!({
                "type": "UserAssigned",
                "userAssignedIdentities": assigned
            })),
        ];
        let result = StaleIdentityAnalyzer::new()
            .analyze_limited(&fx.context(&resources, &NoDirectory))
            .expect("limited");

        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].resource_name, "id-old");
        assert_eq!(result.score, 95.0);
    }

    #[test]
    fn test_identity_name_prefix_is_not_a_reference() {
        let fx = Fixture::new();
        let base = "/subscriptions/s1/resourceGroups/rg/providers/Microsoft.ManagedIdentity/userAssignedIdentities";
        let longer = format!("{base}/id-app-2");
        let mut assigned = serde_json::Map::new();
        assigned.insert(longer.clone(), json!({}));
        let resources = vec![
            ResourceDescriptor::new(&format!("{base}/id-app"), "id-app", "Microsoft.ManagedIdentity/userAssignedIdentities"),
            ResourceDescriptor::new(&longer, "id-app-2", "Microsoft.ManagedIdentity/userAssignedIdentities"),
            ResourceDescriptor::new("/r/web", "web", "Microsoft.Web/sites").with_identity(json!({
                "type": "UserAssigned",
                "userAssignedIdentities": assigned
            })),
        ];
        let result = StaleIdentityAnalyzer::new()
            .analyze_limited(&fx.context(&resources, &NoDirectory))
            .expect("limited");

        let unused: Vec<_> = result.findings.iter().map(|f| f.resource_name.as_str()).collect();
        assert_eq!(unused, vec!["id-app"]);
    }

    #[test]
    fn test_own_id_does_not_count_as_reference() {
        let fx = Fixture::new();
        let id = "/subscriptions/s1/resourceGroups/rg/providers/Microsoft.ManagedIdentity/userAssignedIdentities/id-self";
        let resources = vec![ResourceDescriptor::new(id, "id-self", "Microsoft.ManagedIdentity/userAssignedIdentities")
            .with_properties(json!({"resourceId": id}))];
        let result = StaleIdentityAnalyzer::new()
            .analyze_limited(&fx.context(&resources, &NoDirectory))
            .expect("limited");
        assert_eq!(result.findings.len(), 1);
    }
}
