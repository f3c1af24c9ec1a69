//! Role assignment analyzer

use super::privileged_role;
use crate::analyzers::base::{finish, AnalysisContext, Analyzer};
use crate::models::{AnalysisResult, Finding, Severity};
use crate::providers::{Capability, RoleAssignment};
use crate::scoring::{category, rbac_score};
use anyhow::Result;
use std::collections::BTreeMap;

const ROLE_ASSIGNMENT_TYPE: &str = "microsoft.authorization/roleassignments";

/// How broad an assignment scope is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScopeLevel {
    Resource,
    ResourceGroup,
    Subscription,
    ManagementGroup,
    Root,
}

impl ScopeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeLevel::Resource => "resource",
            ScopeLevel::ResourceGroup => "resource group",
            ScopeLevel::Subscription => "subscription",
            ScopeLevel::ManagementGroup => "management group",
            ScopeLevel::Root => "root",
        }
    }
}

pub fn scope_level(scope: &str) -> ScopeLevel {
    let trimmed = scope.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return ScopeLevel::Root;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("/providers/microsoft.management/managementgroups/") {
        return ScopeLevel::ManagementGroup;
    }
    let segments: Vec<&str> = lower.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        ["subscriptions", _] => ScopeLevel::Subscription,
        ["subscriptions", _, "resourcegroups", _] => ScopeLevel::ResourceGroup,
        _ => ScopeLevel::Resource,
    }
}

pub struct RbacAnalyzer;

impl RbacAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RbacAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Finding for one privileged assignment, if it is over-broad
fn assignment_finding(assignment: &RoleAssignment, role: &str) -> Option<Finding> {
    let level = scope_level(&assignment.scope);
    let principal = if assignment.principal_name.is_empty() {
        assignment.principal_id.as_str()
    } else {
        assignment.principal_name.as_str()
    };

    let (severity, issue, recommendation) = if assignment.is_guest {
        (
            Severity::Critical,
            format!("Guest {} holds {} at {} scope {}", principal, role, level.as_str(), assignment.scope),
            "Remove privileged roles from guest accounts or move them into a governed access package",
        )
    } else if level >= ScopeLevel::ManagementGroup {
        (
            Severity::Critical,
            format!("{} holds {} at {} scope", principal, role, level.as_str()),
            "Assign privileged roles at the narrowest scope and use just-in-time elevation",
        )
    } else if level == ScopeLevel::Subscription {
        (
            Severity::High,
            format!("{} holds {} on subscription {}", principal, role, assignment.scope),
            "Scope the assignment to the resource groups the principal manages",
        )
    } else {
        return None;
    };

    Some(Finding::new(
        category::RBAC,
        format!("role-assignment:{}", assignment.id),
        principal,
        severity,
        issue,
        recommendation,
    ))
}

impl Analyzer for RbacAnalyzer {
    fn name(&self) -> &'static str {
        "identity-rbac"
    }

    fn category(&self) -> &'static str {
        category::RBAC
    }

    fn description(&self) -> &'static str {
        "Checks privileged role assignments, guest access and owner counts"
    }

    fn required_capabilities(&self) -> &'static [Capability] {
        &[Capability::RoleManagement]
    }

    fn analyze_enhanced(&self, ctx: &AnalysisContext<'_>) -> Result<AnalysisResult> {
        let mut result = AnalysisResult::new(self.name(), self.category());
        let assignments = ctx.directory.role_assignments(ctx.cancel)?;
        ctx.check_cancelled()?;

        let mut privileged = 0usize;
        let mut overprivileged = 0usize;
        let mut owners: BTreeMap<String, (String, usize)> = BTreeMap::new();

        for assignment in &assignments {
            let Some(role) = privileged_role(&assignment.role_definition_id, &assignment.role_name) else {
                continue;
            };
            privileged += 1;

            if role == "Owner" && scope_level(&assignment.scope) == ScopeLevel::Subscription {
                let scope = assignment.scope.trim_end_matches('/');
                owners
                    .entry(scope.to_ascii_lowercase())
                    .or_insert_with(|| (scope.to_string(), 0))
                    .1 += 1;
            }

            if let Some(finding) = assignment_finding(assignment, role) {
                overprivileged += 1;
                result.findings.push(finding);
            }
        }

        let max_owners = ctx.config.identity.max_subscription_owners;
        for (scope, count) in owners.values() {
            if *count > max_owners {
                result.findings.push(Finding::new(
                    category::RBAC,
                    scope.as_str(),
                    scope.as_str(),
                    Severity::Medium,
                    format!("Subscription {} has {} owners (at most {} expected)", scope, count, max_owners),
                    "Reduce standing Owner assignments and use eligible assignments instead",
                ));
            }
        }

        result.set_metric("role_assignments", assignments.len());
        result.set_metric("privileged_assignments", privileged);
        result.set_metric("overprivileged_assignments", overprivileged);
        result.resources_analyzed = assignments.len();

        Ok(finish(result, rbac_score(overprivileged)))
    }

    fn analyze_limited(&self, ctx: &AnalysisContext<'_>) -> Result<AnalysisResult> {
        let mut result = AnalysisResult::new(self.name(), self.category());
        let records: Vec<_> = ctx
            .all_resources
            .iter()
            .filter(|r| r.is_type(ROLE_ASSIGNMENT_TYPE))
            .collect();

        let mut overprivileged = 0usize;
        for record in &records {
            let props = &record.properties;
            let role_definition_id = props.str_at("/roleDefinitionId").unwrap_or_default();
            let Some(role) = privileged_role(role_definition_id, "") else {
                continue;
            };
            let assignment = RoleAssignment {
                id: record.name.clone(),
                principal_id: props.str_at("/principalId").unwrap_or_default().to_string(),
                principal_type: props.str_at("/principalType").unwrap_or_default().to_string(),
                role_definition_id: role_definition_id.to_string(),
                scope: props.str_at("/scope").unwrap_or_default().to_string(),
                ..Default::default()
            };
            if let Some(finding) = assignment_finding(&assignment, role) {
                overprivileged += 1;
                result.findings.push(finding);
            }
        }

        result.set_metric("role_assignment_records", records.len());
        result.set_metric("overprivileged_assignments", overprivileged);
        result.resources_analyzed = records.len();

        Ok(finish(result, rbac_score(overprivileged)))
    }
}
