//! Library-level assessment tests
//!
//! Drive the public engine API end to end: inventory, filtering, parallel
//! analyzers, failure isolation and the composite score.

use anyhow::{bail, Result};
use cloudgov::analyzers::{AnalysisContext, Analyzer, AssessmentType, GovernanceEngine};
use cloudgov::config::ProjectConfig;
use cloudgov::models::{AnalysisMode, AnalysisResult, ResourceDescriptor, Severity};
use cloudgov::naming::NamingScheme;
use cloudgov::providers::{DirectorySnapshot, NoDirectory, StaticDirectory, StaticInventory};
use cloudgov::scoring::category;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const VM: &str = "Microsoft.Compute/virtualMachines";

fn vm(subscription: &str, name: &str) -> ResourceDescriptor {
    ResourceDescriptor::new(
        &format!("/subscriptions/{subscription}/resourceGroups/rg-app/providers/{VM}/{name}"),
        name,
        VM,
    )
    .with_resource_group("rg-app")
    .with_subscription(subscription)
}

fn tagged(resource: ResourceDescriptor) -> ResourceDescriptor {
    resource
        .with_tag("environment", "prod")
        .with_tag("owner", "platform")
        .with_tag("cost-center", "cc-42")
}

/// Directory that grants every capability but holds no records
fn empty_directory() -> StaticDirectory {
    StaticDirectory::new(DirectorySnapshot {
        applications: Some(Vec::new()),
        users: Some(Vec::new()),
        devices: Some(Vec::new()),
        role_assignments: Some(Vec::new()),
        conditional_access_policies: Some(Vec::new()),
    })
}

struct BrokenRbac;

impl Analyzer for BrokenRbac {
    fn name(&self) -> &'static str {
        "identity-rbac"
    }

    fn category(&self) -> &'static str {
        category::RBAC
    }

    fn description(&self) -> &'static str {
        "fails on every run"
    }

    fn analyze_enhanced(&self, _ctx: &AnalysisContext<'_>) -> Result<AnalysisResult> {
        bail!("role assignment listing returned 500")
    }
}

#[test]
fn failing_identity_analyzer_keeps_the_other_three() {
    let mut engine =
        GovernanceEngine::new(ProjectConfig::default(), Arc::new(empty_directory())).with_workers(4);
    engine.register(Arc::new(BrokenRbac));

    let result = engine
        .assess(AssessmentType::IdentityFull, &[], None, &CancellationToken::new())
        .expect("a failing analyzer must not fail the assessment");

    // 0.25 * 100 + 0.25 * 100 + 0.20 * 50 + 0.30 * 0 = 60, minus 8 for the High error finding
    assert_eq!(result.score, 52.0);
    assert_eq!(result.grade, "F");
    assert_eq!(result.analyzers.len(), 4);

    let rbac = result
        .analyzers
        .iter()
        .find(|a| a.analyzer == "identity-rbac")
        .expect("rbac outcome");
    assert_eq!(rbac.mode, AnalysisMode::Failed);
    assert_eq!(rbac.score, 0.0);

    let error = &result.findings[0];
    assert_eq!(error.severity, Severity::High);
    assert!(error.issue.contains("returned 500"));
    assert_eq!(result.summary.high, 1);
    // Conditional access with no policies adds its Medium finding
    assert_eq!(result.summary.medium, 1);
}

#[test]
fn inventory_is_filtered_and_scoped_to_subscriptions() {
    let inventory = StaticInventory::new(vec![
        tagged(vm("sub-a", "abc-prod-web-vm-01")),
        vm("sub-a", "abc-prod-api-vm-01"),
        ResourceDescriptor::new(
            "/subscriptions/sub-a/resourceGroups/rg-app/providers/Microsoft.OperationalInsights/workspaces/DefaultWorkspace-aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee",
            "DefaultWorkspace-aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee",
            "Microsoft.OperationalInsights/workspaces",
        ),
        tagged(vm("sub-b", "abc-prod-db-vm-01")),
    ]);
    let engine = GovernanceEngine::new(ProjectConfig::default(), Arc::new(NoDirectory));

    let result = engine
        .assess_inventory(
            AssessmentType::Tagging,
            &inventory,
            &["sub-a".to_string()],
            None,
            &CancellationToken::new(),
        )
        .expect("assessment");

    assert_eq!(result.filtering.total, 3);
    assert_eq!(result.filtering.filtered_out, 1);
    assert_eq!(result.resources_analyzed, 2);
    // One of two resources fully tagged, the other has no tags at all
    assert_eq!(result.score, 50.0);
    assert_eq!(result.findings.len(), 1);
    assert_eq!(result.findings[0].severity, Severity::Medium);
}

#[test]
fn naming_assessment_with_scheme() {
    let engine = GovernanceEngine::new(ProjectConfig::default(), Arc::new(NoDirectory));
    let scheme = NamingScheme::standard("abc");
    let resources = vec![tagged(vm("sub-a", &scheme.example_name()))];

    let result = engine
        .assess(AssessmentType::Naming, &resources, Some(&scheme), &CancellationToken::new())
        .expect("assessment");

    assert_eq!(result.score, 100.0);
    assert!(result.findings.is_empty());
    assert_eq!(result.grade, "A");
}

#[test]
fn result_serializes_with_camel_case_keys() {
    let engine = GovernanceEngine::new(ProjectConfig::default(), Arc::new(NoDirectory));
    let result = engine
        .assess(AssessmentType::IdentityFull, &[], None, &CancellationToken::new())
        .expect("assessment");

    let json = serde_json::to_value(&result).expect("serialize");
    assert_eq!(json["assessmentType"], "identity-full");
    assert!(json["runId"].as_str().is_some_and(|id| !id.is_empty()));
    assert!(json["detailedMetrics"].is_object());
    assert_eq!(json["analyzers"].as_array().map(Vec::len), Some(4));
    assert!(json["analyzers"]
        .as_array()
        .into_iter()
        .flatten()
        .all(|a| a["mode"] == "limited"));
}
