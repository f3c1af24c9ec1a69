//! Application registration analyzer

use crate::analyzers::base::{finish, AnalysisContext, Analyzer};
use crate::graph::types;
use crate::models::{AnalysisResult, Finding, Severity};
use crate::providers::{AppRegistration, Capability};
use crate::scoring::{application_risk_score, category};
use anyhow::Result;

/// Application permissions that grant tenant-wide write access
const HIGH_PRIVILEGE_PERMISSIONS: &[&str] = &[
    "Directory.ReadWrite.All",
    "RoleManagement.ReadWrite.Directory",
    "AppRoleAssignment.ReadWrite.All",
    "Application.ReadWrite.All",
    "User.ReadWrite.All",
    "Group.ReadWrite.All",
    "Mail.ReadWrite",
    "Files.ReadWrite.All",
    "Sites.FullControl.All",
];

pub struct ApplicationsAnalyzer;

impl ApplicationsAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ApplicationsAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn app_finding(app: &AppRegistration, severity: Severity, issue: String, recommendation: &str) -> Finding {
    Finding::new(
        category::APPLICATION,
        format!("application:{}", app.app_id),
        app.display_name.as_str(),
        severity,
        issue,
        recommendation,
    )
}

#[derive(Default)]
struct AppTally {
    expired: usize,
    expiring: usize,
    high_privilege: usize,
    ownerless: usize,
    risky: usize,
}

fn check_application(app: &AppRegistration, ctx: &AnalysisContext<'_>, tally: &mut AppTally) -> Vec<Finding> {
    let mut findings = Vec::new();
    let warning_days = i64::from(ctx.config.identity.credential_expiry_warning_days);

    for credential in &app.credentials {
        let Some(end) = credential.end_date_time else {
            continue;
        };
        let label = credential.display_name.as_deref().unwrap_or("unnamed");
        let days_left = (end - ctx.as_of).num_days();
        if end <= ctx.as_of {
            tally.expired += 1;
            findings.push(app_finding(
                app,
                Severity::High,
                format!(
                    "Application {} has an expired {:?} credential '{}' ({} days ago)",
                    app.display_name,
                    credential.kind,
                    label,
                    -days_left
                ),
                "Remove the expired credential and rotate to a new one, or switch to a managed identity",
            ));
        } else if days_left <= warning_days {
            tally.expiring += 1;
            findings.push(app_finding(
                app,
                Severity::Medium,
                format!(
                    "Application {} has a {:?} credential '{}' expiring in {} days",
                    app.display_name, credential.kind, label, days_left
                ),
                "Rotate the credential before it expires",
            ));
        }
    }

    let privileged: Vec<&str> = app
        .permissions
        .iter()
        .filter(|p| HIGH_PRIVILEGE_PERMISSIONS.iter().any(|h| h.eq_ignore_ascii_case(p)))
        .map(String::as_str)
        .collect();
    if !privileged.is_empty() {
        tally.high_privilege += 1;
        findings.push(app_finding(
            app,
            Severity::High,
            format!(
                "Application {} holds high-privilege permissions: {}",
                app.display_name,
                privileged.join(", ")
            ),
            "Reduce the permissions to the narrowest read or resource-specific scopes the app needs",
        ));
    }

    if app.owners.is_empty() {
        tally.ownerless += 1;
        findings.push(app_finding(
            app,
            Severity::Medium,
            format!("Application {} has no owners", app.display_name),
            "Assign at least two owners who are accountable for the registration",
        ));
    }

    if findings.iter().any(|f| f.severity >= Severity::High) {
        tally.risky += 1;
    }
    findings
}

impl Analyzer for ApplicationsAnalyzer {
    fn name(&self) -> &'static str {
        "identity-applications"
    }

    fn category(&self) -> &'static str {
        category::APPLICATION
    }

    fn description(&self) -> &'static str {
        "Checks application credentials, permissions and ownership"
    }

    fn required_capabilities(&self) -> &'static [Capability] {
        &[Capability::Applications]
    }

    fn analyze_enhanced(&self, ctx: &AnalysisContext<'_>) -> Result<AnalysisResult> {
        let mut result = AnalysisResult::new(self.name(), self.category());
        let apps = ctx.directory.applications(ctx.cancel)?;
        ctx.check_cancelled()?;

        let mut tally = AppTally::default();
        for app in &apps {
            let findings = check_application(app, ctx, &mut tally);
            result.findings.extend(findings);
        }

        result.set_metric("total_applications", apps.len());
        result.set_metric("risky_applications", tally.risky);
        result.set_metric("expired_credentials", tally.expired);
        result.set_metric("expiring_credentials", tally.expiring);
        result.set_metric("high_privilege_applications", tally.high_privilege);
        result.set_metric("ownerless_applications", tally.ownerless);
        result.resources_analyzed = apps.len();

        Ok(finish(result, application_risk_score(apps.len(), tally.risky)))
    }

    fn analyze_limited(&self, ctx: &AnalysisContext<'_>) -> Result<AnalysisResult> {
        let mut result = AnalysisResult::new(self.name(), self.category());
        let web_apps: Vec<_> = ctx
            .resources
            .iter()
            .filter(|r| r.is_type(types::WEB_SITE))
            .collect();

        let mut without_identity = 0usize;
        for app in &web_apps {
            if app.managed_identity_type().is_some() {
                continue;
            }
            without_identity += 1;
            let kind = match app.kind.as_deref() {
                Some(k) if k.to_ascii_lowercase().contains("functionapp") => "Function app",
                _ => "Web app",
            };
            result.findings.push(Finding::for_resource(
                category::APPLICATION,
                app,
                Severity::Medium,
                format!("{} {} has no managed identity", kind, app.name),
                "Enable a system-assigned managed identity instead of storing secrets in app settings",
            ));
        }

        result.set_metric("web_apps", web_apps.len());
        result.set_metric("web_apps_without_identity", without_identity);
        result.resources_analyzed = web_apps.len();

        Ok(finish(result, application_risk_score(web_apps.len(), without_identity)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::testing::Fixture;
    use crate::models::{MetricValue, ResourceDescriptor};
    use crate::providers::{AppCredential, CredentialKind, DirectorySnapshot, NoDirectory, StaticDirectory};
    use serde_json::json;

    fn app(name: &str) -> AppRegistration {
        AppRegistration {
            id: format!("obj-{name}"),
            app_id: format!("app-{name}"),
            display_name: name.to_string(),
            owners: vec!["ann@contoso.com".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_enhanced_application_checks() {
        let fx = Fixture::new();
        let mut expired = app("billing");
        expired.credentials.push(AppCredential {
            kind: CredentialKind::Password,
            display_name: Some("ci".into()),
            end_date_time: Some(fx.days_ago(3)),
        });
        let mut expiring = app("portal");
        expiring.credentials.push(AppCredential {
            kind: CredentialKind::Certificate,
            display_name: None,
            end_date_time: Some(fx.days_ago(-10)),
        });
        expiring.owners.clear();
        let mut powerful = app("sync");
        powerful.permissions = vec!["directory.readwrite.all".into(), "User.Read.All".into()];
        let clean = app("reports");

        let directory = StaticDirectory::new(DirectorySnapshot {
            applications: Some(vec![expired, expiring, powerful, clean]),
            ..Default::default()
        });
        let result = ApplicationsAnalyzer::new()
            .analyze_enhanced(&fx.context(&[], &directory))
            .expect("applications");

        assert_eq!(result.metric("total_applications"), Some(&MetricValue::Integer(4)));
        assert_eq!(result.metric("risky_applications"), Some(&MetricValue::Integer(2)));
        assert_eq!(result.metric("ownerless_applications"), Some(&MetricValue::Integer(1)));
        assert_eq!(result.findings.len(), 4);
        // 100 - 2 * 0.5 * 100 = 0 before the penalty
        assert_eq!(result.metric("application_score"), Some(&MetricValue::Decimal(0.0)));
        assert_eq!(result.score, 0.0);
        assert!(result.findings[0].issue.contains("expired"));
        assert_eq!(result.findings[0].resource_id, "application:app-billing");
    }

    #[test]
    fn test_limited_checks_web_app_identities() {
        let fx = Fixture::new();
        let resources = vec![
            ResourceDescriptor::new("/r/web1", "web1", "Microsoft.Web/sites")
                .with_identity(json!({"type": "SystemAssigned"})),
            ResourceDescriptor::new("/r/func1", "func1", "Microsoft.Web/sites").with_kind("functionapp,linux"),
            ResourceDescriptor::new("/r/web2", "web2", "Microsoft.Web/sites"),
            ResourceDescriptor::new("/r/web3", "web3", "Microsoft.Web/sites")
                .with_identity(json!({"type": "UserAssigned"})),
        ];
        let result = ApplicationsAnalyzer::new()
            .analyze_limited(&fx.context(&resources, &NoDirectory))
            .expect("limited");

        assert_eq!(result.findings.len(), 2);
        assert!(result.findings[0].issue.starts_with("Function app func1"));
        assert_eq!(result.score, 0.0);
        assert_eq!(result.resources_analyzed, 4);
    }
}
