//! Conditional access coverage analyzer
//!
//! Coverage is measured against four baseline controls. Only enabled
//! policies count; report-only and disabled policies are reported but do
//! not cover anything.

use crate::analyzers::base::{finish, AnalysisContext, Analyzer};
use crate::models::{AnalysisResult, Finding, Severity};
use crate::providers::{Capability, ConditionalAccessPolicy};
use crate::scoring::{category, conditional_access_score, NEUTRAL_SCORE};
use anyhow::Result;

const LEGACY_CLIENT_APP_TYPES: &[&str] = &["exchangeActiveSync", "other"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineControl {
    MfaAllUsers,
    MfaAdmins,
    BlockLegacyAuth,
    RiskBased,
}

impl BaselineControl {
    pub const ALL: [BaselineControl; 4] = [
        BaselineControl::MfaAllUsers,
        BaselineControl::MfaAdmins,
        BaselineControl::BlockLegacyAuth,
        BaselineControl::RiskBased,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BaselineControl::MfaAllUsers => "mfa_all_users",
            BaselineControl::MfaAdmins => "mfa_admins",
            BaselineControl::BlockLegacyAuth => "block_legacy_auth",
            BaselineControl::RiskBased => "risk_based",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            BaselineControl::MfaAllUsers => "MFA required for all users",
            BaselineControl::MfaAdmins => "MFA required for administrator roles",
            BaselineControl::BlockLegacyAuth => "legacy authentication blocked",
            BaselineControl::RiskBased => "sign-in or user risk policy",
        }
    }

    fn severity_when_missing(&self) -> Severity {
        match self {
            BaselineControl::MfaAllUsers | BaselineControl::MfaAdmins => Severity::High,
            BaselineControl::BlockLegacyAuth | BaselineControl::RiskBased => Severity::Medium,
        }
    }

    fn covered_by(&self, policy: &ConditionalAccessPolicy) -> bool {
        if !policy.is_enabled() {
            return false;
        }
        match self {
            BaselineControl::MfaAllUsers => policy.targets_all_users() && policy.has_grant("mfa"),
            BaselineControl::MfaAdmins => {
                (policy.targets_all_users() || !policy.include_roles.is_empty())
                    && policy.has_grant("mfa")
            }
            BaselineControl::BlockLegacyAuth => {
                policy.has_grant("block")
                    && policy.client_app_types.iter().any(|t| {
                        LEGACY_CLIENT_APP_TYPES
                            .iter()
                            .any(|l| l.eq_ignore_ascii_case(t))
                    })
            }
            BaselineControl::RiskBased => {
                !policy.sign_in_risk_levels.is_empty() || !policy.user_risk_levels.is_empty()
            }
        }
    }
}

/// Each baseline control paired with whether an enabled policy covers it
pub fn baseline_coverage(policies: &[ConditionalAccessPolicy]) -> Vec<(BaselineControl, bool)> {
    BaselineControl::ALL
        .iter()
        .map(|c| (*c, policies.iter().any(|p| c.covered_by(p))))
        .collect()
}

pub struct ConditionalAccessAnalyzer;

impl ConditionalAccessAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConditionalAccessAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for ConditionalAccessAnalyzer {
    fn name(&self) -> &'static str {
        "identity-conditional-access"
    }

    fn category(&self) -> &'static str {
        category::CONDITIONAL_ACCESS
    }

    fn description(&self) -> &'static str {
        "Measures conditional access coverage of the baseline controls"
    }

    fn required_capabilities(&self) -> &'static [Capability] {
        &[Capability::Policies]
    }

    fn analyze_enhanced(&self, ctx: &AnalysisContext<'_>) -> Result<AnalysisResult> {
        let mut result = AnalysisResult::new(self.name(), self.category());
        let policies = ctx.directory.conditional_access_policies(ctx.cancel)?;
        ctx.check_cancelled()?;

        result.set_metric("total_policies", policies.len());
        result.resources_analyzed = policies.len();

        if policies.is_empty() {
            result.findings.push(Finding::new(
                category::CONDITIONAL_ACCESS,
                "conditional-access",
                "Conditional access",
                Severity::Medium,
                "No conditional access policies are defined",
                "Start with the baseline: MFA for all users and admins, block legacy authentication, risk-based sign-in policies",
            ));
            result.set_metric("covered_controls", 0usize);
            return Ok(finish(result, NEUTRAL_SCORE));
        }

        for policy in policies.iter().filter(|p| !p.is_enabled()) {
            result.findings.push(Finding::new(
                category::CONDITIONAL_ACCESS,
                format!("conditional-access-policy:{}", policy.id),
                policy.display_name.as_str(),
                Severity::Low,
                format!("Policy {} is not enforced (state: {})", policy.display_name, policy.state),
                "Enable the policy once its report-only results have been reviewed, or delete it",
            ));
        }

        let coverage = baseline_coverage(&policies);
        let mut covered = 0usize;
        for (control, is_covered) in &coverage {
            result.set_metric(format!("control_{}", control.as_str()), *is_covered);
            if *is_covered {
                covered += 1;
                continue;
            }
            result.findings.push(Finding::new(
                category::CONDITIONAL_ACCESS,
                format!("conditional-access:{}", control.as_str()),
                control.description(),
                control.severity_when_missing(),
                format!("No enabled policy provides {}", control.description()),
                format!("Create a conditional access policy for {}", control.description()),
            ));
        }

        result.set_metric(
            "enabled_policies",
            policies.iter().filter(|p| p.is_enabled()).count(),
        );
        result.set_metric("covered_controls", covered);

        let base = conditional_access_score(policies.len(), covered, coverage.len());
        Ok(finish(result, base))
    }

    fn analyze_limited(&self, _ctx: &AnalysisContext<'_>) -> Result<AnalysisResult> {
        let result = AnalysisResult::new(self.name(), self.category());
        Ok(finish(result, NEUTRAL_SCORE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::testing::Fixture;
    use crate::models::MetricValue;
    use crate::providers::{DirectorySnapshot, NoDirectory, StaticDirectory};

    fn policy(name: &str, state: &str) -> ConditionalAccessPolicy {
        ConditionalAccessPolicy {
            id: name.to_string(),
            display_name: name.to_string(),
            state: state.to_string(),
            ..Default::default()
        }
    }

    fn run(policies: Vec<ConditionalAccessPolicy>) -> AnalysisResult {
        let fx = Fixture::new();
        let directory = StaticDirectory::new(DirectorySnapshot {
            conditional_access_policies: Some(policies),
            ..Default::default()
        });
        ConditionalAccessAnalyzer::new()
            .analyze_enhanced(&fx.context(&[], &directory))
            .expect("conditional access")
    }

    #[test]
    fn test_no_policies_is_neutral() {
        let result = run(Vec::new());
        assert_eq!(result.score, 50.0);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].severity, Severity::Medium);
    }

    #[test]
    fn test_limited_is_neutral() {
        let fx = Fixture::new();
        let result = ConditionalAccessAnalyzer::new()
            .analyze_limited(&fx.context(&[], &NoDirectory))
            .expect("limited");
        assert_eq!(result.score, 50.0);
        assert_eq!(result.metric("conditional_access_score"), Some(&MetricValue::Decimal(50.0)));
    }

    #[test]
    fn test_coverage() {
        let mut mfa_all = policy("mfa-all", "enabled");
        mfa_all.include_users = vec!["All".into()];
        mfa_all.grant_controls = vec!["mfa".into()];

        let mut legacy = policy("legacy", "enabled");
        legacy.include_users = vec!["All".into()];
        legacy.client_app_types = vec!["exchangeActiveSync".into(), "other".into()];
        legacy.grant_controls = vec!["block".into()];

        let mut risk = policy("risk", "enabledForReportingButNotEnforced");
        risk.sign_in_risk_levels = vec!["high".into()];

        let result = run(vec![mfa_all, legacy, risk]);

        // MFA for everyone also covers admins; the risk policy is report-only
        assert_eq!(result.metric("covered_controls"), Some(&MetricValue::Integer(3)));
        assert_eq!(result.metric("control_risk_based"), Some(&MetricValue::Flag(false)));
        assert_eq!(result.findings.len(), 2);
        assert_eq!(result.score, 75.0);
    }

    #[test]
    fn test_missing_mfa_is_high() {
        let mut risk = policy("risk", "enabled");
        risk.user_risk_levels = vec!["high".into()];
        let result = run(vec![risk]);

        assert_eq!(result.metric("covered_controls"), Some(&MetricValue::Integer(1)));
        // 25 - 2 * 8
        assert_eq!(result.score, 9.0);
    }
}
