//! User and device hygiene analyzer

use crate::analyzers::base::{finish, AnalysisContext, Analyzer};
use crate::graph::types;
use crate::models::{AnalysisResult, Finding, Severity};
use crate::providers::{Capability, Device, DirectoryUser};
use crate::scoring::{category, user_device_score};
use anyhow::Result;

pub struct UsersAnalyzer;

impl UsersAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UsersAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn user_finding(user: &DirectoryUser, severity: Severity, issue: String, recommendation: &str) -> Finding {
    Finding::new(
        category::USER_DEVICE,
        format!("user:{}", user.id),
        user.label(),
        severity,
        issue,
        recommendation,
    )
}

fn device_finding(device: &Device, severity: Severity, issue: String, recommendation: &str) -> Finding {
    Finding::new(
        category::USER_DEVICE,
        format!("device:{}", device.id),
        device.display_name.as_str(),
        severity,
        issue,
        recommendation,
    )
}

impl Analyzer for UsersAnalyzer {
    fn name(&self) -> &'static str {
        "identity-users"
    }

    fn category(&self) -> &'static str {
        category::USER_DEVICE
    }

    fn description(&self) -> &'static str {
        "Checks MFA registration, disabled accounts and device compliance"
    }

    fn required_capabilities(&self) -> &'static [Capability] {
        &[Capability::Users, Capability::Devices]
    }

    fn analyze_enhanced(&self, ctx: &AnalysisContext<'_>) -> Result<AnalysisResult> {
        let mut result = AnalysisResult::new(self.name(), self.category());

        let users = ctx.directory.users(ctx.cancel)?;
        ctx.check_cancelled()?;
        let devices = ctx.directory.devices(ctx.cancel)?;
        ctx.check_cancelled()?;

        let mut without_mfa = 0usize;
        let mut disabled_assigned = 0usize;
        for user in &users {
            if user.account_enabled && user.mfa_registered == Some(false) {
                without_mfa += 1;
                let who = if user.is_guest { "Guest user" } else { "User" };
                result.findings.push(user_finding(
                    user,
                    Severity::High,
                    format!("{} {} has no MFA method registered", who, user.label()),
                    "Require MFA registration through a conditional access policy",
                ));
            }
            if !user.account_enabled && user.assignment_count > 0 {
                disabled_assigned += 1;
                result.findings.push(user_finding(
                    user,
                    Severity::Medium,
                    format!(
                        "Disabled account {} still holds {} assignments",
                        user.label(),
                        user.assignment_count
                    ),
                    "Remove licences and role or group assignments from disabled accounts",
                ));
            }
        }

        let stale_after = i64::from(ctx.config.identity.stale_after_days);
        let (mut noncompliant, mut unmanaged, mut stale) = (0usize, 0usize, 0usize);
        for device in &devices {
            if device.is_compliant == Some(false) {
                noncompliant += 1;
                result.findings.push(device_finding(
                    device,
                    Severity::Medium,
                    format!("Device {} is not compliant", device.display_name),
                    "Bring the device back into compliance or block its access",
                ));
            }
            if device.is_managed == Some(false) {
                unmanaged += 1;
                result.findings.push(device_finding(
                    device,
                    Severity::Low,
                    format!("Device {} is not managed", device.display_name),
                    "Enroll the device in device management",
                ));
            }
            if let Some(seen) = device.last_seen {
                let days = ctx.days_since(seen);
                if days > stale_after {
                    stale += 1;
                    result.findings.push(device_finding(
                        device,
                        Severity::Low,
                        format!("Device {} has not been seen for {} days", device.display_name, days),
                        "Remove devices that are no longer in use",
                    ));
                }
            }
        }

        result.set_metric("total_users", users.len());
        result.set_metric("users_without_mfa", without_mfa);
        result.set_metric("disabled_with_assignments", disabled_assigned);
        result.set_metric("total_devices", devices.len());
        result.set_metric("noncompliant_devices", noncompliant);
        result.set_metric("unmanaged_devices", unmanaged);
        result.set_metric("stale_devices", stale);
        result.resources_analyzed = users.len() + devices.len();

        let issues = result.findings.len();
        Ok(finish(result, user_device_score(issues)))
    }

    fn analyze_limited(&self, ctx: &AnalysisContext<'_>) -> Result<AnalysisResult> {
        let mut result = AnalysisResult::new(self.name(), self.category());
        let mut linux_vms = 0usize;

        for vm in ctx.resources.iter().filter(|r| r.is_type(types::VIRTUAL_MACHINE)) {
            let linux = &vm.properties;
            if linux.pointer("/osProfile/linuxConfiguration").is_none() {
                continue;
            }
            linux_vms += 1;
            if linux.bool_at("/osProfile/linuxConfiguration/disablePasswordAuthentication") == Some(false) {
                result.findings.push(Finding::for_resource(
                    category::USER_DEVICE,
                    vm,
                    Severity::High,
                    format!("Linux VM {} allows password authentication", vm.name),
                    "Disable password authentication and use SSH keys or Entra ID login",
                ));
            }
        }

        result.set_metric("linux_vms", linux_vms);
        result.set_metric("password_auth_vms", result.findings.len());
        result.resources_analyzed = linux_vms;

        let issues = result.findings.len();
        Ok(finish(result, user_device_score(issues)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::testing::Fixture;
    use crate::models::{MetricValue, ResourceDescriptor};
    use crate::providers::{DirectorySnapshot, NoDirectory, StaticDirectory};
    use serde_json::json;

    fn user(id: &str, enabled: bool, mfa: Option<bool>, assignments: usize) -> DirectoryUser {
        DirectoryUser {
            id: id.to_string(),
            user_principal_name: format!("{id}@contoso.com"),
            display_name: id.to_string(),
            account_enabled: enabled,
            is_guest: false,
            mfa_registered: mfa,
            last_sign_in: None,
            created: None,
            assignment_count: assignments,
        }
    }

    #[test]
    fn test_users_and_devices() {
        let fx = Fixture::new();
        let directory = StaticDirectory::new(DirectorySnapshot {
            users: Some(vec![
                user("ann", true, Some(true), 1),
                user("bob", true, Some(false), 1),
                user("cid", false, Some(false), 2),
                user("dee", true, None, 0),
            ]),
            devices: Some(vec![
                Device {
                    id: "d1".into(),
                    display_name: "laptop-1".into(),
                    is_compliant: Some(false),
                    is_managed: Some(true),
                    last_seen: Some(fx.days_ago(200)),
                    ..Default::default()
                },
                Device {
                    id: "d2".into(),
                    display_name: "laptop-2".into(),
                    is_compliant: Some(true),
                    is_managed: Some(true),
                    last_seen: Some(fx.days_ago(1)),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        });

        let result = UsersAnalyzer::new()
            .analyze_enhanced(&fx.context(&[], &directory))
            .expect("users");

        // bob without MFA, cid disabled but assigned, d1 non-compliant and stale
        assert_eq!(result.findings.len(), 4);
        assert_eq!(result.metric("users_without_mfa"), Some(&MetricValue::Integer(1)));
        assert_eq!(result.metric("stale_devices"), Some(&MetricValue::Integer(1)));
        assert_eq!(result.metric("user_device_score"), Some(&MetricValue::Decimal(80.0)));
        assert_eq!(result.score, 72.0);
        assert_eq!(result.resources_analyzed, 6);
    }

    #[test]
    fn test_limited_checks_linux_password_auth() {
        let fx = Fixture::new();
        let vm = |name: &str, disable: bool| {
            ResourceDescriptor::new(&format!("/r/{name}"), name, "Microsoft.Compute/virtualMachines")
                .with_properties(json!({
                    "osProfile": {"linuxConfiguration": {"disablePasswordAuthentication": disable}}
                }))
        };
        let resources = vec![
            vm("lin-01", false),
            vm("lin-02", true),
            ResourceDescriptor::new("/r/win", "win-01", "Microsoft.Compute/virtualMachines")
                .with_properties(json!({"osProfile": {"windowsConfiguration": {}}})),
        ];
        let result = UsersAnalyzer::new()
            .analyze_limited(&fx.context(&resources, &NoDirectory))
            .expect("limited");

        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].resource_name, "lin-01");
        assert_eq!(result.resources_analyzed, 2);
        assert_eq!(result.score, 87.0);
    }
}
