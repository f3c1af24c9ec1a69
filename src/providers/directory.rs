//! Identity directory collaborators
//!
//! The identity analyzers read applications, users, devices, role
//! assignments and conditional-access policies through [`DirectoryProvider`].
//! Each data set is gated by a [`Capability`]; the engine checks them once
//! per run and falls back to inventory-only analysis when one is missing.

use crate::error::ProviderError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// A directory data set an analyzer may need
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Applications,
    Users,
    Devices,
    RoleManagement,
    Policies,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::Applications,
        Capability::Users,
        Capability::Devices,
        Capability::RoleManagement,
        Capability::Policies,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Applications => "applications",
            Capability::Users => "users",
            Capability::Devices => "devices",
            Capability::RoleManagement => "role-management",
            Capability::Policies => "policies",
        }
    }

    /// Permission scope that grants this capability
    pub fn permission(&self) -> &'static str {
        match self {
            Capability::Applications => "Application.Read.All",
            Capability::Users => "User.Read.All",
            Capability::Devices => "Device.Read.All",
            Capability::RoleManagement => "RoleManagement.Read.Directory",
            Capability::Policies => "Policy.Read.All",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==================== Records ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    #[default]
    Password,
    Certificate,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppCredential {
    pub kind: CredentialKind,
    pub display_name: Option<String>,
    pub end_date_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppRegistration {
    pub id: String,
    pub app_id: String,
    pub display_name: String,
    pub owners: Vec<String>,
    pub credentials: Vec<AppCredential>,
    /// Requested application permissions, e.g. `Directory.ReadWrite.All`
    pub permissions: Vec<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryUser {
    pub id: String,
    #[serde(default)]
    pub user_principal_name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default = "default_true")]
    pub account_enabled: bool,
    #[serde(default)]
    pub is_guest: bool,
    /// `None` when registration details could not be read
    #[serde(default)]
    pub mfa_registered: Option<bool>,
    #[serde(default)]
    pub last_sign_in: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    /// Licences, app roles or group-based assignments still attached
    #[serde(default)]
    pub assignment_count: usize,
}

impl DirectoryUser {
    pub fn label(&self) -> &str {
        if self.user_principal_name.is_empty() {
            &self.display_name
        } else {
            &self.user_principal_name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Device {
    pub id: String,
    pub display_name: String,
    pub operating_system: String,
    pub is_compliant: Option<bool>,
    pub is_managed: Option<bool>,
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoleAssignment {
    pub id: String,
    pub principal_id: String,
    pub principal_name: String,
    /// `User`, `Group` or `ServicePrincipal`
    pub principal_type: String,
    pub is_guest: bool,
    /// Role definition id; either the bare GUID or a full resource id ending in it
    pub role_definition_id: String,
    pub role_name: String,
    pub scope: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConditionalAccessPolicy {
    pub id: String,
    pub display_name: String,
    /// `enabled`, `disabled` or `enabledForReportingButNotEnforced`
    pub state: String,
    pub include_users: Vec<String>,
    pub exclude_users: Vec<String>,
    pub include_roles: Vec<String>,
    pub client_app_types: Vec<String>,
    /// Built-in grant controls such as `mfa` or `block`
    pub grant_controls: Vec<String>,
    pub sign_in_risk_levels: Vec<String>,
    pub user_risk_levels: Vec<String>,
}

impl ConditionalAccessPolicy {
    pub fn is_enabled(&self) -> bool {
        self.state.eq_ignore_ascii_case("enabled")
    }

    pub fn targets_all_users(&self) -> bool {
        self.include_users.iter().any(|u| u.eq_ignore_ascii_case("all"))
    }

    pub fn has_grant(&self, control: &str) -> bool {
        self.grant_controls.iter().any(|c| c.eq_ignore_ascii_case(control))
    }
}

// ==================== Provider ====================

/// Read access to the identity directory.
///
/// Every call takes the run's cancellation token; implementations should
/// return [`ProviderError::Cancelled`] once it fires.
pub trait DirectoryProvider: Send + Sync {
    /// Whether the data set behind `capability` can be read
    fn has_capability(&self, capability: Capability) -> bool;

    fn applications(&self, cancel: &CancellationToken) -> Result<Vec<AppRegistration>, ProviderError>;

    fn users(&self, cancel: &CancellationToken) -> Result<Vec<DirectoryUser>, ProviderError>;

    fn devices(&self, cancel: &CancellationToken) -> Result<Vec<Device>, ProviderError>;

    fn role_assignments(&self, cancel: &CancellationToken) -> Result<Vec<RoleAssignment>, ProviderError>;

    fn conditional_access_policies(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ConditionalAccessPolicy>, ProviderError>;
}

/// Provider with no directory access; every analyzer runs limited
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDirectory;

impl DirectoryProvider for NoDirectory {
    fn has_capability(&self, _capability: Capability) -> bool {
        false
    }

    fn applications(&self, _cancel: &CancellationToken) -> Result<Vec<AppRegistration>, ProviderError> {
        Err(ProviderError::Unavailable(Capability::Applications.permission().into()))
    }

    fn users(&self, _cancel: &CancellationToken) -> Result<Vec<DirectoryUser>, ProviderError> {
        Err(ProviderError::Unavailable(Capability::Users.permission().into()))
    }

    fn devices(&self, _cancel: &CancellationToken) -> Result<Vec<Device>, ProviderError> {
        Err(ProviderError::Unavailable(Capability::Devices.permission().into()))
    }

    fn role_assignments(&self, _cancel: &CancellationToken) -> Result<Vec<RoleAssignment>, ProviderError> {
        Err(ProviderError::Unavailable(Capability::RoleManagement.permission().into()))
    }

    fn conditional_access_policies(
        &self,
        _cancel: &CancellationToken,
    ) -> Result<Vec<ConditionalAccessPolicy>, ProviderError> {
        Err(ProviderError::Unavailable(Capability::Policies.permission().into()))
    }
}

/// Directory snapshot; a section that is present grants its capability
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DirectorySnapshot {
    pub applications: Option<Vec<AppRegistration>>,
    pub users: Option<Vec<DirectoryUser>>,
    pub devices: Option<Vec<Device>>,
    pub role_assignments: Option<Vec<RoleAssignment>>,
    pub conditional_access_policies: Option<Vec<ConditionalAccessPolicy>>,
}

/// Provider serving a fixed [`DirectorySnapshot`]
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    snapshot: DirectorySnapshot,
}

impl StaticDirectory {
    pub fn new(snapshot: DirectorySnapshot) -> Self {
        Self { snapshot }
    }

    pub fn from_json(text: &str, origin: &str) -> Result<Self, ProviderError> {
        let snapshot = serde_json::from_str(text).map_err(|e| ProviderError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { snapshot })
    }

    pub fn from_path(path: &Path) -> Result<Self, ProviderError> {
        let path_label = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ProviderError::Io {
            path: path_label.clone(),
            source,
        })?;
        Self::from_json(&text, &path_label)
    }

    pub fn snapshot(&self) -> &DirectorySnapshot {
        &self.snapshot
    }
}

fn section<T: Clone>(
    data: &Option<Vec<T>>,
    capability: Capability,
    cancel: &CancellationToken,
) -> Result<Vec<T>, ProviderError> {
    if cancel.is_cancelled() {
        return Err(ProviderError::Cancelled);
    }
    data.clone()
        .ok_or_else(|| ProviderError::Unavailable(capability.permission().to_string()))
}

impl DirectoryProvider for StaticDirectory {
    fn has_capability(&self, capability: Capability) -> bool {
        match capability {
            Capability::Applications => self.snapshot.applications.is_some(),
            Capability::Users => self.snapshot.users.is_some(),
            Capability::Devices => self.snapshot.devices.is_some(),
            Capability::RoleManagement => self.snapshot.role_assignments.is_some(),
            Capability::Policies => self.snapshot.conditional_access_policies.is_some(),
        }
    }

    fn applications(&self, cancel: &CancellationToken) -> Result<Vec<AppRegistration>, ProviderError> {
        section(&self.snapshot.applications, Capability::Applications, cancel)
    }

    fn users(&self, cancel: &CancellationToken) -> Result<Vec<DirectoryUser>, ProviderError> {
        section(&self.snapshot.users, Capability::Users, cancel)
    }

    fn devices(&self, cancel: &CancellationToken) -> Result<Vec<Device>, ProviderError> {
        section(&self.snapshot.devices, Capability::Devices, cancel)
    }

    fn role_assignments(&self, cancel: &CancellationToken) -> Result<Vec<RoleAssignment>, ProviderError> {
        section(&self.snapshot.role_assignments, Capability::RoleManagement, cancel)
    }

    fn conditional_access_policies(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ConditionalAccessPolicy>, ProviderError> {
        section(
            &self.snapshot.conditional_access_policies,
            Capability::Policies,
            cancel,
        )
    }
}
