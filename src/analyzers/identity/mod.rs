//! Identity governance analyzers
//!
//! Each analyzer has an enhanced variant reading the identity directory and
//! a limited variant that only looks at the resource inventory.

mod applications;
mod conditional_access;
mod rbac;
mod stale;
mod users;

pub use applications::ApplicationsAnalyzer;
pub use conditional_access::{baseline_coverage, BaselineControl, ConditionalAccessAnalyzer};
pub use rbac::{scope_level, RbacAnalyzer, ScopeLevel};
pub use stale::StaleIdentityAnalyzer;
pub use users::UsersAnalyzer;

/// Built-in role definition ids
pub mod roles {
    pub const OWNER: &str = "8e3af657-a8ff-443c-a75c-2fe8c4bcb635";
    pub const CONTRIBUTOR: &str = "b24988ac-6180-42a0-ab88-20f7382dd24c";
    pub const USER_ACCESS_ADMINISTRATOR: &str = "18d7d88d-d35e-4fb5-a5c3-7773c20a72d9";

    pub const PRIVILEGED: &[(&str, &str)] = &[
        (OWNER, "Owner"),
        (CONTRIBUTOR, "Contributor"),
        (USER_ACCESS_ADMINISTRATOR, "User Access Administrator"),
    ];
}

/// Display name of a privileged built-in role, matched on the trailing id
/// segment of `role_definition_id` or on the role name
pub fn privileged_role(role_definition_id: &str, role_name: &str) -> Option<&'static str> {
    let guid = role_definition_id
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(role_definition_id);
    roles::PRIVILEGED
        .iter()
        .find(|(id, name)| id.eq_ignore_ascii_case(guid) || name.eq_ignore_ascii_case(role_name))
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privileged_role_lookup() {
        assert_eq!(
            privileged_role(
                "/subscriptions/s1/providers/Microsoft.Authorization/roleDefinitions/8E3AF657-A8FF-443C-A75C-2FE8C4BCB635",
                ""
            ),
            Some("Owner")
        );
        assert_eq!(privileged_role("", "contributor"), Some("Contributor"));
        assert_eq!(privileged_role("acdd72a7-3385-48ef-bd42-f606fba81ae7", "Reader"), None);
    }
}
