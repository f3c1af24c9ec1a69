//! Per-category degradation formulas
//!
//! Each returns a base score in [0, 100] before the severity penalty is
//! applied by [`super::finalize`].

/// Score when a category has no data to judge
pub const NEUTRAL_SCORE: f64 = 50.0;

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// `max(0, 100 − 2 × riskyRatio × 100)`; no apps ⇒ 100
pub fn application_risk_score(total_apps: usize, risky_apps: usize) -> f64 {
    if total_apps == 0 {
        return 100.0;
    }
    let ratio = risky_apps as f64 / total_apps as f64;
    (100.0 - 2.0 * ratio * 100.0).max(0.0)
}

/// `max(0, 100 − 5 × issues)`
pub fn user_device_score(issue_count: usize) -> f64 {
    (100.0 - 5.0 * issue_count as f64).max(0.0)
}

/// `max(0, 100 − 10 × overprivileged)`
pub fn rbac_score(overprivileged: usize) -> f64 {
    (100.0 - 10.0 * overprivileged as f64).max(0.0)
}

/// Coverage percentage, or neutral 50 when no policies were retrieved
pub fn conditional_access_score(policy_count: usize, covered_controls: usize, total_controls: usize) -> f64 {
    if policy_count == 0 || total_controls == 0 {
        return NEUTRAL_SCORE;
    }
    percentage(covered_controls, total_controls)
}

/// Share of compliant names; empty ⇒ 100
pub fn naming_score(compliant: usize, total: usize) -> f64 {
    percentage(compliant, total)
}

/// Share of fully tagged resources; empty ⇒ 100
pub fn tagging_score(fully_tagged: usize, total: usize) -> f64 {
    percentage(fully_tagged, total)
}

/// `max(0, 100 − 10 × mixing − 2 × exposedVms − 1 × orphans)`
pub fn dependencies_score(mixing_findings: usize, exposed_vms: usize, orphans: usize) -> f64 {
    (100.0 - 10.0 * mixing_findings as f64 - 2.0 * exposed_vms as f64 - orphans as f64).max(0.0)
}

/// `max(0, 100 − 5 × stale)`
pub fn stale_identity_score(stale: usize) -> f64 {
    (100.0 - 5.0 * stale as f64).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_risk() {
        assert_eq!(application_risk_score(0, 0), 100.0);
        assert_eq!(application_risk_score(10, 1), 80.0);
        assert_eq!(application_risk_score(4, 3), 0.0);
    }

    #[test]
    fn test_linear_formulas_floor_at_zero() {
        assert_eq!(user_device_score(3), 85.0);
        assert_eq!(user_device_score(40), 0.0);
        assert_eq!(rbac_score(2), 80.0);
        assert_eq!(rbac_score(11), 0.0);
        assert_eq!(stale_identity_score(4), 80.0);
        assert_eq!(dependencies_score(1, 2, 3), 83.0);
        assert_eq!(dependencies_score(20, 0, 0), 0.0);
    }

    #[test]
    fn test_conditional_access_without_policies_is_neutral() {
        assert_eq!(conditional_access_score(0, 0, 4), 50.0);
        assert_eq!(conditional_access_score(3, 3, 4), 75.0);
    }

    #[test]
    fn test_percentages() {
        assert_eq!(naming_score(0, 0), 100.0);
        assert_eq!(naming_score(1, 4), 25.0);
        assert_eq!(tagging_score(3, 3), 100.0);
    }
}
