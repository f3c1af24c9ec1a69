//! Governance scoring
//!
//! Converts findings and counts into a 0-100 score per category.
//!
//! # Scoring Formula
//!
//! ```text
//! Category = round2(clamp(base − 15 × critical − 8 × high, 0, 100))
//!
//! Where base is the category's degradation formula:
//!   application-risk   = max(0, 100 − 2 × riskyRatio × 100)
//!   user/device        = max(0, 100 − 5 × issues)
//!   rbac               = max(0, 100 − 10 × overprivileged)
//!   conditional-access = coverage %, or 50 with no policies
//!   naming / tagging   = compliant %
//!   dependencies       = max(0, 100 − 10 × mixing − 2 × exposed − orphans)
//!   stale identities   = max(0, 100 − 5 × stale)
//!
//! Composite = penalty applied once to Σ weight × <category>_score
//! ```
//!
//! # Example
//!
//! Two Critical and three High findings on a clean base:
//! 100 − 2 × 15 − 3 × 8 = 46

mod formulas;

pub use formulas::{
    application_risk_score, conditional_access_score, dependencies_score, naming_score,
    rbac_score, stale_identity_score, tagging_score, user_device_score, NEUTRAL_SCORE,
};

use crate::error::ConfigError;
use crate::models::{Finding, MetricValue, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const CRITICAL_PENALTY: f64 = 15.0;
pub const HIGH_PENALTY: f64 = 8.0;

/// Tolerance when checking that weights sum to 1
const WEIGHT_TOLERANCE: f64 = 0.001;

/// Scoring categories, also used as finding categories and weight keys
pub mod category {
    pub const NAMING: &str = "naming";
    pub const TAGGING: &str = "tagging";
    pub const DEPENDENCIES: &str = "dependencies";
    pub const APPLICATION: &str = "application";
    pub const USER_DEVICE: &str = "user_device";
    pub const RBAC: &str = "rbac";
    pub const CONDITIONAL_ACCESS: &str = "conditional_access";
    pub const STALE_IDENTITY: &str = "stale_identity";
}

/// Metric key under which an analyzer publishes its base score
pub fn score_key(category: &str) -> String {
    format!("{}_score", category)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn severity_penalty(critical: usize, high: usize) -> f64 {
    CRITICAL_PENALTY * critical as f64 + HIGH_PENALTY * high as f64
}

/// Apply the severity penalty for `findings`, clamp and round
pub fn finalize(base: f64, findings: &[Finding]) -> f64 {
    let critical = findings
        .iter()
        .filter(|f| f.severity == Severity::Critical)
        .count();
    let high = findings.iter().filter(|f| f.severity == Severity::High).count();
    finalize_counts(base, critical, high)
}

pub fn finalize_counts(base: f64, critical: usize, high: usize) -> f64 {
    let score = base - severity_penalty(critical, high);
    if score.is_nan() {
        return 0.0;
    }
    round2(score.clamp(0.0, 100.0))
}

/// Category → weight map for a composite score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositeWeights(pub BTreeMap<String, f64>);

impl CompositeWeights {
    pub fn new(entries: &[(&str, f64)]) -> Self {
        Self(entries.iter().map(|(k, w)| (k.to_string(), *w)).collect())
    }

    /// application 0.25, user/device 0.25, rbac 0.30, conditional access 0.20
    pub fn identity_full() -> Self {
        Self::new(&[
            (category::APPLICATION, 0.25),
            (category::USER_DEVICE, 0.25),
            (category::RBAC, 0.30),
            (category::CONDITIONAL_ACCESS, 0.20),
        ])
    }

    pub fn full() -> Self {
        Self::new(&[
            (category::NAMING, 0.20),
            (category::TAGGING, 0.20),
            (category::DEPENDENCIES, 0.20),
            (category::APPLICATION, 0.10),
            (category::USER_DEVICE, 0.10),
            (category::RBAC, 0.12),
            (category::CONDITIONAL_ACCESS, 0.08),
        ])
    }

    /// Full weight on one category
    pub fn single(category: &str) -> Self {
        Self::new(&[(category, 1.0)])
    }

    pub fn sum(&self) -> f64 {
        self.0.values().sum()
    }

    /// Validate that weights sum to 1.0 (with tolerance)
    pub fn is_valid(&self) -> bool {
        (self.sum() - 1.0).abs() < WEIGHT_TOLERANCE && self.0.values().all(|w| *w >= 0.0)
    }

    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if let Some((category, _)) = self.0.iter().find(|(_, w)| **w < 0.0) {
            return Err(ConfigError::NegativeWeight(category.clone()));
        }
        let sum = self.sum();
        if (sum - 1.0).abs() >= WEIGHT_TOLERANCE {
            return Err(ConfigError::InvalidWeights {
                name: name.to_string(),
                sum,
            });
        }
        Ok(())
    }

    /// Normalize weights to sum to 1.0
    pub fn normalize(&mut self) {
        let sum = self.sum();
        if sum > 0.0 {
            for w in self.0.values_mut() {
                *w /= sum;
            }
        }
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Weighted sum of published `<category>_score` metrics; missing keys count as 0
pub fn weighted_base(metrics: &BTreeMap<String, MetricValue>, weights: &CompositeWeights) -> f64 {
    weights
        .0
        .iter()
        .map(|(category, weight)| {
            let sub = metrics
                .get(&score_key(category))
                .and_then(MetricValue::as_f64)
                .unwrap_or(0.0);
            weight * sub
        })
        .sum()
}

/// Composite score: weighted sub-scores, then the severity penalty over all findings
pub fn composite_score(
    metrics: &BTreeMap<String, MetricValue>,
    weights: &CompositeWeights,
    findings: &[Finding],
) -> f64 {
    finalize(weighted_base(metrics, weights), findings)
}
