//! Core data models for cloudgov
//!
//! These models are shared by the filter, classifier, graph builder,
//! analyzers and scoring code.

mod resource;

pub use resource::{PropertyBlob, ResourceDescriptor};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Generate a deterministic finding ID based on content hash.
///
/// The same category, resource and issue always produce the same ID, so
/// findings can be tracked across runs by the persistence layer.
pub fn deterministic_finding_id(category: &str, resource_id: &str, issue: &str) -> String {
    let input = format!("{category}\n{resource_id}\n{issue}");
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().take(8).map(|b| format!("{:02x}", b)).collect()
}

/// Severity levels for findings
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("unknown severity '{}'", other)),
        }
    }
}

/// One detected governance issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub resource_id: String,
    #[serde(default)]
    pub resource_name: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub issue: String,
    #[serde(default)]
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_effort: Option<String>,
}

impl Finding {
    pub fn new(
        category: impl Into<String>,
        resource_id: impl Into<String>,
        resource_name: impl Into<String>,
        severity: Severity,
        issue: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        let category = category.into();
        let resource_id = resource_id.into();
        let issue = issue.into();
        Self {
            id: deterministic_finding_id(&category, &resource_id, &issue),
            category,
            resource_id,
            resource_name: resource_name.into(),
            severity,
            issue,
            recommendation: recommendation.into(),
            estimated_effort: None,
        }
    }

    /// Finding about a single resource
    pub fn for_resource(
        category: &str,
        resource: &ResourceDescriptor,
        severity: Severity,
        issue: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self::new(
            category,
            resource.id.as_str(),
            resource.name.as_str(),
            severity,
            issue,
            recommendation,
        )
    }

    pub fn with_effort(mut self, effort: impl Into<String>) -> Self {
        self.estimated_effort = Some(effort.into());
        self
    }
}

/// Summary of findings by severity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingsSummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub total: usize,
}

impl FindingsSummary {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut summary = Self::default();
        for f in findings {
            match f.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
            }
            summary.total += 1;
        }
        summary
    }
}

/// A value in an analyzer's detailed metrics map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Integer(i64),
    Decimal(f64),
    Flag(bool),
    Text(String),
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Integer(v) => Some(*v as f64),
            MetricValue::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetricValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetricValue::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::Integer(v)
    }
}

impl From<usize> for MetricValue {
    fn from(v: usize) -> Self {
        MetricValue::Integer(v as i64)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Decimal(v)
    }
}

impl From<bool> for MetricValue {
    fn from(v: bool) -> Self {
        MetricValue::Flag(v)
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        MetricValue::Text(v.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(v: String) -> Self {
        MetricValue::Text(v)
    }
}

/// How an analyzer ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Full analysis with the enhanced data source
    Enhanced,
    /// Best-effort analysis from the resource inventory only
    #[default]
    Limited,
    /// The analyzer failed and contributed a zero score
    Failed,
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisMode::Enhanced => write!(f, "enhanced"),
            AnalysisMode::Limited => write!(f, "limited"),
            AnalysisMode::Failed => write!(f, "failed"),
        }
    }
}

/// Result of one category analyzer
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub analyzer: String,
    pub category: String,
    pub mode: AnalysisMode,
    /// Final score in [0, 100], rounded to 2 decimals
    pub score: f64,
    pub findings: Vec<Finding>,
    pub detailed_metrics: BTreeMap<String, MetricValue>,
    /// Headline metric merged with `max`
    pub resources_analyzed: usize,
    /// Headline metric merged with `sum`
    pub issues_found: usize,
    #[serde(default)]
    pub duration_ms: u64,
}

impl AnalysisResult {
    pub fn new(analyzer: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            analyzer: analyzer.into(),
            category: category.into(),
            ..Default::default()
        }
    }

    /// Zero-score result carrying one error finding
    pub fn failed(
        analyzer: impl Into<String>,
        category: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        let analyzer = analyzer.into();
        let category = category.into();
        let message = message.into();
        let finding = Finding::new(
            category.as_str(),
            format!("analyzer:{}", analyzer),
            analyzer.as_str(),
            severity,
            format!("Analyzer {} did not complete: {}", analyzer, message),
            "Review the analyzer logs and re-run the assessment once the cause is resolved",
        );
        Self {
            analyzer,
            category,
            mode: AnalysisMode::Failed,
            score: 0.0,
            findings: vec![finding],
            detailed_metrics: BTreeMap::new(),
            resources_analyzed: 0,
            issues_found: 1,
            duration_ms: 0,
        }
    }

    pub fn set_metric(&mut self, key: impl Into<String>, value: impl Into<MetricValue>) {
        self.detailed_metrics.insert(key.into(), value.into());
    }

    pub fn with_metric(mut self, key: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        self.set_metric(key, value);
        self
    }

    pub fn metric(&self, key: &str) -> Option<&MetricValue> {
        self.detailed_metrics.get(key)
    }

    pub fn summary(&self) -> FindingsSummary {
        FindingsSummary::from_findings(&self.findings)
    }
}

/// Letter grade for a 0-100 score
pub fn grade_from_score(score: f64) -> String {
    match score {
        s if s >= 90.0 => "A".to_string(),
        s if s >= 80.0 => "B".to_string(),
        s if s >= 70.0 => "C".to_string(),
        s if s >= 60.0 => "D".to_string(),
        _ => "F".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finding_id_is_stable() {
        let a = Finding::new("naming", "/r/1", "vm1", Severity::Low, "bad name", "rename");
        let b = Finding::new("naming", "/r/1", "vm1", Severity::High, "bad name", "other");
        assert_eq!(a.id, b.id);
        assert_eq!(a.id.len(), 16);

        let c = Finding::new("naming", "/r/2", "vm1", Severity::Low, "bad name", "rename");
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn test_severity_ordering_and_parse() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Medium > Severity::Low);
        assert_eq!("HIGH".parse::<Severity>(), Ok(Severity::High));
        assert!("info".parse::<Severity>().is_err());
    }

    #[test]
    fn test_findings_summary() {
        let findings = vec![
            Finding::new("c", "a", "a", Severity::Critical, "x", "y"),
            Finding::new("c", "b", "b", Severity::High, "x", "y"),
            Finding::new("c", "c", "c", Severity::High, "x", "y"),
            Finding::new("c", "d", "d", Severity::Low, "x", "y"),
        ];
        let summary = FindingsSummary::from_findings(&findings);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.high, 2);
        assert_eq!(summary.medium, 0);
        assert_eq!(summary.low, 1);
        assert_eq!(summary.total, 4);
    }

    #[test]
    fn test_metric_value_untagged_roundtrip() {
        let mut metrics = BTreeMap::new();
        metrics.insert("count".to_string(), MetricValue::from(3usize));
        metrics.insert("rate".to_string(), MetricValue::from(0.5));
        metrics.insert("pattern".to_string(), MetricValue::from("kebab-case"));

        let json = serde_json::to_string(&metrics).expect("serialize");
        let back: BTreeMap<String, MetricValue> = serde_json::from_str(&json).expect("parse");
        assert_eq!(back.get("count"), Some(&MetricValue::Integer(3)));
        assert_eq!(back.get("rate"), Some(&MetricValue::Decimal(0.5)));
        assert_eq!(back.get("pattern").and_then(|v| v.as_str()), Some("kebab-case"));
    }

    #[test]
    fn test_failed_result_has_zero_score_and_one_finding() {
        let result = AnalysisResult::failed("RbacAnalyzer", "rbac", Severity::High, "boom");
        assert_eq!(result.score, 0.0);
        assert_eq!(result.mode, AnalysisMode::Failed);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].severity, Severity::High);
        assert!(result.findings[0].issue.contains("boom"));
    }

    #[test]
    fn test_grade_from_score() {
        assert_eq!(grade_from_score(95.0), "A");
        assert_eq!(grade_from_score(80.0), "B");
        assert_eq!(grade_from_score(46.0), "F");
    }
}
