//! Assessment engine
//!
//! Runs the analyzers selected by an [`AssessmentType`] in parallel on a
//! rayon pool, isolates failures at each analyzer boundary, merges the
//! per-analyzer results in registration order and computes the composite
//! score.
//!
//! `assess` only returns `Err` for configuration problems found before the
//! run; once analyzers start, every outcome is folded into the result.

use super::base::{missing_capabilities, AnalysisContext, Analyzer};
use super::default_analyzers;
use super::merge::merge;
use crate::config::ProjectConfig;
use crate::error::{ConfigError, GovernanceError, GovernanceResult, ProviderError};
use crate::filter::FilteringStats;
use crate::models::{
    grade_from_score, AnalysisMode, AnalysisResult, Finding, FindingsSummary, MetricValue,
    ResourceDescriptor, Severity,
};
use crate::naming::NamingScheme;
use crate::providers::{Capability, DirectoryProvider, ResourceInventory};
use crate::scoring::{category, composite_score, CompositeWeights};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Which analyzers run and how their scores combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssessmentType {
    Naming,
    Tagging,
    Dependencies,
    IdentityApplications,
    IdentityUsers,
    IdentityRbac,
    IdentityConditionalAccess,
    IdentityStale,
    IdentityFull,
    Full,
}

const IDENTITY_FULL: &[&str] = &[
    "identity-applications",
    "identity-users",
    "identity-rbac",
    "identity-conditional-access",
];

const FULL: &[&str] = &[
    "naming",
    "tagging",
    "dependencies",
    "identity-applications",
    "identity-users",
    "identity-rbac",
    "identity-conditional-access",
];

impl AssessmentType {
    pub const ALL: [AssessmentType; 10] = [
        AssessmentType::Naming,
        AssessmentType::Tagging,
        AssessmentType::Dependencies,
        AssessmentType::IdentityApplications,
        AssessmentType::IdentityUsers,
        AssessmentType::IdentityRbac,
        AssessmentType::IdentityConditionalAccess,
        AssessmentType::IdentityStale,
        AssessmentType::IdentityFull,
        AssessmentType::Full,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentType::Naming => "naming",
            AssessmentType::Tagging => "tagging",
            AssessmentType::Dependencies => "dependencies",
            AssessmentType::IdentityApplications => "identity-applications",
            AssessmentType::IdentityUsers => "identity-users",
            AssessmentType::IdentityRbac => "identity-rbac",
            AssessmentType::IdentityConditionalAccess => "identity-conditional-access",
            AssessmentType::IdentityStale => "identity-stale",
            AssessmentType::IdentityFull => "identity-full",
            AssessmentType::Full => "full",
        }
    }

    /// Analyzer names, in registration order
    pub fn analyzer_names(&self) -> Vec<&'static str> {
        match self {
            AssessmentType::IdentityFull => IDENTITY_FULL.to_vec(),
            AssessmentType::Full => FULL.to_vec(),
            single => vec![single.as_str()],
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, AssessmentType::IdentityFull | AssessmentType::Full)
    }

    /// Composite weights; single analyzers get full weight on their category
    pub fn weights(&self, config: &ProjectConfig) -> CompositeWeights {
        match self {
            AssessmentType::IdentityFull => config.scoring.identity_weights.clone(),
            AssessmentType::Full => config.scoring.full_weights.clone(),
            AssessmentType::Naming => CompositeWeights::single(category::NAMING),
            AssessmentType::Tagging => CompositeWeights::single(category::TAGGING),
            AssessmentType::Dependencies => CompositeWeights::single(category::DEPENDENCIES),
            AssessmentType::IdentityApplications => CompositeWeights::single(category::APPLICATION),
            AssessmentType::IdentityUsers => CompositeWeights::single(category::USER_DEVICE),
            AssessmentType::IdentityRbac => CompositeWeights::single(category::RBAC),
            AssessmentType::IdentityConditionalAccess => {
                CompositeWeights::single(category::CONDITIONAL_ACCESS)
            }
            AssessmentType::IdentityStale => CompositeWeights::single(category::STALE_IDENTITY),
        }
    }
}

impl std::fmt::Display for AssessmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AssessmentType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        AssessmentType::ALL
            .iter()
            .find(|t| t.as_str() == normalized)
            .copied()
            .ok_or_else(|| ConfigError::UnknownAssessment(s.to_string()))
    }
}

/// Per-analyzer summary kept on the assessment result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerOutcome {
    pub analyzer: String,
    pub category: String,
    pub mode: AnalysisMode,
    pub score: f64,
    pub findings: usize,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_capabilities: Vec<Capability>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    pub run_id: String,
    pub assessment_type: AssessmentType,
    pub score: f64,
    pub grade: String,
    /// Highest severity first; equal severities keep registration order
    pub findings: Vec<Finding>,
    pub summary: FindingsSummary,
    pub detailed_metrics: BTreeMap<String, MetricValue>,
    pub resources_analyzed: usize,
    pub issues_found: usize,
    pub analyzers: Vec<AnalyzerOutcome>,
    pub filtering: FilteringStats,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Orchestrates governance analysis across the registered analyzers
pub struct GovernanceEngine {
    analyzers: Vec<Arc<dyn Analyzer>>,
    /// Number of worker threads for parallel execution
    workers: usize,
    config: ProjectConfig,
    directory: Arc<dyn DirectoryProvider>,
    /// Fixed reference time; `None` means the wall clock at run start
    as_of: Option<DateTime<Utc>>,
}

impl GovernanceEngine {
    /// Create an engine with the default analyzers.
    ///
    /// Worker count comes from `[defaults] workers`; 0 or unset means
    /// auto-detect.
    pub fn new(config: ProjectConfig, directory: Arc<dyn DirectoryProvider>) -> Self {
        let workers = config.defaults.workers.unwrap_or(0);
        let mut engine = Self {
            analyzers: Vec::new(),
            workers: 0,
            config,
            directory,
            as_of: None,
        };
        engine.register_all(default_analyzers());
        engine.with_workers(workers)
    }

    /// Number of worker threads (0 = available parallelism, capped at 16)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = if workers == 0 {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
                .min(16)
        } else {
            workers
        };
        self
    }

    pub fn with_as_of(mut self, as_of: DateTime<Utc>) -> Self {
        self.as_of = Some(as_of);
        self
    }

    /// Register an analyzer, replacing any registered under the same name
    pub fn register(&mut self, analyzer: Arc<dyn Analyzer>) {
        match self.analyzers.iter_mut().find(|a| a.name() == analyzer.name()) {
            Some(slot) => *slot = analyzer,
            None => self.analyzers.push(analyzer),
        }
    }

    pub fn register_all(&mut self, analyzers: impl IntoIterator<Item = Arc<dyn Analyzer>>) {
        for analyzer in analyzers {
            self.register(analyzer);
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn analyzer_names(&self) -> Vec<&'static str> {
        self.analyzers.iter().map(|a| a.name()).collect()
    }

    /// Fetch the snapshot from an inventory, then assess it
    pub fn assess_inventory(
        &self,
        assessment_type: AssessmentType,
        inventory: &dyn ResourceInventory,
        subscription_ids: &[String],
        scheme: Option<&NamingScheme>,
        cancel: &CancellationToken,
    ) -> GovernanceResult<AssessmentResult> {
        let resources = inventory
            .list_resources(subscription_ids, cancel)
            .map_err(|e| match e {
                ProviderError::Cancelled => GovernanceError::Cancelled,
                other => GovernanceError::Provider(other),
            })?;
        self.assess(assessment_type, &resources, scheme, cancel)
    }

    /// Run one assessment over a resource snapshot
    pub fn assess(
        &self,
        assessment_type: AssessmentType,
        resources: &[ResourceDescriptor],
        scheme: Option<&NamingScheme>,
        cancel: &CancellationToken,
    ) -> GovernanceResult<AssessmentResult> {
        // Configuration errors are the only ones surfaced to the caller
        self.config.validate()?;
        if let Some(scheme) = scheme {
            scheme.validate()?;
        }
        let filter = self.config.resource_filter()?;

        let started_at = Utc::now();
        let start = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        info!(
            "Starting {} assessment {} on {} resources with {} workers",
            assessment_type,
            run_id,
            resources.len(),
            self.workers
        );

        let (analyzable, filtering) = filter.filter(resources);
        info!(
            "Filtered {} of {} resources ({}%)",
            filtering.filtered_out, filtering.total, filtering.percentage
        );

        let selected = self.select(assessment_type);
        let mut weights = assessment_type.weights(&self.config);
        let enabled: Vec<&'static str> = selected.iter().map(|a| a.category()).collect();
        if weights.categories().any(|c| !enabled.iter().any(|e| *e == c)) {
            weights.0.retain(|c, _| enabled.iter().any(|e| *e == c.as_str()));
            weights.normalize();
        }

        let available: Vec<Capability> = Capability::ALL
            .into_iter()
            .filter(|c| self.directory.has_capability(*c))
            .collect();
        debug!("Directory capabilities: {:?}", available);

        let ctx = AnalysisContext {
            resources: &analyzable,
            all_resources: resources,
            scheme,
            config: &self.config,
            directory: self.directory.as_ref(),
            cancel,
            as_of: self.as_of.unwrap_or(started_at),
        };

        let runs: Vec<(AnalysisResult, Vec<Capability>)> = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
        {
            Ok(pool) => pool.install(|| {
                selected
                    .par_iter()
                    .map(|analyzer| self.run_single_analyzer(analyzer, &ctx, &available))
                    .collect()
            }),
            Err(e) => {
                warn!("Failed to build worker pool ({}), running sequentially", e);
                selected
                    .iter()
                    .map(|analyzer| self.run_single_analyzer(analyzer, &ctx, &available))
                    .collect()
            }
        };

        let outcomes: Vec<AnalyzerOutcome> = runs
            .iter()
            .map(|(r, missing)| AnalyzerOutcome {
                analyzer: r.analyzer.clone(),
                category: r.category.clone(),
                mode: r.mode,
                score: r.score,
                findings: r.findings.len(),
                duration_ms: r.duration_ms,
                missing_capabilities: missing.clone(),
            })
            .collect();

        let results: Vec<AnalysisResult> = runs.into_iter().map(|(r, _)| r).collect();
        let merged = merge(results);

        let score = if assessment_type.is_composite() {
            composite_score(&merged.detailed_metrics, &weights, &merged.findings)
        } else {
            outcomes.first().map(|o| o.score).unwrap_or(0.0)
        };

        let mut findings = merged.findings;
        findings.sort_by(|a, b| b.severity.cmp(&a.severity));

        let finished_at = Utc::now();
        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Assessment {} complete: score {:.2}, {} findings in {}ms",
            run_id,
            score,
            findings.len(),
            duration_ms
        );

        Ok(AssessmentResult {
            run_id,
            assessment_type,
            score,
            grade: grade_from_score(score),
            summary: FindingsSummary::from_findings(&findings),
            findings,
            detailed_metrics: merged.detailed_metrics,
            resources_analyzed: merged.resources_analyzed,
            issues_found: merged.issues_found,
            analyzers: outcomes,
            filtering,
            started_at,
            finished_at,
            duration_ms,
        })
    }

    /// Registered analyzers for the assessment, minus disabled ones, in assessment order
    fn select(&self, assessment_type: AssessmentType) -> Vec<Arc<dyn Analyzer>> {
        assessment_type
            .analyzer_names()
            .into_iter()
            .filter_map(|name| {
                let found = self.analyzers.iter().find(|a| a.name() == name).cloned();
                if found.is_none() {
                    warn!("No analyzer registered for {}", name);
                }
                found
            })
            .filter(|a| {
                let enabled = self.config.is_analyzer_enabled(a.name());
                if !enabled {
                    info!("Analyzer {} disabled by configuration", a.name());
                }
                enabled
            })
            .collect()
    }

    /// Run a single analyzer with capability gating, error handling and timing
    fn run_single_analyzer(
        &self,
        analyzer: &Arc<dyn Analyzer>,
        ctx: &AnalysisContext<'_>,
        available: &[Capability],
    ) -> (AnalysisResult, Vec<Capability>) {
        let name = analyzer.name();
        let start = Instant::now();

        if ctx.cancel.is_cancelled() {
            let result = AnalysisResult::failed(
                name,
                analyzer.category(),
                Severity::Medium,
                "assessment cancelled before the analyzer started",
            );
            return (result, Vec::new());
        }

        let missing = missing_capabilities(analyzer.as_ref(), available);
        let mode = if missing.is_empty() {
            AnalysisMode::Enhanced
        } else {
            AnalysisMode::Limited
        };
        debug!("Running analyzer {} ({})", name, mode);

        // Wrap in catch_unwind to handle panics
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| match mode {
            AnalysisMode::Limited => analyzer.analyze_limited(ctx),
            _ => analyzer.analyze_enhanced(ctx),
        }));
        let duration_ms = start.elapsed().as_millis() as u64;

        let mut result = match outcome {
            Ok(Ok(mut result)) => {
                result.mode = mode;
                if mode == AnalysisMode::Limited {
                    result.findings.push(capability_finding(analyzer.as_ref(), &missing));
                    result.issues_found += 1;
                }
                debug!(
                    "Analyzer {} scored {:.2} with {} findings in {}ms",
                    name,
                    result.score,
                    result.findings.len(),
                    duration_ms
                );
                result
            }
            Ok(Err(e)) => {
                let cancelled = ctx.cancel.is_cancelled() || is_cancellation(&e);
                if cancelled {
                    warn!("Analyzer {} cancelled: {}", name, e);
                } else {
                    warn!("Analyzer {} failed: {:#}", name, e);
                }
                let severity = if cancelled { Severity::Medium } else { Severity::High };
                AnalysisResult::failed(name, analyzer.category(), severity, format!("{:#}", e))
            }
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                error!("Analyzer {} panicked: {}", name, panic_msg);
                AnalysisResult::failed(
                    name,
                    analyzer.category(),
                    Severity::High,
                    format!("panic: {}", panic_msg),
                )
            }
        };

        result.duration_ms = duration_ms;
        (result, missing)
    }
}

fn is_cancellation(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<ProviderError>(), Some(ProviderError::Cancelled))
        || matches!(err.downcast_ref::<GovernanceError>(), Some(GovernanceError::Cancelled))
}

/// The one finding a limited run adds, naming what is missing and how to grant it
fn capability_finding(analyzer: &dyn Analyzer, missing: &[Capability]) -> Finding {
    let names: Vec<&str> = missing.iter().map(|c| c.as_str()).collect();
    let permissions: Vec<&str> = missing.iter().map(|c| c.permission()).collect();
    Finding::new(
        analyzer.category(),
        format!("analyzer:{}", analyzer.name()),
        analyzer.name(),
        Severity::Medium,
        format!(
            "Analyzer {} ran in limited mode: directory data unavailable ({})",
            analyzer.name(),
            names.join(", ")
        ),
        format!(
            "Grant the {} permission{} to enable the full analysis",
            permissions.join(", "),
            if permissions.len() == 1 { "" } else { "s" }
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::testing::Fixture;
    use crate::providers::{DirectorySnapshot, NoDirectory, StaticDirectory};
    use anyhow::Result;

    struct PanickingAnalyzer;

    impl Analyzer for PanickingAnalyzer {
        fn name(&self) -> &'static str {
            "tagging"
        }
        fn category(&self) -> &'static str {
            category::TAGGING
        }
        fn description(&self) -> &'static str {
            "always panics"
        }
        fn analyze_enhanced(&self, _ctx: &AnalysisContext<'_>) -> Result<AnalysisResult> {
            panic!("tag table corrupted");
        }
    }

    fn engine(directory: Arc<dyn DirectoryProvider>) -> GovernanceEngine {
        GovernanceEngine::new(ProjectConfig::default(), directory)
            .with_workers(2)
            .with_as_of(Fixture::new().as_of)
    }

    fn vm(name: &str) -> ResourceDescriptor {
        ResourceDescriptor::new(
            &format!("/subscriptions/s1/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/{name}"),
            name,
            "Microsoft.Compute/virtualMachines",
        )
        .with_resource_group("rg")
        .with_tag("environment", "prod")
        .with_tag("owner", "ops")
        .with_tag("cost-center", "1")
    }

    #[test]
    fn test_assessment_type_parsing() {
        assert_eq!("identity_full".parse::<AssessmentType>(), Ok(AssessmentType::IdentityFull));
        assert_eq!("FULL".parse::<AssessmentType>(), Ok(AssessmentType::Full));
        assert_eq!(
            "everything".parse::<AssessmentType>(),
            Err(ConfigError::UnknownAssessment("everything".into()))
        );
        assert_eq!(AssessmentType::IdentityFull.analyzer_names().len(), 4);
        assert_eq!(AssessmentType::Naming.analyzer_names(), vec!["naming"]);
    }

    #[test]
    fn test_limited_mode_adds_one_capability_finding() {
        let engine = engine(Arc::new(NoDirectory));
        let result = engine
            .assess(AssessmentType::IdentityRbac, &[], None, &CancellationToken::new())
            .expect("assessment");

        assert_eq!(result.analyzers[0].mode, AnalysisMode::Limited);
        assert_eq!(result.analyzers[0].missing_capabilities, vec![Capability::RoleManagement]);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].severity, Severity::Medium);
        assert!(result.findings[0]
            .recommendation
            .contains("RoleManagement.Read.Directory"));
        assert_eq!(result.score, 100.0);
    }

    #[test]
    fn test_enhanced_mode_when_capability_present() {
        let directory = StaticDirectory::new(DirectorySnapshot {
            conditional_access_policies: Some(Vec::new()),
            ..Default::default()
        });
        let engine = engine(Arc::new(directory));
        let result = engine
            .assess(
                AssessmentType::IdentityConditionalAccess,
                &[],
                None,
                &CancellationToken::new(),
            )
            .expect("assessment");
        assert_eq!(result.analyzers[0].mode, AnalysisMode::Enhanced);
        assert_eq!(result.score, 50.0);
    }

    #[test]
    fn test_panic_is_isolated() {
        let mut engine = engine(Arc::new(NoDirectory));
        engine.register(Arc::new(PanickingAnalyzer));
        let resources = vec![vm("abc-prod-web-vm-01")];

        let result = engine
            .assess(AssessmentType::Tagging, &resources, None, &CancellationToken::new())
            .expect("assessment");
        assert_eq!(result.score, 0.0);
        assert_eq!(result.analyzers[0].mode, AnalysisMode::Failed);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].severity, Severity::High);
        assert!(result.findings[0].issue.contains("tag table corrupted"));
    }

    #[test]
    fn test_cancelled_run_still_returns_result() {
        let engine = engine(Arc::new(NoDirectory));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = engine
            .assess(AssessmentType::Full, &[vm("abc-prod-web-vm-01")], None, &cancel)
            .expect("assessment");

        assert_eq!(result.analyzers.len(), 7);
        assert!(result.analyzers.iter().all(|a| a.mode == AnalysisMode::Failed));
        assert!(result.findings.iter().all(|f| f.severity == Severity::Medium));
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_invalid_scheme_is_rejected_before_run() {
        let engine = engine(Arc::new(NoDirectory));
        let scheme = NamingScheme::default();
        let err = engine
            .assess(AssessmentType::Naming, &[], Some(&scheme), &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidScheme(_)));
    }

    #[test]
    fn test_invalid_config_is_rejected_before_run() {
        let mut config = ProjectConfig::default();
        config.exclude.name_patterns = vec!["[".into()];
        let engine = GovernanceEngine::new(config, Arc::new(NoDirectory));
        let err = engine
            .assess(AssessmentType::Naming, &[], None, &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidConfig(ConfigError::InvalidPattern { .. })));
    }

    #[test]
    fn test_disabled_analyzer_drops_out_of_weights() {
        let mut config = ProjectConfig::default();
        config.analyzers.insert(
            "identity-conditional-access".into(),
            crate::config::AnalyzerConfigOverride { enabled: Some(false) },
        );
        let engine = GovernanceEngine::new(config, Arc::new(NoDirectory)).with_workers(1);
        let result = engine
            .assess(AssessmentType::IdentityFull, &[], None, &CancellationToken::new())
            .expect("assessment");

        assert_eq!(result.analyzers.len(), 3);
        // Three limited analyzers on an empty snapshot score 100 each
        assert_eq!(result.score, 100.0);
    }
}
