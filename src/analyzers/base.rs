//! Base analyzer trait and types
//!
//! This module defines the core abstractions for governance analysis:
//! - `Analyzer` trait that every category analyzer implements
//! - `AnalysisContext` carrying the shared, read-only run inputs
//! - Helpers for publishing a base score and finalizing a result

use crate::config::ProjectConfig;
use crate::error::ProviderError;
use crate::models::{AnalysisResult, ResourceDescriptor};
use crate::naming::NamingScheme;
use crate::providers::{Capability, DirectoryProvider};
use crate::scoring::{finalize, round2, score_key};
use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

/// Everything an analyzer may read during one run
pub struct AnalysisContext<'a> {
    /// Snapshot after filtering
    pub resources: &'a [ResourceDescriptor],
    /// Snapshot before filtering; role-assignment and other system records live here
    pub all_resources: &'a [ResourceDescriptor],
    pub scheme: Option<&'a NamingScheme>,
    pub config: &'a ProjectConfig,
    pub directory: &'a dyn DirectoryProvider,
    pub cancel: &'a CancellationToken,
    /// Reference time for age and expiry checks
    pub as_of: DateTime<Utc>,
}

impl AnalysisContext<'_> {
    /// Bail out with [`ProviderError::Cancelled`] once the run is cancelled
    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(ProviderError::Cancelled.into());
        }
        Ok(())
    }

    pub fn days_since(&self, at: DateTime<Utc>) -> i64 {
        (self.as_of - at).num_days()
    }
}

/// Trait for all category analyzers
///
/// An analyzer inspects the shared snapshot (and, when it declares
/// capabilities, the identity directory) and returns one
/// [`AnalysisResult`] for its category. The engine checks the directory
/// once per run and calls either [`Analyzer::analyze_enhanced`] or
/// [`Analyzer::analyze_limited`].
pub trait Analyzer: Send + Sync {
    /// Unique kebab-case identifier, also the `[analyzers.<name>]` config key
    fn name(&self) -> &'static str;

    /// Scoring category; the base score is published as `<category>_score`
    fn category(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Directory capabilities needed for the enhanced variant
    fn required_capabilities(&self) -> &'static [Capability] {
        &[]
    }

    /// Full analysis, all required capabilities present
    fn analyze_enhanced(&self, ctx: &AnalysisContext<'_>) -> Result<AnalysisResult>;

    /// Inventory-only analysis, used when a capability is missing
    fn analyze_limited(&self, ctx: &AnalysisContext<'_>) -> Result<AnalysisResult> {
        self.analyze_enhanced(ctx)
    }
}

/// Capabilities an analyzer needs that the capability check did not find
pub fn missing_capabilities(analyzer: &dyn Analyzer, available: &[Capability]) -> Vec<Capability> {
    analyzer
        .required_capabilities()
        .iter()
        .filter(|c| !available.contains(c))
        .copied()
        .collect()
}

/// Publish `base` under the category's score key and set the final score
/// and issue count from the findings already on `result`
pub fn finish(mut result: AnalysisResult, base: f64) -> AnalysisResult {
    let key = score_key(&result.category);
    result.set_metric(key, round2(base));
    result.score = finalize(base, &result.findings);
    result.issues_found = result.findings.len();
    result
}
