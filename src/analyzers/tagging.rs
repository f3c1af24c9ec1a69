//! Tagging compliance analyzer

use super::base::{finish, AnalysisContext, Analyzer};
use crate::models::{AnalysisResult, Finding, Severity};
use crate::scoring::{category, round2, tagging_score};
use anyhow::Result;

pub struct TaggingAnalyzer;

impl TaggingAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TaggingAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for TaggingAnalyzer {
    fn name(&self) -> &'static str {
        "tagging"
    }

    fn category(&self) -> &'static str {
        category::TAGGING
    }

    fn description(&self) -> &'static str {
        "Checks that resources carry the required tags"
    }

    fn analyze_enhanced(&self, ctx: &AnalysisContext<'_>) -> Result<AnalysisResult> {
        let mut result = AnalysisResult::new(self.name(), self.category());
        let required = &ctx.config.tagging.required;
        let mut coverage = vec![0usize; required.len()];
        let mut fully_tagged = 0usize;
        let mut untagged = 0usize;

        for resource in ctx.resources {
            let mut missing = Vec::new();
            for (i, tag) in required.iter().enumerate() {
                match resource.tag(tag) {
                    Some(value) if !value.trim().is_empty() => coverage[i] += 1,
                    _ => missing.push(tag.as_str()),
                }
            }

            if resource.tags.is_empty() {
                untagged += 1;
                result.findings.push(Finding::for_resource(
                    category::TAGGING,
                    resource,
                    Severity::Medium,
                    format!("Resource '{}' has no tags", resource.name),
                    format!("Add the required tags: {}", required.join(", ")),
                ));
            } else if !missing.is_empty() {
                result.findings.push(Finding::for_resource(
                    category::TAGGING,
                    resource,
                    Severity::Low,
                    format!(
                        "Resource '{}' is missing tags: {}",
                        resource.name,
                        missing.join(", ")
                    ),
                    format!("Add the missing tags: {}", missing.join(", ")),
                ));
            } else {
                fully_tagged += 1;
            }
        }

        let total = ctx.resources.len();
        for (tag, covered) in required.iter().zip(coverage) {
            let pct = if total == 0 {
                100.0
            } else {
                covered as f64 / total as f64 * 100.0
            };
            result.set_metric(format!("tag_coverage_{}", tag), round2(pct));
        }
        result.set_metric("fully_tagged", fully_tagged);
        result.set_metric("untagged", untagged);
        result.resources_analyzed = total;

        Ok(finish(result, tagging_score(fully_tagged, total)))
    }
}
