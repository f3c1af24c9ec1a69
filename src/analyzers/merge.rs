//! Merging of per-analyzer results

use crate::models::{AnalysisResult, Finding, MetricValue};
use std::collections::BTreeMap;

/// Combined view of several analyzer results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedResults {
    pub findings: Vec<Finding>,
    pub detailed_metrics: BTreeMap<String, MetricValue>,
    pub resources_analyzed: usize,
    pub issues_found: usize,
}

/// Merge results in the order given.
///
/// `resources_analyzed` takes the max and `issues_found` the sum. Metrics
/// merge key by key: integers sum, decimals average over the results that
/// report them, and anything else keeps the first value seen. A key whose
/// type differs between results also keeps the first value.
pub fn merge(results: Vec<AnalysisResult>) -> MergedResults {
    let mut merged = MergedResults::default();
    // key -> (decimal sum, count)
    let mut decimals: BTreeMap<String, (f64, usize)> = BTreeMap::new();

    for result in results {
        merged.resources_analyzed = merged.resources_analyzed.max(result.resources_analyzed);
        merged.issues_found += result.issues_found;
        merged.findings.extend(result.findings);

        for (key, value) in result.detailed_metrics {
            match (merged.detailed_metrics.get_mut(&key), value) {
                (None, MetricValue::Decimal(v)) => {
                    decimals.insert(key.clone(), (v, 1));
                    merged.detailed_metrics.insert(key, MetricValue::Decimal(v));
                }
                (None, value) => {
                    merged.detailed_metrics.insert(key, value);
                }
                (Some(MetricValue::Integer(total)), MetricValue::Integer(v)) => *total += v,
                (Some(MetricValue::Decimal(avg)), MetricValue::Decimal(v)) => {
                    let entry = decimals.entry(key).or_insert((*avg, 1));
                    entry.0 += v;
                    entry.1 += 1;
                    *avg = entry.0 / entry.1 as f64;
                }
                (Some(_), _) => {}
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    fn result(name: &str, resources: usize) -> AnalysisResult {
        let mut r = AnalysisResult::new(name, name);
        r.resources_analyzed = resources;
        r.findings.push(Finding::new(name, "/r/1", "r1", Severity::Low, "issue", "fix"));
        r.issues_found = 1;
        r
    }

    #[test]
    fn test_headline_metrics() {
        let merged = merge(vec![result("a", 10), result("b", 25), result("c", 3)]);
        assert_eq!(merged.resources_analyzed, 25);
        assert_eq!(merged.issues_found, 3);
        let order: Vec<_> = merged.findings.iter().map(|f| f.category.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_metric_merge_rules() {
        let a = result("a", 1)
            .with_metric("count", 2usize)
            .with_metric("rate", 0.5)
            .with_metric("pattern", "kebab-case")
            .with_metric("mixed", 1usize);
        let b = result("b", 1)
            .with_metric("count", 3usize)
            .with_metric("rate", 1.0)
            .with_metric("pattern", "snake_case")
            .with_metric("mixed", 0.25);
        let c = result("c", 1).with_metric("rate", 0.0);

        let merged = merge(vec![a, b, c]);
        assert_eq!(merged.detailed_metrics["count"], MetricValue::Integer(5));
        assert_eq!(merged.detailed_metrics["rate"], MetricValue::Decimal(0.5));
        assert_eq!(merged.detailed_metrics["pattern"], MetricValue::from("kebab-case"));
        assert_eq!(merged.detailed_metrics["mixed"], MetricValue::Integer(1));
    }

    #[test]
    fn test_merge_is_pure() {
        let input = vec![result("a", 4).with_metric("rate", 0.2), result("b", 2)];
        assert_eq!(merge(input.clone()), merge(input));
        assert_eq!(merge(Vec::new()), MergedResults::default());
    }
}
