//! Governance analyzers
//!
//! One analyzer per assessment sub-type, all behind the [`Analyzer`] trait.
//! The [`GovernanceEngine`] selects them by [`AssessmentType`], runs them
//! in parallel and merges their results.
//!
//! # Available Analyzers
//!
//! - `naming` - scheme compliance or naming-pattern heuristics
//! - `tagging` - required tag coverage
//! - `dependencies` - environment mixing, exposed VMs, orphaned resources
//! - `identity-applications` - app credentials, permissions and owners
//! - `identity-users` - MFA, disabled accounts and device hygiene
//! - `identity-rbac` - privileged role assignments
//! - `identity-conditional-access` - baseline policy coverage
//! - `identity-stale` - inactive accounts and unused managed identities

mod base;
mod dependencies;
mod engine;
pub mod identity;
mod merge;
mod naming;
mod tagging;

#[cfg(test)]
pub(crate) mod testing;

pub use base::{finish, missing_capabilities, AnalysisContext, Analyzer};
pub use dependencies::DependenciesAnalyzer;
pub use engine::{AnalyzerOutcome, AssessmentResult, AssessmentType, GovernanceEngine};
pub use identity::{
    ApplicationsAnalyzer, ConditionalAccessAnalyzer, RbacAnalyzer, StaleIdentityAnalyzer,
    UsersAnalyzer,
};
pub use merge::{merge, MergedResults};
pub use naming::{dominant_pattern, NamingAnalyzer};
pub use tagging::TaggingAnalyzer;

use std::sync::Arc;

/// All built-in analyzers, in registration order
pub fn default_analyzers() -> Vec<Arc<dyn Analyzer>> {
    vec![
        Arc::new(NamingAnalyzer::new()),
        Arc::new(TaggingAnalyzer::new()),
        Arc::new(DependenciesAnalyzer::new()),
        Arc::new(ApplicationsAnalyzer::new()),
        Arc::new(UsersAnalyzer::new()),
        Arc::new(RbacAnalyzer::new()),
        Arc::new(ConditionalAccessAnalyzer::new()),
        Arc::new(StaleIdentityAnalyzer::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_assessment_has_its_analyzers() {
        let names: HashSet<&str> = default_analyzers().iter().map(|a| a.name()).collect();
        assert_eq!(names.len(), 8);
        for assessment in AssessmentType::ALL {
            for name in assessment.analyzer_names() {
                assert!(names.contains(name), "{} missing for {}", name, assessment);
            }
        }
    }
}
