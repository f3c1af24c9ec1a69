//! cloudgov - governance assessment engine for cloud resource snapshots
//!
//! Filters an inventory snapshot, classifies resource names against a
//! taxonomy of resource types and services, builds a dependency graph, and
//! runs a set of category analyzers in parallel to produce a scored,
//! graded [`AssessmentResult`](analyzers::AssessmentResult).

pub mod analyzers;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod graph;
pub mod models;
pub mod naming;
pub mod providers;
pub mod scoring;
pub mod taxonomy;

pub use analyzers::{AssessmentResult, AssessmentType, GovernanceEngine};
pub use error::{GovernanceError, GovernanceResult};
