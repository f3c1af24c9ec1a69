//! Configuration module for cloudgov
//!
//! This module handles:
//! - Project-level configuration (cloudgov.toml)
//! - Analyzer enable/disable overrides
//! - Composite weights and identity thresholds
//! - CLI defaults and the naming scheme file

mod project_config;

pub use project_config::{
    load_naming_scheme, load_project_config, normalize_analyzer_name, AnalyzerConfigOverride,
    CliDefaults, ExcludeConfig, IdentityConfig, ProjectConfig, ScoringConfig, TaggingConfig,
    CONFIG_FILE, DEFAULT_REQUIRED_TAGS, JSON_CONFIG_FILE,
};
