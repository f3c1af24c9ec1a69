//! Project-level configuration support
//!
//! Loads configuration from `cloudgov.toml` or `.cloudgovrc.json` in the
//! working directory.
//!
//! # Configuration Format
//!
//! ```toml
//! # cloudgov.toml
//!
//! [analyzers.identity-stale]
//! enabled = false
//!
//! [scoring]
//! identity_weights = { application = 0.25, user_device = 0.25, rbac = 0.30, conditional_access = 0.20 }
//!
//! [tagging]
//! required = ["environment", "owner"]
//!
//! [identity]
//! stale_after_days = 60
//! credential_expiry_warning_days = 30
//! max_subscription_owners = 3
//!
//! [exclude]
//! resource_types = ["microsoft.insights/actiongroups"]
//! name_patterns = ["^tmp-"]
//!
//! [defaults]
//! workers = 8
//! naming_scheme = "scheme.json"
//! assessment = "full"
//! ```

use crate::error::ConfigError;
use crate::filter::ResourceFilter;
use crate::naming::NamingScheme;
use crate::scoring::CompositeWeights;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE: &str = "cloudgov.toml";
pub const JSON_CONFIG_FILE: &str = ".cloudgovrc.json";

/// Tags every resource is expected to carry unless configured otherwise
pub const DEFAULT_REQUIRED_TAGS: &[&str] = &["environment", "owner", "cost-center"];

/// Project-level configuration loaded from cloudgov.toml or similar
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProjectConfig {
    /// Per-analyzer overrides
    #[serde(default)]
    pub analyzers: BTreeMap<String, AnalyzerConfigOverride>,

    /// Composite weights
    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub tagging: TaggingConfig,

    /// Identity analyzer thresholds
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Extra filter exclusions
    #[serde(default)]
    pub exclude: ExcludeConfig,

    /// Default CLI flags
    #[serde(default)]
    pub defaults: CliDefaults,
}

/// Configuration override for a specific analyzer
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnalyzerConfigOverride {
    /// Whether the analyzer runs (default: true)
    #[serde(default)]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Weights for the identity-full composite
    #[serde(default = "CompositeWeights::identity_full")]
    pub identity_weights: CompositeWeights,

    /// Weights for the full composite
    #[serde(default = "CompositeWeights::full")]
    pub full_weights: CompositeWeights,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            identity_weights: CompositeWeights::identity_full(),
            full_weights: CompositeWeights::full(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggingConfig {
    #[serde(default = "default_required_tags")]
    pub required: Vec<String>,
}

fn default_required_tags() -> Vec<String> {
    DEFAULT_REQUIRED_TAGS.iter().map(|t| t.to_string()).collect()
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            required: default_required_tags(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Days without sign-in before a user counts as stale
    #[serde(default = "default_stale_after_days")]
    pub stale_after_days: u32,

    /// Credentials expiring within this many days are reported
    #[serde(default = "default_credential_expiry_warning_days")]
    pub credential_expiry_warning_days: u32,

    /// More Owner assignments than this at subscription scope is a finding
    #[serde(default = "default_max_subscription_owners")]
    pub max_subscription_owners: usize,
}

fn default_stale_after_days() -> u32 {
    90
}
fn default_credential_expiry_warning_days() -> u32 {
    30
}
fn default_max_subscription_owners() -> usize {
    3
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            stale_after_days: default_stale_after_days(),
            credential_expiry_warning_days: default_credential_expiry_warning_days(),
            max_subscription_owners: default_max_subscription_owners(),
        }
    }
}

/// Exclusions applied on top of the built-in filter rules
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExcludeConfig {
    /// Full resource types, compared case-insensitively
    #[serde(default)]
    pub resource_types: Vec<String>,

    /// Regexes matched against resource names
    #[serde(default)]
    pub name_patterns: Vec<String>,
}

/// Default CLI flags that can be set in project config
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CliDefaults {
    /// Default number of workers
    #[serde(default)]
    pub workers: Option<usize>,

    /// Naming scheme file, relative to the config directory
    #[serde(default)]
    pub naming_scheme: Option<PathBuf>,

    /// Default assessment type
    #[serde(default)]
    pub assessment: Option<String>,
}

/// Load project configuration from a directory.
///
/// Searches for configuration files in this order:
/// 1. `cloudgov.toml`
/// 2. `.cloudgovrc.json`
///
/// Returns the default configuration only when neither file exists. A file
/// that exists but cannot be read or parsed is an error.
pub fn load_project_config(dir: &Path) -> Result<ProjectConfig, ConfigError> {
    // Try TOML first (preferred format)
    let toml_path = dir.join(CONFIG_FILE);
    if toml_path.exists() {
        let config = load_toml_config(&toml_path)?;
        debug!("Loaded project config from {}", toml_path.display());
        return Ok(config);
    }

    let json_path = dir.join(JSON_CONFIG_FILE);
    if json_path.exists() {
        let config = load_json_config(&json_path)?;
        debug!("Loaded project config from {}", json_path.display());
        return Ok(config);
    }

    debug!("No project config found, using defaults");
    Ok(ProjectConfig::default())
}

fn parse_error(path: &Path, message: impl ToString) -> ConfigError {
    ConfigError::Parse {
        path: path.display().to_string(),
        message: message.to_string(),
    }
}

fn load_toml_config(path: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| parse_error(path, e))?;
    toml::from_str(&content).map_err(|e| parse_error(path, e))
}

fn load_json_config(path: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| parse_error(path, e))?;
    serde_json::from_str(&content).map_err(|e| parse_error(path, e))
}

/// Load a naming scheme from JSON or TOML (by extension, JSON otherwise)
/// and validate it
pub fn load_naming_scheme(path: &Path) -> anyhow::Result<NamingScheme> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read naming scheme {}: {}", path.display(), e))?;

    let is_toml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
    let scheme: NamingScheme = if is_toml {
        toml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };

    scheme.validate().map_err(crate::error::GovernanceError::from)?;
    debug!(
        "Loaded naming scheme from {} ({} components)",
        path.display(),
        scheme.components.len()
    );
    Ok(scheme)
}

impl ProjectConfig {
    /// Reject weights that do not sum to 1 and exclusion patterns that do not compile
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.identity_weights.validate("identity_weights")?;
        self.scoring.full_weights.validate("full_weights")?;
        self.resource_filter()?;
        Ok(())
    }

    /// Built-in filter rules plus the `[exclude]` section
    pub fn resource_filter(&self) -> Result<ResourceFilter, ConfigError> {
        ResourceFilter::with_exclusions(&self.exclude.resource_types, &self.exclude.name_patterns)
    }

    /// Check if an analyzer is enabled (defaults to true if not specified)
    pub fn is_analyzer_enabled(&self, name: &str) -> bool {
        let normalized = normalize_analyzer_name(name);

        self.analyzers
            .get(&normalized)
            .or_else(|| self.analyzers.get(name))
            .and_then(|c| c.enabled)
            .unwrap_or(true)
    }

    /// All analyzer names that are switched off
    pub fn disabled_analyzers(&self) -> Vec<String> {
        self.analyzers
            .iter()
            .filter(|(_, c)| c.enabled == Some(false))
            .map(|(name, _)| normalize_analyzer_name(name))
            .collect()
    }

    /// Naming scheme path resolved against `base`
    pub fn naming_scheme_path(&self, base: &Path) -> Option<PathBuf> {
        self.defaults.naming_scheme.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                base.join(p)
            }
        })
    }
}

/// Normalize analyzer name to kebab-case
///
/// IdentityRbacAnalyzer -> identity-rbac, identity_rbac -> identity-rbac
pub fn normalize_analyzer_name(name: &str) -> String {
    let mut result = String::new();
    let chars: Vec<char> = name.chars().collect();

    for (i, c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_is_lower = i > 0 && chars[i - 1].is_lowercase();
            let is_acronym_end = i > 0
                && chars[i - 1].is_uppercase()
                && i + 1 < chars.len()
                && chars[i + 1].is_lowercase();

            if prev_is_lower || is_acronym_end {
                result.push('-');
            }
            result.push(c.to_lowercase().next().unwrap_or(*c));
        } else if *c == '_' {
            result.push('-');
        } else {
            result.push(*c);
        }
    }

    result.trim_end_matches("-analyzer").to_string()
}
