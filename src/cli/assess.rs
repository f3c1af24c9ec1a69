//! `cloudgov assess`

use super::{cancel_on_interrupt, write_json};
use crate::analyzers::{AssessmentResult, AssessmentType, GovernanceEngine};
use crate::config::{load_naming_scheme, load_project_config};
use crate::models::Severity;
use crate::providers::{DirectoryProvider, JsonInventory, NoDirectory, StaticDirectory};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub(super) struct AssessArgs<'a> {
    pub inventory: &'a Path,
    pub assessment: Option<&'a str>,
    pub directory: Option<&'a Path>,
    pub scheme: Option<&'a Path>,
    pub subscriptions: &'a [String],
    pub fail_on: Option<&'a str>,
}

pub(super) fn run(
    config_dir: &Path,
    workers: Option<usize>,
    args: AssessArgs<'_>,
    output: Option<&Path>,
) -> Result<()> {
    let config = load_project_config(config_dir)?;

    let assessment: AssessmentType = args
        .assessment
        .or(config.defaults.assessment.as_deref())
        .unwrap_or("full")
        .parse()?;

    let scheme_path = args
        .scheme
        .map(Path::to_path_buf)
        .or_else(|| config.naming_scheme_path(config_dir));
    let scheme = scheme_path.as_deref().map(load_naming_scheme).transpose()?;

    let directory: Arc<dyn DirectoryProvider> = match args.directory {
        Some(path) => Arc::new(
            StaticDirectory::from_path(path)
                .with_context(|| format!("Failed to load directory snapshot {}", path.display()))?,
        ),
        None => {
            info!("No directory snapshot given, identity analyzers run in limited mode");
            Arc::new(NoDirectory)
        }
    };

    let workers = workers.or(config.defaults.workers).unwrap_or(0);
    let engine = GovernanceEngine::new(config, directory).with_workers(workers);

    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    let inventory = JsonInventory::new(args.inventory);
    let result = engine.assess_inventory(
        assessment,
        &inventory,
        args.subscriptions,
        scheme.as_ref(),
        &cancel,
    )?;

    write_json(&result, output)?;

    if let Some(threshold) = args.fail_on {
        let threshold: Severity = threshold.parse().map_err(anyhow::Error::msg)?;
        if exceeds(&result, threshold) {
            std::process::exit(1);
        }
    }
    Ok(())
}

fn exceeds(result: &AssessmentResult, threshold: Severity) -> bool {
    result.findings.iter().any(|f| f.severity >= threshold)
}
