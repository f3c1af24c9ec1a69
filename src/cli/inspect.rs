//! `cloudgov filter`, `classify`, `example` and `topology`

use super::write_json;
use crate::config::{load_naming_scheme, load_project_config};
use crate::graph::analyze_topology;
use crate::models::ResourceDescriptor;
use crate::naming::{analyze_name, NamingScheme};
use crate::providers::{JsonInventory, ResourceInventory};
use anyhow::Result;
use serde_json::json;
use std::path::Path;
use tokio_util::sync::CancellationToken;

fn read_inventory(path: &Path) -> Result<Vec<ResourceDescriptor>> {
    let resources = JsonInventory::new(path).list_resources(&[], &CancellationToken::new())?;
    Ok(resources)
}

pub(super) fn filter(config_dir: &Path, inventory: &Path, output: Option<&Path>) -> Result<()> {
    let config = load_project_config(config_dir)?;
    let resources = read_inventory(inventory)?;
    let (kept, stats) = config.resource_filter()?.filter(&resources);
    let analyzable: Vec<&str> = kept.iter().map(|r| r.id.as_str()).collect();
    write_json(&json!({ "stats": stats, "analyzable": analyzable }), output)
}

pub(super) fn classify(
    name: &str,
    resource_type: &str,
    scheme: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let analysis = analyze_name(name, resource_type);
    let check = match scheme {
        Some(path) => Some(load_naming_scheme(path)?.check_name(name, resource_type)),
        None => None,
    };
    write_json(&json!({ "analysis": analysis, "check": check }), output)
}

pub(super) fn example(scheme: Option<&Path>, company: &str, output: Option<&Path>) -> Result<()> {
    let scheme = match scheme {
        Some(path) => load_naming_scheme(path)?,
        None => NamingScheme::standard(company),
    };
    scheme.validate()?;
    write_json(
        &json!({
            "example": scheme.example_name(),
            "separator": scheme.effective_separator(),
            "caseFormat": scheme.case_format,
        }),
        output,
    )
}

pub(super) fn topology(config_dir: &Path, inventory: &Path, output: Option<&Path>) -> Result<()> {
    let config = load_project_config(config_dir)?;
    let resources = read_inventory(inventory)?;
    let (kept, _) = config.resource_filter()?.filter(&resources);
    write_json(&analyze_topology(&kept), output)
}
