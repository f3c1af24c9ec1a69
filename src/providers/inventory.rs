//! Resource inventory collaborators

use crate::error::ProviderError;
use crate::models::ResourceDescriptor;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Source of raw resource records.
///
/// Implementations must be `Send + Sync` so a single inventory can back
/// several concurrent assessments.
pub trait ResourceInventory: Send + Sync {
    /// Records for the given subscriptions; an empty list means all of them.
    fn list_resources(
        &self,
        subscription_ids: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<ResourceDescriptor>, ProviderError>;
}

fn in_subscriptions(resource: &ResourceDescriptor, subscription_ids: &[String]) -> bool {
    if subscription_ids.is_empty() {
        return true;
    }
    let id = resource.id.to_ascii_lowercase();
    subscription_ids.iter().any(|s| {
        resource.subscription_id.eq_ignore_ascii_case(s)
            || id.starts_with(&format!("/subscriptions/{}/", s.to_ascii_lowercase()))
    })
}

/// In-memory inventory, mostly for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    resources: Vec<ResourceDescriptor>,
}

impl StaticInventory {
    pub fn new(resources: Vec<ResourceDescriptor>) -> Self {
        Self { resources }
    }
}

impl ResourceInventory for StaticInventory {
    fn list_resources(
        &self,
        subscription_ids: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<ResourceDescriptor>, ProviderError> {
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }
        Ok(self
            .resources
            .iter()
            .filter(|r| in_subscriptions(r, subscription_ids))
            .cloned()
            .collect())
    }
}

/// Inventory backed by a JSON export: either an array of records or an
/// object with a `value` array
#[derive(Debug, Clone)]
pub struct JsonInventory {
    path: PathBuf,
}

impl JsonInventory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResourceInventory for JsonInventory {
    fn list_resources(
        &self,
        subscription_ids: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<ResourceDescriptor>, ProviderError> {
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }
        let path_label = self.path.display().to_string();
        let text = std::fs::read_to_string(&self.path).map_err(|source| ProviderError::Io {
            path: path_label.clone(),
            source,
        })?;
        let resources = parse_resource_snapshot(&text, &path_label)?;
        debug!("Loaded {} resources from {}", resources.len(), path_label);
        Ok(resources
            .into_iter()
            .filter(|r| in_subscriptions(r, subscription_ids))
            .collect())
    }
}

/// Parse a snapshot document. Records that are not objects or lack an id
/// are skipped rather than failing the whole snapshot.
pub fn parse_resource_snapshot(text: &str, origin: &str) -> Result<Vec<ResourceDescriptor>, ProviderError> {
    let doc: Value = serde_json::from_str(text).map_err(|e| ProviderError::Parse {
        path: origin.to_string(),
        message: e.to_string(),
    })?;

    let items = match doc {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("value") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(ProviderError::Parse {
                    path: origin.to_string(),
                    message: "expected an array or an object with a `value` array".to_string(),
                })
            }
        },
        _ => {
            return Err(ProviderError::Parse {
                path: origin.to_string(),
                message: "expected an array or an object with a `value` array".to_string(),
            })
        }
    };

    let total = items.len();
    let resources: Vec<ResourceDescriptor> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<ResourceDescriptor>(item).ok())
        .filter(|r| !r.id.is_empty())
        .collect();
    if resources.len() < total {
        debug!(
            "Skipped {} malformed records in {}",
            total - resources.len(),
            origin
        );
    }
    Ok(resources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SNAPSHOT: &str = r#"{
        "value": [
            {"id": "/subscriptions/s1/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/vm1",
             "name": "vm1", "type": "Microsoft.Compute/virtualMachines",
             "properties": "{\"osProfile\": {\"computerName\": \"vm1\"}}"},
            {"id": "/subscriptions/s2/resourceGroups/rg/providers/Microsoft.Web/sites/app1",
             "name": "app1", "type": "Microsoft.Web/sites", "subscriptionId": "s2",
             "properties": "not json at all"},
            {"name": "no-id"},
            42
        ]
    }"#;

    #[test]
    fn test_parse_snapshot_skips_malformed_records() {
        let resources = parse_resource_snapshot(SNAPSHOT, "inline").expect("parse");
        assert_eq!(resources.len(), 2);
        assert_eq!(
            resources[0].properties.str_at("/osProfile/computerName"),
            Some("vm1")
        );
        assert!(!resources[1].properties.is_parsed());
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        let err = parse_resource_snapshot("{\"items\": []}", "inline").unwrap_err();
        assert!(matches!(err, ProviderError::Parse { .. }));
    }

    #[test]
    fn test_json_inventory_filters_subscriptions() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SNAPSHOT.as_bytes()).expect("write");

        let inventory = JsonInventory::new(file.path());
        let token = CancellationToken::new();
        assert_eq!(inventory.list_resources(&[], &token).expect("all").len(), 2);
        let s1 = inventory
            .list_resources(&["S1".to_string()], &token)
            .expect("s1");
        assert_eq!(s1.len(), 1);
        assert_eq!(s1[0].name, "vm1");
    }

    #[test]
    fn test_cancelled_inventory_call() {
        let token = CancellationToken::new();
        token.cancel();
        let err = StaticInventory::default().list_resources(&[], &token).unwrap_err();
        assert!(matches!(err, ProviderError::Cancelled));
    }
}
