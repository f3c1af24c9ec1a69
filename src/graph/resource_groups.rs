//! Resource-group statistics

use crate::models::ResourceDescriptor;
use crate::naming::classify_naming_pattern;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupStats {
    pub name: String,
    pub resource_count: usize,
    /// Short type → count
    pub type_distribution: BTreeMap<String, usize>,
    /// Naming pattern → count
    pub naming_patterns: BTreeMap<String, usize>,
    /// Most frequent short type, ties broken alphabetically
    pub primary_purpose: String,
}

/// Group statistics, ordered by group name. Group names compare
/// case-insensitively; the first spelling seen is reported.
pub fn resource_group_stats(resources: &[ResourceDescriptor]) -> Vec<ResourceGroupStats> {
    let mut groups: BTreeMap<String, ResourceGroupStats> = BTreeMap::new();

    for resource in resources {
        let key = resource.resource_group.to_ascii_lowercase();
        let stats = groups.entry(key).or_insert_with(|| ResourceGroupStats {
            name: resource.resource_group.clone(),
            resource_count: 0,
            type_distribution: BTreeMap::new(),
            naming_patterns: BTreeMap::new(),
            primary_purpose: String::new(),
        });
        stats.resource_count += 1;
        *stats
            .type_distribution
            .entry(resource.short_type().to_string())
            .or_insert(0) += 1;
        *stats
            .naming_patterns
            .entry(classify_naming_pattern(&resource.name).as_str().to_string())
            .or_insert(0) += 1;
    }

    groups
        .into_values()
        .map(|mut stats| {
            let mut best: Option<(&String, usize)> = None;
            // BTreeMap iterates alphabetically, so a strict `>` keeps the first on ties
            for (ty, &count) in &stats.type_distribution {
                if best.map_or(true, |(_, c)| count > c) {
                    best = Some((ty, count));
                }
            }
            stats.primary_purpose = best.map(|(t, _)| t.clone()).unwrap_or_default();
            stats
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn res(name: &str, ty: &str, group: &str) -> ResourceDescriptor {
        ResourceDescriptor::new(&format!("/{group}/{name}"), name, ty).with_resource_group(group)
    }

    #[test]
    fn test_group_stats() {
        let resources = vec![
            res("web-01", "Microsoft.Web/sites", "rg-app"),
            res("web-02", "Microsoft.Web/sites", "RG-APP"),
            res("asp-01", "Microsoft.Web/serverFarms", "rg-app"),
            res("dataVault", "Microsoft.KeyVault/vaults", "rg-data"),
            res("datadisk", "Microsoft.Compute/disks", "rg-data"),
        ];
        let stats = resource_group_stats(&resources);
        assert_eq!(stats.len(), 2);

        let app = &stats[0];
        assert_eq!(app.name, "rg-app");
        assert_eq!(app.resource_count, 3);
        assert_eq!(app.type_distribution.get("sites"), Some(&2));
        assert_eq!(app.naming_patterns.get("kebab-case"), Some(&3));
        assert_eq!(app.primary_purpose, "sites");

        // One disk and one vault: alphabetical tie-break
        let data = &stats[1];
        assert_eq!(data.primary_purpose, "disks");
        assert_eq!(data.naming_patterns.get("camelCase"), Some(&1));
        assert_eq!(data.naming_patterns.get("lowercase"), Some(&1));
    }
}
