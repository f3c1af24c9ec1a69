//! Dependency graph builder
//!
//! Cross-references a filtered snapshot to build per-resource dependency
//! chains and aggregate topology statistics. Pure Rust, built on petgraph.

mod builder;
mod environment;
mod resource_groups;
mod store;
mod store_models;
mod topology;

#[cfg(test)]
pub(crate) mod testing;

pub use builder::{build_dependency_graph, parent_of_database, vnet_of_subnet};
pub use environment::{
    detect_environment, environment_mixing, mixing_severity, EnvironmentMixing,
    ENVIRONMENT_TAG_KEYS,
};
pub use resource_groups::{resource_group_stats, ResourceGroupStats};
pub use store::DependencyGraph;
pub use store_models::{types, DependencyEdge, RelationType};
pub use topology::{
    classify_topology, database_server_summary, orphaned_resources, storage_summary,
    vm_chain, vm_chains, vnet_attached_resources, vnet_summary, DatabaseServerSummary,
    NetworkTopology, StorageSummary, VmChain, VnetSummary,
};

use crate::models::ResourceDescriptor;
use serde::{Deserialize, Serialize};

/// Everything the graph builder derives from one snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyReport {
    pub topology: NetworkTopology,
    pub node_count: usize,
    pub edge_count: usize,
    pub dangling_references: usize,
    pub edges: Vec<DependencyEdge>,
    pub vm_chains: Vec<VmChain>,
    pub virtual_networks: Vec<VnetSummary>,
    pub storage_accounts: Vec<StorageSummary>,
    pub database_servers: Vec<DatabaseServerSummary>,
    pub resource_groups: Vec<ResourceGroupStats>,
    pub environment_mixing: Vec<EnvironmentMixing>,
    /// Names of NICs, disks and public IPs nothing uses
    pub orphaned_resources: Vec<String>,
}

impl TopologyReport {
    pub fn exposed_vms(&self) -> impl Iterator<Item = &VmChain> {
        self.vm_chains.iter().filter(|c| c.is_exposed())
    }
}

/// Build the graph and collect every summary in one pass
pub fn analyze_topology(resources: &[ResourceDescriptor]) -> TopologyReport {
    let graph = build_dependency_graph(resources);

    TopologyReport {
        topology: classify_topology(&graph),
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        dangling_references: graph.dangling_references(),
        edges: graph.edges(),
        vm_chains: vm_chains(&graph),
        virtual_networks: graph
            .resources_of_type(types::VNET)
            .into_iter()
            .map(|v| vnet_summary(&graph, v))
            .collect(),
        storage_accounts: graph
            .resources_of_type(types::STORAGE_ACCOUNT)
            .into_iter()
            .map(|s| storage_summary(&graph, s))
            .collect(),
        database_servers: graph
            .resources()
            .filter(|r| types::is_database_server(&r.type_lower()))
            .map(|s| database_server_summary(&graph, s))
            .collect(),
        resource_groups: resource_group_stats(resources),
        environment_mixing: environment_mixing(&graph),
        orphaned_resources: orphaned_resources(&graph)
            .into_iter()
            .map(|r| r.name.clone())
            .collect(),
    }
}
