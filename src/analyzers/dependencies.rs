//! Dependency and network topology analyzer

use super::base::{finish, AnalysisContext, Analyzer};
use crate::graph::{
    build_dependency_graph, classify_topology, environment_mixing, orphaned_resources, types,
    vm_chains,
};
use crate::models::{AnalysisResult, Finding, Severity};
use crate::scoring::{category, dependencies_score};
use anyhow::Result;
use tracing::debug;

pub struct DependenciesAnalyzer;

impl DependenciesAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DependenciesAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for DependenciesAnalyzer {
    fn name(&self) -> &'static str {
        "dependencies"
    }

    fn category(&self) -> &'static str {
        category::DEPENDENCIES
    }

    fn description(&self) -> &'static str {
        "Reports environment mixing, exposed VMs and orphaned network resources"
    }

    fn analyze_enhanced(&self, ctx: &AnalysisContext<'_>) -> Result<AnalysisResult> {
        let mut result = AnalysisResult::new(self.name(), self.category());
        let graph = build_dependency_graph(ctx.resources);
        ctx.check_cancelled()?;

        let mixing = environment_mixing(&graph);
        for m in &mixing {
            result.findings.push(m.to_finding(category::DEPENDENCIES));
        }

        let chains = vm_chains(&graph);
        let exposed: Vec<_> = chains.iter().filter(|c| c.is_exposed()).collect();
        for chain in &exposed {
            result.findings.push(
                Finding::new(
                    category::DEPENDENCIES,
                    chain.vm_id.as_str(),
                    chain.vm_name.as_str(),
                    Severity::High,
                    format!(
                        "VM {} is reachable through public IP {} with no network security group",
                        chain.vm_name,
                        chain.public_ips.join(", ")
                    ),
                    "Attach an NSG to the NIC or subnet, or remove the public IP and use a bastion host",
                )
                .with_effort("hours"),
            );
        }

        let orphans = orphaned_resources(&graph);
        for orphan in &orphans {
            result.findings.push(Finding::for_resource(
                category::DEPENDENCIES,
                orphan,
                Severity::Low,
                format!("{} '{}' is not attached to anything", orphan.short_type(), orphan.name),
                "Delete the resource if it is no longer needed",
            ));
        }

        debug!(
            "Dependencies: {} nodes, {} edges, {} mixing, {} exposed, {} orphans",
            graph.node_count(),
            graph.edge_count(),
            mixing.len(),
            exposed.len(),
            orphans.len()
        );

        result.set_metric("topology", classify_topology(&graph).as_str());
        result.set_metric("node_count", graph.node_count());
        result.set_metric("edge_count", graph.edge_count());
        result.set_metric("dangling_references", graph.dangling_references());
        result.set_metric("virtual_networks", graph.resources_of_type(types::VNET).len());
        result.set_metric("virtual_machines", chains.len());
        result.set_metric("environment_mixing", mixing.len());
        result.set_metric("exposed_vms", exposed.len());
        result.set_metric("orphaned_resources", orphans.len());
        result.resources_analyzed = ctx.resources.len();

        let base = dependencies_score(mixing.len(), exposed.len(), orphans.len());
        Ok(finish(result, base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectConfig;
    use crate::graph::testing::sample_network;
    use crate::models::{MetricValue, ResourceDescriptor};
    use crate::providers::NoDirectory;
    use chrono::Utc;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn test_exposed_vm_and_orphan() {
        let mut resources = sample_network();
        resources.push(ResourceDescriptor::new(
            "/rg/providers/Microsoft.Network/publicIPAddresses/old-pip",
            "old-pip",
            "Microsoft.Network/publicIPAddresses",
        ));
        let config = ProjectConfig::default();
        let cancel = CancellationToken::new();
        let ctx = AnalysisContext {
            resources: &resources,
            all_resources: &resources,
            scheme: None,
            config: &config,
            directory: &NoDirectory,
            cancel: &cancel,
            as_of: Utc::now(),
        };
        let result = DependenciesAnalyzer::new().analyze_enhanced(&ctx).expect("dependencies");

        assert_eq!(result.findings.len(), 2);
        assert_eq!(result.findings[0].severity, Severity::High);
        assert_eq!(result.findings[0].resource_name, "app-prod-vm-01");
        assert_eq!(result.findings[1].resource_name, "old-pip");
        assert_eq!(result.metric("dependencies_score"), Some(&MetricValue::Decimal(97.0)));
        assert_eq!(result.score, 89.0);
        assert_eq!(
            result.metric("topology"),
            Some(&MetricValue::Text("hub-and-spoke".into()))
        );
    }

    #[test]
    fn test_cancelled_before_analysis() {
        let resources = sample_network();
        let config = ProjectConfig::default();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let ctx = AnalysisContext {
            resources: &resources,
            all_resources: &resources,
            scheme: None,
            config: &config,
            directory: &NoDirectory,
            cancel: &cancel,
            as_of: Utc::now(),
        };
        assert!(DependenciesAnalyzer::new().analyze_enhanced(&ctx).is_err());
    }
}
