//! Chains, per-resource summaries and network topology classification

use super::store::DependencyGraph;
use super::store_models::{types, RelationType};
use crate::models::ResourceDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// VM → NIC(s) → public IP(s) → NSG(s) → VNet(s) → disk(s)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmChain {
    pub vm_id: String,
    pub vm_name: String,
    pub nics: Vec<String>,
    pub public_ips: Vec<String>,
    pub nsgs: Vec<String>,
    pub vnets: Vec<String>,
    pub disks: Vec<String>,
    pub rendering: String,
}

impl VmChain {
    /// Reachable through a public IP without any NSG in front of it
    pub fn is_exposed(&self) -> bool {
        !self.public_ips.is_empty() && self.nsgs.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VnetSummary {
    pub vnet_id: String,
    pub name: String,
    pub subnets: usize,
    pub nsgs: usize,
    pub nics: usize,
    pub gateways: usize,
    pub peerings: usize,
    pub connected_resources: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSummary {
    pub storage_id: String,
    pub name: String,
    pub vms: usize,
    /// Unmanaged VHDs stored in the account
    pub disks: usize,
    pub private_endpoints: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseServerSummary {
    pub server_id: String,
    pub name: String,
    pub databases: usize,
    pub private_endpoints: usize,
    pub connected_apps: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkTopology {
    NoNetwork,
    HubAndSpoke,
    Isolated,
    Flat,
}

impl NetworkTopology {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkTopology::NoNetwork => "no-network",
            NetworkTopology::HubAndSpoke => "hub-and-spoke",
            NetworkTopology::Isolated => "isolated",
            NetworkTopology::Flat => "flat",
        }
    }
}

fn names(resources: &[&ResourceDescriptor]) -> Vec<String> {
    resources.iter().map(|r| r.name.clone()).collect()
}

fn render_section(label: &str, items: &[String]) -> String {
    if items.is_empty() {
        format!("{}(none)", label)
    } else {
        format!("{}({})", label, items.join(", "))
    }
}

pub fn vm_chain(graph: &DependencyGraph<'_>, vm: &ResourceDescriptor) -> VmChain {
    let nics = graph.outgoing(&vm.id, RelationType::AttachedNic);

    let mut public_ips = BTreeSet::new();
    let mut nsgs = BTreeSet::new();
    let mut vnets = BTreeSet::new();
    for nic in &nics {
        public_ips.extend(names(&graph.outgoing(&nic.id, RelationType::UsesPublicIp)));
        nsgs.extend(names(&graph.outgoing(&nic.id, RelationType::SecuredBy)));
        vnets.extend(names(&graph.outgoing(&nic.id, RelationType::MemberOfVnet)));
        for subnet in nic
            .properties
            .ids_at("/ipConfigurations", "/properties/subnet/id")
        {
            if let Some(nsg) = graph.subnet_nsg(subnet) {
                nsgs.insert(nsg.name.clone());
            }
        }
    }

    let nics = names(&nics);
    let public_ips: Vec<String> = public_ips.into_iter().collect();
    let nsgs: Vec<String> = nsgs.into_iter().collect();
    let vnets: Vec<String> = vnets.into_iter().collect();
    let disks = names(&graph.outgoing(&vm.id, RelationType::AttachedDisk));

    let rendering = [
        vm.name.clone(),
        render_section("NIC", &nics),
        render_section("PIP", &public_ips),
        render_section("NSG", &nsgs),
        render_section("VNet", &vnets),
        render_section("Disk", &disks),
    ]
    .join(" -> ");

    VmChain {
        vm_id: vm.id.clone(),
        vm_name: vm.name.clone(),
        nics,
        public_ips,
        nsgs,
        vnets,
        disks,
        rendering,
    }
}

pub fn vm_chains(graph: &DependencyGraph<'_>) -> Vec<VmChain> {
    graph
        .resources_of_type(types::VIRTUAL_MACHINE)
        .into_iter()
        .map(|vm| vm_chain(graph, vm))
        .collect()
}

/// Distinct VNets peered with `vnet` in either direction
fn peers<'a>(graph: &DependencyGraph<'a>, vnet: &ResourceDescriptor) -> BTreeSet<&'a str> {
    graph
        .outgoing(&vnet.id, RelationType::PeeredWith)
        .into_iter()
        .chain(graph.incoming(&vnet.id, RelationType::PeeredWith))
        .map(|r| r.id.as_str())
        .collect()
}

/// Resources attached to a VNet: direct members plus the VMs behind member NICs
pub fn vnet_attached_resources<'a>(
    graph: &DependencyGraph<'a>,
    vnet: &ResourceDescriptor,
) -> Vec<&'a ResourceDescriptor> {
    let mut seen = BTreeSet::new();
    let mut attached = Vec::new();
    for member in graph.incoming(&vnet.id, RelationType::MemberOfVnet) {
        if seen.insert(member.id_key()) {
            attached.push(member);
        }
        if member.is_type(types::NIC) {
            for vm in graph.incoming(&member.id, RelationType::AttachedNic) {
                if seen.insert(vm.id_key()) {
                    attached.push(vm);
                }
            }
        }
    }
    attached
}

pub fn vnet_summary(graph: &DependencyGraph<'_>, vnet: &ResourceDescriptor) -> VnetSummary {
    let members = graph.incoming(&vnet.id, RelationType::MemberOfVnet);
    let subnet_records = members.iter().filter(|r| r.is_type(types::SUBNET)).count();
    let declared_subnets = vnet.properties.array_at("/subnets").len();

    VnetSummary {
        vnet_id: vnet.id.clone(),
        name: vnet.name.clone(),
        subnets: declared_subnets.max(subnet_records),
        nsgs: graph.outgoing(&vnet.id, RelationType::SecuredBy).len(),
        nics: members.iter().filter(|r| r.is_type(types::NIC)).count(),
        gateways: members.iter().filter(|r| r.is_type(types::VNET_GATEWAY)).count(),
        peerings: peers(graph, vnet).len(),
        connected_resources: vnet_attached_resources(graph, vnet)
            .iter()
            .filter(|r| !r.is_type(types::SUBNET))
            .count(),
    }
}

pub fn storage_summary(graph: &DependencyGraph<'_>, account: &ResourceDescriptor) -> StorageSummary {
    let host_prefix = format!("{}.", account.name.to_ascii_lowercase());
    let in_account = |uri: &str| {
        let rest = uri.split_once("://").map(|(_, r)| r).unwrap_or(uri);
        rest.to_ascii_lowercase().starts_with(&host_prefix)
    };

    let vms = graph.incoming(&account.id, RelationType::UsesStorage);
    let disks: usize = vms
        .iter()
        .map(|vm| {
            let os = vm
                .properties
                .str_at("/storageProfile/osDisk/vhd/uri")
                .filter(|u| in_account(*u))
                .is_some() as usize;
            let data = vm
                .properties
                .ids_at("/storageProfile/dataDisks", "/vhd/uri")
                .into_iter()
                .filter(|u| in_account(*u))
                .count();
            os + data
        })
        .sum();

    StorageSummary {
        storage_id: account.id.clone(),
        name: account.name.clone(),
        vms: vms.len(),
        disks,
        private_endpoints: graph
            .incoming(&account.id, RelationType::PrivateEndpointFor)
            .len(),
    }
}

pub fn database_server_summary(graph: &DependencyGraph<'_>, server: &ResourceDescriptor) -> DatabaseServerSummary {
    DatabaseServerSummary {
        server_id: server.id.clone(),
        name: server.name.clone(),
        databases: graph.incoming(&server.id, RelationType::ChildOf).len(),
        private_endpoints: graph
            .incoming(&server.id, RelationType::PrivateEndpointFor)
            .len(),
        connected_apps: graph.incoming(&server.id, RelationType::ConnectsTo).len(),
    }
}

pub fn classify_topology(graph: &DependencyGraph<'_>) -> NetworkTopology {
    let vnets = graph.resources_of_type(types::VNET);
    if vnets.is_empty() {
        return NetworkTopology::NoNetwork;
    }

    let has_gateway = !graph.resources_of_type(types::VNET_GATEWAY).is_empty();
    let has_hub = vnets.iter().any(|v| peers(graph, v).len() >= 2);
    if vnets.len() >= 2 && (has_hub || has_gateway) {
        return NetworkTopology::HubAndSpoke;
    }

    let has_public_ip = !graph.resources_of_type(types::PUBLIC_IP).is_empty();
    if !has_public_ip && !has_gateway {
        return NetworkTopology::Isolated;
    }

    NetworkTopology::Flat
}

/// NICs, disks and public IPs nothing in the snapshot uses
pub fn orphaned_resources<'a>(graph: &DependencyGraph<'a>) -> Vec<&'a ResourceDescriptor> {
    graph
        .resources()
        .filter(|r| {
            if r.is_type(types::NIC) {
                !graph.has_incoming(&r.id, RelationType::AttachedNic)
            } else if r.is_type(types::DISK) {
                !graph.has_incoming(&r.id, RelationType::AttachedDisk)
            } else if r.is_type(types::PUBLIC_IP) {
                !graph.has_incoming(&r.id, RelationType::UsesPublicIp)
            } else {
                false
            }
        })
        .collect()
}
