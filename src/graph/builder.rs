//! Dependency edge inference
//!
//! Edges are derived from type-specific property fields. Every reference
//! that names an id outside the snapshot is counted as dangling.

use super::store::DependencyGraph;
use super::store_models::{types, RelationType};
use crate::models::ResourceDescriptor;
use std::collections::HashMap;
use tracing::debug;

/// Build the dependency graph over an (already filtered) snapshot
pub fn build_dependency_graph(resources: &[ResourceDescriptor]) -> DependencyGraph<'_> {
    let mut graph = DependencyGraph::with_nodes(resources);

    let storage_by_name: HashMap<String, &str> = resources
        .iter()
        .filter(|r| r.is_type(types::STORAGE_ACCOUNT))
        .map(|r| (r.name.to_ascii_lowercase(), r.id.as_str()))
        .collect();
    let db_servers: Vec<&ResourceDescriptor> = resources
        .iter()
        .filter(|r| types::is_database_server(&r.type_lower()))
        .collect();

    for resource in resources {
        match resource.type_lower().as_str() {
            types::VIRTUAL_MACHINE => link_vm(&mut graph, resource, &storage_by_name),
            types::NIC => link_nic(&mut graph, resource),
            types::VNET => link_vnet(&mut graph, resource),
            types::SUBNET => match vnet_of_subnet(&resource.id) {
                Some(vnet) => {
                    graph.link(&resource.id, vnet, RelationType::MemberOfVnet);
                }
                None => graph.record_dangling(),
            },
            types::VNET_GATEWAY => link_gateway(&mut graph, resource),
            types::PRIVATE_ENDPOINT => link_private_endpoint(&mut graph, resource),
            types::WEB_SITE => link_web_app(&mut graph, resource, &db_servers),
            types::DISK => link_disk_owner(&mut graph, resource),
            t if types::is_database(t) => {
                if let Some(server) = parent_of_database(&resource.id) {
                    graph.link(&resource.id, server, RelationType::ChildOf);
                }
            }
            _ => {}
        }
    }

    debug!(
        "Dependency graph: {} nodes, {} edges, {} dangling references",
        graph.node_count(),
        graph.edge_count(),
        graph.dangling_references()
    );

    graph
}

fn link_vm(graph: &mut DependencyGraph<'_>, vm: &ResourceDescriptor, storage_by_name: &HashMap<String, &str>) {
    let props = &vm.properties;

    for nic in props.ids_at("/networkProfile/networkInterfaces", "/id") {
        graph.link(&vm.id, nic, RelationType::AttachedNic);
    }

    if let Some(disk) = props.str_at("/storageProfile/osDisk/managedDisk/id") {
        graph.link(&vm.id, disk, RelationType::AttachedDisk);
    }
    for disk in props.ids_at("/storageProfile/dataDisks", "/managedDisk/id") {
        graph.link(&vm.id, disk, RelationType::AttachedDisk);
    }

    let mut uris: Vec<&str> = Vec::new();
    uris.extend(props.str_at("/diagnosticsProfile/bootDiagnostics/storageUri"));
    uris.extend(props.str_at("/storageProfile/osDisk/vhd/uri"));
    uris.extend(props.ids_at("/storageProfile/dataDisks", "/vhd/uri"));
    for uri in uris {
        match storage_account_from_uri(uri).and_then(|name| storage_by_name.get(&name)) {
            Some(account) => {
                graph.link(&vm.id, account, RelationType::UsesStorage);
            }
            None => graph.record_dangling(),
        }
    }
}

fn link_nic(graph: &mut DependencyGraph<'_>, nic: &ResourceDescriptor) {
    let props = &nic.properties;

    for pip in props.ids_at("/ipConfigurations", "/properties/publicIPAddress/id") {
        graph.link(&nic.id, pip, RelationType::UsesPublicIp);
    }
    for subnet in props.ids_at("/ipConfigurations", "/properties/subnet/id") {
        link_subnet_vnet(graph, &nic.id, subnet);
    }
    if let Some(nsg) = props.str_at("/networkSecurityGroup/id") {
        graph.link(&nic.id, nsg, RelationType::SecuredBy);
    }
}

fn link_vnet(graph: &mut DependencyGraph<'_>, vnet: &ResourceDescriptor) {
    for subnet in vnet.properties.array_at("/subnets") {
        let nsg = subnet
            .pointer("/properties/networkSecurityGroup/id")
            .and_then(|v| v.as_str());
        if let Some(nsg) = nsg {
            graph.link(&vnet.id, nsg, RelationType::SecuredBy);
            if let Some(subnet_id) = subnet.pointer("/id").and_then(|v| v.as_str()) {
                graph.record_subnet_nsg(subnet_id, nsg);
            }
        }
    }

    for remote in vnet
        .properties
        .ids_at("/virtualNetworkPeerings", "/properties/remoteVirtualNetwork/id")
    {
        graph.link(&vnet.id, remote, RelationType::PeeredWith);
    }
}

fn link_gateway(graph: &mut DependencyGraph<'_>, gateway: &ResourceDescriptor) {
    let props = &gateway.properties;
    for subnet in props.ids_at("/ipConfigurations", "/properties/subnet/id") {
        link_subnet_vnet(graph, &gateway.id, subnet);
    }
    for pip in props.ids_at("/ipConfigurations", "/properties/publicIPAddress/id") {
        graph.link(&gateway.id, pip, RelationType::UsesPublicIp);
    }
}

fn link_private_endpoint(graph: &mut DependencyGraph<'_>, endpoint: &ResourceDescriptor) {
    let props = &endpoint.properties;
    let targets = props
        .ids_at("/privateLinkServiceConnections", "/properties/privateLinkServiceId")
        .into_iter()
        .chain(props.ids_at(
            "/manualPrivateLinkServiceConnections",
            "/properties/privateLinkServiceId",
        ));
    for target in targets {
        graph.link(&endpoint.id, target, RelationType::PrivateEndpointFor);
    }
    if let Some(subnet) = props.str_at("/subnet/id") {
        link_subnet_vnet(graph, &endpoint.id, subnet);
    }
}

fn link_web_app(graph: &mut DependencyGraph<'_>, app: &ResourceDescriptor, db_servers: &[&ResourceDescriptor]) {
    if let Some(plan) = app.properties.str_at("/serverFarmId") {
        graph.link(&app.id, plan, RelationType::HostedOn);
    }

    if db_servers.is_empty() {
        return;
    }
    let text = app.properties.search_text();
    if text.is_empty() {
        return;
    }
    for server in db_servers {
        let name = server.name.to_lowercase();
        if name.chars().count() >= 3 && text.contains(&name) {
            graph.link(&app.id, &server.id, RelationType::ConnectsTo);
        }
    }
}

fn link_disk_owner(graph: &mut DependencyGraph<'_>, disk: &ResourceDescriptor) {
    let Some(owner) = disk.properties.str_at("/managedBy") else {
        return;
    };
    if graph.contains(owner) {
        graph.link(owner, &disk.id, RelationType::AttachedDisk);
    } else {
        graph.record_dangling();
    }
}

/// Link a member to the VNet owning `subnet_id`
fn link_subnet_vnet(graph: &mut DependencyGraph<'_>, member_id: &str, subnet_id: &str) {
    match vnet_of_subnet(subnet_id) {
        Some(vnet) => {
            graph.link(member_id, vnet, RelationType::MemberOfVnet);
        }
        None => graph.record_dangling(),
    }
}

/// VNet id prefix of a subnet id (`.../virtualNetworks/v1/subnets/s1` → `.../virtualNetworks/v1`)
pub fn vnet_of_subnet(subnet_id: &str) -> Option<&str> {
    let pos = subnet_id.to_ascii_lowercase().rfind("/subnets/")?;
    Some(&subnet_id[..pos])
}

/// Server id prefix of a database id
pub fn parent_of_database(database_id: &str) -> Option<&str> {
    let pos = database_id.to_ascii_lowercase().rfind("/databases/")?;
    Some(&database_id[..pos])
}

/// Storage account name from a blob endpoint (`https://acct.blob.core.windows.net/...`)
fn storage_account_from_uri(uri: &str) -> Option<String> {
    let rest = uri.split_once("://").map(|(_, r)| r).unwrap_or(uri);
    let host = rest.split('/').next()?;
    let account = host.split('.').next()?;
    if account.is_empty() {
        None
    } else {
        Some(account.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::testing::sample_network;

    #[test]
    fn test_id_helpers() {
        assert_eq!(
            vnet_of_subnet("/s/rg/providers/Microsoft.Network/virtualNetworks/v1/Subnets/a"),
            Some("/s/rg/providers/Microsoft.Network/virtualNetworks/v1")
        );
        assert_eq!(vnet_of_subnet("/s/rg/nic"), None);
        assert_eq!(
            parent_of_database("/s/providers/Microsoft.Sql/servers/sql1/databases/orders"),
            Some("/s/providers/Microsoft.Sql/servers/sql1")
        );
        assert_eq!(
            storage_account_from_uri("https://diagacct.blob.core.windows.net/"),
            Some("diagacct".to_string())
        );
    }

    #[test]
    fn test_vm_chain_edges() {
        let resources = sample_network();
        let graph = build_dependency_graph(&resources);

        let vm = "/rg/providers/Microsoft.Compute/virtualMachines/app-prod-vm-01";
        let nics = graph.outgoing(vm, RelationType::AttachedNic);
        assert_eq!(nics.len(), 1);
        let disks = graph.outgoing(vm, RelationType::AttachedDisk);
        assert_eq!(disks.len(), 2);
        assert_eq!(graph.outgoing(vm, RelationType::UsesStorage).len(), 1);

        let nic = nics[0];
        assert_eq!(graph.outgoing(&nic.id, RelationType::UsesPublicIp).len(), 1);
        assert_eq!(graph.outgoing(&nic.id, RelationType::MemberOfVnet).len(), 1);
    }

    #[test]
    fn test_peering_database_and_web_edges() {
        let resources = sample_network();
        let graph = build_dependency_graph(&resources);

        assert_eq!(graph.edges_of(RelationType::PeeredWith), 2);
        assert_eq!(graph.edges_of(RelationType::ChildOf), 1);
        assert_eq!(graph.edges_of(RelationType::HostedOn), 1);
        assert_eq!(graph.edges_of(RelationType::ConnectsTo), 1);
        assert_eq!(graph.edges_of(RelationType::PrivateEndpointFor), 1);
    }

    #[test]
    fn test_disk_managed_by_does_not_duplicate_vm_edge() {
        let resources = sample_network();
        let graph = build_dependency_graph(&resources);
        // Both the VM and the disk's managedBy describe the OS disk attachment
        assert_eq!(graph.edges_of(RelationType::AttachedDisk), 2);
    }

    #[test]
    fn test_dangling_reference_counted() {
        let resources = sample_network();
        let graph = build_dependency_graph(&resources);
        // NIC references an NSG outside the snapshot
        assert_eq!(graph.dangling_references(), 1);
    }

    #[test]
    fn test_unparsed_properties_are_tolerated() {
        let mut resources = sample_network();
        for r in resources.iter_mut() {
            r.properties = crate::models::PropertyBlob::from_raw("not json");
        }
        let graph = build_dependency_graph(&resources);
        // Database records still derive their server from the id
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edges_of(RelationType::ChildOf), 1);
    }
}
