//! Shared graph fixtures for unit tests

use crate::models::ResourceDescriptor;
use serde_json::json;

pub const VM: &str = "/rg/providers/Microsoft.Compute/virtualMachines/app-prod-vm-01";
pub const NIC: &str = "/rg/providers/Microsoft.Network/networkInterfaces/app-prod-nic-01";
pub const PIP: &str = "/rg/providers/Microsoft.Network/publicIPAddresses/app-prod-pip-01";
pub const OS_DISK: &str = "/rg/providers/Microsoft.Compute/disks/app-prod-osdisk-01";
pub const DATA_DISK: &str = "/rg/providers/Microsoft.Compute/disks/app-prod-datadisk-01";
pub const STORAGE: &str = "/rg/providers/Microsoft.Storage/storageAccounts/appproddiag";
pub const HUB: &str = "/rg/providers/Microsoft.Network/virtualNetworks/hub-prod-vnet";
pub const SPOKE_DEV: &str = "/rg/providers/Microsoft.Network/virtualNetworks/spoke-dev-vnet";
pub const SPOKE_TEST: &str = "/rg/providers/Microsoft.Network/virtualNetworks/spoke-test-vnet";
pub const NSG: &str = "/rg/providers/Microsoft.Network/networkSecurityGroups/data-prod-nsg";
pub const SQL: &str = "/rg/providers/Microsoft.Sql/servers/orders-sqlsrv";
pub const PLAN: &str = "/rg/providers/Microsoft.Web/serverFarms/app-prod-asp";
pub const WEB: &str = "/rg/providers/Microsoft.Web/sites/app-prod-web";
pub const PEP: &str = "/rg/providers/Microsoft.Network/privateEndpoints/orders-pep";

fn res(id: &str, ty: &str) -> ResourceDescriptor {
    let name = id.rsplit('/').next().unwrap_or(id);
    ResourceDescriptor::new(id, name, ty).with_resource_group("rg-app")
}

/// Hub VNet peered with two spokes, one internet-facing VM, a SQL server
/// reached by a web app and a private endpoint.
pub fn sample_network() -> Vec<ResourceDescriptor> {
    vec![
        res(VM, "Microsoft.Compute/virtualMachines")
            .with_tag("environment", "prod")
            .with_properties(json!({
                "networkProfile": {"networkInterfaces": [{"id": NIC}]},
                "storageProfile": {
                    "osDisk": {"managedDisk": {"id": OS_DISK}},
                    "dataDisks": [{"managedDisk": {"id": DATA_DISK}}]
                },
                "diagnosticsProfile": {
                    "bootDiagnostics": {"storageUri": "https://appproddiag.blob.core.windows.net/"}
                }
            })),
        res(NIC, "Microsoft.Network/networkInterfaces").with_properties(json!({
            "ipConfigurations": [{
                "properties": {
                    "publicIPAddress": {"id": PIP},
                    "subnet": {"id": format!("{HUB}/subnets/app")}
                }
            }],
            "networkSecurityGroup": {"id": "/rg/providers/Microsoft.Network/networkSecurityGroups/missing-nsg"}
        })),
        res(PIP, "Microsoft.Network/publicIPAddresses"),
        res(OS_DISK, "Microsoft.Compute/disks").with_properties(json!({"managedBy": VM})),
        res(DATA_DISK, "Microsoft.Compute/disks"),
        res(STORAGE, "Microsoft.Storage/storageAccounts").with_tag("env", "prod"),
        res(HUB, "Microsoft.Network/virtualNetworks").with_properties(json!({
            "subnets": [
                {"id": format!("{HUB}/subnets/app"), "properties": {}},
                {"id": format!("{HUB}/subnets/data"), "properties": {"networkSecurityGroup": {"id": NSG}}}
            ],
            "virtualNetworkPeerings": [
                {"properties": {"remoteVirtualNetwork": {"id": SPOKE_DEV}}},
                {"properties": {"remoteVirtualNetwork": {"id": SPOKE_TEST}}}
            ]
        })),
        res(NSG, "Microsoft.Network/networkSecurityGroups"),
        res(SPOKE_DEV, "Microsoft.Network/virtualNetworks"),
        res(SPOKE_TEST, "Microsoft.Network/virtualNetworks"),
        res(SQL, "Microsoft.Sql/servers"),
        res(&format!("{SQL}/databases/orders"), "Microsoft.Sql/servers/databases"),
        res(PLAN, "Microsoft.Web/serverFarms"),
        res(WEB, "Microsoft.Web/sites").with_properties(json!({
            "serverFarmId": PLAN,
            "siteConfig": {"connectionStrings": [
                {"connectionString": "Server=tcp:orders-sqlsrv.database.windows.net;Database=orders"}
            ]}
        })),
        res(PEP, "Microsoft.Network/privateEndpoints").with_properties(json!({
            "privateLinkServiceConnections": [{"properties": {"privateLinkServiceId": SQL}}],
            "subnet": {"id": format!("{HUB}/subnets/data")}
        })),
    ]
}
