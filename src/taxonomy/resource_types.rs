//! Resource type → abbreviation table
//!
//! Types are stored lowercased; the first abbreviation of each entry is the
//! primary one.

use super::ResourceCategory;
use super::ResourceCategory::*;

/// One row of the resource-type registry
#[derive(Debug, Clone, Copy)]
pub struct ResourceTypeEntry {
    pub resource_type: &'static str,
    pub category: ResourceCategory,
    pub abbreviations: &'static [&'static str],
}

const fn entry(
    resource_type: &'static str,
    category: ResourceCategory,
    abbreviations: &'static [&'static str],
) -> ResourceTypeEntry {
    ResourceTypeEntry {
        resource_type,
        category,
        abbreviations,
    }
}

pub(super) const RESOURCE_TYPES: &[ResourceTypeEntry] = &[
    // Compute
    entry("microsoft.compute/virtualmachines", Compute, &["vm", "vms", "virtualmachine"]),
    entry("microsoft.compute/virtualmachinescalesets", Compute, &["vmss", "ss"]),
    entry("microsoft.compute/disks", Compute, &["disk", "osdisk", "datadisk", "dsk"]),
    entry("microsoft.compute/availabilitysets", Compute, &["avail", "as"]),
    entry("microsoft.compute/snapshots", Compute, &["snap"]),
    entry("microsoft.compute/images", Compute, &["img"]),
    entry("microsoft.compute/galleries", Compute, &["gal"]),
    entry("microsoft.containerservice/managedclusters", Compute, &["aks"]),
    entry("microsoft.containerinstance/containergroups", Compute, &["ci", "aci"]),
    entry("microsoft.containerregistry/registries", Compute, &["cr", "acr"]),
    entry("microsoft.batch/batchaccounts", Compute, &["ba"]),
    // Storage
    entry("microsoft.storage/storageaccounts", Storage, &["st", "sa"]),
    entry("microsoft.recoveryservices/vaults", Storage, &["rsv"]),
    entry("microsoft.dataprotection/backupvaults", Storage, &["bvault"]),
    entry("microsoft.netapp/netappaccounts", Storage, &["anf"]),
    // Network
    entry("microsoft.network/virtualnetworks", Network, &["vnet"]),
    entry("microsoft.network/virtualnetworks/subnets", Network, &["snet"]),
    entry("microsoft.network/networkinterfaces", Network, &["nic"]),
    entry("microsoft.network/publicipaddresses", Network, &["pip"]),
    entry("microsoft.network/networksecuritygroups", Network, &["nsg"]),
    entry("microsoft.network/loadbalancers", Network, &["lb", "lbi", "lbe"]),
    entry("microsoft.network/applicationgateways", Network, &["agw"]),
    entry("microsoft.network/virtualnetworkgateways", Network, &["vgw", "vpng", "ergw"]),
    entry("microsoft.network/localnetworkgateways", Network, &["lgw"]),
    entry("microsoft.network/connections", Network, &["con", "cn"]),
    entry("microsoft.network/routetables", Network, &["rt"]),
    entry("microsoft.network/privateendpoints", Network, &["pep", "pe"]),
    entry("microsoft.network/privatednszones", Network, &["pdnsz"]),
    entry("microsoft.network/dnszones", Network, &["dnsz"]),
    entry("microsoft.network/azurefirewalls", Network, &["afw"]),
    entry("microsoft.network/bastionhosts", Network, &["bas"]),
    entry("microsoft.network/natgateways", Network, &["ng"]),
    entry("microsoft.network/frontdoors", Network, &["fd"]),
    entry("microsoft.cdn/profiles", Network, &["afd", "cdnp"]),
    entry("microsoft.network/trafficmanagerprofiles", Network, &["traf"]),
    entry("microsoft.network/networkwatchers", Network, &["nw"]),
    // Database
    entry("microsoft.sql/servers", Database, &["sql", "sqlsrv"]),
    entry("microsoft.sql/servers/databases", Database, &["sqldb"]),
    entry("microsoft.sql/managedinstances", Database, &["sqlmi"]),
    entry("microsoft.documentdb/databaseaccounts", Database, &["cosmos", "cosmosdb"]),
    entry("microsoft.dbformysql/flexibleservers", Database, &["mysql"]),
    entry("microsoft.dbformysql/servers", Database, &["mysql"]),
    entry("microsoft.dbforpostgresql/flexibleservers", Database, &["psql"]),
    entry("microsoft.dbforpostgresql/servers", Database, &["psql"]),
    entry("microsoft.cache/redis", Database, &["redis"]),
    // Security
    entry("microsoft.keyvault/vaults", Security, &["kv"]),
    entry("microsoft.network/applicationsecuritygroups", Security, &["asg"]),
    // Identity
    entry("microsoft.managedidentity/userassignedidentities", Identity, &["id", "mi"]),
    // Web
    entry("microsoft.web/sites", Web, &["app", "func", "webapp"]),
    entry("microsoft.web/serverfarms", Web, &["asp", "plan"]),
    entry("microsoft.web/staticsites", Web, &["stapp"]),
    entry("microsoft.apimanagement/service", Web, &["apim"]),
    entry("microsoft.signalrservice/signalr", Web, &["sigr"]),
    // Analytics
    entry("microsoft.operationalinsights/workspaces", Analytics, &["log", "law"]),
    entry("microsoft.insights/components", Analytics, &["appi", "ai"]),
    entry("microsoft.databricks/workspaces", Analytics, &["dbw"]),
    entry("microsoft.synapse/workspaces", Analytics, &["synw"]),
    entry("microsoft.datafactory/factories", Analytics, &["adf"]),
    entry("microsoft.kusto/clusters", Analytics, &["dec"]),
    entry("microsoft.streamanalytics/streamingjobs", Analytics, &["asa"]),
    // Integration
    entry("microsoft.eventhub/namespaces", Integration, &["evhns"]),
    entry("microsoft.servicebus/namespaces", Integration, &["sbns", "sb"]),
    entry("microsoft.logic/workflows", Integration, &["logic"]),
    entry("microsoft.eventgrid/topics", Integration, &["evgt"]),
    entry("microsoft.eventgrid/domains", Integration, &["evgd"]),
    // Management
    entry("microsoft.automation/automationaccounts", Management, &["aa"]),
    entry("microsoft.insights/actiongroups", Management, &["ag"]),
    entry("microsoft.resources/resourcegroups", Management, &["rg"]),
];

/// Category guess for types missing from the table, by provider namespace
pub(super) fn category_by_namespace(resource_type_lower: &str) -> ResourceCategory {
    let namespace = resource_type_lower.split('/').next().unwrap_or("");
    match namespace {
        "microsoft.compute" | "microsoft.containerservice" | "microsoft.containerinstance"
        | "microsoft.batch" => Compute,
        "microsoft.storage" | "microsoft.recoveryservices" | "microsoft.dataprotection" => Storage,
        "microsoft.network" | "microsoft.cdn" => Network,
        "microsoft.sql" | "microsoft.documentdb" | "microsoft.dbformysql"
        | "microsoft.dbforpostgresql" | "microsoft.dbformariadb" | "microsoft.cache" => Database,
        "microsoft.keyvault" | "microsoft.security" => Security,
        "microsoft.managedidentity" | "microsoft.aad" => Identity,
        "microsoft.web" | "microsoft.apimanagement" => Web,
        "microsoft.insights" | "microsoft.operationalinsights" | "microsoft.synapse"
        | "microsoft.databricks" | "microsoft.datafactory" | "microsoft.kusto" => Analytics,
        "microsoft.eventhub" | "microsoft.servicebus" | "microsoft.logic"
        | "microsoft.eventgrid" => Integration,
        "microsoft.automation" | "microsoft.resources" | "microsoft.authorization" => Management,
        _ => Other,
    }
}
