use serde::{Deserialize, Serialize};

/// Relationship between two resources in the dependency graph
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum RelationType {
    AttachedNic,
    AttachedDisk,
    UsesPublicIp,
    SecuredBy,
    MemberOfVnet,
    PeeredWith,
    PrivateEndpointFor,
    ChildOf,
    HostedOn,
    UsesStorage,
    ConnectsTo,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::AttachedNic => "attached-nic",
            RelationType::AttachedDisk => "attached-disk",
            RelationType::UsesPublicIp => "uses-public-ip",
            RelationType::SecuredBy => "secured-by",
            RelationType::MemberOfVnet => "member-of-vnet",
            RelationType::PeeredWith => "peered-with",
            RelationType::PrivateEndpointFor => "private-endpoint-for",
            RelationType::ChildOf => "child-of",
            RelationType::HostedOn => "hosted-on",
            RelationType::UsesStorage => "uses-storage",
            RelationType::ConnectsTo => "connects-to",
        }
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An edge in the dependency graph, as exposed to callers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DependencyEdge {
    pub source_id: String,
    pub target_id: String,
    pub relation_type: RelationType,
}

/// Lowercased resource types the graph builder understands
pub mod types {
    pub const VIRTUAL_MACHINE: &str = "microsoft.compute/virtualmachines";
    pub const DISK: &str = "microsoft.compute/disks";
    pub const NIC: &str = "microsoft.network/networkinterfaces";
    pub const PUBLIC_IP: &str = "microsoft.network/publicipaddresses";
    pub const NSG: &str = "microsoft.network/networksecuritygroups";
    pub const VNET: &str = "microsoft.network/virtualnetworks";
    pub const SUBNET: &str = "microsoft.network/virtualnetworks/subnets";
    pub const VNET_GATEWAY: &str = "microsoft.network/virtualnetworkgateways";
    pub const PRIVATE_ENDPOINT: &str = "microsoft.network/privateendpoints";
    pub const STORAGE_ACCOUNT: &str = "microsoft.storage/storageaccounts";
    pub const WEB_SITE: &str = "microsoft.web/sites";
    pub const MANAGED_IDENTITY: &str = "microsoft.managedidentity/userassignedidentities";

    /// Server types whose children are databases and that apps connect to
    pub const DATABASE_SERVERS: &[&str] = &[
        "microsoft.sql/servers",
        "microsoft.sql/managedinstances",
        "microsoft.dbformysql/servers",
        "microsoft.dbformysql/flexibleservers",
        "microsoft.dbforpostgresql/servers",
        "microsoft.dbforpostgresql/flexibleservers",
        "microsoft.dbformariadb/servers",
        "microsoft.documentdb/databaseaccounts",
        "microsoft.cache/redis",
    ];

    pub fn is_database_server(type_lower: &str) -> bool {
        DATABASE_SERVERS.contains(&type_lower)
    }

    pub fn is_database(type_lower: &str) -> bool {
        type_lower.ends_with("/databases")
    }
}
