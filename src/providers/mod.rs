//! Data-source collaborators: resource inventory and identity directory

mod directory;
mod inventory;

pub use directory::{
    AppCredential, AppRegistration, Capability, ConditionalAccessPolicy, CredentialKind, Device,
    DirectoryProvider, DirectorySnapshot, DirectoryUser, NoDirectory, RoleAssignment,
    StaticDirectory,
};
pub use inventory::{parse_resource_snapshot, JsonInventory, ResourceInventory, StaticInventory};
