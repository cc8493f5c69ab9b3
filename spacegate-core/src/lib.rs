//! Spacegate: a space/group resource-permission engine
//!
//! Multi-tenant workspaces scope their resources through spaces; groups are
//! the grant unit on spaces. This crate computes the resulting access rules
//! and orchestrates the space lifecycle, including the asynchronous
//! propagation of permission changes to dependent resources.

pub mod config;
pub mod core_space;
pub mod logging;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::Config;
pub use core_space::{
    compute_permissions, Authenticator, Permission, PermissionFormat, ResourcePermission, Role,
    Space, SpaceError, SpaceKind, SpaceLifecycleManager, UpdateSpacePermissions,
};
pub use logging::{init_logging, LogLevel};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Ensure the main exports are accessible
        let _ = LogLevel::Info;
        let _ = SpaceKind::Regular;
        let _ = PermissionFormat::Legacy;
    }
}
