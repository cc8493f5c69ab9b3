//! Resource permission computation
//!
//! Computes, from a space's kind and its associated groups, the set of
//! access rules governing every resource anchored to that space.
//!
//! Permission patterns by space kind:
//!
//! 1. System spaces: workspace admins only.
//! 2. Public spaces: anyone can read (including role-less callers); admins
//!    and builders can write.
//! 3. Global and conversations spaces: all workspace members read; admins
//!    and builders write.
//! 4. Open regular spaces (global group attached): role-based grants, the
//!    group grant only flags openness to downstream consumers.
//! 5. Restricted regular spaces: group members read and write; workspace
//!    admins administrate.
//!
//! Permissions are never persisted. They are recomputed from current
//! space+group state on every authorization check, which rules out
//! permission drift from stale caches.

use super::auth::Authenticator;
use super::space::{Space, SpaceKind};
use super::types::{GroupId, WorkspaceId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Workspace roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Builder,
    User,
    /// Role-less caller, e.g. an unauthenticated visitor of a public space
    None,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Builder => "builder",
            Role::User => "user",
            Role::None => "none",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Permissions grantable on a space's resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
    Admin,
}

/// Permissions granted to a workspace role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub role: Role,
    pub permissions: Vec<Permission>,
}

/// Permissions granted to an explicit group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupGrant {
    pub id: GroupId,
    pub permissions: Vec<Permission>,
}

/// A workspace-scoped access rule: which permissions each role and each
/// explicit group holds on resources anchored to a space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePermission {
    pub workspace_id: WorkspaceId,
    pub roles: Vec<RoleGrant>,
    pub groups: Vec<GroupGrant>,
}

/// Output-shape variants kept for backward field-naming compatibility with
/// consumers. The rule set is identical; the formats differ only in which
/// groups are listed for an open regular space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionFormat {
    #[default]
    Legacy,
    Current,
}

fn role_grant(role: Role, permissions: &[Permission]) -> RoleGrant {
    RoleGrant {
        role,
        permissions: permissions.to_vec(),
    }
}

fn group_grants(space: &Space, permissions: &[Permission]) -> Vec<GroupGrant> {
    space
        .groups
        .iter()
        .map(|group| GroupGrant {
            id: group.id,
            permissions: permissions.to_vec(),
        })
        .collect()
}

/// Compute the requested-permission set for a space.
///
/// Pure and deterministic: depends only on the space value (which carries
/// its associated groups) and the requested output format. Safe to call
/// concurrently and arbitrarily often.
pub fn compute_permissions(space: &Space, format: PermissionFormat) -> Vec<ResourcePermission> {
    use Permission::{Admin, Read, Write};

    match space.kind {
        // System space: workspace admins only, no group grants.
        SpaceKind::System => vec![ResourcePermission {
            workspace_id: space.workspace_id,
            roles: vec![role_grant(Role::Admin, &[Admin])],
            groups: vec![],
        }],

        // Public space: everyone can read, including role-less callers.
        SpaceKind::Public => vec![ResourcePermission {
            workspace_id: space.workspace_id,
            roles: vec![
                role_grant(Role::Admin, &[Admin, Read, Write]),
                role_grant(Role::Builder, &[Read, Write]),
                role_grant(Role::User, &[Read]),
                role_grant(Role::None, &[Read]),
            ],
            groups: group_grants(space, &[Read, Write]),
        }],

        // Company data and conversations spaces: all workspace members.
        SpaceKind::Global | SpaceKind::Conversations => {
            vec![ResourcePermission {
                workspace_id: space.workspace_id,
                roles: vec![
                    role_grant(Role::Admin, &[Read, Write]),
                    role_grant(Role::Builder, &[Read, Write]),
                ],
                groups: group_grants(space, &[Read]),
            }]
        }

        SpaceKind::Regular => {
            match space.groups.iter().find(|group| group.is_global()) {
                // Open space: role-based grants take precedence for read;
                // the group grant exists only to flag openness downstream.
                Some(global_group) => {
                    let roles = vec![
                        role_grant(Role::Admin, &[Admin, Read, Write]),
                        role_grant(Role::Builder, &[Read, Write]),
                        role_grant(Role::User, &[Read]),
                    ];
                    let groups = match format {
                        // The legacy shape lists only the global group.
                        PermissionFormat::Legacy => vec![GroupGrant {
                            id: global_group.id,
                            permissions: vec![Read],
                        }],
                        PermissionFormat::Current => group_grants(space, &[Read]),
                    };
                    vec![ResourcePermission {
                        workspace_id: space.workspace_id,
                        roles,
                        groups,
                    }]
                }

                // Restricted space: group members only.
                None => vec![ResourcePermission {
                    workspace_id: space.workspace_id,
                    roles: vec![role_grant(Role::Admin, &[Admin, Write])],
                    groups: group_grants(space, &[Read, Write]),
                }],
            }
        }
    }
}

impl Space {
    /// Requested permissions in the legacy output shape, which every
    /// authorization predicate evaluates against.
    pub fn requested_permissions(&self) -> Vec<ResourcePermission> {
        compute_permissions(self, PermissionFormat::Legacy)
    }

    pub fn can_administrate(&self, auth: &Authenticator) -> bool {
        auth.can_administrate(&self.requested_permissions())
    }

    pub fn can_write(&self, auth: &Authenticator) -> bool {
        auth.can_write(&self.requested_permissions())
    }

    pub fn can_read(&self, auth: &Authenticator) -> bool {
        auth.can_read(&self.requested_permissions())
    }

    /// Members can read spaces; admins can additionally list spaces they
    /// cannot read (e.g. restricted spaces they do not belong to).
    pub fn can_list(&self, auth: &Authenticator) -> bool {
        self.can_read(auth) || self.can_administrate(auth)
    }
}
