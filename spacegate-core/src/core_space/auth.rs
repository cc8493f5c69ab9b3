//! Caller identity and capability checks
//!
//! The [`Authenticator`] carries the calling identity's workspace, role and
//! group memberships. Authorization predicates evaluate computed
//! [`ResourcePermission`] sets against it; they never touch storage.

use super::permissions::{Permission, ResourcePermission, Role};
use super::types::{GroupId, UserId, WorkspaceId};

/// The calling identity, as established by the platform's session layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticator {
    workspace_id: WorkspaceId,
    role: Role,
    user_id: Option<UserId>,
    group_ids: Vec<GroupId>,
}

impl Authenticator {
    /// Create an authenticator for a workspace-scoped caller
    pub fn new(workspace_id: WorkspaceId, role: Role) -> Self {
        Self {
            workspace_id,
            role,
            user_id: None,
            group_ids: Vec::new(),
        }
    }

    /// Attach the authenticated user
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Attach the caller's group memberships
    pub fn with_groups(mut self, group_ids: Vec<GroupId>) -> Self {
        self.group_ids = group_ids;
        self
    }

    /// The caller's workspace. Every authenticator is workspace-scoped, so
    /// this never fails.
    pub fn workspace_id(&self) -> WorkspaceId {
        self.workspace_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn group_ids(&self) -> &[GroupId] {
        &self.group_ids
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether the caller holds `permission` under any of the given access
    /// rules, either through their workspace role or through one of their
    /// group memberships.
    pub fn has_permission(
        &self,
        permissions: &[ResourcePermission],
        permission: Permission,
    ) -> bool {
        permissions.iter().any(|rp| {
            let by_role = rp.workspace_id == self.workspace_id
                && rp.roles.iter().any(|grant| {
                    grant.role == self.role && grant.permissions.contains(&permission)
                });

            let by_group = rp.groups.iter().any(|grant| {
                self.group_ids.contains(&grant.id) && grant.permissions.contains(&permission)
            });

            by_role || by_group
        })
    }

    pub fn can_read(&self, permissions: &[ResourcePermission]) -> bool {
        self.has_permission(permissions, Permission::Read)
    }

    pub fn can_write(&self, permissions: &[ResourcePermission]) -> bool {
        self.has_permission(permissions, Permission::Write)
    }

    pub fn can_administrate(&self, permissions: &[ResourcePermission]) -> bool {
        self.has_permission(permissions, Permission::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_space::permissions::{GroupGrant, RoleGrant};

    fn rules() -> Vec<ResourcePermission> {
        vec![ResourcePermission {
            workspace_id: WorkspaceId(1),
            roles: vec![
                RoleGrant {
                    role: Role::Admin,
                    permissions: vec![Permission::Admin, Permission::Read, Permission::Write],
                },
                RoleGrant {
                    role: Role::None,
                    permissions: vec![Permission::Read],
                },
            ],
            groups: vec![GroupGrant {
                id: GroupId(9),
                permissions: vec![Permission::Read, Permission::Write],
            }],
        }]
    }

    #[test]
    fn test_role_based_grant() {
        let admin = Authenticator::new(WorkspaceId(1), Role::Admin);
        assert!(admin.can_read(&rules()));
        assert!(admin.can_write(&rules()));
        assert!(admin.can_administrate(&rules()));

        let builder = Authenticator::new(WorkspaceId(1), Role::Builder);
        assert!(!builder.can_read(&rules()));
        assert!(!builder.can_write(&rules()));
    }

    #[test]
    fn test_role_grants_are_workspace_scoped() {
        let foreign_admin = Authenticator::new(WorkspaceId(2), Role::Admin);
        assert!(!foreign_admin.can_read(&rules()));
        assert!(!foreign_admin.can_administrate(&rules()));
    }

    #[test]
    fn test_group_membership_grant() {
        let member = Authenticator::new(WorkspaceId(1), Role::User).with_groups(vec![GroupId(9)]);
        assert!(member.can_read(&rules()));
        assert!(member.can_write(&rules()));
        assert!(!member.can_administrate(&rules()));

        let outsider =
            Authenticator::new(WorkspaceId(1), Role::User).with_groups(vec![GroupId(4)]);
        assert!(!outsider.can_read(&rules()));
    }

    #[test]
    fn test_role_less_caller_reads_when_none_granted() {
        let anonymous = Authenticator::new(WorkspaceId(1), Role::None);
        assert!(anonymous.can_read(&rules()));
        assert!(!anonymous.can_write(&rules()));
    }

    #[test]
    fn test_is_admin() {
        assert!(Authenticator::new(WorkspaceId(1), Role::Admin).is_admin());
        assert!(!Authenticator::new(WorkspaceId(1), Role::Builder).is_admin());
    }
}
