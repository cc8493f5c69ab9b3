//! Persistence interfaces for spaces, groups and users
//!
//! All methods are **scoped by workspace** where a workspace id is taken.
//! Multi-row mutations (space creation with its group associations, space
//! deletion with its associations, membership replacement) are transactional
//! inside the implementing store: partial application is never observable.

use super::group::{Group, GroupKind, User};
use super::space::{Space, SpaceKind};
use super::types::{GroupId, SpaceId, UserId, WorkspaceId};
use thiserror::Error;

/// Errors that can occur in the store layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Unique constraint or similar conflict
    #[error("conflict: {0}")]
    Conflict(String),

    /// Connection pool error
    #[error("connection pool error: {0}")]
    Pool(String),

    /// Underlying database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Creation attributes for a space row
#[derive(Debug, Clone)]
pub struct NewSpace {
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub kind: SpaceKind,
}

/// Persistence interface for spaces and their group associations
#[async_trait::async_trait]
pub trait SpaceStore: Send + Sync {
    /// Insert a space row and its group associations in one transaction.
    /// Fails atomically: either the space and every association exist, or
    /// nothing does.
    async fn create_space(&self, blob: NewSpace, group_ids: &[GroupId]) -> StoreResult<Space>;

    /// Fetch a space by id, with its groups hydrated. Soft-deleted spaces
    /// are excluded unless `include_deleted` is set.
    async fn find_space(
        &self,
        workspace_id: WorkspaceId,
        id: SpaceId,
        include_deleted: bool,
    ) -> StoreResult<Option<Space>>;

    /// Fetch a non-deleted space by exact name.
    async fn find_space_by_name(
        &self,
        workspace_id: WorkspaceId,
        name: &str,
    ) -> StoreResult<Option<Space>>;

    /// List non-deleted spaces, optionally filtered to a set of kinds.
    async fn list_spaces(
        &self,
        workspace_id: WorkspaceId,
        kinds: Option<&[SpaceKind]>,
    ) -> StoreResult<Vec<Space>>;

    /// List non-deleted spaces associated with any of the given groups.
    async fn list_spaces_for_groups(
        &self,
        workspace_id: WorkspaceId,
        group_ids: &[GroupId],
    ) -> StoreResult<Vec<Space>>;

    /// Rename a space. The store's unique constraint on (workspace, name)
    /// is the authoritative guard; a collision surfaces as `Conflict`.
    async fn rename_space(
        &self,
        workspace_id: WorkspaceId,
        id: SpaceId,
        new_name: &str,
    ) -> StoreResult<()>;

    /// Associate a group with a space.
    async fn attach_group(&self, space_id: SpaceId, group_id: GroupId) -> StoreResult<()>;

    /// Remove a group association from a space.
    async fn detach_group(&self, space_id: SpaceId, group_id: GroupId) -> StoreResult<()>;

    /// Remove all group associations, then remove the space row (soft or
    /// hard), in one transaction.
    async fn delete_space(
        &self,
        workspace_id: WorkspaceId,
        id: SpaceId,
        hard_delete: bool,
    ) -> StoreResult<()>;
}

/// Persistence interface for groups and their memberships
#[async_trait::async_trait]
pub trait GroupStore: Send + Sync {
    /// Create a group.
    async fn create_group(
        &self,
        workspace_id: WorkspaceId,
        name: &str,
        kind: GroupKind,
    ) -> StoreResult<Group>;

    /// Fetch a group by id.
    async fn find_group(
        &self,
        workspace_id: WorkspaceId,
        id: GroupId,
    ) -> StoreResult<Option<Group>>;

    /// The workspace's global group. Every workspace has exactly one by
    /// construction; a missing row is a `NotFound` error, not a `None`.
    async fn find_global_group(&self, workspace_id: WorkspaceId) -> StoreResult<Group>;

    /// The workspace's system group. Same existence contract as the global
    /// group.
    async fn find_system_group(&self, workspace_id: WorkspaceId) -> StoreResult<Group>;

    /// Replace a group's membership with exactly the given user set, in one
    /// transaction. An empty slice clears the group.
    async fn set_members(&self, group_id: GroupId, user_ids: &[UserId]) -> StoreResult<()>;

    /// Current members of a group.
    async fn members(&self, group_id: GroupId) -> StoreResult<Vec<UserId>>;
}

/// User lookup interface, used only during restricted-membership replacement
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve external member identifiers to user records. Unknown or
    /// foreign-workspace sids are skipped, not errors.
    async fn fetch_by_sids(
        &self,
        workspace_id: WorkspaceId,
        sids: &[String],
    ) -> StoreResult<Vec<User>>;
}
