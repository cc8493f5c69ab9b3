//! Space lifecycle orchestration
//!
//! The [`SpaceLifecycleManager`] owns every mutation of the space <-> group
//! association table: creation, default-space bootstrap, restriction
//! toggling, renaming and deletion. Permission computation itself lives in
//! [`super::permissions`] and is recomputed on demand by authorization
//! checks; nothing here caches it.

use super::auth::Authenticator;
use super::group::Group;
use super::metrics;
use super::propagation::PropagationJobLauncher;
use super::space::{Space, SpaceKind};
use super::store::{GroupStore, NewSpace, SpaceStore, StoreError, UserDirectory};
use super::types::{parse_space_sid, UserId, WorkspaceId};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Maximum space name length
const MAX_SPACE_NAME_LEN: usize = 100;

/// Space lifecycle errors
///
/// Authorization and validation failures are typed so callers can present
/// them without unwinding. Invariant violations (a regular space without
/// exactly one regular group) are deliberately NOT represented here: they
/// indicate an impossible state reached elsewhere and abort loudly.
#[derive(Debug, Error)]
pub enum SpaceError {
    #[error("not authorized: {0}")]
    Unauthorized(&'static str),

    #[error("space name {0:?} is already in use")]
    NameTaken(String),

    #[error("invalid space name: {0}")]
    InvalidName(String),

    #[error("workspace {0} has no {1} space")]
    MissingDefaultSpace(WorkspaceId, SpaceKind),

    #[error("failed to update restricted membership: {0}")]
    MembershipUpdate(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Parameters for a restriction-state transition
#[derive(Debug, Clone)]
pub struct UpdateSpacePermissions {
    /// Target restriction state
    pub is_restricted: bool,

    /// Replacement member list for the default group (external user sids).
    /// Only meaningful when restricting; `None` leaves membership untouched.
    pub member_ids: Option<Vec<String>>,
}

/// The three spaces every workspace carries
#[derive(Debug, Clone)]
pub struct DefaultSpaces {
    pub system: Space,
    pub global: Space,
    pub conversations: Space,
}

impl fmt::Display for DefaultSpaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "system={} global={} conversations={}",
            self.system.id, self.global.id, self.conversations.id
        )
    }
}

/// Orchestrates the space lifecycle over the store interfaces
pub struct SpaceLifecycleManager {
    spaces: Arc<dyn SpaceStore>,
    groups: Arc<dyn GroupStore>,
    users: Arc<dyn UserDirectory>,
    launcher: Arc<dyn PropagationJobLauncher>,
}

impl SpaceLifecycleManager {
    pub fn new(
        spaces: Arc<dyn SpaceStore>,
        groups: Arc<dyn GroupStore>,
        users: Arc<dyn UserDirectory>,
        launcher: Arc<dyn PropagationJobLauncher>,
    ) -> Self {
        Self {
            spaces,
            groups,
            users,
            launcher,
        }
    }

    /// Convenience constructor for a store that implements all three
    /// persistence interfaces
    pub fn with_store<S>(store: Arc<S>, launcher: Arc<dyn PropagationJobLauncher>) -> Self
    where
        S: SpaceStore + GroupStore + UserDirectory + 'static,
    {
        Self::new(store.clone(), store.clone(), store, launcher)
    }

    fn validate_space_name(name: &str) -> Result<(), SpaceError> {
        if name.is_empty() {
            return Err(SpaceError::InvalidName("name must not be empty".into()));
        }
        if name.len() > MAX_SPACE_NAME_LEN {
            return Err(SpaceError::InvalidName(format!(
                "name must be at most {} characters",
                MAX_SPACE_NAME_LEN
            )));
        }
        Ok(())
    }

    /// Create a space and its group associations atomically.
    ///
    /// Either the space row and every association exist afterwards, or
    /// nothing does.
    pub async fn create(
        &self,
        blob: NewSpace,
        initial_groups: &[Group],
    ) -> Result<Space, SpaceError> {
        Self::validate_space_name(&blob.name)?;

        let name = blob.name.clone();
        let group_ids: Vec<_> = initial_groups.iter().map(|group| group.id).collect();
        let space = self
            .spaces
            .create_space(blob, &group_ids)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => SpaceError::NameTaken(name),
                e => SpaceError::Store(e),
            })?;

        metrics::space_created();
        tracing::info!(
            space_id = %space.id,
            workspace_id = %space.workspace_id,
            kind = %space.kind,
            "created space"
        );

        Ok(space)
    }

    /// Create whichever of the workspace's default spaces are missing.
    ///
    /// Idempotent: existing defaults are left untouched, so this is safe to
    /// call on every workspace provisioning retry.
    pub async fn bootstrap_defaults(
        &self,
        auth: &Authenticator,
    ) -> Result<DefaultSpaces, SpaceError> {
        assert!(
            auth.is_admin(),
            "only admins can bootstrap default spaces"
        );

        let workspace_id = auth.workspace_id();
        let system_group = self.groups.find_system_group(workspace_id).await?;
        let global_group = self.groups.find_global_group(workspace_id).await?;

        let existing = self
            .spaces
            .list_spaces(
                workspace_id,
                Some(&[
                    SpaceKind::System,
                    SpaceKind::Global,
                    SpaceKind::Conversations,
                ]),
            )
            .await?;

        let required = [
            (SpaceKind::System, "System", &system_group),
            (SpaceKind::Global, "Company Data", &global_group),
            (SpaceKind::Conversations, "Conversations", &global_group),
        ];

        let mut created = Vec::with_capacity(required.len());
        for (kind, name, seed_group) in required {
            let space = match existing.iter().find(|s| s.kind == kind) {
                Some(space) => space.clone(),
                None => {
                    self.create(
                        NewSpace {
                            workspace_id,
                            name: name.to_string(),
                            kind,
                        },
                        std::slice::from_ref(seed_group),
                    )
                    .await?
                }
            };
            created.push(space);
        }

        metrics::bootstrap_run();

        let mut created = created.into_iter();
        let defaults = DefaultSpaces {
            system: created.next().expect("system space"),
            global: created.next().expect("global space"),
            conversations: created.next().expect("conversations space"),
        };

        tracing::debug!(workspace_id = %workspace_id, defaults = %defaults, "default spaces ready");

        Ok(defaults)
    }

    /// Transition a regular space between its open and restricted states.
    ///
    /// Steps run strictly in order: authorize, detach/attach the global
    /// group, replace or clear the default group's membership, then request
    /// propagation if the accessibility boundary actually flipped. The
    /// membership step is not atomic with the group mutation: a failure
    /// there leaves the already-applied restriction change in place and is
    /// independently retryable.
    pub async fn update_permissions(
        &self,
        auth: &Authenticator,
        space: &Space,
        params: UpdateSpacePermissions,
    ) -> Result<(), SpaceError> {
        if !space.can_administrate(auth) {
            return Err(SpaceError::Unauthorized(
                "you do not have permission to update space permissions",
            ));
        }

        let regular_groups: Vec<&Group> = space
            .groups
            .iter()
            .filter(|group| group.is_regular())
            .collect();

        // The permission computation for regular spaces relies on this
        // holding; a violation means space creation went wrong elsewhere.
        assert!(
            regular_groups.len() == 1,
            "expected exactly one regular group for space {}, found {}",
            space.id,
            regular_groups.len()
        );
        let default_group = regular_groups[0];

        let was_restricted = space.groups.iter().all(|group| !group.is_global());
        let has_restriction_changed = was_restricted != params.is_restricted;

        let global_group = self.groups.find_global_group(space.workspace_id).await?;

        if params.is_restricted {
            if !was_restricted {
                self.spaces.detach_group(space.id, global_group.id).await?;
            }

            if let Some(member_ids) = &params.member_ids {
                let users = self
                    .users
                    .fetch_by_sids(space.workspace_id, member_ids)
                    .await
                    .map_err(|e| SpaceError::MembershipUpdate(e.to_string()))?;
                let user_ids: Vec<UserId> = users.iter().map(|user| user.id).collect();

                self.groups
                    .set_members(default_group.id, &user_ids)
                    .await
                    .map_err(|e| SpaceError::MembershipUpdate(e.to_string()))?;
            }
        } else {
            if was_restricted {
                self.spaces.attach_group(space.id, global_group.id).await?;
            }

            // An open space has no meaningful restricted-member list.
            self.groups
                .set_members(default_group.id, &[])
                .await
                .map_err(|e| SpaceError::MembershipUpdate(e.to_string()))?;
        }

        if has_restriction_changed {
            self.launcher.launch(space).await;
            metrics::propagation_job_launched();
            tracing::info!(
                space_id = %space.id,
                was_restricted,
                is_restricted = params.is_restricted,
                "space restriction boundary changed, propagation requested"
            );
        }

        metrics::permission_update();
        Ok(())
    }

    /// Rename a space. Admin only.
    ///
    /// The availability check is a fast path for a friendly error; the
    /// store's unique index is the authoritative guard, so a concurrent
    /// rename racing past the check still surfaces as `NameTaken`.
    pub async fn update_name(
        &self,
        auth: &Authenticator,
        space: &Space,
        new_name: &str,
    ) -> Result<(), SpaceError> {
        if !auth.is_admin() {
            return Err(SpaceError::Unauthorized("only admins can update space names"));
        }

        Self::validate_space_name(new_name)?;

        if !self.is_name_available(auth, new_name).await? {
            return Err(SpaceError::NameTaken(new_name.to_string()));
        }

        self.spaces
            .rename_space(space.workspace_id, space.id, new_name)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => SpaceError::NameTaken(new_name.to_string()),
                e => SpaceError::Store(e),
            })
    }

    /// Delete a space: all group associations are removed, then the space
    /// row is soft- or hard-deleted, in one transaction. Eligibility policy
    /// lives with the caller (see [`Space::is_deletable`]).
    pub async fn delete(
        &self,
        space: &Space,
        hard_delete: bool,
    ) -> Result<(), SpaceError> {
        self.spaces
            .delete_space(space.workspace_id, space.id, hard_delete)
            .await?;

        let mode = if hard_delete { "hard" } else { "soft" };
        metrics::space_deleted(mode);
        tracing::info!(space_id = %space.id, mode, "deleted space");

        Ok(())
    }

    // ===== Query operations =====

    /// All live spaces of the caller's workspace. The conversations space
    /// is never meant to be user-visible, so it is excluded unless asked
    /// for.
    pub async fn list_workspace_spaces(
        &self,
        auth: &Authenticator,
        include_conversations: bool,
    ) -> Result<Vec<Space>, SpaceError> {
        let spaces = self.spaces.list_spaces(auth.workspace_id(), None).await?;

        if include_conversations {
            return Ok(spaces);
        }
        Ok(spaces
            .into_iter()
            .filter(|space| !space.is_conversations())
            .collect())
    }

    /// Spaces the caller can see as a member. Only members can read spaces
    /// (admins can additionally list them), and the conversations space is
    /// not meant for members.
    pub async fn list_workspace_spaces_as_member(
        &self,
        auth: &Authenticator,
    ) -> Result<Vec<Space>, SpaceError> {
        let spaces = self.spaces.list_spaces(auth.workspace_id(), None).await?;

        Ok(spaces
            .into_iter()
            .filter(|space| {
                space.can_list(auth) && space.can_read(auth) && !space.is_conversations()
            })
            .collect())
    }

    /// The workspace's default-kind spaces
    pub async fn list_workspace_default_spaces(
        &self,
        auth: &Authenticator,
        include_conversations: bool,
    ) -> Result<Vec<Space>, SpaceError> {
        let mut kinds = vec![SpaceKind::System, SpaceKind::Global];
        if include_conversations {
            kinds.push(SpaceKind::Conversations);
        }

        Ok(self
            .spaces
            .list_spaces(auth.workspace_id(), Some(&kinds))
            .await?)
    }

    /// Spaces reachable from any of the given groups, filtered to those the
    /// caller can read
    pub async fn list_for_groups(
        &self,
        auth: &Authenticator,
        groups: &[Group],
    ) -> Result<Vec<Space>, SpaceError> {
        let group_ids: Vec<_> = groups.iter().map(|group| group.id).collect();
        let spaces = self
            .spaces
            .list_spaces_for_groups(auth.workspace_id(), &group_ids)
            .await?;

        Ok(spaces
            .into_iter()
            .filter(|space| space.can_read(auth))
            .collect())
    }

    /// Fetch a space by its derived string identifier. Foreign-workspace
    /// and malformed sids resolve to `None`.
    pub async fn fetch_by_sid(
        &self,
        auth: &Authenticator,
        sid: &str,
        include_deleted: bool,
    ) -> Result<Option<Space>, SpaceError> {
        let Some((workspace_id, space_id)) = parse_space_sid(sid) else {
            return Ok(None);
        };
        if workspace_id != auth.workspace_id() {
            return Ok(None);
        }

        Ok(self
            .spaces
            .find_space(workspace_id, space_id, include_deleted)
            .await?)
    }

    async fn fetch_default_space(
        &self,
        auth: &Authenticator,
        kind: SpaceKind,
    ) -> Result<Space, SpaceError> {
        let spaces = self
            .spaces
            .list_spaces(auth.workspace_id(), Some(&[kind]))
            .await?;

        spaces
            .into_iter()
            .next()
            .ok_or(SpaceError::MissingDefaultSpace(auth.workspace_id(), kind))
    }

    /// The workspace's system space. Every workspace has one by
    /// construction; a missing row is an unrecoverable error.
    pub async fn fetch_workspace_system_space(
        &self,
        auth: &Authenticator,
    ) -> Result<Space, SpaceError> {
        self.fetch_default_space(auth, SpaceKind::System).await
    }

    /// The workspace's global ("Company Data") space
    pub async fn fetch_workspace_global_space(
        &self,
        auth: &Authenticator,
    ) -> Result<Space, SpaceError> {
        self.fetch_default_space(auth, SpaceKind::Global).await
    }

    /// The workspace's conversations space
    pub async fn fetch_workspace_conversations_space(
        &self,
        auth: &Authenticator,
    ) -> Result<Space, SpaceError> {
        self.fetch_default_space(auth, SpaceKind::Conversations).await
    }

    /// Whether `name` is free among the workspace's live spaces
    pub async fn is_name_available(
        &self,
        auth: &Authenticator,
        name: &str,
    ) -> Result<bool, SpaceError> {
        let existing = self
            .spaces
            .find_space_by_name(auth.workspace_id(), name)
            .await?;
        Ok(existing.is_none())
    }
}
