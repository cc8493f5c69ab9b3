//! Space & Group Permission Engine
//!
//! This module computes, from a space's kind and its associated groups, the
//! access rules governing every resource anchored to that space, and
//! orchestrates safe transitions between restriction states.
//!
//! ## Architecture
//!
//! - **Space**: access-scoping container for workspace resources
//! - **Group**: a named set of users used as a grant unit on spaces
//! - **PermissionResolver**: pure kind-dispatch over space + group state
//! - **SpaceLifecycleManager**: the only writer of space <-> group
//!   associations
//! - **PropagationJobLauncher**: hand-off seam to the background workflow
//!   that re-propagates permissions when a restriction boundary flips
//!
//! ## Key Design Principles
//!
//! 1. Permissions are computed, never stored: no drift from stale caches
//! 2. A regular space carries exactly one regular group (its default group)
//! 3. Propagation fires if and only if the accessibility boundary changed

pub mod auth;
pub mod group;
pub mod lifecycle;
pub mod metrics;
pub mod permissions;
pub mod propagation;
pub mod space;
pub mod storage;
pub mod store;
pub mod types;

pub use auth::Authenticator;
pub use group::{Group, GroupKind, User};
pub use lifecycle::{DefaultSpaces, SpaceError, SpaceLifecycleManager, UpdateSpacePermissions};
pub use permissions::{
    compute_permissions, GroupGrant, Permission, PermissionFormat, ResourcePermission, Role,
    RoleGrant,
};
pub use propagation::{PropagationJobLauncher, PropagationRequest, QueuedPropagationLauncher};
pub use space::{Space, SpaceKind, SpaceView};
pub use storage::SqliteSpaceStore;
pub use store::{GroupStore, NewSpace, SpaceStore, StoreError, StoreResult, UserDirectory};
pub use types::{GroupId, SpaceId, Timestamp, UserId, WorkspaceId};
