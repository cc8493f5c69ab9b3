//! Space data structures
//!
//! A Space is the top-level access-scoping container for workspace
//! resources. Its kind and the groups associated with it fully determine
//! the access rules computed in [`crate::core_space::permissions`].

use super::group::Group;
use super::types::{make_space_sid, SpaceId, Timestamp, WorkspaceId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Space kinds
///
/// The variant set is closed on purpose: permission computation matches
/// exhaustively on it, so a new kind cannot be added without also deciding
/// its access rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpaceKind {
    /// Admin-only space holding workspace-internal resources
    System,
    /// The company-wide data space, one per workspace
    Global,
    /// Backing space for conversation resources, never user-visible
    Conversations,
    /// World-readable space
    Public,
    /// User-created space, open or restricted
    Regular,
}

impl SpaceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpaceKind::System => "system",
            SpaceKind::Global => "global",
            SpaceKind::Conversations => "conversations",
            SpaceKind::Public => "public",
            SpaceKind::Regular => "regular",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "system" => Some(SpaceKind::System),
            "global" => Some(SpaceKind::Global),
            "conversations" => Some(SpaceKind::Conversations),
            "public" => Some(SpaceKind::Public),
            "regular" => Some(SpaceKind::Regular),
            _ => None,
        }
    }
}

impl fmt::Display for SpaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A space together with its associated groups
///
/// Store fetches always hydrate `groups`, so permission computation never
/// needs another round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Space {
    /// Unique identifier
    pub id: SpaceId,

    /// Owning workspace
    pub workspace_id: WorkspaceId,

    /// Human-readable name, unique per workspace among non-deleted spaces
    pub name: String,

    /// Space kind
    pub kind: SpaceKind,

    /// Soft-delete marker; a set value means the space is logically deleted
    pub deleted_at: Option<Timestamp>,

    /// When the space was created
    pub created_at: Timestamp,

    /// Last time space metadata was updated
    pub updated_at: Timestamp,

    /// Groups associated with this space via the join relation
    pub groups: Vec<Group>,
}

impl Space {
    /// Externally addressable identifier
    pub fn sid(&self) -> String {
        make_space_sid(self.workspace_id, self.id)
    }

    pub fn is_system(&self) -> bool {
        self.kind == SpaceKind::System
    }

    pub fn is_global(&self) -> bool {
        self.kind == SpaceKind::Global
    }

    pub fn is_conversations(&self) -> bool {
        self.kind == SpaceKind::Conversations
    }

    pub fn is_public(&self) -> bool {
        self.kind == SpaceKind::Public
    }

    pub fn is_regular(&self) -> bool {
        self.kind == SpaceKind::Regular
    }

    /// A regular space with no global group attached is restricted: only
    /// members of its default group may access it.
    pub fn is_regular_and_restricted(&self) -> bool {
        self.is_regular() && !self.groups.iter().any(|group| group.is_global())
    }

    /// Whether the space is eligible for deletion.
    ///
    /// Soft-deleted spaces can always be hard-deleted; the default kinds can
    /// be deleted outright when a workspace is decommissioned. Enforcing the
    /// policy is the caller's concern.
    pub fn is_deletable(&self) -> bool {
        self.deleted_at.is_some()
            || self.is_global()
            || self.is_system()
            || self.is_conversations()
    }

    /// Consumer-facing summary of this space
    pub fn to_view(&self) -> SpaceView {
        SpaceView {
            sid: self.sid(),
            name: self.name.clone(),
            kind: self.kind,
            is_restricted: self.is_regular_and_restricted(),
            group_ids: self.groups.iter().map(|group| group.sid()).collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Serializable summary of a space as exposed to consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceView {
    #[serde(rename = "sId")]
    pub sid: String,
    pub name: String,
    pub kind: SpaceKind,
    pub is_restricted: bool,
    pub group_ids: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
