//! Group data structures
//!
//! Groups are the grant unit on spaces: a space's access rules reference the
//! groups associated with it. Every workspace carries exactly one `system`
//! and one `global` group (created at workspace bootstrap, outside this
//! crate); `regular` groups hold the member list of restricted spaces.

use super::types::{make_group_sid, make_user_sid, GroupId, Timestamp, UserId, WorkspaceId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Group kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    /// Workspace administration group, one per workspace
    System,
    /// The all-members group, one per workspace
    Global,
    /// A user-managed member list, e.g. the default group of a restricted space
    Regular,
}

impl GroupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKind::System => "system",
            GroupKind::Global => "global",
            GroupKind::Regular => "regular",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "system" => Some(GroupKind::System),
            "global" => Some(GroupKind::Global),
            "regular" => Some(GroupKind::Regular),
            _ => None,
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named collection of users used as a grant unit on spaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Unique identifier
    pub id: GroupId,

    /// Owning workspace
    pub workspace_id: WorkspaceId,

    /// Human-readable name
    pub name: String,

    /// Group kind
    pub kind: GroupKind,

    /// When the group was created
    pub created_at: Timestamp,

    /// Last time group metadata was updated
    pub updated_at: Timestamp,
}

impl Group {
    /// Externally addressable identifier
    pub fn sid(&self) -> String {
        make_group_sid(self.workspace_id, self.id)
    }

    pub fn is_system(&self) -> bool {
        self.kind == GroupKind::System
    }

    pub fn is_global(&self) -> bool {
        self.kind == GroupKind::Global
    }

    pub fn is_regular(&self) -> bool {
        self.kind == GroupKind::Regular
    }
}

/// A workspace member, as resolved through the user lookup interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: UserId,

    /// Owning workspace
    pub workspace_id: WorkspaceId,

    /// Display name
    pub full_name: String,
}

impl User {
    /// Externally addressable identifier
    pub fn sid(&self) -> String {
        make_user_sid(self.workspace_id, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(kind: GroupKind) -> Group {
        Group {
            id: GroupId(1),
            workspace_id: WorkspaceId(1),
            name: "Engineering".to_string(),
            kind,
            created_at: Timestamp::from_millis(0),
            updated_at: Timestamp::from_millis(0),
        }
    }

    #[test]
    fn test_group_kind_round_trip() {
        for kind in [GroupKind::System, GroupKind::Global, GroupKind::Regular] {
            assert_eq!(GroupKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(GroupKind::parse("owner"), None);
    }

    #[test]
    fn test_group_predicates() {
        assert!(group(GroupKind::System).is_system());
        assert!(group(GroupKind::Global).is_global());
        assert!(group(GroupKind::Regular).is_regular());
        assert!(!group(GroupKind::Regular).is_global());
    }

    #[test]
    fn test_group_sid_uses_group_prefix() {
        assert!(group(GroupKind::Regular).sid().starts_with("grp_"));
    }
}
