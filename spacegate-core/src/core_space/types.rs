//! Identifier and timestamp types for spaces, groups and users

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Unique identifier for a workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceId(pub i64);

/// Unique identifier for a Space (row id, workspace-scoped)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpaceId(pub i64);

/// Unique identifier for a Group (row id, workspace-scoped)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub i64);

/// Unique identifier for a User
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

macro_rules! impl_id {
    ($name:ident) => {
        impl $name {
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                $name(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

impl_id!(WorkspaceId);
impl_id!(SpaceId);
impl_id!(GroupId);
impl_id!(UserId);

/// Milliseconds since the Unix epoch
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Create a timestamp representing the current time
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards");
        Timestamp(duration.as_millis() as u64)
    }

    /// Create a timestamp from milliseconds since epoch
    pub fn from_millis(millis: u64) -> Self {
        Timestamp(millis)
    }

    /// Get milliseconds since epoch
    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

const SPACE_SID_PREFIX: &str = "spc_";
const GROUP_SID_PREFIX: &str = "grp_";
const USER_SID_PREFIX: &str = "usr_";

/// Encode a (workspace id, row id) pair into an externally addressable
/// string identifier.
///
/// The encoding packs both ids big-endian into 16 bytes and renders them in
/// base58, so the sid is stable across restarts and never collides between
/// workspaces.
fn encode_sid(prefix: &str, workspace_id: WorkspaceId, id: i64) -> String {
    let mut buf = [0u8; 16];
    buf[..8].copy_from_slice(&workspace_id.0.to_be_bytes());
    buf[8..].copy_from_slice(&id.to_be_bytes());
    format!("{}{}", prefix, bs58::encode(buf).into_string())
}

/// Decode a sid back into its (workspace id, row id) pair. Returns `None`
/// for sids with a foreign prefix or a corrupt payload.
fn decode_sid(prefix: &str, sid: &str) -> Option<(WorkspaceId, i64)> {
    let payload = sid.strip_prefix(prefix)?;
    let bytes = bs58::decode(payload).into_vec().ok()?;
    if bytes.len() != 16 {
        return None;
    }
    let mut ws = [0u8; 8];
    let mut id = [0u8; 8];
    ws.copy_from_slice(&bytes[..8]);
    id.copy_from_slice(&bytes[8..]);
    Some((WorkspaceId(i64::from_be_bytes(ws)), i64::from_be_bytes(id)))
}

/// Derived string identifier for a space
pub fn make_space_sid(workspace_id: WorkspaceId, id: SpaceId) -> String {
    encode_sid(SPACE_SID_PREFIX, workspace_id, id.0)
}

/// Parse a space sid. Returns `None` for malformed or non-space sids.
pub fn parse_space_sid(sid: &str) -> Option<(WorkspaceId, SpaceId)> {
    decode_sid(SPACE_SID_PREFIX, sid).map(|(ws, id)| (ws, SpaceId(id)))
}

/// Derived string identifier for a group
pub fn make_group_sid(workspace_id: WorkspaceId, id: GroupId) -> String {
    encode_sid(GROUP_SID_PREFIX, workspace_id, id.0)
}

/// Parse a group sid. Returns `None` for malformed or non-group sids.
pub fn parse_group_sid(sid: &str) -> Option<(WorkspaceId, GroupId)> {
    decode_sid(GROUP_SID_PREFIX, sid).map(|(ws, id)| (ws, GroupId(id)))
}

/// Derived string identifier for a user
pub fn make_user_sid(workspace_id: WorkspaceId, id: UserId) -> String {
    encode_sid(USER_SID_PREFIX, workspace_id, id.0)
}

/// Parse a user sid. Returns `None` for malformed or non-user sids.
pub fn parse_user_sid(sid: &str) -> Option<(WorkspaceId, UserId)> {
    decode_sid(USER_SID_PREFIX, sid).map(|(ws, id)| (ws, UserId(id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_sid_round_trip() {
        let ws = WorkspaceId(42);
        let id = SpaceId(1337);
        let sid = make_space_sid(ws, id);
        assert!(sid.starts_with("spc_"));
        assert_eq!(parse_space_sid(&sid), Some((ws, id)));
    }

    #[test]
    fn test_sid_prefix_mismatch() {
        let sid = make_space_sid(WorkspaceId(1), SpaceId(2));
        assert_eq!(parse_group_sid(&sid), None);
        assert_eq!(parse_user_sid(&sid), None);
    }

    #[test]
    fn test_sid_corrupt_payload() {
        assert_eq!(parse_space_sid("spc_not-base58-!!"), None);
        assert_eq!(parse_space_sid("spc_abc"), None);
        assert_eq!(parse_space_sid(""), None);
    }

    #[test]
    fn test_sids_distinct_across_workspaces() {
        let a = make_space_sid(WorkspaceId(1), SpaceId(7));
        let b = make_space_sid(WorkspaceId(2), SpaceId(7));
        assert_ne!(a, b);
    }

    #[test]
    fn test_group_and_user_sid_round_trip() {
        let ws = WorkspaceId(9);
        let gid = GroupId(5);
        let uid = UserId(11);
        assert_eq!(parse_group_sid(&make_group_sid(ws, gid)), Some((ws, gid)));
        assert_eq!(parse_user_sid(&make_user_sid(ws, uid)), Some((ws, uid)));
    }

    #[test]
    fn test_timestamp_round_trip() {
        let ts = Timestamp::from_millis(1_700_000_000_000);
        assert_eq!(ts.as_millis(), 1_700_000_000_000);
        assert!(Timestamp::now().as_millis() > 0);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(SpaceId(7).to_string(), "7");
        assert_eq!(WorkspaceId(3).to_string(), "3");
    }
}
