//! Test fixtures for the space lifecycle
//!
//! Builds a fully wired in-memory environment: SQLite store, the two
//! bootstrap groups every workspace carries, a recording propagation
//! launcher and a lifecycle manager on top.

use crate::core_space::auth::Authenticator;
use crate::core_space::group::{Group, GroupKind};
use crate::core_space::lifecycle::SpaceLifecycleManager;
use crate::core_space::permissions::Role;
use crate::core_space::propagation::PropagationJobLauncher;
use crate::core_space::space::{Space, SpaceKind};
use crate::core_space::storage::SqliteSpaceStore;
use crate::core_space::store::{GroupStore, NewSpace, SpaceStore};
use crate::core_space::types::{SpaceId, WorkspaceId};
use std::sync::{Arc, Mutex};

/// Propagation launcher that records every launch for assertions
#[derive(Default)]
pub struct RecordingLauncher {
    launched: Mutex<Vec<SpaceId>>,
}

impl RecordingLauncher {
    pub fn count(&self) -> usize {
        self.launched.lock().unwrap().len()
    }

    pub fn launches(&self) -> Vec<SpaceId> {
        self.launched.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl PropagationJobLauncher for RecordingLauncher {
    async fn launch(&self, space: &Space) {
        self.launched.lock().unwrap().push(space.id);
    }
}

/// A wired-up single-workspace test environment
pub struct TestEnv {
    pub store: Arc<SqliteSpaceStore>,
    pub launcher: Arc<RecordingLauncher>,
    pub manager: SpaceLifecycleManager,
    pub workspace_id: WorkspaceId,
    pub system_group: Group,
    pub global_group: Group,
}

/// Build a fresh environment with the bootstrap groups in place
pub async fn test_env() -> TestEnv {
    let store = Arc::new(SqliteSpaceStore::memory().unwrap());
    let workspace_id = WorkspaceId(1);

    let system_group = store
        .create_group(workspace_id, "System", GroupKind::System)
        .await
        .unwrap();
    let global_group = store
        .create_group(workspace_id, "Workspace", GroupKind::Global)
        .await
        .unwrap();

    let launcher = Arc::new(RecordingLauncher::default());
    let manager = SpaceLifecycleManager::with_store(store.clone(), launcher.clone());

    TestEnv {
        store,
        launcher,
        manager,
        workspace_id,
        system_group,
        global_group,
    }
}

impl TestEnv {
    pub fn admin(&self) -> Authenticator {
        Authenticator::new(self.workspace_id, Role::Admin)
    }

    pub fn builder(&self) -> Authenticator {
        Authenticator::new(self.workspace_id, Role::Builder)
    }

    /// A plain user whose only access path is membership of `group`
    pub fn member_of(&self, group: &Group) -> Authenticator {
        Authenticator::new(self.workspace_id, Role::User).with_groups(vec![group.id])
    }

    /// Create a regular space with its default group, open or restricted
    pub async fn make_regular_space(&self, name: &str, restricted: bool) -> (Space, Group) {
        let default_group = self
            .store
            .create_group(self.workspace_id, name, GroupKind::Regular)
            .await
            .unwrap();

        let mut groups = vec![default_group.clone()];
        if !restricted {
            groups.push(self.global_group.clone());
        }

        let space = self
            .manager
            .create(
                NewSpace {
                    workspace_id: self.workspace_id,
                    name: name.to_string(),
                    kind: SpaceKind::Regular,
                },
                &groups,
            )
            .await
            .unwrap();

        (space, default_group)
    }

    /// Re-read a space from the store, with current group associations
    pub async fn refetch(&self, space: &Space) -> Space {
        self.store
            .find_space(self.workspace_id, space.id, false)
            .await
            .unwrap()
            .unwrap()
    }
}
