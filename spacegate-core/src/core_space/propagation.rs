//! Propagation of permission-boundary changes
//!
//! When a space's accessibility boundary flips (restricted <-> open), every
//! resource whose effective permissions derive from that space must be
//! recomputed and re-indexed. That work happens in a background workflow
//! owned elsewhere; this module only defines the hand-off seam.

use super::space::Space;
use super::types::{SpaceId, WorkspaceId};
use tokio::sync::mpsc;

/// Launches a workspace-wide permission-update job for a space.
///
/// Fire-and-forget from the caller's point of view: delivery (at-least-once)
/// and job execution are the collaborator's concern. Implementations must
/// not block on job completion.
#[async_trait::async_trait]
pub trait PropagationJobLauncher: Send + Sync {
    async fn launch(&self, space: &Space);
}

/// A permission-update request as handed to the workflow engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropagationRequest {
    pub workspace_id: WorkspaceId,
    pub space_id: SpaceId,
}

/// Launcher that enqueues requests on a bounded channel, drained by the
/// workflow engine adapter.
pub struct QueuedPropagationLauncher {
    tx: mpsc::Sender<PropagationRequest>,
}

impl QueuedPropagationLauncher {
    /// Create a launcher and the receiving end of its queue
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<PropagationRequest>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait::async_trait]
impl PropagationJobLauncher for QueuedPropagationLauncher {
    async fn launch(&self, space: &Space) {
        let request = PropagationRequest {
            workspace_id: space.workspace_id,
            space_id: space.id,
        };

        // A full or closed queue loses the request; the workflow engine is
        // expected to reconcile on its own schedule in that case.
        if let Err(e) = self.tx.try_send(request) {
            tracing::warn!(
                space_id = %space.id,
                error = %e,
                "failed to enqueue permission propagation request"
            );
        }
    }
}
