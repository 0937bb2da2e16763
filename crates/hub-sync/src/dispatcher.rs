//! Uniform writes against `workspaces/{id}/{collection}`.
//!
//! The dispatcher never touches local view state: a successful write becomes
//! visible only when the store echoes it back through a subscription. Writes
//! aimed at the same path are applied in call order; different paths proceed
//! independently.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use hub_storage::{
    workspace_path, Collection, DocumentStore, Fields, RecordId, StoreError, UserId, WorkspaceId,
};
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::SyncError;

/// Workspace and identity a write is issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteTarget {
    pub workspace_id: WorkspaceId,
    pub user_id: UserId,
}

pub struct CommandDispatcher {
    store: Arc<dyn DocumentStore>,
    path_locks: DashMap<String, Arc<Mutex<()>>>,
}

fn failed(operation: &str, path: &str, err: StoreError) -> SyncError {
    error!("{} on {} failed: {}", operation, path, err);
    SyncError::OperationFailed(err.to_string())
}

impl CommandDispatcher {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            path_locks: DashMap::new(),
        }
    }

    /// Run `op` while holding the lock of `path`. The lock entry is dropped
    /// again once nobody else holds or waits on it.
    async fn with_path_lock<T>(&self, path: &str, op: impl Future<Output = T>) -> T {
        let lock = self
            .path_locks
            .entry(path.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        // Tokio mutexes are fair, so waiters are served in arrival order.
        let result = {
            let _guard = lock.lock().await;
            op.await
        };
        drop(lock);
        self.path_locks
            .remove_if(path, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    /// Create a record with a store-assigned id.
    ///
    /// Returns `Ok(None)` without a target.
    pub async fn append(
        &self,
        target: Option<&WriteTarget>,
        collection: Collection,
        fields: Fields,
    ) -> Result<Option<RecordId>, SyncError> {
        let Some(target) = target else {
            debug!("No active workspace, dropping append to {}", collection);
            return Ok(None);
        };
        let path = collection.path(&target.workspace_id);
        let id = self
            .with_path_lock(
                &path,
                self.store.append(&target.workspace_id, collection, &fields),
            )
            .await
            .map_err(|e| failed("append", &path, e))?;
        debug!("Appended {} to {}", id, path);
        Ok(Some(id))
    }

    /// Hard-delete a record. No cascade.
    pub async fn remove(
        &self,
        target: Option<&WriteTarget>,
        collection: Collection,
        record_id: &RecordId,
    ) -> Result<(), SyncError> {
        let Some(target) = target else {
            debug!("No active workspace, dropping delete in {}", collection);
            return Ok(());
        };
        let path = collection.path(&target.workspace_id);
        self.with_path_lock(
            &path,
            self.store.delete(&target.workspace_id, collection, record_id),
        )
        .await
            .map_err(|e| failed("delete", &path, e))
    }

    /// Partial update of a member record.
    pub async fn update_member_field(
        &self,
        target: Option<&WriteTarget>,
        member_id: &UserId,
        patch: Fields,
    ) -> Result<(), SyncError> {
        let Some(target) = target else {
            debug!("No active workspace, dropping member update");
            return Ok(());
        };
        let path = Collection::Members.path(&target.workspace_id);
        self.with_path_lock(
            &path,
            self.store.update_member(&target.workspace_id, member_id, &patch),
        )
        .await
            .map_err(|e| failed("member update", &path, e))
    }

    /// Partial update of the workspace document.
    pub async fn update_workspace_field(
        &self,
        target: Option<&WriteTarget>,
        patch: Fields,
    ) -> Result<(), SyncError> {
        let Some(target) = target else {
            debug!("No active workspace, dropping workspace update");
            return Ok(());
        };
        let path = workspace_path(&target.workspace_id);
        self.with_path_lock(&path, self.store.update_workspace(&target.workspace_id, &patch))
            .await
            .map_err(|e| failed("workspace update", &path, e))
    }
}
