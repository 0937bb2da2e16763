//! The DocumentStore trait that backends implement.

use crate::types::*;
use crate::{ChangeStream, StoreError, WorkspaceStream};

/// The remote real-time document store the client core depends on.
///
/// Everything below a workspace lives at `workspaces/{id}/{collection}`; all
/// methods are **scoped by workspace**. Writes never touch the client's local
/// view: visible state only changes when the write is echoed back through a
/// subscription.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    // ───────────────────────────────────── Workspaces ─────────────────────────────────────

    /// Create a workspace and its leader's member record as one unit.
    /// Either both records exist afterwards or the call fails.
    async fn create_workspace(
        &self,
        params: &CreateWorkspaceParams,
    ) -> Result<Workspace, StoreError>;

    /// Point read of the workspace document.
    async fn get_workspace(&self, workspace_id: &WorkspaceId) -> Result<Workspace, StoreError>;

    /// Merge `patch` into the workspace document.
    async fn update_workspace(
        &self,
        workspace_id: &WorkspaceId,
        patch: &Fields,
    ) -> Result<(), StoreError>;

    /// Subscribe to the workspace document. Yields the current value first,
    /// then every change; `None` means the document no longer exists.
    async fn watch_workspace(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<WorkspaceStream, StoreError>;

    // ───────────────────────────────────── Members ────────────────────────────────────────

    /// Create a member record keyed by `member.id`.
    /// Fails with `AlreadyExists` instead of overwriting an existing record.
    async fn create_member(
        &self,
        workspace_id: &WorkspaceId,
        member: &Member,
    ) -> Result<(), StoreError>;

    /// Merge `patch` into an existing member record.
    async fn update_member(
        &self,
        workspace_id: &WorkspaceId,
        user_id: &UserId,
        patch: &Fields,
    ) -> Result<(), StoreError>;

    // ───────────────────────────────────── Records ────────────────────────────────────────

    /// Create a record with a store-assigned id (returns the id).
    async fn append(
        &self,
        workspace_id: &WorkspaceId,
        collection: Collection,
        fields: &Fields,
    ) -> Result<RecordId, StoreError>;

    /// Hard-delete a record. No cascade into other collections.
    async fn delete(
        &self,
        workspace_id: &WorkspaceId,
        collection: Collection,
        record_id: &RecordId,
    ) -> Result<(), StoreError>;

    /// Subscribe to a collection. Each item is a full snapshot plus the
    /// changes since the previous item; the first item reports everything as
    /// added. The stream ends when dropped or when the backend goes away.
    async fn subscribe(
        &self,
        workspace_id: &WorkspaceId,
        collection: Collection,
        order: SourceOrder,
    ) -> Result<ChangeStream, StoreError>;
}
