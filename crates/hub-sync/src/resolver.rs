//! Maps the persisted workspace selection to a live workspace and handles
//! create/join/leave transitions.

use std::sync::Arc;

use chrono::Utc;
use hub_config::{LocalStorage, WORKSPACE_KEY};
use hub_storage::{
    CreateWorkspaceParams, DocumentStore, Member, Rank, StoreError, UserId, Workspace,
    WorkspaceId, DEFAULT_LEADER_NAME, DEFAULT_MEMBER_NAME, DEFAULT_PRIZE_TEXT,
    DEFAULT_WORKSPACE_NAME,
};
use tracing::{debug, error, info, warn};

use crate::SyncError;

pub struct WorkspaceResolver {
    store: Arc<dyn DocumentStore>,
    storage: Arc<dyn LocalStorage>,
}

impl WorkspaceResolver {
    pub fn new(store: Arc<dyn DocumentStore>, storage: Arc<dyn LocalStorage>) -> Self {
        Self { store, storage }
    }

    /// The persisted selection, if any. Blank values count as none.
    pub fn stored_id(&self) -> Result<Option<WorkspaceId>, SyncError> {
        Ok(self
            .storage
            .get(WORKSPACE_KEY)?
            .and_then(|raw| WorkspaceId::parse(&raw)))
    }

    fn persist(&self, workspace_id: &WorkspaceId) -> Result<(), SyncError> {
        self.storage.set(WORKSPACE_KEY, workspace_id.as_str())?;
        Ok(())
    }

    /// Forget the persisted selection.
    pub fn clear(&self) -> Result<(), SyncError> {
        self.storage.remove(WORKSPACE_KEY)?;
        Ok(())
    }

    /// Load a workspace by id. An unknown id clears the persisted selection.
    pub async fn resolve(&self, workspace_id: &WorkspaceId) -> Result<Workspace, SyncError> {
        match self.store.get_workspace(workspace_id).await {
            Ok(workspace) => Ok(workspace),
            Err(StoreError::NotFound) => {
                warn!("Workspace {} not found, clearing selection", workspace_id);
                self.clear()?;
                Err(SyncError::NotFound)
            }
            Err(e) => {
                error!("Failed to load workspace {}: {}", workspace_id, e);
                Err(SyncError::OperationFailed(e.to_string()))
            }
        }
    }

    /// Resolve the persisted selection; `Ok(None)` when nothing is stored.
    pub async fn resolve_stored(&self) -> Result<Option<Workspace>, SyncError> {
        match self.stored_id()? {
            Some(id) => self.resolve(&id).await.map(Some),
            None => Ok(None),
        }
    }

    /// Create a workspace led by `user_id`, together with the leader's member
    /// record, and select it.
    pub async fn create(&self, user_id: &UserId) -> Result<Workspace, SyncError> {
        let params = CreateWorkspaceParams {
            name: DEFAULT_WORKSPACE_NAME.to_string(),
            prize_text: DEFAULT_PRIZE_TEXT.to_string(),
            leader: Member::new(user_id.clone(), DEFAULT_LEADER_NAME, Rank::Leader, Utc::now()),
        };
        let workspace = self.store.create_workspace(&params).await.map_err(|e| {
            error!("Failed to create workspace: {}", e);
            SyncError::OperationFailed(e.to_string())
        })?;

        self.persist(&workspace.id)?;
        info!("Created workspace {} led by {}", workspace.id, user_id);
        Ok(workspace)
    }

    /// Join an existing workspace as a plain member and select it.
    ///
    /// Joining twice is harmless: an existing member record is never
    /// overwritten.
    pub async fn join(&self, user_id: &UserId, target: &str) -> Result<Workspace, SyncError> {
        let workspace_id = WorkspaceId::parse(target).ok_or(SyncError::NotFound)?;
        let workspace = match self.store.get_workspace(&workspace_id).await {
            Ok(workspace) => workspace,
            Err(StoreError::NotFound) => {
                warn!("Cannot join unknown workspace {}", workspace_id);
                return Err(SyncError::NotFound);
            }
            Err(e) => {
                error!("Failed to load workspace {}: {}", workspace_id, e);
                return Err(SyncError::OperationFailed(e.to_string()));
            }
        };

        let member = Member::new(user_id.clone(), DEFAULT_MEMBER_NAME, Rank::Member, Utc::now());
        match self.store.create_member(&workspace_id, &member).await {
            Ok(()) => info!("User {} joined workspace {}", user_id, workspace_id),
            Err(StoreError::AlreadyExists) => {
                debug!("User {} is already a member of {}", user_id, workspace_id)
            }
            Err(e) => {
                error!("Failed to join workspace {}: {}", workspace_id, e);
                return Err(SyncError::OperationFailed(e.to_string()));
            }
        }

        self.persist(&workspace_id)?;
        Ok(workspace)
    }

    /// Drop the persisted selection. No remote record is deleted.
    pub fn leave(&self) -> Result<(), SyncError> {
        self.clear()?;
        info!("Left workspace selection");
        Ok(())
    }
}
