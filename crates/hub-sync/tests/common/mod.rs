#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hub_assist::{GenerationError, TextGenerator};
use hub_config::{LocalStorage, MemoryStorage, SyncConfig};
use hub_storage::{
    ChangeStream, Collection, CreateWorkspaceParams, DocumentStore, Fields, Member, RecordId,
    SourceOrder, StoreError, UserId, Workspace, WorkspaceId, WorkspaceStream,
};
use hub_store_memory::{MemoryIdentity, MemoryStore};
use hub_sync::{HubClient, ProfileUpdate};

pub const WINDOW: Duration = Duration::from_millis(2500);

/// Let spawned forwarding tasks drain without moving the clock.
pub async fn settle() {
    for _ in 0..100 {
        tokio::task::yield_now().await;
    }
}

/// Close every open initial-load window.
pub async fn pass_window() {
    tokio::time::advance(WINDOW).await;
    settle().await;
}

/// Generator that answers every prompt with the same text and records prompts.
#[derive(Default)]
pub struct ScriptedGenerator {
    reply: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A generator whose backend always fails.
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn try_generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply
            .clone()
            .ok_or_else(|| GenerationError::Transport("connection refused".to_string()))
    }
}

/// Store wrapper for fault injection: failing subscriptions, delayed appends,
/// and a log of append order.
#[derive(Clone)]
pub struct TestStore {
    pub inner: MemoryStore,
    broken: Arc<Mutex<Vec<Collection>>>,
    append_delays: Arc<Mutex<VecDeque<Duration>>>,
    pub appended: Arc<Mutex<Vec<Fields>>>,
}

impl TestStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            broken: Arc::new(Mutex::new(Vec::new())),
            append_delays: Arc::new(Mutex::new(VecDeque::new())),
            appended: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn break_subscription(&self, collection: Collection) {
        self.broken.lock().unwrap().push(collection);
    }

    /// Delays applied to the next appends, in order.
    pub fn delay_appends(&self, delays: &[Duration]) {
        self.append_delays.lock().unwrap().extend(delays.iter().copied());
    }
}

#[async_trait]
impl DocumentStore for TestStore {
    async fn create_workspace(&self, params: &CreateWorkspaceParams) -> Result<Workspace, StoreError> {
        self.inner.create_workspace(params).await
    }

    async fn get_workspace(&self, workspace_id: &WorkspaceId) -> Result<Workspace, StoreError> {
        self.inner.get_workspace(workspace_id).await
    }

    async fn update_workspace(&self, workspace_id: &WorkspaceId, patch: &Fields) -> Result<(), StoreError> {
        self.inner.update_workspace(workspace_id, patch).await
    }

    async fn watch_workspace(&self, workspace_id: &WorkspaceId) -> Result<WorkspaceStream, StoreError> {
        self.inner.watch_workspace(workspace_id).await
    }

    async fn create_member(&self, workspace_id: &WorkspaceId, member: &Member) -> Result<(), StoreError> {
        self.inner.create_member(workspace_id, member).await
    }

    async fn update_member(
        &self,
        workspace_id: &WorkspaceId,
        user_id: &UserId,
        patch: &Fields,
    ) -> Result<(), StoreError> {
        self.inner.update_member(workspace_id, user_id, patch).await
    }

    async fn append(
        &self,
        workspace_id: &WorkspaceId,
        collection: Collection,
        fields: &Fields,
    ) -> Result<RecordId, StoreError> {
        let delay = self.append_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.appended.lock().unwrap().push(fields.clone());
        self.inner.append(workspace_id, collection, fields).await
    }

    async fn delete(
        &self,
        workspace_id: &WorkspaceId,
        collection: Collection,
        record_id: &RecordId,
    ) -> Result<(), StoreError> {
        self.inner.delete(workspace_id, collection, record_id).await
    }

    async fn subscribe(
        &self,
        workspace_id: &WorkspaceId,
        collection: Collection,
        order: SourceOrder,
    ) -> Result<ChangeStream, StoreError> {
        if self.broken.lock().unwrap().contains(&collection) {
            return Err(StoreError::Backend("permission denied".to_string()));
        }
        self.inner.subscribe(workspace_id, collection, order).await
    }
}

pub struct TestClient {
    pub client: HubClient,
    pub storage: Arc<MemoryStorage>,
    pub assistant: Arc<ScriptedGenerator>,
}

impl std::ops::Deref for TestClient {
    type Target = HubClient;

    fn deref(&self) -> &HubClient {
        &self.client
    }
}

pub async fn connect_with(
    store: Arc<dyn DocumentStore>,
    storage: Arc<MemoryStorage>,
    assistant: Arc<ScriptedGenerator>,
) -> TestClient {
    let client = HubClient::connect(
        store,
        &MemoryIdentity::new(),
        storage.clone() as Arc<dyn LocalStorage>,
        assistant.clone(),
        &SyncConfig::default(),
    )
    .await
    .expect("connect");
    TestClient {
        client,
        storage,
        assistant,
    }
}

pub async fn connect(store: &MemoryStore) -> TestClient {
    connect_with(
        Arc::new(store.clone()),
        Arc::new(MemoryStorage::new()),
        Arc::new(ScriptedGenerator::replying("ok")),
    )
    .await
}

pub async fn rename(client: &HubClient, name: &str) {
    client
        .update_profile(&ProfileUpdate {
            name: Some(name.to_string()),
            ..Default::default()
        })
        .await
        .expect("update profile");
    settle().await;
}

pub async fn messages(client: &HubClient) -> Vec<String> {
    client
        .notifications()
        .await
        .into_iter()
        .map(|n| n.message)
        .collect()
}
