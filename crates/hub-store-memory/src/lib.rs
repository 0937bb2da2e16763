//! In-memory document store using tokio channels.
//!
//! This implementation is suitable for:
//! - Local demos where every client lives in one process
//! - Development and testing of the sync core
//!
//! Collection subscriptions are driven by a per-collection broadcast channel
//! that only carries a revision counter. Each subscriber re-reads the
//! collection on every tick and diffs it against what it delivered last, so a
//! lagging subscriber still converges on the current set.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use hub_storage::{
    encode_fields, AuthError, ChangeBatch, ChangeKind, ChangeStream, Collection,
    CreateWorkspaceParams, DocChange, Document, DocumentStore, Fields, IdentityProvider, Member,
    RecordId, SourceOrder, StoreError, UserId, Workspace, WorkspaceId, WorkspaceStream,
};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_stream::wrappers::{ReceiverStream, WatchStream};
use tracing::debug;

const CHANNEL_CAPACITY: usize = 100;

type ChannelKey = (WorkspaceId, Collection);

#[derive(Default)]
struct WorkspaceEntry {
    fields: Fields,
    collections: HashMap<Collection, BTreeMap<RecordId, Fields>>,
}

impl WorkspaceEntry {
    fn workspace(&self, id: &WorkspaceId) -> Result<Workspace, StoreError> {
        Ok(Document::new(RecordId(id.0.clone()), self.fields.clone()).decode()?)
    }

    fn snapshot(&self, collection: Collection, order: SourceOrder) -> Vec<Document> {
        let mut docs: Vec<Document> = self
            .collections
            .get(&collection)
            .map(|records| {
                records
                    .iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default();
        if order == SourceOrder::CreatedAtAscending {
            docs.sort_by_key(Document::created_at_millis);
        }
        docs
    }
}

struct Inner {
    workspaces: Mutex<HashMap<WorkspaceId, WorkspaceEntry>>,
    channels: DashMap<ChannelKey, broadcast::Sender<u64>>,
    watchers: DashMap<WorkspaceId, watch::Sender<Option<Workspace>>>,
    revision: AtomicU64,
    fail_writes: AtomicBool,
}

impl Inner {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<WorkspaceId, WorkspaceEntry>>, StoreError> {
        self.workspaces
            .lock()
            .map_err(|_| StoreError::Backend("store state lock poisoned".to_string()))
    }

    /// Get or create a broadcast channel for a collection
    fn get_or_create_channel(&self, key: &ChannelKey) -> broadcast::Sender<u64> {
        self.channels
            .entry(key.clone())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    fn notify(&self, workspace_id: &WorkspaceId, collection: Collection) {
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        // Ignore error if no receivers (this is fine)
        let _ = self
            .get_or_create_channel(&(workspace_id.clone(), collection))
            .send(revision);
    }

    fn publish_workspace(&self, workspace_id: &WorkspaceId, value: Option<Workspace>) {
        if let Some(tx) = self.watchers.get(workspace_id) {
            tx.send_replace(value);
        }
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("write rejected by backend".to_string()));
        }
        Ok(())
    }

    fn read_collection(
        &self,
        workspace_id: &WorkspaceId,
        collection: Collection,
        order: SourceOrder,
    ) -> Option<Vec<Document>> {
        let state = self.lock().ok()?;
        state
            .get(workspace_id)
            .map(|entry| entry.snapshot(collection, order))
    }
}

/// Classify the difference between two snapshots of the same collection.
fn diff(previous: &[Document], current: &[Document]) -> Vec<DocChange> {
    let before: HashMap<&RecordId, &Document> = previous.iter().map(|d| (&d.id, d)).collect();
    let after: HashMap<&RecordId, &Document> = current.iter().map(|d| (&d.id, d)).collect();

    let mut changes = Vec::new();
    for doc in current {
        match before.get(&doc.id) {
            None => changes.push(DocChange {
                kind: ChangeKind::Added,
                doc: doc.clone(),
            }),
            Some(old) if old.fields != doc.fields => changes.push(DocChange {
                kind: ChangeKind::Modified,
                doc: doc.clone(),
            }),
            Some(_) => {}
        }
    }
    for doc in previous {
        if !after.contains_key(&doc.id) {
            changes.push(DocChange {
                kind: ChangeKind::Removed,
                doc: doc.clone(),
            });
        }
    }
    changes
}

/// In-memory document store.
///
/// Cloning is cheap and every clone shares the same data, so several clients
/// in one process can collaborate through it.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                workspaces: Mutex::new(HashMap::new()),
                channels: DashMap::new(),
                watchers: DashMap::new(),
                revision: AtomicU64::new(0),
                fail_writes: AtomicBool::new(false),
            }),
        }
    }

    /// Make every subsequent write fail with a backend error (reads keep working).
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Delete a workspace and everything below it, as another client or an
    /// administrator would. Open subscriptions on it end.
    pub fn remove_workspace(&self, workspace_id: &WorkspaceId) -> Result<(), StoreError> {
        let removed = self.inner.lock()?.remove(workspace_id);
        if removed.is_none() {
            return Err(StoreError::NotFound);
        }
        self.inner.publish_workspace(workspace_id, None);
        for collection in Collection::ALL {
            self.inner.notify(workspace_id, collection);
        }
        Ok(())
    }

    /// Number of records currently stored in a collection.
    pub fn record_count(&self, workspace_id: &WorkspaceId, collection: Collection) -> usize {
        self.inner
            .read_collection(workspace_id, collection, SourceOrder::Unordered)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn merge(target: &mut Fields, patch: &Fields) {
    for (key, value) in patch {
        target.insert(key.clone(), value.clone());
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_workspace(
        &self,
        params: &CreateWorkspaceParams,
    ) -> Result<Workspace, StoreError> {
        self.inner.check_writable()?;

        let workspace = Workspace {
            id: WorkspaceId::generate(),
            name: params.name.clone(),
            leader_id: params.leader.id.clone(),
            prize_text: params.prize_text.clone(),
            created_at: Utc::now(),
        };
        let mut entry = WorkspaceEntry {
            fields: encode_fields(&workspace)?,
            ..Default::default()
        };
        entry
            .collections
            .entry(Collection::Members)
            .or_default()
            .insert(RecordId(params.leader.id.0.clone()), encode_fields(&params.leader)?);

        // Workspace and leader member land under a single lock acquisition.
        self.inner.lock()?.insert(workspace.id.clone(), entry);
        self.inner.watchers.insert(
            workspace.id.clone(),
            watch::Sender::new(Some(workspace.clone())),
        );
        debug!("Created workspace {}", workspace.id);
        Ok(workspace)
    }

    async fn get_workspace(&self, workspace_id: &WorkspaceId) -> Result<Workspace, StoreError> {
        let state = self.inner.lock()?;
        state
            .get(workspace_id)
            .ok_or(StoreError::NotFound)?
            .workspace(workspace_id)
    }

    async fn update_workspace(
        &self,
        workspace_id: &WorkspaceId,
        patch: &Fields,
    ) -> Result<(), StoreError> {
        self.inner.check_writable()?;
        let updated = {
            let mut state = self.inner.lock()?;
            let entry = state.get_mut(workspace_id).ok_or(StoreError::NotFound)?;
            merge(&mut entry.fields, patch);
            entry.workspace(workspace_id)?
        };
        self.inner.publish_workspace(workspace_id, Some(updated));
        Ok(())
    }

    async fn watch_workspace(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<WorkspaceStream, StoreError> {
        let rx = self
            .inner
            .watchers
            .get(workspace_id)
            .ok_or(StoreError::NotFound)?
            .subscribe();
        Ok(Box::pin(WatchStream::new(rx)))
    }

    async fn create_member(
        &self,
        workspace_id: &WorkspaceId,
        member: &Member,
    ) -> Result<(), StoreError> {
        self.inner.check_writable()?;
        let fields = encode_fields(member)?;
        {
            let mut state = self.inner.lock()?;
            let entry = state.get_mut(workspace_id).ok_or(StoreError::NotFound)?;
            let members = entry.collections.entry(Collection::Members).or_default();
            let key = RecordId(member.id.0.clone());
            if members.contains_key(&key) {
                return Err(StoreError::AlreadyExists);
            }
            members.insert(key, fields);
        }
        self.inner.notify(workspace_id, Collection::Members);
        Ok(())
    }

    async fn update_member(
        &self,
        workspace_id: &WorkspaceId,
        user_id: &UserId,
        patch: &Fields,
    ) -> Result<(), StoreError> {
        self.inner.check_writable()?;
        {
            let mut state = self.inner.lock()?;
            let fields = state
                .get_mut(workspace_id)
                .ok_or(StoreError::NotFound)?
                .collections
                .get_mut(&Collection::Members)
                .and_then(|members| members.get_mut(&RecordId(user_id.0.clone())))
                .ok_or(StoreError::NotFound)?;
            merge(fields, patch);
        }
        self.inner.notify(workspace_id, Collection::Members);
        Ok(())
    }

    async fn append(
        &self,
        workspace_id: &WorkspaceId,
        collection: Collection,
        fields: &Fields,
    ) -> Result<RecordId, StoreError> {
        self.inner.check_writable()?;
        let id = RecordId::generate();
        {
            let mut state = self.inner.lock()?;
            let entry = state.get_mut(workspace_id).ok_or(StoreError::NotFound)?;
            entry
                .collections
                .entry(collection)
                .or_default()
                .insert(id.clone(), fields.clone());
        }
        self.inner.notify(workspace_id, collection);
        Ok(id)
    }

    async fn delete(
        &self,
        workspace_id: &WorkspaceId,
        collection: Collection,
        record_id: &RecordId,
    ) -> Result<(), StoreError> {
        self.inner.check_writable()?;
        {
            let mut state = self.inner.lock()?;
            let entry = state.get_mut(workspace_id).ok_or(StoreError::NotFound)?;
            // Deleting a record that is already gone succeeds.
            if let Some(records) = entry.collections.get_mut(&collection) {
                records.remove(record_id);
            }
        }
        self.inner.notify(workspace_id, collection);
        Ok(())
    }

    async fn subscribe(
        &self,
        workspace_id: &WorkspaceId,
        collection: Collection,
        order: SourceOrder,
    ) -> Result<ChangeStream, StoreError> {
        // Snapshot and channel subscription happen under the same lock so no
        // write can slip in between them unseen.
        let (initial, mut ticks) = {
            let state = self.inner.lock()?;
            let entry = state.get(workspace_id).ok_or(StoreError::NotFound)?;
            let ticks = self
                .inner
                .get_or_create_channel(&(workspace_id.clone(), collection))
                .subscribe();
            (entry.snapshot(collection, order), ticks)
        };

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let inner = self.inner.clone();
        let workspace_id = workspace_id.clone();

        tokio::spawn(async move {
            let first = ChangeBatch {
                changes: diff(&[], &initial),
                docs: initial,
            };
            let mut delivered = first.docs.clone();
            if tx.send(first).await.is_err() {
                return;
            }

            loop {
                tokio::select! {
                    _ = tx.closed() => break, // Subscriber dropped
                    tick = ticks.recv() => {
                        if let Err(broadcast::error::RecvError::Closed) = tick {
                            break;
                        }
                        // Lagged ticks still mean "something changed": re-read below.
                    }
                }

                let Some(current) = inner.read_collection(&workspace_id, collection, order) else {
                    debug!("Workspace {} is gone, ending {} subscription", workspace_id, collection);
                    break;
                };
                let changes = diff(&delivered, &current);
                if changes.is_empty() {
                    continue;
                }
                delivered = current.clone();
                if tx
                    .send(ChangeBatch {
                        docs: current,
                        changes,
                    })
                    .await
                    .is_err()
                {
                    break;
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

/// Anonymous identity provider that mints a fresh user id on sign-in.
pub struct MemoryIdentity {
    current: Mutex<Option<UserId>>,
    reject: bool,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
            reject: false,
        }
    }

    /// Provider that already holds an identity (a resumed session).
    pub fn signed_in(user_id: UserId) -> Self {
        Self {
            current: Mutex::new(Some(user_id)),
            reject: false,
        }
    }

    /// Provider whose sign-in always fails.
    pub fn rejecting() -> Self {
        Self {
            current: Mutex::new(None),
            reject: true,
        }
    }
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn current_user(&self) -> Option<UserId> {
        self.current.lock().ok().and_then(|current| current.clone())
    }

    async fn sign_in_anonymously(&self) -> Result<UserId, AuthError> {
        if self.reject {
            return Err(AuthError::Rejected("anonymous sign-in disabled".to_string()));
        }
        let user_id = UserId::generate();
        let mut current = self
            .current
            .lock()
            .map_err(|_| AuthError::Unavailable("identity lock poisoned".to_string()))?;
        *current = Some(user_id.clone());
        Ok(user_id)
    }
}
