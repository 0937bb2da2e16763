//! Owns the live subscriptions of the selected workspace.
//!
//! Opening a workspace subscribes to every record stream plus the workspace
//! document. Each stream is forwarded by its own task; the tasks of one
//! selection share a [`SessionContext`] carrying its generation number and the
//! initial-load flag. Tearing down aborts every task and moves the view to a
//! new generation, and batches are only applied while their generation is
//! current, so nothing from an abandoned workspace reaches the view.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::StreamExt;
use hub_config::{LocalStorage, SyncConfig, WORKSPACE_KEY};
use hub_storage::{
    ChangeBatch, ChangeStream, Collection, DocumentStore, SourceOrder, StoreError, UserId,
    WorkspaceId, WorkspaceStream,
};
use tokio::sync::{watch, Mutex, RwLock, RwLockReadGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::notifications::NotificationCenter;
use crate::reconciler;
use crate::views::ViewState;
use crate::SyncError;

/// Lifecycle of a workspace selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiplexState {
    Idle,
    Subscribing,
    Live,
    TornDown,
}

/// Per-selection context shared by that selection's tasks.
#[derive(Debug)]
struct SessionContext {
    generation: u64,
    workspace_id: WorkspaceId,
    user_id: UserId,
    within_initial_load: AtomicBool,
}

struct ActiveSelection {
    context: Arc<SessionContext>,
    tasks: Vec<JoinHandle<()>>,
}

struct Shared {
    store: Arc<dyn DocumentStore>,
    storage: Arc<dyn LocalStorage>,
    notifications: Arc<NotificationCenter>,
    initial_load_window: Duration,
    views: RwLock<ViewState>,
    selection: Mutex<Option<ActiveSelection>>,
    generation: AtomicU64,
    state: watch::Sender<MultiplexState>,
    revision: watch::Sender<u64>,
    last_error: watch::Sender<Option<SyncError>>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Some(active) = self.selection.get_mut().take() {
            for task in active.tasks {
                task.abort();
            }
        }
    }
}

impl Shared {
    /// Move the view to a fresh, empty generation.
    async fn begin_generation(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut views = self.views.write().await;
        views.reset(generation);
        self.revision.send_replace(views.revision());
        generation
    }

    async fn teardown(&self, selection: &mut Option<ActiveSelection>) {
        if let Some(active) = selection.take() {
            for task in &active.tasks {
                task.abort();
            }
            info!(
                "Closed {} subscriptions for workspace {}",
                active.tasks.len(),
                active.context.workspace_id
            );
            self.state.send_replace(MultiplexState::TornDown);
        }
        self.begin_generation().await;
    }

    /// Apply one delivered batch: replace the stream's view and, past the
    /// initial-load window, raise notifications for added records.
    async fn apply(&self, context: &SessionContext, collection: Collection, batch: ChangeBatch) {
        let mut views = self.views.write().await;
        if views.generation != context.generation {
            debug!("Dropping stale {} batch", collection);
            return;
        }

        let notices = if context.within_initial_load.load(Ordering::SeqCst) {
            Vec::new()
        } else {
            let self_name = views.member_name(&context.user_id);
            reconciler::notifications_for(collection, &batch, self_name)
        };

        views.replace(collection, batch.docs);
        self.revision.send_replace(views.revision());

        for message in notices {
            self.notifications.push(message).await;
        }
    }

    /// Tear down the selection of `generation` if it is still the current
    /// one, forgetting the persisted id.
    async fn close_gone(&self, generation: u64) {
        let mut selection = self.selection.lock().await;
        let current = selection
            .as_ref()
            .map(|active| active.context.generation == generation)
            .unwrap_or(false);
        if !current {
            return;
        }
        self.teardown(&mut selection).await;
        if let Err(e) = self.storage.remove(WORKSPACE_KEY) {
            warn!("Failed to clear workspace selection: {}", e);
        }
        self.last_error.send_replace(Some(SyncError::NotFound));
    }
}

async fn forward_collection(
    shared: Weak<Shared>,
    context: Arc<SessionContext>,
    collection: Collection,
    mut stream: ChangeStream,
) {
    while let Some(batch) = stream.next().await {
        let Some(shared) = shared.upgrade() else {
            return;
        };
        shared.apply(&context, collection, batch).await;
    }
    debug!(
        "{} subscription for workspace {} ended",
        collection, context.workspace_id
    );
}

async fn forward_workspace(
    shared: Weak<Shared>,
    context: Arc<SessionContext>,
    mut stream: WorkspaceStream,
) {
    while let Some(value) = stream.next().await {
        let Some(shared) = shared.upgrade() else {
            return;
        };
        match value {
            Some(workspace) => {
                let mut views = shared.views.write().await;
                if views.generation != context.generation {
                    return;
                }
                views.set_workspace(workspace);
                shared.revision.send_replace(views.revision());
            }
            None => {
                warn!("Workspace {} no longer exists", context.workspace_id);
                // Teardown aborts this task, so it runs detached.
                let generation = context.generation;
                tokio::spawn(async move { shared.close_gone(generation).await });
                return;
            }
        }
    }
}

/// Subscription multiplexer for the selected workspace.
pub struct Multiplexer {
    shared: Arc<Shared>,
}

impl Multiplexer {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        storage: Arc<dyn LocalStorage>,
        notifications: Arc<NotificationCenter>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                storage,
                notifications,
                initial_load_window: config.initial_load_window,
                views: RwLock::new(ViewState::default()),
                selection: Mutex::new(None),
                generation: AtomicU64::new(0),
                state: watch::channel(MultiplexState::Idle).0,
                revision: watch::channel(0).0,
                last_error: watch::channel(None).0,
            }),
        }
    }

    /// Subscribe to `workspace_id` on behalf of `user_id`, replacing any
    /// previous selection.
    ///
    /// A stream that fails to open is logged and skipped; the others still
    /// go live. An unknown workspace fails with `NotFound`.
    pub async fn open(&self, workspace_id: &WorkspaceId, user_id: &UserId) -> Result<(), SyncError> {
        let shared = &self.shared;
        let mut selection = shared.selection.lock().await;
        shared.teardown(&mut selection).await;

        let generation = shared.begin_generation().await;
        shared.state.send_replace(MultiplexState::Subscribing);
        let context = Arc::new(SessionContext {
            generation,
            workspace_id: workspace_id.clone(),
            user_id: user_id.clone(),
            within_initial_load: AtomicBool::new(true),
        });
        let weak = Arc::downgrade(shared);
        let mut tasks = Vec::with_capacity(Collection::ALL.len() + 2);

        match shared.store.watch_workspace(workspace_id).await {
            Ok(stream) => tasks.push(tokio::spawn(forward_workspace(
                weak.clone(),
                context.clone(),
                stream,
            ))),
            Err(StoreError::NotFound) => {
                warn!("Workspace {} not found while subscribing", workspace_id);
                shared.state.send_replace(MultiplexState::TornDown);
                if let Err(e) = shared.storage.remove(WORKSPACE_KEY) {
                    warn!("Failed to clear workspace selection: {}", e);
                }
                shared.last_error.send_replace(Some(SyncError::NotFound));
                return Err(SyncError::NotFound);
            }
            Err(e) => warn!("Failed to watch workspace {}: {}", workspace_id, e),
        }

        for collection in Collection::ALL {
            let order = match collection {
                Collection::Chat => SourceOrder::CreatedAtAscending,
                _ => SourceOrder::Unordered,
            };
            match shared.store.subscribe(workspace_id, collection, order).await {
                Ok(stream) => tasks.push(tokio::spawn(forward_collection(
                    weak.clone(),
                    context.clone(),
                    collection,
                    stream,
                ))),
                Err(e) => warn!(
                    "Failed to subscribe to {}: {}",
                    collection.path(workspace_id),
                    e
                ),
            }
        }

        // One timer for the whole selection.
        let window = shared.initial_load_window;
        let timer_context = context.clone();
        tasks.push(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            timer_context
                .within_initial_load
                .store(false, Ordering::SeqCst);
            debug!(
                "Initial load window closed for workspace {}",
                timer_context.workspace_id
            );
        }));

        info!("Subscribed to workspace {}", workspace_id);
        *selection = Some(ActiveSelection { context, tasks });
        shared.state.send_replace(MultiplexState::Live);
        shared.last_error.send_replace(None);
        Ok(())
    }

    /// Cancel every subscription and discard the cached view.
    pub async fn close(&self) {
        let mut selection = self.shared.selection.lock().await;
        self.shared.teardown(&mut selection).await;
    }

    pub fn state(&self) -> MultiplexState {
        *self.shared.state.borrow()
    }

    /// Workspace of the live selection.
    pub async fn active_workspace(&self) -> Option<WorkspaceId> {
        self.shared
            .selection
            .lock()
            .await
            .as_ref()
            .map(|active| active.context.workspace_id.clone())
    }

    /// Whether the current selection is still replaying history.
    pub async fn within_initial_load(&self) -> bool {
        self.shared
            .selection
            .lock()
            .await
            .as_ref()
            .map(|active| active.context.within_initial_load.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    pub async fn views(&self) -> RwLockReadGuard<'_, ViewState> {
        self.shared.views.read().await
    }

    /// Feed of view revisions; it ticks whenever the view changes.
    pub fn revisions(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.shared.notifications
    }

    /// Most recent selection-level error (for example, the workspace
    /// disappearing while live). Cleared by the next successful open.
    pub fn last_error(&self) -> Option<SyncError> {
        self.shared.last_error.borrow().clone()
    }

    pub(crate) fn record_error(&self, error: SyncError) {
        self.shared.last_error.send_replace(Some(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hub_config::MemoryStorage;
    use hub_storage::{encode_fields, CreateWorkspaceParams, Goal, Member, Rank, RecordId, Workspace};
    use hub_store_memory::MemoryStore;

    async fn settle() {
        for _ in 0..50 {
            tokio::task::yield_now().await;
        }
    }

    async fn seeded_store(leader: &str) -> (MemoryStore, Workspace) {
        let store = MemoryStore::new();
        let workspace = store
            .create_workspace(&CreateWorkspaceParams {
                name: "Test".to_string(),
                prize_text: String::new(),
                leader: Member::new(UserId::from(leader), "Alice", Rank::Leader, Utc::now()),
            })
            .await
            .unwrap();
        (store, workspace)
    }

    fn multiplexer(store: Arc<dyn DocumentStore>) -> Multiplexer {
        let config = SyncConfig::default();
        Multiplexer::new(
            store,
            Arc::new(MemoryStorage::new()),
            Arc::new(NotificationCenter::from_config(&config)),
            &config,
        )
    }

    async fn add_goal(store: &MemoryStore, ws: &WorkspaceId, text: &str, by: &str) {
        let goal = Goal {
            id: RecordId::default(),
            text: text.to_string(),
            created_by: by.to_string(),
            created_at: Utc::now(),
        };
        store
            .append(ws, Collection::Goals, &encode_fields(&goal).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn open_goes_live_with_initial_snapshot() {
        let (store, ws) = seeded_store("u1").await;
        add_goal(&store, &ws.id, "Existing", "Bob").await;
        let mux = multiplexer(Arc::new(store.clone()));
        assert_eq!(mux.state(), MultiplexState::Idle);

        mux.open(&ws.id, &UserId::from("u1")).await.unwrap();
        settle().await;

        assert_eq!(mux.state(), MultiplexState::Live);
        assert!(mux.within_initial_load().await);
        let views = mux.views().await;
        assert_eq!(views.goals().len(), 1);
        assert_eq!(views.members().len(), 1);
        assert_eq!(views.workspace().map(|w| w.id.clone()), Some(ws.id.clone()));
        drop(views);
        assert!(mux.notifications().active().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn window_closes_once_after_delay() {
        let (store, ws) = seeded_store("u1").await;
        let mux = multiplexer(Arc::new(store));
        mux.open(&ws.id, &UserId::from("u1")).await.unwrap();

        tokio::time::advance(Duration::from_millis(2499)).await;
        settle().await;
        assert!(mux.within_initial_load().await);

        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;
        assert!(!mux.within_initial_load().await);
    }

    #[tokio::test(start_paused = true)]
    async fn close_discards_view() {
        let (store, ws) = seeded_store("u1").await;
        add_goal(&store, &ws.id, "Existing", "Bob").await;
        let mux = multiplexer(Arc::new(store.clone()));
        mux.open(&ws.id, &UserId::from("u1")).await.unwrap();
        settle().await;

        mux.close().await;
        assert_eq!(mux.state(), MultiplexState::TornDown);
        assert!(mux.active_workspace().await.is_none());

        add_goal(&store, &ws.id, "After close", "Bob").await;
        settle().await;
        let views = mux.views().await;
        assert!(views.goals().is_empty());
        assert!(views.workspace().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_workspace_is_not_found() {
        let store = MemoryStore::new();
        let mux = multiplexer(Arc::new(store));
        let err = mux
            .open(&WorkspaceId::from("missing"), &UserId::from("u1"))
            .await
            .unwrap_err();
        assert_eq!(err, SyncError::NotFound);
        assert_eq!(mux.last_error(), Some(SyncError::NotFound));
        assert!(mux.active_workspace().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn removed_workspace_tears_down() {
        let (store, ws) = seeded_store("u1").await;
        let storage = Arc::new(MemoryStorage::new());
        storage.set(WORKSPACE_KEY, ws.id.as_str()).unwrap();
        let config = SyncConfig::default();
        let mux = Multiplexer::new(
            Arc::new(store.clone()),
            storage.clone(),
            Arc::new(NotificationCenter::from_config(&config)),
            &config,
        );
        mux.open(&ws.id, &UserId::from("u1")).await.unwrap();
        settle().await;

        store.remove_workspace(&ws.id).unwrap();
        settle().await;

        assert_eq!(mux.state(), MultiplexState::TornDown);
        assert_eq!(mux.last_error(), Some(SyncError::NotFound));
        assert_eq!(storage.get(WORKSPACE_KEY).unwrap(), None);
        assert!(mux.views().await.members().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn revisions_tick_on_updates() {
        let (store, ws) = seeded_store("u1").await;
        let mux = multiplexer(Arc::new(store.clone()));
        let mut revisions = mux.revisions();
        mux.open(&ws.id, &UserId::from("u1")).await.unwrap();
        settle().await;
        revisions.borrow_and_update();

        add_goal(&store, &ws.id, "New", "Bob").await;
        settle().await;
        assert!(revisions.has_changed().unwrap());
    }
}
