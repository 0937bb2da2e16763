//! End-to-end behavior of several clients sharing one in-process store.

mod common;

use std::sync::Arc;

use common::*;
use hub_config::{LocalStorage, MemoryStorage, WORKSPACE_KEY};
use hub_storage::{Collection, MessageKind, Rank};
use hub_store_memory::{MemoryIdentity, MemoryStore};
use hub_sync::{HubClient, MultiplexState, SyncError};

#[tokio::test(start_paused = true)]
async fn create_makes_caller_leader() {
    let store = MemoryStore::new();
    let alice = connect(&store).await;

    let ws = alice.create_workspace().await.unwrap();
    settle().await;

    let me = alice.session().user_id().unwrap().clone();
    assert_eq!(ws.leader_id, me);
    assert_eq!(alice.state(), MultiplexState::Live);

    let member = alice.current_member().await.unwrap();
    assert_eq!(member.rank, Rank::Leader);
    assert!(alice.is_leader().await);
    assert_eq!(
        alice.storage.get(WORKSPACE_KEY).unwrap(),
        Some(ws.id.to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn double_join_keeps_one_member() {
    let store = MemoryStore::new();
    let alice = connect(&store).await;
    let ws = alice.create_workspace().await.unwrap();

    let bob = connect(&store).await;
    bob.join_workspace(ws.id.as_str()).await.unwrap();
    settle().await;
    rename(&bob, "Bob").await;

    bob.join_workspace(ws.id.as_str()).await.unwrap();
    settle().await;

    assert_eq!(store.record_count(&ws.id, Collection::Members), 2);
    let me = bob.current_member().await.unwrap();
    assert_eq!(me.rank, Rank::Member);
    // The second join did not reset the profile.
    assert_eq!(me.name, "Bob");
}

#[tokio::test(start_paused = true)]
async fn join_unknown_workspace_is_not_found() {
    let store = MemoryStore::new();
    let bob = connect(&store).await;

    assert_eq!(bob.join_workspace("nope").await, Err(SyncError::NotFound));
    assert_eq!(bob.last_error(), Some(SyncError::NotFound));
    assert_eq!(bob.state(), MultiplexState::Idle);
    assert_eq!(bob.storage.get(WORKSPACE_KEY).unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn goal_after_window_notifies_others_once() {
    let store = MemoryStore::new();
    let alice = connect(&store).await;
    let ws = alice.create_workspace().await.unwrap();
    settle().await;
    rename(&alice, "Alice").await;

    let bob = connect(&store).await;
    bob.join_workspace(ws.id.as_str()).await.unwrap();
    settle().await;
    rename(&bob, "Bob").await;

    pass_window().await;
    bob.add_goal("Launch").await.unwrap();
    settle().await;

    assert_eq!(messages(&alice).await, vec!["New goal: \"Launch\""]);
    assert!(messages(&bob).await.is_empty());
    assert_eq!(alice.views().await.goals()[0].created_by, "Bob");
}

#[tokio::test(start_paused = true)]
async fn history_replay_is_silent() {
    let store = MemoryStore::new();
    let alice = connect(&store).await;
    let ws = alice.create_workspace().await.unwrap();
    settle().await;
    rename(&alice, "Alice").await;
    for text in ["One", "Two", "Three"] {
        alice.add_goal(text).await.unwrap();
    }

    let bob = connect(&store).await;
    bob.join_workspace(ws.id.as_str()).await.unwrap();
    settle().await;

    // Writes landing inside Bob's window are still silent for him.
    alice.send_chat("hello").await.unwrap();
    settle().await;

    assert_eq!(bob.views().await.goals().len(), 3);
    assert_eq!(bob.views().await.chat().len(), 1);
    assert!(messages(&bob).await.is_empty());

    pass_window().await;
    alice.send_chat("still there?").await.unwrap();
    settle().await;
    assert_eq!(messages(&bob).await, vec!["New chat message: \"still there?\""]);
}

#[tokio::test(start_paused = true)]
async fn notifications_are_capped_newest_first() {
    let store = MemoryStore::new();
    let alice = connect(&store).await;
    let ws = alice.create_workspace().await.unwrap();
    settle().await;
    rename(&alice, "Alice").await;

    let bob = connect(&store).await;
    bob.join_workspace(ws.id.as_str()).await.unwrap();
    settle().await;
    rename(&bob, "Bob").await;
    pass_window().await;

    for i in 1..=6 {
        bob.add_goal(&format!("g{i}")).await.unwrap();
        settle().await;
    }

    assert_eq!(
        messages(&alice).await,
        vec![
            "New goal: \"g6\"",
            "New goal: \"g5\"",
            "New goal: \"g4\"",
            "New goal: \"g3\"",
            "New goal: \"g2\"",
        ]
    );

    tokio::time::advance(std::time::Duration::from_secs(5)).await;
    assert!(alice.notifications().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn leaderboard_ranks_by_total_revenue() {
    let store = MemoryStore::new();
    let alice = connect(&store).await;
    let ws = alice.create_workspace().await.unwrap();
    let bob = connect(&store).await;
    bob.join_workspace(ws.id.as_str()).await.unwrap();
    settle().await;

    alice.log_win("First client", 100.0).await.unwrap();
    bob.log_win("Side gig", 50.0).await.unwrap();
    bob.log_win("Big deal", 100.0).await.unwrap();
    settle().await;

    let board = alice.leaderboard().await;
    let ranking: Vec<_> = board
        .iter()
        .map(|e| (e.member.id.clone(), e.total_revenue))
        .collect();
    assert_eq!(
        ranking,
        vec![
            (bob.session().user_id().unwrap().clone(), 150.0),
            (alice.session().user_id().unwrap().clone(), 100.0),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn switching_workspaces_drops_stale_records() {
    let store = MemoryStore::new();
    let alice = connect(&store).await;
    let first = alice.create_workspace().await.unwrap();
    settle().await;
    alice.add_goal("Old goal").await.unwrap();
    settle().await;
    assert_eq!(alice.views().await.goals().len(), 1);

    let bob = connect(&store).await;
    let second = bob.create_workspace().await.unwrap();

    alice.leave_workspace().await.unwrap();
    assert!(alice.views().await.goals().is_empty());
    assert_eq!(alice.state(), MultiplexState::TornDown);

    alice.join_workspace(second.id.as_str()).await.unwrap();
    settle().await;

    // Writes to the abandoned workspace never reach the new view.
    bob.client.leave_workspace().await.unwrap();
    bob.join_workspace(first.id.as_str()).await.unwrap();
    bob.add_goal("Late write").await.unwrap();
    settle().await;

    assert!(alice.views().await.goals().is_empty());
    assert_eq!(
        alice.workspace().await.map(|w| w.id),
        Some(second.id.clone())
    );
    assert_eq!(store.record_count(&first.id, Collection::Goals), 2);
}

#[tokio::test(start_paused = true)]
async fn leave_deletes_nothing_remote() {
    let store = MemoryStore::new();
    let alice = connect(&store).await;
    let ws = alice.create_workspace().await.unwrap();
    settle().await;
    alice.add_goal("Keep me").await.unwrap();

    alice.leave_workspace().await.unwrap();
    assert_eq!(alice.storage.get(WORKSPACE_KEY).unwrap(), None);
    assert_eq!(store.record_count(&ws.id, Collection::Goals), 1);
    assert_eq!(store.record_count(&ws.id, Collection::Members), 1);
}

#[tokio::test(start_paused = true)]
async fn removed_workspace_clears_selection() {
    let store = MemoryStore::new();
    let alice = connect(&store).await;
    let ws = alice.create_workspace().await.unwrap();
    settle().await;

    store.remove_workspace(&ws.id).unwrap();
    settle().await;

    assert_eq!(alice.state(), MultiplexState::TornDown);
    assert_eq!(alice.last_error(), Some(SyncError::NotFound));
    assert_eq!(alice.storage.get(WORKSPACE_KEY).unwrap(), None);
    assert!(alice.workspace().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn connect_restores_persisted_selection() {
    let store = MemoryStore::new();
    let alice = connect(&store).await;
    let ws = alice.create_workspace().await.unwrap();
    alice.add_goal("Remembered").await.unwrap();

    let storage = Arc::new(MemoryStorage::new());
    storage.set(WORKSPACE_KEY, ws.id.as_str()).unwrap();
    let again = connect_with(
        Arc::new(store.clone()),
        storage,
        Arc::new(ScriptedGenerator::replying("ok")),
    )
    .await;
    settle().await;

    assert_eq!(again.state(), MultiplexState::Live);
    assert_eq!(again.views().await.goals().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn connect_with_stale_selection_starts_idle() {
    let store = MemoryStore::new();
    let storage = Arc::new(MemoryStorage::new());
    storage.set(WORKSPACE_KEY, "deleted-long-ago").unwrap();

    let client = connect_with(
        Arc::new(store),
        storage.clone(),
        Arc::new(ScriptedGenerator::replying("ok")),
    )
    .await;

    assert_eq!(client.state(), MultiplexState::Idle);
    assert_eq!(client.last_error(), Some(SyncError::NotFound));
    assert_eq!(storage.get(WORKSPACE_KEY).unwrap(), None);
}

#[tokio::test]
async fn rejected_sign_in_fails_connect() {
    let store = MemoryStore::new();
    let result = HubClient::connect(
        Arc::new(store),
        &MemoryIdentity::rejecting(),
        Arc::new(MemoryStorage::new()),
        Arc::new(ScriptedGenerator::replying("ok")),
        &hub_config::SyncConfig::default(),
    )
    .await;
    assert!(matches!(result, Err(SyncError::AuthenticationFailure(_))));
}

#[tokio::test(start_paused = true)]
async fn message_kinds_round_trip_through_the_store() {
    let store = MemoryStore::new();
    let alice = connect(&store).await;
    alice.create_workspace().await.unwrap();
    settle().await;

    alice
        .post_message("Team call at 5", MessageKind::Announcement)
        .await
        .unwrap();
    alice.post_message("Keep going", MessageKind::Standard).await.unwrap();
    settle().await;

    let kinds: Vec<MessageKind> = alice
        .views()
        .await
        .messages()
        .into_iter()
        .map(|m| m.kind)
        .collect();
    assert!(kinds.contains(&MessageKind::Announcement));
    assert!(kinds.contains(&MessageKind::Standard));
}
