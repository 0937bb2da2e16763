use std::sync::Arc;
use std::time::Duration;

use hub_assist::{GeminiClient, TextGenerator};
use hub_config::{AssistConfig, LocalStorage, MemoryStorage, SyncConfig};
use hub_storage::{DocumentStore, MessageKind};
use hub_store_memory::{MemoryIdentity, MemoryStore};
use hub_sync::{HubClient, ProfileUpdate};
use tracing::info;

/// Margin past the initial-load window before posting live updates.
const SETTLE: Duration = Duration::from_millis(200);

async fn connect(
    store: &MemoryStore,
    assistant: Arc<dyn TextGenerator>,
    config: &SyncConfig,
    name: &str,
) -> Result<HubClient, Box<dyn std::error::Error>> {
    let store: Arc<dyn DocumentStore> = Arc::new(store.clone());
    let storage: Arc<dyn LocalStorage> = Arc::new(MemoryStorage::new());
    let client =
        HubClient::connect(store, &MemoryIdentity::new(), storage, assistant, config).await?;
    info!(
        "{} signed in as {}",
        name,
        client.session().user_id().map(|id| id.to_string()).unwrap_or_default()
    );
    Ok(client)
}

async fn set_name(client: &HubClient, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    client
        .update_profile(&ProfileUpdate {
            name: Some(name.to_string()),
            ..Default::default()
        })
        .await?;
    Ok(())
}

pub async fn cmd_demo(window_ms: Option<u64>, goals: usize) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = SyncConfig::from_env()?;
    if let Some(ms) = window_ms {
        config.initial_load_window = Duration::from_millis(ms);
    }
    let assistant: Arc<dyn TextGenerator> = Arc::new(GeminiClient::new(AssistConfig::from_env()));
    let store = MemoryStore::new();

    let leader = connect(&store, assistant.clone(), &config, "Leader").await?;
    let workspace = leader.create_workspace().await?;
    set_name(&leader, "Ava").await?;
    println!("✓ Workspace created: {} ({})", workspace.name, workspace.id);

    let member = connect(&store, assistant, &config, "Member").await?;
    member.join_workspace(workspace.id.as_str()).await?;
    set_name(&member, "Ben").await?;
    println!("✓ Second member joined");

    println!(
        "  Waiting {}ms for the initial load to finish...",
        config.initial_load_window.as_millis()
    );
    tokio::time::sleep(config.initial_load_window + SETTLE).await;

    for i in 1..=goals {
        member.add_goal(&format!("Reach {} new clients", i * 5)).await?;
    }
    member.log_win("Closed first retainer", 1200.0).await?;
    leader.log_win("Launched the online store", 800.0).await?;
    leader.log_win("Weekend market stall", 650.0).await?;
    leader
        .post_message("Team call Friday at 5pm", MessageKind::Announcement)
        .await?;
    tokio::time::sleep(SETTLE).await;

    println!();
    println!("Notifications seen by Ava:");
    let seen = leader.notifications().await;
    if seen.is_empty() {
        println!("  (none)");
    }
    for notification in seen {
        println!("  • {}", notification.message);
    }

    println!();
    println!("Notifications seen by Ben:");
    let seen = member.notifications().await;
    if seen.is_empty() {
        println!("  (none)");
    }
    for notification in seen {
        println!("  • {}", notification.message);
    }

    println!();
    println!("Leaderboard:");
    for (place, entry) in leader.leaderboard().await.iter().enumerate() {
        println!(
            "  {}. {} ({}) ${:.2}",
            place + 1,
            entry.member.name,
            entry.member.rank,
            entry.total_revenue
        );
    }

    leader.leave_workspace().await?;
    member.leave_workspace().await?;
    Ok(())
}
