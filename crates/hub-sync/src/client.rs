//! The client facade: one signed-in user, at most one selected workspace.
//!
//! Reads come from the multiplexer's view. Commands check the caller's
//! permissions against that view, then go through the dispatcher; their
//! effect shows up once the store echoes the write back.

use std::sync::Arc;

use chrono::Utc;
use hub_assist::prompts::{self, GoalAnalysis, WinAnalysis};
use hub_assist::{TextGenerator, AI_AUTHOR};
use hub_config::{LocalStorage, SyncConfig};
use hub_storage::{
    encode_fields, ChatMessage, Collection, DocumentStore, Fields, Goal, IdentityProvider,
    Meeting, Member, Message, MessageKind, Rank, RecordId, Trip, UserId, Win, Workspace,
};
use serde::Serialize;
use tokio::sync::{broadcast, watch, RwLockReadGuard};
use tracing::{info, warn};

use crate::dispatcher::{CommandDispatcher, WriteTarget};
use crate::leaderboard::{compute_leaderboard, LeaderboardEntry};
use crate::multiplexer::{MultiplexState, Multiplexer};
use crate::notifications::{Notification, NotificationCenter};
use crate::permissions::{self, Capability};
use crate::resolver::WorkspaceResolver;
use crate::session::Session;
use crate::views::ViewState;
use crate::SyncError;

/// Author label used when the caller has no member profile yet.
pub const FALLBACK_AUTHOR: &str = "A member";

/// Partial profile edit; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(rename = "businessModel", skip_serializing_if = "Option::is_none")]
    pub business_model_label: Option<String>,
    #[serde(rename = "revenue", skip_serializing_if = "Option::is_none")]
    pub revenue_total_self_reported: Option<String>,
}

fn encode<T: Serialize>(record: &T) -> Result<Fields, SyncError> {
    encode_fields(record).map_err(|e| SyncError::OperationFailed(e.to_string()))
}

fn required(value: &str, what: &str) -> Result<String, SyncError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SyncError::InvalidInput(format!("{what} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn single_field(name: &str, value: impl Into<serde_json::Value>) -> Fields {
    let mut fields = Fields::new();
    fields.insert(name.to_string(), value.into());
    fields
}

pub struct HubClient {
    session: Session,
    resolver: WorkspaceResolver,
    multiplexer: Multiplexer,
    dispatcher: CommandDispatcher,
    assistant: Arc<dyn TextGenerator>,
}

impl HubClient {
    /// Establish the session and restore the persisted workspace selection.
    ///
    /// A stale or unreachable selection is not fatal: the client starts with
    /// no workspace and the reason is available from [`HubClient::last_error`].
    pub async fn connect(
        store: Arc<dyn DocumentStore>,
        identity: &dyn IdentityProvider,
        storage: Arc<dyn LocalStorage>,
        assistant: Arc<dyn TextGenerator>,
        config: &SyncConfig,
    ) -> Result<Self, SyncError> {
        let session = Session::bootstrap(identity).await?;
        let notifications = Arc::new(NotificationCenter::from_config(config));
        let client = Self {
            session,
            resolver: WorkspaceResolver::new(store.clone(), storage.clone()),
            multiplexer: Multiplexer::new(store.clone(), storage, notifications, config),
            dispatcher: CommandDispatcher::new(store),
            assistant,
        };

        match client.resolver.resolve_stored().await {
            Ok(Some(workspace)) => {
                if let Err(e) = client.select(&workspace).await {
                    warn!("Could not restore workspace {}: {}", workspace.id, e);
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Could not restore workspace selection: {}", e);
                client.multiplexer.record_error(e);
            }
        }
        Ok(client)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn user_id(&self) -> Result<&UserId, SyncError> {
        self.session
            .user_id()
            .ok_or_else(|| SyncError::AuthenticationFailure("session not ready".to_string()))
    }

    async fn select(&self, workspace: &Workspace) -> Result<(), SyncError> {
        let user_id = self.user_id()?;
        self.multiplexer.open(&workspace.id, user_id).await
    }

    // ───────────────────────────────────── Selection ─────────────────────────────────────

    /// Create a workspace led by the caller and switch to it.
    pub async fn create_workspace(&self) -> Result<Workspace, SyncError> {
        let workspace = self.resolver.create(self.user_id()?).await?;
        self.select(&workspace).await?;
        Ok(workspace)
    }

    /// Join a workspace by id and switch to it.
    pub async fn join_workspace(&self, target: &str) -> Result<Workspace, SyncError> {
        let workspace = match self.resolver.join(self.user_id()?, target).await {
            Ok(workspace) => workspace,
            Err(e) => {
                self.multiplexer.record_error(e.clone());
                return Err(e);
            }
        };
        self.select(&workspace).await?;
        Ok(workspace)
    }

    /// Drop the selection and every cached record. Nothing remote is deleted.
    pub async fn leave_workspace(&self) -> Result<(), SyncError> {
        self.multiplexer.close().await;
        self.resolver.leave()
    }

    pub fn state(&self) -> MultiplexState {
        self.multiplexer.state()
    }

    pub fn last_error(&self) -> Option<SyncError> {
        self.multiplexer.last_error()
    }

    // ───────────────────────────────────── Reads ─────────────────────────────────────────

    pub async fn views(&self) -> RwLockReadGuard<'_, ViewState> {
        self.multiplexer.views().await
    }

    pub fn revisions(&self) -> watch::Receiver<u64> {
        self.multiplexer.revisions()
    }

    pub async fn workspace(&self) -> Option<Workspace> {
        self.views().await.workspace().cloned()
    }

    /// The caller's member record in the selected workspace.
    pub async fn current_member(&self) -> Option<Member> {
        let user_id = self.session.user_id()?;
        self.views().await.member(user_id)
    }

    pub async fn is_leader(&self) -> bool {
        let views = self.views().await;
        let Some(user_id) = self.session.user_id() else {
            return false;
        };
        let leader_id = views.workspace().map(|w| &w.leader_id);
        match views.member(user_id) {
            Some(member) => permissions::is_leader(&member, leader_id),
            None => false,
        }
    }

    pub async fn has_permission(&self, capability: Capability) -> bool {
        let views = self.views().await;
        let member = self.session.user_id().and_then(|id| views.member(id));
        let leader_id = views.workspace().map(|w| &w.leader_id);
        permissions::has_permission(capability, member.as_ref(), leader_id)
    }

    pub async fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let views = self.views().await;
        compute_leaderboard(&views.members(), &views.wins())
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.multiplexer.notifications().active().await
    }

    pub async fn dismiss_notification(&self, id: u64) -> bool {
        self.multiplexer.notifications().dismiss(id).await
    }

    pub fn notification_feed(&self) -> broadcast::Receiver<Notification> {
        self.multiplexer.notifications().subscribe()
    }

    // ───────────────────────────────────── Commands ──────────────────────────────────────

    async fn write_target(&self) -> Option<WriteTarget> {
        let user_id = self.session.user_id()?.clone();
        let workspace_id = self.multiplexer.active_workspace().await?;
        Some(WriteTarget {
            workspace_id,
            user_id,
        })
    }

    /// Target for a gated command. Without a selection the command is a
    /// no-op, so the check is skipped.
    async fn authorize(&self, capability: Capability) -> Result<Option<WriteTarget>, SyncError> {
        let Some(target) = self.write_target().await else {
            return Ok(None);
        };
        if !self.has_permission(capability).await {
            warn!("User {} lacks {}", target.user_id, capability);
            return Err(SyncError::PermissionDenied(capability.to_string()));
        }
        Ok(Some(target))
    }

    async fn author_name(&self) -> String {
        self.current_member()
            .await
            .map(|m| m.name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| FALLBACK_AUTHOR.to_string())
    }

    pub async fn add_goal(&self, text: &str) -> Result<Option<RecordId>, SyncError> {
        let goal = Goal {
            id: RecordId::default(),
            text: required(text, "goal text")?,
            created_by: self.author_name().await,
            created_at: Utc::now(),
        };
        let target = self.write_target().await;
        self.dispatcher
            .append(target.as_ref(), Collection::Goals, encode(&goal)?)
            .await
    }

    pub async fn delete_goal(&self, goal_id: &RecordId) -> Result<(), SyncError> {
        let target = self.write_target().await;
        self.dispatcher
            .remove(target.as_ref(), Collection::Goals, goal_id)
            .await
    }

    pub async fn add_trip(
        &self,
        name: &str,
        date: &str,
        qualifying_goal_ids: Vec<RecordId>,
    ) -> Result<Option<RecordId>, SyncError> {
        let trip = Trip {
            id: RecordId::default(),
            name: required(name, "trip name")?,
            date: date.trim().to_string(),
            qualifying_goal_ids,
            created_by: self.author_name().await,
            created_at: Utc::now(),
        };
        let target = self.authorize(Capability::CreateTrip).await?;
        self.dispatcher
            .append(target.as_ref(), Collection::Trips, encode(&trip)?)
            .await
    }

    pub async fn delete_trip(&self, trip_id: &RecordId) -> Result<(), SyncError> {
        let target = self.authorize(Capability::CreateTrip).await?;
        self.dispatcher
            .remove(target.as_ref(), Collection::Trips, trip_id)
            .await
    }

    /// Post to the motivation board. Announcements need `SEND_ANNOUNCEMENT`.
    pub async fn post_message(
        &self,
        text: &str,
        kind: MessageKind,
    ) -> Result<Option<RecordId>, SyncError> {
        let message = Message {
            id: RecordId::default(),
            text: required(text, "message text")?,
            author: self.author_name().await,
            kind,
            created_at: Utc::now(),
        };
        let target = match kind {
            MessageKind::Announcement => self.authorize(Capability::SendAnnouncement).await?,
            MessageKind::Standard => self.write_target().await,
        };
        self.dispatcher
            .append(target.as_ref(), Collection::Messages, encode(&message)?)
            .await
    }

    pub async fn add_meeting(
        &self,
        topic: &str,
        agenda: &str,
    ) -> Result<Option<RecordId>, SyncError> {
        let meeting = Meeting {
            id: RecordId::default(),
            topic: required(topic, "meeting topic")?,
            agenda: agenda.to_string(),
            created_by: self.author_name().await,
            created_at: Utc::now(),
        };
        let target = self.write_target().await;
        self.dispatcher
            .append(target.as_ref(), Collection::Meetings, encode(&meeting)?)
            .await
    }

    pub async fn delete_meeting(&self, meeting_id: &RecordId) -> Result<(), SyncError> {
        let target = self.write_target().await;
        self.dispatcher
            .remove(target.as_ref(), Collection::Meetings, meeting_id)
            .await
    }

    /// Log a win for the caller. Revenue must be a finite, non-negative amount.
    pub async fn log_win(
        &self,
        description: &str,
        revenue_amount: f64,
    ) -> Result<Option<RecordId>, SyncError> {
        if !revenue_amount.is_finite() || revenue_amount < 0.0 {
            return Err(SyncError::InvalidInput(format!(
                "revenue must be a non-negative amount, got {revenue_amount}"
            )));
        }
        let Some(target) = self.write_target().await else {
            return Ok(None);
        };
        let win = Win {
            id: RecordId::default(),
            user_id: target.user_id.clone(),
            user_name: self.author_name().await,
            description: required(description, "win description")?,
            revenue_amount,
            created_at: Utc::now(),
        };
        self.dispatcher
            .append(Some(&target), Collection::Wins, encode(&win)?)
            .await
    }

    pub async fn send_chat(&self, text: &str) -> Result<Option<RecordId>, SyncError> {
        let text = required(text, "chat message")?;
        let Some(target) = self.write_target().await else {
            return Ok(None);
        };
        let chat = ChatMessage {
            id: RecordId::default(),
            text,
            sender_id: target.user_id.clone(),
            sender_name: self.author_name().await,
            created_at: Utc::now(),
        };
        self.dispatcher
            .append(Some(&target), Collection::Chat, encode(&chat)?)
            .await
    }

    /// Update the caller's own profile.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), SyncError> {
        let patch = encode(update)?;
        if patch.is_empty() {
            return Ok(());
        }
        let Some(target) = self.write_target().await else {
            return Ok(());
        };
        let member_id = target.user_id.clone();
        self.dispatcher
            .update_member_field(Some(&target), &member_id, patch)
            .await
    }

    /// Change another member's rank. Leader only; `Leader` itself is never
    /// handed out and the leader's own rank is fixed.
    pub async fn set_rank(&self, member_id: &UserId, rank: Rank) -> Result<(), SyncError> {
        if !rank.is_assignable() {
            return Err(SyncError::InvalidInput(format!("{rank} cannot be assigned")));
        }
        let target = self.authorize(Capability::ManageRanks).await?;
        if target.is_some() {
            let views = self.views().await;
            let leader_id = views.workspace().map(|w| &w.leader_id);
            match views.member(member_id) {
                Some(member) if permissions::is_leader(&member, leader_id) => {
                    return Err(SyncError::InvalidInput(
                        "the leader's rank cannot change".to_string(),
                    ));
                }
                Some(_) => {}
                None => {
                    return Err(SyncError::InvalidInput(format!("unknown member {member_id}")));
                }
            }
        }
        info!("Setting rank of {} to {}", member_id, rank);
        self.dispatcher
            .update_member_field(target.as_ref(), member_id, single_field("rank", rank.as_str()))
            .await
    }

    pub async fn rename_workspace(&self, name: &str) -> Result<(), SyncError> {
        let name = required(name, "workspace name")?;
        let target = self.authorize(Capability::EditWorkspace).await?;
        self.dispatcher
            .update_workspace_field(target.as_ref(), single_field("name", name))
            .await
    }

    pub async fn update_prizes(&self, prize_text: &str) -> Result<(), SyncError> {
        let target = self.authorize(Capability::EditWorkspace).await?;
        self.dispatcher
            .update_workspace_field(target.as_ref(), single_field("prizes", prize_text))
            .await
    }

    /// Post an assistant-written summary as an announcement.
    pub async fn post_summary(&self, summary: &str) -> Result<Option<RecordId>, SyncError> {
        let message = Message {
            id: RecordId::default(),
            text: required(summary, "summary")?,
            author: AI_AUTHOR.to_string(),
            kind: MessageKind::Announcement,
            created_at: Utc::now(),
        };
        let target = self.authorize(Capability::SendAnnouncement).await?;
        self.dispatcher
            .append(target.as_ref(), Collection::Messages, encode(&message)?)
            .await
    }

    // ───────────────────────────────────── Assistant ─────────────────────────────────────

    pub async fn generate_agenda(&self, topic: &str) -> String {
        self.assistant.generate(&prompts::meeting_agenda(topic)).await
    }

    pub async fn analyze_win(&self, win: &Win) -> WinAnalysis {
        let text = self.assistant.generate(&prompts::win_analysis(win)).await;
        prompts::parse_win_analysis(&text)
    }

    /// Share a win analysis on the motivation board as an announcement.
    pub async fn post_win_analysis(
        &self,
        win: &Win,
        analysis: &WinAnalysis,
    ) -> Result<Option<RecordId>, SyncError> {
        let message = Message {
            id: RecordId::default(),
            text: analysis.board_text(&win.user_name),
            author: AI_AUTHOR.to_string(),
            kind: MessageKind::Announcement,
            created_at: Utc::now(),
        };
        let target = self.write_target().await;
        self.dispatcher
            .append(target.as_ref(), Collection::Messages, encode(&message)?)
            .await
    }

    /// Weekly wins summary of the last seven days of goals and messages.
    pub async fn weekly_summary(&self) -> String {
        let prompt = {
            let views = self.views().await;
            prompts::weekly_summary(&views.goals(), &views.messages(), Utc::now())
        };
        match prompt {
            Some(prompt) => self.assistant.generate(&prompt).await,
            None => prompts::NOT_ENOUGH_ACTIVITY.to_string(),
        }
    }

    /// Itinerary for a trip in the current view; `None` if the trip is unknown.
    pub async fn trip_itinerary(&self, trip_id: &RecordId) -> Option<String> {
        let prompt = {
            let views = self.views().await;
            let trip = views.trips().into_iter().find(|t| &t.id == trip_id)?;
            prompts::trip_itinerary(&trip, &views.members(), &views.goals())
        };
        Some(self.assistant.generate(&prompt).await)
    }

    pub async fn motivation(&self) -> String {
        let prompt = {
            let views = self.views().await;
            prompts::motivation(&views.members(), &views.goals())
        };
        self.assistant.generate(&prompt).await
    }

    /// Suggested steps for a goal that has not been added yet.
    pub async fn break_down_goal(&self, goal: &str) -> Result<Vec<String>, SyncError> {
        let goal = required(goal, "goal text")?;
        let text = self.assistant.generate(&prompts::goal_breakdown(&goal)).await;
        Ok(prompts::parse_lines(&text))
    }

    pub async fn analyze_goal(&self, goal: &str) -> Result<GoalAnalysis, SyncError> {
        let goal = required(goal, "goal text")?;
        let text = self.assistant.generate(&prompts::goal_analysis(&goal)).await;
        Ok(prompts::parse_goal_analysis(&text))
    }

    /// Name ideas for the workspace, one per entry.
    pub async fn suggest_group_names(&self) -> Vec<String> {
        let prompt = {
            let views = self.views().await;
            prompts::group_names(&views.members())
        };
        let text = self.assistant.generate(&prompt).await;
        prompts::parse_lines(&text)
    }

    /// Accountability question for the caller; `None` without a member profile.
    pub async fn check_in(&self) -> Option<String> {
        let prompt = {
            let views = self.views().await;
            let member = views.member(self.session.user_id()?)?;
            prompts::check_in(&member, &views.goals())
        };
        Some(self.assistant.generate(&prompt).await)
    }
}
