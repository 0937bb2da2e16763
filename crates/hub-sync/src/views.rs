//! Local read-through cache of the active workspace.
//!
//! Each stream's view is replaced wholesale by every delivered batch. Non-chat
//! streams are kept newest first; chat keeps the ascending order the store
//! delivers.

use std::collections::HashMap;

use hub_storage::{
    ChatMessage, Collection, Document, Goal, Meeting, Member, Message, Trip, UserId, Win,
    Workspace,
};
use serde::de::DeserializeOwned;
use tracing::warn;

#[derive(Debug, Default)]
pub struct ViewState {
    /// Session generation the cached data belongs to.
    pub(crate) generation: u64,
    workspace: Option<Workspace>,
    streams: HashMap<Collection, Vec<Document>>,
    revision: u64,
}

impl ViewState {
    /// Replace a stream's view with a delivered snapshot.
    pub(crate) fn replace(&mut self, collection: Collection, mut docs: Vec<Document>) {
        if collection != Collection::Chat {
            // Stable, so equal timestamps keep delivery order.
            docs.sort_by_key(|d| std::cmp::Reverse(d.created_at_millis()));
        }
        self.streams.insert(collection, docs);
        self.revision += 1;
    }

    pub(crate) fn set_workspace(&mut self, workspace: Workspace) {
        self.workspace = Some(workspace);
        self.revision += 1;
    }

    /// Drop everything cached and move to a new generation.
    pub(crate) fn reset(&mut self, generation: u64) {
        self.generation = generation;
        self.workspace = None;
        self.streams.clear();
        self.revision += 1;
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn workspace(&self) -> Option<&Workspace> {
        self.workspace.as_ref()
    }

    /// Raw documents of a stream, in view order.
    pub fn documents(&self, collection: Collection) -> &[Document] {
        self.streams
            .get(&collection)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn decoded<T: DeserializeOwned>(&self, collection: Collection) -> Vec<T> {
        self.documents(collection)
            .iter()
            .filter_map(|doc| match doc.decode() {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping malformed {} document {}: {}", collection, doc.id, e);
                    None
                }
            })
            .collect()
    }

    pub fn members(&self) -> Vec<Member> {
        self.decoded(Collection::Members)
    }

    pub fn member(&self, user_id: &UserId) -> Option<Member> {
        self.documents(Collection::Members)
            .iter()
            .find(|doc| doc.id.as_str() == user_id.as_str())
            .and_then(|doc| doc.decode().ok())
    }

    /// Display name of a member, read straight from the roster.
    pub fn member_name(&self, user_id: &UserId) -> Option<&str> {
        self.documents(Collection::Members)
            .iter()
            .find(|doc| doc.id.as_str() == user_id.as_str())
            .and_then(|doc| doc.str_field("name"))
    }

    pub fn goals(&self) -> Vec<Goal> {
        self.decoded(Collection::Goals)
    }

    pub fn trips(&self) -> Vec<Trip> {
        self.decoded(Collection::Trips)
    }

    pub fn messages(&self) -> Vec<Message> {
        self.decoded(Collection::Messages)
    }

    pub fn meetings(&self) -> Vec<Meeting> {
        self.decoded(Collection::Meetings)
    }

    pub fn wins(&self) -> Vec<Win> {
        self.decoded(Collection::Wins)
    }

    pub fn chat(&self) -> Vec<ChatMessage> {
        self.decoded(Collection::Chat)
    }
}
