//! Real-time sync and notification engine for Hustle Hub workspaces.
//!
//! Components, leaf first:
//! - [`Session`]: anonymous identity bootstrap
//! - [`WorkspaceResolver`]: persisted selection, create/join/leave
//! - [`Multiplexer`]: one live subscription per record stream, torn down as a set
//! - [`reconciler`]: snapshot replacement and "who changed what" notifications
//! - [`permissions`]: rank-based capability checks
//! - [`CommandDispatcher`]: writes under `workspaces/{id}/{collection}`
//! - [`leaderboard`]: revenue ranking from roster and wins
//!
//! [`HubClient`] wires them together.

mod client;
mod dispatcher;
mod error;
pub mod leaderboard;
mod multiplexer;
mod notifications;
pub mod permissions;
pub mod reconciler;
mod resolver;
mod session;
mod views;

pub use client::{HubClient, ProfileUpdate, FALLBACK_AUTHOR};
pub use dispatcher::{CommandDispatcher, WriteTarget};
pub use error::SyncError;
pub use leaderboard::{compute_leaderboard, LeaderboardEntry};
pub use multiplexer::{MultiplexState, Multiplexer};
pub use notifications::{Notification, NotificationCenter};
pub use permissions::{has_permission, Capability};
pub use resolver::WorkspaceResolver;
pub use session::Session;
pub use views::ViewState;
