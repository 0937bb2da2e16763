//! Ephemeral, process-local notifications.
//!
//! The center keeps the newest `cap` entries, most recent first. Each entry
//! expires `ttl` after it was raised regardless of the others; expiry is
//! applied lazily whenever the list is read or written.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use hub_config::{SyncConfig, DEFAULT_NOTIFICATION_CAP};
use tokio::sync::{broadcast, Mutex};
use tokio::time::Instant;

const FEED_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub raised_at: Instant,
}

pub struct NotificationCenter {
    cap: usize,
    ttl: Duration,
    next_id: AtomicU64,
    entries: Mutex<VecDeque<Notification>>,
    feed: broadcast::Sender<Notification>,
}

impl NotificationCenter {
    /// `cap` is clamped to [`DEFAULT_NOTIFICATION_CAP`].
    pub fn new(cap: usize, ttl: Duration) -> Self {
        let cap = cap.min(DEFAULT_NOTIFICATION_CAP);
        Self {
            cap,
            ttl,
            next_id: AtomicU64::new(1),
            entries: Mutex::new(VecDeque::with_capacity(cap)),
            feed: broadcast::channel(FEED_CAPACITY).0,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.notification_cap, config.notification_ttl)
    }

    fn prune(&self, entries: &mut VecDeque<Notification>, now: Instant) {
        entries.retain(|n| now.duration_since(n.raised_at) < self.ttl);
    }

    /// Raise a notification; the oldest entry is evicted past the cap.
    pub async fn push(&self, message: impl Into<String>) -> Notification {
        let now = Instant::now();
        let notification = Notification {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            message: message.into(),
            raised_at: now,
        };

        {
            let mut entries = self.entries.lock().await;
            self.prune(&mut entries, now);
            entries.push_front(notification.clone());
            entries.truncate(self.cap);
        }

        // No listeners is fine.
        let _ = self.feed.send(notification.clone());
        notification
    }

    /// Live notifications, most recent first.
    pub async fn active(&self) -> Vec<Notification> {
        let mut entries = self.entries.lock().await;
        self.prune(&mut entries, Instant::now());
        entries.iter().cloned().collect()
    }

    /// Remove a notification before it expires. Returns whether it was live.
    pub async fn dismiss(&self, id: u64) -> bool {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|n| n.id != id);
        entries.len() != before
    }

    /// Feed of newly raised notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.feed.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn center() -> NotificationCenter {
        NotificationCenter::new(5, Duration::from_secs(5))
    }

    async fn messages(center: &NotificationCenter) -> Vec<String> {
        center
            .active()
            .await
            .into_iter()
            .map(|n| n.message)
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn newest_first_and_capped() {
        let center = center();
        for i in 1..=6 {
            center.push(format!("n{i}")).await;
        }
        assert_eq!(messages(&center).await, vec!["n6", "n5", "n4", "n3", "n2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn cap_never_exceeds_default() {
        let center = NotificationCenter::new(50, Duration::from_secs(5));
        for i in 1..=8 {
            center.push(format!("n{i}")).await;
        }
        assert_eq!(center.active().await.len(), DEFAULT_NOTIFICATION_CAP);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_independently() {
        let center = center();
        center.push("first").await;
        tokio::time::advance(Duration::from_secs(3)).await;
        center.push("second").await;

        tokio::time::advance(Duration::from_millis(1999)).await;
        assert_eq!(messages(&center).await, vec!["second", "first"]);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(messages(&center).await, vec!["second"]);

        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(center.active().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_removes_entry() {
        let center = center();
        let first = center.push("first").await;
        center.push("second").await;

        assert!(center.dismiss(first.id).await);
        assert!(!center.dismiss(first.id).await);
        assert_eq!(messages(&center).await, vec!["second"]);
    }

    #[tokio::test(start_paused = true)]
    async fn ids_are_unique() {
        let center = center();
        let a = center.push("a").await;
        let b = center.push("b").await;
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn feed_sees_new_notifications() {
        let center = center();
        let mut feed = center.subscribe();
        center.push("hello").await;
        assert_eq!(feed.recv().await.unwrap().message, "hello");
    }
}
