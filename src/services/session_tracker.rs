//! Session tracking for tool-list change notifications
//!
//! Every MCP session that talks to the server gets a [`SessionRecord`]. When a
//! reload publishes a new catalogue, all live records are marked stale; the
//! next request on each stale session pushes exactly one
//! `notifications/tools/list_changed` to that client.
//!
//! # Expiry
//!
//! Records expire `ttl` after their last interaction. Expiry is lazy: an
//! expired record is dropped when it is next looked up, when the store is
//! full, or when [`SessionTracker::purge_expired`] runs from the poll loop.
//! The store never holds more than `capacity` records.

use async_trait::async_trait;
use rmcp::service::{Peer, RoleServer};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Channel through which a session is told that the tool list changed
#[async_trait]
pub trait ToolListNotifier: Send + Sync {
    async fn notify_tool_list_changed(&self) -> Result<(), String>;
}

#[async_trait]
impl ToolListNotifier for Peer<RoleServer> {
    async fn notify_tool_list_changed(&self) -> Result<(), String> {
        Peer::<RoleServer>::notify_tool_list_changed(self)
            .await
            .map_err(|e| e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub notified: bool,
    pub expires_at: Instant,
}

/// What happened when a session interacted with the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionOutcome {
    /// First request seen from this session
    Registered,
    /// Known session, already up to date
    Refreshed,
    /// Stale session, change notification delivered
    Notified,
    /// Stale session, delivery failed; retried on the next request
    NotifyFailed,
}

/// Bounded, TTL-evicting store of session records
///
/// Safe to share between request handlers without external locking; every
/// operation holds the internal lock only for in-memory work.
pub struct SessionTracker {
    records: Mutex<HashMap<String, SessionRecord>>,
    ttl: Duration,
    capacity: usize,
}

impl SessionTracker {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records an interaction and reports whether a notification is owed.
    ///
    /// Marks the session notified and refreshes its expiry in one step, so
    /// two concurrent requests on the same stale session cannot both claim
    /// the notification.
    fn claim(&self, session_id: &str) -> (bool, bool) {
        let now = Instant::now();
        let expires_at = now + self.ttl;
        let mut records = self.lock();

        if let Some(record) = records.get_mut(session_id) {
            if record.expires_at > now {
                let owed = !record.notified;
                record.notified = true;
                record.expires_at = expires_at;
                return (false, owed);
            }
            records.remove(session_id);
        }

        if records.len() >= self.capacity {
            evict(&mut records, self.capacity, now);
        }

        // A brand-new session already sees the current catalogue
        records.insert(
            session_id.to_string(),
            SessionRecord {
                notified: true,
                expires_at,
            },
        );
        (true, false)
    }

    /// Handles one inbound request on `session_id`
    ///
    /// Pushes a change notification through `notifier` if the session was
    /// marked stale by a reload since its last request.
    pub async fn on_interaction(
        &self,
        session_id: &str,
        notifier: &dyn ToolListNotifier,
    ) -> InteractionOutcome {
        let (registered, owed) = self.claim(session_id);

        if registered {
            tracing::info!(
                session = session_id,
                "Tracking session (total: {})",
                self.len()
            );
            return InteractionOutcome::Registered;
        }
        if !owed {
            return InteractionOutcome::Refreshed;
        }

        match notifier.notify_tool_list_changed().await {
            Ok(()) => {
                tracing::info!(
                    session = session_id,
                    "Sent an update notification to an active client"
                );
                InteractionOutcome::Notified
            }
            Err(e) => {
                tracing::error!(
                    session = session_id,
                    "Failed to send tool list change notification: {}",
                    e
                );
                self.rearm(session_id);
                InteractionOutcome::NotifyFailed
            }
        }
    }

    fn rearm(&self, session_id: &str) {
        if let Some(record) = self.lock().get_mut(session_id) {
            record.notified = false;
        }
    }

    /// Marks every live session as owing a change notification
    ///
    /// Returns the number of sessions marked.
    pub fn mark_all_stale(&self) -> usize {
        let now = Instant::now();
        let mut records = self.lock();
        records.retain(|_, record| record.expires_at > now);
        for record in records.values_mut() {
            record.notified = false;
        }
        records.len()
    }

    /// Drops expired records, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut records = self.lock();
        let before = records.len();
        records.retain(|_, record| record.expires_at > now);
        before - records.len()
    }

    pub fn get(&self, session_id: &str) -> Option<SessionRecord> {
        let now = Instant::now();
        let mut records = self.lock();
        let expired = match records.get(session_id) {
            Some(record) if record.expires_at > now => return Some(record.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            records.remove(session_id);
        }
        None
    }

    /// Number of stored records, including ones not yet purged
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Makes room for one record: expired entries first, then the entry
/// closest to expiry.
fn evict(records: &mut HashMap<String, SessionRecord>, capacity: usize, now: Instant) {
    records.retain(|_, record| record.expires_at > now);

    while records.len() >= capacity {
        let Some(oldest) = records
            .iter()
            .min_by_key(|(_, record)| record.expires_at)
            .map(|(id, _)| id.clone())
        else {
            break;
        };
        tracing::warn!(session = %oldest, "Session store full, evicting oldest session");
        records.remove(&oldest);
    }
}
