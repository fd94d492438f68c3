use super::Session;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory map of user id -> pending upload. Cloning shares the map.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<i64, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, user_id: i64) -> Option<Session> {
        self.sessions.read().await.get(&user_id).cloned()
    }

    /// Store `session`, returning the one it replaced (if any)
    pub async fn put(&self, session: Session) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        let replaced = sessions.insert(session.user_id, session);
        if let Some(ref old) = replaced {
            debug!(
                "Replaced pending upload {} for user {}",
                old.original_name, old.user_id
            );
        }
        replaced
    }

    pub async fn delete(&self, user_id: i64) -> Option<Session> {
        self.sessions.write().await.remove(&user_id)
    }

    pub async fn contains(&self, user_id: i64) -> bool {
        self.sessions.read().await.contains_key(&user_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Remove every session older than `ttl` at `now`. Returns the evicted user ids.
    pub async fn sweep(&self, now: DateTime<Utc>, ttl: Duration) -> Vec<i64> {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let mut sessions = self.sessions.write().await;

        let expired: Vec<i64> = sessions
            .values()
            .filter(|s| s.is_expired(now, ttl))
            .map(|s| s.user_id)
            .collect();

        for user_id in &expired {
            sessions.remove(user_id);
        }

        expired
    }
}
