use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::warn;

use crate::query::RequestKey;
use crate::state::{reduce, QueryEntry, QueryEvent, QueryState};

/// Outcome of applying an event to one cache entry.
#[derive(Debug, Clone)]
pub struct Transition {
    pub before: QueryState,
    pub entry: QueryEntry,
}

impl Transition {
    /// True when this event is what moved the entry into `pending`, i.e. the
    /// caller is responsible for issuing the request.
    pub fn started(&self) -> bool {
        self.before != QueryState::Pending && self.entry.is_pending()
    }
}

#[derive(Clone, Default)]
pub struct QueryCache {
    entries: Arc<RwLock<HashMap<RequestKey, QueryEntry>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unknown keys read as idle.
    pub async fn get(&self, key: &RequestKey) -> QueryEntry {
        let entries = self.entries.read().await;
        entries.get(key).cloned().unwrap_or_default()
    }

    pub async fn dispatch(&self, key: &RequestKey, event: QueryEvent) -> Transition {
        let mut entries = self.entries.write().await;
        let current = entries.entry(key.clone()).or_default();
        let before = current.state;
        *current = reduce(current, event);
        Transition {
            before,
            entry: current.clone(),
        }
    }

    /// Moves a pending entry back to idle without awaiting the lock, for use
    /// from `Drop`. Falls back to a spawned task when the lock is held.
    pub fn abandon(&self, key: &RequestKey) {
        if let Ok(mut entries) = self.entries.try_write() {
            if let Some(current) = entries.get_mut(key) {
                *current = reduce(current, QueryEvent::Cancelled);
            }
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let cache = self.clone();
                let key = key.clone();
                handle.spawn(async move {
                    cache.dispatch(&key, QueryEvent::Cancelled).await;
                });
            }
            Err(_) => warn!("No runtime to release abandoned request {}", key),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
