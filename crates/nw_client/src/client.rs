use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

use nw_core::{FeedResponse, Result};

use crate::cache::QueryCache;
use crate::query::{NewsQuery, RequestKey};
use crate::state::{QueryEntry, QueryEvent};

pub const GENERIC_ERROR: &str = "Failed to load news articles. Please try again.";

/// Releases a started request's entry if the future driving it is dropped
/// before the outcome is recorded.
struct InFlight<'a> {
    cache: &'a QueryCache,
    key: &'a RequestKey,
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            debug!("Request for {} abandoned", self.key);
            self.cache.abandon(self.key);
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Issues requests to the news proxy and tracks their state per key.
#[derive(Clone)]
pub struct QueryClient {
    http: Client,
    base_url: Url,
    cache: QueryCache,
    active: Arc<RwLock<Option<RequestKey>>>,
}

impl fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryClient")
            .field("http", &"<reqwest::Client>")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl QueryClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(base_url.trim_end_matches('/'))?,
            cache: QueryCache::new(),
            active: Arc::new(RwLock::new(None)),
        })
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub async fn state(&self, query: &NewsQuery) -> QueryEntry {
        self.cache.get(&query.key()).await
    }

    /// Returns the cached entry if the key already settled or is in flight;
    /// otherwise issues the request and returns the settled entry.
    pub async fn fetch(&self, query: &NewsQuery) -> QueryEntry {
        self.run(query, QueryEvent::Fetch).await
    }

    /// Re-issues the request for `query` unless one is already in flight.
    pub async fn retry(&self, query: &NewsQuery) -> QueryEntry {
        self.run(query, QueryEvent::Retry).await
    }

    /// Makes `query` the active one and fetches it. Returns `None` when
    /// another query was selected before this one settled; that answer is
    /// cached but not surfaced.
    pub async fn select(&self, query: &NewsQuery) -> Option<QueryEntry> {
        let key = query.key();
        *self.active.write().await = Some(key.clone());
        let entry = self.fetch(query).await;
        let still_active = self.active.read().await.as_ref() == Some(&key);
        still_active.then_some(entry)
    }

    /// Entry for whichever query is currently active.
    pub async fn view(&self) -> Option<QueryEntry> {
        let key = self.active.read().await.clone()?;
        Some(self.cache.get(&key).await)
    }

    async fn run(&self, query: &NewsQuery, event: QueryEvent) -> QueryEntry {
        let key = query.key();
        let transition = self.cache.dispatch(&key, event).await;
        if !transition.started() {
            return transition.entry;
        }

        let mut in_flight = InFlight {
            cache: &self.cache,
            key: &key,
            settled: false,
        };
        let outcome = match self.request(&query.path()).await {
            Ok(data) => QueryEvent::Resolved { data, at: Utc::now() },
            Err(message) => QueryEvent::Failed { message, at: Utc::now() },
        };
        let entry = self.cache.dispatch(&key, outcome).await.entry;
        in_flight.settled = true;
        entry
    }

    async fn request(&self, path: &str) -> std::result::Result<FeedResponse, String> {
        let url = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        debug!("GET {}", url);

        let response = self.http.get(&url).send().await.map_err(|e| {
            warn!("Request to {} failed: {}", url, e);
            GENERIC_ERROR.to_string()
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| GENERIC_ERROR.to_string());
            warn!("{} answered {}: {}", url, status, message);
            return Err(message);
        }

        response.json::<FeedResponse>().await.map_err(|e| {
            warn!("Unreadable feed from {}: {}", url, e);
            GENERIC_ERROR.to_string()
        })
    }
}
