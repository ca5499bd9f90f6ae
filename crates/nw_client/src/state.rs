//! Per-key request lifecycle.
//!
//! `idle -> pending -> {success, error}`, with `retry` sending a settled
//! entry back to `pending` and `cancelled` returning an abandoned request
//! to `idle`. The reducer is pure and knows nothing about HTTP
//! or any UI framework.

use chrono::{DateTime, Utc};

use nw_core::FeedResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryState {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryEntry {
    pub state: QueryState,
    pub data: Option<FeedResponse>,
    pub error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl QueryEntry {
    pub fn is_pending(&self) -> bool {
        self.state == QueryState::Pending
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.state, QueryState::Success | QueryState::Error)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryEvent {
    Fetch,
    Retry,
    Resolved { data: FeedResponse, at: DateTime<Utc> },
    Failed { message: String, at: DateTime<Utc> },
    /// The request was dropped before it settled.
    Cancelled,
}

pub fn reduce(entry: &QueryEntry, event: QueryEvent) -> QueryEntry {
    use QueryState::*;

    match (entry.state, event) {
        (Idle, QueryEvent::Fetch) | (Idle, QueryEvent::Retry) => QueryEntry {
            state: Pending,
            ..entry.clone()
        },
        // Refetch keeps whatever data was last shown.
        (Success, QueryEvent::Retry) | (Error, QueryEvent::Retry) => QueryEntry {
            state: Pending,
            error: None,
            ..entry.clone()
        },
        (Pending, QueryEvent::Resolved { data, at }) => QueryEntry {
            state: Success,
            data: Some(data),
            error: None,
            updated_at: Some(at),
        },
        (Pending, QueryEvent::Failed { message, at }) => QueryEntry {
            state: Error,
            error: Some(message),
            updated_at: Some(at),
            ..entry.clone()
        },
        (Pending, QueryEvent::Cancelled) => QueryEntry {
            state: Idle,
            ..entry.clone()
        },
        // Cached, in flight, or a late answer for a settled entry.
        _ => entry.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(status: &str) -> FeedResponse {
        FeedResponse {
            status: status.to_string(),
            total_results: 0,
            articles: vec![],
        }
    }

    fn resolved(status: &str) -> QueryEvent {
        QueryEvent::Resolved {
            data: feed(status),
            at: Utc::now(),
        }
    }

    fn failed(message: &str) -> QueryEvent {
        QueryEvent::Failed {
            message: message.to_string(),
            at: Utc::now(),
        }
    }

    #[test]
    fn test_happy_path() {
        let idle = QueryEntry::default();
        assert_eq!(idle.state, QueryState::Idle);

        let pending = reduce(&idle, QueryEvent::Fetch);
        assert!(pending.is_pending());
        assert!(pending.data.is_none());

        let done = reduce(&pending, resolved("ok"));
        assert_eq!(done.state, QueryState::Success);
        assert_eq!(done.data, Some(feed("ok")));
        assert!(done.updated_at.is_some());
    }

    #[test]
    fn test_error_then_retry() {
        let pending = reduce(&QueryEntry::default(), QueryEvent::Fetch);
        let failed_entry = reduce(&pending, failed("boom"));
        assert_eq!(failed_entry.state, QueryState::Error);
        assert_eq!(failed_entry.error.as_deref(), Some("boom"));

        // A plain fetch does not leave the error state; only retry does.
        assert_eq!(reduce(&failed_entry, QueryEvent::Fetch), failed_entry);

        let retrying = reduce(&failed_entry, QueryEvent::Retry);
        assert!(retrying.is_pending());
        assert!(retrying.error.is_none());

        let recovered = reduce(&retrying, resolved("ok"));
        assert_eq!(recovered.state, QueryState::Success);
    }

    #[test]
    fn test_fetch_on_success_is_cached() {
        let done = reduce(&reduce(&QueryEntry::default(), QueryEvent::Fetch), resolved("ok"));
        assert_eq!(reduce(&done, QueryEvent::Fetch), done);
    }

    #[test]
    fn test_retry_keeps_previous_data() {
        let done = reduce(&reduce(&QueryEntry::default(), QueryEvent::Fetch), resolved("first"));
        let refetching = reduce(&done, QueryEvent::Retry);
        assert!(refetching.is_pending());
        assert_eq!(refetching.data, Some(feed("first")));

        let failed_again = reduce(&refetching, failed("down"));
        assert_eq!(failed_again.state, QueryState::Error);
        assert_eq!(failed_again.data, Some(feed("first")));
    }

    #[test]
    fn test_late_answers_are_ignored() {
        let idle = QueryEntry::default();
        assert_eq!(reduce(&idle, resolved("ok")), idle);

        let done = reduce(&reduce(&idle, QueryEvent::Fetch), resolved("ok"));
        assert_eq!(reduce(&done, failed("late")), done);
        assert!(done.is_settled());
    }

    #[test]
    fn test_pending_ignores_fetch_and_retry() {
        let pending = reduce(&QueryEntry::default(), QueryEvent::Fetch);
        assert_eq!(reduce(&pending, QueryEvent::Fetch), pending);
        assert_eq!(reduce(&pending, QueryEvent::Retry), pending);
    }

    #[test]
    fn test_cancelled_request_can_start_again() {
        let done = reduce(&reduce(&QueryEntry::default(), QueryEvent::Fetch), resolved("first"));
        let refetching = reduce(&done, QueryEvent::Retry);

        let abandoned = reduce(&refetching, QueryEvent::Cancelled);
        assert_eq!(abandoned.state, QueryState::Idle);
        assert_eq!(abandoned.data, Some(feed("first")));
        assert!(reduce(&abandoned, QueryEvent::Fetch).is_pending());

        // Only an in-flight request can be cancelled.
        assert_eq!(reduce(&done, QueryEvent::Cancelled), done);
    }
}
