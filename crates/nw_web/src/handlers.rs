use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::{error, warn};

use nw_core::FeedResponse;

use crate::error::ApiError;
use crate::AppState;

type ApiResult = Result<Json<FeedResponse>, ApiError>;

fn log_failure(context: &str, err: &nw_core::Error) {
    if err.is_invalid_input() {
        warn!(kind = err.kind(), "Rejected request while {}: {}", context, err);
    } else {
        error!(kind = err.kind(), "Error {}: {}", context, err);
    }
}

pub async fn top_headlines(State(state): State<Arc<AppState>>) -> ApiResult {
    state
        .proxy
        .top_headlines()
        .await
        .map(Json)
        .map_err(|e| {
            log_failure("fetching top headlines", &e);
            e.into()
        })
}

pub async fn category_feed(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> ApiResult {
    state
        .proxy
        .category_feed(&category)
        .await
        .map(Json)
        .map_err(|e| {
            log_failure(&format!("fetching {} news", category), &e);
            e.into()
        })
}

/// A repeated `q` is not a single string and counts as missing.
fn single_query(pairs: &[(String, String)]) -> Option<&str> {
    let mut values = pairs.iter().filter(|(k, _)| k == "q").map(|(_, v)| v.as_str());
    match (values.next(), values.next()) {
        (Some(q), None) => Some(q),
        _ => None,
    }
}

pub async fn search_news(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult {
    state
        .proxy
        .search_news(single_query(&pairs))
        .await
        .map(Json)
        .map_err(|e| {
            log_failure("searching news", &e);
            e.into()
        })
}
