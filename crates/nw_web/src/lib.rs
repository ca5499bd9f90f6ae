use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod error;
pub mod handlers;
pub mod state;

pub use error::{ApiError, ErrorEnvelope};
pub use state::AppState;

pub async fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/news/top-headlines", get(handlers::top_headlines))
        .route("/api/news/category/:category", get(handlers::category_feed))
        .route("/api/news/search", get(handlers::search_news))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Binds `addr` and serves the news API until the process is stopped.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = create_app(state).await;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("📰 News proxy listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}

pub mod prelude {
    pub use crate::{create_app, serve, AppState};
    pub use nw_core::{Article, Error, FeedResponse, Result};
}
