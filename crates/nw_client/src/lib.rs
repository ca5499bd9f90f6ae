pub mod cache;
pub mod client;
pub mod query;
pub mod state;

pub use cache::QueryCache;
pub use client::QueryClient;
pub use query::{NewsQuery, RequestKey};
pub use state::{reduce, QueryEntry, QueryEvent, QueryState};

pub mod prelude {
    pub use super::{NewsQuery, QueryClient, QueryEntry, QueryState};
    pub use nw_core::{Article, FeedResponse};
}
