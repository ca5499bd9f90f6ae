pub mod category;
pub mod error;
pub mod schema;
pub mod search;
pub mod transport;
pub mod types;

pub use category::Category;
pub use error::{Error, Result};
pub use schema::{validate_article, validate_feed, FieldIssue, Problem, ValidationError};
pub use search::SearchParams;
pub use transport::{HttpTransport, UpstreamReply};
pub use types::{Article, FeedResponse, Source};

pub mod prelude {
    pub use super::{Article, Category, Error, FeedResponse, Result, SearchParams};
}
