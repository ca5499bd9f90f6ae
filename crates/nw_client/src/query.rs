use std::fmt;

use url::form_urlencoded;

use nw_core::{Category, SearchParams};

pub const TOP_HEADLINES_PATH: &str = "/api/news/top-headlines";
pub const CATEGORY_PATH: &str = "/api/news/category";
pub const SEARCH_PATH: &str = "/api/news/search";

/// Canonical identity of a request: endpoint plus normalized parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey(String);

impl RequestKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewsQuery {
    TopHeadlines,
    Category(Category),
    Search(SearchParams),
}

impl NewsQuery {
    /// `None` for values outside the category set; no request is made for them.
    pub fn category(raw: &str) -> Option<Self> {
        raw.parse().ok().map(NewsQuery::Category)
    }

    /// `None` when the query is empty, so a search without its required
    /// parameter can never be issued.
    pub fn search(q: &str) -> Option<Self> {
        Self::search_with(SearchParams::new().with_query(q))
    }

    pub fn search_with(params: SearchParams) -> Option<Self> {
        params.q.is_some().then_some(NewsQuery::Search(params))
    }

    /// Path and query string to request from the proxy. Doubles as the
    /// cache key, so it has to be deterministic.
    pub fn path(&self) -> String {
        match self {
            NewsQuery::TopHeadlines => TOP_HEADLINES_PATH.to_string(),
            NewsQuery::Category(category) => format!("{}/{}", CATEGORY_PATH, category),
            NewsQuery::Search(params) => {
                let mut serializer = form_urlencoded::Serializer::new(String::new());
                for (key, value) in params.normalized_pairs() {
                    serializer.append_pair(key, &value);
                }
                format!("{}?{}", SEARCH_PATH, serializer.finish())
            }
        }
    }

    pub fn key(&self) -> RequestKey {
        RequestKey(self.path())
    }
}
