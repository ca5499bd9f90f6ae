use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

/// A single news article as relayed from the upstream API.
///
/// `title` and `url` are always present; everything else may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub source: Source,
    #[serde(default)]
    pub author: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub url_to_image: Option<String>,
    pub published_at: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// `{status, totalResults, articles}` payload shared by the upstream API,
/// the proxy and the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub status: String,
    pub total_results: u64,
    pub articles: Vec<Article>,
}

impl FeedResponse {
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}
