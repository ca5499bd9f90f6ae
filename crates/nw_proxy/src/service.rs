use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use nw_core::{validate_feed, Category, Error, FeedResponse, HttpTransport, Result, UpstreamReply};

use crate::config::{ProxyConfig, API_KEY_VAR};

pub const TOP_HEADLINES: &str = "/top-headlines";
pub const EVERYTHING: &str = "/everything";

const FALLBACK_MESSAGE: &str = "Failed to fetch news";

/// Mediates between the web surface and the upstream news API.
///
/// Holds only read-only state, so clones are cheap and can be shared across
/// concurrent requests.
#[derive(Clone)]
pub struct ProxyService {
    config: Arc<ProxyConfig>,
    transport: Arc<dyn HttpTransport>,
}

impl fmt::Debug for ProxyService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyService")
            .field("config", &self.config)
            .field("transport", &"<dyn HttpTransport>")
            .finish()
    }
}

impl ProxyService {
    pub fn new(config: ProxyConfig, transport: Arc<dyn HttpTransport>) -> Self {
        if !config.credential.is_configured() {
            warn!(
                "❌ {} is not set! Every news request will fail until it is configured. Get a free key at https://newsapi.org/register",
                API_KEY_VAR
            );
        }
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub async fn top_headlines(&self) -> Result<FeedResponse> {
        let page_size = self.config.page_size.to_string();
        self.forward(
            TOP_HEADLINES,
            &[("country", self.config.country.as_str()), ("pageSize", page_size.as_str())],
        )
        .await
    }

    /// Rejects anything outside the closed category set before touching the
    /// network.
    pub async fn category_feed(&self, category: &str) -> Result<FeedResponse> {
        let category: Category = category.parse()?;
        let page_size = self.config.page_size.to_string();
        self.forward(
            TOP_HEADLINES,
            &[
                ("country", self.config.country.as_str()),
                ("category", category.as_str()),
                ("pageSize", page_size.as_str()),
            ],
        )
        .await
    }

    pub async fn search_news(&self, query: Option<&str>) -> Result<FeedResponse> {
        let query = match query {
            Some(q) if !q.is_empty() => q,
            _ => return Err(Error::InvalidInput("Search query is required".to_string())),
        };
        let page_size = self.config.page_size.to_string();
        self.forward(
            EVERYTHING,
            &[
                ("q", query),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
                ("language", self.config.language.as_str()),
            ],
        )
        .await
    }

    /// Shared forwarding routine. Issues at most one upstream call and
    /// never retries.
    pub async fn forward(&self, endpoint: &str, filters: &[(&str, &str)]) -> Result<FeedResponse> {
        let api_key = self.config.credential.require()?;

        let mut url = self.config.endpoint_url(endpoint)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("apiKey", api_key);
            for (key, value) in filters {
                if !value.is_empty() {
                    pairs.append_pair(key, value);
                }
            }
        }

        debug!("Forwarding to {}{}", self.config.base_url, endpoint);
        let reply = self.transport.get(&url).await?;
        interpret(reply)
    }
}

fn interpret(reply: UpstreamReply) -> Result<FeedResponse> {
    if !reply.is_success() {
        return Err(Error::Upstream {
            status: reply.status,
            message: upstream_message(reply.status, &reply.body),
        });
    }

    let value: Value = serde_json::from_str(&reply.body).map_err(|_| {
        Error::Validation(nw_core::ValidationError::single(
            "",
            nw_core::Problem::WrongType { expected: "JSON document" },
        ))
    })?;
    Ok(validate_feed(&value)?)
}

/// Best-effort extraction of the upstream error message.
fn upstream_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => value
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("NewsAPI error: {}", status)),
        Err(_) => FALLBACK_MESSAGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use url::Url;

    struct RecordingTransport {
        reply: UpstreamReply,
        calls: Mutex<Vec<Url>>,
    }

    impl RecordingTransport {
        fn new(status: u16, body: impl Into<String>) -> Arc<Self> {
            Arc::new(Self {
                reply: UpstreamReply {
                    status,
                    body: body.into(),
                },
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Url> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for RecordingTransport {
        async fn get(&self, url: &Url) -> Result<UpstreamReply> {
            self.calls.lock().unwrap().push(url.clone());
            Ok(self.reply.clone())
        }
    }

    fn feed_body(titles: &[&str]) -> String {
        let articles: Vec<_> = titles
            .iter()
            .enumerate()
            .map(|(i, title)| {
                json!({
                    "source": { "id": null, "name": "Wire" },
                    "author": null,
                    "title": title,
                    "description": null,
                    "url": format!("https://example.com/{}", i),
                    "urlToImage": null,
                    "publishedAt": "2024-05-01T12:00:00Z",
                    "content": null
                })
            })
            .collect();
        json!({ "status": "ok", "totalResults": 500, "articles": articles }).to_string()
    }

    fn service(transport: Arc<RecordingTransport>) -> ProxyService {
        ProxyService::new(ProxyConfig::new(Some("test-key".to_string())), transport)
    }

    fn query(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[tokio::test]
    async fn test_top_headlines_filters() {
        let transport = RecordingTransport::new(200, feed_body(&["A"]));
        let feed = service(transport.clone()).top_headlines().await.unwrap();
        assert_eq!(feed.articles.len(), 1);

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].path(), "/v2/top-headlines");
        assert_eq!(
            query(&calls[0]),
            vec![
                ("apiKey".to_string(), "test-key".to_string()),
                ("country".to_string(), "us".to_string()),
                ("pageSize".to_string(), "20".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_every_category_makes_one_call() {
        for category in Category::ALL {
            let transport = RecordingTransport::new(200, feed_body(&["One", "Two", "Three"]));
            let feed = service(transport.clone())
                .category_feed(category.as_str())
                .await
                .unwrap();

            let titles: Vec<_> = feed.articles.iter().map(|a| a.title.as_str()).collect();
            assert_eq!(titles, ["One", "Two", "Three"]);

            let calls = transport.calls();
            assert_eq!(calls.len(), 1);
            assert!(query(&calls[0]).contains(&("category".to_string(), category.to_string())));
        }
    }

    #[tokio::test]
    async fn test_unknown_category_makes_no_call() {
        let transport = RecordingTransport::new(200, feed_body(&[]));
        let err = service(transport.clone())
            .category_feed("politics")
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(err.to_string(), "Invalid category");
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let transport = RecordingTransport::new(200, feed_body(&[]));
        let svc = service(transport.clone());
        for q in [None, Some("")] {
            let err = svc.search_news(q).await.unwrap_err();
            assert!(err.is_invalid_input());
            assert_eq!(err.to_string(), "Search query is required");
        }
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_search_filters() {
        let transport = RecordingTransport::new(200, feed_body(&["Hit"]));
        service(transport.clone())
            .search_news(Some("rust & tokio"))
            .await
            .unwrap();

        let calls = transport.calls();
        assert_eq!(calls[0].path(), "/v2/everything");
        assert_eq!(
            query(&calls[0]),
            vec![
                ("apiKey".to_string(), "test-key".to_string()),
                ("q".to_string(), "rust & tokio".to_string()),
                ("sortBy".to_string(), "publishedAt".to_string()),
                ("pageSize".to_string(), "20".to_string()),
                ("language".to_string(), "en".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_filters_are_skipped() {
        let transport = RecordingTransport::new(200, feed_body(&[]));
        service(transport.clone())
            .forward(TOP_HEADLINES, &[("country", ""), ("category", "science")])
            .await
            .unwrap();
        let pairs = query(&transport.calls()[0]);
        assert!(!pairs.iter().any(|(k, _)| k == "country"));
        assert!(pairs.iter().any(|(k, v)| k == "category" && v == "science"));
    }

    #[tokio::test]
    async fn test_unconfigured_makes_no_call() {
        let transport = RecordingTransport::new(200, feed_body(&[]));
        let svc = ProxyService::new(ProxyConfig::new(None), transport.clone());
        let err = svc.top_headlines().await.unwrap_err();
        assert_eq!(err.kind(), "configuration");
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limited_is_not_retried() {
        let transport = RecordingTransport::new(
            429,
            r#"{"status":"error","code":"rateLimited","message":"You have made too many requests recently."}"#,
        );
        let err = service(transport.clone()).top_headlines().await.unwrap_err();
        match err {
            Error::Upstream { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "You have made too many requests recently.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_payload_is_validation_error() {
        let body = json!({
            "status": "ok",
            "totalResults": 1,
            "articles": [{ "source": { "name": "Wire" }, "url": "https://e.com", "publishedAt": "x" }]
        });
        let transport = RecordingTransport::new(200, body.to_string());
        let err = service(transport).top_headlines().await.unwrap_err();
        match err {
            Error::Validation(inner) => assert!(inner.has_issue_at("articles[0].title")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_success_is_validation_error() {
        let transport = RecordingTransport::new(200, "<html>maintenance</html>");
        let err = service(transport).top_headlines().await.unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_upstream_message_fallbacks() {
        assert_eq!(
            upstream_message(401, r#"{"message":"Your API key is invalid."}"#),
            "Your API key is invalid."
        );
        assert_eq!(upstream_message(500, r#"{"status":"error"}"#), "NewsAPI error: 500");
        assert_eq!(upstream_message(502, r#"{"message":""}"#), "NewsAPI error: 502");
        assert_eq!(upstream_message(503, "Bad Gateway"), "Failed to fetch news");
    }
}
