use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use nw_core::{HttpTransport, Result, UpstreamReply};

const USER_AGENT: &str = concat!("newswire/", env!("CARGO_PKG_VERSION"));

/// `HttpTransport` backed by a shared reqwest client. No timeout is set
/// beyond reqwest's defaults.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Arc<Client>,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        // The news API rejects requests that carry no User-Agent.
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("client", &"<reqwest::Client>")
            .finish()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<UpstreamReply> {
        // The request URL carries the API key, so it never goes into the error.
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(reqwest::Error::without_url)?;
        Ok(UpstreamReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn closed_port() -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn test_connection_error_hides_url() {
        let port = closed_port().await;
        let url = Url::parse(&format!(
            "http://127.0.0.1:{}/v2/top-headlines?apiKey=hunter2&country=us",
            port
        ))
        .unwrap();

        let err = ReqwestTransport::new().unwrap().get(&url).await.unwrap_err();
        assert_eq!(err.kind(), "upstream");
        let text = err.to_string();
        assert!(!text.contains("hunter2"), "{text}");
        assert!(!text.contains("apiKey"), "{text}");
    }
}
