use async_trait::async_trait;
use url::Url;

use crate::Result;

/// Raw reply from the upstream API, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: String,
}

impl UpstreamReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issue a single GET. Implementations must not retry.
    async fn get(&self, url: &Url) -> Result<UpstreamReply>;
}
