use std::sync::Arc;

use nw_core::Result;

pub mod config;
pub mod service;
pub mod transport;

pub use config::{Credential, ProxyConfig};
pub use service::ProxyService;
pub use transport::ReqwestTransport;

/// Builds a proxy service talking to the real upstream over reqwest.
pub fn create_service(config: ProxyConfig) -> Result<ProxyService> {
    let transport = ReqwestTransport::new()?;
    Ok(ProxyService::new(config, Arc::new(transport)))
}

pub mod prelude {
    pub use super::{create_service, Credential, ProxyConfig, ProxyService};
    pub use nw_core::{Category, Error, FeedResponse, Result};
}
