use std::env;
use std::fmt;

use url::Url;

use nw_core::{Error, Result};

pub const API_KEY_VAR: &str = "NEWS_API_KEY";
pub const BASE_URL_VAR: &str = "NEWS_API_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";

/// Server-held upstream credential.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Configured(String),
    Unconfigured,
}

impl Credential {
    /// Empty or whitespace-only keys count as no key.
    pub fn from_optional(key: Option<String>) -> Self {
        match key {
            Some(key) if !key.trim().is_empty() => Credential::Configured(key),
            _ => Credential::Unconfigured,
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Credential::Configured(_))
    }

    pub fn require(&self) -> Result<&str> {
        match self {
            Credential::Configured(key) => Ok(key),
            Credential::Unconfigured => Err(Error::Configuration(format!(
                "{} is not configured. Get a key from https://newsapi.org/register",
                API_KEY_VAR
            ))),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Configured(_) => f.write_str("Configured(<redacted>)"),
            Credential::Unconfigured => f.write_str("Unconfigured"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub credential: Credential,
    pub base_url: Url,
    pub country: String,
    pub language: String,
    pub page_size: u32,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            credential: Credential::Unconfigured,
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            country: "us".to_string(),
            language: "en".to_string(),
            page_size: 20,
        }
    }
}

impl ProxyConfig {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            credential: Credential::from_optional(api_key),
            ..Self::default()
        }
    }

    /// Reads the credential and optional base URL from the process
    /// environment. A missing key is not an error here; it surfaces on
    /// every request instead.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(env::var(API_KEY_VAR).ok());
        if let Ok(raw) = env::var(BASE_URL_VAR) {
            if !raw.trim().is_empty() {
                config = config.with_base_url(&raw)?;
            }
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, raw: &str) -> Result<Self> {
        self.base_url = Url::parse(raw.trim_end_matches('/'))?;
        Ok(self)
    }

    /// `<base_url><endpoint>`, keeping any path prefix on the base URL.
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{}{}", base, endpoint))?)
    }
}
