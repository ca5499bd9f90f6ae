use thiserror::Error;

use crate::schema::ValidationError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    InvalidInput(String),

    /// Non-success status from the news API. The message is whatever the
    /// upstream body carried, or a generic fallback.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("Upstream response failed validation: {0}")]
    Validation(#[from] ValidationError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Short name of the failure kind, used in server-side logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "configuration",
            Error::InvalidInput(_) => "invalid_input",
            Error::Upstream { .. } | Error::Http(_) => "upstream",
            Error::Validation(_) => "validation",
            Error::InvalidUrl(_) => "configuration",
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
