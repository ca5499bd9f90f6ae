use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use nw_core::Error;

/// `{status: "error", message}` body returned for every failure.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub status: &'static str,
    pub message: String,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        if self.0.is_invalid_input() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

pub const GENERIC_MESSAGE: &str = "Failed to fetch news";

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Transport failures stay in the server log.
        let message = match &self.0 {
            Error::Http(_) => GENERIC_MESSAGE.to_string(),
            other => other.to_string(),
        };
        let message = if message.is_empty() {
            GENERIC_MESSAGE.to_string()
        } else {
            message
        };
        (self.status_code(), Json(ErrorEnvelope::new(message))).into_response()
    }
}
