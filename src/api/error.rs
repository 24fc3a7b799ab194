//! Backend API errors

use reqwest::StatusCode;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 401 on an authenticated call; the session has already been torn down
    #[error("session expired, please log in again")]
    Unauthorized,

    #[error("{}", describe_status(.status, .detail))]
    Status {
        status: StatusCode,
        detail: Option<String>,
    },

    /// The backend could not be reached at all
    #[error("cannot reach the server: {0}")]
    Network(#[source] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
}

impl ApiError {
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            ApiError::Network(e)
        } else if e.is_decode() {
            ApiError::Decode(e)
        } else {
            ApiError::Request(e)
        }
    }

    /// Server-supplied `detail` message, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}

fn describe_status(status: &StatusCode, detail: &Option<String>) -> String {
    match detail {
        Some(detail) => detail.clone(),
        None => format!("request failed with status {}", status),
    }
}

/// Pull a human-readable message out of an error body.
///
/// Accepts `{"detail": "..."}` and the validation form
/// `{"detail": [{"msg": "..."}, ...]}`.
pub(crate) fn extract_detail(body: &Value) -> Option<String> {
    match body.get("detail")? {
        Value::String(detail) if !detail.is_empty() => Some(detail.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}
