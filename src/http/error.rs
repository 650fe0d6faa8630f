//! Errors that cross the HTTP boundary.
//!
//! Status mapping:
//! - `MalformedRequest` → 400
//! - `RateLimited` → 429 with `Retry-After`
//! - `Dispatch(Exhausted)` → 500 (per-model causes are only logged)
//! - `Dispatch(Cancelled)` → 503

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::backend::DispatchError;
use crate::security::AdmissionDenied;

pub const RATE_LIMITED_MESSAGE: &str = "Too many requests, please try again later";
pub const EXHAUSTED_MESSAGE: &str = "Failed to generate content with any available model";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    MalformedRequest(String),
    #[error(transparent)]
    RateLimited(#[from] AdmissionDenied),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Dispatch(DispatchError::EmptyPrompt) => StatusCode::BAD_REQUEST,
            ApiError::Dispatch(DispatchError::Exhausted { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Dispatch(DispatchError::Cancelled) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Whole seconds, rounded up.
fn retry_after_secs(denied: &AdmissionDenied) -> u64 {
    let d = denied.retry_after;
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            ApiError::RateLimited(denied) => {
                let secs = retry_after_secs(&denied);
                let mut response = (
                    status,
                    Json(json!({ "error": RATE_LIMITED_MESSAGE, "retry_after": secs })),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(secs));
                response
            }
            ApiError::Dispatch(DispatchError::Exhausted { .. }) => {
                (status, Json(json!({ "error": EXHAUSTED_MESSAGE }))).into_response()
            }
            other => (status, Json(json!({ "error": other.to_string() }))).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = ApiError::RateLimited(AdmissionDenied {
            retry_after: Duration::from_secs(60),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "60");
    }

    #[test]
    fn test_partial_seconds_round_up() {
        let denied = AdmissionDenied {
            retry_after: Duration::from_millis(1500),
        };
        assert_eq!(retry_after_secs(&denied), 2);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::MalformedRequest("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(DispatchError::Exhausted { attempted: 3 }).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(DispatchError::Cancelled).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
