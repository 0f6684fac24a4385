//! Application error type mapping chat errors to HTTP responses.
//!
//! Every failure becomes a structured body with a stable machine code and a
//! human-readable message; no stack traces or internal identifiers are
//! exposed. Rate-limit rejections carry a `Retry-After` header.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use converse_types::error::ChatError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub struct AppError(pub ChatError);

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, retry_after) = match &self.0 {
            ChatError::RateLimitExceeded(wait) => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMIT_EXCEEDED",
                format!(
                    "Rate limit exceeded. Please try again in {} seconds.",
                    wait.as_secs().max(1)
                ),
                Some(wait.as_secs().max(1)),
            ),
            ChatError::InvalidRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            ChatError::NotFound => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Requested resource not found".to_string(),
                None,
            ),
            ChatError::InferenceUnavailable(_) => (
                StatusCode::BAD_GATEWAY,
                "INFERENCE_UNAVAILABLE",
                "The AI service is currently unavailable. Please try again later.".to_string(),
                None,
            ),
            ChatError::ResponseNotSaved(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "RESPONSE_NOT_SAVED",
                "A response was generated but could not be saved.".to_string(),
                None,
            ),
            ChatError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred while processing your request.".to_string(),
                None,
            ),
        };

        let body = json!({
            "status": "error",
            "error": {
                "code": code,
                "message": message,
            },
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let mut response = (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response();

        if let Some(secs) = retry_after {
            if let Ok(value) = secs.to_string().parse() {
                response
                    .headers_mut()
                    .insert(axum::http::header::RETRY_AFTER, value);
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_rate_limit_maps_to_429_with_retry_after() {
        let response =
            AppError(ChatError::RateLimitExceeded(Duration::from_secs(30))).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(axum::http::header::RETRY_AFTER).unwrap(),
            "30"
        );
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let response = AppError(ChatError::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_inference_unavailable_maps_to_502() {
        let response =
            AppError(ChatError::InferenceUnavailable("down".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
