use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Failure taxonomy for the whole request path.
///
/// Every component wraps its failures into the variant that names the
/// responsible layer; the HTTP boundary maps variants to stable wire codes.
/// Callers match on the variant, never on message text.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("message too long: {0} characters")]
    MessageTooLong(usize),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("embedding service error: {0}")]
    Embedding(String),
    #[error("search service error: {0}")]
    Retrieval(String),
    #[error("generation service error: {0}")]
    Generation(String),
    #[error("processing error: {0}")]
    Processing(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }

    /// Stable machine-readable code carried on the error response body.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::MessageTooLong(_) => "MESSAGE_TOO_LONG",
            ApiError::Config(_) => "CONFIG_ERROR",
            ApiError::Embedding(_) | ApiError::Retrieval(_) => "SEARCH_SERVICE_ERROR",
            ApiError::Generation(_) => "AI_SERVICE_ERROR",
            ApiError::Processing(_) => "PROCESSING_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) | ApiError::MessageTooLong(_) => StatusCode::BAD_REQUEST,
            ApiError::Config(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Embedding(_) | ApiError::Retrieval(_) | ApiError::Generation(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Processing(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// Safe message for the response body. Upstream error text stays out of
    /// it; the raw variant message travels only in the debug-build `details`
    /// field and in logs.
    fn user_message(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "Message must not be empty",
            ApiError::MessageTooLong(_) => "Message exceeds the maximum length",
            ApiError::Config(_) => "Server configuration error",
            ApiError::Embedding(_) | ApiError::Retrieval(_) => {
                "The search service is currently unavailable"
            }
            ApiError::Generation(_) => "The AI service is currently unavailable",
            ApiError::Processing(_) => "The request could not be processed",
            ApiError::Internal(_) => "An internal error occurred",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let mut body = json!({
            "error": self.user_message(),
            "code": self.code(),
        });

        if cfg!(debug_assertions) {
            body["details"] = json!(self.to_string());
        }

        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_the_taxonomy() {
        assert_eq!(ApiError::InvalidInput("x".into()).code(), "INVALID_INPUT");
        assert_eq!(ApiError::MessageTooLong(4001).code(), "MESSAGE_TOO_LONG");
        assert_eq!(ApiError::Config("x".into()).code(), "CONFIG_ERROR");
        assert_eq!(ApiError::Embedding("x".into()).code(), "SEARCH_SERVICE_ERROR");
        assert_eq!(ApiError::Retrieval("x".into()).code(), "SEARCH_SERVICE_ERROR");
        assert_eq!(ApiError::Generation("x".into()).code(), "AI_SERVICE_ERROR");
        assert_eq!(ApiError::Processing("x".into()).code(), "PROCESSING_ERROR");
        assert_eq!(ApiError::Internal("x".into()).code(), "INTERNAL_ERROR");
    }

    #[test]
    fn upstream_layers_map_to_service_unavailable() {
        assert_eq!(
            ApiError::Retrieval("index down".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Generation("completion down".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Processing("no context".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn user_message_never_leaks_upstream_text() {
        let err = ApiError::Generation("api key sk-secret rejected".into());
        assert!(!err.user_message().contains("sk-secret"));
    }
}
