//! Error types for trashio-ai

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure to obtain or decode an input image
///
/// Fatal for the call that hit it only; the service keeps serving.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Image path not found: {0}")]
    ImageNotFound(String),

    #[error("Only http/https image URLs are supported (got '{0}')")]
    UnsupportedScheme(String),

    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),

    #[error("Missing image path or image URL")]
    MissingSource,

    #[error("Image fetch failed: {0}")]
    Fetch(String),

    #[error("Image exceeds the {0} byte limit")]
    TooLarge(u64),

    #[error("Image could not be decoded: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Image analysis failed on the supplied input
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::Analysis(ref err) => {
                let (status, code) = match err {
                    AnalysisError::ImageNotFound(_) => (StatusCode::NOT_FOUND, "IMAGE_NOT_FOUND"),
                    AnalysisError::UnsupportedScheme(_)
                    | AnalysisError::InvalidUrl(_)
                    | AnalysisError::MissingSource => (StatusCode::BAD_REQUEST, "BAD_IMAGE_SOURCE"),
                    AnalysisError::Fetch(_) => (StatusCode::BAD_GATEWAY, "IMAGE_FETCH_FAILED"),
                    AnalysisError::TooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "IMAGE_TOO_LARGE"),
                    AnalysisError::Decode(_) => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "IMAGE_DECODE_FAILED")
                    }
                    AnalysisError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
                };
                (status, code, err.to_string())
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
