//! HTTP error mapping.
//!
//! Every failure leaves the service as `{"error": "<message>"}` with a
//! status derived from the error kind.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::audio::IngestError;
use crate::pipeline::PipelineError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request itself is unusable (bad JSON, bad base64).
    #[error("{0}")]
    BadRequest(String),

    /// Body exceeded `server.max_body_bytes`.
    #[error("{0}")]
    TooLarge(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Pipeline(e) => pipeline_status(e),
        }
    }
}

/// HTTP status for each pipeline error kind.
pub fn pipeline_status(error: &PipelineError) -> StatusCode {
    match error {
        PipelineError::MissingInput => StatusCode::BAD_REQUEST,
        PipelineError::Ingest(IngestError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        PipelineError::Ingest(_) => StatusCode::BAD_REQUEST,
        PipelineError::Stt(_) => StatusCode::INTERNAL_SERVER_ERROR,
        PipelineError::Busy(_) => StatusCode::SERVICE_UNAVAILABLE,
        PipelineError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        PipelineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            log::error!("server: {status} {message}");
        } else {
            log::warn!("server: {status} {message}");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}
