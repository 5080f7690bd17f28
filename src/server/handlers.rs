//! `POST /transcribe` and `GET /health`.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::AppState;
use crate::audio::{AudioPayload, PcmFormat};
use crate::pipeline::PipelineError;

const UNKNOWN_USER: &str = "unknown";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscribeRequest {
    /// Base64 audio, optionally as a `data:<mime>;base64,` URI.
    pub audio: Option<String>,
    pub user_id: Option<String>,
    /// Layout of headerless PCM; ignored for WAV payloads.
    pub format: Option<PcmFormat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscribeResponse {
    pub transcript: String,
    pub language: String,
    /// Seconds spent handling the request.
    pub duration: f64,
    pub user_id: String,
    /// Published word error rate of the loaded model, if known.
    pub wer: Option<f32>,
    pub device: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Strip a `data:<mime>;base64,` prefix, if present.
pub fn normalize_base64(input: &str) -> &str {
    match input.find(";base64,") {
        Some(idx) => &input[idx + 8..],
        None => input,
    }
}

pub async fn transcribe(
    State(state): State<AppState>,
    body: Result<Json<TranscribeRequest>, JsonRejection>,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::TooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    })?;

    let user_id = request
        .user_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| UNKNOWN_USER.to_string());

    let encoded = request
        .audio
        .as_deref()
        .map(|a| normalize_base64(a.trim()))
        .filter(|a| !a.is_empty())
        .ok_or(PipelineError::MissingInput)?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| ApiError::BadRequest(format!("invalid base64 audio: {e}")))?;

    log::info!(
        "server: transcribe request from {user_id} ({} bytes)",
        bytes.len()
    );

    let payload = AudioPayload::new(bytes).with_declared_format(request.format);
    let output = state.pipeline.run(payload).await?;

    log::info!(
        "server: {user_id} → {:?} in {:.2}s",
        output.transcript,
        output.duration
    );

    Ok(Json(TranscribeResponse {
        transcript: output.transcript,
        language: output.language,
        duration: output.duration,
        user_id,
        wer: state.info.wer,
        device: state.info.device.clone(),
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        model: state.info.model.clone(),
    })
}
