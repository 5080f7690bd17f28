//! HTTP transcription service.
//!
//! # Routes
//!
//! | Method | Path          | Body / Response |
//! |--------|---------------|-----------------|
//! | POST   | `/transcribe` | `{audio, user_id?, format?}` → `{transcript, language, duration, user_id, wer, device}` |
//! | GET    | `/health`     | `{status: "healthy", model}` |
//!
//! Errors are `{"error": "..."}` with 400 for bad input, 503 when every
//! admission slot is taken, 504 on inference timeout and 500 otherwise.
//!
//! # Quick start
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use thai_transcribe::stt::SttEngine;
//! # fn make_stt() -> Arc<dyn SttEngine> { unimplemented!() }
//! use thai_transcribe::config::AppConfig;
//! use thai_transcribe::pipeline::TranscriptionPipeline;
//! use thai_transcribe::server::{router, serve, AppState};
//!
//! # async fn example() -> std::io::Result<()> {
//! let config = AppConfig::default();
//! let pipeline = TranscriptionPipeline::new(make_stt(), &config);
//! let app = router(AppState::new(pipeline, &config));
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
//! serve(listener, app, async { let _ = tokio::signal::ctrl_c().await; }).await
//! # }
//! ```

pub mod error;
pub mod handlers;

use std::future::Future;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::config::AppConfig;
use crate::pipeline::TranscriptionPipeline;
use crate::stt::find_model_by_id;

pub use error::ApiError;
pub use handlers::{normalize_base64, HealthResponse, TranscribeRequest, TranscribeResponse};

/// Static facts about the loaded model, echoed in responses.
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub model: String,
    pub wer: Option<f32>,
    pub device: String,
}

impl ServiceInfo {
    /// An explicit `model_path` wins over the registry id: the file stem is
    /// reported and no WER is claimed for it.
    pub fn from_config(config: &AppConfig) -> Self {
        let (model, wer) = match &config.stt.model_path {
            Some(path) => {
                let name = path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                (name, None)
            }
            None => (
                config.stt.model.clone(),
                find_model_by_id(&config.stt.model).and_then(|m| m.wer_pct),
            ),
        };
        Self {
            model,
            wer,
            device: if config.stt.use_gpu { "gpu" } else { "cpu" }.into(),
        }
    }
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: TranscriptionPipeline,
    pub info: Arc<ServiceInfo>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(pipeline: TranscriptionPipeline, config: &AppConfig) -> Self {
        Self {
            pipeline,
            info: Arc::new(ServiceInfo::from_config(config)),
            max_body_bytes: config.server.max_body_bytes,
        }
    }
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.max_body_bytes;
    Router::new()
        .route("/transcribe", post(handlers::transcribe))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
}

/// Serve `app` on `listener` until `shutdown` resolves.
pub async fn serve<F>(
    listener: tokio::net::TcpListener,
    app: Router,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        log::info!("server: listening on http://{addr}");
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    log::info!("server: shut down");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
