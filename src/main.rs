//! HTTP service entry point — `thai-transcribe-server`.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] (defaults on first run) and apply CLI overrides.
//! 3. Create the tokio runtime.
//! 4. Load the Whisper model; a missing model aborts startup.
//! 5. Build the pipeline and router, bind, and serve until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use thai_transcribe::{
    config::{AppConfig, AppPaths},
    pipeline::TranscriptionPipeline,
    server::{router, serve, AppState},
    stt::{ModelPaths, SttEngine, WhisperEngine},
};

#[derive(Debug, Parser)]
#[command(name = "thai-transcribe-server", version, about = "Thai speech-to-text HTTP service")]
struct Args {
    /// Settings file (defaults to the platform config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Interface to bind.
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on.
    #[arg(long)]
    port: Option<u16>,

    /// Model id from the registry, or a path to a GGML file.
    #[arg(long)]
    model: Option<String>,
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(model) = &args.model {
        config.stt.set_model(model);
    }
    Ok(config)
}

fn load_engine(config: &AppConfig, paths: &AppPaths) -> Result<WhisperEngine> {
    let model_paths = ModelPaths::from_app_paths(paths);
    WhisperEngine::from_config(&config.stt, &model_paths).map_err(|e| {
        let local: Vec<_> = model_paths
            .list_local_models()
            .iter()
            .map(|m| m.id)
            .collect();
        log::error!(
            "models present in {}: {:?}",
            model_paths.models_dir.display(),
            local
        );
        anyhow::Error::new(e).context("loading Whisper model")
    })
}

async fn run(config: AppConfig, stt: Arc<dyn SttEngine>) -> Result<()> {
    let pipeline = TranscriptionPipeline::new(stt, &config);
    let app = router(AppState::new(pipeline, &config));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    serve(listener, app, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
        log::info!("Ctrl-C received, finishing in-flight requests");
    })
    .await
    .context("serving HTTP")
}

fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("thai-transcribe-server starting up");

    // 2. Configuration
    let args = Args::parse();
    let config = load_config(&args)?;

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating tokio runtime")?;

    // 4. Model
    let engine = load_engine(&config, &AppPaths::new())?;
    let stt: Arc<dyn SttEngine> = Arc::new(engine);

    // 5. Serve
    rt.block_on(run(config, stt))
}
