//! Command-line entry point — `thai-transcribe <AUDIO>`.
//!
//! Prints `{"transcript", "language", "segments"}` as JSON, then the bare
//! transcript on its own line.  Logs go to stderr so stdout stays
//! machine-readable.  Exit status is 0 on success and 1 on any failure,
//! including an empty transcript.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::Parser;
use thai_transcribe::{
    client::{
        ClientError, FallbackTranscriber, LocalTranscriber, RemoteClient, Transcriber, Transcript,
    },
    config::{AppConfig, AppPaths},
    pipeline::{PipelineError, TranscriptionPipeline},
    stt::{ModelPaths, WhisperEngine},
};
use tokio::sync::OnceCell;

#[derive(Debug, Parser)]
#[command(name = "thai-transcribe", version, about = "Transcribe a Thai audio file")]
struct Args {
    /// WAV file (or headerless PCM) to transcribe.
    audio: PathBuf,

    /// Settings file (defaults to the platform config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Model id from the registry, or a path to a GGML file.
    #[arg(long)]
    model: Option<String>,

    /// Peak amplitude below which the file counts as silent.
    #[arg(long)]
    silence_threshold: Option<f32>,

    /// Send the audio to a running service first; transcribe locally if
    /// that fails.
    #[arg(long, value_name = "URL")]
    remote: Option<String>,

    /// User id reported to the remote service.
    #[arg(long, default_value = "cli")]
    user_id: String,
}

// ---------------------------------------------------------------------------
// Local transcription, loaded on first use
// ---------------------------------------------------------------------------

/// Loads the Whisper model only when a local transcription is needed, so a
/// healthy remote service never pays for it.
struct LazyLocal {
    config: AppConfig,
    pipeline: OnceCell<TranscriptionPipeline>,
}

impl LazyLocal {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            pipeline: OnceCell::new(),
        }
    }

    async fn pipeline(&self) -> Result<&TranscriptionPipeline, ClientError> {
        self.pipeline
            .get_or_try_init(|| async {
                let stt = self.config.stt.clone();
                let engine = tokio::task::spawn_blocking(move || {
                    let paths = ModelPaths::from_app_paths(&AppPaths::new());
                    WhisperEngine::from_config(&stt, &paths)
                })
                .await
                .map_err(|e| PipelineError::Internal(format!("model load task: {e}")))?
                .map_err(PipelineError::Stt)?;
                Ok::<_, ClientError>(TranscriptionPipeline::new(Arc::new(engine), &self.config))
            })
            .await
    }
}

#[async_trait]
impl Transcriber for LazyLocal {
    async fn transcribe(&self, audio: &[u8], user_id: &str) -> Result<Transcript, ClientError> {
        let pipeline = self.pipeline().await?.clone();
        LocalTranscriber::new(pipeline).transcribe(audio, user_id).await
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    if let Some(model) = &args.model {
        config.stt.set_model(model);
    }
    if let Some(threshold) = args.silence_threshold {
        config.audio.silence_threshold = threshold;
    }
    if let Some(url) = &args.remote {
        config.remote.base_url = url.clone();
    }
    Ok(config)
}

async fn transcribe(args: &Args, config: AppConfig, audio: &[u8]) -> Result<Transcript> {
    let local = LazyLocal::new(config.clone());
    let transcript = if args.remote.is_some() {
        let remote = RemoteClient::from_config(&config.remote);
        FallbackTranscriber::new(remote, local)
            .transcribe(audio, &args.user_id)
            .await?
    } else {
        local.transcribe(audio, &args.user_id).await?
    };
    Ok(transcript)
}

/// Returns `false` when no transcript was produced.
fn run(args: Args) -> Result<bool> {
    let config = load_config(&args)?;

    if !args.audio.is_file() {
        bail!("file {} not found", args.audio.display());
    }
    let audio =
        std::fs::read(&args.audio).with_context(|| format!("reading {}", args.audio.display()))?;
    log::info!("{}: {} bytes", args.audio.display(), audio.len());

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating tokio runtime")?;
    let transcript = rt.block_on(transcribe(&args, config, &audio))?;

    log::info!(
        "{:?} transcript, {} segment(s)",
        transcript.source,
        transcript.segments.len()
    );
    report(&transcript, &mut std::io::stdout().lock())
}

/// Write the JSON line, then the bare transcript when there is one.
/// Returns `false` for an empty transcript.
fn report(transcript: &Transcript, out: &mut impl Write) -> Result<bool> {
    writeln!(out, "{}", serde_json::to_string(transcript)?)?;
    if transcript.transcript.is_empty() {
        eprintln!("No transcript generated");
        return Ok(false);
    }
    writeln!(out, "{}", transcript.transcript)?;
    Ok(true)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
