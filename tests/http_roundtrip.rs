//! Serve the real router on a loopback port and talk to it with
//! `RemoteClient`.

use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thai_transcribe::client::{
    ClientError, FallbackTranscriber, LocalTranscriber, RemoteClient, Transcriber,
    TranscriptSource,
};
use thai_transcribe::config::{AppConfig, RemoteConfig};
use thai_transcribe::pipeline::TranscriptionPipeline;
use thai_transcribe::server::{router, serve, AppState};
use thai_transcribe::stt::{Segment, SttEngine, SttError, TranscriptionResult};
use tokio::sync::oneshot;

/// Answers every request with the same text and counts calls.
struct CannedEngine {
    text: &'static str,
    calls: AtomicUsize,
}

impl CannedEngine {
    fn new(text: &'static str) -> Arc<Self> {
        Arc::new(Self {
            text,
            calls: AtomicUsize::new(0),
        })
    }
}

impl SttEngine for CannedEngine {
    fn transcribe(&self, audio: &[f32]) -> Result<TranscriptionResult, SttError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(TranscriptionResult {
            text: self.text.to_string(),
            language: "th".into(),
            segments: vec![Segment {
                text: self.text.to_string(),
                start_ms: 0,
                end_ms: audio.len() as u64 / 16,
            }],
            duration_ms: 1,
        })
    }
}

fn tone_wav(secs: f32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 44_100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    let mut w = hound::WavWriter::new(&mut cursor, spec).unwrap();
    for i in 0..(secs * 44_100.0) as usize {
        let t = i as f32 / 44_100.0;
        let s = ((2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.7 * i16::MAX as f32) as i16;
        w.write_sample(s).unwrap();
        w.write_sample(s).unwrap();
    }
    w.finalize().unwrap();
    cursor.into_inner()
}

struct Running {
    addr: SocketAddr,
    stop: Option<oneshot::Sender<()>>,
    _scratch: tempfile::TempDir,
}

impl Drop for Running {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

async fn start(engine: Arc<dyn SttEngine>) -> Running {
    let scratch = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.audio.scratch_dir = Some(scratch.path().to_path_buf());

    let pipeline = TranscriptionPipeline::new(engine, &config);
    let app = router(AppState::new(pipeline, &config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    tokio::spawn(serve(listener, app, async {
        let _ = stopped.await;
    }));

    Running {
        addr,
        stop: Some(stop),
        _scratch: scratch,
    }
}

fn client_for(addr: SocketAddr) -> RemoteClient {
    RemoteClient::from_config(&RemoteConfig {
        base_url: format!("http://{addr}"),
        ..RemoteConfig::default()
    })
    .with_backoff_base(Duration::from_millis(5))
}

#[tokio::test]
async fn health_and_transcribe_round_trip() {
    let engine = CannedEngine::new("สวัสดีครับ");
    let server = start(engine.clone()).await;
    let client = client_for(server.addr);

    assert!(client.health().await);

    let out = client.transcribe(&tone_wav(1.0), "tester").await.unwrap();
    assert_eq!(out.transcript, "สวัสดีครับ");
    assert_eq!(out.language, "th");
    assert_eq!(out.source, TranscriptSource::Remote);
    assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let engine = CannedEngine::new("never");
    let server = start(engine.clone()).await;
    let client = client_for(server.addr);

    // 2 KiB of zeros: big enough to send, silent once decoded.
    let err = client
        .transcribe_with_retry(&[0u8; 2_048], "tester")
        .await
        .unwrap_err();
    match err {
        ClientError::Status { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("silent"), "{message}");
        }
        other => panic!("expected 400, got {other}"),
    }
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unreachable_service_fails_after_retries() {
    // Bind then drop to get a port nobody listens on.
    let addr = {
        let l = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        l.local_addr().unwrap()
    };
    let client = client_for(addr);

    assert!(!client.health().await);
    let err = client
        .transcribe_with_retry(&tone_wav(0.2), "tester")
        .await
        .unwrap_err();
    assert!(err.is_retryable(), "{err}");
}

#[tokio::test]
async fn fallback_uses_local_pipeline_when_remote_is_down() {
    let addr = {
        let l = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        l.local_addr().unwrap()
    };
    let scratch = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.audio.scratch_dir = Some(scratch.path().to_path_buf());
    let local = LocalTranscriber::new(TranscriptionPipeline::new(
        CannedEngine::new("ทดสอบระบบ"),
        &config,
    ));

    let t = FallbackTranscriber::new(client_for(addr), local);
    let out = t.transcribe(&tone_wav(0.5), "tester").await.unwrap();
    assert_eq!(out.transcript, "ทดสอบระบบ");
    assert_eq!(out.source, TranscriptSource::Local);
    assert_eq!(out.segments.len(), 1);
}
