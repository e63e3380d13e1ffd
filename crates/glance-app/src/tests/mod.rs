//! Test doubles shared by the app-level scenarios

mod pipeline_tests;

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use glance_analyzer::{AnalyzeError, Analyzer, AnalyzerMetadata};
use glance_capture::{CaptureError, ScreenshotImage};
use glance_io::{
    ClipboardBridge, ClipboardError, NotificationSink, Notifier, NotifyError, ResponseLog,
};

use crate::pipeline::{Pipeline, PipelineSettings};
use crate::source::ImageSource;

pub struct FixedSource {
    fail_with: Option<String>,
    size: (u32, u32),
    pub calls: AtomicUsize,
}

impl FixedSource {
    pub fn ok() -> Self {
        Self::sized(800, 600)
    }

    /// Zero-sized bitmaps cannot be PNG-encoded
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            fail_with: None,
            size: (width, height),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::ok()
        }
    }
}

impl ImageSource for FixedSource {
    fn acquire(&self) -> Result<ScreenshotImage, CaptureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(message) => Err(CaptureError::Screenshot(message.clone())),
            None => Ok(ScreenshotImage::new(self.size.0, self.size.1)),
        }
    }

    fn describe(&self) -> String {
        "fixed test bitmap".to_string()
    }
}

/// Replays scripted results, then repeats `fallback` forever
pub struct ScriptedAnalyzer {
    script: Mutex<VecDeque<Result<String, AnalyzeError>>>,
    fallback: fn() -> Result<String, AnalyzeError>,
    delay: Duration,
    pub calls: AtomicUsize,
}

impl ScriptedAnalyzer {
    pub fn new(
        script: Vec<Result<String, AnalyzeError>>,
        fallback: fn() -> Result<String, AnalyzeError>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always(fallback: fn() -> Result<String, AnalyzeError>) -> Self {
        Self::new(Vec::new(), fallback)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Analyzer for ScriptedAnalyzer {
    async fn analyze(&self, _prompt: &str, image_png: &[u8]) -> Result<String, AnalyzeError> {
        assert!(image_png.starts_with(b"\x89PNG"), "analyzer expects PNG bytes");
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(self.fallback)
    }

    fn metadata(&self) -> AnalyzerMetadata {
        AnalyzerMetadata {
            provider: "scripted".to_string(),
            model: "test".to_string(),
        }
    }
}

pub fn unavailable() -> Result<String, AnalyzeError> {
    Err(AnalyzeError::Unavailable(
        "The model is overloaded. Please try again later.".to_string(),
    ))
}

pub fn paris() -> Result<String, AnalyzeError> {
    Ok("Paris".to_string())
}

#[derive(Default)]
pub struct RecordingClipboard {
    pub writes: Mutex<Vec<String>>,
    pub attempts: AtomicUsize,
    pub reads: AtomicUsize,
    image: Option<ScreenshotImage>,
    fail: bool,
}

impl RecordingClipboard {
    pub fn holding(image: ScreenshotImage) -> Self {
        Self {
            image: Some(image),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

impl ClipboardBridge for RecordingClipboard {
    fn read_image(&self) -> Option<ScreenshotImage> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.image.clone()
    }

    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ClipboardError::Unavailable("no display".to_string()));
        }
        self.writes.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub shown: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    pub fn shown(&self) -> Vec<(String, String)> {
        self.shown.lock().unwrap().clone()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.shown().into_iter().map(|(_, body)| body).collect()
    }
}

impl NotificationSink for RecordingSink {
    fn show(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        self.shown
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        Ok(())
    }
}

pub fn settings() -> PipelineSettings {
    PipelineSettings {
        title: "Glance".to_string(),
        prompt: "Analyze this image".to_string(),
        max_attempts: 3,
        initial_backoff: Duration::from_secs(2),
        success_notice_delay: Duration::from_secs(2),
        notify_on_start: false,
    }
}

/// A pipeline wired to test doubles, plus handles to inspect them
pub struct Harness {
    pub pipeline: Arc<Pipeline>,
    pub source: Arc<FixedSource>,
    pub analyzer: Arc<ScriptedAnalyzer>,
    pub clipboard: Arc<RecordingClipboard>,
    pub sink: Arc<RecordingSink>,
    pub responses: PathBuf,
    _dir: tempfile::TempDir,
}

impl Harness {
    pub fn new(analyzer: ScriptedAnalyzer) -> Self {
        Self::build(settings(), FixedSource::ok(), analyzer, RecordingClipboard::default())
    }

    pub fn build(
        settings: PipelineSettings,
        source: FixedSource,
        analyzer: ScriptedAnalyzer,
        clipboard: RecordingClipboard,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let responses = dir.path().join("gemini_responses.log");

        let source = Arc::new(source);
        let analyzer = Arc::new(analyzer);
        let clipboard = Arc::new(clipboard);
        let sink = Arc::new(RecordingSink::default());

        let pipeline = Arc::new(Pipeline::new(
            settings,
            source.clone(),
            analyzer.clone(),
            clipboard.clone(),
            Notifier::with_sink(sink.clone()),
            ResponseLog::new(&responses),
        ));

        Self {
            pipeline,
            source,
            analyzer,
            clipboard,
            sink,
            responses,
            _dir: dir,
        }
    }

    pub fn response_log(&self) -> String {
        std::fs::read_to_string(&self.responses).unwrap_or_default()
    }
}
