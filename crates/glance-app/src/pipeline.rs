use std::sync::Arc;
use std::time::Duration;

use glance_analyzer::Analyzer;
use glance_capture::encode_png;
use glance_config::Config;
use glance_io::{ClipboardBridge, Notifier, ResponseLog};
use glance_types::PipelineState;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::source::ImageSource;

pub const COPIED_NOTICE: &str = "Answer copied to clipboard.";
pub const NOT_COPIED_NOTICE: &str = "The answer could not be copied to the clipboard.";
pub const NO_ANSWER_NOTICE: &str = "No answer was obtained from the analyzer.";

/// Tunables for one pipeline, taken from the config at startup
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub title: String,
    pub prompt: String,
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub success_notice_delay: Duration,
    pub notify_on_start: bool,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            title: config.notify.app_name.clone(),
            prompt: config.analyzer.prompt.clone(),
            max_attempts: config.pipeline.max_attempts,
            initial_backoff: config.pipeline.initial_backoff(),
            success_notice_delay: config.pipeline.success_notice_delay(),
            notify_on_start: config.pipeline.notify_on_start,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Capture(String),
    Encode(String),
    /// Permanent analyzer error, never retried
    Analyzer(String),
    /// Every attempt hit a retryable error
    Exhausted { attempts: u32 },
    Cancelled,
}

/// What one run did, for logs and tests
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub state: PipelineState,
    pub answer: Option<String>,
    pub attempts: u32,
    /// Backoff slept before each retry, in order
    pub backoffs: Vec<Duration>,
    pub clipboard_written: bool,
    pub failure: Option<FailureReason>,
}

impl PipelineReport {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            state: PipelineState::Idle,
            answer: None,
            attempts: 0,
            backoffs: Vec::new(),
            clipboard_written: false,
            failure: None,
        }
    }

    fn enter(&mut self, state: PipelineState) {
        tracing::info!("[{}] {} -> {}", short_id(&self.run_id), self.state, state);
        self.state = state;
    }

    fn fail(mut self, reason: FailureReason) -> Self {
        tracing::error!("[{}] run failed: {:?}", short_id(&self.run_id), reason);
        self.enter(PipelineState::Failed);
        self.failure = Some(reason);
        self
    }

    pub fn succeeded(&self) -> bool {
        self.state == PipelineState::Succeeded
    }
}

/// Capture → encode → analyze (with retry) → clipboard → notify
pub struct Pipeline {
    settings: PipelineSettings,
    source: Arc<dyn ImageSource>,
    analyzer: Arc<dyn Analyzer>,
    clipboard: Arc<dyn ClipboardBridge>,
    notifier: Notifier,
    responses: ResponseLog,
}

impl Pipeline {
    pub fn new(
        settings: PipelineSettings,
        source: Arc<dyn ImageSource>,
        analyzer: Arc<dyn Analyzer>,
        clipboard: Arc<dyn ClipboardBridge>,
        notifier: Notifier,
        responses: ResponseLog,
    ) -> Self {
        Self {
            settings,
            source,
            analyzer,
            clipboard,
            notifier,
            responses,
        }
    }

    /// Execute one run; never returns an error, failures end up in the report
    pub async fn run(&self, run_id: Uuid, cancel: &CancellationToken) -> PipelineReport {
        let mut report = PipelineReport::new(run_id);
        let id = short_id(&run_id);
        let title = self.settings.title.as_str();

        tracing::info!("[{}] Run started ({})", id, self.source.describe());
        if self.settings.notify_on_start {
            self.notifier
                .notify(title, "Analysis in progress (auto capture)...")
                .await;
        }
        if cancel.is_cancelled() {
            return report.fail(FailureReason::Cancelled);
        }

        // Capturing
        report.enter(PipelineState::Capturing);
        let source = self.source.clone();
        let screenshot = match tokio::task::spawn_blocking(move || source.acquire()).await {
            Ok(Ok(image)) => {
                tracing::info!(
                    "[{}] Capture succeeded ({}x{})",
                    id,
                    image.width(),
                    image.height()
                );
                image
            }
            Ok(Err(e)) => {
                tracing::error!("[{}] Capture error: {}", id, e);
                self.notifier.notify("Capture error", &e.to_string()).await;
                return report.fail(FailureReason::Capture(e.to_string()));
            }
            Err(e) => {
                tracing::error!("[{}] Capture task error: {}", id, e);
                self.notifier.notify("Capture error", &e.to_string()).await;
                return report.fail(FailureReason::Capture(e.to_string()));
            }
        };

        // Encoding
        report.enter(PipelineState::Encoding);
        let png = match tokio::task::spawn_blocking(move || encode_png(&screenshot)).await {
            Ok(Ok(png)) => {
                tracing::info!("[{}] Image encoded in memory ({} bytes)", id, png.len());
                png
            }
            Ok(Err(e)) => {
                tracing::error!("[{}] Encoding error: {}", id, e);
                self.notifier.notify("Capture error", &e.to_string()).await;
                return report.fail(FailureReason::Encode(e.to_string()));
            }
            Err(e) => {
                tracing::error!("[{}] Encoding task error: {}", id, e);
                self.notifier.notify("Capture error", &e.to_string()).await;
                return report.fail(FailureReason::Encode(e.to_string()));
            }
        };

        // Analyzing
        let max_attempts = self.settings.max_attempts;
        let mut backoff = self.settings.initial_backoff;
        let mut answer = None;

        for attempt in 1..=max_attempts {
            report.enter(PipelineState::Analyzing { attempt });
            report.attempts = attempt;

            let result = tokio::select! {
                result = self.analyzer.analyze(&self.settings.prompt, &png) => result,
                _ = cancel.cancelled() => return report.fail(FailureReason::Cancelled),
            };

            match result {
                Ok(text) => {
                    tracing::info!(
                        "[{}] Answer received ({} characters)",
                        id,
                        text.chars().count()
                    );
                    report.clipboard_written = self.copy_to_clipboard(&id, &text);
                    answer = Some(text);
                    break;
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!("[{}] Analyzer error (attempt {}): {}", id, attempt, e);
                    self.notifier
                        .notify(
                            title,
                            &format!("Server busy, retry {}/{}...", attempt, max_attempts),
                        )
                        .await;

                    report.backoffs.push(backoff);
                    tracing::info!("[{}] Backing off for {:?}", id, backoff);
                    tokio::select! {
                        _ = tokio::time::sleep(backoff) => {}
                        _ = cancel.cancelled() => return report.fail(FailureReason::Cancelled),
                    }
                    backoff *= 2;
                }
                Err(e) => {
                    tracing::warn!("[{}] Analyzer error (attempt {}): {}", id, attempt, e);
                    self.notifier.notify("Analyzer error", &e.to_string()).await;
                    return report.fail(FailureReason::Analyzer(e.to_string()));
                }
            }
        }

        let Some(answer) = answer else {
            self.notifier.notify("Error", NO_ANSWER_NOTICE).await;
            let attempts = report.attempts;
            return report.fail(FailureReason::Exhausted { attempts });
        };

        // Succeeded
        if !report.clipboard_written {
            report.clipboard_written = self.copy_to_clipboard(&id, &answer);
        }
        if let Err(e) = self.responses.append(&answer) {
            tracing::error!("[{}] Failed to record answer: {}", id, e);
        }
        report.enter(PipelineState::Succeeded);

        self.notifier.notify(title, &answer).await;
        report.answer = Some(answer);

        tokio::select! {
            _ = tokio::time::sleep(self.settings.success_notice_delay) => {
                let notice = if report.clipboard_written {
                    COPIED_NOTICE
                } else {
                    NOT_COPIED_NOTICE
                };
                self.notifier.notify(title, notice).await;
            }
            _ = cancel.cancelled() => {
                tracing::info!("[{}] Shutdown requested, skipping clipboard notice", id);
            }
        }

        report
    }

    fn copy_to_clipboard(&self, id: &str, text: &str) -> bool {
        match self.clipboard.write_text(text) {
            Ok(()) => {
                tracing::info!("[{}] Answer copied to clipboard", id);
                true
            }
            Err(e) => {
                tracing::error!("[{}] Clipboard error: {}", id, e);
                false
            }
        }
    }
}

pub fn short_id(run_id: &Uuid) -> String {
    run_id.simple().to_string()[..8].to_string()
}
