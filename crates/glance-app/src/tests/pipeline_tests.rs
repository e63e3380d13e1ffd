use std::sync::Arc;
use std::time::Duration;

use glance_analyzer::AnalyzeError;
use glance_capture::{CaptureError, ScreenshotImage};
use glance_io::{Notifier, ResponseLog};
use glance_types::PipelineState;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::*;
use crate::pipeline::{
    COPIED_NOTICE, FailureReason, NO_ANSWER_NOTICE, NOT_COPIED_NOTICE, Pipeline,
};
use crate::source::ClipboardSource;

fn shown(title: &str, body: &str) -> (String, String) {
    (title.to_string(), body.to_string())
}

#[tokio::test(start_paused = true)]
async fn test_short_answer_copied_and_notified() {
    let harness = Harness::new(ScriptedAnalyzer::always(paris));

    let start = Instant::now();
    let report = harness
        .pipeline
        .run(Uuid::new_v4(), &CancellationToken::new())
        .await;

    assert!(report.succeeded());
    assert_eq!(report.answer.as_deref(), Some("Paris"));
    assert_eq!(report.attempts, 1);
    assert!(report.backoffs.is_empty());
    assert!(report.clipboard_written);

    assert_eq!(harness.clipboard.writes(), vec!["Paris".to_string()]);
    assert_eq!(
        harness.sink.shown(),
        vec![shown("Glance", "Paris"), shown("Glance", COPIED_NOTICE)]
    );
    assert_eq!(harness.response_log().matches("] Paris\n").count(), 1);
    assert_eq!(start.elapsed(), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_twice_then_answer() {
    let analyzer = ScriptedAnalyzer::new(
        vec![unavailable(), unavailable(), Ok("42".to_string())],
        paris,
    );
    let harness = Harness::new(analyzer);

    let report = harness
        .pipeline
        .run(Uuid::new_v4(), &CancellationToken::new())
        .await;

    assert!(report.succeeded());
    assert_eq!(report.attempts, 3);
    assert_eq!(
        report.backoffs,
        vec![Duration::from_secs(2), Duration::from_secs(4)]
    );
    assert_eq!(harness.analyzer.calls(), 3);
    assert_eq!(harness.clipboard.writes(), vec!["42".to_string()]);
    assert_eq!(
        harness.sink.bodies(),
        vec![
            "Server busy, retry 1/3...".to_string(),
            "Server busy, retry 2/3...".to_string(),
            "42".to_string(),
            COPIED_NOTICE.to_string(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_retries_exhausted() {
    let harness = Harness::new(ScriptedAnalyzer::always(unavailable));

    let start = Instant::now();
    let report = harness
        .pipeline
        .run(Uuid::new_v4(), &CancellationToken::new())
        .await;

    assert_eq!(report.state, PipelineState::Failed);
    assert_eq!(report.attempts, 3);
    assert_eq!(
        report.backoffs,
        vec![
            Duration::from_secs(2),
            Duration::from_secs(4),
            Duration::from_secs(8)
        ]
    );
    assert_eq!(report.failure, Some(FailureReason::Exhausted { attempts: 3 }));
    assert_eq!(start.elapsed(), Duration::from_secs(14));

    assert_eq!(harness.analyzer.calls(), 3);
    assert!(harness.clipboard.writes().is_empty());
    assert_eq!(harness.response_log(), "");
    assert_eq!(
        harness.sink.shown().last(),
        Some(&shown("Error", NO_ANSWER_NOTICE))
    );
}

#[tokio::test(start_paused = true)]
async fn test_permanent_error_is_not_retried() {
    let harness = Harness::new(ScriptedAnalyzer::always(|| {
        Err(AnalyzeError::Authentication("invalid API key".to_string()))
    }));

    let report = harness
        .pipeline
        .run(Uuid::new_v4(), &CancellationToken::new())
        .await;

    assert_eq!(report.state, PipelineState::Failed);
    assert_eq!(report.attempts, 1);
    assert!(report.backoffs.is_empty());
    assert!(matches!(
        report.failure,
        Some(FailureReason::Analyzer(ref m)) if m.contains("invalid API key")
    ));

    assert_eq!(harness.analyzer.calls(), 1);
    assert!(harness.clipboard.writes().is_empty());
    let shown = harness.sink.shown();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].0, "Analyzer error");
    assert!(shown[0].1.contains("invalid API key"));
}

#[tokio::test(start_paused = true)]
async fn test_repeated_runs_record_each_answer() {
    let harness = Harness::new(ScriptedAnalyzer::always(paris));
    let cancel = CancellationToken::new();

    harness.pipeline.run(Uuid::new_v4(), &cancel).await;
    harness.pipeline.run(Uuid::new_v4(), &cancel).await;

    assert_eq!(harness.clipboard.writes(), vec!["Paris", "Paris"]);
    assert_eq!(harness.response_log().matches("] Paris\n").count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_capture_failure_skips_analyzer() {
    let harness = Harness::build(
        settings(),
        FixedSource::failing("no monitor"),
        ScriptedAnalyzer::always(paris),
        RecordingClipboard::default(),
    );

    let report = harness
        .pipeline
        .run(Uuid::new_v4(), &CancellationToken::new())
        .await;

    assert_eq!(report.state, PipelineState::Failed);
    assert!(matches!(report.failure, Some(FailureReason::Capture(_))));
    assert_eq!(harness.source.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(harness.analyzer.calls(), 0);

    let shown = harness.sink.shown();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].0, "Capture error");
}

#[tokio::test(start_paused = true)]
async fn test_clipboard_failure_still_succeeds() {
    let harness = Harness::build(
        settings(),
        FixedSource::ok(),
        ScriptedAnalyzer::always(paris),
        RecordingClipboard::failing(),
    );

    let report = harness
        .pipeline
        .run(Uuid::new_v4(), &CancellationToken::new())
        .await;

    assert!(report.succeeded());
    assert!(!report.clipboard_written);
    // first write and the one retry after the answer is settled
    assert_eq!(
        harness
            .clipboard
            .attempts
            .load(std::sync::atomic::Ordering::SeqCst),
        2
    );
    assert_eq!(
        harness.sink.shown(),
        vec![shown("Glance", "Paris"), shown("Glance", NOT_COPIED_NOTICE)]
    );
    assert_eq!(harness.response_log().matches("] Paris\n").count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_long_answer_is_split() {
    let long = "a".repeat(650);
    let analyzer = ScriptedAnalyzer::new(vec![Ok(long.clone())], paris);
    let harness = Harness::new(analyzer);

    harness
        .pipeline
        .run(Uuid::new_v4(), &CancellationToken::new())
        .await;

    let titles: Vec<String> = harness.sink.shown().into_iter().map(|(t, _)| t).collect();
    assert_eq!(
        titles,
        vec![
            "Glance (part 1/3)",
            "Glance (part 2/3)",
            "Glance (part 3/3)",
            "Glance"
        ]
    );
    assert_eq!(harness.clipboard.writes(), vec![long]);
}

#[tokio::test(start_paused = true)]
async fn test_start_notice_is_opt_in() {
    let mut settings = settings();
    settings.notify_on_start = true;
    let harness = Harness::build(
        settings,
        FixedSource::ok(),
        ScriptedAnalyzer::always(paris),
        RecordingClipboard::default(),
    );

    harness
        .pipeline
        .run(Uuid::new_v4(), &CancellationToken::new())
        .await;

    let bodies = harness.sink.bodies();
    assert_eq!(bodies.len(), 3);
    assert!(bodies[0].starts_with("Analysis in progress"));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_backoff() {
    let harness = Harness::new(ScriptedAnalyzer::always(unavailable));
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let report = harness.pipeline.run(Uuid::new_v4(), &cancel).await;

    assert_eq!(report.failure, Some(FailureReason::Cancelled));
    assert_eq!(harness.analyzer.calls(), 1);
    assert!(harness.clipboard.writes().is_empty());
}

#[tokio::test]
async fn test_cancelled_before_capture() {
    let harness = Harness::new(ScriptedAnalyzer::always(paris));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = harness.pipeline.run(Uuid::new_v4(), &cancel).await;

    assert_eq!(report.failure, Some(FailureReason::Cancelled));
    assert_eq!(harness.source.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_encode_failure_reported_like_capture_failure() {
    let harness = Harness::build(
        settings(),
        FixedSource::sized(0, 0),
        ScriptedAnalyzer::always(paris),
        RecordingClipboard::default(),
    );

    let report = harness
        .pipeline
        .run(Uuid::new_v4(), &CancellationToken::new())
        .await;

    assert_eq!(report.state, PipelineState::Failed);
    assert!(matches!(report.failure, Some(FailureReason::Encode(_))));
    assert_eq!(harness.analyzer.calls(), 0);
    assert!(harness.clipboard.writes().is_empty());

    let shown = harness.sink.shown();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].0, "Capture error");
}

/// Pipeline whose image comes from `clipboard` itself
fn clipboard_pipeline(
    clipboard: Arc<RecordingClipboard>,
    analyzer: Arc<ScriptedAnalyzer>,
    sink: Arc<RecordingSink>,
    responses: &std::path::Path,
) -> Pipeline {
    Pipeline::new(
        settings(),
        Arc::new(ClipboardSource::new(clipboard.clone())),
        analyzer,
        clipboard,
        Notifier::with_sink(sink),
        ResponseLog::new(responses),
    )
}

#[tokio::test(start_paused = true)]
async fn test_clipboard_source_without_image_fails_capture() {
    let dir = tempfile::tempdir().unwrap();
    let clipboard = Arc::new(RecordingClipboard::default());
    let analyzer = Arc::new(ScriptedAnalyzer::always(paris));
    let sink = Arc::new(RecordingSink::default());
    let pipeline = clipboard_pipeline(
        clipboard.clone(),
        analyzer.clone(),
        sink.clone(),
        &dir.path().join("responses.log"),
    );

    let report = pipeline.run(Uuid::new_v4(), &CancellationToken::new()).await;

    assert_eq!(report.state, PipelineState::Failed);
    assert_eq!(
        report.failure,
        Some(FailureReason::Capture(CaptureError::NoClipboardImage.to_string()))
    );
    assert_eq!(clipboard.reads.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(analyzer.calls(), 0);
    assert_eq!(
        sink.shown(),
        vec![shown("Capture error", &CaptureError::NoClipboardImage.to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn test_clipboard_source_image_is_analyzed() {
    let dir = tempfile::tempdir().unwrap();
    let clipboard = Arc::new(RecordingClipboard::holding(ScreenshotImage::new(32, 16)));
    let analyzer = Arc::new(ScriptedAnalyzer::always(paris));
    let sink = Arc::new(RecordingSink::default());
    let pipeline = clipboard_pipeline(
        clipboard.clone(),
        analyzer.clone(),
        sink.clone(),
        &dir.path().join("responses.log"),
    );

    let report = pipeline.run(Uuid::new_v4(), &CancellationToken::new()).await;

    assert!(report.succeeded());
    assert_eq!(analyzer.calls(), 1);
    // the answer replaces the image that was on the clipboard
    assert_eq!(clipboard.writes(), vec!["Paris".to_string()]);
}
