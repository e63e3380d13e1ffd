use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use glance_types::HotkeyAction;
use kanal::{AsyncReceiver, AsyncSender};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

use crate::pipeline::{Pipeline, PipelineReport, short_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Started(Uuid),
    /// Single-flight guard: a run was already in flight
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchExit {
    Panic,
    ChannelClosed,
}

/// Spawns pipeline runs for hotkey presses and owns their lifecycle
pub struct AppController {
    pipeline: Arc<Pipeline>,
    tracker: TaskTracker,
    cancel_token: CancellationToken,
    single_flight: bool,
    in_flight: Arc<AtomicUsize>,
    started: AtomicUsize,
    ignored: AtomicUsize,
    reports: Option<AsyncSender<PipelineReport>>,
}

/// Decrements the in-flight count when a worker ends, however it ends
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AppController {
    pub fn new(pipeline: Arc<Pipeline>, single_flight: bool) -> Self {
        Self {
            pipeline,
            tracker: TaskTracker::new(),
            cancel_token: CancellationToken::new(),
            single_flight,
            in_flight: Arc::new(AtomicUsize::new(0)),
            started: AtomicUsize::new(0),
            ignored: AtomicUsize::new(0),
            reports: None,
        }
    }

    /// Forward every finished run's report to `tx`
    pub fn with_reports(mut self, tx: AsyncSender<PipelineReport>) -> Self {
        self.reports = Some(tx);
        self
    }

    /// Start one pipeline run without waiting for it
    pub fn trigger(&self) -> TriggerOutcome {
        if self.cancel_token.is_cancelled() {
            tracing::warn!("Shutdown in progress, ignoring run request");
            self.ignored.fetch_add(1, Ordering::SeqCst);
            return TriggerOutcome::Ignored;
        }

        if self.single_flight {
            if self
                .in_flight
                .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                tracing::info!("A run is already in progress, ignoring hotkey press");
                self.ignored.fetch_add(1, Ordering::SeqCst);
                return TriggerOutcome::Ignored;
            }
        } else {
            self.in_flight.fetch_add(1, Ordering::SeqCst);
        }

        let run_id = Uuid::new_v4();
        let guard = InFlightGuard(self.in_flight.clone());
        let pipeline = self.pipeline.clone();
        let cancel = self.cancel_token.child_token();
        let reports = self.reports.clone();

        self.started.fetch_add(1, Ordering::SeqCst);
        tracing::info!("[{}] Spawning pipeline worker", short_id(&run_id));

        self.tracker.spawn(async move {
            let _guard = guard;
            let report = pipeline.run(run_id, &cancel).await;
            tracing::info!(
                "[{}] Run finished: {} after {} attempt(s), backoffs {:?}, answer {} chars, \
                 failure {:?}",
                short_id(&run_id),
                report.state,
                report.attempts,
                report.backoffs,
                report.answer.as_ref().map_or(0, |a| a.chars().count()),
                report.failure
            );
            if let Some(tx) = reports
                && let Err(e) = tx.send(report).await
            {
                tracing::debug!("Report receiver gone: {}", e);
            }
        });

        TriggerOutcome::Started(run_id)
    }

    /// Consume hotkey actions until panic or until the listener goes away
    pub async fn run(&self, actions: AsyncReceiver<HotkeyAction>) -> DispatchExit {
        loop {
            match actions.recv().await {
                Ok(HotkeyAction::Run) => {
                    tracing::info!("Run hotkey pressed");
                    self.trigger();
                }
                Ok(HotkeyAction::Panic) => {
                    tracing::info!("Panic hotkey pressed, stopping");
                    return DispatchExit::Panic;
                }
                Err(e) => {
                    tracing::error!("Hotkey channel closed: {}", e);
                    return DispatchExit::ChannelClosed;
                }
            }
        }
    }

    /// Cancel every worker and wait up to `grace` for them; true if all finished
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.cancel_token.cancel();
        self.tracker.close();

        let in_flight = self.in_flight();
        if in_flight > 0 {
            tracing::info!("Waiting up to {:?} for {} run(s)", grace, in_flight);
        }

        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(
                    "Grace period elapsed, abandoning {} run(s)",
                    self.in_flight()
                );
                false
            }
        }
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn ignored(&self) -> usize {
        self.ignored.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}
