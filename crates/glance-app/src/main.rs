use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use glance_analyzer::{Analyzer, GeminiAnalyzer};
use glance_capture::XcapCapturer;
use glance_config::Config;
use glance_io::{ClipboardBridge, Notifier, ResponseLog, SystemClipboard};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub mod cli;
pub mod controller;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod source;

#[cfg(test)]
mod tests;

use self::cli::Cli;
use self::controller::{AppController, DispatchExit};
use self::pipeline::{Pipeline, PipelineSettings};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.env_file {
        Some(path) => Config::from_env_file(path),
        None => Config::from_env(),
    };
    let config = match config {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.check_config {
        return match serde_json::to_string_pretty(config.as_ref()) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to render configuration: {e}");
                ExitCode::FAILURE
            }
        };
    }

    if let Err(e) = logging::init(&config.log) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }
    tracing::info!("=== Glance starting ===");

    if let Some(value) = &config.notify.show_popup {
        tracing::info!("SHOW_POPUP={:?} is set but has no effect", value);
    }

    let notifier = Notifier::detect(&config.notify.app_name);

    let analyzer: Arc<dyn Analyzer> = match GeminiAnalyzer::new(
        config.analyzer.api_key.clone(),
        config.analyzer.model.clone(),
        config.analyzer.api_url.clone(),
    ) {
        Ok(analyzer) => {
            let metadata = analyzer.metadata();
            tracing::info!(
                "Analyzer client initialized ({} model {})",
                metadata.provider,
                metadata.model
            );
            Arc::new(analyzer)
        }
        Err(e) => {
            tracing::error!("Analyzer initialization error: {}", e);
            notifier.notify("Analyzer init error", &e.to_string()).await;
            return ExitCode::FAILURE;
        }
    };

    let clipboard: Arc<dyn ClipboardBridge> = Arc::new(SystemClipboard::new());
    let source = source::from_config(
        &config.capture,
        Arc::new(XcapCapturer::new()),
        clipboard.clone(),
    );
    let pipeline = Arc::new(Pipeline::new(
        PipelineSettings::from_config(&config),
        source,
        analyzer,
        clipboard,
        notifier.clone(),
        ResponseLog::new(&config.log.response_log),
    ));

    if cli.once {
        let report = pipeline.run(Uuid::new_v4(), &CancellationToken::new()).await;
        tracing::info!("=== Glance finished: {} ===", report.state);
        return if report.succeeded() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    let controller = AppController::new(pipeline, config.pipeline.single_flight);
    let (action_tx, action_rx) = kanal::unbounded_async();

    tracing::info!("Initializing hotkeys");
    match io::spawn_hotkey_listener(config.hotkey.clone(), action_tx).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::error!("Hotkey registration failed: {}", e);
            notifier.notify("Hotkey error", &e.to_string()).await;
            return ExitCode::FAILURE;
        }
        Err(_) => {
            tracing::error!("Hotkey listener thread exited before registering");
            return ExitCode::FAILURE;
        }
    }

    tracing::info!(
        "Waiting for {} (capture) or {} (shutdown)",
        config.hotkey.run,
        config.hotkey.panic
    );

    let exit = controller.run(action_rx).await;
    let drained = controller.shutdown(config.pipeline.shutdown_grace()).await;
    tracing::info!(
        "=== Glance shutting down ({} run(s) started, {} ignored, clean: {}) ===",
        controller.started(),
        controller.ignored(),
        drained
    );

    // The listener thread may still be parked on the OS event channel
    let code = match exit {
        DispatchExit::Panic => 0,
        DispatchExit::ChannelClosed => 1,
    };
    std::process::exit(code);
}
