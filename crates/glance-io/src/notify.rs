use std::sync::Arc;
use std::time::Duration;

/// Longest body a single desktop notification carries
pub const MAX_CHUNK_CHARS: usize = 300;
/// How much of a message the log fallback keeps
pub const FALLBACK_CHARS: usize = 256;
/// Pause between parts so the OS does not coalesce or throttle them
pub const CHUNK_PAUSE: Duration = Duration::from_millis(300);

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification service unavailable: {0}")]
    Unavailable(String),

    #[error("failed to show notification: {0}")]
    Show(String),
}

/// Something that can put a single notification in front of the user
pub trait NotificationSink: Send + Sync {
    fn show(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// Native desktop notifications via `notify-rust`
pub struct DesktopSink {
    app_name: String,
}

impl DesktopSink {
    /// Check that the platform notification service answers
    pub fn connect(app_name: &str) -> Result<Self, NotifyError> {
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            let info = notify_rust::get_server_information()
                .map_err(|e| NotifyError::Unavailable(e.to_string()))?;
            tracing::debug!("Notification server: {} {}", info.name, info.version);
        }

        Ok(Self {
            app_name: app_name.to_string(),
        })
    }
}

impl NotificationSink for DesktopSink {
    fn show(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        notify_rust::Notification::new()
            .appname(&self.app_name)
            .summary(title)
            .body(body)
            .show()
            .map(|_| ())
            .map_err(|e| NotifyError::Show(e.to_string()))
    }
}

#[derive(Clone)]
enum Backend {
    Native(Arc<dyn NotificationSink>),
    /// Chosen once at startup when no native channel exists
    Log,
}

/// Splits messages into parts and delivers them in order
#[derive(Clone)]
pub struct Notifier {
    backend: Backend,
    pause: Duration,
}

impl Notifier {
    /// Try the native channel once; fall back to the log for the process lifetime
    pub fn detect(app_name: &str) -> Self {
        match DesktopSink::connect(app_name) {
            Ok(sink) => {
                tracing::info!("Desktop notifications available");
                Self::with_sink(Arc::new(sink))
            }
            Err(e) => {
                tracing::warn!("Desktop notifications unavailable, logging instead: {}", e);
                Self::log_only()
            }
        }
    }

    pub fn with_sink(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            backend: Backend::Native(sink),
            pause: CHUNK_PAUSE,
        }
    }

    pub fn log_only() -> Self {
        Self {
            backend: Backend::Log,
            pause: CHUNK_PAUSE,
        }
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub async fn notify(&self, title: &str, message: &str) {
        let sink = match &self.backend {
            Backend::Native(sink) => sink,
            Backend::Log => {
                let preview: String = message.chars().take(FALLBACK_CHARS).collect();
                tracing::info!("[Notification] {}: {}", title, preview);
                return;
            }
        };

        let parts = split_message(message.trim(), MAX_CHUNK_CHARS);
        if parts.is_empty() {
            tracing::debug!("Skipping empty notification '{}'", title);
            return;
        }

        let total = parts.len();
        for (idx, part) in parts.iter().enumerate() {
            let part_title = if total > 1 {
                format!("{} (part {}/{})", title, idx + 1, total)
            } else {
                title.to_string()
            };

            match sink.show(&part_title, part) {
                Ok(()) => tracing::info!("Notification shown: {} (part {})", title, idx + 1),
                Err(e) => tracing::error!("Notification error: {}", e),
            }

            if idx + 1 < total {
                tokio::time::sleep(self.pause).await;
            }
        }
    }
}

/// Split `message` into ordered chunks of at most `max_chars` characters
///
/// Splits on `char` boundaries; concatenating the result gives back `message`.
pub fn split_message(message: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for ch in message.chars() {
        current.push(ch);
        count += 1;
        if count == max_chars {
            parts.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }

    parts
}
