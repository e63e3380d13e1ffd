pub mod clipboard;
pub mod notify;
pub mod response_log;

pub use clipboard::{ClipboardBridge, ClipboardError, SystemClipboard};
pub use notify::{
    DesktopSink, MAX_CHUNK_CHARS, NotificationSink, Notifier, NotifyError, split_message,
};
pub use response_log::ResponseLog;
