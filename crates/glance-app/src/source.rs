use std::sync::Arc;

use glance_capture::{CaptureError, ScreenCapturer, ScreenshotImage};
use glance_config::capture::{CaptureConfig, CaptureSource};
use glance_io::ClipboardBridge;
use glance_types::CaptureRegion;

/// Where a pipeline run gets its image; called on a blocking thread
pub trait ImageSource: Send + Sync {
    fn acquire(&self) -> Result<ScreenshotImage, CaptureError>;

    fn describe(&self) -> String;
}

/// Fixed screen region
pub struct ScreenSource {
    capturer: Arc<dyn ScreenCapturer>,
    region: CaptureRegion,
}

impl ScreenSource {
    pub fn new(capturer: Arc<dyn ScreenCapturer>, region: CaptureRegion) -> Self {
        Self { capturer, region }
    }
}

impl ImageSource for ScreenSource {
    fn acquire(&self) -> Result<ScreenshotImage, CaptureError> {
        self.capturer.capture(self.region)
    }

    fn describe(&self) -> String {
        format!("screen region {}", self.region)
    }
}

/// Whatever image is currently on the clipboard
pub struct ClipboardSource {
    clipboard: Arc<dyn ClipboardBridge>,
}

impl ClipboardSource {
    pub fn new(clipboard: Arc<dyn ClipboardBridge>) -> Self {
        Self { clipboard }
    }
}

impl ImageSource for ClipboardSource {
    fn acquire(&self) -> Result<ScreenshotImage, CaptureError> {
        self.clipboard
            .read_image()
            .ok_or(CaptureError::NoClipboardImage)
    }

    fn describe(&self) -> String {
        "clipboard image".to_string()
    }
}

pub fn from_config(
    config: &CaptureConfig,
    capturer: Arc<dyn ScreenCapturer>,
    clipboard: Arc<dyn ClipboardBridge>,
) -> Arc<dyn ImageSource> {
    match config.source {
        CaptureSource::Screen => Arc::new(ScreenSource::new(capturer, config.region)),
        CaptureSource::Clipboard => Arc::new(ClipboardSource::new(clipboard)),
    }
}
