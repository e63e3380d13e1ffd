use std::sync::Mutex;

use arboard::{Clipboard, ImageData};
use image::RgbaImage;

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("clipboard read failed: {0}")]
    Read(String),

    #[error("clipboard write failed: {0}")]
    Write(String),
}

/// Best-effort access to the OS clipboard
pub trait ClipboardBridge: Send + Sync {
    /// Image currently on the clipboard, if any; access failures count as "no image"
    fn read_image(&self) -> Option<RgbaImage>;

    /// Replace the clipboard contents with `text`
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// `arboard`-backed clipboard
///
/// The handle is kept open for the process lifetime so X11/Wayland keep
/// serving text we wrote after the writing run has finished.
pub struct SystemClipboard {
    inner: Mutex<Option<Clipboard>>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        let inner = match Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(e) => {
                tracing::warn!("Clipboard not available yet: {}", e);
                None
            }
        };

        Self {
            inner: Mutex::new(inner),
        }
    }

    fn with_clipboard<T>(&self, f: impl FnOnce(&mut Clipboard) -> T) -> Result<T, ClipboardError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| ClipboardError::Unavailable("clipboard lock poisoned".to_string()))?;

        if guard.is_none() {
            *guard =
                Some(Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?);
        }

        match guard.as_mut() {
            Some(clipboard) => Ok(f(clipboard)),
            None => Err(ClipboardError::Unavailable("no clipboard handle".to_string())),
        }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardBridge for SystemClipboard {
    fn read_image(&self) -> Option<RgbaImage> {
        match self
            .with_clipboard(|c| c.get_image())
            .and_then(decode_image)
        {
            Ok(Some(image)) => Some(image),
            Ok(None) => {
                tracing::warn!("No image on the clipboard");
                None
            }
            Err(e) => {
                tracing::error!("Clipboard error: {}", e);
                None
            }
        }
    }

    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        self.with_clipboard(|c| c.set_text(text.to_string()))?
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }
}

/// `Ok(None)` when the clipboard holds something other than an image
fn decode_image(
    read: Result<ImageData<'static>, arboard::Error>,
) -> Result<Option<RgbaImage>, ClipboardError> {
    let data = match read {
        Ok(data) => data,
        Err(arboard::Error::ContentNotAvailable) => return Ok(None),
        Err(e) => return Err(ClipboardError::Read(e.to_string())),
    };

    let (width, height) = (data.width, data.height);
    RgbaImage::from_raw(width as u32, height as u32, data.bytes.into_owned())
        .map(Some)
        .ok_or_else(|| ClipboardError::Read(format!("image data does not match {width}x{height}")))
}
