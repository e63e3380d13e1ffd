use glance_types::CaptureRegion;
use image::{ExtendedColorType, ImageEncoder, RgbaImage, codecs::png::PngEncoder, imageops};
use xcap::Monitor;

/// Bitmap produced by one capture, owned by the run that took it
pub type ScreenshotImage = RgbaImage;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("no monitor available: {0}")]
    Monitor(String),

    #[error("screen capture failed: {0}")]
    Screenshot(String),

    #[error("region {region} lies outside monitor at ({x},{y}) {width}x{height}")]
    OutOfBounds {
        region: CaptureRegion,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },

    #[error("no image on the clipboard")]
    NoClipboardImage,

    #[error("failed to encode PNG: {0}")]
    Encode(String),
}

/// Grabs the pixels of a screen rectangle
pub trait ScreenCapturer: Send + Sync {
    fn capture(&self, region: CaptureRegion) -> Result<ScreenshotImage, CaptureError>;
}

/// Capturer backed by `xcap` monitor screenshots
#[derive(Debug, Default, Clone, Copy)]
pub struct XcapCapturer;

impl XcapCapturer {
    pub fn new() -> Self {
        Self
    }
}

impl ScreenCapturer for XcapCapturer {
    fn capture(&self, region: CaptureRegion) -> Result<ScreenshotImage, CaptureError> {
        let monitors = Monitor::all().map_err(|e| CaptureError::Monitor(e.to_string()))?;

        // Prefer the monitor fully containing the region
        let monitor = monitors
            .iter()
            .find(|m| {
                region.left >= m.x()
                    && region.top >= m.y()
                    && region.right <= m.x() + m.width() as i32
                    && region.bottom <= m.y() + m.height() as i32
            })
            .or(monitors.first())
            .ok_or_else(|| CaptureError::Monitor("no monitor found".to_string()))?;

        tracing::debug!(
            "Capturing {} from monitor '{}' at ({},{})",
            region,
            monitor.name(),
            monitor.x(),
            monitor.y()
        );

        let image = monitor
            .capture_image()
            .map_err(|e| CaptureError::Screenshot(e.to_string()))?;

        crop_to_region(&image, (monitor.x(), monitor.y()), region)
    }
}

/// Crop a monitor screenshot (whose top-left sits at `origin`) to `region`
pub fn crop_to_region(
    image: &RgbaImage,
    origin: (i32, i32),
    region: CaptureRegion,
) -> Result<ScreenshotImage, CaptureError> {
    let out_of_bounds = || CaptureError::OutOfBounds {
        region,
        x: origin.0,
        y: origin.1,
        width: image.width(),
        height: image.height(),
    };

    // i64 so extreme coordinates cannot overflow
    let x = i64::from(region.left) - i64::from(origin.0);
    let y = i64::from(region.top) - i64::from(origin.1);
    if x < 0
        || y < 0
        || x + i64::from(region.width()) > i64::from(image.width())
        || y + i64::from(region.height()) > i64::from(image.height())
    {
        return Err(out_of_bounds());
    }
    let x = u32::try_from(x).map_err(|_| out_of_bounds())?;
    let y = u32::try_from(y).map_err(|_| out_of_bounds())?;

    Ok(imageops::crop_imm(image, x, y, region.width(), region.height()).to_image())
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, CaptureError> {
    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| CaptureError::Encode(e.to_string()))?;
    Ok(buffer)
}
