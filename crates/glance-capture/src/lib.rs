mod capture;
mod hotkey;

pub use capture::{
    CaptureError, ScreenCapturer, ScreenshotImage, XcapCapturer, crop_to_region, encode_png,
};
pub use hotkey::{HotkeyBindings, HotkeyError, HotkeyManager, parse_hotkey};
