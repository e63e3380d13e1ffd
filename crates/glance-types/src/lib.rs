pub mod types;

pub use types::{CaptureRegion, HotkeyAction, PipelineState, RegionError};
