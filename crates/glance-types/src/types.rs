use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Screen rectangle grabbed on every run, in virtual desktop coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CaptureRegion {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegionError {
    #[error("expected four comma-separated integers (left,top,right,bottom), got {0:?}")]
    Format(String),

    #[error("invalid coordinate {value:?}: {reason}")]
    Coordinate { value: String, reason: String },

    #[error(
        "empty region: left ({left}) must be < right ({right}) \
         and top ({top}) < bottom ({bottom})"
    )]
    Empty {
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
    },
}

impl CaptureRegion {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Result<Self, RegionError> {
        let region = Self {
            left,
            top,
            right,
            bottom,
        };
        region.validate()?;
        Ok(region)
    }

    pub fn validate(&self) -> Result<(), RegionError> {
        if self.left >= self.right || self.top >= self.bottom {
            return Err(RegionError::Empty {
                left: self.left,
                top: self.top,
                right: self.right,
                bottom: self.bottom,
            });
        }
        Ok(())
    }

    pub fn width(&self) -> u32 {
        (i64::from(self.right) - i64::from(self.left)).clamp(0, i64::from(u32::MAX)) as u32
    }

    pub fn height(&self) -> u32 {
        (i64::from(self.bottom) - i64::from(self.top)).clamp(0, i64::from(u32::MAX)) as u32
    }
}

impl FromStr for CaptureRegion {
    type Err = RegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(RegionError::Format(s.to_string()));
        }

        let mut coords = [0i32; 4];
        for (slot, part) in coords.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|e: std::num::ParseIntError| {
                RegionError::Coordinate {
                    value: part.to_string(),
                    reason: e.to_string(),
                }
            })?;
        }

        Self::new(coords[0], coords[1], coords[2], coords[3])
    }
}

impl fmt::Display for CaptureRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// What a registered global hotkey asks the app to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    /// Run the capture/analyze pipeline once
    Run,
    /// Shut the process down
    Panic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Capturing,
    Encoding,
    Analyzing { attempt: u32 },
    Succeeded,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "Idle"),
            PipelineState::Capturing => write!(f, "Capturing"),
            PipelineState::Encoding => write!(f, "Encoding"),
            PipelineState::Analyzing { attempt } => write!(f, "Analyzing (attempt {attempt})"),
            PipelineState::Succeeded => write!(f, "Succeeded"),
            PipelineState::Failed => write!(f, "Failed"),
        }
    }
}
