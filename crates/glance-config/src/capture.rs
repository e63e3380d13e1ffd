use std::fmt;
use std::str::FromStr;

use glance_types::CaptureRegion;
use serde::Serialize;

use crate::{ConfigError, Lookup};

pub(crate) const CAPTURE_BBOX: &str = "CAPTURE_BBOX";

/// Where a pipeline run takes its image from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSource {
    #[default]
    Screen,
    Clipboard,
}

impl FromStr for CaptureSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "screen" => Ok(CaptureSource::Screen),
            "clipboard" => Ok(CaptureSource::Clipboard),
            other => Err(format!("unknown capture source {other:?} (screen|clipboard)")),
        }
    }
}

impl fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureSource::Screen => write!(f, "screen"),
            CaptureSource::Clipboard => write!(f, "clipboard"),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct CaptureConfig {
    pub region: CaptureRegion,
    pub source: CaptureSource,
}

impl CaptureConfig {
    pub(crate) fn from_lookup(env: &Lookup<'_>) -> Result<Self, ConfigError> {
        let region = env
            .required(CAPTURE_BBOX)?
            .parse()
            .map_err(|source| ConfigError::Region {
                key: CAPTURE_BBOX,
                source,
            })?;

        Ok(Self {
            region,
            source: env.parse_or("CAPTURE_SOURCE", CaptureSource::default())?,
        })
    }
}
