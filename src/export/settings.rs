use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;

use crate::capture::capturer::CaptureOpts;
use crate::composite::alpha::DEFAULT_ALPHA_CUTOFF;
use crate::encode::gif::GifOpts;
use crate::foundation::core::KeyColor;
use crate::foundation::error::{TurntableError, TurntableResult};
use crate::timing::schedule::{RotationMode, Schedule};

/// Per-export configuration, as handed over by a UI or read from JSON.
///
/// Missing JSON fields take their defaults.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub fps: f64,
    pub duration_secs: f64,
    /// Extra pixels kept around the content bounds on each side.
    pub padding_px: u32,
    pub alpha_cutoff: u8,
    pub key_color: KeyColor,
    pub rotation: RotationMode,
    pub gif_quality: u8,
    pub gif_workers: usize,
    /// Wait after each rotation update before reading pixels back.
    pub settle_ms: u64,
    /// Output file stem; `None` or blank falls back to `logo`.
    pub base_name: Option<String>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            fps: 30.0,
            duration_secs: 2.0,
            padding_px: 10,
            alpha_cutoff: DEFAULT_ALPHA_CUTOFF,
            key_color: KeyColor::default(),
            rotation: RotationMode::Sweep,
            gif_quality: 10,
            gif_workers: 2,
            settle_ms: 40,
            base_name: None,
        }
    }
}

impl ExportSettings {
    pub fn from_json_str(json: &str) -> TurntableResult<Self> {
        let settings = Self::parse_json_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_path(path: &Path) -> TurntableResult<Self> {
        let settings = Self::parse_json_path(path)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Deserialize without validating, for callers that overlay more values before
    /// calling [`ExportSettings::validate`].
    pub fn parse_json_str(json: &str) -> TurntableResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| TurntableError::validation(format!("invalid export settings: {e}")))
    }

    pub fn parse_json_path(path: &Path) -> TurntableResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read export settings '{}'", path.display()))?;
        Self::parse_json_str(&json)
    }

    pub fn validate(&self) -> TurntableResult<()> {
        self.schedule()?;
        self.gif_opts().validate()
    }

    pub fn schedule(&self) -> TurntableResult<Schedule> {
        Schedule::from_rate(self.fps, self.duration_secs, self.rotation)
    }

    pub fn gif_opts(&self) -> GifOpts {
        GifOpts {
            quality: self.gif_quality,
            workers: self.gif_workers,
            key: self.key_color,
        }
    }

    pub fn capture_opts(&self) -> CaptureOpts {
        CaptureOpts {
            settle: Duration::from_millis(self.settle_ms),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/settings.rs"]
mod tests;
