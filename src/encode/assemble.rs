use crate::encode::{apng::encode_apng, gif::GifOpts, gif::encode_gif};
use crate::foundation::core::{CanvasGeometry, Frame};
use crate::foundation::error::{TurntableError, TurntableResult};

/// Output container, chosen per export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Animated PNG with native per-pixel alpha; frames are not composited.
    Apng,
    /// Animated GIF with a global palette and one keyed transparent entry.
    Gif,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Apng => "png",
            Self::Gif => "gif",
        }
    }

    /// Whether frames go through the key compositor before encoding.
    pub fn uses_key_compositing(self) -> bool {
        matches!(self, Self::Gif)
    }
}

/// Everything an encoder needs: ordered cropped frames, one delay per frame, shared geometry.
///
/// Built once per export and consumed by [`assemble`].
#[derive(Clone, Debug)]
pub struct ExportResult {
    frames: Vec<Frame>,
    delays_ms: Vec<u32>,
    geometry: CanvasGeometry,
}

impl ExportResult {
    /// Validate and bundle encoder input. Inconsistent input fails with `EncodeFailed`.
    pub fn new(frames: Vec<Frame>, delays_ms: Vec<u32>) -> TurntableResult<Self> {
        let first = frames
            .first()
            .ok_or_else(|| TurntableError::encode("no frames to encode"))?;
        if first.width == 0 || first.height == 0 {
            return Err(TurntableError::encode(format!(
                "degenerate {}x{} frame size",
                first.width, first.height
            )));
        }
        let geometry = first.geometry();
        if let Some(i) = frames.iter().position(|f| f.geometry() != geometry) {
            return Err(TurntableError::encode(format!(
                "frame {i} is {}x{}, expected {}x{}",
                frames[i].width, frames[i].height, geometry.width, geometry.height
            )));
        }
        if delays_ms.len() != frames.len() {
            return Err(TurntableError::encode(format!(
                "{} delays for {} frames",
                delays_ms.len(),
                frames.len()
            )));
        }
        if delays_ms.contains(&0) {
            return Err(TurntableError::encode("frame delays must be >= 1ms"));
        }
        Ok(Self {
            frames,
            delays_ms,
            geometry,
        })
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn delays_ms(&self) -> &[u32] {
        &self.delays_ms
    }

    pub fn geometry(&self) -> CanvasGeometry {
        self.geometry
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Give the frames back, e.g. to dump them as stills.
    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}

/// Encode `result` into a complete file image. Nothing is returned on failure.
#[tracing::instrument(skip_all, fields(format = ?format, frames = result.len()))]
pub fn assemble(
    result: ExportResult,
    format: OutputFormat,
    gif: &GifOpts,
) -> TurntableResult<Vec<u8>> {
    let bytes = match format {
        OutputFormat::Apng => encode_apng(&result)?,
        OutputFormat::Gif => encode_gif(&result, gif)?,
    };
    tracing::debug!(bytes = bytes.len(), "encoded");
    Ok(bytes)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/assemble.rs"]
mod tests;
