use std::borrow::Cow;

use color_quant::NeuQuant;
use rayon::prelude::*;

use crate::encode::assemble::ExportResult;
use crate::foundation::core::{Frame, KeyColor};
use crate::foundation::error::{TurntableError, TurntableResult};

/// Palette slot reserved for the key color and flagged transparent in every frame.
pub const TRANSPARENT_INDEX: u8 = 255;

const LEARNED_COLORS: usize = 255;
const MAX_TRAINING_PIXELS: usize = 1 << 20;

/// Palette-path knobs. Quality and workers trade speed for size; they never change which pixels
/// end up transparent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GifOpts {
    /// NeuQuant sampling factor, 1 (best) ..= 30 (fastest).
    pub quality: u8,
    /// Threads used to map pixels onto the palette.
    pub workers: usize,
    pub key: KeyColor,
}

impl Default for GifOpts {
    fn default() -> Self {
        Self {
            quality: 10,
            workers: 2,
            key: KeyColor::default(),
        }
    }
}

impl GifOpts {
    pub fn validate(&self) -> TurntableResult<()> {
        if !(1..=30).contains(&self.quality) {
            return Err(TurntableError::validation(format!(
                "gif quality must be within 1..=30, got {}",
                self.quality
            )));
        }
        if self.workers == 0 {
            return Err(TurntableError::validation("gif workers must be >= 1"));
        }
        Ok(())
    }
}

/// One color table shared by every frame, with the key color pinned at [`TRANSPARENT_INDEX`].
pub struct GlobalPalette {
    quant: NeuQuant,
    rgb: Vec<u8>,
    key: KeyColor,
}

impl GlobalPalette {
    /// Learn 255 colors from the non-key pixels of all frames.
    pub fn learn(frames: &[Frame], key: KeyColor, quality: u8) -> Self {
        let total: usize = frames.iter().map(|f| f.data.len() / 4).sum();
        let step = total.div_ceil(MAX_TRAINING_PIXELS).max(1);

        let mut training = Vec::with_capacity(total.min(MAX_TRAINING_PIXELS) * 4);
        let pixels = frames.iter().flat_map(|f| f.data.chunks_exact(4));
        for px in pixels.step_by(step) {
            if !is_keyed(px, key) {
                training.extend_from_slice(px);
            }
        }
        if training.is_empty() {
            training.extend_from_slice(&[0, 0, 0, 255]);
        }

        let quant = NeuQuant::new(i32::from(quality), LEARNED_COLORS, &training);
        let mut rgb = quant.color_map_rgb();
        rgb.extend_from_slice(&[key.r, key.g, key.b]);
        Self { quant, rgb, key }
    }

    /// 256 RGB triples.
    pub fn rgb(&self) -> &[u8] {
        &self.rgb
    }

    pub fn index_of(&self, px: &[u8]) -> u8 {
        if is_keyed(px, self.key) {
            TRANSPARENT_INDEX
        } else {
            self.quant.index_of(px) as u8
        }
    }

    pub fn index_frame(&self, frame: &Frame) -> Vec<u8> {
        frame
            .data
            .chunks_exact(4)
            .map(|px| self.index_of(px))
            .collect()
    }
}

fn is_keyed(px: &[u8], key: KeyColor) -> bool {
    px[3] == 0 || key.matches(px)
}

/// Encode as an animated GIF with a global palette and keyed transparency. Loops forever.
pub fn encode_gif(result: &ExportResult, opts: &GifOpts) -> TurntableResult<Vec<u8>> {
    opts.validate()
        .map_err(|e| TurntableError::encode(e.to_string()))?;
    let geometry = result.geometry();
    let width: u16 = geometry.width.try_into().map_err(|_| {
        TurntableError::encode(format!("gif width {} exceeds 65535", geometry.width))
    })?;
    let height: u16 = geometry.height.try_into().map_err(|_| {
        TurntableError::encode(format!("gif height {} exceeds 65535", geometry.height))
    })?;

    let palette = GlobalPalette::learn(result.frames(), opts.key, opts.quality);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.workers)
        .build()
        .map_err(|e| TurntableError::encode(format!("failed to build gif worker pool: {e}")))?;
    let indexed: Vec<Vec<u8>> = pool.install(|| {
        result
            .frames()
            .par_iter()
            .map(|f| palette.index_frame(f))
            .collect()
    });

    let mut out = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut out, width, height, palette.rgb()).map_err(gif_err)?;
        encoder.set_repeat(gif::Repeat::Infinite).map_err(gif_err)?;
        for (buffer, &delay_ms) in indexed.into_iter().zip(result.delays_ms()) {
            let frame = gif::Frame {
                width,
                height,
                buffer: Cow::Owned(buffer),
                delay: centiseconds(delay_ms)?,
                transparent: Some(TRANSPARENT_INDEX),
                dispose: gif::DisposalMethod::Background,
                ..gif::Frame::default()
            };
            encoder.write_frame(&frame).map_err(gif_err)?;
        }
    }
    Ok(out)
}

/// GIF delays are hundredths of a second; never round a frame down to zero.
pub fn centiseconds(delay_ms: u32) -> TurntableResult<u16> {
    let cs = (delay_ms.saturating_add(5) / 10).max(1);
    cs.try_into()
        .map_err(|_| TurntableError::encode(format!("frame delay {delay_ms}ms exceeds GIF range")))
}

fn gif_err(e: gif::EncodingError) -> TurntableError {
    TurntableError::encode(format!("gif: {e}"))
}

#[cfg(test)]
#[path = "../../tests/unit/encode/gif.rs"]
mod tests;
