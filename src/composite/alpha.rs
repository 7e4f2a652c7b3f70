use rayon::prelude::*;

use crate::foundation::core::{Frame, KeyColor};

/// Alpha at or above which a pixel counts as part of the rendered object.
pub const DEFAULT_ALPHA_CUTOFF: u8 = 230;

/// Collapse one straight-alpha pixel to a binary opaque result.
///
/// - `a == 255`: unchanged.
/// - `a == 0` or `a < cutoff`: replaced by the opaque key color.
/// - otherwise: color composited onto black (`c * a / 255`, rounded), alpha forced to 255.
///
/// The cutoff is checked before compositing, so with the default cutoff of 230 a half
/// transparent pixel such as `(200, 100, 50, 128)` is keyed, not darkened to
/// `(100, 50, 25, 255)`. Pass a cutoff at or below the pixel's alpha to get the darkened color.
pub fn composite_pixel(px: [u8; 4], cutoff: u8, key: KeyColor) -> [u8; 4] {
    let a = px[3];
    if a == 255 {
        return px;
    }
    if a == 0 || a < cutoff {
        return key.to_rgba();
    }
    [
        mul_div255(px[0], a),
        mul_div255(px[1], a),
        mul_div255(px[2], a),
        255,
    ]
}

pub fn composite_in_place(data: &mut [u8], cutoff: u8, key: KeyColor) {
    for px in data.chunks_exact_mut(4) {
        let out = composite_pixel([px[0], px[1], px[2], px[3]], cutoff, key);
        px.copy_from_slice(&out);
    }
}

/// Keyed copy of `frame`; every output pixel is fully opaque.
pub fn composite_frame(frame: &Frame, cutoff: u8, key: KeyColor) -> Frame {
    let mut out = frame.clone();
    composite_in_place(&mut out.data, cutoff, key);
    out
}

/// [`composite_frame`] over a whole animation, frames processed in parallel.
pub fn composite_frames(frames: &[Frame], cutoff: u8, key: KeyColor) -> Vec<Frame> {
    frames
        .par_iter()
        .map(|f| composite_frame(f, cutoff, key))
        .collect()
}

fn mul_div255(c: u8, a: u8) -> u8 {
    ((u32::from(c) * u32::from(a) + 127) / 255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/composite/alpha.rs"]
mod tests;
