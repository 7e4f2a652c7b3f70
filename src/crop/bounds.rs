use rayon::prelude::*;

use crate::foundation::core::{CanvasGeometry, Frame, PixelRect};
use crate::foundation::error::{TurntableError, TurntableResult};

/// Inclusive `(min_x, min_y, max_x, max_y)` of content pixels.
type Extent = (u32, u32, u32, u32);

/// Union of every pixel with `alpha >= cutoff` across all `frames`. Fully transparent pixels
/// never count, even with a zero cutoff.
///
/// Measure on straight-alpha frames, before any key substitution: keyed background pixels are
/// opaque and would otherwise count as content. When nothing qualifies the whole canvas is
/// returned, so no crop is applied.
pub fn compute_bounds(frames: &[Frame], cutoff: u8) -> TurntableResult<PixelRect> {
    let geometry = shared_geometry(frames)?;
    let extent = frames
        .par_iter()
        .map(|f| frame_extent(f, cutoff))
        .reduce(|| None, union);

    Ok(match extent {
        Some((x0, y0, x1, y1)) => PixelRect::from_inclusive(x0, y0, x1, y1),
        None => geometry.full_rect(),
    })
}

/// Grow `rect` by `padding` pixels on every side, clamped to the canvas.
pub fn pad_rect(rect: PixelRect, padding: u32, canvas: CanvasGeometry) -> PixelRect {
    let x0 = rect.x.saturating_sub(padding);
    let y0 = rect.y.saturating_sub(padding);
    let x1 = rect.right().saturating_add(padding).min(canvas.width);
    let y1 = rect.bottom().saturating_add(padding).min(canvas.height);
    PixelRect::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
}

/// Copy `rect` out of `frame` into a new frame of the rectangle's size.
pub fn crop_frame(frame: &Frame, rect: PixelRect) -> TurntableResult<Frame> {
    if rect.is_empty() {
        return Err(TurntableError::validation("crop rectangle has zero area"));
    }
    if !frame.geometry().full_rect().contains_rect(rect) {
        return Err(TurntableError::validation(format!(
            "crop rectangle {rect:?} exceeds {}x{} frame",
            frame.width, frame.height
        )));
    }
    let x0 = rect.x as usize * 4;
    let x1 = rect.right() as usize * 4;
    let mut data = Vec::with_capacity(rect.width as usize * rect.height as usize * 4);
    for y in rect.y..rect.bottom() {
        data.extend_from_slice(&frame.row(y)[x0..x1]);
    }
    Frame::new(rect.width, rect.height, data)
}

/// Crop every frame with the same rectangle.
pub fn crop_frames(frames: &[Frame], rect: PixelRect) -> TurntableResult<Vec<Frame>> {
    frames.par_iter().map(|f| crop_frame(f, rect)).collect()
}

fn shared_geometry(frames: &[Frame]) -> TurntableResult<CanvasGeometry> {
    let first = frames
        .first()
        .ok_or_else(|| TurntableError::validation("cannot bound an empty frame sequence"))?;
    let geometry = first.geometry();
    if frames.iter().any(|f| f.geometry() != geometry) {
        return Err(TurntableError::validation(
            "all frames must share one canvas geometry",
        ));
    }
    Ok(geometry)
}

fn frame_extent(frame: &Frame, cutoff: u8) -> Option<Extent> {
    let cutoff = cutoff.max(1);
    let mut extent: Option<Extent> = None;
    for y in 0..frame.height {
        let row = frame.row(y);
        let mut hits = row
            .chunks_exact(4)
            .enumerate()
            .filter(|(_, px)| px[3] >= cutoff)
            .map(|(x, _)| x as u32);
        let Some(first) = hits.next() else {
            continue;
        };
        let last = hits.last().unwrap_or(first);
        extent = union(extent, Some((first, y, last, y)));
    }
    extent
}

fn union(a: Option<Extent>, b: Option<Extent>) -> Option<Extent> {
    match (a, b) {
        (Some(a), Some(b)) => Some((a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3))),
        (a, None) => a,
        (None, b) => b,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/crop/bounds.rs"]
mod tests;
