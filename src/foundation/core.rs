use crate::foundation::error::{TurntableError, TurntableResult};

/// A straight-alpha RGBA8 raster (4 bytes per pixel, row-major, top-left origin).
///
/// The export pipeline never edits a captured frame; compositing and cropping build new ones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, un-premultiplied.
    pub data: Vec<u8>,
}

impl Frame {
    /// Wrap `data`, checking it holds exactly `width * height` pixels.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> TurntableResult<Self> {
        let expected = rgba_len(width, height)?;
        if data.len() != expected {
            return Err(TurntableError::validation(format!(
                "frame data length {} does not match {width}x{height} rgba8 ({expected} bytes)",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A fully transparent frame.
    pub fn blank(width: u32, height: u32) -> TurntableResult<Self> {
        let len = rgba_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; len],
        })
    }

    pub fn geometry(&self) -> CanvasGeometry {
        CanvasGeometry {
            width: self.width,
            height: self.height,
        }
    }

    /// RGBA of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// If `(x, y)` lies outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Alpha of the pixel at `(x, y)`. Panics like [`Frame::pixel`].
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.data[self.offset(x, y) + 3]
    }

    #[cfg(test)]
    pub(crate) fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = self.offset(x, y);
        self.data[i..i + 4].copy_from_slice(&rgba);
    }

    /// One row of pixels as raw bytes.
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.width as usize * 4;
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    /// Copy into an [`image::RgbaImage`] for PNG dumps.
    pub fn to_rgba_image(&self) -> TurntableResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| TurntableError::validation("frame buffer too small for its dimensions"))
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x},{y}) out of bounds"
        );
        (y as usize * self.width as usize + x as usize) * 4
    }
}

fn rgba_len(width: u32, height: u32) -> TurntableResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(4))
        .ok_or_else(|| TurntableError::validation("frame dimensions overflow"))
}

/// Axis-aligned pixel rectangle. `x + width` and `y + height` are exclusive edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning the inclusive corners `(min_x, min_y)`..=`(max_x, max_y)`.
    pub fn from_inclusive(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Self {
        Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        }
    }

    pub fn right(self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(self) -> u32 {
        self.y + self.height
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(self, x: u32, y: u32) -> bool {
        self.x <= x && x < self.right() && self.y <= y && y < self.bottom()
    }

    /// Whether `other` lies entirely inside `self`.
    pub fn contains_rect(self, other: PixelRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// Reserved chroma-key color substituted for transparent pixels on the palette path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct KeyColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl KeyColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// The key as a fully opaque RGBA8 pixel.
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }

    pub fn matches(self, px: &[u8]) -> bool {
        px[0] == self.r && px[1] == self.g && px[2] == self.b
    }
}

impl Default for KeyColor {
    fn default() -> Self {
        Self::new(0, 255, 0)
    }
}

/// Pixel dimensions shared by every frame of one export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CanvasGeometry {
    pub width: u32,
    pub height: u32,
}

impl CanvasGeometry {
    pub fn new(width: u32, height: u32) -> TurntableResult<Self> {
        if width == 0 || height == 0 {
            return Err(TurntableError::validation(
                "canvas width/height must be non-zero",
            ));
        }
        Ok(Self { width, height })
    }

    /// Size a canvas for content with the given `aspect` (width / height).
    ///
    /// The longer side becomes `round(base * padding)`; the shorter one follows the aspect.
    pub fn fit(base: u32, aspect: f64, padding: f64) -> TurntableResult<Self> {
        if !aspect.is_finite() || aspect <= 0.0 {
            return Err(TurntableError::validation(
                "content aspect ratio must be finite and > 0",
            ));
        }
        if !padding.is_finite() || padding <= 0.0 {
            return Err(TurntableError::validation(
                "canvas padding multiplier must be finite and > 0",
            ));
        }
        let long = (f64::from(base) * padding).round().max(1.0);
        let (w, h) = if aspect >= 1.0 {
            (long, (long / aspect).round())
        } else {
            ((long * aspect).round(), long)
        };
        Self::new(clamp_dim(w), clamp_dim(h))
    }

    pub fn full_rect(self) -> PixelRect {
        PixelRect::new(0, 0, self.width, self.height)
    }

    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }
}

fn clamp_dim(v: f64) -> u32 {
    v.clamp(1.0, f64::from(u32::MAX)) as u32
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
