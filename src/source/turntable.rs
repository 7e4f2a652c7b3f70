use vello_cpu::kurbo::{Affine, Circle, Rect, RoundedRect, Shape};
use vello_cpu::peniko::Color;

use crate::foundation::core::{CanvasGeometry, Frame, PixelRect};
use crate::foundation::error::{TurntableError, TurntableResult};
use crate::source::surface::RasterSource;

/// Longest label the logo renders; extra characters are ignored.
pub const MAX_LABEL_CHARS: usize = 12;

const TILE_W: f64 = 1.0;
const TILE_H: f64 = 1.25;
const TILE_GAP: f64 = 0.15;
const PATH_TOLERANCE: f64 = 1e-3;

/// What the built-in turntable draws: a row of bevelled glyph tiles, one per label character.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LogoScene {
    pub label: String,
    /// Longer canvas side before padding, in pixels.
    pub base_size: u32,
    /// Uniform canvas padding multiplier (> 1 leaves room around the logo).
    pub padding: f64,
    pub color: [u8; 3],
    /// Fixed forward tilt about the horizontal axis, radians.
    pub tilt: f64,
}

impl Default for LogoScene {
    fn default() -> Self {
        Self {
            label: "GHOST".to_string(),
            base_size: 320,
            padding: 1.15,
            color: [0xff, 0x44, 0x00],
            tilt: 0.1,
        }
    }
}

impl LogoScene {
    fn glyphs(&self) -> Vec<char> {
        self.label.chars().take(MAX_LABEL_CHARS).collect()
    }

    fn slots(&self) -> usize {
        self.glyphs().len().max(1)
    }

    /// Unrotated logo width in scene units.
    fn logo_width(&self) -> f64 {
        let n = self.slots() as f64;
        n * TILE_W + (n - 1.0) * TILE_GAP
    }

    /// Width / height of the unrotated logo.
    pub fn aspect(&self) -> f64 {
        self.logo_width() / TILE_H
    }
}

/// CPU rasterizer for a [`LogoScene`] spinning about its vertical axis.
///
/// Rendering is synchronous: `set_rotation` redraws immediately. Wrap it in
/// [`crate::ThreadedSource`] to get a source that renders off the capturing thread.
pub struct TurntableSource {
    scene: LogoScene,
    geometry: CanvasGeometry,
    angle: f64,
    pixmap: vello_cpu::Pixmap,
}

impl std::fmt::Debug for TurntableSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurntableSource")
            .field("scene", &self.scene)
            .field("geometry", &self.geometry)
            .field("angle", &self.angle)
            .finish_non_exhaustive()
    }
}

impl TurntableSource {
    pub fn new(scene: LogoScene) -> TurntableResult<Self> {
        let geometry = CanvasGeometry::fit(scene.base_size, scene.aspect(), scene.padding)?;
        let (w, h) = surface_size(geometry)?;
        let mut source = Self {
            scene,
            geometry,
            angle: 0.0,
            pixmap: vello_cpu::Pixmap::new(w, h),
        };
        source.redraw()?;
        Ok(source)
    }

    pub fn scene(&self) -> &LogoScene {
        &self.scene
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    fn redraw(&mut self) -> TurntableResult<()> {
        let (w, h) = surface_size(self.geometry)?;
        let mut ctx = vello_cpu::RenderContext::new(w, h);

        let facing = self.angle.cos();
        let shade = if facing >= 0.0 {
            0.55 + 0.45 * facing
        } else {
            (0.55 + 0.45 * facing.abs()) * 0.6
        };
        // A zero horizontal scale is a singular transform; keep a sliver with the right sign.
        let sx = if facing.abs() < 1e-3 {
            1e-3_f64.copysign(facing)
        } else {
            facing
        };

        let logo_w = self.scene.logo_width();
        let fit = (f64::from(self.geometry.width) / (logo_w * self.scene.padding))
            .min(f64::from(self.geometry.height) / (TILE_H * self.scene.padding));
        let center = (
            f64::from(self.geometry.width) / 2.0,
            f64::from(self.geometry.height) / 2.0,
        );
        let transform = Affine::translate(center)
            * Affine::scale_non_uniform(fit * sx, fit * self.scene.tilt.cos())
            * Affine::translate((-logo_w / 2.0, -TILE_H / 2.0));
        ctx.set_transform(transform);

        let [r, g, b] = self.scene.color;
        let body = shaded(r, g, b, shade);
        let bevel = shaded(
            r.saturating_add(40),
            g.saturating_add(40),
            b.saturating_add(40),
            shade,
        );
        let ink = shaded(r / 4, g / 4, b / 4, shade);

        for (slot, glyph) in self.scene.glyphs().into_iter().enumerate() {
            if glyph.is_whitespace() {
                continue;
            }
            let x0 = slot as f64 * (TILE_W + TILE_GAP);

            ctx.set_paint(body);
            ctx.fill_path(&RoundedRect::new(x0, 0.0, x0 + TILE_W, TILE_H, 0.18).to_path(PATH_TOLERANCE));

            ctx.set_paint(bevel);
            ctx.fill_path(
                &RoundedRect::new(x0 + 0.08, 0.08, x0 + TILE_W - 0.08, TILE_H - 0.08, 0.12)
                    .to_path(PATH_TOLERANCE),
            );

            // Off-center marks make a mirrored (back-facing) tile distinguishable.
            ctx.set_paint(ink);
            ctx.fill_path(&Circle::new((x0 + 0.32, 0.45), 0.16).to_path(PATH_TOLERANCE));
            let bar_y = 0.7 + f64::from(u32::from(glyph) % 3) * 0.12;
            ctx.fill_rect(&Rect::new(x0 + 0.22, bar_y, x0 + 0.82, bar_y + 0.1));
        }

        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);
        self.pixmap = pixmap;
        Ok(())
    }
}

impl RasterSource for TurntableSource {
    fn dimensions(&self) -> Option<CanvasGeometry> {
        Some(self.geometry)
    }

    fn set_rotation(&mut self, angle: f64) -> TurntableResult<()> {
        if !angle.is_finite() {
            return Err(TurntableError::validation("rotation angle must be finite"));
        }
        self.angle = angle;
        self.redraw()
    }

    fn snapshot_pixels(&mut self, rect: PixelRect) -> TurntableResult<Frame> {
        if rect.is_empty() || !self.geometry.full_rect().contains_rect(rect) {
            return Err(TurntableError::validation(format!(
                "snapshot rect {rect:?} outside {}x{} surface",
                self.geometry.width, self.geometry.height
            )));
        }
        let premul = self.pixmap.data_as_u8_slice();
        let stride = self.geometry.width as usize * 4;
        let mut data = Vec::with_capacity(rect.width as usize * rect.height as usize * 4);
        for y in rect.y..rect.bottom() {
            let start = y as usize * stride + rect.x as usize * 4;
            let row = &premul[start..start + rect.width as usize * 4];
            for px in row.chunks_exact(4) {
                data.extend_from_slice(&unpremultiply([px[0], px[1], px[2], px[3]]));
            }
        }
        Frame::new(rect.width, rect.height, data)
    }
}

fn surface_size(geometry: CanvasGeometry) -> TurntableResult<(u16, u16)> {
    let w: u16 = geometry
        .width
        .try_into()
        .map_err(|_| TurntableError::validation("surface width exceeds u16"))?;
    let h: u16 = geometry
        .height
        .try_into()
        .map_err(|_| TurntableError::validation("surface height exceeds u16"))?;
    Ok((w, h))
}

fn shaded(r: u8, g: u8, b: u8, shade: f64) -> Color {
    let s = |c: u8| (f64::from(c) * shade).round().clamp(0.0, 255.0) as u8;
    Color::from_rgba8(s(r), s(g), s(b), 255)
}

pub(crate) fn unpremultiply(px: [u8; 4]) -> [u8; 4] {
    let a = px[3];
    if a == 0 {
        return [0, 0, 0, 0];
    }
    if a == 255 {
        return px;
    }
    let un = |c: u8| ((u32::from(c) * 255 + u32::from(a) / 2) / u32::from(a)).min(255) as u8;
    [un(px[0]), un(px[1]), un(px[2]), a]
}

#[cfg(test)]
#[path = "../../tests/unit/source/turntable.rs"]
mod tests;
