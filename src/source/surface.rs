use crate::foundation::core::{CanvasGeometry, Frame, PixelRect};
use crate::foundation::error::TurntableResult;

/// The rendering surface the capturer drives.
///
/// A source is a single-writer resource: the capturer borrows it mutably for the whole capture
/// sequence, so nothing else can rotate or read it between a rotation update and the snapshot
/// that follows it.
pub trait RasterSource {
    /// Size of the renderable surface, or `None` if nothing can be rendered yet.
    fn dimensions(&self) -> Option<CanvasGeometry>;

    /// Request the object be redrawn at `angle` radians about its vertical axis.
    ///
    /// Sources may apply this asynchronously; callers must allow a settle delay before reading
    /// pixels back.
    fn set_rotation(&mut self, angle: f64) -> TurntableResult<()>;

    /// Read back a sub-rectangle of the current surface as straight-alpha RGBA8.
    fn snapshot_pixels(&mut self, rect: PixelRect) -> TurntableResult<Frame>;
}

impl<S: RasterSource + ?Sized> RasterSource for Box<S> {
    fn dimensions(&self) -> Option<CanvasGeometry> {
        (**self).dimensions()
    }

    fn set_rotation(&mut self, angle: f64) -> TurntableResult<()> {
        (**self).set_rotation(angle)
    }

    fn snapshot_pixels(&mut self, rect: PixelRect) -> TurntableResult<Frame> {
        (**self).snapshot_pixels(rect)
    }
}
