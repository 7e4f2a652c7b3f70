//! Turntable captures a rotating logo as a cropped, looping animation.
//!
//! # Pipeline overview
//!
//! 1. **Schedule**: fps and duration become `N` rotation angles and a per-frame delay.
//! 2. **Capture**: a [`RasterSource`] is rotated to each angle and its canvas is copied out.
//! 3. **Bound**: the union of every frame's content becomes one shared crop rectangle.
//! 4. **Composite** (GIF only): partial alpha is flattened onto a key color.
//! 5. **Encode**: cropped frames are written as an APNG or a GIF with a transparent key.
//!
//! Exports are serialized through an [`Exporter`]; a second request while one is running
//! fails fast with [`TurntableError::ExportAlreadyInProgress`].
//!
//! Pixels are straight (non-premultiplied) RGBA8 from capture onwards.
#![forbid(unsafe_code)]

mod capture;
mod composite;
mod crop;
mod encode;
mod export;
mod foundation;
mod source;
mod timing;

pub use capture::capturer::{CaptureOpts, FrameCapturer};
pub use capture::progress::{
    NoProgress, ProgressEvent, ProgressLog, ProgressObserver, TracingProgress,
};
pub use composite::alpha::{
    DEFAULT_ALPHA_CUTOFF, composite_frame, composite_frames, composite_in_place, composite_pixel,
};
pub use crop::bounds::{compute_bounds, crop_frame, crop_frames, pad_rect};
pub use encode::apng::encode_apng;
pub use encode::assemble::{ExportResult, OutputFormat, assemble};
pub use encode::gif::{GifOpts, GlobalPalette, TRANSPARENT_INDEX, centiseconds, encode_gif};
pub use export::pipeline::{
    DEFAULT_BASE_NAME, ExportArtifact, Exporter, output_file_name, write_artifact,
};
pub use export::settings::ExportSettings;
pub use foundation::core::{CanvasGeometry, Frame, KeyColor, PixelRect};
pub use foundation::error::{TurntableError, TurntableResult};
pub use source::surface::RasterSource;
pub use source::threaded::ThreadedSource;
pub use source::turntable::{LogoScene, MAX_LABEL_CHARS, TurntableSource};
pub use timing::schedule::{RotationMode, Schedule};
