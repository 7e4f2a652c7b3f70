use std::time::Duration;

use crate::capture::progress::{ProgressEvent, ProgressObserver};
use crate::foundation::core::Frame;
use crate::foundation::error::{TurntableError, TurntableResult};
use crate::source::surface::RasterSource;
use crate::timing::schedule::Schedule;

/// Capture tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureOpts {
    /// Wait between posting a rotation and reading pixels back, giving an asynchronous source
    /// time to redraw. The capturing thread blocks for the whole wait; zero still yields once.
    pub settle: Duration,
}

impl Default for CaptureOpts {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(40),
        }
    }
}

/// Pulls one frame per schedule step out of a [`RasterSource`], strictly in order.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameCapturer {
    opts: CaptureOpts,
}

impl FrameCapturer {
    pub fn new(opts: CaptureOpts) -> Self {
        Self { opts }
    }

    pub fn opts(&self) -> CaptureOpts {
        self.opts
    }

    /// Capture every step of `schedule`.
    ///
    /// The source is borrowed exclusively until the last frame has been copied out. Returns
    /// exactly `schedule.frame_count()` frames of identical geometry, or an error and no frames.
    #[tracing::instrument(skip_all, fields(frames = schedule.frame_count()))]
    pub fn capture<S>(
        &self,
        source: &mut S,
        schedule: &Schedule,
        progress: &mut dyn ProgressObserver,
    ) -> TurntableResult<Vec<Frame>>
    where
        S: RasterSource + ?Sized,
    {
        let geometry = source.dimensions().ok_or_else(|| {
            TurntableError::source_unavailable("no renderable surface at capture start")
        })?;
        let full = geometry.full_rect();
        let total = schedule.frame_count();
        progress.on_progress(&ProgressEvent::CaptureStarted { total });

        let mut frames = Vec::with_capacity(total as usize);
        for index in 0..total {
            let angle = schedule.rotation_at(index);
            source.set_rotation(angle)?;
            self.settle();

            let frame = source.snapshot_pixels(full)?;
            if frame.geometry() != geometry {
                return Err(TurntableError::source_unavailable(format!(
                    "surface changed size mid-capture: {}x{} -> {}x{}",
                    geometry.width, geometry.height, frame.width, frame.height
                )));
            }
            frames.push(frame);

            tracing::debug!(index, angle, "captured frame");
            progress.on_progress(&ProgressEvent::FrameCaptured {
                index,
                total,
                percent: f64::from(index + 1) * 100.0 / f64::from(total),
            });
        }
        Ok(frames)
    }

    fn settle(&self) {
        if self.opts.settle.is_zero() {
            std::thread::yield_now();
        } else {
            std::thread::sleep(self.opts.settle);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/capturer.rs"]
mod tests;
