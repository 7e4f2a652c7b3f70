use crate::encode::assemble::OutputFormat;

/// Advisory events published while an export runs.
///
/// Events never influence control flow; they exist so UIs and tests can follow along.
#[derive(Clone, Debug, PartialEq)]
pub enum ProgressEvent {
    /// Capture is about to pull `total` frames.
    CaptureStarted { total: u32 },
    /// Frame `index` (0-based) has been copied out of the source.
    FrameCaptured {
        index: u32,
        total: u32,
        /// Share of frames captured so far, 0..=100.
        percent: f64,
    },
    /// All frames are prepared and are being handed to the encoder.
    EncodeStarted {
        format: OutputFormat,
        frames: usize,
        width: u32,
        height: u32,
    },
    /// The encoder produced `bytes` bytes of output.
    Finished { format: OutputFormat, bytes: usize },
    /// The export aborted; no output was produced.
    Failed { message: String },
}

/// Receives [`ProgressEvent`]s.
pub trait ProgressObserver {
    fn on_progress(&mut self, event: &ProgressEvent);
}

impl<T: ProgressObserver + ?Sized> ProgressObserver for &mut T {
    fn on_progress(&mut self, event: &ProgressEvent) {
        (**self).on_progress(event);
    }
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _event: &ProgressEvent) {}
}

/// Records events in order; handy for headless callers and tests.
#[derive(Clone, Debug, Default)]
pub struct ProgressLog {
    pub events: Vec<ProgressEvent>,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Percentages reported by `FrameCaptured` events, in order.
    pub fn percents(&self) -> Vec<f64> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::FrameCaptured { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect()
    }
}

impl ProgressObserver for ProgressLog {
    fn on_progress(&mut self, event: &ProgressEvent) {
        self.events.push(event.clone());
    }
}

/// Forwards events over a channel. A disconnected receiver is ignored.
impl ProgressObserver for crossbeam_channel::Sender<ProgressEvent> {
    fn on_progress(&mut self, event: &ProgressEvent) {
        let _ = self.send(event.clone());
    }
}

/// Logs events through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingProgress;

impl ProgressObserver for TracingProgress {
    fn on_progress(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::CaptureStarted { total } => {
                tracing::info!(total, "capturing frames");
            }
            ProgressEvent::FrameCaptured {
                index,
                total,
                percent,
            } => {
                tracing::debug!(index, total, "captured {percent:.0}%");
            }
            ProgressEvent::EncodeStarted {
                format,
                frames,
                width,
                height,
            } => {
                tracing::info!(?format, frames, width, height, "encoding");
            }
            ProgressEvent::Finished { format, bytes } => {
                tracing::info!(?format, bytes, "export finished");
            }
            ProgressEvent::Failed { message } => {
                tracing::error!(%message, "export failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/progress.rs"]
mod tests;
