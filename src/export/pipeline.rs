use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use anyhow::Context as _;

use crate::capture::capturer::FrameCapturer;
use crate::capture::progress::{ProgressEvent, ProgressObserver};
use crate::composite::alpha::composite_frames;
use crate::crop::bounds::{compute_bounds, crop_frames, pad_rect};
use crate::encode::assemble::{ExportResult, OutputFormat, assemble};
use crate::export::settings::ExportSettings;
use crate::foundation::core::{CanvasGeometry, PixelRect};
use crate::foundation::error::{TurntableError, TurntableResult};
use crate::source::surface::RasterSource;

/// File stem used when the caller supplies none.
pub const DEFAULT_BASE_NAME: &str = "logo";

/// Encoded animation plus what it was made from.
#[derive(Clone, Debug)]
pub struct ExportArtifact {
    pub format: OutputFormat,
    pub bytes: Vec<u8>,
    /// Capture canvas before cropping.
    pub canvas: CanvasGeometry,
    /// Crop rectangle applied to every frame, in capture-canvas pixels.
    pub crop: PixelRect,
    pub frame_count: usize,
    pub delay_ms: u32,
}

#[derive(Debug, Default)]
struct ExportGate {
    busy: AtomicBool,
    percent: AtomicU8,
}

/// Clears the busy flag and progress counter on every exit path.
struct GateGuard<'a>(&'a ExportGate);

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.0.percent.store(0, Ordering::Release);
        self.0.busy.store(false, Ordering::Release);
    }
}

/// Mirrors capture progress into the gate's counter before forwarding it.
struct GateObserver<'a, 'o> {
    gate: &'a ExportGate,
    inner: &'a mut (dyn ProgressObserver + 'o),
}

impl ProgressObserver for GateObserver<'_, '_> {
    fn on_progress(&mut self, event: &ProgressEvent) {
        if let ProgressEvent::FrameCaptured { percent, .. } = event {
            let pct = percent.round().clamp(0.0, 100.0) as u8;
            self.gate.percent.store(pct, Ordering::Release);
        }
        self.inner.on_progress(event);
    }
}

/// Runs exports one at a time.
///
/// Clones share the same gate, so a second export started through any clone while one is
/// running is rejected with [`TurntableError::ExportAlreadyInProgress`] and leaves the running
/// export untouched.
#[derive(Clone, Debug, Default)]
pub struct Exporter {
    gate: Arc<ExportGate>,
}

impl Exporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.gate.busy.load(Ordering::Acquire)
    }

    /// Capture progress of the running export, 0 when idle.
    pub fn progress_percent(&self) -> u8 {
        self.gate.percent.load(Ordering::Acquire)
    }

    /// Capture, composite, crop and encode one animation.
    #[tracing::instrument(skip_all, fields(format = ?format))]
    pub fn export<S>(
        &self,
        source: &mut S,
        settings: &ExportSettings,
        format: OutputFormat,
        observer: &mut dyn ProgressObserver,
    ) -> TurntableResult<ExportArtifact>
    where
        S: RasterSource + ?Sized,
    {
        let _guard = self.begin()?;
        let mut observer = GateObserver {
            gate: &self.gate,
            inner: observer,
        };
        let outcome = run_export(source, settings, format, &mut observer);
        match &outcome {
            Ok(artifact) => {
                tracing::info!(
                    bytes = artifact.bytes.len(),
                    frames = artifact.frame_count,
                    width = artifact.crop.width,
                    height = artifact.crop.height,
                    "export complete"
                );
            }
            Err(e) => observer.on_progress(&ProgressEvent::Failed {
                message: e.to_string(),
            }),
        }
        outcome
    }

    /// Capture and crop without encoding; the frames are returned instead.
    ///
    /// Holds the same gate as [`Exporter::export`].
    pub fn prepare<S>(
        &self,
        source: &mut S,
        settings: &ExportSettings,
        format: OutputFormat,
        observer: &mut dyn ProgressObserver,
    ) -> TurntableResult<(ExportResult, PixelRect)>
    where
        S: RasterSource + ?Sized,
    {
        let _guard = self.begin()?;
        let mut observer = GateObserver {
            gate: &self.gate,
            inner: observer,
        };
        prepare_frames(source, settings, format, &mut observer)
    }

    fn begin(&self) -> TurntableResult<GateGuard<'_>> {
        if self
            .gate
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("rejecting export: another export is running");
            return Err(TurntableError::ExportAlreadyInProgress);
        }
        self.gate.percent.store(0, Ordering::Release);
        Ok(GateGuard(&self.gate))
    }
}

fn run_export<S>(
    source: &mut S,
    settings: &ExportSettings,
    format: OutputFormat,
    observer: &mut dyn ProgressObserver,
) -> TurntableResult<ExportArtifact>
where
    S: RasterSource + ?Sized,
{
    let canvas = source.dimensions().ok_or_else(|| {
        TurntableError::source_unavailable("no renderable surface at export start")
    })?;
    let (result, crop) = prepare_frames(source, settings, format, observer)?;
    let frame_count = result.len();
    let delay_ms = result.delays_ms()[0];

    observer.on_progress(&ProgressEvent::EncodeStarted {
        format,
        frames: frame_count,
        width: crop.width,
        height: crop.height,
    });
    let bytes = assemble(result, format, &settings.gif_opts())?;
    observer.on_progress(&ProgressEvent::Finished {
        format,
        bytes: bytes.len(),
    });

    Ok(ExportArtifact {
        format,
        bytes,
        canvas,
        crop,
        frame_count,
        delay_ms,
    })
}

fn prepare_frames<S>(
    source: &mut S,
    settings: &ExportSettings,
    format: OutputFormat,
    observer: &mut dyn ProgressObserver,
) -> TurntableResult<(ExportResult, PixelRect)>
where
    S: RasterSource + ?Sized,
{
    settings.validate()?;
    let schedule = settings.schedule()?;
    let capturer = FrameCapturer::new(settings.capture_opts());
    let frames = capturer.capture(source, &schedule, observer)?;

    // Bounds come from the straight alpha; keyed pixels are opaque and would all count.
    let canvas = frames[0].geometry();
    let bounds = compute_bounds(&frames, settings.alpha_cutoff)?;
    let crop = pad_rect(bounds, settings.padding_px, canvas);
    tracing::debug!(?bounds, ?crop, "content bounds");

    let frames = if format.uses_key_compositing() {
        composite_frames(&frames, settings.alpha_cutoff, settings.key_color)
    } else {
        frames
    };
    let cropped = crop_frames(&frames, crop)?;
    drop(frames);

    let result = ExportResult::new(cropped, schedule.delays())?;
    Ok((result, crop))
}

/// `"<base>.<ext>"` with the base trimmed and made filesystem-safe; blank bases become
/// [`DEFAULT_BASE_NAME`].
pub fn output_file_name(base: Option<&str>, format: OutputFormat) -> String {
    let mut stem = String::new();
    let mut pending_dash = false;
    for c in base.unwrap_or("").trim().chars() {
        if c.is_whitespace() || matches!(c, '/' | '\\' | ':') {
            pending_dash = !stem.is_empty();
            continue;
        }
        if pending_dash {
            stem.push('-');
            pending_dash = false;
        }
        stem.push(c);
    }
    let stem = stem.trim_start_matches('.');
    let stem = if stem.is_empty() {
        DEFAULT_BASE_NAME
    } else {
        stem
    };
    format!("{stem}.{}", format.extension())
}

/// Write `artifact` into `dir` and return the final path.
///
/// The bytes go to a temporary sibling first and are renamed into place, so a failed write
/// never leaves a truncated animation behind.
pub fn write_artifact(
    artifact: &ExportArtifact,
    dir: &Path,
    base_name: Option<&str>,
) -> TurntableResult<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory '{}'", dir.display()))?;
    let path = dir.join(output_file_name(base_name, artifact.format));
    let tmp = path.with_extension(format!("{}.partial", artifact.format.extension()));

    let mut guard = TempFileGuard(Some(tmp.clone()));
    std::fs::write(&tmp, &artifact.bytes)
        .with_context(|| format!("failed to write '{}'", tmp.display()))?;
    std::fs::rename(&tmp, &path)
        .with_context(|| format!("failed to move output into '{}'", path.display()))?;
    guard.0 = None;
    Ok(path)
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/pipeline.rs"]
mod tests;
