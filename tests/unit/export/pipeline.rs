use std::thread;

use crossbeam_channel::{Receiver, Sender, bounded};

use super::*;
use crate::capture::progress::{NoProgress, ProgressLog};
use crate::foundation::core::Frame;

const W: u32 = 16;
const H: u32 = 12;

/// A 2x2 opaque block that slides right as the angle grows, with a faint halo on its left
/// (alpha 100) and a strong edge on its right (alpha 240).
struct StampSource {
    angle: f64,
    available: bool,
    fail_on_snapshot: Option<usize>,
    snapshots: usize,
}

impl StampSource {
    fn new() -> Self {
        Self {
            angle: 0.0,
            available: true,
            fail_on_snapshot: None,
            snapshots: 0,
        }
    }

    fn block_x(&self) -> u32 {
        4 + (self.angle * 2.0).round() as u32
    }
}

impl RasterSource for StampSource {
    fn dimensions(&self) -> Option<CanvasGeometry> {
        self.available
            .then(|| CanvasGeometry::new(W, H).unwrap())
    }

    fn set_rotation(&mut self, angle: f64) -> TurntableResult<()> {
        self.angle = angle;
        Ok(())
    }

    fn snapshot_pixels(&mut self, rect: PixelRect) -> TurntableResult<Frame> {
        self.snapshots += 1;
        if self.fail_on_snapshot == Some(self.snapshots) {
            return Err(TurntableError::source_unavailable("surface lost"));
        }
        let mut f = Frame::blank(rect.width, rect.height)?;
        let x = self.block_x();
        for dy in 0..2 {
            for dx in 0..2 {
                f.set_pixel(x + dx, 5 + dy, [200, 80, 20, 255]);
            }
        }
        f.set_pixel(x - 1, 5, [200, 80, 20, 100]);
        f.set_pixel(x + 2, 5, [200, 80, 20, 240]);
        Ok(f)
    }
}

/// Blocks inside the first rotation until released.
struct GatedSource {
    inner: StampSource,
    started: Sender<()>,
    release: Receiver<()>,
    waited: bool,
}

impl RasterSource for GatedSource {
    fn dimensions(&self) -> Option<CanvasGeometry> {
        self.inner.dimensions()
    }

    fn set_rotation(&mut self, angle: f64) -> TurntableResult<()> {
        if !self.waited {
            self.waited = true;
            self.started.send(()).unwrap();
            self.release.recv().unwrap();
        }
        self.inner.set_rotation(angle)
    }

    fn snapshot_pixels(&mut self, rect: PixelRect) -> TurntableResult<Frame> {
        self.inner.snapshot_pixels(rect)
    }
}

fn settings() -> ExportSettings {
    ExportSettings {
        fps: 4.0,
        duration_secs: 1.0,
        padding_px: 1,
        settle_ms: 0,
        ..ExportSettings::default()
    }
}

#[test]
fn prepare_crops_every_frame_to_shared_bounds() {
    let exporter = Exporter::new();
    let (result, crop) = exporter
        .prepare(&mut StampSource::new(), &settings(), OutputFormat::Apng, &mut NoProgress)
        .unwrap();

    // Blocks at x = 4, 7, 10, 13; strong edge one past each; halo excluded.
    assert_eq!(crop, PixelRect::new(3, 4, 13, 4));
    assert_eq!(result.len(), 4);
    assert!(
        result
            .frames()
            .iter()
            .all(|f| (f.width, f.height) == (13, 4))
    );
    assert_eq!(result.delays_ms(), &[250, 250, 250, 250]);
}

#[test]
fn apng_path_keeps_true_alpha() {
    let exporter = Exporter::new();
    let (result, _) = exporter
        .prepare(&mut StampSource::new(), &settings(), OutputFormat::Apng, &mut NoProgress)
        .unwrap();
    let first = &result.frames()[0];
    // Block at capture x=4 -> crop x=1; halo at capture x=3 -> crop x=0.
    assert_eq!(first.pixel(1, 1), [200, 80, 20, 255]);
    assert_eq!(first.pixel(0, 1), [200, 80, 20, 100]);
    assert_eq!(first.pixel(3, 1), [200, 80, 20, 240]);
    assert_eq!(first.pixel(12, 3), [0, 0, 0, 0]);
}

#[test]
fn gif_path_is_key_composited_before_cropping() {
    let exporter = Exporter::new();
    let (result, _) = exporter
        .prepare(&mut StampSource::new(), &settings(), OutputFormat::Gif, &mut NoProgress)
        .unwrap();
    let first = &result.frames()[0];
    assert_eq!(first.pixel(1, 1), [200, 80, 20, 255]);
    assert_eq!(first.pixel(0, 1), [0, 255, 0, 255]);
    assert_eq!(first.pixel(3, 1), [188, 75, 19, 255]);
    assert_eq!(first.pixel(12, 3), [0, 255, 0, 255]);
    assert!(first.data.chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn export_reports_progress_and_artifact_metadata() {
    let exporter = Exporter::new();
    let mut log = ProgressLog::new();
    let artifact = exporter
        .export(&mut StampSource::new(), &settings(), OutputFormat::Gif, &mut log)
        .unwrap();

    assert_eq!(artifact.format, OutputFormat::Gif);
    assert_eq!(artifact.frame_count, 4);
    assert_eq!(artifact.delay_ms, 250);
    assert_eq!(artifact.canvas, CanvasGeometry::new(W, H).unwrap());
    assert_eq!(&artifact.bytes[..6], b"GIF89a");

    assert_eq!(log.percents(), vec![25.0, 50.0, 75.0, 100.0]);
    assert!(matches!(
        log.events.last(),
        Some(ProgressEvent::Finished {
            format: OutputFormat::Gif,
            ..
        })
    ));
    assert!(!exporter.is_busy());
    assert_eq!(exporter.progress_percent(), 0);
}

#[test]
fn concurrent_export_is_rejected_without_disturbing_the_first() {
    let exporter = Exporter::new();
    let (started_tx, started_rx) = bounded(1);
    let (release_tx, release_rx) = bounded(1);

    let worker = {
        let exporter = exporter.clone();
        thread::spawn(move || {
            let mut source = GatedSource {
                inner: StampSource::new(),
                started: started_tx,
                release: release_rx,
                waited: false,
            };
            exporter.export(&mut source, &settings(), OutputFormat::Apng, &mut NoProgress)
        })
    };

    started_rx.recv().unwrap();
    assert!(exporter.is_busy());
    for format in [OutputFormat::Apng, OutputFormat::Gif] {
        let err = exporter
            .export(&mut StampSource::new(), &settings(), format, &mut NoProgress)
            .unwrap_err();
        assert!(matches!(err, TurntableError::ExportAlreadyInProgress));
    }
    assert!(exporter.is_busy());

    release_tx.send(()).unwrap();
    let artifact = worker.join().unwrap().unwrap();
    assert_eq!(artifact.frame_count, 4);
    assert_eq!(artifact.crop, PixelRect::new(3, 4, 13, 4));
    assert!(!exporter.is_busy());

    // The gate is free again.
    exporter
        .export(&mut StampSource::new(), &settings(), OutputFormat::Apng, &mut NoProgress)
        .unwrap();
}

#[test]
fn missing_surface_fails_and_resets_gate() {
    let exporter = Exporter::new();
    let mut source = StampSource::new();
    source.available = false;
    let mut log = ProgressLog::new();

    let err = exporter
        .export(&mut source, &settings(), OutputFormat::Gif, &mut log)
        .unwrap_err();
    assert!(matches!(err, TurntableError::SourceUnavailable(_)));
    assert!(!exporter.is_busy());
    assert!(matches!(log.events.last(), Some(ProgressEvent::Failed { .. })));
}

#[test]
fn mid_capture_failure_resets_progress() {
    let exporter = Exporter::new();
    let mut source = StampSource::new();
    source.fail_on_snapshot = Some(3);
    let mut log = ProgressLog::new();

    assert!(
        exporter
            .export(&mut source, &settings(), OutputFormat::Apng, &mut log)
            .is_err()
    );
    assert_eq!(log.percents(), vec![25.0, 50.0]);
    assert_eq!(exporter.progress_percent(), 0);
    assert!(!exporter.is_busy());
}

#[test]
fn invalid_settings_fail_before_capture() {
    let exporter = Exporter::new();
    let mut source = StampSource::new();
    let bad = ExportSettings {
        fps: -1.0,
        ..settings()
    };
    assert!(matches!(
        exporter.export(&mut source, &bad, OutputFormat::Apng, &mut NoProgress),
        Err(TurntableError::Validation(_))
    ));
    assert_eq!(source.snapshots, 0);
}

#[test]
fn output_names_fall_back_and_sanitize() {
    assert_eq!(output_file_name(None, OutputFormat::Gif), "logo.gif");
    assert_eq!(output_file_name(Some("   "), OutputFormat::Apng), "logo.png");
    assert_eq!(
        output_file_name(Some(" my  logo/v2 "), OutputFormat::Gif),
        "my-logo-v2.gif"
    );
    assert_eq!(output_file_name(Some(".."), OutputFormat::Gif), "logo.gif");
    assert_eq!(output_file_name(Some("GHOST"), OutputFormat::Apng), "GHOST.png");
}

#[test]
fn write_artifact_leaves_only_the_final_file() {
    let dir = std::env::temp_dir().join(format!("turntable_write_{}", std::process::id()));
    let artifact = ExportArtifact {
        format: OutputFormat::Gif,
        bytes: b"GIF89a-test".to_vec(),
        canvas: CanvasGeometry::new(W, H).unwrap(),
        crop: PixelRect::new(0, 0, W, H),
        frame_count: 1,
        delay_ms: 33,
    };

    let path = write_artifact(&artifact, &dir, Some("ghost")).unwrap();
    assert_eq!(path, dir.join("ghost.gif"));
    assert_eq!(std::fs::read(&path).unwrap(), artifact.bytes);
    let names: Vec<_> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names.len(), 1);

    std::fs::remove_dir_all(&dir).unwrap();
}
