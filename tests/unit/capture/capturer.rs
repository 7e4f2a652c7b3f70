use super::*;
use crate::capture::progress::ProgressLog;
use crate::foundation::core::{CanvasGeometry, PixelRect};
use crate::timing::schedule::RotationMode;

/// Paints every pixel with the number of rotations applied so far.
struct CountingSource {
    geometry: Option<CanvasGeometry>,
    rotations: Vec<f64>,
    shrink_after: Option<usize>,
}

impl CountingSource {
    fn new(width: u32, height: u32) -> Self {
        Self {
            geometry: Some(CanvasGeometry::new(width, height).unwrap()),
            rotations: Vec::new(),
            shrink_after: None,
        }
    }
}

impl RasterSource for CountingSource {
    fn dimensions(&self) -> Option<CanvasGeometry> {
        self.geometry
    }

    fn set_rotation(&mut self, angle: f64) -> TurntableResult<()> {
        self.rotations.push(angle);
        Ok(())
    }

    fn snapshot_pixels(&mut self, rect: PixelRect) -> TurntableResult<Frame> {
        let n = self.rotations.len();
        let (w, h) = match self.shrink_after {
            Some(limit) if n > limit => (rect.width - 1, rect.height),
            _ => (rect.width, rect.height),
        };
        let px = [n as u8, 0, 0, 255];
        Frame::new(w, h, px.repeat((w * h) as usize))
    }
}

fn instant() -> FrameCapturer {
    FrameCapturer::new(CaptureOpts {
        settle: Duration::ZERO,
    })
}

#[test]
fn captures_every_step_in_order() {
    let schedule = Schedule::new(4, 50, RotationMode::Sweep).unwrap();
    let mut source = CountingSource::new(3, 2);
    let mut log = ProgressLog::new();

    let frames = instant().capture(&mut source, &schedule, &mut log).unwrap();

    assert_eq!(frames.len(), 4);
    for (i, f) in frames.iter().enumerate() {
        assert_eq!((f.width, f.height), (3, 2));
        assert_eq!(f.pixel(0, 0)[0], i as u8 + 1);
    }
    let expected: Vec<f64> = schedule.rotations().collect();
    assert_eq!(source.rotations, expected);
}

#[test]
fn bounce_schedule_drives_source_angles() {
    let schedule = Schedule::new(4, 50, RotationMode::bounce()).unwrap();
    let mut source = CountingSource::new(1, 1);
    instant()
        .capture(&mut source, &schedule, &mut ProgressLog::new())
        .unwrap();
    assert_eq!(source.rotations[0], 0.0);
    assert!((source.rotations[1] - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
}

#[test]
fn progress_reaches_one_hundred_percent() {
    let schedule = Schedule::new(4, 50, RotationMode::Sweep).unwrap();
    let mut log = ProgressLog::new();
    instant()
        .capture(&mut CountingSource::new(1, 1), &schedule, &mut log)
        .unwrap();

    assert_eq!(log.events[0], ProgressEvent::CaptureStarted { total: 4 });
    assert_eq!(log.percents(), vec![25.0, 50.0, 75.0, 100.0]);
}

#[test]
fn missing_surface_aborts_before_rotating() {
    let schedule = Schedule::new(3, 50, RotationMode::Sweep).unwrap();
    let mut source = CountingSource::new(1, 1);
    source.geometry = None;
    let mut log = ProgressLog::new();

    let err = instant().capture(&mut source, &schedule, &mut log).unwrap_err();
    assert!(matches!(err, TurntableError::SourceUnavailable(_)));
    assert!(source.rotations.is_empty());
    assert!(log.events.is_empty());
}

#[test]
fn surface_resize_mid_capture_is_fatal() {
    let schedule = Schedule::new(5, 50, RotationMode::Sweep).unwrap();
    let mut source = CountingSource::new(4, 4);
    source.shrink_after = Some(2);
    let err = instant()
        .capture(&mut source, &schedule, &mut ProgressLog::new())
        .unwrap_err();
    assert!(matches!(err, TurntableError::SourceUnavailable(_)));
}

#[test]
fn settle_blocks_the_capturing_thread() {
    let schedule = Schedule::new(3, 50, RotationMode::Sweep).unwrap();
    let capturer = FrameCapturer::new(CaptureOpts {
        settle: Duration::from_millis(5),
    });
    let started = std::time::Instant::now();
    capturer
        .capture(&mut CountingSource::new(1, 1), &schedule, &mut ProgressLog::new())
        .unwrap();
    assert!(started.elapsed() >= Duration::from_millis(15));
}
