use std::f64::consts::{FRAC_PI_2, PI, TAU};

use crate::foundation::error::{TurntableError, TurntableResult};

/// How the capture schedule maps a step index to a rotation angle (radians).
///
/// The variants are mutually exclusive: an export either sweeps, bounces, or sweeps with the
/// readability flip, never a mix.
#[derive(Clone, Copy, Debug, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RotationMode {
    /// One full revolution: `(i / n) * 2π`.
    #[default]
    Sweep,
    /// Ease back and forth around the rest angle: `amplitude * sin((i / n) * 2π)`.
    Bounce {
        /// Peak deflection in radians.
        amplitude: f64,
    },
    /// Full revolution, flipped by π whenever the object would face away from the viewer.
    ///
    /// The flip is a hard jump at `cos(angle) == 0`; it is visible in the output.
    AlwaysReadable,
}

impl RotationMode {
    /// Bounce with the default quarter-turn amplitude.
    pub fn bounce() -> Self {
        Self::Bounce {
            amplitude: FRAC_PI_2,
        }
    }

    /// Rotation for step `i` of `n`.
    pub fn angle(self, i: u32, n: u32) -> f64 {
        let t = if n == 0 {
            0.0
        } else {
            f64::from(i) / f64::from(n)
        };
        let sweep = t * TAU;
        match self {
            Self::Sweep => sweep,
            Self::Bounce { amplitude } => amplitude * sweep.sin(),
            Self::AlwaysReadable => {
                if sweep.cos() < 0.0 {
                    (sweep + PI) % TAU
                } else {
                    sweep
                }
            }
        }
    }
}

/// The ordered capture plan for one export: how many frames, how long each is shown, and which
/// rotation each one is rendered at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Schedule {
    frame_count: u32,
    delay_ms: u32,
    mode: RotationMode,
}

impl Schedule {
    pub fn new(frame_count: u32, delay_ms: u32, mode: RotationMode) -> TurntableResult<Self> {
        if frame_count == 0 {
            return Err(TurntableError::validation(
                "schedule must contain at least one frame",
            ));
        }
        if delay_ms == 0 {
            return Err(TurntableError::validation(
                "schedule frame delay must be >= 1ms",
            ));
        }
        if let RotationMode::Bounce { amplitude } = mode
            && !amplitude.is_finite()
        {
            return Err(TurntableError::validation(
                "bounce amplitude must be finite",
            ));
        }
        Ok(Self {
            frame_count,
            delay_ms,
            mode,
        })
    }

    /// Derive `N = round(fps * duration)` and `delay = round(1000 / fps)`.
    pub fn from_rate(fps: f64, duration_secs: f64, mode: RotationMode) -> TurntableResult<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(TurntableError::validation("fps must be finite and > 0"));
        }
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(TurntableError::validation(
                "duration must be finite and > 0",
            ));
        }
        let frames = (fps * duration_secs).round();
        if frames > f64::from(u32::MAX) {
            return Err(TurntableError::validation("frame count overflows u32"));
        }
        let delay = (1000.0 / fps).round();
        if delay > f64::from(u32::MAX) {
            return Err(TurntableError::validation("frame delay overflows u32"));
        }
        Self::new(frames as u32, delay as u32, mode)
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    pub fn mode(&self) -> RotationMode {
        self.mode
    }

    /// Rotation (radians) for step `i`.
    pub fn rotation_at(&self, i: u32) -> f64 {
        self.mode.angle(i, self.frame_count)
    }

    /// All rotations in capture order.
    pub fn rotations(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.frame_count).map(|i| self.rotation_at(i))
    }

    /// Per-frame display delays, one entry per frame.
    pub fn delays(&self) -> Vec<u32> {
        vec![self.delay_ms; self.frame_count as usize]
    }

    pub fn total_duration_ms(&self) -> u64 {
        u64::from(self.frame_count) * u64::from(self.delay_ms)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timing/schedule.rs"]
mod tests;
