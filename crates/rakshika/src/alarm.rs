//! Audible alarm and vibration.
//!
//! Both are fire-and-forget side effects of an SOS activation and never
//! influence the dispatch outcome.

use std::time::Duration;

/// Vibration pattern in milliseconds, alternating on and off.
pub const SOS_VIBRATION: &[u64] = &[200, 100, 200, 100, 200, 100, 200];

/// A two-tone alarm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlarmPattern {
    /// Upper tone in hertz.
    pub high_hz: f32,
    /// Lower tone in hertz.
    pub low_hz: f32,
    /// Time spent on each tone.
    pub step: Duration,
    /// Total length of the alarm.
    pub duration: Duration,
    /// Output gain, 0.0 to 1.0.
    pub gain: f32,
}

impl AlarmPattern {
    /// Number of tone switches over the whole alarm.
    #[must_use]
    pub fn steps(&self) -> u32 {
        let step_ms = self.step.as_millis();
        if step_ms == 0 {
            return 0;
        }
        u32::try_from(self.duration.as_millis() / step_ms).unwrap_or(u32::MAX)
    }
}

impl Default for AlarmPattern {
    fn default() -> Self {
        Self {
            high_hz: 800.0,
            low_hz: 600.0,
            step: Duration::from_millis(200),
            duration: Duration::from_secs(5),
            gain: 0.3,
        }
    }
}

/// Host alarm output.
pub trait Alarm: Send + Sync {
    /// Start the alarm; returns immediately.
    fn sound(&self, pattern: &AlarmPattern);

    /// Vibrate with `pattern`; returns whether the host supports it.
    fn vibrate(&self, pattern: &[u64]) -> bool;
}
