//! Audible alarm for terminal hosts.
//!
//! A terminal cannot synthesize a tone, so the alarm rings the bell each
//! time the pattern would switch pitch.

use std::io::Write;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

/// Rings the terminal bell on a fixed cadence for a bounded time.
#[derive(Debug, Clone, Copy)]
pub struct TerminalAlarm {
    step: Duration,
    total: Duration,
}

impl TerminalAlarm {
    /// Create an alarm that rings every `step` for `total`.
    #[must_use]
    pub fn new(step: Duration, total: Duration) -> Self {
        Self { step, total }
    }

    /// Number of bell strikes one run produces.
    #[must_use]
    pub fn strikes(&self) -> u32 {
        let step_ms = self.step.as_millis();
        if step_ms == 0 {
            return 0;
        }
        u32::try_from(self.total.as_millis() / step_ms).unwrap_or(u32::MAX)
    }

    /// Start ringing on a background task.
    ///
    /// The task ends by itself after the configured duration; dropping the
    /// handle does not stop it.
    pub fn ring(&self) -> JoinHandle<()> {
        let strikes = self.strikes();
        let step = self.step;
        tokio::spawn(async move {
            if strikes == 0 {
                debug!("Terminal alarm has nothing to ring");
                return;
            }
            debug!(strikes, "Terminal alarm started");
            let mut ticker = tokio::time::interval(step);
            for _ in 0..strikes {
                ticker.tick().await;
                let mut stderr = std::io::stderr();
                let _ = stderr.write_all(b"\x07");
                let _ = stderr.flush();
            }
            debug!("Terminal alarm finished");
        })
    }
}
