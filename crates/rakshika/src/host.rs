//! Desktop implementations of the host traits.
//!
//! These adapters connect the domain traits to the primitives in
//! `rakshika-desktop` and to the terminal.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rakshika_desktop::{open_url, DesktopError, SystemClipboard, TerminalAlarm};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::alarm::{Alarm, AlarmPattern};
use crate::handoff::{Handoff, HandoffError, HandoffResult, WindowOutcome};
use crate::location::{
    GeolocationError, GeolocationProvider, LocationSample, PositionOptions, PositionWatch,
    WatchHandle,
};
use crate::notify::{Notification, NotificationLevel, Notifier};

/// Hands URLs to the system opener and text to the system clipboard.
///
/// A desktop has no native share sheet.
#[derive(Debug, Default)]
pub struct DesktopHandoff;

impl DesktopHandoff {
    /// Create the adapter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn handoff_error(err: DesktopError) -> HandoffError {
    match err {
        DesktopError::OpenerRejected { url, .. } => HandoffError::Denied(url),
        other => HandoffError::Failed(other.to_string()),
    }
}

#[async_trait]
impl Handoff for DesktopHandoff {
    async fn open_window(&self, url: &str) -> HandoffResult<WindowOutcome> {
        match open_url(url).await {
            Ok(()) => Ok(WindowOutcome::Opened),
            Err(DesktopError::OpenerRejected { status, .. }) => {
                debug!(status, "No handler accepted the link");
                Ok(WindowOutcome::Blocked)
            }
            Err(err) => Err(handoff_error(err)),
        }
    }

    fn can_share(&self) -> bool {
        false
    }

    async fn share(&self, _title: &str, _text: &str) -> HandoffResult<()> {
        Err(HandoffError::Unsupported("native share"))
    }

    async fn navigate(&self, url: &str) -> HandoffResult<()> {
        open_url(url).await.map_err(handoff_error)
    }

    async fn write_clipboard(&self, text: &str) -> HandoffResult<()> {
        SystemClipboard::new().write_text(text).map_err(handoff_error)
    }
}

/// Prints notifications to standard output.
#[derive(Debug, Default)]
pub struct TerminalNotifier {
    quiet: bool,
}

impl TerminalNotifier {
    /// Create a notifier. A quiet notifier prints errors only.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        debug!(level = %notification.level, title = %notification.title, "Notification");
        if self.quiet && notification.level != NotificationLevel::Error {
            return;
        }
        let marker = match notification.level {
            NotificationLevel::Success => "ok",
            NotificationLevel::Info => "..",
            NotificationLevel::Warning => "!!",
            NotificationLevel::Error => "xx",
        };
        println!("[{marker}] {notification}");
    }
}

/// Rings the terminal bell in place of a tone. Vibration is unsupported.
#[derive(Debug)]
pub struct TerminalAlarmSink {
    enabled: bool,
    ringing: Mutex<Option<JoinHandle<()>>>,
}

impl TerminalAlarmSink {
    /// Create the sink; a disabled sink stays silent.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ringing: Mutex::new(None),
        }
    }

    /// Wait until the current alarm has rung out.
    pub async fn wait(&self) {
        let task = self
            .ringing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                debug!(error = %err, "Alarm task ended early");
            }
        }
    }
}

impl Alarm for TerminalAlarmSink {
    fn sound(&self, pattern: &AlarmPattern) {
        if !self.enabled {
            debug!("Alarm disabled");
            return;
        }
        let task = TerminalAlarm::new(pattern.step, pattern.duration).ring();
        let mut slot = self.ringing.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(task) {
            previous.abort();
        }
    }

    fn vibrate(&self, _pattern: &[u64]) -> bool {
        false
    }
}

impl Drop for TerminalAlarmSink {
    fn drop(&mut self) {
        let slot = self.ringing.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = slot.take() {
            task.abort();
        }
    }
}

/// Reports a configured position.
///
/// Disabled means unsupported; enabled without coordinates means the
/// position is unavailable.
#[derive(Debug)]
pub struct ConfiguredGeolocation {
    enabled: bool,
    position: Option<(f64, f64)>,
    watch_interval: Duration,
    next_watch_id: AtomicU64,
}

impl ConfiguredGeolocation {
    /// Create a provider.
    #[must_use]
    pub fn new(enabled: bool, position: Option<(f64, f64)>, watch_interval: Duration) -> Self {
        Self {
            enabled,
            position,
            watch_interval,
            next_watch_id: AtomicU64::new(1),
        }
    }

    fn fix(&self) -> Result<LocationSample, GeolocationError> {
        if !self.enabled {
            return Err(GeolocationError::Unsupported);
        }
        self.position
            .map(|(lat, lng)| LocationSample::new(lat, lng))
            .ok_or(GeolocationError::PositionUnavailable)
    }
}

#[async_trait]
impl GeolocationProvider for ConfiguredGeolocation {
    fn is_supported(&self) -> bool {
        self.enabled
    }

    async fn current_position(
        &self,
        options: PositionOptions,
    ) -> Result<LocationSample, GeolocationError> {
        debug!(timeout = ?options.timeout, "Position requested");
        self.fix()
    }

    fn watch_position(&self, options: PositionOptions) -> Result<PositionWatch, GeolocationError> {
        if !self.enabled {
            return Err(GeolocationError::Unsupported);
        }

        let id = self.next_watch_id.fetch_add(1, Ordering::SeqCst);
        let handle = WatchHandle::new(id);
        let signal = handle.signal();
        let (tx, rx) = mpsc::channel(8);
        let position = self.position;
        let period = self.watch_interval.max(Duration::from_millis(1));
        debug!(watch_id = id, timeout = ?options.timeout, "Watch started");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                if signal.is_cleared() {
                    break;
                }
                let update = position
                    .map(|(lat, lng)| LocationSample::new(lat, lng))
                    .ok_or(GeolocationError::PositionUnavailable);
                let failed = update.is_err();
                if tx.send(update).await.is_err() || failed {
                    break;
                }
            }
            debug!(watch_id = id, "Watch ended");
        });

        Ok(PositionWatch { handle, updates: rx })
    }
}

/// Build the geolocation provider from configuration values.
#[must_use]
pub fn configured_geolocation(
    enabled: bool,
    latitude: Option<f64>,
    longitude: Option<f64>,
    watch_interval: Duration,
) -> ConfiguredGeolocation {
    let position = latitude.zip(longitude);
    if enabled && position.is_none() {
        warn!("No coordinates configured; location will be unavailable");
    }
    ConfiguredGeolocation::new(enabled, position, watch_interval)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_configured_position() {
        let geo = configured_geolocation(true, Some(1.5), Some(2.5), Duration::from_secs(1));
        let sample = geo
            .current_position(PositionOptions::high_accuracy(Duration::from_secs(10)))
            .await
            .unwrap();
        assert!((sample.latitude - 1.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_missing_position_is_unavailable() {
        let geo = configured_geolocation(true, None, None, Duration::from_secs(1));
        let err = geo
            .current_position(PositionOptions::high_accuracy(Duration::from_secs(10)))
            .await
            .unwrap_err();
        assert_eq!(err, GeolocationError::PositionUnavailable);
    }

    #[tokio::test]
    async fn test_disabled_is_unsupported() {
        let geo = configured_geolocation(false, Some(1.0), Some(2.0), Duration::from_secs(1));
        assert!(!geo.is_supported());
        assert!(geo
            .watch_position(PositionOptions::high_accuracy(Duration::from_secs(5)))
            .is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_stops_after_clear() {
        let geo = configured_geolocation(true, Some(1.0), Some(2.0), Duration::from_secs(1));
        let mut watch = geo
            .watch_position(PositionOptions::high_accuracy(Duration::from_secs(5)))
            .unwrap();

        assert!(watch.updates.recv().await.unwrap().is_ok());
        assert!(watch.updates.recv().await.unwrap().is_ok());

        watch.handle.clear();
        // One update may already be queued; after that the channel closes.
        let mut remaining = 0;
        while watch.updates.recv().await.is_some() {
            remaining += 1;
        }
        assert!(remaining <= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_without_position_reports_error() {
        let geo = configured_geolocation(true, None, None, Duration::from_secs(1));
        let mut watch = geo
            .watch_position(PositionOptions::high_accuracy(Duration::from_secs(5)))
            .unwrap();

        assert_eq!(
            watch.updates.recv().await.unwrap().unwrap_err(),
            GeolocationError::PositionUnavailable
        );
        assert!(watch.updates.recv().await.is_none());
    }

    #[test]
    fn test_quiet_notifier_constructs() {
        let notifier = TerminalNotifier::new(true);
        notifier.notify(Notification::new(NotificationLevel::Info, "hidden"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_alarm_sink_wait_lasts_whole_alarm() {
        let sink = TerminalAlarmSink::new(true);
        let pattern = AlarmPattern {
            step: Duration::from_millis(200),
            duration: Duration::from_secs(1),
            ..AlarmPattern::default()
        };
        let started = tokio::time::Instant::now();

        sink.sound(&pattern);
        sink.wait().await;

        // Five strikes, the first one immediate.
        assert!(started.elapsed() >= Duration::from_millis(800));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_alarm_sink_wait_returns() {
        let sink = TerminalAlarmSink::new(false);
        let started = tokio::time::Instant::now();
        sink.sound(&AlarmPattern::default());
        sink.wait().await;
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_alarm_sink_never_vibrates() {
        let sink = TerminalAlarmSink::new(false);
        sink.sound(&AlarmPattern::default());
        assert!(!sink.vibrate(&[200]));
    }
}
