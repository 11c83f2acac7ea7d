//! Live location sharing.
//!
//! A session watches the device position for a bounded number of minutes.
//! The countdown starts at the first fix and the session stops itself when
//! it reaches zero. The session owns the watch handle and both background
//! tasks; stopping or dropping it releases all three.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::handoff::Handoff;
use crate::location::{
    GeolocationError, GeolocationProvider, LocationSample, PositionOptions, PositionUpdate,
    WatchHandle,
};
use crate::message::Branding;
use crate::notify::{Notification, NotificationLevel, Notifier, NotifierExt};

/// Shown when no recipients were entered.
pub const MISSING_RECIPIENTS_MESSAGE: &str = "Please enter trusted contact emails or phone numbers";

/// Shown when the watch fails.
pub const WATCH_FAILED_MESSAGE: &str =
    "Unable to access location. Please enable location services.";

/// Bounds on a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharingLimits {
    /// Duration offered when none is given.
    pub default_minutes: u32,
    /// Shortest allowed session.
    pub min_minutes: u32,
    /// Longest allowed session.
    pub max_minutes: u32,
    /// Per-fix deadline passed to the watch.
    pub watch_timeout: Duration,
}

impl Default for SharingLimits {
    fn default() -> Self {
        Self {
            default_minutes: 30,
            min_minutes: 5,
            max_minutes: 240,
            watch_timeout: Duration::from_secs(5),
        }
    }
}

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SharingState {
    /// No watch running.
    Inactive,
    /// Watch running, waiting for the first fix.
    Starting,
    /// Sharing; the countdown is running.
    Active,
}

impl fmt::Display for SharingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inactive => write!(f, "inactive"),
            Self::Starting => write!(f, "starting"),
            Self::Active => write!(f, "active"),
        }
    }
}

/// How [`LiveLocationSession::share_current_link`] delivered the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    /// Native share sheet accepted it.
    Shared,
    /// Copied to the clipboard.
    Copied,
    /// Neither worked.
    Failed,
}

/// Format seconds as `m:ss`.
#[must_use]
pub fn format_remaining(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Number of comma-separated entries in a recipient descriptor.
#[must_use]
pub fn recipient_count(descriptor: &str) -> usize {
    descriptor.split(',').count()
}

#[derive(Debug)]
struct Inner {
    state: SharingState,
    generation: u64,
    descriptor: String,
    duration_minutes: u32,
    remaining_secs: u64,
    latest: Option<LocationSample>,
    watch: Option<WatchHandle>,
    pump: Option<JoinHandle<()>>,
    countdown: Option<JoinHandle<()>>,
}

struct Shared {
    geolocation: Arc<dyn GeolocationProvider>,
    handoff: Arc<dyn Handoff>,
    notifier: Arc<dyn Notifier>,
    branding: Branding,
    maps_base_url: String,
    limits: SharingLimits,
    inner: Mutex<Inner>,
}

impl Shared {
    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn on_sample(self: &Arc<Self>, generation: u64, sample: LocationSample) {
        let started = {
            let mut inner = self.inner();
            if inner.generation != generation || inner.state == SharingState::Inactive {
                return;
            }
            inner.latest = Some(sample);
            if inner.state != SharingState::Starting {
                return;
            }
            inner.state = SharingState::Active;
            inner.remaining_secs = u64::from(inner.duration_minutes) * 60;
            inner.countdown = Some(tokio::spawn(countdown(Arc::clone(self), generation)));
            (recipient_count(&inner.descriptor), inner.duration_minutes)
        };

        info!(
            recipients = started.0,
            minutes = started.1,
            "Live location sharing started"
        );
        self.notifier.notify(
            Notification::new(NotificationLevel::Success, "📍 Location sharing started!")
                .with_description(format!(
                    "Sharing with: {} contact(s) for {} minutes",
                    started.0, started.1
                )),
        );
    }

    fn on_watch_error(&self, generation: u64, error: GeolocationError) {
        if self.inner().generation != generation {
            return;
        }
        warn!(error = %error, "Position watch failed");
        self.notifier.error(WATCH_FAILED_MESSAGE);
        self.halt(Some(generation));
    }

    /// Tick once a second; returns when the session ends or is replaced.
    fn tick(&self, generation: u64) -> bool {
        let expired = {
            let mut inner = self.inner();
            if inner.generation != generation || inner.state != SharingState::Active {
                return false;
            }
            inner.remaining_secs = inner.remaining_secs.saturating_sub(1);
            inner.remaining_secs == 0
        };
        if expired {
            info!("Live location session expired");
            self.halt(Some(generation));
            return false;
        }
        true
    }

    /// Release the watch and tasks. Returns whether a session was running.
    ///
    /// With `Some(generation)`, only that session is halted.
    fn halt(&self, generation: Option<u64>) -> bool {
        let (watch, pump, countdown) = {
            let mut inner = self.inner();
            if generation.is_some_and(|g| g != inner.generation) {
                return false;
            }
            if inner.state == SharingState::Inactive {
                return false;
            }
            inner.state = SharingState::Inactive;
            inner.remaining_secs = 0;
            (inner.watch.take(), inner.pump.take(), inner.countdown.take())
        };

        if let Some(watch) = watch {
            watch.clear();
        }
        for task in [pump, countdown].into_iter().flatten() {
            task.abort();
        }
        self.notifier.info("Location sharing stopped");
        true
    }
}

async fn pump(shared: Arc<Shared>, generation: u64, mut updates: mpsc::Receiver<PositionUpdate>) {
    while let Some(update) = updates.recv().await {
        match update {
            Ok(sample) => shared.on_sample(generation, sample),
            Err(error) => {
                shared.on_watch_error(generation, error);
                return;
            }
        }
    }
    debug!(generation, "Position watch closed");
}

async fn countdown(shared: Arc<Shared>, generation: u64) {
    let period = Duration::from_secs(1);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if !shared.tick(generation) {
            return;
        }
    }
}

/// A bounded live location sharing session.
pub struct LiveLocationSession {
    shared: Arc<Shared>,
}

impl fmt::Debug for LiveLocationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveLocationSession")
            .field("state", &self.state())
            .field("remaining", &self.remaining())
            .finish_non_exhaustive()
    }
}

impl LiveLocationSession {
    /// Create an inactive session.
    #[must_use]
    pub fn new(
        geolocation: Arc<dyn GeolocationProvider>,
        handoff: Arc<dyn Handoff>,
        notifier: Arc<dyn Notifier>,
        branding: Branding,
        maps_base_url: impl Into<String>,
        limits: SharingLimits,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                geolocation,
                handoff,
                notifier,
                branding,
                maps_base_url: maps_base_url.into(),
                limits,
                inner: Mutex::new(Inner {
                    state: SharingState::Inactive,
                    generation: 0,
                    descriptor: String::new(),
                    duration_minutes: limits.default_minutes,
                    remaining_secs: 0,
                    latest: None,
                    watch: None,
                    pump: None,
                    countdown: None,
                }),
            }),
        }
    }

    /// Limits in use.
    #[must_use]
    pub fn limits(&self) -> SharingLimits {
        self.shared.limits
    }

    /// Start watching the position.
    ///
    /// The session becomes [`SharingState::Active`] at the first fix.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank `descriptor` or a duration
    /// outside the limits, [`Error::SharingAlreadyActive`] if a session is
    /// running, or a geolocation error if the watch cannot start. The state
    /// is unchanged on error.
    pub fn start(&self, descriptor: &str, duration_minutes: u32) -> Result<()> {
        let shared = &self.shared;
        let limits = shared.limits;

        if descriptor.trim().is_empty() {
            shared.notifier.error(MISSING_RECIPIENTS_MESSAGE);
            return Err(Error::validation(MISSING_RECIPIENTS_MESSAGE));
        }
        if !(limits.min_minutes..=limits.max_minutes).contains(&duration_minutes) {
            let message = format!(
                "Sharing duration must be between {} and {} minutes",
                limits.min_minutes, limits.max_minutes
            );
            shared.notifier.error(message.clone());
            return Err(Error::validation(message));
        }
        if !shared.geolocation.is_supported() {
            shared.notifier.error("Geolocation is not supported on this device");
            return Err(GeolocationError::Unsupported.into());
        }

        let mut inner = shared.inner();
        if inner.state != SharingState::Inactive {
            return Err(Error::SharingAlreadyActive);
        }

        let options = PositionOptions {
            high_accuracy: true,
            timeout: limits.watch_timeout,
            maximum_age: Duration::ZERO,
        };
        let watch = match shared.geolocation.watch_position(options) {
            Ok(watch) => watch,
            Err(err) => {
                drop(inner);
                warn!(error = %err, "Could not start position watch");
                shared.notifier.error(WATCH_FAILED_MESSAGE);
                return Err(err.into());
            }
        };

        inner.generation += 1;
        inner.state = SharingState::Starting;
        inner.descriptor = descriptor.trim().to_string();
        inner.duration_minutes = duration_minutes;
        inner.remaining_secs = 0;
        inner.watch = Some(watch.handle);
        inner.pump = Some(tokio::spawn(pump(
            Arc::clone(shared),
            inner.generation,
            watch.updates,
        )));
        debug!(
            generation = inner.generation,
            minutes = duration_minutes,
            "Position watch started"
        );
        Ok(())
    }

    /// Stop sharing. Does nothing when no session is running.
    ///
    /// Returns whether a session was stopped.
    pub fn stop(&self) -> bool {
        self.shared.halt(None)
    }

    /// Share the latest fix via the native share sheet, falling back to the
    /// clipboard. Returns `None` when there is no fix yet.
    pub async fn share_current_link(&self) -> Option<ShareOutcome> {
        let shared = &self.shared;
        let Some(sample) = self.latest() else {
            debug!("No location yet; nothing to share");
            return None;
        };

        let url = sample.maps_url(&shared.maps_base_url);
        let text = shared.branding.live_location_message(&url, sample.timestamp);

        if shared.handoff.can_share() {
            match shared
                .handoff
                .share(&shared.branding.live_location_title(), &text)
                .await
            {
                Ok(()) => {
                    shared.notifier.success("Location shared successfully!");
                    return Some(ShareOutcome::Shared);
                }
                Err(err) => warn!(error = %err, "Native share failed"),
            }
        }

        match shared.handoff.write_clipboard(&text).await {
            Ok(()) => {
                shared.notifier.success("Location link copied to clipboard!");
                Some(ShareOutcome::Copied)
            }
            Err(err) => {
                warn!(error = %err, "Clipboard write failed");
                shared.notifier.error("Failed to copy location");
                Some(ShareOutcome::Failed)
            }
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SharingState {
        self.shared.inner().state
    }

    /// Whether the countdown is running.
    #[must_use]
    pub fn is_sharing(&self) -> bool {
        self.state() == SharingState::Active
    }

    /// Time left before the session stops itself.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        Duration::from_secs(self.shared.inner().remaining_secs)
    }

    /// The most recent fix. Kept after the session stops.
    #[must_use]
    pub fn latest(&self) -> Option<LocationSample> {
        self.shared.inner().latest
    }

    /// Recipients entered for the current or last session.
    #[must_use]
    pub fn contact_count(&self) -> usize {
        let inner = self.shared.inner();
        if inner.descriptor.is_empty() {
            0
        } else {
            recipient_count(&inner.descriptor)
        }
    }
}

impl Drop for LiveLocationSession {
    fn drop(&mut self) {
        let (watch, pump, countdown) = {
            let mut inner = self.shared.inner();
            inner.state = SharingState::Inactive;
            (inner.watch.take(), inner.pump.take(), inner.countdown.take())
        };
        if let Some(watch) = watch {
            watch.clear();
        }
        for task in [pump, countdown].into_iter().flatten() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handoff::HandoffError;
    use crate::testing::{FakeGeolocation, HandoffCall, RecordingNotifier, ScriptedHandoff};

    struct Fixture {
        geolocation: Arc<FakeGeolocation>,
        handoff: Arc<ScriptedHandoff>,
        notifier: Arc<RecordingNotifier>,
    }

    impl Fixture {
        fn new(geolocation: FakeGeolocation, handoff: ScriptedHandoff) -> Self {
            Self {
                geolocation: Arc::new(geolocation),
                handoff: Arc::new(handoff),
                notifier: Arc::new(RecordingNotifier::default()),
            }
        }

        fn watching(latitude: f64, longitude: f64) -> Self {
            let sample = LocationSample::new(latitude, longitude);
            Self::new(
                FakeGeolocation::fixed(latitude, longitude).with_watch_updates(vec![Ok(sample)]),
                ScriptedHandoff::blocked(),
            )
        }

        fn session(&self) -> LiveLocationSession {
            LiveLocationSession::new(
                self.geolocation.clone(),
                self.handoff.clone(),
                self.notifier.clone(),
                Branding::default(),
                "https://www.google.com/maps",
                SharingLimits {
                    min_minutes: 1,
                    ..SharingLimits::default()
                },
            )
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_descriptor_rejected_without_watch() {
        let fx = Fixture::watching(1.0, 2.0);
        let session = fx.session();

        let err = session.start("   ", 30).unwrap_err();

        assert!(err.is_validation());
        assert_eq!(fx.geolocation.watch_calls(), 0);
        assert_eq!(session.state(), SharingState::Inactive);
        assert!(fx.notifier.contains(MISSING_RECIPIENTS_MESSAGE));
    }

    #[tokio::test(start_paused = true)]
    async fn test_duration_out_of_range_rejected() {
        let fx = Fixture::watching(1.0, 2.0);
        let session = fx.session();

        assert!(session.start("mom", 0).unwrap_err().is_validation());
        assert!(session.start("mom", 241).unwrap_err().is_validation());
        assert_eq!(fx.geolocation.watch_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsupported_geolocation_rejected() {
        let fx = Fixture::new(FakeGeolocation::unsupported(), ScriptedHandoff::blocked());
        let session = fx.session();

        assert!(session.start("mom", 30).is_err());
        assert_eq!(session.state(), SharingState::Inactive);
        assert_eq!(fx.notifier.count(NotificationLevel::Error), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_sample_activates() {
        let fx = Fixture::watching(1.0, 2.0);
        let session = fx.session();

        session.start("mom, dad", 30).unwrap();
        assert_eq!(session.state(), SharingState::Starting);
        settle().await;

        assert_eq!(session.state(), SharingState::Active);
        assert_eq!(session.remaining(), Duration::from_secs(1800));
        assert_eq!(session.contact_count(), 2);
        assert!(fx.notifier.contains("Location sharing started"));
        assert_eq!(session.latest().map(|s| s.latitude), Some(1.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_minute_session_stops_itself() {
        let fx = Fixture::watching(1.0, 2.0);
        let session = fx.session();

        session.start("mom", 1).unwrap();
        settle().await;
        assert!(session.is_sharing());

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert!(session.is_sharing());
        assert_eq!(session.remaining(), Duration::from_secs(1));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(session.state(), SharingState::Inactive);
        assert!(fx.geolocation.signals()[0].is_cleared());
        assert_eq!(fx.notifier.count_matching("Location sharing stopped"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_error_stops_session() {
        let fx = Fixture::watching(1.0, 2.0);
        let session = fx.session();
        session.start("mom", 30).unwrap();
        settle().await;

        fx.geolocation.push(Err(GeolocationError::PositionUnavailable));
        settle().await;

        assert_eq!(session.state(), SharingState::Inactive);
        assert!(fx.notifier.contains(WATCH_FAILED_MESSAGE));
        assert!(fx.geolocation.signals()[0].is_cleared());
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_samples_update_latest() {
        let fx = Fixture::watching(1.0, 2.0);
        let session = fx.session();
        session.start("mom", 30).unwrap();
        settle().await;

        fx.geolocation.push(Ok(LocationSample::new(3.0, 4.0)));
        settle().await;

        assert_eq!(session.latest().map(|s| s.latitude), Some(3.0));
        assert_eq!(fx.notifier.count_matching("Location sharing started"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let fx = Fixture::watching(1.0, 2.0);
        let session = fx.session();
        session.start("mom", 30).unwrap();
        settle().await;

        assert!(session.stop());
        assert!(!session.stop());
        assert_eq!(session.state(), SharingState::Inactive);
        assert_eq!(session.remaining(), Duration::ZERO);
        assert_eq!(fx.notifier.count_matching("Location sharing stopped"), 1);
        assert!(fx.geolocation.signals()[0].is_cleared());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_while_running_rejected() {
        let fx = Fixture::watching(1.0, 2.0);
        let session = fx.session();
        session.start("mom", 30).unwrap();

        let err = session.start("dad", 30).unwrap_err();
        assert!(err.is_already_active());
        assert_eq!(fx.geolocation.watch_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_stop() {
        let fx = Fixture::watching(1.0, 2.0);
        let session = fx.session();
        session.start("mom", 30).unwrap();
        settle().await;
        session.stop();

        session.start("mom", 5).unwrap();
        settle().await;
        assert!(session.is_sharing());
        assert_eq!(session.remaining(), Duration::from_secs(300));
        assert!(fx.geolocation.signals()[0].is_cleared());
        assert!(!fx.geolocation.signals()[1].is_cleared());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_releases_watch() {
        let fx = Fixture::watching(1.0, 2.0);
        let session = fx.session();
        session.start("mom", 30).unwrap();
        settle().await;

        drop(session);
        assert!(fx.geolocation.signals()[0].is_cleared());
    }

    #[tokio::test(start_paused = true)]
    async fn test_share_without_sample_is_noop() {
        let fx = Fixture::watching(1.0, 2.0);
        let session = fx.session();

        assert!(session.share_current_link().await.is_none());
        assert!(fx.handoff.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_share_falls_back_to_clipboard() {
        let sample = LocationSample::new(28.6139, 77.209);
        let fx = Fixture::new(
            FakeGeolocation::fixed(28.6139, 77.209).with_watch_updates(vec![Ok(sample)]),
            ScriptedHandoff::blocked().with_share(Err(HandoffError::Denied("share".into()))),
        );
        let session = fx.session();
        session.start("mom", 30).unwrap();
        settle().await;

        let outcome = session.share_current_link().await;

        assert_eq!(outcome, Some(ShareOutcome::Copied));
        let calls = fx.handoff.calls();
        assert!(matches!(&calls[0], HandoffCall::Share { title, .. } if title == "Rakshika - Live Location"));
        let copied = fx.handoff.clipboard_writes();
        assert!(copied[0].contains("https://www.google.com/maps?q=28.6139,77.209"));
        assert!(fx.notifier.contains("Location link copied to clipboard!"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_share_via_share_sheet() {
        let fx = Fixture::new(
            FakeGeolocation::fixed(1.0, 2.0)
                .with_watch_updates(vec![Ok(LocationSample::new(1.0, 2.0))]),
            ScriptedHandoff::blocked().with_share(Ok(())),
        );
        let session = fx.session();
        session.start("mom", 30).unwrap();
        settle().await;

        assert_eq!(session.share_current_link().await, Some(ShareOutcome::Shared));
        assert!(fx.handoff.clipboard_writes().is_empty());
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(0), "0:00");
        assert_eq!(format_remaining(61), "1:01");
        assert_eq!(format_remaining(1800), "30:00");
    }

    #[test]
    fn test_recipient_count() {
        assert_eq!(recipient_count("a"), 1);
        assert_eq!(recipient_count("a, b,c"), 3);
    }
}
