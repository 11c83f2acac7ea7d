//! Scripted host fakes shared by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;

use crate::alarm::{Alarm, AlarmPattern};
use crate::alert::{AlertRecorder, NewSosAlert, SosAlert};
use crate::error::Result;
use crate::handoff::{Handoff, HandoffError, HandoffResult, WindowOutcome};
use crate::location::{
    GeolocationError, GeolocationProvider, LocationSample, PositionOptions, PositionUpdate,
    PositionWatch, WatchHandle, WatchSignal,
};
use crate::notify::{Notification, NotificationLevel, Notifier};

/// Keeps every notification.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    pub fn count(&self, level: NotificationLevel) -> usize {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.level == level)
            .count()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .any(|n| n.title.contains(needle))
    }

    pub fn count_matching(&self, needle: &str) -> usize {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.title.contains(needle))
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

/// Geolocation with a fixed answer and a scripted watch.
#[derive(Debug)]
pub struct FakeGeolocation {
    supported: bool,
    hang: bool,
    answer: std::result::Result<LocationSample, GeolocationError>,
    watch_updates: Vec<PositionUpdate>,
    current_calls: AtomicUsize,
    watch_calls: AtomicUsize,
    senders: Mutex<Vec<mpsc::Sender<PositionUpdate>>>,
    signals: Mutex<Vec<WatchSignal>>,
}

impl FakeGeolocation {
    fn with_answer(supported: bool, answer: std::result::Result<LocationSample, GeolocationError>) -> Self {
        Self {
            supported,
            hang: false,
            answer,
            watch_updates: Vec::new(),
            current_calls: AtomicUsize::new(0),
            watch_calls: AtomicUsize::new(0),
            senders: Mutex::new(Vec::new()),
            signals: Mutex::new(Vec::new()),
        }
    }

    pub fn fixed(latitude: f64, longitude: f64) -> Self {
        Self::with_answer(true, Ok(LocationSample::new(latitude, longitude)))
    }

    pub fn failing(error: GeolocationError) -> Self {
        Self::with_answer(true, Err(error))
    }

    pub fn unsupported() -> Self {
        Self::with_answer(false, Err(GeolocationError::Unsupported))
    }

    /// Supported, but a one-shot fix never resolves.
    pub fn never_answers() -> Self {
        Self {
            hang: true,
            ..Self::with_answer(true, Err(GeolocationError::PositionUnavailable))
        }
    }

    /// Updates delivered as soon as a watch starts.
    pub fn with_watch_updates(mut self, updates: Vec<PositionUpdate>) -> Self {
        self.watch_updates = updates;
        self
    }

    pub fn current_calls(&self) -> usize {
        self.current_calls.load(Ordering::SeqCst)
    }

    pub fn watch_calls(&self) -> usize {
        self.watch_calls.load(Ordering::SeqCst)
    }

    /// Signals of every watch handed out, oldest first.
    pub fn signals(&self) -> Vec<WatchSignal> {
        self.signals.lock().unwrap().clone()
    }

    /// Deliver another update to the most recent watch.
    pub fn push(&self, update: PositionUpdate) {
        if let Some(tx) = self.senders.lock().unwrap().last() {
            let _ = tx.try_send(update);
        }
    }
}

#[async_trait]
impl GeolocationProvider for FakeGeolocation {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn current_position(
        &self,
        _options: PositionOptions,
    ) -> std::result::Result<LocationSample, GeolocationError> {
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.answer.clone()
    }

    fn watch_position(
        &self,
        _options: PositionOptions,
    ) -> std::result::Result<PositionWatch, GeolocationError> {
        if !self.supported {
            return Err(GeolocationError::Unsupported);
        }
        let id = self.watch_calls.fetch_add(1, Ordering::SeqCst) as u64 + 1;
        let (tx, rx) = mpsc::channel(16);
        for update in &self.watch_updates {
            let _ = tx.try_send(update.clone());
        }
        let handle = WatchHandle::new(id);
        self.signals.lock().unwrap().push(handle.signal());
        self.senders.lock().unwrap().push(tx);
        Ok(PositionWatch {
            handle,
            updates: rx,
        })
    }
}

/// A host request seen by [`ScriptedHandoff`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandoffCall {
    OpenWindow(String),
    Share { title: String, text: String },
    Navigate(String),
    Clipboard(String),
}

/// Hand-off host with scripted answers.
///
/// Windows are answered from a queue, then `Blocked` once it runs dry.
#[derive(Debug)]
pub struct ScriptedHandoff {
    windows: Mutex<VecDeque<HandoffResult<WindowOutcome>>>,
    share: Option<HandoffResult<()>>,
    navigate: HandoffResult<()>,
    clipboard: HandoffResult<()>,
    calls: Mutex<Vec<HandoffCall>>,
}

impl ScriptedHandoff {
    /// Every window blocked, no share sheet, navigation and clipboard work.
    pub fn blocked() -> Self {
        Self {
            windows: Mutex::new(VecDeque::new()),
            share: None,
            navigate: Ok(()),
            clipboard: Ok(()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_windows(self, outcomes: Vec<HandoffResult<WindowOutcome>>) -> Self {
        *self.windows.lock().unwrap() = outcomes.into();
        self
    }

    pub fn with_share(mut self, result: HandoffResult<()>) -> Self {
        self.share = Some(result);
        self
    }

    pub fn with_navigate(mut self, result: HandoffResult<()>) -> Self {
        self.navigate = result;
        self
    }

    pub fn with_clipboard(mut self, result: HandoffResult<()>) -> Self {
        self.clipboard = result;
        self
    }

    pub fn calls(&self) -> Vec<HandoffCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn window_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, HandoffCall::OpenWindow(_)))
            .count()
    }

    pub fn clipboard_writes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                HandoffCall::Clipboard(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: HandoffCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Handoff for ScriptedHandoff {
    async fn open_window(&self, url: &str) -> HandoffResult<WindowOutcome> {
        self.record(HandoffCall::OpenWindow(url.to_string()));
        self.windows
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(WindowOutcome::Blocked))
    }

    fn can_share(&self) -> bool {
        self.share.is_some()
    }

    async fn share(&self, title: &str, text: &str) -> HandoffResult<()> {
        self.record(HandoffCall::Share {
            title: title.to_string(),
            text: text.to_string(),
        });
        self.share
            .clone()
            .unwrap_or(Err(HandoffError::Unsupported("native share")))
    }

    async fn navigate(&self, url: &str) -> HandoffResult<()> {
        self.record(HandoffCall::Navigate(url.to_string()));
        self.navigate.clone()
    }

    async fn write_clipboard(&self, text: &str) -> HandoffResult<()> {
        self.record(HandoffCall::Clipboard(text.to_string()));
        self.clipboard.clone()
    }
}

/// Counts alarm and vibration requests.
#[derive(Debug, Default)]
pub struct RecordingAlarm {
    sounded: AtomicUsize,
    vibrations: Mutex<Vec<Vec<u64>>>,
}

impl RecordingAlarm {
    pub fn sounded(&self) -> usize {
        self.sounded.load(Ordering::SeqCst)
    }

    pub fn vibrations(&self) -> Vec<Vec<u64>> {
        self.vibrations.lock().unwrap().clone()
    }
}

impl Alarm for RecordingAlarm {
    fn sound(&self, _pattern: &AlarmPattern) {
        self.sounded.fetch_add(1, Ordering::SeqCst);
    }

    fn vibrate(&self, pattern: &[u64]) -> bool {
        self.vibrations.lock().unwrap().push(pattern.to_vec());
        true
    }
}

/// Keeps alerts in memory.
#[derive(Debug, Default)]
pub struct MemoryAlertRecorder {
    alerts: Mutex<Vec<SosAlert>>,
}

impl MemoryAlertRecorder {
    pub fn alerts(&self) -> Vec<SosAlert> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertRecorder for MemoryAlertRecorder {
    async fn record(&self, alert: NewSosAlert) -> Result<SosAlert> {
        let mut alerts = self.alerts.lock().unwrap();
        let stored = SosAlert {
            id: alerts.len() as i64 + 1,
            latitude: alert.latitude,
            longitude: alert.longitude,
            contacts_notified: alert.contacts_notified,
            created_at: Utc::now(),
        };
        alerts.push(stored.clone());
        Ok(stored)
    }
}
