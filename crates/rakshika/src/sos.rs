//! SOS dispatch.
//!
//! One activation sounds the alarm, reads the trusted contacts, tries for a
//! location fix and then hands the emergency message to each contact in
//! turn. Hand-off is best effort: the host only tells us a channel was
//! opened, never that a message was delivered, so the final count is of
//! contacts *processed*.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::alarm::{Alarm, AlarmPattern, SOS_VIBRATION};
use crate::alert::{AlertRecorder, NewSosAlert, SosAlert};
use crate::contact::{ContactStore, EmergencyContact};
use crate::error::{Error, Result};
use crate::handoff::{deep_link_urls, mailto_url, sms_url, Channel, Handoff};
use crate::location::{GeolocationError, GeolocationProvider, LocationSample, PositionOptions};
use crate::message::{Branding, EMERGENCY_TITLE};
use crate::notify::{Notification, NotificationLevel, Notifier, NotifierExt};
use crate::platform::Platform;

/// Title of the backup-options dialog.
pub const FALLBACK_TITLE: &str = "WhatsApp Blocked - Use Backup Options";

/// Explanation shown under [`FALLBACK_TITLE`].
pub const FALLBACK_DESCRIPTION: &str =
    "Your browser or network blocked WhatsApp. Use one of these backup methods:";

/// Warning shown when an activation finds no contacts.
pub const NO_CONTACTS_MESSAGE: &str =
    "⚠️ No emergency contacts added. Please add contacts in the Emergency Contacts section.";

/// Whether an activation is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SosState {
    /// Ready to activate.
    Idle,
    /// Dispatching, or waiting out the reset delay.
    Activated,
}

impl fmt::Display for SosState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Activated => write!(f, "activated"),
        }
    }
}

/// Delays used by a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SosTimings {
    /// Contact `i` waits `i` times this before its hand-off.
    pub contact_stagger: Duration,
    /// Pause after each deep link that did not open.
    pub attempt_pause: Duration,
    /// Deadline for the one-shot location fix.
    pub location_timeout: Duration,
    /// Reset delay when there were no contacts.
    pub idle_without_contacts: Duration,
    /// Reset delay after a dispatch with a fix.
    pub idle_with_location: Duration,
    /// Reset delay after a dispatch without a fix.
    pub idle_without_location: Duration,
}

impl Default for SosTimings {
    fn default() -> Self {
        Self {
            contact_stagger: Duration::from_millis(250),
            attempt_pause: Duration::from_millis(250),
            location_timeout: Duration::from_secs(10),
            idle_without_contacts: Duration::from_millis(2000),
            idle_with_location: Duration::from_millis(5000),
            idle_without_location: Duration::from_millis(3000),
        }
    }
}

/// Host services a dispatch talks to.
#[derive(Clone)]
pub struct SosServices {
    /// Where the contacts come from.
    pub contacts: Arc<dyn ContactStore>,
    /// Position source.
    pub geolocation: Arc<dyn GeolocationProvider>,
    /// Hand-off channels.
    pub handoff: Arc<dyn Handoff>,
    /// Notification sink.
    pub notifier: Arc<dyn Notifier>,
    /// Alarm and vibration.
    pub alarm: Arc<dyn Alarm>,
    /// Alert history, when an account is signed in.
    pub recorder: Option<Arc<dyn AlertRecorder>>,
}

impl fmt::Debug for SosServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SosServices")
            .field("contacts", &self.contacts.backend())
            .field("recorder", &self.recorder.is_some())
            .finish_non_exhaustive()
    }
}

/// Everything about a dispatch that is not a host service.
#[derive(Debug, Clone, Default)]
pub struct SosSettings {
    /// Host identification, for the SMS fallback.
    pub platform: Platform,
    /// Names used in the message.
    pub branding: Branding,
    /// Base of the map link.
    pub maps_base_url: String,
    /// Delays.
    pub timings: SosTimings,
    /// Alarm tone.
    pub alarm: AlarmPattern,
}

/// What happened for one contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactOutcome {
    /// Contact id.
    pub contact_id: String,
    /// Contact name.
    pub contact_name: String,
    /// Channel that accepted the message, if any did.
    pub channel: Option<Channel>,
}

/// Result of one activation.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    /// Contacts handed to the dispatch loop.
    pub contacts_processed: usize,
    /// The fix the message carried, if any.
    pub location: Option<LocationSample>,
    /// Per-contact outcome, in stored order.
    pub outcomes: Vec<ContactOutcome>,
    /// Backup options, when the first contact fell through to the clipboard.
    #[serde(skip)]
    pub fallback: Option<FallbackDialog>,
    /// The recorded alert, when a recorder is attached.
    pub alert: Option<SosAlert>,
}

impl DispatchReport {
    fn empty() -> Self {
        Self {
            contacts_processed: 0,
            location: None,
            outcomes: Vec::new(),
            fallback: None,
            alert: None,
        }
    }
}

/// Try every deep-link form in order until the host reports an open window.
///
/// Waits `pause` after every attempt that did not open.
pub async fn try_deep_link(
    handoff: &dyn Handoff,
    dial_string: &str,
    message: &str,
    pause: Duration,
) -> bool {
    for (attempt, url) in deep_link_urls(dial_string, message).iter().enumerate() {
        match handoff.open_window(url).await {
            Ok(outcome) if outcome.is_open() => {
                debug!(attempt, "Deep link opened");
                return true;
            }
            Ok(outcome) => debug!(attempt, ?outcome, "Deep link not opened"),
            Err(err) => warn!(attempt, error = %err, "Failed to open deep link"),
        }
        tokio::time::sleep(pause).await;
    }
    false
}

/// A button in the backup-options dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackAction {
    /// Copy the message again.
    CopyMessage,
    /// Open the SMS composer. Mobile only.
    SendSms,
    /// Open the email composer.
    SendEmail,
    /// Walk the deep links again.
    RetryDeepLink,
}

impl FallbackAction {
    /// Button label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::CopyMessage => "Copy Message",
            Self::SendSms => "Send SMS",
            Self::SendEmail => "Send Email",
            Self::RetryDeepLink => "Try WhatsApp",
        }
    }
}

/// Backup options offered after the first contact's deep links, share
/// sheet and SMS all failed and the message went to the clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackDialog {
    message: String,
    dial_string: String,
    platform: Platform,
}

impl FallbackDialog {
    /// Create a dialog for `message` addressed to `dial_string`.
    #[must_use]
    pub fn new(message: impl Into<String>, dial_string: impl Into<String>, platform: Platform) -> Self {
        Self {
            message: message.into(),
            dial_string: dial_string.into(),
            platform,
        }
    }

    /// Dialog title.
    #[must_use]
    pub fn title(&self) -> &'static str {
        FALLBACK_TITLE
    }

    /// Dialog explanation.
    #[must_use]
    pub fn description(&self) -> &'static str {
        FALLBACK_DESCRIPTION
    }

    /// The emergency message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Recipient digits.
    #[must_use]
    pub fn dial_string(&self) -> &str {
        &self.dial_string
    }

    /// Buttons, in display order.
    #[must_use]
    pub fn actions(&self) -> Vec<FallbackAction> {
        let mut actions = vec![FallbackAction::CopyMessage];
        if self.platform.is_mobile() {
            actions.push(FallbackAction::SendSms);
        }
        actions.push(FallbackAction::SendEmail);
        actions.push(FallbackAction::RetryDeepLink);
        actions
    }

    /// Run `action`. Returns `true` when the dialog can be dismissed.
    pub async fn perform(
        &self,
        action: FallbackAction,
        handoff: &dyn Handoff,
        notifier: &dyn Notifier,
        attempt_pause: Duration,
    ) -> bool {
        match action {
            FallbackAction::CopyMessage => match handoff.write_clipboard(&self.message).await {
                Ok(()) => notifier.success("📋 Copied to clipboard"),
                Err(err) => {
                    warn!(error = %err, "Clipboard write failed");
                    notifier.error("❌ Could not copy the message");
                }
            },
            FallbackAction::SendSms => {
                if !self.platform.is_mobile() {
                    notifier.warning("SMS is only available on mobile devices");
                    return false;
                }
                let url = sms_url(&self.dial_string, &self.message, self.platform.is_ios());
                match handoff.navigate(&url).await {
                    Ok(()) => notifier.success("📱 Opening SMS app"),
                    Err(err) => {
                        warn!(error = %err, "SMS composer failed");
                        notifier.error("❌ Could not open the SMS app");
                    }
                }
            }
            FallbackAction::SendEmail => {
                match handoff.navigate(&mailto_url(EMERGENCY_TITLE, &self.message)).await {
                    Ok(()) => notifier.success("📧 Opening email app"),
                    Err(err) => {
                        warn!(error = %err, "Email composer failed");
                        notifier.error("❌ Could not open the email app");
                    }
                }
            }
            FallbackAction::RetryDeepLink => {
                if try_deep_link(handoff, &self.dial_string, &self.message, attempt_pause).await {
                    notifier.success("✅ WhatsApp opened");
                    return true;
                }
                notifier.error("❌ Still blocked. Try other options.");
            }
        }
        false
    }
}

/// Runs SOS activations.
///
/// At most one activation runs at a time. After the dispatch loop ends the
/// dispatcher stays `Activated` for a short delay before it can be
/// activated again.
pub struct SosDispatcher {
    services: SosServices,
    settings: SosSettings,
    active: Arc<AtomicBool>,
    reset: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for SosDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SosDispatcher")
            .field("services", &self.services)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl SosDispatcher {
    /// Create an idle dispatcher.
    #[must_use]
    pub fn new(services: SosServices, settings: SosSettings) -> Self {
        Self {
            services,
            settings,
            active: Arc::new(AtomicBool::new(false)),
            reset: Mutex::new(None),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SosState {
        if self.active.load(Ordering::SeqCst) {
            SosState::Activated
        } else {
            SosState::Idle
        }
    }

    /// Settings in use.
    #[must_use]
    pub fn settings(&self) -> &SosSettings {
        &self.settings
    }

    /// Run one activation to the end of the dispatch loop.
    ///
    /// Returns before the reset delay elapses; the state goes back to
    /// [`SosState::Idle`] on its own afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SosAlreadyActive`] while a previous activation is
    /// still in progress, or an error if the contacts cannot be read.
    pub async fn activate(&self) -> Result<DispatchReport> {
        if self.active.swap(true, Ordering::SeqCst) {
            debug!("SOS activation ignored; already active");
            return Err(Error::SosAlreadyActive);
        }
        info!("SOS activated");

        let result = self.dispatch().await;
        let timings = &self.settings.timings;
        let delay = match &result {
            Ok(report) if report.contacts_processed == 0 => timings.idle_without_contacts,
            Ok(report) if report.location.is_some() => timings.idle_with_location,
            _ => timings.idle_without_location,
        };
        self.schedule_reset(delay);
        result
    }

    fn schedule_reset(&self, delay: Duration) {
        let active = Arc::clone(&self.active);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            active.store(false, Ordering::SeqCst);
            debug!("SOS back to idle");
        });
        let mut slot = self.reset.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(task) {
            previous.abort();
        }
    }

    async fn dispatch(&self) -> Result<DispatchReport> {
        let notifier = self.services.notifier.as_ref();

        self.services.alarm.sound(&self.settings.alarm);
        if !self.services.alarm.vibrate(SOS_VIBRATION) {
            debug!("Vibration not supported");
        }
        notifier.notify(
            Notification::new(NotificationLevel::Error, "🚨 SOS Alert Activated!")
                .with_description("Sending emergency alerts to your contacts..."),
        );

        let contacts = match self.services.contacts.list().await {
            Ok(contacts) => contacts,
            Err(err) => {
                warn!(error = %err, "Could not read emergency contacts");
                notifier.error("❌ Could not load emergency contacts");
                return Err(err);
            }
        };
        if contacts.is_empty() {
            info!("No emergency contacts; nothing to dispatch");
            notifier.warning(NO_CONTACTS_MESSAGE);
            return Ok(DispatchReport::empty());
        }

        let location = self.locate().await;
        let maps_url = location
            .as_ref()
            .map(|sample| sample.maps_url(&self.settings.maps_base_url));
        let message = self.settings.branding.emergency_message(maps_url.as_deref());

        let mut report = DispatchReport {
            contacts_processed: contacts.len(),
            location,
            ..DispatchReport::empty()
        };

        let stagger = self.settings.timings.contact_stagger;
        for (index, contact) in contacts.iter().enumerate() {
            let factor = u32::try_from(index).unwrap_or(u32::MAX);
            tokio::time::sleep(stagger.saturating_mul(factor)).await;

            let (outcome, fallback) = self.hand_off(contact, &message, index == 0).await;
            if fallback.is_some() {
                report.fallback = fallback;
            }
            report.outcomes.push(outcome);
        }

        notifier.success(format!("✅ Processed {} contact(s)", report.contacts_processed));
        info!(
            contacts = report.contacts_processed,
            with_location = report.location.is_some(),
            "SOS dispatch finished"
        );

        if let Some(recorder) = &self.services.recorder {
            let alert = NewSosAlert::new(report.location.as_ref(), report.contacts_processed);
            match recorder.record(alert).await {
                Ok(stored) => report.alert = Some(stored),
                Err(err) => warn!(error = %err, "Failed to record SOS alert"),
            }
        }

        Ok(report)
    }

    async fn locate(&self) -> Option<LocationSample> {
        let notifier = self.services.notifier.as_ref();
        let geolocation = self.services.geolocation.as_ref();

        if !geolocation.is_supported() {
            notifier.error("❌ Geolocation not supported");
            notifier.info("Sending alerts without location...");
            return None;
        }

        let timeout = self.settings.timings.location_timeout;
        let options = PositionOptions::high_accuracy(timeout);
        let fix = tokio::time::timeout(timeout, geolocation.current_position(options))
            .await
            .unwrap_or(Err(GeolocationError::Timeout));
        match fix {
            Ok(sample) => {
                debug!(
                    latitude = sample.latitude,
                    longitude = sample.longitude,
                    "Emergency location"
                );
                notifier.success("📍 Location obtained");
                Some(sample)
            }
            Err(err) => {
                warn!(error = %err, "Location fix failed");
                let cause = match err {
                    GeolocationError::Unsupported => "",
                    other => other.user_message(),
                };
                notifier.error(format!("❌ Could not get location. {cause}").trim_end().to_string());
                notifier.info("Sending alerts without location...");
                None
            }
        }
    }

    async fn hand_off(
        &self,
        contact: &EmergencyContact,
        message: &str,
        first: bool,
    ) -> (ContactOutcome, Option<FallbackDialog>) {
        let handoff = self.services.handoff.as_ref();
        let notifier = self.services.notifier.as_ref();
        let platform = &self.settings.platform;
        let dial = contact.dial_string();

        let outcome = |channel: Option<Channel>| ContactOutcome {
            contact_id: contact.id.clone(),
            contact_name: contact.name.clone(),
            channel,
        };

        if try_deep_link(handoff, &dial, message, self.settings.timings.attempt_pause).await {
            notifier.success(format!("✅ WhatsApp opened for {}", contact.name));
            return (outcome(Some(Channel::DeepLink)), None);
        }

        // Only the first contact gets the share sheet, SMS and dialog.
        // Later contacts fall straight to a clipboard copy.
        if !first {
            return match handoff.write_clipboard(message).await {
                Ok(()) => {
                    notifier.info(format!("📋 Message for {} copied", contact.name));
                    (outcome(Some(Channel::Clipboard)), None)
                }
                Err(err) => {
                    warn!(contact = %contact.id, error = %err, "Clipboard write failed");
                    notifier.error(format!("❌ Could not copy message for {}", contact.name));
                    (outcome(None), None)
                }
            };
        }

        if handoff.can_share() {
            match handoff.share(EMERGENCY_TITLE, message).await {
                Ok(()) => {
                    notifier.success("✅ Shared via system share");
                    return (outcome(Some(Channel::NativeShare)), None);
                }
                Err(err) => warn!(error = %err, "Native share failed"),
            }
        }

        if platform.is_mobile() {
            match handoff.navigate(&sms_url(&dial, message, platform.is_ios())).await {
                Ok(()) => {
                    notifier.success("✅ Opened SMS app");
                    return (outcome(Some(Channel::Sms)), None);
                }
                Err(err) => warn!(error = %err, "SMS composer failed"),
            }
        }

        match handoff.write_clipboard(message).await {
            Ok(()) => {
                notifier.info("📋 Message copied. Please share manually.");
                let dialog = FallbackDialog::new(message, dial, platform.clone());
                (outcome(Some(Channel::Clipboard)), Some(dialog))
            }
            Err(err) => {
                warn!(contact = %contact.id, error = %err, "Clipboard write failed");
                notifier.error(format!("❌ Could not copy message for {}", contact.name));
                (outcome(None), None)
            }
        }
    }
}

impl Drop for SosDispatcher {
    fn drop(&mut self) {
        let slot = self.reset.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = slot.take() {
            task.abort();
        }
    }
}
