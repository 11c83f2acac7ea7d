//! Wiring: builds the stores and host adapters a session needs from
//! configuration.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::alarm::AlarmPattern;
use crate::alert::{AlertRecorder, RemoteAlertRecorder};
use crate::config::Config;
use crate::contact::{ContactBackend, ContactStore, LocalContactStore, RemoteContactStore};
use crate::dashboard::DashboardView;
use crate::error::{Error, Result};
use crate::handoff::Handoff;
use crate::host::{configured_geolocation, DesktopHandoff, TerminalAlarmSink, TerminalNotifier};
use crate::location::GeolocationProvider;
use crate::notify::Notifier;
use crate::sharing::LiveLocationSession;
use crate::sos::{SosDispatcher, SosServices, SosSettings};
use crate::storage::{LocalStorage, Storage};

/// Everything one invocation works with.
pub struct AppContext {
    config: Config,
    storage: Option<Arc<Storage>>,
    contacts: Arc<dyn ContactStore>,
    recorder: Option<Arc<dyn AlertRecorder>>,
    geolocation: Arc<dyn GeolocationProvider>,
    handoff: Arc<dyn Handoff>,
    notifier: Arc<dyn Notifier>,
    alarm: Arc<TerminalAlarmSink>,
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("backend", &self.contacts.backend())
            .field("storage", &self.storage.as_ref().map(|s| s.path().to_path_buf()))
            .field("recording", &self.recorder.is_some())
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Build a desktop context from `config`.
    ///
    /// The relational store is opened only when an account is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote backend is selected without an
    /// account or the database cannot be opened.
    pub fn from_config(config: Config, quiet: bool) -> Result<Self> {
        let user = config.user();
        let storage = match &user {
            Some(_) => Some(Arc::new(Storage::open(config.database_path())?)),
            None => None,
        };

        let contacts: Arc<dyn ContactStore> = match (config.contacts.backend, &storage, &user) {
            (ContactBackend::Local, _, _) => Arc::new(LocalContactStore::new(LocalStorage::new(
                config.local_storage_path(),
            ))),
            (ContactBackend::Remote, Some(storage), Some(user)) => {
                Arc::new(RemoteContactStore::new(Arc::clone(storage), user.clone()))
            }
            (ContactBackend::Remote, _, _) => {
                return Err(Error::NotAuthenticated {
                    operation: "remote contacts",
                })
            }
        };

        let recorder: Option<Arc<dyn AlertRecorder>> = match (&storage, &user) {
            (Some(storage), Some(user))
                if config.contacts.backend == ContactBackend::Remote
                    && config.account.record_alerts =>
            {
                Some(Arc::new(RemoteAlertRecorder::new(Arc::clone(storage), user.clone()))
                    as Arc<dyn AlertRecorder>)
            }
            _ => None,
        };

        let geolocation = Arc::new(configured_geolocation(
            config.location.enabled,
            config.location.latitude,
            config.location.longitude,
            config.watch_interval(),
        ));

        info!(
            backend = %contacts.backend(),
            recording = recorder.is_some(),
            "Application context ready"
        );
        Ok(Self {
            alarm: Arc::new(TerminalAlarmSink::new(config.sos.alarm_enabled)),
            config,
            storage,
            contacts,
            recorder,
            geolocation,
            handoff: Arc::new(DesktopHandoff::new()),
            notifier: Arc::new(TerminalNotifier::new(quiet)),
        })
    }

    /// Loaded configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The active contact store.
    #[must_use]
    pub fn contacts(&self) -> &dyn ContactStore {
        self.contacts.as_ref()
    }

    /// Position source.
    #[must_use]
    pub fn geolocation(&self) -> &dyn GeolocationProvider {
        self.geolocation.as_ref()
    }

    /// Hand-off channels.
    #[must_use]
    pub fn handoff(&self) -> &dyn Handoff {
        self.handoff.as_ref()
    }

    /// Notification sink.
    #[must_use]
    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Wait for a sounding alarm to finish.
    pub async fn wait_for_alarm(&self) {
        self.alarm.wait().await;
    }

    /// A dispatcher wired to this context.
    #[must_use]
    pub fn sos_dispatcher(&self) -> SosDispatcher {
        let services = SosServices {
            contacts: Arc::clone(&self.contacts),
            geolocation: Arc::clone(&self.geolocation),
            handoff: Arc::clone(&self.handoff),
            notifier: Arc::clone(&self.notifier),
            alarm: self.alarm.clone(),
            recorder: self.recorder.clone(),
        };
        let settings = SosSettings {
            platform: self.config.platform(),
            branding: self.config.branding(),
            maps_base_url: self.config.maps.base_url.clone(),
            timings: self.config.sos_timings(),
            alarm: AlarmPattern::default(),
        };
        debug!(platform = settings.platform.kind(), "Building SOS dispatcher");
        SosDispatcher::new(services, settings)
    }

    /// A live sharing session wired to this context.
    #[must_use]
    pub fn live_session(&self) -> LiveLocationSession {
        LiveLocationSession::new(
            Arc::clone(&self.geolocation),
            Arc::clone(&self.handoff),
            Arc::clone(&self.notifier),
            self.config.branding(),
            self.config.maps.base_url.clone(),
            self.config.sharing_limits(),
        )
    }

    /// Load the dashboard for the configured account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAuthenticated`] without an account, or a storage
    /// error.
    pub fn dashboard(&self) -> Result<DashboardView> {
        match (&self.storage, self.config.user()) {
            (Some(storage), Some(user)) => {
                DashboardView::load(storage, &user, &self.config.maps.base_url)
            }
            _ => Err(Error::NotAuthenticated {
                operation: "dashboard",
            }),
        }
    }
}
