//! Configuration management for rakshika.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::account::UserIdentity;
use crate::contact::ContactBackend;
use crate::error::{Error, Result};
use crate::message::Branding;
use crate::phone;
use crate::platform::Platform;
use crate::sharing::SharingLimits;
use crate::sos::SosTimings;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "rakshika";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "rakshika.db";

/// Default local key-value file name.
const LOCAL_STORAGE_FILE_NAME: &str = "local-storage.json";

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "RAKSHIKA_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `RAKSHIKA_`, `__` between levels)
/// 2. TOML config file at `~/.config/rakshika/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application identity.
    pub app: AppConfig,
    /// Contact store selection.
    pub contacts: ContactsConfig,
    /// Relational store.
    pub database: DatabaseConfig,
    /// Signed-in account.
    pub account: AccountConfig,
    /// SOS dispatch.
    pub sos: SosConfig,
    /// Live location sharing.
    pub sharing: SharingConfig,
    /// Position source.
    pub location: LocationConfig,
    /// Map links.
    pub maps: MapsConfig,
}

/// Application identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Name in the message signature.
    pub name: String,
    /// Name in share titles.
    pub short_name: String,
    /// Host identification string used for platform detection.
    /// Defaults to a desktop string for the current OS.
    pub user_agent: Option<String>,
}

/// Contact store selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactsConfig {
    /// `local` or `remote`.
    pub backend: ContactBackend,
    /// Path to the local key-value file.
    /// Defaults to `~/.local/share/rakshika/local-storage.json`
    pub local_storage_path: Option<PathBuf>,
    /// Country code used when none is given.
    pub default_country_code: String,
}

/// Relational store configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/rakshika/rakshika.db`
    pub path: Option<PathBuf>,
}

/// Signed-in account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Account id. Required for the remote backend and the dashboard.
    pub user_id: Option<String>,
    /// Sign-in email.
    pub email: Option<String>,
    /// Record an alert row per SOS activation.
    pub record_alerts: bool,
}

/// SOS dispatch configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SosConfig {
    /// Delay multiplier between contacts.
    pub contact_stagger_ms: u64,
    /// Pause after each failed deep link.
    pub attempt_pause_ms: u64,
    /// One-shot fix deadline.
    pub location_timeout_ms: u64,
    /// Reset delay with no contacts.
    pub idle_without_contacts_ms: u64,
    /// Reset delay after a dispatch with a fix.
    pub idle_with_location_ms: u64,
    /// Reset delay after a dispatch without a fix.
    pub idle_without_location_ms: u64,
    /// Sound the terminal alarm.
    pub alarm_enabled: bool,
}

/// Live sharing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharingConfig {
    /// Duration used when none is given.
    pub default_minutes: u32,
    /// Shortest session.
    pub min_minutes: u32,
    /// Longest session.
    pub max_minutes: u32,
    /// Per-fix deadline for the watch.
    pub watch_timeout_ms: u64,
}

/// Position source configuration.
///
/// A desktop has no positioning hardware, so the position is configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// When false, geolocation is reported as unsupported.
    pub enabled: bool,
    /// Configured latitude.
    pub latitude: Option<f64>,
    /// Configured longitude.
    pub longitude: Option<f64>,
    /// How often a watch reports the position.
    pub watch_interval_ms: u64,
}

/// Map link configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapsConfig {
    /// Base URL; `?q=<lat>,<lng>` is appended.
    pub base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let branding = Branding::default();
        Self {
            name: branding.app_name,
            short_name: branding.short_name,
            user_agent: None,
        }
    }
}

impl Default for ContactsConfig {
    fn default() -> Self {
        Self {
            backend: ContactBackend::Local,
            local_storage_path: None, // Will be resolved to default at runtime
            default_country_code: phone::DEFAULT_COUNTRY_CODE.to_string(),
        }
    }
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            user_id: None,
            email: None,
            record_alerts: true,
        }
    }
}

impl Default for SosConfig {
    fn default() -> Self {
        Self {
            contact_stagger_ms: 250,
            attempt_pause_ms: 250,
            location_timeout_ms: 10_000,
            idle_without_contacts_ms: 2000,
            idle_with_location_ms: 5000,
            idle_without_location_ms: 3000,
            alarm_enabled: true,
        }
    }
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            default_minutes: 30,
            min_minutes: 5,
            max_minutes: 240,
            watch_timeout_ms: 5000,
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            latitude: None,
            longitude: None,
            watch_interval_ms: 5000,
        }
    }
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.google.com/maps".to_string(),
        }
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::ConfigValidation {
        message: message.into(),
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let config: Config = Self::figment(config_file).extract()?;
        config.validate()?;
        Ok(config)
    }

    fn figment(config_file: PathBuf) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.app.name.trim().is_empty() || self.app.short_name.trim().is_empty() {
            return Err(invalid("app name and short_name must not be empty"));
        }

        if phone::normalize_country_code(&self.contacts.default_country_code).is_none() {
            return Err(invalid(format!(
                "default_country_code must be 1 to 3 digits, got {:?}",
                self.contacts.default_country_code
            )));
        }

        if self.contacts.backend == ContactBackend::Remote && self.account.user_id.is_none() {
            return Err(invalid("the remote contact backend requires account.user_id"));
        }

        if self.sos.location_timeout_ms == 0 {
            return Err(invalid("location_timeout_ms must be greater than 0"));
        }

        let sharing = &self.sharing;
        if sharing.min_minutes == 0 || sharing.min_minutes > sharing.max_minutes {
            return Err(invalid(format!(
                "sharing min_minutes ({}) must be at least 1 and not above max_minutes ({})",
                sharing.min_minutes, sharing.max_minutes
            )));
        }
        if !(sharing.min_minutes..=sharing.max_minutes).contains(&sharing.default_minutes) {
            return Err(invalid(format!(
                "sharing default_minutes ({}) must be between {} and {}",
                sharing.default_minutes, sharing.min_minutes, sharing.max_minutes
            )));
        }

        let location = &self.location;
        match (location.latitude, location.longitude) {
            (Some(lat), Some(lng)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    return Err(invalid(format!("latitude {lat} is out of range")));
                }
                if !(-180.0..=180.0).contains(&lng) {
                    return Err(invalid(format!("longitude {lng} is out of range")));
                }
            }
            (None, None) => {}
            _ => return Err(invalid("latitude and longitude must be set together")),
        }
        if location.watch_interval_ms == 0 {
            return Err(invalid("watch_interval_ms must be greater than 0"));
        }

        if !self.maps.base_url.starts_with("http://") && !self.maps.base_url.starts_with("https://") {
            return Err(invalid(format!(
                "maps base_url must be an http(s) URL, got {:?}",
                self.maps.base_url
            )));
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the local key-value file path, resolving defaults if not set.
    #[must_use]
    pub fn local_storage_path(&self) -> PathBuf {
        self.contacts
            .local_storage_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(LOCAL_STORAGE_FILE_NAME))
    }

    /// The signed-in account, if one is configured.
    #[must_use]
    pub fn user(&self) -> Option<UserIdentity> {
        self.account
            .user_id
            .as_ref()
            .map(|id| UserIdentity::new(id.clone(), self.account.email.clone()))
    }

    /// Message branding.
    #[must_use]
    pub fn branding(&self) -> Branding {
        Branding {
            app_name: self.app.name.clone(),
            short_name: self.app.short_name.clone(),
        }
    }

    /// Platform from the configured identification string.
    #[must_use]
    pub fn platform(&self) -> Platform {
        self.app
            .user_agent
            .as_ref()
            .map_or_else(Platform::default, Platform::new)
    }

    /// SOS delays.
    #[must_use]
    pub fn sos_timings(&self) -> SosTimings {
        SosTimings {
            contact_stagger: Duration::from_millis(self.sos.contact_stagger_ms),
            attempt_pause: Duration::from_millis(self.sos.attempt_pause_ms),
            location_timeout: Duration::from_millis(self.sos.location_timeout_ms),
            idle_without_contacts: Duration::from_millis(self.sos.idle_without_contacts_ms),
            idle_with_location: Duration::from_millis(self.sos.idle_with_location_ms),
            idle_without_location: Duration::from_millis(self.sos.idle_without_location_ms),
        }
    }

    /// Live sharing bounds.
    #[must_use]
    pub fn sharing_limits(&self) -> SharingLimits {
        SharingLimits {
            default_minutes: self.sharing.default_minutes,
            min_minutes: self.sharing.min_minutes,
            max_minutes: self.sharing.max_minutes,
            watch_timeout: Duration::from_millis(self.sharing.watch_timeout_ms),
        }
    }

    /// Interval between watch updates.
    #[must_use]
    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.location.watch_interval_ms)
    }
}
