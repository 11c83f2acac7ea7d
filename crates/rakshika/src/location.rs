//! Geolocation abstraction.
//!
//! Hosts provide positions through [`GeolocationProvider`]: a one-shot fix
//! as a single future, and a continuous watch as a stream of updates paired
//! with a [`WatchHandle`] that releases the watch when cleared or dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::notify::{Notifier, NotifierExt};

/// Why a position could not be obtained.
///
/// The first three variants carry the standard geolocation error codes
/// (1, 2 and 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeolocationError {
    /// The user or host refused location access.
    #[error("location access denied")]
    PermissionDenied,

    /// No position source could produce a fix.
    #[error("location unavailable")]
    PositionUnavailable,

    /// No fix arrived before the deadline.
    #[error("location request timed out")]
    Timeout,

    /// The host has no geolocation support at all.
    #[error("geolocation not supported")]
    Unsupported,
}

impl GeolocationError {
    /// Numeric code, when the error maps to one.
    #[must_use]
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::PermissionDenied => Some(1),
            Self::PositionUnavailable => Some(2),
            Self::Timeout => Some(3),
            Self::Unsupported => None,
        }
    }

    /// Short sentence appended to SOS notifications.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "Location access denied.",
            Self::PositionUnavailable => "Location unavailable.",
            Self::Timeout => "Location request timed out.",
            Self::Unsupported => "Geolocation not supported.",
        }
    }

    /// Longer guidance used by the location access test.
    #[must_use]
    pub fn guidance(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Permission denied. Please enable location access in your settings."
            }
            Self::PositionUnavailable => "Location unavailable. Check your device settings.",
            Self::Timeout => "Request timed out. Please try again.",
            Self::Unsupported => "Geolocation is not supported on this device.",
        }
    }
}

/// One position fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    /// Degrees north.
    pub latitude: f64,
    /// Degrees east.
    pub longitude: f64,
    /// When the fix was captured.
    pub timestamp: DateTime<Utc>,
}

impl LocationSample {
    /// Create a sample captured now.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp: Utc::now(),
        }
    }

    /// Map link pointing at this sample.
    #[must_use]
    pub fn maps_url(&self, base_url: &str) -> String {
        maps_url(base_url, self.latitude, self.longitude)
    }

    /// Coordinates with six decimal places.
    #[must_use]
    pub fn coordinates_label(&self) -> String {
        format!("{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// Build a map link of the form `<base>?q=<lat>,<lng>`.
#[must_use]
pub fn maps_url(base_url: &str, latitude: f64, longitude: f64) -> String {
    format!("{base_url}?q={latitude},{longitude}")
}

/// Options for a position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    /// Prefer the most accurate source available.
    pub high_accuracy: bool,
    /// Give up after this long.
    pub timeout: Duration,
    /// Accept a cached fix no older than this.
    pub maximum_age: Duration,
}

impl PositionOptions {
    /// High accuracy, no cached fixes, the given timeout.
    #[must_use]
    pub fn high_accuracy(timeout: Duration) -> Self {
        Self {
            high_accuracy: true,
            timeout,
            maximum_age: Duration::ZERO,
        }
    }
}

/// Observer side of a watch: providers poll it to learn the watch was
/// released.
#[derive(Debug, Clone)]
pub struct WatchSignal {
    cleared: Arc<AtomicBool>,
}

impl WatchSignal {
    /// Check whether the owning handle has been cleared.
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        self.cleared.load(Ordering::SeqCst)
    }
}

/// Owner side of a continuous position watch.
///
/// Clearing the handle, explicitly or by dropping it, tells the provider to
/// stop producing updates.
#[derive(Debug)]
pub struct WatchHandle {
    id: u64,
    cleared: Arc<AtomicBool>,
}

impl WatchHandle {
    /// Create a handle with the provider-assigned id.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            cleared: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Provider-assigned watch id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Signal the provider observes.
    #[must_use]
    pub fn signal(&self) -> WatchSignal {
        WatchSignal {
            cleared: Arc::clone(&self.cleared),
        }
    }

    /// Release the watch.
    pub fn clear(&self) {
        if !self.cleared.swap(true, Ordering::SeqCst) {
            debug!(watch_id = self.id, "Position watch cleared");
        }
    }

    /// Check whether the watch was released.
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        self.cleared.load(Ordering::SeqCst)
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Update delivered by a position watch.
pub type PositionUpdate = std::result::Result<LocationSample, GeolocationError>;

/// A running position watch.
#[derive(Debug)]
pub struct PositionWatch {
    /// Releases the watch.
    pub handle: WatchHandle,
    /// Position changes in arrival order.
    pub updates: mpsc::Receiver<PositionUpdate>,
}

/// A source of device positions.
#[async_trait::async_trait]
pub trait GeolocationProvider: Send + Sync {
    /// Whether the host can produce positions at all.
    fn is_supported(&self) -> bool;

    /// Request a single fix.
    ///
    /// # Errors
    ///
    /// Returns why no fix could be produced.
    async fn current_position(
        &self,
        options: PositionOptions,
    ) -> std::result::Result<LocationSample, GeolocationError>;

    /// Start a continuous watch, driven by the host's position changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the watch cannot be started.
    fn watch_position(
        &self,
        options: PositionOptions,
    ) -> std::result::Result<PositionWatch, GeolocationError>;
}

/// Check that location access works and report the outcome.
pub async fn test_location_access(
    geolocation: &dyn GeolocationProvider,
    notifier: &dyn Notifier,
    timeout: Duration,
) -> Option<LocationSample> {
    notifier.info("Testing location access...");

    if !geolocation.is_supported() {
        notifier.error("❌ Geolocation not supported on this device");
        return None;
    }

    match geolocation
        .current_position(PositionOptions::high_accuracy(timeout))
        .await
    {
        Ok(sample) => {
            notifier.success(format!(
                "✅ Location access working!\nLat: {:.6}, Lng: {:.6}",
                sample.latitude, sample.longitude
            ));
            Some(sample)
        }
        Err(err) => {
            warn!(error = %err, "Location access test failed");
            notifier.error(format!("❌ Location test failed: {}", err.guidance()));
            None
        }
    }
}
