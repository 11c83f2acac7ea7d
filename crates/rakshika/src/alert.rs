//! SOS alert history.
//!
//! One record is appended per SOS activation when an account is signed in.
//! Records are never updated.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::account::UserIdentity;
use crate::error::Result;
use crate::location::{maps_url, LocationSample};
use crate::storage::Storage;

/// A stored SOS activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SosAlert {
    /// Row id.
    pub id: i64,
    /// Latitude of the fix, if one was obtained.
    pub latitude: Option<f64>,
    /// Longitude of the fix, if one was obtained.
    pub longitude: Option<f64>,
    /// Contacts processed by the dispatch.
    pub contacts_notified: u32,
    /// When the alert was recorded.
    pub created_at: DateTime<Utc>,
}

impl SosAlert {
    /// Map link, when the alert carries coordinates.
    #[must_use]
    pub fn maps_url(&self, base_url: &str) -> Option<String> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(maps_url(base_url, lat, lng)),
            _ => None,
        }
    }
}

/// An alert about to be recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewSosAlert {
    /// Latitude of the fix, if any.
    pub latitude: Option<f64>,
    /// Longitude of the fix, if any.
    pub longitude: Option<f64>,
    /// Contacts processed.
    pub contacts_notified: u32,
}

impl NewSosAlert {
    /// Build from the dispatch outcome.
    #[must_use]
    pub fn new(location: Option<&LocationSample>, contacts_notified: usize) -> Self {
        Self {
            latitude: location.map(|l| l.latitude),
            longitude: location.map(|l| l.longitude),
            contacts_notified: u32::try_from(contacts_notified).unwrap_or(u32::MAX),
        }
    }
}

/// Destination for SOS alert records.
#[async_trait]
pub trait AlertRecorder: Send + Sync + fmt::Debug {
    /// Append one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    async fn record(&self, alert: NewSosAlert) -> Result<SosAlert>;
}

/// Writes alerts to the `sos_alerts` table for one account.
#[derive(Debug, Clone)]
pub struct RemoteAlertRecorder {
    storage: Arc<Storage>,
    user: UserIdentity,
}

impl RemoteAlertRecorder {
    /// Record alerts for `user` in `storage`.
    #[must_use]
    pub fn new(storage: Arc<Storage>, user: UserIdentity) -> Self {
        Self { storage, user }
    }
}

#[async_trait]
impl AlertRecorder for RemoteAlertRecorder {
    async fn record(&self, alert: NewSosAlert) -> Result<SosAlert> {
        let stored = self.storage.insert_alert(&self.user.id, &alert)?;
        info!(
            id = stored.id,
            contacts = stored.contacts_notified,
            has_location = stored.latitude.is_some(),
            "Recorded SOS alert"
        );
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_alert_from_location() {
        let sample = LocationSample::new(1.5, 2.5);
        let alert = NewSosAlert::new(Some(&sample), 3);
        assert_eq!(alert.latitude, Some(1.5));
        assert_eq!(alert.longitude, Some(2.5));
        assert_eq!(alert.contacts_notified, 3);
    }

    #[test]
    fn test_new_alert_without_location() {
        let alert = NewSosAlert::new(None, 0);
        assert!(alert.latitude.is_none());
        assert!(alert.longitude.is_none());
    }

    #[test]
    fn test_maps_url_needs_both_coordinates() {
        let mut alert = SosAlert {
            id: 1,
            latitude: Some(1.0),
            longitude: Some(2.0),
            contacts_notified: 1,
            created_at: Utc::now(),
        };
        assert_eq!(
            alert.maps_url("https://www.google.com/maps").as_deref(),
            Some("https://www.google.com/maps?q=1,2")
        );
        alert.longitude = None;
        assert!(alert.maps_url("https://www.google.com/maps").is_none());
    }

    #[tokio::test]
    async fn test_remote_recorder_appends() {
        let storage = Arc::new(Storage::open_in_memory().unwrap());
        let recorder = RemoteAlertRecorder::new(Arc::clone(&storage), UserIdentity::new("u", None));

        let stored = recorder.record(NewSosAlert::new(None, 2)).await.unwrap();
        assert_eq!(stored.contacts_notified, 2);
        assert_eq!(storage.count_alerts("u").unwrap(), 1);
    }
}
