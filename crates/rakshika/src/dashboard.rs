//! Account dashboard.

use serde::Serialize;
use tracing::debug;

use crate::account::UserIdentity;
use crate::alert::SosAlert;
use crate::contact::EmergencyContact;
use crate::error::Result;
use crate::storage::{Storage, StorageStats};

/// Alerts shown on the dashboard.
pub const RECENT_ALERT_LIMIT: usize = 10;

/// An alert row with its map link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEntry {
    /// The stored alert.
    #[serde(flatten)]
    pub alert: SosAlert,
    /// Map link, when the alert has coordinates.
    pub maps_url: Option<String>,
}

/// Everything the dashboard shows for one account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    /// Profile name, else email, else account id.
    pub display_name: String,
    /// Account contacts, newest first.
    pub contacts: Vec<EmergencyContact>,
    /// Most recent alerts, newest first.
    pub recent_alerts: Vec<AlertEntry>,
    /// Totals.
    pub stats: StorageStats,
}

impl DashboardView {
    /// Load the dashboard for `user`.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the reads fail.
    pub fn load(storage: &Storage, user: &UserIdentity, maps_base_url: &str) -> Result<Self> {
        let display_name = storage
            .display_name(&user.id)?
            .unwrap_or_else(|| user.fallback_name().to_string());
        let contacts = storage.list_contacts(&user.id)?;
        let recent_alerts = storage
            .recent_alerts(&user.id, RECENT_ALERT_LIMIT)?
            .into_iter()
            .map(|alert| AlertEntry {
                maps_url: alert.maps_url(maps_base_url),
                alert,
            })
            .collect::<Vec<_>>();
        let stats = storage.stats(&user.id)?;

        debug!(
            user = %user.id,
            contacts = contacts.len(),
            alerts = recent_alerts.len(),
            "Loaded dashboard"
        );
        Ok(Self {
            display_name,
            contacts,
            recent_alerts,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::NewSosAlert;
    use crate::contact::NewContact;

    const MAPS: &str = "https://www.google.com/maps";

    #[test]
    fn test_empty_dashboard_uses_email() {
        let storage = Storage::open_in_memory().unwrap();
        let user = UserIdentity::new("u1", Some("asha@example.com".to_string()));

        let view = DashboardView::load(&storage, &user, MAPS).unwrap();

        assert_eq!(view.display_name, "asha@example.com");
        assert!(view.contacts.is_empty());
        assert!(view.recent_alerts.is_empty());
        assert_eq!(view.stats.total_alerts, 0);
    }

    #[test]
    fn test_profile_name_wins() {
        let storage = Storage::open_in_memory().unwrap();
        storage.upsert_profile("u1", Some("Asha")).unwrap();
        let user = UserIdentity::new("u1", Some("asha@example.com".to_string()));

        let view = DashboardView::load(&storage, &user, MAPS).unwrap();
        assert_eq!(view.display_name, "Asha");
    }

    #[test]
    fn test_recent_alerts_capped_with_links() {
        let storage = Storage::open_in_memory().unwrap();
        for i in 0..12 {
            storage
                .insert_alert(
                    "u1",
                    &NewSosAlert {
                        latitude: Some(f64::from(i)),
                        longitude: Some(1.0),
                        contacts_notified: 1,
                    },
                )
                .unwrap();
        }
        storage.insert_alert("u1", &NewSosAlert::new(None, 0)).unwrap();
        storage
            .insert_contact("u1", &NewContact::parse("Mom", "9876543210", "91").unwrap())
            .unwrap();

        let view = DashboardView::load(&storage, &UserIdentity::new("u1", None), MAPS).unwrap();

        assert_eq!(view.recent_alerts.len(), RECENT_ALERT_LIMIT);
        assert!(view.recent_alerts[0].maps_url.is_none());
        assert_eq!(
            view.recent_alerts[1].maps_url.as_deref(),
            Some("https://www.google.com/maps?q=11,1")
        );
        assert_eq!(view.contacts.len(), 1);
        assert_eq!(view.stats.total_alerts, 13);
        assert_eq!(view.stats.total_contacts, 1);
    }

    #[test]
    fn test_other_users_hidden() {
        let storage = Storage::open_in_memory().unwrap();
        storage.insert_alert("u2", &NewSosAlert::new(None, 1)).unwrap();

        let view = DashboardView::load(&storage, &UserIdentity::new("u1", None), MAPS).unwrap();
        assert!(view.recent_alerts.is_empty());
        assert_eq!(view.display_name, "u1");
    }
}
