//! Message templates.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Title used for emergency shares and emails.
pub const EMERGENCY_TITLE: &str = "🚨 EMERGENCY ALERT";

/// Names the messages are signed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branding {
    /// Full application name, used in the signature line.
    pub app_name: String,
    /// Short name, used in titles.
    pub short_name: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            app_name: "Rakshika Safety App".to_string(),
            short_name: "Rakshika".to_string(),
        }
    }
}

impl Branding {
    /// The SOS message, with the map link when a fix was obtained.
    #[must_use]
    pub fn emergency_message(&self, location_url: Option<&str>) -> String {
        let mut message = String::from("🚨 EMERGENCY! I need help immediately!\n\n");
        match location_url {
            Some(url) => {
                message.push_str("My current location:\n");
                message.push_str(url);
                message.push_str("\n\n");
            }
            None => message.push_str("I couldn't share my exact location, but I need help now!\n\n"),
        }
        message.push_str("Please help me or contact authorities!\n\n- Sent from ");
        message.push_str(&self.app_name);
        message
    }

    /// Title of the live-location share sheet.
    #[must_use]
    pub fn live_location_title(&self) -> String {
        format!("{} - Live Location", self.short_name)
    }

    /// Text shared from a live location session.
    #[must_use]
    pub fn live_location_message(&self, maps_url: &str, generated_at: DateTime<Utc>) -> String {
        let local = generated_at.with_timezone(&Local);
        format!(
            "🚨 Emergency Location Alert from {}\n\nI'm sharing my live location with you.\n\nCurrent Location: {maps_url}\n\nThis link was generated at {}",
            self.short_name,
            local.format("%Y-%m-%d %H:%M:%S")
        )
    }
}
