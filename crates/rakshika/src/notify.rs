//! User-facing notifications.
//!
//! Every outcome of a hand-off or session change is reported through a
//! [`Notifier`]; nothing else records them.

use std::fmt;

use serde::Serialize;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    /// Something worked.
    Success,
    /// Neutral progress.
    Info,
    /// Needs the user's attention.
    Warning,
    /// Something failed.
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A single notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Severity.
    pub level: NotificationLevel,
    /// Headline text.
    pub title: String,
    /// Optional second line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Notification {
    /// Create a notification without a description.
    #[must_use]
    pub fn new(level: NotificationLevel, title: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            description: None,
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        if let Some(description) = &self.description {
            write!(f, " ({description})")?;
        }
        Ok(())
    }
}

/// Sink for notifications.
pub trait Notifier: Send + Sync {
    /// Show a notification.
    fn notify(&self, notification: Notification);
}

/// Shorthands for the common notification shapes.
pub trait NotifierExt {
    /// Show a success notification.
    fn success(&self, title: impl Into<String>);
    /// Show an informational notification.
    fn info(&self, title: impl Into<String>);
    /// Show a warning.
    fn warning(&self, title: impl Into<String>);
    /// Show an error.
    fn error(&self, title: impl Into<String>);
}

impl<T: Notifier + ?Sized> NotifierExt for T {
    fn success(&self, title: impl Into<String>) {
        self.notify(Notification::new(NotificationLevel::Success, title));
    }

    fn info(&self, title: impl Into<String>) {
        self.notify(Notification::new(NotificationLevel::Info, title));
    }

    fn warning(&self, title: impl Into<String>) {
        self.notify(Notification::new(NotificationLevel::Warning, title));
    }

    fn error(&self, title: impl Into<String>) {
        self.notify(Notification::new(NotificationLevel::Error, title));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_display() {
        assert_eq!(NotificationLevel::Success.to_string(), "success");
        assert_eq!(NotificationLevel::Warning.to_string(), "warning");
    }

    #[test]
    fn test_notification_display() {
        let n = Notification::new(NotificationLevel::Error, "🚨 SOS Alert Activated!")
            .with_description("Sending emergency alerts to your contacts...");
        assert_eq!(
            n.to_string(),
            "🚨 SOS Alert Activated! (Sending emergency alerts to your contacts...)"
        );
    }

    #[test]
    fn test_notification_serialize_skips_empty_description() {
        let n = Notification::new(NotificationLevel::Info, "hi");
        let json = serde_json::to_string(&n).unwrap();
        assert!(!json.contains("description"));
        assert!(json.contains("\"info\""));
    }
}
