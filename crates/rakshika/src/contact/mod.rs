//! Trusted contacts.
//!
//! Contacts live in one of two stores behind [`ContactStore`]: a local
//! key-value file for anonymous use, or the account-scoped relational
//! store. A session uses exactly one of them; they are never merged.

pub mod local;
pub mod remote;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::phone;

pub use local::{LocalContactStore, CONTACTS_KEY};
pub use remote::RemoteContactStore;

/// Shown when the name or phone is blank.
pub const MISSING_FIELDS_MESSAGE: &str = "Please enter both name and phone number";

/// Shown when the phone has too few digits.
pub const INVALID_PHONE_MESSAGE: &str = "Please enter a valid phone number (at least 10 digits)";

/// Shown when the country code is not one to three digits.
pub const INVALID_COUNTRY_CODE_MESSAGE: &str = "Please select a valid country code";

fn default_country_code() -> String {
    phone::DEFAULT_COUNTRY_CODE.to_string()
}

/// A person who receives SOS alerts.
///
/// Uniqueness is by `id` only; two contacts may share a phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    /// Opaque identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Phone number as entered (trimmed).
    pub phone: String,
    /// Dialling code without `+`.
    #[serde(default = "default_country_code")]
    pub country_code: String,
}

impl EmergencyContact {
    /// Country-qualified digits for deep links.
    #[must_use]
    pub fn dial_string(&self) -> String {
        phone::to_dial_string(&self.phone, &self.country_code)
    }

    /// Number formatted for display, e.g. `+91 98765 43210`.
    #[must_use]
    pub fn display_phone(&self) -> String {
        format!("+{} {}", self.country_code, phone::to_display_string(&self.phone))
    }
}

/// A validated contact that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    /// Trimmed name.
    pub name: String,
    /// Trimmed phone.
    pub phone: String,
    /// Normalized dialling code.
    pub country_code: String,
}

impl NewContact {
    /// Validate raw form input.
    ///
    /// A blank country code falls back to the default one.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the name or phone is blank, the
    /// phone has fewer than ten digits, or the country code is malformed.
    pub fn parse(name: &str, phone: &str, country_code: &str) -> Result<Self> {
        let name = name.trim();
        let phone_number = phone.trim();
        if name.is_empty() || phone_number.is_empty() {
            return Err(Error::validation(MISSING_FIELDS_MESSAGE));
        }
        if !phone::validate(phone_number) {
            return Err(Error::validation(INVALID_PHONE_MESSAGE));
        }
        let country_code = if country_code.trim().is_empty() {
            default_country_code()
        } else {
            phone::normalize_country_code(country_code)
                .ok_or_else(|| Error::validation(INVALID_COUNTRY_CODE_MESSAGE))?
        };

        Ok(Self {
            name: name.to_string(),
            phone: phone_number.to_string(),
            country_code,
        })
    }

    /// Attach an id.
    #[must_use]
    pub fn into_contact(self, id: String) -> EmergencyContact {
        EmergencyContact {
            id,
            name: self.name,
            phone: self.phone,
            country_code: self.country_code,
        }
    }
}

/// Which store holds the contacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactBackend {
    /// Local key-value file, no account needed.
    #[default]
    Local,
    /// Account-scoped relational store.
    Remote,
}

impl fmt::Display for ContactBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// Create, list and delete trusted contacts. There is no edit.
#[async_trait::async_trait]
pub trait ContactStore: Send + Sync + fmt::Debug {
    /// Which backend this is.
    fn backend(&self) -> ContactBackend;

    /// All contacts in stored order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    async fn list(&self) -> Result<Vec<EmergencyContact>>;

    /// Validate and append a contact.
    ///
    /// # Errors
    ///
    /// Returns a validation error (and changes nothing) on bad input, or a
    /// storage error if the write fails.
    async fn add(&self, name: &str, phone: &str, country_code: &str) -> Result<EmergencyContact>;

    /// Remove the contact with `id`. Returns whether one was removed; an
    /// unknown id is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    async fn delete(&self, id: &str) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        let contact = NewContact::parse("  Mom ", " 98765 43210 ", "91").unwrap();
        assert_eq!(contact.name, "Mom");
        assert_eq!(contact.phone, "98765 43210");
        assert_eq!(contact.country_code, "91");
    }

    #[test]
    fn test_parse_rejects_blank_name() {
        let err = NewContact::parse("   ", "9876543210", "91").unwrap_err();
        assert_eq!(err.to_string(), MISSING_FIELDS_MESSAGE);
    }

    #[test]
    fn test_parse_rejects_blank_phone() {
        let err = NewContact::parse("Mom", "", "91").unwrap_err();
        assert_eq!(err.to_string(), MISSING_FIELDS_MESSAGE);
    }

    #[test]
    fn test_parse_rejects_short_phone() {
        let err = NewContact::parse("Mom", "12345", "91").unwrap_err();
        assert_eq!(err.to_string(), INVALID_PHONE_MESSAGE);
    }

    #[test]
    fn test_parse_country_code() {
        assert_eq!(
            NewContact::parse("A", "9876543210", "+44").unwrap().country_code,
            "44"
        );
        assert_eq!(
            NewContact::parse("A", "9876543210", "").unwrap().country_code,
            "91"
        );
        let err = NewContact::parse("A", "9876543210", "abc").unwrap_err();
        assert_eq!(err.to_string(), INVALID_COUNTRY_CODE_MESSAGE);
    }

    #[test]
    fn test_contact_dial_and_display() {
        let contact = NewContact::parse("Sister", "98765-43210", "91")
            .unwrap()
            .into_contact("1".to_string());
        assert_eq!(contact.dial_string(), "919876543210");
        assert_eq!(contact.display_phone(), "+91 98765 43210");
    }

    #[test]
    fn test_contact_serializes_camel_case() {
        let contact = NewContact::parse("A", "9876543210", "1")
            .unwrap()
            .into_contact("42".to_string());
        let json = serde_json::to_string(&contact).unwrap();
        assert!(json.contains("\"countryCode\":\"1\""));
    }

    #[test]
    fn test_contact_missing_country_code_defaults() {
        let json = r#"{"id":"1","name":"A","phone":"9876543210"}"#;
        let contact: EmergencyContact = serde_json::from_str(json).unwrap();
        assert_eq!(contact.country_code, "91");
    }

    #[test]
    fn test_backend_display() {
        assert_eq!(ContactBackend::Local.to_string(), "local");
        assert_eq!(ContactBackend::Remote.to_string(), "remote");
        assert_eq!(ContactBackend::default(), ContactBackend::Local);
    }
}
