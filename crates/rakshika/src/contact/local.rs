//! Contacts kept in the local key-value file.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use super::{ContactBackend, ContactStore, EmergencyContact, NewContact};
use crate::error::Result;
use crate::storage::LocalStorage;

/// Key the serialized contact list is stored under.
pub const CONTACTS_KEY: &str = "emergencyContacts";

/// Contacts serialized as one JSON array, rewritten on every change.
#[derive(Debug)]
pub struct LocalContactStore {
    storage: LocalStorage,
}

impl LocalContactStore {
    /// Store contacts in `storage`.
    #[must_use]
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    fn load(&self) -> Result<Vec<EmergencyContact>> {
        match self.storage.get_item(CONTACTS_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, contacts: &[EmergencyContact]) -> Result<()> {
        let raw = serde_json::to_string(contacts)?;
        self.storage.set_item(CONTACTS_KEY, &raw)
    }
}

/// Millisecond timestamp id, bumped past any id already in use.
fn next_id(existing: &[EmergencyContact]) -> String {
    let mut candidate = Utc::now().timestamp_millis();
    while existing.iter().any(|c| c.id == candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}

#[async_trait]
impl ContactStore for LocalContactStore {
    fn backend(&self) -> ContactBackend {
        ContactBackend::Local
    }

    async fn list(&self) -> Result<Vec<EmergencyContact>> {
        self.load()
    }

    async fn add(&self, name: &str, phone: &str, country_code: &str) -> Result<EmergencyContact> {
        let new_contact = NewContact::parse(name, phone, country_code)?;
        let mut contacts = self.load()?;
        let contact = new_contact.into_contact(next_id(&contacts));
        contacts.push(contact.clone());
        self.save(&contacts)?;
        info!(id = %contact.id, name = %contact.name, "Added emergency contact");
        Ok(contact)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut contacts = self.load()?;
        let before = contacts.len();
        contacts.retain(|c| c.id != id);
        if contacts.len() == before {
            debug!(id, "No contact with this id; nothing removed");
            return Ok(false);
        }
        self.save(&contacts)?;
        info!(id, "Removed emergency contact");
        Ok(true)
    }
}
