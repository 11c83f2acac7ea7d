//! Contacts kept in the account-scoped relational store.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{ContactBackend, ContactStore, EmergencyContact, NewContact};
use crate::account::UserIdentity;
use crate::error::Result;
use crate::storage::Storage;

/// Contacts in the `contacts` table, visible only to their owner.
#[derive(Debug, Clone)]
pub struct RemoteContactStore {
    storage: Arc<Storage>,
    user: UserIdentity,
}

impl RemoteContactStore {
    /// Scope `storage` to `user`.
    #[must_use]
    pub fn new(storage: Arc<Storage>, user: UserIdentity) -> Self {
        Self { storage, user }
    }

    /// The owning account.
    #[must_use]
    pub fn user(&self) -> &UserIdentity {
        &self.user
    }
}

#[async_trait]
impl ContactStore for RemoteContactStore {
    fn backend(&self) -> ContactBackend {
        ContactBackend::Remote
    }

    /// Newest first.
    async fn list(&self) -> Result<Vec<EmergencyContact>> {
        self.storage.list_contacts(&self.user.id)
    }

    async fn add(&self, name: &str, phone: &str, country_code: &str) -> Result<EmergencyContact> {
        let new_contact = NewContact::parse(name, phone, country_code)?;
        let contact = self.storage.insert_contact(&self.user.id, &new_contact)?;
        info!(id = %contact.id, user = %self.user.id, "Added emergency contact");
        Ok(contact)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let Ok(row_id) = id.parse::<i64>() else {
            debug!(id, "Not a stored contact id; nothing removed");
            return Ok(false);
        };
        self.storage.delete_contact(&self.user.id, row_id)
    }
}
