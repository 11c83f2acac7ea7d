//! Storage layer for rakshika.
//!
//! [`Storage`] is the relational store behind signed-in use: trusted
//! contacts, the SOS alert history and profiles, all scoped by user id.
//! [`LocalStorage`] is the key-value file used without an account.

pub mod local;
pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::alert::{NewSosAlert, SosAlert};
use crate::contact::{EmergencyContact, NewContact};
use crate::error::{Error, Result};

pub use local::LocalStorage;

/// Relational store for account data.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Mutex<Connection>,
}

/// Timestamps are stored with fixed precision so text order is time order.
fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw).map_or_else(
        |_| {
            warn!(raw, "Unparseable timestamp in database");
            DateTime::<Utc>::UNIX_EPOCH
        },
        |dt| dt.with_timezone(&Utc),
    )
}

fn limit_param(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::internal("database connection lock poisoned"))
    }

    // === Contacts ===

    /// Insert a contact owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_contact(&self, user_id: &str, contact: &NewContact) -> Result<EmergencyContact> {
        let conn = self.conn()?;
        conn.execute(
            r"
            INSERT INTO contacts (user_id, name, phone, country_code, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                user_id,
                contact.name,
                contact.phone,
                contact.country_code,
                timestamp_now(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!("Inserted contact with id {}", id);
        Ok(contact.clone().into_contact(id.to_string()))
    }

    /// Contacts owned by `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_contacts(&self, user_id: &str) -> Result<Vec<EmergencyContact>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r"
            SELECT id, name, phone, country_code
            FROM contacts WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC
            ",
        )?;

        let contacts = stmt
            .query_map([user_id], Self::row_to_contact)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(contacts)
    }

    /// Delete a contact owned by `user_id`.
    ///
    /// Returns `true` if a contact was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_contact(&self, user_id: &str, id: i64) -> Result<bool> {
        let affected = self.conn()?.execute(
            "DELETE FROM contacts WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(affected > 0)
    }

    /// Count contacts owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_contacts(&self, user_id: &str) -> Result<i64> {
        let count = self.conn()?.query_row(
            "SELECT COUNT(*) FROM contacts WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // === SOS alerts ===

    /// Append an alert record for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_alert(&self, user_id: &str, alert: &NewSosAlert) -> Result<SosAlert> {
        let created_at = timestamp_now();
        let conn = self.conn()?;
        conn.execute(
            r"
            INSERT INTO sos_alerts (user_id, latitude, longitude, contacts_notified, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                user_id,
                alert.latitude,
                alert.longitude,
                alert.contacts_notified,
                created_at,
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!("Inserted SOS alert with id {}", id);
        Ok(SosAlert {
            id,
            latitude: alert.latitude,
            longitude: alert.longitude,
            contacts_notified: alert.contacts_notified,
            created_at: parse_timestamp(&created_at),
        })
    }

    /// The most recent alerts for `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn recent_alerts(&self, user_id: &str, limit: usize) -> Result<Vec<SosAlert>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r"
            SELECT id, latitude, longitude, contacts_notified, created_at
            FROM sos_alerts WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC LIMIT ?2
            ",
        )?;

        let alerts = stmt
            .query_map(params![user_id, limit_param(limit)], Self::row_to_alert)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(alerts)
    }

    /// Count alerts recorded for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_alerts(&self, user_id: &str) -> Result<i64> {
        let count = self.conn()?.query_row(
            "SELECT COUNT(*) FROM sos_alerts WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // === Profiles ===

    /// Set the display name for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn upsert_profile(&self, user_id: &str, display_name: Option<&str>) -> Result<()> {
        self.conn()?.execute(
            r"
            INSERT INTO profiles (user_id, display_name) VALUES (?1, ?2)
            ON CONFLICT(user_id) DO UPDATE SET display_name = excluded.display_name
            ",
            params![user_id, display_name],
        )?;
        Ok(())
    }

    /// The display name for `user_id`, if a non-empty one is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn display_name(&self, user_id: &str) -> Result<Option<String>> {
        let name: Option<Option<String>> = self
            .conn()?
            .query_row(
                "SELECT display_name FROM profiles WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name.flatten().filter(|n| !n.trim().is_empty()))
    }

    /// Get per-account statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self, user_id: &str) -> Result<StorageStats> {
        let total_contacts = self.count_contacts(user_id)?;
        let total_alerts = self.count_alerts(user_id)?;

        let newest: Option<String> = self
            .conn()?
            .query_row(
                "SELECT created_at FROM sos_alerts WHERE user_id = ?1 ORDER BY created_at DESC LIMIT 1",
                [user_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(StorageStats {
            total_contacts,
            total_alerts,
            last_alert_at: newest.as_deref().map(parse_timestamp),
        })
    }

    fn row_to_contact(row: &rusqlite::Row) -> rusqlite::Result<EmergencyContact> {
        let id: i64 = row.get(0)?;
        Ok(EmergencyContact {
            id: id.to_string(),
            name: row.get(1)?,
            phone: row.get(2)?,
            country_code: row.get(3)?,
        })
    }

    fn row_to_alert(row: &rusqlite::Row) -> rusqlite::Result<SosAlert> {
        let created_at: String = row.get(4)?;
        Ok(SosAlert {
            id: row.get(0)?,
            latitude: row.get(1)?,
            longitude: row.get(2)?,
            contacts_notified: row.get(3)?,
            created_at: parse_timestamp(&created_at),
        })
    }
}

/// Per-account statistics.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StorageStats {
    /// Contacts stored.
    pub total_contacts: i64,
    /// Alerts recorded.
    pub total_alerts: i64,
    /// When the most recent alert was recorded.
    pub last_alert_at: Option<DateTime<Utc>>,
}
