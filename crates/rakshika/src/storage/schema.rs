//! `SQLite` schema definitions for rakshika.
//!
//! Three account-scoped tables: trusted contacts, the SOS alert history and
//! user profiles. Every row carries the `user_id` of the account it
//! belongs to.

/// SQL statement to create the contacts table.
pub const CREATE_CONTACTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS contacts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    name TEXT NOT NULL,
    phone TEXT NOT NULL,
    country_code TEXT NOT NULL DEFAULT '91',
    created_at TEXT NOT NULL
)
";

/// SQL statement to index contacts by owner and age.
pub const CREATE_CONTACTS_USER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_contacts_user ON contacts(user_id, created_at DESC)
";

/// SQL statement to create the SOS alert history table.
pub const CREATE_SOS_ALERTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS sos_alerts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    latitude REAL,
    longitude REAL,
    contacts_notified INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
)
";

/// SQL statement to index alerts by owner and age.
pub const CREATE_SOS_ALERTS_USER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_sos_alerts_user ON sos_alerts(user_id, created_at DESC)
";

/// SQL statement to create the profiles table.
pub const CREATE_PROFILES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS profiles (
    user_id TEXT PRIMARY KEY,
    display_name TEXT
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_CONTACTS_TABLE,
    CREATE_CONTACTS_USER_INDEX,
    CREATE_SOS_ALERTS_TABLE,
    CREATE_SOS_ALERTS_USER_INDEX,
    CREATE_PROFILES_TABLE,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.trim().is_empty());
        }
    }

    #[test]
    fn test_contacts_table_columns() {
        assert!(CREATE_CONTACTS_TABLE.contains("user_id TEXT NOT NULL"));
        assert!(CREATE_CONTACTS_TABLE.contains("country_code TEXT NOT NULL DEFAULT '91'"));
        assert!(CREATE_CONTACTS_TABLE.contains("created_at TEXT NOT NULL"));
    }

    #[test]
    fn test_alerts_coordinates_nullable() {
        assert!(CREATE_SOS_ALERTS_TABLE.contains("latitude REAL,"));
        assert!(CREATE_SOS_ALERTS_TABLE.contains("longitude REAL,"));
        assert!(CREATE_SOS_ALERTS_TABLE.contains("contacts_notified INTEGER NOT NULL"));
    }
}
