//! User directory lookup

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::UserEntry;

/// A directory record: an opaque id plus named string fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub fields: HashMap<String, String>,
}

impl UserRecord {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            fields: HashMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

impl From<&UserEntry> for UserRecord {
    fn from(entry: &UserEntry) -> Self {
        Self {
            id: entry.id.clone(),
            fields: entry.fields.clone(),
        }
    }
}

/// Lookup interface over the application's user records
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Return records matching every `(field, value)` criterion
    async fn search(&self, criteria: &[(String, String)]) -> Vec<UserRecord>;

    /// Lookup by id; not-found yields `None`
    async fn retrieve(&self, id: &str) -> Option<UserRecord>;
}

/// In-memory directory over configured user records.
///
/// The configured password field is special-cased: when the stored value is a
/// bcrypt hash the criterion value is verified against it, otherwise the two
/// are compared byte for byte.
pub struct MemoryDirectory {
    password_field: String,
    users: Vec<UserRecord>,
}

impl MemoryDirectory {
    pub fn new(password_field: &str, users: Vec<UserRecord>) -> Self {
        Self {
            password_field: password_field.to_string(),
            users,
        }
    }

    pub fn from_entries(password_field: &str, entries: &[UserEntry]) -> Self {
        Self::new(password_field, entries.iter().map(UserRecord::from).collect())
    }

    fn field_matches(&self, record: &UserRecord, field: &str, value: &str) -> bool {
        let Some(stored) = record.field(field) else {
            return false;
        };
        if field == self.password_field && stored.starts_with("$2") {
            bcrypt::verify(value, stored).unwrap_or(false)
        } else {
            stored == value
        }
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn search(&self, criteria: &[(String, String)]) -> Vec<UserRecord> {
        self.users
            .iter()
            .filter(|record| {
                criteria
                    .iter()
                    .all(|(field, value)| self.field_matches(record, field, value))
            })
            .cloned()
            .collect()
    }

    async fn retrieve(&self, id: &str) -> Option<UserRecord> {
        self.users.iter().find(|record| record.id == id).cloned()
    }
}
