use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status given to trashed records.
pub const TRASH_STATUS: &str = "trash";

/// A lightweight record owned by the host's record store.
///
/// The engine only reads the declared attributes and `meta`, and writes
/// sanitized values back through the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub record_type: String,
    pub title: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl Record {
    /// Reads an auxiliary value.
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }

    /// Well-known attributes by their column name (`ID`, `post_title`,
    /// `post_status`, `post_date`).
    pub fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "ID" => Some(Value::from(self.id)),
            "post_title" => Some(Value::String(self.title.clone())),
            "post_status" => Some(Value::String(self.status.clone())),
            "post_date" => Some(Value::String(
                self.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            )),
            _ => None,
        }
    }

    pub fn is_trashed(&self) -> bool {
        self.status == TRASH_STATUS
    }
}

/// Fields for a record about to be created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRecord {
    pub record_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub meta: Map<String, Value>,
}

fn default_status() -> String {
    "publish".to_string()
}

impl NewRecord {
    pub fn new(record_type: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            title: title.into(),
            status: default_status(),
            meta: Map::new(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

/// A user-like entity owned by the host's principal store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub id: u64,
    pub login: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub meta: Map<String, Value>,
    /// Any further attributes the host exposes (display name, registration date, ...).
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl Principal {
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }

    /// Well-known attributes (`ID`, `user_login`, `user_email`), then any
    /// generic attribute the principal carries.
    pub fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "ID" => Some(Value::from(self.id)),
            "user_login" => Some(Value::String(self.login.clone())),
            "user_email" => Some(Value::String(self.email.clone())),
            other => self.attributes.get(other).cloned(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}
