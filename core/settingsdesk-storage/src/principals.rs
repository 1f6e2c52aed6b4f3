//! Principal (user) collection contract and the in-memory adapter.

use crate::error::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use settingsdesk_model::{display_text, loosely_equal, MetaConstraint, Principal};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;

/// Listing direction for principal queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl From<String> for SortDirection {
    fn from(tag: String) -> Self {
        if tag.eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }
}

impl From<SortDirection> for String {
    fn from(direction: SortDirection) -> Self {
        direction.to_string()
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("ASC"),
            Self::Desc => f.write_str("DESC"),
        }
    }
}

/// A paged principal query, ordered by a store-native key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrincipalQuery {
    #[serde(default)]
    pub role: Option<String>,
    pub page_size: usize,
    pub page: usize,
    #[serde(default = "default_order_by")]
    pub order_by: String,
    #[serde(default)]
    pub order_dir: SortDirection,
    #[serde(default)]
    pub meta: Vec<MetaConstraint>,
}

fn default_order_by() -> String {
    "ID".to_string()
}

impl PrincipalQuery {
    pub fn new(role: Option<String>) -> Self {
        Self {
            role,
            page_size: 0,
            page: 1,
            order_by: default_order_by(),
            order_dir: SortDirection::Desc,
            meta: Vec::new(),
        }
    }

    pub fn paged(mut self, page_size: usize, page: usize) -> Self {
        self.page_size = page_size;
        self.page = page;
        self
    }

    pub fn ordered(mut self, order_by: impl Into<String>, order_dir: SortDirection) -> Self {
        self.order_by = order_by.into();
        self.order_dir = order_dir;
        self
    }

    pub fn with_meta(mut self, constraint: MetaConstraint) -> Self {
        self.meta.push(constraint);
        self
    }

    fn matches(&self, principal: &Principal) -> bool {
        let role_ok = self.role.as_deref().is_none_or(|role| principal.has_role(role));
        role_ok
            && self.meta.iter().all(|c| {
                principal
                    .meta(&c.key)
                    .is_some_and(|stored| loosely_equal(stored, &c.value))
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrincipalPage {
    pub items: Vec<Principal>,
    pub total_found: usize,
}

/// The host's principal collection.
pub trait PrincipalStore: Send + Sync {
    fn query(&self, query: &PrincipalQuery) -> StorageResult<PrincipalPage>;

    fn get(&self, id: u64) -> StorageResult<Option<Principal>>;

    fn set_meta(&self, id: u64, key: &str, value: Value) -> StorageResult<()>;
}

/// Process-local principal store.
#[derive(Debug, Default)]
pub struct MemoryPrincipalStore {
    principals: Mutex<BTreeMap<u64, Principal>>,
}

impl MemoryPrincipalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, principal: Principal) -> StorageResult<()> {
        let mut principals = self
            .principals
            .lock()
            .map_err(|_| StorageError::Lock("principals"))?;
        principals.insert(principal.id, principal);
        Ok(())
    }
}

fn compare_by(order_by: &str, a: &Principal, b: &Principal) -> Ordering {
    match order_by {
        "ID" | "id" => a.id.cmp(&b.id),
        "user_login" | "login" => a.login.cmp(&b.login),
        "user_email" | "email" => a.email.cmp(&b.email),
        other => {
            let a = a.attribute(other).map(|v| display_text(&v)).unwrap_or_default();
            let b = b.attribute(other).map(|v| display_text(&v)).unwrap_or_default();
            a.cmp(&b)
        }
    }
}

impl PrincipalStore for MemoryPrincipalStore {
    fn query(&self, query: &PrincipalQuery) -> StorageResult<PrincipalPage> {
        let principals = self
            .principals
            .lock()
            .map_err(|_| StorageError::Lock("principals"))?;
        let mut matched: Vec<&Principal> =
            principals.values().filter(|p| query.matches(p)).collect();
        matched.sort_by(|a, b| {
            let ordering = compare_by(&query.order_by, a, b);
            match query.order_dir {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        let total_found = matched.len();
        let items = if query.page_size == 0 {
            matched.into_iter().cloned().collect()
        } else {
            let skip = query.page.saturating_sub(1).saturating_mul(query.page_size);
            matched
                .into_iter()
                .skip(skip)
                .take(query.page_size)
                .cloned()
                .collect()
        };
        Ok(PrincipalPage { items, total_found })
    }

    fn get(&self, id: u64) -> StorageResult<Option<Principal>> {
        let principals = self
            .principals
            .lock()
            .map_err(|_| StorageError::Lock("principals"))?;
        Ok(principals.get(&id).cloned())
    }

    fn set_meta(&self, id: u64, key: &str, value: Value) -> StorageResult<()> {
        let mut principals = self
            .principals
            .lock()
            .map_err(|_| StorageError::Lock("principals"))?;
        let principal = principals
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("principal {id}")))?;
        principal.meta.insert(key.to_string(), value);
        Ok(())
    }
}
