//! Shared fixtures for engine tests.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{json, Map, Value};
use settingsdesk_engine::{SettingsEngine, StaticSchema};
use settingsdesk_model::{NewRecord, Principal};
use settingsdesk_storage::{
    MemoryOptionStore, MemoryPrincipalStore, MemoryRecordStore, OptionStore, StorageError,
    StorageResult,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Two settings pages (declared out of order) plus donation and donor views.
pub fn schema() -> Value {
    json!({
        "pages": [
            {"advanced": {
                "name": "Advanced",
                "order": 2,
                "tabs": [{"name": "Main", "options": [{
                    "title": "Theme",
                    "fields": [{"name": "theme[colors][primary]", "type": "color"}]
                }]}]
            }},
            {"general": {
                "name": "General",
                "order": 1,
                "tabs": [{"name": "Main", "options": [{
                    "title": "Site",
                    "isPro": false,
                    "fields": [
                        {"name": "site_title", "type": "input", "value": "Default"},
                        {"name": "theme[layout]", "type": "select"}
                    ]
                }]}]
            }}
        ],
        "donations": {
            "view": {
                "post_type": "donation",
                "edit_post": [{
                    "title": "Donation",
                    "fields": [
                        {"name": "post_title", "type": "input"},
                        {"name": "mode", "type": "select", "value": "basic"},
                        {"name": "amount", "type": "input", "condition": [{"key": "mode", "value": "advanced"}]},
                        {"name": "note", "type": "textarea", "condition": [{"key": "mode", "value": "basic"}]},
                        {"name": "body", "type": "html"}
                    ]
                }],
                "columns": {
                    "title": {"col": "post_title", "type": "", "name": "Title"},
                    "amount": {"col": "amount", "type": "meta", "name": "Amount"},
                    "payments": {"col": "payment", "type": "posts", "name": "Payments", "relation_meta": "donation_id"}
                }
            }
        },
        "donors": {
            "view": {
                "role": "donor",
                "edit_post": [{"title": "Donor", "fields": [
                    {"name": "user_email", "type": "input"},
                    {"name": "city", "type": "input"}
                ]}],
                "columns": {
                    "login": {"col": "user_login", "name": "Login"},
                    "email": {"col": "user_email", "name": "Email"},
                    "city": {"col": "city", "type": "meta", "name": "City"},
                    "donations": {"col": "donation", "type": "posts", "name": "Donations", "relation_meta": "donor_id"}
                }
            }
        }
    })
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

/// Donations 1 and 2, payments 3 (→1), 4 (→1, draft) and 5 (→2).
pub fn seeded_records() -> Arc<MemoryRecordStore> {
    let store = MemoryRecordStore::new();
    let when = at(2024, 3, 1, 9, 30);
    store
        .create_at(
            NewRecord::new("donation", "First")
                .with_meta("amount", 10)
                .with_meta("donor_id", 1),
            when,
        )
        .unwrap();
    store
        .create_at(
            NewRecord::new("donation", "Second")
                .with_meta("amount", "25")
                .with_meta("donor_id", 2),
            when,
        )
        .unwrap();
    store
        .create_at(NewRecord::new("payment", "P1").with_meta("donation_id", 1), when)
        .unwrap();
    store
        .create_at(
            NewRecord {
                status: "draft".into(),
                ..NewRecord::new("payment", "P2").with_meta("donation_id", "1")
            },
            when,
        )
        .unwrap();
    store
        .create_at(NewRecord::new("payment", "P3").with_meta("donation_id", 2), when)
        .unwrap();
    Arc::new(store)
}

pub fn principal(id: u64, login: &str, role: &str, city: &str) -> Principal {
    let mut meta = Map::new();
    meta.insert("city".into(), json!(city));
    Principal {
        id,
        login: login.into(),
        email: format!("{login}@example.org"),
        roles: vec![role.into()],
        meta,
        attributes: Map::new(),
    }
}

pub fn seeded_principals() -> Arc<MemoryPrincipalStore> {
    let store = MemoryPrincipalStore::new();
    store.insert(principal(1, "alice", "donor", "Oslo")).unwrap();
    store.insert(principal(2, "bob", "donor", "Rome")).unwrap();
    store.insert(principal(3, "carol", "admin", "Lima")).unwrap();
    Arc::new(store)
}

pub fn engine_with(options: Arc<dyn OptionStore>) -> SettingsEngine {
    SettingsEngine::new(options, StaticSchema(schema()))
        .with_records(seeded_records())
        .with_principals(seeded_principals())
}

pub fn engine() -> SettingsEngine {
    engine_with(Arc::new(MemoryOptionStore::new()))
}

/// Option store that counts writes.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryOptionStore,
    pub writes: AtomicUsize,
}

impl CountingStore {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl OptionStore for CountingStore {
    fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &Value) -> StorageResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value)
    }
}

/// Option store whose writes always fail.
pub struct FailingStore;

impl OptionStore for FailingStore {
    fn get(&self, _key: &str) -> StorageResult<Option<Value>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &Value) -> StorageResult<()> {
        Err(StorageError::InvalidData("disk full".into()))
    }
}
