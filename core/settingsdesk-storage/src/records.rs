//! Record collection contract and the in-memory adapter.

use crate::error::{StorageError, StorageResult};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use settingsdesk_model::{loosely_equal, MetaConstraint, NewRecord, Record, TRASH_STATUS};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::debug;

/// Meta key remembering a trashed record's previous status.
const TRASH_META_STATUS: &str = "_trash_meta_status";

/// A paged, filtered record query.
///
/// `status: None` means every status except trash. `page_size: 0` returns
/// all matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordQuery {
    pub record_type: String,
    #[serde(default)]
    pub status: Option<String>,
    pub page_size: usize,
    pub page: usize,
    #[serde(default)]
    pub meta: Vec<MetaConstraint>,
}

impl RecordQuery {
    pub fn new(record_type: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            status: None,
            page_size: 0,
            page: 1,
            meta: Vec::new(),
        }
    }

    pub fn paged(mut self, page_size: usize, page: usize) -> Self {
        self.page_size = page_size;
        self.page = page;
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_meta(mut self, constraint: MetaConstraint) -> Self {
        self.meta.push(constraint);
        self
    }

    fn matches(&self, record: &Record) -> bool {
        if record.record_type != self.record_type {
            return false;
        }
        let status_ok = match &self.status {
            Some(status) => record.status == *status,
            None => !record.is_trashed(),
        };
        status_ok
            && self.meta.iter().all(|c| {
                record
                    .meta(&c.key)
                    .is_some_and(|stored| loosely_equal(stored, &c.value))
            })
    }
}

/// One page of records plus the unpaged match count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordPage {
    pub items: Vec<Record>,
    pub total_found: usize,
}

/// The host's record collection.
pub trait RecordStore: Send + Sync {
    fn query(&self, query: &RecordQuery) -> StorageResult<RecordPage>;

    /// Number of records matching `query`, ignoring its paging.
    fn count(&self, query: &RecordQuery) -> StorageResult<usize> {
        let probe = query.clone().paged(1, 1);
        Ok(self.query(&probe)?.total_found)
    }

    fn get(&self, id: u64) -> StorageResult<Option<Record>>;

    /// Creates a record and returns its identifier.
    fn create(&self, record: NewRecord) -> StorageResult<u64>;

    fn set_meta(&self, id: u64, key: &str, value: Value) -> StorageResult<()>;

    /// Moves a record to the trash. Returns false when nothing changed.
    fn trash(&self, id: u64) -> StorageResult<bool>;

    /// Restores a trashed record to its previous status.
    fn restore(&self, id: u64) -> StorageResult<bool>;
}

#[derive(Debug, Default)]
struct RecordTable {
    records: BTreeMap<u64, Record>,
    next_id: u64,
}

/// Process-local record store. Listings are newest first.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    inner: Mutex<RecordTable>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully specified record, keeping its identifier.
    pub fn insert(&self, record: Record) -> StorageResult<()> {
        let mut table = self.inner.lock().map_err(|_| StorageError::Lock("records"))?;
        table.next_id = table.next_id.max(record.id);
        table.records.insert(record.id, record);
        Ok(())
    }

    /// Creates a record with an explicit creation time.
    pub fn create_at(&self, record: NewRecord, created_at: NaiveDateTime) -> StorageResult<u64> {
        if record.record_type.trim().is_empty() {
            return Err(StorageError::InvalidData("record type is required".into()));
        }
        let mut table = self.inner.lock().map_err(|_| StorageError::Lock("records"))?;
        table.next_id += 1;
        let id = table.next_id;
        table.records.insert(
            id,
            Record {
                id,
                record_type: record.record_type,
                title: record.title,
                status: record.status,
                created_at,
                meta: record.meta,
            },
        );
        debug!(record_id = id, "Record created");
        Ok(id)
    }
}

impl RecordStore for MemoryRecordStore {
    fn query(&self, query: &RecordQuery) -> StorageResult<RecordPage> {
        let table = self.inner.lock().map_err(|_| StorageError::Lock("records"))?;
        let matched: Vec<&Record> = table
            .records
            .values()
            .rev()
            .filter(|r| query.matches(r))
            .collect();
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
        Ok(RecordPage { items, total_found })
    }

    fn get(&self, id: u64) -> StorageResult<Option<Record>> {
        let table = self.inner.lock().map_err(|_| StorageError::Lock("records"))?;
        Ok(table.records.get(&id).cloned())
    }

    fn create(&self, record: NewRecord) -> StorageResult<u64> {
        self.create_at(record, Utc::now().naive_utc())
    }

    fn set_meta(&self, id: u64, key: &str, value: Value) -> StorageResult<()> {
        let mut table = self.inner.lock().map_err(|_| StorageError::Lock("records"))?;
        let record = table
            .records
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("record {id}")))?;
        record.meta.insert(key.to_string(), value);
        Ok(())
    }

    fn trash(&self, id: u64) -> StorageResult<bool> {
        let mut table = self.inner.lock().map_err(|_| StorageError::Lock("records"))?;
        let Some(record) = table.records.get_mut(&id) else {
            return Ok(false);
        };
        if record.is_trashed() {
            return Ok(false);
        }
        let previous = std::mem::replace(&mut record.status, TRASH_STATUS.to_string());
        record
            .meta
            .insert(TRASH_META_STATUS.to_string(), Value::String(previous));
        Ok(true)
    }

    fn restore(&self, id: u64) -> StorageResult<bool> {
        let mut table = self.inner.lock().map_err(|_| StorageError::Lock("records"))?;
        let Some(record) = table.records.get_mut(&id) else {
            return Ok(false);
        };
        if !record.is_trashed() {
            return Ok(false);
        }
        record.status = match record.meta.remove(TRASH_META_STATUS) {
            Some(Value::String(status)) => status,
            _ => "draft".to_string(),
        };
        Ok(true)
    }
}
