//! Nested-merge persistence of a single named value.

use crate::error::EngineResult;
use crate::path::OptionPath;
use serde_json::{Map, Value};
use settingsdesk_storage::OptionStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Result of a persist attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistOutcome {
    /// The merged value equals what is stored; nothing was written.
    Unchanged(Value),
    /// The merged value was written.
    Written(Value),
}

impl PersistOutcome {
    pub fn value(&self) -> &Value {
        match self {
            Self::Unchanged(v) | Self::Written(v) => v,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::Unchanged(v) | Self::Written(v) => v,
        }
    }

    pub fn was_written(&self) -> bool {
        matches!(self, Self::Written(_))
    }
}

/// Places `value` at `subkeys` inside `existing`.
///
/// A non-mapping `existing` (or intermediate node) is replaced by an empty
/// mapping. Sibling keys are preserved.
pub fn merge_value(existing: Option<Value>, subkeys: &[String], value: Value) -> Value {
    let Some((first, rest)) = subkeys.split_first() else {
        return value;
    };
    let mut root = match existing {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    let child = root.remove(first);
    let merged = merge_value(child, rest, value);
    root.insert(first.clone(), merged);
    Value::Object(root)
}

/// Key-sorted serialization used to compare stored and merged values.
pub fn canonical_json(value: &Value) -> String {
    fn sorted(value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                Value::Object(
                    entries
                        .into_iter()
                        .map(|(k, v)| (k.clone(), sorted(v)))
                        .collect(),
                )
            }
            Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
            other => other.clone(),
        }
    }
    sorted(value).to_string()
}

/// Loads the root value, merges `value` at the path, and writes only when
/// the result differs from what is stored.
pub fn merge_and_persist(
    store: &dyn OptionStore,
    path: &OptionPath,
    value: Value,
) -> EngineResult<PersistOutcome> {
    let current = store.get(&path.root)?;
    let merged = if path.is_nested() {
        merge_value(current.clone(), &path.subkeys, value)
    } else {
        value
    };

    if current
        .as_ref()
        .is_some_and(|stored| canonical_json(stored) == canonical_json(&merged))
    {
        debug!(option = %path, "Option unchanged, skipping write");
        return Ok(PersistOutcome::Unchanged(merged));
    }

    store.set(&path.root, &merged)?;
    info!(option = %path, root = %path.root, "Option written");
    Ok(PersistOutcome::Written(merged))
}

/// Per-root-key mutual exclusion for load → merge → persist.
#[derive(Debug, Default)]
pub struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the lock for `key`.
    ///
    /// The slot for `key` is dropped again once no other caller holds or
    /// waits on it.
    pub fn with_lock<T>(&self, key: &str, f: impl FnOnce() -> T) -> T {
        let slot = {
            let mut locks = self.slots();
            Arc::clone(locks.entry(key.to_string()).or_default())
        };
        let result = {
            let _guard: MutexGuard<'_, ()> =
                slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            f()
        };

        // Clones are only taken under the map lock, so the count is stable here.
        let mut locks = self.slots();
        if Arc::strong_count(&slot) == 2 {
            locks.remove(key);
        }
        result
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Arc<Mutex<()>>>> {
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
