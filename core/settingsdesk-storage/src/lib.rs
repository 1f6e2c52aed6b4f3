//! Store contracts for SettingsDesk.
//!
//! The engine never owns persistence. It talks to three collaborators:
//! - [`OptionStore`]: the host's key/value option table
//! - [`RecordStore`]: lightweight records with an auxiliary meta map
//! - [`PrincipalStore`]: users/principals with roles and meta
//!
//! In-memory adapters back tests and embedded use; [`SqliteOptionStore`]
//! persists options to a SQLite file.

mod error;
mod options;
mod principals;
mod records;

pub use error::{StorageError, StorageResult};
pub use options::{MemoryOptionStore, OptionStore, SqliteOptionStore};
pub use principals::{
    MemoryPrincipalStore, PrincipalPage, PrincipalQuery, PrincipalStore, SortDirection,
};
pub use records::{MemoryRecordStore, RecordPage, RecordQuery, RecordStore};
