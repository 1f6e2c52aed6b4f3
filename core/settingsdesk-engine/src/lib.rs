//! SettingsDesk engine.
//!
//! Turns a declarative settings schema into persisted options, record and
//! principal tables, and conditional edit forms:
//! - [`path`]: `root[child][grandchild]` option names
//! - [`coerce`] / [`sanitize`]: type-directed value cleaning
//! - [`merge`]: nested merge with idempotent persistence
//! - [`search`]: first-match lookup of `view` nodes in the schema tree
//! - [`condition`]: field visibility from sibling values
//! - [`table`]: paginated projection of collections into rows
//! - [`SettingsEngine`]: the facade returning [`Envelope`]s
//!
//! Collaborator stores live in `settingsdesk-storage`; the engine is
//! synchronous and keeps no state between requests beyond its wiring.

pub mod coerce;
pub mod condition;
mod config;
pub mod date;
mod envelope;
mod error;
pub mod hooks;
pub mod merge;
pub mod path;
pub mod sanitize;
pub mod search;
mod settings;
pub mod table;

pub use coerce::{coerce, CoerceOptions};
pub use condition::{is_visible, visible_fields};
pub use config::EngineConfig;
pub use envelope::Envelope;
pub use error::{EngineError, EngineResult};
pub use hooks::{
    CellContext, CellHook, HookRegistry, OptionObserver, SaveGuard, SchemaHook, ValueTransform,
};
pub use merge::{canonical_json, merge_and_persist, merge_value, KeyLocks, PersistOutcome};
pub use path::{resolve, OptionPath};
pub use search::find_by_marker;
pub use settings::{
    FieldInput, PrincipalSaveRequest, RecordSaveRequest, SaveRequest, SchemaSource, SettingsEngine,
    StaticSchema,
};
pub use table::{Filter, Pagination, TableProjection, TableProjector, TableRequest, Validation};
