//! Schema and entity model for SettingsDesk.
//!
//! Defines the declarative types every other crate depends on:
//! - [`SettingsSchema`]: pages → tabs → option groups → [`FieldSpec`]s
//! - [`ViewDefinition`]: an edit form and table columns bound by [`ViewBinding`]
//! - [`ColumnSpec`] / [`ColumnKind`]: how a table cell is resolved
//! - [`Record`] / [`Principal`]: the entities owned by external stores
//! - [`ValueType`]: the closed set of coercions applied before persistence
//!
//! Every `type` tag is a closed enum; unknown tags fail with
//! [`ModelError::UnknownKind`] instead of falling through to a default.

mod entity;
mod error;
mod schema;
mod value;
mod view;

pub use entity::{NewRecord, Principal, Record, TRASH_STATUS};
pub use error::{ModelError, ModelResult};
pub use schema::{
    Condition, FieldGroup, FieldKind, FieldSpec, OptionGroup, Page, PageEntry, SelectOption,
    SettingsSchema, Tab,
};
pub use value::{display_text, loosely_equal, ObjectValuesType, ValueType};
pub use view::{
    ColumnArgs, ColumnKind, ColumnSet, ColumnSpec, MetaConstraint, ViewBinding, ViewDefinition,
};
