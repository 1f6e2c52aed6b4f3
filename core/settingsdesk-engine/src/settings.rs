//! The request-facing facade.
//!
//! Every operation returns an [`Envelope`]; engine errors are folded into
//! `{success: false, text}` at this boundary and never escape.

use crate::coerce::{coerce, CoerceOptions};
use crate::condition::visible_fields;
use crate::config::EngineConfig;
use crate::envelope::Envelope;
use crate::error::{EngineError, EngineResult};
use crate::hooks::HookRegistry;
use crate::merge::{merge_and_persist, KeyLocks, PersistOutcome};
use crate::path::{resolve, OptionPath};
use crate::sanitize::{sanitize_key, sanitize_text};
use crate::search::find_by_marker;
use crate::table::{TableProjection, TableProjector, TableRequest};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use settingsdesk_model::{
    FieldSpec, NewRecord, ObjectValuesType, Principal, Record, SettingsSchema, ValueType,
    ViewBinding, ViewDefinition,
};
use settingsdesk_storage::{
    MemoryPrincipalStore, MemoryRecordStore, OptionStore, PrincipalStore, RecordStore,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Supplies the schema tree, read once per request.
pub trait SchemaSource: Send + Sync {
    fn schema(&self) -> Value;
}

impl<F> SchemaSource for F
where
    F: Fn() -> Value + Send + Sync,
{
    fn schema(&self) -> Value {
        self()
    }
}

/// A schema fixed at construction time.
#[derive(Debug, Clone, Default)]
pub struct StaticSchema(pub Value);

impl SchemaSource for StaticSchema {
    fn schema(&self) -> Value {
        self.0.clone()
    }
}

/// An option save as sent by the settings UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub name: String,
    #[serde(default)]
    pub value: Option<Value>,
    /// Declared value type tag; `string` when absent.
    #[serde(rename = "type", default)]
    pub value_type: Option<String>,
    #[serde(default)]
    pub object_values_type: Option<ObjectValuesType>,
}

impl SaveRequest {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            value_type: None,
            object_values_type: None,
        }
    }

    pub fn with_type(mut self, tag: impl Into<String>) -> Self {
        self.value_type = Some(tag.into());
        self
    }

    pub fn with_object_values_type(mut self, kind: ObjectValuesType) -> Self {
        self.object_values_type = Some(kind);
        self
    }
}

/// One submitted edit-form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInput {
    pub name: String,
    #[serde(default)]
    pub value: Value,
    /// Overrides the type implied by the schema field kind.
    #[serde(rename = "type", default)]
    pub value_type: Option<String>,
}

impl FieldInput {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            value_type: None,
        }
    }
}

/// A record edit-form submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSaveRequest {
    pub post_type: String,
    /// Absent for a new record.
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldInput>,
}

/// A principal edit-form submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrincipalSaveRequest {
    pub role: String,
    pub id: u64,
    #[serde(default)]
    pub fields: Vec<FieldInput>,
}

/// The settings engine, wired to its collaborator stores.
pub struct SettingsEngine {
    options: Arc<dyn OptionStore>,
    records: Arc<dyn RecordStore>,
    principals: Arc<dyn PrincipalStore>,
    schema: Arc<dyn SchemaSource>,
    config: EngineConfig,
    hooks: HookRegistry,
    locks: KeyLocks,
}

impl SettingsEngine {
    /// Creates an engine with empty in-memory record and principal stores.
    pub fn new(options: Arc<dyn OptionStore>, schema: impl SchemaSource + 'static) -> Self {
        Self {
            options,
            records: Arc::new(MemoryRecordStore::new()),
            principals: Arc::new(MemoryPrincipalStore::new()),
            schema: Arc::new(schema),
            config: EngineConfig::default(),
            hooks: HookRegistry::new(),
            locks: KeyLocks::new(),
        }
    }

    pub fn with_records(mut self, records: Arc<dyn RecordStore>) -> Self {
        self.records = records;
        self
    }

    pub fn with_principals(mut self, principals: Arc<dyn PrincipalStore>) -> Self {
        self.principals = principals;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn hooks_mut(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Options ─────────────────────────────────────────────────

    /// Coerces and persists one named value.
    pub fn save_option(&self, request: &SaveRequest) -> Envelope {
        if !self.hooks.allows_save(request) {
            warn!(name = %request.name, "Save refused by guard");
            return Envelope::from(EngineError::PermissionDenied(
                self.config.permission_message.clone(),
            ));
        }

        let path = resolve(&sanitize_text(&request.name));
        let value_type = match request.value_type.as_deref().map(ValueType::parse) {
            None => ValueType::PlainText,
            Some(Ok(value_type)) => value_type,
            Some(Err(err)) => return Envelope::from(EngineError::from(err)),
        };
        let Some(raw) = &request.value else {
            debug!(option = %path, "Save without value");
            return Envelope::fail(&self.config.save_error_message);
        };

        let options = CoerceOptions {
            object_values_type: request.object_values_type.unwrap_or_default(),
        };
        let value = coerce(raw, value_type, options);
        let value = self.hooks.transform_value(&path, value);
        debug!(option = %path, value_type = %value_type, "Saving option");

        let outcome = self.locks.with_lock(&path.root, || {
            merge_and_persist(self.options.as_ref(), &path, value)
        });
        match outcome {
            Ok(PersistOutcome::Written(stored)) => {
                self.hooks.notify_saved(&path, &stored);
                Envelope::ok(stored)
            }
            Ok(PersistOutcome::Unchanged(stored)) => {
                Envelope::ok(stored).with_text(&self.config.no_changes_message)
            }
            Err(err) => {
                warn!(option = %path, error = %err, "Failed to persist option");
                Envelope::fail(&self.config.save_error_message)
            }
        }
    }

    /// Reads the value stored at a possibly nested option name.
    pub fn get_option(&self, name: &str) -> Envelope {
        let path = resolve(&sanitize_text(name));
        match self.read_option(&path) {
            Ok(value) => Envelope::ok(value.unwrap_or(Value::Null)),
            Err(err) => Envelope::from(err),
        }
    }

    fn read_option(&self, path: &OptionPath) -> EngineResult<Option<Value>> {
        let stored = self.options.get(&path.root)?;
        Ok(stored.and_then(|root| path.lookup(&root).cloned()))
    }

    /// The settings schema with pages sorted and field values hydrated.
    pub fn settings(&self) -> Envelope {
        let schema = match self.hydrated_settings() {
            Ok(schema) => schema,
            Err(err) => return Envelope::from(err),
        };
        match serde_json::to_value(schema) {
            Ok(payload) => Envelope::payload(payload),
            Err(err) => Envelope::fail(err.to_string()),
        }
    }

    /// Typed form of [`Self::settings`].
    pub fn hydrated_settings(&self) -> EngineResult<SettingsSchema> {
        let mut schema = SettingsSchema::from_value(self.load_schema())?;
        schema.sort_pages();

        let mut roots: HashMap<String, Option<Value>> = HashMap::new();
        let mut failure = None;
        schema.for_each_field_mut(|field| {
            if failure.is_some() {
                return;
            }
            let path = resolve(&field.name);
            if !roots.contains_key(&path.root) {
                match self.options.get(&path.root) {
                    Ok(stored) => {
                        roots.insert(path.root.clone(), stored);
                    }
                    Err(err) => {
                        failure = Some(err);
                        return;
                    }
                }
            }
            if let Some(value) = roots
                .get(&path.root)
                .and_then(Option::as_ref)
                .and_then(|root| path.lookup(root))
            {
                field.value = Some(value.clone());
            }
        });
        match failure {
            Some(err) => Err(err.into()),
            None => Ok(schema),
        }
    }

    // ── Views ───────────────────────────────────────────────────

    fn load_schema(&self) -> Value {
        self.hooks.process_schema(self.schema.schema())
    }

    /// Locates the first view node matching `conditions`.
    pub fn find_view(&self, conditions: &Map<String, Value>) -> Envelope {
        let schema = self.load_schema();
        match find_by_marker(&self.config.marker, &schema, conditions) {
            Some(node) => Envelope::payload(node.clone()),
            None => Envelope::from(EngineError::NotFound("view".into())),
        }
    }

    fn view_for(&self, binding: &ViewBinding) -> EngineResult<ViewDefinition> {
        let schema = self.load_schema();
        let node = find_by_marker(&self.config.marker, &schema, &binding.conditions())
            .ok_or_else(|| EngineError::NotFound(format!("view for {}", binding.value())))?;
        Ok(ViewDefinition::from_node(node)?)
    }

    /// The edit form of `binding`, with live values and hidden fields removed.
    pub fn edit_view(&self, binding: &ViewBinding, id: Option<u64>) -> Envelope {
        self.build_edit_view(binding, id)
            .map_or_else(Envelope::from, Envelope::payload)
    }

    fn build_edit_view(&self, binding: &ViewBinding, id: Option<u64>) -> EngineResult<Value> {
        let view = self.view_for(binding)?;
        let subject = match (binding, id) {
            (_, None) => Subject::Defaults,
            (ViewBinding::PostType(_), Some(id)) => Subject::Record(
                self.records
                    .get(id)?
                    .ok_or_else(|| EngineError::NotFound(format!("record {id}")))?,
            ),
            (ViewBinding::Role(_), Some(id)) => Subject::Principal(
                self.principals
                    .get(id)?
                    .ok_or_else(|| EngineError::NotFound(format!("principal {id}")))?,
            ),
        };

        let resolved: Vec<FieldSpec> = view
            .fields()
            .map(|field| {
                let mut field = field.clone();
                field.value = subject.value_of(&field.name).or(field.value);
                field
            })
            .collect();
        let visible: Vec<&str> = visible_fields(&resolved, |f| f.value.clone())
            .into_iter()
            .map(|f| f.name.as_str())
            .collect();
        debug!(view = %binding.value(), visible = visible.len(), "Edit view resolved");

        let mut by_name: HashMap<&str, &FieldSpec> =
            resolved.iter().map(|f| (f.name.as_str(), f)).collect();
        let groups: Vec<_> = view
            .edit_post
            .iter()
            .map(|group| {
                let mut group = group.clone();
                group.fields = group
                    .fields
                    .iter()
                    .filter(|f| visible.contains(&f.name.as_str()))
                    .filter_map(|f| by_name.remove(f.name.as_str()).cloned())
                    .collect();
                group
            })
            .collect();

        Ok(json!({
            binding.key(): binding.value(),
            "id": id,
            "edit_post": groups,
        }))
    }

    // ── Tables ──────────────────────────────────────────────────

    fn projector(&self) -> TableProjector<'_> {
        TableProjector::new(
            self.records.as_ref(),
            &self.hooks,
            self.config.datetime_format(),
            self.config.default_page_size,
        )
    }

    /// Fills in the view's columns when the request carries none.
    fn with_view_columns(&self, request: &TableRequest, binding: ViewBinding) -> EngineResult<TableRequest> {
        let mut request = request.clone();
        if request.columns.is_none() {
            request.columns = self.view_for(&binding)?.columns;
        }
        Ok(request)
    }

    /// Typed form of [`Self::record_table`].
    pub fn record_rows(&self, request: &TableRequest) -> EngineResult<Option<TableProjection>> {
        let Some(collection) = &request.collection else {
            return Ok(None);
        };
        let request = self.with_view_columns(request, ViewBinding::PostType(collection.clone()))?;
        self.projector().project_records(&request)
    }

    /// Typed form of [`Self::principal_table`].
    pub fn principal_rows(&self, request: &TableRequest) -> EngineResult<Option<TableProjection>> {
        let Some(role) = &request.collection else {
            return Ok(None);
        };
        let request = self.with_view_columns(request, ViewBinding::Role(role.clone()))?;
        self.projector()
            .project_principals(self.principals.as_ref(), &request)
    }

    pub fn record_table(&self, request: &TableRequest) -> Envelope {
        table_envelope(self.record_rows(request))
    }

    pub fn principal_table(&self, request: &TableRequest) -> Envelope {
        table_envelope(self.principal_rows(request))
    }

    // ── Records ─────────────────────────────────────────────────

    /// Creates or updates a record from an edit-form submission.
    pub fn save_record(&self, request: &RecordSaveRequest) -> Envelope {
        match self.store_record(request) {
            Ok(id) => Envelope::ok(json!({ "id": id })),
            Err(EngineError::Storage(err)) => {
                warn!(post_type = %request.post_type, error = %err, "Failed to save record");
                Envelope::fail(err.to_string())
            }
            Err(err) => Envelope::from(err),
        }
    }

    fn store_record(&self, request: &RecordSaveRequest) -> EngineResult<u64> {
        let view = self.view_for(&ViewBinding::PostType(request.post_type.clone()))?;
        let meta = coerce_fields(&view, &request.fields)?;

        let Some(id) = request.id else {
            let title = sanitize_text(request.title.as_deref().unwrap_or_default());
            let record = meta.into_iter().fold(
                NewRecord::new(request.post_type.clone(), title),
                |record, (key, value)| record.with_meta(key, value),
            );
            let id = self.records.create(record)?;
            info!(post_type = %request.post_type, record_id = id, "Record created");
            return Ok(id);
        };
        for (key, value) in meta {
            self.records.set_meta(id, &key, value)?;
        }
        Ok(id)
    }

    /// Writes an edit-form submission onto an existing principal.
    pub fn save_principal(&self, request: &PrincipalSaveRequest) -> Envelope {
        match self.store_principal(request) {
            Ok(()) => Envelope::ok(json!({ "id": request.id })),
            Err(EngineError::Storage(err)) => {
                warn!(role = %request.role, error = %err, "Failed to save principal");
                Envelope::fail(err.to_string())
            }
            Err(err) => Envelope::from(err),
        }
    }

    fn store_principal(&self, request: &PrincipalSaveRequest) -> EngineResult<()> {
        let view = self.view_for(&ViewBinding::Role(request.role.clone()))?;
        let meta = coerce_fields(&view, &request.fields)?;
        if self.principals.get(request.id)?.is_none() {
            return Err(EngineError::NotFound(format!("principal {}", request.id)));
        }
        for (key, value) in meta {
            self.principals.set_meta(request.id, &key, value)?;
        }
        info!(role = %request.role, principal_id = request.id, "Principal saved");
        Ok(())
    }

    pub fn trash_record(&self, id: u64) -> Envelope {
        match self.records.trash(id) {
            Ok(changed) => {
                info!(record_id = id, changed, "Record trashed");
                Envelope::ok(Value::Bool(changed))
            }
            Err(err) => Envelope::from(EngineError::from(err)),
        }
    }

    pub fn restore_record(&self, id: u64) -> Envelope {
        match self.records.restore(id) {
            Ok(changed) => {
                info!(record_id = id, changed, "Record restored");
                Envelope::ok(Value::Bool(changed))
            }
            Err(err) => Envelope::from(EngineError::from(err)),
        }
    }
}

fn table_envelope(result: EngineResult<Option<TableProjection>>) -> Envelope {
    match result {
        Ok(Some(projection)) => match serde_json::to_value(projection) {
            Ok(payload) => Envelope::payload(payload),
            Err(err) => Envelope::fail(err.to_string()),
        },
        Ok(None) => Envelope::from(EngineError::MissingInput("collection and columns")),
        Err(err) => Envelope::from(err),
    }
}

/// Coerces submitted fields by declared type, or by the view field's kind.
/// Fields outside the view are dropped; any unknown type fails the batch.
fn coerce_fields(view: &ViewDefinition, inputs: &[FieldInput]) -> EngineResult<Vec<(String, Value)>> {
    let mut meta = Vec::with_capacity(inputs.len());
    for input in inputs {
        let Some(field) = view.field(&input.name) else {
            debug!(field = %input.name, "Ignoring field outside the view");
            continue;
        };
        let value_type = match &input.value_type {
            Some(tag) => ValueType::parse(tag)?,
            None => ValueType::parse(field.kind.as_str())?,
        };
        let value = coerce(&input.value, value_type, CoerceOptions::default());
        meta.push((sanitize_key(&field.name), value));
    }
    Ok(meta)
}

/// The entity an edit view is rendered for.
enum Subject {
    /// No entity addressed; schema defaults apply.
    Defaults,
    Record(Record),
    Principal(Principal),
}

impl Subject {
    /// Well-known attribute, else meta.
    fn value_of(&self, name: &str) -> Option<Value> {
        match self {
            Self::Defaults => None,
            Self::Record(record) => record
                .attribute(name)
                .or_else(|| record.meta(&sanitize_key(name)).cloned()),
            Self::Principal(principal) => principal
                .attribute(name)
                .or_else(|| principal.meta(&sanitize_key(name)).cloned()),
        }
    }
}
