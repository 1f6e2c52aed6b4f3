//! Plug-in interfaces invoked by the engine at fixed points.
//!
//! Every hook is optional. Hooks of one kind run synchronously in
//! registration order; each transform receives the previous one's output.

use crate::path::OptionPath;
use crate::settings::SaveRequest;
use serde_json::Value;
use settingsdesk_model::ColumnSpec;
use std::sync::Arc;

/// Decides whether an option save may proceed.
pub trait SaveGuard: Send + Sync {
    fn allow(&self, request: &SaveRequest) -> bool;
}

/// Rewrites a coerced value before it is merged and persisted.
pub trait ValueTransform: Send + Sync {
    fn transform(&self, path: &OptionPath, value: Value) -> Value;
}

/// Notified after an option was actually written.
pub trait OptionObserver: Send + Sync {
    fn on_saved(&self, path: &OptionPath, stored: &Value);
}

/// Post-processes the schema tree before it is sorted and hydrated.
pub trait SchemaHook: Send + Sync {
    fn process(&self, schema: Value) -> Value;
}

/// Where a table cell comes from.
#[derive(Debug, Clone, Copy)]
pub struct CellContext<'a> {
    /// Key of the column in the row.
    pub key: &'a str,
    pub column: &'a ColumnSpec,
    /// Identifier of the row's record or principal.
    pub row_id: u64,
}

/// Post-processes a resolved table cell.
pub trait CellHook: Send + Sync {
    fn cell(&self, context: &CellContext<'_>, value: Value) -> Value;
}

impl<F> SaveGuard for F
where
    F: Fn(&SaveRequest) -> bool + Send + Sync,
{
    fn allow(&self, request: &SaveRequest) -> bool {
        self(request)
    }
}

impl<F> ValueTransform for F
where
    F: Fn(&OptionPath, Value) -> Value + Send + Sync,
{
    fn transform(&self, path: &OptionPath, value: Value) -> Value {
        self(path, value)
    }
}

impl<F> OptionObserver for F
where
    F: Fn(&OptionPath, &Value) + Send + Sync,
{
    fn on_saved(&self, path: &OptionPath, stored: &Value) {
        self(path, stored)
    }
}

impl<F> SchemaHook for F
where
    F: Fn(Value) -> Value + Send + Sync,
{
    fn process(&self, schema: Value) -> Value {
        self(schema)
    }
}

impl<F> CellHook for F
where
    F: Fn(&CellContext<'_>, Value) -> Value + Send + Sync,
{
    fn cell(&self, context: &CellContext<'_>, value: Value) -> Value {
        self(context, value)
    }
}

/// Ordered collection of registered hooks.
#[derive(Default, Clone)]
pub struct HookRegistry {
    save_guards: Vec<Arc<dyn SaveGuard>>,
    value_transforms: Vec<Arc<dyn ValueTransform>>,
    option_observers: Vec<Arc<dyn OptionObserver>>,
    schema_hooks: Vec<Arc<dyn SchemaHook>>,
    cell_hooks: Vec<Arc<dyn CellHook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_save_guard(&mut self, guard: impl SaveGuard + 'static) -> &mut Self {
        self.save_guards.push(Arc::new(guard));
        self
    }

    pub fn add_value_transform(&mut self, transform: impl ValueTransform + 'static) -> &mut Self {
        self.value_transforms.push(Arc::new(transform));
        self
    }

    pub fn add_option_observer(&mut self, observer: impl OptionObserver + 'static) -> &mut Self {
        self.option_observers.push(Arc::new(observer));
        self
    }

    pub fn add_schema_hook(&mut self, hook: impl SchemaHook + 'static) -> &mut Self {
        self.schema_hooks.push(Arc::new(hook));
        self
    }

    pub fn add_cell_hook(&mut self, hook: impl CellHook + 'static) -> &mut Self {
        self.cell_hooks.push(Arc::new(hook));
        self
    }

    /// True when no guard refuses the request.
    pub fn allows_save(&self, request: &SaveRequest) -> bool {
        self.save_guards.iter().all(|guard| guard.allow(request))
    }

    pub fn transform_value(&self, path: &OptionPath, value: Value) -> Value {
        self.value_transforms
            .iter()
            .fold(value, |value, transform| transform.transform(path, value))
    }

    pub fn notify_saved(&self, path: &OptionPath, stored: &Value) {
        for observer in &self.option_observers {
            observer.on_saved(path, stored);
        }
    }

    pub fn process_schema(&self, schema: Value) -> Value {
        self.schema_hooks
            .iter()
            .fold(schema, |schema, hook| hook.process(schema))
    }

    pub fn process_cell(&self, context: &CellContext<'_>, value: Value) -> Value {
        self.cell_hooks
            .iter()
            .fold(value, |value, hook| hook.cell(context, value))
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("save_guards", &self.save_guards.len())
            .field("value_transforms", &self.value_transforms.len())
            .field("option_observers", &self.option_observers.len())
            .field("schema_hooks", &self.schema_hooks.len())
            .field("cell_hooks", &self.cell_hooks.len())
            .finish()
    }
}
