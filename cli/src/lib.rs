//! Commands and wiring for the `settingsdesk` binary.

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use serde_json::{Map, Value};
use settingsdesk_engine::{EngineConfig, Envelope, SaveRequest, SettingsEngine, StaticSchema};
use settingsdesk_model::ObjectValuesType;
use settingsdesk_storage::SqliteOptionStore;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Save one option value
    Save {
        /// Option name, e.g. `theme[colors][primary]`
        #[arg(long)]
        name: String,

        /// Raw value as submitted by a form
        #[arg(long)]
        value: String,

        /// Declared value type (number, boolean, object, html, string, ...)
        #[arg(long = "type")]
        value_type: Option<String>,

        /// Element type for comma-separated object values
        #[arg(long)]
        object_values_type: Option<String>,
    },

    /// Print the value stored at an option name
    Get {
        name: String,
    },

    /// Print the settings schema with stored values filled in
    Settings,

    /// Locate a view node by `key=value` conditions
    FindView {
        #[arg(long = "where", value_name = "KEY=VALUE")]
        conditions: Vec<String>,
    },
}

/// Reads the schema tree from a JSON file; no file means an empty schema.
pub fn load_schema(path: Option<&Path>) -> Result<Value> {
    let Some(path) = path else {
        debug!("No schema file given, using an empty schema");
        return Ok(Value::Object(Map::new()));
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid schema JSON in {}", path.display()))
}

/// Opens the option database and builds an engine over it.
pub fn build_engine(db: &Path, schema: Option<&Path>, config: Option<&Path>) -> Result<SettingsEngine> {
    let store = SqliteOptionStore::open(db)
        .with_context(|| format!("failed to open option store {}", db.display()))?;
    let schema = load_schema(schema)?;
    let config = config.map(EngineConfig::load_from).unwrap_or_default();
    info!("Option store opened at {}", db.display());
    Ok(SettingsEngine::new(Arc::new(store), StaticSchema(schema)).with_config(config))
}

/// Splits `key=value` into a condition pair.
pub fn parse_condition(raw: &str) -> Result<(String, Value)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("condition `{raw}` is not of the form key=value");
    };
    if key.is_empty() {
        bail!("condition `{raw}` has an empty key");
    }
    Ok((key.to_string(), Value::String(value.to_string())))
}

/// Runs one command against the engine.
pub fn execute(engine: &SettingsEngine, command: &Command) -> Result<Envelope> {
    let envelope = match command {
        Command::Save {
            name,
            value,
            value_type,
            object_values_type,
        } => {
            let mut request = SaveRequest::new(name.clone(), value.clone());
            request.value_type = value_type.clone();
            request.object_values_type = object_values_type.clone().map(ObjectValuesType::from);
            engine.save_option(&request)
        }
        Command::Get { name } => engine.get_option(name),
        Command::Settings => engine.settings(),
        Command::FindView { conditions } => {
            let conditions = conditions
                .iter()
                .map(|raw| parse_condition(raw))
                .collect::<Result<Map<String, Value>>>()?;
            engine.find_view(&conditions)
        }
    };
    Ok(envelope)
}
