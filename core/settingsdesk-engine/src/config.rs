//! Engine configuration, read from an optional TOML file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Host-facing knobs. Every key is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Host date format (PHP-style tokens) for record creation dates.
    pub date_format: String,
    /// Appended to `date_format` when rendering `post_date` cells.
    pub time_format: String,
    /// Rows per table page when the request does not say.
    pub default_page_size: usize,
    /// Marker key of view nodes in the schema tree.
    pub marker: String,
    pub permission_message: String,
    pub save_error_message: String,
    pub no_changes_message: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            date_format: "F j, Y".to_string(),
            time_format: " h:i a".to_string(),
            default_page_size: 3,
            marker: "view".to_string(),
            permission_message: "You do not have enough permissions to change the settings"
                .to_string(),
            save_error_message: "Error with saving".to_string(),
            no_changes_message: "No changes".to_string(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from `path`.
    /// Falls back to defaults with a warning when the file is missing or invalid.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No engine config at {:?}, using defaults", path);
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<EngineConfig>(&contents) {
                Ok(config) => {
                    info!("Loaded engine config from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse engine config {:?}: {}. Using defaults.", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read engine config {:?}: {}. Using defaults.", path, e);
                Self::default()
            }
        }
    }

    /// Full creation-date format for table cells.
    pub fn datetime_format(&self) -> String {
        format!("{}{}", self.date_format, self.time_format)
    }
}
