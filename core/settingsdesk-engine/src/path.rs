//! Option-path parsing: `root[child][grandchild]` → root key plus sub-keys.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::LazyLock;

/// Leading identifier plus one to three bracketed identifiers. Only the
/// first two bracket levels are kept; the match is anchored at the start
/// only, so trailing text is ignored.
static OPTION_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([a-zA-Z0-9_]+)\[([a-zA-Z0-9_]+)\](?:\[([a-zA-Z0-9_]+)\])?(?:\[[a-zA-Z0-9_]+\])?",
    )
    .expect("option path pattern is valid")
});

/// Maximum nesting depth below the root key.
pub const MAX_DEPTH: usize = 2;

/// A parsed option name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OptionPath {
    pub root: String,
    pub subkeys: Vec<String>,
}

impl OptionPath {
    /// A flat key with no nesting.
    pub fn flat(name: impl Into<String>) -> Self {
        Self {
            root: name.into(),
            subkeys: Vec::new(),
        }
    }

    pub fn is_nested(&self) -> bool {
        !self.subkeys.is_empty()
    }

    /// Reads the value this path addresses inside the value stored at `root`.
    pub fn lookup<'a>(&self, stored: &'a Value) -> Option<&'a Value> {
        self.subkeys
            .iter()
            .try_fold(stored, |node, key| node.as_object()?.get(key))
    }
}

impl fmt::Display for OptionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root)?;
        for key in &self.subkeys {
            write!(f, "[{key}]")?;
        }
        Ok(())
    }
}

/// Splits a field name into its root key and up to two sub-keys.
///
/// Names that do not start with `ident[ident]` are flat keys; malformed
/// brackets are never an error.
pub fn resolve(name: &str) -> OptionPath {
    let Some(caps) = OPTION_PATH.captures(name) else {
        return OptionPath::flat(name);
    };
    let subkeys = [caps.get(2), caps.get(3)]
        .into_iter()
        .flatten()
        .map(|m| m.as_str().to_string())
        .collect();
    OptionPath {
        root: caps[1].to_string(),
        subkeys,
    }
}
