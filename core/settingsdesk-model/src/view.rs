//! View nodes: edit forms and table columns bound to a collection.

use crate::error::{ModelError, ModelResult};
use crate::schema::{lenient_list, FieldGroup, FieldSpec};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What a view node is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewBinding {
    /// A record collection, keyed by record type.
    PostType(String),
    /// A principal collection, keyed by role.
    Role(String),
}

impl ViewBinding {
    /// The discriminator key carried by the view node.
    pub fn key(&self) -> &'static str {
        match self {
            Self::PostType(_) => "post_type",
            Self::Role(_) => "role",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::PostType(v) | Self::Role(v) => v,
        }
    }

    /// Search conditions that select this binding's view node.
    pub fn conditions(&self) -> Map<String, Value> {
        let mut conditions = Map::new();
        conditions.insert(self.key().into(), Value::String(self.value().into()));
        conditions
    }
}

/// A parsed `view` node.
#[derive(Debug, Clone)]
pub struct ViewDefinition {
    pub binding: ViewBinding,
    pub edit_post: Vec<FieldGroup>,
    pub columns: Option<ColumnSet>,
}

#[derive(Deserialize)]
struct RawView {
    #[serde(default)]
    post_type: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    edit_post: Vec<FieldGroup>,
    #[serde(default)]
    columns: Option<ColumnSet>,
}

impl ViewDefinition {
    /// Interprets a node located by the schema search.
    pub fn from_node(node: &Value) -> ModelResult<Self> {
        if !node.is_object() {
            return Err(ModelError::InvalidSchema("view node is not a mapping".into()));
        }
        let raw: RawView = serde_json::from_value(node.clone())?;
        let binding = match (raw.post_type, raw.role) {
            (Some(post_type), _) => ViewBinding::PostType(post_type),
            (None, Some(role)) => ViewBinding::Role(role),
            (None, None) => {
                return Err(ModelError::InvalidSchema(
                    "view node has neither post_type nor role".into(),
                ));
            }
        };
        Ok(Self {
            binding,
            edit_post: raw.edit_post,
            columns: raw.columns,
        })
    }

    /// Every field of every group, flattened in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.edit_post.iter().flat_map(|group| group.fields.iter())
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields().find(|f| f.name == name)
    }
}

/// How a table cell is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColumnKind {
    /// A well-known attribute of the row entity (`""` in the schema).
    #[default]
    Attribute,
    /// An auxiliary key/value attached to the row entity.
    Meta,
    /// Count of related records pointing at the row's identifier.
    Posts,
}

impl TryFrom<String> for ColumnKind {
    type Error = ModelError;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        match tag.as_str() {
            "" => Ok(Self::Attribute),
            "meta" => Ok(Self::Meta),
            "posts" => Ok(Self::Posts),
            _ => Err(ModelError::unknown("column", tag)),
        }
    }
}

impl From<ColumnKind> for String {
    fn from(kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Attribute => String::new(),
            ColumnKind::Meta => "meta".into(),
            ColumnKind::Posts => "posts".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub col: String,
    #[serde(rename = "type", default)]
    pub kind: ColumnKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_meta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<ColumnArgs>,
}

impl ColumnSpec {
    /// A well-known attribute column.
    pub fn attribute(col: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            col: col.into(),
            kind: ColumnKind::Attribute,
            name: name.into(),
            hidden: false,
            relation_meta: None,
            args: None,
        }
    }

    pub fn meta(col: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: ColumnKind::Meta,
            ..Self::attribute(col, name)
        }
    }

    /// Counts records of type `collection` whose `relation_meta` points at the row.
    pub fn posts(
        collection: impl Into<String>,
        name: impl Into<String>,
        relation_meta: impl Into<String>,
    ) -> Self {
        Self {
            kind: ColumnKind::Posts,
            relation_meta: Some(relation_meta.into()),
            ..Self::attribute(collection, name)
        }
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn with_args(mut self, args: ColumnArgs) -> Self {
        self.args = Some(args);
        self
    }
}

/// Extra query constraints for a `posts` column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnArgs {
    #[serde(default, alias = "status", skip_serializing_if = "Option::is_none")]
    pub post_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub meta_query: Vec<MetaConstraint>,
}

/// Equality constraint on an auxiliary attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaConstraint {
    pub key: String,
    pub value: Value,
}

impl MetaConstraint {
    pub fn equals(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Ordered `row key → column` mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct ColumnSet(Vec<(String, ColumnSpec)>);

impl ColumnSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, column: ColumnSpec) -> Self {
        self.insert(key, column);
        self
    }

    /// Inserts or replaces the column stored under `key`.
    pub fn insert(&mut self, key: impl Into<String>, column: ColumnSpec) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = column,
            None => self.0.push((key, column)),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&ColumnSpec> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, c)| c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnSpec)> {
        self.0.iter().map(|(k, c)| (k.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Map<String, Value>> for ColumnSet {
    type Error = ModelError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        map.into_iter()
            .map(|(key, column)| -> ModelResult<(String, ColumnSpec)> {
                Ok((key, serde_json::from_value(column)?))
            })
            .collect::<ModelResult<Vec<_>>>()
            .map(Self)
    }
}

impl From<ColumnSet> for Map<String, Value> {
    fn from(set: ColumnSet) -> Self {
        set.0
            .into_iter()
            .map(|(key, column)| {
                let column = serde_json::to_value(column).unwrap_or(Value::Null);
                (key, column)
            })
            .collect()
    }
}
