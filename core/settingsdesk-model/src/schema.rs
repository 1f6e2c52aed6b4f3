use crate::error::ModelError;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The declarative settings schema: pages → tabs → option groups → fields.
///
/// Keys the engine does not interpret (view nodes, branding, notices) are
/// kept in `extra` and serialized back unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsSchema {
    #[serde(default, deserialize_with = "lenient_list")]
    pub pages: Vec<PageEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SettingsSchema {
    /// Parses a schema tree as returned by the host.
    pub fn from_value(tree: Value) -> Result<Self, ModelError> {
        Ok(serde_json::from_value(tree)?)
    }

    /// Sorts pages by their `order`, keeping declaration order for ties.
    pub fn sort_pages(&mut self) {
        self.pages.sort_by(|a, b| a.page.order.total_cmp(&b.page.order));
    }

    /// Visits every settings field in declaration order.
    pub fn for_each_field_mut(&mut self, mut visit: impl FnMut(&mut FieldSpec)) {
        for entry in &mut self.pages {
            for tab in &mut entry.page.tabs {
                for group in &mut tab.options {
                    group.fields.iter_mut().for_each(&mut visit);
                }
            }
        }
    }
}

/// One element of `pages`: a single page keyed by its slug.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct PageEntry {
    pub slug: String,
    pub page: Page,
}

impl TryFrom<Map<String, Value>> for PageEntry {
    type Error = ModelError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut entries = map.into_iter();
        let Some((slug, page)) = entries.next() else {
            return Err(ModelError::InvalidSchema("empty page entry".into()));
        };
        if entries.next().is_some() {
            return Err(ModelError::InvalidSchema(format!(
                "page entry `{slug}` has more than one key"
            )));
        }
        Ok(Self {
            slug,
            page: serde_json::from_value(page)?,
        })
    }
}

impl From<PageEntry> for Map<String, Value> {
    fn from(entry: PageEntry) -> Self {
        let mut map = Map::new();
        let page = serde_json::to_value(entry.page).unwrap_or(Value::Null);
        map.insert(entry.slug, page);
        map
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_order")]
    pub order: f64,
    #[serde(default, deserialize_with = "lenient_list")]
    pub tabs: Vec<Tab>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tab {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub options: Vec<OptionGroup>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A titled block of fields. `isPro`, `col` and `grid` ride along in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionGroup {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_order")]
    pub order: f64,
    #[serde(default, deserialize_with = "lenient_list")]
    pub fields: Vec<FieldSpec>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A group of fields inside a view's `edit_post` list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldGroup {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub fields: Vec<FieldSpec>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single input declared in the schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub values: Vec<SelectOption>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub condition: Vec<Condition>,
    /// Declared default, replaced by the live value when a view is produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            multiple: false,
            title: String::new(),
            description: String::new(),
            values: Vec::new(),
            condition: Vec::new(),
            value: None,
            extra: Map::new(),
        }
    }

    /// Adds a visibility condition on a sibling field.
    pub fn with_condition(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition.push(Condition {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Closed set of field kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldKind {
    #[default]
    Input,
    Textarea,
    Select,
    Checkbox,
    Color,
    Switch,
    Html,
    Shortcodes,
    Text,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Textarea => "textarea",
            Self::Select => "select",
            Self::Checkbox => "checkbox",
            Self::Color => "color",
            Self::Switch => "switch",
            Self::Html => "html",
            Self::Shortcodes => "shortcodes",
            Self::Text => "text",
        }
    }
}

impl TryFrom<String> for FieldKind {
    type Error = ModelError;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        match tag.as_str() {
            "input" => Ok(Self::Input),
            "textarea" => Ok(Self::Textarea),
            "select" => Ok(Self::Select),
            "checkbox" => Ok(Self::Checkbox),
            "color" => Ok(Self::Color),
            "switch" => Ok(Self::Switch),
            "html" => Ok(Self::Html),
            "shortcodes" => Ok(Self::Shortcodes),
            "text" => Ok(Self::Text),
            _ => Err(ModelError::unknown("field", tag)),
        }
    }
}

impl From<FieldKind> for String {
    fn from(kind: FieldKind) -> Self {
        kind.as_str().to_string()
    }
}

/// A `{label, value}` choice for select-like fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: Value,
}

impl SelectOption {
    /// Builds an ordered option list from `(label, value)` pairs.
    pub fn from_pairs<L, V, I>(pairs: I) -> Vec<Self>
    where
        I: IntoIterator<Item = (L, V)>,
        L: Into<String>,
        V: Into<Value>,
    {
        pairs
            .into_iter()
            .map(|(label, value)| Self {
                label: label.into(),
                value: value.into(),
            })
            .collect()
    }
}

/// Visible only when the sibling field `key` currently holds `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

/// Accepts a sequence; `null`, `""` and other scalars mean "none declared".
pub(crate) fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => serde_json::from_value(Value::Array(items)).map_err(D::Error::custom),
        _ => Ok(Vec::new()),
    }
}

/// Accepts a number or a numeric string; anything else sorts as 0.
fn lenient_order<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}
