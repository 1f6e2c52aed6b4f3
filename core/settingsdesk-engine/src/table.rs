//! Projection of record and principal collections into paginated rows.

use crate::coerce::int_value;
use crate::date::format_php;
use crate::error::EngineResult;
use crate::hooks::{CellContext, HookRegistry};
use crate::sanitize::{sanitize_key, sanitize_text};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use settingsdesk_model::{
    display_text, ColumnKind, ColumnSet, ColumnSpec, MetaConstraint, Principal, Record,
};
use settingsdesk_storage::{PrincipalQuery, PrincipalStore, RecordQuery, RecordStore, SortDirection};
use tracing::debug;

/// Column key injected into record tables that do not declare a status column.
pub const STATUS_COLUMN: &str = "post_status";

/// How a filter value is normalized before it becomes a constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Validation {
    Number,
    #[default]
    Text,
}

impl From<String> for Validation {
    fn from(tag: String) -> Self {
        if tag == "number" {
            Self::Number
        } else {
            Self::Text
        }
    }
}

impl From<Validation> for String {
    fn from(validation: Validation) -> Self {
        match validation {
            Validation::Number => "number".into(),
            Validation::Text => "string".into(),
        }
    }
}

/// A listing filter sent by the table UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(alias = "filter_key")]
    pub filter_key: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub validation: Validation,
    /// Only `meta` filters are applied.
    #[serde(rename = "type", default = "meta_kind")]
    pub kind: String,
}

fn meta_kind() -> String {
    "meta".to_string()
}

impl Filter {
    pub fn meta(key: impl Into<String>, value: impl Into<Value>, validation: Validation) -> Self {
        Self {
            filter_key: key.into(),
            value: value.into(),
            validation,
            kind: meta_kind(),
        }
    }

    fn to_constraint(&self) -> Option<MetaConstraint> {
        if self.kind != "meta" {
            return None;
        }
        let value = match self.validation {
            Validation::Number => Value::from(int_value(&self.value)),
            Validation::Text => Value::String(sanitize_text(&display_text(&self.value))),
        };
        Some(MetaConstraint::equals(self.filter_key.clone(), value))
    }
}

/// A table listing request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableRequest {
    /// Record type or principal role; absent means there is nothing to list.
    #[serde(alias = "post_type", alias = "role")]
    pub collection: Option<String>,
    pub columns: Option<ColumnSet>,
    /// Falls back to the configured default when absent or zero.
    pub page_size: Option<usize>,
    pub page: Option<usize>,
    pub status: Option<String>,
    pub order_by: Option<String>,
    pub order_dir: Option<SortDirection>,
    pub filters: Vec<Filter>,
}

impl TableRequest {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: Some(collection.into()),
            ..Self::default()
        }
    }

    pub fn with_columns(mut self, columns: ColumnSet) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn paged(mut self, page_size: usize, page: usize) -> Self {
        self.page_size = Some(page_size);
        self.page = Some(page);
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    fn constraints(&self) -> Vec<MetaConstraint> {
        self.filters.iter().filter_map(Filter::to_constraint).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub is_last_page: bool,
    pub total_found: usize,
}

impl Pagination {
    pub fn new(page: usize, page_size: usize, total_found: usize) -> Self {
        Self {
            is_last_page: page.saturating_mul(page_size) > total_found,
            total_found,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableProjection {
    pub rows: Vec<Map<String, Value>>,
    pub pagination: Pagination,
}

/// Row source for cell resolution.
enum Row<'r> {
    Record(&'r Record),
    Principal(&'r Principal),
}

impl Row<'_> {
    fn id(&self) -> u64 {
        match self {
            Self::Record(r) => r.id,
            Self::Principal(p) => p.id,
        }
    }

    fn meta(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Record(r) => r.meta(key),
            Self::Principal(p) => p.meta(key),
        }
    }
}

/// Builds table rows from the collaborator stores.
pub struct TableProjector<'a> {
    records: &'a dyn RecordStore,
    hooks: &'a HookRegistry,
    datetime_format: String,
    default_page_size: usize,
}

impl<'a> TableProjector<'a> {
    pub fn new(
        records: &'a dyn RecordStore,
        hooks: &'a HookRegistry,
        datetime_format: impl Into<String>,
        default_page_size: usize,
    ) -> Self {
        Self {
            records,
            hooks,
            datetime_format: datetime_format.into(),
            default_page_size,
        }
    }

    fn page_args(&self, request: &TableRequest) -> (usize, usize) {
        let page_size = request
            .page_size
            .filter(|size| *size > 0)
            .unwrap_or(self.default_page_size);
        let page = request.page.unwrap_or(1).max(1);
        (page_size, page)
    }

    /// Lists records of `request.collection`.
    ///
    /// Returns `None` without querying when the request names no columns or
    /// no collection.
    pub fn project_records(&self, request: &TableRequest) -> EngineResult<Option<TableProjection>> {
        let (Some(collection), Some(columns)) = (&request.collection, &request.columns) else {
            return Ok(None);
        };
        let mut columns = columns.clone();
        if !columns.contains_key(STATUS_COLUMN) {
            columns.insert(STATUS_COLUMN, ColumnSpec::attribute(STATUS_COLUMN, "Status").hidden());
        }

        let (page_size, page) = self.page_args(request);
        let mut query = RecordQuery::new(collection.clone()).paged(page_size, page);
        query.status = request.status.clone();
        query.meta = request.constraints();
        let found = self.records.query(&query)?;
        debug!(collection = %collection, total_found = found.total_found, "Projecting record table");

        let rows = found
            .items
            .iter()
            .map(|record| self.row(&columns, Row::Record(record)))
            .collect::<EngineResult<Vec<_>>>()?;
        Ok(Some(TableProjection {
            rows,
            pagination: Pagination::new(page, page_size, found.total_found),
        }))
    }

    /// Lists principals holding `request.collection` as a role.
    pub fn project_principals(
        &self,
        principals: &dyn PrincipalStore,
        request: &TableRequest,
    ) -> EngineResult<Option<TableProjection>> {
        let (Some(role), Some(columns)) = (&request.collection, &request.columns) else {
            return Ok(None);
        };
        let (page_size, page) = self.page_args(request);
        let mut query = PrincipalQuery::new(Some(role.clone()))
            .paged(page_size, page)
            .ordered(
                request.order_by.clone().unwrap_or_else(|| "ID".to_string()),
                request.order_dir.unwrap_or_default(),
            );
        query.meta = request.constraints();
        let found = principals.query(&query)?;
        debug!(role = %role, total_found = found.total_found, "Projecting principal table");

        let rows = found
            .items
            .iter()
            .map(|principal| self.row(columns, Row::Principal(principal)))
            .collect::<EngineResult<Vec<_>>>()?;
        Ok(Some(TableProjection {
            rows,
            pagination: Pagination::new(page, page_size, found.total_found),
        }))
    }

    fn row(&self, columns: &ColumnSet, row: Row<'_>) -> EngineResult<Map<String, Value>> {
        columns
            .iter()
            .map(|(key, column)| -> EngineResult<(String, Value)> {
                let value = self.cell(column, &row)?;
                let context = CellContext {
                    key,
                    column,
                    row_id: row.id(),
                };
                Ok((key.to_string(), self.hooks.process_cell(&context, value)))
            })
            .collect()
    }

    fn cell(&self, column: &ColumnSpec, row: &Row<'_>) -> EngineResult<Value> {
        let empty = || Value::String(String::new());
        Ok(match column.kind {
            ColumnKind::Attribute => match row {
                Row::Record(record) if column.col == "post_date" => {
                    Value::String(format_php(&record.created_at, &self.datetime_format))
                }
                Row::Record(record) => record.attribute(&column.col).unwrap_or_else(empty),
                Row::Principal(principal) => principal.attribute(&column.col).unwrap_or_else(empty),
            },
            ColumnKind::Meta => row
                .meta(&sanitize_key(&column.col))
                .cloned()
                .unwrap_or_else(empty),
            ColumnKind::Posts => Value::from(self.related_count(column, row.id())?),
        })
    }

    /// Records of type `column.col` whose `relation_meta` points at `row_id`,
    /// narrowed further by the column's `args`.
    fn related_count(&self, column: &ColumnSpec, row_id: u64) -> EngineResult<usize> {
        let Some(relation_meta) = &column.relation_meta else {
            debug!(column = %column.col, "Posts column without relation_meta");
            return Ok(0);
        };
        let mut query = RecordQuery::new(column.col.clone())
            .with_meta(MetaConstraint::equals(relation_meta.clone(), row_id));
        if let Some(args) = &column.args {
            query.status = args.post_status.clone();
            query.meta.extend(args.meta_query.iter().cloned());
        }
        Ok(self.records.count(&query)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_page_math() {
        assert!(Pagination::new(3, 3, 7).is_last_page);
        assert!(!Pagination::new(2, 3, 7).is_last_page);
        assert!(!Pagination::new(1, 3, 3).is_last_page);
        assert!(Pagination::new(1, 3, 0).is_last_page);
        assert!(Pagination::new(usize::MAX, 3, 7).is_last_page);
    }

    #[test]
    fn filters_are_normalized() {
        let number = Filter::meta("age", "42years", Validation::Number);
        assert_eq!(number.to_constraint(), Some(MetaConstraint::equals("age", 42)));
        let text = Filter::meta("name", "<b>Ann</b>", Validation::Text);
        assert_eq!(text.to_constraint(), Some(MetaConstraint::equals("name", "Ann")));
        let other = Filter {
            kind: "tax".into(),
            ..Filter::meta("x", 1, Validation::Text)
        };
        assert_eq!(other.to_constraint(), None);
    }

    #[test]
    fn request_accepts_ui_shape() {
        let request: TableRequest = serde_json::from_value(serde_json::json!({
            "post_type": "book",
            "pageSize": 5,
            "page": 2,
            "filters": [{"filterKey": "author", "value": "7", "validation": "number", "type": "meta"}]
        }))
        .unwrap();
        assert_eq!(request.collection.as_deref(), Some("book"));
        assert_eq!(request.page_size, Some(5));
        assert_eq!(request.constraints(), vec![MetaConstraint::equals("author", 7)]);
    }
}
