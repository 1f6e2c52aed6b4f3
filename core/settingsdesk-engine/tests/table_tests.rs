mod common;

use common::{at, engine, seeded_principals, seeded_records};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use settingsdesk_engine::{
    CellContext, CellHook, Filter, HookRegistry, Pagination, TableProjector, TableRequest,
    Validation,
};
use settingsdesk_model::{ColumnArgs, ColumnKind, ColumnSet, ColumnSpec, MetaConstraint, NewRecord};
use settingsdesk_storage::{MemoryRecordStore, RecordStore, SortDirection};

fn projector<'a>(records: &'a MemoryRecordStore, hooks: &'a HookRegistry) -> TableProjector<'a> {
    TableProjector::new(records, hooks, "F j, Y h:i a", 3)
}

// ── Record tables ────────────────────────────────────────────────

#[test]
fn record_table_uses_view_columns() {
    let envelope = engine().record_table(&TableRequest::new("donation"));
    assert!(envelope.success);
    assert_eq!(
        envelope.payload.unwrap(),
        json!({
            "rows": [
                {"title": "Second", "amount": "25", "payments": 1, "post_status": "publish"},
                {"title": "First", "amount": 10, "payments": 2, "post_status": "publish"}
            ],
            "pagination": {"isLastPage": true, "totalFound": 2}
        })
    );
}

#[test]
fn status_column_is_injected_hidden() {
    let records = seeded_records();
    let hooks = HookRegistry::new();
    let request = TableRequest::new("donation")
        .with_columns(ColumnSet::new().with("title", ColumnSpec::attribute("post_title", "Title")));
    let projection = projector(&records, &hooks)
        .project_records(&request)
        .unwrap()
        .unwrap();
    let keys: Vec<_> = projection.rows[0].keys().cloned().collect();
    assert_eq!(keys, vec!["title", "post_status"]);
}

#[test]
fn declared_status_column_is_kept() {
    let records = seeded_records();
    let hooks = HookRegistry::new();
    let request = TableRequest::new("donation").with_columns(
        ColumnSet::new()
            .with("post_status", ColumnSpec::attribute("post_status", "State"))
            .with("id", ColumnSpec::attribute("ID", "ID")),
    );
    let projection = projector(&records, &hooks)
        .project_records(&request)
        .unwrap()
        .unwrap();
    assert_eq!(projection.rows[0].len(), 2);
    assert_eq!(projection.rows[0]["id"], json!(2));
}

#[test]
fn missing_columns_or_collection_yield_nothing() {
    let records = seeded_records();
    let hooks = HookRegistry::new();
    let projector = projector(&records, &hooks);
    assert!(projector.project_records(&TableRequest::new("donation")).unwrap().is_none());
    let no_collection = TableRequest {
        columns: Some(ColumnSet::new()),
        ..TableRequest::default()
    };
    assert!(projector.project_records(&no_collection).unwrap().is_none());
}

#[test]
fn record_table_without_collection_is_missing_input() {
    let envelope = engine().record_table(&TableRequest::default());
    assert!(!envelope.success);
    assert_eq!(envelope.text, "missing input: collection and columns");
}

#[test]
fn pagination_reports_last_page() {
    let records = MemoryRecordStore::new();
    for i in 0..7 {
        records
            .create_at(NewRecord::new("item", format!("Item {i}")), at(2024, 1, 1, 0, 0))
            .unwrap();
    }
    let hooks = HookRegistry::new();
    let columns = ColumnSet::new().with("title", ColumnSpec::attribute("post_title", "Title"));
    let page = |n| {
        projector(&records, &hooks)
            .project_records(&TableRequest::new("item").with_columns(columns.clone()).paged(3, n))
            .unwrap()
            .unwrap()
    };

    let third = page(3);
    assert_eq!(third.pagination, Pagination { is_last_page: true, total_found: 7 });
    assert_eq!(third.rows.len(), 1);
    let second = page(2);
    assert_eq!(second.pagination, Pagination { is_last_page: false, total_found: 7 });
    assert_eq!(second.rows.len(), 3);
}

#[test]
fn huge_page_number_is_an_empty_last_page() {
    let request: TableRequest = serde_json::from_value(json!({
        "post_type": "donation",
        "pageSize": 3,
        "page": u64::MAX
    }))
    .unwrap();
    let envelope = engine().record_table(&request);
    assert!(envelope.success);
    assert_eq!(
        envelope.payload.unwrap(),
        json!({"rows": [], "pagination": {"isLastPage": true, "totalFound": 2}})
    );

    let principals = engine().principal_table(&TableRequest {
        collection: Some("donor".into()),
        ..request
    });
    assert_eq!(principals.payload.unwrap()["rows"], json!([]));
}

#[test]
fn default_page_size_applies() {
    let records = MemoryRecordStore::new();
    for i in 0..5 {
        records.create(NewRecord::new("item", format!("Item {i}"))).unwrap();
    }
    let hooks = HookRegistry::new();
    let request = TableRequest::new("item")
        .with_columns(ColumnSet::new().with("title", ColumnSpec::attribute("post_title", "Title")));
    let projection = projector(&records, &hooks)
        .project_records(&request)
        .unwrap()
        .unwrap();
    assert_eq!(projection.rows.len(), 3);
    assert!(!projection.pagination.is_last_page);
}

#[test]
fn post_date_uses_host_format() {
    let records = seeded_records();
    let hooks = HookRegistry::new();
    let request = TableRequest::new("donation").with_columns(
        ColumnSet::new()
            .with("date", ColumnSpec::attribute("post_date", "Date"))
            .with("other", ColumnSpec::attribute("menu_order", "Order")),
    );
    let projection = projector(&records, &hooks)
        .project_records(&request)
        .unwrap()
        .unwrap();
    assert_eq!(projection.rows[0]["date"], json!("March 1, 2024 09:30 am"));
    assert_eq!(projection.rows[0]["other"], json!(""));
}

#[test]
fn meta_column_uses_sanitized_key() {
    let records = seeded_records();
    let hooks = HookRegistry::new();
    let request = TableRequest::new("donation").with_columns(
        ColumnSet::new()
            .with("amount", ColumnSpec::meta("Amount!", "Amount"))
            .with("missing", ColumnSpec::meta("nope", "Nope")),
    );
    let projection = projector(&records, &hooks)
        .project_records(&request)
        .unwrap()
        .unwrap();
    assert_eq!(projection.rows[1]["amount"], json!(10));
    assert_eq!(projection.rows[1]["missing"], json!(""));
}

#[test]
fn posts_column_appends_args() {
    let records = seeded_records();
    let hooks = HookRegistry::new();
    let published = ColumnSpec::posts("payment", "Paid", "donation_id").with_args(ColumnArgs {
        post_status: Some("publish".into()),
        meta_query: Vec::new(),
    });
    let none_match = ColumnSpec::posts("payment", "None", "donation_id").with_args(ColumnArgs {
        post_status: None,
        meta_query: vec![MetaConstraint::equals("currency", "EUR")],
    });
    let request = TableRequest::new("donation").with_columns(
        ColumnSet::new()
            .with("paid", published)
            .with("eur", none_match)
            .with("all", ColumnSpec::posts("payment", "All", "donation_id")),
    );
    let projection = projector(&records, &hooks)
        .project_records(&request)
        .unwrap()
        .unwrap();
    let first = &projection.rows[1];
    assert_eq!(first["paid"], json!(1));
    assert_eq!(first["eur"], json!(0));
    assert_eq!(first["all"], json!(2));
}

#[test]
fn meta_filters_narrow_rows() {
    let records = seeded_records();
    let hooks = HookRegistry::new();
    let request = TableRequest::new("donation")
        .with_columns(ColumnSet::new().with("title", ColumnSpec::attribute("post_title", "Title")))
        .with_filter(Filter::meta("amount", "10", Validation::Number));
    let projection = projector(&records, &hooks)
        .project_records(&request)
        .unwrap()
        .unwrap();
    assert_eq!(projection.pagination.total_found, 1);
    assert_eq!(projection.rows[0]["title"], json!("First"));
}

#[test]
fn status_request_selects_trashed_rows() {
    let records = seeded_records();
    records.trash(2).unwrap();
    let hooks = HookRegistry::new();
    let columns = ColumnSet::new().with("title", ColumnSpec::attribute("post_title", "Title"));
    let listed = projector(&records, &hooks)
        .project_records(&TableRequest::new("donation").with_columns(columns.clone()))
        .unwrap()
        .unwrap();
    assert_eq!(listed.pagination.total_found, 1);

    let trashed = TableRequest {
        status: Some("trash".into()),
        ..TableRequest::new("donation").with_columns(columns)
    };
    let projection = projector(&records, &hooks)
        .project_records(&trashed)
        .unwrap()
        .unwrap();
    assert_eq!(projection.rows[0]["title"], json!("Second"));
    assert_eq!(projection.rows[0]["post_status"], json!("trash"));
}

struct Currency;

impl CellHook for Currency {
    fn cell(&self, context: &CellContext<'_>, value: Value) -> Value {
        if context.column.kind == ColumnKind::Meta && context.key == "amount" {
            json!(format!("{} EUR", value.as_str().map_or_else(|| value.to_string(), str::to_string)))
        } else {
            value
        }
    }
}

#[test]
fn cell_hooks_post_process_values() {
    let records = seeded_records();
    let mut hooks = HookRegistry::new();
    hooks.add_cell_hook(Currency);
    let request = TableRequest::new("donation")
        .with_columns(ColumnSet::new().with("amount", ColumnSpec::meta("amount", "Amount")));
    let projection = projector(&records, &hooks)
        .project_records(&request)
        .unwrap()
        .unwrap();
    assert_eq!(projection.rows[0]["amount"], json!("25 EUR"));
    assert_eq!(projection.rows[1]["amount"], json!("10 EUR"));
    assert_eq!(projection.rows[0]["post_status"], json!("publish"));
}

// ── Principal tables ─────────────────────────────────────────────

#[test]
fn principal_table_uses_view_columns() {
    let envelope = engine().principal_table(&TableRequest::new("donor"));
    assert_eq!(
        envelope.payload.unwrap(),
        json!({
            "rows": [
                {"login": "bob", "email": "bob@example.org", "city": "Rome", "donations": 1},
                {"login": "alice", "email": "alice@example.org", "city": "Oslo", "donations": 1}
            ],
            "pagination": {"isLastPage": true, "totalFound": 2}
        })
    );
}

#[test]
fn principal_order_is_configurable() {
    let records = seeded_records();
    let principals = seeded_principals();
    let hooks = HookRegistry::new();
    let request = TableRequest {
        order_by: Some("user_login".into()),
        order_dir: Some(SortDirection::Asc),
        ..TableRequest::new("donor")
            .with_columns(ColumnSet::new().with("login", ColumnSpec::attribute("user_login", "Login")))
    };
    let projection = projector(&records, &hooks)
        .project_principals(principals.as_ref(), &request)
        .unwrap()
        .unwrap();
    let logins: Vec<_> = projection.rows.iter().map(|r| r["login"].clone()).collect();
    assert_eq!(logins, vec![json!("alice"), json!("bob")]);
}

#[test]
fn principal_generic_attribute_or_empty() {
    let records = seeded_records();
    let principals = seeded_principals();
    let hooks = HookRegistry::new();
    let request = TableRequest::new("admin").with_columns(
        ColumnSet::new()
            .with("id", ColumnSpec::attribute("ID", "ID"))
            .with("nick", ColumnSpec::attribute("nickname", "Nick")),
    );
    let projection = projector(&records, &hooks)
        .project_principals(principals.as_ref(), &request)
        .unwrap()
        .unwrap();
    assert_eq!(projection.rows.len(), 1);
    assert_eq!(projection.rows[0]["id"], json!(3));
    assert_eq!(projection.rows[0]["nick"], json!(""));
}

#[test]
fn principal_meta_filter() {
    let records = seeded_records();
    let principals = seeded_principals();
    let hooks = HookRegistry::new();
    let request = TableRequest::new("donor")
        .with_columns(ColumnSet::new().with("login", ColumnSpec::attribute("user_login", "Login")))
        .with_filter(Filter::meta("city", "<i>Oslo</i>", Validation::Text));
    let projection = projector(&records, &hooks)
        .project_principals(principals.as_ref(), &request)
        .unwrap()
        .unwrap();
    assert_eq!(projection.rows.len(), 1);
    assert_eq!(projection.rows[0]["login"], json!("alice"));
}
