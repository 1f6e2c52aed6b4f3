use pretty_assertions::assert_eq;
use serde_json::json;
use settingsdesk_model::{
    ColumnKind, ColumnSet, ColumnSpec, FieldKind, ModelError, Principal, ViewBinding,
    ViewDefinition,
};

// ── ViewDefinition ───────────────────────────────────────────────

#[test]
fn view_bound_to_post_type() {
    let node = json!({
        "post_type": "donation",
        "edit_post": [{"title": "Main", "fields": [
            {"name": "amount", "type": "input"},
            {"name": "note", "type": "textarea"}
        ]}]
    });
    let view = ViewDefinition::from_node(&node).unwrap();
    assert_eq!(view.binding, ViewBinding::PostType("donation".into()));
    assert_eq!(view.fields().count(), 2);
    assert_eq!(view.field("note").unwrap().kind, FieldKind::Textarea);
    assert!(view.columns.is_none());
}

#[test]
fn view_bound_to_role() {
    let view = ViewDefinition::from_node(&json!({"role": "editor"})).unwrap();
    assert_eq!(view.binding, ViewBinding::Role("editor".into()));
    assert!(view.edit_post.is_empty());
}

#[test]
fn view_without_discriminator_is_invalid() {
    let err = ViewDefinition::from_node(&json!({"edit_post": []})).unwrap_err();
    assert!(matches!(err, ModelError::InvalidSchema(_)));
}

#[test]
fn binding_conditions_use_discriminator_key() {
    let conditions = ViewBinding::Role("editor".into()).conditions();
    assert_eq!(conditions.get("role"), Some(&json!("editor")));
}

// ── Columns ──────────────────────────────────────────────────────

#[test]
fn columns_keep_declared_order() {
    let set: ColumnSet = serde_json::from_value(json!({
        "title": {"col": "post_title", "type": "", "name": "Title"},
        "amount": {"col": "amount", "type": "meta", "name": "Amount"},
        "payments": {"col": "payment", "type": "posts", "name": "Payments",
                      "relation_meta": "donation_id",
                      "args": {"post_status": "publish",
                               "meta_query": [{"key": "state", "value": "paid"}]}}
    }))
    .unwrap();
    let keys: Vec<_> = set.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["title", "amount", "payments"]);
    let payments = set.get("payments").unwrap();
    assert_eq!(payments.kind, ColumnKind::Posts);
    let args = payments.args.as_ref().unwrap();
    assert_eq!(args.post_status.as_deref(), Some("publish"));
    assert_eq!(args.meta_query[0].key, "state");
}

#[test]
fn unknown_column_kind_is_rejected() {
    let err = serde_json::from_value::<ColumnSpec>(json!({"col": "x", "type": "taxonomy"}))
        .unwrap_err();
    assert!(err.to_string().contains("unknown column kind `taxonomy`"));
}

#[test]
fn column_kind_serializes_to_schema_tags() {
    let column = ColumnSpec::attribute("ID", "Id");
    assert_eq!(serde_json::to_value(&column).unwrap()["type"], json!(""));
    let column = ColumnSpec::meta("amount", "Amount");
    assert_eq!(serde_json::to_value(&column).unwrap()["type"], json!("meta"));
}

#[test]
fn insert_replaces_existing_key_in_place() {
    let mut set = ColumnSet::new()
        .with("a", ColumnSpec::attribute("ID", "Id"))
        .with("b", ColumnSpec::meta("x", "X"));
    set.insert("a", ColumnSpec::attribute("post_title", "Title"));
    assert_eq!(set.len(), 2);
    assert_eq!(set.iter().next().unwrap().1.col, "post_title");
}

// ── Principal ────────────────────────────────────────────────────

#[test]
fn principal_attributes_fall_back_to_generic_map() {
    let principal: Principal = serde_json::from_value(json!({
        "id": 7, "login": "ann", "email": "ann@example.com",
        "roles": ["editor"],
        "attributes": {"display_name": "Ann"}
    }))
    .unwrap();
    assert_eq!(principal.attribute("user_login"), Some(json!("ann")));
    assert_eq!(principal.attribute("display_name"), Some(json!("Ann")));
    assert_eq!(principal.attribute("nickname"), None);
    assert!(principal.has_role("editor"));
}
