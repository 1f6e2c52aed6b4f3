//! Conditional visibility of edit-view fields.

use serde_json::Value;
use settingsdesk_model::{loosely_equal, FieldSpec};

/// True when every condition on `field` holds against its siblings.
///
/// A condition holds when a sibling named `key` exists and its resolved
/// value loosely equals the expected one. Fields without conditions are
/// always visible.
pub fn is_visible<F>(field: &FieldSpec, siblings: &[FieldSpec], resolver: F) -> bool
where
    F: Fn(&FieldSpec) -> Option<Value>,
{
    let matched = field
        .condition
        .iter()
        .filter(|condition| {
            siblings
                .iter()
                .find(|sibling| sibling.name == condition.key)
                .is_some_and(|sibling| {
                    let current = resolver(sibling).unwrap_or(Value::Null);
                    loosely_equal(&current, &condition.value)
                })
        })
        .count();
    matched == field.condition.len()
}

/// Fields of `fields` that are visible, in declaration order.
pub fn visible_fields<'a, F>(fields: &'a [FieldSpec], resolver: F) -> Vec<&'a FieldSpec>
where
    F: Fn(&FieldSpec) -> Option<Value>,
{
    fields
        .iter()
        .filter(|field| is_visible(field, fields, &resolver))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use settingsdesk_model::FieldKind;

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("mode", FieldKind::Select).with_value("basic"),
            FieldSpec::new("advanced_opts", FieldKind::Input).with_condition("mode", "advanced"),
            FieldSpec::new("basic_opts", FieldKind::Input).with_condition("mode", "basic"),
            FieldSpec::new("ghost", FieldKind::Input).with_condition("missing", "x"),
        ]
    }

    fn declared(field: &FieldSpec) -> Option<Value> {
        field.value.clone()
    }

    #[test]
    fn unconditioned_fields_are_visible() {
        let fields = fields();
        assert!(is_visible(&fields[0], &fields, declared));
    }

    #[test]
    fn condition_follows_sibling_value() {
        let fields = fields();
        let names: Vec<_> = visible_fields(&fields, declared)
            .into_iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["mode", "basic_opts"]);

        let advanced = |f: &FieldSpec| (f.name == "mode").then(|| json!("advanced"));
        let names: Vec<_> = visible_fields(&fields, advanced)
            .into_iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["mode", "advanced_opts"]);
    }

    #[test]
    fn every_condition_must_hold() {
        let fields = vec![
            FieldSpec::new("a", FieldKind::Input).with_value("1"),
            FieldSpec::new("b", FieldKind::Switch).with_value(true),
            FieldSpec::new("c", FieldKind::Input)
                .with_condition("a", 1)
                .with_condition("b", "true"),
            FieldSpec::new("d", FieldKind::Input)
                .with_condition("a", 1)
                .with_condition("b", false),
        ];
        assert!(is_visible(&fields[2], &fields, declared));
        assert!(!is_visible(&fields[3], &fields, declared));
    }
}
