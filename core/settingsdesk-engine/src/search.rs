//! Depth-first search of the schema tree for a marker node.

use serde_json::{Map, Value};
use settingsdesk_model::loosely_equal;

/// Finds the first node stored under `marker` whose entries loosely equal
/// every `conditions` pair.
///
/// Object entries are visited in declared order and structured values are
/// recursed into. When a marker node fails the conditions, the rest of the
/// mapping that holds it is abandoned and the walk resumes in the parent:
/// first match wins, and a rejected branch is never retried. Array elements
/// are walked by index and never match a marker themselves.
pub fn find_by_marker<'a>(
    marker: &str,
    tree: &'a Value,
    conditions: &Map<String, Value>,
) -> Option<&'a Value> {
    match tree {
        Value::Object(map) => {
            for (key, node) in map {
                if !is_structured(node) {
                    continue;
                }
                if key == marker {
                    return matches_all(node, conditions).then_some(node);
                }
                if let Some(found) = find_by_marker(marker, node, conditions) {
                    return Some(found);
                }
            }
            None
        }
        Value::Array(items) => items
            .iter()
            .filter(|item| is_structured(item))
            .find_map(|item| find_by_marker(marker, item, conditions)),
        _ => None,
    }
}

fn is_structured(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

fn matches_all(node: &Value, conditions: &Map<String, Value>) -> bool {
    conditions
        .iter()
        .all(|(key, expected)| node.get(key).is_some_and(|actual| loosely_equal(actual, expected)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conditions(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn first_match_wins() {
        let tree = json!({
            "a": {"view": {"post_type": "book", "n": 1}},
            "b": {"view": {"post_type": "book", "n": 2}},
        });
        let found = find_by_marker("view", &tree, &conditions(&[("post_type", json!("book"))]));
        assert_eq!(found.and_then(|v| v.get("n")), Some(&json!(1)));
    }

    #[test]
    fn rejected_marker_abandons_its_mapping() {
        let tree = json!({
            "first": {
                "view": {"post_type": "film", "inner": {"view": {"post_type": "book", "n": 1}}},
                "after": {"view": {"post_type": "book", "n": 2}},
            },
            "second": [{"view": {"post_type": "book", "n": 3}}],
        });
        let found = find_by_marker("view", &tree, &conditions(&[("post_type", json!("book"))]));
        assert_eq!(found.and_then(|v| v.get("n")), Some(&json!(3)));
    }

    #[test]
    fn empty_conditions_match_first_marker() {
        let tree = json!({"x": 1, "y": {"view": {"role": "editor"}}});
        assert_eq!(
            find_by_marker("view", &tree, &Map::new()),
            Some(&json!({"role": "editor"}))
        );
    }

    #[test]
    fn scalar_marker_is_ignored() {
        let tree = json!({"view": "table", "z": {"view": {"post_type": "book"}}});
        let found = find_by_marker("view", &tree, &Map::new());
        assert_eq!(found, Some(&json!({"post_type": "book"})));
    }

    #[test]
    fn conditions_compare_loosely() {
        let tree = json!({"view": {"post_type": "book", "limit": "3"}});
        let found = find_by_marker("view", &tree, &conditions(&[("limit", json!(3))]));
        assert!(found.is_some());
    }

    #[test]
    fn missing_is_none() {
        let tree = json!({"view": {"post_type": "book"}});
        let found = find_by_marker("view", &tree, &conditions(&[("post_type", json!("film"))]));
        assert_eq!(found, None);
        assert_eq!(find_by_marker("view", &json!("scalar"), &Map::new()), None);
    }
}
