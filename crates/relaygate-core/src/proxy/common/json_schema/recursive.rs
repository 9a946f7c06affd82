//! Recursive JSON schema cleaning and normalization.

use serde_json::{Map, Value};
use std::collections::HashSet;

use super::cleaner::append_description;
use super::merge::merge_all_of;
use super::union::{extract_best_schema_from_union, union_allows_null};

const MAX_RECURSION_DEPTH: usize = 64;

/// Validation keywords the upstream rejects, with the label used in the
/// folded description note.
const CONSTRAINTS: [(&str, &str); 15] = [
    ("minLength", "minLen"),
    ("maxLength", "maxLen"),
    ("pattern", "pattern"),
    ("minimum", "min"),
    ("maximum", "max"),
    ("multipleOf", "multipleOf"),
    ("exclusiveMinimum", "exclMin"),
    ("exclusiveMaximum", "exclMax"),
    ("minItems", "minItems"),
    ("maxItems", "maxItems"),
    ("uniqueItems", "uniqueItems"),
    ("minProperties", "minProps"),
    ("maxProperties", "maxProps"),
    ("propertyNames", "propertyNames"),
    ("format", "format"),
];

const ALLOWED_FIELDS: [&str; 7] =
    ["type", "description", "properties", "required", "items", "enum", "title"];

fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// Clean one schema node in place, pushing constraint hints for it and its
/// children onto `hints`.
///
/// Returns `true` if the schema is effectively nullable.
pub(super) fn clean_json_schema_recursive(
    value: &mut Value,
    path: &str,
    hints: &mut Vec<String>,
) -> bool {
    clean_bounded(value, path, hints, 0)
}

fn clean_bounded(value: &mut Value, path: &str, hints: &mut Vec<String>, depth: usize) -> bool {
    if depth > MAX_RECURSION_DEPTH {
        tracing::warn!(
            "[JSON-Schema] Recursion depth {} exceeded limit {}, returning value unchanged",
            depth,
            MAX_RECURSION_DEPTH
        );
        return false;
    }

    match value {
        Value::Object(map) => clean_object(map, path, hints, depth),
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                let _ = clean_bounded(item, path, hints, depth + 1);
            }
            false
        },
        _ => false,
    }
}

fn clean_object(
    map: &mut Map<String, Value>,
    path: &str,
    hints: &mut Vec<String>,
    depth: usize,
) -> bool {
    let mut is_nullable = false;

    merge_all_of(map);

    if let Some(Value::Object(props)) = map.get_mut("properties") {
        let mut nullable_keys = HashSet::new();
        for (k, v) in props.iter_mut() {
            if clean_bounded(v, &child_path(path, k), hints, depth + 1) {
                nullable_keys.insert(k.clone());
            }
        }
        if !nullable_keys.is_empty() {
            if let Some(Value::Array(req_arr)) = map.get_mut("required") {
                req_arr.retain(|r| r.as_str().map_or(true, |s| !nullable_keys.contains(s)));
            }
        }
    }

    if let Some(items) = map.get_mut("items") {
        let _ = clean_bounded(items, &format!("{}[]", path), hints, depth + 1);
    }

    for key in ["anyOf", "oneOf"] {
        if let Some(Value::Array(branches)) = map.get_mut(key) {
            for branch in branches.iter_mut() {
                let _ = clean_bounded(branch, path, hints, depth + 1);
            }
        }
    }

    let union = match (map.remove("anyOf"), map.remove("oneOf")) {
        (Some(Value::Array(arr)), _) | (None, Some(Value::Array(arr))) => Some(arr),
        _ => None,
    };
    if let Some(union_array) = union {
        if union_allows_null(&union_array) {
            is_nullable = true;
        }
        if let Some(Value::Object(branch)) = extract_best_schema_from_union(&union_array).cloned()
        {
            merge_branch(map, branch);
        }
    }

    if map.contains_key("properties") && !map.contains_key("type") {
        map.insert("type".to_string(), Value::String("object".to_string()));
    }

    let labels: Vec<String> = CONSTRAINTS
        .iter()
        .filter_map(|(field, label)| {
            let val = map.get(*field).filter(|v| !v.is_null())?;
            let val_str = val.as_str().map_or_else(|| val.to_string(), str::to_string);
            Some(format!("{}: {}", label, val_str))
        })
        .collect();
    if !labels.is_empty() {
        hints.push(if path.is_empty() {
            labels.join(", ")
        } else {
            format!("{} ({})", path, labels.join(", "))
        });
    }

    map.retain(|k, _| ALLOWED_FIELDS.contains(&k.as_str()));

    if map.get("type").and_then(Value::as_str) == Some("object") && !map.contains_key("properties")
    {
        map.insert("properties".to_string(), Value::Object(Map::new()));
    }

    let valid_prop_keys: Option<HashSet<String>> =
        map.get("properties").and_then(Value::as_object).map(|obj| obj.keys().cloned().collect());
    let mut drop_required = false;
    if let Some(Value::Array(req_arr)) = map.get_mut("required") {
        match &valid_prop_keys {
            Some(keys) => req_arr.retain(|k| k.as_str().is_some_and(|s| keys.contains(s))),
            None => req_arr.clear(),
        }
        drop_required = req_arr.is_empty();
    } else if map.contains_key("required") {
        drop_required = true;
    }
    if drop_required {
        map.remove("required");
    }

    if let Some(type_val) = map.get_mut("type") {
        let mut selected_type = None;
        match type_val {
            Value::String(s) => {
                let lower = s.to_lowercase();
                if lower == "null" {
                    is_nullable = true;
                } else {
                    selected_type = Some(lower);
                }
            },
            Value::Array(arr) => {
                for item in arr.iter() {
                    if let Value::String(s) = item {
                        let lower = s.to_lowercase();
                        if lower == "null" {
                            is_nullable = true;
                        } else if selected_type.is_none() {
                            selected_type = Some(lower);
                        }
                    }
                }
            },
            _ => {},
        }
        *type_val = Value::String(selected_type.unwrap_or_else(|| "string".to_string()));
    }

    if is_nullable {
        let already =
            map.get("description").and_then(Value::as_str).is_some_and(|d| d.contains("nullable"));
        if !already {
            append_description(map, "(nullable)");
        }
    }

    if let Some(Value::Array(arr)) = map.get_mut("enum") {
        for item in arr.iter_mut() {
            if !item.is_string() {
                *item = Value::String(if item.is_null() {
                    "null".to_string()
                } else {
                    item.to_string()
                });
            }
        }
    }

    is_nullable
}

/// Fold the chosen union branch into the parent; parent keys win,
/// properties and required are unioned.
fn merge_branch(map: &mut Map<String, Value>, branch: Map<String, Value>) {
    for (k, v) in branch {
        if k == "properties" {
            if let Value::Object(source) = v {
                let target =
                    map.entry("properties".to_string()).or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(target) = target {
                    for (pk, pv) in source {
                        target.entry(pk).or_insert(pv);
                    }
                }
            }
        } else if k == "required" {
            if let Value::Array(source) = v {
                let target =
                    map.entry("required".to_string()).or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(target) = target {
                    for rv in source {
                        if !target.contains(&rv) {
                            target.push(rv);
                        }
                    }
                }
            }
        } else if !map.contains_key(&k) {
            map.insert(k, v);
        }
    }
}
