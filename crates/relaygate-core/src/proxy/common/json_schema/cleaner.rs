//! JSON Schema cleaning entry point.
//!
//! The upstream only accepts a small subset of JSON Schema. Cleaning:
//! 1. inlines `$ref` / `$defs` / `definitions`
//! 2. merges `allOf` and collapses `anyOf` / `oneOf` to their richest branch
//! 3. lowercases `type`, turning `["x", "null"]` into `"x"`
//! 4. strips validation keywords, folding them into a note on the
//!    top-level description
//! 5. drops `required` entries without a matching property, and empty
//!    `required` arrays
//!
//! Cleaning an already-cleaned schema leaves it unchanged.

use serde_json::{Map, Value};

use super::recursive::clean_json_schema_recursive;

pub fn clean_json_schema(value: &mut Value) {
    let mut all_defs = Map::new();
    collect_all_defs(value, &mut all_defs);

    if let Value::Object(map) = value {
        map.remove("$defs");
        map.remove("definitions");
        flatten_refs(map, &all_defs, 0);
    }

    let mut hints = Vec::new();
    clean_json_schema_recursive(value, "", &mut hints);

    if hints.is_empty() {
        return;
    }
    if let Value::Object(map) = value {
        let note = format!("[Constraints: {}]", hints.join("; "));
        append_description(map, &note);
        tracing::debug!("[JSON-Schema] Folded {} constraint hints into description", hints.len());
    }
}

/// Append `note` to the description unless it is already there.
pub(super) fn append_description(map: &mut Map<String, Value>, note: &str) {
    let desc_val =
        map.entry("description".to_string()).or_insert_with(|| Value::String(String::new()));
    if let Value::String(s) = desc_val {
        if !s.contains(note) {
            if !s.is_empty() {
                s.push(' ');
            }
            s.push_str(note);
        }
    }
}

/// Definitions can live at any depth; the first definition of a name wins.
fn collect_all_defs(value: &Value, defs: &mut Map<String, Value>) {
    match value {
        Value::Object(map) => {
            for key in ["$defs", "definitions"] {
                if let Some(Value::Object(d)) = map.get(key) {
                    for (k, v) in d {
                        defs.entry(k.clone()).or_insert_with(|| v.clone());
                    }
                }
            }
            for (key, v) in map {
                if key != "$defs" && key != "definitions" {
                    collect_all_defs(v, defs);
                }
            }
        },
        Value::Array(arr) => {
            for item in arr {
                collect_all_defs(item, defs);
            }
        },
        _ => {},
    }
}

const MAX_REF_DEPTH: usize = 32;

fn flatten_refs(map: &mut Map<String, Value>, defs: &Map<String, Value>, depth: usize) {
    if depth > MAX_REF_DEPTH {
        tracing::warn!("[JSON-Schema] $ref nesting exceeded {}, stopping expansion", MAX_REF_DEPTH);
        map.remove("$ref");
        return;
    }

    map.remove("$defs");
    map.remove("definitions");

    if let Some(Value::String(ref_path)) = map.remove("$ref") {
        let ref_name = ref_path.rsplit('/').next().unwrap_or(&ref_path);

        if let Some(Value::Object(def_map)) = defs.get(ref_name) {
            for (k, v) in def_map {
                map.entry(k.clone()).or_insert_with(|| v.clone());
            }
            flatten_refs(map, defs, depth + 1);
            return;
        }

        // Unresolvable: degrade to a plain string so the upstream accepts it.
        map.insert("type".to_string(), Value::String("string".to_string()));
        append_description(map, &format!("(Unresolved $ref: {})", ref_path));
    }

    for (_, v) in map.iter_mut() {
        match v {
            Value::Object(child) => flatten_refs(child, defs, depth + 1),
            Value::Array(arr) => {
                for item in arr {
                    if let Value::Object(item_map) = item {
                        flatten_refs(item_map, defs, depth + 1);
                    }
                }
            },
            _ => {},
        }
    }
}
