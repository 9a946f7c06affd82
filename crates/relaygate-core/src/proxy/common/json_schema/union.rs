use serde_json::Value;

/// Object=3 > Array=2 > Scalar=1 > Null=0
fn score_schema_option(val: &Value) -> i32 {
    let Value::Object(obj) = val else {
        return 0;
    };
    let type_str = obj.get("type").and_then(Value::as_str);
    if obj.contains_key("properties") || type_str == Some("object") {
        3
    } else if obj.contains_key("items") || type_str == Some("array") {
        2
    } else if type_str.is_some_and(|t| t != "null") {
        1
    } else {
        0
    }
}

/// Richest non-null branch of an anyOf/oneOf union.
pub(super) fn extract_best_schema_from_union(union_array: &[Value]) -> Option<&Value> {
    let mut best: Option<(&Value, i32)> = None;
    for item in union_array {
        let score = score_schema_option(item);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((item, score));
        }
    }
    best.map(|(v, _)| v)
}

/// True when a union contains an explicit null branch.
pub(super) fn union_allows_null(union_array: &[Value]) -> bool {
    union_array.iter().any(|v| v.get("type").and_then(Value::as_str) == Some("null"))
}
