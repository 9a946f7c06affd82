use serde_json::{Map, Value};

/// Merge an `allOf` array into the parent schema. Keys already present on
/// the parent win; properties and required entries are unioned.
pub(super) fn merge_all_of(map: &mut Map<String, Value>) {
    let Some(Value::Array(all_of)) = map.remove("allOf") else {
        return;
    };

    for sub_schema in all_of {
        let Value::Object(sub_map) = sub_schema else {
            continue;
        };
        for (k, v) in sub_map {
            if k == "properties" {
                if let Value::Object(props) = v {
                    let target = map
                        .entry("properties".to_string())
                        .or_insert_with(|| Value::Object(Map::new()));
                    if let Value::Object(target) = target {
                        for (pk, pv) in props {
                            target.entry(pk).or_insert(pv);
                        }
                    }
                }
            } else if k == "required" {
                if let Value::Array(reqs) = v {
                    let target =
                        map.entry("required".to_string()).or_insert_with(|| Value::Array(Vec::new()));
                    if let Value::Array(target) = target {
                        for req in reqs {
                            if req.is_string() && !target.contains(&req) {
                                target.push(req);
                            }
                        }
                    }
                }
            } else {
                map.entry(k).or_insert(v);
            }
        }
    }
}
