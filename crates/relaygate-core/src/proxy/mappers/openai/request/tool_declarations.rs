use serde_json::{json, Value};

use crate::proxy::common::clean_json_schema;

/// Map OpenAI `tools` (or bare function objects) to upstream function
/// declarations with cleaned parameter schemas.
pub fn transform_tool_declarations(tools: &[Value]) -> Vec<Value> {
    let mut function_declarations: Vec<Value> = Vec::new();

    for tool in tools {
        let mut func = tool.get("function").cloned().unwrap_or_else(|| tool.clone());

        let Some(name) = func.get("name").and_then(Value::as_str).map(str::to_string) else {
            tracing::warn!("[OpenAI-Request] Skipping tool without name");
            continue;
        };

        let Some(obj) = func.as_object_mut() else { continue };
        obj.remove("type");
        obj.remove("strict");
        // Claude-style declarations name the schema input_schema.
        if let Some(schema) = obj.remove("input_schema") {
            obj.entry("parameters").or_insert(schema);
        }

        match obj.get_mut("parameters") {
            Some(params) => {
                clean_json_schema(params);
                if let Some(params_obj) = params.as_object_mut() {
                    params_obj.entry("type").or_insert_with(|| json!("object"));
                }
            },
            None => {
                tracing::debug!("[OpenAI-Request] Injecting empty schema for tool: {}", name);
                obj.insert("parameters".to_string(), json!({ "type": "object", "properties": {} }));
            },
        }

        function_declarations.push(func);
    }

    function_declarations
}

/// `tool_choice` to `toolConfig.functionCallingConfig`.
pub fn transform_tool_choice(choice: &Value) -> Option<Value> {
    let config = match choice {
        Value::String(mode) => match mode.as_str() {
            "none" => json!({ "mode": "NONE" }),
            "auto" => json!({ "mode": "AUTO" }),
            "required" | "any" => json!({ "mode": "ANY" }),
            _ => return None,
        },
        Value::Object(obj) => {
            let name = obj
                .get("function")
                .and_then(|f| f.get("name"))
                .or_else(|| obj.get("name"))
                .and_then(Value::as_str)?;
            json!({ "mode": "ANY", "allowedFunctionNames": [name] })
        },
        _ => return None,
    };
    Some(json!({ "functionCallingConfig": config }))
}
